//! Plain-text line model shared by every text backend: splitting, word wrap,
//! ellipsis and alignment.

use crate::geometry::UiRect;
use crate::render::types::{TextFormat, UiFont};

use super::backend::{LineMetrics, TextBackend};

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq)]
pub struct LaidLine {
    pub text: String,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<LaidLine>,
    pub metrics: LineMetrics,
    pub width: f32,
    pub height: f32,
}

impl TextLayout {
    /// Pixel extent, rounded up.
    pub fn size(&self) -> (i32, i32) {
        (self.width.ceil() as i32, self.height.ceil() as i32)
    }

    /// Top-left of each line when placed in `rect` according to `format`.
    pub fn line_origins(&self, rect: UiRect, format: TextFormat) -> Vec<(f32, f32)> {
        let top = if format.contains(TextFormat::VCENTER) {
            rect.top as f32 + (rect.height() as f32 - self.height) / 2.0
        } else if format.contains(TextFormat::BOTTOM) {
            rect.bottom as f32 - self.height
        } else {
            rect.top as f32
        };
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let x = if format.contains(TextFormat::HCENTER) {
                    rect.left as f32 + (rect.width() as f32 - line.width) / 2.0
                } else if format.contains(TextFormat::RIGHT) {
                    rect.right as f32 - line.width
                } else {
                    rect.left as f32
                };
                (x.round(), (top + i as f32 * self.metrics.line_height).round())
            })
            .collect()
    }
}

pub fn text_width(backend: &mut dyn TextBackend, font: &UiFont, text: &str) -> f32 {
    text.chars().map(|ch| backend.advance(font, ch)).sum()
}

/// Break `text` into lines no wider than `max_width` where `format` asks for it.
pub fn layout_text(
    backend: &mut dyn TextBackend,
    font: &UiFont,
    text: &str,
    format: TextFormat,
    max_width: Option<f32>,
) -> TextLayout {
    let metrics = backend.line_metrics(font);
    let single = format.contains(TextFormat::SINGLELINE);

    let paragraphs: Vec<String> = if single {
        vec![text.replace("\r\n", " ").replace(['\r', '\n'], " ")]
    } else {
        text.split('\n')
            .map(|p| p.strip_suffix('\r').unwrap_or(p).to_string())
            .collect()
    };

    let mut lines = Vec::new();
    for para in &paragraphs {
        match max_width {
            Some(max) if !single && format.contains(TextFormat::WORD_WRAP) => {
                lines.extend(wrap_paragraph(backend, font, para, max));
            }
            _ => lines.push(para.clone()),
        }
    }

    let lines: Vec<LaidLine> = lines
        .into_iter()
        .map(|line| {
            let line = match max_width {
                Some(max) if format.contains(TextFormat::END_ELLIPSIS) => end_ellipsis(backend, font, &line, max),
                Some(max) if format.contains(TextFormat::PATH_ELLIPSIS) => path_ellipsis(backend, font, &line, max),
                _ => line,
            };
            let width = text_width(backend, font, &line);
            LaidLine { text: line, width }
        })
        .collect();

    let width = lines.iter().map(|l| l.width).fold(0.0, f32::max);
    let height = lines.len() as f32 * metrics.line_height;
    TextLayout {
        lines,
        metrics,
        width,
        height,
    }
}

/// Words with their trailing whitespace.
fn words(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_space = false;
    for (i, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_space = true;
        } else if in_space {
            out.push(&text[start..i]);
            start = i;
            in_space = false;
        }
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

fn wrap_paragraph(backend: &mut dyn TextBackend, font: &UiFont, para: &str, max: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_w = 0.0;
    for word in words(para) {
        let visible = text_width(backend, font, word.trim_end());
        if !line.is_empty() && line_w + visible > max {
            lines.push(line.trim_end().to_string());
            line.clear();
            line_w = 0.0;
        }
        if line.is_empty() && visible > max {
            // Break inside the word.
            for ch in word.chars() {
                let w = backend.advance(font, ch);
                if !line.is_empty() && !ch.is_whitespace() && line_w + w > max {
                    lines.push(std::mem::take(&mut line));
                    line_w = 0.0;
                }
                line.push(ch);
                line_w += w;
            }
            continue;
        }
        line.push_str(word);
        line_w += text_width(backend, font, word);
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line.trim_end().to_string());
    }
    lines
}

fn end_ellipsis(backend: &mut dyn TextBackend, font: &UiFont, line: &str, max: f32) -> String {
    if text_width(backend, font, line) <= max {
        return line.to_string();
    }
    let budget = max - text_width(backend, font, ELLIPSIS);
    let mut kept = String::new();
    let mut w = 0.0;
    for ch in line.chars() {
        let cw = backend.advance(font, ch);
        if w + cw > budget {
            break;
        }
        kept.push(ch);
        w += cw;
    }
    kept.push_str(ELLIPSIS);
    kept
}

/// Drop characters from the middle until the line fits.
fn path_ellipsis(backend: &mut dyn TextBackend, font: &UiFont, line: &str, max: f32) -> String {
    if text_width(backend, font, line) <= max {
        return line.to_string();
    }
    let chars: Vec<char> = line.chars().collect();
    let mut head = chars.len() / 2;
    let mut tail = chars.len() - head;
    loop {
        let candidate: String = chars[..head]
            .iter()
            .copied()
            .chain(ELLIPSIS.chars())
            .chain(chars[chars.len() - tail..].iter().copied())
            .collect();
        if head + tail == 0 || text_width(backend, font, &candidate) <= max {
            return candidate;
        }
        if head >= tail && head > 0 {
            head -= 1;
        } else {
            tail -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::backend::FixedMetricsTextBackend;

    fn font() -> UiFont {
        UiFont::new("Test", 10)
    }

    fn lines(layout: &TextLayout) -> Vec<&str> {
        layout.lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn newlines_split_lines_unless_single_line() {
        let mut b = FixedMetricsTextBackend::new();
        let multi = layout_text(&mut b, &font(), "ab\r\ncd", TextFormat::empty(), None);
        assert_eq!(lines(&multi), vec!["ab", "cd"]);
        assert_eq!(multi.size(), (10, 20));
        let single = layout_text(&mut b, &font(), "ab\r\ncd", TextFormat::SINGLELINE, None);
        assert_eq!(lines(&single), vec!["ab cd"]);
    }

    #[test]
    fn word_wrap_breaks_at_spaces() {
        let mut b = FixedMetricsTextBackend::new();
        // 5 px per char: "hello " is 30, "world" is 25.
        let layout = layout_text(&mut b, &font(), "hello world", TextFormat::WORD_WRAP, Some(40.0));
        assert_eq!(lines(&layout), vec!["hello", "world"]);
        assert_eq!(layout.width, 25.0);
    }

    #[test]
    fn long_words_break_by_character() {
        let mut b = FixedMetricsTextBackend::new();
        let layout = layout_text(&mut b, &font(), "abcdefgh", TextFormat::WORD_WRAP, Some(20.0));
        assert_eq!(lines(&layout), vec!["abcd", "efgh"]);
    }

    #[test]
    fn end_ellipsis_fits_the_width() {
        let mut b = FixedMetricsTextBackend::new();
        let fmt = TextFormat::SINGLELINE | TextFormat::END_ELLIPSIS;
        let layout = layout_text(&mut b, &font(), "abcdefghij", fmt, Some(30.0));
        assert_eq!(lines(&layout), vec!["abc..."]);
        let short = layout_text(&mut b, &font(), "abc", fmt, Some(30.0));
        assert_eq!(lines(&short), vec!["abc"]);
    }

    #[test]
    fn path_ellipsis_keeps_both_ends() {
        let mut b = FixedMetricsTextBackend::new();
        let layout = layout_text(&mut b, &font(), "C:/dir/file.txt", TextFormat::PATH_ELLIPSIS, Some(50.0));
        let text = &layout.lines[0].text;
        assert!(text.starts_with("C:/"));
        assert!(text.ends_with("txt"));
        assert!(text.contains("..."));
        assert!(layout.lines[0].width <= 50.0);
    }

    #[test]
    fn alignment_positions_lines() {
        let mut b = FixedMetricsTextBackend::new();
        let layout = layout_text(&mut b, &font(), "ab", TextFormat::empty(), None);
        let rc = UiRect::new(0, 0, 100, 30);
        assert_eq!(layout.line_origins(rc, TextFormat::LEFT), vec![(0.0, 0.0)]);
        assert_eq!(layout.line_origins(rc, TextFormat::HCENTER | TextFormat::VCENTER), vec![(45.0, 10.0)]);
        assert_eq!(layout.line_origins(rc, TextFormat::RIGHT | TextFormat::BOTTOM), vec![(90.0, 20.0)]);
    }
}
