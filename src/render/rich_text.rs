//! Rich text: runs of differently styled text packed into rows.
//!
//! Layout is greedy. Each run is cut at `\n`; every piece is measured with its
//! run's font and placed left to right, wrapping when it would cross the right
//! edge. A layout can be kept as a [`DrawRichTextCache`] and replayed later with a
//! new rectangle, scroll offset and per-row horizontal shift without measuring
//! again.

use std::collections::HashSet;
use std::sync::Arc;

use crate::color::UiColor;
use crate::geometry::{UiRect, UiSize};
use crate::render::types::{TextFormat, UiFont};

/// One styled run of text.
#[derive(Debug, Clone, PartialEq)]
pub struct RichTextData {
    pub text: String,
    pub text_color: UiColor,
    /// Painted behind the text unless empty.
    pub bg_color: UiColor,
    pub font: Option<Arc<UiFont>>,
    pub row_spacing_mul: f32,
    pub row_spacing_add: f32,
    pub text_style: TextFormat,
}

impl RichTextData {
    pub fn new(text: impl Into<String>, font: UiFont, text_color: UiColor) -> Self {
        Self {
            text: text.into(),
            text_color,
            bg_color: UiColor::TRANSPARENT,
            font: Some(Arc::new(font)),
            row_spacing_mul: 1.0,
            row_spacing_add: 0.0,
            text_style: TextFormat::empty(),
        }
    }
}

/// A single placed piece of text, recorded so it can be drawn again verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingText {
    /// Index of the run the piece came from.
    pub data_index: usize,
    /// Logical line, counted in `\n` separators.
    pub line_index: usize,
    /// Visual row, counted in newlines and wraps.
    pub row_index: usize,
    pub text: String,
    pub rect: UiRect,
    pub font: Arc<UiFont>,
    pub text_color: UiColor,
    pub bg_color: UiColor,
    pub text_style: TextFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RichTextRow {
    pub row_index: usize,
    pub line_index: usize,
    pub top: i32,
    /// Top of the next row, row spacing included.
    pub bottom: i32,
    pub right: i32,
}

impl RichTextRow {
    fn shifted(mut self, dx: i32, dy: i32) -> Self {
        self.top += dy;
        self.bottom += dy;
        self.right += dx;
        self
    }
}

/// Result of a measure pass: one rectangle list per input run, and the rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RichTextMetrics {
    pub rects: Vec<Vec<UiRect>>,
    pub rows: Vec<RichTextRow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawRichTextCache {
    pub text_rect: UiRect,
    pub scroll_offset: UiSize,
    /// The runs the layout was computed from.
    pub segments: Vec<RichTextData>,
    pub pending: Vec<PendingText>,
    pub rows: Vec<RichTextRow>,
}

pub type RichTextCacheHandle = Arc<DrawRichTextCache>;

/// Describes an edit for [`DrawRichTextCache::apply_edit`].
///
/// The update cache holds the new layout of the edited lines only, numbered from
/// zero; `start_line` and `start_data` say where it goes in the full text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichTextEdit {
    pub start_line: usize,
    pub start_data: usize,
    pub modified_lines: Vec<usize>,
    pub modified_rows: Vec<usize>,
    pub deleted_lines: Vec<usize>,
    pub deleted_rows: Vec<usize>,
    /// Final row tops, applied by row index after patching.
    pub row_rect_tops: Vec<i32>,
}

impl RichTextEdit {
    pub fn has_line_hints(&self) -> bool {
        !self.modified_lines.is_empty() || !self.deleted_lines.is_empty()
    }
}

/// The output of [`layout_rich_text`].
#[derive(Debug, Clone, Default)]
pub struct RichTextLayout {
    pub metrics: RichTextMetrics,
    pub pending: Vec<PendingText>,
}

struct RowCursor {
    x: i32,
    y: i32,
    advance: i32,
    row_index: usize,
    line_index: usize,
    has_content: bool,
}

impl RowCursor {
    fn finish(&mut self, rows: &mut Vec<RichTextRow>, left: i32, scroll: UiSize) {
        let advance = self.advance.max(1);
        rows.push(RichTextRow {
            row_index: self.row_index,
            line_index: self.line_index,
            top: self.y - scroll.cy,
            bottom: self.y + advance - scroll.cy,
            right: self.x - scroll.cx,
        });
        self.y += advance;
        self.x = left;
        self.advance = 0;
        self.row_index += 1;
        self.has_content = false;
    }
}

/// Lay `runs` out inside `rect`.
///
/// `measure` returns the extent of a piece of text in a font. Placements outside
/// `rect` are still produced; callers decide what is visible.
pub fn layout_rich_text(
    rect: UiRect,
    scroll: UiSize,
    runs: &[RichTextData],
    measure: &mut dyn FnMut(&UiFont, &str) -> UiSize,
) -> RichTextLayout {
    let mut rects = vec![Vec::new(); runs.len()];
    let mut rows = Vec::new();
    let mut pending = Vec::new();
    let single_line = runs
        .first()
        .is_some_and(|r| r.text_style.contains(TextFormat::SINGLELINE));

    let mut cur = RowCursor {
        x: rect.left,
        y: rect.top,
        advance: 0,
        row_index: 0,
        line_index: 0,
        has_content: false,
    };

    'runs: for (data_index, run) in runs.iter().enumerate() {
        let Some(font) = run.font.as_ref() else {
            continue;
        };
        if run.text.is_empty() {
            continue;
        }
        for (k, piece) in run.text.split('\n').enumerate() {
            if k > 0 {
                if single_line {
                    break 'runs;
                }
                cur.finish(&mut rows, rect.left, scroll);
                cur.line_index += 1;
            }
            let piece = piece.strip_suffix('\r').unwrap_or(piece);
            let size = measure(font, if piece.is_empty() { " " } else { piece });
            let w = size.cx.max(0);
            let h = size.cy.max(1);
            if !single_line && cur.x + w > rect.right && cur.x > rect.left {
                cur.finish(&mut rows, rect.left, scroll);
            }

            let advance = (h as f32 * run.row_spacing_mul + run.row_spacing_add).round() as i32;
            cur.advance = cur.advance.max(advance.max(1));
            let rc = UiRect::new(cur.x, cur.y, cur.x + w, cur.y + h).offset(-scroll.cx, -scroll.cy);
            rects[data_index].push(rc);
            pending.push(PendingText {
                data_index,
                line_index: cur.line_index,
                row_index: cur.row_index,
                text: piece.to_string(),
                rect: rc,
                font: Arc::clone(font),
                text_color: run.text_color,
                bg_color: run.bg_color,
                text_style: run.text_style,
            });
            cur.x += w;
            cur.has_content = true;
        }
    }
    if cur.has_content {
        cur.finish(&mut rows, rect.left, scroll);
    }

    RichTextLayout {
        metrics: RichTextMetrics { rects, rows },
        pending,
    }
}

impl DrawRichTextCache {
    pub fn new(text_rect: UiRect, scroll_offset: UiSize, runs: &[RichTextData], layout: RichTextLayout) -> Self {
        Self {
            text_rect,
            scroll_offset,
            segments: runs.to_vec(),
            pending: layout.pending,
            rows: layout.metrics.rows,
        }
    }

    /// Same rect size and identical runs.
    pub fn is_valid_for(&self, rect: UiRect, runs: &[RichTextData]) -> bool {
        self.text_rect.width() == rect.width()
            && self.text_rect.height() == rect.height()
            && self.segments.as_slice() == runs
    }

    /// Placement rectangles per run, as recorded.
    pub fn rects(&self) -> Vec<Vec<UiRect>> {
        let mut rects = vec![Vec::new(); self.segments.len()];
        for p in &self.pending {
            if let Some(list) = rects.get_mut(p.data_index) {
                list.push(p.rect);
            }
        }
        rects
    }

    /// Translation applied to every recorded placement when drawn into `rect` at `scroll`.
    pub fn replay_offset(&self, rect: UiRect, scroll: UiSize) -> (i32, i32) {
        (
            (rect.left - self.text_rect.left) - (scroll.cx - self.scroll_offset.cx),
            (rect.top - self.text_rect.top) - (scroll.cy - self.scroll_offset.cy),
        )
    }

    /// Recorded pieces with their replay rectangles.
    pub fn replay<'a>(
        &'a self,
        rect: UiRect,
        scroll: UiSize,
        row_x_offsets: &'a [i32],
    ) -> impl Iterator<Item = (&'a PendingText, UiRect)> + 'a {
        let (dx, dy) = self.replay_offset(rect, scroll);
        self.pending.iter().map(move |p| {
            let extra = row_x_offsets.get(p.row_index).copied().unwrap_or(0);
            (p, p.rect.offset(dx + extra, dy))
        })
    }

    /// Patch the lines named by `edit` with `update`; see [`RichTextEdit`].
    ///
    /// Without line hints the update replaces this cache. Returns false when the
    /// update holds nothing.
    pub fn apply_edit(&mut self, update: &DrawRichTextCache, runs_new: &[RichTextData], edit: &RichTextEdit) -> bool {
        if update.pending.is_empty() {
            return false;
        }
        if !edit.has_line_hints() {
            *self = update.clone();
            if !runs_new.is_empty() {
                self.segments = runs_new.to_vec();
            }
            return true;
        }

        let affected: HashSet<usize> = edit.modified_lines.iter().chain(&edit.deleted_lines).copied().collect();
        let last_affected = affected.iter().copied().max().unwrap_or(edit.start_line);

        let removed_rows: Vec<RichTextRow> = self
            .rows
            .iter()
            .filter(|r| affected.contains(&r.line_index))
            .copied()
            .collect();
        let anchor = removed_rows
            .first()
            .copied()
            .or_else(|| self.rows.iter().find(|r| r.line_index >= edit.start_line).copied());
        let (anchor_row, anchor_top) = match anchor {
            Some(r) => (r.row_index, r.top),
            None => (
                self.rows.len(),
                self.rows
                    .last()
                    .map_or(self.text_rect.top - self.scroll_offset.cy, |r| r.bottom),
            ),
        };

        let update_lines = update.pending.iter().map(|p| p.line_index + 1).max().unwrap_or(0);
        let line_shift = update_lines as isize - affected.len() as isize;
        let row_shift = update.rows.len() as isize - removed_rows.len() as isize;
        let data_shift = runs_new.len() as isize - self.segments.len() as isize;
        let old_height: i32 = removed_rows.iter().map(|r| r.bottom - r.top).sum();
        let new_height: i32 = update.rows.iter().map(|r| r.bottom - r.top).sum();
        let dy_after = new_height - old_height;

        let update_top = update.rows.first().map_or(anchor_top, |r| r.top);
        let dx_in = (self.text_rect.left - self.scroll_offset.cx) - (update.text_rect.left - update.scroll_offset.cx);
        let dy_in = anchor_top - update_top;

        let shift = |v: usize, by: isize| -> usize { (v as isize + by).max(0) as usize };
        let is_after = |line: usize| line > last_affected || (line >= edit.start_line && !affected.contains(&line));

        let mut pending = Vec::with_capacity(self.pending.len() + update.pending.len());
        pending.extend(self.pending.iter().filter(|p| p.line_index < edit.start_line).cloned());
        pending.extend(update.pending.iter().map(|p| PendingText {
            data_index: p.data_index + edit.start_data,
            line_index: p.line_index + edit.start_line,
            row_index: p.row_index + anchor_row,
            rect: p.rect.offset(dx_in, dy_in),
            ..p.clone()
        }));
        pending.extend(
            self.pending
                .iter()
                .filter(|p| !affected.contains(&p.line_index) && is_after(p.line_index))
                .map(|p| PendingText {
                    data_index: shift(p.data_index, data_shift),
                    line_index: shift(p.line_index, line_shift),
                    row_index: shift(p.row_index, row_shift),
                    rect: p.rect.offset(0, dy_after),
                    ..p.clone()
                }),
        );

        let mut rows = Vec::with_capacity(self.rows.len() + update.rows.len());
        rows.extend(self.rows.iter().filter(|r| r.line_index < edit.start_line).copied());
        rows.extend(update.rows.iter().map(|r| RichTextRow {
            row_index: r.row_index + anchor_row,
            line_index: r.line_index + edit.start_line,
            ..r.shifted(dx_in, dy_in)
        }));
        rows.extend(
            self.rows
                .iter()
                .filter(|r| !affected.contains(&r.line_index) && is_after(r.line_index))
                .map(|r| RichTextRow {
                    row_index: shift(r.row_index, row_shift),
                    line_index: shift(r.line_index, line_shift),
                    ..r.shifted(0, dy_after)
                }),
        );

        for (i, &top) in edit.row_rect_tops.iter().enumerate() {
            let Some(row) = rows.iter_mut().find(|r| r.row_index == i) else {
                continue;
            };
            let dy = top - row.top;
            if dy == 0 {
                continue;
            }
            *row = row.shifted(0, dy);
            for p in pending.iter_mut().filter(|p| p.row_index == i) {
                p.rect = p.rect.offset(0, dy);
            }
        }

        self.pending = pending;
        self.rows = rows;
        self.segments = runs_new.to_vec();
        true
    }
}
