use std::collections::HashMap;

use parley::Font;

/// Loaded fonts keyed by the family name that was asked for.
#[derive(Default)]
pub struct FontCache {
    fonts: HashMap<String, Font>,
    resolved_names: HashMap<String, String>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached font for `name` and the family it resolved to.
    pub fn fetch<'a>(&'a self, name: &'a str) -> Option<(&'a Font, &'a str)> {
        let font = self.fonts.get(name)?;
        let resolved = self.resolved_names.get(name).map_or(name, String::as_str);
        Some((font, resolved))
    }

    pub fn insert(&mut self, name: &str, resolved_name: &str, font: Font) {
        log::debug!("Caching font {} as {}", name, resolved_name);
        self.fonts.insert(name.to_string(), font);
        self.resolved_names
            .insert(name.to_string(), resolved_name.to_string());
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn clear(&mut self) {
        self.fonts.clear();
        self.resolved_names.clear();
    }
}
