use anyhow::anyhow;
use fontique::{Attributes, Collection, GenericFamily, QueryFamily, QueryStatus, SourceCache};
use parley::Font;

/// Resolves family names to font files through fontique.
pub struct FontManager {
    collection: Collection,
    cache: SourceCache,
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FontManager {
    pub fn new() -> Self {
        Self {
            collection: Collection::new(Default::default()),
            cache: SourceCache::new_shared(),
        }
    }

    /// Resolve `prefer`, then `fallback`, then the generic UI and sans-serif families.
    ///
    /// Returns the font and the name of the family that matched.
    pub fn resolve(&mut self, prefer: &str, fallback: &str) -> anyhow::Result<(Font, String)> {
        let mut col_clone = self.collection.clone();
        let mut q = self.collection.query(&mut self.cache);

        let mut families: Vec<QueryFamily> = Vec::new();
        if !prefer.is_empty() {
            families.push(QueryFamily::Named(prefer));
        }
        if !fallback.is_empty() && fallback != prefer {
            families.push(QueryFamily::Named(fallback));
        }
        families.push(GenericFamily::UiSansSerif.into());
        families.push(GenericFamily::SansSerif.into());

        q.set_families(families);
        // Bold and italic are synthesized from the regular face.
        q.set_attributes(Attributes::default());

        let mut chosen: Option<(Font, String)> = None;
        q.matches_with(|cand| {
            let font = Font::new(cand.blob.clone(), cand.index);
            let (fam_id, _) = cand.family;
            let name = col_clone
                .family(fam_id)
                .map(|info| info.name().to_string())
                .unwrap_or_default();
            chosen = Some((font, name));
            QueryStatus::Stop
        });

        chosen.ok_or_else(|| anyhow!("no installed font matches '{prefer}' or '{fallback}'"))
    }
}
