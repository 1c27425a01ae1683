/// Maps a raw store name to the key used to group equivalent spellings.
///
/// The returned key is only used for grouping; the integrated value is always
/// one of the original spellings.
pub trait StoreNameNormalizer: Send + Sync {
    fn normalize(&self, name: &str) -> String;
}

/// Lower-cases, drops every whitespace character (including the ideographic
/// space) and removes configured corporate-form tokens such as `株式会社`.
#[derive(Debug, Clone)]
pub struct SuffixStrippingNormalizer {
    suffixes: Vec<String>,
}

impl Default for SuffixStrippingNormalizer {
    fn default() -> Self {
        Self::new(vec!["株式会社".to_string()])
    }
}

impl SuffixStrippingNormalizer {
    pub fn new(suffixes: Vec<String>) -> Self {
        // Longer tokens first so "有限会社" is not left half-stripped by "会社".
        let mut suffixes: Vec<String> = suffixes
            .into_iter()
            .map(|s| strip_whitespace(&s.to_lowercase()))
            .filter(|s| !s.is_empty())
            .collect();
        suffixes.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        Self { suffixes }
    }
}

impl StoreNameNormalizer for SuffixStrippingNormalizer {
    fn normalize(&self, name: &str) -> String {
        let mut key = strip_whitespace(&name.to_lowercase());
        for suffix in &self.suffixes {
            key = key.replace(suffix.as_str(), "");
        }
        key
    }
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
