use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::OcrSource;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse policy TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid policy value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunable weights and thresholds used when integrating OCR results.
///
/// Every key is optional in TOML; missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationPolicy {
    /// Providers trusted to be more accurate than the rest.
    pub trusted_sources: Vec<OcrSource>,
    /// Weight applied to trusted sources when choosing the full text.
    pub selection_weight: f64,
    /// Multiplier for a field value reported by more than one source.
    pub corroboration_bonus: f64,
    /// Multiplier for trusted sources when evaluating a single result.
    pub trusted_source_bonus: f64,
    /// Texts shorter than this (in characters) are penalized.
    pub short_text_len: usize,
    pub short_text_penalty: f64,
    /// Texts longer than this (in characters) are penalized.
    pub long_text_len: usize,
    pub long_text_penalty: f64,
    /// Japanese-script share above which a result earns `japanese_bonus`.
    pub japanese_ratio_threshold: f64,
    pub japanese_bonus: f64,
    pub max_confidence: f64,
    /// Tokens removed from store names before grouping.
    pub corporate_suffixes: Vec<String>,
    /// Treat a parsed amount of 0 as a real value rather than a miss.
    pub accept_zero_amount: bool,
    /// Integrated fields below this confidence are flagged for manual review.
    pub review_threshold: f64,
}

impl Default for IntegrationPolicy {
    fn default() -> Self {
        Self {
            trusted_sources: vec![OcrSource::GoogleVision],
            selection_weight: 1.5,
            corroboration_bonus: 1.5,
            trusted_source_bonus: 1.2,
            short_text_len: 10,
            short_text_penalty: 0.5,
            long_text_len: 5000,
            long_text_penalty: 0.8,
            japanese_ratio_threshold: 0.3,
            japanese_bonus: 1.1,
            max_confidence: 100.0,
            corporate_suffixes: vec!["株式会社".to_string()],
            accept_zero_amount: false,
            review_threshold: 50.0,
        }
    }
}

impl IntegrationPolicy {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let policy: IntegrationPolicy = toml::from_str(toml_content)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn is_trusted(&self, source: &OcrSource) -> bool {
        self.trusted_sources.contains(source)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let factors = [
            ("selection_weight", self.selection_weight),
            ("corroboration_bonus", self.corroboration_bonus),
            ("trusted_source_bonus", self.trusted_source_bonus),
            ("short_text_penalty", self.short_text_penalty),
            ("long_text_penalty", self.long_text_penalty),
            ("japanese_bonus", self.japanese_bonus),
            ("max_confidence", self.max_confidence),
            ("review_threshold", self.review_threshold),
        ];
        for (field, value) in factors {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("expected a non-negative number, got {value}"),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.japanese_ratio_threshold) {
            return Err(ConfigError::Invalid {
                field: "japanese_ratio_threshold",
                reason: format!("expected 0.0–1.0, got {}", self.japanese_ratio_threshold),
            });
        }
        if self.short_text_len > self.long_text_len {
            return Err(ConfigError::Invalid {
                field: "short_text_len",
                reason: "must not exceed long_text_len".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let p = IntegrationPolicy::from_toml("").unwrap();
        assert_eq!(p, IntegrationPolicy::default());
    }

    #[test]
    fn partial_override() {
        let p = IntegrationPolicy::from_toml(
            r#"
            trusted_sources = ["google-vision", "azure"]
            corroboration_bonus = 2.0
            corporate_suffixes = ["株式会社", "(株)", "有限会社"]
            "#,
        )
        .unwrap();
        assert!(p.is_trusted(&OcrSource::Other("azure".into())));
        assert!(!p.is_trusted(&OcrSource::Tesseract));
        assert_eq!(p.corroboration_bonus, 2.0);
        assert_eq!(p.selection_weight, 1.5);
        assert_eq!(p.corporate_suffixes.len(), 3);
    }

    #[test]
    fn rejects_negative_factor() {
        let err = IntegrationPolicy::from_toml("japanese_bonus = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "japanese_bonus", .. }));
    }

    #[test]
    fn rejects_bad_ratio_threshold() {
        assert!(IntegrationPolicy::from_toml("japanese_ratio_threshold = 1.5").is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = IntegrationPolicy::from_toml("selection_weight = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
