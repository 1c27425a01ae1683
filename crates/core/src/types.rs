use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The OCR engine that produced a transcription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OcrSource {
    GoogleVision,
    Tesseract,
    Other(String),
}

impl fmt::Display for OcrSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OcrSource::GoogleVision => write!(f, "google-vision"),
            OcrSource::Tesseract => write!(f, "tesseract"),
            OcrSource::Other(s) => write!(f, "{s}"),
        }
    }
}

impl From<String> for OcrSource {
    fn from(s: String) -> Self {
        match s.as_str() {
            "google-vision" => OcrSource::GoogleVision,
            "tesseract" => OcrSource::Tesseract,
            _ => OcrSource::Other(s),
        }
    }
}

impl From<OcrSource> for String {
    fn from(source: OcrSource) -> Self {
        source.to_string()
    }
}

impl std::str::FromStr for OcrSource {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("OCR source must not be empty".to_string());
        }
        Ok(OcrSource::from(s.to_string()))
    }
}

/// One transcription of a receipt, as reported by a single OCR call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub text: String,
    /// Provider-reported confidence on a 0–100 scale.
    pub confidence: f64,
    pub source: OcrSource,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl OcrResult {
    pub fn new(text: impl Into<String>, confidence: f64, source: OcrSource, timestamp: i64) -> Self {
        Self { text: text.into(), confidence, source, timestamp }
    }
}

/// A candidate value for one structured field, with the accumulated
/// confidence of every source that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfidence {
    /// Empty when no source yielded the field.
    pub value: String,
    pub confidence: f64,
    /// Contributing sources in first-seen order, without repeats.
    pub sources: Vec<OcrSource>,
}

impl FieldConfidence {
    pub fn new(value: impl Into<String>, confidence: f64, source: OcrSource) -> Self {
        Self { value: value.into(), confidence, sources: vec![source] }
    }

    /// The zero-confidence placeholder for a field nobody found.
    pub fn absent() -> Self {
        Self { value: String::new(), confidence: 0.0, sources: vec![] }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Add another observation of the same value.
    pub fn corroborate(&mut self, confidence: f64, source: &OcrSource) {
        self.confidence += confidence;
        if !self.sources.contains(source) {
            self.sources.push(source.clone());
        }
    }

    pub fn is_corroborated(&self) -> bool {
        self.sources.len() > 1
    }

    /// Interpret the value as a `YYYY-MM-DD` date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.value, "%Y-%m-%d").ok()
    }

    /// Interpret the value as a whole-yen amount.
    pub fn as_amount(&self) -> Option<i64> {
        self.value.parse().ok()
    }
}

/// Best guess per structured field across all transcriptions of a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegratedFields {
    pub store_name: FieldConfidence,
    pub date: FieldConfidence,
    pub amount: FieldConfidence,
}

impl IntegratedFields {
    pub fn empty() -> Self {
        Self {
            store_name: FieldConfidence::absent(),
            date: FieldConfidence::absent(),
            amount: FieldConfidence::absent(),
        }
    }

    /// Whether a human should confirm or fill in the fields before the
    /// receipt is classified.
    pub fn needs_review(&self, threshold: f64) -> bool {
        [&self.store_name, &self.date, &self.amount]
            .iter()
            .any(|f| f.is_empty() || f.confidence < threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_wire_names() {
        assert_eq!(OcrSource::GoogleVision.to_string(), "google-vision");
        assert_eq!(OcrSource::from("tesseract".to_string()), OcrSource::Tesseract);
        assert_eq!(
            OcrSource::from("azure".to_string()),
            OcrSource::Other("azure".into())
        );
    }

    #[test]
    fn source_serde_uses_plain_strings() {
        let json = serde_json::to_string(&OcrSource::GoogleVision).unwrap();
        assert_eq!(json, "\"google-vision\"");
        let back: OcrSource = serde_json::from_str("\"tesseract\"").unwrap();
        assert_eq!(back, OcrSource::Tesseract);
    }

    #[test]
    fn source_from_str_rejects_blank() {
        use std::str::FromStr;
        assert!(OcrSource::from_str("  ").is_err());
        assert_eq!(OcrSource::from_str("google-vision").unwrap(), OcrSource::GoogleVision);
    }

    #[test]
    fn corroborate_accumulates_and_dedups_sources() {
        let mut f = FieldConfidence::new("セブン", 40.0, OcrSource::Tesseract);
        f.corroborate(30.0, &OcrSource::Tesseract);
        assert_eq!(f.confidence, 70.0);
        assert!(!f.is_corroborated());

        f.corroborate(20.0, &OcrSource::GoogleVision);
        assert_eq!(f.confidence, 90.0);
        assert_eq!(f.sources, vec![OcrSource::Tesseract, OcrSource::GoogleVision]);
        assert!(f.is_corroborated());
    }

    #[test]
    fn typed_accessors() {
        let d = FieldConfidence::new("2024-03-05", 80.0, OcrSource::Tesseract);
        assert_eq!(d.as_date(), NaiveDate::from_ymd_opt(2024, 3, 5));
        let a = FieldConfidence::new("1200", 80.0, OcrSource::Tesseract);
        assert_eq!(a.as_amount(), Some(1200));
        assert_eq!(FieldConfidence::absent().as_amount(), None);
    }

    #[test]
    fn needs_review_when_any_field_missing() {
        let mut fields = IntegratedFields {
            store_name: FieldConfidence::new("ローソン", 90.0, OcrSource::GoogleVision),
            date: FieldConfidence::new("2024-03-05", 90.0, OcrSource::GoogleVision),
            amount: FieldConfidence::new("540", 90.0, OcrSource::GoogleVision),
        };
        assert!(!fields.needs_review(50.0));
        assert!(fields.needs_review(95.0));

        fields.amount = FieldConfidence::absent();
        assert!(fields.needs_review(0.0));
        assert!(IntegratedFields::empty().needs_review(0.0));
    }

    #[test]
    fn integrated_fields_serialize_camel_case() {
        let json = serde_json::to_value(IntegratedFields::empty()).unwrap();
        assert!(json.get("storeName").is_some());
        assert_eq!(json["amount"]["value"], "");
    }
}
