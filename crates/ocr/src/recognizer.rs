use ryoshu_core::OcrSource;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine error: {0}")]
    Engine(String),
}

/// Text and provider-reported confidence (0–100) from one OCR call.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub text: String,
    pub confidence: f64,
}

/// Abstraction over an OCR provider.
/// Implementations accept raw PNG/JPEG image bytes and return the recognized text.
pub trait OcrBackend: Send + Sync {
    fn source(&self) -> OcrSource;
    fn recognize(&self, image_bytes: &[u8]) -> Result<Recognition, OcrError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set transcription, for exercising the integration pipeline
/// without a real provider.
pub struct MockRecognizer {
    pub source: OcrSource,
    pub text: String,
    pub confidence: f64,
}

impl MockRecognizer {
    pub fn new(source: OcrSource, text: impl Into<String>, confidence: f64) -> Self {
        Self { source, text: text.into(), confidence }
    }
}

impl OcrBackend for MockRecognizer {
    fn source(&self) -> OcrSource {
        self.source.clone()
    }

    fn recognize(&self, _image_bytes: &[u8]) -> Result<Recognition, OcrError> {
        Ok(Recognition { text: self.text.clone(), confidence: self.confidence })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_preset_text() {
        let r = MockRecognizer::new(OcrSource::Tesseract, "ローソン\n合計 ¥540", 72.0);
        let out = r.recognize(b"fake image data").unwrap();
        assert_eq!(out.text, "ローソン\n合計 ¥540");
        assert_eq!(out.confidence, 72.0);
        assert_eq!(r.source(), OcrSource::Tesseract);
    }

    #[test]
    fn mock_ignores_image_content() {
        let r = MockRecognizer::new(OcrSource::GoogleVision, "hello", 10.0);
        assert_eq!(r.recognize(b"anything").unwrap().text, "hello");
        assert_eq!(r.recognize(b"").unwrap().text, "hello");
    }
}
