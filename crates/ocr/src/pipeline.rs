use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use ryoshu_core::OcrResult;

use crate::integrate::{Integrator, ReceiptScan};
use crate::recognizer::OcrBackend;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No OCR providers configured")]
    NoProviders,
    #[error("All {0} OCR providers failed")]
    AllProvidersFailed(usize),
}

/// The outcome of scanning one receipt image with every provider.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Transcriptions from the providers that succeeded, in provider order.
    pub results: Vec<OcrResult>,
    pub scan: ReceiptScan,
}

/// Orchestrates: read → run each provider → integrate.
pub struct ReceiptPipeline {
    backends: Vec<Box<dyn OcrBackend>>,
    integrator: Integrator,
}

impl ReceiptPipeline {
    pub fn new(integrator: Integrator) -> Self {
        Self { backends: Vec::new(), integrator }
    }

    pub fn with_backend(mut self, backend: impl OcrBackend + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    /// Process a file on disk.
    pub async fn process_file(&self, path: &Path) -> Result<PipelineOutput, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        info!("Scanning receipt: {}", path.display());
        self.process_bytes(&bytes).await
    }

    /// Process raw image bytes (from camera capture or file read).
    pub async fn process_bytes(&self, data: &[u8]) -> Result<PipelineOutput, PipelineError> {
        if self.backends.is_empty() {
            return Err(PipelineError::NoProviders);
        }

        let mut results = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            let source = backend.source();
            match backend.recognize(data) {
                Ok(rec) => results.push(OcrResult {
                    text: rec.text,
                    confidence: rec.confidence,
                    source,
                    timestamp: chrono::Utc::now().timestamp_millis(),
                }),
                Err(e) => warn!("OCR provider {source} failed: {e}"),
            }
        }

        if results.is_empty() {
            return Err(PipelineError::AllProvidersFailed(self.backends.len()));
        }

        let scan = self.integrator.scan(&results);
        info!(
            providers = results.len(),
            needs_review = scan.needs_review,
            "Receipt integrated"
        );
        Ok(PipelineOutput { results, scan })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::{MockRecognizer, OcrError, Recognition};
    use ryoshu_core::OcrSource;

    struct Broken;

    impl OcrBackend for Broken {
        fn source(&self) -> OcrSource {
            OcrSource::Other("broken".into())
        }

        fn recognize(&self, _image_bytes: &[u8]) -> Result<Recognition, OcrError> {
            Err(OcrError::Engine("quota exceeded".into()))
        }
    }

    const RECEIPT: &str = "株式会社ローソン\n2024年3月5日\n合計 ¥1,200";

    #[tokio::test]
    async fn process_bytes_integrates_all_providers() {
        let pipeline = ReceiptPipeline::new(Integrator::default())
            .with_backend(MockRecognizer::new(OcrSource::Tesseract, RECEIPT, 60.0))
            .with_backend(MockRecognizer::new(OcrSource::GoogleVision, "ローソン\n24-3-5\n¥1200", 80.0));

        let out = pipeline.process_bytes(b"image").await.unwrap();

        assert_eq!(out.results.len(), 2);
        assert_eq!(out.results[0].source, OcrSource::Tesseract);
        assert!(out.results.iter().all(|r| r.timestamp > 0));
        assert_eq!(out.scan.text, "ローソン\n24-3-5\n¥1200");
        assert_eq!(out.scan.fields.store_name.value, "株式会社ローソン");
        assert_eq!(out.scan.fields.date.value, "2024-03-05");
        assert_eq!(out.scan.fields.amount.as_amount(), Some(1200));
        assert!(!out.scan.needs_review);
    }

    #[tokio::test]
    async fn failing_provider_is_skipped() {
        let pipeline = ReceiptPipeline::new(Integrator::default())
            .with_backend(Broken)
            .with_backend(MockRecognizer::new(OcrSource::Tesseract, RECEIPT, 60.0));

        let out = pipeline.process_bytes(b"image").await.unwrap();
        assert_eq!(out.results.len(), 1);
        assert_eq!(out.scan.text, RECEIPT);
    }

    #[tokio::test]
    async fn all_providers_failing_is_an_error() {
        let pipeline = ReceiptPipeline::new(Integrator::default())
            .with_backend(Broken)
            .with_backend(Broken);
        let err = pipeline.process_bytes(b"image").await.unwrap_err();
        assert!(matches!(err, PipelineError::AllProvidersFailed(2)));
    }

    #[tokio::test]
    async fn no_providers_is_an_error() {
        let pipeline = ReceiptPipeline::new(Integrator::default());
        let err = pipeline.process_bytes(b"image").await.unwrap_err();
        assert!(matches!(err, PipelineError::NoProviders));
    }

    #[tokio::test]
    async fn process_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.png");
        std::fs::write(&path, b"not really a png").unwrap();

        let pipeline = ReceiptPipeline::new(Integrator::default())
            .with_backend(MockRecognizer::new(OcrSource::Tesseract, RECEIPT, 60.0));
        let out = pipeline.process_file(&path).await.unwrap();
        assert_eq!(out.scan.fields.amount.value, "1200");
    }

    #[tokio::test]
    async fn process_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ReceiptPipeline::new(Integrator::default())
            .with_backend(MockRecognizer::new(OcrSource::Tesseract, RECEIPT, 60.0));
        let err = pipeline.process_file(&dir.path().join("missing.png")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
