pub mod extract;
pub mod integrate;
pub mod normalize;
pub mod pipeline;
pub mod recognizer;
pub mod score;

pub use extract::{AmountPattern, DatePattern, ExtractedFields, FieldExtractor, FieldMatcher, FirstLine};
pub use integrate::{Integrator, ReceiptScan, ScoredResult};
pub use normalize::{StoreNameNormalizer, SuffixStrippingNormalizer};
pub use pipeline::{PipelineError, PipelineOutput, ReceiptPipeline};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, Recognition};
pub use score::{evaluate_confidence, japanese_ratio};
