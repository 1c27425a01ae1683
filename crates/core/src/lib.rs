pub mod policy;
pub mod types;
pub mod validate;

pub use policy::{ConfigError, IntegrationPolicy};
pub use types::{FieldConfidence, IntegratedFields, OcrResult, OcrSource};
pub use validate::{parse_results, ValidationError};
