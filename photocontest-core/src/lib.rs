//! Photography Contest Registration - Submission Pipeline
//!
//! validate → upload → assemble → forward
//!
//! 1. Images are checked before they join the selection
//! 2. Uploads run concurrently; one failure fails them all
//! 3. Image slots follow selection order
//! 4. The record is forwarded fire-and-forget
//! 5. One submission in flight per form

pub mod config;
pub mod record;
pub mod validation;
pub mod notice;
pub mod hashing;
pub mod upload;
pub mod forward;
pub mod form;

pub use config::{ContestConfig, ConfigError};
pub use record::{Category, Field, FormFields, RegistrationRecord, MAX_IMAGES};
pub use validation::{BatchOutcome, ImageFile, ValidationViolation, Validator, MAX_IMAGE_BYTES};
pub use hashing::{compute_record_hash, canonical_json};
pub use upload::{upload_all, CloudinaryUploader, ImageHost, UploadError};
pub use forward::{ForwardError, RecordSink, SheetsForwarder};
pub use form::{FormController, SubmissionReceipt, SubmitError, SubmitOutcome};

pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
