//! Form State Controller - Single Submission Entry Point
//!
//! Owns what the applicant typed and picked. `submit` is the only way a
//! record leaves the form: check fields, upload images, assemble, forward.
//! At most one submission runs at a time per form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::forward::{ForwardError, RecordSink};
use crate::hashing::compute_record_hash;
use crate::notice::NoticeBoard;
use crate::record::{Field, FormFields, RegistrationRecord};
use crate::upload::{upload_all, ImageHost, UploadError};
use crate::validation::{BatchOutcome, ImageFile, Validator};
use crate::CLIENT_VERSION;

pub const SUBMIT_FAILURE_NOTICE: &str = "Failed to submit the form. Please try again.";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Missing required fields: {}", .0.iter().map(Field::wire_name).collect::<Vec<_>>().join(", "))]
    Incomplete(Vec<Field>),

    #[error("Image upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("Forwarding failed: {0}")]
    Forward(#[from] ForwardError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Local proof that a record was sent. Not proof that it was stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub id: String,
    pub submitted_at: DateTime<Utc>,
    pub client_version: String,
    pub record_hash: String,
    pub record: RegistrationRecord,
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Submitted(SubmissionReceipt),
    /// Another submission was already in flight; nothing happened.
    Suppressed,
}

#[derive(Debug, Default)]
struct FormState {
    fields: FormFields,
    images: Vec<ImageFile>,
    notices: NoticeBoard,
    success_visible: bool,
}

/// Clears the in-flight flag when dropped, whatever the outcome.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

pub struct FormController<H, S> {
    host: H,
    sink: S,
    validator: Validator,
    state: Mutex<FormState>,
    in_flight: AtomicBool,
}

impl<H: ImageHost, S: RecordSink> FormController<H, S> {
    pub fn new(host: H, sink: S) -> Self {
        Self {
            host,
            sink,
            validator: Validator::new(),
            state: Mutex::new(FormState::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_field(&self, field: Field, value: impl Into<String>) {
        self.state().fields.set(field, value);
    }

    pub fn fields(&self) -> FormFields {
        self.state().fields.clone()
    }

    pub fn images(&self) -> Vec<ImageFile> {
        self.state().images.clone()
    }

    pub fn image_names(&self) -> Vec<String> {
        self.state().images.iter().map(|f| f.name.clone()).collect()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn success_visible(&self) -> bool {
        self.state().success_visible
    }

    pub fn dismiss_success(&self) {
        self.state().success_visible = false;
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices_at(Utc::now())
    }

    pub fn notices_at(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut state = self.state();
        state.notices.prune(now);
        state.notices.active(now).into_iter().map(str::to_string).collect()
    }

    pub fn add_images(&self, batch: Vec<ImageFile>) -> BatchOutcome {
        self.add_images_at(batch, Utc::now())
    }

    /// Validate a batch and append what passes to the selection.
    ///
    /// Violations are posted as notices; accepted files are appended even
    /// when other files in the same batch were rejected.
    pub fn add_images_at(&self, batch: Vec<ImageFile>, now: DateTime<Utc>) -> BatchOutcome {
        let mut state = self.state();
        let outcome = self.validator.check_batch(state.images.len(), batch);

        if !outcome.is_clean() {
            for v in &outcome.violations {
                warn!("Rejected image: {}", v.message);
            }
            state.notices.post(outcome.messages(), now);
        }
        state.images.extend(outcome.accepted.iter().cloned());
        outcome
    }

    /// Drop the image at `index`; order of the rest is kept.
    pub fn remove_image(&self, index: usize) -> Option<ImageFile> {
        let mut state = self.state();
        if index < state.images.len() {
            Some(state.images.remove(index))
        } else {
            None
        }
    }

    pub async fn submit(&self) -> Result<SubmitOutcome, SubmitError> {
        self.submit_at(Utc::now()).await
    }

    /// Run the submission pipeline once.
    ///
    /// On success the form is emptied and the success flag raised. On any
    /// upload or forward failure the generic notice is posted without an
    /// expiry and the form is left as it was.
    pub async fn submit_at(&self, now: DateTime<Utc>) -> Result<SubmitOutcome, SubmitError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            info!("Submission already in flight, ignoring");
            return Ok(SubmitOutcome::Suppressed);
        };

        let (fields, images) = {
            let mut state = self.state();
            state.notices.clear();
            (state.fields.clone(), state.images.clone())
        };

        let missing = fields.missing();
        if !missing.is_empty() {
            let messages: Vec<String> = missing
                .iter()
                .map(|f| format!("{} is required.", f.label()))
                .collect();
            self.state().notices.post(messages, now);
            return Err(SubmitError::Incomplete(missing));
        }

        match self.run_pipeline(&fields, &images).await {
            Ok(receipt) => {
                let mut state = self.state();
                state.fields = FormFields::default();
                state.images.clear();
                state.success_visible = true;
                Ok(SubmitOutcome::Submitted(receipt))
            }
            Err(e) => {
                warn!("Submission failed: {}", e);
                // Stays up until the next attempt clears it.
                self.state().notices.post_sticky([SUBMIT_FAILURE_NOTICE]);
                Err(e)
            }
        }
    }

    async fn run_pipeline(
        &self,
        fields: &FormFields,
        images: &[ImageFile],
    ) -> Result<SubmissionReceipt, SubmitError> {
        info!("Submitting registration with {} image(s)", images.len());

        let image_urls = if images.is_empty() {
            vec![]
        } else {
            upload_all(&self.host, images).await?
        };

        let record = RegistrationRecord::assemble(fields, &image_urls);
        let record_hash = compute_record_hash(&record)?;

        self.sink.forward(&record).await?;

        Ok(SubmissionReceipt {
            id: Uuid::new_v4().to_string(),
            submitted_at: Utc::now(),
            client_version: CLIENT_VERSION.to_string(),
            record_hash,
            record,
        })
    }
}
