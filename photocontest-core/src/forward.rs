//! Submission Forwarder
//!
//! The spreadsheet web app does not let a browser read its responses, so a
//! forward counts as done once the request went out without a transport
//! error. Nothing here can tell whether a row was actually appended.

use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use thiserror::Error;
use tracing::{error, info};

use crate::config::ContestConfig;
use crate::record::RegistrationRecord;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("Failed to reach spreadsheet endpoint: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Append-only destination for finished records.
pub trait RecordSink: Send + Sync {
    fn forward(&self, record: &RegistrationRecord) -> impl Future<Output = Result<(), ForwardError>> + Send;
}

#[derive(Debug, Deserialize)]
struct Liveness {
    message: String,
}

/// Google Apps Script web app forwarder.
#[derive(Debug, Clone)]
pub struct SheetsForwarder {
    client: Client,
    script_url: String,
}

impl SheetsForwarder {
    pub fn new(client: Client, script_url: impl Into<String>) -> Self {
        Self {
            client,
            script_url: script_url.into(),
        }
    }

    pub fn from_config(client: Client, config: &ContestConfig) -> Self {
        Self::new(client, &config.script_url)
    }

    /// GET the endpoint and return its liveness message.
    pub async fn ping(&self) -> Result<String, ForwardError> {
        let body: Liveness = self
            .client
            .get(&self.script_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.message)
    }
}

impl RecordSink for SheetsForwarder {
    async fn forward(&self, record: &RegistrationRecord) -> Result<(), ForwardError> {
        // `json` sets Content-Type: application/json. The response is
        // dropped unread on purpose.
        match self.client.post(&self.script_url).json(record).send().await {
            Ok(_) => {
                info!("Forwarded registration for {}", record.email);
                Ok(())
            }
            Err(e) => {
                error!("Forwarding registration for {} failed: {}", record.email, e);
                Err(e.into())
            }
        }
    }
}
