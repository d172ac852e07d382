//! Image Upload Client
//!
//! Each file goes to the media host as an unsigned upload; a batch is
//! uploaded concurrently and comes back in input order, or not at all.

use futures::future::try_join_all;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::ContestConfig;
use crate::validation::ImageFile;

const GENERIC_UPLOAD_FAILURE: &str = "Failed to upload image to Cloudinary";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload preset not found. Please create an unsigned upload preset named \"{0}\" in Cloudinary.")]
    PresetMissing(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Upload response missing secure_url: {0}")]
    MalformedResponse(String),

    #[error("Upload transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Somewhere images can be sent in exchange for a public URL.
pub trait ImageHost: Send + Sync {
    fn upload(&self, file: &ImageFile) -> impl Future<Output = Result<String, UploadError>> + Send;
}

/// Upload every file concurrently and return the URLs in input order.
///
/// The first failure to resolve fails the whole batch; no partial list is
/// ever returned.
pub async fn upload_all<H: ImageHost>(host: &H, files: &[ImageFile]) -> Result<Vec<String>, UploadError> {
    let urls = try_join_all(files.iter().map(|file| host.upload(file)))
        .await
        .map_err(|e| {
            error!("Batch upload of {} image(s) failed: {}", files.len(), e);
            e
        })?;
    Ok(urls)
}

#[derive(Debug, Deserialize)]
struct UploadSuccess {
    secure_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UploadFailure {
    #[serde(default)]
    error: Option<FailureDetail>,
}

#[derive(Debug, Deserialize)]
struct FailureDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Cloudinary unsigned-upload client.
#[derive(Debug, Clone)]
pub struct CloudinaryUploader {
    client: Client,
    upload_url: String,
    upload_preset: String,
}

impl CloudinaryUploader {
    pub fn new(client: Client, upload_url: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        Self {
            client,
            upload_url: upload_url.into(),
            upload_preset: upload_preset.into(),
        }
    }

    pub fn from_config(client: Client, config: &ContestConfig) -> Self {
        Self::new(client, &config.upload_url, &config.upload_preset)
    }

    fn form_for(&self, file: &ImageFile) -> Result<Form, UploadError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)?;

        Ok(Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone()))
    }

    fn rejection(&self, status: u16, body: UploadFailure) -> UploadError {
        let message = body.error.and_then(|e| e.message);

        match message {
            Some(m) if m.contains("preset") => UploadError::PresetMissing(self.upload_preset.clone()),
            Some(m) => UploadError::Rejected { status, message: m },
            None => UploadError::Rejected {
                status,
                message: GENERIC_UPLOAD_FAILURE.to_string(),
            },
        }
    }
}

impl ImageHost for CloudinaryUploader {
    async fn upload(&self, file: &ImageFile) -> Result<String, UploadError> {
        let form = self.form_for(file)?;
        debug!("Uploading {} ({} bytes)", file.name, file.size());

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<UploadFailure>().await.unwrap_or_default();
            let err = self.rejection(status.as_u16(), body);
            error!("Upload of {} rejected ({}): {}", file.name, status, err);
            return Err(err);
        }

        let body: UploadSuccess = response.json().await?;
        body.secure_url
            .ok_or_else(|| UploadError::MalformedResponse(file.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploader() -> CloudinaryUploader {
        CloudinaryUploader::new(Client::new(), "http://localhost/upload", "photography_contest")
    }

    fn failure(message: Option<&str>) -> UploadFailure {
        UploadFailure {
            error: Some(FailureDetail { message: message.map(str::to_string) }),
        }
    }

    #[test]
    fn test_preset_message_becomes_guidance() {
        let err = uploader().rejection(400, failure(Some("Upload preset not found")));
        assert!(matches!(err, UploadError::PresetMissing(ref p) if p == "photography_contest"));
        assert!(err.to_string().contains("unsigned upload preset named \"photography_contest\""));
    }

    #[test]
    fn test_provider_message_passed_through() {
        let err = uploader().rejection(400, failure(Some("Invalid image file")));
        assert_eq!(err.to_string(), "Invalid image file");
    }

    #[test]
    fn test_missing_message_falls_back() {
        let err = uploader().rejection(500, UploadFailure::default());
        assert_eq!(err.to_string(), GENERIC_UPLOAD_FAILURE);
    }
}
