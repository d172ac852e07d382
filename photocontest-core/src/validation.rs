//! Validation System - Rule/Policy Separation
//!
//! Rules judge one image file at a time and produce violations.
//! The validator applies the selection limit to a whole batch first, then
//! partitions the batch into accepted files and per-file violations.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use crate::record::MAX_IMAGES;

/// Largest accepted image, in bytes (5MB).
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A candidate image as handed over by the file picker.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    size: u64,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// Read a file from disk, declaring its content type from the extension.
    ///
    /// Files over the size limit are not read; only their length is kept so
    /// the size rule can still report them.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let size = fs::metadata(path)?.len();
        let bytes = if size > MAX_IMAGE_BYTES { vec![] } else { fs::read(path)? };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            content_type: content_type_for(path).to_string(),
            name,
            bytes,
            size,
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn size_mb(&self) -> f64 {
        self.size() as f64 / BYTES_PER_MB
    }
}

// Bytes are elided so that logging a rejected file stays readable.
impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.size())
            .finish()
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    TooManyImages,
    NotAnImage,
    TooLarge,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationViolation {
    pub rule: String,
    pub kind: ViolationKind,
    /// File the violation is about; `None` for batch-level violations.
    pub file: Option<String>,
    pub message: String,
}

/// Validation rule trait - judges a single file
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, file: &ImageFile) -> Option<ValidationViolation>;
}

// --- Concrete Rules ---

pub struct ContentTypeRule;

impl ValidationRule for ContentTypeRule {
    fn name(&self) -> &'static str { "content_type" }

    fn validate(&self, file: &ImageFile) -> Option<ValidationViolation> {
        if file.content_type.starts_with("image/") {
            return None;
        }

        Some(ValidationViolation {
            rule: self.name().to_string(),
            kind: ViolationKind::NotAnImage,
            file: Some(file.name.clone()),
            message: format!("{} is not an image file.", file.name),
        })
    }
}

pub struct FileSizeRule {
    pub max_bytes: u64,
}

impl ValidationRule for FileSizeRule {
    fn name(&self) -> &'static str { "file_size" }

    fn validate(&self, file: &ImageFile) -> Option<ValidationViolation> {
        if file.size() <= self.max_bytes {
            return None;
        }

        let limit_mb = self.max_bytes as f64 / BYTES_PER_MB;
        Some(ValidationViolation {
            rule: self.name().to_string(),
            kind: ViolationKind::TooLarge,
            file: Some(file.name.clone()),
            message: format!(
                "{} exceeds {}MB limit ({:.2}MB).",
                file.name,
                limit_mb,
                file.size_mb()
            ),
        })
    }
}

/// Result of checking one batch against the current selection.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub accepted: Vec<ImageFile>,
    pub violations: Vec<ValidationViolation>,
}

impl BatchOutcome {
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.message.clone()).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Validator orchestrates rules and applies the selection limit
pub struct Validator {
    max_images: usize,
    rules: Vec<Box<dyn ValidationRule + Send + Sync>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            max_images: MAX_IMAGES,
            rules: vec![
                Box::new(ContentTypeRule),
                Box::new(FileSizeRule { max_bytes: MAX_IMAGE_BYTES }),
            ],
        }
    }

    /// Check a batch of candidates given how many images are already selected.
    ///
    /// A batch that would overflow the selection is rejected as a whole.
    /// Otherwise each file is judged on its own; the first rule it breaks
    /// is reported and the remaining files are unaffected.
    pub fn check_batch(&self, already_selected: usize, batch: Vec<ImageFile>) -> BatchOutcome {
        let remaining = self.max_images.saturating_sub(already_selected);

        if batch.len() > remaining {
            return BatchOutcome {
                accepted: vec![],
                violations: vec![ValidationViolation {
                    rule: "selection_limit".to_string(),
                    kind: ViolationKind::TooManyImages,
                    file: None,
                    message: format!(
                        "You can only upload {} more image(s). Maximum {} images allowed.",
                        remaining, self.max_images
                    ),
                }],
            };
        }

        let mut outcome = BatchOutcome::default();
        for file in batch {
            match self.rules.iter().find_map(|rule| rule.validate(&file)) {
                Some(violation) => outcome.violations.push(violation),
                None => outcome.accepted.push(file),
            }
        }
        outcome
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn jpeg(name: &str, size: usize) -> ImageFile {
        ImageFile::new(name, "image/jpeg", vec![0u8; size])
    }

    #[test]
    fn test_overflowing_batch_rejected_whole() {
        let validator = Validator::new();
        let outcome = validator.check_batch(2, vec![jpeg("a.jpg", 10), jpeg("b.jpg", 10)]);

        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].kind, ViolationKind::TooManyImages);
        assert_eq!(
            outcome.violations[0].message,
            "You can only upload 1 more image(s). Maximum 3 images allowed."
        );
    }

    #[test]
    fn test_non_image_rejected_alone() {
        let validator = Validator::new();
        let batch = vec![
            jpeg("a.jpg", 10),
            ImageFile::new("notes.pdf", "application/pdf", vec![1, 2, 3]),
        ];
        let outcome = validator.check_batch(0, batch);

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.accepted[0].name, "a.jpg");
        assert_eq!(outcome.messages(), vec!["notes.pdf is not an image file.".to_string()]);
    }

    #[test]
    fn test_oversize_rejected_with_size_in_message() {
        let validator = Validator::new();
        let big = jpeg("big.jpg", (MAX_IMAGE_BYTES + 1024 * 1024) as usize);
        let outcome = validator.check_batch(0, vec![big, jpeg("ok.jpg", 1)]);

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.violations[0].kind, ViolationKind::TooLarge);
        assert_eq!(outcome.violations[0].message, "big.jpg exceeds 5MB limit (6.00MB).");
    }

    #[test]
    fn test_exactly_five_mb_accepted() {
        let validator = Validator::new();
        let outcome = validator.check_batch(0, vec![jpeg("edge.jpg", MAX_IMAGE_BYTES as usize)]);
        assert!(outcome.is_clean());
        assert_eq!(outcome.accepted.len(), 1);
    }

    #[test]
    fn test_from_path_infers_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Sunset.JPG");
        fs::File::create(&path).unwrap().write_all(b"jpegdata").unwrap();

        let file = ImageFile::from_path(&path).unwrap();
        assert_eq!(file.name, "Sunset.JPG");
        assert_eq!(file.content_type, "image/jpeg");
        assert_eq!(file.size(), 8);
        assert_eq!(file.bytes, b"jpegdata");
    }

    #[test]
    fn test_from_path_skips_reading_oversize_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.png");
        fs::File::create(&path).unwrap().set_len(MAX_IMAGE_BYTES * 2).unwrap();

        let file = ImageFile::from_path(&path).unwrap();
        assert!(file.bytes.is_empty());
        assert_eq!(file.size(), MAX_IMAGE_BYTES * 2);

        let outcome = Validator::new().check_batch(0, vec![file]);
        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.messages(), vec!["huge.png exceeds 5MB limit (10.00MB).".to_string()]);
    }
}
