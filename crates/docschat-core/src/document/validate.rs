//! Upload validation.
//!
//! A pure predicate over a candidate file, applied before it is handed to
//! the orchestrator. No side effects, no network access.

use super::model::DocumentFile;

/// MIME type accepted for uploads.
pub const ACCEPTED_MIME_TYPE: &str = "application/pdf";

/// Maximum accepted file size: 50 MiB.
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Human-readable reason a candidate file was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The declared content type is not the accepted document type.
    UnsupportedType,
    /// The file exceeds the size ceiling.
    TooLarge,
}

impl RejectReason {
    /// Reason string for the user-facing notification collaborator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedType => "Only PDF files are supported",
            Self::TooLarge => "File size must be less than 50MB",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether a candidate file is acceptable for upload.
pub fn validate_upload(file: &DocumentFile) -> Result<(), RejectReason> {
    if file.mime_type != ACCEPTED_MIME_TYPE {
        return Err(RejectReason::UnsupportedType);
    }
    if file.size > MAX_FILE_SIZE {
        return Err(RejectReason::TooLarge);
    }
    Ok(())
}

/// Filters a multi-file selection down to the acceptable files.
///
/// Files are filtered, not short-circuited: one invalid file among many
/// does not block the valid ones. Rejected files are returned alongside
/// their reasons so the caller can notify the user per file.
pub fn filter_valid(
    files: Vec<DocumentFile>,
) -> (Vec<DocumentFile>, Vec<(DocumentFile, RejectReason)>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for file in files {
        match validate_upload(&file) {
            Ok(()) => accepted.push(file),
            Err(reason) => rejected.push((file, reason)),
        }
    }
    (accepted, rejected)
}
