//! Document domain module.
//!
//! This module contains the document-related domain models and the upload
//! validator.
//!
//! # Module Structure
//!
//! - `model`: Core document domain model (`Document`, `DocumentFile`)
//! - `message`: Chat message types (`MessageRole`, `ChatMessage`)
//! - `validate`: Pure upload validation predicate

mod message;
mod model;
mod validate;

// Re-export public API
pub use message::{ChatMessage, MessageRole};
pub use model::{Document, DocumentFile};
pub use validate::{
    ACCEPTED_MIME_TYPE, MAX_FILE_SIZE, RejectReason, filter_valid, validate_upload,
};
