//! docschat-core: domain models and the multi-document session
//! orchestrator.
//!
//! The crate is organized around three seams:
//!
//! - [`document`]: the `Document`/`ChatMessage` domain records and the
//!   pure upload validator;
//! - [`gateway`]: the contract of the backend AI/document-processing
//!   service, consumed as an opaque network collaborator;
//! - [`orchestrator`]: the state-owning component that sequences uploads,
//!   removals, chat, and combined-summary recomputes.

pub mod document;
pub mod error;
pub mod gateway;
pub mod orchestrator;

// Re-export common error type
pub use error::{DocsChatError, Result};
