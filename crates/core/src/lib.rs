//! # docchat core
//!
//! Domain types, traits, and error definitions for the docchat client.
//! This crate has **no I/O of its own** beyond reading a document from disk.
//! It defines the conversation model that every other crate works against.
//!
//! ## Layout
//!
//! - [`session`]: the per-user Session Store (messages plus per-turn records)
//! - [`prompt`]: the Prompt Assembler (one-shot document merge)
//! - [`provider`]: the Completion Client contract
//! - [`document`]: uploaded documents and the text-extraction contract

pub mod document;
pub mod error;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use document::{Document, PlainTextExtractor, TextExtractor};
pub use error::{ApiError, ApiErrorKind, Error, ExtractionError, Result};
pub use message::{Message, Role};
pub use prompt::{AssembledPrompt, DOCUMENT_PREFIX, build_user_message};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use session::{
    ConversationExport, ConversationSession, EXPORT_FILE_NAME, EXPORT_MEDIA_TYPE, SessionId, Turn,
};
