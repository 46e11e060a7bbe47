//! Chat-completion providers for docchat.
//!
//! All providers implement the `docchat_core::Provider` trait.

pub mod azure_openai;
pub mod scripted;

pub use azure_openai::AzureOpenAiProvider;
pub use scripted::{ScriptedProvider, text_response};
