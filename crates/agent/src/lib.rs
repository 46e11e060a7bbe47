//! Turn orchestration for docchat.
//!
//! Each user submission runs one **assemble → complete → store → estimate**
//! cycle:
//!
//! 1. **Assemble** the user message (merging document text once per session)
//! 2. **Complete** by sending system prompt + history + new message to the provider
//! 3. **Store** both messages and the per-turn record in the session
//! 4. **Estimate** the turn's cost and add it to the running total
//!
//! Completion failures are folded into the transcript rather than returned.

pub mod chat;
pub mod export;

pub use chat::{API_ERROR_PREFIX, ChatService, TurnOutcome};
pub use export::{export_to_path, import_messages};
