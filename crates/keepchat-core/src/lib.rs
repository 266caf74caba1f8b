//! Session persistence and conversation assembly for a terminal chat client
//! talking to a local Ollama daemon.
//!
//! State lives in three files in one data directory (history, system prompt,
//! config). They are read once at startup and rewritten in full on every
//! change. There is no file locking: running two sessions against the same
//! data directory at once is not supported.

pub mod error;
pub mod constants;
pub mod llm;
pub mod context;
pub mod config;
pub mod session;

// Re-export key types
pub use error::{ChatError, Result};
pub use llm::{LlmClient, LlmResponse, Message, Role, StreamEvent};
pub use context::{build_request, HistoryStore, HistorySummary, SessionStore};
pub use config::Config;
pub use session::{
    CommandOutput, Frontend, SessionContext, SessionController, SessionEvent, SessionState,
};
