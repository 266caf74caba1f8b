mod history;
mod builder;
pub mod persistence;

pub use history::{HistoryStore, HistorySummary};
pub use builder::build_request;
pub use persistence::SessionStore;
