mod command;
mod context;
mod controller;
mod events;

pub use command::{help_text, parse_input, Command, Input};
pub use context::SessionContext;
pub use controller::{SessionController, SessionState};
pub use events::{CommandOutput, Frontend, SessionEvent};
