// Library side of keepchat-cli, so integration tests can reach the pure
// helpers. main.rs declares the same files as modules; the path attributes
// keep each file owned by one module tree per target.

#[path = "commands.rs"]
pub mod commands;

#[path = "input.rs"]
pub mod input;

#[path = "theme.rs"]
pub mod theme;

pub use commands::{handle_command, CommandResult};
pub use input::{clean_input, format_preview, LineRead, MultilineBuffer, MultilineStep};
pub use theme::Theme;
