/// Result of checking a line for terminal-only commands.
///
/// Session commands (`/help`, `/system`, ...) are not handled here; they pass
/// through as `NotACommand` and the session interprets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Collect several lines and send them as one message.
    Multiline,
    /// Send the contents of a text file. The path is asked for when absent.
    ReadFile(Option<String>),
    /// Hand the line to the session.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    let (cmd, arg) = match input.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (input, ""),
    };

    match cmd.to_lowercase().as_str() {
        "/multiline" => CommandResult::Multiline,
        "/file" => CommandResult::ReadFile((!arg.is_empty()).then(|| arg.to_string())),
        _ => CommandResult::NotACommand,
    }
}

/// Help lines for the commands handled by the terminal itself.
pub fn help_extras() -> &'static str {
    "\
  /multiline       Enter multi-line input mode
  /file [path]     Read input from a text file"
}

/// Resolve the answer to the model selection prompt.
///
/// Empty input picks the last used model; otherwise the answer is a
/// 1-based index into `models`.
pub fn resolve_model_choice(
    choice: &str,
    models: &[String],
    last_used: Option<&str>,
) -> Result<String, String> {
    let choice = choice.trim();
    if choice.is_empty() {
        return last_used
            .map(str::to_string)
            .ok_or_else(|| "No previous model found. Please select a model.".to_string());
    }

    let index: usize = choice
        .parse()
        .map_err(|_| "Invalid input. Please enter a number.".to_string())?;
    match index.checked_sub(1).and_then(|i| models.get(i)) {
        Some(model) => Ok(model.clone()),
        None => Err(format!(
            "Invalid selection. Please choose 1-{}",
            models.len()
        )),
    }
}
