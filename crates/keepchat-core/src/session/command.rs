/// An interactive command recognized by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Replace the system prompt, inline when text is given.
    System(Option<String>),
    Clear,
    Summary,
    Quit,
    Goodbye,
}

/// One line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Chat(String),
    Command(Command),
    /// A `/word` that is not a command.
    Unknown(String),
}

pub fn parse_input(raw: &str) -> Input {
    let input = raw.trim();
    if input.is_empty() {
        return Input::Empty;
    }
    if !input.starts_with('/') {
        return Input::Chat(input.to_string());
    }

    let (name, arg) = match input.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (input, ""),
    };

    let command = match name.to_lowercase().as_str() {
        "/help" => Command::Help,
        "/system" => Command::System((!arg.is_empty()).then(|| arg.to_string())),
        "/clear" => Command::Clear,
        "/summary" => Command::Summary,
        "/quit" => Command::Quit,
        "/goodbye" => Command::Goodbye,
        _ => return Input::Unknown(name.to_string()),
    };
    Input::Command(command)
}

pub fn help_text() -> &'static str {
    "\
Commands:
  /help            Show this help
  /system [text]   Edit the system prompt
  /clear           Clear chat history
  /summary         Show chat summary
  /quit            Exit the chat
  /goodbye         End the session with a farewell"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_chat() {
        assert_eq!(parse_input("  hello there "), Input::Chat("hello there".into()));
    }

    #[test]
    fn test_blank_is_empty() {
        assert_eq!(parse_input(" \t "), Input::Empty);
    }

    #[test]
    fn test_commands_are_case_insensitive() {
        assert_eq!(parse_input("/HELP"), Input::Command(Command::Help));
        assert_eq!(parse_input("/Clear"), Input::Command(Command::Clear));
        assert_eq!(parse_input("/summary"), Input::Command(Command::Summary));
        assert_eq!(parse_input("/QuIt"), Input::Command(Command::Quit));
        assert_eq!(parse_input("/goodbye"), Input::Command(Command::Goodbye));
    }

    #[test]
    fn test_system_with_and_without_text() {
        assert_eq!(parse_input("/system"), Input::Command(Command::System(None)));
        assert_eq!(
            parse_input("/SYSTEM  You are terse. "),
            Input::Command(Command::System(Some("You are terse.".into())))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(parse_input("/frobnicate now"), Input::Unknown("/frobnicate".into()));
        assert_eq!(parse_input("/"), Input::Unknown("/".into()));
    }

    #[test]
    fn test_help_lists_every_command() {
        for name in ["/help", "/system", "/clear", "/summary", "/quit", "/goodbye"] {
            assert!(help_text().contains(name), "{name} missing from help");
        }
    }
}
