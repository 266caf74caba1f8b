use crate::context::HistorySummary;

/// Everything the session wants shown, in the order it happens.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Echo of the user message about to be sent.
    UserMessage(String),
    /// A piece of streamed assistant output.
    AssistantFragment(String),
    /// The assistant reply is complete and stored. When `streamed` is true
    /// its content was already shown fragment by fragment.
    AssistantComplete { content: String, streamed: bool },
    CommandResult(CommandOutput),
    Notice(String),
    Error(String),
}

/// Output of an interactive command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Help(String),
    Summary(HistorySummary),
    /// The current system prompt, shown before asking for a replacement.
    SystemPrompt(String),
    SystemPromptUpdated,
    SystemPromptUnchanged,
    HistoryCleared,
    HistoryPreserved,
    Farewell { goodbye: bool },
}

/// The terminal (or test harness) the session talks to.
#[async_trait::async_trait]
pub trait Frontend: Send {
    fn emit(&mut self, event: SessionEvent);

    /// Ask the user for one line. `None` means input was closed.
    async fn read_line(&mut self, prompt: &str) -> Option<String>;
}
