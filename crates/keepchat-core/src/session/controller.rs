use crate::constants::display;
use crate::context::build_request;
use crate::error::{ChatError, Result};
use crate::llm::{LlmClient, Message, StreamEvent};
use crate::session::command::{help_text, parse_input, Command, Input};
use crate::session::context::SessionContext;
use crate::session::events::{CommandOutput, Frontend, SessionEvent};
use futures::StreamExt;
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingInput,
    RunningCompletion,
    HandlingCommand,
    Ended,
}

/// Drives one interactive session: chat turns against the model and the
/// commands that edit session state.
///
/// All work happens through `&mut self`, one input at a time; nothing else can
/// touch the session while a completion is outstanding.
pub struct SessionController {
    context: SessionContext,
    llm: Box<dyn LlmClient>,
    state: SessionState,
    stream_override: Option<bool>,
}

impl SessionController {
    pub fn new(context: SessionContext, llm: Box<dyn LlmClient>) -> Self {
        Self {
            context,
            llm,
            state: SessionState::Idle,
            stream_override: None,
        }
    }

    /// Stream (or not) for this run only, regardless of the saved config.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.stream_override = Some(streaming);
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Settings changes (model selection, history bound) go through here.
    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.context
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ended(&self) -> bool {
        self.state == SessionState::Ended
    }

    /// Report problems found while loading and start waiting for input.
    pub fn start(&mut self, ui: &mut dyn Frontend) {
        for warning in self.context.take_warnings() {
            ui.emit(SessionEvent::Notice(format!("Warning: {warning}")));
        }
        if self.state == SessionState::Idle {
            self.state = SessionState::AwaitingInput;
        }
    }

    /// Handle one line of input with no way to interrupt a reply.
    pub async fn handle_input(&mut self, input: &str, ui: &mut dyn Frontend) -> SessionState {
        self.handle_input_until(input, ui, std::future::pending::<()>())
            .await
    }

    /// Handle one line of input. If `cancel` resolves while a reply is being
    /// received, the reply is abandoned and nothing is stored for it.
    pub async fn handle_input_until<C>(
        &mut self,
        input: &str,
        ui: &mut dyn Frontend,
        cancel: C,
    ) -> SessionState
    where
        C: Future<Output = ()>,
    {
        if self.is_ended() {
            return self.state;
        }
        self.state = SessionState::AwaitingInput;

        match parse_input(input) {
            Input::Empty => {}
            Input::Chat(text) => {
                // Failures are already reported to the front end.
                let _ = self.chat(&text, ui, cancel).await;
            }
            Input::Command(command) => self.run_command(command, ui).await,
            Input::Unknown(name) => {
                let err = ChatError::Command(format!(
                    "Unknown command: {name}. Type /help for commands."
                ));
                ui.emit(SessionEvent::Error(err.to_string()));
            }
        }

        if !self.is_ended() {
            self.state = SessionState::AwaitingInput;
        }
        self.state
    }

    /// Run one chat turn for `text`, bypassing command parsing.
    ///
    /// The user message is stored before the model is called. The reply is
    /// stored only once it is complete; on failure or cancellation the
    /// history keeps the user message alone.
    pub async fn chat<C>(&mut self, text: &str, ui: &mut dyn Frontend, cancel: C) -> Result<String>
    where
        C: Future<Output = ()>,
    {
        if self.is_ended() {
            return Err(ChatError::Command("The session has ended".to_string()));
        }
        self.state = SessionState::RunningCompletion;
        ui.emit(SessionEvent::UserMessage(text.to_string()));

        let request = build_request(
            self.context.system_prompt(),
            &self.context.history().snapshot(),
            text,
        );
        if let Err(e) = self.context.append(Message::user(text)) {
            report_storage_error(ui, &e);
        }

        let streamed = self
            .stream_override
            .unwrap_or(self.context.config().stream_responses);
        tracing::debug!(model = self.llm.model(), messages = request.len(), streamed, "sending request");

        let outcome = if streamed {
            self.stream_reply(&request, ui, cancel).await
        } else {
            self.whole_reply(&request, cancel).await
        };

        let result = match outcome {
            Ok(content) => {
                if let Err(e) = self.context.append(Message::assistant(content.clone())) {
                    report_storage_error(ui, &e);
                }
                ui.emit(SessionEvent::AssistantComplete {
                    content: content.clone(),
                    streamed,
                });
                Ok(content)
            }
            Err(ChatError::Cancelled) => {
                tracing::debug!("reply cancelled");
                ui.emit(SessionEvent::Notice(
                    "Response interrupted. Your message was kept, the partial reply was discarded."
                        .to_string(),
                ));
                Err(ChatError::Cancelled)
            }
            Err(e) => {
                tracing::warn!("model request failed: {e}");
                ui.emit(SessionEvent::Error(format!(
                    "Error communicating with model: {e}"
                )));
                Err(e)
            }
        };

        self.state = SessionState::AwaitingInput;
        result
    }

    /// Forward fragments to the front end while accumulating them; the text
    /// is returned only once the stream reports completion.
    async fn stream_reply<C>(&self, request: &[Message], ui: &mut dyn Frontend, cancel: C) -> Result<String>
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        let mut stream = tokio::select! {
            biased;
            _ = &mut cancel => return Err(ChatError::Cancelled),
            stream = self.llm.chat_stream(request) => stream?,
        };

        let mut content = String::new();
        loop {
            let event = tokio::select! {
                biased;
                _ = &mut cancel => return Err(ChatError::Cancelled),
                event = stream.next() => event,
            };

            match event {
                Some(StreamEvent::TextDelta(delta)) => {
                    content.push_str(&delta);
                    ui.emit(SessionEvent::AssistantFragment(delta));
                }
                Some(StreamEvent::Done) => return Ok(content),
                Some(StreamEvent::Error(err)) => return Err(ChatError::Llm(err)),
                None => {
                    return Err(ChatError::Llm(
                        "Response stream ended before completion".to_string(),
                    ))
                }
            }
        }
    }

    async fn whole_reply<C>(&self, request: &[Message], cancel: C) -> Result<String>
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        let response = tokio::select! {
            biased;
            _ = &mut cancel => return Err(ChatError::Cancelled),
            response = self.llm.chat(request) => response?,
        };
        if let Some(usage) = &response.usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "reply received"
            );
        }
        Ok(response.content)
    }

    async fn run_command(&mut self, command: Command, ui: &mut dyn Frontend) {
        self.state = SessionState::HandlingCommand;

        match command {
            Command::Help => {
                ui.emit(SessionEvent::CommandResult(CommandOutput::Help(
                    help_text().to_string(),
                )));
            }
            Command::System(Some(text)) => self.apply_system_prompt(&text, ui),
            Command::System(None) => {
                ui.emit(SessionEvent::CommandResult(CommandOutput::SystemPrompt(
                    self.context.system_prompt().to_string(),
                )));
                let answer = ui
                    .read_line("Enter new system prompt (or press Enter to keep current):")
                    .await
                    .unwrap_or_default();
                self.apply_system_prompt(&answer, ui);
            }
            Command::Clear => {
                if self.context.config().confirm_clear {
                    let answer = ui
                        .read_line("Are you sure you want to clear all chat history? (yes/no):")
                        .await
                        .unwrap_or_default();
                    if !answer.trim().eq_ignore_ascii_case("yes") {
                        ui.emit(SessionEvent::CommandResult(CommandOutput::HistoryPreserved));
                        return;
                    }
                }
                if let Err(e) = self.context.clear_history() {
                    report_storage_error(ui, &e);
                }
                ui.emit(SessionEvent::CommandResult(CommandOutput::HistoryCleared));
            }
            Command::Summary => {
                let summary = self.context.history().summary(display::SUMMARY_RECENT);
                ui.emit(SessionEvent::CommandResult(CommandOutput::Summary(summary)));
            }
            Command::Quit => self.end(false, ui),
            Command::Goodbye => self.end(true, ui),
        }
    }

    /// History is already on disk after every turn; ending writes nothing.
    fn end(&mut self, goodbye: bool, ui: &mut dyn Frontend) {
        self.state = SessionState::Ended;
        ui.emit(SessionEvent::CommandResult(CommandOutput::Farewell { goodbye }));
    }

    fn apply_system_prompt(&mut self, text: &str, ui: &mut dyn Frontend) {
        let output = match self.context.set_system_prompt(text) {
            Ok(true) => CommandOutput::SystemPromptUpdated,
            Ok(false) => CommandOutput::SystemPromptUnchanged,
            Err(e) => {
                report_storage_error(ui, &e);
                CommandOutput::SystemPromptUpdated
            }
        };
        ui.emit(SessionEvent::CommandResult(output));
    }
}

fn report_storage_error(ui: &mut dyn Frontend, err: &ChatError) {
    tracing::error!("{err}");
    ui.emit(SessionEvent::Error(format!(
        "{err}. The change is kept for this session but is not saved to disk."
    )));
}
