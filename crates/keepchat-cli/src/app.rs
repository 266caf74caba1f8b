use anyhow::{bail, Result};
use crossterm::style::Stylize;
use keepchat_core::{
    constants::display,
    llm::{LocalDiscovery, OllamaClient},
    CommandOutput, Frontend, HistorySummary, Role, SessionContext, SessionController,
    SessionEvent, SessionStore,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::commands::{self, CommandResult};
use crate::input::{self, LineRead, MultilineBuffer, MultilineStep};
use crate::theme::Theme;

/// Options collected from the command line.
pub struct RunOptions {
    pub data_dir: Option<PathBuf>,
    pub model: Option<String>,
    pub max_history: Option<usize>,
    pub no_stream: bool,
    pub ollama_url: Option<String>,
    pub theme: String,
}

// ── Terminal front end ──────────────────────────────────────────────────

/// Line-oriented terminal: colored output on stdout, input from stdin.
pub struct TerminalFrontend {
    theme: Theme,
    lines: Lines<BufReader<Stdin>>,
    reply_started: bool,
}

impl TerminalFrontend {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            lines: BufReader::new(tokio::io::stdin()).lines(),
            reply_started: false,
        }
    }

    fn assistant_label(&mut self) {
        if !self.reply_started {
            println!("\n{}", "Assistant:".with(self.theme.assistant_color).bold());
            self.reply_started = true;
        }
    }

    fn notice(&self, text: &str) {
        println!("{}", text.with(self.theme.warning));
    }

    fn error(&self, text: &str) {
        println!("{}", text.with(self.theme.error));
    }

    fn success(&self, text: &str) {
        println!("{}", text.with(self.theme.success));
    }

    async fn next_line(&mut self) -> LineRead {
        tokio::select! {
            line = self.lines.next_line() => match line {
                Ok(Some(line)) => LineRead::Line(line),
                Ok(None) => LineRead::Closed,
                Err(e) => {
                    tracing::warn!("failed to read stdin: {e}");
                    LineRead::Closed
                }
            },
            _ = interrupted() => {
                println!();
                LineRead::Interrupted
            }
        }
    }

    /// Collect lines until `END` or EOF. Ctrl-C discards them.
    pub async fn read_multiline(&mut self) -> Option<String> {
        self.notice("Multi-line mode: type your message, then END on its own line (Ctrl-C cancels).");
        let mut buffer = MultilineBuffer::new();
        let text = loop {
            match buffer.feed(self.next_line().await) {
                MultilineStep::More => {}
                MultilineStep::Finished(text) => break text,
                MultilineStep::Cancelled => {
                    self.notice("Multi-line input cancelled.");
                    return None;
                }
            }
        };
        if text.is_empty() {
            self.notice("Empty message, nothing sent.");
            return None;
        }
        Some(text)
    }

    /// Read a message from a file, asking for the path when none was given.
    pub async fn read_file(&mut self, path: Option<String>) -> Option<String> {
        let path = match path {
            Some(path) => path,
            None => self.read_line("File path:").await?,
        };
        match input::read_message_file(&path) {
            Ok(text) => {
                self.success(&format!("Read {} characters from file.", text.chars().count()));
                Some(text)
            }
            Err(e) => {
                self.error(&format!("{e:#}"));
                None
            }
        }
    }

    fn render_summary(&self, summary: &HistorySummary) {
        if summary.total_count == 0 {
            self.notice("No previous chat history found.");
            return;
        }

        println!(
            "{}",
            format!("Chat history: {} messages", summary.total_count).with(self.theme.accent)
        );
        if summary.hidden_count() > 0 {
            println!(
                "{}",
                format!("  ... {} earlier messages", summary.hidden_count()).with(self.theme.muted)
            );
        }
        for message in &summary.recent {
            let color = match message.role {
                Role::User => self.theme.user_color,
                Role::Assistant => self.theme.assistant_color,
                Role::System => self.theme.warning,
            };
            let when = message
                .timestamp
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M");
            println!(
                "  {} {} {}",
                format!("[{when}]").with(self.theme.muted),
                format!("{}:", message.role.label()).with(color),
                input::format_preview(&message.content, display::PREVIEW_CHARS)
            );
        }
    }

    fn render_command(&self, output: CommandOutput) {
        match output {
            CommandOutput::Help(text) => {
                println!("{}", text.with(self.theme.warning));
                println!("{}", commands::help_extras().with(self.theme.warning));
            }
            CommandOutput::Summary(summary) => self.render_summary(&summary),
            CommandOutput::SystemPrompt(current) => {
                println!("{}", "Current system prompt:".with(self.theme.accent));
                println!("{current}");
            }
            CommandOutput::SystemPromptUpdated => self.success("System prompt updated!"),
            CommandOutput::SystemPromptUnchanged => self.notice("System prompt unchanged."),
            CommandOutput::HistoryCleared => self.success("Chat history cleared!"),
            CommandOutput::HistoryPreserved => self.notice("Chat history preserved."),
            CommandOutput::Farewell { goodbye: true } => println!(
                "{}",
                "Goodbye! Your chat history has been saved. See you next time!"
                    .with(self.theme.farewell)
            ),
            CommandOutput::Farewell { goodbye: false } => {
                self.success("Chat history saved. Goodbye!")
            }
        }
    }
}

#[async_trait::async_trait]
impl Frontend for TerminalFrontend {
    fn emit(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::UserMessage(_) => self.reply_started = false,
            SessionEvent::AssistantFragment(text) => {
                self.assistant_label();
                print!("{text}");
                let _ = io::stdout().flush();
            }
            SessionEvent::AssistantComplete { content, streamed } => {
                if streamed && self.reply_started {
                    println!();
                } else {
                    self.assistant_label();
                    println!("{content}");
                }
                println!();
            }
            SessionEvent::CommandResult(output) => self.render_command(output),
            SessionEvent::Notice(text) => {
                if self.reply_started {
                    println!();
                }
                self.notice(&text);
            }
            SessionEvent::Error(text) => {
                if self.reply_started {
                    println!();
                }
                self.error(&text);
            }
        }
    }

    async fn read_line(&mut self, prompt: &str) -> Option<String> {
        print!("{} ", prompt.with(self.theme.user_color).bold());
        let _ = io::stdout().flush();
        match self.next_line().await {
            LineRead::Line(line) => Some(line),
            LineRead::Closed | LineRead::Interrupted => None,
        }
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

// ── Startup ─────────────────────────────────────────────────────────────

fn open_context(opts: &RunOptions) -> Result<SessionContext> {
    let store = match &opts.data_dir {
        Some(dir) => SessionStore::with_dir(dir),
        None => SessionStore::new()?,
    };
    Ok(SessionContext::load(store))
}

fn print_banner(theme: &Theme) {
    println!("{}", "=".repeat(60).with(theme.accent));
    println!(
        "{}",
        "keepchat - persistent chat with local Ollama models"
            .with(theme.accent)
            .bold()
    );
    println!("{}", "=".repeat(60).with(theme.accent));
}

/// Ask which installed model to use. `None` means no model could be chosen.
async fn select_model(
    term: &mut TerminalFrontend,
    base_url: &str,
    last_used: Option<&str>,
) -> Option<String> {
    let models = match LocalDiscovery::ollama_models(base_url).await {
        Ok(models) => models,
        Err(e) => {
            term.error(&format!("Could not list models at {base_url}: {e}"));
            if let Some(last) = last_used {
                term.notice(&format!("Using last used model '{last}'."));
                return Some(last.to_string());
            }
            return None;
        }
    };
    if models.is_empty() {
        term.error(
            "No Ollama models found. Please install a model first using 'ollama pull <model_name>'",
        );
        return None;
    }

    println!("\n{}", "Available models:".with(term.theme.accent));
    for (i, model) in models.iter().enumerate() {
        let marker = if Some(model.name.as_str()) == last_used {
            format!(" {}", "(last used)".with(term.theme.success))
        } else {
            String::new()
        };
        println!("  {}. {}{marker}", i + 1, model.display_name());
    }

    let names: Vec<String> = models.into_iter().map(|m| m.name).collect();
    let prompt = if last_used.is_some() {
        format!("Select model (1-{}) or press Enter for last used:", names.len())
    } else {
        format!("Select model (1-{}):", names.len())
    };
    loop {
        let answer = term.read_line(&prompt).await?;
        match commands::resolve_model_choice(&answer, &names, last_used) {
            Ok(model) => return Some(model),
            Err(msg) => term.error(&msg),
        }
    }
}

/// Open the session for `model`, applying the per-run overrides.
fn build_session(
    mut context: SessionContext,
    model: &str,
    opts: &RunOptions,
) -> Result<SessionController> {
    if let Err(e) = context.select_model(model) {
        tracing::error!("{e}");
    }
    let base_url = opts
        .ollama_url
        .clone()
        .unwrap_or_else(|| context.config().ollama_url().to_string());
    let client = OllamaClient::new(model)
        .with_base_url(base_url)?
        .with_timeout(context.config().request_timeout());

    let mut session = SessionController::new(context, Box::new(client));
    if opts.no_stream {
        session = session.with_streaming(false);
    }
    Ok(session)
}

fn apply_max_history(context: &mut SessionContext, max_history: Option<usize>) -> Result<()> {
    if let Some(max) = max_history {
        if max == 0 {
            bail!("--max-history must be greater than 0");
        }
        if let Err(e) = context.set_max_history_length(max) {
            tracing::error!("{e}");
            eprintln!("{e}");
        }
    }
    Ok(())
}

// ── Single-prompt mode ──────────────────────────────────────────────────

/// Run one turn against the saved session and print the reply.
pub async fn run_single_prompt(opts: RunOptions, prompt: &str) -> Result<()> {
    let mut context = open_context(&opts)?;
    apply_max_history(&mut context, opts.max_history)?;

    let model = match opts
        .model
        .clone()
        .or_else(|| context.config().last_used_model.clone())
    {
        Some(model) => model,
        None => bail!("No model selected. Pass --model or run keepchat interactively once."),
    };

    let mut session = build_session(context, &model, &opts)?;
    let mut out = PlainFrontend::default();
    session.start(&mut out);
    session.chat(prompt, &mut out, interrupted()).await?;
    Ok(())
}

/// Prints the reply as plain text and problems on stderr.
#[derive(Default)]
struct PlainFrontend;

#[async_trait::async_trait]
impl Frontend for PlainFrontend {
    fn emit(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::AssistantFragment(text) => {
                print!("{text}");
                let _ = io::stdout().flush();
            }
            SessionEvent::AssistantComplete { content, streamed } => {
                if streamed {
                    println!();
                } else {
                    println!("{content}");
                }
            }
            SessionEvent::Notice(text) | SessionEvent::Error(text) => eprintln!("{text}"),
            SessionEvent::UserMessage(_) | SessionEvent::CommandResult(_) => {}
        }
    }

    async fn read_line(&mut self, _prompt: &str) -> Option<String> {
        None
    }
}

// ── Interactive mode ────────────────────────────────────────────────────

pub async fn run_interactive(opts: RunOptions) -> Result<()> {
    let theme = Theme::by_name(&opts.theme);
    let mut term = TerminalFrontend::new(theme.clone());
    let mut context = open_context(&opts)?;
    apply_max_history(&mut context, opts.max_history)?;

    print_banner(&theme);
    println!(
        "{}",
        format!("Data directory: {}", context.store().base_dir().display()).with(theme.muted)
    );
    term.render_summary(&context.history().summary(display::SUMMARY_RECENT));

    let model = match opts.model.clone() {
        Some(model) => model,
        None => {
            let base_url = opts
                .ollama_url
                .clone()
                .unwrap_or_else(|| context.config().ollama_url().to_string());
            let last_used = context.config().last_used_model.clone();
            match select_model(&mut term, &base_url, last_used.as_deref()).await {
                Some(model) => model,
                None => return Ok(()),
            }
        }
    };

    let mut session = build_session(context, &model, &opts)?;
    session.start(&mut term);

    println!(
        "\n{}",
        format!("Chatting with {}. Type /help for commands.", session.model())
            .with(theme.success)
    );
    println!(
        "{}",
        "Ctrl-C interrupts a reply; at the prompt it ends the session.".with(theme.muted)
    );

    loop {
        let Some(line) = term.read_line("\nYou:").await else {
            term.success("Chat ended. Your history has been saved. Goodbye!");
            break;
        };
        let line = input::clean_input(&line);

        let message = match commands::handle_command(&line) {
            CommandResult::Multiline => term.read_multiline().await,
            CommandResult::ReadFile(path) => term.read_file(path).await,
            CommandResult::NotACommand => {
                session
                    .handle_input_until(&line, &mut term, interrupted())
                    .await;
                if session.is_ended() {
                    break;
                }
                continue;
            }
        };

        if let Some(message) = message {
            // Failures are already shown by the session.
            let _ = session.chat(&message, &mut term, interrupted()).await;
        }
    }

    Ok(())
}
