use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Strip terminal artifacts from a line typed at the prompt: ANSI escape
/// sequences, arrow keys echoed as `^[[A`, stray control characters.
/// Runs of whitespace collapse to one space.
pub fn clean_input(text: &str) -> String {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").expect("valid ANSI pattern"),
            Regex::new(r"\^?\[\[[0-9;]*[a-zA-Z]").expect("valid echo pattern"),
            Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f]").expect("valid control pattern"),
        ]
    });

    let mut cleaned = text.to_string();
    for pattern in patterns {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Shorten `text` to at most `max_chars` characters plus `...`, preferring to
/// cut at a space within the last 20 characters.
pub fn format_preview(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }

    let break_point = (max_chars.saturating_sub(20)..max_chars)
        .find(|&i| chars[i] == ' ')
        .unwrap_or(max_chars);
    let preview: String = chars[..break_point].iter().collect();
    format!("{}...", preview.trim_end())
}

/// Outcome of waiting for one line at the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    Line(String),
    /// End of input.
    Closed,
    /// Ctrl-C while waiting.
    Interrupted,
}

/// What multi-line mode does after a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultilineStep {
    More,
    Finished(String),
    Cancelled,
}

/// Lines collected in multi-line mode. `END` on its own line or EOF sends
/// them; Ctrl-C throws them away.
#[derive(Debug, Default)]
pub struct MultilineBuffer {
    lines: Vec<String>,
}

impl MultilineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, read: LineRead) -> MultilineStep {
        match read {
            LineRead::Line(line) if line.trim() == "END" => MultilineStep::Finished(self.take_text()),
            LineRead::Line(line) => {
                self.lines.push(line);
                MultilineStep::More
            }
            LineRead::Closed => MultilineStep::Finished(self.take_text()),
            LineRead::Interrupted => {
                self.lines.clear();
                MultilineStep::Cancelled
            }
        }
    }

    fn take_text(&mut self) -> String {
        std::mem::take(&mut self.lines).join("\n").trim().to_string()
    }
}

/// Read a message from a UTF-8 text file. `~` expands to the home directory.
pub fn read_message_file(raw_path: &str) -> Result<String> {
    let raw_path = raw_path.trim();
    if raw_path.is_empty() {
        bail!("No file path provided.");
    }
    let path = expand_home(raw_path);

    if !path.exists() {
        bail!("File '{}' does not exist.", path.display());
    }
    if !path.is_file() {
        bail!("'{}' is not a file.", path.display());
    }

    let bytes = std::fs::read(&path)
        .with_context(|| format!("Error reading file '{}'", path.display()))?;
    let content = String::from_utf8(bytes)
        .map_err(|_| anyhow::anyhow!("Could not read '{}' as UTF-8 text.", path.display()))?;

    let content = content.trim();
    if content.is_empty() {
        bail!("File '{}' is empty.", path.display());
    }
    Ok(content.to_string())
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
