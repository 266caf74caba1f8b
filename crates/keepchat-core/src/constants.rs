//! File names, defaults and limits shared by the core and the CLI.

// ─── Defaults ─────────────────────────────────────────────────────────────────

pub mod defaults {
    pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant. You maintain context across \
        conversations and remember previous discussions.";
    pub const MAX_HISTORY_LENGTH: usize = 100;
    pub const REQUEST_TIMEOUT_SECS: u64 = 300;
    pub const STREAM_RESPONSES: bool = true;
    pub const CONFIRM_CLEAR: bool = true;
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";
}

// ─── Data Directory ───────────────────────────────────────────────────────────

pub mod paths {
    pub const DATA_DIR: &str = ".keepchat";
    pub const HISTORY_FILE: &str = "chat_history.json";
    pub const SYSTEM_PROMPT_FILE: &str = "system_prompt.txt";
    pub const CONFIG_FILE: &str = "config.toml";
}

// ─── Display ──────────────────────────────────────────────────────────────────

pub mod display {
    /// Messages shown by `/summary` and the startup summary.
    pub const SUMMARY_RECENT: usize = 5;
    /// Width of a message preview in the summary.
    pub const PREVIEW_CHARS: usize = 100;
}
