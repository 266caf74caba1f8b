use crate::config::Config;
use crate::context::{HistoryStore, SessionStore};
use crate::error::{ChatError, Result};
use crate::llm::Message;

/// The live session state: history, system prompt and configuration.
///
/// Built once at startup from a [`SessionStore`] and then owned by the
/// session controller. Every setter persists its artifact before returning;
/// when the write fails, the in-memory value is still updated and the
/// storage error is returned.
pub struct SessionContext {
    store: SessionStore,
    history: HistoryStore,
    system_prompt: String,
    config: Config,
    warnings: Vec<ChatError>,
}

impl SessionContext {
    /// Load all three artifacts, writing defaults for missing ones.
    /// Unreadable artifacts fall back to defaults; the problems are kept for
    /// [`take_warnings`](Self::take_warnings).
    pub fn load(store: SessionStore) -> Self {
        let mut warnings = Vec::new();

        if let Err(e) = store.initialize() {
            tracing::warn!("{e}");
            warnings.push(e);
        }

        let config = store.try_load_config().unwrap_or_else(|e| {
            tracing::warn!("{e}; using default configuration");
            warnings.push(e);
            Config::default()
        });

        let system_prompt = store.try_load_system_prompt().unwrap_or_else(|e| {
            tracing::warn!("{e}; using the default system prompt");
            warnings.push(e);
            crate::constants::defaults::SYSTEM_PROMPT.to_string()
        });

        let (history, history_warnings) = HistoryStore::load(store.clone(), config.max_history_length);
        warnings.extend(history_warnings);

        tracing::debug!(
            dir = %store.base_dir().display(),
            messages = history.len(),
            "session loaded"
        );

        Self {
            store,
            history,
            system_prompt,
            config,
            warnings,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Problems met while loading, drained so they are reported once.
    pub fn take_warnings(&mut self) -> Vec<ChatError> {
        std::mem::take(&mut self.warnings)
    }

    pub fn append(&mut self, message: Message) -> Result<()> {
        self.history.append(message)
    }

    pub fn clear_history(&mut self) -> Result<()> {
        self.history.clear()
    }

    /// Replace the system prompt. Blank text leaves it unchanged and returns
    /// `Ok(false)`.
    pub fn set_system_prompt(&mut self, prompt: &str) -> Result<bool> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Ok(false);
        }
        self.system_prompt = prompt.to_string();
        self.store.save_system_prompt(&self.system_prompt)?;
        Ok(true)
    }

    /// Remember `model` as the last used model.
    pub fn select_model(&mut self, model: &str) -> Result<()> {
        let model = model.trim();
        if model.is_empty() {
            return Err(ChatError::Command("Model name cannot be empty".to_string()));
        }
        if self.config.last_used_model.as_deref() == Some(model) {
            return Ok(());
        }
        self.config.last_used_model = Some(model.to_string());
        self.store.save_config(&self.config)
    }

    /// Change the history bound, trimming the history if it shrinks.
    pub fn set_max_history_length(&mut self, max: usize) -> Result<()> {
        if max == 0 {
            return Err(ChatError::Command(
                "History length must be greater than 0".to_string(),
            ));
        }
        self.config.max_history_length = max;
        let trimmed = self.history.set_max_messages(max);
        let saved = self.store.save_config(&self.config);
        trimmed.and(saved)
    }
}
