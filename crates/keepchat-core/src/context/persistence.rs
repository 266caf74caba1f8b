use crate::config::Config;
use crate::constants::{defaults, paths};
use crate::error::{ChatError, Result};
use crate::llm::Message;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Reads and writes the three session artifacts in one data directory.
///
/// The store holds no state besides the directory: every load and save is a
/// full read or write of one file. Saves go through a temporary file that is
/// synced and renamed over the target, so a crash mid-write leaves either the
/// old or the new artifact, never a torn one.
///
/// There is no locking. Two processes sharing a data directory will overwrite
/// each other's changes.
#[derive(Debug, Clone)]
pub struct SessionStore {
    base_dir: PathBuf,
}

impl SessionStore {
    /// Create a store using the default directory (~/.keepchat/).
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| ChatError::Config("Could not determine home directory".to_string()))?;
        Ok(Self::with_dir(home.join(paths::DATA_DIR)))
    }

    /// Create a store with a custom directory. Nothing is touched on disk
    /// until the first save or `initialize`.
    pub fn with_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn history_path(&self) -> PathBuf {
        self.base_dir.join(paths::HISTORY_FILE)
    }

    pub fn system_prompt_path(&self) -> PathBuf {
        self.base_dir.join(paths::SYSTEM_PROMPT_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join(paths::CONFIG_FILE)
    }

    /// Create the data directory and write defaults for any missing artifact.
    pub fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir)
            .map_err(|e| ChatError::write(self.base_dir.display().to_string(), e))?;

        if !self.system_prompt_path().exists() {
            self.save_system_prompt(defaults::SYSTEM_PROMPT)?;
        }
        if !self.history_path().exists() {
            self.save_history(&[])?;
        }
        if !self.config_path().exists() {
            self.save_config(&Config::initial())?;
        }
        Ok(())
    }

    // ── History ─────────────────────────────────────────────────────────

    /// Load history, distinguishing a missing artifact (empty) from a
    /// malformed one (error).
    pub fn try_load_history(&self) -> Result<Vec<Message>> {
        let path = self.history_path();
        let Some(contents) = read_optional(&path)? else {
            return Ok(Vec::new());
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&contents).map_err(|e| ChatError::read(display(&path), e))
    }

    /// Load history, falling back to an empty history on any read problem.
    pub fn load_history(&self) -> Vec<Message> {
        self.try_load_history().unwrap_or_else(|e| {
            tracing::warn!("{e}; starting with empty history");
            Vec::new()
        })
    }

    pub fn save_history(&self, messages: &[Message]) -> Result<()> {
        let path = self.history_path();
        let contents =
            serde_json::to_string_pretty(messages).map_err(|e| ChatError::write(display(&path), e))?;
        self.write_atomic(&path, contents.as_bytes())?;
        tracing::debug!(count = messages.len(), "history saved");
        Ok(())
    }

    // ── System prompt ───────────────────────────────────────────────────

    pub fn try_load_system_prompt(&self) -> Result<String> {
        let path = self.system_prompt_path();
        match read_optional(&path)? {
            Some(contents) if !contents.trim().is_empty() => Ok(contents.trim().to_string()),
            _ => Ok(defaults::SYSTEM_PROMPT.to_string()),
        }
    }

    /// Load the system prompt, or the built-in default if there is none.
    pub fn load_system_prompt(&self) -> String {
        self.try_load_system_prompt().unwrap_or_else(|e| {
            tracing::warn!("{e}; using the default system prompt");
            defaults::SYSTEM_PROMPT.to_string()
        })
    }

    pub fn save_system_prompt(&self, prompt: &str) -> Result<()> {
        self.write_atomic(&self.system_prompt_path(), prompt.as_bytes())
    }

    // ── Config ──────────────────────────────────────────────────────────

    pub fn try_load_config(&self) -> Result<Config> {
        let path = self.config_path();
        let Some(contents) = read_optional(&path)? else {
            return Ok(Config::default());
        };
        let mut config: Config =
            toml::from_str(&contents).map_err(|e| ChatError::read(display(&path), e))?;
        for fix in config.normalize() {
            tracing::warn!("{}: {fix}", self::display(&path));
        }
        Ok(config)
    }

    /// Load the config, falling back to defaults on any read problem.
    pub fn load_config(&self) -> Config {
        self.try_load_config().unwrap_or_else(|e| {
            tracing::warn!("{e}; using default configuration");
            Config::default()
        })
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        let path = self.config_path();
        let contents =
            toml::to_string_pretty(config).map_err(|e| ChatError::write(display(&path), e))?;
        self.write_atomic(&path, contents.as_bytes())
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let artifact = display(path);
        fs::create_dir_all(&self.base_dir).map_err(|e| ChatError::write(&artifact, e))?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let written = File::create(&tmp_path).and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            tracing::error!("Failed to write {}: {e}", self::display(&tmp_path));
            return Err(ChatError::write(&artifact, e));
        }

        fs::rename(&tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            tracing::error!("Failed to replace {artifact}: {e}");
            ChatError::write(&artifact, e)
        })
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ChatError::read(display(path), e)),
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
