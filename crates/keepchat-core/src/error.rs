use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Failed to read {artifact}: {message}")]
    StorageRead { artifact: String, message: String },

    #[error("Failed to write {artifact}: {message}")]
    StorageWrite { artifact: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Command(String),

    #[error("Response cancelled")]
    Cancelled,
}

impl ChatError {
    pub fn read(artifact: impl Into<String>, message: impl ToString) -> Self {
        Self::StorageRead {
            artifact: artifact.into(),
            message: message.to_string(),
        }
    }

    pub fn write(artifact: impl Into<String>, message: impl ToString) -> Self {
        Self::StorageWrite {
            artifact: artifact.into(),
            message: message.to_string(),
        }
    }

    /// True for failures that lose durability but leave in-memory state intact.
    pub fn is_storage_write(&self) -> bool {
        matches!(self, Self::StorageWrite { .. })
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
