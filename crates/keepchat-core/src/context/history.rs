use crate::context::persistence::SessionStore;
use crate::error::{ChatError, Result};
use crate::llm::{Message, Role};
use std::collections::VecDeque;

/// Message count plus the most recent messages, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub total_count: usize,
    pub recent: Vec<Message>,
}

impl HistorySummary {
    /// Messages older than the ones in `recent`.
    pub fn hidden_count(&self) -> usize {
        self.total_count - self.recent.len()
    }
}

/// Ordered, bounded conversation log that writes itself through to disk.
///
/// The system prompt is not part of the history. Every mutation persists the
/// resulting sequence before returning; if the write fails the in-memory
/// state is kept and the error is returned so the caller can report the gap.
pub struct HistoryStore {
    messages: VecDeque<Message>,
    max_messages: usize,
    store: SessionStore,
}

impl HistoryStore {
    /// Load the persisted history. System-role records are dropped (the
    /// system prompt lives in its own artifact) and a history longer than
    /// `max_messages` is trimmed; either change is written back once.
    ///
    /// Returns the store plus any problems worth telling the user about.
    pub fn load(store: SessionStore, max_messages: usize) -> (Self, Vec<ChatError>) {
        let mut warnings = Vec::new();
        let messages = match store.try_load_history() {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!("{e}; starting with empty history");
                warnings.push(e);
                Vec::new()
            }
        };

        let loaded = messages.len();
        let messages: VecDeque<Message> = messages
            .into_iter()
            .filter(|m| m.role != Role::System)
            .collect();
        let dropped_system = loaded - messages.len();
        if dropped_system > 0 {
            tracing::warn!(dropped = dropped_system, "ignoring system messages stored in history");
        }

        let mut history = Self {
            messages,
            max_messages: max_messages.max(1),
            store,
        };
        if history.trim_if_needed() || dropped_system > 0 {
            if let Err(e) = history.persist() {
                warnings.push(e);
            }
        }
        (history, warnings)
    }

    /// Add a message at the end, trim to the bound and persist.
    pub fn append(&mut self, message: Message) -> Result<()> {
        self.messages.push_back(message);
        self.trim_if_needed();
        self.persist()
    }

    /// Drop every message and persist the empty history.
    pub fn clear(&mut self) -> Result<()> {
        self.messages.clear();
        self.persist()
    }

    /// Copy of the current history, oldest first.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    pub fn summary(&self, limit: usize) -> HistorySummary {
        let skip = self.messages.len().saturating_sub(limit);
        HistorySummary {
            total_count: self.messages.len(),
            recent: self.messages.iter().skip(skip).cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.back()
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Change the bound. Shrinking it trims and persists immediately.
    pub fn set_max_messages(&mut self, max: usize) -> Result<()> {
        if max == 0 {
            return Err(ChatError::Command(
                "History length must be greater than 0".to_string(),
            ));
        }
        self.max_messages = max;
        if self.trim_if_needed() {
            self.persist()?;
        }
        Ok(())
    }

    /// Drop the oldest messages in one step. Returns whether anything was
    /// dropped.
    fn trim_if_needed(&mut self) -> bool {
        let excess = self.messages.len().saturating_sub(self.max_messages);
        if excess == 0 {
            return false;
        }
        self.messages.drain(..excess);
        tracing::debug!(dropped = excess, "history trimmed");
        true
    }

    fn persist(&self) -> Result<()> {
        let (front, back) = self.messages.as_slices();
        if back.is_empty() {
            self.store.save_history(front)
        } else {
            self.store.save_history(&self.snapshot())
        }
    }
}
