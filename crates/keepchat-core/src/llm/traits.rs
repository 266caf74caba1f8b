use crate::error::ChatError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Capitalized label used when rendering a message.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::System => "System",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped conversation message. Never mutated after it is appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default = "Utc::now", deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Accepts RFC 3339 timestamps and the offset-less ISO form older history
/// files were written with (read as local time).
mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Events emitted during streaming LLM responses.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextDelta(String),
    Done,
    Error(String),
}

/// The model capability. Implementations provide both whole and streaming chat.
///
/// A stream is finite and cannot be restarted: it ends with exactly one
/// `Done` or `Error`, and a receiver closed before either is a failure.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Name of the model requests are sent to.
    fn model(&self) -> &str;

    /// Send a chat request and get the full response.
    async fn chat(&self, messages: &[Message]) -> Result<LlmResponse, ChatError>;

    /// Send a chat request and get a stream of events.
    async fn chat_stream(
        &self,
        messages: &[Message],
    ) -> Result<futures::channel::mpsc::UnboundedReceiver<StreamEvent>, ChatError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"timestamp\""));
    }

    #[test]
    fn test_timestamp_accepts_naive_iso() {
        let json = r#"{"role":"assistant","content":"ok","timestamp":"2024-03-01T10:15:30.123456"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "ok");
    }

    #[test]
    fn test_timestamp_accepts_rfc3339() {
        let parsed = timestamp::parse("2024-03-01T10:15:30Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T10:15:30+00:00");
    }

    #[test]
    fn test_missing_timestamp_defaults_to_now() {
        let before = Utc::now();
        let msg: Message = serde_json::from_str(r#"{"role":"user","content":"x"}"#).unwrap();
        assert!(msg.timestamp >= before);
    }

    #[test]
    fn test_garbage_timestamp_rejected() {
        let json = r#"{"role":"user","content":"x","timestamp":"yesterday"}"#;
        assert!(serde_json::from_str::<Message>(json).is_err());
    }
}
