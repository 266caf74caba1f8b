use crate::constants::{defaults, endpoints};
use crate::error::ChatError;
use crate::llm::traits::*;
use futures::channel::mpsc;
use futures::{Stream, StreamExt};
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::chat::{ChatMessage as OllamaChatMessage, MessageRole};
use ollama_rs::Ollama;
use std::time::Duration;

/// Client for a local Ollama daemon.
///
/// Every request is bounded by `timeout`: the whole response in `chat`, and the
/// wait for each chunk in `chat_stream`. Expiry is reported as an error.
pub struct OllamaClient {
    ollama: Ollama,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            ollama: Ollama::default(),
            model: model.into(),
            base_url: endpoints::OLLAMA_BASE_URL.to_string(),
            timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Result<Self, ChatError> {
        let url = url.into();
        self.ollama = Ollama::try_new(url.as_str())
            .map_err(|e| ChatError::Config(format!("Invalid Ollama URL {url}: {e}")))?;
        self.base_url = url;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn to_ollama_messages(messages: &[Message]) -> Vec<OllamaChatMessage> {
        messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::User => MessageRole::User,
                    Role::Assistant => MessageRole::Assistant,
                    Role::System => MessageRole::System,
                };
                OllamaChatMessage::new(role, m.content.clone())
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: &[Message]) -> Result<LlmResponse, ChatError> {
        let request = ChatMessageRequest::new(self.model.clone(), Self::to_ollama_messages(messages));

        let response = tokio::time::timeout(self.timeout, self.ollama.send_chat_messages(request))
            .await
            .map_err(|_| ChatError::Llm(format!("Ollama did not answer within {:?}", self.timeout)))?
            .map_err(|e| ChatError::Llm(format!("Ollama chat error: {e}")))?;

        let content = response
            .message
            .map(|m| m.content)
            .unwrap_or_default();

        let usage = response.final_data.map(|fd| Usage {
            input_tokens: fd.prompt_eval_count as u32,
            output_tokens: fd.eval_count as u32,
        });

        Ok(LlmResponse { content, usage })
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
    ) -> Result<mpsc::UnboundedReceiver<StreamEvent>, ChatError> {
        let request = ChatMessageRequest::new(self.model.clone(), Self::to_ollama_messages(messages));

        let stream = tokio::time::timeout(self.timeout, self.ollama.send_chat_messages_stream(request))
            .await
            .map_err(|_| ChatError::Llm(format!("Ollama did not answer within {:?}", self.timeout)))?
            .map_err(|e| ChatError::Llm(format!("Ollama stream error: {e}")))?;

        let (tx, rx) = mpsc::unbounded();
        let chunks = stream.map(|item| {
            item.map(|response| StreamChunk {
                content: response.message.map(|m| m.content).unwrap_or_default(),
                done: response.done,
            })
        });
        tokio::spawn(forward_chunks(chunks, tx, self.timeout));

        Ok(rx)
    }
}

/// Text and completion flag of one streamed response line.
#[derive(Debug, Clone, PartialEq)]
struct StreamChunk {
    content: String,
    done: bool,
}

/// Turn response chunks into stream events until the reply completes.
///
/// Only a chunk marked `done` produces `Done`; an upstream that ends or fails
/// before that produces `Error`. Returns as soon as the receiver is gone, which
/// drops the upstream stream and its request.
async fn forward_chunks<S>(mut chunks: S, tx: mpsc::UnboundedSender<StreamEvent>, timeout: Duration)
where
    S: Stream<Item = Result<StreamChunk, ()>> + Unpin,
{
    loop {
        if tx.is_closed() {
            tracing::debug!("stream receiver dropped, abandoning reply");
            return;
        }

        let next = match tokio::time::timeout(timeout, chunks.next()).await {
            Ok(next) => next,
            Err(_) => {
                let _ = tx.unbounded_send(StreamEvent::Error(format!(
                    "No response chunk within {timeout:?}"
                )));
                return;
            }
        };

        match next {
            Some(Ok(chunk)) => {
                if !chunk.content.is_empty()
                    && tx.unbounded_send(StreamEvent::TextDelta(chunk.content)).is_err()
                {
                    tracing::debug!("stream receiver dropped, abandoning reply");
                    return;
                }
                if chunk.done {
                    let _ = tx.unbounded_send(StreamEvent::Done);
                    return;
                }
            }
            Some(Err(())) => {
                let _ = tx.unbounded_send(StreamEvent::Error(
                    "Stream deserialization error".to_string(),
                ));
                return;
            }
            None => {
                let _ = tx.unbounded_send(StreamEvent::Error(
                    "Response stream ended before completion".to_string(),
                ));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_roles_map_to_ollama() {
        let converted = OllamaClient::to_ollama_messages(&[
            Message::system("be brief"),
            Message::user("hi"),
            Message::assistant("hello"),
        ]);
        assert_eq!(converted.len(), 3);
        assert_eq!(converted[0].content, "be brief");
        assert_eq!(converted[2].content, "hello");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let result = OllamaClient::new("llama3").with_base_url("not a url");
        assert!(matches!(result, Err(ChatError::Config(_))));
    }

    #[test]
    fn test_builder_keeps_model_and_url() {
        let client = OllamaClient::new("llama3")
            .with_base_url("http://127.0.0.1:11500")
            .unwrap()
            .with_timeout(Duration::from_secs(5));
        assert_eq!(client.model(), "llama3");
        assert_eq!(client.base_url(), "http://127.0.0.1:11500");
        assert_eq!(client.timeout, Duration::from_secs(5));
    }

    fn chunk(content: &str, done: bool) -> Result<StreamChunk, ()> {
        Ok(StreamChunk {
            content: content.to_string(),
            done,
        })
    }

    async fn forward(chunks: Vec<Result<StreamChunk, ()>>) -> Vec<StreamEvent> {
        let (tx, rx) = mpsc::unbounded();
        forward_chunks(futures::stream::iter(chunks), tx, Duration::from_secs(5)).await;
        rx.collect().await
    }

    #[tokio::test]
    async fn test_forward_complete_reply() {
        let events = forward(vec![chunk("Hel", false), chunk("lo", false), chunk("", true)]).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::TextDelta("Hel".into()),
                StreamEvent::TextDelta("lo".into()),
                StreamEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_forward_early_end_is_error() {
        let events = forward(vec![chunk("Hel", false)]).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], StreamEvent::TextDelta("Hel".into()));
        assert!(matches!(events[1], StreamEvent::Error(_)));
        assert!(!events.contains(&StreamEvent::Done));
    }

    #[tokio::test]
    async fn test_forward_upstream_error() {
        let events = forward(vec![chunk("Hel", false), Err(())]).await;
        assert!(matches!(events.last(), Some(StreamEvent::Error(_))));
        assert!(!events.contains(&StreamEvent::Done));
    }

    #[tokio::test]
    async fn test_forward_stops_when_receiver_dropped() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let chunks = futures::stream::iter(vec![chunk("a", false), chunk("b", false), chunk("", true)])
            .inspect(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let (tx, rx) = mpsc::unbounded();
        drop(rx);
        forward_chunks(chunks, tx, Duration::from_secs(5)).await;

        assert_eq!(pulled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_forward_stops_after_failed_send() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let (tx, rx) = mpsc::unbounded();
        let mut rx = Some(rx);
        let chunks = futures::stream::iter(vec![chunk("a", false), chunk("b", false), chunk("", true)])
            .inspect(move |_| {
                // Receiver goes away while the first chunk is in flight.
                rx.take();
                counter.fetch_add(1, Ordering::SeqCst);
            });

        forward_chunks(chunks, tx, Duration::from_secs(5)).await;

        assert_eq!(pulled.load(Ordering::SeqCst), 1);
    }
}
