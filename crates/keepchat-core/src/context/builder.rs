use crate::llm::Message;

/// Assemble the messages sent to the model for one turn:
/// the system prompt, the stored history as is, then the new user message.
///
/// `new_user_message` must not already be in `history`; the caller appends it
/// to the history store only after the request is built.
pub fn build_request(system_prompt: &str, history: &[Message], new_user_message: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system_prompt));
    messages.extend_from_slice(history);
    messages.push(Message::user(new_user_message));
    messages
}
