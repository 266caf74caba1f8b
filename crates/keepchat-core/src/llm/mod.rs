mod traits;
mod ollama;
pub mod discovery;

pub use traits::*;
pub use ollama::OllamaClient;
pub use discovery::{LocalDiscovery, LocalModel};
