use crate::error::ChatError;
use ollama_rs::Ollama;

/// A model installed in the local Ollama daemon.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalModel {
    pub name: String,
    pub size: u64,
}

impl LocalModel {
    /// Name with the on-disk size, e.g. `llama3:8b (4.7GB)`.
    pub fn display_name(&self) -> String {
        format_model_name(&self.name, self.size)
    }
}

/// Discover locally available models from Ollama.
pub struct LocalDiscovery;

impl LocalDiscovery {
    /// List the models installed in the Ollama daemon at `base_url`.
    pub async fn ollama_models(base_url: &str) -> Result<Vec<LocalModel>, ChatError> {
        let ollama = Ollama::try_new(base_url)
            .map_err(|e| ChatError::Config(format!("Invalid Ollama URL: {e}")))?;

        let local_models = ollama
            .list_local_models()
            .await
            .map_err(|e| ChatError::Llm(format!("Ollama not reachable: {e}")))?;

        Ok(local_models
            .into_iter()
            .map(|m| LocalModel {
                name: m.name,
                size: m.size,
            })
            .collect())
    }
}

fn format_model_name(name: &str, size: u64) -> String {
    if size > 0 {
        let gb = size as f64 / 1_073_741_824.0;
        format!("{} ({:.1}GB)", name, gb)
    } else {
        name.to_string()
    }
}
