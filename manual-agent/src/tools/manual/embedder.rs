//! Text → vector embedding used by the manual index.

use async_trait::async_trait;

use crate::tool_source::ToolSourceError;

/// Embeds texts; returns one vector per input, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ToolSourceError>;
}

#[cfg(feature = "openai")]
pub use openai::OpenAIEmbedder;

#[cfg(feature = "openai")]
mod openai {
    use async_openai::{config::OpenAIConfig, types::embeddings::CreateEmbeddingRequestArgs, Client};
    use async_trait::async_trait;

    use super::Embedder;
    use crate::tool_source::ToolSourceError;

    /// Inputs per embeddings request.
    const BATCH: usize = 64;

    /// Embeddings through an OpenAI-compatible `/embeddings` endpoint (e.g. Ollama with
    /// `nomic-embed-text`).
    pub struct OpenAIEmbedder {
        client: Client<OpenAIConfig>,
        model: String,
    }

    impl OpenAIEmbedder {
        pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
            Self {
                client: Client::with_config(config),
                model: model.into(),
            }
        }

        pub fn ollama(host: &str, port: u16, model: impl Into<String>) -> Self {
            let config = OpenAIConfig::new()
                .with_api_base(format!("http://{}:{}/v1", host, port))
                .with_api_key("ollama");
            Self::with_config(config, model)
        }
    }

    #[async_trait]
    impl Embedder for OpenAIEmbedder {
        async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ToolSourceError> {
            let mut vectors = Vec::with_capacity(texts.len());
            for batch in texts.chunks(BATCH) {
                let input: Vec<String> = batch.iter().map(|t| t.to_string()).collect();
                let request = CreateEmbeddingRequestArgs::default()
                    .model(self.model.clone())
                    .input(input)
                    .build()
                    .map_err(|e| ToolSourceError::InvalidInput(e.to_string()))?;
                let response = self
                    .client
                    .embeddings()
                    .create(request)
                    .await
                    .map_err(|e| ToolSourceError::Transport(format!("embeddings: {}", e)))?;
                let mut data = response.data;
                data.sort_by_key(|d| d.index);
                if data.len() != batch.len() {
                    return Err(ToolSourceError::Transport(format!(
                        "embeddings: expected {} vectors, got {}",
                        batch.len(),
                        data.len()
                    )));
                }
                vectors.extend(data.into_iter().map(|d| d.embedding));
            }
            Ok(vectors)
        }
    }
}
