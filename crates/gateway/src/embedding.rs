use crate::error::{GatewayError, GatewayResult};
use serde_json::json;

/// A remote model capable of turning text into vectors.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String]) -> GatewayResult<Vec<Vec<f32>>>;
    fn dimension(&self) -> usize;
    fn model_name(&self) -> &str;
}

/// Embedding provider calling an OpenAI-compatible `/v1/embeddings` endpoint.
///
/// `genai`'s chat-completion surface is used for text/vision tasks, but its
/// embeddings API shape isn't depended on here; a direct REST call mirrors
/// the way the Ollama provider already probes its host with plain `reqwest`.
pub struct OpenAiCompatibleEmbedding {
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
    client: reqwest::Client,
}

impl OpenAiCompatibleEmbedding {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            model: model.into(),
            dimension,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiCompatibleEmbedding {
    async fn embed(&self, texts: &[String]) -> GatewayResult<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let mut req = self.client.post(&url).json(&json!({
            "model": self.model,
            "input": texts,
        }));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(|e| GatewayError::Transient {
            category: "embedding".into(),
            message: e.to_string(),
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(if status.as_u16() == 429 || status.is_server_error() {
                GatewayError::Transient {
                    category: "embedding".into(),
                    message: format!("{status}: {body}"),
                }
            } else {
                GatewayError::Permanent {
                    status: status.to_string(),
                    message: body,
                }
            });
        }

        let body: serde_json::Value = resp.json().await.map_err(|e| {
            GatewayError::SchemaInvalid(format!("non-JSON embeddings response: {e}"))
        })?;

        let data = body["data"]
            .as_array()
            .ok_or_else(|| GatewayError::SchemaInvalid("missing 'data' array".into()))?;

        let mut vectors = Vec::with_capacity(data.len());
        for item in data {
            let arr = item["embedding"]
                .as_array()
                .ok_or_else(|| GatewayError::SchemaInvalid("missing 'embedding' array".into()))?;
            let vec: Vec<f32> = arr.iter().filter_map(|v| v.as_f64()).map(|v| v as f32).collect();
            vectors.push(vec);
        }

        if vectors.len() != texts.len() {
            return Err(GatewayError::SchemaInvalid(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
