use crate::error::{GatewayError, GatewayResult};
use crate::provider::{TextProvider, VisionProvider};
use genai::chat::{ChatMessage, ChatRequest, ContentPart, MessageContent};
use genai::Client;

/// Provider backed by a local Ollama instance.
pub struct OllamaProvider {
    model: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            client: Client::default(),
        }
    }

    async fn exec(&self, content: MessageContent) -> GatewayResult<String> {
        let request = ChatRequest::from_messages(vec![ChatMessage::user(content)]);
        match self.client.exec_chat(&self.model, request, None).await {
            Ok(response) => Ok(response.first_text().unwrap_or_default().trim().to_string()),
            Err(e) => Err(GatewayError::Transient {
                category: "ollama".into(),
                message: e.to_string(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl TextProvider for OllamaProvider {
    async fn complete(&self, prompt: &str) -> GatewayResult<String> {
        self.exec(MessageContent::from_text(prompt)).await
    }

    async fn check(&self) -> GatewayResult<()> {
        check_ollama_model(&self.model).await
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl VisionProvider for OllamaProvider {
    async fn describe(
        &self,
        image_b64: &str,
        page_image_b64: Option<&str>,
        prompt: &str,
    ) -> GatewayResult<String> {
        let image_part = ContentPart::from_binary_base64("image/png", image_b64, None::<String>);
        let mut content = MessageContent::from_text(prompt).append(image_part);
        if let Some(page_b64) = page_image_b64 {
            let page_part = ContentPart::from_binary_base64("image/png", page_b64, None::<String>);
            content = content.append(page_part);
        }
        self.exec(content).await
    }

    async fn check(&self) -> GatewayResult<()> {
        check_ollama_model(&self.model).await
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

async fn check_ollama_model(model: &str) -> GatewayResult<()> {
    let host = std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".to_string());
    let url = format!("{host}/api/tags");

    let resp = reqwest::get(&url).await.map_err(|e| {
        GatewayError::Provider(format!(
            "cannot connect to Ollama at {host}: {e}. Make sure Ollama is running: ollama serve"
        ))
    })?;

    let body: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| GatewayError::Provider(format!("invalid response from Ollama: {e}")))?;

    let empty = vec![];
    let models = body["models"]
        .as_array()
        .unwrap_or(&empty)
        .iter()
        .filter_map(|m| m["name"].as_str())
        .collect::<Vec<_>>();

    if !models.iter().any(|m| m.contains(model)) {
        return Err(GatewayError::Provider(format!(
            "model '{model}' not found in Ollama. Run: ollama pull {model}. Available: {}",
            if models.is_empty() {
                "none".to_string()
            } else {
                models.join(", ")
            }
        )));
    }

    Ok(())
}
