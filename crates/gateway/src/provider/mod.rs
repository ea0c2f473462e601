pub mod anthropic;
pub mod ollama;
pub mod openai;

use crate::error::{GatewayError, GatewayResult};

/// A remote model capable of plain-text completions (tree correction, rerank).
#[async_trait::async_trait]
pub trait TextProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> GatewayResult<String>;
    async fn check(&self) -> GatewayResult<()>;
    fn provider_name(&self) -> &str;
    fn model_name(&self) -> &str;
}

/// A remote model capable of describing an image (OCR segmentation, captioning).
/// `page_image_b64`, when present, is the full page image given alongside a
/// cropped image asset for extra context (§4.3).
#[async_trait::async_trait]
pub trait VisionProvider: Send + Sync {
    async fn describe(
        &self,
        image_b64: &str,
        page_image_b64: Option<&str>,
        prompt: &str,
    ) -> GatewayResult<String>;
    async fn check(&self) -> GatewayResult<()>;
    fn provider_name(&self) -> &str;
    fn model_name(&self) -> &str;
}

/// Default model for each provider.
pub fn default_model(provider_name: &str) -> &'static str {
    match provider_name {
        "ollama" => "qwen2.5vl",
        "openai" => "gpt-4o",
        "claude" => "claude-opus-4-6",
        _ => "qwen2.5vl",
    }
}

/// Factory: create a text+vision provider pair by name and model.
pub fn create_provider(
    provider_name: &str,
    model: &str,
) -> GatewayResult<(Box<dyn TextProvider>, Box<dyn VisionProvider>)> {
    match provider_name {
        "ollama" => Ok((
            Box::new(ollama::OllamaProvider::new(model)),
            Box::new(ollama::OllamaProvider::new(model)),
        )),
        "openai" => Ok((
            Box::new(openai::OpenAiProvider::new(model)),
            Box::new(openai::OpenAiProvider::new(model)),
        )),
        "claude" => Ok((
            Box::new(anthropic::AnthropicProvider::new(model)),
            Box::new(anthropic::AnthropicProvider::new(model)),
        )),
        other => Err(GatewayError::Config(format!(
            "unknown provider '{other}'. Use: ollama | openai | claude"
        ))),
    }
}
