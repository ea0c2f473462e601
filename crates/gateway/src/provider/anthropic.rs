use crate::error::{GatewayError, GatewayResult};
use crate::provider::{TextProvider, VisionProvider};
use genai::chat::{ChatMessage, ChatRequest, ContentPart, MessageContent};
use genai::Client;

/// Provider backed by the Anthropic API.
pub struct AnthropicProvider {
    model: String,
    client: Client,
}

impl AnthropicProvider {
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
                category: "claude".into(),
                message: e.to_string(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl TextProvider for AnthropicProvider {
    async fn complete(&self, prompt: &str) -> GatewayResult<String> {
        self.exec(MessageContent::from_text(prompt)).await
    }

    async fn check(&self) -> GatewayResult<()> {
        check_api_key()
    }

    fn provider_name(&self) -> &str {
        "claude"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl VisionProvider for AnthropicProvider {
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
        check_api_key()
    }

    fn provider_name(&self) -> &str {
        "claude"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn check_api_key() -> GatewayResult<()> {
    std::env::var("ANTHROPIC_API_KEY")
        .map(|_| ())
        .map_err(|_| GatewayError::Config("ANTHROPIC_API_KEY not set".into()))
}
