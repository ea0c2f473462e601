use crate::config::GatewayConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{GatewayError, GatewayResult};
use crate::provider::{TextProvider, VisionProvider};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// The External Service Gateway (§4.6): a single facade over text, vision,
/// and embedding capabilities, with a global concurrency permit, retry with
/// backoff on transient errors, and an order-preserving `batch()`.
pub struct Gateway {
    text: Arc<dyn TextProvider>,
    vision: Arc<dyn VisionProvider>,
    embedding: Arc<dyn EmbeddingProvider>,
    semaphore: Arc<Semaphore>,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(
        text: Arc<dyn TextProvider>,
        vision: Arc<dyn VisionProvider>,
        embedding: Arc<dyn EmbeddingProvider>,
        config: GatewayConfig,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_in_flight));
        Self {
            text,
            vision,
            embedding,
            semaphore,
            config,
        }
    }

    async fn with_retry<T, F, Fut>(&self, f: F) -> GatewayResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = GatewayResult<T>>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("gateway semaphore never closes");

        // Schema-invalid responses get their own, smaller retry bound (§4.6):
        // retried a few times in case the model's next attempt parses, then
        // surfaced as fatal rather than joining the general transient tier.
        let max_attempts = self.config.retry_attempts.max(self.config.schema_retry_attempts);

        let mut last_err = None;
        for attempt in 0..max_attempts {
            let call = f();
            let outcome = tokio::time::timeout(
                std::time::Duration::from_secs(self.config.timeout_s),
                call,
            )
            .await;

            let result = match outcome {
                Ok(r) => r,
                Err(_) => Err(GatewayError::Timeout(self.config.timeout_s)),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let bound = match e {
                        GatewayError::SchemaInvalid(_) => self.config.schema_retry_attempts,
                        _ if e.is_retriable() => self.config.retry_attempts,
                        _ => 0,
                    };
                    if attempt + 1 < bound {
                        tracing::warn!(
                            "gateway call failed (attempt {}/{}): {e}",
                            attempt + 1,
                            bound
                        );
                        let delay = self.config.retry_delay_ms * 2u64.pow(attempt);
                        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                        last_err = Some(e);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(last_err.unwrap_or(GatewayError::Timeout(self.config.timeout_s)))
    }

    /// Submit a text-completion task (tree correction, rerank).
    pub async fn complete_text(&self, prompt: &str) -> GatewayResult<String> {
        self.with_retry(|| self.text.complete(prompt)).await
    }

    /// Submit a vision-completion task (OCR segmentation, image captioning).
    /// `page_image_b64`, when given, accompanies `image_b64` as extra
    /// context (the full page an embedded image or OCR region came from).
    pub async fn describe_image(
        &self,
        image_b64: &str,
        page_image_b64: Option<&str>,
        prompt: &str,
    ) -> GatewayResult<String> {
        self.with_retry(|| self.vision.describe(image_b64, page_image_b64, prompt))
            .await
    }

    /// Submit an embedding task for a batch of texts, order preserved.
    pub async fn embed(&self, texts: &[String]) -> GatewayResult<Vec<Vec<f32>>> {
        self.with_retry(|| self.embedding.embed(texts)).await
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedding.dimension()
    }

    pub async fn check_providers(&self) -> GatewayResult<()> {
        self.text.check().await?;
        self.vision.check().await
    }

    /// Run independent tasks concurrently (bounded by the same permit each
    /// task acquires individually) and return results in the *input* order,
    /// regardless of completion order (§4.6 batch submit contract).
    pub async fn batch<T, Fut>(&self, tasks: Vec<Fut>) -> Vec<GatewayResult<T>>
    where
        T: Send + 'static,
        Fut: Future<Output = GatewayResult<T>> + Send + 'static,
    {
        let mut set = JoinSet::new();
        for (idx, task) in tasks.into_iter().enumerate() {
            set.spawn(async move { (idx, task.await) });
        }

        let mut slots: Vec<Option<GatewayResult<T>>> = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, result)) => {
                    if slots.len() <= idx {
                        slots.resize_with(idx + 1, || None);
                    }
                    slots[idx] = Some(result);
                }
                Err(join_err) => {
                    tracing::error!("gateway batch task panicked: {join_err}");
                }
            }
        }

        slots
            .into_iter()
            .map(|s| s.unwrap_or_else(|| Err(GatewayError::Provider("task never completed".into()))))
            .collect()
    }
}
