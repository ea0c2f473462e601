pub mod client;
pub mod config;
pub mod embedding;
pub mod error;
pub mod provider;

pub use client::Gateway;
pub use config::GatewayConfig;
pub use embedding::{EmbeddingProvider, OpenAiCompatibleEmbedding};
pub use error::{GatewayError, GatewayResult};
pub use provider::{create_provider, default_model, TextProvider, VisionProvider};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FlakyText {
        fail_times: AtomicU32,
    }

    #[async_trait::async_trait]
    impl TextProvider for FlakyText {
        async fn complete(&self, prompt: &str) -> GatewayResult<String> {
            if self.fail_times.fetch_sub(1, Ordering::SeqCst) > 0 {
                return Err(GatewayError::Transient {
                    category: "test".into(),
                    message: "flaky".into(),
                });
            }
            Ok(format!("ok:{prompt}"))
        }
        async fn check(&self) -> GatewayResult<()> {
            Ok(())
        }
        fn provider_name(&self) -> &str {
            "test"
        }
        fn model_name(&self) -> &str {
            "test-model"
        }
    }

    struct DummyVision;
    #[async_trait::async_trait]
    impl VisionProvider for DummyVision {
        async fn describe(
            &self,
            _image_b64: &str,
            _page_image_b64: Option<&str>,
            _prompt: &str,
        ) -> GatewayResult<String> {
            Ok("dummy".into())
        }
        async fn check(&self) -> GatewayResult<()> {
            Ok(())
        }
        fn provider_name(&self) -> &str {
            "test"
        }
        fn model_name(&self) -> &str {
            "test-model"
        }
    }

    struct DummyEmbedding;
    #[async_trait::async_trait]
    impl EmbeddingProvider for DummyEmbedding {
        async fn embed(&self, texts: &[String]) -> GatewayResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.0; 4]).collect())
        }
        fn dimension(&self) -> usize {
            4
        }
        fn model_name(&self) -> &str {
            "test-embed"
        }
    }

    fn test_gateway(fail_times: u32) -> Gateway {
        Gateway::new(
            Arc::new(FlakyText {
                fail_times: AtomicU32::new(fail_times),
            }),
            Arc::new(DummyVision),
            Arc::new(DummyEmbedding),
            GatewayConfig {
                max_in_flight: 2,
                retry_attempts: 5,
                schema_retry_attempts: 2,
                retry_delay_ms: 1,
                timeout_s: 5,
            },
        )
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let gw = test_gateway(2);
        let result = gw.complete_text("hi").await.unwrap();
        assert_eq!(result, "ok:hi");
    }

    #[tokio::test]
    async fn exhausts_retries_and_returns_error() {
        let gw = test_gateway(100);
        let result = gw.complete_text("hi").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn batch_preserves_input_order() {
        let gw = Arc::new(test_gateway(0));
        let tasks: Vec<_> = (0..5)
            .map(|i| {
                let gw = Arc::clone(&gw);
                async move {
                    // later indices sleep longer, so completion order is reversed
                    tokio::time::sleep(std::time::Duration::from_millis((5 - i) * 2)).await;
                    gw.complete_text(&format!("{i}")).await
                }
            })
            .collect();

        let results = gw.batch(tasks).await;
        let values: Vec<String> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(
            values,
            vec!["ok:0", "ok:1", "ok:2", "ok:3", "ok:4"]
        );
    }
}
