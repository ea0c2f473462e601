use crate::config::Language;
use crate::model::ImageAsset;
use crate::prompts::caption_prompt;
use base64::Engine;
use notebook_cache::{Cache, CacheKeys};
use notebook_gateway::Gateway;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Image Captioner (§4.3): produces a short description for an embedded
/// image, conditioned on the image and optional surrounding text, with a
/// byte-hash-keyed cache (§B.2).
pub struct Captioner {
    gateway: Arc<Gateway>,
    cache: Option<Arc<Cache>>,
    cache_keys: CacheKeys,
    lang: Language,
}

impl Captioner {
    pub fn new(gateway: Arc<Gateway>, cache: Option<Arc<Cache>>, lang: Language) -> Self {
        Self {
            gateway,
            cache,
            cache_keys: CacheKeys::default(),
            lang,
        }
    }

    /// Caption a single image, consulting the cache first. `page_image_b64`
    /// is the full page the image was embedded in, given alongside the
    /// cropped asset for extra context (§4.3). A failed caption call
    /// degrades to an empty string rather than failing the page (§4.3, §7:
    /// best-effort per-unit failure).
    pub async fn caption(
        &self,
        asset: &ImageAsset,
        page_image_b64: Option<&str>,
        surrounding_text: Option<&str>,
    ) -> String {
        let hash = image_hash(&asset.bytes);

        if let Some(cache) = &self.cache {
            let key = self.cache_keys.image_caption(&hash);
            if let Ok(Some(cached)) = cache.get::<String>(&key).await {
                return cached;
            }
        }

        let image_b64 = base64::engine::general_purpose::STANDARD.encode(&asset.bytes);
        let prompt = caption_prompt(self.lang, surrounding_text);

        let caption = match self.gateway.describe_image(&image_b64, page_image_b64, &prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    "caption failed for page {} image, degrading to empty caption: {e}",
                    asset.page
                );
                String::new()
            }
        };

        if !caption.is_empty() {
            if let Some(cache) = &self.cache {
                let key = self.cache_keys.image_caption(&hash);
                let _ = cache.set(&key, &caption).await;
            }
        }

        caption
    }
}

fn image_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Find the nearest preceding and following text-bearing strings around
/// `index` in a flat sequence, used as caption context (§4.3, §B.2).
pub fn surrounding_text<'a>(texts: &'a [Option<&'a str>], index: usize) -> Option<String> {
    let prev = texts[..index].iter().rev().flatten().next();
    let next = texts[index + 1..].iter().flatten().next();
    match (prev, next) {
        (Some(p), Some(n)) => Some(format!("{p}\n{n}")),
        (Some(p), None) => Some(p.to_string()),
        (None, Some(n)) => Some(n.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surrounding_text_picks_nearest_neighbors() {
        let texts = vec![Some("a"), None, Some("b"), None, Some("c")];
        assert_eq!(surrounding_text(&texts, 1).unwrap(), "a\nb");
        assert_eq!(surrounding_text(&texts, 3).unwrap(), "b\nc");
    }

    #[test]
    fn surrounding_text_handles_edges() {
        let texts = vec![None, Some("only")];
        assert_eq!(surrounding_text(&texts, 0).unwrap(), "only");
    }
}
