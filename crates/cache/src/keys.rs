/// Cache key scheme (§6): `"{prefix}:doc:flat:{file_hash_hex}"` for the
/// per-file flat-node cache, `"{prefix}:image:caption:{image_hash_hex}"` for
/// per-image captions.
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn flat_nodes(&self, file_hash_hex: &str) -> String {
        format!("{}:doc:flat:{file_hash_hex}", self.prefix)
    }

    pub fn image_caption(&self, image_hash_hex: &str) -> String {
        format!("{}:image:caption:{image_hash_hex}", self.prefix)
    }
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self::new("notebook")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_flat_node_key() {
        let keys = CacheKeys::new("notebook");
        assert_eq!(keys.flat_nodes("abc123"), "notebook:doc:flat:abc123");
    }

    #[test]
    fn formats_image_caption_key() {
        let keys = CacheKeys::new("notebook");
        assert_eq!(
            keys.image_caption("def456"),
            "notebook:image:caption:def456"
        );
    }
}
