use serde::{Deserialize, Serialize};

/// Configuration for the vector store adapter (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    pub qdrant_url: String,
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: u64,
    /// HNSW `ef` used at search time (default: 128, per §4.7).
    #[serde(default = "default_hnsw_ef")]
    pub search_hnsw_ef: u64,
}

fn default_collection_name() -> String {
    "notebook".to_string()
}
fn default_embedding_dim() -> u64 {
    1536
}
fn default_hnsw_ef() -> u64 {
    128
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            qdrant_url: "http://localhost:6334".to_string(),
            collection_name: default_collection_name(),
            embedding_dim: default_embedding_dim(),
            search_hnsw_ef: default_hnsw_ef(),
        }
    }
}
