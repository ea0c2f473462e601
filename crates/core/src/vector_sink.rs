use crate::model::{Document, DocumentType, VectorPoint};
use async_trait::async_trait;
use uuid::Uuid;

/// Narrow seam the ingestion orchestrator and retriever talk to, kept free
/// of any concrete vector-store dependency so `notebook-core` never depends
/// on `notebook-vectorstore` (which itself depends on `notebook-core` for
/// `Document`/`VectorPoint`). The adapter crate implements both traits.
#[async_trait]
pub trait VectorSink: Send + Sync {
    async fn upsert(&self, points: Vec<VectorPoint>) -> Result<(), String>;
    async fn delete_source(&self, source_id: Uuid) -> Result<(), String>;
}

/// A single scored hit returned from a vector search.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub score: f32,
    pub document: Document,
}

#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn search(
        &self,
        query_vector: Vec<f32>,
        top_k: u64,
        source_ids: &[Uuid],
        doc_type: DocumentType,
    ) -> Result<Vec<SearchHit>, String>;
}
