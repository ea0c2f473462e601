use crate::json_util::extract_json_array;
use crate::model::DocumentType;
use crate::prompts::rerank_prompt;
use crate::vector_sink::{SearchHit, VectorSearch};
use notebook_gateway::Gateway;
use std::sync::Arc;
use uuid::Uuid;

/// A retrieved text chunk, shaped for direct UI rendering (§6).
#[derive(Debug, Clone, serde::Serialize)]
pub struct RetrievedText {
    pub content: String,
    pub page: u32,
    pub file_path: String,
    pub filename: String,
    pub breadcrumb: String,
}

/// A retrieved image, shaped for direct UI rendering (§6).
#[derive(Debug, Clone, serde::Serialize)]
pub struct RetrievedImage {
    pub caption: String,
    pub image_path: String,
    pub file_path: String,
    pub filename: String,
    pub page: u32,
    pub breadcrumb: String,
}

/// Combined retrieval result (§4.9).
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    pub texts: Vec<RetrievedText>,
    pub images: Vec<RetrievedImage>,
}

const SEARCH_TOP_K: u64 = 10;
const MAX_RESULTS: usize = 3;

pub struct Retriever {
    gateway: Arc<Gateway>,
    vector_search: Arc<dyn VectorSearch>,
}

impl Retriever {
    pub fn new(gateway: Arc<Gateway>, vector_search: Arc<dyn VectorSearch>) -> Self {
        Self { gateway, vector_search }
    }

    /// Embed the question, search both text and image types, rerank each
    /// list independently, and compose the final result (§4.9).
    pub async fn retrieve(&self, question: &str, source_ids: &[Uuid]) -> Result<RetrievalResult, String> {
        let embedded = self
            .gateway
            .embed(&[question.to_string()])
            .await
            .map_err(|e| format!("embedding failed: {e}"))?;
        let query_vector = embedded.into_iter().next().ok_or("embedding returned no vector")?;

        let text_hits = self
            .vector_search
            .search(query_vector.clone(), SEARCH_TOP_K, source_ids, DocumentType::Text)
            .await?;
        let image_hits = self
            .vector_search
            .search(query_vector, SEARCH_TOP_K, source_ids, DocumentType::Image)
            .await?;

        let ranked_text = self.rerank(question, text_hits).await;
        let ranked_image = self.rerank(question, image_hits).await;

        let texts = ranked_text
            .into_iter()
            .take(MAX_RESULTS)
            .map(|hit| RetrievedText {
                content: hit.document.content,
                page: hit.document.metadata.page_start,
                file_path: hit.document.metadata.file_path,
                filename: hit.document.metadata.filename,
                breadcrumb: hit.document.metadata.breadcrumb_joined(),
            })
            .collect();

        let images = ranked_image
            .into_iter()
            .take(MAX_RESULTS)
            .map(|hit| RetrievedImage {
                caption: hit.document.content,
                image_path: hit.document.metadata.image_path.unwrap_or_default(),
                file_path: hit.document.metadata.file_path,
                filename: hit.document.metadata.filename,
                page: hit.document.metadata.page_start,
                breadcrumb: hit.document.metadata.breadcrumb_joined(),
            })
            .collect();

        Ok(RetrievalResult { texts, images })
    }

    /// Rerank `hits` via the text LLM; on any failure fall back to the
    /// top-3 vector-search results by score, already in descending order
    /// (§4.9 failure semantics).
    async fn rerank(&self, question: &str, hits: Vec<SearchHit>) -> Vec<SearchHit> {
        if hits.is_empty() {
            return hits;
        }

        let candidates: Vec<String> = hits.iter().map(|h| h.document.content.clone()).collect();
        let prompt = rerank_prompt(question, &candidates);

        match self.gateway.complete_text(&prompt).await {
            Ok(raw) => match parse_rerank_indices(&raw, hits.len()) {
                Ok(indices) => indices.into_iter().map(|i| hits[i].clone()).collect(),
                Err(e) => {
                    tracing::warn!("rerank response malformed, falling back to vector order: {e}");
                    hits.into_iter().take(MAX_RESULTS).collect()
                }
            },
            Err(e) => {
                tracing::warn!("rerank call failed, falling back to vector order: {e}");
                hits.into_iter().take(MAX_RESULTS).collect()
            }
        }
    }
}

/// Parse the LLM's rerank response: a JSON array of zero-based indices.
/// Duplicates are ignored, out-of-range indices dropped, order preserved.
fn parse_rerank_indices(raw: &str, n: usize) -> Result<Vec<usize>, String> {
    let json_slice = extract_json_array(raw).ok_or("no JSON array found in rerank response")?;
    let parsed: Vec<i64> = serde_json::from_str(json_slice).map_err(|e| format!("malformed rerank JSON: {e}"))?;

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for idx in parsed {
        if idx < 0 || idx as usize >= n {
            continue;
        }
        let idx = idx as usize;
        if seen.insert(idx) {
            out.push(idx);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_out_of_range_and_duplicate_indices() {
        let raw = "[2, 0, 0, 99, -1, 1]";
        let indices = parse_rerank_indices(raw, 3).unwrap();
        assert_eq!(indices, vec![2, 0, 1]);
    }

    #[test]
    fn tolerates_fenced_response() {
        let raw = "```json\n[1, 0]\n```";
        let indices = parse_rerank_indices(raw, 2).unwrap();
        assert_eq!(indices, vec![1, 0]);
    }

    #[test]
    fn empty_array_yields_no_results() {
        let indices = parse_rerank_indices("[]", 5).unwrap();
        assert!(indices.is_empty());
    }
}
