use crate::config::VectorStoreConfig;
use crate::error::{VectorStoreError, VectorStoreResult};
use async_trait::async_trait;
use notebook_core::model::{Document, DocumentMetadata, DocumentType, VectorPoint};
use notebook_core::vector_sink::{SearchHit as CoreSearchHit, VectorSearch, VectorSink};
use qdrant_client::qdrant::{
    vectors_config::Config as VectorsConfigVariant, Condition, CreateCollectionBuilder,
    CreateFieldIndexCollectionBuilder, DeletePointsBuilder, Distance, FieldType, Filter,
    PointStruct, SearchParamsBuilder, SearchPointsBuilder, UpsertPointsBuilder, VectorParams,
    VectorsConfig,
};
use qdrant_client::Qdrant;
use std::collections::HashMap;
use uuid::Uuid;

/// A single hit returned from [`VectorStoreAdapter::search`].
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: Uuid,
    pub score: f32,
    pub document: Document,
}

/// Owns a single collection with cosine distance and the configured vector
/// dimension, with payload indexes on `source_id` and `type` (§4.7).
pub struct VectorStoreAdapter {
    client: Qdrant,
    config: VectorStoreConfig,
}

impl VectorStoreAdapter {
    pub async fn connect(config: VectorStoreConfig) -> VectorStoreResult<Self> {
        let client = Qdrant::from_url(&config.qdrant_url)
            .build()
            .map_err(|e| VectorStoreError::Connection(e.to_string()))?;
        let adapter = Self { client, config };
        adapter.ensure_collection().await?;
        Ok(adapter)
    }

    async fn ensure_collection(&self) -> VectorStoreResult<()> {
        let exists = self
            .client
            .collection_exists(&self.config.collection_name)
            .await
            .map_err(|e| VectorStoreError::Collection(e.to_string()))?;

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.config.collection_name).vectors_config(
                        VectorsConfig {
                            config: Some(VectorsConfigVariant::Params(VectorParams {
                                size: self.config.embedding_dim,
                                distance: Distance::Cosine.into(),
                                ..Default::default()
                            })),
                        },
                    ),
                )
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;

            self.client
                .create_field_index(CreateFieldIndexCollectionBuilder::new(
                    &self.config.collection_name,
                    "source_id",
                    FieldType::Keyword,
                ))
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;

            self.client
                .create_field_index(CreateFieldIndexCollectionBuilder::new(
                    &self.config.collection_name,
                    "type",
                    FieldType::Keyword,
                ))
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
        }

        Ok(())
    }

    pub async fn upsert(&self, points: Vec<VectorPoint>) -> VectorStoreResult<()> {
        if points.is_empty() {
            return Ok(());
        }

        let qdrant_points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| {
                let payload = document_to_payload(&p.document);
                PointStruct::new(p.id.to_string(), p.vector, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(
                &self.config.collection_name,
                qdrant_points,
            ))
            .await
            .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;

        Ok(())
    }

    /// Remove all points belonging to a source (used by `delete_source`, §6).
    pub async fn delete_by_source(&self, source_id: Uuid) -> VectorStoreResult<()> {
        let filter = Filter::must([Condition::matches("source_id", source_id.to_string())]);

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.config.collection_name).points(filter),
            )
            .await
            .map_err(|e| VectorStoreError::Delete(e.to_string()))?;

        Ok(())
    }

    /// Search with optional `source_ids` any-of filter and an exact `type` filter.
    pub async fn search(
        &self,
        query_vector: Vec<f32>,
        top_k: u64,
        source_ids: &[Uuid],
        doc_type: DocumentType,
    ) -> VectorStoreResult<Vec<SearchHit>> {
        let mut conditions = vec![Condition::matches("type", doc_type.as_str().to_string())];
        if !source_ids.is_empty() {
            let ids: Vec<String> = source_ids.iter().map(|id| id.to_string()).collect();
            conditions.push(Condition::matches("source_id", ids));
        }
        let filter = Filter::must(conditions);

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.config.collection_name, query_vector, top_k)
                    .filter(filter)
                    .params(SearchParamsBuilder::default().hnsw_ef(self.config.search_hnsw_ef))
                    .with_payload(true),
            )
            .await
            .map_err(|e| VectorStoreError::Search(e.to_string()))?;

        let mut hits = Vec::with_capacity(response.result.len());
        for scored in response.result {
            let id = scored
                .id
                .as_ref()
                .and_then(|pid| pid.point_id_options.clone())
                .and_then(|opt| match opt {
                    qdrant_client::qdrant::point_id::PointIdOptions::Uuid(s) => {
                        Uuid::parse_str(&s).ok()
                    }
                    qdrant_client::qdrant::point_id::PointIdOptions::Num(_) => None,
                })
                .ok_or_else(|| VectorStoreError::Search("point missing UUID id".into()))?;

            let document = payload_to_document(id, scored.score, &scored.payload)?;
            hits.push(SearchHit {
                id,
                score: scored.score,
                document,
            });
        }

        Ok(hits)
    }
}

#[async_trait]
impl VectorSink for VectorStoreAdapter {
    async fn upsert(&self, points: Vec<VectorPoint>) -> Result<(), String> {
        VectorStoreAdapter::upsert(self, points).await.map_err(|e| e.to_string())
    }

    async fn delete_source(&self, source_id: Uuid) -> Result<(), String> {
        VectorStoreAdapter::delete_by_source(self, source_id).await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl VectorSearch for VectorStoreAdapter {
    async fn search(
        &self,
        query_vector: Vec<f32>,
        top_k: u64,
        source_ids: &[Uuid],
        doc_type: DocumentType,
    ) -> Result<Vec<CoreSearchHit>, String> {
        VectorStoreAdapter::search(self, query_vector, top_k, source_ids, doc_type)
            .await
            .map(|hits| hits.into_iter().map(|h| CoreSearchHit { score: h.score, document: h.document }).collect())
            .map_err(|e| e.to_string())
    }
}

fn document_to_payload(doc: &Document) -> HashMap<String, qdrant_client::qdrant::Value> {
    let mut payload = HashMap::new();
    payload.insert("content".to_string(), doc.content.clone().into());
    payload.insert("type".to_string(), doc.doc_type.as_str().to_string().into());
    if let Some(source_id) = doc.source_id {
        payload.insert("source_id".to_string(), source_id.to_string().into());
    }
    payload.insert("file_path".to_string(), doc.metadata.file_path.clone().into());
    payload.insert("filename".to_string(), doc.metadata.filename.clone().into());
    payload.insert(
        "page_start".to_string(),
        (doc.metadata.page_start as i64).into(),
    );
    payload.insert(
        "page_end".to_string(),
        (doc.metadata.page_end as i64).into(),
    );
    payload.insert(
        "breadcrumb".to_string(),
        serde_json::to_string(&doc.metadata.breadcrumb)
            .unwrap_or_default()
            .into(),
    );
    if let Some(image_path) = &doc.metadata.image_path {
        payload.insert("image_path".to_string(), image_path.clone().into());
    }
    payload
}

fn payload_to_document(
    id: Uuid,
    _score: f32,
    payload: &HashMap<String, qdrant_client::qdrant::Value>,
) -> VectorStoreResult<Document> {
    let get_str = |key: &str| -> String {
        payload
            .get(key)
            .and_then(|v| v.as_str().map(|s| s.to_string()))
            .unwrap_or_default()
    };

    let doc_type = match get_str("type").as_str() {
        "image" => DocumentType::Image,
        _ => DocumentType::Text,
    };

    let breadcrumb: Vec<String> = serde_json::from_str(&get_str("breadcrumb")).unwrap_or_default();
    let source_id = payload
        .get("source_id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok());
    let image_path = payload.get("image_path").and_then(|v| v.as_str().map(String::from));

    Ok(Document {
        id,
        doc_type,
        content: get_str("content"),
        source_id,
        metadata: DocumentMetadata {
            file_path: get_str("file_path"),
            filename: get_str("filename"),
            page_start: payload
                .get("page_start")
                .and_then(|v| v.as_integer())
                .unwrap_or(0) as u32,
            page_end: payload
                .get("page_end")
                .and_then(|v| v.as_integer())
                .unwrap_or(0) as u32,
            breadcrumb,
            image_path,
        },
    })
}
