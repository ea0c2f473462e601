use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded source file, the unit of deletion and source-filtered retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub filename: String,
    pub storage_path: String,
    /// Hex-encoded content hash, used for ingest dedup and cache keys.
    pub content_hash: String,
}

/// An embedded bitmap extracted from a page, persisted under the static directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAsset {
    pub page: u32,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Path relative to the static directory root.
    pub static_path: String,
}

/// A rasterized page, transient: exists only during ingestion.
pub struct PageImage {
    pub page: u32,
    pub png_bytes: Vec<u8>,
    pub base64: String,
    pub images: Vec<ImageAsset>,
    /// Optional cleaned-up hint text extracted locally, passed alongside the
    /// page image to the OCR segmenter as context (§B.6 of SPEC_FULL.md).
    pub hint_text: Option<String>,
}

/// The label assigned to an OCR segment or flat node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeLabel {
    Header,
    Text,
    Image,
}

/// An OCR output unit within a single page, in reading order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub index: u32,
    pub label: NodeLabel,
    pub content: String,
}

/// A unit in the flat, globally ordered pre-tree list (§3 Node).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub order_id: u64,
    pub label: NodeLabel,
    pub content: String,
    pub page: u32,
    pub parent_order_id: Option<u64>,
    pub image_path: Option<String>,
    #[serde(default)]
    pub children: Vec<Node>,
    pub file_path: String,
    pub filename: String,
}

impl Node {
    pub fn is_header(&self) -> bool {
        matches!(self.label, NodeLabel::Header)
    }
    pub fn is_text(&self) -> bool {
        matches!(self.label, NodeLabel::Text)
    }
    pub fn is_image(&self) -> bool {
        matches!(self.label, NodeLabel::Image)
    }
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// The discriminator for a retrieval [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Text,
    Image,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

/// Metadata carried alongside a Document's embedded content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub file_path: String,
    pub filename: String,
    pub page_start: u32,
    pub page_end: u32,
    pub breadcrumb: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

impl DocumentMetadata {
    pub fn breadcrumb_joined(&self) -> String {
        self.breadcrumb.join(" > ")
    }
}

/// A retrieval unit: a text chunk or an image, stored as a single vector point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub content: String,
    pub source_id: Option<Uuid>,
    pub metadata: DocumentMetadata,
}

impl Document {
    /// §3 invariant: page_start <= page_end, and image type implies image_path set.
    pub fn validate(&self) -> Result<(), String> {
        if self.metadata.page_start > self.metadata.page_end {
            return Err(format!(
                "page_start {} > page_end {}",
                self.metadata.page_start, self.metadata.page_end
            ));
        }
        match self.doc_type {
            DocumentType::Image => {
                if self.metadata.image_path.is_none() {
                    return Err("image document missing image_path".into());
                }
            }
            DocumentType::Text => {
                if self.metadata.image_path.is_some() {
                    return Err("text document must not set image_path".into());
                }
            }
        }
        Ok(())
    }
}

/// A `(id, vector, payload)` triple upserted into the vector store.
#[derive(Debug, Clone)]
pub struct VectorPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub document: Document,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc(doc_type: DocumentType, image_path: Option<&str>) -> Document {
        Document {
            id: Uuid::new_v4(),
            doc_type,
            content: "hello".into(),
            source_id: Some(Uuid::new_v4()),
            metadata: DocumentMetadata {
                file_path: "f.pdf".into(),
                filename: "f.pdf".into(),
                page_start: 1,
                page_end: 1,
                breadcrumb: vec!["Chapter 1".into()],
                image_path: image_path.map(|s| s.to_string()),
            },
        }
    }

    #[test]
    fn text_document_rejects_image_path() {
        let doc = sample_doc(DocumentType::Text, Some("images/x.png"));
        assert!(doc.validate().is_err());
    }

    #[test]
    fn image_document_requires_image_path() {
        let doc = sample_doc(DocumentType::Image, None);
        assert!(doc.validate().is_err());
    }

    #[test]
    fn valid_documents_pass() {
        assert!(sample_doc(DocumentType::Text, None).validate().is_ok());
        assert!(
            sample_doc(DocumentType::Image, Some("images/x.png"))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn page_bounds_enforced() {
        let mut doc = sample_doc(DocumentType::Text, None);
        doc.metadata.page_start = 5;
        doc.metadata.page_end = 2;
        assert!(doc.validate().is_err());
    }
}
