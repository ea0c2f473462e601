use crate::config::IngestConfig;
use crate::model::{Document, DocumentMetadata, DocumentType, Node, NodeLabel};
use crate::splitter::split_text;
use std::collections::VecDeque;
use uuid::Uuid;

/// Contextual Document Builder (§4.5): breadth-first traversal of the
/// section forest, emitting breadcrumb-prefixed text chunks and one
/// document per image.
pub fn build_documents(
    roots: Vec<Node>,
    source_id: Option<Uuid>,
    file_path: &str,
    filename: &str,
    config: &IngestConfig,
) -> Vec<Document> {
    let mut documents = Vec::new();
    let mut queue: VecDeque<(Node, Vec<String>)> = VecDeque::new();
    for root in roots {
        queue.push_back((root, Vec::new()));
    }

    while let Some((node, breadcrumb)) = queue.pop_front() {
        if node.is_header() {
            let mut crumb = breadcrumb.clone();
            crumb.push(node.content.clone());
            process_header(node, &crumb, source_id, file_path, filename, config, &mut documents, &mut queue);
        } else {
            emit_leaf(node, &breadcrumb, source_id, file_path, filename, config, &mut documents);
        }
    }

    documents
}

#[allow(clippy::too_many_arguments)]
fn process_header(
    node: Node,
    crumb: &[String],
    source_id: Option<Uuid>,
    file_path: &str,
    filename: &str,
    config: &IngestConfig,
    documents: &mut Vec<Document>,
    queue: &mut VecDeque<(Node, Vec<String>)>,
) {
    let mut text_parts: Vec<String> = Vec::new();
    let mut pages: Vec<u32> = Vec::new();
    let mut image_children: Vec<Node> = Vec::new();
    let mut sub_headers: Vec<Node> = Vec::new();

    for child in node.children {
        match child.label {
            NodeLabel::Header => sub_headers.push(child),
            NodeLabel::Text => {
                if !child.content.trim().is_empty() {
                    text_parts.push(child.content.clone());
                }
                pages.push(child.page);
            }
            NodeLabel::Image => {
                pages.push(child.page);
                image_children.push(child);
            }
        }
    }

    if !text_parts.is_empty() {
        let combined = text_parts.join("\n\n");
        let chunks = split_text(&combined, config.chunk_size, config.chunk_overlap);
        let page_start = pages.iter().copied().min().unwrap_or(node.page);
        let page_end = pages.iter().copied().max().unwrap_or(node.page);
        let breadcrumb_prefix = crumb.join(" > ");

        for chunk in chunks {
            documents.push(Document {
                id: Uuid::new_v4(),
                doc_type: DocumentType::Text,
                content: format!("{breadcrumb_prefix}\n\n{chunk}"),
                source_id,
                metadata: DocumentMetadata {
                    file_path: file_path.to_string(),
                    filename: filename.to_string(),
                    page_start,
                    page_end,
                    breadcrumb: crumb.to_vec(),
                    image_path: None,
                },
            });
        }
    }

    let breadcrumb_prefix = crumb.join(" > ");
    for img in image_children {
        let caption = img.content.clone();
        documents.push(Document {
            id: Uuid::new_v4(),
            doc_type: DocumentType::Image,
            content: format!("{breadcrumb_prefix}\n\n{caption}"),
            source_id,
            metadata: DocumentMetadata {
                file_path: file_path.to_string(),
                filename: filename.to_string(),
                page_start: img.page,
                page_end: img.page,
                breadcrumb: crumb.to_vec(),
                image_path: img.image_path.clone(),
            },
        });
    }

    for sub_header in sub_headers {
        queue.push_back((sub_header, crumb.to_vec()));
    }
}

fn emit_leaf(
    node: Node,
    breadcrumb: &[String],
    source_id: Option<Uuid>,
    file_path: &str,
    filename: &str,
    config: &IngestConfig,
    documents: &mut Vec<Document>,
) {
    let breadcrumb_prefix = breadcrumb.join(" > ");
    match node.label {
        NodeLabel::Text => {
            if node.content.trim().is_empty() {
                return;
            }
            for chunk in split_text(&node.content, config.chunk_size, config.chunk_overlap) {
                let content = if breadcrumb.is_empty() {
                    chunk
                } else {
                    format!("{breadcrumb_prefix}\n\n{chunk}")
                };
                documents.push(Document {
                    id: Uuid::new_v4(),
                    doc_type: DocumentType::Text,
                    content,
                    source_id,
                    metadata: DocumentMetadata {
                        file_path: file_path.to_string(),
                        filename: filename.to_string(),
                        page_start: node.page,
                        page_end: node.page,
                        breadcrumb: breadcrumb.to_vec(),
                        image_path: None,
                    },
                });
            }
        }
        NodeLabel::Image => {
            let caption = node.content.clone();
            let content = if breadcrumb.is_empty() {
                caption
            } else {
                format!("{breadcrumb_prefix}\n\n{caption}")
            };
            documents.push(Document {
                id: Uuid::new_v4(),
                doc_type: DocumentType::Image,
                content,
                source_id,
                metadata: DocumentMetadata {
                    file_path: file_path.to_string(),
                    filename: filename.to_string(),
                    page_start: node.page,
                    page_end: node.page,
                    breadcrumb: breadcrumb.to_vec(),
                    image_path: node.image_path.clone(),
                },
            });
        }
        NodeLabel::Header => unreachable!("headers are handled by process_header"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(order_id: u64, title: &str, page: u32, children: Vec<Node>) -> Node {
        Node {
            order_id,
            label: NodeLabel::Header,
            content: title.to_string(),
            page,
            parent_order_id: None,
            image_path: None,
            children,
            file_path: "f.pdf".into(),
            filename: "f.pdf".into(),
        }
    }

    fn text(order_id: u64, content: &str, page: u32) -> Node {
        Node {
            order_id,
            label: NodeLabel::Text,
            content: content.to_string(),
            page,
            parent_order_id: Some(0),
            image_path: None,
            children: Vec::new(),
            file_path: "f.pdf".into(),
            filename: "f.pdf".into(),
        }
    }

    fn image(order_id: u64, path: &str, page: u32) -> Node {
        Node {
            order_id,
            label: NodeLabel::Image,
            content: String::new(),
            page,
            parent_order_id: Some(0),
            image_path: Some(path.to_string()),
            children: Vec::new(),
            file_path: "f.pdf".into(),
            filename: "f.pdf".into(),
        }
    }

    #[test]
    fn two_chapter_forest_yields_matching_text_and_image_documents() {
        let config = IngestConfig::default();
        let roots = vec![
            header(
                0,
                "Chapter 1: Setup",
                1,
                vec![
                    text(1, "paragraph one", 1),
                    text(2, "paragraph two", 1),
                    image(3, "images/p1_1.png", 1),
                ],
            ),
            header(
                4,
                "Chapter 2: Usage",
                2,
                vec![text(5, "usage text", 2), image(6, "images/p2_1.png", 2)],
            ),
        ];

        let docs = build_documents(roots, None, "f.pdf", "f.pdf", &config);

        let text_docs: Vec<_> = docs.iter().filter(|d| d.doc_type == DocumentType::Text).collect();
        let image_docs: Vec<_> = docs.iter().filter(|d| d.doc_type == DocumentType::Image).collect();

        assert_eq!(text_docs.len(), 2);
        assert_eq!(image_docs.len(), 2);
        assert_eq!(text_docs[0].metadata.breadcrumb, vec!["Chapter 1: Setup"]);
        assert_eq!(image_docs[0].metadata.image_path.as_deref(), Some("images/p1_1.png"));
    }

    #[test]
    fn nested_header_breadcrumb_includes_ancestor_titles() {
        let config = IngestConfig::default();
        let roots = vec![header(
            0,
            "1 Intro",
            1,
            vec![header(1, "1.1 Motivation", 1, vec![text(2, "why we built this", 1)])],
        )];

        let docs = build_documents(roots, None, "f.pdf", "f.pdf", &config);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].metadata.breadcrumb, vec!["1 Intro", "1.1 Motivation"]);
        assert!(docs[0].content.starts_with("1 Intro > 1.1 Motivation"));
    }

    #[test]
    fn orphan_text_root_has_empty_breadcrumb() {
        let config = IngestConfig::default();
        let orphan = Node {
            parent_order_id: None,
            ..text(0, "preface text", 1)
        };
        let docs = build_documents(vec![orphan], None, "f.pdf", "f.pdf", &config);
        assert_eq!(docs.len(), 1);
        assert!(docs[0].metadata.breadcrumb.is_empty());
    }

    #[test]
    fn empty_text_children_produce_no_text_documents() {
        let config = IngestConfig::default();
        let roots = vec![header(0, "Empty Chapter", 1, vec![text(1, "   ", 1)])];
        let docs = build_documents(roots, None, "f.pdf", "f.pdf", &config);
        assert!(docs.is_empty());
    }
}
