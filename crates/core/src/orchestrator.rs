use crate::captioner::Captioner;
use crate::config::{IngestConfig, Language};
use crate::contextual::build_documents;
use crate::error::{CoreError, CoreResult};
use crate::extractor::PdfEngine;
use crate::model::{Node, NodeLabel, PageImage, VectorPoint};
use crate::progress::{ProgressReporter, Stage};
use crate::segmenter::segment_pages;
use crate::tree::build_tree;
use crate::vector_sink::VectorSink;
use notebook_cache::{Cache, CacheKeys};
use notebook_gateway::{Gateway, GatewayError};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of a single `ingest` call (§6).
#[derive(Debug)]
pub struct IngestOutcome {
    pub source_id: Uuid,
    pub documents_indexed: usize,
    /// Best-effort units (pages, images) that were skipped rather than
    /// aborting the whole ingest (§7).
    pub skipped_units: Vec<String>,
}

/// Composes the pipeline for one `(source_id, file_path, output_dir)` per the
/// RECEIVED → ... → DONE/FAILED state machine (§4.8).
pub struct Orchestrator {
    gateway: Arc<Gateway>,
    cache: Option<Arc<Cache>>,
    cache_keys: CacheKeys,
    vector_sink: Arc<dyn VectorSink>,
    config: IngestConfig,
    reporter: Arc<dyn ProgressReporter>,
}

impl Orchestrator {
    pub fn new(
        gateway: Arc<Gateway>,
        cache: Option<Arc<Cache>>,
        vector_sink: Arc<dyn VectorSink>,
        config: IngestConfig,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            gateway,
            cache,
            cache_keys: CacheKeys::default(),
            vector_sink,
            config,
            reporter,
        }
    }

    pub async fn ingest(
        &self,
        source_id: Uuid,
        file_path: &Path,
        output_dir: &Path,
        original_filename: &str,
    ) -> CoreResult<IngestOutcome> {
        let sid = source_id.to_string();
        self.reporter.on_stage(&sid, Stage::Received);

        let bytes = tokio::fs::read(file_path).await?;
        let content_hash = hex_sha256(&bytes);
        let file_path_str = file_path.to_string_lossy().to_string();

        let mut skipped = Vec::new();

        let roots = match self.cached_tree(&content_hash).await {
            Some(roots) => {
                self.reporter.on_stage(&sid, Stage::TreeBuilt);
                roots
            }
            None => {
                let result = self
                    .build_tree_fresh(file_path, output_dir, &file_path_str, original_filename, &sid, &mut skipped)
                    .await;
                let roots = match result {
                    Ok(roots) => roots,
                    Err(e) => {
                        self.reporter.on_stage(&sid, Stage::Failed);
                        return Err(e);
                    }
                };
                if let Some(cache) = &self.cache {
                    let key = self.cache_keys.flat_nodes(&content_hash);
                    if let Err(e) = cache.set(&key, &roots).await {
                        tracing::warn!("failed to cache flat node list for {content_hash}: {e}");
                    }
                }
                roots
            }
        };

        let mut documents = build_documents(roots, Some(source_id), &file_path_str, original_filename, &self.config);
        documents.retain(|d| match d.validate() {
            Ok(()) => true,
            Err(e) => {
                skipped.push(format!("document rejected: {e}"));
                false
            }
        });
        self.reporter.on_stage(&sid, Stage::Chunked);

        let vectors = match self.embed_documents(&documents).await {
            Ok(v) => v,
            Err(e) => {
                self.reporter.on_stage(&sid, Stage::Failed);
                return Err(e.into());
            }
        };
        self.reporter.on_stage(&sid, Stage::Embedded);

        let points: Vec<VectorPoint> = documents
            .into_iter()
            .zip(vectors)
            .map(|(document, vector)| VectorPoint { id: document.id, vector, document })
            .collect();
        let documents_indexed = points.len();

        if let Err(e) = self.vector_sink.upsert(points).await {
            self.reporter.on_stage(&sid, Stage::Failed);
            return Err(CoreError::Tree(format!("vector upsert failed: {e}")));
        }
        self.reporter.on_stage(&sid, Stage::Indexed);
        self.reporter.on_stage(&sid, Stage::Done);
        self.reporter.on_finished(&sid, Stage::Done, skipped.len() as u32);

        Ok(IngestOutcome { source_id, documents_indexed, skipped_units: skipped })
    }

    pub async fn delete_source(&self, source_id: Uuid) -> CoreResult<()> {
        self.vector_sink
            .delete_source(source_id)
            .await
            .map_err(|e| CoreError::Tree(format!("vector delete failed: {e}")))
    }

    async fn cached_tree(&self, content_hash: &str) -> Option<Vec<Node>> {
        let cache = self.cache.as_ref()?;
        let key = self.cache_keys.flat_nodes(content_hash);
        cache.get::<Vec<Node>>(&key).await.ok().flatten()
    }

    async fn build_tree_fresh(
        &self,
        file_path: &Path,
        output_dir: &Path,
        file_path_str: &str,
        filename: &str,
        sid: &str,
        skipped: &mut Vec<String>,
    ) -> CoreResult<Vec<Node>> {
        let engine = PdfEngine::new()?;
        let pdf_path = file_path.to_path_buf();
        let out_dir = output_dir.to_path_buf();
        let config = self.config.clone();
        let mut pages = tokio::task::spawn_blocking(move || engine.extract(&pdf_path, &out_dir, &config))
            .await
            .map_err(|e| CoreError::Pdf(format!("extraction task panicked: {e}")))??;
        self.reporter.on_stage(sid, Stage::Extracted);

        // `extract` writes images under `output_dir` and records paths relative to
        // it; §6 requires Document.image_path to be relative to the static root,
        // one level up, so prefix with this source's directory name.
        for page in pages.iter_mut() {
            for asset in page.images.iter_mut() {
                asset.static_path = format!("{sid}/{}", asset.static_path);
            }
        }

        if self.config.detect_trash {
            let page_texts: Vec<(u32, String)> = pages
                .iter()
                .enumerate()
                .map(|(i, p)| (i as u32, p.hint_text.clone().unwrap_or_default()))
                .collect();
            for detection in crate::trash::detect_trash(&page_texts) {
                self.reporter.on_unit_skipped(
                    sid,
                    &format!("page {} ({})", detection.page, detection.trash_type),
                    &detection.reason,
                );
                skipped.push(format!(
                    "page {} flagged as {}: {}",
                    detection.page, detection.trash_type, detection.reason
                ));
            }
        }

        let lang = self.config.language;
        let segment_lists = segment_pages(Arc::clone(&self.gateway), lang, &pages).await;
        for (i, segs) in segment_lists.iter().enumerate() {
            if segs.is_empty() && !pages[i].images.is_empty() {
                continue;
            }
            if segs.is_empty() {
                let unit = format!("page {} OCR", pages[i].page);
                skipped.push(unit.clone());
                self.reporter.on_unit_skipped(sid, &unit, "empty OCR result");
            }
        }
        self.reporter.on_stage(sid, Stage::Segmented);

        let captions = self.caption_images(lang, &pages, &segment_lists).await;
        self.reporter.on_stage(sid, Stage::Captioned);

        let flat = build_flat_nodes(&pages, &segment_lists, &captions, file_path_str, filename);
        let roots = build_tree(&self.gateway, flat).await?;
        self.reporter.on_stage(sid, Stage::TreeBuilt);
        Ok(roots)
    }

    /// Caption every embedded image across a document's pages concurrently,
    /// bucketed back by page index in intra-page order (§4.8). Each image's
    /// surrounding text is the nearest preceding/following non-header OCR
    /// segment on the same page (§4.3, §B.2), with the full page image
    /// passed alongside the cropped asset as extra vision context.
    async fn caption_images(
        &self,
        lang: Language,
        pages: &[PageImage],
        segment_lists: &[Vec<crate::model::Segment>],
    ) -> Vec<Vec<String>> {
        let captioner = Arc::new(Captioner::new(Arc::clone(&self.gateway), self.cache.clone(), lang));
        let mut tasks = Vec::new();
        let mut counts = Vec::with_capacity(pages.len());

        for (page_idx, page) in pages.iter().enumerate() {
            counts.push(page.images.len());
            let segments = segment_lists.get(page_idx).map(|s| s.as_slice()).unwrap_or(&[]);
            let texts: Vec<Option<&str>> = segments
                .iter()
                .filter(|s| s.label != crate::model::NodeLabel::Header)
                .map(|s| {
                    if s.content.trim().is_empty() {
                        None
                    } else {
                        Some(s.content.as_str())
                    }
                })
                .chain(page.images.iter().map(|_| None))
                .collect();
            let text_count = texts.len() - page.images.len();

            for (img_idx, asset) in page.images.iter().enumerate() {
                let captioner = Arc::clone(&captioner);
                let asset = asset.clone();
                let page_b64 = page.base64.clone();
                let context = crate::captioner::surrounding_text(&texts, text_count + img_idx);
                tasks.push(async move {
                    let caption = captioner.caption(&asset, Some(&page_b64), context.as_deref()).await;
                    Ok::<String, GatewayError>(caption)
                });
            }
        }

        let results = self.gateway.batch(tasks).await;
        let mut iter = results.into_iter();
        let mut out = Vec::with_capacity(pages.len());
        for count in counts {
            let mut page_captions = Vec::with_capacity(count);
            for _ in 0..count {
                let r = iter.next().expect("one task per embedded image");
                page_captions.push(r.unwrap_or_default());
            }
            out.push(page_captions);
        }
        out
    }

    async fn embed_documents(
        &self,
        documents: &[crate::model::Document],
    ) -> Result<Vec<Vec<f32>>, GatewayError> {
        let mut vectors = Vec::with_capacity(documents.len());
        for batch in documents.chunks(self.config.embedding_batch) {
            let texts: Vec<String> = batch.iter().map(|d| d.content.clone()).collect();
            let embedded = self.gateway.embed(&texts).await?;
            vectors.extend(embedded);
        }
        Ok(vectors)
    }
}

/// Walk pages in order, emitting text/header segments in segment order then
/// image nodes (captions filled in), assigning a monotonic global `order_id`.
fn build_flat_nodes(
    pages: &[PageImage],
    segment_lists: &[Vec<crate::model::Segment>],
    captions: &[Vec<String>],
    file_path: &str,
    filename: &str,
) -> Vec<Node> {
    let mut order_id: u64 = 0;
    let mut flat = Vec::new();

    for (page_idx, page) in pages.iter().enumerate() {
        if let Some(segments) = segment_lists.get(page_idx) {
            for seg in segments {
                flat.push(Node {
                    order_id,
                    label: seg.label,
                    content: seg.content.clone(),
                    page: page.page,
                    parent_order_id: None,
                    image_path: None,
                    children: Vec::new(),
                    file_path: file_path.to_string(),
                    filename: filename.to_string(),
                });
                order_id += 1;
            }
        }

        let page_captions = captions.get(page_idx);
        for (img_idx, asset) in page.images.iter().enumerate() {
            let caption = page_captions
                .and_then(|c| c.get(img_idx))
                .cloned()
                .unwrap_or_default();
            flat.push(Node {
                order_id,
                label: NodeLabel::Image,
                content: caption,
                page: page.page,
                parent_order_id: None,
                image_path: Some(asset.static_path.clone()),
                children: Vec::new(),
                file_path: file_path.to_string(),
                filename: filename.to_string(),
            });
            order_id += 1;
        }
    }

    flat
}

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeLabel, Segment};

    fn page(page_num: u32, n_images: usize) -> PageImage {
        PageImage {
            page: page_num,
            png_bytes: Vec::new(),
            base64: String::new(),
            images: (0..n_images)
                .map(|i| crate::model::ImageAsset {
                    page: page_num,
                    width: 200,
                    height: 200,
                    bytes: Vec::new(),
                    static_path: format!("image_p{page_num}_{}.png", i + 1),
                })
                .collect(),
            hint_text: None,
        }
    }

    #[test]
    fn flat_nodes_place_images_after_text_on_same_page() {
        let pages = vec![page(1, 1)];
        let segments = vec![vec![Segment { index: 0, label: NodeLabel::Header, content: "Ch1".into() }]];
        let captions = vec![vec!["a chart".to_string()]];
        let flat = build_flat_nodes(&pages, &segments, &captions, "f.pdf", "f.pdf");
        assert_eq!(flat.len(), 2);
        assert!(flat[0].is_header());
        assert!(flat[1].is_image());
        assert_eq!(flat[0].order_id, 0);
        assert_eq!(flat[1].order_id, 1);
    }

    #[test]
    fn order_id_is_monotonic_across_pages() {
        let pages = vec![page(1, 1), page(2, 1)];
        let segments = vec![
            vec![Segment { index: 0, label: NodeLabel::Text, content: "p1".into() }],
            vec![Segment { index: 0, label: NodeLabel::Text, content: "p2".into() }],
        ];
        let captions = vec![vec!["img1".to_string()], vec!["img2".to_string()]];
        let flat = build_flat_nodes(&pages, &segments, &captions, "f.pdf", "f.pdf");
        let ids: Vec<u64> = flat.iter().map(|n| n.order_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }
}
