use crate::config::Language;
use crate::model::{NodeLabel, PageImage, Segment};
use crate::prompts::get_prompts;
use notebook_gateway::{Gateway, GatewayError};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct RawSegment {
    index: u32,
    label: String,
    content: String,
}

/// OCR / Layout Segmenter (§4.2): converts one page image into an ordered
/// segment list via the vision capability of the Gateway.
pub async fn segment_page(
    gateway: &Gateway,
    lang: Language,
    page: &PageImage,
) -> Result<Vec<Segment>, GatewayError> {
    let prompt = get_prompts(lang).ocr_segment;
    let raw = gateway.describe_image(&page.base64, None, prompt).await?;
    parse_segments(&raw)
}

fn parse_segments(raw: &str) -> Result<Vec<Segment>, GatewayError> {
    let json_slice = crate::json_util::extract_json_array(raw)
        .ok_or_else(|| GatewayError::SchemaInvalid("no JSON array found in OCR response".into()))?;

    let parsed: Vec<RawSegment> = serde_json::from_str(json_slice)
        .map_err(|e| GatewayError::SchemaInvalid(format!("malformed OCR segment JSON: {e}")))?;

    let mut segments = Vec::with_capacity(parsed.len());
    for r in parsed {
        let label = match r.label.as_str() {
            "header" => NodeLabel::Header,
            "text" => NodeLabel::Text,
            other => {
                return Err(GatewayError::SchemaInvalid(format!(
                    "unknown OCR segment label '{other}'"
                )))
            }
        };
        segments.push(Segment {
            index: r.index,
            label,
            content: r.content,
        });
    }

    segments.sort_by_key(|s| s.index);
    Ok(segments)
}

/// Submit one OCR task per page to the Gateway in a batch; per-page failures
/// produce an empty segment list rather than aborting the document (§4.2,
/// §4.8, §7: "best-effort per-unit failure").
pub async fn segment_pages(
    gateway: Arc<Gateway>,
    lang: Language,
    pages: &[PageImage],
) -> Vec<Vec<Segment>> {
    let tasks: Vec<_> = pages
        .iter()
        .map(|page| {
            let gateway = Arc::clone(&gateway);
            let base64 = page.base64.clone();
            let page_num = page.page;
            async move {
                let prompt = get_prompts(lang).ocr_segment;
                match gateway.describe_image(&base64, None, prompt).await {
                    Ok(raw) => match parse_segments(&raw) {
                        Ok(segs) => Ok(segs),
                        Err(e) => {
                            tracing::warn!("page {page_num}: OCR schema error, skipping: {e}");
                            Ok(Vec::new())
                        }
                    },
                    Err(e) => {
                        tracing::warn!("page {page_num}: OCR call failed, skipping: {e}");
                        Ok(Vec::new())
                    }
                }
            }
        })
        .collect();

    gateway
        .batch(tasks)
        .await
        .into_iter()
        .map(|r: Result<Vec<Segment>, GatewayError>| r.unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_segment_list() {
        let raw = r#"[{"index":0,"label":"header","content":"Intro"},{"index":1,"label":"text","content":"Body"}]"#;
        let segs = parse_segments(raw).unwrap();
        assert_eq!(segs.len(), 2);
        assert!(segs[0].label == NodeLabel::Header);
    }

    #[test]
    fn tolerates_surrounding_prose_and_fences() {
        let raw = "Sure, here you go:\n```json\n[{\"index\":0,\"label\":\"text\",\"content\":\"hi\"}]\n```";
        let segs = parse_segments(raw).unwrap();
        assert_eq!(segs.len(), 1);
    }

    #[test]
    fn rejects_unknown_label() {
        let raw = r#"[{"index":0,"label":"image","content":"x"}]"#;
        assert!(parse_segments(raw).is_err());
    }

    #[test]
    fn sorts_by_index() {
        let raw = r#"[{"index":2,"label":"text","content":"c"},{"index":0,"label":"text","content":"a"}]"#;
        let segs = parse_segments(raw).unwrap();
        assert_eq!(segs[0].content, "a");
        assert_eq!(segs[1].content, "c");
    }
}
