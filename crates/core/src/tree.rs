use crate::error::{CoreError, CoreResult};
use crate::json_util::extract_json_array;
use crate::model::Node;
use crate::prompts::tree_correction_prompt;
use notebook_gateway::Gateway;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::HashSet;

#[derive(Debug, Serialize)]
struct HeaderSkeletonEntry {
    index: u64,
    title: String,
    page: u32,
}

#[derive(Debug, Deserialize)]
struct Correction {
    index: u64,
    parent_index: Option<u64>,
}

/// Tree Builder (§4.4): lifts the flat, globally ordered `[Node]` list into a
/// forest where headers form the internal structure. Fails loudly on a
/// duplicate `order_id` rather than silently accepting an ambiguous ordering.
pub async fn build_tree(gateway: &Gateway, flat: Vec<Node>) -> CoreResult<Vec<Node>> {
    reject_duplicate_order_ids(&flat)?;

    let roots = naive_attach(flat);

    let skeleton: Vec<HeaderSkeletonEntry> = roots
        .iter()
        .filter(|n| n.is_header())
        .map(|n| HeaderSkeletonEntry {
            index: n.order_id,
            title: n.content.clone(),
            page: n.page,
        })
        .collect();

    if skeleton.is_empty() {
        return Ok(roots);
    }

    let skeleton_json = match serde_json::to_string(&skeleton) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("failed to serialize header skeleton: {e}");
            return Ok(roots);
        }
    };

    let prompt = tree_correction_prompt(&skeleton_json);
    let corrections = match gateway.complete_text(&prompt).await {
        Ok(raw) => parse_corrections(&raw),
        Err(e) => {
            tracing::error!("tree correction call failed, keeping naive tree: {e}");
            Ok(Vec::new())
        }
    };

    match corrections {
        Ok(corrections) => Ok(apply_corrections(roots, &corrections)),
        Err(e) => {
            tracing::error!("tree correction response was malformed, keeping naive tree: {e}");
            Ok(roots)
        }
    }
}

/// Edge case: a duplicate `order_id` in the flat node list means the upstream
/// ordering is ambiguous. Fail loudly instead of letting `apply_corrections`'s
/// `order_id`-keyed maps silently drop one of the nodes.
fn reject_duplicate_order_ids(flat: &[Node]) -> CoreResult<()> {
    let mut seen = HashSet::with_capacity(flat.len());
    for node in flat {
        if !seen.insert(node.order_id) {
            return Err(CoreError::Tree(format!(
                "duplicate order_id {} in flat node list",
                node.order_id
            )));
        }
    }
    Ok(())
}

fn parse_corrections(raw: &str) -> Result<Vec<Correction>, String> {
    let json_slice = extract_json_array(raw).ok_or("no JSON array found in tree-correction response")?;
    serde_json::from_str(json_slice).map_err(|e| format!("malformed tree-correction JSON: {e}"))
}

/// Phase A: single pass in `order_id` order. On `header`, push as a new root.
/// On non-header, attach to the current header's children, or to the top
/// level if no header has been seen yet.
fn naive_attach(nodes: Vec<Node>) -> Vec<Node> {
    let mut roots: Vec<Node> = Vec::new();
    let mut current_header: Option<usize> = None;

    for node in nodes {
        if node.is_header() {
            roots.push(node);
            current_header = Some(roots.len() - 1);
        } else {
            match current_header {
                Some(idx) => {
                    let mut child = node;
                    child.parent_order_id = Some(roots[idx].order_id);
                    roots[idx].children.push(child);
                }
                None => roots.push(node),
            }
        }
    }

    roots
}

/// Phase B: re-parent headers per the LLM's corrections, validating indices,
/// degrading unknown parents to root, and rejecting back-edges that would
/// introduce a cycle.
fn apply_corrections(roots: Vec<Node>, corrections: &[Correction]) -> Vec<Node> {
    let mut orphans: Vec<Node> = Vec::new();
    let mut headers: HashMap<u64, Node> = HashMap::new();

    for node in roots {
        if node.is_header() {
            headers.insert(node.order_id, node);
        } else {
            orphans.push(node);
        }
    }

    let mut parent_of: HashMap<u64, u64> = HashMap::new();
    for c in corrections {
        let Some(parent) = c.parent_index else { continue };
        if c.index == parent || !headers.contains_key(&c.index) || !headers.contains_key(&parent) {
            continue;
        }

        let mut cursor = parent;
        let mut guard = 0;
        let mut is_cycle = false;
        while let Some(&next) = parent_of.get(&cursor) {
            guard += 1;
            if guard > headers.len() + 1 {
                break;
            }
            if next == c.index {
                is_cycle = true;
                break;
            }
            cursor = next;
        }

        if is_cycle {
            tracing::warn!(
                "dropping tree-correction back-edge {} -> {} to avoid a cycle",
                c.index,
                parent
            );
            continue;
        }

        parent_of.insert(c.index, parent);
    }

    let mut children_of: HashMap<u64, Vec<u64>> = HashMap::new();
    let mut root_ids: Vec<u64> = Vec::new();
    for &id in headers.keys() {
        match parent_of.get(&id) {
            Some(&p) => children_of.entry(p).or_default().push(id),
            None => root_ids.push(id),
        }
    }
    root_ids.sort_unstable();

    fn build(id: u64, headers: &mut HashMap<u64, Node>, children_of: &HashMap<u64, Vec<u64>>) -> Node {
        let mut node = headers.remove(&id).expect("header id present exactly once");
        if let Some(child_ids) = children_of.get(&id) {
            let mut sorted = child_ids.clone();
            sorted.sort_unstable();
            for cid in sorted {
                let mut child = build(cid, headers, children_of);
                child.parent_order_id = Some(id);
                node.children.push(child);
            }
        }
        node.children.sort_by_key(|c| c.order_id);
        node
    }

    let mut new_roots: Vec<Node> = root_ids
        .into_iter()
        .map(|id| build(id, &mut headers, &children_of))
        .collect();

    new_roots.extend(orphans);
    new_roots.sort_by_key(|n| n.order_id);
    new_roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeLabel;

    fn node(order_id: u64, label: NodeLabel, content: &str, page: u32) -> Node {
        Node {
            order_id,
            label,
            content: content.to_string(),
            page,
            parent_order_id: None,
            image_path: None,
            children: Vec::new(),
            file_path: "f.pdf".into(),
            filename: "f.pdf".into(),
        }
    }

    #[test]
    fn naive_attach_nests_text_under_preceding_header() {
        let flat = vec![
            node(0, NodeLabel::Header, "Chapter 1", 1),
            node(1, NodeLabel::Text, "intro text", 1),
            node(2, NodeLabel::Header, "Chapter 2", 2),
            node(3, NodeLabel::Text, "more text", 2),
        ];
        let roots = naive_attach(flat);
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].children.len(), 1);
        assert_eq!(roots[0].children[0].parent_order_id, Some(0));
        assert_eq!(roots[1].children.len(), 1);
    }

    #[test]
    fn orphan_before_first_header_stays_top_level() {
        let flat = vec![
            node(0, NodeLabel::Text, "preface", 1),
            node(1, NodeLabel::Header, "Chapter 1", 1),
        ];
        let roots = naive_attach(flat);
        assert_eq!(roots.len(), 2);
        assert!(roots[0].is_text());
    }

    #[test]
    fn corrections_nest_headers_per_parent_index() {
        let flat = vec![
            node(0, NodeLabel::Header, "1 Intro", 1),
            node(1, NodeLabel::Header, "1.1 Motivation", 1),
            node(2, NodeLabel::Text, "paragraph", 1),
        ];
        let roots = naive_attach(flat);
        let corrections = vec![
            Correction { index: 0, parent_index: None },
            Correction { index: 1, parent_index: Some(0) },
        ];
        let tree = apply_corrections(roots, &corrections);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].content, "1 Intro");
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].content, "1.1 Motivation");
    }

    #[test]
    fn cyclic_correction_drops_the_back_edge() {
        let flat = vec![
            node(0, NodeLabel::Header, "A", 1),
            node(1, NodeLabel::Header, "B", 1),
        ];
        let roots = naive_attach(flat);
        let corrections = vec![
            Correction { index: 0, parent_index: Some(1) },
            Correction { index: 1, parent_index: Some(0) },
        ];
        let tree = apply_corrections(roots, &corrections);
        // one back-edge must be dropped, leaving a valid forest (no infinite loop)
        let total_nodes: usize = tree.iter().map(count_nodes).sum();
        assert_eq!(total_nodes, 2);
    }

    fn count_nodes(n: &Node) -> usize {
        1 + n.children.iter().map(count_nodes).sum::<usize>()
    }

    #[test]
    fn duplicate_order_id_is_rejected() {
        let flat = vec![
            node(0, NodeLabel::Header, "A", 1),
            node(0, NodeLabel::Text, "dup", 1),
        ];
        assert!(reject_duplicate_order_ids(&flat).is_err());
    }

    #[test]
    fn unknown_parent_index_degrades_to_root() {
        let flat = vec![node(0, NodeLabel::Header, "A", 1)];
        let roots = naive_attach(flat);
        let corrections = vec![Correction { index: 0, parent_index: Some(99) }];
        let tree = apply_corrections(roots, &corrections);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].parent_order_id, None);
    }
}
