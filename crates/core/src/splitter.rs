//! A recursive-separator text splitter, modeled on LangChain's
//! `RecursiveCharacterTextSplitter` (§4.5): try `"\n\n"`, then `"\n"`, then
//! `". "`, then `" "`, falling back to a character split, recursing into any
//! piece still over `chunk_size` and merging small pieces back up to
//! `chunk_size` with `chunk_overlap` of trailing context carried forward.

const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " "];

pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let pieces = recursive_split(text, SEPARATORS, chunk_size);
    merge_pieces(&pieces, chunk_size, chunk_overlap)
}

/// Split `text` on the first separator that appears in it, recursing into
/// any resulting piece still larger than `chunk_size` when further
/// separators remain. Falls back to the raw text (unsplit) once separators
/// are exhausted.
fn recursive_split(text: &str, separators: &[&str], chunk_size: usize) -> Vec<String> {
    let Some((&sep, rest)) = separators.split_first() else {
        return vec![text.to_string()];
    };

    if sep.is_empty() || !text.contains(sep) {
        return recursive_split(text, rest, chunk_size);
    }

    let mut out = Vec::new();
    let parts: Vec<&str> = text.split(sep).collect();
    for (i, part) in parts.iter().enumerate() {
        let mut piece = (*part).to_string();
        // Re-attach the separator to every part but the last, so join-back
        // round-trips and sentence punctuation like ". " survives.
        if i + 1 < parts.len() {
            piece.push_str(sep);
        }
        if piece.is_empty() {
            continue;
        }
        if !rest.is_empty() && piece.len() > chunk_size {
            out.extend(recursive_split(&piece, rest, chunk_size));
        } else {
            out.push(piece);
        }
    }
    out
}

/// Greedily pack pieces into chunks no larger than `chunk_size`, copying the
/// trailing `chunk_overlap` characters of a finished chunk into the next.
fn merge_pieces(pieces: &[String], chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for piece in pieces {
        if !current.is_empty() && current.len() + piece.len() > chunk_size {
            chunks.push(current.trim().to_string());
            let overlap_start = current.len().saturating_sub(chunk_overlap);
            let mut start = overlap_start;
            while start < current.len() && !current.is_char_boundary(start) {
                start += 1;
            }
            current = current[start..].to_string();
        }
        current.push_str(piece);
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks.into_iter().filter(|c| !c.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(split_text("", 1000, 200).is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = split_text("a short paragraph.", 1000, 200);
        assert_eq!(chunks, vec!["a short paragraph.".to_string()]);
    }

    #[test]
    fn splits_on_paragraph_boundary_first() {
        let text = format!("{}\n\n{}", "a".repeat(600), "b".repeat(600));
        let chunks = split_text(&text, 1000, 200);
        assert!(chunks.len() >= 2);
        for c in &chunks {
            assert!(c.len() <= 1000 + 200);
        }
    }

    #[test]
    fn recursion_guard_scales_with_small_chunk_size() {
        // A paragraph longer than chunk_size but under the old hardcoded
        // 400-char threshold must still recurse into the next separator
        // tier, instead of being emitted as one oversized piece.
        let para1 = format!("{}\n{}", "x".repeat(70), "y".repeat(70));
        let para2 = "z".repeat(70);
        let text = format!("{para1}\n\n{para2}");

        let chunks = split_text(&text, 100, 20);
        for c in &chunks {
            assert!(c.len() <= 100 + 20, "chunk too long: {} chars", c.len());
        }
    }

    #[test]
    fn respects_chunk_size_bound_on_long_text() {
        let text = (0..50)
            .map(|i| format!("Sentence number {i} in a long document."))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = split_text(&text, 200, 40);
        for c in &chunks {
            assert!(c.len() <= 200 + 40, "chunk too long: {} chars", c.len());
        }
        assert!(chunks.len() > 1);
    }
}
