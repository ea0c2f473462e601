use std::collections::HashMap;

/// Clean up raw pdfium-extracted text into readable hint text passed
/// alongside a page image to the OCR segmenter (§B.6 of SPEC_FULL.md).
///
/// Joins broken lines, normalizes whitespace, and preserves paragraph
/// boundaries. This never substitutes for the vision-LLM segmentation pass.
pub fn cleanup_extracted_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let raw_lines: Vec<&str> = text.split('\n').collect();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current_para = String::new();

    for line in &raw_lines {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if !current_para.is_empty() {
                paragraphs.push(current_para.clone());
                current_para.clear();
            }
            continue;
        }

        let normalized = if looks_like_table_line(trimmed) {
            trimmed.to_string()
        } else {
            trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
        };

        if current_para.is_empty() {
            current_para = normalized;
        } else if should_break_before(&normalized) || should_break_after(&current_para) {
            current_para.push('\n');
            current_para.push_str(&normalized);
        } else {
            current_para.push(' ');
            current_para.push_str(&normalized);
        }
    }

    if !current_para.is_empty() {
        paragraphs.push(current_para);
    }

    paragraphs.join("\n\n")
}

fn looks_like_table_line(line: &str) -> bool {
    let segments: Vec<&str> = line.split("  ").filter(|s| !s.trim().is_empty()).collect();
    segments.len() >= 3
}

fn should_break_before(line: &str) -> bool {
    let first_char = line.chars().next().unwrap_or(' ');
    line.starts_with("- ")
        || line.starts_with("* ")
        || line.starts_with("• ")
        || line.starts_with("# ")
        || line.starts_with("> ")
        || (first_char.is_ascii_digit() && line.contains(". "))
}

fn should_break_after(line: &str) -> bool {
    if line.is_empty() {
        return false;
    }
    let last_char = line.chars().last().unwrap_or(' ');
    matches!(last_char, '.' | '!' | '?' | ':' | 'ๆ' | '।')
        || line.ends_with("ครับ")
        || line.ends_with("ค่ะ")
        || line.ends_with("นะคะ")
        || line.ends_with("นะครับ")
}

/// Detect repeated text across pages (headers/footers) and strip it in place.
///
/// Returns the distinct header/footer lines that were stripped, for an
/// advisory report (§B.5).
pub fn strip_headers_footers(page_texts: &mut [(u32, String)]) -> (Vec<String>, Vec<String>) {
    if page_texts.len() < 3 {
        return (Vec::new(), Vec::new());
    }

    let total = page_texts.len();
    let threshold = (total as f64 * 0.6).ceil() as usize;

    let mut first_lines: HashMap<String, usize> = HashMap::new();
    let mut last_lines: HashMap<String, usize> = HashMap::new();

    for (_, text) in page_texts.iter() {
        let lines: Vec<&str> = text.lines().collect();

        for line in lines.iter().take(3) {
            let trimmed = line.trim().to_string();
            if !trimmed.is_empty() && trimmed.len() < 200 {
                *first_lines.entry(trimmed).or_insert(0) += 1;
            }
        }

        for line in lines.iter().rev().take(3) {
            let trimmed = line.trim().to_string();
            if !trimmed.is_empty() && trimmed.len() < 200 {
                *last_lines.entry(trimmed).or_insert(0) += 1;
            }
        }
    }

    let headers: Vec<String> = first_lines
        .into_iter()
        .filter(|(_, count)| *count >= threshold)
        .map(|(line, _)| line)
        .collect();

    let footers: Vec<String> = last_lines
        .into_iter()
        .filter(|(_, count)| *count >= threshold)
        .map(|(line, _)| line)
        .collect();

    if headers.is_empty() && footers.is_empty() {
        return (headers, footers);
    }

    tracing::debug!(
        "stripping {} header line(s) and {} footer line(s) repeated across pages",
        headers.len(),
        footers.len()
    );

    for (_, text) in page_texts.iter_mut() {
        let lines: Vec<&str> = text.lines().collect();
        let filtered: Vec<&str> = lines
            .into_iter()
            .filter(|line| {
                let trimmed = line.trim();
                !headers.iter().any(|h| h == trimmed) && !footers.iter().any(|f| f == trimmed)
            })
            .collect();
        *text = filtered.join("\n").trim().to_string();
    }

    (headers, footers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_wrapped_lines_into_one_paragraph() {
        let text = "This is a line\nthat wraps across\ntwo lines.";
        let cleaned = cleanup_extracted_text(text);
        assert_eq!(cleaned, "This is a line that wraps across two lines.");
    }

    #[test]
    fn blank_line_starts_a_new_paragraph() {
        let text = "First paragraph.\n\nSecond paragraph.";
        let cleaned = cleanup_extracted_text(text);
        assert_eq!(cleaned, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn strips_repeated_footer_across_pages() {
        let mut pages = vec![
            (0, "Title\nbody one\nCompany Confidential".to_string()),
            (1, "Title\nbody two\nCompany Confidential".to_string()),
            (2, "Title\nbody three\nCompany Confidential".to_string()),
        ];
        let (headers, footers) = strip_headers_footers(&mut pages);
        assert!(headers.iter().any(|h| h == "Title"));
        assert!(footers.iter().any(|f| f == "Company Confidential"));
        assert!(!pages[0].1.contains("Company Confidential"));
    }
}
