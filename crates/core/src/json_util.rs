/// Best-effort extraction of the first top-level JSON array in a model
/// response, tolerating surrounding prose or markdown code fences.
pub fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_array_from_fenced_response() {
        let raw = "```json\n[1, 2, 3]\n```";
        assert_eq!(extract_json_array(raw), Some("[1, 2, 3]"));
    }

    #[test]
    fn returns_none_without_brackets() {
        assert_eq!(extract_json_array("no array here"), None);
    }
}
