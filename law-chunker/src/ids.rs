//! ID conventions for the ingestion pipeline.
//!
//! Every id shape is byte-stable:
//!
//! - `logical_node_id`: `{prefix}:{document_id}#{span_id}` — the part-free
//!   identity used for graph nodes.
//! - `node_id`: `{logical_node_id}@P{part_index:02}` — the physical primary
//!   key in the vector store.
//! - `chunk_id`: `{document_id}#{span_id}@P{part_index:02}`.
//! - `parent_chunk_id`: `{document_id}#{parent_span_id}@P00` or absent. The
//!   parent always references part 0, because hierarchy lives between
//!   logical spans, not physical parts.
//!
//! Document-id normalization keeps the citation extractor, the ingestion
//! path and the sinks speaking the same dialect: `LEI 14133/2021`,
//! `lei-14.133-2021` and `LEI-14133-2021` all become `LEI-14.133-2021`.

use regex::Regex;

/// Canonical namespace prefix for a document type.
pub fn prefix_for_document_type(document_type: &str) -> &'static str {
    match document_type.to_uppercase().replace(' ', "_").as_str() {
        "LEI" | "DECRETO" | "INSTRUCAO_NORMATIVA" | "IN" | "LC" | "DL" | "PORTARIA"
        | "RESOLUCAO" => "leis",
        "ACORDAO" => "acordaos",
        "TCU" => "tcu",
        "KB_CARD" => "kb",
        _ => "leis",
    }
}

pub fn build_logical_node_id(prefix: &str, document_id: &str, span_id: &str) -> String {
    format!("{prefix}:{document_id}#{span_id}")
}

pub fn build_node_id(logical_node_id: &str, part_index: usize) -> String {
    format!("{logical_node_id}@P{part_index:02}")
}

pub fn build_chunk_id(document_id: &str, span_id: &str, part_index: usize) -> String {
    format!("{document_id}#{span_id}@P{part_index:02}")
}

pub fn build_parent_chunk_id(document_id: &str, parent_span_id: Option<&str>) -> Option<String> {
    parent_span_id.map(|parent| format!("{document_id}#{parent}@P00"))
}

/// Parse `prefix:document#span` into its three components.
pub fn parse_logical_node_id(logical_node_id: &str) -> Option<(&str, &str, &str)> {
    let (prefix, rest) = logical_node_id.split_once(':')?;
    let (document_id, span_id) = rest.split_once('#')?;
    let prefix_ok = !prefix.is_empty()
        && prefix.chars().all(|c| c.is_ascii_lowercase() || c == '_');
    let doc_ok = !document_id.is_empty()
        && document_id
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '.');
    let span_ok = !span_id.is_empty()
        && span_id
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_');
    (prefix_ok && doc_ok && span_ok).then_some((prefix, document_id, span_id))
}

/// Parse a physical node id into `(logical_node_id, part_index)`.
pub fn parse_node_id(node_id: &str) -> Option<(&str, usize)> {
    let (logical, part) = node_id.rsplit_once("@P")?;
    if part.len() != 2 || !part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((logical, part.parse().ok()?))
}

pub fn extract_logical_from_node_id(node_id: &str) -> Option<&str> {
    parse_node_id(node_id).map(|(logical, _)| logical)
}

pub fn is_valid_logical_node_id(value: &str) -> bool {
    parse_logical_node_id(value).is_some()
}

pub fn is_valid_node_id(value: &str) -> bool {
    parse_node_id(value).is_some()
}

/// Normalize a document id into canonical form.
///
/// Rules: uppercase; `nº`-style tokens removed; spaces, slashes and
/// underscores become dashes; a Brazilian thousands dot goes into numbers
/// >= 1000 unless the segment is the trailing four-digit year; dash runs
/// collapse.
pub fn normalize_document_id(raw_id: &str) -> String {
    if raw_id.is_empty() {
        return String::new();
    }
    let no_marker = Regex::new(r"(?i)\bN[oº°]?\.?\s*").expect("static pattern");
    let separators = Regex::new(r"[\s/_]+").expect("static pattern");
    let dash_runs = Regex::new(r"-+").expect("static pattern");

    let normalized = raw_id.to_uppercase();
    let normalized = no_marker.replace_all(normalized.trim(), "");
    let normalized = separators.replace_all(&normalized, "-");
    let normalized = dash_runs.replace_all(&normalized, "-");

    let parts: Vec<&str> = normalized.split('-').collect();
    let last = parts.len().saturating_sub(1);
    let rebuilt: Vec<String> = parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let is_year = i == last && part.len() == 4 && part.chars().all(|c| c.is_ascii_digit());
            let numeric = !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());
            if numeric && !is_year {
                let value: u64 = part.parse().unwrap_or(0);
                if value >= 1000 {
                    return thousands_dot(value);
                }
            }
            part.to_string()
        })
        .collect();

    rebuilt.join("-").trim_matches('-').to_string()
}

/// Normalize a full node id (`leis:lei-14133-2021#art-018` ->
/// `leis:LEI-14.133-2021#ART-018`).
pub fn normalize_node_id(raw_node_id: &str) -> String {
    if raw_node_id.is_empty() {
        return String::new();
    }
    let Some((prefix, rest)) = raw_node_id.split_once(':') else {
        return raw_node_id.to_string();
    };
    let prefix = prefix.to_lowercase();
    match rest.split_once('#') {
        Some((document_id, span_id)) => format!(
            "{prefix}:{}#{}",
            normalize_document_id(document_id),
            span_id.to_uppercase()
        ),
        None => format!("{prefix}:{}", normalize_document_id(rest)),
    }
}

/// `14133` -> `14.133` (Brazilian thousands separator).
fn thousands_dot(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - offset) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn builds_stable_id_shapes() {
        let logical = build_logical_node_id("leis", "LEI-14133-2021", "ART-005");
        assert_eq!(logical, "leis:LEI-14133-2021#ART-005");
        assert_eq!(build_node_id(&logical, 0), "leis:LEI-14133-2021#ART-005@P00");
        assert_eq!(
            build_chunk_id("LEI-14133-2021", "ART-005", 1),
            "LEI-14133-2021#ART-005@P01"
        );
        assert_eq!(
            build_parent_chunk_id("LEI-14133-2021", Some("ART-005")),
            Some("LEI-14133-2021#ART-005@P00".to_string())
        );
        assert_eq!(build_parent_chunk_id("LEI-14133-2021", None), None);
    }

    #[test]
    fn parses_ids_back() {
        assert_eq!(
            parse_logical_node_id("leis:LEI-14133-2021#ART-005"),
            Some(("leis", "LEI-14133-2021", "ART-005"))
        );
        assert_eq!(parse_logical_node_id("no-colon"), None);
        assert_eq!(
            parse_node_id("leis:LEI-14133-2021#ART-005@P02"),
            Some(("leis:LEI-14133-2021#ART-005", 2))
        );
        assert_eq!(parse_node_id("leis:LEI-14133-2021#ART-005"), None);
        assert_eq!(
            extract_logical_from_node_id("leis:LEI-14133-2021#ART-005@P00"),
            Some("leis:LEI-14133-2021#ART-005")
        );
        assert!(is_valid_logical_node_id("acordaos:AC-2724-2025-P#REL-001"));
        assert!(!is_valid_node_id("leis:LEI-1#ART-001@Pxx"));
    }

    #[rstest]
    #[case("LEI", "leis")]
    #[case("decreto", "leis")]
    #[case("IN", "leis")]
    #[case("LC", "leis")]
    #[case("ACORDAO", "acordaos")]
    #[case("TCU", "tcu")]
    #[case("KB_CARD", "kb")]
    #[case("DESCONHECIDO", "leis")]
    fn maps_document_types_to_prefixes(#[case] doc_type: &str, #[case] prefix: &str) {
        assert_eq!(prefix_for_document_type(doc_type), prefix);
    }

    #[rstest]
    #[case("LEI 14133/2021", "LEI-14.133-2021")]
    #[case("lei-14.133-2021", "LEI-14.133-2021")]
    #[case("LEI-14133-2021", "LEI-14.133-2021")]
    #[case("Lei no 14133", "LEI-14.133")]
    #[case("IN-58-2022", "IN-58-2022")]
    #[case("DECRETO-10947-2022", "DECRETO-10.947-2022")]
    #[case("", "")]
    fn normalizes_document_ids(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_document_id(raw), expected);
    }

    #[test]
    fn normalizes_full_node_ids() {
        assert_eq!(
            normalize_node_id("leis:LEI-14133-2021#ART-018"),
            "leis:LEI-14.133-2021#ART-018"
        );
        assert_eq!(
            normalize_node_id("leis:lei-14.133-2021#art-018"),
            "leis:LEI-14.133-2021#ART-018"
        );
        assert_eq!(normalize_node_id("sem-prefixo"), "sem-prefixo");
    }

    #[test]
    fn trailing_year_keeps_no_thousands_dot() {
        // 2021 is a year position, not a document number.
        assert_eq!(normalize_document_id("LEI-14133-2021"), "LEI-14.133-2021");
        // A lone four-digit number in year position stays untouched.
        assert_eq!(normalize_document_id("CF-1988"), "CF-1988");
    }
}
