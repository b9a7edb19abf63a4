//! Size-based physical splitting with overlap.

use crate::ids::{build_chunk_id, build_node_id, build_parent_chunk_id};
use crate::types::{ChunkPart, DeviceType, EVIDENCE_SENTINEL, OriginConfidence, OriginType};
use crate::version::SCHEMA_VERSION;

/// Maximum text size of one physical part, in bytes.
pub const MAX_TEXT_CHARS: usize = 8000;

/// Overlap carried between consecutive parts, in bytes.
pub const OVERLAP_CHARS: usize = 200;

/// Split `text` into parts of at most `max_chars` bytes with `overlap`
/// bytes of carry-over, returning `(part, start, end)` with byte offsets
/// into `text`.
///
/// A cut that would land past the end of the text is clamped; a cut inside
/// a UTF-8 sequence backs off to the previous character boundary. When the
/// cut is not at the end, the last space above the half-window is preferred
/// so words survive splitting. Offsets overlap by design; the overlap lives
/// only in the part texts, never in a span's canonical evidence range.
pub fn split_text_with_offsets(
    text: &str,
    max_chars: usize,
    overlap: usize,
) -> Vec<(&str, usize, usize)> {
    if text.is_empty() || max_chars == 0 {
        return Vec::new();
    }
    let len = text.len();
    if len <= max_chars {
        return vec![(text, 0, len)];
    }

    let mut parts = Vec::new();
    let mut start = 0usize;
    while start < len {
        let mut end = (start + max_chars).min(len);
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        if end < len {
            if let Some(space) = text[start..end].rfind(' ') {
                let cut = start + space;
                if cut > start + max_chars / 2 {
                    end = cut + 1; // keep the space in this part
                }
            }
        }
        parts.push((&text[start..end], start, end));
        if end >= len {
            break;
        }
        start = end.saturating_sub(overlap);
        while !text.is_char_boundary(start) {
            start += 1;
        }
    }
    parts
}

/// Split one logical span into [`ChunkPart`]s with the whole id family
/// filled in. The evidence trio starts sentinel; callers that know the
/// span's canonical range stamp it on every part afterwards (all parts of
/// one span share the same range).
#[allow(clippy::too_many_arguments)]
pub fn split_span_to_parts(
    text: &str,
    logical_node_id: &str,
    document_id: &str,
    span_id: &str,
    parent_span_id: Option<&str>,
    device_type: DeviceType,
    article_number: Option<&str>,
    document_type: &str,
    max_chars: usize,
    overlap: usize,
) -> Vec<ChunkPart> {
    let segments = split_text_with_offsets(text, max_chars, overlap);
    let part_total = segments.len();

    segments
        .into_iter()
        .enumerate()
        .map(|(part_index, (part_text, char_start, char_end))| ChunkPart {
            node_id: build_node_id(logical_node_id, part_index),
            logical_node_id: logical_node_id.to_string(),
            chunk_id: build_chunk_id(document_id, span_id, part_index),
            parent_chunk_id: build_parent_chunk_id(document_id, parent_span_id),
            part_index,
            part_total,
            text: part_text.to_string(),
            char_start,
            char_end,
            canonical_start: EVIDENCE_SENTINEL,
            canonical_end: EVIDENCE_SENTINEL,
            canonical_hash: String::new(),
            device_type,
            article_number: article_number.map(str::to_string),
            document_type: document_type.to_string(),
            document_id: document_id.to_string(),
            span_id: span_id.to_string(),
            origin_type: OriginType::SelfMaterial,
            origin_reference: None,
            origin_reference_name: None,
            is_external_material: false,
            origin_confidence: OriginConfidence::High,
            origin_reason: None,
            citations: Vec::new(),
            schema_version: SCHEMA_VERSION.to_string(),
            ingest_run_id: String::new(),
            ingestion_timestamp: String::new(),
        })
        .collect()
}

/// Number of parts a text of `text_len` bytes will produce.
pub fn calculate_part_count(text_len: usize, max_chars: usize) -> usize {
    if text_len <= max_chars {
        return 1;
    }
    let effective = max_chars.saturating_sub(OVERLAP_CHARS);
    if effective == 0 {
        return text_len.div_ceil(max_chars);
    }
    (text_len - 1) / effective + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_part() {
        let parts = split_text_with_offsets("Art. 1º Texto curto.", MAX_TEXT_CHARS, OVERLAP_CHARS);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0], ("Art. 1º Texto curto.", 0, "Art. 1º Texto curto.".len()));
    }

    #[test]
    fn empty_text_produces_no_parts() {
        assert!(split_text_with_offsets("", MAX_TEXT_CHARS, OVERLAP_CHARS).is_empty());
    }

    #[test]
    fn long_ascii_text_splits_with_overlap() {
        let text = "x".repeat(12_000);
        let parts = split_text_with_offsets(&text, MAX_TEXT_CHARS, OVERLAP_CHARS);

        assert_eq!(parts.len(), 2);
        let (_, s0, e0) = parts[0];
        let (_, s1, e1) = parts[1];
        assert_eq!(s0, 0);
        assert!(e0 >= 7800 && e0 <= 8000);
        assert_eq!(s1, e0 - OVERLAP_CHARS);
        assert_eq!(e1, 12_000);

        // Dropping the overlap from part 1 reproduces the original.
        let rebuilt = format!("{}{}", parts[0].0, &parts[1].0[OVERLAP_CHARS..]);
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn prefers_space_cut_above_half_window() {
        let word = "palavra ";
        let text = word.repeat(1500); // 12000 bytes, spaces everywhere
        let parts = split_text_with_offsets(&text, MAX_TEXT_CHARS, OVERLAP_CHARS);
        assert!(parts.len() >= 2);
        let (first, _, e0) = parts[0];
        assert!(first.ends_with(' '));
        assert!(e0 > MAX_TEXT_CHARS / 2);
    }

    #[test]
    fn never_cuts_inside_a_utf8_sequence() {
        let text = "ção ".repeat(3000); // multibyte characters throughout
        let parts = split_text_with_offsets(&text, MAX_TEXT_CHARS, OVERLAP_CHARS);
        for (part, start, end) in parts {
            assert!(text.is_char_boundary(start));
            assert!(text.is_char_boundary(end));
            assert_eq!(&text[start..end], part);
        }
    }

    #[test]
    fn span_parts_share_identity_and_order() {
        let text = "x".repeat(12_000);
        let parts = split_span_to_parts(
            &text,
            "leis:LEI-14133-2021#ART-005",
            "LEI-14133-2021",
            "ART-005",
            None,
            DeviceType::Article,
            Some("005"),
            "LEI",
            MAX_TEXT_CHARS,
            OVERLAP_CHARS,
        );

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].node_id, "leis:LEI-14133-2021#ART-005@P00");
        assert_eq!(parts[1].node_id, "leis:LEI-14133-2021#ART-005@P01");
        assert_eq!(parts[1].chunk_id, "LEI-14133-2021#ART-005@P01");
        for (i, part) in parts.iter().enumerate() {
            assert_eq!(part.part_index, i);
            assert_eq!(part.part_total, 2);
            assert_eq!(part.logical_node_id, "leis:LEI-14133-2021#ART-005");
            assert!(part.evidence_sentinel());
            assert_eq!(part.parent_chunk_id, None);
        }
    }

    #[test]
    fn child_parts_reference_parent_p00() {
        let parts = split_span_to_parts(
            "§ 1º Texto do parágrafo.",
            "leis:LEI-14133-2021#PAR-005-1",
            "LEI-14133-2021",
            "PAR-005-1",
            Some("ART-005"),
            DeviceType::Paragraph,
            Some("005"),
            "LEI",
            MAX_TEXT_CHARS,
            OVERLAP_CHARS,
        );
        assert_eq!(parts.len(), 1);
        assert_eq!(
            parts[0].parent_chunk_id.as_deref(),
            Some("LEI-14133-2021#ART-005@P00")
        );
    }

    #[test]
    fn part_count_formula_matches_split() {
        for len in [100, 8000, 8001, 12_000, 40_000] {
            let text = "y".repeat(len);
            let parts = split_text_with_offsets(&text, MAX_TEXT_CHARS, OVERLAP_CHARS);
            assert_eq!(
                parts.len(),
                calculate_part_count(len, MAX_TEXT_CHARS),
                "len={len}"
            );
        }
    }
}
