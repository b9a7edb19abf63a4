//! Bridge: [`ParsedDocument`] → physical [`ChunkPart`]s.
//!
//! The direct ingestion path: converts every device span of a parsed
//! document straight into chunks, without the article-by-article
//! materializer. Outline spans (chapters, sections, titles, free text)
//! never become chunks; the header survives as an `ementa` chunk. Evidence
//! comes from the parser's own offsets plus the document hash, so chunks
//! from this path carry the same slice-provable trio as materialized ones.

use tracing::{debug, info};

use law_parser::{ParsedDocument, Span, SpanType};

use crate::canonical::compute_canonical_hash;
use crate::ids::{build_logical_node_id, prefix_for_document_type};
use crate::split::{MAX_TEXT_CHARS, OVERLAP_CHARS, split_span_to_parts};
use crate::types::{ChunkPart, DeviceType};

/// Walk up `parent_id` to the enclosing article. A span that *is* an
/// article returns itself. Falls back to deriving `ART-{nnn}` from the span
/// id shape when the parent chain is broken.
pub fn find_root_article_span_id(span: &Span, doc: &ParsedDocument) -> Option<String> {
    if span.span_type == SpanType::Artigo {
        return Some(span.span_id.clone());
    }

    let mut visited = std::collections::HashSet::new();
    let mut current = span;
    while let Some(parent_id) = &current.parent_id {
        if !visited.insert(parent_id.clone()) {
            break;
        }
        let Some(parent) = doc.get_span(parent_id) else {
            break;
        };
        if parent.span_type == SpanType::Artigo {
            return Some(parent.span_id.clone());
        }
        current = parent;
    }

    // PAR-003-1 -> ART-003, INC-005-I -> ART-005.
    let mut parts = span.span_id.split('-');
    let _kind = parts.next()?;
    let article_num = parts.next()?;
    let candidate = format!("ART-{article_num}");
    doc.get_span(&candidate).map(|s| s.span_id.clone())
}

/// Convert a parsed document into chunk parts.
///
/// `prefix` defaults to the canonical prefix for `document_type`.
pub fn build_chunk_parts(
    doc: &ParsedDocument,
    document_id: &str,
    document_type: &str,
    prefix: Option<&str>,
) -> Vec<ChunkPart> {
    let prefix = prefix
        .map(str::to_string)
        .unwrap_or_else(|| prefix_for_document_type(document_type).to_string());
    let canonical_hash = compute_canonical_hash(&doc.source_text);

    let mut chunk_parts = Vec::new();
    for span in &doc.spans {
        let device_type = DeviceType::from_span_type(span.span_type);
        if device_type == DeviceType::Unknown {
            debug!(
                target: "law_chunker::bridge",
                span_id = %span.span_id,
                "skipping outline span"
            );
            continue;
        }

        let logical_node_id = build_logical_node_id(&prefix, document_id, &span.span_id);
        let article_number = find_root_article_span_id(span, doc)
            .and_then(|art| art.strip_prefix("ART-").map(str::to_string));

        let mut parts = split_span_to_parts(
            &span.text,
            &logical_node_id,
            document_id,
            &span.span_id,
            span.parent_id.as_deref(),
            device_type,
            article_number.as_deref(),
            document_type,
            MAX_TEXT_CHARS,
            OVERLAP_CHARS,
        );
        // Evidence straight from the parser's offsets.
        if device_type.is_evidence_bearing() && span.end_pos > span.start_pos {
            for part in &mut parts {
                part.canonical_start = span.start_pos as i64;
                part.canonical_end = span.end_pos as i64;
                part.canonical_hash = canonical_hash.clone();
            }
        }
        chunk_parts.extend(parts);
    }

    info!(
        target: "law_chunker::bridge",
        document_id,
        spans = doc.spans.len(),
        chunks = chunk_parts.len(),
        "converted spans to chunk parts"
    );
    chunk_parts
}

/// Builder wrapper over [`build_chunk_parts`] for callers that convert
/// several documents with the same identity.
pub struct ChunkPartsBuilder {
    document_id: String,
    document_type: String,
    prefix: String,
}

impl ChunkPartsBuilder {
    pub fn new(document_id: impl Into<String>, document_type: impl Into<String>) -> Self {
        let document_type = document_type.into();
        let prefix = prefix_for_document_type(&document_type).to_string();
        Self {
            document_id: document_id.into(),
            document_type,
            prefix,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn build(&self, doc: &ParsedDocument) -> Vec<ChunkPart> {
        build_chunk_parts(doc, &self.document_id, &self.document_type, Some(&self.prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use law_parser::parse_law;

    const LAW: &str = "\
CAPÍTULO I
DISPOSIÇÕES GERAIS

Art. 1º Esta Lei estabelece normas gerais.

I - órgão: unidade de atuação;

§ 1º Aplica-se à administração direta.

Art. 2º Princípios aplicáveis.
";

    #[test]
    fn outline_spans_are_skipped_devices_are_kept() {
        let doc = parse_law(LAW).unwrap();
        let chunks = build_chunk_parts(&doc, "LEI-14133-2021", "LEI", None);

        let span_ids: Vec<_> = chunks.iter().map(|c| c.span_id.clone()).collect();
        assert!(!span_ids.iter().any(|id| id.starts_with("CAP-")));
        assert!(span_ids.contains(&"ART-001".to_string()));
        assert!(span_ids.contains(&"INC-001-I".to_string()));
        assert!(span_ids.contains(&"PAR-001-1".to_string()));
        assert!(span_ids.contains(&"ART-002".to_string()));
    }

    #[test]
    fn ids_and_article_numbers_are_derived() {
        let doc = parse_law(LAW).unwrap();
        let chunks = build_chunk_parts(&doc, "LEI-14133-2021", "LEI", None);

        let inciso = chunks.iter().find(|c| c.span_id == "INC-001-I").unwrap();
        assert_eq!(inciso.node_id, "leis:LEI-14133-2021#INC-001-I@P00");
        assert_eq!(inciso.logical_node_id, "leis:LEI-14133-2021#INC-001-I");
        assert_eq!(inciso.chunk_id, "LEI-14133-2021#INC-001-I@P00");
        assert_eq!(
            inciso.parent_chunk_id.as_deref(),
            Some("LEI-14133-2021#ART-001@P00")
        );
        assert_eq!(inciso.article_number.as_deref(), Some("001"));
        assert_eq!(inciso.device_type, DeviceType::Inciso);
    }

    #[test]
    fn evidence_trio_is_filled_from_parser_offsets() {
        let doc = parse_law(LAW).unwrap();
        let chunks = build_chunk_parts(&doc, "LEI-14133-2021", "LEI", None);
        let hash = compute_canonical_hash(&doc.source_text);

        for chunk in chunks.iter().filter(|c| c.device_type.is_evidence_bearing()) {
            assert!(chunk.evidence_coherent(), "{}", chunk.node_id);
            assert_eq!(chunk.canonical_hash, hash);
            let slice = &doc.source_text
                [chunk.canonical_start as usize..chunk.canonical_end as usize];
            assert!(
                law_parser::text_matches_span_id(&chunk.span_id, slice),
                "{}: slice {:?}",
                chunk.span_id,
                &slice[..slice.len().min(24)]
            );
        }
    }

    #[test]
    fn root_article_found_through_parent_chain() {
        let doc = parse_law(LAW).unwrap();
        let inciso = doc.get_span("INC-001-I").unwrap();
        assert_eq!(
            find_root_article_span_id(inciso, &doc).as_deref(),
            Some("ART-001")
        );
        let article = doc.get_span("ART-002").unwrap();
        assert_eq!(
            find_root_article_span_id(article, &doc).as_deref(),
            Some("ART-002")
        );
    }

    #[test]
    fn builder_uses_custom_prefix() {
        let doc = parse_law(LAW).unwrap();
        let chunks = ChunkPartsBuilder::new("IN-65-2021", "IN")
            .with_prefix("tcu")
            .build(&doc);
        assert!(chunks[0].node_id.starts_with("tcu:IN-65-2021#"));
    }
}
