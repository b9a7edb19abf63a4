//! Article-rooted chunk materialization.
//!
//! Turns a parsed document into physical [`ChunkPart`]s with parent-child
//! linkage and the canonical evidence trio on every part. The article is
//! the root: its chunk carries either the caput range or the full
//! structural range as evidence (configurable), while containment of
//! children is always checked against the structural range. Children take
//! their offsets from the offsets map when present and fall back to the
//! strict resolver otherwise; any resolver failure aborts the whole
//! article. An invariant gate runs before anything is returned — a
//! document either materializes completely or not at all.

use std::collections::{BTreeMap, HashSet};
use tracing::info;

use law_parser::{ParsedDocument, Span, text_matches_span_id};

use crate::canonical::extract_offsets_from_parsed_doc;
use crate::errors::{ChunkError, FailureKind, Result};
use crate::ids::{build_logical_node_id, prefix_for_document_type};
use crate::offsets::resolve_child_offsets;
use crate::split::{MAX_TEXT_CHARS, OVERLAP_CHARS, split_span_to_parts};
use crate::types::{ChunkPart, DeviceType};

/// Which canonical range an article chunk stores as evidence.
///
/// Children are always contained in the *structural* range; the article's
/// own evidence slice can be just its caput so that child devices are not
/// indexed twice under the article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArticleEvidenceRange {
    /// Caput when the article has descendants, structural otherwise.
    #[default]
    Caput,
    /// Always the full structural range.
    Structural,
}

#[derive(Debug, Clone)]
pub struct MaterializerConfig {
    pub max_text_chars: usize,
    pub overlap_chars: usize,
    pub article_evidence: ArticleEvidenceRange,
}

impl Default for MaterializerConfig {
    fn default() -> Self {
        Self {
            max_text_chars: MAX_TEXT_CHARS,
            overlap_chars: OVERLAP_CHARS,
            article_evidence: ArticleEvidenceRange::default(),
        }
    }
}

/// Materializes articles (and their descendants) into physical chunks.
pub struct ChunkMaterializer {
    document_id: String,
    document_type: String,
    prefix: String,
    config: MaterializerConfig,
}

impl ChunkMaterializer {
    pub fn new(document_id: impl Into<String>, document_type: impl Into<String>) -> Self {
        Self::with_config(document_id, document_type, MaterializerConfig::default())
    }

    pub fn with_config(
        document_id: impl Into<String>,
        document_type: impl Into<String>,
        config: MaterializerConfig,
    ) -> Self {
        let document_type = document_type.into();
        let prefix = prefix_for_document_type(&document_type).to_string();
        Self {
            document_id: document_id.into(),
            document_type,
            prefix,
            config,
        }
    }

    /// Materialize every article of the document. Runs the invariant gate
    /// before returning; a failed document emits nothing.
    pub fn materialize_document(&self, doc: &ParsedDocument) -> Result<Vec<ChunkPart>> {
        let (offsets, canonical_hash) = extract_offsets_from_parsed_doc(doc);
        let mut chunks = Vec::new();
        for article in doc.articles() {
            chunks.extend(self.materialize_article(
                article,
                doc,
                &offsets,
                &doc.source_text,
                &canonical_hash,
            )?);
        }

        let violations = self.validate_chunk_invariants(&chunks, &doc.source_text, &canonical_hash);
        if !violations.is_empty() {
            return Err(ChunkError::Contract {
                document_id: self.document_id.clone(),
                violations,
            });
        }

        info!(
            target: "law_chunker::materializer",
            document_id = %self.document_id,
            articles = doc.articles().len(),
            chunks = chunks.len(),
            "document materialized"
        );
        Ok(chunks)
    }

    /// Materialize one article and its descendants.
    ///
    /// `offsets` may omit entries for externally supplied spans; missing
    /// children are resolved with the strict resolver inside their parent's
    /// range. Every failure aborts the whole article.
    pub fn materialize_article(
        &self,
        article: &Span,
        doc: &ParsedDocument,
        offsets: &BTreeMap<String, (usize, usize)>,
        canonical_text: &str,
        canonical_hash: &str,
    ) -> Result<Vec<ChunkPart>> {
        let descendants: Vec<&Span> = doc
            .article_spans(&article.span_id)
            .into_iter()
            .filter(|s| s.span_id != article.span_id)
            .filter(|s| DeviceType::from_span_type(s.span_type).is_evidence_bearing())
            .collect();
        let has_children = !descendants.is_empty();

        let (art_start, art_struct_end) = offsets
            .get(&article.span_id)
            .copied()
            .unwrap_or((article.start_pos, article.end_pos));
        let evidence_end = match self.config.article_evidence {
            ArticleEvidenceRange::Caput if has_children => {
                article.caput_end_pos.unwrap_or(art_struct_end)
            }
            _ => art_struct_end,
        };

        let article_number = article.article_number();
        let mut chunks = self.emit_parts(
            article,
            None,
            DeviceType::Article,
            article_number.as_deref(),
            (art_start, evidence_end),
            canonical_hash,
        );

        for child in descendants {
            let device = DeviceType::from_span_type(child.span_type);
            let (child_start, child_end) = match offsets.get(&child.span_id) {
                Some(&(start, end)) => (start, end),
                None => {
                    let (parent_start, parent_end) = child
                        .parent_id
                        .as_ref()
                        .and_then(|p| offsets.get(p))
                        .copied()
                        .unwrap_or((art_start, art_struct_end));
                    resolve_child_offsets(canonical_text, parent_start, parent_end, &child.text)
                        .map_err(|kind| {
                            self.resolution_error(
                                kind,
                                &child.span_id,
                                device,
                                format!(
                                    "resolving within parent range {parent_start}..{parent_end}"
                                ),
                            )
                        })?
                }
            };

            // Re-check against the article's structural range: a child that
            // escapes it indicates corrupted offsets, not valid input.
            if child_start < art_start || child_end > art_struct_end || child_start >= child_end {
                return Err(self.resolution_error(
                    FailureKind::ContainmentViolation,
                    &child.span_id,
                    device,
                    format!(
                        "child range {child_start}..{child_end} outside article {art_start}..{art_struct_end}"
                    ),
                ));
            }

            chunks.extend(self.emit_parts(
                child,
                child.parent_id.as_deref(),
                device,
                article_number.as_deref(),
                (child_start, child_end),
                canonical_hash,
            ));
        }

        Ok(chunks)
    }

    fn emit_parts(
        &self,
        span: &Span,
        parent_span_id: Option<&str>,
        device: DeviceType,
        article_number: Option<&str>,
        evidence: (usize, usize),
        canonical_hash: &str,
    ) -> Vec<ChunkPart> {
        let logical = build_logical_node_id(&self.prefix, &self.document_id, &span.span_id);
        let mut parts = split_span_to_parts(
            &span.text,
            &logical,
            &self.document_id,
            &span.span_id,
            parent_span_id,
            device,
            article_number,
            &self.document_type,
            self.config.max_text_chars,
            self.config.overlap_chars,
        );
        for part in &mut parts {
            part.canonical_start = evidence.0 as i64;
            part.canonical_end = evidence.1 as i64;
            part.canonical_hash = canonical_hash.to_string();
        }
        parts
    }

    fn resolution_error(
        &self,
        kind: FailureKind,
        span_id: &str,
        device: DeviceType,
        detail: String,
    ) -> ChunkError {
        ChunkError::Resolution {
            kind,
            document_id: self.document_id.clone(),
            span_id: span_id.to_string(),
            device_type: device.as_str().to_string(),
            detail,
        }
    }

    /// Exit invariants over a materialized batch. Returns human-readable
    /// violations; an empty list is the only acceptable outcome.
    pub fn validate_chunk_invariants(
        &self,
        chunks: &[ChunkPart],
        canonical_text: &str,
        canonical_hash: &str,
    ) -> Vec<String> {
        let mut violations = Vec::new();
        let mut node_ids = HashSet::new();

        for chunk in chunks {
            let id = &chunk.node_id;
            if !node_ids.insert(id.as_str()) {
                violations.push(format!("{id}: duplicate node_id"));
            }
            if chunk.part_total == 0 || chunk.part_index >= chunk.part_total {
                violations.push(format!(
                    "{id}: part_index {} out of range (total {})",
                    chunk.part_index, chunk.part_total
                ));
            }

            let coherent = chunk.evidence_coherent();
            let sentinel = chunk.evidence_sentinel();
            if !coherent && !sentinel {
                violations.push(format!(
                    "{id}: mixed evidence trio ({}, {}, {:?})",
                    chunk.canonical_start, chunk.canonical_end, chunk.canonical_hash
                ));
            }

            if chunk.device_type.is_evidence_bearing() {
                if !coherent {
                    violations.push(format!("{id}: evidence-bearing chunk without trio"));
                } else {
                    if chunk.canonical_hash != canonical_hash {
                        violations.push(format!("{id}: canonical_hash mismatch"));
                    }
                    match canonical_text
                        .get(chunk.canonical_start as usize..chunk.canonical_end as usize)
                    {
                        Some(slice) => {
                            if !text_matches_span_id(&chunk.span_id, slice) {
                                violations.push(format!(
                                    "{id}: canonical slice does not start with the prefix of {}",
                                    chunk.span_id
                                ));
                            }
                        }
                        None => violations.push(format!("{id}: evidence range outside canonical text")),
                    }
                }
            }

            match chunk.device_type {
                DeviceType::Article => {
                    if chunk.parent_chunk_id.is_some() {
                        violations.push(format!("{id}: article chunk must not have a parent"));
                    }
                }
                DeviceType::Paragraph | DeviceType::Inciso | DeviceType::Alinea => {
                    match &chunk.parent_chunk_id {
                        Some(parent) if parent.ends_with("@P00") => {}
                        Some(parent) => violations.push(format!(
                            "{id}: parent_chunk_id {parent} does not reference @P00"
                        )),
                        None => violations.push(format!("{id}: child chunk without parent")),
                    }
                }
                _ => {}
            }

            let own_logical = &chunk.logical_node_id;
            let parent_logical = chunk
                .parent_chunk_id
                .as_deref()
                .map(|p| format!("{}:{}", self.prefix, p.split("@P").next().unwrap_or(p)));
            let mut seen = HashSet::new();
            for citation in &chunk.citations {
                if citation == own_logical || citation == &chunk.node_id {
                    violations.push(format!("{id}: self-loop citation {citation}"));
                }
                if parent_logical.as_deref() == Some(citation.as_str()) {
                    violations.push(format!("{id}: parent-loop citation {citation}"));
                }
                if !seen.insert(citation.as_str()) {
                    violations.push(format!("{id}: duplicate citation {citation}"));
                }
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use law_parser::{SpanType, parse_law};

    const TWO_ARTICLES: &str = "\
Art. 1º Esta Lei estabelece normas gerais de licitação.

§ 1º O disposto nesta Lei aplica-se à administração direta.

I - órgão público: unidade de atuação;

II - entidade: pessoa jurídica.

Art. 2º Na aplicação desta Lei, observar-se-ão os princípios:

I - legalidade;

II - impessoalidade;

III - moralidade.
";

    fn materializer() -> ChunkMaterializer {
        ChunkMaterializer::new("LEI-14133-2021", "LEI")
    }

    fn span(id: &str, ty: SpanType, text: &str, parent: Option<&str>) -> law_parser::Span {
        law_parser::Span {
            span_id: id.to_string(),
            span_type: ty,
            text: text.to_string(),
            identifier: None,
            parent_id: parent.map(str::to_string),
            start_pos: 0,
            end_pos: 0,
            caput_end_pos: None,
            order: 0,
        }
    }

    #[test]
    fn materializes_every_device_with_coherent_evidence() {
        let doc = parse_law(TWO_ARTICLES).unwrap();
        let chunks = materializer().materialize_document(&doc).unwrap();

        let ids: Vec<_> = chunks.iter().map(|c| c.chunk_id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                "LEI-14133-2021#ART-001@P00",
                "LEI-14133-2021#PAR-001-1@P00",
                "LEI-14133-2021#INC-001-I@P00",
                "LEI-14133-2021#INC-001-II@P00",
                "LEI-14133-2021#ART-002@P00",
                "LEI-14133-2021#INC-002-I@P00",
                "LEI-14133-2021#INC-002-II@P00",
                "LEI-14133-2021#INC-002-III@P00",
            ]
        );
        for chunk in &chunks {
            assert!(chunk.evidence_coherent(), "{}", chunk.node_id);
            assert_eq!(chunk.part_total, 1);
        }
    }

    #[test]
    fn article_evidence_is_caput_when_it_has_children() {
        let doc = parse_law(TWO_ARTICLES).unwrap();
        let chunks = materializer().materialize_document(&doc).unwrap();

        let art1 = chunks.iter().find(|c| c.span_id == "ART-001").unwrap();
        let par1 = chunks.iter().find(|c| c.span_id == "PAR-001-1").unwrap();
        // Caput evidence ends where the first paragraph begins.
        assert_eq!(art1.canonical_end, par1.canonical_start);
        let slice =
            &doc.source_text[art1.canonical_start as usize..art1.canonical_end as usize];
        assert!(slice.starts_with("Art. 1º"));
        assert!(!slice.contains('§'));

        // A childless… ART-002 has incisos, so its evidence is the caput
        // too; its structural range still bounds the children.
        let art2 = chunks.iter().find(|c| c.span_id == "ART-002").unwrap();
        let inc3 = chunks.iter().find(|c| c.span_id == "INC-002-III").unwrap();
        assert!(inc3.canonical_end as usize <= doc.source_text.len());
        assert!(art2.canonical_start < inc3.canonical_start);
    }

    #[test]
    fn structural_profile_stores_full_article_range() {
        let doc = parse_law(TWO_ARTICLES).unwrap();
        let config = MaterializerConfig {
            article_evidence: ArticleEvidenceRange::Structural,
            ..MaterializerConfig::default()
        };
        let chunks = ChunkMaterializer::with_config("LEI-14133-2021", "LEI", config)
            .materialize_document(&doc)
            .unwrap();
        let art1 = chunks.iter().find(|c| c.span_id == "ART-001").unwrap();
        let art2 = chunks.iter().find(|c| c.span_id == "ART-002").unwrap();
        assert_eq!(art1.canonical_end, art2.canonical_start);
    }

    #[test]
    fn children_point_to_parent_first_part() {
        let doc = parse_law(TWO_ARTICLES).unwrap();
        let chunks = materializer().materialize_document(&doc).unwrap();

        let inc1 = chunks.iter().find(|c| c.span_id == "INC-001-I").unwrap();
        assert_eq!(
            inc1.parent_chunk_id.as_deref(),
            Some("LEI-14133-2021#PAR-001-1@P00")
        );
        let art1 = chunks.iter().find(|c| c.span_id == "ART-001").unwrap();
        assert_eq!(art1.parent_chunk_id, None);
        assert_eq!(inc1.article_number.as_deref(), Some("001"));
        assert_eq!(inc1.document_type, "LEI");
        assert_eq!(
            inc1.node_id,
            "leis:LEI-14133-2021#INC-001-I@P00"
        );
    }

    #[test]
    fn ambiguous_child_resolution_aborts_the_article() {
        let canonical =
            "Art. 1º TEXTO REPETIDO aqui.\n\n§ 1º TEXTO REPETIDO no parágrafo.\n\n§ 2º TEXTO REPETIDO de novo.\n";
        let mut doc = law_parser::ParsedDocument::new(canonical);
        let mut art = span("ART-001", SpanType::Artigo, "Art. 1º TEXTO REPETIDO aqui.", None);
        art.end_pos = canonical.len();
        doc.add_span(art);
        doc.add_span(span(
            "PAR-001-1",
            SpanType::Paragrafo,
            "TEXTO REPETIDO",
            Some("ART-001"),
        ));

        let mut offsets = BTreeMap::new();
        offsets.insert("ART-001".to_string(), (0usize, canonical.len()));
        let hash = crate::canonical::compute_canonical_hash(canonical);

        let article = doc.get_span("ART-001").unwrap();
        let err = materializer()
            .materialize_article(article, &doc, &offsets, canonical, &hash)
            .unwrap_err();
        assert_eq!(err.reason(), "AMBIGUOUS");
        assert!(err.to_string().contains("PAR-001-1"));
    }

    #[test]
    fn missing_child_text_aborts_not_found() {
        let canonical = "Art. 1º Este é o texto do artigo.\n";
        let mut doc = law_parser::ParsedDocument::new(canonical);
        let mut art = span("ART-001", SpanType::Artigo, "Art. 1º Este é o texto do artigo.", None);
        art.end_pos = canonical.len();
        doc.add_span(art);
        doc.add_span(span(
            "PAR-001-1",
            SpanType::Paragrafo,
            "TEXTO QUE NÃO EXISTE",
            Some("ART-001"),
        ));

        let mut offsets = BTreeMap::new();
        offsets.insert("ART-001".to_string(), (0usize, canonical.len()));
        let hash = crate::canonical::compute_canonical_hash(canonical);

        let article = doc.get_span("ART-001").unwrap();
        let err = materializer()
            .materialize_article(article, &doc, &offsets, canonical, &hash)
            .unwrap_err();
        assert_eq!(err.reason(), "NOT_FOUND");
    }

    #[test]
    fn invariant_gate_catches_mixed_evidence() {
        let doc = parse_law(TWO_ARTICLES).unwrap();
        let m = materializer();
        let (_, hash) = crate::canonical::extract_offsets_from_parsed_doc(&doc);
        let mut chunks = m.materialize_document(&doc).unwrap();

        chunks[0].canonical_hash.clear(); // coherent range, empty hash
        let violations = m.validate_chunk_invariants(&chunks, &doc.source_text, &hash);
        assert!(violations.iter().any(|v| v.contains("mixed evidence")
            || v.contains("without trio")));
    }

    #[test]
    fn invariant_gate_catches_prefix_mismatch() {
        let doc = parse_law(TWO_ARTICLES).unwrap();
        let m = materializer();
        let (_, hash) = crate::canonical::extract_offsets_from_parsed_doc(&doc);
        let mut chunks = m.materialize_document(&doc).unwrap();

        // Point the paragraph's evidence at the article's range.
        let art_range = {
            let art = chunks.iter().find(|c| c.span_id == "ART-002").unwrap();
            (art.canonical_start, art.canonical_end)
        };
        let par = chunks.iter_mut().find(|c| c.span_id == "PAR-001-1").unwrap();
        par.canonical_start = art_range.0;
        par.canonical_end = art_range.1;

        let violations = m.validate_chunk_invariants(&chunks, &doc.source_text, &hash);
        assert!(violations.iter().any(|v| v.contains("does not start with the prefix")));
    }
}
