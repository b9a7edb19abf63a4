//! Span models for Brazilian legal documents.
//!
//! A [`Span`] is the minimal uniquely addressed fragment of a document
//! (article, paragraph, inciso, alínea, chapter, header). A
//! [`ParsedDocument`] holds every span of one document in source order plus
//! the lookup indexes. Both are built once by the parser and treated as
//! immutable afterwards; offsets always point into
//! [`ParsedDocument::source_text`], which is the single coordinate system
//! for slicing and hashing.
//!
//! Span id shapes:
//!
//! | Kind      | Shape                  | Example            |
//! |-----------|------------------------|--------------------|
//! | Header    | `HDR-{seq}`            | `HDR-001`          |
//! | Capítulo  | `CAP-{roman}`          | `CAP-II`           |
//! | Artigo    | `ART-{nnn}[-{letter}]` | `ART-005`, `ART-337-E` |
//! | Parágrafo | `PAR-{art}-{n\|UNICO}` | `PAR-005-1`        |
//! | Inciso    | `INC-{art}-{roman}[_{n}]` | `INC-005-I_2`   |
//! | Alínea    | `ALI-{art}-{roman}-{letter}` | `ALI-005-I-a` |
//!
//! Inciso numerals reused in a different context (caput vs. `§ 2º`) get a
//! `_2`, `_3`, … suffix; the suffix disambiguates the id only, the real
//! parent is in `parent_id`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Structural kinds recognized in the law genre.
///
/// Serialized names are stable wire values; keep them lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanType {
    Header,
    Capitulo,
    Secao,
    Subsecao,
    Artigo,
    Paragrafo,
    Inciso,
    Alinea,
    Item,
    Titulo,
    Texto,
    Assinatura,
}

/// A uniquely addressed fragment of a document.
///
/// `start_pos`/`end_pos` are byte offsets into the canonical source text and
/// delimit the span's *structural* range: for an article it runs up to the
/// start of the next article, so every descendant lies inside it. `text` is
/// the literal slice of the span's own content (up to its first child
/// marker), trimmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub span_id: String,
    pub span_type: SpanType,
    pub text: String,
    /// Legal identifier as written: `"1"`, `"I"`, `"a"`, `"UNICO"`, `"337-E"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub start_pos: usize,
    pub end_pos: usize,
    /// Articles only: byte offset where the caput ends and the first
    /// paragraph begins. Absent when the article has no paragraphs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caput_end_pos: Option<usize>,
    /// Stable insertion order, used for deterministic iteration.
    #[serde(default)]
    pub order: usize,
}

impl Span {
    pub fn is_article(&self) -> bool {
        self.span_type == SpanType::Artigo
    }

    pub fn is_paragraph(&self) -> bool {
        self.span_type == SpanType::Paragrafo
    }

    pub fn is_inciso(&self) -> bool {
        self.span_type == SpanType::Inciso
    }

    pub fn is_alinea(&self) -> bool {
        self.span_type == SpanType::Alinea
    }

    /// Article number encoded in the span id, letter suffix included.
    ///
    /// `ART-337-E` -> `"337-E"`, `PAR-040-1` -> `"040"`.
    pub fn article_number(&self) -> Option<String> {
        if let Some(rest) = self.span_id.strip_prefix("ART-") {
            return Some(rest.to_string());
        }
        let mut parts = self.span_id.split('-');
        let _kind = parts.next()?;
        parts.next().map(str::to_string)
    }
}

/// Document-level attributes parsed from the header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_raw: Option<String>,
}

/// Ordered collection of spans plus lookup indexes.
///
/// The indexes are private, rebuilt as spans are added, and never shared
/// across documents.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedDocument {
    pub spans: Vec<Span>,
    /// Canonical text every offset points into.
    pub source_text: String,
    pub metadata: DocumentMetadata,
    #[serde(skip)]
    span_index: HashMap<String, usize>,
    #[serde(skip)]
    children_index: HashMap<String, Vec<usize>>,
}

impl ParsedDocument {
    pub fn new(source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            ..Self::default()
        }
    }

    /// Append a span, assigning its insertion order and updating indexes.
    ///
    /// The caller is responsible for id uniqueness; the parser guarantees it
    /// via `_2`/`_3` suffixing.
    pub fn add_span(&mut self, mut span: Span) {
        span.order = self.spans.len();
        if let Some(parent) = &span.parent_id {
            self.children_index
                .entry(parent.clone())
                .or_default()
                .push(self.spans.len());
        }
        self.span_index.insert(span.span_id.clone(), self.spans.len());
        self.spans.push(span);
    }

    /// O(1) lookup by span id.
    pub fn get_span(&self, span_id: &str) -> Option<&Span> {
        self.span_index.get(span_id).map(|&i| &self.spans[i])
    }

    /// Direct children of `parent_id`, in document order.
    pub fn get_children(&self, parent_id: &str) -> Vec<&Span> {
        self.children_index
            .get(parent_id)
            .map(|idxs| idxs.iter().map(|&i| &self.spans[i]).collect())
            .unwrap_or_default()
    }

    pub fn spans_by_type(&self, span_type: SpanType) -> Vec<&Span> {
        self.spans.iter().filter(|s| s.span_type == span_type).collect()
    }

    pub fn articles(&self) -> Vec<&Span> {
        self.spans_by_type(SpanType::Artigo)
    }

    pub fn capitulos(&self) -> Vec<&Span> {
        self.spans_by_type(SpanType::Capitulo)
    }

    /// Every span of one article: the article itself plus direct and
    /// indirect descendants (paragraph incisos, inciso alíneas).
    pub fn article_spans(&self, article_id: &str) -> Vec<&Span> {
        let mut out = Vec::new();
        let Some(article) = self.get_span(article_id) else {
            return out;
        };
        out.push(article);
        let mut queue: Vec<&str> = vec![article_id];
        while let Some(parent) = queue.pop() {
            for child in self.get_children(parent) {
                out.push(child);
                queue.push(&child.span_id);
            }
        }
        out.sort_by_key(|s| s.order);
        out.dedup_by_key(|s| s.order);
        out
    }

    /// Deterministic text reconstruction from a list of span ids. Unknown
    /// ids are skipped.
    pub fn reconstruct_text(&self, span_ids: &[String]) -> String {
        span_ids
            .iter()
            .filter_map(|id| self.get_span(id))
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Check that every id exists; returns the unknown ones.
    pub fn validate_span_ids(&self, span_ids: &[String]) -> (bool, Vec<String>) {
        let invalid: Vec<String> = span_ids
            .iter()
            .filter(|id| !self.span_index.contains_key(*id))
            .cloned()
            .collect();
        (invalid.is_empty(), invalid)
    }

    /// `span_id -> (start, end)` byte offsets over `source_text`.
    pub fn offsets_map(&self) -> BTreeMap<String, (usize, usize)> {
        self.spans
            .iter()
            .map(|s| (s.span_id.clone(), (s.start_pos, s.end_pos)))
            .collect()
    }

    /// Markdown with each span prefixed by `[SPAN_ID]`, the format handed
    /// to downstream classifiers.
    pub fn to_annotated_markdown(&self) -> String {
        self.spans
            .iter()
            .map(|s| format!("[{}] {}", s.span_id, s.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(id: &str, ty: SpanType, parent: Option<&str>) -> Span {
        Span {
            span_id: id.to_string(),
            span_type: ty,
            text: format!("text of {id}"),
            identifier: None,
            parent_id: parent.map(str::to_string),
            start_pos: 0,
            end_pos: 1,
            caput_end_pos: None,
            order: 0,
        }
    }

    #[test]
    fn lookup_and_children_follow_insertion_order() {
        let mut doc = ParsedDocument::new("src");
        doc.add_span(span("ART-001", SpanType::Artigo, None));
        doc.add_span(span("INC-001-I", SpanType::Inciso, Some("ART-001")));
        doc.add_span(span("INC-001-II", SpanType::Inciso, Some("ART-001")));

        assert!(doc.get_span("ART-001").is_some());
        let children: Vec<_> = doc
            .get_children("ART-001")
            .iter()
            .map(|s| s.span_id.clone())
            .collect();
        assert_eq!(children, vec!["INC-001-I", "INC-001-II"]);
        assert_eq!(doc.spans[2].order, 2);
    }

    #[test]
    fn article_spans_collects_indirect_descendants() {
        let mut doc = ParsedDocument::new("src");
        doc.add_span(span("ART-001", SpanType::Artigo, None));
        doc.add_span(span("PAR-001-1", SpanType::Paragrafo, Some("ART-001")));
        doc.add_span(span("INC-001-I", SpanType::Inciso, Some("PAR-001-1")));
        doc.add_span(span("ART-002", SpanType::Artigo, None));

        let ids: Vec<_> = doc
            .article_spans("ART-001")
            .iter()
            .map(|s| s.span_id.clone())
            .collect();
        assert_eq!(ids, vec!["ART-001", "PAR-001-1", "INC-001-I"]);
    }

    #[test]
    fn reconstructs_text_skipping_unknown_ids() {
        let mut doc = ParsedDocument::new("src");
        doc.add_span(span("ART-001", SpanType::Artigo, None));
        let text = doc.reconstruct_text(&["ART-001".into(), "ART-999".into()]);
        assert_eq!(text, "text of ART-001");

        let (ok, invalid) = doc.validate_span_ids(&["ART-001".into(), "ART-999".into()]);
        assert!(!ok);
        assert_eq!(invalid, vec!["ART-999"]);
    }

    #[test]
    fn article_number_keeps_letter_suffix() {
        let s = span("ART-337-E", SpanType::Artigo, None);
        assert_eq!(s.article_number().as_deref(), Some("337-E"));
        let p = span("PAR-040-1", SpanType::Paragrafo, None);
        assert_eq!(p.article_number().as_deref(), Some("040"));
    }
}
