//! Physical chunk models.
//!
//! A [`ChunkPart`] is the indexable unit handed to external sinks: one
//! physical slice of one logical span, carrying the id family of
//! [`crate::ids`], the evidence trio, origin classification and normalized
//! citations. Spans larger than the split limit produce several parts; all
//! parts of one span share the span's canonical evidence range.

use serde::{Deserialize, Serialize};

use law_parser::SpanType;

/// Sentinel for an absent evidence offset.
pub const EVIDENCE_SENTINEL: i64 = -1;

/// Normalized device category of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Article,
    Paragraph,
    Inciso,
    Alinea,
    Caput,
    Ementa,
    Preambulo,
    Unknown,
}

impl DeviceType {
    /// Map a parser span type to its device category. Outline kinds
    /// (chapters, sections, titles, free text) map to `Unknown` and never
    /// become chunks; headers become `Ementa`.
    pub fn from_span_type(span_type: SpanType) -> Self {
        match span_type {
            SpanType::Artigo => DeviceType::Article,
            SpanType::Paragrafo => DeviceType::Paragraph,
            SpanType::Inciso => DeviceType::Inciso,
            SpanType::Alinea | SpanType::Item => DeviceType::Alinea,
            SpanType::Header => DeviceType::Ementa,
            SpanType::Capitulo
            | SpanType::Secao
            | SpanType::Subsecao
            | SpanType::Titulo
            | SpanType::Texto
            | SpanType::Assinatura => DeviceType::Unknown,
        }
    }

    /// Normalize a legacy label into the closed category set.
    pub fn normalize(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "article" | "artigo" => DeviceType::Article,
            "paragraph" | "paragrafo" | "parágrafo" => DeviceType::Paragraph,
            "inciso" => DeviceType::Inciso,
            "alinea" | "alínea" | "item" => DeviceType::Alinea,
            "caput" => DeviceType::Caput,
            "ementa" | "header" => DeviceType::Ementa,
            "preambulo" | "preâmbulo" => DeviceType::Preambulo,
            _ => DeviceType::Unknown,
        }
    }

    /// Evidence-bearing devices must carry a coherent canonical trio.
    pub fn is_evidence_bearing(self) -> bool {
        matches!(
            self,
            DeviceType::Article | DeviceType::Paragraph | DeviceType::Inciso | DeviceType::Alinea
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DeviceType::Article => "article",
            DeviceType::Paragraph => "paragraph",
            DeviceType::Inciso => "inciso",
            DeviceType::Alinea => "alinea",
            DeviceType::Caput => "caput",
            DeviceType::Ementa => "ementa",
            DeviceType::Preambulo => "preambulo",
            DeviceType::Unknown => "unknown",
        }
    }
}

/// Material origin of a chunk's text: the host document itself or another
/// law physically embedded in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OriginType {
    #[default]
    #[serde(rename = "self")]
    SelfMaterial,
    #[serde(rename = "external")]
    External,
}

impl OriginType {
    pub const fn as_str(self) -> &'static str {
        match self {
            OriginType::SelfMaterial => "self",
            OriginType::External => "external",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginConfidence {
    #[default]
    High,
    Medium,
    Low,
}

impl OriginConfidence {
    pub const fn as_str(self) -> &'static str {
        match self {
            OriginConfidence::High => "high",
            OriginConfidence::Medium => "medium",
            OriginConfidence::Low => "low",
        }
    }
}

/// One physical, indexable part of a logical span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPart {
    /// `{prefix}:{document_id}#{span_id}@P{nn}` — physical primary key.
    pub node_id: String,
    /// `{prefix}:{document_id}#{span_id}` — stable across splitting.
    pub logical_node_id: String,
    /// `{document_id}#{span_id}@P{nn}`.
    pub chunk_id: String,
    /// `{document_id}#{parent_span_id}@P00`, absent for roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_chunk_id: Option<String>,

    pub part_index: usize,
    pub part_total: usize,

    /// This part's slice of the span text.
    pub text: String,
    /// Offsets within the span's own text, not the canonical text.
    pub char_start: usize,
    pub char_end: usize,

    /// Evidence trio over the canonical text: either fully coherent or
    /// fully sentinel (`-1, -1, ""`), never mixed.
    pub canonical_start: i64,
    pub canonical_end: i64,
    pub canonical_hash: String,

    pub device_type: DeviceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_number: Option<String>,
    pub document_type: String,
    pub document_id: String,
    pub span_id: String,

    // Origin classification overlay.
    pub origin_type: OriginType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_reference_name: Option<String>,
    pub is_external_material: bool,
    pub origin_confidence: OriginConfidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_reason: Option<String>,

    /// Normalized citation targets (no self-loops, no parent-loops).
    #[serde(default)]
    pub citations: Vec<String>,

    pub schema_version: String,
    #[serde(default)]
    pub ingest_run_id: String,
    #[serde(default)]
    pub ingestion_timestamp: String,
}

impl ChunkPart {
    /// The trio is fully set: valid range and a non-empty hash.
    pub fn evidence_coherent(&self) -> bool {
        self.canonical_start >= 0
            && self.canonical_end > self.canonical_start
            && !self.canonical_hash.is_empty()
    }

    /// The trio is fully sentinel.
    pub fn evidence_sentinel(&self) -> bool {
        self.canonical_start == EVIDENCE_SENTINEL
            && self.canonical_end == EVIDENCE_SENTINEL
            && self.canonical_hash.is_empty()
    }

    pub fn is_split(&self) -> bool {
        self.part_total > 1
    }

    pub fn is_first_part(&self) -> bool {
        self.part_index == 0
    }

    pub fn is_last_part(&self) -> bool {
        self.part_index + 1 == self.part_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("article", DeviceType::Article)]
    #[case("ARTIGO", DeviceType::Article)]
    #[case("paragraph", DeviceType::Paragraph)]
    #[case("parágrafo", DeviceType::Paragraph)]
    #[case("inciso", DeviceType::Inciso)]
    #[case("alínea", DeviceType::Alinea)]
    #[case("item", DeviceType::Alinea)]
    #[case("caput", DeviceType::Caput)]
    #[case("qualquer-coisa", DeviceType::Unknown)]
    fn normalizes_legacy_device_labels(#[case] label: &str, #[case] expected: DeviceType) {
        assert_eq!(DeviceType::normalize(label), expected);
    }

    #[test]
    fn evidence_bearing_devices() {
        assert!(DeviceType::Article.is_evidence_bearing());
        assert!(DeviceType::Alinea.is_evidence_bearing());
        assert!(!DeviceType::Ementa.is_evidence_bearing());
        assert!(!DeviceType::Unknown.is_evidence_bearing());
    }

    #[test]
    fn serialized_names_are_stable() {
        assert_eq!(serde_json::to_string(&DeviceType::Article).unwrap(), "\"article\"");
        assert_eq!(serde_json::to_string(&OriginType::SelfMaterial).unwrap(), "\"self\"");
        assert_eq!(serde_json::to_string(&OriginType::External).unwrap(), "\"external\"");
        assert_eq!(serde_json::to_string(&OriginConfidence::Low).unwrap(), "\"low\"");
    }
}
