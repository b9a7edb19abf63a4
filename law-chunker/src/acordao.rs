//! Chunk materialization for TCU rulings.
//!
//! Rulings share the physical discipline of the law path — split with
//! overlap, `@P` part ids, parent pointers to `@P00`, evidence trio over
//! the canonical text — but keep their own record shape and the `acordaos:`
//! namespace.

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use law_parser::acordao::{AcordaoSpanType, ParsedAcordao};

use crate::canonical::compute_canonical_hash;
use crate::ids::{build_chunk_id, build_logical_node_id, build_node_id, build_parent_chunk_id};
use crate::split::{MAX_TEXT_CHARS, OVERLAP_CHARS, split_text_with_offsets};
use crate::types::EVIDENCE_SENTINEL;
use crate::version::{EXTRACTOR_VERSION, SCHEMA_VERSION};

/// One physical part of a ruling span, ready for indexing.
#[derive(Debug, Clone, Serialize)]
pub struct AcordaoChunk {
    /// `acordaos:{acordao_id}#{span_id}@P{nn}`.
    pub node_id: String,
    pub logical_node_id: String,
    /// `{acordao_id}#{span_id}@P{nn}`.
    pub chunk_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_chunk_id: Option<String>,
    pub acordao_id: String,
    pub span_id: String,
    pub device_type: AcordaoSpanType,

    pub part_index: usize,
    pub part_total: usize,
    pub text: String,
    pub char_start: usize,
    pub char_end: usize,

    pub canonical_start: i64,
    pub canonical_end: i64,
    pub canonical_hash: String,

    // Ruling metadata, echoed on every chunk.
    pub numero: u32,
    pub ano: u32,
    pub colegiado: String,
    pub processo: String,
    pub relator: String,
    pub data_sessao: String,
    pub unidade_tecnica: String,
    pub codigo_eletronico: String,

    pub schema_version: String,
    pub extractor_version: String,
    pub ingestion_timestamp: String,
    pub document_hash: String,
}

/// Materializes [`ParsedAcordao`] spans into [`AcordaoChunk`]s.
pub struct AcordaoChunker {
    schema_version: String,
    extractor_version: String,
}

impl Default for AcordaoChunker {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            extractor_version: EXTRACTOR_VERSION.to_string(),
        }
    }
}

impl AcordaoChunker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize every span of the ruling. `document_hash` defaults to
    /// the SHA-256 of the ruling's canonical text.
    pub fn materialize(
        &self,
        acordao: &ParsedAcordao,
        document_hash: Option<String>,
    ) -> Vec<AcordaoChunk> {
        let acordao_id = acordao.acordao_id();
        let canonical_hash = compute_canonical_hash(&acordao.source_text);
        let document_hash = document_hash.unwrap_or_else(|| canonical_hash.clone());
        let ingestion_timestamp = Utc::now().to_rfc3339();
        let source_len = acordao.source_text.len();

        let mut chunks = Vec::new();
        for span in &acordao.spans {
            let logical_node_id =
                build_logical_node_id("acordaos", &acordao_id, &span.span_id);
            let parts = split_text_with_offsets(&span.text, MAX_TEXT_CHARS, OVERLAP_CHARS);
            let part_total = parts.len();

            // Evidence only when the span's offsets really index the text.
            let has_evidence =
                span.end_pos > span.start_pos && span.end_pos <= source_len;

            for (part_index, (part_text, char_start, char_end)) in parts.into_iter().enumerate() {
                chunks.push(AcordaoChunk {
                    node_id: build_node_id(&logical_node_id, part_index),
                    logical_node_id: logical_node_id.clone(),
                    chunk_id: build_chunk_id(&acordao_id, &span.span_id, part_index),
                    parent_chunk_id: build_parent_chunk_id(
                        &acordao_id,
                        span.parent_id.as_deref(),
                    ),
                    acordao_id: acordao_id.clone(),
                    span_id: span.span_id.clone(),
                    device_type: span.span_type,
                    part_index,
                    part_total,
                    text: part_text.to_string(),
                    char_start,
                    char_end,
                    canonical_start: if has_evidence { span.start_pos as i64 } else { EVIDENCE_SENTINEL },
                    canonical_end: if has_evidence { span.end_pos as i64 } else { EVIDENCE_SENTINEL },
                    canonical_hash: if has_evidence { canonical_hash.clone() } else { String::new() },
                    numero: acordao.metadata.numero,
                    ano: acordao.metadata.ano,
                    colegiado: acordao.metadata.colegiado.clone(),
                    processo: acordao.metadata.processo.clone(),
                    relator: acordao.metadata.relator.clone(),
                    data_sessao: acordao.metadata.data_sessao.clone(),
                    unidade_tecnica: acordao.metadata.unidade_tecnica.clone(),
                    codigo_eletronico: acordao.metadata.codigo_eletronico.clone(),
                    schema_version: self.schema_version.clone(),
                    extractor_version: self.extractor_version.clone(),
                    ingestion_timestamp: ingestion_timestamp.clone(),
                    document_hash: document_hash.clone(),
                });
            }
        }

        info!(
            target: "law_chunker::acordao",
            acordao_id = %acordao_id,
            spans = acordao.spans.len(),
            chunks = chunks.len(),
            "acordao materialized"
        );
        chunks
    }
}

/// Convenience wrapper over [`AcordaoChunker::materialize`].
pub fn materialize_acordao(
    acordao: &ParsedAcordao,
    document_hash: Option<String>,
) -> Vec<AcordaoChunk> {
    AcordaoChunker::new().materialize(acordao, document_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use law_parser::parse_acordao;

    const RULING: &str = "\
Processo: TC 002.019/2024-8
Relator: Ministro Benjamin Zymler

SUMÁRIO: REPRESENTAÇÃO. PREGÃO ELETRÔNICO. PROCEDÊNCIA PARCIAL.

RELATÓRIO

1. Trata-se de representação formulada por licitante contra o certame.

VOTO

1. Acompanho a análise da unidade técnica integralmente neste processo.

ACÓRDÃO Nº 2724/2025 - TCU - Plenário

ACORDAM os Ministros do Tribunal de Contas da União em:

9.1. conhecer da presente representação para considerá-la parcialmente procedente;

9.2. dar ciência das falhas identificadas à unidade jurisdicionada responsável;
";

    #[test]
    fn chunk_ids_use_the_acordaos_namespace() {
        let parsed = parse_acordao(RULING);
        let chunks = materialize_acordao(&parsed, None);
        assert!(!chunks.is_empty());

        let rel = chunks.iter().find(|c| c.span_id == "REL-001").unwrap();
        assert_eq!(rel.node_id, "acordaos:AC-2724-2025-P#REL-001@P00");
        assert_eq!(rel.chunk_id, "AC-2724-2025-P#REL-001@P00");
        assert_eq!(rel.part_total, 1);
        assert_eq!(rel.numero, 2724);
        assert_eq!(rel.colegiado, "P");
    }

    #[test]
    fn deliberations_point_to_the_acordao_block() {
        let parsed = parse_acordao(RULING);
        let chunks = materialize_acordao(&parsed, None);

        let delib = chunks.iter().find(|c| c.span_id == "ACORDAO-9-1").unwrap();
        assert_eq!(
            delib.parent_chunk_id.as_deref(),
            Some("AC-2724-2025-P#ACORDAO@P00")
        );
        let block = chunks.iter().find(|c| c.span_id == "ACORDAO").unwrap();
        assert_eq!(block.parent_chunk_id, None);
    }

    #[test]
    fn evidence_trio_validates_against_source() {
        let parsed = parse_acordao(RULING);
        let chunks = materialize_acordao(&parsed, None);
        let hash = compute_canonical_hash(&parsed.source_text);

        for chunk in &chunks {
            if chunk.canonical_start >= 0 {
                assert_eq!(chunk.canonical_hash, hash, "{}", chunk.node_id);
                assert!(chunk.canonical_end as usize <= parsed.source_text.len());
            } else {
                assert!(chunk.canonical_hash.is_empty());
                assert_eq!(chunk.canonical_end, EVIDENCE_SENTINEL);
            }
        }
    }

    #[test]
    fn document_hash_defaults_to_canonical_hash() {
        let parsed = parse_acordao(RULING);
        let chunks = materialize_acordao(&parsed, None);
        let expected = compute_canonical_hash(&parsed.source_text);
        assert!(chunks.iter().all(|c| c.document_hash == expected));

        let custom = materialize_acordao(&parsed, Some("abc123".to_string()));
        assert!(custom.iter().all(|c| c.document_hash == "abc123"));
    }
}
