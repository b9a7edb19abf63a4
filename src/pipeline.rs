//! The ingestion pipeline: one deterministic forward pass per document.
//!
//! canonicalize → parse → validate addresses → materialize → classify
//! origin → extract citations → stamp versions and run id. There is no
//! feedback loop and no partial output: a document either produces its full
//! chunk set or fails with a typed reason.

use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use law_chunker::{
    AcordaoChunk, ChunkMaterializer, ChunkPart, MaterializerConfig, OriginClassifier, OriginStats,
    compute_canonical_hash, extract_citations_from_chunk, generate_ingest_run_id,
    materialize_acordao, normalize_canonical_text,
};
use law_parser::{AddressValidator, ParserConfig, SpanParser, ValidationStats};

use crate::errors::{PipelineError, Result};
use crate::util::{ensure_dir, jsonl::JsonlWriter};

/// Document genre selects the parser/materializer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genre {
    Law,
    Acordao,
}

impl Genre {
    pub fn parse(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "law" | "lei" => Some(Genre::Law),
            "acordao" | "acórdão" | "ruling" => Some(Genre::Acordao),
            _ => None,
        }
    }
}

/// Per-document ingestion options. Strict address validation is the
/// production default: an id/text mismatch aborts the document.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub document_id: String,
    pub document_type: String,
    pub strict_addresses: bool,
    pub parser: ParserConfig,
    pub materializer: MaterializerConfig,
}

impl IngestOptions {
    pub fn new(document_id: impl Into<String>, document_type: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            document_type: document_type.into(),
            strict_addresses: true,
            parser: ParserConfig::default(),
            materializer: MaterializerConfig::default(),
        }
    }

    pub fn tolerant(mut self) -> Self {
        self.strict_addresses = false;
        self
    }
}

/// Counters for one ingested document.
#[derive(Debug, Clone, Serialize)]
pub struct IngestStats {
    pub spans: usize,
    pub articles: usize,
    pub chunks: usize,
    pub address: ValidationStats,
    pub origin: OriginStats,
}

/// Everything one law-genre ingestion emits.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutput {
    pub chunks: Vec<ChunkPart>,
    pub canonical_hash: String,
    pub ingest_run_id: String,
    pub stats: IngestStats,
}

/// Ingest law-genre markdown into chunk parts.
pub fn ingest_markdown(markdown: &str, opts: &IngestOptions) -> Result<IngestOutput> {
    let canonical = normalize_canonical_text(markdown);
    let parser = SpanParser::new(opts.parser.clone());
    let doc = parser.parse(&canonical)?;

    let address = AddressValidator::new().validate_all(&doc.spans);
    if address.mismatches > 0 {
        if opts.strict_addresses {
            let first = &address.mismatch_details[0];
            return Err(PipelineError::Parse(law_parser::Error::AddressMismatch {
                span_id: first.span_id.clone(),
                expected: first.expected_prefix.clone(),
                actual: first.actual_prefix.clone(),
            }));
        }
        warn!(
            target: "lex_ingest::pipeline",
            document_id = %opts.document_id,
            mismatches = address.mismatches,
            "address mismatches tolerated"
        );
    }

    let materializer = ChunkMaterializer::with_config(
        &opts.document_id,
        &opts.document_type,
        opts.materializer.clone(),
    );
    let mut chunks = materializer.materialize_document(&doc)?;

    let origin = OriginClassifier::default().classify_batch(&mut chunks);

    let ingest_run_id = generate_ingest_run_id();
    let ingestion_timestamp = Utc::now().to_rfc3339();
    for chunk in &mut chunks {
        chunk.citations = extract_citations_from_chunk(
            &chunk.text,
            Some(&opts.document_id),
            Some(&opts.document_type),
            Some(&chunk.node_id),
            chunk.parent_chunk_id.as_deref(),
        );
        chunk.ingest_run_id = ingest_run_id.clone();
        chunk.ingestion_timestamp = ingestion_timestamp.clone();
    }

    let stats = IngestStats {
        spans: doc.spans.len(),
        articles: doc.articles().len(),
        chunks: chunks.len(),
        address,
        origin,
    };
    info!(
        target: "lex_ingest::pipeline",
        document_id = %opts.document_id,
        ingest_run_id = %ingest_run_id,
        spans = stats.spans,
        chunks = stats.chunks,
        "document ingested"
    );

    Ok(IngestOutput {
        chunks,
        canonical_hash: compute_canonical_hash(&doc.source_text),
        ingest_run_id,
        stats,
    })
}

/// Everything one ruling ingestion emits.
#[derive(Debug, Clone, Serialize)]
pub struct AcordaoIngestOutput {
    pub chunks: Vec<AcordaoChunk>,
    pub acordao_id: String,
    pub canonical_hash: String,
    pub ingest_run_id: String,
}

/// Ingest a TCU ruling into acórdão chunks.
pub fn ingest_acordao_markdown(markdown: &str) -> Result<AcordaoIngestOutput> {
    let canonical = normalize_canonical_text(markdown);
    let parsed = law_parser::parse_acordao(&canonical);
    let chunks = materialize_acordao(&parsed, None);
    let ingest_run_id = generate_ingest_run_id();

    info!(
        target: "lex_ingest::pipeline",
        acordao_id = %parsed.acordao_id(),
        ingest_run_id = %ingest_run_id,
        chunks = chunks.len(),
        "acordao ingested"
    );

    Ok(AcordaoIngestOutput {
        acordao_id: parsed.acordao_id(),
        canonical_hash: compute_canonical_hash(&parsed.source_text),
        ingest_run_id,
        chunks,
    })
}

/// End-to-end file path: read markdown, ingest, export chunks as JSONL
/// (one JSON object per line). Returns the output path. A failed document
/// writes nothing.
pub fn ingest_file_to_jsonl(
    input: &Path,
    output: &Path,
    genre: Genre,
    opts: &IngestOptions,
) -> Result<PathBuf> {
    let markdown = std::fs::read_to_string(input)?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }

    match genre {
        Genre::Law => {
            let result = ingest_markdown(&markdown, opts)?;
            let mut writer = JsonlWriter::open(output)?;
            for chunk in &result.chunks {
                writer.write_obj(chunk)?;
            }
            writer.finish()?;
        }
        Genre::Acordao => {
            let result = ingest_acordao_markdown(&markdown)?;
            let mut writer = JsonlWriter::open(output)?;
            for chunk in &result.chunks {
                writer.write_obj(chunk)?;
            }
            writer.finish()?;
        }
    }

    Ok(output.to_path_buf())
}
