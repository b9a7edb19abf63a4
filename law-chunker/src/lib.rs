//! Chunk materialization for Brazilian legal documents.
//!
//! Everything between a parsed document and the external sinks: canonical
//! text normalization and hashing, byte-stable id conventions, strict
//! child-offset resolution, size-based splitting with overlap, the chunk
//! materializer with its invariant gate, regex-driven citation extraction
//! and normalization, material-origin classification, and the direct
//! ParsedDocument → ChunkPart bridge. The ruling genre gets its own
//! materializer over the same physical discipline.
//!
//! The load-bearing invariant (the evidence contract): every
//! evidence-bearing chunk carries `(canonical_start, canonical_end,
//! canonical_hash)` such that a pure byte-slice of the canonical text
//! reproduces its content — or the whole document fails, loudly.

pub mod acordao;
pub mod bridge;
pub mod canonical;
pub mod citations;
pub mod errors;
pub mod ids;
pub mod materializer;
pub mod offsets;
pub mod origin;
pub mod split;
pub mod types;
pub mod version;

pub use acordao::{AcordaoChunk, AcordaoChunker, materialize_acordao};
pub use bridge::{ChunkPartsBuilder, build_chunk_parts};
pub use canonical::{
    compute_canonical_hash, extract_offsets_from_parsed_doc, extract_snippet_by_offsets,
    normalize_canonical_text, validate_offsets_hash,
};
pub use citations::{
    CitationExtractor, NormativeReference, NormativeType, extract_citations_from_chunk,
    normalize_citations,
};
pub use errors::{ChunkError, FailureKind, Result};
pub use ids::{normalize_document_id, normalize_node_id, prefix_for_document_type};
pub use materializer::{ArticleEvidenceRange, ChunkMaterializer, MaterializerConfig};
pub use offsets::resolve_child_offsets;
pub use origin::{OriginClassifier, OriginLabel, OriginStats};
pub use split::{MAX_TEXT_CHARS, OVERLAP_CHARS, split_text_with_offsets};
pub use types::{ChunkPart, DeviceType, OriginConfidence, OriginType};
pub use version::{EXTRACTOR_VERSION, SCHEMA_VERSION, generate_ingest_run_id};
