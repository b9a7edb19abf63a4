//! Ingestion core for Brazilian legal documents.
//!
//! Facade over the two member crates: [`law_parser`] turns canonical
//! markdown into uniquely addressed spans with byte-exact offsets,
//! [`law_chunker`] materializes them into hybrid-searchable chunk parts
//! with the canonical evidence trio, origin labels and normalized
//! citations. [`pipeline`] wires both into one forward pass per document
//! and exports JSONL for the indexing sinks.

pub mod errors;
pub mod pipeline;
pub mod util;

pub use errors::{PipelineError, Result};
pub use pipeline::{
    AcordaoIngestOutput, Genre, IngestOptions, IngestOutput, IngestStats, ingest_acordao_markdown,
    ingest_file_to_jsonl, ingest_markdown,
};

pub use law_chunker;
pub use law_parser;
