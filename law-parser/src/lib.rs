//! Deterministic span parsing for Brazilian legal documents.
//!
//! Two regex-first parsers share one discipline: structure is recognized
//! from lexical patterns only, every span gets a unique id and absolute byte
//! offsets into the canonical source text, and nothing is ever inferred or
//! generated. [`SpanParser`] handles the law genre (leis, decretos,
//! instruções normativas); [`acordao::AcordaoSpanParser`] handles TCU
//! rulings. [`AddressValidator`] cross-checks span ids against the literal
//! text they address.

pub mod acordao;
mod address;
pub mod errors;
mod parser;
mod patterns;
pub mod roman;
pub mod types;

pub use address::{AddressValidator, ValidationResult, ValidationStats, text_matches_span_id};
pub use errors::{Error, Result};
pub use parser::{ParserConfig, SpanParser};
pub use types::{DocumentMetadata, ParsedDocument, Span, SpanType};

/// Parse law-genre markdown with the default configuration.
pub fn parse_law(markdown: &str) -> Result<ParsedDocument> {
    SpanParser::default().parse(markdown)
}

/// Parse a TCU ruling with the default configuration.
pub fn parse_acordao(markdown: &str) -> acordao::ParsedAcordao {
    acordao::AcordaoSpanParser::default().parse(markdown)
}
