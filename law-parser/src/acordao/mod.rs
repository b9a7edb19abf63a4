//! Parsing for the TCU ruling (acórdão) genre.

mod models;
mod parser;

pub use models::{
    AcordaoMetadata, AcordaoSpan, AcordaoSpanType, ParsedAcordao, normalize_acordao_id,
    parse_colegiado,
};
pub use parser::{AcordaoParserConfig, AcordaoSpanParser};
