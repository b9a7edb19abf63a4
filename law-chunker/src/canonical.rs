//! Canonical text utilities.
//!
//! The canonical text is the single coordinate system for every offset and
//! hash within a document. Determinism is the whole contract: normalize the
//! same bytes anywhere and you get the same text, hash it anywhere and you
//! get the same digest, and a pure slice reproduces exactly what was
//! indexed — or nothing at all.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use unicode_normalization::UnicodeNormalization;

use law_parser::ParsedDocument;

/// Normalize text into canonical form. Applied in order: Unicode NFC,
/// CRLF/CR to LF, trailing whitespace stripped per line, exactly one
/// trailing newline when the content is non-empty. Idempotent.
pub fn normalize_canonical_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let nfc: String = text.nfc().collect();
    let unified = nfc.replace("\r\n", "\n").replace('\r', "\n");
    let stripped: Vec<&str> = unified.split('\n').map(str::trim_end).collect();
    let joined = stripped.join("\n");
    let trimmed = joined.trim_end_matches('\n');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

/// SHA-256 hex digest of the already-normalized canonical text. No other
/// hash is admissible for the evidence trio.
pub fn compute_canonical_hash(canonical_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// True when `stored_hash` matches the hash of the normalized current text.
/// A mismatch means the canonical changed and stored offsets are invalid.
pub fn validate_offsets_hash(stored_hash: &str, current_canonical_text: &str) -> bool {
    if stored_hash.is_empty() {
        return false;
    }
    let normalized = normalize_canonical_text(current_canonical_text);
    compute_canonical_hash(&normalized) == stored_hash
}

/// Pure byte-slice extraction guarded by the evidence trio.
///
/// Returns the slice only when the offsets are sane and the stored hash
/// validates against the current canonical text; otherwise `None`, with no
/// fallback search of any kind.
pub fn extract_snippet_by_offsets<'a>(
    canonical_text: &'a str,
    start: i64,
    end: i64,
    stored_hash: &str,
) -> Option<&'a str> {
    if start < 0 || end <= start {
        return None;
    }
    if !validate_offsets_hash(stored_hash, canonical_text) {
        return None;
    }
    canonical_text.get(start as usize..end as usize)
}

/// Offsets map and canonical hash straight off a parsed document. The
/// parser keeps `source_text` in canonical form, so the map and the hash
/// share one coordinate system by construction.
pub fn extract_offsets_from_parsed_doc(
    doc: &ParsedDocument,
) -> (BTreeMap<String, (usize, usize)>, String) {
    (doc.offsets_map(), compute_canonical_hash(&doc.source_text))
}
