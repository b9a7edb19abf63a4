//! Address validation: span id vs. literal text prefix.
//!
//! The parser can mint a span whose id contradicts its own text when a
//! pattern misfires (the classic case: an internal citation detected as a
//! new paragraph, leaving `PAR-040-1` holding the text of `§ 4º`). The
//! validator catches that by extracting the identifier the id *promises*
//! and the identifier the text *shows* and comparing the two. It is purely
//! diagnostic: nothing is mutated.

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::types::Span;

/// Outcome of validating one span.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub is_mismatch: bool,
    pub message: String,
    pub span_id: String,
    pub expected_prefix: String,
    pub actual_prefix: String,
}

/// Aggregate outcome of validating a whole document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationStats {
    pub total: usize,
    pub valid: usize,
    pub mismatches: usize,
    pub skipped: usize,
    pub mismatch_details: Vec<ValidationResult>,
}

struct AddressPatterns {
    par_number: Regex,
    par_unico: Regex,
    art: Regex,
    inc: Regex,
    ali: Regex,
    leading_marker: Regex,
}

impl Default for AddressPatterns {
    fn default() -> Self {
        let compile = |p: &str| Regex::new(p).expect("static pattern");
        Self {
            par_number: compile(r"^§[ \t]*(\d+)[ºo°]?"),
            par_unico: compile(r"(?i)^par[áa]grafo[ \t]+[úu]nico"),
            art: compile(r"(?i)^Art(?:igo)?\.?[ \t]*(\d+)(?:[°ºo]?[ \t]*-?[ \t]*((?-i:[A-Z]))\.)?"),
            inc: compile(r"^([IVXLC]+)[ \t]*[-–—]"),
            ali: compile(r"^([a-z])\)"),
            leading_marker: compile(r"^(?:\d+\.[ \t]*)?[-*]?[ \t]*"),
        }
    }
}

/// Validates that a span's id matches the literal start of its text.
pub struct AddressValidator {
    patterns: AddressPatterns,
}

impl Default for AddressValidator {
    fn default() -> Self {
        Self {
            patterns: AddressPatterns::default(),
        }
    }
}

impl AddressValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate one span. Span kinds without an address rule (HDR, CAP, …)
    /// are reported valid.
    pub fn validate_span(&self, span: &Span) -> ValidationResult {
        self.validate_pair(&span.span_id, &span.text)
    }

    /// Validate an id/text pair directly (used by the chunk invariant gate
    /// on canonical slices).
    pub fn validate_pair(&self, span_id: &str, text: &str) -> ValidationResult {
        let kind = span_id.split('-').next().unwrap_or("");
        if !matches!(kind, "PAR" | "ART" | "INC" | "ALI") {
            return ValidationResult {
                is_valid: true,
                is_mismatch: false,
                message: "span kind has no address rule".to_string(),
                span_id: span_id.to_string(),
                expected_prefix: String::new(),
                actual_prefix: String::new(),
            };
        }

        let expected = self.expected_identifier(span_id, kind);
        let actual = self.actual_identifier(text, kind);
        let matched = ids_match(&expected, &actual, kind);

        if matched {
            ValidationResult {
                is_valid: true,
                is_mismatch: false,
                message: "OK".to_string(),
                span_id: span_id.to_string(),
                expected_prefix: expected,
                actual_prefix: actual,
            }
        } else {
            ValidationResult {
                is_valid: false,
                is_mismatch: true,
                message: format!(
                    "ADDRESS_MISMATCH: span_id={span_id} declares '{expected}' but text starts with '{actual}'"
                ),
                span_id: span_id.to_string(),
                expected_prefix: expected,
                actual_prefix: actual,
            }
        }
    }

    /// Identifier promised by the span id.
    fn expected_identifier(&self, span_id: &str, kind: &str) -> String {
        let parts: Vec<&str> = span_id.split('-').collect();
        match kind {
            // PAR-040-1 -> "1", PAR-040-UNICO -> "UNICO"
            "PAR" => parts.last().map(|s| s.to_string()).filter(|_| parts.len() >= 3).unwrap_or_default(),
            // ART-044 -> "44", ART-337-E -> "337-E"
            "ART" => {
                if parts.len() < 2 {
                    return String::new();
                }
                let number = parts[1].trim_start_matches('0');
                let number = if number.is_empty() { "0" } else { number };
                match parts.get(2) {
                    Some(letter) if letter.len() == 1 && letter.chars().all(|c| c.is_ascii_alphabetic()) => {
                        format!("{number}-{letter}")
                    }
                    _ => number.to_string(),
                }
            }
            // INC-040-I -> "I", INC-040-II_2 -> "II" (disambiguator
            // stripped); the roman is the last segment so lettered article
            // keys (INC-337-E-I) resolve too.
            "INC" => parts
                .last()
                .filter(|_| parts.len() >= 3)
                .map(|s| s.split('_').next().unwrap_or(s).to_string())
                .unwrap_or_default(),
            // ALI-040-I-a -> "a"
            "ALI" => parts.last().map(|s| s.to_string()).filter(|_| parts.len() >= 4).unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Identifier shown by the first lexical unit of the text.
    fn actual_identifier(&self, text: &str, kind: &str) -> String {
        let text = self.patterns.leading_marker.replace(text.trim_start(), "");
        let text = text.as_ref();
        match kind {
            "PAR" => {
                if let Some(c) = self.patterns.par_number.captures(text) {
                    return c[1].to_string();
                }
                if self.patterns.par_unico.is_match(text) {
                    return "UNICO".to_string();
                }
            }
            "ART" => {
                if let Some(c) = self.patterns.art.captures(text) {
                    return match c.get(2) {
                        Some(letter) => format!("{}-{}", &c[1], letter.as_str()),
                        None => c[1].to_string(),
                    };
                }
            }
            "INC" => {
                if let Some(c) = self.patterns.inc.captures(text) {
                    return c[1].to_string();
                }
            }
            "ALI" => {
                if let Some(c) = self.patterns.ali.captures(text) {
                    return c[1].to_string();
                }
            }
            _ => {}
        }
        // Diagnostic fallback: first 20 chars of whatever is there.
        if text.is_empty() {
            "(vazio)".to_string()
        } else {
            text.chars().take(20).collect::<String>().replace('\n', " ")
        }
    }

    /// Validate every span and collect stats; mismatches are logged.
    pub fn validate_all(&self, spans: &[Span]) -> ValidationStats {
        let mut stats = ValidationStats {
            total: spans.len(),
            ..ValidationStats::default()
        };
        for span in spans {
            let result = self.validate_span(span);
            if result.is_mismatch {
                warn!(target: "law_parser::address", span_id = %result.span_id, "{}", result.message);
                stats.mismatches += 1;
                stats.mismatch_details.push(result);
            } else if result.expected_prefix.is_empty() && result.actual_prefix.is_empty() {
                stats.skipped += 1;
            } else {
                stats.valid += 1;
            }
        }
        stats
    }
}

/// True when a canonical slice (or span text) agrees with the identifier a
/// span id promises. Shared with the materializer's invariant gate.
pub fn text_matches_span_id(span_id: &str, text: &str) -> bool {
    let validator = AddressValidator::new();
    !validator.validate_pair(span_id, text).is_mismatch
}

fn ids_match(expected: &str, actual: &str, kind: &str) -> bool {
    if expected.is_empty() || actual.is_empty() {
        return false;
    }
    let expected = expected.to_uppercase();
    let actual = actual.to_uppercase();
    match kind {
        "PAR" => {
            if expected == "UNICO" {
                actual == "UNICO" || actual == "ÚNICO"
            } else {
                expected == actual
            }
        }
        "ART" => expected.trim_start_matches('0') == actual.trim_start_matches('0'),
        _ => expected == actual,
    }
}
