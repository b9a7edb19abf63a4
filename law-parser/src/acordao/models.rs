//! Data models for TCU ruling (acórdão) documents.
//!
//! Span id shapes: `SUMARIO`, `REL-{nnn}`, `VOTO-{nnn}`, `ACORDAO`,
//! `ACORDAO-{X}-{Y}`. The canonical ruling id is
//! `AC-{numero}-{ano}-{colegiado}` with colegiado in `P`/`1C`/`2C`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Structural kinds in a TCU ruling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcordaoSpanType {
    Header,
    Sumario,
    Relatorio,
    Voto,
    Acordao,
    Deliberacao,
}

/// One span of a ruling with byte offsets into the source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcordaoSpan {
    pub span_id: String,
    pub span_type: AcordaoSpanType,
    pub text: String,
    /// Original numbering as written (`"1"`, `"9.1"`).
    #[serde(default)]
    pub identifier: String,
    /// Only deliberations have a parent (the `ACORDAO` block).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub start_pos: usize,
    pub end_pos: usize,
}

/// Header metadata extracted from the ruling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcordaoMetadata {
    pub numero: u32,
    pub ano: u32,
    /// `P`, `1C` or `2C`.
    pub colegiado: String,
    /// e.g. `TC 002.019/2024-8`.
    pub processo: String,
    /// e.g. `AC-2724-47/25-P`.
    pub codigo_eletronico: String,
    pub relator: String,
    /// `DD/MM/YYYY`.
    pub data_sessao: String,
    pub unidade_tecnica: String,
    pub interessado: String,
    pub grupo: String,
    pub classe: String,
}

impl AcordaoMetadata {
    /// Canonical ruling id, empty until número/ano/colegiado are known.
    pub fn acordao_id(&self) -> String {
        if self.numero > 0 && self.ano > 0 && !self.colegiado.is_empty() {
            format!("AC-{}-{}-{}", self.numero, self.ano, self.colegiado)
        } else {
            String::new()
        }
    }
}

/// A parsed ruling: spans in source order plus an id index.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedAcordao {
    pub source_text: String,
    pub metadata: AcordaoMetadata,
    pub spans: Vec<AcordaoSpan>,
    #[serde(skip)]
    span_index: HashMap<String, usize>,
}

impl ParsedAcordao {
    pub fn new(source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            ..Self::default()
        }
    }

    pub fn add_span(&mut self, span: AcordaoSpan) {
        self.span_index.insert(span.span_id.clone(), self.spans.len());
        self.spans.push(span);
    }

    pub fn get_span(&self, span_id: &str) -> Option<&AcordaoSpan> {
        self.span_index.get(span_id).map(|&i| &self.spans[i])
    }

    pub fn get_children(&self, parent_id: &str) -> Vec<&AcordaoSpan> {
        self.spans
            .iter()
            .filter(|s| s.parent_id.as_deref() == Some(parent_id))
            .collect()
    }

    pub fn acordao_id(&self) -> String {
        self.metadata.acordao_id()
    }

    pub fn sumario(&self) -> Option<&AcordaoSpan> {
        self.get_span("SUMARIO")
    }

    pub fn relatorios(&self) -> Vec<&AcordaoSpan> {
        self.by_type(AcordaoSpanType::Relatorio)
    }

    pub fn votos(&self) -> Vec<&AcordaoSpan> {
        self.by_type(AcordaoSpanType::Voto)
    }

    pub fn acordao(&self) -> Option<&AcordaoSpan> {
        self.get_span("ACORDAO")
    }

    pub fn deliberacoes(&self) -> Vec<&AcordaoSpan> {
        self.by_type(AcordaoSpanType::Deliberacao)
    }

    fn by_type(&self, ty: AcordaoSpanType) -> Vec<&AcordaoSpan> {
        self.spans.iter().filter(|s| s.span_type == ty).collect()
    }

    /// Markdown with each span prefixed by `[SPAN_ID]` (first line only).
    pub fn to_annotated_markdown(&self) -> String {
        self.spans
            .iter()
            .map(|s| {
                let first_line: String =
                    s.text.lines().next().unwrap_or("").chars().take(100).collect();
                format!("[{}] {first_line}…", s.span_id)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Normalize an electronic code to the canonical ruling id:
/// `AC-2724-47/25-P` -> `AC-2724-2025-P`. Returns an empty string when the
/// code does not follow the `AC-{numero}-{sessao}/{ano}-{colegiado}` shape.
pub fn normalize_acordao_id(codigo_eletronico: &str) -> String {
    let pattern = Regex::new(r"^AC[–-](\d+)[–-]\d+/(\d+)[–-]([A-Z0-9]+)").expect("static pattern");
    let Some(caps) = pattern.captures(codigo_eletronico) else {
        return String::new();
    };
    let numero = &caps[1];
    let short_year: u32 = caps[2].parse().unwrap_or(0);
    let colegiado = &caps[3];
    let ano = if short_year < 50 {
        2000 + short_year
    } else if short_year < 100 {
        1900 + short_year
    } else {
        short_year
    };
    format!("AC-{numero}-{ano}-{colegiado}")
}

/// Normalize a chamber name to `P` / `1C` / `2C`.
pub fn parse_colegiado(colegiado: &str) -> String {
    let upper = colegiado.trim().to_uppercase();
    if upper == "P" || upper.contains("PLEN") {
        return "P".to_string();
    }
    if upper.contains('1') || upper.contains("PRIMEIRA") {
        return "1C".to_string();
    }
    if upper.contains('2') || upper.contains("SEGUNDA") {
        return "2C".to_string();
    }
    upper
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_electronic_code_to_canonical_id() {
        assert_eq!(normalize_acordao_id("AC-2724-47/25-P"), "AC-2724-2025-P");
        assert_eq!(normalize_acordao_id("AC-102-3/99-1C"), "AC-102-1999-1C");
        assert_eq!(normalize_acordao_id("PROCESSO-123"), "");
    }

    #[test]
    fn normalizes_chamber_names() {
        assert_eq!(parse_colegiado("Plenário"), "P");
        assert_eq!(parse_colegiado("1ª Câmara"), "1C");
        assert_eq!(parse_colegiado("SEGUNDA CÂMARA"), "2C");
        assert_eq!(parse_colegiado("p"), "P");
    }

    #[test]
    fn acordao_id_requires_all_parts() {
        let mut meta = AcordaoMetadata::default();
        assert_eq!(meta.acordao_id(), "");
        meta.numero = 2724;
        meta.ano = 2025;
        meta.colegiado = "P".to_string();
        assert_eq!(meta.acordao_id(), "AC-2724-2025-P");
    }
}
