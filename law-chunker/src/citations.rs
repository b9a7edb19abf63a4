//! Normative citation extraction and normalization.
//!
//! Finds references to norms (leis, decretos, INs, portarias, resoluções,
//! acórdãos, MPs, ECs, the Constitution) and to internal devices
//! (`art. 9º`, `inciso III`) in legal text, and expresses each as a
//! canonical target `{prefix}:{doc_id}[#{span_id}]`. Extraction is
//! regex-only; years are validated against a canonical norms table and
//! per-type historical bounds, so `Lei 8.666/2021` resolves to
//! `LEI-8666-1993` and a `DL` dated 1995 is discarded rather than invented.

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::ids::{normalize_node_id, prefix_for_document_type};

/// Closed set of recognized norm types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NormativeType {
    #[serde(rename = "LEI")]
    Lei,
    #[serde(rename = "LC")]
    LeiComplementar,
    #[serde(rename = "DECRETO")]
    Decreto,
    #[serde(rename = "DL")]
    DecretoLei,
    #[serde(rename = "IN")]
    InstrucaoNormativa,
    #[serde(rename = "PORTARIA")]
    Portaria,
    #[serde(rename = "RESOLUCAO")]
    Resolucao,
    #[serde(rename = "ACORDAO")]
    Acordao,
    #[serde(rename = "MP")]
    MedidaProvisoria,
    #[serde(rename = "EC")]
    EmendaConstitucional,
    #[serde(rename = "CF")]
    Constituicao,
    #[serde(rename = "INTERNO")]
    Interno,
}

impl NormativeType {
    pub const fn as_str(self) -> &'static str {
        match self {
            NormativeType::Lei => "LEI",
            NormativeType::LeiComplementar => "LC",
            NormativeType::Decreto => "DECRETO",
            NormativeType::DecretoLei => "DL",
            NormativeType::InstrucaoNormativa => "IN",
            NormativeType::Portaria => "PORTARIA",
            NormativeType::Resolucao => "RESOLUCAO",
            NormativeType::Acordao => "ACORDAO",
            NormativeType::MedidaProvisoria => "MP",
            NormativeType::EmendaConstitucional => "EC",
            NormativeType::Constituicao => "CF",
            NormativeType::Interno => "INTERNO",
        }
    }
}

/// Canonical id of the Federal Constitution; it is cited without number.
const CF_DOC_ID: &str = "CF-1988";

/// Well-known norms: `(type, number) -> promulgation year`. Preferred over
/// an extracted year, which OCR and sloppy drafting get wrong routinely.
const CANONICAL_NORMS: &[(&str, &str, u32)] = &[
    // Leis federais
    ("LEI", "8666", 1993),
    ("LEI", "10520", 2002),
    ("LEI", "12462", 2011),
    ("LEI", "13303", 2016),
    ("LEI", "14133", 2021),
    ("LEI", "8429", 1992),
    ("LEI", "9784", 1999),
    ("LEI", "12527", 2011),
    ("LEI", "13709", 2018),
    ("LEI", "4320", 1964),
    ("LEI", "8112", 1990),
    ("LEI", "10406", 2002),
    ("LEI", "5172", 1966),
    ("LEI", "6404", 1976),
    ("LEI", "9472", 1997),
    ("LEI", "9478", 1997),
    ("LEI", "11079", 2004),
    ("LEI", "11107", 2005),
    ("LEI", "8987", 1995),
    ("LEI", "13019", 2014),
    // Leis complementares
    ("LC", "101", 2000),
    ("LC", "123", 2006),
    ("LC", "116", 2003),
    ("LC", "87", 1996),
    // Decretos
    ("DECRETO", "10024", 2019),
    ("DECRETO", "10947", 2022),
    ("DECRETO", "7892", 2013),
    ("DECRETO", "9507", 2018),
    ("DECRETO", "8538", 2015),
    ("DECRETO", "6170", 2007),
    ("DECRETO", "93872", 1986),
    // Instruções normativas SEGES
    ("IN", "5", 2017),
    ("IN", "40", 2020),
    ("IN", "58", 2022),
    ("IN", "65", 2021),
    ("IN", "73", 2020),
    ("IN", "81", 2022),
    ("IN", "98", 2022),
    // Portarias
    ("PORTARIA", "938", 2022),
    ("PORTARIA", "8678", 2021),
];

fn canonical_year(norm_type: &str, number: &str) -> Option<u32> {
    CANONICAL_NORMS
        .iter()
        .find(|(t, n, _)| *t == norm_type && *n == number)
        .map(|(_, _, year)| *year)
}

/// Valid year range per norm type. A year outside the range is discarded:
/// decretos-lei stopped existing in 1988, LCs only exist since 1967.
fn year_bounds(norm_type: &str) -> (u32, u32) {
    match norm_type {
        "LEI" => (1824, 2030),
        "LC" => (1967, 2030),
        "DECRETO" => (1889, 2030),
        "DL" => (1937, 1988),
        "IN" => (1990, 2030),
        "PORTARIA" => (1950, 2030),
        "RESOLUCAO" => (1950, 2030),
        "ACORDAO" => (1990, 2030),
        "MP" => (1988, 2030),
        "EC" => (1992, 2030),
        _ => (1900, 2030),
    }
}

/// One normative reference found in a text.
#[derive(Debug, Clone, Serialize)]
pub struct NormativeReference {
    /// Original text as matched.
    pub raw: String,
    #[serde(rename = "type")]
    pub norm_type: NormativeType,
    /// Normalized id, e.g. `LEI-14133-2021`.
    pub doc_id: Option<String>,
    /// Device reference, e.g. `ART-009`.
    pub span_ref: Option<String>,
    /// Canonical target, e.g. `leis:LEI-14133-2021#ART-009`.
    pub target_node_id: Option<String>,
    pub method: &'static str,
    /// 0.0 – 1.0. High >= 0.9, medium 0.6 – 0.9, low < 0.6.
    pub confidence: f32,
    pub is_ambiguous: bool,
}

struct CitationPatterns {
    norms: Vec<(NormativeType, Vec<Regex>)>,
    year: Regex,
    device_artigo: Regex,
    device_paragrafo: Regex,
    device_inciso: Regex,
    device_alinea: Regex,
    device_before: Regex,
    internal: Regex,
}

impl Default for CitationPatterns {
    fn default() -> Self {
        let compile = |p: &str| Regex::new(p).expect("static pattern");
        let norm = |patterns: &[&str]| patterns.iter().map(|p| compile(p)).collect::<Vec<_>>();
        Self {
            // Order matters: LC before LEI, DL before DECRETO, so the more
            // specific form wins and dedup suppresses the generic one.
            norms: vec![
                (
                    NormativeType::LeiComplementar,
                    norm(&[
                        r"(?i)Lei\s+Complementar\s+(?:n[ºo°]?\s*)?(\d+[\d.]*)",
                        r"(?i)\bLC\s+(?:n[ºo°]?\s*)?(\d+[\d.]*)",
                    ]),
                ),
                (
                    NormativeType::Lei,
                    norm(&[
                        r"(?i)Lei\s+(?:Federal\s+)?(?:n[ºo°]?\s*)?(\d+[\d.]*)(?:/(\d{2,4}))?",
                    ]),
                ),
                (
                    NormativeType::DecretoLei,
                    norm(&[
                        r"(?i)Decreto[-\s]Lei\s+(?:n[ºo°]?\s*)?(\d+[\d.]*)",
                        r"(?i)\bDL\s+(?:n[ºo°]?\s*)?(\d+[\d.]*)",
                    ]),
                ),
                (
                    NormativeType::Decreto,
                    norm(&[r"(?i)Decreto\s+(?:Federal\s+)?(?:n[ºo°]?\s*)?(\d+[\d.]*)"]),
                ),
                (
                    NormativeType::InstrucaoNormativa,
                    norm(&[
                        r"(?i)Instru[çc][aã]o\s+Normativa\s+(?:[\w\-/]+\s+)?(?:n[ºo°]?\s*)?(\d+)",
                        r"(?i)\bIN\s+(?:[\w\-/]+\s+)?(?:n[ºo°]?\s*)?(\d+)",
                    ]),
                ),
                (
                    NormativeType::Portaria,
                    norm(&[r"(?i)Portaria\s+(?:[\w\-/]+\s+)?(?:n[ºo°]?\s*)?(\d+)"]),
                ),
                (
                    NormativeType::Resolucao,
                    norm(&[r"(?i)Resolu[çc][aã]o\s+(?:[\w\-/]+\s+)?(?:n[ºo°]?\s*)?(\d+)"]),
                ),
                (
                    NormativeType::Acordao,
                    norm(&[r"(?i)Ac[oó]rd[aã]o\s+(?:n[ºo°]?\s*)?(\d+)(?:/(\d{4}))?"]),
                ),
                (
                    NormativeType::MedidaProvisoria,
                    norm(&[
                        r"(?i)Medida\s+Provis[oó]ria\s+(?:n[ºo°]?\s*)?(\d+[\d.]*)",
                        r"(?i)\bMP\s+(?:n[ºo°]?\s*)?(\d+[\d.]*)",
                    ]),
                ),
                (
                    NormativeType::EmendaConstitucional,
                    norm(&[
                        r"(?i)Emenda\s+Constitucional\s+(?:n[ºo°]?\s*)?(\d+)",
                        r"(?i)\bEC\s+(?:n[ºo°]?\s*)?(\d+)",
                    ]),
                ),
                (
                    NormativeType::Constituicao,
                    norm(&[
                        r"(?i)Constitui[çc][aã]o\s+(?:Federal|da\s+Rep[úu]blica)?",
                        r"\bCF(?:/\d{2,4})?\b",
                    ]),
                ),
            ],
            year: compile(r"[/\s](\d{2,4})"),
            device_artigo: compile(r"(?i)(?:art\.?|artigo)\s*(\d+)[ºo°]?"),
            device_paragrafo: compile(r"(?i)(?:§|par[áa]grafo)\s*(\d+|[úu]nico)[ºo°]?"),
            device_inciso: compile(r"(?i)inciso\s+([IVXLCDM]+)"),
            device_alinea: compile(r#"(?i)al[ií]nea\s+['"]?([a-z])['"]?"#),
            device_before: compile(
                r#"(?i)(?:art\.?|artigo)\s*(\d+)[ºo°]?(?:\s*,?\s*(?:§|par[áa]grafo)\s*(\d+|[úu]nico)[ºo°]?)?(?:\s*,?\s*inciso\s+([IVXLCDM]+))?(?:\s*,?\s*al[ií]nea\s+['"]?([a-z])['"]?)?\s*(?:,\s*)?(?:d[aoe]s?|n[aoe]s?)\s*$"#,
            ),
            internal: compile(
                r#"(?i)(?:art\.?|artigo)\s*(\d+)[ºo°]?(?:\s*,?\s*(?:§|par[áa]grafo)\s*(\d+|[úu]nico)[ºo°]?)?(?:\s*,?\s*inciso\s+([IVXLCDM]+))?(?:\s*,?\s*al[ií]nea\s+['"]?([a-z])['"]?)?"#,
            ),
        }
    }
}

/// Regex-driven extractor of normative references.
pub struct CitationExtractor {
    current_document_id: Option<String>,
    current_prefix: String,
    patterns: CitationPatterns,
}

impl CitationExtractor {
    /// `current_document_id` lets internal references (`art. 9º` with no
    /// norm mention) resolve to the document being ingested.
    pub fn new(current_document_id: Option<String>, current_document_type: Option<&str>) -> Self {
        let current_prefix = current_document_type
            .map(prefix_for_document_type)
            .unwrap_or("leis")
            .to_string();
        Self {
            current_document_id,
            current_prefix,
            patterns: CitationPatterns::default(),
        }
    }

    /// Extract every normative reference from `text`, deduplicated by raw
    /// text and by `{doc_id}#{span_ref}`.
    pub fn extract(&self, text: &str) -> Vec<NormativeReference> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut references = Vec::new();
        let mut seen_raw: HashSet<String> = HashSet::new();
        let mut seen_keys: HashSet<String> = HashSet::new();

        for (norm_type, patterns) in &self.patterns.norms {
            for pattern in patterns {
                for caps in pattern.captures_iter(text) {
                    let m = caps.get(0).expect("whole match");
                    if !seen_raw.insert(m.as_str().to_lowercase()) {
                        continue;
                    }
                    let reference = self.parse_normative_match(&caps, *norm_type, text);
                    let key = format!(
                        "{}#{}",
                        reference.doc_id.as_deref().unwrap_or(""),
                        reference.span_ref.as_deref().unwrap_or("")
                    );
                    if reference.doc_id.is_some() && !seen_keys.insert(key) {
                        continue;
                    }
                    references.push(reference);
                }
            }
        }

        references.extend(self.extract_internal_references(text, &mut seen_raw));
        references
    }

    fn parse_normative_match(
        &self,
        caps: &regex::Captures<'_>,
        norm_type: NormativeType,
        full_text: &str,
    ) -> NormativeReference {
        let m = caps.get(0).expect("whole match");
        let mut raw = m.as_str().to_string();

        let number = caps.get(1).map(|g| g.as_str().replace('.', ""));

        // Year right after the match ("Lei 14.133/2021", "IN 65, de 2021").
        let mut year: Option<u32> = None;
        let tail_end = ceil_boundary(full_text, m.end() + 20);
        let tail = &full_text[m.end()..tail_end];
        if let Some(ycaps) = self.patterns.year.captures(tail) {
            year = expand_year(&ycaps[1]);
            let whole = ycaps.get(0).expect("whole match");
            raw = full_text[m.start()..m.end() + whole.end()].to_string();
        }
        // A year captured by the pattern itself wins.
        if let Some(captured) = caps.get(2) {
            if captured.as_str().chars().all(|c| c.is_ascii_digit()) {
                year = expand_year(captured.as_str());
            }
        }

        let doc_id = self.build_doc_id(norm_type, number.as_deref(), year);

        // Device either before ("art. 9º da Lei …") or after ("Lei … art. 9º").
        let span_ref = self
            .device_reference_before(full_text, m.start())
            .or_else(|| self.device_reference_after(full_text, m.end()));

        let target_node_id = doc_id.as_ref().map(|doc| {
            let prefix = prefix_for_document_type(norm_type.as_str());
            match &span_ref {
                Some(span) => format!("{prefix}:{doc}#{span}"),
                None => format!("{prefix}:{doc}"),
            }
        });

        let (confidence, is_ambiguous) =
            confidence_for(norm_type, number.as_deref(), year, doc_id.as_deref());

        NormativeReference {
            raw: raw.trim().to_string(),
            norm_type,
            doc_id,
            span_ref,
            target_node_id,
            method: "regex",
            confidence,
            is_ambiguous,
        }
    }

    /// Internal references (`art. 9º`, `art. 75, inciso II`) with no norm
    /// mention nearby resolve against the current document.
    fn extract_internal_references(
        &self,
        text: &str,
        seen_raw: &mut HashSet<String>,
    ) -> Vec<NormativeReference> {
        let mut references = Vec::new();

        for caps in self.patterns.internal.captures_iter(text) {
            let m = caps.get(0).expect("whole match");
            let raw = m.as_str();
            if raw.len() < 4 || !seen_raw.insert(raw.to_lowercase()) {
                continue;
            }

            // A trailing "da Lei …" means the reference belongs to another
            // norm and is handled by the norm patterns; "desta Lei" stays
            // internal.
            let after_end = ceil_boundary(text, m.end() + 100);
            let after = text[m.end()..after_end].to_lowercase();
            let head50: String = after.chars().take(50).collect();
            let head30: String = after.chars().take(30).collect();
            let is_external = ["da lei", "do decreto", "da in", "da portaria", "desta"]
                .iter()
                .any(|kw| head50.contains(kw));
            if is_external && !head30.contains("desta") {
                continue;
            }

            let span_ref = build_span_ref(
                &caps[1],
                caps.get(2).map(|g| g.as_str()),
                caps.get(3).map(|g| g.as_str()),
                caps.get(4).map(|g| g.as_str()),
            );

            let (doc_id, target_node_id) = match &self.current_document_id {
                Some(doc) => (
                    Some(doc.clone()),
                    Some(format!("{}:{doc}#{span_ref}", self.current_prefix)),
                ),
                None => (None, None),
            };
            let known_doc = self.current_document_id.is_some();

            references.push(NormativeReference {
                raw: raw.trim().to_string(),
                norm_type: NormativeType::Interno,
                doc_id,
                span_ref: Some(span_ref),
                target_node_id,
                method: "regex",
                confidence: if known_doc { 0.9 } else { 0.5 },
                is_ambiguous: !known_doc,
            });
        }
        references
    }

    fn build_doc_id(
        &self,
        norm_type: NormativeType,
        number: Option<&str>,
        year: Option<u32>,
    ) -> Option<String> {
        if norm_type == NormativeType::Constituicao && number.is_none() {
            return Some(CF_DOC_ID.to_string());
        }
        let number = number?;
        let type_prefix = norm_type.as_str();
        let trimmed = number.trim_start_matches('0');
        let number_clean = if trimmed.is_empty() { number } else { trimmed };

        let canonical = canonical_year(type_prefix, number_clean);
        let validated = validate_year(type_prefix, number_clean, year, canonical);

        match validated {
            Some(y) => Some(format!("{type_prefix}-{number_clean}-{y}")),
            None => Some(format!("{type_prefix}-{number_clean}")),
        }
    }

    /// Device reference immediately before a norm mention, anchored on the
    /// connecting preposition: `art. 9º da Lei …`, `art. 75, inciso II, da
    /// Lei …`.
    fn device_reference_before(&self, text: &str, norm_start: usize) -> Option<String> {
        let window_start = floor_boundary(text, norm_start.saturating_sub(100));
        let window = &text[window_start..norm_start];
        let caps = self.patterns.device_before.captures(window)?;
        Some(build_span_ref(
            &caps[1],
            caps.get(2).map(|g| g.as_str()),
            caps.get(3).map(|g| g.as_str()),
            caps.get(4).map(|g| g.as_str()),
        ))
    }

    /// Device reference after a norm mention: `Lei 14.133/2021, art. 9º,
    /// § 1º, inciso II, alínea a`.
    fn device_reference_after(&self, text: &str, norm_end: usize) -> Option<String> {
        let window_end = ceil_boundary(text, norm_end + 100);
        let window = &text[norm_end..window_end];

        let art = self.patterns.device_artigo.captures(window)?;
        let art_num = art[1].to_string();
        let mut rest = &window[art.get(0).expect("whole match").end()..];

        let mut par = None;
        let head = &rest[..ceil_boundary(rest, 50.min(rest.len()))];
        if let Some(c) = self.patterns.device_paragrafo.captures(head) {
            par = Some(c[1].to_string());
            rest = &rest[c.get(0).expect("whole match").end()..];
        }

        let mut inciso = None;
        let head = &rest[..ceil_boundary(rest, 50.min(rest.len()))];
        if let Some(c) = self.patterns.device_inciso.captures(head) {
            inciso = Some(c[1].to_string());
            rest = &rest[c.get(0).expect("whole match").end()..];
        }

        let mut alinea = None;
        let head = &rest[..ceil_boundary(rest, 30.min(rest.len()))];
        if let Some(c) = self.patterns.device_alinea.captures(head) {
            alinea = Some(c[1].to_string());
        }

        Some(build_span_ref(
            &art_num,
            par.as_deref(),
            inciso.as_deref(),
            alinea.as_deref(),
        ))
    }
}

/// Compose a device span id: `ALI-075-II-a`, `INC-075-II`, `PAR-009-UNICO`,
/// `ART-009`.
fn build_span_ref(
    art_num: &str,
    par_num: Option<&str>,
    inc_num: Option<&str>,
    ali_num: Option<&str>,
) -> String {
    let art = format!("{:0>3}", art_num);
    if let (Some(ali), Some(inc)) = (ali_num, inc_num) {
        return format!("ALI-{art}-{}-{}", inc.to_uppercase(), ali.to_lowercase());
    }
    if let Some(inc) = inc_num {
        return format!("INC-{art}-{}", inc.to_uppercase());
    }
    if let Some(par) = par_num {
        let par = if par.eq_ignore_ascii_case("unico") || par.to_lowercase() == "único" {
            "UNICO".to_string()
        } else {
            par.to_string()
        };
        return format!("PAR-{art}-{par}");
    }
    format!("ART-{art}")
}

/// Expand two-digit years: `< 50 -> 20YY`, otherwise `19YY`.
fn expand_year(year: &str) -> Option<u32> {
    let value: u32 = year.parse().ok()?;
    Some(match year.len() {
        2 if value < 50 => 2000 + value,
        2 => 1900 + value,
        _ => value,
    })
}

/// Prefer the canonical year; otherwise keep an extracted year only when it
/// falls inside the type's historical bounds.
fn validate_year(
    type_prefix: &str,
    number: &str,
    extracted: Option<u32>,
    canonical: Option<u32>,
) -> Option<u32> {
    if let Some(canonical) = canonical {
        if let Some(extracted) = extracted {
            if extracted.abs_diff(canonical) > 2 {
                debug!(
                    target: "law_chunker::citations",
                    norm = %format!("{type_prefix}-{number}"),
                    extracted,
                    canonical,
                    "year corrected from canonical norms table"
                );
            }
        }
        return Some(canonical);
    }
    let extracted = extracted?;
    let (min_year, max_year) = year_bounds(type_prefix);
    if extracted < min_year || extracted > max_year {
        debug!(
            target: "law_chunker::citations",
            norm = %format!("{type_prefix}-{number}"),
            year = extracted,
            min_year,
            max_year,
            "year outside valid bounds, discarded"
        );
        return None;
    }
    Some(extracted)
}

fn confidence_for(
    norm_type: NormativeType,
    number: Option<&str>,
    year: Option<u32>,
    doc_id: Option<&str>,
) -> (f32, bool) {
    if norm_type == NormativeType::Constituicao {
        return (0.95, false);
    }
    if number.is_none() {
        return (0.3, true);
    }
    if year.is_none() {
        return (0.6, true);
    }
    if doc_id.is_none() {
        return (0.5, true);
    }
    (0.95, false)
}

/// Normalize a chunk's citation list: drop empties, self-loops (target ==
/// the chunk's own logical node id), parent-loops (target == the parent
/// chunk's logical node id) and duplicates, preserving first-seen order.
pub fn normalize_citations(
    citations: &[String],
    chunk_node_id: &str,
    parent_chunk_id: Option<&str>,
    document_type: Option<&str>,
) -> Vec<String> {
    let parent_node_id = parent_chunk_id.map(|parent| {
        let prefix = match document_type {
            Some(doc_type) => prefix_for_document_type(doc_type),
            None => chunk_node_id.split(':').next().filter(|p| !p.is_empty()).unwrap_or("leis"),
        };
        // Hierarchy is logical: strip the physical @P suffix.
        let logical_parent = parent.split("@P").next().unwrap_or(parent);
        format!("{prefix}:{logical_parent}")
    });

    let own_logical = chunk_node_id.split("@P").next().unwrap_or(chunk_node_id);

    let mut seen: HashSet<&str> = HashSet::new();
    let mut normalized = Vec::new();
    for citation in citations {
        let target = citation.trim();
        if target.is_empty() {
            continue;
        }
        if target == chunk_node_id || target == own_logical {
            continue;
        }
        if parent_node_id.as_deref() == Some(target) {
            continue;
        }
        if !seen.insert(target) {
            continue;
        }
        normalized.push(target.to_string());
    }
    normalized
}

/// One-stop extraction for a chunk: extract targets, normalize ids, drop
/// loops and duplicates.
pub fn extract_citations_from_chunk(
    text: &str,
    document_id: Option<&str>,
    document_type: Option<&str>,
    chunk_node_id: Option<&str>,
    parent_chunk_id: Option<&str>,
) -> Vec<String> {
    let extractor = CitationExtractor::new(document_id.map(str::to_string), document_type);
    let targets: Vec<String> = extractor
        .extract(text)
        .into_iter()
        .filter_map(|r| r.target_node_id)
        .map(|t| normalize_node_id(&t))
        .collect();

    match chunk_node_id {
        Some(node_id) => {
            normalize_citations(&targets, &normalize_node_id(node_id), parent_chunk_id, document_type)
        }
        None => targets,
    }
}

/// Largest char boundary `<= idx` (clamped to the text length).
fn floor_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Smallest char boundary `>= idx` (clamped to the text length).
fn ceil_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> CitationExtractor {
        CitationExtractor::new(Some("IN-58-2022".to_string()), Some("IN"))
    }

    fn find<'a>(refs: &'a [NormativeReference], doc_id: &str) -> &'a NormativeReference {
        refs.iter()
            .find(|r| r.doc_id.as_deref() == Some(doc_id))
            .unwrap_or_else(|| panic!("no reference with doc_id {doc_id}: {refs:?}"))
    }

    #[test]
    fn extracts_law_with_device_before() {
        let refs = extractor().extract("conforme o art. 9º da Lei 14.133/2021");
        let lei = find(&refs, "LEI-14133-2021");
        assert_eq!(lei.norm_type, NormativeType::Lei);
        assert_eq!(lei.span_ref.as_deref(), Some("ART-009"));
        assert_eq!(
            lei.target_node_id.as_deref(),
            Some("leis:LEI-14133-2021#ART-009")
        );
        assert!(lei.confidence >= 0.9);
        assert!(!lei.is_ambiguous);
    }

    #[test]
    fn extracts_device_after_with_subparts() {
        let refs = extractor().extract("Lei 14.133/2021, art. 75, inciso II, alínea 'a'");
        let lei = find(&refs, "LEI-14133-2021");
        assert_eq!(lei.span_ref.as_deref(), Some("ALI-075-II-a"));
    }

    #[test]
    fn corrects_wrong_year_from_canonical_table() {
        let refs = extractor().extract("nos termos da Lei 8.666/2021");
        let lei = find(&refs, "LEI-8666-1993");
        assert_eq!(lei.doc_id.as_deref(), Some("LEI-8666-1993"));
    }

    #[test]
    fn expands_two_digit_years() {
        assert_eq!(expand_year("21"), Some(2021));
        assert_eq!(expand_year("93"), Some(1993));
        assert_eq!(expand_year("2021"), Some(2021));
    }

    #[test]
    fn discards_year_outside_type_bounds() {
        // Decreto-Lei ceased to exist in 1988.
        assert_eq!(validate_year("DL", "9999", Some(1995), None), None);
        assert_eq!(validate_year("DL", "2848", Some(1940), None), Some(1940));
    }

    #[test]
    fn missing_year_lowers_confidence() {
        let refs = extractor().extract("aplicando a Portaria 123");
        let portaria = find(&refs, "PORTARIA-123");
        assert!(portaria.is_ambiguous);
        assert!((portaria.confidence - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn constitution_resolves_without_number() {
        let refs = extractor().extract("conforme o art. 37 da Constituição Federal");
        let cf = find(&refs, "CF-1988");
        assert_eq!(cf.norm_type, NormativeType::Constituicao);
        assert_eq!(cf.span_ref.as_deref(), Some("ART-037"));
        assert!(!cf.is_ambiguous);
    }

    #[test]
    fn lc_wins_over_generic_lei() {
        let refs = extractor().extract("segundo a Lei Complementar nº 123/2006");
        assert!(refs.iter().any(|r| r.doc_id.as_deref() == Some("LC-123-2006")));
        assert!(!refs.iter().any(|r| r.norm_type == NormativeType::Lei));
    }

    #[test]
    fn internal_reference_resolves_to_current_document() {
        let refs = extractor().extract("o disposto no art. 12 desta Instrução Normativa");
        let interno = refs
            .iter()
            .find(|r| r.norm_type == NormativeType::Interno)
            .expect("internal reference");
        assert_eq!(interno.doc_id.as_deref(), Some("IN-58-2022"));
        assert_eq!(interno.span_ref.as_deref(), Some("ART-012"));
        assert_eq!(
            interno.target_node_id.as_deref(),
            Some("leis:IN-58-2022#ART-012")
        );
    }

    #[test]
    fn external_device_reference_is_left_to_norm_patterns() {
        let refs = extractor().extract("o art. 9º da Lei 14.133/2021 aplica-se");
        // The internal extractor must not double-report art. 9º.
        let internos: Vec<_> = refs
            .iter()
            .filter(|r| r.norm_type == NormativeType::Interno)
            .collect();
        assert!(internos.is_empty(), "unexpected internal refs: {internos:?}");
    }

    #[test]
    fn duplicates_are_suppressed() {
        let refs = extractor().extract("a Lei 14.133/2021 e novamente a Lei 14.133/2021");
        let count = refs
            .iter()
            .filter(|r| r.doc_id.as_deref() == Some("LEI-14133-2021"))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn normalize_citations_removes_loops_and_duplicates() {
        let own = "leis:LEI-14.133-2021#ART-006";
        let parent = Some("LEI-14.133-2021#ART-005@P00");
        let citations = vec![
            "".to_string(),
            "leis:LEI-14.133-2021#ART-006".to_string(), // self-loop
            "leis:LEI-14.133-2021#ART-005".to_string(), // parent-loop
            "leis:LEI-8666-1993#ART-024".to_string(),
            "leis:LEI-8666-1993#ART-024".to_string(), // duplicate
            "leis:LC-123-2006".to_string(),
        ];
        let normalized = normalize_citations(&citations, own, parent, Some("LEI"));
        assert_eq!(
            normalized,
            vec!["leis:LEI-8666-1993#ART-024", "leis:LC-123-2006"]
        );
    }

    #[test]
    fn chunk_extraction_normalizes_ids_and_loops() {
        let citations = extract_citations_from_chunk(
            "Aplica-se o art. 24 da Lei 8.666/1993.",
            Some("LEI-14.133-2021"),
            Some("LEI"),
            Some("leis:LEI-14.133-2021#ART-006@P00"),
            Some("LEI-14.133-2021#ART-005@P00"),
        );
        assert_eq!(citations, vec!["leis:LEI-8.666-1993#ART-024"]);
    }
}
