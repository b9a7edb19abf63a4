//! Deterministic span parser for TCU rulings.
//!
//! The ruling genre has a fixed macro-structure (header, SUMÁRIO, RELATÓRIO,
//! VOTO, ACÓRDÃO with numbered deliberations). Section boundaries come from
//! line-anchored heading positions; numbered paragraphs and `9.N`
//! deliberations are marker-driven within their section, with absolute byte
//! offsets like the law parser.

use regex::Regex;
use tracing::info;

use super::models::{
    AcordaoMetadata, AcordaoSpan, AcordaoSpanType, ParsedAcordao, normalize_acordao_id,
};

/// Parser configuration for the ruling genre.
#[derive(Debug, Clone)]
pub struct AcordaoParserConfig {
    pub normalize_whitespace: bool,
    /// Minimum content length for a numbered paragraph to become a span.
    pub min_paragrafo_chars: usize,
}

impl Default for AcordaoParserConfig {
    fn default() -> Self {
        Self {
            normalize_whitespace: true,
            min_paragrafo_chars: 20,
        }
    }
}

struct AcordaoPatterns {
    sumario: Regex,
    relatorio: Regex,
    relatorio_close: Regex,
    voto: Regex,
    acordao_heading: Regex,
    acordam: Regex,
    paragrafo_num: Regex,
    deliberacao: Regex,
    admin_tail: Regex,
    bullet: Regex,
    ws_run: Regex,
    blank_run: Regex,
    processo: Regex,
    codigo: Regex,
    relator: Regex,
    data_sessao: Regex,
    unidade: Regex,
    grupo_classe: Regex,
    interessado: Regex,
    titulo: Regex,
    numero_fallback: Regex,
    ano_fallback: Regex,
}

impl Default for AcordaoPatterns {
    fn default() -> Self {
        let compile = |p: &str| Regex::new(p).expect("static pattern");
        Self {
            sumario: compile(r"(?mi)^#*[ \t]*SUM[ÁA]RIO[ \t]*:?[ \t]*"),
            relatorio: compile(r"(?mi)^#*[ \t]*RELAT[ÓO]RIO[ \t]*:?[ \t]*$"),
            relatorio_close: compile(r"(?mi)^[ \t]*É[ \t]+O[ \t]+RELAT[ÓO]RIO"),
            voto: compile(r"(?mi)^#*[ \t]*VOTO[ \t]*:?[ \t]*$"),
            acordao_heading: compile(r"(?mi)^#*[ \t]*AC[ÓO]RD[ÃA]O\b[^\n]*$"),
            acordam: compile(r"(?i)\bACORDAM[ \t]+os[ \t]+Ministros"),
            paragrafo_num: compile(r"(?m)^[ \t]*(?:-[ \t]*)?(\d+)\.[ \t]+"),
            deliberacao: compile(r"(?m)^[ \t]*(?:-[ \t]*)?(9)\.(\d+)[.:]?[ \t]+"),
            admin_tail: compile(r"(?m)^[ \t]*\d+\.[ \t]+(?:Ata|Data|C[óo]digo)"),
            bullet: compile(r"^[ \t]*-[ \t]*"),
            ws_run: compile(r"[^\S\n]+"),
            blank_run: compile(r"\n{3,}"),
            processo: compile(r"(?i)(?:TC|Processo)[: \t]+(\d{3}\.\d{3}/\d{4}-\d+)"),
            codigo: compile(r"(?i)C[óo]digo[ \t]+eletr[ôo]nico[: \t]+([A-Za-z0-9\-/]+)"),
            relator: compile(
                r"(?i)(?:Relatora?|Ministroa?[ \t]+Relatora?)[: \t]+(?:Ministro[ \t]+)?([^\n]+)",
            ),
            data_sessao: compile(
                r"(?i)(?:Data[ \t]+da[ \t]+Sess[ãa]o|Sess[ãa]o[ \t]+de)[: \t]+(\d{1,2}/\d{1,2}/\d{4})",
            ),
            unidade: compile(r"(?i)Unidade[ \t]+T[ée]cnica[: \t]+([^\n]+)"),
            grupo_classe: compile(r"(?i)(GRUPO[ \t]+[IVX]+)[^\n–-]*[–-][ \t]*(CLASSE[ \t]+[IVX]+)"),
            interessado: compile(r"(?i)Interessado[: \t]+([^\n]+)"),
            titulo: compile(
                r"(?i)AC[ÓO]RD[ÃA]O[ \t]+N[°ºo]?[ \t]*(\d+)/(\d{4})[ \t]*-[ \t]*TCU[ \t]*-[ \t]*(Plen[áa]rio|1[ªa][ \t]*C[âa]mara|2[ªa][ \t]*C[âa]mara)",
            ),
            numero_fallback: compile(r"(?i)Ac[óo]rd[ãa]o[ \t]+(?:n[°ºo]?[ \t]*)?(\d+)"),
            ano_fallback: compile(r"/(\d{4})"),
        }
    }
}

/// Deterministic span parser for TCU rulings.
pub struct AcordaoSpanParser {
    config: AcordaoParserConfig,
    patterns: AcordaoPatterns,
}

impl Default for AcordaoSpanParser {
    fn default() -> Self {
        Self::new(AcordaoParserConfig::default())
    }
}

impl AcordaoSpanParser {
    pub fn new(config: AcordaoParserConfig) -> Self {
        Self {
            config,
            patterns: AcordaoPatterns::default(),
        }
    }

    pub fn parse(&self, markdown: &str) -> ParsedAcordao {
        let text = if self.config.normalize_whitespace {
            self.normalize_whitespace(markdown)
        } else {
            markdown.to_string()
        };

        let mut doc = ParsedAcordao::new(text.clone());

        let sumario_h = self.patterns.sumario.find(&text);
        let relatorio_h = self.patterns.relatorio.find(&text);
        let voto_h = self.patterns.voto.find(&text);
        let acordao_h = self
            .patterns
            .acordao_heading
            .find_at(&text, voto_h.map(|m| m.end()).unwrap_or(0))
            .or_else(|| self.patterns.acordam.find(&text));

        self.extract_metadata(&text, sumario_h.map(|m| m.start()), &mut doc);

        // SUMÁRIO: heading to the next known section.
        if let Some(h) = sumario_h {
            let end = [relatorio_h, voto_h, acordao_h]
                .iter()
                .flatten()
                .map(|m| m.start())
                .filter(|&s| s > h.end())
                .min()
                .unwrap_or(text.len());
            let content = text[h.end()..end].trim();
            if !content.is_empty() {
                let flat = self.patterns.ws_run.replace_all(content, " ");
                let flat = flat.split('\n').collect::<Vec<_>>().join(" ");
                doc.add_span(AcordaoSpan {
                    span_id: "SUMARIO".to_string(),
                    span_type: AcordaoSpanType::Sumario,
                    text: flat.trim().to_string(),
                    identifier: String::new(),
                    parent_id: None,
                    start_pos: h.start(),
                    end_pos: end,
                });
            }
        }

        // RELATÓRIO: numbered paragraphs up to VOTO / "É O RELATÓRIO".
        if let Some(h) = relatorio_h {
            let close = self
                .patterns
                .relatorio_close
                .find_at(&text, h.end())
                .map(|m| m.start());
            let end = [voto_h.map(|m| m.start()), acordao_h.map(|m| m.start()), close]
                .iter()
                .flatten()
                .copied()
                .filter(|&s| s > h.end())
                .min()
                .unwrap_or(text.len());
            self.extract_numbered(&text, h.end(), end, "REL", AcordaoSpanType::Relatorio, &mut doc);
        }

        // VOTO: numbered paragraphs up to the ACÓRDÃO block.
        if let Some(h) = voto_h {
            let end = acordao_h
                .map(|m| m.start())
                .filter(|&s| s > h.end())
                .unwrap_or(text.len());
            self.extract_numbered(&text, h.end(), end, "VOTO", AcordaoSpanType::Voto, &mut doc);
        }

        // ACÓRDÃO block plus its 9.N deliberations.
        if let Some(h) = acordao_h {
            self.extract_acordao(&text, h.start(), &mut doc);
        }

        info!(
            target: "law_parser::acordao",
            acordao_id = %doc.acordao_id(),
            spans = doc.spans.len(),
            relatorios = doc.relatorios().len(),
            votos = doc.votos().len(),
            deliberacoes = doc.deliberacoes().len(),
            "parsed acordao"
        );
        doc
    }

    fn normalize_whitespace(&self, text: &str) -> String {
        let collapsed = self.patterns.ws_run.replace_all(text, " ");
        let capped = self.patterns.blank_run.replace_all(&collapsed, "\n\n");
        let stripped: Vec<&str> = capped.lines().map(str::trim_end).collect();
        let body = stripped.join("\n");
        let body = body.trim();
        if body.is_empty() {
            String::new()
        } else {
            format!("{body}\n")
        }
    }

    fn extract_metadata(&self, text: &str, header_end: Option<usize>, doc: &mut ParsedAcordao) {
        let header = &text[..header_end.unwrap_or_else(|| text.len().min(5000))];
        let meta = &mut doc.metadata;

        if let Some(c) = self.patterns.processo.captures(header) {
            meta.processo = c[1].to_string();
        }
        // The electronic code often sits at the very end of the ruling.
        if let Some(c) = self.patterns.codigo.captures(text) {
            meta.codigo_eletronico = c[1].to_string();
            let normalized = normalize_acordao_id(&meta.codigo_eletronico);
            let parts: Vec<&str> = normalized.split('-').collect();
            if parts.len() >= 4 {
                meta.numero = parts[1].parse().unwrap_or(0);
                meta.ano = parts[2].parse().unwrap_or(0);
                meta.colegiado = parts[3].to_string();
            }
        }
        if let Some(c) = self.patterns.relator.captures(header) {
            meta.relator = c[1].trim().to_string();
        }
        if let Some(c) = self.patterns.data_sessao.captures(text) {
            meta.data_sessao = c[1].to_string();
        }
        if let Some(c) = self.patterns.unidade.captures(header) {
            meta.unidade_tecnica = c[1].trim().to_string();
        }
        if let Some(c) = self.patterns.grupo_classe.captures(header) {
            meta.grupo = c[1].trim().to_string();
            meta.classe = c[2].trim().to_string();
        }
        if let Some(c) = self.patterns.interessado.captures(header) {
            meta.interessado = c[1].trim().to_string();
        }

        // Title form: "ACÓRDÃO Nº 2724/2025 - TCU - Plenário".
        if meta.numero == 0 {
            if let Some(c) = self.patterns.titulo.captures(text) {
                meta.numero = c[1].parse().unwrap_or(0);
                meta.ano = c[2].parse().unwrap_or(0);
                let colegiado = c[3].to_uppercase();
                meta.colegiado = if colegiado.contains("PLEN") {
                    "P".to_string()
                } else if colegiado.contains('1') {
                    "1C".to_string()
                } else {
                    "2C".to_string()
                };
            }
        }

        // Last-resort header heuristics.
        if meta.numero == 0 {
            if let Some(c) = self.patterns.numero_fallback.captures(header) {
                meta.numero = c[1].parse().unwrap_or(0);
            }
            if let Some(c) = self.patterns.ano_fallback.captures(header) {
                meta.ano = c[1].parse().unwrap_or(0);
            }
            let upper = header.to_uppercase();
            if upper.contains("PLEN") {
                meta.colegiado = "P".to_string();
            } else if upper.contains("1ª") || upper.contains("PRIMEIRA") {
                meta.colegiado = "1C".to_string();
            } else if upper.contains("2ª") || upper.contains("SEGUNDA") {
                meta.colegiado = "2C".to_string();
            }
        }
    }

    /// Numbered paragraphs (`1.`, `- 2.`) inside `[start, end)`, emitted as
    /// `{prefix}-{seq}` with a sequential counter; the original number stays
    /// in `identifier`.
    fn extract_numbered(
        &self,
        text: &str,
        start: usize,
        end: usize,
        prefix: &str,
        span_type: AcordaoSpanType,
        doc: &mut ParsedAcordao,
    ) {
        let section = &text[start..end];
        let markers: Vec<(usize, String)> = self
            .patterns
            .paragrafo_num
            .captures_iter(section)
            .map(|c| (c.get(0).expect("whole match").start(), c[1].to_string()))
            .collect();

        let mut counter = 0usize;
        for (i, (local_start, numero)) in markers.iter().enumerate() {
            let local_end = markers.get(i + 1).map(|&(s, _)| s).unwrap_or(section.len());
            let slice = &section[*local_start..local_end];
            let content = self.patterns.bullet.replace(slice.trim(), "");
            if content.len() < self.config.min_paragrafo_chars {
                continue;
            }
            counter += 1;
            doc.add_span(AcordaoSpan {
                span_id: format!("{prefix}-{counter:03}"),
                span_type,
                text: content.trim().to_string(),
                identifier: numero.clone(),
                parent_id: None,
                start_pos: start + local_start,
                end_pos: start + local_end,
            });
        }
    }

    /// The ACÓRDÃO block span plus its `9.N` deliberation children.
    fn extract_acordao(&self, text: &str, block_start: usize, doc: &mut ParsedAcordao) {
        let section = &text[block_start..];
        let delib_markers: Vec<(usize, String, String)> = self
            .patterns
            .deliberacao
            .captures_iter(section)
            .map(|c| {
                (
                    c.get(0).expect("whole match").start(),
                    c[1].to_string(),
                    c[2].to_string(),
                )
            })
            .collect();

        let block_end = delib_markers
            .first()
            .map(|&(s, _, _)| block_start + s)
            .unwrap_or(text.len());
        let block_text: String = text[block_start..block_end].trim().chars().take(1000).collect();
        if block_text.is_empty() {
            return;
        }
        doc.add_span(AcordaoSpan {
            span_id: "ACORDAO".to_string(),
            span_type: AcordaoSpanType::Acordao,
            text: block_text,
            identifier: String::new(),
            parent_id: None,
            start_pos: block_start,
            end_pos: block_end,
        });

        let admin = self.patterns.admin_tail.find(section).map(|m| m.start());
        for (i, (local_start, major, minor)) in delib_markers.iter().enumerate() {
            let mut local_end = delib_markers
                .get(i + 1)
                .map(|&(s, _, _)| s)
                .unwrap_or(section.len());
            if let Some(a) = admin {
                if a > *local_start && a < local_end {
                    local_end = a;
                }
            }
            let slice = section[*local_start..local_end].trim();
            let content = self.patterns.bullet.replace(slice, "");
            if content.len() < self.config.min_paragrafo_chars {
                continue;
            }
            doc.add_span(AcordaoSpan {
                span_id: format!("ACORDAO-{major}-{minor}"),
                span_type: AcordaoSpanType::Deliberacao,
                text: content.trim().to_string(),
                identifier: format!("{major}.{minor}"),
                parent_id: Some("ACORDAO".to_string()),
                start_pos: block_start + local_start,
                end_pos: block_start + local_end,
            });
        }
    }
}
