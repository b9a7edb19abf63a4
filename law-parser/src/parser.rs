//! Deterministic span parser for Brazilian legal documents.
//!
//! Regex-first: the hierarchy (capítulo → artigo → parágrafo → inciso →
//! alínea) is recognized purely from lexical patterns, never inferred. Every
//! span carries absolute byte offsets into [`ParsedDocument::source_text`],
//! and an article's structural range runs up to the start of the next
//! article so that all of its descendants fall inside it.

use tracing::{debug, info};

use crate::errors::{Error, Result};
use crate::patterns::LawPatterns;
use crate::roman::is_valid_roman;
use crate::types::{DocumentMetadata, ParsedDocument, Span, SpanType};

/// Parser configuration. The defaults match the production ingestion path.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Emit the `HDR-001` span for the pre-structure header (ementa, organ).
    pub include_headers: bool,
    /// Collapse whitespace runs and cap blank lines before parsing. The
    /// normalized text becomes `source_text`, so offsets always refer to it.
    pub normalize_whitespace: bool,
    /// Let a chapter heading absorb a following title line.
    pub extract_titles: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            include_headers: true,
            normalize_whitespace: true,
            extract_titles: true,
        }
    }
}

struct ArticleInfo {
    span_index: usize,
    span_id: String,
    /// Child-id key: zero-padded number plus optional letter (`001`, `337-E`).
    art_key: String,
    start: usize,
    /// Structural end: start of the next article or end of text.
    end: usize,
    /// Extraction end: stops at the first chapter/section heading inside the
    /// structural range, so headings between articles never leak into spans.
    content_end: usize,
}

/// Deterministic span parser for the law genre (leis, decretos, INs).
pub struct SpanParser {
    config: ParserConfig,
    patterns: LawPatterns,
}

impl Default for SpanParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl SpanParser {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            patterns: LawPatterns::default(),
        }
    }

    /// Parse canonical markdown into a [`ParsedDocument`].
    ///
    /// Fails with [`Error::ContainmentViolation`] if any extracted child
    /// escapes its parent's structural range.
    pub fn parse(&self, markdown: &str) -> Result<ParsedDocument> {
        let text = if self.config.normalize_whitespace {
            self.normalize_whitespace(markdown)
        } else {
            markdown.to_string()
        };

        let mut doc = ParsedDocument::new(text.clone());

        if self.config.include_headers {
            self.extract_header(&text, &mut doc);
        }
        self.extract_capitulos(&text, &mut doc);

        let articles = self.extract_artigos(&text, &mut doc);
        for article in &articles {
            self.extract_article_children(article, &text, &mut doc);
        }

        self.enforce_containment(&doc)?;

        info!(
            target: "law_parser::parser",
            spans = doc.spans.len(),
            articles = articles.len(),
            chapters = doc.capitulos().len(),
            "parsed document"
        );
        Ok(doc)
    }

    /// Collapse whitespace runs (newlines preserved), cap blank lines at
    /// two, strip trailing whitespace per line, end with exactly one `\n`.
    /// Idempotent, and stable under canonical normalization.
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

    fn extract_header(&self, text: &str, doc: &mut ParsedDocument) {
        let mut end = text.len();
        if let Some(m) = self.patterns.capitulo.find(text) {
            end = end.min(m.start());
        }
        if let Some(m) = self.patterns.artigo.find(text) {
            end = end.min(m.start());
        }
        // Only a header with real content (ementa, organ, date).
        if end <= 100 {
            return;
        }
        let header_text = text[..end].trim();
        if header_text.is_empty() {
            return;
        }
        doc.add_span(Span {
            span_id: "HDR-001".to_string(),
            span_type: SpanType::Header,
            text: header_text.to_string(),
            identifier: None,
            parent_id: None,
            start_pos: 0,
            end_pos: end,
            caput_end_pos: None,
            order: 0,
        });
        doc.metadata = self.parse_header_metadata(header_text);
    }

    fn parse_header_metadata(&self, header: &str) -> DocumentMetadata {
        let mut meta = DocumentMetadata::default();
        if let Some(c) = self.patterns.doc_type.captures(header) {
            meta.document_type = Some(c[1].to_uppercase());
        }
        if let Some(c) = self.patterns.doc_number.captures(header) {
            meta.number = Some(c[1].to_string());
        }
        if let Some(m) = self.patterns.doc_date.find(header) {
            meta.date_raw = Some(m.as_str().to_string());
        }
        meta
    }

    fn extract_capitulos(&self, text: &str, doc: &mut ParsedDocument) {
        let matches: Vec<_> = self.patterns.capitulo.captures_iter(text).collect();
        for caps in matches {
            let m = caps.get(0).expect("whole match");
            let roman = caps[1].to_string();
            let mut span_text = m.as_str().trim().to_string();
            let mut end = m.end();

            if self.config.extract_titles {
                // A non-structural next line is the chapter title.
                if let Some(rel) = text[end..].find('\n') {
                    let line_start = end + rel + 1;
                    let line_end = text[line_start..]
                        .find('\n')
                        .map(|i| line_start + i)
                        .unwrap_or(text.len());
                    let next_line = text[line_start..line_end].trim();
                    if !next_line.is_empty() && !self.patterns.structural_line.is_match(next_line) {
                        span_text = format!("{span_text}\n{next_line}");
                        end = line_end;
                    }
                }
            }

            let span_id = unique_span_id(doc, &format!("CAP-{roman}"));
            doc.add_span(Span {
                span_id,
                span_type: SpanType::Capitulo,
                text: span_text,
                identifier: Some(roman),
                parent_id: None,
                start_pos: m.start(),
                end_pos: end,
                caput_end_pos: None,
                order: 0,
            });
        }
    }

    /// Emit all article spans. An article's structural range runs to the
    /// next article marker (or end of text), its extraction range stops at
    /// the first superior heading after the marker line.
    fn extract_artigos(&self, text: &str, doc: &mut ParsedDocument) -> Vec<ArticleInfo> {
        let matches: Vec<_> = self.patterns.artigo.captures_iter(text).collect();
        let mut infos = Vec::with_capacity(matches.len());

        for (i, caps) in matches.iter().enumerate() {
            let m = caps.get(0).expect("whole match");
            let number = &caps[1];
            let letter = caps.get(2).map(|l| l.as_str().to_uppercase());

            let start = m.start();
            let end = matches
                .get(i + 1)
                .map(|next| next.get(0).expect("whole match").start())
                .unwrap_or(text.len());

            // Never let a chapter heading inside the block leak into spans.
            let content_end = self
                .patterns
                .superior
                .find_at(text, m.end())
                .map(|s| s.start())
                .filter(|&s| s < end)
                .unwrap_or(end);

            let (span_id, identifier, art_key) = match &letter {
                Some(l) => (
                    format!("ART-{:0>3}-{l}", number),
                    format!("{number}-{l}"),
                    format!("{:0>3}-{l}", number),
                ),
                None => (
                    format!("ART-{:0>3}", number),
                    number.to_string(),
                    format!("{:0>3}", number),
                ),
            };
            let span_id = unique_span_id(doc, &span_id);

            let block = &text[start..content_end];
            let par_cut = self.paragraph_markers(block).first().map(|&(s, _)| s);
            let other_cut =
                self.first_child_marker(block, &[&self.patterns.inciso, &self.patterns.alinea]);
            let own_end = match (par_cut, other_cut) {
                (Some(a), Some(b)) => a.min(b),
                (a, b) => a.or(b).unwrap_or(block.len()),
            };
            let span_text = self.literal_text(&block[..own_end]);

            let parent_id = find_parent_capitulo(doc, start);

            doc.add_span(Span {
                span_id: span_id.clone(),
                span_type: SpanType::Artigo,
                text: span_text,
                identifier: Some(identifier),
                parent_id,
                start_pos: start,
                end_pos: end,
                caput_end_pos: None,
                order: 0,
            });

            infos.push(ArticleInfo {
                span_index: doc.spans.len() - 1,
                span_id,
                art_key,
                start,
                end,
                content_end,
            });
        }
        infos
    }

    /// Extract paragraphs, incisos and alíneas of one article, all with
    /// absolute offsets. Caput incisos come first, then paragraphs with
    /// their own incisos/alíneas.
    fn extract_article_children(&self, article: &ArticleInfo, text: &str, doc: &mut ParsedDocument) {
        let block = &text[article.start..article.content_end];
        if block.is_empty() {
            return;
        }

        let markers = self.paragraph_markers(block);
        let par_cut = markers.first().map(|&(s, _)| s);
        let caput = &block[..par_cut.unwrap_or(block.len())];

        // The caput ends where the first child (inciso or paragraph) begins.
        let first_inciso = self
            .patterns
            .inciso
            .captures_iter(caput)
            .filter(|c| is_valid_roman(&c[1]))
            .map(|c| c.get(0).expect("whole match").start())
            .next();
        if let Some(first_child) = [par_cut, first_inciso].iter().flatten().copied().min() {
            doc.spans[article.span_index].caput_end_pos = Some(article.start + first_child);
        }

        self.extract_incisos(caput, article.start, &article.art_key, &article.span_id, doc);
        if !markers.is_empty() {
            self.extract_paragrafos(block, &markers, article, doc);
        }
    }

    /// Paragraph marker offsets within `slice`, with the citation-context
    /// guard applied. Returns `(local_start, Some(number))`; the number is
    /// absent for `Parágrafo único`.
    fn paragraph_markers(&self, slice: &str) -> Vec<(usize, Option<String>)> {
        self.patterns
            .paragrafo
            .captures_iter(slice)
            .filter_map(|caps| {
                let m = caps.get(0).expect("whole match");
                if self.is_citation_context(slice, m.start()) {
                    debug!(
                        target: "law_parser::parser",
                        at = m.start(),
                        "skipping paragraph marker in citation context"
                    );
                    return None;
                }
                Some((m.start(), caps.get(1).map(|n| n.as_str().to_string())))
            })
            .collect()
    }

    /// A `§` occurrence is a citation, not a new paragraph, when it is not
    /// at a line start or when the preceding text ends with a reference
    /// token (`conforme`, `nos termos`, `do §`, …).
    pub(crate) fn is_citation_context(&self, text: &str, pos: usize) -> bool {
        let line_start = text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
        if !text[line_start..pos].trim().is_empty() {
            return true;
        }
        let mut window_start = pos.saturating_sub(60);
        while !text.is_char_boundary(window_start) {
            window_start += 1;
        }
        self.patterns
            .citation_guard
            .is_match(text[window_start..pos].trim_end_matches('\n'))
    }

    fn extract_paragrafos(
        &self,
        block: &str,
        markers: &[(usize, Option<String>)],
        article: &ArticleInfo,
        doc: &mut ParsedDocument,
    ) {
        for (i, (local_start, number)) in markers.iter().enumerate() {
            let local_end = markers.get(i + 1).map(|&(s, _)| s).unwrap_or(block.len());
            let par_slice = &block[*local_start..local_end];
            let abs_start = article.start + local_start;

            let (span_id, identifier) = match number {
                Some(n) => (format!("PAR-{}-{n}", article.art_key), n.clone()),
                None => (format!("PAR-{}-UNICO", article.art_key), "UNICO".to_string()),
            };
            let span_id = unique_span_id(doc, &span_id);

            let own_end = self
                .first_child_marker(par_slice, &[&self.patterns.inciso, &self.patterns.alinea])
                .unwrap_or(par_slice.len());
            let span_text = self.literal_text(&par_slice[..own_end]);

            doc.add_span(Span {
                span_id: span_id.clone(),
                span_type: SpanType::Paragrafo,
                text: span_text,
                identifier: Some(identifier),
                parent_id: Some(article.span_id.clone()),
                start_pos: abs_start,
                end_pos: abs_start + par_slice.len(),
                caput_end_pos: None,
                order: 0,
            });

            self.extract_incisos(par_slice, abs_start, &article.art_key, &span_id, doc);
        }
    }

    fn extract_incisos(
        &self,
        slice: &str,
        base: usize,
        art_key: &str,
        parent_id: &str,
        doc: &mut ParsedDocument,
    ) {
        let markers: Vec<(usize, String)> = self
            .patterns
            .inciso
            .captures_iter(slice)
            .filter(|caps| is_valid_roman(&caps[1]))
            .map(|caps| {
                let m = caps.get(0).expect("whole match");
                (m.start(), caps[1].to_string())
            })
            .collect();

        for (i, (local_start, roman)) in markers.iter().enumerate() {
            let local_end = markers.get(i + 1).map(|&(s, _)| s).unwrap_or(slice.len());
            let inc_slice = &slice[*local_start..local_end];
            let abs_start = base + local_start;

            let span_id = unique_span_id(doc, &format!("INC-{art_key}-{roman}"));

            let own_end = self
                .first_child_marker(inc_slice, &[&self.patterns.alinea])
                .unwrap_or(inc_slice.len());
            let span_text = self.literal_text(&inc_slice[..own_end]);

            doc.add_span(Span {
                span_id: span_id.clone(),
                span_type: SpanType::Inciso,
                text: span_text,
                identifier: Some(roman.clone()),
                parent_id: Some(parent_id.to_string()),
                start_pos: abs_start,
                end_pos: abs_start + inc_slice.len(),
                caput_end_pos: None,
                order: 0,
            });

            self.extract_alineas(inc_slice, abs_start, art_key, roman, &span_id, doc);
        }
    }

    fn extract_alineas(
        &self,
        slice: &str,
        base: usize,
        art_key: &str,
        inciso: &str,
        parent_id: &str,
        doc: &mut ParsedDocument,
    ) {
        let markers: Vec<(usize, String)> = self
            .patterns
            .alinea
            .captures_iter(slice)
            .map(|caps| {
                let m = caps.get(0).expect("whole match");
                (m.start(), caps[1].to_string())
            })
            .collect();

        for (i, (local_start, letter)) in markers.iter().enumerate() {
            let local_end = markers.get(i + 1).map(|&(s, _)| s).unwrap_or(slice.len());
            let ali_slice = &slice[*local_start..local_end];
            let abs_start = base + local_start;

            let span_id = unique_span_id(doc, &format!("ALI-{art_key}-{inciso}-{letter}"));

            doc.add_span(Span {
                span_id,
                span_type: SpanType::Alinea,
                text: self.literal_text(ali_slice),
                identifier: Some(letter.clone()),
                parent_id: Some(parent_id.to_string()),
                start_pos: abs_start,
                end_pos: abs_start + ali_slice.len(),
                caput_end_pos: None,
                order: 0,
            });
        }
    }

    /// Earliest child-marker offset in `slice`, if any.
    fn first_child_marker(&self, slice: &str, regexes: &[&regex::Regex]) -> Option<usize> {
        regexes
            .iter()
            .filter_map(|r| r.find(slice).map(|m| m.start()))
            .min()
    }

    /// Literal span text: the canonical slice with converter list artifacts
    /// stripped (leading bullet/number on the first line, numeric list
    /// prefixes on the rest), trimmed.
    fn literal_text(&self, slice: &str) -> String {
        let mut lines = Vec::new();
        for (i, line) in slice.lines().enumerate() {
            let cleaned = if i == 0 {
                self.patterns.leading_marker.replace(line, "")
            } else {
                self.patterns.list_prefix.replace(line, "")
            };
            lines.push(cleaned.trim_end().to_string());
        }
        lines.join("\n").trim().to_string()
    }

    /// Structural containment over the device hierarchy (article →
    /// paragraph → inciso → alínea). Chapter parentage is outline metadata
    /// and not subject to range containment.
    fn enforce_containment(&self, doc: &ParsedDocument) -> Result<()> {
        for span in &doc.spans {
            let Some(parent_id) = &span.parent_id else {
                continue;
            };
            let Some(parent) = doc.get_span(parent_id) else {
                continue;
            };
            if !matches!(
                parent.span_type,
                SpanType::Artigo | SpanType::Paragrafo | SpanType::Inciso | SpanType::Alinea
            ) {
                continue;
            }
            let contained = parent.start_pos <= span.start_pos
                && span.start_pos < span.end_pos
                && span.end_pos <= parent.end_pos;
            if !contained {
                return Err(Error::ContainmentViolation {
                    span_id: span.span_id.clone(),
                    parent_id: parent.span_id.clone(),
                    start: span.start_pos,
                    end: span.end_pos,
                    parent_start: parent.start_pos,
                    parent_end: parent.end_pos,
                });
            }
        }
        Ok(())
    }
}

/// First free id for `base`, appending `_2`, `_3`, … on collision. The
/// suffix is a disambiguator only; parentage lives in `parent_id`.
fn unique_span_id(doc: &ParsedDocument, base: &str) -> String {
    if doc.get_span(base).is_none() {
        return base.to_string();
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{base}_{n}");
        if doc.get_span(&candidate).is_none() {
            return candidate;
        }
        n += 1;
    }
}

/// Last chapter starting before `position`, if any.
fn find_parent_capitulo(doc: &ParsedDocument, position: usize) -> Option<String> {
    doc.capitulos()
        .iter()
        .filter(|cap| cap.start_pos < position)
        .next_back()
        .map(|cap| cap.span_id.clone())
}
