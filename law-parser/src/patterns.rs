//! Compiled regex tables for the law genre.
//!
//! The `regex` engine has no lookaround, so every structural pattern here is
//! a line-anchored *marker* matcher; a unit's range runs from its marker to
//! the next marker of the same or higher level. Markers tolerate the list
//! artifacts the markdown converter leaves behind: a numeric list prefix
//! (`12. `) and a leading bullet (`-` / `*`).
//!
//! All patterns are compiled once into a [`LawPatterns`] value owned by the
//! parser; the table is read-only afterwards and safe to share.

use regex::Regex;

pub(crate) struct LawPatterns {
    /// `CAPÍTULO I`, `CAPITULO II`, `CAP. III` at line start.
    pub capitulo: Regex,
    /// Chapter/section/subsection heading, used as an extraction boundary.
    pub superior: Regex,
    /// Article marker: `Art. 1º`, `- Art. 10`, `11. Art. 56`, `Art. 337-E.`
    /// Group 1 = number, group 2 = optional uppercase letter suffix (the
    /// letter must be followed by a dot, as in `337-E.`).
    pub artigo: Regex,
    /// Paragraph marker: `§ 1º`, `§2o`, `Parágrafo único`.
    /// Group 1 = number, absent for `Parágrafo único`.
    pub paragrafo: Regex,
    /// Inciso marker: `I -`, `II –`, `III —`. Roman candidates are validated
    /// separately; case-sensitive on purpose.
    pub inciso: Regex,
    /// Alínea marker: `a)`, `b)`. Lowercase on purpose.
    pub alinea: Regex,
    /// A line that opens any structural unit; used to decide whether the
    /// line after a chapter heading is a title.
    pub structural_line: Regex,
    /// Numeric list prefix stripped from content lines.
    pub list_prefix: Regex,
    /// List prefix and/or bullet at the very start of a span's text.
    pub leading_marker: Regex,
    /// Reference tokens that mark a `§` occurrence as a citation, not a new
    /// paragraph (`"conforme § 1º"`, `"do § 2º"`).
    pub citation_guard: Regex,
    /// Runs of non-newline whitespace.
    pub ws_run: Regex,
    /// Three or more consecutive newlines.
    pub blank_run: Regex,
    // Header metadata.
    pub doc_type: Regex,
    pub doc_number: Regex,
    pub doc_date: Regex,
}

impl Default for LawPatterns {
    fn default() -> Self {
        let compile = |p: &str| Regex::new(p).expect("static pattern");
        Self {
            capitulo: compile(r"(?mi)^(?:CAP[ÍI]TULO|CAP\.?)[ \t]+([IVXLC]+)\b[^\n]*"),
            superior: compile(r"(?mi)^(?:CAP[ÍI]TULO|CAP\.|SE[ÇC][ÃA]O|SUBSE[ÇC][ÃA]O)[ \t]+[IVXLC]+\b"),
            artigo: compile(
                r"(?mi)^(?:\d+\.[ \t]*)?[-*]?[ \t]*Art\.?[ \t]*(\d+)[°ºo]?(?:[ \t]*-?[ \t]*((?-i:[A-Z]))\.)?",
            ),
            paragrafo: compile(
                r"(?mi)^(?:\d+\.[ \t]*)?[-*]?[ \t]*(?:§[ \t]*(\d+)[°ºo]?|par[áa]grafo[ \t]+[úu]nico)",
            ),
            inciso: compile(r"(?m)^(?:\d+\.[ \t]*)?[-*]?[ \t]*([IVXLC]+)[ \t]*[-–—]"),
            alinea: compile(r"(?m)^(?:\d+\.[ \t]*)?[-*]?[ \t]*([a-z])\)"),
            structural_line: compile(
                r"(?i)^[-*]?[ \t]*(?:Art\.|§|(?-i:[IVXLC]+)[ \t]*[-–—]|(?-i:[a-z])\))",
            ),
            list_prefix: compile(r"^\d+\.[ \t]*"),
            leading_marker: compile(r"^(?:\d+\.[ \t]*)?[-*][ \t]*|^\d+\.[ \t]*"),
            citation_guard: compile(
                r"(?i)(?:conforme|nos[ \t]termos(?:[ \t]do)?|de[ \t]acordo[ \t]com|previsto[ \t]no|disposto[ \t]no|do[ \t]§|deste[ \t]artigo)[ \t]*$",
            ),
            ws_run: compile(r"[^\S\n]+"),
            blank_run: compile(r"\n{3,}"),
            doc_type: compile(r"(?i)\b(LEI|DECRETO|INSTRU[ÇC][ÃA]O NORMATIVA|PORTARIA|RESOLU[ÇC][ÃA]O)\b"),
            doc_number: compile(r"(?i)N[°ºo]?\.?[ \t]*(\d+[\d.]*)"),
            doc_date: compile(r"(?i)(\d{1,2})[ \t]+(?:DE[ \t]+)?(\w+)[ \t]+(?:DE[ \t]+)?(\d{4})"),
        }
    }
}
