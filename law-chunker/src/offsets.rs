//! Deterministic child-offset resolution.
//!
//! When a chunk's absolute offsets over the canonical text are not known
//! up-front (spans supplied by an external extractor), they are resolved by
//! searching for the chunk's text inside the parent's structural range. The
//! contract is strict on purpose: exactly one occurrence or nothing. The
//! system refuses to index evidence whose position it cannot prove uniquely.

use crate::errors::FailureKind;

/// Resolve the absolute `(start, end)` byte offsets of `chunk_text` inside
/// `canonical_text[parent_start..parent_end]`.
///
/// Failure kinds:
/// - [`FailureKind::EmptyText`] — `chunk_text` is whitespace-only;
/// - [`FailureKind::NoCanonicalText`] — empty canonical text or an invalid
///   parent range;
/// - [`FailureKind::NotFound`] — zero occurrences in the parent range;
/// - [`FailureKind::Ambiguous`] — more than one occurrence (overlapping
///   ones count); no heuristic tie-break is permitted.
pub fn resolve_child_offsets(
    canonical_text: &str,
    parent_start: usize,
    parent_end: usize,
    chunk_text: &str,
) -> Result<(usize, usize), FailureKind> {
    let needle = chunk_text.trim();
    if needle.is_empty() {
        return Err(FailureKind::EmptyText);
    }
    if canonical_text.is_empty() {
        return Err(FailureKind::NoCanonicalText);
    }
    if parent_start >= parent_end
        || parent_end > canonical_text.len()
        || !canonical_text.is_char_boundary(parent_start)
        || !canonical_text.is_char_boundary(parent_end)
    {
        return Err(FailureKind::NoCanonicalText);
    }

    let window = &canonical_text[parent_start..parent_end];
    let occurrences = count_occurrences(window, needle, 2);

    match occurrences.len() {
        0 => Err(FailureKind::NotFound),
        1 => {
            let start = parent_start + occurrences[0];
            Ok((start, start + needle.len()))
        }
        _ => Err(FailureKind::Ambiguous),
    }
}

/// Occurrence start offsets of `needle` in `haystack`, overlapping matches
/// included, stopping after `limit` finds (two is enough to prove
/// ambiguity).
fn count_occurrences(haystack: &str, needle: &str, limit: usize) -> Vec<usize> {
    let mut found = Vec::new();
    let mut from = 0usize;
    while let Some(rel) = haystack[from..].find(needle) {
        let at = from + rel;
        found.push(at);
        if found.len() >= limit {
            break;
        }
        // Advance one character, not one byte, to stay on UTF-8 boundaries.
        let step = haystack[at..].chars().next().map(char::len_utf8).unwrap_or(1);
        from = at + step;
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_single_occurrence() {
        let canonical =
            "Art. 1º O texto do artigo completo.\n§ 1º O parágrafo primeiro.\n§ 2º O parágrafo segundo.";
        let (start, end) =
            resolve_child_offsets(canonical, 0, canonical.len(), "§ 1º O parágrafo primeiro.")
                .expect("unique occurrence");
        assert_eq!(&canonical[start..end], "§ 1º O parágrafo primeiro.");
        assert!(start > 0);
        assert!(end > start);
    }

    #[test]
    fn not_found_fails() {
        let canonical = "Art. 1º O texto do artigo completo.\n§ 1º O parágrafo primeiro.";
        let err = resolve_child_offsets(canonical, 0, canonical.len(), "Texto que não existe.")
            .unwrap_err();
        assert_eq!(err, FailureKind::NotFound);
        assert_eq!(err.as_str(), "NOT_FOUND");
    }

    #[test]
    fn multiple_matches_fail_ambiguous() {
        let canonical = "Art. 1º A contratação.\nI - A contratação.\nII - A contratação.";
        let err =
            resolve_child_offsets(canonical, 0, canonical.len(), "A contratação.").unwrap_err();
        assert_eq!(err, FailureKind::Ambiguous);
    }

    #[test]
    fn whitespace_only_text_fails_empty() {
        let canonical = "Art. 1º Texto qualquer.";
        let err = resolve_child_offsets(canonical, 0, canonical.len(), "   \n\t  ").unwrap_err();
        assert_eq!(err, FailureKind::EmptyText);
    }

    #[test]
    fn missing_canonical_text_fails() {
        assert_eq!(
            resolve_child_offsets("", 0, 0, "algo").unwrap_err(),
            FailureKind::NoCanonicalText
        );
        let canonical = "curto";
        assert_eq!(
            resolve_child_offsets(canonical, 3, 2, "algo").unwrap_err(),
            FailureKind::NoCanonicalText
        );
        assert_eq!(
            resolve_child_offsets(canonical, 0, 99, "algo").unwrap_err(),
            FailureKind::NoCanonicalText
        );
    }

    #[test]
    fn search_is_scoped_to_parent_range() {
        let canonical = "Art. 1º Texto único.\nArt. 2º Texto único.\nArt. 3º Mais texto.";
        let art2_start = canonical.find("Art. 2º").unwrap();
        let art2_end = canonical.find("Art. 3º").unwrap();

        let (start, end) =
            resolve_child_offsets(canonical, art2_start, art2_end, "Texto único.").expect("unique");
        assert!(start >= art2_start && end <= art2_end);
        assert_eq!(&canonical[start..end], "Texto único.");
    }

    #[test]
    fn text_outside_parent_range_is_not_found() {
        let canonical = "Art. 1º Texto do artigo um.\nArt. 2º Texto do artigo dois.";
        let art2_start = canonical.find("Art. 2º").unwrap();
        let err =
            resolve_child_offsets(canonical, art2_start, canonical.len(), "Texto do artigo um.")
                .unwrap_err();
        assert_eq!(err, FailureKind::NotFound);
    }

    #[test]
    fn returned_offsets_are_absolute() {
        let inner = "Art. 1º Texto.\n§ 1º Parágrafo.";
        let canonical = format!("AAAA{inner}BBBB");
        let (start, end) =
            resolve_child_offsets(&canonical, 4, 4 + inner.len(), "§ 1º Parágrafo.").expect("unique");
        assert_eq!(&canonical[start..end], "§ 1º Parágrafo.");
    }

    #[test]
    fn chunk_text_is_trimmed_before_search() {
        let canonical = "Art. 1º Texto.\n§ 1º Parágrafo com conteúdo.";
        let (start, end) = resolve_child_offsets(
            canonical,
            0,
            canonical.len(),
            "  \n  § 1º Parágrafo com conteúdo.  \t  ",
        )
        .expect("unique");
        assert_eq!(&canonical[start..end], "§ 1º Parágrafo com conteúdo.");
    }

    #[test]
    fn overlapping_occurrences_count_as_ambiguous() {
        let canonical = "aaaa";
        let err = resolve_child_offsets(canonical, 0, 4, "aa").unwrap_err();
        assert_eq!(err, FailureKind::Ambiguous);
    }
}
