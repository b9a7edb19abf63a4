//! Material-origin classification.
//!
//! Host documents physically embed text of other laws: Lei 14.133/2021
//! carries the Código Penal articles 337-E to 337-P it inserted. Indexing
//! those as if they were the host's own articles makes retrieval attribute
//! them to the wrong norm. The classifier labels each chunk `self` or
//! `external` via an ordered rule table; the first matching rule wins.
//!
//! The policy is deliberately conservative: only text that *is* another
//! law marks a chunk external (the line-anchored `Art. 337-X` rule). Every
//! other foreign-law regex is a *mention* — "a Lei 8.666 fica revogada" is
//! the host talking about another law, not that law's text — and mentions
//! stay `self` with a low-confidence audit trail, so they are never
//! filtered out when a user asks about the host document.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::types::{ChunkPart, OriginConfidence, OriginType};

/// One detection rule. Lower `priority` applies first.
pub struct OriginRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub origin_reference: &'static str,
    pub origin_reference_name: &'static str,
    pub confidence: OriginConfidence,
    pub priority: u8,
}

/// Classification outcome for one chunk.
#[derive(Debug, Clone, Serialize)]
pub struct OriginLabel {
    pub origin_type: OriginType,
    pub origin_reference: Option<String>,
    pub origin_reference_name: Option<String>,
    pub is_external_material: bool,
    pub origin_confidence: OriginConfidence,
    pub origin_reason: Option<String>,
}

impl Default for OriginLabel {
    fn default() -> Self {
        Self {
            origin_type: OriginType::SelfMaterial,
            origin_reference: None,
            origin_reference_name: None,
            is_external_material: false,
            origin_confidence: OriginConfidence::High,
            origin_reason: None,
        }
    }
}

/// Aggregate stats over one classified batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OriginStats {
    pub total: usize,
    pub self_count: usize,
    pub external: usize,
    /// Chunks kept as `self` that mention another law.
    pub mentions: usize,
    pub external_refs: BTreeMap<String, usize>,
    pub mention_refs: BTreeMap<String, usize>,
    pub rules_triggered: BTreeMap<String, usize>,
}

/// Rule-based classifier of material origin.
pub struct OriginClassifier {
    rules: Vec<OriginRule>,
}

impl Default for OriginClassifier {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl OriginClassifier {
    pub fn new(mut rules: Vec<OriginRule>) -> Self {
        rules.sort_by_key(|r| r.priority);
        info!(target: "law_chunker::origin", rules = rules.len(), "origin classifier initialized");
        Self { rules }
    }

    /// Classify one text. No rule match means `self` material.
    pub fn classify(&self, text: &str) -> OriginLabel {
        if text.is_empty() {
            return OriginLabel::default();
        }
        for rule in &self.rules {
            if !rule.pattern.is_match(text) {
                continue;
            }
            return if rule.confidence == OriginConfidence::Low {
                // A mention only: auditable, but the text stays the host's.
                debug!(
                    target: "law_chunker::origin",
                    rule = rule.name,
                    "mention detected, chunk kept as self"
                );
                OriginLabel {
                    origin_type: OriginType::SelfMaterial,
                    origin_reference: Some(rule.origin_reference.to_string()),
                    origin_reference_name: Some(rule.origin_reference_name.to_string()),
                    is_external_material: false,
                    origin_confidence: OriginConfidence::Low,
                    origin_reason: Some(format!("mention:{}", rule.name)),
                }
            } else {
                debug!(
                    target: "law_chunker::origin",
                    rule = rule.name,
                    reference = rule.origin_reference,
                    "chunk classified as external material"
                );
                OriginLabel {
                    origin_type: OriginType::External,
                    origin_reference: Some(rule.origin_reference.to_string()),
                    origin_reference_name: Some(rule.origin_reference_name.to_string()),
                    is_external_material: true,
                    origin_confidence: rule.confidence,
                    origin_reason: Some(format!("rule:{}", rule.name)),
                }
            };
        }
        OriginLabel::default()
    }

    /// Classify a chunk in place.
    pub fn classify_chunk(&self, chunk: &mut ChunkPart) {
        let label = self.classify(&chunk.text);
        chunk.origin_type = label.origin_type;
        chunk.origin_reference = label.origin_reference;
        chunk.origin_reference_name = label.origin_reference_name;
        chunk.is_external_material = label.is_external_material;
        chunk.origin_confidence = label.origin_confidence;
        chunk.origin_reason = label.origin_reason;
    }

    /// Classify a batch in place, returning stats.
    pub fn classify_batch(&self, chunks: &mut [ChunkPart]) -> OriginStats {
        let mut stats = OriginStats {
            total: chunks.len(),
            ..OriginStats::default()
        };
        for chunk in chunks.iter_mut() {
            self.classify_chunk(chunk);
            match chunk.origin_type {
                OriginType::External => {
                    stats.external += 1;
                    if let Some(reference) = &chunk.origin_reference {
                        *stats.external_refs.entry(reference.clone()).or_default() += 1;
                    }
                }
                OriginType::SelfMaterial => {
                    stats.self_count += 1;
                    if chunk
                        .origin_reason
                        .as_deref()
                        .is_some_and(|r| r.starts_with("mention:"))
                    {
                        stats.mentions += 1;
                        if let Some(reference) = &chunk.origin_reference {
                            *stats.mention_refs.entry(reference.clone()).or_default() += 1;
                        }
                    }
                }
            }
            if let Some(reason) = &chunk.origin_reason {
                *stats.rules_triggered.entry(reason.clone()).or_default() += 1;
            }
        }
        info!(
            target: "law_chunker::origin",
            total = stats.total,
            self_count = stats.self_count,
            mentions = stats.mentions,
            external = stats.external,
            "origin classification finished"
        );
        stats
    }
}

/// The default rule table. Only `codigo_penal_art337` is high confidence:
/// a chunk whose text *starts* an `Art. 337-X` is the Criminal Code itself,
/// inserted by procurement law. Everything else is a mention.
fn default_rules() -> Vec<OriginRule> {
    let compile = |p: &str| Regex::new(p).expect("static pattern");
    let mention = |name: &'static str,
                   pattern: &str,
                   reference: &'static str,
                   reference_name: &'static str,
                   priority: u8| OriginRule {
        name,
        pattern: compile(pattern),
        origin_reference: reference,
        origin_reference_name: reference_name,
        confidence: OriginConfidence::Low,
        priority,
    };

    vec![
        OriginRule {
            name: "codigo_penal_art337",
            // Must *start* with Art. 337-X, not merely contain it.
            pattern: compile(r"(?im)^[\s\-\*]*Art\.?\s*337-[A-Z]"),
            origin_reference: "DL-2848-1940",
            origin_reference_name: "Codigo Penal",
            confidence: OriginConfidence::High,
            priority: 1,
        },
        mention(
            "codigo_penal_decreto_lei",
            r"(?i)Decreto-Lei\s+n?[°º]?\s*2\.?848",
            "DL-2848-1940",
            "Codigo Penal",
            2,
        ),
        mention(
            "codigo_penal_mention",
            r"(?i)\bC[oó]digo\s+Penal\b",
            "DL-2848-1940",
            "Codigo Penal",
            3,
        ),
        mention(
            "cpc_lei_13105",
            r"(?i)Lei\s+n?[°º]?\s*13\.?105",
            "LEI-13105-2015",
            "Codigo de Processo Civil",
            5,
        ),
        mention(
            "cpc_mention",
            r"(?i)\bC[oó]digo\s+de\s+Processo\s+Civil\b",
            "LEI-13105-2015",
            "Codigo de Processo Civil",
            6,
        ),
        mention(
            "lindb",
            r"(?i)Decreto-Lei\s+n?[°º]?\s*4\.?657|LINDB",
            "DL-4657-1942",
            "LINDB",
            7,
        ),
        mention(
            "lei_8987",
            r"(?i)Lei\s+n?[°º]?\s*8\.?987",
            "LEI-8987-1995",
            "Lei de Concessoes",
            20,
        ),
        mention(
            "lei_8666",
            r"(?i)Lei\s+n?[°º]?\s*8\.?666",
            "LEI-8666-1993",
            "Lei de Licitacoes (revogada)",
            20,
        ),
        mention(
            "lei_10520",
            r"(?i)Lei\s+n?[°º]?\s*10\.?520",
            "LEI-10520-2002",
            "Lei do Pregao (revogada)",
            20,
        ),
        mention(
            "lei_12462",
            r"(?i)Lei\s+n?[°º]?\s*12\.?462",
            "LEI-12462-2011",
            "Lei do RDC",
            20,
        ),
        mention(
            "lei_11079",
            r"(?i)Lei\s+n?[°º]?\s*11\.?079",
            "LEI-11079-2004",
            "Lei das PPPs",
            20,
        ),
        mention(
            "lei_12846",
            r"(?i)Lei\s+n?[°º]?\s*12\.?846",
            "LEI-12846-2013",
            "Lei Anticorrupcao",
            20,
        ),
        mention(
            "lei_13303",
            r"(?i)Lei\s+n?[°º]?\s*13\.?303",
            "LEI-13303-2016",
            "Lei das Estatais",
            20,
        ),
        mention(
            "lei_4320",
            r"(?i)Lei\s+n?[°º]?\s*4\.?320",
            "LEI-4320-1964",
            "Lei de Direito Financeiro",
            20,
        ),
        mention(
            "lei_8212",
            r"(?i)Lei\s+n?[°º]?\s*8\.?212",
            "LEI-8212-1991",
            "Lei da Seguridade Social",
            20,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> OriginClassifier {
        OriginClassifier::default()
    }

    #[test]
    fn criminal_code_insert_is_external_high() {
        let label = classifier().classify("Art. 337-E. Admitir, possibilitar ou dar causa…");
        assert_eq!(label.origin_type, OriginType::External);
        assert_eq!(label.origin_reference.as_deref(), Some("DL-2848-1940"));
        assert_eq!(label.origin_confidence, OriginConfidence::High);
        assert_eq!(label.origin_reason.as_deref(), Some("rule:codigo_penal_art337"));
        assert!(label.is_external_material);
    }

    #[test]
    fn revocation_mention_stays_self_low() {
        let label = classifier().classify("A Lei 8.666 fica revogada pela presente Lei.");
        assert_eq!(label.origin_type, OriginType::SelfMaterial);
        assert_eq!(label.origin_confidence, OriginConfidence::Low);
        assert_eq!(label.origin_reason.as_deref(), Some("mention:lei_8666"));
        assert_eq!(label.origin_reference.as_deref(), Some("LEI-8666-1993"));
        assert!(!label.is_external_material);
    }

    #[test]
    fn talking_about_the_criminal_code_is_a_mention() {
        // Host text ABOUT the Código Penal, not its inserted articles.
        let label =
            classifier().classify("Art. 178. O Código Penal passa a vigorar acrescido do Capítulo II-B.");
        assert_eq!(label.origin_type, OriginType::SelfMaterial);
        assert_eq!(label.origin_reason.as_deref(), Some("mention:codigo_penal_mention"));
    }

    #[test]
    fn bulleted_criminal_code_article_still_matches() {
        let label = classifier().classify("- Art. 337-F. Frustrar o caráter competitivo.");
        assert_eq!(label.origin_type, OriginType::External);
    }

    #[test]
    fn unmatched_text_defaults_to_self_high() {
        let label = classifier().classify("Art. 5º O estudo técnico preliminar.");
        assert_eq!(label.origin_type, OriginType::SelfMaterial);
        assert_eq!(label.origin_confidence, OriginConfidence::High);
        assert_eq!(label.origin_reason, None);
        assert_eq!(label.origin_reference, None);
    }

    #[test]
    fn priority_orders_rule_application() {
        // Contains both an Art. 337 insert and a Código Penal mention; the
        // priority-1 rule must win.
        let label = classifier()
            .classify("Art. 337-E. Admitir contratação direta (Código Penal, Decreto-Lei 2.848).");
        assert_eq!(label.origin_type, OriginType::External);
        assert_eq!(label.origin_reason.as_deref(), Some("rule:codigo_penal_art337"));
    }

    #[test]
    fn batch_stats_count_mentions_and_externals() {
        let mk = |text: &str| ChunkPart {
            node_id: format!("leis:DOC#X@P00-{}", text.len()),
            logical_node_id: "leis:DOC#X".to_string(),
            chunk_id: "DOC#X@P00".to_string(),
            parent_chunk_id: None,
            part_index: 0,
            part_total: 1,
            text: text.to_string(),
            char_start: 0,
            char_end: text.len(),
            canonical_start: -1,
            canonical_end: -1,
            canonical_hash: String::new(),
            device_type: crate::types::DeviceType::Article,
            article_number: None,
            document_type: "LEI".to_string(),
            document_id: "DOC".to_string(),
            span_id: "X".to_string(),
            origin_type: OriginType::SelfMaterial,
            origin_reference: None,
            origin_reference_name: None,
            is_external_material: false,
            origin_confidence: OriginConfidence::High,
            origin_reason: None,
            citations: Vec::new(),
            schema_version: "2.0.0".to_string(),
            ingest_run_id: String::new(),
            ingestion_timestamp: String::new(),
        };
        let mut chunks = vec![
            mk("Art. 1º Texto próprio."),
            mk("Art. 337-E. Admitir contratação direta."),
            mk("A Lei 8.666 fica revogada."),
        ];
        let stats = classifier().classify_batch(&mut chunks);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.self_count, 2);
        assert_eq!(stats.external, 1);
        assert_eq!(stats.mentions, 1);
        assert_eq!(stats.external_refs.get("DL-2848-1940"), Some(&1));
        assert_eq!(stats.mention_refs.get("LEI-8666-1993"), Some(&1));
        assert_eq!(stats.rules_triggered.get("rule:codigo_penal_art337"), Some(&1));
    }
}
