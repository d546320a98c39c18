use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::Recommendation;
use crate::pipeline::helpers::{fold_accents, normalize_text, word_count};

use super::policy::RecommendationPolicy;

// ═══════════════════════════════════════════
// Clinical context (always keep)
// ═══════════════════════════════════════════

/// Indicators that tie a recommendation to this worker: quantities with
/// units, thresholds, explicit frequencies, causal phrases. Matched against
/// accent-folded lowercase text.
static CLINICAL_CONTEXT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\d+(?:[.,]\d+)?\s*(?:mg|db|kg|mmhg|cm|mm|ml|litros|°c|grados|fps|hz|khz)\b",
        r"(?:>|<|=|≥|≤|mayor\s+a|menor\s+a|superior\s+a|inferior\s+a)\s*\d+",
        r"\bimc\s*(?:>|<|=|≥|≤|mayor|menor)",
        r"nivel\s+de\s+\d+",
        r"por\s+(?:diagnostico\s+de|hallazgo\s+de|antecedente\s+de)\s+\w+",
        r"por\s+exposicion\s+a\s+\d+",
        r"por\s+riesgo\s+de\s+\w+",
        r"debido\s+a\s+(?:diagnostico|hallazgo|exposicion)",
        r"relacionado\s+con\s+(?:diagnostico|hallazgo|patologia)",
        r"\bcada\s+\d+\s*(?:meses|mes|semanas|semana|dias|dia|horas|hora|anos|ano)\b",
        r"\d+\s*(?:veces|sesiones)\s+(?:por|al|a\s+la)\s+(?:semana|mes|dia|ano)",
        r"\bevery\s+\d+\s+(?:months?|weeks?|days?|hours?|years?)\b",
        r"\bsi\s+\w+\s*(?:>|<|=)\s*\d+",
        r"en\s+caso\s+de\s+\w+\s*(?:>|<|=)\s*\d+",
    ]
    .into_iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// ICD-10 code with subcategory, matched on the original casing.
static RE_ICD10_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]\d{2}\.\d\b").unwrap());

pub fn has_clinical_context(description: &str) -> bool {
    if RE_ICD10_MENTION.is_match(&fold_accents(description)) {
        return true;
    }
    let folded = fold_accents(description).to_lowercase();
    CLINICAL_CONTEXT.iter().any(|re| re.is_match(&folded))
}

// ═══════════════════════════════════════════
// Boilerplate catalog
// ═══════════════════════════════════════════

/// A boilerplate pattern, optionally cancelled by a qualifier appearing
/// anywhere after the match (a duration, a cause, a parameter).
struct GenericRule {
    pattern: Regex,
    unless_after: Option<Regex>,
}

impl GenericRule {
    fn matches(&self, text: &str) -> bool {
        self.pattern.find_iter(text).any(|m| match &self.unless_after {
            Some(qualifier) => !qualifier.is_match(&text[m.end()..]),
            None => true,
        })
    }
}

fn rule(pattern: &str, unless_after: Option<&str>) -> GenericRule {
    GenericRule {
        pattern: Regex::new(pattern).unwrap(),
        unless_after: unless_after.map(|q| Regex::new(q).unwrap()),
    }
}

const CAUSE: &str = r"\bpor\b|\bdebido\b|\bexposicion\b";

static GENERIC_RULES: LazyLock<Vec<GenericRule>> = LazyLock::new(|| {
    vec![
        // PPE without specifics
        rule(r"\buso\s+(?:adecuado\s+)?de\s+epp\b", None),
        rule(r"\bepp\s+(?:auditivo|visual|respiratorio)", Some(CAUSE)),
        rule(r"uso\s+(?:adecuado|correcto|permanente|obligatorio)\s+de\s+(?:epp|elementos)", None),
        rule(r"uso\s+de\s+proteccion\s+personal", None),
        rule(r"elementos\s+de\s+proteccion\s+personal", None),
        // education
        rule(r"\beducacion\s+en\b", None),
        rule(r"\bcapacitacion\s+en\b", None),
        rule(r"\bcapacitacion\s+(?:grupal|individual|periodica)", None),
        // habits
        rule(r"\bhabitos\s+(?:saludables|y\s+estilos)", None),
        rule(r"continuar\s+(?:o\s+)?(?:adoptar\s+)?habitos", None),
        rule(r"estilo\s+de\s+vida\s+saludable", None),
        rule(r"(?:mantener|adoptar|promover)\s+habitos", None),
        // administrative formulas
        rule(r"adherir\s+(?:a\s+)?(?:lineamientos|guias?|protocolos?)", None),
        rule(r"seguir\s+(?:lineamientos|guias?|protocolos?)", None),
        rule(r"control\s+segun\s+(?:pve|programa)", None),
        rule(r"lineamientos\s+(?:del\s+ministerio|nacionales|internacionales)", None),
        rule(r"cumplir\s+con\s+lineamientos", None),
        // measures without a parameter
        rule(r"\breposo\s+auditivo\b", Some(r"\d+\s*(?:min|hora|hr)")),
        rule(r"\bejercicio\s+fisico\b", Some(r"\d+\s*(?:min|veces|sesiones)")),
        rule(r"\bfotoproteccion\b", Some(r"fps|factor|exposicion")),
        rule(r"\buso\s+de\s+filtro\s+solar\b", Some(r"fps|exposicion")),
        rule(r"\buso\s+de\s+bloqueador\b", Some(r"fps")),
        rule(r"150\s+minutos.*ejercicio", None),
        rule(r"actividad\s+fisica\s+regular", Some(r"\d")),
        rule(r"realizar\s+ejercicio", Some(r"\d")),
        // breaks
        rule(r"pausas\s+(?:activas|laborales)", Some(r"cada|\d")),
        rule(r"realizar\s+pausas", Some(r"cada|\d")),
        // posture
        rule(r"buena\s+postura", Some(CAUSE)),
        rule(r"higiene\s+postural", Some(CAUSE)),
        rule(r"ergonomia\s+(?:del\s+)?(?:puesto\s+de\s+trabajo|laboral)", Some(CAUSE)),
        rule(r"correccion\s+postural", Some(CAUSE)),
        // hydration
        rule(r"\bhidratacion\b", Some(r"\d+\s*(?:litros|ml)")),
        rule(r"consumo\s+de\s+agua", Some(r"\d")),
        // marketing / administrative
        rule(r"https?://|www\.|@[a-z0-9-]+\.[a-z]", None),
        rule(r"\b(?:afiliacion|afiliarse|actualizar\s+datos)\b", None),
        rule(r"\bprograma\s+de\s+(?:beneficios|bienestar)\b", None),
        // English boilerplate
        rule(r"\b(?:use|wear)\s+(?:of\s+)?(?:ppe|personal\s+protective\s+equipment)\b", Some(CAUSE)),
        rule(r"\bhealthy\s+(?:habits|lifestyle)\b", None),
        rule(r"\bfollow\s+(?:company|ministry|general)\s+(?:guidelines|protocols)\b", None),
    ]
});

// ═══════════════════════════════════════════
// Classification
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepReason {
    ClinicalContext,
    Specific,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Empty,
    BareExamName,
    GenericKeyword,
    GenericPattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep(KeepReason),
    Drop(DropReason),
}

fn is_bare_exam_name(folded: &str, policy: &RecommendationPolicy) -> bool {
    if word_count(folded) > 3 {
        return false;
    }
    let padded = format!(
        " {} ",
        folded
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    );
    policy
        .exam_name_terms
        .iter()
        .any(|term| padded.contains(&format!(" {term} ")))
}

/// Decide whether one recommendation text survives.
///
/// Clinical context wins over every drop rule. Anything not positively
/// identified as noise is kept.
pub fn classify(description: &str, policy: &RecommendationPolicy) -> Verdict {
    if description.trim().is_empty() {
        return Verdict::Drop(DropReason::Empty);
    }
    if has_clinical_context(description) {
        return Verdict::Keep(KeepReason::ClinicalContext);
    }
    let folded = normalize_text(description);
    if is_bare_exam_name(&folded, policy) {
        return Verdict::Drop(DropReason::BareExamName);
    }
    if policy.generic_keywords.iter().any(|k| folded.contains(k.as_str())) {
        return Verdict::Drop(DropReason::GenericKeyword);
    }
    if GENERIC_RULES.iter().any(|r| r.matches(&folded)) {
        return Verdict::Drop(DropReason::GenericPattern);
    }
    Verdict::Keep(KeepReason::Specific)
}

// ═══════════════════════════════════════════
// Dedup
// ═══════════════════════════════════════════

const DEDUP_PREFIXES: &[&str] = &[
    "seguimiento:",
    "seguimiento por",
    "remision a eps para",
    "remitir a eps para",
    "control:",
    "recomendacion:",
];

/// Comparison key: folded, lowercased, common lead-in phrases removed.
pub fn dedup_key(description: &str) -> String {
    let mut key = normalize_text(description);
    loop {
        let Some(prefix) = DEDUP_PREFIXES.iter().find(|p| key.starts_with(**p)) else {
            break;
        };
        key = key[prefix.len()..].trim().to_string();
    }
    key.trim_end_matches(|c: char| c.is_ascii_punctuation())
        .trim()
        .to_string()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationFilterOutcome {
    pub kept: Vec<Recommendation>,
    pub dropped: usize,
    pub duplicates_removed: usize,
}

/// Filter then collapse duplicates, keeping the first occurrence's metadata.
pub fn filter_and_dedup(
    recommendations: Vec<Recommendation>,
    policy: &RecommendationPolicy,
) -> RecommendationFilterOutcome {
    let total = recommendations.len();
    let mut outcome = RecommendationFilterOutcome::default();
    let mut seen = HashSet::new();

    for rec in recommendations {
        match classify(&rec.description, policy) {
            Verdict::Drop(reason) => {
                tracing::debug!(?reason, text = %rec.description, "Recommendation filtered");
                outcome.dropped += 1;
            }
            Verdict::Keep(_) => {
                if seen.insert(dedup_key(&rec.description)) {
                    outcome.kept.push(rec);
                } else {
                    outcome.duplicates_removed += 1;
                }
            }
        }
    }

    tracing::debug!(
        total,
        kept = outcome.kept.len(),
        dropped = outcome.dropped,
        duplicates = outcome.duplicates_removed,
        "Recommendation filter"
    );
    outcome
}

pub fn filter_recommendations(
    recommendations: Vec<Recommendation>,
    policy: &RecommendationPolicy,
) -> Vec<Recommendation> {
    filter_and_dedup(recommendations, policy).kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;

    fn policy() -> RecommendationPolicy {
        RecommendationPolicy::default()
    }

    fn recs(texts: &[&str]) -> Vec<Recommendation> {
        texts.iter().map(|t| Recommendation::new(*t)).collect()
    }

    fn descriptions(list: &[Recommendation]) -> Vec<&str> {
        list.iter().map(|r| r.description.as_str()).collect()
    }

    // ── Retention ──

    #[test]
    fn keeps_only_specific_recommendation() {
        let kept = filter_recommendations(
            recs(&[
                "Uso adecuado de EPP",
                "Espirometría cada 6 meses por exposición a ruido 85 dB",
            ]),
            &policy(),
        );
        assert_eq!(
            descriptions(&kept),
            vec!["Espirometría cada 6 meses por exposición a ruido 85 dB"]
        );
    }

    #[test]
    fn bare_exam_names_dropped() {
        for text in ["Espirometría", "Laboratorios", "Audiometría de control", "Rx de tórax"] {
            assert_eq!(
                classify(text, &policy()),
                Verdict::Drop(DropReason::BareExamName),
                "{text}"
            );
        }
    }

    #[test]
    fn longer_exam_instruction_kept() {
        assert_eq!(
            classify("Realizar audiometría confirmatoria con reposo auditivo previo de 12 horas", &policy()),
            Verdict::Keep(KeepReason::Specific)
        );
    }

    #[test]
    fn generic_keywords_dropped() {
        for text in [
            "Capacitación en manejo de cargas",
            "Mantener hábitos saludables",
            "Realizar pausas activas durante la jornada",
            "Adherir lineamientos del ministerio de salud",
        ] {
            assert!(
                matches!(classify(text, &policy()), Verdict::Drop(_)),
                "{text}"
            );
        }
    }

    #[test]
    fn qualifier_cancels_generic_pattern() {
        assert_eq!(
            classify("Higiene postural en oficina", &policy()),
            Verdict::Drop(DropReason::GenericPattern)
        );
        assert_eq!(
            classify("Higiene postural por lumbalgia mecánica crónica", &policy()),
            Verdict::Keep(KeepReason::Specific)
        );
        assert_eq!(
            classify("Fotoprotección diaria", &policy()),
            Verdict::Drop(DropReason::GenericPattern)
        );
        assert_eq!(
            classify("Fotoprotección con FPS 50 por exposición solar", &policy()),
            Verdict::Keep(KeepReason::Specific)
        );
    }

    #[test]
    fn clinical_context_overrides_drop_rules() {
        assert!(has_clinical_context("Pausas activas cada 2 horas"));
        assert!(has_clinical_context("Control de IMC > 30 con nutrición"));
        assert!(has_clinical_context("Valoración por ortopedia por diagnóstico de M54.5"));
        assert!(has_clinical_context("Control por riesgo de hipoacusia"));
        assert!(!has_clinical_context("Control anual"));
        assert_eq!(
            classify("Uso de EPP auditivo por exposición a 90 dB", &policy()),
            Verdict::Keep(KeepReason::ClinicalContext)
        );
    }

    #[test]
    fn ambiguous_text_defaults_to_keep() {
        assert_eq!(
            classify("Valoración por dermatología para lesión en antebrazo", &policy()),
            Verdict::Keep(KeepReason::Specific)
        );
    }

    #[test]
    fn marketing_and_english_boilerplate_dropped() {
        assert!(matches!(
            classify("Visite www.ejemplo.com para conocer beneficios", &policy()),
            Verdict::Drop(_)
        ));
        assert!(matches!(
            classify("Maintain healthy habits at work", &policy()),
            Verdict::Drop(_)
        ));
    }

    #[test]
    fn empty_description_dropped() {
        assert_eq!(classify("   ", &policy()), Verdict::Drop(DropReason::Empty));
    }

    #[test]
    fn custom_policy_catalog() {
        let custom = RecommendationPolicy {
            exam_name_terms: vec![],
            generic_keywords: vec!["senalizacion".into()],
        };
        assert_eq!(classify("Espirometría", &custom), Verdict::Keep(KeepReason::Specific));
        assert!(matches!(
            classify("Respetar señalización de áreas", &custom),
            Verdict::Drop(DropReason::GenericKeyword)
        ));
    }

    // ── Dedup ──

    #[test]
    fn dedup_key_strips_lead_in_phrases() {
        assert_eq!(
            dedup_key("Seguimiento: valoración por otorrinolaringología."),
            "valoracion por otorrinolaringologia"
        );
        assert_eq!(
            dedup_key("Remisión a EPS para valoración por otorrinolaringología"),
            "valoracion por otorrinolaringologia"
        );
    }

    #[test]
    fn duplicates_collapse_keeping_first_metadata() {
        let mut first = Recommendation::new("Seguimiento: valoración por otorrinolaringología");
        first.specialty = Some("ORL".into());
        first.priority = Some(Priority::High);
        let second = Recommendation::new("Remisión a EPS para valoración por otorrinolaringología");

        let outcome = filter_and_dedup(vec![first, second], &policy());
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.duplicates_removed, 1);
        assert_eq!(outcome.kept[0].specialty.as_deref(), Some("ORL"));
        assert_eq!(outcome.kept[0].priority, Some(Priority::High));
    }

    #[test]
    fn outcome_counts() {
        let outcome = filter_and_dedup(
            recs(&[
                "Uso de EPP",
                "Audiometría",
                "Control audiométrico cada 6 meses",
                "Control audiométrico cada 6 meses.",
            ]),
            &policy(),
        );
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.dropped, 2);
        assert_eq!(outcome.duplicates_removed, 1);
    }
}
