//! The Pattern Library: lexical detection rules for rhetorical weaknesses.
//!
//! Every rule is a pure function of the input text. Matching is
//! case-insensitive and whole-word (see [`crate::text::term_regex`]), so a
//! marker never fires inside a longer word.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Finding, FindingType, Severity};
use crate::text::{context_around, split_sentences, term_regex, word_count};

// ---------------------------------------------------------------------------
// Lexicons
// ---------------------------------------------------------------------------

pub const ABSOLUTE_TERMS: &[&str] = &[
    "todos",
    "todas",
    "todo",
    "toda",
    "siempre",
    "nunca",
    "jamás",
    "nadie",
    "ninguno",
    "ninguna",
    "cada",
    "cualquier",
    "cualquiera",
    "totalmente",
    "completamente",
    "absolutamente",
];

pub const EMOTIONAL_TERMS: &[&str] = &[
    "odio",
    "odiar",
    "odioso",
    "amo",
    "amar",
    "terrible",
    "terribles",
    "perfecto",
    "perfecta",
    "horrible",
    "horribles",
    "maravilloso",
    "maravillosa",
    "espantoso",
    "espantosa",
    "desastroso",
    "desastrosa",
    "asqueroso",
    "fantástico",
    "increíble",
];

pub const EVIDENCE_TERMS: &[&str] = &[
    "según",
    "de acuerdo con",
    "estudio",
    "estudios",
    "dato",
    "datos",
    "estadística",
    "estadísticas",
    "fuente",
    "fuentes",
    "experto",
    "expertos",
    "encuesta",
    "encuestas",
    "análisis",
    "investigación",
    "investigaciones",
    "evidencia",
];

pub const CERTAINTY_TERMS: &[&str] = &[
    "obviamente",
    "claramente",
    "indudablemente",
    "sin duda",
    "sin lugar a dudas",
    "evidentemente",
    "es indiscutible",
    "es innegable",
];

pub const ATTACK_TERMS: &[&str] = &[
    "idiota",
    "idiotas",
    "estúpido",
    "estúpida",
    "estúpidos",
    "incompetente",
    "incompetentes",
    "corrupto",
    "corrupta",
    "corruptos",
    "mentiroso",
    "mentirosa",
    "mentirosos",
    "ignorante",
    "ignorantes",
    "imbécil",
];

pub const RESTRICTIVE_TERMS: &[&str] = &[
    "solo",
    "sólo",
    "solamente",
    "únicamente",
    "exclusivamente",
];

pub const DICHOTOMY_PHRASES: &[&str] = &[
    "o bien",
    "blanco o negro",
    "o estás conmigo o",
    "o estás con nosotros o",
    "no hay término medio",
    "solo hay dos opciones",
    "solo hay dos caminos",
];

pub const TRADITION_PHRASES: &[&str] = &[
    "siempre se ha hecho así",
    "siempre ha sido así",
    "siempre se ha hecho de esta manera",
    "todo el mundo sabe",
    "como dice la tradición",
    "desde siempre",
    "así lo hacían nuestros",
];

pub const CAUSAL_CHAIN_TERMS: &[&str] = &[
    "llevará a",
    "conducirá a",
    "provocará",
    "terminará en",
    "acabará en",
    "inevitablemente",
];

// ---------------------------------------------------------------------------
// Compiled patterns
// ---------------------------------------------------------------------------

static ABSOLUTE_RE: Lazy<Regex> = Lazy::new(|| term_regex(ABSOLUTE_TERMS));
static EMOTIONAL_RE: Lazy<Regex> = Lazy::new(|| term_regex(EMOTIONAL_TERMS));
static EVIDENCE_RE: Lazy<Regex> = Lazy::new(|| term_regex(EVIDENCE_TERMS));
static CERTAINTY_RE: Lazy<Regex> = Lazy::new(|| term_regex(CERTAINTY_TERMS));
static ATTACK_RE: Lazy<Regex> = Lazy::new(|| term_regex(ATTACK_TERMS));
static RESTRICTIVE_RE: Lazy<Regex> = Lazy::new(|| term_regex(RESTRICTIVE_TERMS));
static DICHOTOMY_RE: Lazy<Regex> = Lazy::new(|| term_regex(DICHOTOMY_PHRASES));
static TRADITION_RE: Lazy<Regex> = Lazy::new(|| term_regex(TRADITION_PHRASES));
static CAUSAL_CHAIN_RE: Lazy<Regex> = Lazy::new(|| term_regex(CAUSAL_CHAIN_TERMS));

/// "si ... entonces" within one sentence.
static IF_THEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bsi\b[^.!?]{1,120}?\bentonces\b").expect("valid if-then regex")
});

const CONTEXT_RADIUS: usize = 30;
const MAX_SNIPPETS: usize = 3;
const MISSING_EVIDENCE_MIN_WORDS: usize = 60;
const EMPHASIS_MIN_EXCLAMATIONS: usize = 4;
const EMPHASIS_MAX_SENTENCES: usize = 10;

/// Returns `true` if the text contains any evidentiary marker.
pub fn has_evidence(text: &str) -> bool {
    EVIDENCE_RE.is_match(text)
}

// ---------------------------------------------------------------------------
// Rule trait
// ---------------------------------------------------------------------------

/// A single detection rule.
pub trait PatternRule: Send + Sync {
    /// Stable rule identifier.
    fn name(&self) -> &'static str;

    /// Run the rule over the full text.
    fn detect(&self, text: &str) -> Vec<Finding>;
}

/// How a marker rule derives its confidence from the hit count.
#[derive(Debug, Clone, Copy)]
pub enum Confidence {
    Fixed(f64),
    /// `min(base + step * count, cap)`
    Scaled { base: f64, step: f64, cap: f64 },
}

impl Confidence {
    fn for_count(&self, count: usize) -> f64 {
        match *self {
            Confidence::Fixed(c) => c,
            Confidence::Scaled { base, step, cap } => (base + step * count as f64).min(cap),
        }
    }
}

/// Rule that counts lexical markers and fires once past a threshold.
pub struct MarkerRule {
    name: &'static str,
    finding_type: FindingType,
    severity: Severity,
    confidence: Confidence,
    matchers: Vec<&'static Lazy<Regex>>,
    /// Minimum number of hits required.
    min_count: usize,
    /// Only fire when the text has no evidentiary markers.
    requires_no_evidence: bool,
    /// Report the distinct matched terms on the finding.
    collect_terms: bool,
    description: &'static str,
    suggestion: &'static str,
}

impl MarkerRule {
    fn matches<'t>(&self, text: &'t str) -> Vec<regex::Match<'t>> {
        let mut hits: Vec<regex::Match<'t>> = self
            .matchers
            .iter()
            .flat_map(|re| re.find_iter(text))
            .collect();
        hits.sort_by_key(|m| m.start());
        hits
    }
}

impl PatternRule for MarkerRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn detect(&self, text: &str) -> Vec<Finding> {
        let hits = self.matches(text);
        let count = hits.len();
        if count == 0 || count < self.min_count {
            return Vec::new();
        }
        if self.requires_no_evidence && has_evidence(text) {
            return Vec::new();
        }

        let snippets: Vec<String> = hits
            .iter()
            .take(MAX_SNIPPETS)
            .map(|m| context_around(text, m.start(), m.end(), CONTEXT_RADIUS))
            .collect();

        let mut finding = Finding::new(
            self.finding_type,
            self.severity,
            self.confidence.for_count(count),
            format!("{} ({count} aparición(es))", self.description),
        )
        .at(snippets.join(" | "))
        .suggest(self.suggestion);

        if self.collect_terms {
            let mut terms: Vec<String> = Vec::new();
            for m in &hits {
                let term = m.as_str().to_lowercase();
                if !terms.contains(&term) {
                    terms.push(term);
                }
            }
            finding = finding.with_terms(terms);
        }

        tracing::debug!(rule = self.name, count, "pattern rule fired");
        vec![finding]
    }
}

/// Long text with no evidentiary marker at all.
pub struct MissingEvidenceRule;

impl PatternRule for MissingEvidenceRule {
    fn name(&self) -> &'static str {
        "missing_evidence"
    }

    fn detect(&self, text: &str) -> Vec<Finding> {
        let words = word_count(text);
        if words <= MISSING_EVIDENCE_MIN_WORDS || has_evidence(text) {
            return Vec::new();
        }
        vec![Finding::new(
            FindingType::MissingEvidence,
            Severity::High,
            0.70,
            "Se afirman ideas sin citar datos, estudios ni fuentes (posible sesgo de confirmación)",
        )
        .at(format!("texto completo ({words} palabras)"))
        .suggest("Respalda las afirmaciones principales con datos, estudios o fuentes verificables.")]
    }
}

/// Many exclamation marks packed into few sentences.
pub struct ExcessiveEmphasisRule;

impl PatternRule for ExcessiveEmphasisRule {
    fn name(&self) -> &'static str {
        "excessive_emphasis"
    }

    fn detect(&self, text: &str) -> Vec<Finding> {
        let exclamations = text.matches('!').count();
        let sentences = split_sentences(text).len();
        if exclamations < EMPHASIS_MIN_EXCLAMATIONS || sentences >= EMPHASIS_MAX_SENTENCES {
            return Vec::new();
        }
        vec![Finding::new(
            FindingType::ExcessiveEmphasis,
            Severity::Low,
            0.58,
            format!("Énfasis excesivo: {exclamations} signos de exclamación en {sentences} oraciones"),
        )
        .at(format!("{exclamations} signos '!'"))
        .suggest("Reduce los signos de exclamación y deja que los argumentos hablen por sí mismos.")]
    }
}

fn standard_rules() -> Vec<Box<dyn PatternRule>> {
    vec![
        Box::new(MarkerRule {
            name: "generalization",
            finding_type: FindingType::Generalization,
            severity: Severity::High,
            confidence: Confidence::Scaled {
                base: 0.65,
                step: 0.08,
                cap: 0.95,
            },
            matchers: vec![&ABSOLUTE_RE],
            min_count: 1,
            requires_no_evidence: false,
            collect_terms: true,
            description: "Generalización con cuantificadores absolutos",
            suggestion: "Matiza las afirmaciones: usa \"la mayoría\", \"a menudo\" o \"en muchos casos\" en lugar de términos absolutos.",
        }),
        Box::new(MarkerRule {
            name: "emotional_language",
            finding_type: FindingType::EmotionalLanguage,
            severity: Severity::Medium,
            confidence: Confidence::Scaled {
                base: 0.55,
                step: 0.12,
                cap: 0.92,
            },
            matchers: vec![&EMOTIONAL_RE],
            min_count: 2,
            requires_no_evidence: false,
            collect_terms: false,
            description: "Lenguaje emocional extremo",
            suggestion: "Sustituye los adjetivos cargados de emoción por descripciones neutrales y verificables.",
        }),
        Box::new(MissingEvidenceRule),
        Box::new(MarkerRule {
            name: "polarization",
            finding_type: FindingType::Polarization,
            severity: Severity::Medium,
            confidence: Confidence::Fixed(0.72),
            matchers: vec![&CERTAINTY_RE],
            min_count: 1,
            requires_no_evidence: false,
            collect_terms: false,
            description: "Certeza no justificada que polariza la discusión",
            suggestion: "Presenta la idea como una postura argumentada y reconoce otras perspectivas.",
        }),
        Box::new(MarkerRule {
            name: "ad_hominem",
            finding_type: FindingType::AdHominem,
            severity: Severity::High,
            confidence: Confidence::Fixed(0.85),
            matchers: vec![&ATTACK_RE],
            min_count: 1,
            requires_no_evidence: false,
            collect_terms: false,
            description: "Ataque personal en lugar de argumento",
            suggestion: "Critica las ideas y los argumentos, no a las personas que los sostienen.",
        }),
        Box::new(MarkerRule {
            name: "selective_framing",
            finding_type: FindingType::SelectiveFraming,
            severity: Severity::Medium,
            confidence: Confidence::Fixed(0.62),
            matchers: vec![&RESTRICTIVE_RE],
            min_count: 3,
            requires_no_evidence: true,
            collect_terms: false,
            description: "Encuadre selectivo con marcadores restrictivos y sin evidencia",
            suggestion: "Considera otros factores o causas y justifica por qué uno solo sería relevante.",
        }),
        Box::new(MarkerRule {
            name: "false_dichotomy",
            finding_type: FindingType::FalseDichotomy,
            severity: Severity::Medium,
            confidence: Confidence::Fixed(0.68),
            matchers: vec![&DICHOTOMY_RE],
            min_count: 2,
            requires_no_evidence: false,
            collect_terms: false,
            description: "Falso dilema: se presentan solo dos alternativas",
            suggestion: "Explora opciones intermedias o alternativas adicionales.",
        }),
        Box::new(MarkerRule {
            name: "appeal_to_tradition",
            finding_type: FindingType::AppealToTradition,
            severity: Severity::Medium,
            confidence: Confidence::Fixed(0.65),
            matchers: vec![&TRADITION_RE],
            min_count: 1,
            requires_no_evidence: false,
            collect_terms: false,
            description: "Apelación a la tradición o a la creencia común",
            suggestion: "Explica por qué la práctica es válida en lugar de apoyarte en que siempre se hizo así.",
        }),
        Box::new(MarkerRule {
            name: "slippery_slope",
            finding_type: FindingType::SlipperySlope,
            severity: Severity::Medium,
            confidence: Confidence::Fixed(0.60),
            matchers: vec![&CAUSAL_CHAIN_RE, &IF_THEN_RE],
            min_count: 3,
            requires_no_evidence: true,
            collect_terms: false,
            description: "Pendiente resbaladiza: cadena de consecuencias sin evidencia",
            suggestion: "Justifica cada paso de la cadena causal con evidencia antes de concluir.",
        }),
        Box::new(ExcessiveEmphasisRule),
    ]
}

// ---------------------------------------------------------------------------
// Library
// ---------------------------------------------------------------------------

/// An immutable registry of detection rules.
pub struct PatternLibrary {
    rules: Vec<Box<dyn PatternRule>>,
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self {
            rules: standard_rules(),
        }
    }
}

impl PatternLibrary {
    /// A library with no rules; add them with [`PatternLibrary::with_rule`].
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: Box<dyn PatternRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule and concatenate the findings in registration order.
    pub fn analyze(&self, text: &str) -> Vec<Finding> {
        self.rules.iter().flat_map(|r| r.detect(text)).collect()
    }
}

static STANDARD_LIBRARY: Lazy<PatternLibrary> = Lazy::new(PatternLibrary::default);

/// Run the standard Pattern Library over `text`.
pub fn analyze_local_patterns(text: &str) -> Vec<Finding> {
    STANDARD_LIBRARY.analyze(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn of_type(findings: &[Finding], t: FindingType) -> Vec<&Finding> {
        findings.iter().filter(|f| f.finding_type == t).collect()
    }

    #[test]
    fn generalization_collects_terms() {
        let findings =
            analyze_local_patterns("Todos los estudiantes siempre entienden todo sin esfuerzo.");
        let gen = of_type(&findings, FindingType::Generalization);
        assert_eq!(gen.len(), 1);
        let terms = &gen[0].problematic_terms;
        assert!(terms.contains(&"todos".to_string()));
        assert!(terms.contains(&"siempre".to_string()));
        assert!(terms.contains(&"todo".to_string()));
        assert_eq!(gen[0].severity, Severity::High);
        // 3 hits: 0.65 + 0.24
        assert!((gen[0].confidence - 0.89).abs() < 1e-9);
    }

    #[test]
    fn generalization_confidence_is_capped() {
        let text = "todos todas siempre nunca nadie cada jamás todo toda";
        let gen = analyze_local_patterns(text)
            .into_iter()
            .find(|f| f.finding_type == FindingType::Generalization)
            .unwrap();
        assert!((gen.confidence - 0.95).abs() < 1e-9);
        assert!(gen.location.matches(" | ").count() <= 2);
    }

    #[test]
    fn no_match_inside_longer_words() {
        let findings = analyze_local_patterns("Los métodos son cadáveres de la lógica.");
        assert!(of_type(&findings, FindingType::Generalization).is_empty());
    }

    #[test]
    fn single_emotional_word_does_not_fire() {
        let findings = analyze_local_patterns("La película fue terrible.");
        assert!(of_type(&findings, FindingType::EmotionalLanguage).is_empty());

        let findings = analyze_local_patterns("Fue terrible y horrible.");
        let emo = of_type(&findings, FindingType::EmotionalLanguage);
        assert_eq!(emo.len(), 1);
        assert!((emo[0].confidence - 0.79).abs() < 1e-9);
    }

    #[test]
    fn missing_evidence_requires_long_text() {
        let long = "La ciudad crece rápido y la gente se muda al centro. ".repeat(7);
        assert!(word_count(&long) > 60);
        let findings = analyze_local_patterns(&long);
        let missing = of_type(&findings, FindingType::MissingEvidence);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].confidence, 0.70);

        let cited = format!("{long} Según un estudio reciente, esto es así.");
        assert!(of_type(&analyze_local_patterns(&cited), FindingType::MissingEvidence).is_empty());
    }

    #[test]
    fn polarization_and_ad_hominem() {
        let findings =
            analyze_local_patterns("Obviamente el ministro es un incompetente y un mentiroso.");
        assert_eq!(of_type(&findings, FindingType::Polarization).len(), 1);
        let attack = of_type(&findings, FindingType::AdHominem);
        assert_eq!(attack.len(), 1);
        assert_eq!(attack[0].severity, Severity::High);
        assert_eq!(attack[0].confidence, 0.85);
    }

    #[test]
    fn selective_framing_suppressed_by_evidence() {
        let text = "Solo importa el precio. Únicamente eso. Exclusivamente el precio.";
        assert_eq!(
            of_type(&analyze_local_patterns(text), FindingType::SelectiveFraming).len(),
            1
        );
        let with_source = format!("{text} Según la encuesta nacional.");
        assert!(
            of_type(&analyze_local_patterns(&with_source), FindingType::SelectiveFraming)
                .is_empty()
        );
    }

    #[test]
    fn false_dichotomy_needs_two_hits() {
        let once = "O bien aceptas la reforma o te vas.";
        assert!(of_type(&analyze_local_patterns(once), FindingType::FalseDichotomy).is_empty());
        let twice = "O bien aceptas la reforma o te vas. Esto es blanco o negro.";
        assert_eq!(
            of_type(&analyze_local_patterns(twice), FindingType::FalseDichotomy).len(),
            1
        );
    }

    #[test]
    fn appeal_to_tradition() {
        let findings = analyze_local_patterns("Todo el mundo sabe que esto funciona.");
        assert_eq!(of_type(&findings, FindingType::AppealToTradition).len(), 1);
    }

    #[test]
    fn slippery_slope_counts_if_then_chains() {
        let text = "Si permitimos esto, entonces vendrá lo peor. \
                    Eso llevará a la crisis, que inevitablemente conducirá a la ruina.";
        let findings = analyze_local_patterns(text);
        let slope = of_type(&findings, FindingType::SlipperySlope);
        assert_eq!(slope.len(), 1);
        assert_eq!(slope[0].confidence, 0.60);
    }

    #[test]
    fn excessive_emphasis() {
        let text = "¡Increíble! ¡Nunca visto! ¡Hay que actuar! ¡Ya!";
        let findings = analyze_local_patterns(text);
        let emphasis = of_type(&findings, FindingType::ExcessiveEmphasis);
        assert_eq!(emphasis.len(), 1);
        assert_eq!(emphasis[0].severity, Severity::Low);

        assert!(of_type(
            &analyze_local_patterns("¡Hola! ¡Adiós! ¡Ya!"),
            FindingType::ExcessiveEmphasis
        )
        .is_empty());
    }

    #[test]
    fn analysis_is_deterministic() {
        let text = "Todos odian esto, es terrible y horrible. Obviamente nadie lo quiere!!!!";
        assert_eq!(analyze_local_patterns(text), analyze_local_patterns(text));
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(analyze_local_patterns("").is_empty());
    }

    #[test]
    fn custom_library() {
        let lib = PatternLibrary::empty().with_rule(Box::new(ExcessiveEmphasisRule));
        assert_eq!(lib.rule_names(), vec!["excessive_emphasis"]);
        assert!(lib.analyze("Todos siempre.").is_empty());
    }
}
