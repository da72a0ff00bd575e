//! Answer Bias Analyzer: short student responses, scored on the 0–12 scale.
//!
//! On top of the Pattern Library this adds gibberish detection, source
//! coverage, question alignment and skill-specific checks for inferential,
//! critical and applied questions.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{AnswerAnalysisRequest, Finding, FindingType, Question, QuestionType, Severity};
use crate::patterns::{has_evidence, PatternLibrary};
use crate::report::{AnalysisReport, ReportKind};
use crate::statistics::answer_quality;
use crate::text::{fold, term_regex};

const INVALID_MIN_CHARS: usize = 10;
const REPEATED_CHAR_RUN: usize = 5;
const MIN_VALID_RATIO: f64 = 0.3;
const SKILL_CHECK_MIN_CHARS: usize = 50;
const MAX_KEY_CONCEPTS: usize = 20;
const MIN_KEY_CONCEPTS: usize = 5;
const MIN_MENTIONED_CONCEPTS: usize = 2;
const PROMPT_SCAN_CHARS: usize = 100;

pub const CAUSAL_TERMS: &[&str] = &[
    "porque",
    "debido a",
    "causa",
    "causan",
    "provoca",
    "provocan",
    "lleva a",
    "conduce a",
    "por eso",
];

pub const INFERENCE_TERMS: &[&str] = &[
    "sugiere",
    "implica",
    "se puede concluir",
    "puedo concluir",
    "se infiere",
    "podemos deducir",
    "por lo tanto",
    "esto indica",
];

pub const EVALUATIVE_TERMS: &[&str] = &[
    "sin embargo",
    "ventaja",
    "ventajas",
    "desventaja",
    "desventajas",
    "limitación",
    "limitaciones",
    "considero",
    "en mi opinión",
    "por otro lado",
    "aunque",
];

pub const TRANSFER_TERMS: &[&str] = &[
    "aplicar",
    "aplicaría",
    "aplico",
    "en un nuevo contexto",
    "en otro contexto",
    "por ejemplo",
    "en la vida real",
    "en mi comunidad",
];

/// Instructional verbs and the folded word forms that count as the verb or a
/// direct cognate. Each form is matched as a whole word.
const INSTRUCTION_VERBS: &[(&str, &[&str])] = &[
    (
        "explicar",
        &[
            "explic(?:a|as|an|ar|o|ando|ado|ada|acion|aciones|ativo|ativa)",
            "expliqu(?:e|es|en)",
        ],
    ),
    (
        "definir",
        &["defin(?:a|an|e|es|en|ir|o|iendo|ido|ida|icion|iciones)"],
    ),
    (
        "comparar",
        &["compar(?:a|as|an|ar|o|e|en|ando|ado|ada|acion|aciones|ativo|ativa|ativos|ativas)"],
    ),
    (
        "evaluar",
        &[
            "evalu(?:a|as|an|ar|o|e|en|ando|ado|ada|acion|aciones)",
            "valor(?:a|as|an|ar|o|e|en|acion|aciones)",
        ],
    ),
    (
        "analizar",
        &["analiz(?:a|as|an|ar|o|ando|ado|ada)", "analic(?:e|es|en)", "analisis"],
    ),
    (
        "justificar",
        &[
            "justific(?:a|as|an|ar|o|ando|ado|ada|acion|aciones)",
            "justifiqu(?:e|es|en)",
        ],
    ),
    (
        "describir",
        &[
            "describ(?:a|as|an|e|es|en|ir|o|iendo|ido|ida)",
            "descripcion(?:es)?",
            "descriptiv(?:o|a|os|as)",
        ],
    ),
    (
        "identificar",
        &[
            "identific(?:a|as|an|ar|o|ando|ado|ada|acion)",
            "identifiqu(?:e|es|en)",
        ],
    ),
];

static CAUSAL_RE: Lazy<Regex> = Lazy::new(|| term_regex(CAUSAL_TERMS));
static INFERENCE_RE: Lazy<Regex> = Lazy::new(|| term_regex(INFERENCE_TERMS));
static EVALUATIVE_RE: Lazy<Regex> = Lazy::new(|| term_regex(EVALUATIVE_TERMS));
static TRANSFER_RE: Lazy<Regex> = Lazy::new(|| term_regex(TRANSFER_TERMS));
static LETTER_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{L}+").expect("valid word regex"));
static KEY_CONCEPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\p{Lu}\p{L}+\b").expect("valid concept regex"));
static INSTRUCTION_RES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    INSTRUCTION_VERBS
        .iter()
        .map(|(verb, forms)| {
            let pattern = format!(r"\b(?:{})\b", forms.join("|"));
            (*verb, Regex::new(&pattern).expect("valid verb regex"))
        })
        .collect()
});

/// Result of analyzing one student answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerReport {
    pub report: AnalysisReport,
    /// Plain-language coaching tips.
    pub recommendations: Vec<String>,
    /// Capitalized terms extracted from the source text.
    #[serde(default)]
    pub key_concepts: Vec<String>,
    /// The subset of `key_concepts` the answer mentions.
    #[serde(default)]
    pub mentioned_concepts: Vec<String>,
}

/// Analyzer for student answers.
#[derive(Default)]
pub struct AnswerAnalyzer {
    library: PatternLibrary,
}

impl AnswerAnalyzer {
    pub fn new(library: PatternLibrary) -> Self {
        Self { library }
    }

    pub fn analyze(&self, request: &AnswerAnalysisRequest) -> AnswerReport {
        let answer = request.answer.as_str();
        let question = request.question.as_ref();

        if let Some(invalid) = detect_invalid_response(answer) {
            tracing::debug!("answer rejected as invalid");
            return self.finish(vec![invalid], question, Vec::new(), Vec::new());
        }

        let mut findings = self.library.analyze(answer);
        findings.extend(detect_unsupported_causality(answer));

        if let Some(q) = question {
            findings.extend(detect_skill_gap(answer, q.question_type));
            findings.extend(detect_misalignment(answer, &q.prompt));
        }

        let (key_concepts, mentioned) = match request.source_text.as_deref() {
            Some(source) => {
                let concepts = extract_key_concepts(source);
                let mentioned = mentioned_concepts(answer, &concepts);
                findings.extend(coverage_finding(&concepts, &mentioned));
                (concepts, mentioned)
            }
            None => (Vec::new(), Vec::new()),
        };

        tracing::debug!(findings = findings.len(), "answer analyzed");
        self.finish(findings, question, key_concepts, mentioned)
    }

    fn finish(
        &self,
        findings: Vec<Finding>,
        question: Option<&Question>,
        key_concepts: Vec<String>,
        mentioned_concepts: Vec<String>,
    ) -> AnswerReport {
        let recommendations = recommendations(&findings, question.map(|q| q.question_type));
        AnswerReport {
            report: AnalysisReport::new(ReportKind::Answer, findings, answer_quality),
            recommendations,
            key_concepts,
            mentioned_concepts,
        }
    }
}

// ---------------------------------------------------------------------------
// Invalid response
// ---------------------------------------------------------------------------

fn is_vowel(c: char) -> bool {
    matches!(
        c,
        'a' | 'e' | 'i' | 'o' | 'u' | 'á' | 'é' | 'í' | 'ó' | 'ú' | 'ü'
    )
}

/// Plausibility check for a single alphabetic token.
fn is_valid_word(word: &str) -> bool {
    let w = word.to_lowercase();
    let chars: Vec<char> = w.chars().collect();
    if chars.len() == 1 {
        return matches!(chars[0], 'a' | 'e' | 'o' | 'u' | 'y');
    }
    if !chars.iter().any(|c| is_vowel(*c)) {
        return false;
    }

    // Consonant clusters: 4 are allowed only around a liquid (instrumento,
    // abstracto), 5 never.
    let mut cluster = String::new();
    let mut same_run = 1;
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && chars[i - 1] == c {
            same_run += 1;
            if same_run >= 3 {
                return false;
            }
        } else {
            same_run = 1;
        }

        if is_vowel(c) {
            cluster.clear();
        } else {
            cluster.push(c);
            let len = cluster.chars().count();
            if len >= 5 || (len == 4 && !cluster.contains(|c: char| c == 'r' || c == 'l')) {
                return false;
            }
        }
    }
    true
}

fn longest_repeated_run(text: &str) -> usize {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<char> = None;
    for c in text.chars().flat_map(|c| c.to_lowercase()) {
        if c.is_alphanumeric() && Some(c) == prev {
            run += 1;
        } else {
            run = 1;
        }
        prev = Some(c);
        longest = longest.max(run);
    }
    longest
}

/// Flag gibberish. Only answers longer than 10 characters are judged.
pub fn detect_invalid_response(answer: &str) -> Option<Finding> {
    let trimmed = answer.trim();
    if trimmed.chars().count() <= INVALID_MIN_CHARS {
        return None;
    }

    let total_chars = trimmed.chars().filter(|c| !c.is_whitespace()).count();
    let mut valid_words = 0usize;
    let mut valid_chars = 0usize;
    for m in LETTER_WORD_RE.find_iter(trimmed) {
        if is_valid_word(m.as_str()) {
            valid_words += 1;
            valid_chars += m.as_str().chars().count();
        }
    }
    let ratio = valid_chars as f64 / total_chars.max(1) as f64;

    let mut reasons = Vec::new();
    if longest_repeated_run(trimmed) >= REPEATED_CHAR_RUN {
        reasons.push("caracteres repetidos");
    }
    if ratio < MIN_VALID_RATIO {
        reasons.push("proporción muy baja de palabras reconocibles");
    }
    if valid_words == 0 {
        reasons.push("ninguna palabra válida");
    }
    if reasons.is_empty() {
        return None;
    }

    Some(
        Finding::new(
            FindingType::InvalidResponse,
            Severity::Critical,
            0.95,
            format!("Respuesta no válida: {}", reasons.join(", ")),
        )
        .at(format!("{valid_words} palabra(s) válida(s), proporción {ratio:.2}"))
        .suggest("Escribe una respuesta completa con tus propias palabras.")
        .with_score_impact(12.0),
    )
}

// ---------------------------------------------------------------------------
// Argumentation and skill checks
// ---------------------------------------------------------------------------

pub fn detect_unsupported_causality(answer: &str) -> Option<Finding> {
    let count = CAUSAL_RE.find_iter(answer).count();
    if count < 2 || has_evidence(answer) {
        return None;
    }
    Some(
        Finding::new(
            FindingType::UnsupportedCausality,
            Severity::High,
            0.70,
            format!("Relaciones causales afirmadas sin evidencia ({count} conectores)"),
        )
        .suggest("Respalda cada relación de causa y efecto con datos o con citas del texto."),
    )
}

pub fn detect_skill_gap(answer: &str, question_type: QuestionType) -> Option<Finding> {
    if answer.trim().chars().count() <= SKILL_CHECK_MIN_CHARS {
        return None;
    }
    let finding = match question_type {
        QuestionType::Literal => return None,
        QuestionType::Inferential if !INFERENCE_RE.is_match(answer) => Finding::new(
            FindingType::WeakInference,
            Severity::Medium,
            0.65,
            "La respuesta repite información sin formular inferencias",
        )
        .suggest("Explica qué se puede concluir o deducir a partir del texto."),
        QuestionType::Critical if !EVALUATIVE_RE.is_match(answer) => Finding::new(
            FindingType::ShallowCritique,
            Severity::High,
            0.70,
            "La crítica no evalúa ventajas, limitaciones ni puntos de vista",
        )
        .suggest("Valora el texto: señala fortalezas, limitaciones y tu postura fundamentada."),
        QuestionType::Applied if !TRANSFER_RE.is_match(answer) => Finding::new(
            FindingType::NarrowApplication,
            Severity::Medium,
            0.65,
            "La respuesta no transfiere las ideas a un contexto nuevo",
        )
        .suggest("Muestra cómo aplicarías la idea en otra situación, con un ejemplo concreto."),
        _ => return None,
    };
    Some(finding)
}

/// The first instructional verb found in the opening of the prompt.
fn instruction_verb(prompt: &str) -> Option<(&'static str, &'static Regex)> {
    let head: String = fold(prompt).chars().take(PROMPT_SCAN_CHARS).collect();
    INSTRUCTION_RES
        .iter()
        .filter_map(|(verb, re)| re.find(&head).map(|m| (m.start(), *verb, re)))
        .min_by_key(|(start, _, _)| *start)
        .map(|(_, verb, re)| (verb, re))
}

pub fn detect_misalignment(answer: &str, prompt: &str) -> Option<Finding> {
    let (verb, re) = instruction_verb(prompt)?;
    if re.is_match(&fold(answer)) {
        return None;
    }
    Some(
        Finding::new(
            FindingType::OffTopic,
            Severity::High,
            0.65,
            format!("La pregunta pide {verb} y la respuesta no lo aborda"),
        )
        .at(format!("verbo de la consigna: {verb}"))
        .suggest(format!(
            "Relee la consigna: se te pide {verb}. Estructura la respuesta en torno a esa acción."
        )),
    )
}

// ---------------------------------------------------------------------------
// Source coverage
// ---------------------------------------------------------------------------

/// Up to 20 unique capitalized multi-letter tokens, in order of appearance.
pub fn extract_key_concepts(source: &str) -> Vec<String> {
    let mut concepts: Vec<String> = Vec::new();
    for m in KEY_CONCEPT_RE.find_iter(source) {
        let concept = m.as_str();
        if !concepts.iter().any(|c| c.to_lowercase() == concept.to_lowercase()) {
            concepts.push(concept.to_string());
            if concepts.len() == MAX_KEY_CONCEPTS {
                break;
            }
        }
    }
    concepts
}

pub fn mentioned_concepts(answer: &str, concepts: &[String]) -> Vec<String> {
    concepts
        .iter()
        .filter(|c| term_regex(std::slice::from_ref(*c)).is_match(answer))
        .cloned()
        .collect()
}

fn coverage_finding(concepts: &[String], mentioned: &[String]) -> Option<Finding> {
    if concepts.len() < MIN_KEY_CONCEPTS || mentioned.len() >= MIN_MENTIONED_CONCEPTS {
        return None;
    }
    let (severity, impact) = if mentioned.is_empty() {
        (Severity::High, 8.0)
    } else {
        (Severity::Medium, 4.0)
    };
    Some(
        Finding::new(
            FindingType::LowCoverage,
            severity,
            0.70,
            format!(
                "La respuesta menciona {} de {} conceptos clave del texto",
                mentioned.len(),
                concepts.len()
            ),
        )
        .at(concepts.join(", "))
        .suggest("Retoma los conceptos centrales del texto y relaciónalos con tu respuesta.")
        .with_score_impact(impact),
    )
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

fn tip_for(finding_type: FindingType) -> &'static str {
    match finding_type {
        FindingType::Generalization => {
            "Evita generalizar: cambia \"todos\" o \"siempre\" por expresiones más precisas."
        }
        FindingType::EmotionalLanguage => {
            "Usa un tono neutral; las emociones fuertes debilitan el argumento."
        }
        FindingType::MissingEvidence => "Apoya tus ideas con datos o citas del texto.",
        FindingType::Polarization => {
            "Reconoce que pueden existir otras posturas antes de dar algo por obvio."
        }
        FindingType::AdHominem => "Discute las ideas, no a las personas.",
        FindingType::SelectiveFraming => "Considera más de un factor o causa.",
        FindingType::FalseDichotomy => "Busca alternativas además de las dos opciones extremas.",
        FindingType::AppealToTradition => {
            "Que algo se haya hecho siempre así no lo hace correcto: justifícalo."
        }
        FindingType::SlipperySlope => "Demuestra cada paso de la cadena de consecuencias.",
        FindingType::ExcessiveEmphasis => "Reduce los signos de exclamación.",
        FindingType::InvalidResponse => {
            "Responde con oraciones completas que se relacionen con la pregunta."
        }
        FindingType::UnsupportedCausality => {
            "Cuando digas que algo causa otra cosa, muestra la evidencia."
        }
        FindingType::WeakInference => "Ve más allá de lo literal: ¿qué se puede deducir?",
        FindingType::ShallowCritique => "Evalúa fortalezas y limitaciones antes de opinar.",
        FindingType::NarrowApplication => "Lleva la idea a un ejemplo de otro contexto.",
        FindingType::LowCoverage => "Incorpora los conceptos clave del texto leído.",
        FindingType::OffTopic => "Responde exactamente lo que pide la consigna.",
        FindingType::VerifiedMisinformation
        | FindingType::MisleadingInformation
        | FindingType::UnverifiedInformation => "Contrasta los datos con fuentes confiables.",
    }
}

fn closing_tip(question_type: QuestionType) -> &'static str {
    match question_type {
        QuestionType::Literal => {
            "Para preguntas literales, localiza la información exacta en el texto."
        }
        QuestionType::Inferential => {
            "Para preguntas inferenciales, conecta pistas del texto y explica tu conclusión."
        }
        QuestionType::Critical => {
            "Para preguntas críticas, toma una postura y defiéndela con argumentos."
        }
        QuestionType::Applied => {
            "Para preguntas de aplicación, transfiere lo aprendido a una situación real."
        }
    }
}

/// One tip per distinct finding type, then a closing tip for the question's
/// skill. No findings yields a single congratulatory message.
pub fn recommendations(findings: &[Finding], question_type: Option<QuestionType>) -> Vec<String> {
    if findings.is_empty() {
        return vec!["¡Muy bien! Tu respuesta es clara y está bien argumentada.".to_string()];
    }

    let mut seen: Vec<FindingType> = Vec::new();
    for f in findings {
        if !seen.contains(&f.finding_type) {
            seen.push(f.finding_type);
        }
    }

    let mut tips: Vec<String> = seen.into_iter().map(|t| tip_for(t).to_string()).collect();
    if let Some(qt) = question_type {
        tips.push(closing_tip(qt).to_string());
    }
    tips
}
