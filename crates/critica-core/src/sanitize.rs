//! Sanitization Pipeline: removes caller-banned vocabulary from generated
//! text and validates declared intents.
//!
//! Nothing here fails. Residual banned terms and unmet intents come back as
//! warning strings next to the sanitized text.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::parser::parse_didactic_report;
use crate::text::{fold, term_regex, word_count};

/// Substitute for banned terms with no explicit mapping.
pub const DEFAULT_SUBSTITUTE: &str = "varios";

const DEFAULT_REPLACEMENTS: &[(&str, &str)] = &[
    ("todos", "la mayoría"),
    ("todas", "la mayoría"),
    ("siempre", "a menudo"),
    ("nunca", "rara vez"),
    ("jamás", "rara vez"),
    ("nadie", "pocas personas"),
    ("ninguno", "pocos"),
    ("ninguna", "pocas"),
    ("totalmente", "en gran medida"),
    ("completamente", "en gran medida"),
    ("absolutamente", "en buena parte"),
    ("obviamente", "posiblemente"),
    ("claramente", "aparentemente"),
];

/// Mangled tokens left behind by upstream generation and their repair.
const KNOWN_REPAIRS: &[(&str, &str)] = &[
    ("mé la mayoría", "métodos"),
    ("Mé la mayoría", "Métodos"),
    ("pun la mayoría", "puntos"),
    ("Pun la mayoría", "Puntos"),
];

/// Words after the default substitute that are not nouns to pluralize.
const AGREEMENT_STOPWORDS: &[&str] = &[
    "de", "del", "la", "el", "los", "las", "y", "o", "que", "en", "a", "al", "con", "por", "para",
    "un", "uno", "una", "se", "es", "son",
];

/// Private-use char placed after each default substitute the replacer emits,
/// so agreement only touches words next to a substitution.
const SUBSTITUTION_MARK: char = '\u{E000}';

static HAS_LETTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}").expect("valid letter regex"));
static MARKED_NOUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x{E000}(\s+)(\p{L}+)\b").expect("valid agreement regex"));

/// Banned term → substitute mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementTable {
    /// Keys are lowercase.
    replacements: BTreeMap<String, String>,
    default_substitute: String,
}

impl Default for ReplacementTable {
    fn default() -> Self {
        let mut table = Self::new(DEFAULT_SUBSTITUTE);
        for (term, substitute) in DEFAULT_REPLACEMENTS {
            table = table.with(*term, *substitute);
        }
        table
    }
}

impl ReplacementTable {
    /// An empty table; every banned term maps to `default_substitute`.
    pub fn new(default_substitute: impl Into<String>) -> Self {
        Self {
            replacements: BTreeMap::new(),
            default_substitute: default_substitute.into(),
        }
    }

    pub fn with(mut self, term: impl AsRef<str>, substitute: impl Into<String>) -> Self {
        self.replacements
            .insert(normalize_term(term.as_ref()), substitute.into());
        self
    }

    pub fn default_substitute(&self) -> &str {
        &self.default_substitute
    }

    pub fn substitute_for(&self, term: &str) -> &str {
        self.replacements
            .get(&normalize_term(term))
            .map(String::as_str)
            .unwrap_or(&self.default_substitute)
    }

    fn substitutes(&self) -> impl Iterator<Item = &str> {
        self.replacements
            .values()
            .map(String::as_str)
            .chain(std::iter::once(self.default_substitute.as_str()))
    }
}

fn normalize_term(term: &str) -> String {
    term.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Output of a sanitization run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SanitizationReport {
    pub text: String,
    /// Total substitutions made.
    pub replacements: usize,
    /// Substitutions per banned term.
    pub replaced_terms: BTreeMap<String, usize>,
    /// Banned terms still present in `text`.
    pub residual_terms: Vec<String>,
    pub warnings: Vec<String>,
}

impl SanitizationReport {
    pub fn is_clean(&self) -> bool {
        self.residual_terms.is_empty() && self.warnings.is_empty()
    }
}

/// Carry the casing pattern of `matched` over to `substitute`.
pub fn apply_casing(matched: &str, substitute: &str) -> String {
    let letters: Vec<char> = matched.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return substitute.to_uppercase();
    }
    if letters.first().is_some_and(|c| c.is_uppercase()) {
        let mut chars = substitute.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }
    substitute.to_lowercase()
}

/// Replace every whole-word occurrence of a banned term.
///
/// All terms are matched in one pass, so a substitute is never re-matched.
/// Untouched input comes back byte-identical.
pub fn sanitize<S: AsRef<str>>(
    text: &str,
    banned_terms: &[S],
    table: &ReplacementTable,
) -> SanitizationReport {
    let banned: Vec<String> = banned_terms
        .iter()
        .map(|t| normalize_term(t.as_ref()))
        .filter(|t| !t.is_empty())
        .collect();
    if banned.is_empty() {
        return SanitizationReport {
            text: text.to_string(),
            ..Default::default()
        };
    }

    let matcher = term_regex(banned.as_slice());
    let mut replaced_terms: BTreeMap<String, usize> = BTreeMap::new();
    let replaced = matcher.replace_all(text, |caps: &Captures| {
        let matched = &caps[0];
        let key = normalize_term(matched);
        let mapped = table.substitute_for(&key);
        let mut substitute = apply_casing(matched, mapped);
        if mapped == table.default_substitute() {
            substitute.push(SUBSTITUTION_MARK);
        }
        *replaced_terms.entry(key).or_insert(0) += 1;
        substitute
    });

    let replacements: usize = replaced_terms.values().sum();
    let mut text = replaced.into_owned();
    if replacements > 0 {
        text = fix_agreement(&text);
        text = repair_known_corruptions(&text);
        text = collapse_repeated_substitutes(&text, table);
    }

    let mut residual_terms: Vec<String> = Vec::new();
    for m in matcher.find_iter(&text) {
        let term = normalize_term(m.as_str());
        if !residual_terms.contains(&term) {
            residual_terms.push(term);
        }
    }
    let warnings: Vec<String> = residual_terms
        .iter()
        .map(|t| format!("banned term \"{t}\" is still present after sanitization"))
        .collect();
    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    tracing::debug!(replacements, "sanitization finished");
    SanitizationReport {
        text,
        replacements,
        replaced_terms,
        residual_terms,
        warnings,
    }
}

fn repair_known_corruptions(text: &str) -> String {
    KNOWN_REPAIRS
        .iter()
        .fold(text.to_string(), |acc, (broken, fixed)| acc.replace(broken, fixed))
}

/// "varios varios" → "varios", and the same for every substitute.
fn collapse_repeated_substitutes(text: &str, table: &ReplacementTable) -> String {
    let mut out = text.to_string();
    for substitute in table.substitutes() {
        if substitute.trim().is_empty() || !HAS_LETTER_RE.is_match(substitute) {
            continue;
        }
        let escaped = regex::escape(substitute.trim()).replace(' ', r"\s+");
        let pattern = format!(r"(?i)\b({escaped})(?:\s+{escaped}\b)+");
        if let Ok(re) = Regex::new(&pattern) {
            out = re.replace_all(&out, "$1").into_owned();
        }
    }
    out
}

fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    if AGREEMENT_STOPWORDS.contains(&lower.as_str()) || lower.ends_with('s') {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ión") {
        return format!("{stem}iones");
    }
    if let Some(stem) = word.strip_suffix('z') {
        return format!("{stem}ces");
    }
    match lower.chars().last() {
        Some('a' | 'e' | 'i' | 'o' | 'u' | 'á' | 'é' | 'ó') => format!("{word}s"),
        Some(_) => format!("{word}es"),
        None => word.to_string(),
    }
}

/// Pluralize the noun right after each marked default substitute
/// ("varios variable" → "varios variables") and drop the marks. Text the
/// replacer did not produce is left alone.
fn fix_agreement(text: &str) -> String {
    MARKED_NOUN_RE
        .replace_all(text, |caps: &Captures| {
            format!("{}{}{}", SUBSTITUTION_MARK, &caps[1], pluralize(&caps[2]))
        })
        .replace(SUBSTITUTION_MARK, "")
}

// ---------------------------------------------------------------------------
// Declared intents
// ---------------------------------------------------------------------------

/// Something the caller's instruction asked the generator to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredIntent {
    ExpandGlossary,
    AddInformation,
}

/// Intents stated in a Spanish or English instruction.
pub fn detect_intents(instruction: &str) -> Vec<DeclaredIntent> {
    let folded = fold(instruction);
    let mut intents = Vec::new();

    let expand = ["ampli", "expand", "extiend", "agrega", "anade"]
        .iter()
        .any(|v| folded.contains(v));
    let glossary = folded.contains("glosario") || folded.contains("glossary");
    if expand && glossary {
        intents.push(DeclaredIntent::ExpandGlossary);
    }

    if [
        "mas informacion",
        "more information",
        "add more",
        "mas detalle",
        "more detail",
    ]
    .iter()
    .any(|p| folded.contains(p))
    {
        intents.push(DeclaredIntent::AddInformation);
    }
    intents
}

/// Compare the pre-sanitization original with the final text against the
/// instruction's declared intents. Each unmet intent yields one warning.
pub fn validate_intents(original: &str, result: &str, instruction: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    for intent in detect_intents(instruction) {
        match intent {
            DeclaredIntent::ExpandGlossary => {
                let before = parse_didactic_report(original).glossary_len();
                let after = parse_didactic_report(result).glossary_len();
                if after <= before {
                    warnings.push(format!(
                        "glossary was not expanded: {before} items before, {after} after"
                    ));
                }
            }
            DeclaredIntent::AddInformation => {
                let before = word_count(original);
                let after = word_count(result);
                if after <= before {
                    warnings.push(format!(
                        "more information was requested but the word count did not grow: {before} words before, {after} after"
                    ));
                }
            }
        }
    }
    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    warnings
}

/// Sanitize generated text and, when the caller supplies the original text
/// and an instruction, validate the declared intents too.
pub fn sanitize_generated<S: AsRef<str>>(
    generated: &str,
    banned_terms: &[S],
    table: &ReplacementTable,
    instruction: Option<&str>,
    original: Option<&str>,
) -> SanitizationReport {
    let mut report = sanitize(generated, banned_terms, table);
    if let (Some(instruction), Some(original)) = (instruction, original) {
        report
            .warnings
            .extend(validate_intents(original, &report.text, instruction));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_banned_quantifiers() {
        let report = sanitize(
            "Todos los métodos aplican cada variable",
            &["todos", "cada"],
            &ReplacementTable::default(),
        );
        assert!(report
            .text
            .contains("La mayoría los métodos aplican varios variable"));
        assert_eq!(report.text, "La mayoría los métodos aplican varios variables");
        assert!(report.text.contains("métodos"));
        assert_eq!(report.replacements, 2);
        assert_eq!(report.replaced_terms["todos"], 1);
        assert_eq!(report.replaced_terms["cada"], 1);
        assert!(report.is_clean());
    }

    #[test]
    fn untouched_text_is_identical() {
        let text = "Los métodos  varios   y la mayoría la mayoría.\n";
        let report = sanitize(text, &["todos", "nunca"], &ReplacementTable::default());
        assert_eq!(report.text, text);
        assert_eq!(report.replacements, 0);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn casing_is_preserved() {
        assert_eq!(apply_casing("TODOS", "la mayoría"), "LA MAYORÍA");
        assert_eq!(apply_casing("Siempre", "a menudo"), "A menudo");
        assert_eq!(apply_casing("nunca", "rara vez"), "rara vez");
        assert_eq!(apply_casing("A", "varios"), "Varios");
    }

    #[test]
    fn never_matches_inside_words() {
        let report = sanitize(
            "Los métodos de cadáveres y todos los demás.",
            &["todos", "cada"],
            &ReplacementTable::default(),
        );
        assert_eq!(report.text, "Los métodos de cadáveres y la mayoría los demás.");
    }

    #[test]
    fn known_corruptions_are_repaired() {
        let report = sanitize(
            "Siempre usamos mé la mayoría probados.",
            &["siempre"],
            &ReplacementTable::default(),
        );
        assert_eq!(report.text, "A menudo usamos métodos probados.");
    }

    #[test]
    fn repeated_substitutes_collapse() {
        let report = sanitize(
            "cada cada alumno",
            &["cada"],
            &ReplacementTable::default(),
        );
        assert_eq!(report.text, "varios alumnos");
    }

    #[test]
    fn agreement_only_follows_substitutions() {
        let report = sanitize(
            "Todos llegaron. Había varios sol y cada uno, varios lápiz.",
            &["todos", "cada"],
            &ReplacementTable::default(),
        );
        assert_eq!(
            report.text,
            "La mayoría llegaron. Había varios sol y varios uno, varios lápiz."
        );

        let report = sanitize(
            "Cada árbol da sombra a varios pájaro.",
            &["cada"],
            &ReplacementTable::default(),
        );
        assert_eq!(report.text, "Varios árboles da sombra a varios pájaro.");
    }

    #[test]
    fn agreement_rules() {
        assert_eq!(pluralize("lección"), "lecciones");
        assert_eq!(pluralize("luz"), "luces");
        assert_eq!(pluralize("papel"), "papeles");
        assert_eq!(pluralize("casa"), "casas");
        assert_eq!(pluralize("libros"), "libros");
        assert_eq!(pluralize("de"), "de");
    }

    #[test]
    fn multiword_and_custom_mappings() {
        let table = ReplacementTable::new("algunos").with("sin duda", "probablemente");
        let report = sanitize(
            "Sin   duda es cierto, y cualquier persona lo sabe.",
            &["sin duda", "cualquier"],
            &table,
        );
        assert_eq!(
            report.text,
            "Probablemente es cierto, y algunos personas lo sabe."
        );
        assert_eq!(report.replaced_terms["sin duda"], 1);
    }

    #[test]
    fn residual_terms_warn_instead_of_failing() {
        // The substitute reintroduces a banned word.
        let table = ReplacementTable::new("varios").with("nunca", "casi nunca");
        let report = sanitize("Nunca llueve.", &["nunca"], &table);
        assert_eq!(report.text, "Casi nunca llueve.");
        assert_eq!(report.residual_terms, vec!["nunca"]);
        assert_eq!(report.warnings.len(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn sanitized_output_has_no_banned_terms() {
        let banned = ["todos", "siempre", "nunca", "nadie", "cada"];
        let inputs = [
            "Todos saben que siempre llueve y nunca para.",
            "NADIE vino; cada uno se fue. Todos, todos.",
            "siempre-siempre: nunca.",
        ];
        let matcher = term_regex(banned.as_slice());
        for input in inputs {
            let report = sanitize(input, &banned, &ReplacementTable::default());
            assert!(!matcher.is_match(&report.text), "leaked in {:?}", report.text);
            assert!(report.residual_terms.is_empty());
        }
    }

    #[test]
    fn detects_intents_in_both_languages() {
        assert_eq!(
            detect_intents("Amplía el glosario con más términos"),
            vec![DeclaredIntent::ExpandGlossary]
        );
        assert_eq!(
            detect_intents("Please expand the glossary and add more examples"),
            vec![DeclaredIntent::ExpandGlossary, DeclaredIntent::AddInformation]
        );
        assert_eq!(
            detect_intents("Agrega más información"),
            vec![DeclaredIntent::AddInformation]
        );
        assert!(detect_intents("Corrige la ortografía").is_empty());
    }

    #[test]
    fn glossary_expansion_must_grow() {
        let original = "Texto.\nGlosario\n- Átomo: unidad.\n- Ion: átomo cargado.";
        let same = "Texto revisado.\nGlosario\n- Átomo: unidad.\n- Ion: átomo con carga.";
        let warnings = validate_intents(original, same, "Amplía el glosario");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("glossary"));
        assert!(warnings[0].contains("2 items before, 2 after"));

        let grown = format!("{same}\n- Molécula: grupo de átomos.");
        assert!(validate_intents(original, &grown, "Amplía el glosario").is_empty());
    }

    #[test]
    fn more_information_must_add_words() {
        let warnings = validate_intents("uno dos tres", "uno dos", "add more information");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("3 words before, 2 after"));
    }

    #[test]
    fn pipeline_merges_intent_warnings() {
        let report = sanitize_generated(
            "Todos los átomos.\nGlosario\n- Átomo: unidad.",
            &["todos"],
            &ReplacementTable::default(),
            Some("expand the glossary"),
            Some("Átomos.\nGlosario\n- Átomo: unidad."),
        );
        assert_eq!(report.replacements, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("glossary"));
    }
}
