//! Didactic Report Parser: splits a generated explanation into narrative,
//! examples, glossary and reflection questions.
//!
//! Header recognition ([`detect_sections`]) is separate from grouping so it
//! can be tested on its own. Input never fails to parse: text with no
//! recognized header is all narrative.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::text::fold;

/// A named section of a didactic explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Examples,
    Glossary,
    ReflectionQuestions,
}

/// Recognized header text (folded) and the section it opens.
const SECTION_HEADERS: &[(&str, SectionKind)] = &[
    ("ejemplos", SectionKind::Examples),
    ("examples", SectionKind::Examples),
    ("glosario", SectionKind::Glossary),
    ("glossary", SectionKind::Glossary),
    ("preguntas de reflexion", SectionKind::ReflectionQuestions),
    ("reflection questions", SectionKind::ReflectionQuestions),
];

static ITEM_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:[).\-]|\s)").expect("valid item regex"));
static QUESTION_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[).\-]\s*").expect("valid question regex"));

/// Where a recognized header sits in the input, by 0-based line index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionBoundary {
    pub kind: SectionKind,
    pub header_line: usize,
    /// First content line of the section.
    pub start_line: usize,
}

/// Match one line against the header table, ignoring case, diacritics and
/// markdown decoration (`## Glosario:`, `**Ejemplos**`).
pub fn header_kind(line: &str) -> Option<SectionKind> {
    let cleaned = line
        .trim()
        .trim_start_matches('#')
        .trim()
        .trim_matches(|c: char| c == '*' || c == '_')
        .trim()
        .trim_end_matches(':')
        .trim();
    let folded = fold(cleaned);
    SECTION_HEADERS
        .iter()
        .find(|(header, _)| *header == folded)
        .map(|(_, kind)| *kind)
}

/// All recognized headers, in input order.
pub fn detect_sections(text: &str) -> Vec<SectionBoundary> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            header_kind(line).map(|kind| SectionBoundary {
                kind,
                header_line: index,
                start_line: index + 1,
            })
        })
        .collect()
}

/// Structured view of a didactic explanation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DidacticReport {
    pub narrative: Vec<String>,
    pub examples: Vec<String>,
    pub glossary: Vec<String>,
    pub reflection_questions: Vec<String>,
    /// The text the sections were parsed from.
    #[serde(default)]
    pub raw_text: String,
    /// Sanitization and intent-validation warnings, filled in by the engine.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl DidacticReport {
    pub fn glossary_len(&self) -> usize {
        self.glossary.len()
    }
}

pub fn parse_didactic_report(text: &str) -> DidacticReport {
    let lines: Vec<&str> = text.lines().collect();
    let boundaries = detect_sections(text);
    let narrative_end = boundaries.first().map_or(lines.len(), |b| b.header_line);

    let mut report = DidacticReport {
        narrative: paragraphs(&lines[..narrative_end]),
        raw_text: text.to_string(),
        ..Default::default()
    };

    for (i, boundary) in boundaries.iter().enumerate() {
        let end = boundaries
            .get(i + 1)
            .map_or(lines.len(), |next| next.header_line);
        let body = &lines[boundary.start_line.min(end)..end];
        match boundary.kind {
            SectionKind::Examples => report.examples.extend(group_examples(body)),
            SectionKind::Glossary => report.glossary.extend(glossary_items(body)),
            SectionKind::ReflectionQuestions => {
                report.reflection_questions.extend(questions(body))
            }
        }
    }

    tracing::debug!(
        sections = boundaries.len(),
        examples = report.examples.len(),
        glossary = report.glossary.len(),
        "didactic report parsed"
    );
    report
}

/// Paragraphs separated by blank lines; lines inside one are joined by a space.
fn paragraphs(lines: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                out.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(trimmed);
        }
    }
    if !current.is_empty() {
        out.push(current.join(" "));
    }
    out
}

fn group_examples(lines: &[&str]) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for line in lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        match items.last_mut() {
            Some(current) if !ITEM_START_RE.is_match(line) => {
                current.push(' ');
                current.push_str(line);
            }
            _ => items.push(line.to_string()),
        }
    }
    items
}

fn glossary_items(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .map(|l| {
            l.trim()
                .trim_start_matches(|c: char| c == '-' || c == '•')
                .trim()
                .to_string()
        })
        .filter(|l| !l.is_empty())
        .collect()
}

fn questions(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .map(|l| QUESTION_NUMBER_RE.replace(l.trim(), "").trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}
