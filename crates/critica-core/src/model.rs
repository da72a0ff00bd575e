//! Core data model types for critica.
//!
//! Findings are the unit every analyzer produces; requests are tagged per
//! analyzer so each one only carries the context it actually uses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of a detected rhetorical or argumentative weakness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingType {
    Generalization,
    EmotionalLanguage,
    MissingEvidence,
    Polarization,
    AdHominem,
    SelectiveFraming,
    FalseDichotomy,
    AppealToTradition,
    SlipperySlope,
    ExcessiveEmphasis,
    InvalidResponse,
    UnsupportedCausality,
    WeakInference,
    ShallowCritique,
    NarrowApplication,
    LowCoverage,
    OffTopic,
    VerifiedMisinformation,
    MisleadingInformation,
    UnverifiedInformation,
}

impl FindingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingType::Generalization => "generalization",
            FindingType::EmotionalLanguage => "emotional_language",
            FindingType::MissingEvidence => "missing_evidence",
            FindingType::Polarization => "polarization",
            FindingType::AdHominem => "ad_hominem",
            FindingType::SelectiveFraming => "selective_framing",
            FindingType::FalseDichotomy => "false_dichotomy",
            FindingType::AppealToTradition => "appeal_to_tradition",
            FindingType::SlipperySlope => "slippery_slope",
            FindingType::ExcessiveEmphasis => "excessive_emphasis",
            FindingType::InvalidResponse => "invalid_response",
            FindingType::UnsupportedCausality => "unsupported_causality",
            FindingType::WeakInference => "weak_inference",
            FindingType::ShallowCritique => "shallow_critique",
            FindingType::NarrowApplication => "narrow_application",
            FindingType::LowCoverage => "low_coverage",
            FindingType::OffTopic => "off_topic",
            FindingType::VerifiedMisinformation => "verified_misinformation",
            FindingType::MisleadingInformation => "misleading_information",
            FindingType::UnverifiedInformation => "unverified_information",
        }
    }
}

impl fmt::Display for FindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinal weight of a finding. Ordering is `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Where a verification finding came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingSource {
    /// Publisher of the fact-check review.
    pub publisher: String,
    /// URL of the review.
    pub url: String,
}

/// One detected issue.
///
/// Built once through the consuming builder methods and never mutated after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub finding_type: FindingType,
    /// Detector confidence in `0.0..=1.0`.
    pub confidence: f64,
    pub severity: Severity,
    pub description: String,
    /// Free-text locator or matched excerpt.
    #[serde(default)]
    pub location: String,
    /// Remediation text.
    #[serde(default)]
    pub suggestion: String,
    /// Explicit penalty that overrides the severity-based default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_impact: Option<f64>,
    /// Terms that triggered the finding; later fed to sanitization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub problematic_terms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<FindingSource>,
}

impl Finding {
    pub fn new(
        finding_type: FindingType,
        severity: Severity,
        confidence: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            finding_type,
            confidence: confidence.clamp(0.0, 1.0),
            severity,
            description: description.into(),
            location: String::new(),
            suggestion: String::new(),
            score_impact: None,
            problematic_terms: Vec::new(),
            source: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    pub fn with_score_impact(mut self, impact: f64) -> Self {
        self.score_impact = Some(impact);
        self
    }

    pub fn with_terms(mut self, terms: Vec<String>) -> Self {
        self.problematic_terms = terms;
        self
    }

    pub fn with_source(mut self, source: FindingSource) -> Self {
        self.source = Some(source);
        self
    }
}

/// Skill a question exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Literal,
    Inferential,
    Critical,
    Applied,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Literal => write!(f, "literal"),
            QuestionType::Inferential => write!(f, "inferential"),
            QuestionType::Critical => write!(f, "critical"),
            QuestionType::Applied => write!(f, "applied"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "literal" => Ok(QuestionType::Literal),
            "inferential" | "inferencial" => Ok(QuestionType::Inferential),
            "critical" | "critica" | "crítica" => Ok(QuestionType::Critical),
            "applied" | "aplicada" | "aplicacion" | "aplicación" => Ok(QuestionType::Applied),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// The question a student answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub hint: Option<String>,
}

/// Input for the document (reading passage) analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAnalysisRequest {
    pub text: String,
    /// Whether to consult the claim-verification collaborator.
    #[serde(default)]
    pub verify: bool,
    /// Language hint forwarded to the claim-verification lookup.
    #[serde(default = "default_language_hint")]
    pub language_hint: String,
}

impl DocumentAnalysisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            verify: false,
            language_hint: default_language_hint(),
        }
    }

    pub fn with_verification(mut self) -> Self {
        self.verify = true;
        self
    }
}

fn default_language_hint() -> String {
    "es".to_string()
}

/// Input for the student-answer analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerAnalysisRequest {
    pub answer: String,
    #[serde(default)]
    pub question: Option<Question>,
    /// Reading the answer should draw on.
    #[serde(default)]
    pub source_text: Option<String>,
}

impl AnswerAnalysisRequest {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            question: None,
            source_text: None,
        }
    }

    pub fn with_question(mut self, question: Question) -> Self {
        self.question = Some(question);
        self
    }

    pub fn with_source(mut self, source_text: impl Into<String>) -> Self {
        self.source_text = Some(source_text.into());
        self
    }
}

/// The entity a stored finding set belongs to (e.g. a reading or an answer).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelatedEntity {
    pub kind: String,
    pub id: String,
}

impl RelatedEntity {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for RelatedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_display_and_parse() {
        assert_eq!(QuestionType::Critical.to_string(), "critical");
        assert_eq!(
            "inferencial".parse::<QuestionType>().unwrap(),
            QuestionType::Inferential
        );
        assert_eq!(
            "Crítica".parse::<QuestionType>().unwrap(),
            QuestionType::Critical
        );
        assert_eq!("applied".parse::<QuestionType>().unwrap(), QuestionType::Applied);
        assert!("essay".parse::<QuestionType>().is_err());
    }

    #[test]
    fn severity_is_ordered() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn finding_type_serializes_snake_case() {
        let finding = Finding::new(
            FindingType::InvalidResponse,
            Severity::Critical,
            0.9,
            "gibberish",
        )
        .with_score_impact(12.0);
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["type"], "invalid_response");
        assert_eq!(json["severity"], "critical");
        assert_eq!(json["score_impact"], 12.0);
        assert!(json.get("problematic_terms").is_none());
    }

    #[test]
    fn confidence_is_clamped() {
        let finding = Finding::new(FindingType::Polarization, Severity::Medium, 1.7, "x");
        assert_eq!(finding.confidence, 1.0);
    }
}
