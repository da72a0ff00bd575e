//! Finding statistics and the two quality formulas.
//!
//! Documents are scored on a 0–100 scale and student answers on a 0–12
//! scale. The formulas use different penalty weights and stay separate.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Finding, FindingType, Severity};

/// Tallies over one batch of findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingStatistics {
    pub total: usize,
    pub by_type: BTreeMap<FindingType, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    /// Mean confidence; `0.0` when there are no findings.
    pub average_confidence: f64,
    /// Most frequent type; ties resolve to the first type in declaration order.
    pub most_common_type: Option<FindingType>,
}

/// Compute statistics for a batch of findings.
pub fn compute_statistics(findings: &[Finding]) -> FindingStatistics {
    let mut by_type: BTreeMap<FindingType, usize> = BTreeMap::new();
    let mut by_severity: BTreeMap<Severity, usize> = BTreeMap::new();
    for f in findings {
        *by_type.entry(f.finding_type).or_insert(0) += 1;
        *by_severity.entry(f.severity).or_insert(0) += 1;
    }

    let average_confidence = if findings.is_empty() {
        0.0
    } else {
        findings.iter().map(|f| f.confidence).sum::<f64>() / findings.len() as f64
    };

    let mut most_common_type = None;
    let mut best = 0usize;
    for (t, &count) in &by_type {
        if count > best {
            best = count;
            most_common_type = Some(*t);
        }
    }

    FindingStatistics {
        total: findings.len(),
        by_type,
        by_severity,
        average_confidence,
        most_common_type,
    }
}

/// Qualitative bucket derived from a numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Excellent,
    Good,
    Acceptable,
    NeedsImprovement,
    Problematic,
    Insufficient,
    Invalid,
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QualityLevel::Excellent => "excellent",
            QualityLevel::Good => "good",
            QualityLevel::Acceptable => "acceptable",
            QualityLevel::NeedsImprovement => "needs_improvement",
            QualityLevel::Problematic => "problematic",
            QualityLevel::Insufficient => "insufficient",
            QualityLevel::Invalid => "invalid",
        };
        f.write_str(s)
    }
}

/// Score, level and a fixed message for that level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub score: f64,
    pub level: QualityLevel,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Document formula (0–100)
// ---------------------------------------------------------------------------

pub const DOCUMENT_MAX_SCORE: f64 = 100.0;

fn document_penalty(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 25.0,
        Severity::High => 15.0,
        Severity::Medium => 8.0,
        Severity::Low => 3.0,
    }
}

/// Penalty-adjusted quality of a reading passage.
pub fn document_quality(findings: &[Finding]) -> QualityAssessment {
    if findings.is_empty() {
        return QualityAssessment {
            score: DOCUMENT_MAX_SCORE,
            level: QualityLevel::Excellent,
            message: "No se detectaron sesgos ni debilidades argumentativas. Texto de excelente calidad."
                .to_string(),
        };
    }

    let penalty: f64 = findings.iter().map(|f| document_penalty(f.severity)).sum();
    let score = (DOCUMENT_MAX_SCORE - penalty).max(0.0);

    let (level, message) = if score >= 90.0 {
        (
            QualityLevel::Excellent,
            "Excelente: el texto presenta solo detalles menores.",
        )
    } else if score >= 75.0 {
        (
            QualityLevel::Good,
            "Bueno: algunas afirmaciones podrían matizarse o respaldarse mejor.",
        )
    } else if score >= 60.0 {
        (
            QualityLevel::Acceptable,
            "Aceptable: hay sesgos que conviene revisar antes de usar el texto.",
        )
    } else if score >= 40.0 {
        (
            QualityLevel::NeedsImprovement,
            "Necesita mejorar: varios sesgos afectan la objetividad del texto.",
        )
    } else {
        (
            QualityLevel::Problematic,
            "Problemático: el texto presenta sesgos graves y no debería usarse sin revisión.",
        )
    };

    QualityAssessment {
        score,
        level,
        message: message.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Answer formula (0–12)
// ---------------------------------------------------------------------------

pub const ANSWER_MAX_SCORE: f64 = 12.0;
const ANSWER_ANY_FINDING_PENALTY: f64 = 0.5;

fn answer_default_penalty(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 12.0,
        Severity::High => 4.0,
        Severity::Medium => 2.5,
        Severity::Low => 1.0,
    }
}

/// Raw 0–12 score of a student answer, rounded to one decimal.
pub fn answer_score(findings: &[Finding]) -> f64 {
    if findings.is_empty() {
        return ANSWER_MAX_SCORE;
    }
    let penalty: f64 = findings
        .iter()
        .map(|f| {
            f.score_impact
                .unwrap_or_else(|| answer_default_penalty(f.severity))
                .max(0.0)
        })
        .sum::<f64>()
        + ANSWER_ANY_FINDING_PENALTY;

    let score = (ANSWER_MAX_SCORE - penalty).max(0.0);
    (score * 10.0).round() / 10.0
}

/// Quality of a student answer on the 0–12 scale.
pub fn answer_quality(findings: &[Finding]) -> QualityAssessment {
    let score = answer_score(findings);

    let (level, message) = if score <= 0.0 {
        (
            QualityLevel::Invalid,
            "Respuesta inválida: no responde a la pregunta o no es un texto comprensible.",
        )
    } else if score >= 10.0 {
        (
            QualityLevel::Excellent,
            "Excelente: respuesta bien argumentada y alineada con la pregunta.",
        )
    } else if score >= 8.0 {
        (
            QualityLevel::Good,
            "Buena respuesta, con aspectos puntuales por mejorar.",
        )
    } else if score >= 6.0 {
        (
            QualityLevel::Acceptable,
            "Aceptable: la respuesta cumple lo básico pero le falta profundidad.",
        )
    } else if score >= 4.0 {
        (
            QualityLevel::NeedsImprovement,
            "Necesita mejorar: revisa la argumentación y el uso del texto fuente.",
        )
    } else {
        (
            QualityLevel::Insufficient,
            "Insuficiente: la respuesta no demuestra la habilidad evaluada.",
        )
    };

    QualityAssessment {
        score,
        level,
        message: message.to_string(),
    }
}
