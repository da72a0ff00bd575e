//! Analysis report types with JSON persistence and Markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Finding, FindingType};
use crate::statistics::{compute_statistics, FindingStatistics, QualityAssessment};

/// Which analyzer produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Document,
    Answer,
}

/// What happened with external claim verification for a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationStatus {
    /// The caller did not ask for verification (always the case for answers).
    NotRequested,
    /// The text has no numeric, statistical or attribution markers.
    NoVerifiableClaims,
    /// Verification could not run; only local findings are present.
    Unavailable { reason: String },
    /// Verification ran. Skipped sentences failed individually.
    Completed {
        sentences_checked: usize,
        sentences_skipped: usize,
    },
}

/// Findings for one analysis run plus their statistics and quality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub kind: ReportKind,
    pub findings: Vec<Finding>,
    pub statistics: FindingStatistics,
    pub quality: QualityAssessment,
    pub verification: VerificationStatus,
}

impl AnalysisReport {
    /// Build a report, deriving statistics and quality from `findings`.
    pub fn new(
        kind: ReportKind,
        findings: Vec<Finding>,
        quality: impl Fn(&[Finding]) -> QualityAssessment,
    ) -> Self {
        let statistics = compute_statistics(&findings);
        let quality = quality(&findings);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            kind,
            findings,
            statistics,
            quality,
            verification: VerificationStatus::NotRequested,
        }
    }

    /// Findings ordered by severity (critical first), then confidence
    /// descending. The sort is stable.
    pub fn sorted_findings(&self) -> Vec<&Finding> {
        let mut sorted: Vec<&Finding> = self.findings.iter().collect();
        sorted.sort_by(|a, b| {
            b.severity.cmp(&a.severity).then_with(|| {
                b.confidence
                    .partial_cmp(&a.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        });
        sorted
    }

    pub fn findings_of(&self, finding_type: FindingType) -> Vec<&Finding> {
        self.findings
            .iter()
            .filter(|f| f.finding_type == finding_type)
            .collect()
    }

    /// Distinct problematic terms across all findings, in first-seen order.
    pub fn problematic_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = Vec::new();
        for term in self.findings.iter().flat_map(|f| &f.problematic_terms) {
            if !terms.contains(term) {
                terms.push(term.clone());
            }
        }
        terms
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AnalysisReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Calidad:** {:.1} ({}). {}\n\n",
            self.quality.score, self.quality.level, self.quality.message
        ));

        if let VerificationStatus::Unavailable { reason } = &self.verification {
            md.push_str(&format!("_Verificación no disponible: {reason}_\n\n"));
        }

        if self.findings.is_empty() {
            md.push_str("Sin hallazgos.\n");
            return md;
        }

        md.push_str("| Tipo | Severidad | Confianza | Descripción | Sugerencia |\n");
        md.push_str("|------|-----------|-----------|-------------|------------|\n");
        for f in self.sorted_findings() {
            md.push_str(&format!(
                "| {} | {} | {:.0}% | {} | {} |\n",
                f.finding_type,
                f.severity,
                f.confidence * 100.0,
                f.description.replace('|', "\\|"),
                f.suggestion.replace('|', "\\|"),
            ));
        }
        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;
    use crate::statistics::{document_quality, QualityLevel};

    fn make_report() -> AnalysisReport {
        AnalysisReport::new(
            ReportKind::Document,
            vec![
                Finding::new(FindingType::Polarization, Severity::Medium, 0.72, "certeza"),
                Finding::new(FindingType::Generalization, Severity::High, 0.73, "absolutos")
                    .with_terms(vec!["todos".into(), "siempre".into()]),
                Finding::new(FindingType::AdHominem, Severity::High, 0.85, "ataque"),
            ],
            document_quality,
        )
    }

    #[test]
    fn statistics_and_quality_are_derived() {
        let report = make_report();
        assert_eq!(report.statistics.total, 3);
        // 100 - 15 - 15 - 8
        assert_eq!(report.quality.score, 62.0);
        assert_eq!(report.quality.level, QualityLevel::Acceptable);
        assert_eq!(report.verification, VerificationStatus::NotRequested);
    }

    #[test]
    fn sorted_by_severity_then_confidence() {
        let report = make_report();
        let order: Vec<FindingType> = report
            .sorted_findings()
            .iter()
            .map(|f| f.finding_type)
            .collect();
        assert_eq!(
            order,
            vec![
                FindingType::AdHominem,
                FindingType::Generalization,
                FindingType::Polarization
            ]
        );
    }

    #[test]
    fn collects_problematic_terms() {
        let report = make_report();
        assert_eq!(report.problematic_terms(), vec!["todos", "siempre"]);
        assert_eq!(report.findings_of(FindingType::AdHominem).len(), 1);
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = AnalysisReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.findings, report.findings);
        assert_eq!(loaded.statistics.total, 3);
        assert_eq!(loaded.quality.score, 62.0);
    }

    #[test]
    fn markdown_output() {
        let md = make_report().to_markdown();
        assert!(md.contains("ad_hominem"));
        assert!(md.contains("62.0"));

        let empty = AnalysisReport::new(ReportKind::Document, vec![], document_quality);
        assert!(empty.to_markdown().contains("Sin hallazgos"));
    }
}
