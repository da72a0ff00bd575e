//! Document Bias Analyzer: runs the Pattern Library over a reading passage
//! and scores it on the 0–100 document scale.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Finding;
use crate::patterns::PatternLibrary;
use crate::report::{AnalysisReport, ReportKind, VerificationStatus};
use crate::statistics::document_quality;

/// Percentages, years, "estudio de", "datos de", attributions.
static VERIFIABLE_CLAIM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\d+(?:[.,]\d+)?\s?%|\bpor\s+ciento\b|\b(?:19|20)\d{2}\b|\bestudios?\s+de\b|\bdatos\s+de\b|\bsegún\b|\bde\s+acuerdo\s+con\b",
    )
    .expect("valid verifiable-claim regex")
});

/// Returns `true` if the text contains markers worth sending to the
/// claim-verification collaborator.
pub fn has_verifiable_claims(text: &str) -> bool {
    VERIFIABLE_CLAIM_RE.is_match(text)
}

/// Analyzer for standalone documents.
#[derive(Default)]
pub struct DocumentAnalyzer {
    library: PatternLibrary,
}

impl DocumentAnalyzer {
    pub fn new(library: PatternLibrary) -> Self {
        Self { library }
    }

    /// Local pattern findings only.
    pub fn local_findings(&self, text: &str) -> Vec<Finding> {
        self.library.analyze(text)
    }

    /// Analyze without external verification.
    pub fn analyze(&self, text: &str) -> AnalysisReport {
        let findings = self.local_findings(text);
        tracing::debug!(findings = findings.len(), "document analyzed");
        build_document_report(findings, VerificationStatus::NotRequested)
    }
}

/// Assemble the final document report from local and verification findings.
pub fn build_document_report(
    findings: Vec<Finding>,
    verification: VerificationStatus,
) -> AnalysisReport {
    let mut report = AnalysisReport::new(ReportKind::Document, findings, document_quality);
    report.verification = verification;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FindingType;
    use crate::statistics::QualityLevel;

    #[test]
    fn clean_document_is_excellent() {
        let analyzer = DocumentAnalyzer::default();
        let report = analyzer.analyze(
            "Según el informe del ministerio, la matrícula creció durante la última década.",
        );
        assert!(report.findings.is_empty());
        assert_eq!(report.quality.score, 100.0);
        assert_eq!(report.quality.level, QualityLevel::Excellent);
        assert_eq!(report.kind, ReportKind::Document);
    }

    #[test]
    fn biased_document_is_penalized() {
        let analyzer = DocumentAnalyzer::default();
        let report = analyzer.analyze(
            "Todos los políticos son corruptos. Obviamente nadie honesto llega al poder.",
        );
        assert!(!report.findings_of(FindingType::Generalization).is_empty());
        assert!(!report.findings_of(FindingType::AdHominem).is_empty());
        assert!(!report.findings_of(FindingType::Polarization).is_empty());
        // high + high + medium
        assert_eq!(report.quality.score, 62.0);
    }

    #[test]
    fn detects_verifiable_claims() {
        assert!(has_verifiable_claims("El 45% de los alumnos aprobó."));
        assert!(has_verifiable_claims("En 2019 se aprobó la ley."));
        assert!(has_verifiable_claims("Un estudio de Harvard lo confirma."));
        assert!(has_verifiable_claims("Según la OMS, es seguro."));
        assert!(!has_verifiable_claims("Me gusta leer por la tarde."));
    }
}
