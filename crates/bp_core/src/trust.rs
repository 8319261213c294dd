use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustState {
    Trusted,
    Untrusted,
    Corrupt,
}

impl TrustState {
    pub fn display_text(self) -> &'static str {
        match self {
            TrustState::Trusted => "Trusted",
            TrustState::Untrusted => "Untrusted",
            TrustState::Corrupt => "Corrupt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustReport {
    pub state: TrustState,
    pub summary: String,
    pub evaluated_at_ms: i64,
}

impl TrustReport {
    pub fn corrupt(reason: &str, now_ms: i64) -> Self {
        Self {
            state: TrustState::Corrupt,
            summary: format!("Workspace load failed: {reason}"),
            evaluated_at_ms: now_ms,
        }
    }
}

/// Collects per-document verification outcomes of one workspace load and
/// reduces them to a single [`TrustReport`].
#[derive(Debug, Clone, Default)]
pub struct TrustAccumulator {
    total_documents: usize,
    invalid_documents: Vec<PathBuf>,
}

impl TrustAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, document_path: &Path, is_signature_valid: bool) {
        self.total_documents += 1;
        if !is_signature_valid {
            self.invalid_documents.push(document_path.to_path_buf());
        }
    }

    pub fn total_documents(&self) -> usize {
        self.total_documents
    }

    pub fn invalid_documents(&self) -> &[PathBuf] {
        &self.invalid_documents
    }

    pub fn finish(&self, now_ms: i64) -> TrustReport {
        if self.invalid_documents.is_empty() {
            TrustReport {
                state: TrustState::Trusted,
                summary: format!("Validated {} signed documents.", self.total_documents),
                evaluated_at_ms: now_ms,
            }
        } else {
            TrustReport {
                state: TrustState::Untrusted,
                summary: format!(
                    "Validated {} signed documents with {} invalid signatures.",
                    self.total_documents,
                    self.invalid_documents.len()
                ),
                evaluated_at_ms: now_ms,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_invalid_document_makes_the_report_untrusted() {
        let mut acc = TrustAccumulator::new();
        acc.record(Path::new("project/project.json"), true);
        acc.record(Path::new("project/members.json"), false);
        let report = acc.finish(10);
        assert_eq!(report.state, TrustState::Untrusted);
        assert_eq!(report.evaluated_at_ms, 10);
        assert!(report.summary.contains("1 invalid"));
    }

    #[test]
    fn empty_accumulator_is_trusted() {
        let report = TrustAccumulator::new().finish(1);
        assert_eq!(report.state, TrustState::Trusted);
    }
}
