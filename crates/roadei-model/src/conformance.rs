use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// A finding of the post-run quality checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcIssue {
    /// Check identifier (e.g., "QC002").
    pub code: String,
    pub message: String,
    pub severity: IssueSeverity,
    /// Table the finding applies to (e.g., "activityDetailed", "aggByScc_emis").
    pub table: String,
    /// Number of offending rows or columns.
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QcReport {
    pub scenario: String,
    pub issues: Vec<QcIssue>,
}

impl QcReport {
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            issues: Vec::new(),
        }
    }

    pub fn push(&mut self, issue: QcIssue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = QcIssue>) {
        self.issues.extend(issues);
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}
