use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity level for validation issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Issues at this level make a report fail
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Error | Severity::Critical)
    }
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
    pub location: Option<String>,
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            location: None,
            suggestion: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Which check produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    GapAnalysis,
    DesignValidation,
    ImplementationValidation,
}

/// Check-specific fields, flattened into the report JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValidationDetails {
    Gap {
        existing_implementations: Vec<String>,
        missing_requirements: Vec<String>,
        conflicting_implementations: Vec<String>,
    },
    Design {
        requirements_coverage: f64,
        missing_components: Vec<String>,
        design_completeness: f64,
    },
    Implementation {
        tasks_completed: usize,
        tasks_total: usize,
        completion_percentage: f64,
        incomplete_tasks: Vec<String>,
        test_coverage: Option<f64>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub validation_type: ValidationKind,
    pub feature_name: String,
    pub passed: bool,
    pub issues: Vec<ValidationIssue>,
    pub summary: String,
    pub validated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub details: ValidationDetails,
}

impl ValidationReport {
    /// Build a report; `passed` is derived from the issue list
    pub fn new(
        validation_type: ValidationKind,
        feature_name: impl Into<String>,
        issues: Vec<ValidationIssue>,
        summary: impl Into<String>,
        details: ValidationDetails,
    ) -> Self {
        let passed = !issues.iter().any(|i| i.severity.is_blocking());
        Self {
            validation_type,
            feature_name: feature_name.into(),
            passed,
            issues,
            summary: summary.into(),
            validated_at: Utc::now(),
            details,
        }
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity.is_blocking()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Info)
            .count()
    }
}
