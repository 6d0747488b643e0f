//! Error taxonomy for the specification workflow
//!
//! Domain errors (not found, wrong phase, missing approval, template problems,
//! bad input, conflicts) are expected outcomes and are reported to callers as
//! structured failures. `Io` and `Json` are faults and propagate.

use crate::models::specification::SpecPhase;
use std::path::PathBuf;

pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{0}")]
    NotFound(String),

    #[error("Cannot generate {target} in phase: {current}")]
    Phase { target: SpecPhase, current: SpecPhase },

    #[error(
        "{required} must be approved before generating {target}. \
         Please review and approve {required} first, or use auto_approve=true"
    )]
    ApprovalRequired { required: SpecPhase, target: SpecPhase },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl WorkflowError {
    /// Expected domain condition, as opposed to an I/O or parse fault
    pub fn is_domain(&self) -> bool {
        !matches!(self, WorkflowError::Io { .. } | WorkflowError::Json { .. })
    }

    /// Stable machine-readable kind, used in structured failure payloads
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::NotFound(_) => "not_found",
            WorkflowError::Phase { .. } => "phase_error",
            WorkflowError::ApprovalRequired { .. } => "approval_required",
            WorkflowError::Template(TemplateError::NotFound { .. }) => "template_not_found",
            WorkflowError::Template(TemplateError::Render(_)) => "template_render_failed",
            WorkflowError::InvalidInput(_) => "invalid_input",
            WorkflowError::Conflict(_) => "conflict",
            WorkflowError::Io { .. } => "io_error",
            WorkflowError::Json { .. } => "json_error",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WorkflowError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        WorkflowError::Json {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template not found: {category}/{name}")]
    NotFound { category: String, name: String },

    #[error("Template rendering failed: {0}")]
    Render(String),
}

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        // `{:#}` includes the line/column detail minijinja attaches
        TemplateError::Render(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_error_names_current_phase() {
        let err = WorkflowError::Phase {
            target: SpecPhase::Design,
            current: SpecPhase::Initialized,
        };
        assert_eq!(err.to_string(), "Cannot generate design in phase: initialized");
        assert!(err.is_domain());
    }

    #[test]
    fn test_approval_error_mentions_bypass() {
        let err = WorkflowError::ApprovalRequired {
            required: SpecPhase::Requirements,
            target: SpecPhase::Design,
        };
        let msg = err.to_string();
        assert!(msg.contains("requirements must be approved"));
        assert!(msg.contains("auto_approve"));
        assert_eq!(err.kind(), "approval_required");
    }

    #[test]
    fn test_template_errors_are_distinguishable() {
        let missing: WorkflowError = TemplateError::NotFound {
            category: "specs".into(),
            name: "design".into(),
        }
        .into();
        let broken: WorkflowError = TemplateError::Render("unexpected end".into()).into();

        assert!(missing.to_string().contains("not found"));
        assert!(broken.to_string().contains("rendering failed"));
        assert_ne!(missing.kind(), broken.kind());
    }

    #[test]
    fn test_io_is_fault() {
        let err = WorkflowError::io(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_domain());
    }
}
