pub mod specification;
pub mod steering;
pub mod validation;

pub use specification::{
    ArtifactPresence, SpecPhase, SpecStatus, SpecSummary, SpecificationMetadata,
};
pub use steering::{SteeringDocument, SteeringFileType, SteeringStatus};
pub use validation::{
    Severity, ValidationDetails, ValidationIssue, ValidationKind, ValidationReport,
};
