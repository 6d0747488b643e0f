use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Phases of the spec lifecycle, declared in lifecycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecPhase {
    Initialized,
    Requirements,
    Design,
    Tasks,
    Implementation,
    Completed,
}

impl SpecPhase {
    pub const ALL: [SpecPhase; 6] = [
        SpecPhase::Initialized,
        SpecPhase::Requirements,
        SpecPhase::Design,
        SpecPhase::Tasks,
        SpecPhase::Implementation,
        SpecPhase::Completed,
    ];

    /// Phases that produce a document via a generation tool
    pub const GENERATION: [SpecPhase; 3] =
        [SpecPhase::Requirements, SpecPhase::Design, SpecPhase::Tasks];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecPhase::Initialized => "initialized",
            SpecPhase::Requirements => "requirements",
            SpecPhase::Design => "design",
            SpecPhase::Tasks => "tasks",
            SpecPhase::Implementation => "implementation",
            SpecPhase::Completed => "completed",
        }
    }

    pub fn previous(&self) -> Option<SpecPhase> {
        let idx = Self::ALL.iter().position(|p| p == self)?;
        idx.checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn is_generation_phase(&self) -> bool {
        Self::GENERATION.contains(self)
    }

    /// Canonical artifact file written when this phase is generated
    pub fn artifact_file(&self) -> Option<&'static str> {
        match self {
            SpecPhase::Requirements => Some("requirements.md"),
            SpecPhase::Design => Some("design.md"),
            SpecPhase::Tasks => Some("tasks.md"),
            _ => None,
        }
    }
}

impl fmt::Display for SpecPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|p| p.as_str() == lower)
            .copied()
            .ok_or_else(|| format!("Unknown phase '{}'", s))
    }
}

/// Persisted per-feature metadata (`metadata.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationMetadata {
    pub feature_name: String,
    pub description: String,
    #[serde(default = "default_phase")]
    pub current_phase: SpecPhase,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub approved_phases: BTreeSet<SpecPhase>,
}

fn default_phase() -> SpecPhase {
    SpecPhase::Initialized
}

impl SpecificationMetadata {
    /// Fresh metadata in the Initialized phase. `feature_name` must already be normalized.
    pub fn new(feature_name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            feature_name: feature_name.into(),
            description: description.into(),
            current_phase: SpecPhase::Initialized,
            created_at: now,
            updated_at: now,
            approved_phases: BTreeSet::new(),
        }
    }

    pub fn is_approved(&self, phase: SpecPhase) -> bool {
        self.approved_phases.contains(&phase)
    }

    /// Ordered list for display and JSON responses
    pub fn approved_list(&self) -> Vec<SpecPhase> {
        self.approved_phases.iter().copied().collect()
    }
}

/// Presence flags for the three phase documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPresence {
    pub requirements: bool,
    pub design: bool,
    pub tasks: bool,
}

impl ArtifactPresence {
    pub fn get(&self, phase: SpecPhase) -> bool {
        match phase {
            SpecPhase::Requirements => self.requirements,
            SpecPhase::Design => self.design,
            SpecPhase::Tasks => self.tasks,
            _ => false,
        }
    }
}

/// Read-only status report for one feature
#[derive(Debug, Clone, Serialize)]
pub struct SpecStatus {
    pub feature_name: String,
    pub description: String,
    pub current_phase: SpecPhase,
    pub approved_phases: Vec<SpecPhase>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub files: ArtifactPresence,
    pub spec_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action: Option<String>,
}

/// One line of `spec_list`
#[derive(Debug, Clone, Serialize)]
pub struct SpecSummary {
    pub feature_name: String,
    pub current_phase: SpecPhase,
    pub approved_phases: Vec<SpecPhase>,
    pub updated_at: DateTime<Utc>,
}
