use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Kinds of project steering documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SteeringFileType {
    Product,
    Tech,
    Structure,
    Custom,
}

impl SteeringFileType {
    /// Documents every project is expected to carry
    pub const DEFAULTS: [SteeringFileType; 3] = [
        SteeringFileType::Product,
        SteeringFileType::Tech,
        SteeringFileType::Structure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SteeringFileType::Product => "product",
            SteeringFileType::Tech => "tech",
            SteeringFileType::Structure => "structure",
            SteeringFileType::Custom => "custom",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.md", self.as_str())
    }

    /// Classify a file stem; anything unrecognized is a custom document
    pub fn from_stem(stem: &str) -> Self {
        stem.parse().unwrap_or(SteeringFileType::Custom)
    }
}

impl fmt::Display for SteeringFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SteeringFileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "product" => Ok(SteeringFileType::Product),
            "tech" => Ok(SteeringFileType::Tech),
            "structure" => Ok(SteeringFileType::Structure),
            "custom" => Ok(SteeringFileType::Custom),
            _ => Err(format!(
                "Invalid file name '{}'. Valid: product, tech, structure, custom",
                s
            )),
        }
    }
}

/// A steering document as read from disk
#[derive(Debug, Clone, Serialize)]
pub struct SteeringDocument {
    pub file_type: SteeringFileType,
    pub file_path: PathBuf,
    pub content: String,
    pub last_modified: DateTime<Utc>,
}

/// Snapshot of the steering directory
#[derive(Debug, Clone, Serialize)]
pub struct SteeringStatus {
    pub exists: bool,
    pub steering_dir: PathBuf,
    pub documents: Vec<SteeringDocument>,
    pub missing_defaults: Vec<SteeringFileType>,
    pub last_updated: Option<DateTime<Utc>>,
}
