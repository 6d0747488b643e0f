//! Project root discovery and the `.kiro/` directory layout

use crate::error::{WorkflowError, WorkflowResult};
use std::path::{Path, PathBuf};

/// Files or directories whose presence marks a project root
pub const PROJECT_MARKERS: &[&str] = &[
    ".git",
    ".kiro",
    "pyproject.toml",
    "package.json",
    "Cargo.toml",
    "go.mod",
    "pom.xml",
];

pub const DEFAULT_CONTROL_DIR: &str = ".kiro";

/// Walk upward from `start` and return the first directory holding a marker
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| PROJECT_MARKERS.iter().any(|m| dir.join(m).exists()))
        .map(Path::to_path_buf)
}

/// Pick the project root: explicit argument, configured directory, discovery, then `cwd`.
pub fn resolve_project_root(
    explicit: Option<&str>,
    configured: Option<&Path>,
    cwd: &Path,
) -> PathBuf {
    if let Some(dir) = explicit.map(str::trim).filter(|d| !d.is_empty()) {
        return absolutize(Path::new(dir), cwd);
    }
    if let Some(dir) = configured {
        return absolutize(dir, cwd);
    }
    find_project_root(cwd).unwrap_or_else(|| cwd.to_path_buf())
}

fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Lowercase, trimmed, with spaces and underscores turned into hyphens
pub fn normalize_feature_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '_' { '-' } else { c })
        .collect()
}

/// Reject names that are blank or would escape the specs directory
pub fn validate_feature_name(name: &str) -> WorkflowResult<String> {
    let normalized = normalize_feature_name(name);
    if normalized.is_empty() {
        return Err(WorkflowError::InvalidInput(
            "feature_name must not be empty".to_string(),
        ));
    }
    if normalized.contains('/') || normalized.contains('\\') || normalized.contains("..") {
        return Err(WorkflowError::InvalidInput(format!(
            "feature_name '{}' must not contain path separators or '..'",
            name
        )));
    }
    Ok(normalized)
}

/// Derived locations under one project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
    control_dir_name: String,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>, control_dir_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            control_dir_name: control_dir_name.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn control_dir(&self) -> PathBuf {
        self.root.join(&self.control_dir_name)
    }

    pub fn steering_dir(&self) -> PathBuf {
        self.control_dir().join("steering")
    }

    pub fn specs_dir(&self) -> PathBuf {
        self.control_dir().join("specs")
    }

    /// Project-local template overrides
    pub fn templates_dir(&self) -> PathBuf {
        self.control_dir().join("templates")
    }

    pub fn spec_dir(&self, feature_name: &str) -> PathBuf {
        self.specs_dir().join(normalize_feature_name(feature_name))
    }

    pub fn metadata_file(&self, feature_name: &str) -> PathBuf {
        self.spec_dir(feature_name).join("metadata.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_feature_name() {
        assert_eq!(normalize_feature_name("User Auth"), "user-auth");
        assert_eq!(normalize_feature_name("  payment_flow v2 "), "payment-flow-v2");
    }

    #[test]
    fn test_validate_rejects_traversal() {
        assert!(validate_feature_name("   ").is_err());
        assert!(validate_feature_name("../etc").is_err());
        assert!(validate_feature_name("a/b").is_err());
        assert_eq!(validate_feature_name("Login Page").unwrap(), "login-page");
    }

    #[test]
    fn test_layout() {
        let paths = ProjectPaths::new("/proj", ".kiro");
        assert_eq!(paths.steering_dir(), PathBuf::from("/proj/.kiro/steering"));
        assert_eq!(
            paths.metadata_file("User Auth"),
            PathBuf::from("/proj/.kiro/specs/user-auth/metadata.json")
        );
        assert_eq!(paths.templates_dir(), PathBuf::from("/proj/.kiro/templates"));
    }

    #[test]
    fn test_find_project_root_walks_upward() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".kiro")).unwrap();
        let nested = temp.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_project_root(&nested).unwrap(), temp.path());
    }

    #[test]
    fn test_resolve_prefers_explicit() {
        let temp = TempDir::new().unwrap();
        let resolved = resolve_project_root(Some("sub"), Some(Path::new("/configured")), temp.path());
        assert_eq!(resolved, temp.path().join("sub"));

        let resolved = resolve_project_root(None, Some(Path::new("/configured")), temp.path());
        assert_eq!(resolved, PathBuf::from("/configured"));

        let resolved = resolve_project_root(Some("  "), None, temp.path());
        assert!(resolved.starts_with(temp.path()) || temp.path().starts_with(&resolved));
    }
}
