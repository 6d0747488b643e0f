//! Flat-file persistence for steering documents, spec metadata and phase artifacts
//!
//! Every call goes to the filesystem. There is no caching and no locking, so
//! two writers racing on the same feature resolve as last-writer-wins.

use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{
    SpecificationMetadata, SteeringDocument, SteeringFileType, SteeringStatus,
};
use crate::paths::{validate_feature_name, ProjectPaths};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    paths: ProjectPaths,
}

impl ArtifactStore {
    pub fn new(paths: ProjectPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    // ---- steering ----

    pub fn ensure_steering_dir(&self) -> WorkflowResult<PathBuf> {
        let dir = self.paths.steering_dir();
        std::fs::create_dir_all(&dir).map_err(|e| WorkflowError::io(&dir, e))?;
        Ok(dir)
    }

    pub fn read_steering(
        &self,
        file_type: SteeringFileType,
    ) -> WorkflowResult<Option<SteeringDocument>> {
        let path = self.paths.steering_dir().join(file_type.file_name());
        if !path.is_file() {
            return Ok(None);
        }
        read_steering_file(&path, file_type).map(Some)
    }

    pub fn write_steering(
        &self,
        file_type: SteeringFileType,
        content: &str,
    ) -> WorkflowResult<SteeringDocument> {
        if content.trim().is_empty() {
            return Err(WorkflowError::InvalidInput(
                "steering content must not be empty".to_string(),
            ));
        }
        let dir = self.ensure_steering_dir()?;
        let path = dir.join(file_type.file_name());
        std::fs::write(&path, content).map_err(|e| WorkflowError::io(&path, e))?;
        tracing::debug!("Wrote steering document {}", path.display());
        read_steering_file(&path, file_type)
    }

    /// All `*.md` files in the steering directory, sorted by path
    pub fn list_steering(&self) -> WorkflowResult<Vec<SteeringDocument>> {
        let dir = self.paths.steering_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(|e| WorkflowError::io(&dir, e))? {
            let path = entry.map_err(|e| WorkflowError::io(&dir, e))?.path();
            if path.is_file() && path.extension().map_or(false, |ext| ext == "md") {
                paths.push(path);
            }
        }
        paths.sort();

        paths
            .into_iter()
            .map(|path| {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                read_steering_file(&path, SteeringFileType::from_stem(&stem))
            })
            .collect()
    }

    pub fn steering_status(&self) -> WorkflowResult<SteeringStatus> {
        let steering_dir = self.paths.steering_dir();
        let documents = self.list_steering()?;

        let missing_defaults = SteeringFileType::DEFAULTS
            .iter()
            .filter(|t| !documents.iter().any(|d| d.file_type == **t))
            .copied()
            .collect();
        let last_updated = documents.iter().map(|d| d.last_modified).max();

        Ok(SteeringStatus {
            exists: steering_dir.is_dir(),
            steering_dir,
            documents,
            missing_defaults,
            last_updated,
        })
    }

    // ---- spec metadata ----

    pub fn metadata_exists(&self, feature_name: &str) -> bool {
        self.paths.metadata_file(feature_name).is_file()
    }

    pub fn create_spec_dir(&self, feature_name: &str) -> WorkflowResult<PathBuf> {
        let name = validate_feature_name(feature_name)?;
        let dir = self.paths.spec_dir(&name);
        std::fs::create_dir_all(&dir).map_err(|e| WorkflowError::io(&dir, e))?;
        Ok(dir)
    }

    pub fn read_metadata(&self, feature_name: &str) -> WorkflowResult<SpecificationMetadata> {
        let name = validate_feature_name(feature_name)?;
        let path = self.paths.metadata_file(&name);
        if !path.is_file() {
            return Err(WorkflowError::NotFound(format!(
                "Specification '{}' not found. Run spec_init first.",
                name
            )));
        }
        let content = std::fs::read_to_string(&path).map_err(|e| WorkflowError::io(&path, e))?;
        serde_json::from_str(&content).map_err(|e| WorkflowError::json(&path, e))
    }

    /// Persist metadata, refreshing `updated_at` so it never moves backwards
    pub fn write_metadata(&self, metadata: &mut SpecificationMetadata) -> WorkflowResult<PathBuf> {
        metadata.updated_at = Utc::now().max(metadata.updated_at);

        let dir = self.create_spec_dir(&metadata.feature_name)?;
        let path = dir.join("metadata.json");
        let content = serde_json::to_string_pretty(metadata)
            .map_err(|e| WorkflowError::json(&path, e))?;
        std::fs::write(&path, content).map_err(|e| WorkflowError::io(&path, e))?;
        Ok(path)
    }

    /// Features under the specs directory that carry a metadata file
    pub fn list_feature_names(&self) -> WorkflowResult<Vec<String>> {
        let dir = self.paths.specs_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(|e| WorkflowError::io(&dir, e))? {
            let path = entry.map_err(|e| WorkflowError::io(&dir, e))?.path();
            if path.is_dir() && path.join("metadata.json").is_file() {
                if let Some(name) = path.file_name() {
                    names.push(name.to_string_lossy().into_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    // ---- phase artifacts ----

    pub fn artifact_path(&self, feature_name: &str, file_name: &str) -> WorkflowResult<PathBuf> {
        let name = validate_feature_name(feature_name)?;
        if file_name.is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name.contains("..")
        {
            return Err(WorkflowError::InvalidInput(format!(
                "invalid artifact file name '{}'",
                file_name
            )));
        }
        Ok(self.paths.spec_dir(&name).join(file_name))
    }

    pub fn artifact_exists(&self, feature_name: &str, file_name: &str) -> bool {
        self.artifact_path(feature_name, file_name)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    pub fn read_artifact(
        &self,
        feature_name: &str,
        file_name: &str,
    ) -> WorkflowResult<Option<String>> {
        let path = self.artifact_path(feature_name, file_name)?;
        if !path.is_file() {
            return Ok(None);
        }
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| WorkflowError::io(&path, e))
    }

    pub fn write_artifact(
        &self,
        feature_name: &str,
        file_name: &str,
        content: &str,
    ) -> WorkflowResult<PathBuf> {
        let path = self.artifact_path(feature_name, file_name)?;
        self.create_spec_dir(feature_name)?;
        std::fs::write(&path, content).map_err(|e| WorkflowError::io(&path, e))?;
        tracing::debug!("Wrote artifact {}", path.display());
        Ok(path)
    }
}

fn read_steering_file(path: &Path, file_type: SteeringFileType) -> WorkflowResult<SteeringDocument> {
    let bytes = std::fs::read(path).map_err(|e| WorkflowError::io(path, e))?;
    // Steering is free-form user text, invalid bytes become U+FFFD
    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Steering file {} is not valid UTF-8, decoding lossily", path.display());
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| WorkflowError::io(path, e))?;

    Ok(SteeringDocument {
        file_type,
        file_path: path.to_path_buf(),
        content,
        last_modified: DateTime::<Utc>::from(modified),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpecPhase;
    use tempfile::TempDir;

    fn store(temp: &TempDir) -> ArtifactStore {
        ArtifactStore::new(ProjectPaths::new(temp.path(), ".kiro"))
    }

    #[test]
    fn test_missing_metadata_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = store(&temp).read_metadata("ghost").unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
        assert!(err.to_string().contains("spec_init"));
    }

    #[test]
    fn test_metadata_round_trip_refreshes_updated_at() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let mut meta = SpecificationMetadata::new("feature-a", "desc");
        meta.current_phase = SpecPhase::Design;
        meta.approved_phases.insert(SpecPhase::Requirements);
        let before = meta.updated_at;

        store.write_metadata(&mut meta).unwrap();
        let loaded = store.read_metadata("feature-a").unwrap();

        assert_eq!(loaded.feature_name, meta.feature_name);
        assert_eq!(loaded.current_phase, SpecPhase::Design);
        assert_eq!(loaded.approved_phases, meta.approved_phases);
        assert_eq!(loaded.created_at, meta.created_at);
        assert!(loaded.updated_at >= before);
    }

    #[test]
    fn test_corrupt_metadata_is_fault() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let dir = store.create_spec_dir("broken").unwrap();
        std::fs::write(dir.join("metadata.json"), "{ not json").unwrap();

        let err = store.read_metadata("broken").unwrap_err();
        assert!(!err.is_domain());
    }

    #[test]
    fn test_steering_write_and_list() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        assert!(store.list_steering().unwrap().is_empty());
        assert!(store.write_steering(SteeringFileType::Tech, "  ").is_err());

        store.write_steering(SteeringFileType::Tech, "# Tech").unwrap();
        std::fs::write(store.paths().steering_dir().join("security.md"), "# Sec").unwrap();

        let docs = store.list_steering().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].file_type, SteeringFileType::Custom);
        assert_eq!(docs[1].file_type, SteeringFileType::Tech);

        let status = store.steering_status().unwrap();
        assert!(status.exists);
        assert_eq!(
            status.missing_defaults,
            vec![SteeringFileType::Product, SteeringFileType::Structure]
        );
        assert!(status.last_updated.is_some());
    }

    #[test]
    fn test_steering_status_before_dir_exists() {
        let temp = TempDir::new().unwrap();
        let status = store(&temp).steering_status().unwrap();
        assert!(!status.exists);
        assert_eq!(status.missing_defaults.len(), 3);
        assert!(status.last_updated.is_none());
    }

    #[test]
    fn test_steering_status_empty_dir() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.ensure_steering_dir().unwrap();

        let status = store.steering_status().unwrap();
        assert!(status.exists);
        assert!(status.documents.is_empty());
        assert_eq!(
            status.missing_defaults,
            vec![
                SteeringFileType::Product,
                SteeringFileType::Tech,
                SteeringFileType::Structure
            ]
        );
        assert!(status.last_updated.is_none());
    }

    #[test]
    fn test_non_utf8_steering_is_decoded_lossily() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let dir = store.ensure_steering_dir().unwrap();
        std::fs::write(dir.join("notes.md"), [0x4e, 0xff, 0xfe, 0x41]).unwrap();

        let documents = store.list_steering().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].content, "N\u{fffd}\u{fffd}A");
        assert!(store.steering_status().unwrap().exists);
    }

    #[test]
    fn test_artifacts() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        assert!(!store.artifact_exists("feat", "requirements.md"));
        assert_eq!(store.read_artifact("feat", "requirements.md").unwrap(), None);

        store.write_artifact("feat", "requirements.md", "# R").unwrap();
        assert!(store.artifact_exists("feat", "requirements.md"));
        assert_eq!(
            store.read_artifact("feat", "requirements.md").unwrap().as_deref(),
            Some("# R")
        );
        assert!(store.write_artifact("feat", "../escape.md", "x").is_err());
    }

    #[test]
    fn test_list_feature_names_requires_metadata() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store.create_spec_dir("orphan").unwrap();
        store.write_metadata(&mut SpecificationMetadata::new("beta", "b")).unwrap();
        store.write_metadata(&mut SpecificationMetadata::new("alpha", "a")).unwrap();

        assert_eq!(store.list_feature_names().unwrap(), vec!["alpha", "beta"]);
    }
}
