//! Default steering document creation

use crate::error::WorkflowResult;
use crate::models::SteeringFileType;
use crate::store::ArtifactStore;
use crate::templates::{self, TemplateCategory, TemplateResolver};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SteeringInit {
    pub files_created: Vec<PathBuf>,
    pub files_skipped: Vec<PathBuf>,
}

/// Write product/tech/structure from templates, leaving existing files alone.
///
/// Every missing document is rendered before the first one is written, so a
/// broken template leaves the steering directory untouched.
pub fn init_default_steering(
    store: &ArtifactStore,
    resolver: &TemplateResolver,
    language: &str,
) -> WorkflowResult<SteeringInit> {
    let dir = store.paths().steering_dir();
    let project_name = store
        .paths()
        .root()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let context = json!({
        "project_name": project_name,
        "language": language,
    });

    let mut outcome = SteeringInit::default();
    let mut pending = Vec::new();
    for file_type in SteeringFileType::DEFAULTS {
        let path = dir.join(file_type.file_name());
        if path.exists() {
            outcome.files_skipped.push(path);
            continue;
        }

        let template = resolver
            .resolve(TemplateCategory::Steering, file_type.as_str(), language)?
            .map(|t| t.content)
            .unwrap_or_else(|| format!("# {}\n", file_type));
        pending.push((file_type, templates::render(&template, &context)?));
    }

    store.ensure_steering_dir()?;
    for (file_type, content) in pending {
        let doc = store.write_steering(file_type, &content)?;
        tracing::info!("Created steering document {}", doc.file_path.display());
        outcome.files_created.push(doc.file_path);
    }

    Ok(outcome)
}
