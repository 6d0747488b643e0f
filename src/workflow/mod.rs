//! Phase state machine for feature specifications
//!
//! A feature moves through `initialized → requirements → design → tasks`.
//! Generating a phase document is allowed while the feature sits in the
//! preceding phase (entry) or in that phase already (regeneration). Entering
//! design or tasks additionally needs the preceding phase approved unless the
//! caller passes `auto_approve`. Every check runs before anything is written,
//! and metadata is persisted last.

pub mod context;
pub mod steering;

use crate::config::ServerConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{ArtifactPresence, SpecPhase, SpecStatus, SpecSummary, SpecificationMetadata};
use crate::paths::validate_feature_name;
use crate::store::ArtifactStore;
use crate::templates::{self, TemplateCategory, TemplateResolver, TemplateSource};
use std::path::PathBuf;

pub use steering::{init_default_steering, SteeringInit};

#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub language: String,
    /// When false the approval gate is skipped; the phase window still applies
    pub strict_phase_gates: bool,
    pub auto_create_steering: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            strict_phase_gates: true,
            auto_create_steering: false,
        }
    }
}

impl WorkflowOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            language: config.default_language.clone(),
            strict_phase_gates: config.strict_phase_gates,
            auto_create_steering: config.auto_create_steering,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InitOutcome {
    pub metadata: SpecificationMetadata,
    pub spec_dir: PathBuf,
    /// False when an identical spec already existed
    pub created: bool,
    pub steering_created: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct GeneratedArtifact {
    pub phase: SpecPhase,
    pub feature_name: String,
    pub file: PathBuf,
    pub current_phase: SpecPhase,
    pub auto_approved: bool,
    pub template_source: TemplateSource,
}

#[derive(Debug)]
pub enum GenerationOutcome {
    Generated(GeneratedArtifact),
    /// A domain rule stopped the generation; nothing was written
    Blocked {
        error: WorkflowError,
        current_phase: Option<SpecPhase>,
    },
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Generated(_))
    }
}

pub struct SpecWorkflow {
    store: ArtifactStore,
    templates: TemplateResolver,
    options: WorkflowOptions,
}

impl SpecWorkflow {
    pub fn new(store: ArtifactStore, templates: TemplateResolver, options: WorkflowOptions) -> Self {
        Self {
            store,
            templates,
            options,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn init(&self, feature_name: &str, description: &str) -> WorkflowResult<InitOutcome> {
        if description.trim().is_empty() {
            return Err(WorkflowError::InvalidInput(
                "description must not be empty".to_string(),
            ));
        }
        let name = validate_feature_name(feature_name)?;
        let description = description.trim();

        if self.store.metadata_exists(&name) {
            let existing = self.store.read_metadata(&name)?;
            if existing.description != description {
                return Err(WorkflowError::Conflict(format!(
                    "Specification '{}' already exists with a different description \
                     (current phase: {}). Choose another feature name.",
                    name, existing.current_phase
                )));
            }
            tracing::info!("Specification '{}' already initialized", name);
            return Ok(InitOutcome {
                spec_dir: self.store.paths().spec_dir(&name),
                metadata: existing,
                created: false,
                steering_created: Vec::new(),
            });
        }

        // Steering goes first so a template failure leaves no half-initialized spec
        let steering_created = if self.options.auto_create_steering {
            init_default_steering(&self.store, &self.templates, &self.options.language)?
                .files_created
        } else {
            Vec::new()
        };

        let spec_dir = self.store.create_spec_dir(&name)?;
        let mut metadata = SpecificationMetadata::new(name.clone(), description);
        self.store.write_metadata(&mut metadata)?;
        tracing::info!("Initialized specification '{}'", name);

        Ok(InitOutcome {
            metadata,
            spec_dir,
            created: true,
            steering_created,
        })
    }

    pub fn generate_requirements(
        &self,
        feature_name: &str,
        auto_approve: bool,
    ) -> WorkflowResult<GenerationOutcome> {
        self.generate(SpecPhase::Requirements, feature_name, auto_approve)
    }

    pub fn generate_design(
        &self,
        feature_name: &str,
        auto_approve: bool,
    ) -> WorkflowResult<GenerationOutcome> {
        self.generate(SpecPhase::Design, feature_name, auto_approve)
    }

    pub fn generate_tasks(
        &self,
        feature_name: &str,
        auto_approve: bool,
    ) -> WorkflowResult<GenerationOutcome> {
        self.generate(SpecPhase::Tasks, feature_name, auto_approve)
    }

    /// Generate the document for `phase`. Domain failures come back as
    /// `Blocked`; I/O and JSON faults are returned as errors.
    pub fn generate(
        &self,
        phase: SpecPhase,
        feature_name: &str,
        auto_approve: bool,
    ) -> WorkflowResult<GenerationOutcome> {
        let mut current_phase = None;
        match self.try_generate(phase, feature_name, auto_approve, &mut current_phase) {
            Ok(artifact) => Ok(GenerationOutcome::Generated(artifact)),
            Err(error) if error.is_domain() => {
                tracing::warn!("Generation of {} for '{}' blocked: {}", phase, feature_name, error);
                Ok(GenerationOutcome::Blocked {
                    error,
                    current_phase,
                })
            }
            Err(error) => Err(error),
        }
    }

    fn try_generate(
        &self,
        phase: SpecPhase,
        feature_name: &str,
        auto_approve: bool,
        current_phase: &mut Option<SpecPhase>,
    ) -> WorkflowResult<GeneratedArtifact> {
        let (true, Some(previous), Some(file_name)) = (
            phase.is_generation_phase(),
            phase.previous(),
            phase.artifact_file(),
        ) else {
            return Err(WorkflowError::InvalidInput(format!(
                "'{}' is not a document generation phase",
                phase
            )));
        };

        let mut metadata = self.store.read_metadata(feature_name)?;
        let current = metadata.current_phase;
        *current_phase = Some(current);

        if current != previous && current != phase {
            return Err(WorkflowError::Phase {
                target: phase,
                current,
            });
        }

        let entering = current == previous;
        let gated = phase != SpecPhase::Requirements && self.options.strict_phase_gates;
        if entering && gated && !auto_approve && !metadata.is_approved(previous) {
            return Err(WorkflowError::ApprovalRequired {
                required: previous,
                target: phase,
            });
        }

        let steering = self.store.list_steering()?;
        let ctx = context::build(phase, &metadata, &context::steering_context(&steering));
        let template = self.templates.require(TemplateCategory::Specs, phase.as_str())?;
        let rendered = templates::render(&template.content, &ctx)?;

        let file = self
            .store
            .write_artifact(&metadata.feature_name, file_name, &rendered)?;

        metadata.current_phase = phase;
        if auto_approve {
            metadata.approved_phases.insert(phase);
        }
        self.store.write_metadata(&mut metadata)?;

        tracing::info!(
            "Generated {} for '{}' ({:?} template)",
            file_name,
            metadata.feature_name,
            template.source
        );

        Ok(GeneratedArtifact {
            phase,
            feature_name: metadata.feature_name,
            file,
            current_phase: phase,
            auto_approved: auto_approve,
            template_source: template.source,
        })
    }

    pub fn get_status(&self, feature_name: &str) -> WorkflowResult<SpecStatus> {
        let metadata = self.store.read_metadata(feature_name)?;
        let name = &metadata.feature_name;

        let files = ArtifactPresence {
            requirements: self.store.artifact_exists(name, "requirements.md"),
            design: self.store.artifact_exists(name, "design.md"),
            tasks: self.store.artifact_exists(name, "tasks.md"),
        };

        Ok(SpecStatus {
            next_action: next_action(&metadata, &files),
            spec_dir: self.store.paths().spec_dir(name),
            feature_name: metadata.feature_name.clone(),
            description: metadata.description.clone(),
            current_phase: metadata.current_phase,
            approved_phases: metadata.approved_list(),
            created_at: metadata.created_at,
            updated_at: metadata.updated_at,
            files,
        })
    }

    /// Summaries of every initialized feature. Unreadable metadata is skipped.
    pub fn list_specs(&self) -> WorkflowResult<Vec<SpecSummary>> {
        let mut specs = Vec::new();
        for name in self.store.list_feature_names()? {
            match self.store.read_metadata(&name) {
                Ok(meta) => specs.push(SpecSummary {
                    approved_phases: meta.approved_list(),
                    feature_name: meta.feature_name,
                    current_phase: meta.current_phase,
                    updated_at: meta.updated_at,
                }),
                Err(e) => tracing::warn!("Skipping spec '{}': {}", name, e),
            }
        }
        Ok(specs)
    }
}

fn next_action(metadata: &SpecificationMetadata, files: &ArtifactPresence) -> Option<String> {
    let approval_hint = |done: SpecPhase, next: SpecPhase| {
        if metadata.is_approved(done) {
            format!("Run spec_{} to generate {}", next, next.artifact_file().unwrap_or_default())
        } else {
            format!(
                "Review {}, then run spec_{} with auto_approve=true",
                done.artifact_file().unwrap_or_default(),
                next
            )
        }
    };

    match metadata.current_phase {
        SpecPhase::Initialized => Some("Run spec_requirements to generate requirements.md".to_string()),
        SpecPhase::Requirements if files.get(SpecPhase::Requirements) => {
            Some(approval_hint(SpecPhase::Requirements, SpecPhase::Design))
        }
        SpecPhase::Design if files.get(SpecPhase::Design) => {
            Some(approval_hint(SpecPhase::Design, SpecPhase::Tasks))
        }
        SpecPhase::Tasks => Some("Implement the tasks in tasks.md and track progress with validate_impl".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::ProjectPaths;
    use tempfile::TempDir;

    fn workflow(temp: &TempDir, options: WorkflowOptions) -> SpecWorkflow {
        let paths = ProjectPaths::new(temp.path(), ".kiro");
        SpecWorkflow::new(
            ArtifactStore::new(paths.clone()),
            TemplateResolver::new(&paths, "en"),
            options,
        )
    }

    fn blocked_error(outcome: GenerationOutcome) -> WorkflowError {
        match outcome {
            GenerationOutcome::Blocked { error, .. } => error,
            GenerationOutcome::Generated(a) => panic!("expected block, generated {:?}", a.file),
        }
    }

    #[test]
    fn test_init_normalizes_and_reports_initialized() {
        let temp = TempDir::new().unwrap();
        let wf = workflow(&temp, WorkflowOptions::default());

        let outcome = wf.init("User Auth", "OAuth login").unwrap();
        assert!(outcome.created);
        assert_eq!(outcome.metadata.feature_name, "user-auth");

        let status = wf.get_status("user-auth").unwrap();
        assert_eq!(status.current_phase, SpecPhase::Initialized);
        assert_eq!(status.files, ArtifactPresence::default());
        assert!(status.next_action.unwrap().contains("spec_requirements"));
    }

    #[test]
    fn test_init_blank_arguments_rejected() {
        let temp = TempDir::new().unwrap();
        let wf = workflow(&temp, WorkflowOptions::default());
        assert!(matches!(wf.init(" ", "d"), Err(WorkflowError::InvalidInput(_))));
        assert!(matches!(wf.init("f", ""), Err(WorkflowError::InvalidInput(_))));
    }

    #[test]
    fn test_reinit_same_description_is_noop() {
        let temp = TempDir::new().unwrap();
        let wf = workflow(&temp, WorkflowOptions::default());
        wf.init("feat", "desc").unwrap();
        wf.generate_requirements("feat", true).unwrap();

        let again = wf.init("feat", "desc").unwrap();
        assert!(!again.created);
        assert_eq!(again.metadata.current_phase, SpecPhase::Requirements);

        let conflict = wf.init("feat", "other").unwrap_err();
        assert_eq!(conflict.kind(), "conflict");
    }

    #[test]
    fn test_init_auto_creates_steering() {
        let temp = TempDir::new().unwrap();
        let wf = workflow(
            &temp,
            WorkflowOptions {
                auto_create_steering: true,
                ..WorkflowOptions::default()
            },
        );
        let outcome = wf.init("feat", "desc").unwrap();
        assert_eq!(outcome.steering_created.len(), 3);
    }

    #[test]
    fn test_init_steering_failure_persists_nothing() {
        let temp = TempDir::new().unwrap();
        let override_dir = temp.path().join(".kiro/templates/steering");
        std::fs::create_dir_all(&override_dir).unwrap();
        std::fs::write(override_dir.join("product.md"), "{% if x %}broken").unwrap();

        let wf = workflow(
            &temp,
            WorkflowOptions {
                auto_create_steering: true,
                ..WorkflowOptions::default()
            },
        );
        let err = wf.init("feat", "desc").unwrap_err();
        assert_eq!(err.kind(), "template_render_failed");
        assert!(!wf.store().metadata_exists("feat"));
        assert!(!temp.path().join(".kiro/specs/feat").exists());
        assert!(wf.store().list_steering().unwrap().is_empty());

        // A retry hits the same failure instead of reporting an existing spec
        let again = wf.init("feat", "desc").unwrap_err();
        assert_eq!(again.kind(), "template_render_failed");
    }

    #[test]
    fn test_generate_with_non_utf8_steering() {
        let temp = TempDir::new().unwrap();
        let wf = workflow(&temp, WorkflowOptions::default());
        wf.init("feat", "desc").unwrap();
        let dir = wf.store().ensure_steering_dir().unwrap();
        std::fs::write(dir.join("notes.md"), [0xff, 0xfe, 0x41]).unwrap();

        assert!(wf.generate_requirements("feat", false).unwrap().is_success());
        assert_eq!(wf.store().steering_status().unwrap().documents.len(), 1);
    }

    #[test]
    fn test_requirements_document_shows_target_phase() {
        let temp = TempDir::new().unwrap();
        let wf = workflow(&temp, WorkflowOptions::default());
        wf.init("feat", "desc").unwrap();
        wf.generate_requirements("feat", false).unwrap();

        let content = wf
            .store()
            .read_artifact("feat", "requirements.md")
            .unwrap()
            .unwrap();
        assert!(content.contains("| Phase | requirements |"), "{}", content);
    }

    #[test]
    fn test_generate_before_init_blocked() {
        let temp = TempDir::new().unwrap();
        let wf = workflow(&temp, WorkflowOptions::default());
        let outcome = wf.generate_requirements("ghost", false).unwrap();
        match outcome {
            GenerationOutcome::Blocked { error, current_phase } => {
                assert_eq!(error.kind(), "not_found");
                assert_eq!(current_phase, None);
            }
            _ => panic!("expected block"),
        }
    }

    #[test]
    fn test_design_out_of_window() {
        let temp = TempDir::new().unwrap();
        let wf = workflow(&temp, WorkflowOptions::default());
        wf.init("feat", "desc").unwrap();

        let err = blocked_error(wf.generate_design("feat", true).unwrap());
        assert_eq!(err.to_string(), "Cannot generate design in phase: initialized");
        assert!(!wf.store().artifact_exists("feat", "design.md"));
    }

    #[test]
    fn test_approval_gate_and_bypass() {
        let temp = TempDir::new().unwrap();
        let wf = workflow(&temp, WorkflowOptions::default());
        wf.init("feat", "desc").unwrap();
        wf.generate_requirements("feat", false).unwrap();
        let before = wf.store().read_metadata("feat").unwrap();

        let err = blocked_error(wf.generate_design("feat", false).unwrap());
        assert!(matches!(err, WorkflowError::ApprovalRequired { .. }));
        assert_eq!(wf.store().read_metadata("feat").unwrap(), before);
        assert!(!wf.store().artifact_exists("feat", "design.md"));

        let outcome = wf.generate_design("feat", true).unwrap();
        assert!(outcome.is_success());
        let after = wf.store().read_metadata("feat").unwrap();
        assert_eq!(after.current_phase, SpecPhase::Design);
        assert!(after.is_approved(SpecPhase::Design));
        assert!(!after.is_approved(SpecPhase::Requirements));
    }

    #[test]
    fn test_regeneration_in_same_phase_skips_gate() {
        let temp = TempDir::new().unwrap();
        let wf = workflow(&temp, WorkflowOptions::default());
        wf.init("feat", "desc").unwrap();
        wf.generate_requirements("feat", false).unwrap();
        wf.generate_design("feat", true).unwrap();

        // already in design; requirements approval is not re-checked
        assert!(wf.generate_design("feat", false).unwrap().is_success());
    }

    #[test]
    fn test_lenient_gates() {
        let temp = TempDir::new().unwrap();
        let wf = workflow(
            &temp,
            WorkflowOptions {
                strict_phase_gates: false,
                ..WorkflowOptions::default()
            },
        );
        wf.init("feat", "desc").unwrap();
        wf.generate_requirements("feat", false).unwrap();
        assert!(wf.generate_design("feat", false).unwrap().is_success());

        // the phase window still applies
        let err = blocked_error(wf.generate_requirements("feat", false).unwrap());
        assert_eq!(err.kind(), "phase_error");
    }

    #[test]
    fn test_render_failure_leaves_metadata() {
        let temp = TempDir::new().unwrap();
        let wf = workflow(&temp, WorkflowOptions::default());
        wf.init("feat", "desc").unwrap();

        let override_dir = temp.path().join(".kiro/templates/specs");
        std::fs::create_dir_all(&override_dir).unwrap();
        std::fs::write(override_dir.join("requirements.md"), "{% if x %}broken").unwrap();

        let err = blocked_error(wf.generate_requirements("feat", true).unwrap());
        assert_eq!(err.kind(), "template_render_failed");
        let meta = wf.store().read_metadata("feat").unwrap();
        assert_eq!(meta.current_phase, SpecPhase::Initialized);
        assert!(!wf.store().artifact_exists("feat", "requirements.md"));
    }

    #[test]
    fn test_non_generation_phase_rejected() {
        let temp = TempDir::new().unwrap();
        let wf = workflow(&temp, WorkflowOptions::default());
        wf.init("feat", "desc").unwrap();
        let err = blocked_error(wf.generate(SpecPhase::Implementation, "feat", true).unwrap());
        assert_eq!(err.kind(), "invalid_input");
    }

    #[test]
    fn test_list_specs() {
        let temp = TempDir::new().unwrap();
        let wf = workflow(&temp, WorkflowOptions::default());
        wf.init("beta", "b").unwrap();
        wf.init("alpha", "a").unwrap();
        wf.generate_requirements("alpha", true).unwrap();

        let specs = wf.list_specs().unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].feature_name, "alpha");
        assert_eq!(specs[0].approved_phases, vec![SpecPhase::Requirements]);
    }
}
