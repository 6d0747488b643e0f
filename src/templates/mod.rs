//! Layered template lookup and Jinja-style rendering
//!
//! Lookup order for `{category}/{name}`: every template root (project
//! overrides in `.kiro/templates`, then the configured bundled directory) is
//! searched for `{name}.{lang}.md`, `{name}.en.md` and `{name}.md`. When no
//! file matches, the compiled-in default is used for known names.

pub mod defaults;

use crate::error::{TemplateError, WorkflowError, WorkflowResult};
use crate::paths::ProjectPaths;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Steering,
    Specs,
}

impl TemplateCategory {
    pub const ALL: [TemplateCategory; 2] = [TemplateCategory::Steering, TemplateCategory::Specs];

    pub fn dir_name(&self) -> &'static str {
        match self {
            TemplateCategory::Steering => "steering",
            TemplateCategory::Specs => "specs",
        }
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for TemplateCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "steering" => Ok(TemplateCategory::Steering),
            "specs" | "spec" => Ok(TemplateCategory::Specs),
            other => Err(format!(
                "Unknown template category '{}'. Valid: steering, specs",
                other
            )),
        }
    }
}

/// Where a resolved template came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateSource {
    Project,
    Bundled,
    Builtin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub content: String,
    pub source: TemplateSource,
    /// File the content was read from; `None` for built-ins
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateInfo {
    pub name: String,
    pub path: String,
    pub category: TemplateCategory,
    pub language: String,
    pub source: TemplateSource,
}

pub type CacheKey = (PathBuf, TemplateCategory, String, String);

/// Resolved-template memo that several resolvers can share. Entries are keyed
/// by project root, so one cache serves every project a server touches.
pub type TemplateCache = Arc<Mutex<HashMap<CacheKey, Option<ResolvedTemplate>>>>;

pub struct TemplateResolver {
    project_root: PathBuf,
    roots: Vec<(TemplateSource, PathBuf)>,
    language: String,
    cache: Option<TemplateCache>,
}

impl TemplateResolver {
    pub fn new(paths: &ProjectPaths, language: impl Into<String>) -> Self {
        Self {
            project_root: paths.root().to_path_buf(),
            roots: vec![(TemplateSource::Project, paths.templates_dir())],
            language: language.into(),
            cache: None,
        }
    }

    pub fn with_bundled_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            let dir = if dir.is_absolute() {
                dir
            } else {
                self.project_root.join(dir)
            };
            self.roots.push((TemplateSource::Bundled, dir));
        }
        self
    }

    /// Memoize lookups for the lifetime of this resolver
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled.then(TemplateCache::default);
        self
    }

    /// Memoize lookups in a cache that outlives this resolver
    pub fn with_shared_cache(mut self, cache: TemplateCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Resolve using the resolver's own language
    pub fn resolve_default(
        &self,
        category: TemplateCategory,
        name: &str,
    ) -> WorkflowResult<Option<ResolvedTemplate>> {
        self.resolve(category, name, &self.language)
    }

    pub fn resolve(
        &self,
        category: TemplateCategory,
        name: &str,
        language: &str,
    ) -> WorkflowResult<Option<ResolvedTemplate>> {
        let key = (
            self.project_root.clone(),
            category,
            name.to_string(),
            language.to_string(),
        );
        if let Some(hit) = self.cache_get(&key) {
            return Ok(hit);
        }

        let resolved = self.lookup(category, name, language)?;
        self.cache_put(key, resolved.clone());
        Ok(resolved)
    }

    /// Resolve or fail with `Template(NotFound)`
    pub fn require(
        &self,
        category: TemplateCategory,
        name: &str,
    ) -> WorkflowResult<ResolvedTemplate> {
        self.resolve_default(category, name)?.ok_or_else(|| {
            TemplateError::NotFound {
                category: category.to_string(),
                name: name.to_string(),
            }
            .into()
        })
    }

    fn lookup(
        &self,
        category: TemplateCategory,
        name: &str,
        language: &str,
    ) -> WorkflowResult<Option<ResolvedTemplate>> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Ok(None);
        }

        let candidates = [
            format!("{}.{}.md", name, language),
            format!("{}.en.md", name),
            format!("{}.md", name),
        ];

        for (source, root) in &self.roots {
            let dir = root.join(category.dir_name());
            for file in &candidates {
                let path = dir.join(file);
                if path.is_file() {
                    let content = std::fs::read_to_string(&path)
                        .map_err(|e| WorkflowError::io(&path, e))?;
                    tracing::debug!("Resolved template {}/{} from {}", category, name, path.display());
                    return Ok(Some(ResolvedTemplate {
                        content,
                        source: *source,
                        path: Some(path),
                    }));
                }
            }
        }

        Ok(defaults::builtin(category, name).map(|content| ResolvedTemplate {
            content: content.to_string(),
            source: TemplateSource::Builtin,
            path: None,
        }))
    }

    fn cache_get(&self, key: &CacheKey) -> Option<Option<ResolvedTemplate>> {
        let cache = self.cache.as_ref()?;
        let guard = cache.lock().ok()?;
        guard.get(key).cloned()
    }

    fn cache_put(&self, key: CacheKey, value: Option<ResolvedTemplate>) {
        if let Some(mut guard) = self.cache.as_ref().and_then(|c| c.lock().ok()) {
            guard.insert(key, value);
        }
    }

    /// Render a template file. Relative paths are tried against the project
    /// root first, then each template root.
    pub fn render_file<S: Serialize>(&self, path: &str, context: &S) -> WorkflowResult<String> {
        let path = self.find_template_file(path).ok_or_else(|| TemplateError::NotFound {
            category: "file".to_string(),
            name: path.to_string(),
        })?;
        let source = std::fs::read_to_string(&path).map_err(|e| WorkflowError::io(&path, e))?;
        Ok(render(&source, context)?)
    }

    fn find_template_file(&self, path: &str) -> Option<PathBuf> {
        let requested = Path::new(path.trim());
        if requested.as_os_str().is_empty()
            || requested.components().any(|c| c == Component::ParentDir)
        {
            return None;
        }
        if requested.is_absolute() {
            return requested.is_file().then(|| requested.to_path_buf());
        }

        std::iter::once(&self.project_root)
            .chain(self.roots.iter().map(|(_, root)| root))
            .map(|base| base.join(requested))
            .find(|candidate| candidate.is_file())
    }

    /// Every template visible to this resolver, optionally limited to one category
    pub fn list(&self, category: Option<TemplateCategory>) -> Vec<TemplateInfo> {
        let categories: Vec<TemplateCategory> = match category {
            Some(c) => vec![c],
            None => TemplateCategory::ALL.to_vec(),
        };

        let mut templates = Vec::new();
        for category in categories {
            for (source, root) in &self.roots {
                let dir = root.join(category.dir_name());
                if !dir.is_dir() {
                    continue;
                }
                let mut found: Vec<TemplateInfo> = WalkDir::new(&dir)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .filter(|e| e.path().extension().map_or(false, |ext| ext == "md"))
                    .map(|e| {
                        let file_name = e.file_name().to_string_lossy().into_owned();
                        TemplateInfo {
                            name: template_name(&file_name),
                            path: e.path().display().to_string(),
                            category,
                            language: extract_language(&file_name),
                            source: *source,
                        }
                    })
                    .collect();
                found.sort_by(|a, b| a.path.cmp(&b.path));
                templates.extend(found);
            }

            for name in defaults::names(category) {
                templates.push(TemplateInfo {
                    name: name.to_string(),
                    path: format!("builtin:{}/{}.md", category, name),
                    category,
                    language: "default".to_string(),
                    source: TemplateSource::Builtin,
                });
            }
        }
        templates
    }
}

/// Render template text against any serializable context.
///
/// Blocks are trimmed the way Jinja2's `trim_blocks`/`lstrip_blocks` do, and
/// undefined variables render as empty strings.
pub fn render<S: Serialize>(source: &str, context: &S) -> Result<String, TemplateError> {
    let mut env = minijinja::Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    Ok(env.render_str(source, context)?)
}

/// Language code from `name.lang.md`; `"default"` for fewer than three segments
pub fn extract_language(file_name: &str) -> String {
    let parts: Vec<&str> = file_name.split('.').collect();
    if parts.len() >= 3 {
        parts[parts.len() - 2].to_string()
    } else {
        "default".to_string()
    }
}

fn template_name(file_name: &str) -> String {
    file_name.split('.').next().unwrap_or(file_name).to_string()
}
