//! Template loading and management.
//!
//! Source skeletons live in a YAML file with:
//! - Multiple named templates
//! - Handlebars placeholders
//! - The closed parameter set each template accepts

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::error::TemplateError;

/// The C99 skeletons shipped with the engine.
pub const BUILTIN_TEMPLATES: &str = include_str!("../templates/c99.yaml");

/// Names every templates file must define.
pub const REQUIRED_TEMPLATES: [&str; 3] = ["workspace_h", "stage_h", "main_c"];

static BUILTIN: Lazy<Result<TemplatesFile, TemplateError>> =
    Lazy::new(|| TemplatesFile::from_yaml(BUILTIN_TEMPLATES));

/// Top-level templates file structure
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesFile {
    pub version: String,
    pub templates: HashMap<String, Template>,
}

/// A single template definition
#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    pub description: String,
    /// Placeholder names the template accepts; rendering requires all of them.
    #[serde(default)]
    pub params: BTreeSet<String>,
    pub template: String,
}

impl TemplatesFile {
    /// Built-in templates, parsed once per process.
    pub fn builtin() -> Result<Self, TemplateError> {
        (*BUILTIN).clone()
    }

    /// Load templates from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TemplateError::Load(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse templates from YAML content
    pub fn from_yaml(yaml: &str) -> Result<Self, TemplateError> {
        let file: TemplatesFile = serde_yaml::from_str(yaml)
            .map_err(|e| TemplateError::Load(format!("invalid templates YAML: {}", e)))?;

        for name in REQUIRED_TEMPLATES {
            if !file.templates.contains_key(name) {
                return Err(TemplateError::Load(format!(
                    "templates file does not define '{}'",
                    name
                )));
            }
        }
        Ok(file)
    }

    /// Get a template by name
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// List all template names
    pub fn list_templates(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}
