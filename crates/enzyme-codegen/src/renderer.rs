//! Template rendering.
//!
//! Handlebars in strict mode with HTML escaping turned off, so generated C
//! comes out verbatim. Parameters form a closed, typed set: integers and
//! source fragments. Each render call is checked against the parameter list
//! the template declares before handlebars sees it.
//!
//! Custom helpers:
//! - guard: include-guard macro name for a unit (`stage_0` -> `ENZYME_STAGE_0_H`)

use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::TemplateError;
use crate::templates::TemplatesFile;

/// A value substituted into a source skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Int(i64),
    /// Source text inserted verbatim.
    Source(String),
}

impl Param {
    /// Converts a JSON scalar; anything but integers and strings is rejected.
    pub fn from_json(name: &str, value: &Value) -> Result<Self, TemplateError> {
        let unrenderable = |reason: &str| TemplateError::Unrenderable {
            param: name.to_string(),
            reason: reason.to_string(),
        };
        match value {
            Value::String(s) => Ok(Param::Source(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(Param::Int)
                .ok_or_else(|| unrenderable("not an integer in i64 range")),
            Value::Bool(_) => Err(unrenderable("boolean")),
            Value::Null => Err(unrenderable("null")),
            Value::Array(_) => Err(unrenderable("array")),
            Value::Object(_) => Err(unrenderable("object")),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Param::Int(n) => Value::from(*n),
            Param::Source(s) => Value::String(s.clone()),
        }
    }
}

impl From<i64> for Param {
    fn from(n: i64) -> Self {
        Param::Int(n)
    }
}

impl From<usize> for Param {
    fn from(n: usize) -> Self {
        Param::Int(n as i64)
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Source(s.to_string())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::Source(s)
    }
}

/// Named parameters for one render call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, Param>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Param>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    /// Builds parameters from a flat JSON object of integers and strings.
    pub fn from_json(value: &Value) -> Result<Self, TemplateError> {
        let object = value.as_object().ok_or_else(|| TemplateError::Unrenderable {
            param: "<root>".to_string(),
            reason: "parameters must be a JSON object".to_string(),
        })?;
        let mut params = Params::new();
        for (name, v) in object {
            params.0.insert(name.clone(), Param::from_json(name, v)?);
        }
        Ok(params)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|s| s.as_str())
    }

    fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Value::Object(map)
    }
}

handlebars_helper!(guard: |name: str| {
    let ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("ENZYME_{}_H", ident)
});

/// Compiled renderer with registered helpers
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
    templates: TemplatesFile,
}

impl TemplateRenderer {
    /// Create a new renderer from a templates file
    pub fn new(templates: TemplatesFile) -> Result<Self, TemplateError> {
        let mut handlebars = Handlebars::new();

        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(no_escape);
        handlebars.register_helper("guard", Box::new(guard));

        for (name, template) in &templates.templates {
            handlebars
                .register_template_string(name, &template.template)
                .map_err(|e| TemplateError::Syntax {
                    template: name.clone(),
                    message: e.to_string(),
                })?;
        }

        Ok(TemplateRenderer {
            handlebars,
            templates,
        })
    }

    /// Renderer over the built-in C99 templates
    pub fn builtin() -> Result<Self, TemplateError> {
        Self::new(TemplatesFile::builtin()?)
    }

    /// Load from a file path
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        Self::new(TemplatesFile::load(path)?)
    }

    /// Render a named template; `params` must match its declared set exactly.
    pub fn render(&self, template_name: &str, params: &Params) -> Result<String, TemplateError> {
        let template = self
            .templates
            .get(template_name)
            .ok_or_else(|| TemplateError::UnknownTemplate(template_name.to_string()))?;

        if let Some(missing) = template.params.iter().find(|p| !params.contains(p)) {
            return Err(TemplateError::MissingParam {
                template: template_name.to_string(),
                param: missing.clone(),
            });
        }
        if let Some(unknown) = params.names().find(|p| !template.params.contains(*p)) {
            return Err(TemplateError::UnknownParam {
                template: template_name.to_string(),
                param: unknown.to_string(),
            });
        }

        self.handlebars
            .render(template_name, &params.to_json())
            .map_err(|e| TemplateError::Render(e.to_string()))
    }

    /// List available template names
    pub fn list_templates(&self) -> Vec<&str> {
        self.templates.list_templates()
    }
}
