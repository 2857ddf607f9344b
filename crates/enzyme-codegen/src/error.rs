//! Template errors
use enzyme_core::EngineError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),

    #[error("template '{template}' requires parameter '{param}'")]
    MissingParam { template: String, param: String },

    #[error("template '{template}' does not accept parameter '{param}'")]
    UnknownParam { template: String, param: String },

    #[error("parameter '{param}' cannot be rendered as source text: {reason}")]
    Unrenderable { param: String, reason: String },

    #[error("template '{template}' is malformed: {message}")]
    Syntax { template: String, message: String },

    #[error("render failed: {0}")]
    Render(String),

    #[error("template load failed: {0}")]
    Load(String),
}

impl From<TemplateError> for EngineError {
    fn from(err: TemplateError) -> Self {
        EngineError::Template(err.to_string())
    }
}
