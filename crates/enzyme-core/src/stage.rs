//! Stage Trait: contract between the expression compiler and the engine
//!
//! A stage maps one per-cell tensor value (its source) to another (its
//! sink) through a generated C body. The engine never looks inside the
//! body; it only needs the shapes and the code.
use crate::error::{EngineError, Result};
use crate::shape::Shape;
use serde::{Deserialize, Serialize};

/// Placeholder for a per-cell tensor value flowing through a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorValue {
    pub shape: Shape,
}

impl TensorValue {
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
        }
    }

    /// Number of floats this value occupies in one grid cell.
    pub fn size(&self) -> usize {
        self.shape.elem_count()
    }
}

/// One unit of the pipeline, as lowered by the expression compiler.
///
/// The engine supports stages with exactly one source and one sink value;
/// anything else is rejected before code generation.
pub trait Stage: Send + Sync {
    /// Human-readable identifier used in logs and the pipeline id.
    fn id(&self) -> &str {
        "stage"
    }

    fn source_values(&self) -> &[TensorValue];

    fn sink_values(&self) -> &[TensorValue];

    /// Generated C statements computing the sink from the source.
    fn body(&self) -> &str;
}

/// The stage shape the engine can execute: exactly one source and one sink.
#[derive(Debug, Clone, Copy)]
pub struct StageIo<'a> {
    pub source: &'a TensorValue,
    pub sink: &'a TensorValue,
}

/// Checks the one-source/one-sink invariant.
pub fn single_io(stage: &dyn Stage) -> Result<StageIo<'_>> {
    match (stage.source_values(), stage.sink_values()) {
        ([source], [sink]) => Ok(StageIo { source, sink }),
        (sources, sinks) => Err(EngineError::codegen(format!(
            "stage '{}' has {} source and {} sink values, expected exactly 1 of each",
            stage.id(),
            sources.len(),
            sinks.len()
        ))),
    }
}

/// A stage as handed over by the expression compiler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedStage {
    pub id: String,
    pub source_values: Vec<TensorValue>,
    pub sink_values: Vec<TensorValue>,
    pub body: String,
}

impl GeneratedStage {
    /// Stage with a single source and sink.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<Shape>,
        sink: impl Into<Shape>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_values: vec![TensorValue::new(source)],
            sink_values: vec![TensorValue::new(sink)],
            body: body.into(),
        }
    }
}

impl Stage for GeneratedStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn source_values(&self) -> &[TensorValue] {
        &self.source_values
    }

    fn sink_values(&self) -> &[TensorValue] {
        &self.sink_values
    }

    fn body(&self) -> &str {
        &self.body
    }
}
