//! Pipeline: ordered, validated sequence of stages
use crate::error::{EngineError, Result};
use crate::shape::Shape;
use crate::stage::{single_io, Stage};

/// Stages in execution order. Construction guarantees every stage has one
/// source and one sink, and that each sink feeds the next stage's source.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    pipeline_id: String,
    source_shape: Shape,
    sink_shape: Shape,
    max_vars: usize,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Result<Self> {
        if stages.is_empty() {
            return Err(EngineError::codegen("pipeline has no stages"));
        }

        let io = stages
            .iter()
            .map(|stage| single_io(stage.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        for (i, pair) in io.windows(2).enumerate() {
            let sink = &pair[0].sink.shape;
            let source = &pair[1].source.shape;
            if sink != source {
                return Err(EngineError::shape(format!(
                    "stage {} ('{}') produces {} but stage {} ('{}') consumes {}",
                    i,
                    stages[i].id(),
                    sink,
                    i + 1,
                    stages[i + 1].id(),
                    source
                )));
            }
        }

        let pipeline_id = stages
            .iter()
            .map(|s| s.id())
            .collect::<Vec<_>>()
            .join("→");
        let max_vars = io
            .iter()
            .map(|io| io.source.size().max(io.sink.size()))
            .max()
            .unwrap_or(0)
            .max(1);
        let (source_shape, sink_shape) = match (io.first(), io.last()) {
            (Some(first), Some(last)) => (first.source.shape.clone(), last.sink.shape.clone()),
            _ => return Err(EngineError::codegen("pipeline has no stages")),
        };
        tracing::debug!(pipeline_id = %pipeline_id, stages = stages.len(), max_vars, "pipeline validated");

        Ok(Self {
            stages,
            pipeline_id,
            source_shape,
            sink_shape,
            max_vars,
        })
    }

    pub fn stages(&self) -> &[Box<dyn Stage>] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false for a constructed pipeline.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    /// Per-cell input shape (the first stage's source).
    pub fn source_shape(&self) -> &Shape {
        &self.source_shape
    }

    /// Per-cell output shape (the last stage's sink).
    pub fn sink_shape(&self) -> &Shape {
        &self.sink_shape
    }

    pub fn num_inputs(&self) -> usize {
        self.source_shape().elem_count()
    }

    pub fn num_outputs(&self) -> usize {
        self.sink_shape().elem_count()
    }

    /// Widest per-cell value any stage reads or writes; sizes the workspace.
    pub fn max_vars(&self) -> usize {
        self.max_vars
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("pipeline_id", &self.pipeline_id)
            .field("stages", &self.stages.len())
            .finish()
    }
}
