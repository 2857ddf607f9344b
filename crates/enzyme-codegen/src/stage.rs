//! Stage compiler: wraps one generated body as a `stage_<i>` entry point.
use enzyme_core::{single_io, EngineError, Result, Stage};

use crate::renderer::{Params, TemplateRenderer};
use crate::SourceUnit;

/// Compiled form of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageUnit {
    /// Position in the pipeline.
    pub index: usize,
    /// C function the driver calls.
    pub entry_point: String,
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub unit: SourceUnit,
}

/// Deterministic entry point name for the stage at `index`.
pub fn entry_point_name(index: usize) -> String {
    format!("stage_{}", index)
}

/// Renders the source unit for `stage`.
///
/// `max_vars` is the per-cell stride of the shared workspace; the stage's
/// values must fit in it.
pub fn compile_stage(
    renderer: &TemplateRenderer,
    index: usize,
    stage: &dyn Stage,
    max_vars: usize,
) -> Result<StageUnit> {
    let io = single_io(stage)?;
    let num_inputs = io.source.size();
    let num_outputs = io.sink.size();

    if num_inputs > max_vars || num_outputs > max_vars {
        return Err(EngineError::codegen(format!(
            "stage {} ('{}') needs {} values per cell, workspace holds {}",
            index,
            stage.id(),
            num_inputs.max(num_outputs),
            max_vars
        )));
    }

    let entry_point = entry_point_name(index);
    let params = Params::new()
        .with("stage_name", entry_point.as_str())
        .with("stage_id", comment_safe(stage.id()))
        .with("max_vars", max_vars)
        .with("num_inputs", num_inputs)
        .with("num_outputs", num_outputs)
        .with("body", stage.body());

    let contents = renderer.render("stage_h", &params)?;
    tracing::debug!(
        stage = index,
        id = stage.id(),
        num_inputs,
        num_outputs,
        "stage compiled"
    );

    Ok(StageUnit {
        index,
        unit: SourceUnit::new(format!("{}.h", entry_point), contents),
        entry_point,
        num_inputs,
        num_outputs,
    })
}

// Stage ids land inside a C block comment.
fn comment_safe(id: &str) -> String {
    id.replace("*/", "* /").replace(['\n', '\r'], " ")
}
