//! Program assembler: the driver `main.c` and the shared workspace header.
use enzyme_core::{EngineError, GridDims, Result};

use crate::renderer::{Params, TemplateRenderer};
use crate::stage::StageUnit;
use crate::SourceUnit;

pub const MAIN_FILE: &str = "main.c";
pub const WORKSPACE_FILE: &str = "workspace.h";

/// Sizes baked into the driver program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramLayout {
    pub grid: GridDims,
    /// Per-cell stride of the workspace.
    pub max_vars: usize,
    pub num_inputs: usize,
    pub num_outputs: usize,
}

impl ProgramLayout {
    /// Floats the driver reads from stdin.
    pub fn input_len(&self) -> usize {
        self.grid.cells() * self.num_inputs
    }

    /// Floats the driver writes to stdout.
    pub fn output_len(&self) -> usize {
        self.grid.cells() * self.num_outputs
    }

    pub fn input_bytes(&self) -> usize {
        self.input_len() * std::mem::size_of::<f32>()
    }

    pub fn output_bytes(&self) -> usize {
        self.output_len() * std::mem::size_of::<f32>()
    }
}

pub fn workspace_header(renderer: &TemplateRenderer) -> Result<SourceUnit> {
    let contents = renderer.render("workspace_h", &Params::new())?;
    Ok(SourceUnit::new(WORKSPACE_FILE, contents))
}

/// Emits the driver that runs `stages` in the given order.
pub fn assemble_program(
    renderer: &TemplateRenderer,
    stages: &[StageUnit],
    layout: &ProgramLayout,
) -> Result<SourceUnit> {
    if stages.is_empty() {
        return Err(EngineError::codegen("cannot assemble a program without stages"));
    }
    for (position, stage) in stages.iter().enumerate() {
        if stage.index != position {
            return Err(EngineError::codegen(format!(
                "stage unit {} found at position {}",
                stage.index, position
            )));
        }
    }
    if layout.num_inputs > layout.max_vars || layout.num_outputs > layout.max_vars {
        return Err(EngineError::codegen(format!(
            "workspace stride {} is smaller than {} inputs / {} outputs",
            layout.max_vars, layout.num_inputs, layout.num_outputs
        )));
    }

    let includes = stages
        .iter()
        .map(|s| format!("#include \"{}\"", s.unit.file_name))
        .collect::<Vec<_>>()
        .join("\n");
    let calls = stages
        .iter()
        .map(|s| format!("    {}(NI, NJ, NK, &ws);", s.entry_point))
        .collect::<Vec<_>>()
        .join("\n");

    let params = Params::new()
        .with("ni", layout.grid.ni)
        .with("nj", layout.grid.nj)
        .with("nk", layout.grid.nk)
        .with("max_vars", layout.max_vars)
        .with("num_inputs", layout.num_inputs)
        .with("num_outputs", layout.num_outputs)
        .with("includes", includes)
        .with("stages", calls);

    let contents = renderer.render("main_c", &params)?;
    Ok(SourceUnit::new(MAIN_FILE, contents))
}
