//! Enzyme Codegen: turns a `Pipeline` into C sources
//!
//! This crate owns the text side of the engine: the templates file, the
//! renderer, the per-stage units and the driver program that ties them
//! together.
//!
//! # Generated layout
//!
//! ```text
//! workspace.h   shared declarations (workspace_t, WS_INDEX, swap)
//! stage_0.h     static void stage_0(int ni, int nj, int nk, workspace_t *ws)
//! ...
//! main.c        read stdin -> stage_0 -> ... -> stage_n -> write stdout
//! ```
//!
//! # Example
//!
//! ```ignore
//! use enzyme_codegen::ProgramGenerator;
//!
//! let generator = ProgramGenerator::builtin()?;
//! let program = generator.generate(&pipeline, grid)?;
//! program.write_to(build_dir)?;
//! ```

pub mod error;
pub mod program;
pub mod renderer;
pub mod stage;
pub mod templates;

pub use error::TemplateError;
pub use program::{assemble_program, workspace_header, ProgramLayout, MAIN_FILE, WORKSPACE_FILE};
pub use renderer::{Param, Params, TemplateRenderer};
pub use stage::{compile_stage, entry_point_name, StageUnit};
pub use templates::TemplatesFile;

use enzyme_core::{EngineConfig, GridDims, Pipeline, Result};
use std::path::Path;

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub file_name: String,
    pub contents: String,
}

impl SourceUnit {
    pub fn new(file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }
}

/// Every source file of one driver program.
#[derive(Debug, Clone)]
pub struct GeneratedProgram {
    pub layout: ProgramLayout,
    pub units: Vec<SourceUnit>,
}

impl GeneratedProgram {
    /// Writes every unit into `dir`, which must exist.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<()> {
        for unit in &self.units {
            std::fs::write(dir.join(&unit.file_name), &unit.contents)?;
        }
        Ok(())
    }

    /// Translation unit handed to the compiler.
    pub fn main_file(&self) -> &str {
        MAIN_FILE
    }

    /// blake3 digest over file names and contents, in write order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for unit in &self.units {
            hasher.update(unit.file_name.as_bytes());
            hasher.update(&[0]);
            hasher.update(unit.contents.as_bytes());
            hasher.update(&[0]);
        }
        format!("blake3:{}", hasher.finalize())
    }
}

/// Renders whole programs from a pipeline and a grid.
pub struct ProgramGenerator {
    renderer: TemplateRenderer,
}

impl ProgramGenerator {
    pub fn new(renderer: TemplateRenderer) -> Self {
        Self { renderer }
    }

    pub fn builtin() -> Result<Self> {
        Ok(Self::new(TemplateRenderer::builtin()?))
    }

    /// Uses `config.templates_path` when set, the built-in skeletons otherwise.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let renderer = match &config.templates_path {
            Some(path) => TemplateRenderer::load(path)?,
            None => TemplateRenderer::builtin()?,
        };
        Ok(Self::new(renderer))
    }

    /// Layout of the driver for `pipeline` over `grid`.
    pub fn layout(pipeline: &Pipeline, grid: GridDims) -> ProgramLayout {
        ProgramLayout {
            grid,
            max_vars: pipeline.max_vars(),
            num_inputs: pipeline.num_inputs(),
            num_outputs: pipeline.num_outputs(),
        }
    }

    pub fn generate(&self, pipeline: &Pipeline, grid: GridDims) -> Result<GeneratedProgram> {
        let layout = Self::layout(pipeline, grid);

        let stages = pipeline
            .stages()
            .iter()
            .enumerate()
            .map(|(i, stage)| compile_stage(&self.renderer, i, stage.as_ref(), layout.max_vars))
            .collect::<Result<Vec<_>>>()?;

        let mut units = Vec::with_capacity(stages.len() + 2);
        units.push(workspace_header(&self.renderer)?);
        let main = assemble_program(&self.renderer, &stages, &layout)?;
        units.extend(stages.into_iter().map(|s| s.unit));
        units.push(main);

        tracing::debug!(
            pipeline_id = pipeline.pipeline_id(),
            files = units.len(),
            max_vars = layout.max_vars,
            "program generated"
        );
        Ok(GeneratedProgram { layout, units })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enzyme_core::{GeneratedStage, Stage};

    fn pipeline() -> Pipeline {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(GeneratedStage::new("f", [2], [3], "/* f */")),
            Box::new(GeneratedStage::new("g", [3], [1], "/* g */")),
        ];
        Pipeline::new(stages).unwrap()
    }

    #[test]
    fn test_generate_file_set() {
        let program = ProgramGenerator::builtin()
            .unwrap()
            .generate(&pipeline(), GridDims::new(2, 2, 1))
            .unwrap();

        let names: Vec<&str> = program.units.iter().map(|u| u.file_name.as_str()).collect();
        assert_eq!(names, vec!["workspace.h", "stage_0.h", "stage_1.h", "main.c"]);
        assert_eq!(program.layout.max_vars, 3);
        assert_eq!(program.layout.input_len(), 8);
        assert_eq!(program.layout.output_len(), 4);
        assert_eq!(program.main_file(), "main.c");
    }

    #[test]
    fn test_fingerprint_tracks_sources() {
        let generator = ProgramGenerator::builtin().unwrap();
        let a = generator.generate(&pipeline(), GridDims::new(2, 2, 1)).unwrap();
        let b = generator.generate(&pipeline(), GridDims::new(2, 2, 1)).unwrap();
        let c = generator.generate(&pipeline(), GridDims::new(3, 2, 1)).unwrap();

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert!(a.fingerprint().starts_with("blake3:"));
    }

    #[test]
    fn test_from_config_with_missing_templates_file() {
        let config = EngineConfig {
            templates_path: Some("/nonexistent/enzyme.yaml".into()),
            ..EngineConfig::default()
        };
        let err = ProgramGenerator::from_config(&config).err().unwrap();
        assert!(matches!(err, enzyme_core::EngineError::Template(_)));
    }
}
