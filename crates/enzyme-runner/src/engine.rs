//! Orchestrator: validate, generate, build, run, reshape.
use enzyme_codegen::ProgramGenerator;
use enzyme_core::{
    EngineConfig, EngineError, GridDims, Pipeline, Result, RunReport, Tensor,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::build_dir::BuildDir;
use crate::compiler::build_program;
use crate::process::run_program;
use crate::wire::{decode_f32s, encode_f32s};

/// Compiles and runs pipelines. Every call builds from scratch in its own
/// directory, so one engine can serve concurrent calls.
pub struct Engine {
    config: EngineConfig,
    generator: ProgramGenerator,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let generator = ProgramGenerator::from_config(&config)?;
        Ok(Self { config, generator })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn execute(&self, pipeline: &Pipeline, input: &Tensor) -> Result<Tensor> {
        self.execute_with_report(pipeline, input)
            .await
            .map(|(output, _)| output)
    }

    /// Like [`Engine::execute`], also reporting what the call did.
    pub async fn execute_with_report(
        &self,
        pipeline: &Pipeline,
        input: &Tensor,
    ) -> Result<(Tensor, RunReport)> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "execute",
            run_id = %run_id,
            pipeline_id = pipeline.pipeline_id()
        );
        let run = self.run(run_id, pipeline, input).instrument(span);

        match self.config.timeout() {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(run_id = %run_id, ?limit, "execute timed out, driver killed");
                    Err(EngineError::execution(
                        format!("timed out after {} ms", limit.as_millis()),
                        "",
                    ))
                }
            },
            None => run.await,
        }
    }

    /// Synchronous entry point. Inside a tokio runtime it fails with
    /// `Config` instead of blocking a worker thread; use [`Engine::execute`]
    /// there.
    pub fn execute_blocking(&self, pipeline: &Pipeline, input: &Tensor) -> Result<Tensor> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(EngineError::Config(
                "execute_blocking called from inside a tokio runtime; await Engine::execute instead"
                    .to_string(),
            ));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.execute(pipeline, input))
    }

    async fn run(
        &self,
        run_id: Uuid,
        pipeline: &Pipeline,
        input: &Tensor,
    ) -> Result<(Tensor, RunReport)> {
        let grid = validate_input(pipeline, input)?;
        let program = self.generator.generate(pipeline, grid)?;
        let layout = program.layout;

        let build_dir = BuildDir::create(&self.config.build_root, run_id)?;
        program.write_to(build_dir.path())?;
        let build = build_program(&self.config, build_dir.path(), program.main_file()).await?;

        let exec = run_program(
            &build.executable,
            encode_f32s(input.data()),
            layout.input_bytes(),
            layout.output_bytes(),
        )
        .await?;
        let values = decode_f32s(&exec.stdout, layout.output_len())?;
        let output = Tensor::new(grid.shape().concat(pipeline.sink_shape()), values)?;

        let report = RunReport {
            run_id: run_id.to_string(),
            pipeline_id: pipeline.pipeline_id().to_string(),
            source_hash: program.fingerprint(),
            bytes_written: exec.bytes_written,
            bytes_read: exec.stdout.len(),
            build_ms: build.elapsed.as_millis() as u64,
            run_ms: exec.elapsed.as_millis() as u64,
        };
        tracing::info!(
            output_shape = %output.shape(),
            build_ms = report.build_ms,
            run_ms = report.run_ms,
            "pipeline executed"
        );
        drop(build_dir);
        Ok((output, report))
    }
}

/// Checks `input` against the pipeline before anything touches the disk and
/// returns its grid dimensions.
pub fn validate_input(pipeline: &Pipeline, input: &Tensor) -> Result<GridDims> {
    let grid = input.grid_dims()?;
    if grid.cells() == 0 {
        return Err(EngineError::shape(format!(
            "grid {} has no cells",
            grid.shape()
        )));
    }

    let cell = input.cell_shape();
    if cell.elem_count() != pipeline.num_inputs() {
        return Err(EngineError::shape(format!(
            "input cells of shape {} hold {} values, first stage '{}' expects {} (shape {})",
            cell,
            cell.elem_count(),
            pipeline.stages()[0].id(),
            pipeline.num_inputs(),
            pipeline.source_shape()
        )));
    }
    Ok(grid)
}

/// Runs `pipeline` on `input` with the configuration from
/// [`EngineConfig::from_env`], blocking the calling thread.
pub fn execute(pipeline: &Pipeline, input: &Tensor) -> Result<Tensor> {
    Engine::new(EngineConfig::from_env()?)?.execute_blocking(pipeline, input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use enzyme_core::{GeneratedStage, Shape, Stage};

    fn pipeline(source: &[usize], sink: &[usize]) -> Pipeline {
        let stages: Vec<Box<dyn Stage>> = vec![Box::new(GeneratedStage::new("s", source, sink, ""))];
        Pipeline::new(stages).unwrap()
    }

    #[test]
    fn test_validate_accepts_matching_cells() {
        let p = pipeline(&[2, 2], &[1]);
        let grid = validate_input(&p, &Tensor::zeros([3, 2, 1, 4])).unwrap();
        assert_eq!(grid, GridDims::new(3, 2, 1));
    }

    #[test]
    fn test_validate_accepts_scalar_cells() {
        let p = pipeline(&[], &[3]);
        assert!(validate_input(&p, &Tensor::zeros([2, 2, 2])).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_cell_size() {
        let p = pipeline(&[4], &[1]);
        let err = validate_input(&p, &Tensor::zeros([2, 2, 2, 3])).unwrap_err();
        assert!(matches!(err, EngineError::ShapeMismatch(_)));
        assert!(err.to_string().contains("expects 4"));
    }

    #[test]
    fn test_validate_rejects_missing_grid_axes() {
        let p = pipeline(&[1], &[1]);
        let err = validate_input(&p, &Tensor::zeros(Shape::from([4, 4]))).unwrap_err();
        assert!(matches!(err, EngineError::ShapeMismatch(_)));
    }

    #[test]
    fn test_validate_rejects_empty_grid() {
        let p = pipeline(&[1], &[1]);
        let err = validate_input(&p, &Tensor::zeros([4, 0, 2, 1])).unwrap_err();
        assert!(matches!(err, EngineError::ShapeMismatch(_)));
    }

    #[tokio::test]
    async fn test_blocking_inside_runtime_is_rejected() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let p = pipeline(&[1], &[1]);
        let x = Tensor::zeros([1, 1, 1, 1]);

        let err = engine.execute_blocking(&p, &x).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
        assert!(err.to_string().contains("inside a tokio runtime"));

        assert!(matches!(execute(&p, &x), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_engine_with_bad_templates_path() {
        let config = EngineConfig {
            templates_path: Some("/nonexistent/templates.yaml".into()),
            ..EngineConfig::default()
        };
        assert!(matches!(Engine::new(config), Err(EngineError::Template(_))));
    }
}
