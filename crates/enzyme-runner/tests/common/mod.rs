//! Shared fixtures for tests that compile and run real driver programs.
#![allow(dead_code)]

use enzyme_core::{EngineConfig, GeneratedStage, Pipeline, Stage, Tensor};
use std::path::{Path, PathBuf};

/// Compiler used by the tests; `ENZYME_CC` overrides `cc`.
pub fn compiler() -> String {
    std::env::var("ENZYME_CC").unwrap_or_else(|_| "cc".to_string())
}

pub fn compiler_available() -> bool {
    std::process::Command::new(compiler())
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Private build root, removed on drop.
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// `None` (with a note on stderr) when no C compiler is installed.
    pub fn with_compiler() -> Option<Self> {
        init_tracing();
        if !compiler_available() {
            eprintln!("skipping: C compiler '{}' not found", compiler());
            return None;
        }
        Some(Self::new())
    }

    pub fn new() -> Self {
        let root = std::env::temp_dir().join(format!("enzyme-it-{}", uuid::Uuid::new_v4().simple()));
        std::fs::create_dir_all(&root).unwrap();
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_build_root(&self.root)
            .with_compiler(compiler())
    }

    /// Entries left behind in the build root.
    pub fn leftovers(&self) -> Vec<PathBuf> {
        std::fs::read_dir(&self.root)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

/// Wraps `inner` in loops over every grid cell `(i, j, k)`.
pub fn per_cell(inner: &str) -> String {
    format!(
        "    for (int i = 0; i < ni; ++i)\n\
         \x20       for (int j = 0; j < nj; ++j)\n\
         \x20           for (int k = 0; k < nk; ++k) {{\n\
         {}\n\
         \x20           }}",
        inner
    )
}

pub fn stage(id: &str, source: &[usize], sink: &[usize], body: String) -> Box<dyn Stage> {
    Box::new(GeneratedStage::new(id, source, sink, body))
}

/// Copies every input value to the same output slot.
pub fn identity(id: &str, shape: &[usize]) -> Box<dyn Stage> {
    stage(
        id,
        shape,
        shape,
        per_cell("for (int v = 0; v < NUM_INPUTS; ++v) OUT(i, j, k, v) = IN(i, j, k, v);"),
    )
}

pub fn pipeline(stages: Vec<Box<dyn Stage>>) -> Pipeline {
    Pipeline::new(stages).unwrap()
}

/// Deterministic, sign-mixed sample data.
pub fn sample(shape: &[usize]) -> Tensor {
    Tensor::from_fn(shape, |n| ((n * 7919) % 1000) as f32 / 100.0 - 5.0)
}

pub fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (n, (a, e)) in actual.iter().zip(expected).enumerate() {
        let tol = 1e-5 * e.abs().max(1.0);
        assert!((a - e).abs() <= tol, "element {}: got {}, expected {}", n, a, e);
    }
}
