//! Enzyme Runner: build and execute generated pipeline programs
//!
//! # Flow
//!
//! ```text
//! validate → generate sources → cc → spawn driver → decode → reshape
//!               ↓                ↓        ↓
//!          build dir        executable  stdin/stdout (f32 LE)
//! ```
//!
//! Every call works in a fresh build directory that is removed on every
//! exit path, including timeouts.
//!
//! # Example
//!
//! ```ignore
//! use enzyme_core::{GeneratedStage, Pipeline, Stage, Tensor};
//!
//! let body = "for (int i = 0; i < ni; ++i) for (int j = 0; j < nj; ++j)
//!             for (int k = 0; k < nk; ++k) OUT(i, j, k, 0) = 2.0f * IN(i, j, k, 0);";
//! let stages: Vec<Box<dyn Stage>> = vec![Box::new(GeneratedStage::new("double", [1], [1], body))];
//! let pipeline = Pipeline::new(stages)?;
//! let y = enzyme_runner::execute(&pipeline, &Tensor::zeros([8, 8, 1, 1]))?;
//! ```

pub mod build_dir;
pub mod compiler;
pub mod engine;
mod group;
pub mod process;
pub mod wire;

pub use build_dir::BuildDir;
pub use compiler::{build_program, BuildOutput};
pub use engine::{execute, validate_input, Engine};
pub use process::{run_program, ExecutionOutput};
pub use wire::{decode_f32s, encode_f32s};
