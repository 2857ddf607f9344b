//! Enzyme Core: Stage Trait, Pipeline, Tensor and Error Model
//!
//! Shared vocabulary of the pipeline engine. The expression compiler hands
//! over stages (shapes plus a generated C body); `enzyme-codegen` turns a
//! `Pipeline` into sources and `enzyme-runner` builds and executes them.

pub mod config;
pub mod data_model;
pub mod error;
pub mod pipeline;
pub mod shape;
pub mod stage;
pub mod tensor;

pub use config::EngineConfig;
pub use data_model::RunReport;
pub use error::{Direction, EngineError, Result};
pub use pipeline::Pipeline;
pub use shape::Shape;
pub use stage::{single_io, GeneratedStage, Stage, StageIo, TensorValue};
pub use tensor::{GridDims, Tensor, GRID_RANK};
