//! Tensor: dense single-precision buffer with a row-major shape
//!
//! Tensors handed to the engine carry the spatial grid on their leading
//! three axes; the trailing axes are the per-cell values a stage consumes.
use crate::error::{EngineError, Result};
use crate::shape::Shape;

/// Number of leading axes that index the spatial grid.
pub const GRID_RANK: usize = 3;

/// Spatial grid dimensions `(ni, nj, nk)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    pub ni: usize,
    pub nj: usize,
    pub nk: usize,
}

impl GridDims {
    pub fn new(ni: usize, nj: usize, nk: usize) -> Self {
        Self { ni, nj, nk }
    }

    pub fn cells(&self) -> usize {
        self.ni * self.nj * self.nk
    }

    pub fn shape(&self) -> Shape {
        Shape::from([self.ni, self.nj, self.nk])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f32>,
}

impl Tensor {
    /// Wraps `data` in `shape`; the element counts must agree.
    pub fn new(shape: impl Into<Shape>, data: Vec<f32>) -> Result<Self> {
        let shape = shape.into();
        if shape.elem_count() != data.len() {
            return Err(EngineError::shape(format!(
                "shape {} holds {} elements, buffer has {}",
                shape,
                shape.elem_count(),
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn zeros(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let data = vec![0.0; shape.elem_count()];
        Self { shape, data }
    }

    /// Builds a tensor by evaluating `f` at every row-major flat index.
    pub fn from_fn(shape: impl Into<Shape>, f: impl FnMut(usize) -> f32) -> Self {
        let shape = shape.into();
        let data = (0..shape.elem_count()).map(f).collect();
        Self { shape, data }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The leading three axes as grid dimensions.
    pub fn grid_dims(&self) -> Result<GridDims> {
        match self.shape.dims() {
            [ni, nj, nk, ..] => Ok(GridDims::new(*ni, *nj, *nk)),
            _ => Err(EngineError::shape(format!(
                "tensor of shape {} has fewer than {} grid axes",
                self.shape, GRID_RANK
            ))),
        }
    }

    /// Shape of one grid cell's values (every axis after the grid).
    pub fn cell_shape(&self) -> Shape {
        self.shape.trailing(GRID_RANK)
    }

    /// Same buffer under a new shape with the same element count.
    pub fn reshape(self, shape: impl Into<Shape>) -> Result<Self> {
        Tensor::new(shape, self.data)
    }

    /// Values stored at grid cell `(i, j, k)`.
    pub fn cell(&self, i: usize, j: usize, k: usize) -> Result<&[f32]> {
        let grid = self.grid_dims()?;
        if i >= grid.ni || j >= grid.nj || k >= grid.nk {
            return Err(EngineError::shape(format!(
                "cell ({}, {}, {}) outside grid {}",
                i,
                j,
                k,
                grid.shape()
            )));
        }
        let width = self.cell_shape().elem_count();
        let start = ((i * grid.nj + j) * grid.nk + k) * width;
        Ok(&self.data[start..start + width])
    }
}
