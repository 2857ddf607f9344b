//! Shape: dimension sizes of a dense, row-major tensor
use serde::{Deserialize, Serialize};
use std::fmt;

/// N-dimensional shape. A scalar shape `[]` holds one element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Shape(Vec<usize>);

impl Shape {
    pub fn new(dims: Vec<usize>) -> Self {
        Shape(dims)
    }

    pub fn scalar() -> Self {
        Shape(Vec::new())
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Product of all dimensions; 1 for a scalar.
    pub fn elem_count(&self) -> usize {
        self.0.iter().product()
    }

    /// Shape made of the first `n` axes.
    pub fn leading(&self, n: usize) -> Shape {
        Shape(self.0[..n.min(self.rank())].to_vec())
    }

    /// Shape made of every axis after the first `n`.
    pub fn trailing(&self, n: usize) -> Shape {
        Shape(self.0[n.min(self.rank())..].to_vec())
    }

    /// `self` followed by `other`'s axes.
    pub fn concat(&self, other: &Shape) -> Shape {
        let mut dims = self.0.clone();
        dims.extend_from_slice(&other.0);
        Shape(dims)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Shape(dims.to_vec())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        if self.0.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}
