//! Dense sample containers.
//!
//! Data is stored column-major and slice-contiguous: element `(r, c, s)` of a
//! volume lives at `s * rows * cols + c * rows + r`. A [`Matrix`] holds one
//! example per column (feed-forward input), a [`Cube`] one example per slice
//! (convolutional input).

use crate::error::{NetworkError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rows, columns and slices of a single activation volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
    pub slices: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize, slices: usize) -> Self {
        Self { rows, cols, slices }
    }

    /// Column vector shape `(len, 1, 1)`.
    pub fn vector(len: usize) -> Self {
        Self::new(len, 1, 1)
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.rows * self.cols * self.slices
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of elements in one slice.
    pub fn slice_len(&self) -> usize {
        self.rows * self.cols
    }

    /// Flat index of element `(row, col, slice)`.
    #[inline]
    pub fn index(&self, row: usize, col: usize, slice: usize) -> usize {
        slice * self.rows * self.cols + col * self.rows + row
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.rows, self.cols, self.slices)
    }
}

/// A batch of examples that can be fed through a network one at a time.
pub trait SampleBatch {
    /// Number of examples in the batch.
    fn num_examples(&self) -> usize;

    /// Shape of every example.
    fn example_shape(&self) -> Shape;

    /// Flat data of example `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= num_examples()`.
    fn example(&self, index: usize) -> &[f64];
}

/// Column-major matrix; each column is one example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wraps column-major `data`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(NetworkError::ShapeMismatch {
                shape: Shape::new(rows, cols, 1),
                actual: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Builds a matrix whose columns are the given slices.
    pub fn from_columns(columns: &[&[f64]]) -> Result<Self> {
        let rows = columns.first().map_or(0, |c| c.len());
        let mut data = Vec::with_capacity(rows * columns.len());
        for column in columns {
            if column.len() != rows {
                return Err(NetworkError::ShapeMismatch {
                    shape: Shape::new(rows, columns.len(), 1),
                    actual: column.len(),
                });
            }
            data.extend_from_slice(column);
        }
        Ok(Self {
            rows,
            cols: columns.len(),
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[col * self.rows + row]
    }

    pub fn col(&self, index: usize) -> &[f64] {
        &self.data[index * self.rows..(index + 1) * self.rows]
    }

    pub fn col_mut(&mut self, index: usize) -> &mut [f64] {
        &mut self.data[index * self.rows..(index + 1) * self.rows]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

impl SampleBatch for Matrix {
    fn num_examples(&self) -> usize {
        self.cols
    }

    fn example_shape(&self) -> Shape {
        Shape::vector(self.rows)
    }

    fn example(&self, index: usize) -> &[f64] {
        self.col(index)
    }
}

/// Rank-3 volume; each slice is one example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cube {
    rows: usize,
    cols: usize,
    slices: usize,
    data: Vec<f64>,
}

impl Cube {
    pub fn zeros(rows: usize, cols: usize, slices: usize) -> Self {
        Self {
            rows,
            cols,
            slices,
            data: vec![0.0; rows * cols * slices],
        }
    }

    /// Wraps column-major, slice-contiguous `data`.
    pub fn from_vec(rows: usize, cols: usize, slices: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols * slices {
            return Err(NetworkError::ShapeMismatch {
                shape: Shape::new(rows, cols, slices),
                actual: data.len(),
            });
        }
        Ok(Self {
            rows,
            cols,
            slices,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn slices(&self) -> usize {
        self.slices
    }

    pub fn slice(&self, index: usize) -> &[f64] {
        let len = self.rows * self.cols;
        &self.data[index * len..(index + 1) * len]
    }

    pub fn slice_mut(&mut self, index: usize) -> &mut [f64] {
        let len = self.rows * self.cols;
        &mut self.data[index * len..(index + 1) * len]
    }
}

impl SampleBatch for Cube {
    fn num_examples(&self) -> usize {
        self.slices
    }

    fn example_shape(&self) -> Shape {
        Shape::new(self.rows, self.cols, 1)
    }

    fn example(&self, index: usize) -> &[f64] {
        self.slice(index)
    }
}
