//! The matrix engine.

mod echelon;
mod matrix;

pub use matrix::{Matrix, MatrixError};
