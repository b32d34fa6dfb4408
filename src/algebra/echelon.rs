//! Elementary row operations and Gaussian elimination.
//!
//! The reduction works recursively: find a pivot in the leading column, use
//! it to clear the rest of that column, then reduce the minor left over when
//! the pivot's row and column are removed. Pivots are chosen with an exact
//! zero test, so there is no partial pivoting and near-singular systems may
//! pick up rounding noise as a pivot.

use crate::{
    algebra::{Matrix, MatrixError},
    complex::{ComplexNum, Operand},
};
use log::trace;

impl Matrix {
    fn check_row(&self, row: usize) -> Result<(), MatrixError> {
        if row < self.rows {
            Ok(())
        } else {
            Err(MatrixError::RowOutOfRange {
                row,
                rows: self.rows,
            })
        }
    }

    /// Copy the cells, let `func` modify them, and wrap the result up as a
    /// new matrix with the same shape and labels.
    fn with_cells<F>(&self, func: F) -> Matrix
    where
        F: FnOnce(&mut [ComplexNum], usize),
    {
        let mut cells = self.cells.to_vec();
        func(&mut cells, self.columns);

        Matrix::from_cells(cells, self.columns, self.rows).with_labels_of(self)
    }

    /// Swap two rows.
    pub fn swap_rows(
        &self,
        first: usize,
        second: usize,
    ) -> Result<Matrix, MatrixError> {
        self.check_row(first)?;
        self.check_row(second)?;

        Ok(self.with_cells(|cells, columns| {
            for column in 0..columns {
                cells.swap(
                    first * columns + column,
                    second * columns + column,
                );
            }
        }))
    }

    /// Multiply every element in a row by some scalar.
    pub fn gauss_scale<O: Into<Operand>>(
        &self,
        row: usize,
        scalar: O,
    ) -> Result<Matrix, MatrixError> {
        self.check_row(row)?;
        let scalar = scalar.into().to_complex()?;

        Ok(self.with_cells(|cells, columns| {
            for cell in &mut cells[row * columns..(row + 1) * columns] {
                *cell = *cell * scalar;
            }
        }))
    }

    /// Add the row, `source`, to `destination`.
    pub fn gauss_add(
        &self,
        destination: usize,
        source: usize,
    ) -> Result<Matrix, MatrixError> {
        self.check_row(destination)?;
        self.check_row(source)?;

        Ok(self.with_cells(|cells, columns| {
            for column in 0..columns {
                let value = cells[source * columns + column];
                cells[destination * columns + column] =
                    cells[destination * columns + column] + value;
            }
        }))
    }

    /// Add `scalar` times the `source` row to `destination`, leaving `source`
    /// as it was.
    pub fn gauss_move<O: Into<Operand>>(
        &self,
        destination: usize,
        source: usize,
        scalar: O,
    ) -> Result<Matrix, MatrixError> {
        let moved = self
            .gauss_scale(source, scalar)?
            .gauss_add(destination, source)?;

        let start = source * self.columns;
        let original = &self.cells[start..start + self.columns];

        Ok(moved.with_cells(|cells, columns| {
            cells[source * columns..(source + 1) * columns]
                .copy_from_slice(original);
        }))
    }

    /// Place `other` to the right of this matrix.
    pub fn concat_right(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.rows != other.rows {
            return Err(MatrixError::ShapeMismatch {
                operation: "concatenate",
                left: (self.rows, self.columns),
                right: (other.rows, other.columns),
            });
        }

        let columns = self.columns + other.columns;

        Ok(Matrix::init(columns, self.rows, |column, row| {
            if column < self.columns {
                self[(column, row)]
            } else {
                other[(column - self.columns, row)]
            }
        }))
    }

    /// Place `other` underneath this matrix.
    pub fn concat_under(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.columns != other.columns {
            return Err(MatrixError::ShapeMismatch {
                operation: "stack",
                left: (self.rows, self.columns),
                right: (other.rows, other.columns),
            });
        }

        let cells = self
            .cells
            .iter()
            .chain(other.cells.iter())
            .copied()
            .collect();

        Ok(Matrix::from_cells(cells, self.columns, self.rows + other.rows))
    }

    /// Drop the first column.
    pub fn shift_col(&self) -> Result<Matrix, MatrixError> {
        if self.columns < 2 {
            return Err(MatrixError::Empty);
        }

        Ok(Matrix::init(self.columns - 1, self.rows, |column, row| {
            self[(column + 1, row)]
        }))
    }

    /// A single-row matrix containing a copy of `row`.
    fn row_matrix(&self, row: usize) -> Matrix {
        Matrix::init(self.columns, 1, |column, _| self[(column, row)])
    }

    /// Reduce the matrix to row-echelon form (REF).
    ///
    /// The first non-zero entry of each non-zero row is scaled to `1` and
    /// every entry underneath it is zero.
    pub fn row_echelon(&self) -> Result<Matrix, MatrixError> {
        Ok(self.echelon()?.with_labels_of(self))
    }

    fn echelon(&self) -> Result<Matrix, MatrixError> {
        if self.rows == 1 {
            let leading = self.cells.iter().find(|value| !value.is_zero());

            return match leading {
                Some(leading) => self.gauss_scale(0, leading.reciprocal()?),
                None => Ok(self.clone()),
            };
        }

        if self.columns == 1 {
            if self.cells.iter().all(|value| value.is_zero()) {
                return Ok(self.clone());
            }

            return Ok(Matrix::init(1, self.rows, |_, row| {
                if row == 0 {
                    ComplexNum::ONE
                } else {
                    ComplexNum::ZERO
                }
            }));
        }

        let pivot_row = (0..self.rows).find(|&row| !self[(0, row)].is_zero());

        let pivot_row = match pivot_row {
            Some(row) => row,
            None => {
                trace!(
                    "Column is empty, reducing the remaining {} columns",
                    self.columns - 1
                );
                let rest = self.shift_col()?.echelon()?;
                return Matrix::zeros(1, self.rows).concat_right(&rest);
            },
        };

        trace!(
            "Using row {} as the pivot of a {}x{} matrix",
            pivot_row,
            self.rows,
            self.columns
        );

        let mut matrix = if pivot_row == 0 {
            self.clone()
        } else {
            self.swap_rows(pivot_row, 0)?
        };

        let pivot = matrix[(0, 0)];
        matrix = matrix.gauss_scale(0, pivot.reciprocal()?)?;

        for row in 1..matrix.rows {
            let entry = matrix[(0, row)];

            if !entry.is_zero() {
                matrix = matrix.gauss_move(row, 0, -entry)?;
            }
        }

        let rest = matrix.without(0, 0).echelon()?;
        let underneath =
            Matrix::zeros(1, matrix.rows - 1).concat_right(&rest)?;

        matrix.row_matrix(0).concat_under(&underneath)
    }

    /// Reduce the matrix to reduced row-echelon form (RREF) by clearing the
    /// entries above each leading entry of the row-echelon form.
    pub fn reduced_row_echelon(&self) -> Result<Matrix, MatrixError> {
        let mut matrix = self.row_echelon()?;

        for row in 0..matrix.rows {
            let leading = (0..matrix.columns)
                .find(|&column| !matrix[(column, row)].is_zero());

            // everything underneath an empty row is also empty
            let leading = match leading {
                Some(column) => column,
                None => break,
            };

            for above in 0..row {
                let entry = matrix[(leading, above)];

                if !entry.is_zero() {
                    matrix = matrix.gauss_move(above, row, -entry)?;
                }
            }
        }

        Ok(matrix)
    }
}
