//! A rectangular matrix of [`ComplexNum`]s with the structural and arithmetic
//! operations needed to reduce and invert small systems.

use crate::complex::{ComplexError, ComplexNum, Operand};
use approx::{AbsDiffEq, RelativeEq};
use nalgebra::{Complex, DMatrix};
use once_cell::unsync::OnceCell;
use smol_str::SmolStr;
use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::Index,
};
use thiserror::Error;

/// A general-purpose MxN matrix laid out sequentially in memory.
///
/// Every operation returns a brand new matrix, so a matrix never shares
/// storage with the matrices it was derived from.
#[derive(Clone)]
pub struct Matrix {
    pub(super) cells: Box<[ComplexNum]>,
    pub(super) columns: usize,
    pub(super) rows: usize,
    pub(super) labels: Option<Box<[SmolStr]>>,
    pub(super) determinant: OnceCell<ComplexNum>,
}

/// Errors that can occur while building or combining [`Matrix`]es.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    #[error("a matrix needs at least one row and one column")]
    Empty,
    #[error("row {row} has {found} entries, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("the element at row {row}, column {column} is not a finite number")]
    InvalidElement { row: usize, column: usize },
    #[error(
        "row {row}, column {column} is outside a {rows}x{columns} matrix"
    )]
    IndexOutOfRange {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },
    #[error("row {row} is outside a matrix with {rows} rows")]
    RowOutOfRange { row: usize, rows: usize },
    #[error("unable to {operation} a {left:?} matrix and a {right:?} matrix")]
    ShapeMismatch {
        operation: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },
    #[error("expected a square matrix, found {rows}x{columns}")]
    NotSquare { rows: usize, columns: usize },
    #[error("expected {expected} column labels, found {found}")]
    LabelCount { expected: usize, found: usize },
    #[error(transparent)]
    Arithmetic(#[from] ComplexError),
}

impl Matrix {
    /// Create a new [`Matrix`] by invoking some `fn(column, row) -> T`
    /// function for each cell.
    pub(crate) fn init<F>(columns: usize, rows: usize, mut get_cell: F) -> Self
    where
        F: FnMut(usize, usize) -> ComplexNum,
    {
        let mut cells = Vec::with_capacity(columns * rows);

        for row in 0..rows {
            for column in 0..columns {
                cells.push(get_cell(column, row));
            }
        }

        Matrix::from_cells(cells, columns, rows)
    }

    /// A version of [`Matrix::init()`] which lets you initialize a matrix
    /// using a function which may fail.
    pub(crate) fn try_init<F, E>(
        columns: usize,
        rows: usize,
        mut get_cell: F,
    ) -> Result<Self, E>
    where
        F: FnMut(usize, usize) -> Result<ComplexNum, E>,
    {
        let mut cells = Vec::with_capacity(columns * rows);

        for row in 0..rows {
            for column in 0..columns {
                cells.push(get_cell(column, row)?);
            }
        }

        Ok(Matrix::from_cells(cells, columns, rows))
    }

    pub(super) fn from_cells(
        cells: Vec<ComplexNum>,
        columns: usize,
        rows: usize,
    ) -> Self {
        debug_assert_eq!(cells.len(), columns * rows);

        Matrix {
            cells: cells.into_boxed_slice(),
            columns,
            rows,
            labels: None,
            determinant: OnceCell::new(),
        }
    }

    /// Build a matrix from a list of equal-length rows, promoting plain real
    /// numbers to [`ComplexNum`]s.
    ///
    /// ```rust
    /// # use complex_systems::{ComplexNum, Matrix};
    /// let m = Matrix::from_rows(vec![
    ///     vec![ComplexNum::from(1.0), ComplexNum::new(0.0, 2.0)],
    ///     vec![ComplexNum::from(3.0), ComplexNum::from(4.0)],
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(m.num_rows(), 2);
    /// assert_eq!(m[(1, 0)], ComplexNum::I * ComplexNum::from(2.0));
    /// ```
    pub fn from_rows<R, T>(rows: R) -> Result<Self, MatrixError>
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = T>,
        T: Into<Operand>,
    {
        let mut cells = Vec::new();
        let mut columns = None;
        let mut row_count = 0;

        for (row, entries) in rows.into_iter().enumerate() {
            let mut found = 0;

            for (column, entry) in entries.into_iter().enumerate() {
                let value = entry.into().to_complex().map_err(|_| {
                    MatrixError::InvalidElement { row, column }
                })?;
                cells.push(value);
                found += 1;
            }

            match columns {
                None => columns = Some(found),
                Some(expected) if expected != found => {
                    return Err(MatrixError::RaggedRows {
                        row,
                        expected,
                        found,
                    });
                },
                Some(_) => {},
            }

            row_count += 1;
        }

        match columns {
            Some(columns) if columns > 0 => {
                Ok(Matrix::from_cells(cells, columns, row_count))
            },
            _ => Err(MatrixError::Empty),
        }
    }

    /// The `n`x`n` identity matrix.
    pub fn identity(n: usize) -> Result<Self, MatrixError> {
        if n == 0 {
            return Err(MatrixError::Empty);
        }

        let identity = Matrix::init(n, n, |column, row| {
            if column == row {
                ComplexNum::ONE
            } else {
                ComplexNum::ZERO
            }
        });
        let _ = identity.determinant.set(ComplexNum::ONE);

        Ok(identity)
    }

    pub(crate) fn zeros(columns: usize, rows: usize) -> Self {
        Matrix::init(columns, rows, |_, _| ComplexNum::ZERO)
    }

    pub fn num_rows(&self) -> usize { self.rows }

    pub fn num_columns(&self) -> usize { self.columns }

    pub fn is_square(&self) -> bool { self.rows == self.columns }

    pub fn rows(&self) -> impl Iterator<Item = &[ComplexNum]> + '_ {
        self.cells.chunks_exact(self.columns)
    }

    pub fn row(&self, row: usize) -> Option<&[ComplexNum]> {
        if row < self.rows {
            Some(&self.cells[row * self.columns..(row + 1) * self.columns])
        } else {
            None
        }
    }

    fn index(&self, column: usize, row: usize) -> usize {
        row * self.columns + column
    }

    pub fn get(&self, column: usize, row: usize) -> Option<&ComplexNum> {
        if column < self.columns && row < self.rows {
            self.cells.get(self.index(column, row))
        } else {
            None
        }
    }

    pub fn cells(
        &self,
    ) -> impl Iterator<Item = (usize, usize, &ComplexNum)> + '_ {
        let columns = self.columns;

        self.cells.iter().enumerate().map(move |(i, value)| {
            (i % columns, i / columns, value)
        })
    }

    /// A column-major view of the matrix.
    pub fn get_columns(&self) -> Vec<Vec<ComplexNum>> {
        (0..self.columns)
            .map(|column| {
                (0..self.rows).map(|row| self[(column, row)]).collect()
            })
            .collect()
    }

    /// The labels attached to each column, if any.
    pub fn labels(&self) -> Option<&[SmolStr]> { self.labels.as_deref() }

    /// Attach a label to each column.
    pub fn with_labels<I, S>(mut self, labels: I) -> Result<Self, MatrixError>
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        let labels: Box<[SmolStr]> =
            labels.into_iter().map(Into::into).collect();

        if labels.len() != self.columns {
            return Err(MatrixError::LabelCount {
                expected: self.columns,
                found: labels.len(),
            });
        }

        self.labels = Some(labels);
        Ok(self)
    }

    pub(super) fn with_labels_of(mut self, other: &Matrix) -> Self {
        if self.columns == other.columns {
            self.labels = other.labels.clone();
        }
        self
    }

    fn shape(&self) -> (usize, usize) { (self.rows, self.columns) }

    fn map<F>(&self, mut func: F) -> Matrix
    where
        F: FnMut(ComplexNum) -> ComplexNum,
    {
        let cells = self.cells.iter().map(|&value| func(value)).collect();
        Matrix::from_cells(cells, self.columns, self.rows)
    }

    pub fn transpose(&self) -> Matrix {
        let transposed =
            Matrix::init(self.rows, self.columns, |column, row| {
                self[(row, column)]
            });

        if let Some(&determinant) = self.determinant.get() {
            let _ = transposed.determinant.set(determinant);
        }

        transposed
    }

    /// Take the complex conjugate of every element.
    pub fn conjugate(&self) -> Matrix { self.map(ComplexNum::conjugate) }

    /// The conjugate transpose.
    pub fn adjoint(&self) -> Matrix { self.conjugate().transpose() }

    /// A copy of this matrix with `row` and `column` removed.
    ///
    /// Fails with [`MatrixError::IndexOutOfRange`] when `row` or `column`
    /// doesn't exist, and with [`MatrixError::Empty`] when the matrix only
    /// has a single row or column, because nothing would be left over.
    pub fn minor(
        &self,
        row: usize,
        column: usize,
    ) -> Result<Matrix, MatrixError> {
        if row >= self.rows || column >= self.columns {
            return Err(MatrixError::IndexOutOfRange {
                row,
                column,
                rows: self.rows,
                columns: self.columns,
            });
        }
        if self.rows == 1 || self.columns == 1 {
            return Err(MatrixError::Empty);
        }

        Ok(self.without(row, column))
    }

    /// [`Matrix::minor()`] without any bounds checks, callers must make sure
    /// there is at least one row and column left over.
    pub(super) fn without(&self, row: usize, column: usize) -> Matrix {
        debug_assert!(self.rows > 1 && self.columns > 1);

        Matrix::init(self.columns - 1, self.rows - 1, |c, r| {
            let c = if c >= column { c + 1 } else { c };
            let r = if r >= row { r + 1 } else { r };
            self[(c, r)]
        })
    }

    /// The matrix product, `self * other`.
    pub fn times(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.columns != other.rows {
            return Err(MatrixError::ShapeMismatch {
                operation: "multiply",
                left: self.shape(),
                right: other.shape(),
            });
        }

        let product = Matrix::init(other.columns, self.rows, |column, row| {
            (0..self.columns).fold(ComplexNum::ZERO, |sum, i| {
                sum + self[(i, row)] * other[(column, i)]
            })
        });

        if let (Some(&left), Some(&right)) =
            (self.determinant.get(), other.determinant.get())
        {
            let _ = product.determinant.set(left * right);
        }

        Ok(product)
    }

    /// Multiply every element by a scalar.
    pub fn scale<O: Into<Operand>>(
        &self,
        scalar: O,
    ) -> Result<Matrix, MatrixError> {
        let scalar = scalar.into().to_complex()?;
        Ok(self.map(|value| value * scalar))
    }

    pub fn plus(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip_with(other, "add", |left, right| left + right)
    }

    pub fn minus(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip_with(other, "subtract", |left, right| left - right)
    }

    fn zip_with<F>(
        &self,
        other: &Matrix,
        operation: &'static str,
        mut func: F,
    ) -> Result<Matrix, MatrixError>
    where
        F: FnMut(ComplexNum, ComplexNum) -> ComplexNum,
    {
        if self.shape() != other.shape() {
            return Err(MatrixError::ShapeMismatch {
                operation,
                left: self.shape(),
                right: other.shape(),
            });
        }

        let cells = self
            .cells
            .iter()
            .zip(other.cells.iter())
            .map(|(&left, &right)| func(left, right))
            .collect();

        Ok(Matrix::from_cells(cells, self.columns, self.rows))
    }

    /// The determinant, calculated using cofactor expansion along the first
    /// row and remembered afterwards.
    ///
    /// Returns `None` when the matrix isn't square.
    pub fn determinant(&self) -> Option<ComplexNum> {
        if self.is_square() {
            Some(self.square_determinant())
        } else {
            None
        }
    }

    fn square_determinant(&self) -> ComplexNum {
        debug_assert!(self.is_square());

        *self.determinant.get_or_init(|| {
            if self.rows == 1 {
                return self.cells[0];
            }

            (0..self.columns).fold(ComplexNum::ZERO, |sum, column| {
                let sign = if column % 2 == 0 { 1.0 } else { -1.0 };
                let minor = self.without(0, column);

                sum + ComplexNum::real(sign)
                    * self[(column, 0)]
                    * minor.square_determinant()
            })
        })
    }

    fn ensure_square(&self) -> Result<(), MatrixError> {
        if self.is_square() {
            Ok(())
        } else {
            Err(MatrixError::NotSquare {
                rows: self.rows,
                columns: self.columns,
            })
        }
    }

    /// The matrix where each element is replaced by the determinant of its
    /// minor.
    pub fn minors(&self) -> Result<Matrix, MatrixError> {
        self.ensure_square()?;

        if self.rows == 1 {
            return Ok(Matrix::init(1, 1, |_, _| ComplexNum::ONE));
        }

        Ok(Matrix::init(self.columns, self.rows, |column, row| {
            self.without(row, column).square_determinant()
        }))
    }

    /// The matrix of minors with a checkerboard of alternating signs applied.
    pub fn cofactor(&self) -> Result<Matrix, MatrixError> {
        let minors = self.minors()?;

        Ok(Matrix::init(self.columns, self.rows, |column, row| {
            let value = minors[(column, row)];
            if (column + row) % 2 == 0 {
                value
            } else {
                -value
            }
        }))
    }

    /// The classical adjoint, the transpose of the cofactor matrix.
    pub fn adjugate(&self) -> Result<Matrix, MatrixError> {
        self.cofactor().map(|cofactor| cofactor.transpose())
    }

    /// Calculate the inverse.
    ///
    /// Returns `Ok(None)` when the matrix isn't square or the determinant is
    /// exactly zero.
    pub fn inverse(&self) -> Result<Option<Matrix>, MatrixError> {
        let determinant = match self.determinant() {
            Some(determinant) if !determinant.is_zero() => determinant,
            _ => return Ok(None),
        };

        let scalar = determinant.reciprocal()?;
        let inverse = self.adjugate()?.scale(scalar)?;

        Ok(Some(inverse))
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Matrix) -> bool {
        self.shape() == other.shape() && self.cells == other.cells
    }
}

impl Debug for Matrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows()).finish()
    }
}

impl Display for Matrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> =
            self.cells.iter().map(ToString::to_string).collect();

        let widths: Vec<usize> = (0..self.columns)
            .map(|column| {
                (0..self.rows)
                    .map(|row| rendered[self.index(column, row)].len())
                    .max()
                    .unwrap_or_default()
            })
            .collect();

        for row in 0..self.rows {
            if row > 0 {
                writeln!(f)?;
            }

            write!(f, "|")?;

            for (column, width) in widths.iter().enumerate() {
                let text = &rendered[self.index(column, row)];
                write!(f, "({}){:pad$}", text, "", pad = width - text.len() + 1)?;
            }

            write!(f, "|")?;
        }

        Ok(())
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = ComplexNum;

    fn index(&self, (column, row): (usize, usize)) -> &Self::Output {
        assert!(column < self.columns, "Column index out of bounds");
        assert!(row < self.rows, "Row index out of bounds");

        &self.cells[self.index(column, row)]
    }
}

impl AbsDiffEq for Matrix {
    type Epsilon = f64;

    fn default_epsilon() -> f64 { ComplexNum::default_epsilon() }

    fn abs_diff_eq(&self, other: &Matrix, epsilon: f64) -> bool {
        self.shape() == other.shape()
            && self
                .cells
                .iter()
                .zip(other.cells.iter())
                .all(|(left, right)| left.abs_diff_eq(right, epsilon))
    }
}

impl RelativeEq for Matrix {
    fn default_max_relative() -> f64 { ComplexNum::default_max_relative() }

    fn relative_eq(
        &self,
        other: &Matrix,
        epsilon: f64,
        max_relative: f64,
    ) -> bool {
        self.shape() == other.shape()
            && self.cells.iter().zip(other.cells.iter()).all(
                |(left, right)| left.relative_eq(right, epsilon, max_relative),
            )
    }
}

impl From<&Matrix> for DMatrix<Complex<f64>> {
    fn from(matrix: &Matrix) -> Self {
        DMatrix::from_fn(matrix.rows, matrix.columns, |row, column| {
            let value = matrix[(column, row)];
            Complex::new(value.re(), value.im())
        })
    }
}

impl TryFrom<&DMatrix<Complex<f64>>> for Matrix {
    type Error = MatrixError;

    fn try_from(other: &DMatrix<Complex<f64>>) -> Result<Self, Self::Error> {
        if other.nrows() == 0 || other.ncols() == 0 {
            return Err(MatrixError::Empty);
        }

        Matrix::try_init(other.ncols(), other.nrows(), |column, row| {
            let Complex { re, im } = other[(row, column)];
            let value = ComplexNum::new(re, im);

            if value.is_finite() {
                Ok(value)
            } else {
                Err(MatrixError::InvalidElement { row, column })
            }
        })
    }
}
