//! Solve systems of linear equations with complex coefficients.
//!
//! Equations are written the way a person would type them (e.g.
//! `2x + (1 - i)y = 5`), turned into an augmented [`Matrix`], reduced to
//! reduced row-echelon form, and then rendered back as text.
//!
//! ```rust
//! use complex_systems::{render_solution, solve_system};
//!
//! let reduced = solve_system(&["x + y = 2", "x - y = (0 + 2i)"]).unwrap();
//! let solution = render_solution(&reduced.matrix, &reduced.labels).unwrap();
//!
//! assert_eq!(solution.into_lines(), vec!["x = 1 + i", "y = 1 - i"]);
//! ```

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod algebra;
mod complex;
mod equations;
mod parse;
#[cfg(test)]
mod proptests;
mod solve;

pub use algebra::{Matrix, MatrixError};
pub use complex::{
    ComplexError, ComplexNum, Operand, SIGNIFICANT_DIGITS, TOLERANCE,
};
pub use equations::{Equation, SystemOfEquations, RHS_LABEL};
pub use parse::{parse_equation, ParseError};
pub use solve::{
    render_solution, solve_system, ReducedSystem, Solution, SolveError,
    NO_SOLUTION,
};
