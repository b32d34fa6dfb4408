use crate::{
    algebra::{Matrix, MatrixError},
    complex::{ComplexNum, TOLERANCE},
    equations::SystemOfEquations,
    parse::ParseError,
};
use log::debug;
use smol_str::SmolStr;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// The message reported for an inconsistent system.
pub const NO_SOLUTION: &str = "No solution exists";

/// Parse a set of equations, build their augmented matrix, and reduce it to
/// reduced row-echelon form.
///
/// ```rust
/// # use complex_systems::solve_system;
/// let reduced = solve_system(&["x + y = 3", "x - y = 1"]).unwrap();
///
/// let solution = reduced.render().unwrap();
///
/// assert_eq!(solution.into_lines(), vec!["x = 2", "y = 1"]);
/// ```
pub fn solve_system<S: AsRef<str>>(
    equations: &[S],
) -> Result<ReducedSystem, SolveError> {
    let system = SystemOfEquations::from_equations(equations)?;
    let reduced = system.solve()?;

    debug!(
        "Reduced {} equations in {} unknowns",
        system.len(),
        reduced.labels.len() - 1
    );

    Ok(reduced)
}

/// An augmented matrix in reduced row-echelon form, plus the names of its
/// columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedSystem {
    pub matrix: Matrix,
    pub labels: Vec<SmolStr>,
}

impl ReducedSystem {
    pub(crate) fn from_augmented(
        augmented: &Matrix,
    ) -> Result<ReducedSystem, MatrixError> {
        let matrix = augmented.reduced_row_echelon()?;
        let labels = matrix
            .labels()
            .map(|labels| labels.to_vec())
            .unwrap_or_default();

        Ok(ReducedSystem { matrix, labels })
    }

    pub fn render(&self) -> Result<Solution, MatrixError> {
        render_solution(&self.matrix, &self.labels)
    }
}

/// Errors that can happen while solving a system of equations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("unable to parse equation {index} ({equation:?})")]
    Parse {
        index: usize,
        equation: String,
        #[source]
        source: ParseError,
    },
    #[error("unable to reduce the system")]
    Matrix(#[from] MatrixError),
}

/// The result of interpreting a reduced system.
#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    /// One rendered equation per row with at least one non-zero
    /// coefficient.
    Solved(Vec<String>),
    /// The system is inconsistent.
    NoSolution,
}

impl Solution {
    /// The lines of text a user would see.
    pub fn into_lines(self) -> Vec<String> {
        match self {
            Solution::Solved(lines) => lines,
            Solution::NoSolution => vec![NO_SOLUTION.to_string()],
        }
    }

    pub fn is_consistent(&self) -> bool {
        matches!(self, Solution::Solved(_))
    }
}

impl Display for Solution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Solution::Solved(lines) => {
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", line)?;
                }
                Ok(())
            },
            Solution::NoSolution => write!(f, "{}", NO_SOLUTION),
        }
    }
}

/// Turn each row of a reduced augmented matrix back into an equation.
///
/// Rows where every coefficient is zero are dropped, unless their right hand
/// side isn't zero, in which case the whole system has no solution.
pub fn render_solution<S: AsRef<str>>(
    matrix: &Matrix,
    labels: &[S],
) -> Result<Solution, MatrixError> {
    if labels.len() != matrix.num_columns() {
        return Err(MatrixError::LabelCount {
            expected: matrix.num_columns(),
            found: labels.len(),
        });
    }

    let mut lines = Vec::new();

    for (row_number, row) in matrix.rows().enumerate() {
        let (coefficients, rhs) = row.split_at(row.len() - 1);
        let rhs = rhs[0].to_string();
        let terms = render_terms(coefficients, labels);

        if !terms.is_empty() {
            lines.push(format!("{}= {}", terms, rhs));
        } else if rhs != "0" {
            debug!("Row {} reduced to 0 = {}", row_number, rhs);
            return Ok(Solution::NoSolution);
        }
    }

    Ok(Solution::Solved(lines))
}

/// Render the left hand side of a row, with each term followed by a space.
fn render_terms<S: AsRef<str>>(
    coefficients: &[ComplexNum],
    labels: &[S],
) -> String {
    let mut terms = String::new();

    for (value, label) in coefficients.iter().zip(labels) {
        let name = label.as_ref();
        let rendered = value.to_string();

        if rendered == "0" {
            continue;
        } else if rendered == "1" {
            if !terms.is_empty() {
                terms.push_str("+ ");
            }
            terms.push_str(name);
        } else if value.im() != 0.0 {
            terms.push_str(&format!("+ ({}){}", rendered, name));
        } else if value.re() < 0.0 {
            if (value.re() + 1.0).abs() < TOLERANCE {
                terms.push_str(&format!("- {}", name));
            } else {
                terms.push_str(&format!("- {}{}", -*value, name));
            }
        } else {
            terms.push_str(&format!("+ {}{}", rendered, name));
        }

        terms.push(' ');
    }

    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::RHS_LABEL;

    fn lines(solution: Solution) -> Vec<String> { solution.into_lines() }

    #[test]
    fn render_a_unique_solution() {
        let matrix =
            Matrix::from_rows(vec![vec![1, 0, 3], vec![0, 1, 4]]).unwrap();

        let got = render_solution(&matrix, &["x", "y", RHS_LABEL]).unwrap();

        assert_eq!(lines(got), vec!["x = 3", "y = 4"]);
    }

    #[test]
    fn render_free_variables() {
        let matrix = Matrix::from_rows(vec![
            vec![(1.0, 0.0), (2.0, 0.0), (0.0, 0.0), (-1.0, 0.0), (5.0, 0.0)],
            vec![(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, -1.0)],
            vec![(0.0, 0.0); 5],
        ])
        .unwrap();

        let labels = ["a", "b", "c", "d", RHS_LABEL];

        let got = render_solution(&matrix, &labels).unwrap();

        assert_eq!(
            lines(got),
            vec!["a + 2b - d = 5", "c + (0 + i)d = 1 - i"]
        );
    }

    #[test]
    fn render_negative_coefficients() {
        let matrix =
            Matrix::from_rows(vec![vec![1.0, -2.5, 1.0, -0.5]]).unwrap();

        let got =
            render_solution(&matrix, &["x", "y", "z", RHS_LABEL]).unwrap();

        assert_eq!(lines(got), vec!["x - 2.5y + z = -0.5"]);
    }

    #[test]
    fn inconsistent_rows_mean_there_is_no_solution() {
        let matrix =
            Matrix::from_rows(vec![vec![1, 1, 0], vec![0, 0, 1]]).unwrap();

        let got = render_solution(&matrix, &["x", "y", RHS_LABEL]).unwrap();

        assert_eq!(got, Solution::NoSolution);
        assert_eq!(lines(got), vec![NO_SOLUTION]);
    }

    #[test]
    fn labels_must_line_up_with_the_columns() {
        let matrix = Matrix::from_rows(vec![vec![1, 2]]).unwrap();

        let got = render_solution(&matrix, &["x"]);

        assert_eq!(
            got,
            Err(MatrixError::LabelCount {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn solve_a_two_by_two_system() {
        let got = solve_system(&["2x + 3y = 8", "x - y = -1"]).unwrap();

        assert_eq!(got.labels, vec!["x", "y", RHS_LABEL]);
        assert_eq!(lines(got.render().unwrap()), vec!["x = 1", "y = 2"]);
    }

    #[test]
    fn solve_with_different_unknowns_in_each_equation() {
        let got = solve_system(&["x = 3", "y = 4"]).unwrap();

        assert_eq!(
            got.matrix,
            Matrix::from_rows(vec![vec![1, 0, 3], vec![0, 1, 4]]).unwrap()
        );
        assert_eq!(lines(got.render().unwrap()), vec!["x = 3", "y = 4"]);
    }

    #[test]
    fn solve_a_complex_system() {
        let got = solve_system(&["(1 + i)x + y = (1 + 2i)", "x - (0 + i)y = 2"])
            .unwrap();

        assert_eq!(lines(got.render().unwrap()), vec!["x = 1", "y = 0 + i"]);
    }

    #[test]
    fn solve_a_three_by_three_system() {
        let got = solve_system(&[
            "x + y + z = 6",
            "2y + 5z = -4",
            "2x + 5y - z = 27",
        ])
        .unwrap();

        assert_eq!(
            lines(got.render().unwrap()),
            vec!["x = 5", "y = 3", "z = -2"]
        );
    }

    #[test]
    fn inconsistent_systems_have_no_solution() {
        let got = solve_system(&["x + y = 2", "x + y = 5"]).unwrap();

        assert_eq!(
            got.matrix.row(1).unwrap(),
            &[ComplexNum::ZERO, ComplexNum::ZERO, ComplexNum::ONE]
        );
        assert_eq!(lines(got.render().unwrap()), vec!["No solution exists"]);
    }

    #[test]
    fn underdetermined_systems_drop_the_empty_rows() {
        let got = solve_system(&["x + y = 2", "2x + 2y = 4"]).unwrap();

        assert_eq!(lines(got.render().unwrap()), vec!["x + y = 2"]);
    }

    #[test]
    fn parse_errors_are_reported() {
        let got = solve_system(&["x + y = 2", "x + (1 2i)y = 5"]);

        assert!(matches!(
            got,
            Err(SolveError::Parse {
                index: 1,
                source: ParseError::MalformedComplex { .. },
                ..
            })
        ));
    }

    #[test]
    fn overflowing_literals_are_a_parse_error() {
        let equation = format!("x = 1{}", "0".repeat(400));

        let got = solve_system(&[equation.as_str()]);

        assert!(matches!(
            got,
            Err(SolveError::Parse {
                index: 0,
                source: ParseError::InvalidNumber { .. },
                ..
            })
        ));
    }

    #[test]
    fn solutions_can_be_displayed() {
        let solved = Solution::Solved(vec!["x = 1".into(), "y = 2".into()]);

        assert_eq!(solved.to_string(), "x = 1\ny = 2");
        assert_eq!(Solution::NoSolution.to_string(), NO_SOLUTION);
        assert!(solved.is_consistent());
    }
}
