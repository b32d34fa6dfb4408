use crate::{
    algebra::{Matrix, MatrixError},
    complex::ComplexNum,
    parse::{parse_equation, ParseError},
    solve::{ReducedSystem, SolveError},
};
use smol_str::SmolStr;
use std::{
    fmt::{self, Display, Formatter},
    iter::{Extend, FromIterator},
    str::FromStr,
};

/// The label given to the right hand side column of an augmented matrix.
pub const RHS_LABEL: &str = "rhs";

/// A single linear equation, stored as the coefficient for each unknown (in
/// the order they were first mentioned) plus the value on the right hand
/// side.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    coefficients: Vec<(SmolStr, ComplexNum)>,
    rhs: ComplexNum,
}

impl Equation {
    pub fn new(rhs: ComplexNum) -> Self {
        Equation {
            coefficients: Vec::new(),
            rhs,
        }
    }

    pub fn with<S: Into<SmolStr>>(
        mut self,
        unknown: S,
        coefficient: ComplexNum,
    ) -> Self {
        self.set(unknown, coefficient);
        self
    }

    pub fn with_rhs(self, rhs: ComplexNum) -> Self { Equation { rhs, ..self } }

    /// Set the coefficient for an unknown.
    ///
    /// Mentioning the same unknown twice replaces its coefficient instead of
    /// adding to it, and the unknown keeps its original position.
    pub fn set<S: Into<SmolStr>>(
        &mut self,
        unknown: S,
        coefficient: ComplexNum,
    ) {
        let unknown = unknown.into();
        let existing = self
            .coefficients
            .iter_mut()
            .find(|(name, _)| *name == unknown);

        match existing {
            Some((_, existing)) => *existing = coefficient,
            None => self.coefficients.push((unknown, coefficient)),
        }
    }

    pub fn coefficient(&self, unknown: &str) -> Option<ComplexNum> {
        self.coefficients
            .iter()
            .find(|(name, _)| name == unknown)
            .map(|&(_, value)| value)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&SmolStr, ComplexNum)> + '_ {
        self.coefficients.iter().map(|(name, value)| (name, *value))
    }

    pub fn unknowns(&self) -> impl Iterator<Item = &SmolStr> + '_ {
        self.coefficients.iter().map(|(name, _)| name)
    }

    pub fn rhs(&self) -> ComplexNum { self.rhs }
}

impl FromStr for Equation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { parse_equation(s) }
}

impl Display for Equation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.coefficients.iter().enumerate() {
            let negative = value.im() == 0.0 && value.re() < 0.0;
            let magnitude = if negative { -*value } else { *value };

            match (i, negative) {
                (0, true) => write!(f, "-")?,
                (0, false) => {},
                (_, true) => write!(f, " - ")?,
                (_, false) => write!(f, " + ")?,
            }

            write_magnitude(f, magnitude)?;
            write!(f, "{}", name)?;
        }

        write!(f, " = ")?;

        if self.rhs.im() == 0.0 {
            write!(f, "{}", self.rhs)
        } else {
            write!(f, "({})", self.rhs)
        }
    }
}

fn write_magnitude(f: &mut Formatter<'_>, value: ComplexNum) -> fmt::Result {
    let rendered = value.to_string();

    if rendered == "1" {
        Ok(())
    } else if value.im() != 0.0 {
        write!(f, "({})", rendered)
    } else {
        write!(f, "{}", rendered)
    }
}

/// A builder for constructing a system of linear equations and solving it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SystemOfEquations {
    equations: Vec<Equation>,
}

impl SystemOfEquations {
    pub fn new() -> Self { SystemOfEquations::default() }

    /// Parse each line of text as an [`Equation`].
    pub fn from_equations<S: AsRef<str>>(
        equations: &[S],
    ) -> Result<Self, SolveError> {
        equations
            .iter()
            .enumerate()
            .map(|(index, src)| {
                let src = src.as_ref();
                parse_equation(src).map_err(|source| SolveError::Parse {
                    index,
                    equation: src.to_string(),
                    source,
                })
            })
            .collect()
    }

    pub fn with(mut self, equation: Equation) -> Self {
        self.push(equation);
        self
    }

    pub fn push(&mut self, equation: Equation) {
        self.equations.push(equation);
    }

    pub fn equations(&self) -> &[Equation] { &self.equations }

    pub fn len(&self) -> usize { self.equations.len() }

    pub fn is_empty(&self) -> bool { self.equations.is_empty() }

    /// Every unknown mentioned by the system, in the order they first appear.
    pub fn unknowns(&self) -> Vec<SmolStr> {
        let mut unknowns: Vec<SmolStr> = Vec::new();

        for unknown in self.equations.iter().flat_map(Equation::unknowns) {
            if !unknowns.contains(unknown) {
                unknowns.push(unknown.clone());
            }
        }

        unknowns
    }

    /// Build the augmented matrix, with one column per unknown followed by a
    /// column for the right hand side. Unknowns an equation doesn't mention
    /// get a coefficient of zero.
    pub fn augmented_matrix(&self) -> Result<Matrix, MatrixError> {
        if self.equations.is_empty() {
            return Err(MatrixError::Empty);
        }

        let unknowns = self.unknowns();
        let columns = unknowns.len() + 1;

        let rows = self.equations.len();

        let matrix = Matrix::try_init(columns, rows, |column, row| {
            let equation = &self.equations[row];

            let value = match unknowns.get(column) {
                Some(unknown) => {
                    equation.coefficient(unknown).unwrap_or(ComplexNum::ZERO)
                },
                None => equation.rhs(),
            };

            if value.is_finite() {
                Ok(value)
            } else {
                Err(MatrixError::InvalidElement { row, column })
            }
        })?;

        let labels = unknowns
            .into_iter()
            .chain(std::iter::once(SmolStr::new(RHS_LABEL)));
        matrix.with_labels(labels)
    }

    /// Reduce the system's augmented matrix to reduced row-echelon form.
    pub fn solve(&self) -> Result<ReducedSystem, MatrixError> {
        let augmented = self.augmented_matrix()?;
        ReducedSystem::from_augmented(&augmented)
    }
}

impl Extend<Equation> for SystemOfEquations {
    fn extend<T: IntoIterator<Item = Equation>>(&mut self, iter: T) {
        self.equations.extend(iter);
    }
}

impl FromIterator<Equation> for SystemOfEquations {
    fn from_iter<T: IntoIterator<Item = Equation>>(iter: T) -> Self {
        SystemOfEquations {
            equations: Vec::from_iter(iter),
        }
    }
}
