//! An immutable complex number with the canonical text rendering used
//! throughout equation output.

use approx::{AbsDiffEq, RelativeEq};
use std::{
    f64::consts::PI,
    fmt::{self, Display, Formatter},
    ops::{Add, Mul, Neg, Sub},
};
use thiserror::Error;

/// How close a value needs to be to an integer (or to `±1` for the imaginary
/// coefficient) before it is displayed as that integer.
pub const TOLERANCE: f64 = 1e-9;

/// The number of significant digits used for values which aren't "nice".
pub const SIGNIFICANT_DIGITS: usize = 4;

/// A complex number, `re + im*i`.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct ComplexNum {
    re: f64,
    im: f64,
}

/// The right hand side of an arithmetic operation, either a plain real number
/// or a full [`ComplexNum`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Operand {
    Real(f64),
    Complex(ComplexNum),
}

impl Operand {
    /// Promote the operand to a [`ComplexNum`], making sure it only contains
    /// finite numbers.
    pub fn to_complex(self) -> Result<ComplexNum, ComplexError> {
        let value = match self {
            Operand::Real(re) => ComplexNum::real(re),
            Operand::Complex(c) => c,
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(ComplexError::InvalidOperand { value: self })
        }
    }
}

impl From<f64> for Operand {
    fn from(re: f64) -> Self { Operand::Real(re) }
}

impl From<i32> for Operand {
    fn from(re: i32) -> Self { Operand::Real(f64::from(re)) }
}

impl From<(f64, f64)> for Operand {
    fn from((re, im): (f64, f64)) -> Self {
        Operand::Complex(ComplexNum::new(re, im))
    }
}

impl From<ComplexNum> for Operand {
    fn from(c: ComplexNum) -> Self { Operand::Complex(c) }
}

impl From<&ComplexNum> for Operand {
    fn from(c: &ComplexNum) -> Self { Operand::Complex(*c) }
}

/// Errors raised by [`ComplexNum`] arithmetic.
#[derive(Debug, Copy, Clone, PartialEq, Error)]
pub enum ComplexError {
    #[error("{value:?} is not a finite number")]
    InvalidOperand { value: Operand },
    #[error("attempted to divide by zero")]
    DivisionByZero,
}

impl ComplexNum {
    pub const ZERO: ComplexNum = ComplexNum::new(0.0, 0.0);
    pub const ONE: ComplexNum = ComplexNum::new(1.0, 0.0);
    pub const I: ComplexNum = ComplexNum::new(0.0, 1.0);

    pub const fn new(re: f64, im: f64) -> Self { ComplexNum { re, im } }

    pub const fn real(re: f64) -> Self { ComplexNum::new(re, 0.0) }

    pub fn re(self) -> f64 { self.re }

    pub fn im(self) -> f64 { self.im }

    /// An *exact* test against zero.
    pub fn is_zero(self) -> bool { self.re == 0.0 && self.im == 0.0 }

    pub fn is_finite(self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }

    pub fn conjugate(self) -> Self { ComplexNum::new(self.re, -self.im) }

    /// The squared modulus, `re² + im²`.
    pub fn norm_sqr(self) -> f64 { self.re * self.re + self.im * self.im }

    pub fn plus<O: Into<Operand>>(self, other: O) -> Result<Self, ComplexError> {
        let other = other.into().to_complex()?;
        Ok(self + other)
    }

    pub fn minus<O: Into<Operand>>(
        self,
        other: O,
    ) -> Result<Self, ComplexError> {
        let other = other.into().to_complex()?;
        Ok(self - other)
    }

    pub fn times<O: Into<Operand>>(
        self,
        other: O,
    ) -> Result<Self, ComplexError> {
        let other = other.into().to_complex()?;
        Ok(self * other)
    }

    /// Divide by multiplying with the divisor's conjugate and dividing by its
    /// squared modulus.
    pub fn divided_by<O: Into<Operand>>(
        self,
        other: O,
    ) -> Result<Self, ComplexError> {
        let other = other.into().to_complex()?;
        let denominator = other.norm_sqr();

        if denominator == 0.0 {
            return Err(ComplexError::DivisionByZero);
        }

        let numerator = self * other.conjugate();
        Ok(ComplexNum::new(
            numerator.re / denominator,
            numerator.im / denominator,
        ))
    }

    pub fn reciprocal(self) -> Result<Self, ComplexError> {
        ComplexNum::ONE.divided_by(self)
    }

    /// Raise this number to a (possibly complex) power using its polar form.
    ///
    /// The angle is only resolved for the real and imaginary axes, anything
    /// else uses `atan(im/re)`, so bases in the left half-plane end up on
    /// the wrong branch.
    pub fn pow<O: Into<Operand>>(
        self,
        exponent: O,
    ) -> Result<Self, ComplexError> {
        let ComplexNum { re: c, im: d } = exponent.into().to_complex()?;

        if self.is_zero() {
            return Ok(if c == 0.0 && d == 0.0 {
                ComplexNum::ONE
            } else {
                ComplexNum::ZERO
            });
        }

        let angle = match (self.re, self.im) {
            (re, im) if re == 0.0 && im < 0.0 => 3.0 * PI / 2.0,
            (re, im) if re == 0.0 && im > 0.0 => PI / 2.0,
            (re, im) if re < 0.0 && im == 0.0 => PI,
            (re, im) if re > 0.0 && im == 0.0 => 0.0,
            (re, im) => (im / re).atan(),
        };

        let ln_modulus = self.norm_sqr().sqrt().ln();
        let phi = ln_modulus * c - angle * d;
        let theta = ln_modulus * d + angle * c;
        let magnitude = phi.exp();

        Ok(ComplexNum::new(
            theta.cos() * magnitude,
            theta.sin() * magnitude,
        ))
    }
}

impl Add for ComplexNum {
    type Output = ComplexNum;

    fn add(self, rhs: ComplexNum) -> ComplexNum {
        ComplexNum::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for ComplexNum {
    type Output = ComplexNum;

    fn sub(self, rhs: ComplexNum) -> ComplexNum {
        ComplexNum::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for ComplexNum {
    type Output = ComplexNum;

    fn mul(self, rhs: ComplexNum) -> ComplexNum {
        ComplexNum::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl Neg for ComplexNum {
    type Output = ComplexNum;

    fn neg(self) -> ComplexNum { ComplexNum::new(-self.re, -self.im) }
}

impl From<f64> for ComplexNum {
    fn from(re: f64) -> Self { ComplexNum::real(re) }
}

impl Display for ComplexNum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let re = format_part(self.re);

        if is_integer(self.im) && self.im.round() == 0.0 {
            return write!(f, "{}", re);
        }

        let operator = if self.im > 0.0 { '+' } else { '-' };
        let magnitude = self.im.abs();

        if (magnitude - 1.0).abs() < TOLERANCE {
            write!(f, "{} {} i", re, operator)
        } else {
            write!(f, "{} {} {}i", re, operator, format_part(magnitude))
        }
    }
}

fn is_integer(value: f64) -> bool { (value - value.round()).abs() < TOLERANCE }

/// Render one component of a complex number.
///
/// Values within [`TOLERANCE`] of an integer snap to it, values with at most
/// four decimal places print as-is, and everything else is printed with
/// [`SIGNIFICANT_DIGITS`] significant digits.
fn format_part(value: f64) -> String {
    if is_integer(value) {
        // adding zero turns -0 into 0
        return format!("{}", value.round() + 0.0);
    }

    if (value * 10_000.0).fract() == 0.0 {
        format!("{}", value)
    } else {
        to_precision(value, SIGNIFICANT_DIGITS)
    }
}

/// Enough digits to hold the exact decimal expansion of any `f64`.
const EXACT_DIGITS: usize = 800;

/// Format a number using `precision` significant digits, switching to
/// exponential notation (`1.235e+4`) when the exponent is less than -6 or at
/// least `precision`.
///
/// Rounding looks at the exact decimal expansion of `value` and rounds a tie
/// up to the larger digit, so `0.015625` becomes `0.01563`.
fn to_precision(value: f64, precision: usize) -> String {
    debug_assert!(precision > 0);

    if !value.is_finite() || value == 0.0 {
        return format!("{}", value);
    }

    let exact = format!("{:.*e}", EXACT_DIGITS, value.abs());
    let (mantissa, exponent) = match exact.split_once('e') {
        Some(parts) => parts,
        None => return exact,
    };
    let mut exponent: i32 = exponent.parse().unwrap_or_default();
    let mut digits: Vec<u8> = mantissa
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect();

    let round_up = digits.get(precision).map_or(false, |&d| d >= 5);
    digits.truncate(precision);

    if round_up {
        let carried = increment(&mut digits);
        if carried {
            digits.insert(0, 1);
            digits.truncate(precision);
            exponent += 1;
        }
    }

    let digits: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
    let sign = if value < 0.0 { "-" } else { "" };

    if exponent < -6 || exponent >= precision as i32 {
        let (first, rest) = digits.split_at(1);
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        let dot = if rest.is_empty() { "" } else { "." };

        format!(
            "{}{}{}{}e{}{}",
            sign,
            first,
            dot,
            rest,
            exponent_sign,
            exponent.abs()
        )
    } else if exponent < 0 {
        let zeros = "0".repeat((-exponent - 1) as usize);
        format!("{}0.{}{}", sign, zeros, digits)
    } else {
        let (whole, fraction) = digits.split_at(exponent as usize + 1);

        if fraction.is_empty() {
            format!("{}{}", sign, whole)
        } else {
            format!("{}{}.{}", sign, whole, fraction)
        }
    }
}

/// Add one to a run of decimal digits, returning `true` when it carries out
/// of the most significant digit.
fn increment(digits: &mut [u8]) -> bool {
    for digit in digits.iter_mut().rev() {
        if *digit == 9 {
            *digit = 0;
        } else {
            *digit += 1;
            return false;
        }
    }

    true
}

impl AbsDiffEq for ComplexNum {
    type Epsilon = f64;

    fn default_epsilon() -> f64 { f64::default_epsilon() }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.re.abs_diff_eq(&other.re, epsilon)
            && self.im.abs_diff_eq(&other.im, epsilon)
    }
}

impl RelativeEq for ComplexNum {
    fn default_max_relative() -> f64 { f64::default_max_relative() }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: f64,
        max_relative: f64,
    ) -> bool {
        self.re.relative_eq(&other.re, epsilon, max_relative)
            && self.im.relative_eq(&other.im, epsilon, max_relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn add_and_subtract() {
        let a = ComplexNum::new(1.5, -2.0);
        let b = ComplexNum::new(0.5, 4.0);

        assert_eq!(a.plus(b).unwrap(), ComplexNum::new(2.0, 2.0));
        assert_eq!(a.minus(b).unwrap(), ComplexNum::new(1.0, -6.0));
        assert_eq!(a.plus(2.0).unwrap(), ComplexNum::new(3.5, -2.0));
        assert_eq!(a.minus((1.0, 1.0)).unwrap(), ComplexNum::new(0.5, -3.0));
    }

    #[test]
    fn multiply() {
        let a = ComplexNum::new(1.0, 2.0);
        let b = ComplexNum::new(3.0, -1.0);

        assert_eq!(a.times(b).unwrap(), ComplexNum::new(5.0, 5.0));
        assert_eq!(a.times(-1).unwrap(), ComplexNum::new(-1.0, -2.0));
        assert_eq!(ComplexNum::I * ComplexNum::I, ComplexNum::real(-1.0));
    }

    #[test]
    fn divide() {
        let a = ComplexNum::new(5.0, 5.0);
        let b = ComplexNum::new(3.0, -1.0);

        let got = a.divided_by(b).unwrap();

        assert_relative_eq!(got, ComplexNum::new(1.0, 2.0));
    }

    #[test]
    fn dividing_by_zero_is_an_error() {
        let a = ComplexNum::new(5.0, 5.0);

        assert_eq!(
            a.divided_by(ComplexNum::ZERO),
            Err(ComplexError::DivisionByZero)
        );
        assert_eq!(a.divided_by(0.0), Err(ComplexError::DivisionByZero));
        assert_eq!(
            ComplexNum::ZERO.reciprocal(),
            Err(ComplexError::DivisionByZero)
        );
    }

    #[test]
    fn non_finite_operands_are_rejected() {
        let a = ComplexNum::ONE;

        assert!(matches!(
            a.plus(f64::NAN),
            Err(ComplexError::InvalidOperand { .. })
        ));
        assert!(matches!(
            a.times((1.0, f64::INFINITY)),
            Err(ComplexError::InvalidOperand { .. })
        ));
        assert!(matches!(
            a.divided_by(f64::NEG_INFINITY),
            Err(ComplexError::InvalidOperand { .. })
        ));
    }

    #[test]
    fn reciprocal_and_conjugate() {
        let a = ComplexNum::new(0.0, 2.0);

        assert_relative_eq!(a.reciprocal().unwrap(), ComplexNum::new(0.0, -0.5));
        assert_eq!(a.conjugate(), ComplexNum::new(0.0, -2.0));
    }

    #[test]
    fn powers() {
        assert_relative_eq!(
            ComplexNum::I.pow(2).unwrap(),
            ComplexNum::real(-1.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            ComplexNum::real(2.0).pow(3).unwrap(),
            ComplexNum::real(8.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            ComplexNum::new(1.0, 1.0).pow(2).unwrap(),
            ComplexNum::new(0.0, 2.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            ComplexNum::real(4.0).pow(0.5).unwrap(),
            ComplexNum::real(2.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn left_half_plane_bases_use_the_principal_arctangent() {
        // atan(1 / -1) lands in the fourth quadrant, so the result is
        // reflected through the origin instead of giving back -1 + i
        let base = ComplexNum::new(-1.0, 1.0);

        let got = base.pow(1).unwrap();

        assert_relative_eq!(got, ComplexNum::new(1.0, -1.0), epsilon = 1e-12);
        assert!(!approx::relative_eq!(got, base, epsilon = 1e-6));
    }

    #[test]
    fn zero_to_a_power() {
        assert_eq!(ComplexNum::ZERO.pow(0).unwrap(), ComplexNum::ONE);
        assert_eq!(ComplexNum::ZERO.pow(3).unwrap(), ComplexNum::ZERO);
        assert_eq!(ComplexNum::ZERO.pow((0.0, 1.0)).unwrap(), ComplexNum::ZERO);
    }

    #[test]
    fn exact_zero_check() {
        assert!(ComplexNum::ZERO.is_zero());
        assert!(ComplexNum::new(-0.0, 0.0).is_zero());
        assert!(!ComplexNum::real(1e-300).is_zero());
    }

    macro_rules! display_test {
        ($name:ident, $re:expr, $im:expr, $should_be:expr) => {
            #[test]
            fn $name() {
                let got = ComplexNum::new($re, $im).to_string();

                assert_eq!(got, $should_be);
            }
        };
    }

    display_test!(display_integer, 3.0, 0.0, "3");
    display_test!(display_zero, 0.0, 0.0, "0");
    display_test!(display_negative_zero, -0.0, -0.0, "0");
    display_test!(display_negative_integer, -7.0, 0.0, "-7");
    display_test!(display_snaps_to_integer, 2.0000000000001, 0.0, "2");
    display_test!(display_short_decimal, 0.25, 0.0, "0.25");
    display_test!(display_third, 1.0 / 3.0, 0.0, "0.3333");
    display_test!(display_two_thirds, -2.0 / 3.0, 0.0, "-0.6667");
    display_test!(display_rounds_up_a_digit, 9.99996, 0.0, "10.00");
    display_test!(display_large_value, 12345.678912, 0.0, "1.235e+4");
    display_test!(display_tiny_value, 0.00000012346, 0.0, "1.235e-7");
    display_test!(display_rounds_ties_up, 0.015625, 0.0, "0.01563");
    display_test!(display_rounds_negative_ties_away_from_zero, -0.015625, 0.0, "-0.01563");
    display_test!(display_small_fixed_point, 0.000123456, 0.0, "0.0001235");
    display_test!(display_plus_i, 3.0, 1.0, "3 + i");
    display_test!(display_minus_i, 3.0, -1.0, "3 - i");
    display_test!(display_pure_imaginary, 0.0, 2.0, "0 + 2i");
    display_test!(display_negative_imaginary, 1.5, -2.5, "1.5 - 2.5i");
    display_test!(display_fractional_imaginary, 1.0, 2.0 / 3.0, "1 + 0.6667i");
    display_test!(display_tiny_imaginary_is_dropped, 4.0, 1e-12, "4");
}
