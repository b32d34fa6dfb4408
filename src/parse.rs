use crate::{complex::ComplexNum, equations::Equation};
use smol_str::SmolStr;
use std::ops::Range;
use thiserror::Error;

/// Parse a single linear equation (e.g. `2x + (1 - 3i)y = 5`) into its
/// coefficients and right hand side.
pub fn parse_equation(src: &str) -> Result<Equation, ParseError> {
    Parser::new(src).equation()
}

/// A hand-written, single pass scanner for linear equations.
///
/// The grammar:
///
/// ```text
/// equation  := term (("+" | "-") term)* "=" "-"? magnitude
/// term      := ("+" | "-")? magnitude? UNKNOWN
/// magnitude := NUMBER
///            | "(" "-"? NUMBER ("+" | "-") NUMBER? "*"? "i" ")"
/// ```
///
/// Unknowns are runs of ASCII letters and are folded to lowercase.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Parser<'a> {
    src: &'a str,
    cursor: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(src: &'a str) -> Self { Parser { src, cursor: 0 } }

    fn rest(&self) -> &'a str { &self.src[self.cursor..] }

    fn peek(&self) -> Option<char> { self.rest().chars().next() }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) { self.take_while(char::is_whitespace); }

    fn take_while<P>(&mut self, mut predicate: P) -> (&'a str, Range<usize>)
    where
        P: FnMut(char) -> bool,
    {
        let start = self.cursor;

        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }

            self.advance();
        }

        let end = self.cursor;
        (&self.src[start..end], start..end)
    }

    fn unexpected(&self) -> ParseError {
        match self.peek() {
            Some(character) => ParseError::InvalidCharacter {
                character,
                index: self.cursor,
            },
            None => ParseError::UnexpectedEndOfInput,
        }
    }

    pub(crate) fn equation(mut self) -> Result<Equation, ParseError> {
        let mut equation = Equation::new(ComplexNum::ZERO);
        let mut first = true;

        self.skip_whitespace();

        loop {
            match self.peek() {
                Some('=') => break,
                None => return Err(ParseError::MissingEquals),
                Some(_) => {
                    let (unknown, coefficient) = self.term(first)?;
                    equation.set(unknown, coefficient);
                    first = false;
                },
            }

            self.skip_whitespace();
        }

        if first {
            return Err(ParseError::ExpectedUnknown { index: self.cursor });
        }

        let rhs = self.result()?;

        self.skip_whitespace();
        if self.peek().is_some() {
            return Err(self.unexpected());
        }

        Ok(equation.with_rhs(rhs))
    }

    /// One signed term, `[sign][magnitude]unknown`. Only the first term in an
    /// equation may leave out its sign.
    fn term(
        &mut self,
        first: bool,
    ) -> Result<(SmolStr, ComplexNum), ParseError> {
        let negative = match self.peek() {
            Some('+') => {
                self.advance();
                false
            },
            Some('-') => {
                self.advance();
                true
            },
            Some(_) if first => false,
            _ => return Err(self.unexpected()),
        };

        self.skip_whitespace();

        let magnitude = match self.peek() {
            Some(c) if c.is_ascii_digit() || c == '.' => self.real()?,
            Some('(') => self.complex()?,
            _ => ComplexNum::ONE,
        };

        self.skip_whitespace();
        let unknown = self.unknown()?;

        let coefficient = if negative { -magnitude } else { magnitude };
        Ok((unknown, coefficient))
    }

    fn unknown(&mut self) -> Result<SmolStr, ParseError> {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                let (name, _) = self.take_while(|c| c.is_ascii_alphabetic());
                Ok(SmolStr::new(name.to_ascii_lowercase()))
            },
            Some('=') => Err(ParseError::ExpectedUnknown { index: self.cursor }),
            _ => Err(self.unexpected()),
        }
    }

    fn number(&mut self) -> Result<f64, ParseError> {
        let (text, span) = self.take_while(|c| c.is_ascii_digit() || c == '.');

        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(ParseError::InvalidNumber {
                text: text.into(),
                span,
            }),
        }
    }

    fn real(&mut self) -> Result<ComplexNum, ParseError> {
        self.number().map(ComplexNum::real)
    }

    /// A parenthesised complex literal, `(a + bi)` or `(a - bi)`.
    fn complex(&mut self) -> Result<ComplexNum, ParseError> {
        let open_paren = self.advance();
        debug_assert_eq!(open_paren, Some('('));
        self.skip_whitespace();

        let negative_real = self.peek() == Some('-');
        if negative_real {
            self.advance();
        }

        match self.peek() {
            Some(c) if c.is_ascii_digit() || c == '.' => {},
            _ => return Err(self.malformed("expected the real part")),
        }
        let re = self.number()?;
        let re = if negative_real { -re } else { re };

        self.skip_whitespace();
        let sign = match self.advance() {
            Some('+') => 1.0,
            Some('-') => -1.0,
            _ => {
                return Err(self.malformed(
                    "expected a \"+\" or \"-\" between the real and imaginary parts",
                ))
            },
        };

        self.skip_whitespace();
        let im = match self.peek() {
            Some(c) if c.is_ascii_digit() || c == '.' => self.number()?,
            _ => 1.0,
        };

        self.take_while(|c| c.is_whitespace() || c == '*');
        if self.peek() != Some('i') {
            return Err(self.malformed("expected the imaginary unit, \"i\""));
        }
        self.advance();

        self.skip_whitespace();
        if self.peek() != Some(')') {
            return Err(self.malformed("expected a closing parenthesis"));
        }
        self.advance();

        Ok(ComplexNum::new(re, im * sign))
    }

    fn malformed(&self, reason: &'static str) -> ParseError {
        ParseError::MalformedComplex {
            reason,
            index: self.cursor,
        }
    }

    /// Everything after the `=`.
    fn result(&mut self) -> Result<ComplexNum, ParseError> {
        let equals = self.advance();
        debug_assert_eq!(equals, Some('='));
        self.skip_whitespace();

        let negative = self.peek() == Some('-');
        if negative {
            self.advance();
            self.skip_whitespace();
        }

        let value = match self.peek() {
            Some(c) if c.is_ascii_digit() || c == '.' => self.real()?,
            Some('(') => self.complex()?,
            _ => return Err(self.unexpected()),
        };

        Ok(if negative { -value } else { value })
    }
}

/// Possible errors that may occur while parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected character {character:?} at index {index}")]
    InvalidCharacter { character: char, index: usize },
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("\"{text}\" is not a valid number")]
    InvalidNumber { text: SmolStr, span: Range<usize> },
    #[error("malformed complex number at index {index}: {reason}")]
    MalformedComplex { reason: &'static str, index: usize },
    #[error("expected an unknown at index {index}")]
    ExpectedUnknown { index: usize },
    #[error("the equation doesn't contain an \"=\"")]
    MissingEquals,
}
