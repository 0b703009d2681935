//! Expression grammar
//!
//! ```text
//! expression := number [ op number ]
//!             | "factores(" digits ")"
//!             | "√" [ "(" ] text [ ")" ]
//! number     := "-"? digits [ "," digits ]
//! op         := "+" | "-" | "x" | "*" | "×" | "/"
//! ```
//!
//! Whitespace is allowed around the operator. A lone number is rejected:
//! there is nothing to draw for it.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::bignum::BigNumber;
use crate::core::{CalcError, CalcResult};

/// Binary operators of the grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Subtract,
    /// Multiplication (x)
    Multiply,
    /// Long division (/)
    Divide,
}

impl BinaryOp {
    /// Returns the glyph drawn for this operator
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => 'x',
            Self::Divide => '/',
        }
    }

    /// Maps an input character to an operator
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            'x' | 'X' | '*' | '×' => Some(Self::Multiply),
            '/' | '÷' => Some(Self::Divide),
            _ => None,
        }
    }
}

/// A parsed number literal: sign, normalized integer digits and the
/// fractional digits as typed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operand {
    negative: bool,
    integer: String,
    fraction: String,
    display_len: usize,
}

impl Operand {
    /// Parses `-?digits(,digits)?`
    pub fn parse(text: &str) -> CalcResult<Self> {
        let trimmed = text.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (integer, fraction) = match body.split_once(',') {
            Some((int, frac)) => (int, frac),
            None => (body, ""),
        };
        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(integer) || (body.contains(',') && !all_digits(fraction)) {
            return Err(CalcError::invalid_number(text));
        }
        let integer = match integer.trim_start_matches('0') {
            "" => "0".to_string(),
            digits => digits.to_string(),
        };
        let zero = integer == "0" && fraction.bytes().all(|b| b == b'0');
        Ok(Self {
            negative: negative && !zero,
            display_len: integer.len() + fraction.len(),
            integer,
            fraction: fraction.to_string(),
        })
    }

    /// Builds an integer operand from an exact number
    #[must_use]
    pub fn from_integer(value: &BigNumber) -> Self {
        let integer = value.magnitude_string();
        Self {
            negative: value.is_negative(),
            display_len: integer.len(),
            integer,
            fraction: String::new(),
        }
    }

    /// True when the operand is below zero
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.negative
    }

    /// Number of fractional digits
    #[must_use]
    pub fn scale(&self) -> usize {
        self.fraction.len()
    }

    /// True when there is no decimal part
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.fraction.is_empty()
    }

    /// Digit cells the operand takes when drawn (no sign, no comma)
    #[must_use]
    pub const fn display_len(&self) -> usize {
        self.display_len
    }

    /// Integer digits followed by the fraction padded to `scale` digits
    ///
    /// `scale` must be at least [`Self::scale`].
    #[must_use]
    pub fn scaled_digits(&self, scale: usize) -> String {
        debug_assert!(scale >= self.scale());
        let mut digits = String::with_capacity(self.integer.len() + scale);
        digits.push_str(&self.integer);
        digits.push_str(&self.fraction);
        digits.extend(std::iter::repeat('0').take(scale - self.scale()));
        digits
    }

    /// The value as an exact integer; fractional operands are rejected
    pub fn to_integer(&self) -> CalcResult<BigNumber> {
        if !self.is_integer() {
            return Err(CalcError::invalid_number(format!(
                "{self}: decimals are only supported for addition and subtraction"
            )));
        }
        let magnitude = BigNumber::parse(&self.integer)?;
        Ok(if self.negative {
            magnitude.negated()
        } else {
            magnitude
        })
    }

    /// Same digits, sign dropped
    #[must_use]
    pub fn abs(&self) -> Self {
        Self {
            negative: false,
            ..self.clone()
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str(&self.integer)?;
        if !self.fraction.is_empty() {
            write!(f, ",{}", self.fraction)?;
        }
        Ok(())
    }
}

/// A complete calculator input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// `a op b`
    Binary {
        /// Left operand
        left: Operand,
        /// Operator
        op: BinaryOp,
        /// Right operand
        right: Operand,
    },
    /// `factores(n)`
    Factorize(BigNumber),
    /// `√(text)`; the argument is validated by the square root itself
    SquareRoot(String),
}

impl Expression {
    /// Parses a full input line
    pub fn parse(input: &str) -> CalcResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CalcError::invalid_operation("empty expression"));
        }
        if let Some(caps) = factor_pattern().and_then(|re| re.captures(trimmed)) {
            return Ok(Self::Factorize(BigNumber::parse(&caps[1])?));
        }
        if let Some(rest) = trimmed.strip_prefix('√') {
            let rest = rest.trim();
            let argument = rest
                .strip_prefix('(')
                .and_then(|r| r.strip_suffix(')'))
                .unwrap_or(rest);
            return Ok(Self::SquareRoot(argument.trim().to_string()));
        }
        Parser::new(trimmed).parse_binary()
    }

    /// Canonical text used as the history key
    #[must_use]
    pub fn canonical(&self) -> String {
        match self {
            Self::Binary { left, op, right } => format!("{left}{}{right}", op.symbol()),
            Self::Factorize(n) => format!("factores({n})"),
            Self::SquareRoot(arg) => format!("√({arg})"),
        }
    }
}

fn factor_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^factores\(\s*(\d+)\s*\)$").ok())
        .as_ref()
}

/// Token types from lexical analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Number literal
    Number(Operand),
    /// Binary operator
    Operator(BinaryOp),
}

/// Cursor over a binary expression
#[derive(Debug)]
pub struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser for the given input
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Returns the unread input
    #[must_use]
    pub fn remaining(&self) -> &str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.remaining();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Reads a number, including an optional leading minus
    pub fn read_number(&mut self) -> CalcResult<Token> {
        self.skip_whitespace();
        let rest = self.remaining();
        let mut end = usize::from(rest.starts_with('-'));
        let mut seen_comma = false;
        for (idx, c) in rest.char_indices().skip(end) {
            match c {
                '0'..='9' => end = idx + 1,
                ',' if !seen_comma => {
                    seen_comma = true;
                    end = idx + 1;
                }
                _ => break,
            }
        }
        let literal = &rest[..end];
        if literal.is_empty() || literal == "-" {
            return Err(CalcError::invalid_operation(format!(
                "expected a number at '{rest}'"
            )));
        }
        let operand = Operand::parse(literal)
            .map_err(|_| CalcError::invalid_operation(format!("malformed number '{literal}'")))?;
        self.pos += end;
        Ok(Token::Number(operand))
    }

    /// Reads an operator, or `None` at end of input
    pub fn read_operator(&mut self) -> CalcResult<Option<Token>> {
        self.skip_whitespace();
        let Some(c) = self.remaining().chars().next() else {
            return Ok(None);
        };
        let op = BinaryOp::from_char(c)
            .ok_or_else(|| CalcError::invalid_operation(format!("unexpected character '{c}'")))?;
        self.pos += c.len_utf8();
        Ok(Some(Token::Operator(op)))
    }

    /// Parses `number op number` and requires end of input afterwards
    pub fn parse_binary(&mut self) -> CalcResult<Expression> {
        let Token::Number(left) = self.read_number()? else {
            return Err(CalcError::invalid_operation("expected a number"));
        };
        let op = match self.read_operator()? {
            Some(Token::Operator(op)) => op,
            _ => return Err(CalcError::invalid_operation("missing operator")),
        };
        let Token::Number(right) = self.read_number()? else {
            return Err(CalcError::invalid_operation("expected a number"));
        };
        self.skip_whitespace();
        if !self.remaining().is_empty() {
            return Err(CalcError::invalid_operation(format!(
                "unexpected trailing input '{}'",
                self.remaining()
            )));
        }
        Ok(Expression::Binary { left, op, right })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn binary(input: &str) -> (Operand, BinaryOp, Operand) {
        match Expression::parse(input).unwrap() {
            Expression::Binary { left, op, right } => (left, op, right),
            other => panic!("expected binary, got {other:?}"),
        }
    }

    // ===== Operand tests =====

    #[test]
    fn test_operand_normalizes_integer() {
        let op = Operand::parse("007").unwrap();
        assert_eq!(op.to_string(), "7");
        assert_eq!(op.display_len(), 1);
        assert!(op.is_integer());
    }

    #[test]
    fn test_operand_fraction() {
        let op = Operand::parse("-0,05").unwrap();
        assert!(op.is_negative());
        assert_eq!(op.scale(), 2);
        assert_eq!(op.scaled_digits(3), "0050");
        assert_eq!(op.display_len(), 3);
        assert!(op.to_integer().is_err());
    }

    #[test]
    fn test_operand_negative_zero() {
        assert!(!Operand::parse("-0,00").unwrap().is_negative());
    }

    #[test]
    fn test_operand_rejects_malformed() {
        for bad in ["", ",5", "5,", "1,2,3", "a1", "-"] {
            assert!(Operand::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_operand_to_integer() {
        assert_eq!(
            Operand::parse("-42").unwrap().to_integer().unwrap().to_string(),
            "-42"
        );
    }

    // ===== Grammar tests =====

    #[test]
    fn test_parse_all_operators() {
        assert_eq!(binary("12+34").1, BinaryOp::Add);
        assert_eq!(binary("12-34").1, BinaryOp::Subtract);
        assert_eq!(binary("12x34").1, BinaryOp::Multiply);
        assert_eq!(binary("12*34").1, BinaryOp::Multiply);
        assert_eq!(binary("12 / 34").1, BinaryOp::Divide);
    }

    #[test]
    fn test_parse_negative_operands() {
        let (left, op, right) = binary("-5 - -3");
        assert!(left.is_negative());
        assert_eq!(op, BinaryOp::Subtract);
        assert!(right.is_negative());
    }

    #[test]
    fn test_parse_decimal_operands() {
        let (left, _, right) = binary("1,5+22,25");
        assert_eq!(left.scale(), 1);
        assert_eq!(right.scale(), 2);
    }

    #[test]
    fn test_parse_rejects_bad_grammar() {
        for bad in ["", "12", "12+", "+12", "1++2", "12+3x4", "12 % 3", "1,,2+3"] {
            assert!(
                matches!(Expression::parse(bad), Err(CalcError::InvalidOperation(_))),
                "{bad} should be an invalid operation"
            );
        }
    }

    #[test]
    fn test_parse_factorize() {
        assert_eq!(
            Expression::parse("factores(360)").unwrap(),
            Expression::Factorize(BigNumber::from_u64(360))
        );
    }

    #[test]
    fn test_parse_square_root_forms() {
        assert_eq!(
            Expression::parse("√(144)").unwrap(),
            Expression::SquareRoot("144".into())
        );
        assert_eq!(
            Expression::parse("√ 2,25").unwrap(),
            Expression::SquareRoot("2,25".into())
        );
        // argument validation happens later
        assert_eq!(
            Expression::parse("√(4+4)").unwrap(),
            Expression::SquareRoot("4+4".into())
        );
    }

    #[test]
    fn test_canonical_form() {
        assert_eq!(Expression::parse(" 12 * 3 ").unwrap().canonical(), "12x3");
        assert_eq!(Expression::parse("007+1").unwrap().canonical(), "7+1");
        assert_eq!(
            Expression::parse("factores( 12 )").unwrap().canonical(),
            "factores(12)"
        );
    }

    #[test]
    fn test_parser_remaining() {
        let mut parser = Parser::new("12 + 3");
        parser.read_number().unwrap();
        assert_eq!(parser.remaining(), " + 3");
        assert_eq!(
            parser.read_operator().unwrap(),
            Some(Token::Operator(BinaryOp::Add))
        );
    }
}
