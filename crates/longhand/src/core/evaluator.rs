//! Expression evaluator
//!
//! Maps a parsed [`Expression`] onto the trace generator that draws it.
//! Signed operands of `+` and `-` are normalized first so the column
//! algorithms only ever see magnitudes.

use crate::config::{CalculatorConfig, DivisionMode, SqrtMode, TimingConfig};
use crate::core::parser::{BinaryOp, Expression, Operand};
use crate::core::CalcResult;
use crate::trace::{
    addition_trace, division_trace, factorization_trace, multiplication_trace, square_root_trace,
    subtraction_trace, StepTrace,
};

/// Turns expressions into step traces
#[derive(Debug, Clone)]
pub struct Evaluator {
    sqrt_mode: SqrtMode,
    timing: TimingConfig,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(&CalculatorConfig::default())
    }
}

impl Evaluator {
    /// Creates an evaluator; timings are zeroed when animation is off
    #[must_use]
    pub fn new(config: &CalculatorConfig) -> Self {
        Self {
            sqrt_mode: config.sqrt_mode,
            timing: if config.animate {
                config.timing.clone()
            } else {
                TimingConfig::instant()
            },
        }
    }

    /// Square root mode in effect
    #[must_use]
    pub const fn sqrt_mode(&self) -> SqrtMode {
        self.sqrt_mode
    }

    /// Traces an expression
    pub fn evaluate(&self, expr: &Expression, division: DivisionMode) -> CalcResult<StepTrace> {
        match expr {
            Expression::Binary { left, op, right } => match op {
                BinaryOp::Add => self.add(left, right),
                BinaryOp::Subtract => self.subtract(left, right),
                BinaryOp::Multiply => Ok(multiplication_trace(
                    &left.to_integer()?,
                    &right.to_integer()?,
                )),
                BinaryOp::Divide => {
                    division_trace(&left.to_integer()?, &right.to_integer()?, division)
                }
            },
            Expression::Factorize(n) => factorization_trace(n),
            Expression::SquareRoot(arg) => square_root_trace(arg, self.sqrt_mode),
        }
    }

    /// Parses and traces a string expression
    pub fn evaluate_str(&self, input: &str, division: DivisionMode) -> CalcResult<StepTrace> {
        let expr = Expression::parse(input)?;
        self.evaluate(&expr, division)
    }

    fn add(&self, left: &Operand, right: &Operand) -> CalcResult<StepTrace> {
        let (l, r) = (left.abs(), right.abs());
        match (left.is_negative(), right.is_negative()) {
            (false, false) => addition_trace(&[l, r], false, &self.timing),
            (false, true) => subtraction_trace(&l, &r, &self.timing),
            (true, false) => subtraction_trace(&r, &l, &self.timing),
            (true, true) => addition_trace(&[l, r], true, &self.timing),
        }
    }

    fn subtract(&self, left: &Operand, right: &Operand) -> CalcResult<StepTrace> {
        let (l, r) = (left.abs(), right.abs());
        match (left.is_negative(), right.is_negative()) {
            (false, false) => subtraction_trace(&l, &r, &self.timing),
            (false, true) => addition_trace(&[l, r], false, &self.timing),
            (true, false) => addition_trace(&[l, r], true, &self.timing),
            (true, true) => subtraction_trace(&r, &l, &self.timing),
        }
    }
}
