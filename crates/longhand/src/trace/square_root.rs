//! Square roots.
//!
//! Both modes work on exact integers: a decimal input `D / 10^s` is scaled so
//! that the integer square root yields enough digits, then rounded half-up to
//! four decimals.

use crate::config::SqrtMode;
use crate::core::bignum::BigNumber;
use crate::core::parser::Operand;
use crate::core::{CalcError, CalcResult};
use crate::trace::{Role, StepTrace, TraceBuilder};

const DECIMALS: usize = 4;

const fn is_operator(c: char) -> bool {
    matches!(c, '+' | '-' | 'x' | 'X' | '*' | '/' | '×' | '÷')
}

/// Square root of a number literal, formatted for display
pub fn square_root(input: &str, mode: SqrtMode) -> CalcResult<String> {
    let text = input.trim();
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return Err(CalcError::invalid_number(input));
    };
    if (first != '-' && is_operator(first)) || chars.any(is_operator) {
        return Err(CalcError::InvalidSqrtInput);
    }

    let operand = Operand::parse(&text.replace('.', ","))?;
    if operand.is_negative() {
        return Err(CalcError::NegativeSqrt);
    }
    let scale = operand.scale();
    let scaled = BigNumber::parse(&operand.scaled_digits(scale))?;
    if scaled.is_zero() {
        return Ok("0".to_string());
    }

    match mode {
        SqrtMode::Exact => {
            if !operand.is_integer() {
                return Err(CalcError::invalid_number(format!(
                    "{text}: exact square roots need an integer"
                )));
            }
            let root = scaled.isqrt()?;
            if &root * &root == scaled {
                Ok(root.to_string())
            } else {
                Err(CalcError::NonExactSqrt)
            }
        }
        SqrtMode::Decimal => {
            if operand.is_integer() {
                let root = scaled.isqrt()?;
                if &root * &root == scaled {
                    return Ok(root.to_string());
                }
            }
            rounded_root(&scaled, scale)
        }
    }
}

/// `sqrt(value / 10^scale)` rounded to [`DECIMALS`] places
fn rounded_root(value: &BigNumber, scale: usize) -> CalcResult<String> {
    let (value, scale) = if scale % 2 == 1 {
        (value.shifted(1), scale + 1)
    } else {
        (value.clone(), scale)
    };
    // isqrt(value * 10^(2 * (DECIMALS + 1))) = sqrt * 10^(DECIMALS + 1 + scale / 2)
    let root = value.shifted(2 * (DECIMALS + 1)).isqrt()?;
    let extra = 1 + scale / 2;
    let half = BigNumber::from_u64(5).shifted(extra - 1);
    let (rounded, _) = (&root + &half).div_rem(&BigNumber::pow10(extra))?;
    Ok(format_fixed(&rounded, DECIMALS))
}

/// Formats `value / 10^places` with a comma, trailing zeros trimmed
fn format_fixed(value: &BigNumber, places: usize) -> String {
    let digits = format!("{:0>width$}", value.magnitude_string(), width = places + 1);
    let (int, frac) = digits.split_at(digits.len() - places);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        int.to_string()
    } else {
        format!("{int},{frac}")
    }
}

/// Single-row trace of the root, one token per character
pub fn square_root_trace(input: &str, mode: SqrtMode) -> CalcResult<StepTrace> {
    let result = square_root(input, mode)?;
    let mut trace = TraceBuilder::new(1, result.chars().count());
    for (col, ch) in result.chars().enumerate() {
        trace.show_text(ch, 0, col, Role::Quotient, 0);
    }
    tracing::debug!(%result, ?mode, "square root traced");
    Ok(trace.finish(result))
}
