//! Long division, extended and short.
//!
//! The grid has two blocks. The left block holds the dividend and the
//! working rows under it; the right block holds the divisor (row 0) and the
//! quotient (row 1), separated from the left by a bracket: a vertical rule
//! beside the divisor and a horizontal rule over the quotient.
//!
//! Bring-down rule: the first quotient digit uses the shortest prefix of the
//! dividend that is at least the divisor, and every later quotient digit
//! brings down exactly one more dividend digit.

use serde::{Deserialize, Serialize};

use crate::config::DivisionMode;
use crate::core::bignum::BigNumber;
use crate::core::{CalcError, CalcResult};
use crate::trace::{Role, StepTrace, TraceBuilder};

/// What a working row holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    Dividend,
    Product,
    Remainder,
}

/// One working row, right-aligned so its last digit sits under dividend
/// digit `col_end - 1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionStep {
    pub text: String,
    pub row: usize,
    pub col_end: usize,
    pub kind: StepKind,
}

impl DivisionStep {
    fn new(text: String, row: usize, col_end: usize, kind: StepKind) -> Self {
        Self {
            text,
            row,
            col_end,
            kind,
        }
    }
}

/// The working rows of a division, before any drawing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionPlan {
    /// Quotient digits (magnitude)
    pub quotient: String,
    pub steps: Vec<DivisionStep>,
    pub total_rows: usize,
}

fn validate(dividend: &BigNumber, divisor: &BigNumber) -> CalcResult<()> {
    if divisor.is_zero() {
        return Err(CalcError::DivisionByZero);
    }
    if dividend.is_zero() {
        return Err(CalcError::ZeroDividend);
    }
    Ok(())
}

/// Shortest prefix not below the divisor, and how many digits it used
fn first_segment(digits: &[u8], divisor: &BigNumber) -> (BigNumber, usize) {
    let mut partial = BigNumber::zero();
    let mut pos = 0;
    while pos < digits.len() && partial.cmp_magnitude(divisor).is_lt() {
        partial = partial.append_digit(digits[pos]);
        pos += 1;
    }
    (partial, pos)
}

/// Extended layout: a product row and a remainder row per quotient digit
pub fn calculate_display_steps(
    dividend: &BigNumber,
    divisor: &BigNumber,
) -> CalcResult<DivisionPlan> {
    validate(dividend, divisor)?;
    let dividend = dividend.abs();
    let divisor = divisor.abs();
    let digits = dividend.digits();
    let len = digits.len();
    let mut steps = vec![DivisionStep::new(
        dividend.magnitude_string(),
        0,
        len,
        StepKind::Dividend,
    )];

    if dividend < divisor {
        steps.push(DivisionStep::new("0".into(), 1, len, StepKind::Product));
        steps.push(DivisionStep::new(
            dividend.magnitude_string(),
            2,
            len,
            StepKind::Remainder,
        ));
        return Ok(DivisionPlan {
            quotient: "0".into(),
            steps,
            total_rows: 3,
        });
    }

    let (mut partial, mut pos) = first_segment(digits, &divisor);
    let mut quotient = String::with_capacity(len);
    let mut row = 1;
    loop {
        let (digit, remainder) = partial.div_rem(&divisor)?;
        quotient.push_str(&digit.to_string());
        let product = &divisor * &digit;
        steps.push(DivisionStep::new(product.to_string(), row, pos, StepKind::Product));
        steps.push(DivisionStep::new(
            remainder.to_string(),
            row + 1,
            pos,
            StepKind::Remainder,
        ));
        row += 2;
        if pos == len {
            break;
        }
        partial = remainder.append_digit(digits[pos]);
        pos += 1;
    }
    Ok(DivisionPlan {
        quotient,
        steps,
        total_rows: row,
    })
}

/// Short layout: only remainders, each already carrying the next digit
pub fn calculate_short_division_steps(
    dividend: &BigNumber,
    divisor: &BigNumber,
) -> CalcResult<DivisionPlan> {
    validate(dividend, divisor)?;
    let dividend = dividend.abs();
    let divisor = divisor.abs();
    let digits = dividend.digits();
    let len = digits.len();
    let mut steps = vec![DivisionStep::new(
        dividend.magnitude_string(),
        0,
        len,
        StepKind::Dividend,
    )];

    if dividend < divisor {
        steps.push(DivisionStep::new(
            dividend.magnitude_string(),
            1,
            len,
            StepKind::Remainder,
        ));
        return Ok(DivisionPlan {
            quotient: "0".into(),
            steps,
            total_rows: 2,
        });
    }

    let (mut partial, mut pos) = first_segment(digits, &divisor);
    let mut quotient = String::with_capacity(len);
    let mut row = 1;
    loop {
        let (digit, remainder) = partial.div_rem(&divisor)?;
        quotient.push_str(&digit.to_string());
        if pos == len {
            steps.push(DivisionStep::new(
                remainder.to_string(),
                row,
                pos,
                StepKind::Remainder,
            ));
            row += 1;
            break;
        }
        partial = remainder.append_digit(digits[pos]);
        pos += 1;
        steps.push(DivisionStep::new(partial.to_string(), row, pos, StepKind::Remainder));
        row += 1;
    }
    Ok(DivisionPlan {
        quotient,
        steps,
        total_rows: row,
    })
}

/// Builds the trace for `dividend / divisor` in the given mode
///
/// The quotient truncates toward zero; it is negative when the operand
/// signs differ.
pub fn division_trace(
    dividend: &BigNumber,
    divisor: &BigNumber,
    mode: DivisionMode,
) -> CalcResult<StepTrace> {
    let plan = match mode {
        DivisionMode::Extended => calculate_display_steps(dividend, divisor)?,
        DivisionMode::Short => calculate_short_division_steps(dividend, divisor)?,
    };
    // extended mode reserves a column for the `-` in front of products
    let sign_offset = usize::from(mode == DivisionMode::Extended);
    let left_width = dividend.digit_count() + sign_offset;

    let mut quotient = plan.quotient.clone();
    if dividend.is_negative() != divisor.is_negative() && quotient != "0" {
        quotient.insert(0, '-');
    }
    let divisor_text = divisor.magnitude_string();
    let right_width = divisor_text.len().max(quotient.len());
    let bracket_col = left_width + 1;
    let right_start = left_width + 2;
    let total_cols = right_start + right_width + 1;
    let total_rows = plan.total_rows.max(2);
    let mut trace = TraceBuilder::new(total_rows, total_cols);

    draw_header(&mut trace, &divisor_text, &quotient, bracket_col, right_width);

    for step in &plan.steps {
        let col_start = step.col_end + sign_offset - step.text.len();
        match step.kind {
            StepKind::Dividend => {
                trace.show_text(step.text.as_str(), step.row, col_start, Role::Dividend, 0);
            }
            StepKind::Product => {
                trace.show_text("-", step.row, col_start - 1, Role::Sign, 0);
                trace.show_text(step.text.as_str(), step.row, col_start, Role::Product, 0);
                trace.rule(step.row + 1, col_start - 1, step.text.len() + 1, 0);
            }
            StepKind::Remainder => {
                trace.show_text(step.text.as_str(), step.row, col_start, Role::Remainder, 0);
            }
        }
    }

    tracing::debug!(?mode, %quotient, rows = total_rows, "division traced");
    Ok(trace.finish(quotient))
}

/// Divisor, bracket and quotient
fn draw_header(
    trace: &mut TraceBuilder,
    divisor: &str,
    quotient: &str,
    bracket_col: usize,
    right_width: usize,
) {
    trace.show_text(divisor, 0, bracket_col + 1, Role::Divisor, 0);
    trace.vertical_rule(0, bracket_col, 1, 0);
    trace.rule(1, bracket_col, right_width + 1, 0);
    trace.show_text(quotient, 1, bracket_col + 1, Role::Quotient, 0);
}
