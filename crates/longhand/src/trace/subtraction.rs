//! Column subtraction with borrow chains.
//!
//! Rows: borrow annotations, minuend, subtrahend (with `-`), result. Both
//! operands are shown zero-padded to the same width. When the subtrahend is
//! larger the operands swap places and the result gets a leading `-`.

use std::collections::HashMap;

use crate::config::TimingConfig;
use crate::core::bignum::BigNumber;
use crate::core::parser::Operand;
use crate::core::CalcResult;
use crate::trace::{
    digit_values, left_pad, pad_to_scale, with_comma, BorrowChain, BorrowStep, DigitColumns,
    LoopTarget, Role, StepTrace, TraceBuilder,
};

const BORROW_ROW: usize = 0;
const MINUEND_ROW: usize = 1;
const SUBTRAHEND_ROW: usize = 2;
const RESULT_ROW: usize = 3;

/// Borrow chains for equal-length digit rows, scanning right to left
///
/// For each column where the (already rewritten) minuend digit is smaller
/// than the subtrahend digit, the nearest non-zero digit to the left lends:
/// it drops by one, every zero passed over becomes 9 and the deficient digit
/// gains 10. Steps are ordered lender first.
#[must_use]
pub fn borrow_chains(minuend: &[u8], subtrahend: &[u8]) -> Vec<BorrowChain> {
    debug_assert_eq!(minuend.len(), subtrahend.len());
    let mut work = minuend.to_vec();
    let mut chains = Vec::new();
    for i in (0..work.len()).rev() {
        if work[i] >= subtrahend[i] {
            continue;
        }
        let Some(lender) = (0..i).rev().find(|&j| work[j] > 0) else {
            continue;
        };
        let mut steps = Vec::with_capacity(i - lender + 1);
        work[lender] -= 1;
        steps.push(BorrowStep {
            digit_index: lender,
            new_value: work[lender],
        });
        for (j, digit) in work.iter_mut().enumerate().take(i).skip(lender + 1) {
            *digit = 9;
            steps.push(BorrowStep {
                digit_index: j,
                new_value: 9,
            });
        }
        work[i] += 10;
        steps.push(BorrowStep {
            digit_index: i,
            new_value: work[i],
        });
        chains.push(BorrowChain { steps });
    }
    chains
}

/// Minuend digits after every chain has been applied
#[must_use]
pub fn resolve_borrows(minuend: &[u8], chains: &[BorrowChain]) -> Vec<u8> {
    let mut digits = minuend.to_vec();
    for step in chains.iter().flat_map(|c| &c.steps) {
        digits[step.digit_index] = step.new_value;
    }
    digits
}

/// Builds the trace for `minuend - subtrahend` using operand magnitudes
pub fn subtraction_trace(
    minuend: &Operand,
    subtrahend: &Operand,
    timing: &TimingConfig,
) -> CalcResult<StepTrace> {
    let scale = minuend.scale().max(subtrahend.scale());
    let a = minuend.scaled_digits(scale);
    let b = subtrahend.scaled_digits(scale);
    let (va, vb) = (BigNumber::parse(&a)?, BigNumber::parse(&b)?);
    let negative = va < vb;
    let (top, bottom, difference) = if negative {
        (b, a, &vb - &va)
    } else {
        (a, b, &va - &vb)
    };
    let result_digits = pad_to_scale(difference.magnitude_string(), scale);

    let width = top.len().max(bottom.len());
    let top = left_pad(&top, width);
    let bottom = left_pad(&bottom, width);
    let comma = usize::from(scale > 0);
    let block = width + comma;
    let total_cols = (block + 1).max(result_digits.len() + comma + usize::from(negative));
    let columns = DigitColumns::new(total_cols - block, width, scale);
    let mut trace = TraceBuilder::new(RESULT_ROW + 1, total_cols);

    let minuend_events = columns.show_number(&mut trace, &top, MINUEND_ROW, Role::Dividend, 0);
    trace.show_text("-", SUBTRAHEND_ROW, columns.first() - 1, Role::Sign, 0);
    columns.show_number(&mut trace, &bottom, SUBTRAHEND_ROW, Role::Product, 0);
    trace.pause(timing.operand_ms);

    let chains = borrow_chains(&digit_values(&top), &digit_values(&bottom));
    let chain_count = chains.len();
    let mut annotations: HashMap<usize, usize> = HashMap::new();
    for chain in chains {
        for link in chain.steps.windows(2) {
            let arrow = trace.arrow(
                BORROW_ROW,
                columns.col(link[0].digit_index),
                columns.col(link[1].digit_index),
                0,
            );
            trace.mark_looping(LoopTarget::Arrow(arrow));
        }
        trace.pause(timing.borrow_arrow_ms);
        for step in &chain.steps {
            if let Some(previous) = annotations.remove(&step.digit_index) {
                trace.hide(previous, 0);
            }
            if let Some(&digit) = minuend_events.get(&step.digit_index) {
                trace.strike(digit, timing.strike_ms);
            }
            let note = trace.show_text(
                step.new_value.to_string(),
                BORROW_ROW,
                columns.col(step.digit_index),
                Role::Carry,
                timing.borrow_digit_ms,
            );
            trace.mark_looping(LoopTarget::Event(note));
            annotations.insert(step.digit_index, note);
        }
        trace.pause(timing.chain_pause_ms);
        trace.push_chain(chain);
    }

    trace.rule(RESULT_ROW, 0, total_cols, timing.line_ms);
    if negative {
        trace.show_text(
            "-",
            RESULT_ROW,
            columns.col(width - result_digits.len()) - 1,
            Role::Quotient,
            timing.result_digit_ms,
        );
    }
    columns.show_number(
        &mut trace,
        &result_digits,
        RESULT_ROW,
        Role::Quotient,
        timing.result_digit_ms,
    );
    trace.pause(timing.final_settle_ms);

    let mut result = with_comma(&result_digits, scale);
    if negative {
        result.insert(0, '-');
    }
    tracing::debug!(%result, chains = chain_count, "subtraction traced");
    Ok(trace.finish(result))
}
