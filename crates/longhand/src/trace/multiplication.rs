//! Long multiplication with one partial product per multiplier digit.

use crate::core::bignum::BigNumber;
use crate::trace::{Role, StepTrace, TraceBuilder};

/// Builds the trace for `multiplicand x multiplier`
///
/// Digits are drawn as magnitudes; the sign lands on the result. A
/// single-digit multiplier skips the partial rows.
#[must_use]
pub fn multiplication_trace(multiplicand: &BigNumber, multiplier: &BigNumber) -> StepTrace {
    let top = multiplicand.abs();
    let bottom = multiplier.abs();
    let product = multiplicand * multiplier;

    let partials: Vec<String> = bottom
        .digits()
        .iter()
        .rev()
        .map(|d| top.mul_digit(*d).magnitude_string())
        .collect();
    let show_partials = partials.len() > 1;
    let mut result = product.magnitude_string();
    if product.is_negative() {
        result.insert(0, '-');
    }

    let content = [
        top.digit_count(),
        bottom.digit_count(),
        result.len(),
        partials
            .iter()
            .enumerate()
            .map(|(shift, p)| p.len() + shift)
            .max()
            .unwrap_or(0),
    ]
    .into_iter()
    .max()
    .unwrap_or(1);
    let total_cols = content + 1;
    let right = total_cols - 1;
    let result_row = 2 + if show_partials { partials.len() } else { 0 };
    let mut trace = TraceBuilder::new(result_row + 1, total_cols);

    let place = |trace: &mut TraceBuilder, text: &str, row: usize, right_edge: usize, role: Role| {
        trace.show_text(text, row, right_edge + 1 - text.len(), role, 0);
    };

    place(&mut trace, &top.magnitude_string(), 0, right, Role::Dividend);
    place(&mut trace, &bottom.magnitude_string(), 1, right, Role::Dividend);
    trace.show_text("x", 1, right - bottom.digit_count(), Role::Sign, 0);
    trace.rule(2, 0, total_cols, 0);

    if show_partials {
        for (shift, partial) in partials.iter().enumerate() {
            place(&mut trace, partial, 2 + shift, right - shift, Role::Product);
        }
        trace.rule(result_row, 0, total_cols, 0);
    }
    place(&mut trace, &result, result_row, right, Role::Quotient);

    tracing::debug!(%result, partial_rows = partials.len(), "multiplication traced");
    trace.finish(result)
}
