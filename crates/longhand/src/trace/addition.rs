//! Column addition with carries.
//!
//! Rows, top to bottom: transient column sums, carries, one row per addend,
//! then the result (with a rule on its top edge). Column 0 holds the `+`.

use crate::config::TimingConfig;
use crate::core::bignum::BigNumber;
use crate::core::parser::Operand;
use crate::core::{CalcError, CalcResult};
use crate::trace::{
    digit_values, left_pad, pad_to_scale, with_comma, DigitColumns, Role, StepTrace, TraceBuilder,
};

/// Most addends per trace; keeps every carry a single digit
pub const MAX_ADDENDS: usize = 10;

const SUM_ROW: usize = 0;
const CARRY_ROW: usize = 1;
const FIRST_OPERAND_ROW: usize = 2;

/// Builds the trace for `operands[0] + operands[1] + ...`
///
/// Operand signs are ignored; `negate` prefixes the result with `-`.
pub fn addition_trace(
    operands: &[Operand],
    negate: bool,
    timing: &TimingConfig,
) -> CalcResult<StepTrace> {
    if !(2..=MAX_ADDENDS).contains(&operands.len()) {
        return Err(CalcError::invalid_operation(format!(
            "addition takes 2 to {MAX_ADDENDS} operands, got {}",
            operands.len()
        )));
    }
    let scale = operands.iter().map(Operand::scale).max().unwrap_or(0);
    let digits: Vec<String> = operands.iter().map(|op| op.scaled_digits(scale)).collect();
    let sum = digits.iter().try_fold(BigNumber::zero(), |acc, d| {
        BigNumber::parse(d).map(|value| &acc + &value)
    })?;
    let result_digits = pad_to_scale(sum.magnitude_string(), scale);

    let operand_width = operands
        .iter()
        .map(|op| op.display_len() + scale - op.scale())
        .max()
        .unwrap_or(1);
    let width = operand_width.max(result_digits.len());
    let columns = DigitColumns::new(1, width, scale);
    let result_row = FIRST_OPERAND_ROW + operands.len();
    let mut trace = TraceBuilder::new(result_row + 1, columns.end());

    for (i, d) in digits.iter().enumerate() {
        columns.show_number(&mut trace, d, FIRST_OPERAND_ROW + i, Role::Dividend, 0);
    }
    trace.show_text(
        "+",
        result_row - 1,
        columns.col(width - operand_width) - 1,
        Role::Sign,
        0,
    );
    trace.rule(result_row, columns.first(), columns.end() - columns.first(), 0);

    let padded: Vec<Vec<u8>> = digits
        .iter()
        .map(|d| digit_values(&left_pad(d, width)))
        .collect();
    let lowest = width - operand_width;
    let mut carry = 0u8;
    for index in (lowest..width).rev() {
        let column_sum = carry + padded.iter().map(|p| p[index]).sum::<u8>();
        let text = column_sum.to_string();
        let at = columns.col(index) + 1 - text.len();
        let transient = trace.show_text(text, SUM_ROW, at, Role::Product, timing.intermediate_sum_ms);
        trace.hide(transient, 0);

        carry = column_sum / 10;
        // a carry out of the widest addend lands straight in the result row
        if carry > 0 && index > lowest {
            trace.show_text(
                carry.to_string(),
                CARRY_ROW,
                columns.col(index - 1),
                Role::Carry,
                0,
            );
        }
        trace.pause(timing.carry_ms);
    }

    let negative = negate && !sum.is_zero();
    if negative {
        trace.show_text(
            "-",
            result_row,
            columns.col(width - result_digits.len()) - 1,
            Role::Quotient,
            0,
        );
    }
    columns.show_number(&mut trace, &result_digits, result_row, Role::Quotient, 0);
    trace.pause(timing.final_settle_ms);

    let mut result = with_comma(&result_digits, scale);
    if negative {
        result.insert(0, '-');
    }
    tracing::debug!(%result, columns = columns.end(), "addition traced");
    Ok(trace.finish(result))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ops(values: &[&str]) -> Vec<Operand> {
        values.iter().map(|v| Operand::parse(v).unwrap()).collect()
    }

    fn add(values: &[&str]) -> StepTrace {
        addition_trace(&ops(values), false, &TimingConfig::default()).unwrap()
    }

    #[test]
    fn test_simple_sum() {
        let trace = add(&["12", "34"]);
        assert_eq!(trace.result(), "46");
        assert_eq!(trace.events_with_role(Role::Carry).count(), 0);
        assert_eq!(trace.row_text(4), "46");
        assert_eq!(trace.total_rows(), 5);
    }

    #[test]
    fn test_carry_into_new_column() {
        let trace = add(&["99", "1"]);
        assert_eq!(trace.result(), "100");
        let carries: Vec<_> = trace.events_with_role(Role::Carry).collect();
        assert_eq!(carries.len(), 1);
        // block starts at col 1 and is 3 wide: hundreds=1, tens=2, units=3
        assert_eq!(carries[0].col_start, 2);
        assert_eq!(carries[0].row, CARRY_ROW);
        assert_eq!(trace.row_text(4), "100");
    }

    #[test]
    fn test_transient_sums_retired() {
        let trace = add(&["58", "67"]);
        assert_eq!(trace.events_with_role(Role::Product).count(), 2);
        assert!(trace
            .settled()
            .iter()
            .all(|s| s.event.role != Role::Product));
        assert_eq!(trace.result(), "125");
    }

    #[test]
    fn test_zero_carry_has_no_event() {
        let trace = add(&["41", "8"]);
        assert_eq!(trace.events_with_role(Role::Carry).count(), 0);
    }

    #[test]
    fn test_sign_left_of_widest_operand() {
        let trace = add(&["5", "123"]);
        let sign = trace.events_with_role(Role::Sign).next().unwrap();
        assert_eq!(sign.row, 3);
        assert_eq!(sign.col_start, 0);
        assert_eq!(trace.find_overlap(), None);
    }

    #[test]
    fn test_many_addends() {
        let values = ["99"; 10];
        let trace = add(&values);
        assert_eq!(trace.result(), "990");
        assert_eq!(trace.find_overlap(), None);
        let err = addition_trace(&ops(&["1"; 11]), false, &TimingConfig::default());
        assert!(matches!(err, Err(CalcError::InvalidOperation(_))));
    }

    #[test]
    fn test_decimal_alignment() {
        let trace = add(&["1,5", "22,25"]);
        assert_eq!(trace.result(), "23,75");
        assert_eq!(trace.row_text(2), "1,50");
        assert_eq!(trace.row_text(3), "+22,25");
        assert_eq!(trace.find_overlap(), None);
    }

    #[test]
    fn test_negated_result() {
        let trace =
            addition_trace(&ops(&["5", "7"]), true, &TimingConfig::default()).unwrap();
        assert_eq!(trace.result(), "-12");
        assert_eq!(trace.row_text(4), "-12");
        assert_eq!(trace.find_overlap(), None);
    }

    #[test]
    fn test_timing_holds() {
        let timing = TimingConfig::default();
        let trace = add(&["12", "34"]);
        // two columns: sum hold plus carry pause each, then the settle
        assert_eq!(
            trace.total_hold_ms(),
            2 * (timing.intermediate_sum_ms + timing.carry_ms) + timing.final_settle_ms
        );
        let instant = addition_trace(&ops(&["12", "34"]), false, &TimingConfig::instant()).unwrap();
        assert!(instant.is_synchronous());
    }
}
