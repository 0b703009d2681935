//! Prime factorization in the school column layout.
//!
//! ```text
//!  360│2
//!  180│2
//!   90│2
//!   45│3
//!   15│3
//!    5│5
//!    1│
//! 2^3×3^2×5
//! ```

use crate::core::bignum::BigNumber;
use crate::core::{CalcError, CalcResult};
use crate::trace::{Role, StepTrace, TraceBuilder};

/// Prime factors of `n` in ascending order, with repetition
///
/// `prime_factors(1)` and `prime_factors(0)` are empty.
#[must_use]
pub fn prime_factors(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    if n < 2 {
        return factors;
    }
    for p in [2, 3] {
        while n % p == 0 {
            factors.push(p);
            n /= p;
        }
    }
    // candidates 6k - 1 and 6k + 1
    let mut d: u64 = 5;
    while d.saturating_mul(d) <= n {
        for p in [d, d + 2] {
            while n % p == 0 {
                factors.push(p);
                n /= p;
            }
        }
        d += 6;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

/// `(prime, exponent)` pairs from an ascending factor list
fn grouped(factors: &[u64]) -> Vec<(u64, usize)> {
    let mut groups: Vec<(u64, usize)> = Vec::new();
    for &p in factors {
        match groups.last_mut() {
            Some((last, count)) if *last == p => *count += 1,
            _ => groups.push((p, 1)),
        }
    }
    groups
}

fn power_token(prime: u64, exponent: usize) -> String {
    if exponent == 1 {
        prime.to_string()
    } else {
        format!("{prime}^{exponent}")
    }
}

/// Builds the factorization trace for a positive integer
pub fn factorization_trace(value: &BigNumber) -> CalcResult<StepTrace> {
    if value.is_negative() {
        return Err(CalcError::invalid_number(format!(
            "{value}: factorization needs a positive integer"
        )));
    }
    let n = value
        .to_u64()
        .ok_or_else(|| CalcError::invalid_number(format!("{value}: too large to factor")))?;
    if n == 0 {
        return Err(CalcError::invalid_operation("cannot factor zero"));
    }

    let factors = prime_factors(n);
    let mut values = Vec::with_capacity(factors.len() + 1);
    let mut current = n;
    values.push(current);
    for p in &factors {
        current /= p;
        values.push(current);
    }

    let tokens: Vec<String> = if factors.is_empty() {
        vec!["1".to_string()]
    } else {
        let powers: Vec<String> = grouped(&factors)
            .into_iter()
            .map(|(p, e)| power_token(p, e))
            .collect();
        let mut tokens = Vec::with_capacity(powers.len() * 2);
        for (i, power) in powers.into_iter().enumerate() {
            if i > 0 {
                tokens.push("×".to_string());
            }
            tokens.push(power);
        }
        tokens
    };
    let result: String = tokens.concat();

    let left_w = n.to_string().len();
    let factor_w = factors.iter().map(|p| p.to_string().len()).max().unwrap_or(0);
    let result_w: usize = tokens.iter().map(|t| t.chars().count()).sum();
    let total_cols = (left_w + 1 + factor_w).max(result_w);
    let result_row = values.len();
    let mut trace = TraceBuilder::new(result_row + 1, total_cols);

    for (row, v) in values.iter().enumerate() {
        let text = v.to_string();
        let role = if row == 0 { Role::Dividend } else { Role::Remainder };
        trace.show_text(&*text, row, left_w - text.len(), role, 0);
        if let Some(p) = factors.get(row) {
            trace.show_text(p.to_string(), row, left_w + 1, Role::Divisor, 0);
        }
    }
    trace.vertical_rule(0, left_w, values.len(), 0);

    let mut col = 0;
    for token in tokens {
        let width = token.chars().count();
        trace.show_text(token, result_row, col, Role::Quotient, 0);
        col += width;
    }

    tracing::debug!(n, %result, "factorization traced");
    Ok(trace.finish(result))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ===== Factor tests =====

    #[test]
    fn test_prime_factors() {
        assert_eq!(prime_factors(360), vec![2, 2, 2, 3, 3, 5]);
        assert_eq!(prime_factors(97), vec![97]);
        assert_eq!(prime_factors(1), Vec::<u64>::new());
        assert_eq!(prime_factors(49), vec![7, 7]);
        assert_eq!(prime_factors(2 * 1_000_003), vec![2, 1_000_003]);
    }

    #[test]
    fn test_large_prime_cofactor() {
        // 4294967291 is the largest prime below 2^32
        let p = 4_294_967_291_u64;
        assert_eq!(prime_factors(p * 3), vec![3, p]);
    }

    #[test]
    fn test_grouped_tokens() {
        assert_eq!(grouped(&[2, 2, 2, 3, 3, 5]), vec![(2, 3), (3, 2), (5, 1)]);
        assert_eq!(power_token(2, 3), "2^3");
        assert_eq!(power_token(5, 1), "5");
    }

    // ===== Trace tests =====

    #[test]
    fn test_trace_360() {
        let trace = factorization_trace(&BigNumber::from_u64(360)).unwrap();
        assert_eq!(trace.result(), "2^3×3^2×5");
        assert_eq!(trace.total_rows(), 8);
        assert_eq!(trace.row_text(0), "3602");
        assert_eq!(trace.row_text(6), "1");
        assert_eq!(trace.row_text(7), "2^3×3^2×5");
        let first = trace.events().first().unwrap();
        assert_eq!((first.role, first.col_start), (Role::Dividend, 0));
        let last_value = trace
            .events_with_role(Role::Remainder)
            .last()
            .unwrap();
        assert_eq!((last_value.text.as_str(), last_value.col_start), ("1", 2));
        assert_eq!(trace.find_overlap(), None);
        assert!(trace.is_synchronous());
    }

    #[test]
    fn test_vertical_rule_spans_values() {
        let trace = factorization_trace(&BigNumber::from_u64(12)).unwrap();
        let rule = trace.events_with_role(Role::Line).next().unwrap();
        assert!(rule.is_vertical_rule());
        assert_eq!(rule.col_start, 2);
        assert_eq!(rule.width(), 4);
    }

    #[test]
    fn test_trace_one_and_prime() {
        let one = factorization_trace(&BigNumber::from_u64(1)).unwrap();
        assert_eq!(one.result(), "1");
        let prime = factorization_trace(&BigNumber::from_u64(13)).unwrap();
        assert_eq!(prime.result(), "13");
        assert_eq!(prime.find_overlap(), None);
    }

    #[test]
    fn test_trace_rejects_bad_input() {
        assert!(matches!(
            factorization_trace(&BigNumber::zero()),
            Err(CalcError::InvalidOperation(_))
        ));
        let huge: BigNumber = "18446744073709551616".parse().unwrap();
        assert!(matches!(
            factorization_trace(&huge),
            Err(CalcError::InvalidNumberFormat(_))
        ));
        let negative: BigNumber = "-4".parse().unwrap();
        assert!(matches!(
            factorization_trace(&negative),
            Err(CalcError::InvalidNumberFormat(_))
        ));
    }
}
