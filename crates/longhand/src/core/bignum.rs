//! Exact decimal integers of arbitrary length.
//!
//! Digits are kept most-significant first so that trace generators can walk
//! them in reading order. The representation is always normalized: no leading
//! zeros except a lone `0`, and zero is never negative.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use crate::core::{CalcError, CalcResult};

/// Signed arbitrary-precision integer in base 10
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigNumber {
    negative: bool,
    digits: Vec<u8>,
}

impl Default for BigNumber {
    fn default() -> Self {
        Self::zero()
    }
}

impl BigNumber {
    /// The value zero
    #[must_use]
    pub fn zero() -> Self {
        Self {
            negative: false,
            digits: vec![0],
        }
    }

    /// Builds a non-negative number from a machine integer
    #[must_use]
    pub fn from_u64(mut value: u64) -> Self {
        if value == 0 {
            return Self::zero();
        }
        let mut digits = Vec::with_capacity(20);
        while value > 0 {
            digits.push((value % 10) as u8);
            value /= 10;
        }
        digits.reverse();
        Self {
            negative: false,
            digits,
        }
    }

    /// Builds a non-negative number from raw digits (most significant first)
    ///
    /// Leading zeros are stripped. Digits above 9 are a caller bug.
    #[must_use]
    pub fn from_digits(digits: &[u8]) -> Self {
        debug_assert!(digits.iter().all(|d| *d < 10));
        Self::from_parts(false, digits.to_vec())
    }

    fn from_parts(negative: bool, digits: Vec<u8>) -> Self {
        let digits = trim(digits);
        let negative = negative && digits != [0];
        Self { negative, digits }
    }

    /// Parses `[+-]?[0-9]+`, surrounding whitespace ignored
    pub fn parse(text: &str) -> CalcResult<Self> {
        let trimmed = text.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CalcError::invalid_number(text));
        }
        Ok(Self::from_parts(
            negative,
            body.bytes().map(|b| b - b'0').collect(),
        ))
    }

    /// Returns true for zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.digits == [0]
    }

    /// Returns true for values below zero
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.negative
    }

    /// Magnitude digits, most significant first
    #[must_use]
    pub fn digits(&self) -> &[u8] {
        &self.digits
    }

    /// Number of magnitude digits (zero has one)
    #[must_use]
    pub fn digit_count(&self) -> usize {
        self.digits.len()
    }

    /// Absolute value
    #[must_use]
    pub fn abs(&self) -> Self {
        Self {
            negative: false,
            digits: self.digits.clone(),
        }
    }

    /// Same magnitude, opposite sign
    #[must_use]
    pub fn negated(&self) -> Self {
        Self::from_parts(!self.negative, self.digits.clone())
    }

    /// Magnitude as a digit string without sign
    #[must_use]
    pub fn magnitude_string(&self) -> String {
        self.digits.iter().map(|d| char::from(b'0' + d)).collect()
    }

    /// Compares absolute values
    #[must_use]
    pub fn cmp_magnitude(&self, other: &Self) -> Ordering {
        mag_cmp(&self.digits, &other.digits)
    }

    /// `self * 10 + digit` on the magnitude, keeping the sign
    #[must_use]
    pub fn append_digit(&self, digit: u8) -> Self {
        let mut digits = self.digits.clone();
        digits.push(digit);
        Self::from_parts(self.negative, digits)
    }

    /// `self * 10^places`
    #[must_use]
    pub fn shifted(&self, places: usize) -> Self {
        let mut digits = self.digits.clone();
        digits.resize(digits.len() + places, 0);
        Self::from_parts(self.negative, digits)
    }

    /// `10^places`
    #[must_use]
    pub fn pow10(places: usize) -> Self {
        let mut digits = vec![0; places + 1];
        digits[0] = 1;
        Self {
            negative: false,
            digits,
        }
    }

    /// Multiplies by a single digit
    #[must_use]
    pub fn mul_digit(&self, digit: u8) -> Self {
        self * &Self::from_u64(u64::from(digit))
    }

    /// Truncating division returning `(quotient, remainder)`
    ///
    /// The quotient rounds toward zero and the remainder takes the sign of
    /// the dividend.
    pub fn div_rem(&self, divisor: &Self) -> CalcResult<(Self, Self)> {
        if divisor.is_zero() {
            return Err(CalcError::DivisionByZero);
        }
        let (quotient, remainder) = mag_div_rem(&self.digits, &divisor.digits);
        Ok((
            Self::from_parts(self.negative != divisor.negative, quotient),
            Self::from_parts(self.negative, remainder),
        ))
    }

    /// Integer square root (floor) by Newton iteration
    pub fn isqrt(&self) -> CalcResult<Self> {
        if self.negative {
            return Err(CalcError::NegativeSqrt);
        }
        if self.is_zero() {
            return Ok(Self::zero());
        }
        // 10^ceil(len/2) is never below the root, so the iteration only descends
        let mut x = Self::pow10(self.digits.len().div_ceil(2)).digits;
        loop {
            let (quotient, _) = mag_div_rem(&self.digits, &x);
            let (y, _) = mag_div_rem(&mag_add(&x, &quotient), &[2]);
            if mag_cmp(&y, &x) != Ordering::Less {
                return Ok(Self::from_parts(false, x));
            }
            x = y;
        }
    }

    /// Returns the value if it is non-negative and fits in a `u64`
    #[must_use]
    pub fn to_u64(&self) -> Option<u64> {
        if self.negative {
            return None;
        }
        self.digits.iter().try_fold(0u64, |acc, d| {
            acc.checked_mul(10)?.checked_add(u64::from(*d))
        })
    }
}

fn trim(mut digits: Vec<u8>) -> Vec<u8> {
    match digits.iter().position(|d| *d != 0) {
        Some(first) => {
            digits.drain(..first);
            digits
        }
        None => vec![0],
    }
}

fn mag_cmp(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn mag_add(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len().max(b.len()) + 1);
    let mut left = a.iter().rev();
    let mut right = b.iter().rev();
    let mut carry = 0;
    loop {
        match (left.next(), right.next()) {
            (None, None) => break,
            (x, y) => {
                let sum = x.copied().unwrap_or(0) + y.copied().unwrap_or(0) + carry;
                out.push(sum % 10);
                carry = sum / 10;
            }
        }
    }
    if carry > 0 {
        out.push(carry);
    }
    out.reverse();
    trim(out)
}

/// Requires `a >= b` in magnitude
fn mag_sub(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len());
    let mut right = b.iter().rev();
    let mut borrow = 0i8;
    for &x in a.iter().rev() {
        let y = right.next().copied().unwrap_or(0) as i8;
        let mut diff = x as i8 - y - borrow;
        if diff < 0 {
            diff += 10;
            borrow = 1;
        } else {
            borrow = 0;
        }
        out.push(diff as u8);
    }
    out.reverse();
    trim(out)
}

fn mag_mul(a: &[u8], b: &[u8]) -> Vec<u8> {
    if a == [0] || b == [0] {
        return vec![0];
    }
    let mut acc = vec![0u32; a.len() + b.len()];
    for (i, &x) in a.iter().rev().enumerate() {
        for (j, &y) in b.iter().rev().enumerate() {
            acc[i + j] += u32::from(x) * u32::from(y);
        }
        // fold carries once per row so cells stay small
        for k in i..acc.len() - 1 {
            let carry = acc[k] / 10;
            acc[k] %= 10;
            acc[k + 1] += carry;
        }
    }
    trim(acc.iter().rev().map(|d| *d as u8).collect())
}

fn mag_div_rem(dividend: &[u8], divisor: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let mut quotient = Vec::with_capacity(dividend.len());
    let mut remainder = vec![0];
    for &digit in dividend {
        if remainder == [0] {
            remainder[0] = digit;
        } else {
            remainder.push(digit);
        }
        let mut count = 0;
        while mag_cmp(&remainder, divisor) != Ordering::Less {
            remainder = mag_sub(&remainder, divisor);
            count += 1;
        }
        quotient.push(count);
    }
    (trim(quotient), remainder)
}

impl Add for &BigNumber {
    type Output = BigNumber;

    fn add(self, rhs: Self) -> BigNumber {
        if self.negative == rhs.negative {
            return BigNumber::from_parts(self.negative, mag_add(&self.digits, &rhs.digits));
        }
        match mag_cmp(&self.digits, &rhs.digits) {
            Ordering::Equal => BigNumber::zero(),
            Ordering::Greater => {
                BigNumber::from_parts(self.negative, mag_sub(&self.digits, &rhs.digits))
            }
            Ordering::Less => {
                BigNumber::from_parts(rhs.negative, mag_sub(&rhs.digits, &self.digits))
            }
        }
    }
}

impl Sub for &BigNumber {
    type Output = BigNumber;

    fn sub(self, rhs: Self) -> BigNumber {
        self + &rhs.negated()
    }
}

impl Mul for &BigNumber {
    type Output = BigNumber;

    fn mul(self, rhs: Self) -> BigNumber {
        BigNumber::from_parts(
            self.negative != rhs.negative,
            mag_mul(&self.digits, &rhs.digits),
        )
    }
}

impl Ord for BigNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, false) => self.cmp_magnitude(other),
            (true, true) => other.cmp_magnitude(self),
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
        }
    }
}

impl PartialOrd for BigNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BigNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str(&self.magnitude_string())
    }
}

impl FromStr for BigNumber {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for BigNumber {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}
