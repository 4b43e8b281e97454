//! Numeric foundation for the solver: an exact rational type and the
//! `Field` abstraction that lets the whole pipeline run either in f64 or
//! in exact rational arithmetic.
//!
//! The pivoting kernel and the sequence-form builder are generic over
//! `Field`. Payoff and chance-probability accumulation always happens in
//! `Rat` and is lowered into the working field exactly once, when the
//! finished LCP system is handed to the tableau.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use num_bigint::{BigInt, Sign};
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{SolverError, SolverResult};

// ---------------------------------------------------------------------------
// Exact rational numbers
// ---------------------------------------------------------------------------

/// Arbitrary-precision rational number.
///
/// Serializes as a `"p/q"` string; deserializes from integers, floats
/// (exact binary expansion), or strings like `"2"`, `"-1/3"`, `"0.25"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rat(pub BigRational);

impl Rat {
    pub fn zero() -> Rat {
        Rat(BigRational::zero())
    }

    pub fn one() -> Rat {
        Rat(BigRational::one())
    }

    pub fn from_int(n: i64) -> Rat {
        Rat(BigRational::from_integer(BigInt::from(n)))
    }

    /// `numer/denom` from machine integers. `denom` must be nonzero.
    pub fn new(numer: i64, denom: i64) -> Rat {
        Rat(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn abs(&self) -> Rat {
        Rat(self.0.abs())
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    /// Render as a fixed-point decimal with `decimals` fractional digits,
    /// rounding to nearest (ties away from zero).
    pub fn decimal(&self, decimals: usize) -> String {
        let scale = num_traits::pow(BigInt::from(10), decimals);
        let scaled = (self.0.clone() * BigRational::from_integer(scale))
            .round()
            .to_integer();
        let neg = scaled.sign() == Sign::Minus;
        let mut digits = scaled.magnitude().to_string();
        let body = if decimals == 0 {
            digits
        } else {
            if digits.len() <= decimals {
                digits = format!("{:0>width$}", digits, width = decimals + 1);
            }
            let split = digits.len() - decimals;
            format!("{}.{}", &digits[..split], &digits[split..])
        };
        if neg {
            format!("-{}", body)
        } else {
            body
        }
    }
}

impl fmt::Display for Rat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.denom().is_one() {
            write!(f, "{}", self.0.numer())
        } else {
            write!(f, "{}/{}", self.0.numer(), self.0.denom())
        }
    }
}

impl FromStr for Rat {
    type Err = SolverError;

    fn from_str(s: &str) -> SolverResult<Rat> {
        let s = s.trim();
        let bad = || SolverError::InvalidRational(s.to_string());
        if let Some((n, d)) = s.split_once('/') {
            let numer: BigInt = n.trim().parse().map_err(|_| bad())?;
            let denom: BigInt = d.trim().parse().map_err(|_| bad())?;
            if denom.is_zero() {
                return Err(bad());
            }
            Ok(Rat(BigRational::new(numer, denom)))
        } else if let Some((int_part, frac_part)) = s.split_once('.') {
            if frac_part.is_empty() || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(bad());
            }
            let combined: BigInt = format!("{}{}", int_part, frac_part)
                .parse()
                .map_err(|_| bad())?;
            let denom = num_traits::pow(BigInt::from(10), frac_part.len());
            Ok(Rat(BigRational::new(combined, denom)))
        } else {
            let n: BigInt = s.parse().map_err(|_| bad())?;
            Ok(Rat(BigRational::from_integer(n)))
        }
    }
}

impl Add for Rat {
    type Output = Rat;
    fn add(self, rhs: Rat) -> Rat {
        Rat(self.0 + rhs.0)
    }
}

impl Sub for Rat {
    type Output = Rat;
    fn sub(self, rhs: Rat) -> Rat {
        Rat(self.0 - rhs.0)
    }
}

impl Mul for Rat {
    type Output = Rat;
    fn mul(self, rhs: Rat) -> Rat {
        Rat(self.0 * rhs.0)
    }
}

impl Div for Rat {
    type Output = Rat;
    fn div(self, rhs: Rat) -> Rat {
        Rat(self.0 / rhs.0)
    }
}

impl Neg for Rat {
    type Output = Rat;
    fn neg(self) -> Rat {
        Rat(-self.0)
    }
}

impl Serialize for Rat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Rat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Rat, D::Error> {
        struct RatVisitor;

        impl Visitor<'_> for RatVisitor {
            type Value = Rat;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a rational as an integer, float, or \"p/q\" string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Rat, E> {
                Ok(Rat::from_int(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Rat, E> {
                Ok(Rat(BigRational::from_integer(BigInt::from(v))))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Rat, E> {
                BigRational::from_float(v)
                    .map(Rat)
                    .ok_or_else(|| E::custom("non-finite float"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Rat, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(RatVisitor)
    }
}

// ---------------------------------------------------------------------------
// Working field
// ---------------------------------------------------------------------------

/// Numeric field the tableau pivots in.
///
/// `epsilon` is the "close to zero" tolerance: a small positive value for
/// f64, exact zero for `Rat`, so comparisons degrade to exact tests under
/// rational arithmetic.
pub trait Field:
    Clone
    + fmt::Debug
    + fmt::Display
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    fn zero() -> Self;
    fn one() -> Self;
    fn from_i64(n: i64) -> Self;
    fn from_rat(r: &Rat) -> Self;
    fn epsilon() -> Self;
    fn abs(&self) -> Self;
    fn to_f64(&self) -> f64;
    /// Fixed-point rendering with the given number of fractional digits.
    fn render(&self, decimals: usize) -> String;

    fn near_zero(&self) -> bool {
        self.abs() <= Self::epsilon()
    }
}

impl Field for f64 {
    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }

    fn from_i64(n: i64) -> Self {
        n as f64
    }

    fn from_rat(r: &Rat) -> Self {
        r.to_f64()
    }

    fn epsilon() -> Self {
        1e-10
    }

    fn abs(&self) -> Self {
        f64::abs(*self)
    }

    fn to_f64(&self) -> f64 {
        *self
    }

    fn render(&self, decimals: usize) -> String {
        format!("{:.*}", decimals, self)
    }
}

impl Field for Rat {
    fn zero() -> Self {
        Rat::zero()
    }

    fn one() -> Self {
        Rat::one()
    }

    fn from_i64(n: i64) -> Self {
        Rat::from_int(n)
    }

    fn from_rat(r: &Rat) -> Self {
        r.clone()
    }

    fn epsilon() -> Self {
        Rat::zero()
    }

    fn abs(&self) -> Self {
        Rat::abs(self)
    }

    fn to_f64(&self) -> f64 {
        Rat::to_f64(self)
    }

    fn render(&self, decimals: usize) -> String {
        self.decimal(decimals)
    }
}

// ---------------------------------------------------------------------------
// Dense matrix
// ---------------------------------------------------------------------------

/// Row-major dense matrix, 0-indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Field> Matrix<T> {
    pub fn zeros(rows: usize, cols: usize) -> Matrix<T> {
        Matrix {
            rows,
            cols,
            data: vec![T::zero(); rows * cols],
        }
    }
}

impl<T> Matrix<T> {
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> &T {
        &self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, v: T) {
        self.data[r * self.cols + c] = v;
    }

    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Matrix<U> {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }
}
