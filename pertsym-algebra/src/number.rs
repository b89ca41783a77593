//! Exact numeric literals: integers, rationals, and complex numbers with rational parts.
//!
//! Numbers are kept **normalized**: a rational with denominator one is stored as an
//! [`Number::Integer`], and a complex number with a zero imaginary part is stored as its real
//! part. This makes structural equality of numbers coincide with numeric equality.

use once_cell::sync::Lazy;
use rug::{Integer, Rational};
use std::{cmp::Ordering, fmt, ops::{Add, Mul, Neg, Sub}};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Creates an [`Integer`] with the given value.
pub fn int<T>(n: T) -> Integer
where
    Integer: From<T>,
{
    Integer::from(n)
}

/// Creates a normalized [`Number`] from a fraction.
///
/// # Panics
///
/// Panics if `denom` is zero.
pub fn frac(numer: i64, denom: i64) -> Number {
    Number::from(Rational::from((numer, denom)))
}

pub static ZERO: Lazy<Number> = Lazy::new(|| Number::Integer(int(0)));

pub static ONE: Lazy<Number> = Lazy::new(|| Number::Integer(int(1)));

pub static MINUS_ONE: Lazy<Number> = Lazy::new(|| Number::Integer(int(-1)));

/// The imaginary unit.
pub static I: Lazy<Number> = Lazy::new(|| Number::complex(Rational::new(), Rational::from(1)));

/// An exact numeric literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Number {
    /// An integer, such as `2` or `-144`.
    Integer(Integer),

    /// A rational number whose denominator is not one, such as `1/2`.
    Rational(Rational),

    /// A complex number with a non-zero imaginary part, stored as `(re, im)`.
    Complex(Rational, Rational),
}

impl Number {
    /// Creates a normalized complex number from its real and imaginary parts.
    pub fn complex(re: Rational, im: Rational) -> Self {
        if im.cmp0() == Ordering::Equal {
            Self::from(re)
        } else {
            Self::Complex(re, im)
        }
    }

    /// Returns the real and imaginary parts of the number.
    fn parts(&self) -> (Rational, Rational) {
        match self {
            Self::Integer(n) => (Rational::from(n), Rational::new()),
            Self::Rational(r) => (r.clone(), Rational::new()),
            Self::Complex(re, im) => (re.clone(), im.clone()),
        }
    }

    /// Returns true if the number is zero.
    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Integer(n) if n.cmp0() == Ordering::Equal)
    }

    /// Returns true if the number is one.
    pub fn is_one(&self) -> bool {
        *self == *ONE
    }

    /// Returns true if the number is negative one.
    pub fn is_minus_one(&self) -> bool {
        *self == *MINUS_ONE
    }

    /// Returns true if the number is real and strictly negative.
    pub fn is_negative(&self) -> bool {
        match self {
            Self::Integer(n) => n.cmp0() == Ordering::Less,
            Self::Rational(r) => r.cmp0() == Ordering::Less,
            Self::Complex(..) => false,
        }
    }

    /// Returns true if the number is real and strictly positive.
    pub fn is_positive(&self) -> bool {
        match self {
            Self::Integer(n) => n.cmp0() == Ordering::Greater,
            Self::Rational(r) => r.cmp0() == Ordering::Greater,
            Self::Complex(..) => false,
        }
    }

    /// If the number is an [`Number::Integer`], returns a reference to the contained integer.
    pub fn as_integer(&self) -> Option<&Integer> {
        match self {
            Self::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the multiplicative inverse of the number, or [`None`] if the number is zero.
    pub fn recip(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }

        // 1 / (a + bi) = (a - bi) / (a^2 + b^2)
        let (re, im) = self.parts();
        let norm = Rational::from(&re * &re) + Rational::from(&im * &im);
        Some(Self::complex(
            Rational::from(&re / &norm),
            Rational::from(-&im) / norm,
        ))
    }

    /// Raises the number to an integer power by repeated squaring.
    ///
    /// Returns [`None`] if the result is undefined (zero to a negative power) or the exponent
    /// does not fit in an [`i32`].
    pub fn powi(&self, exp: &Integer) -> Option<Self> {
        let exp = exp.to_i32()?;
        let (mut base, mut remaining) = if exp < 0 {
            (self.recip()?, exp.unsigned_abs())
        } else {
            (self.clone(), exp.unsigned_abs())
        };

        let mut result = ONE.clone();
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = &result * &base;
            }
            base = &base * &base;
            remaining >>= 1;
        }
        Some(result)
    }
}

impl From<Integer> for Number {
    fn from(n: Integer) -> Self {
        Self::Integer(n)
    }
}

impl From<Rational> for Number {
    fn from(r: Rational) -> Self {
        if *r.denom() == 1 {
            let (numer, _) = r.into_numer_denom();
            Self::Integer(numer)
        } else {
            Self::Rational(r)
        }
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Self::Integer(int(n))
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Self::Integer(int(n))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Rational(r) => write!(f, "{}", r),
            Self::Complex(re, im) => {
                let imag = if *im == 1 {
                    "I".to_string()
                } else if *im == -1 {
                    "-I".to_string()
                } else {
                    format!("{}*I", im)
                };

                if re.cmp0() == Ordering::Equal {
                    write!(f, "{}", imag)
                } else if let Some(positive) = imag.strip_prefix('-') {
                    write!(f, "{} - {}", re, positive)
                } else {
                    write!(f, "{} + {}", re, imag)
                }
            },
        }
    }
}

impl Add<&Number> for &Number {
    type Output = Number;

    fn add(self, rhs: &Number) -> Number {
        match (self, rhs) {
            (Number::Integer(lhs), Number::Integer(rhs)) => Number::Integer(Integer::from(lhs + rhs)),
            _ => {
                let ((a, b), (c, d)) = (self.parts(), rhs.parts());
                Number::complex(Rational::from(&a + &c), Rational::from(&b + &d))
            },
        }
    }
}

impl Sub<&Number> for &Number {
    type Output = Number;

    fn sub(self, rhs: &Number) -> Number {
        self + &-rhs
    }
}

impl Mul<&Number> for &Number {
    type Output = Number;

    fn mul(self, rhs: &Number) -> Number {
        match (self, rhs) {
            (Number::Integer(lhs), Number::Integer(rhs)) => Number::Integer(Integer::from(lhs * rhs)),
            _ => {
                // (a + bi)(c + di) = (ac - bd) + (ad + bc)i
                let ((a, b), (c, d)) = (self.parts(), rhs.parts());
                Number::complex(
                    Rational::from(&a * &c) - Rational::from(&b * &d),
                    Rational::from(&a * &d) + Rational::from(&b * &c),
                )
            },
        }
    }
}

impl Neg for &Number {
    type Output = Number;

    fn neg(self) -> Number {
        match self {
            Number::Integer(n) => Number::Integer(Integer::from(-n)),
            Number::Rational(r) => Number::Rational(Rational::from(-r)),
            Number::Complex(re, im) => Number::Complex(Rational::from(-re), Rational::from(-im)),
        }
    }
}

impl Add for Number {
    type Output = Number;

    fn add(self, rhs: Number) -> Number {
        &self + &rhs
    }
}

impl Sub for Number {
    type Output = Number;

    fn sub(self, rhs: Number) -> Number {
        &self - &rhs
    }
}

impl Mul for Number {
    type Output = Number;

    fn mul(self, rhs: Number) -> Number {
        &self * &rhs
    }
}

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Number {
        -&self
    }
}
