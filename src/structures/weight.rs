/*!
The arithmetic domain of aggregate weights.

The canonical weight type is selected at compile time:
- By default, [Weight] aliases `i64`, with every operation checked — an overflow surfaces as
  [ErrorKind::Overflow](crate::types::err::ErrorKind::Overflow), whose message suggests the
  alternative.
- With the `bigint` feature, [Weight] aliases [num_bigint::BigInt] and arithmetic cannot
  overflow.

Both satisfy [WeightOps], and the rest of the library is written against the trait: weights are
cloned rather than copied, and arithmetic goes through the checked methods.
*/

/// Operations required of a weight backend.
pub trait WeightOps: Clone + Ord + Default + std::fmt::Debug + std::fmt::Display {
    /// The additive identity.
    fn zero() -> Self;

    /// The multiplicative identity.
    fn one() -> Self;

    /// A weight from a fixed-width integer.
    fn from_int(value: i64) -> Self;

    /// Addition, `None` on overflow.
    fn add_checked(&self, other: &Self) -> Option<Self>;

    /// Subtraction, `None` on overflow.
    fn sub_checked(&self, other: &Self) -> Option<Self>;

    /// Multiplication, `None` on overflow.
    fn mul_checked(&self, other: &Self) -> Option<Self>;

    /// Division, for use only when `other` is known to divide `self` exactly.
    fn div_exact(&self, other: &Self) -> Self;

    /// True if the weight is zero.
    fn zero_valued(&self) -> bool;

    /// True if the weight is (strictly) negative.
    fn negative(&self) -> bool;
}

impl WeightOps for i64 {
    fn zero() -> Self {
        0
    }

    fn one() -> Self {
        1
    }

    fn from_int(value: i64) -> Self {
        value
    }

    fn add_checked(&self, other: &Self) -> Option<Self> {
        i64::checked_add(*self, *other)
    }

    fn sub_checked(&self, other: &Self) -> Option<Self> {
        i64::checked_sub(*self, *other)
    }

    fn mul_checked(&self, other: &Self) -> Option<Self> {
        i64::checked_mul(*self, *other)
    }

    fn div_exact(&self, other: &Self) -> Self {
        self / other
    }

    fn zero_valued(&self) -> bool {
        *self == 0
    }

    fn negative(&self) -> bool {
        *self < 0
    }
}

#[cfg(feature = "bigint")]
impl WeightOps for num_bigint::BigInt {
    fn zero() -> Self {
        num_bigint::BigInt::from(0)
    }

    fn one() -> Self {
        num_bigint::BigInt::from(1)
    }

    fn from_int(value: i64) -> Self {
        num_bigint::BigInt::from(value)
    }

    fn add_checked(&self, other: &Self) -> Option<Self> {
        Some(self + other)
    }

    fn sub_checked(&self, other: &Self) -> Option<Self> {
        Some(self - other)
    }

    fn mul_checked(&self, other: &Self) -> Option<Self> {
        Some(self * other)
    }

    fn div_exact(&self, other: &Self) -> Self {
        self / other
    }

    fn zero_valued(&self) -> bool {
        use num_bigint::Sign;
        self.sign() == Sign::NoSign
    }

    fn negative(&self) -> bool {
        use num_bigint::Sign;
        self.sign() == Sign::Minus
    }
}

/// The canonical weight — a checked 64-bit integer.
#[cfg(not(feature = "bigint"))]
pub type Weight = i64;

/// The canonical weight — an arbitrary-precision integer.
#[cfg(feature = "bigint")]
pub type Weight = num_bigint::BigInt;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_arithmetic() {
        let a = Weight::from_int(3);
        let b = Weight::from_int(5);
        assert_eq!(a.add_checked(&b), Some(Weight::from_int(8)));
        assert_eq!(b.sub_checked(&a), Some(Weight::from_int(2)));
        assert_eq!(a.mul_checked(&b), Some(Weight::from_int(15)));
        assert_eq!(Weight::from_int(15).div_exact(&b), Weight::from_int(3));
    }

    #[cfg(not(feature = "bigint"))]
    #[test]
    fn overflow_is_noticed() {
        let max = Weight::from_int(i64::MAX);
        assert_eq!(max.add_checked(&Weight::one()), None);
        assert_eq!(max.mul_checked(&Weight::from_int(2)), None);
    }
}
