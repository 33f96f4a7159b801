//! Exact signed mixed numbers
//!
//! A mixed number is `whole + numerator/denominator`. Magnitudes are stored
//! unsigned and the sign is kept in a separate flag. Equality and ordering
//! only look at the numeric value, so `2/4 == 1/2 == 0.5`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::core::notation;
use crate::CombatError;

/// Greatest common factor of two magnitudes
///
/// `gcf(0, d) == d`, and `gcf(0, 0) == 1` so callers can always divide by
/// the result.
pub fn gcf(a: u32, b: u32) -> u32 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    if a == 0 {
        1
    } else {
        a
    }
}

fn gcf_wide(a: u128, b: u128) -> u128 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}

/// Signed mixed number
///
/// Values are plain `Copy` data; every operation returns a new value.
#[derive(Debug, Clone, Copy, Default)]
pub struct MixedNumber {
    negative: bool,
    whole: u32,
    numerator: u32,
    denominator: u32,
}

impl MixedNumber {
    /// Zero, with no fraction part (denominator 0 is valid when the numerator is 0)
    pub const ZERO: MixedNumber = MixedNumber {
        negative: false,
        whole: 0,
        numerator: 0,
        denominator: 0,
    };

    pub const fn new(negative: bool, whole: u32, numerator: u32, denominator: u32) -> Self {
        MixedNumber {
            negative,
            whole,
            numerator,
            denominator,
        }
    }

    /// Positive proper or improper fraction
    pub const fn from_fraction(numerator: u32, denominator: u32) -> Self {
        MixedNumber::new(false, 0, numerator, denominator)
    }

    /// Positive whole number (denominator 1)
    pub const fn from_whole(whole: u32) -> Self {
        MixedNumber::new(false, whole, 0, 1)
    }

    /// Same magnitude with an explicit sign
    pub const fn with_negative(self, negative: bool) -> Self {
        MixedNumber { negative, ..self }
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn whole(&self) -> u32 {
        self.whole
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// A zero denominator is only valid while the numerator is zero too
    pub fn is_valid(&self) -> bool {
        self.numerator == 0 || self.denominator != 0
    }

    pub fn sign(&self) -> f64 {
        if self.negative {
            -1.0
        } else {
            1.0
        }
    }

    /// Numeric value; the fraction term counts as 0 when the denominator is 0
    ///
    /// Computed with a single division so equal rationals always produce
    /// the same float regardless of representation.
    pub fn value(&self) -> f64 {
        if self.denominator == 0 {
            return self.sign() * self.whole as f64;
        }
        let den = self.denominator as u64;
        let total = self.whole as u64 * den + self.numerator as u64;
        self.sign() * (total as f64 / den as f64)
    }

    /// True when the magnitude is zero (the sign flag is ignored)
    pub fn is_zero(&self) -> bool {
        self.whole == 0 && self.numerator == 0
    }

    pub fn abs(self) -> Self {
        self.with_negative(false)
    }

    /// Move the whole part into the numerator. E.g. `1 1/2` => `3/2`
    ///
    /// A zero denominator becomes 1.
    pub fn whole_to_fraction(self) -> Self {
        let denominator = self.denominator.max(1);
        let numerator = self
            .numerator
            .saturating_add(self.whole.saturating_mul(denominator));
        MixedNumber {
            negative: self.negative,
            whole: 0,
            numerator,
            denominator,
        }
    }

    /// Move whole units out of an improper fraction. E.g. `7/2` => `3 1/2`
    pub fn fraction_to_whole(self) -> Self {
        if self.denominator == 0 || self.numerator < self.denominator {
            return self;
        }
        MixedNumber {
            whole: self.whole.saturating_add(self.numerator / self.denominator),
            numerator: self.numerator % self.denominator,
            ..self
        }
    }

    /// Move a single unit from the whole part into the fraction. E.g. `2 1/2` => `1 3/2`
    pub fn whole_to_fraction_single(self) -> Self {
        if self.whole == 0 {
            return self;
        }
        let denominator = self.denominator.max(1);
        MixedNumber {
            whole: self.whole - 1,
            numerator: self.numerator.saturating_add(denominator),
            denominator,
            ..self
        }
    }

    /// Move a single unit from the fraction into the whole part. E.g. `5/2` => `1 3/2`
    pub fn fraction_to_whole_single(self) -> Self {
        if self.denominator == 0 || self.numerator < self.denominator {
            return self;
        }
        MixedNumber {
            whole: self.whole.saturating_add(1),
            numerator: self.numerator - self.denominator,
            ..self
        }
    }

    /// Normalize into whole part plus reduced proper fraction. E.g. `6/4` => `1 1/2`
    pub fn simplified(self) -> Self {
        if self.denominator == 0 {
            return self;
        }
        let normalized = self.fraction_to_whole();
        let factor = gcf(normalized.numerator, normalized.denominator);
        let numerator = normalized.numerator / factor;
        let denominator = normalized.denominator / factor;
        MixedNumber {
            negative: normalized.negative && (normalized.whole != 0 || numerator != 0),
            whole: normalized.whole,
            numerator,
            denominator,
        }
    }

    /// Signed numerator over a non-zero denominator, widened
    fn wide_fraction(&self) -> (i128, u128) {
        let den = self.denominator.max(1) as u128;
        let magnitude = self.whole as u128 * den + self.numerator as u128;
        let signed = magnitude as i128;
        (if self.negative { -signed } else { signed }, den)
    }

    fn from_wide(numerator: i128, denominator: u128) -> Self {
        let negative = numerator < 0;
        let mut magnitude = numerator.unsigned_abs();
        let mut denominator = denominator.max(1);
        let limit = u32::MAX as u128;

        if magnitude > limit || denominator > limit {
            let factor = gcf_wide(magnitude, denominator);
            magnitude /= factor;
            denominator /= factor;
        }
        // precision is only lost past the u32 range
        while magnitude > limit || denominator > limit {
            magnitude >>= 1;
            denominator = (denominator >> 1).max(1);
        }

        MixedNumber {
            negative: negative && magnitude != 0,
            whole: 0,
            numerator: magnitude as u32,
            denominator: denominator as u32,
        }
    }

    /// Fraction-only sum or difference over the cross-multiplied denominator
    fn combine(self, rhs: Self, subtract: bool) -> Self {
        let (a_num, a_den) = self.wide_fraction();
        let (b_num, b_den) = rhs.wide_fraction();
        let b_num = if subtract { -b_num } else { b_num };

        if a_den == b_den {
            MixedNumber::from_wide(a_num + b_num, a_den)
        } else {
            MixedNumber::from_wide(
                a_num * b_den as i128 + b_num * a_den as i128,
                a_den * b_den,
            )
        }
    }
}

impl Add for MixedNumber {
    type Output = MixedNumber;

    fn add(self, rhs: MixedNumber) -> MixedNumber {
        if !self.is_valid() {
            return rhs;
        }
        if !rhs.is_valid() {
            return self;
        }
        self.combine(rhs, false)
    }
}

impl Sub for MixedNumber {
    type Output = MixedNumber;

    /// An invalid left side counts as zero, an invalid right side is ignored
    fn sub(self, rhs: MixedNumber) -> MixedNumber {
        if !self.is_valid() {
            return -rhs;
        }
        if !rhs.is_valid() {
            return self;
        }
        self.combine(rhs, true)
    }
}

impl AddAssign for MixedNumber {
    fn add_assign(&mut self, rhs: MixedNumber) {
        *self = *self + rhs;
    }
}

impl SubAssign for MixedNumber {
    fn sub_assign(&mut self, rhs: MixedNumber) {
        *self = *self - rhs;
    }
}

impl Neg for MixedNumber {
    type Output = MixedNumber;

    fn neg(self) -> MixedNumber {
        self.with_negative(!self.negative)
    }
}

impl Sum for MixedNumber {
    fn sum<I: Iterator<Item = MixedNumber>>(iter: I) -> MixedNumber {
        iter.fold(MixedNumber::ZERO, |acc, n| acc + n)
    }
}

impl PartialEq for MixedNumber {
    fn eq(&self, other: &MixedNumber) -> bool {
        self.value() == other.value()
    }
}

impl PartialOrd for MixedNumber {
    fn partial_cmp(&self, other: &MixedNumber) -> Option<Ordering> {
        self.value().partial_cmp(&other.value())
    }
}

impl fmt::Display for MixedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative && !self.is_zero() {
            write!(f, "-")?;
        }
        match (self.whole, self.numerator) {
            (whole, 0) => write!(f, "{}", whole),
            (0, numerator) => write!(f, "{}/{}", numerator, self.denominator),
            (whole, numerator) => write!(f, "{} {}/{}", whole, numerator, self.denominator),
        }
    }
}

impl FromStr for MixedNumber {
    type Err = CombatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        notation::parse_mixed_number(s)
    }
}

impl Serialize for MixedNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MixedNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Config files may write whole numbers as plain JSON integers
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Whole(i64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Repr::Whole(n) => {
                let magnitude = u32::try_from(n.unsigned_abs()).map_err(serde::de::Error::custom)?;
                Ok(MixedNumber::from_whole(magnitude).with_negative(n < 0))
            }
        }
    }
}
