// SPDX-License-Identifier: LGPL-2.1-or-later
// See Notices.txt for copyright information
use crate::narrow::scale_pow2;
use crate::Error;
use crate::MAX_FORMAT_BITS;
use crate::Result;
use crate::RoundingMode;
use crate::NARROW_MAX_EXPONENT;
use crate::NARROW_MAX_WIDTH;
use num_bigint::BigInt;
use num_traits::One;
use num_traits::Signed;
use num_traits::Zero;
use std::cmp;
use std::fmt;
use std::str::FromStr;

/// fixed-point layout: `S` sign bits, `I` integer bits and `F` fraction bits.
///
/// `I` and `F` may be negative, in which case the stored bits start above the
/// binary point (`F < 0`) or end below it (`I < 0`). A value is stored as the
/// two's complement integer `value * 2^F`.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Format {
    sign_bits: i32,
    int_bits: i32,
    frac_bits: i32,
}

impl Format {
    pub fn new(sign_bits: i32, int_bits: i32, frac_bits: i32) -> Result<Self> {
        if sign_bits != 0 && sign_bits != 1 {
            return Err(Error::InvalidSignBits(sign_bits));
        }
        if !Self::bits_in_limit(int_bits) || !Self::bits_in_limit(frac_bits) {
            return Err(Error::FormatTooLarge {
                sign_bits,
                int_bits,
                frac_bits,
            });
        }
        let retval = Self {
            sign_bits,
            int_bits,
            frac_bits,
        };
        if retval.width() < 0 {
            return Err(Error::NegativeWidth(retval));
        }
        Ok(retval)
    }
    fn bits_in_limit(bits: i32) -> bool {
        -MAX_FORMAT_BITS <= bits && bits <= MAX_FORMAT_BITS
    }
    #[inline]
    pub fn signed(int_bits: i32, frac_bits: i32) -> Result<Self> {
        Self::new(1, int_bits, frac_bits)
    }
    #[inline]
    pub fn unsigned(int_bits: i32, frac_bits: i32) -> Result<Self> {
        Self::new(0, int_bits, frac_bits)
    }
    #[inline]
    pub(crate) const fn new_unchecked(sign_bits: i32, int_bits: i32, frac_bits: i32) -> Self {
        Self {
            sign_bits,
            int_bits,
            frac_bits,
        }
    }
    #[inline]
    pub const fn sign_bits(&self) -> i32 {
        self.sign_bits
    }
    #[inline]
    pub const fn int_bits(&self) -> i32 {
        self.int_bits
    }
    #[inline]
    pub const fn frac_bits(&self) -> i32 {
        self.frac_bits
    }
    #[inline]
    pub const fn is_signed(&self) -> bool {
        self.sign_bits != 0
    }
    #[inline]
    pub const fn width(&self) -> i32 {
        self.sign_bits + self.int_bits + self.frac_bits
    }
    /// true when values of this format are stored as `f64`.
    #[inline]
    pub fn is_narrow(&self) -> bool {
        self.width() <= NARROW_MAX_WIDTH
            && self.int_bits.abs() <= NARROW_MAX_EXPONENT
            && self.frac_bits.abs() <= NARROW_MAX_EXPONENT
    }
    #[inline]
    pub fn is_wide(&self) -> bool {
        !self.is_narrow()
    }
    /// returns `self` if it can hold at least one bit of data.
    pub fn check_usable(self) -> Result<Self> {
        if self.width() < 1 {
            Err(Error::NonPositiveWidth(self))
        } else {
            Ok(self)
        }
    }
    /// largest raw value, `2^(I+F) - 1`
    pub fn max_int(&self) -> BigInt {
        pow2(self.int_bits + self.frac_bits) - 1
    }
    /// smallest raw value, `-2^(I+F)` if signed, else 0
    pub fn min_int(&self) -> BigInt {
        if self.is_signed() {
            -pow2(self.int_bits + self.frac_bits)
        } else {
            BigInt::zero()
        }
    }
    /// largest value, as the nearest `f64`
    pub fn max_value(&self) -> f64 {
        scale_pow2(1.0, self.int_bits) - scale_pow2(1.0, -self.frac_bits)
    }
    pub fn min_value(&self) -> f64 {
        if self.is_signed() {
            -scale_pow2(1.0, self.int_bits)
        } else {
            0.0
        }
    }
    pub fn for_add(a: Format, b: Format) -> Result<Self> {
        let a = a.check_usable()?;
        let b = b.check_usable()?;
        let frac_bits = cmp::max(a.frac_bits, b.frac_bits);
        let lo = a.min_int_at(frac_bits) + b.min_int_at(frac_bits);
        let hi = a.max_int_at(frac_bits) + b.max_int_at(frac_bits);
        Self::covering(
            cmp::max(a.sign_bits, b.sign_bits),
            frac_bits,
            &lo,
            &hi,
        )
    }
    pub fn for_sub(a: Format, b: Format) -> Result<Self> {
        let a = a.check_usable()?;
        let b = b.check_usable()?;
        let frac_bits = cmp::max(a.frac_bits, b.frac_bits);
        let lo = a.min_int_at(frac_bits) - b.max_int_at(frac_bits);
        let hi = a.max_int_at(frac_bits) - b.min_int_at(frac_bits);
        Self::covering(1, frac_bits, &lo, &hi)
    }
    pub fn for_addsub(a: Format, b: Format) -> Result<Self> {
        Ok(Self::union(Self::for_add(a, b)?, Self::for_sub(a, b)?))
    }
    pub fn for_mult(a: Format, b: Format) -> Result<Self> {
        let a = a.check_usable()?;
        let b = b.check_usable()?;
        let corners = [
            a.min_int() * b.min_int(),
            a.min_int() * b.max_int(),
            a.max_int() * b.min_int(),
            a.max_int() * b.max_int(),
        ];
        let lo = corners.iter().min().expect("known to be non-empty");
        let hi = corners.iter().max().expect("known to be non-empty");
        // the product of two 1-bit signed values is never negative
        let sign_bits = if a.is_signed() && b.is_signed() && a.width() == 1 && b.width() == 1 {
            0
        } else {
            cmp::max(a.sign_bits, b.sign_bits)
        };
        Self::covering(
            sign_bits,
            a.frac_bits + b.frac_bits,
            lo,
            hi,
        )
    }
    pub fn for_neg(a: Format) -> Result<Self> {
        let a = a.check_usable()?;
        Self::covering(1, a.frac_bits, &-a.max_int(), &-a.min_int())
    }
    pub fn for_abs(a: Format) -> Result<Self> {
        Ok(Self::union(a, Self::for_neg(a)?))
    }
    pub fn for_shift(a: Format, min_shift: i32, max_shift: i32) -> Result<Self> {
        let a = a.check_usable()?;
        if min_shift > max_shift {
            return Err(Error::InvalidShiftRange {
                min: min_shift,
                max: max_shift,
            });
        }
        let int_bits = a.int_bits.checked_add(max_shift);
        let frac_bits = a.frac_bits.checked_sub(min_shift);
        match (int_bits, frac_bits) {
            (Some(int_bits), Some(frac_bits)) => Self::new(a.sign_bits, int_bits, frac_bits),
            _ => Err(Error::InvalidShiftRange {
                min: min_shift,
                max: max_shift,
            }),
        }
    }
    pub fn for_round(a: Format, frac_bits: i32, rounding_mode: RoundingMode) -> Result<Self> {
        let a = a.check_usable()?;
        if !Self::bits_in_limit(frac_bits) {
            return Err(Error::FormatTooLarge {
                sign_bits: a.sign_bits,
                int_bits: a.int_bits,
                frac_bits,
            });
        }
        let mut int_bits = if frac_bits >= a.frac_bits || rounding_mode == RoundingMode::Trunc {
            a.int_bits
        } else {
            a.int_bits + 1
        };
        int_bits = cmp::max(int_bits, 1 - a.sign_bits - frac_bits);
        Self::new(a.sign_bits, int_bits, frac_bits)
    }
    /// smallest format holding every value of both inputs
    pub fn union(a: Format, b: Format) -> Self {
        Self::new_unchecked(
            cmp::max(a.sign_bits, b.sign_bits),
            cmp::max(a.int_bits, b.int_bits),
            cmp::max(a.frac_bits, b.frac_bits),
        )
    }
    pub fn union_all<I: IntoIterator<Item = Format>>(formats: I) -> Option<Self> {
        formats.into_iter().fold(None, |acc, fmt| match acc {
            None => Some(fmt),
            Some(acc) => Some(Self::union(acc, fmt)),
        })
    }
    fn max_int_at(&self, frac_bits: i32) -> BigInt {
        debug_assert!(frac_bits >= self.frac_bits);
        self.max_int() << (frac_bits - self.frac_bits) as usize
    }
    fn min_int_at(&self, frac_bits: i32) -> BigInt {
        debug_assert!(frac_bits >= self.frac_bits);
        self.min_int() << (frac_bits - self.frac_bits) as usize
    }
    /// minimal format with the given sign and fraction bits holding the raw range `[lo, hi]`
    fn covering(sign_bits: i32, frac_bits: i32, lo: &BigInt, hi: &BigInt) -> Result<Self> {
        debug_assert!(sign_bits == 1 || !lo.is_negative());
        let mut bits = 1 - sign_bits;
        if hi.is_positive() {
            bits = cmp::max(bits, hi.bits() as i32);
        }
        if lo.is_negative() {
            let magnitude: BigInt = -lo - 1;
            bits = cmp::max(bits, magnitude.bits() as i32);
        }
        Self::new(sign_bits, bits - frac_bits, frac_bits)
    }
}

pub(crate) fn pow2(exponent: i32) -> BigInt {
    if exponent < 0 {
        BigInt::zero()
    } else {
        BigInt::one() << exponent as usize
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.sign_bits, self.int_bits, self.frac_bits
        )
    }
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !f.alternate() {
            write!(f, "Format{}", self)
        } else {
            f.debug_struct("Format")
                .field("sign_bits", &self.sign_bits)
                .field("int_bits", &self.int_bits)
                .field("frac_bits", &self.frac_bits)
                .field("width", &self.width())
                .field("is_narrow", &self.is_narrow())
                .finish()
        }
    }
}

impl FromStr for Format {
    type Err = Error;
    fn from_str(text: &str) -> Result<Self> {
        let err = || Error::ParseFormat(text.into());
        let inner = text.trim();
        let inner = inner
            .strip_prefix('(')
            .and_then(|v| v.strip_suffix(')'))
            .unwrap_or(inner);
        let mut fields = inner.split(',').map(|v| v.trim().parse::<i32>());
        let mut next = || fields.next().ok_or_else(err)?.map_err(|_| err());
        let sign_bits = next()?;
        let int_bits = next()?;
        let frac_bits = next()?;
        if fields.next().is_some() {
            return Err(err());
        }
        Self::new(sign_bits, int_bits, frac_bits)
    }
}
