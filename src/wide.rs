// SPDX-License-Identifier: LGPL-2.1-or-later
// See Notices.txt for copyright information
use crate::format::pow2;
use crate::zip_broadcast;
use crate::Error;
use crate::Format;
use crate::Result;
use crate::RoundingMode;
use crate::SaturationMode;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::Ratio;
use num_traits::Signed;
use num_traits::ToPrimitive;
use num_traits::Zero;
use std::collections::BTreeMap;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum WordOrder {
    LeastSignificantFirst,
    MostSignificantFirst,
}

impl Default for WordOrder {
    fn default() -> Self {
        WordOrder::LeastSignificantFirst
    }
}

/// fixed-point values of any format, stored as the raw integer `value * 2^F`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct WideFix {
    data: Vec<BigInt>,
    fmt: Format,
}

impl WideFix {
    /// checks that every raw value lies in the range of `fmt`.
    pub fn new(data: Vec<BigInt>, fmt: Format) -> Result<Self> {
        let fmt = fmt.check_usable()?;
        let (min, max) = (fmt.min_int(), fmt.max_int());
        if let Some(index) = data.iter().position(|v| *v < min || *v > max) {
            return Err(Error::OutOfRange { index, fmt });
        }
        Ok(Self::from_parts(data, fmt))
    }
    #[inline]
    pub(crate) fn from_parts(data: Vec<BigInt>, fmt: Format) -> Self {
        Self { data, fmt }
    }
    #[inline]
    pub fn data(&self) -> &[BigInt] {
        &self.data
    }
    #[inline]
    pub fn into_data(self) -> Vec<BigInt> {
        self.data
    }
    #[inline]
    pub fn fmt(&self) -> Format {
        self.fmt
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn to_ratio(&self) -> Vec<Ratio<BigInt>> {
        let frac_bits = self.fmt.frac_bits();
        self.data
            .iter()
            .map(|raw| {
                if frac_bits >= 0 {
                    Ratio::new(raw.clone(), pow2(frac_bits))
                } else {
                    Ratio::from_integer(raw << (-frac_bits) as usize)
                }
            })
            .collect()
    }
    /// nearest `f64` to each value, and whether that `f64` differs from the
    /// exact value.
    pub fn to_real(&self) -> (Vec<f64>, Vec<bool>) {
        self.to_ratio()
            .into_iter()
            .map(|ratio| {
                let value = ratio.to_f64().unwrap_or(if ratio.is_negative() {
                    std::f64::NEG_INFINITY
                } else {
                    std::f64::INFINITY
                });
                let lossy = Ratio::from_float(value).map_or(true, |exact| exact != ratio);
                (value, lossy)
            })
            .unzip()
    }
    /// rounds to the fraction bits of `r_fmt`, which must come from
    /// `Format::for_round`.
    pub fn round(&self, r_fmt: Format, rounding_mode: RoundingMode) -> Result<Self> {
        let fmt = self.fmt;
        let expected = Format::for_round(fmt, r_fmt.frac_bits(), rounding_mode)?;
        if r_fmt != expected {
            return Err(Error::InvalidRoundFormat {
                expected,
                actual: r_fmt,
            });
        }
        let shift = fmt.frac_bits() - r_fmt.frac_bits();
        if shift < 0 {
            let data = self.data.iter().map(|v| v << (-shift) as usize).collect();
            return Ok(Self::from_parts(data, r_fmt));
        }
        if shift == 0 {
            return Ok(Self::from_parts(self.data.clone(), r_fmt));
        }
        let shift = shift as usize;
        let half: BigInt = BigInt::from(1) << (shift - 1);
        let data = self
            .data
            .iter()
            .map(|v| {
                let offset = match rounding_mode {
                    RoundingMode::Trunc => BigInt::zero(),
                    RoundingMode::NonSymPos => half.clone(),
                    RoundingMode::NonSymNeg => &half - 1,
                    RoundingMode::SymInf if v.is_negative() => &half - 1,
                    RoundingMode::SymInf => half.clone(),
                    RoundingMode::SymZero if !v.is_negative() => &half - 1,
                    RoundingMode::SymZero => half.clone(),
                    RoundingMode::ConvEven | RoundingMode::ConvOdd => {
                        let trunc: BigInt = v >> shift;
                        if trunc.is_odd() == (rounding_mode == RoundingMode::ConvOdd) {
                            &half - 1
                        } else {
                            half.clone()
                        }
                    }
                };
                (v + offset) >> shift
            })
            .collect();
        Ok(Self::from_parts(data, r_fmt))
    }
    /// wraps or clamps into `r_fmt`, returning which elements were out of
    /// range when `saturation_mode` is a warn mode.
    pub fn saturate(
        &self,
        r_fmt: Format,
        saturation_mode: SaturationMode,
    ) -> Result<(Self, Vec<bool>)> {
        let fmt = self.fmt;
        if r_fmt.frac_bits() != fmt.frac_bits() {
            return Err(Error::FracBitsMismatch {
                from: fmt,
                to: r_fmt,
            });
        }
        let r_fmt = r_fmt.check_usable()?;
        let (min, max) = (r_fmt.min_int(), r_fmt.max_int());
        let overflow: Vec<bool> = if saturation_mode.is_warn() {
            self.data.iter().map(|v| *v < min || *v > max).collect()
        } else {
            vec![false; self.len()]
        };
        let data = if saturation_mode.is_clamp() {
            self.data
                .iter()
                .map(|v| v.clone().max(min.clone()).min(max.clone()))
                .collect()
        } else {
            let span = pow2(r_fmt.int_bits() + r_fmt.frac_bits());
            if r_fmt.is_signed() {
                let modulus: BigInt = &span << 1usize;
                self.data
                    .iter()
                    .map(|v| (v + &span).mod_floor(&modulus) - &span)
                    .collect()
            } else {
                self.data.iter().map(|v| v.mod_floor(&span)).collect()
            }
        };
        Ok((Self::from_parts(data, r_fmt), overflow))
    }
    /// lossless move to `frac_bits` fraction bits, which must not be fewer
    /// than the current count.
    pub(crate) fn align(&self, frac_bits: i32) -> Result<Self> {
        let r_fmt = Format::for_round(self.fmt, frac_bits, RoundingMode::Trunc)?;
        self.round(r_fmt, RoundingMode::Trunc)
    }
    pub(crate) fn add(&self, rhs: &Self, mid_fmt: Format) -> Result<Self> {
        let a = self.align(mid_fmt.frac_bits())?;
        let b = rhs.align(mid_fmt.frac_bits())?;
        let data = zip_broadcast(&a.data, &b.data).map(|(a, b)| a + b).collect();
        Ok(Self::from_parts(data, mid_fmt))
    }
    pub(crate) fn sub(&self, rhs: &Self, mid_fmt: Format) -> Result<Self> {
        let a = self.align(mid_fmt.frac_bits())?;
        let b = rhs.align(mid_fmt.frac_bits())?;
        let data = zip_broadcast(&a.data, &b.data).map(|(a, b)| a - b).collect();
        Ok(Self::from_parts(data, mid_fmt))
    }
    pub(crate) fn mult(&self, rhs: &Self, mid_fmt: Format) -> Self {
        let data = zip_broadcast(&self.data, &rhs.data)
            .map(|(a, b)| a * b)
            .collect();
        Self::from_parts(data, mid_fmt)
    }
    pub(crate) fn neg(&self, mid_fmt: Format) -> Self {
        Self::from_parts(self.data.iter().map(|v| -v).collect(), mid_fmt)
    }
    /// a uniform shift only relabels the binary point.
    pub(crate) fn shift(&self, mid_fmt: Format) -> Self {
        Self::from_parts(self.data.clone(), mid_fmt)
    }
    /// shifts each element by its own amount, resizing every group of equal
    /// shifts into `mid_fmt`.
    pub(crate) fn shift_each(&self, shifts: &[i32], mid_fmt: Format) -> Result<Self> {
        let len = if self.len() == 1 { shifts.len() } else { self.len() };
        let mut groups: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for index in 0..len {
            let shift = shifts[if shifts.len() == 1 { 0 } else { index }];
            groups.entry(shift).or_default().push(index);
        }
        let mut data = vec![BigInt::zero(); len];
        for (shift, indexes) in groups {
            let group_fmt = Format::for_shift(self.fmt, shift, shift)?;
            let group = Self::from_parts(
                indexes
                    .iter()
                    .map(|&index| self.data[if self.len() == 1 { 0 } else { index }].clone())
                    .collect(),
                group_fmt,
            );
            let group = group.align(mid_fmt.frac_bits())?;
            for (index, value) in indexes.into_iter().zip(group.data) {
                data[index] = value;
            }
        }
        Ok(Self::from_parts(data, mid_fmt))
    }
    /// two's complement bit patterns, `ceil(width / 64)` words per element.
    pub fn to_words(&self, word_order: WordOrder) -> Vec<u64> {
        let width = self.fmt.width() as usize;
        let words_per_element = (width + 63) / 64;
        let modulus = pow2(width as i32);
        let mut retval = Vec::with_capacity(words_per_element * self.len());
        for v in &self.data {
            let mut bits = v.mod_floor(&modulus);
            let start = retval.len();
            for _ in 0..words_per_element {
                let word: BigInt = &bits & BigInt::from(u64::max_value());
                retval.push(word.to_u64().expect("masked to 64 bits"));
                bits >>= 64usize;
            }
            if word_order == WordOrder::MostSignificantFirst {
                retval[start..].reverse();
            }
        }
        retval
    }
    pub fn from_words(words: &[u64], fmt: Format, word_order: WordOrder) -> Result<Self> {
        let fmt = fmt.check_usable()?;
        let width = fmt.width() as usize;
        let words_per_element = (width + 63) / 64;
        if words.len() % words_per_element != 0 {
            return Err(Error::WordCountMismatch {
                per_element: words_per_element,
                actual: words.len(),
            });
        }
        let modulus = pow2(width as i32);
        let sign_threshold = pow2(fmt.int_bits() + fmt.frac_bits());
        let mut data = Vec::with_capacity(words.len() / words_per_element);
        for (index, chunk) in words.chunks(words_per_element).enumerate() {
            let mut bits = BigInt::zero();
            for (i, &word) in chunk.iter().enumerate() {
                let position = match word_order {
                    WordOrder::LeastSignificantFirst => i,
                    WordOrder::MostSignificantFirst => words_per_element - 1 - i,
                };
                bits += BigInt::from(word) << (64 * position);
            }
            if bits >= modulus {
                return Err(Error::OutOfRange { index, fmt });
            }
            if fmt.is_signed() && bits >= sign_threshold {
                bits -= &modulus;
            }
            data.push(bits);
        }
        Ok(Self::from_parts(data, fmt))
    }
}
