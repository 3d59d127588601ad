// SPDX-License-Identifier: LGPL-2.1-or-later
// See Notices.txt for copyright information
use crate::zip_broadcast;
use crate::Error;
use crate::Format;
use crate::Result;
use crate::RoundingMode;
use crate::SaturationMode;
use crate::WideFix;
use crate::NARROW_MAX_EXPONENT;
use num_bigint::BigInt;
use num_traits::FromPrimitive;
use num_traits::ToPrimitive;

/// `x * 2^exponent`, exact whenever the result is a normal `f64`
pub(crate) fn scale_pow2(mut x: f64, mut exponent: i32) -> f64 {
    while exponent > NARROW_MAX_EXPONENT {
        x *= 2.0f64.powi(NARROW_MAX_EXPONENT);
        exponent -= NARROW_MAX_EXPONENT;
    }
    while exponent < -NARROW_MAX_EXPONENT {
        x *= 2.0f64.powi(-NARROW_MAX_EXPONENT);
        exponent += NARROW_MAX_EXPONENT;
    }
    x * 2.0f64.powi(exponent)
}

/// fixed-point values of a narrow format, stored as their exact `f64` value.
#[derive(Clone, PartialEq, Debug)]
pub struct NarrowFix {
    data: Vec<f64>,
    fmt: Format,
}

impl NarrowFix {
    /// checks that `fmt` is narrow and that every element is exactly
    /// representable in `fmt`.
    pub fn new(data: Vec<f64>, fmt: Format) -> Result<Self> {
        let fmt = fmt.check_usable()?;
        if fmt.is_wide() {
            return Err(Error::NotNarrow(fmt));
        }
        let (min, max) = (fmt.min_value(), fmt.max_value());
        for (index, &x) in data.iter().enumerate() {
            if !x.is_finite() {
                return Err(Error::NotFinite { index });
            }
            if x < min || x > max || scale_pow2(x, fmt.frac_bits()).fract() != 0.0 {
                return Err(Error::OutOfRange { index, fmt });
            }
        }
        Ok(Self::from_parts(data, fmt))
    }
    #[inline]
    pub(crate) fn from_parts(data: Vec<f64>, fmt: Format) -> Self {
        debug_assert!(fmt.is_narrow());
        Self { data, fmt }
    }
    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
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
    pub fn from_wide(value: &WideFix) -> Result<Self> {
        let fmt = value.fmt();
        if fmt.is_wide() {
            return Err(Error::NotNarrow(fmt));
        }
        let data = value
            .data()
            .iter()
            .map(|raw| {
                let raw = raw.to_f64().expect("narrow raw value fits in f64");
                scale_pow2(raw, -fmt.frac_bits())
            })
            .collect();
        Ok(Self::from_parts(data, fmt))
    }
    pub fn to_wide(&self) -> WideFix {
        let frac_bits = self.fmt.frac_bits();
        let data = self
            .data
            .iter()
            .map(|&x| BigInt::from_f64(scale_pow2(x, frac_bits)).expect("known to be finite"))
            .collect();
        WideFix::from_parts(data, self.fmt)
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
        if r_fmt.is_wide() {
            return Err(Error::NotNarrow(r_fmt));
        }
        let shift = fmt.frac_bits() - r_fmt.frac_bits();
        // value plus offset must stay below 2^53 source LSBs
        if shift > 0 && (fmt.int_bits() + fmt.frac_bits() > 52 || shift > 52) {
            return Self::from_wide(&self.to_wide().round(r_fmt, rounding_mode)?);
        }
        let half = scale_pow2(1.0, -r_fmt.frac_bits() - 1);
        let lsb = scale_pow2(1.0, -fmt.frac_bits());
        let data = self
            .data
            .iter()
            .map(|&x| {
                let offset = if shift <= 0 {
                    0.0
                } else {
                    match rounding_mode {
                        RoundingMode::Trunc => 0.0,
                        RoundingMode::NonSymPos => half,
                        RoundingMode::NonSymNeg => half - lsb,
                        RoundingMode::SymInf if x < 0.0 => half - lsb,
                        RoundingMode::SymInf => half,
                        RoundingMode::SymZero if x >= 0.0 => half - lsb,
                        RoundingMode::SymZero => half,
                        RoundingMode::ConvEven | RoundingMode::ConvOdd => {
                            let trunc = scale_pow2(x, r_fmt.frac_bits()).floor();
                            let is_odd = trunc.rem_euclid(2.0) != 0.0;
                            if is_odd == (rounding_mode == RoundingMode::ConvOdd) {
                                half - lsb
                            } else {
                                half
                            }
                        }
                    }
                };
                let scaled = scale_pow2(x + offset, r_fmt.frac_bits()).floor();
                scale_pow2(scaled, -r_fmt.frac_bits())
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
        if r_fmt.is_wide() {
            return Err(Error::NotNarrow(r_fmt));
        }
        let (min, max) = (r_fmt.min_value(), r_fmt.max_value());
        let overflow: Vec<bool> = if saturation_mode.is_warn() {
            self.data.iter().map(|&x| x < min || x > max).collect()
        } else {
            vec![false; self.len()]
        };
        let data = if saturation_mode.is_clamp() {
            self.data.iter().map(|&x| x.max(min).min(max)).collect()
        } else if r_fmt.is_signed() {
            let int_bits = r_fmt.int_bits();
            let offset_fmt = if int_bits >= 0 {
                Format::new_unchecked(0, int_bits + 1, 0)
            } else {
                Format::new_unchecked(0, int_bits + 1, -int_bits)
            };
            if Format::for_add(fmt, offset_fmt)?.is_wide() {
                let (wide, _) = self.to_wide().saturate(r_fmt, saturation_mode)?;
                return Ok((Self::from_wide(&wide)?, overflow));
            }
            let span = scale_pow2(1.0, int_bits);
            self.data
                .iter()
                .map(|&x| (x + span).rem_euclid(2.0 * span) - span)
                .collect()
        } else {
            let span = scale_pow2(1.0, r_fmt.int_bits());
            self.data.iter().map(|&x| x.rem_euclid(span)).collect()
        };
        Ok((Self::from_parts(data, r_fmt), overflow))
    }
    pub(crate) fn add(&self, rhs: &Self, mid_fmt: Format) -> Self {
        let data = zip_broadcast(&self.data, &rhs.data)
            .map(|(a, b)| a + b)
            .collect();
        Self::from_parts(data, mid_fmt)
    }
    pub(crate) fn sub(&self, rhs: &Self, mid_fmt: Format) -> Self {
        let data = zip_broadcast(&self.data, &rhs.data)
            .map(|(a, b)| a - b)
            .collect();
        Self::from_parts(data, mid_fmt)
    }
    pub(crate) fn mult(&self, rhs: &Self, mid_fmt: Format) -> Self {
        let data = zip_broadcast(&self.data, &rhs.data)
            .map(|(a, b)| a * b)
            .collect();
        Self::from_parts(data, mid_fmt)
    }
    pub(crate) fn neg(&self, mid_fmt: Format) -> Self {
        Self::from_parts(self.data.iter().map(|&x| 0.0 - x).collect(), mid_fmt)
    }
    pub(crate) fn shift(&self, shifts: &[i32], mid_fmt: Format) -> Self {
        let data = zip_broadcast(&self.data, shifts)
            .map(|(&x, &shift)| scale_pow2(x, shift))
            .collect();
        Self::from_parts(data, mid_fmt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(s: i32, i: i32, f: i32) -> Format {
        Format::new(s, i, f).unwrap()
    }

    fn narrow(data: &[f64], fmt: Format) -> NarrowFix {
        NarrowFix::new(data.to_vec(), fmt).unwrap()
    }

    fn round(data: &[f64], a_fmt: Format, frac_bits: i32, rnd: RoundingMode) -> Vec<f64> {
        let r_fmt = Format::for_round(a_fmt, frac_bits, rnd).unwrap();
        narrow(data, a_fmt).round(r_fmt, rnd).unwrap().data().to_vec()
    }

    #[test]
    fn test_scale_pow2() {
        assert_eq!(scale_pow2(3.0, 4), 48.0);
        assert_eq!(scale_pow2(3.0, -1), 1.5);
        assert_eq!(scale_pow2(scale_pow2(1.0, 1020), -1020), 1.0);
        assert_eq!(scale_pow2(1.0, -1010), 2.0f64.powi(-1010));
        assert_eq!(scale_pow2(0.0, 2000), 0.0);
    }

    #[test]
    fn test_new() {
        let f = fmt(1, 3, 1);
        assert!(NarrowFix::new(vec![-8.0, 7.5, 0.5], f).is_ok());
        assert_eq!(
            NarrowFix::new(vec![0.0, 8.0], f),
            Err(Error::OutOfRange { index: 1, fmt: f })
        );
        assert_eq!(
            NarrowFix::new(vec![0.25], f),
            Err(Error::OutOfRange { index: 0, fmt: f })
        );
        assert_eq!(
            NarrowFix::new(vec![std::f64::NAN], f),
            Err(Error::NotFinite { index: 0 })
        );
        let wide = fmt(1, 40, 20);
        assert_eq!(NarrowFix::new(vec![], wide), Err(Error::NotNarrow(wide)));
    }

    #[test]
    fn test_round_ties() {
        use crate::RoundingMode::*;
        let f = fmt(1, 3, 1);
        let values = [1.5, -1.5, 2.5, -2.5, 1.0, 0.5];
        assert_eq!(round(&values, f, 0, Trunc), [1.0, -2.0, 2.0, -3.0, 1.0, 0.0]);
        assert_eq!(round(&values, f, 0, NonSymPos), [2.0, -1.0, 3.0, -2.0, 1.0, 1.0]);
        assert_eq!(round(&values, f, 0, NonSymNeg), [1.0, -2.0, 2.0, -3.0, 1.0, 0.0]);
        assert_eq!(round(&values, f, 0, SymInf), [2.0, -2.0, 3.0, -3.0, 1.0, 1.0]);
        assert_eq!(round(&values, f, 0, SymZero), [1.0, -1.0, 2.0, -2.0, 1.0, 0.0]);
        assert_eq!(round(&values, f, 0, ConvEven), [2.0, -2.0, 2.0, -2.0, 1.0, 0.0]);
        assert_eq!(round(&values, f, 0, ConvOdd), [1.0, -1.0, 3.0, -3.0, 1.0, 1.0]);
    }

    #[test]
    fn test_round_non_ties() {
        use crate::RoundingMode::*;
        let f = fmt(1, 2, 2);
        let values = [1.25, 1.75, -1.25, -1.75];
        for &rnd in RoundingMode::VALUES.iter() {
            let expected = if rnd == Trunc {
                [1.0, 1.0, -2.0, -2.0]
            } else {
                [1.0, 2.0, -1.0, -2.0]
            };
            assert_eq!(round(&values, f, 0, rnd), expected, "{:?}", rnd);
        }
    }

    #[test]
    fn test_round_scale_up() {
        let f = fmt(0, 2, 1);
        let values = [3.5, 0.5];
        for &rnd in RoundingMode::VALUES.iter() {
            assert_eq!(round(&values, f, 4, rnd), values);
        }
    }

    #[test]
    fn test_round_negative_frac_bits() {
        use crate::RoundingMode::*;
        let f = fmt(1, 6, 0);
        assert_eq!(round(&[12.0, 13.0, -12.0], f, -3, NonSymPos), [16.0, 16.0, -8.0]);
        assert_eq!(round(&[12.0, 13.0, -12.0], f, -3, ConvEven), [16.0, 16.0, -16.0]);
        assert_eq!(round(&[12.0, 13.0, -12.0], f, -3, Trunc), [8.0, 8.0, -16.0]);
    }

    #[test]
    fn test_round_invalid_format() {
        let a = narrow(&[1.0], fmt(1, 3, 2));
        assert_eq!(
            a.round(fmt(1, 3, 0), RoundingMode::NonSymPos),
            Err(Error::InvalidRoundFormat {
                expected: fmt(1, 4, 0),
                actual: fmt(1, 3, 0),
            })
        );
    }

    #[test]
    fn test_round_promotes_near_limit() {
        // 2^53 - 1 rounded half-up needs 2^53 + 2^k internally
        let f = fmt(0, 53, 0);
        let max = 2.0f64.powi(53) - 1.0;
        assert_eq!(round(&[max], f, -1, RoundingMode::NonSymPos), [2.0f64.powi(53)]);
        assert_eq!(round(&[max], f, -1, RoundingMode::ConvEven), [2.0f64.powi(53)]);
        assert_eq!(round(&[max], f, -1, RoundingMode::ConvOdd), [max - 1.0]);
        assert_eq!(round(&[max - 2.0], f, -1, RoundingMode::ConvOdd), [max - 1.0]);
        assert_eq!(round(&[max], f, -1, RoundingMode::Trunc), [max - 1.0]);
    }

    #[test]
    fn test_saturate() {
        let f = fmt(1, 4, 0);
        let a = narrow(&[8.0, -9.0, 3.0, -8.0, 15.0], f);
        let r_fmt = fmt(1, 3, 0);
        let (r, overflow) = a.saturate(r_fmt, SaturationMode::Wrap).unwrap();
        assert_eq!(r.data(), [-8.0, 7.0, 3.0, -8.0, -1.0]);
        assert_eq!(overflow, [false; 5]);
        let (r, overflow) = a.saturate(r_fmt, SaturationMode::WrapWarn).unwrap();
        assert_eq!(r.data(), [-8.0, 7.0, 3.0, -8.0, -1.0]);
        assert_eq!(overflow, [true, true, false, false, true]);
        let (r, overflow) = a.saturate(r_fmt, SaturationMode::Sat).unwrap();
        assert_eq!(r.data(), [7.0, -8.0, 3.0, -8.0, 7.0]);
        assert_eq!(overflow, [false; 5]);
        let (r, overflow) = a.saturate(r_fmt, SaturationMode::SatWarn).unwrap();
        assert_eq!(r.data(), [7.0, -8.0, 3.0, -8.0, 7.0]);
        assert_eq!(overflow, [true, true, false, false, true]);

        let (r, _) = a.saturate(fmt(0, 3, 0), SaturationMode::Wrap).unwrap();
        assert_eq!(r.data(), [0.0, 7.0, 3.0, 0.0, 7.0]);
        let (r, _) = a.saturate(fmt(0, 3, 0), SaturationMode::Sat).unwrap();
        assert_eq!(r.data(), [7.0, 0.0, 3.0, 0.0, 7.0]);
    }

    #[test]
    fn test_saturate_negative_int_bits() {
        let a = narrow(&[0.25, -0.25, 0.125], fmt(1, 0, 3));
        let (r, overflow) = a.saturate(fmt(1, -2, 3), SaturationMode::WrapWarn).unwrap();
        assert_eq!(r.data(), [-0.25, -0.25, 0.125]);
        assert_eq!(overflow, [true, false, false]);
        let (r, _) = a.saturate(fmt(0, -1, 3), SaturationMode::Wrap).unwrap();
        assert_eq!(r.data(), [0.25, 0.25, 0.125]);
    }

    #[test]
    fn test_saturate_promotes_near_limit() {
        let f = fmt(1, 52, 0);
        let big = 2.0f64.powi(52) - 1.0;
        let a = narrow(&[big, -big - 1.0], f);
        let (r, overflow) = a.saturate(fmt(1, 51, 0), SaturationMode::WrapWarn).unwrap();
        assert_eq!(r.data(), [-1.0, 0.0]);
        assert_eq!(overflow, [true, true]);
    }

    #[test]
    fn test_saturate_frac_mismatch() {
        let a = narrow(&[1.0], fmt(1, 3, 1));
        assert_eq!(
            a.saturate(fmt(1, 3, 0), SaturationMode::Sat),
            Err(Error::FracBitsMismatch {
                from: fmt(1, 3, 1),
                to: fmt(1, 3, 0),
            })
        );
    }

    #[test]
    fn test_wide_conversion() {
        let f = fmt(1, 10, 5);
        let a = narrow(&[-1024.0, 3.28125, 1023.96875], f);
        let wide = a.to_wide();
        assert_eq!(
            wide.data(),
            [BigInt::from(-32768), BigInt::from(105), BigInt::from(32767)]
        );
        assert_eq!(NarrowFix::from_wide(&wide), Ok(a));
    }
}
