// SPDX-License-Identifier: LGPL-2.1-or-later
// See Notices.txt for copyright information
use crate::format::pow2;
use crate::zip_broadcast;
use crate::Error;
use crate::FixState;
use crate::Format;
use crate::NarrowFix;
use crate::Result;
use crate::RoundingMode;
use crate::SaturationMode;
use crate::StatusFlags;
use crate::WideFix;
use crate::WordOrder;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::Ratio;
use num_traits::Float;
use num_traits::One;
use num_traits::Signed;
use num_traits::Zero;
use std::cmp;
use tracing::trace;
use tracing::warn;

/// the storage of a `FixArray`: `f64` for narrow formats, raw `BigInt`
/// otherwise.
///
/// intermediate results may hold a narrow format in `Wide`; every value
/// handed out by `FixArray` is `Narrow` exactly when its format is narrow.
#[derive(Clone, PartialEq, Debug)]
pub enum FixValue {
    Narrow(NarrowFix),
    Wide(WideFix),
}

impl FixValue {
    /// demotes to `Narrow` when the format allows it
    pub fn from_wide(value: WideFix) -> Result<Self> {
        if value.fmt().is_narrow() {
            Ok(FixValue::Narrow(NarrowFix::from_wide(&value)?))
        } else {
            Ok(FixValue::Wide(value))
        }
    }
    pub fn fmt(&self) -> Format {
        match self {
            FixValue::Narrow(v) => v.fmt(),
            FixValue::Wide(v) => v.fmt(),
        }
    }
    pub fn len(&self) -> usize {
        match self {
            FixValue::Narrow(v) => v.len(),
            FixValue::Wide(v) => v.len(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn to_wide(&self) -> WideFix {
        match self {
            FixValue::Narrow(v) => v.to_wide(),
            FixValue::Wide(v) => v.clone(),
        }
    }
    pub fn round(&self, r_fmt: Format, rounding_mode: RoundingMode) -> Result<Self> {
        match self {
            FixValue::Narrow(v) if r_fmt.is_narrow() => {
                Ok(FixValue::Narrow(v.round(r_fmt, rounding_mode)?))
            }
            _ => Self::from_wide(self.to_wide().round(r_fmt, rounding_mode)?),
        }
    }
    pub fn saturate(
        &self,
        r_fmt: Format,
        saturation_mode: SaturationMode,
    ) -> Result<(Self, Vec<bool>)> {
        match self {
            FixValue::Narrow(v) if r_fmt.is_narrow() => {
                let (v, overflow) = v.saturate(r_fmt, saturation_mode)?;
                Ok((FixValue::Narrow(v), overflow))
            }
            _ => {
                let (v, overflow) = self.to_wide().saturate(r_fmt, saturation_mode)?;
                Ok((Self::from_wide(v)?, overflow))
            }
        }
    }
    /// rounds to the fraction bits of `r_fmt`, then saturates into `r_fmt`
    pub fn resize(
        &self,
        r_fmt: Format,
        rounding_mode: RoundingMode,
        saturation_mode: SaturationMode,
    ) -> Result<(Self, Vec<bool>)> {
        let rounded_fmt = Format::for_round(self.fmt(), r_fmt.frac_bits(), rounding_mode)?;
        self.round(rounded_fmt, rounding_mode)?
            .saturate(r_fmt, saturation_mode)
    }
    fn align(&self, frac_bits: i32) -> Result<Self> {
        let r_fmt = Format::for_round(self.fmt(), frac_bits, RoundingMode::Trunc)?;
        self.round(r_fmt, RoundingMode::Trunc)
    }
    fn is_negative(&self) -> Vec<bool> {
        match self {
            FixValue::Narrow(v) => v.data().iter().map(|&x| x < 0.0).collect(),
            FixValue::Wide(v) => v.data().iter().map(Signed::is_negative).collect(),
        }
    }
    /// takes element `i` from `a` where `choose_a[i]`, else from `b`
    fn select(choose_a: &[bool], a: &Self, b: &Self) -> Self {
        debug_assert_eq!(a.fmt(), b.fmt());
        let pick = |i: usize| choose_a[if choose_a.len() == 1 { 0 } else { i }];
        match (a, b) {
            (FixValue::Narrow(a), FixValue::Narrow(b)) => {
                let data = (0..a.len())
                    .map(|i| if pick(i) { a.data()[i] } else { b.data()[i] })
                    .collect();
                FixValue::Narrow(NarrowFix::from_parts(data, a.fmt()))
            }
            (a, b) => {
                let (a, b) = (a.to_wide(), b.to_wide());
                let data = (0..a.len())
                    .map(|i| {
                        if pick(i) {
                            a.data()[i].clone()
                        } else {
                            b.data()[i].clone()
                        }
                    })
                    .collect();
                FixValue::Wide(WideFix::from_parts(data, a.fmt()))
            }
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn apply<T: PartialOrd>(self, a: &T, b: &T) -> bool {
        match self {
            Comparison::Eq => a == b,
            Comparison::Ne => a != b,
            Comparison::Lt => a < b,
            Comparison::Le => a <= b,
            Comparison::Gt => a > b,
            Comparison::Ge => a >= b,
        }
    }
}

fn report_overflow(r_fmt: Format, saturation_mode: SaturationMode, overflow: &[bool]) {
    let count = overflow.iter().filter(|&&v| v).count();
    if count != 0 {
        warn!(fmt = %r_fmt, ?saturation_mode, count, "values out of range while saturating");
    }
}

/// `floor(x * 2^frac_bits + 1/2)`, computed exactly
fn quantize(x: f64, frac_bits: i32) -> Option<BigInt> {
    if !x.is_finite() {
        return None;
    }
    let (mantissa, exponent, sign) = Float::integer_decode(x);
    let mut value = BigInt::from(mantissa);
    if sign < 0 {
        value = -value;
    }
    let exponent = i64::from(exponent) + i64::from(frac_bits);
    Some(if exponent >= 0 {
        value << exponent as usize
    } else {
        let shift = (-exponent) as usize;
        (value + (BigInt::one() << (shift - 1))) >> shift
    })
}

/// an array of fixed-point values sharing one `Format`.
///
/// elementwise operations accept two operands of identical shape, or one
/// operand of shape `[]` which is broadcast against the other.
#[derive(Clone, PartialEq, Debug)]
pub struct FixArray {
    shape: Vec<usize>,
    value: FixValue,
}

impl FixArray {
    pub fn new(value: FixValue, shape: Vec<usize>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != value.len() {
            return Err(Error::LengthMismatch {
                expected,
                actual: value.len(),
            });
        }
        let value = match value {
            FixValue::Wide(v) => FixValue::from_wide(v)?,
            value => value,
        };
        Ok(Self { shape, value })
    }
    fn from_wide_parts(shape: Vec<usize>, data: Vec<BigInt>, fmt: Format) -> Result<Self> {
        Ok(Self {
            shape,
            value: FixValue::from_wide(WideFix::from_parts(data, fmt))?,
        })
    }
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }
    #[inline]
    pub fn fmt(&self) -> Format {
        self.value.fmt()
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.value.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
    #[inline]
    pub fn value(&self) -> &FixValue {
        &self.value
    }
    pub fn into_value(self) -> FixValue {
        self.value
    }
    pub fn reshape(self, shape: Vec<usize>) -> Result<Self> {
        Self::new(self.value, shape)
    }
    /// quantizes with round-half-up; `Sat` and `SatWarn` clamp out-of-range
    /// values, the wrapping modes reject them.
    pub fn from_real(
        values: &[f64],
        fmt: Format,
        saturation_mode: SaturationMode,
        state: Option<&mut FixState>,
    ) -> Result<Self> {
        let fmt = fmt.check_usable()?;
        let mut default_state = FixState::default();
        let state = state.unwrap_or(&mut default_state);
        let (min, max) = (fmt.min_int(), fmt.max_int());
        let mut data = Vec::with_capacity(values.len());
        let mut overflow = Vec::with_capacity(values.len());
        for (index, &x) in values.iter().enumerate() {
            let raw = quantize(x, fmt.frac_bits()).ok_or(Error::NotFinite { index })?;
            let out_of_range = raw < min || raw > max;
            if out_of_range && !saturation_mode.is_clamp() {
                return Err(Error::OutOfRange { index, fmt });
            }
            overflow.push(out_of_range && saturation_mode.is_warn());
            data.push(raw.max(min.clone()).min(max.clone()));
        }
        report_overflow(fmt, saturation_mode, &overflow);
        state.record_overflow(&overflow);
        Self::from_wide_parts(vec![values.len()], data, fmt)
    }
    /// builds values from their two's complement raw integers
    pub fn from_integer<T: Clone + Into<BigInt>>(values: &[T], fmt: Format) -> Result<Self> {
        let data = values.iter().cloned().map(Into::into).collect();
        let value = WideFix::new(data, fmt)?;
        Ok(Self {
            shape: vec![values.len()],
            value: FixValue::from_wide(value)?,
        })
    }
    pub fn to_integer(&self) -> Vec<BigInt> {
        self.value.to_wide().into_data()
    }
    pub fn to_real(&self, state: Option<&mut FixState>) -> Vec<f64> {
        let mut default_state = FixState::default();
        let state = state.unwrap_or(&mut default_state);
        match &self.value {
            FixValue::Narrow(v) => {
                state.record(vec![StatusFlags::empty(); v.len()]);
                v.data().to_vec()
            }
            FixValue::Wide(v) => {
                let (data, lossy) = v.to_real();
                let count = lossy.iter().filter(|&&v| v).count();
                if count != 0 {
                    warn!(fmt = %v.fmt(), count, "precision lost converting to f64");
                }
                state.record(
                    lossy
                        .into_iter()
                        .map(|lossy| {
                            if lossy {
                                StatusFlags::PRECISION_LOSS
                            } else {
                                StatusFlags::empty()
                            }
                        })
                        .collect(),
                );
                data
            }
        }
    }
    pub fn to_ratio(&self) -> Vec<Ratio<BigInt>> {
        self.value.to_wide().to_ratio()
    }
    pub fn to_words(&self, word_order: WordOrder) -> Vec<u64> {
        self.value.to_wide().to_words(word_order)
    }
    pub fn from_words(words: &[u64], fmt: Format, word_order: WordOrder) -> Result<Self> {
        let value = WideFix::from_words(words, fmt, word_order)?;
        Ok(Self {
            shape: vec![value.len()],
            value: FixValue::from_wide(value)?,
        })
    }
    pub fn zeros(shape: Vec<usize>, fmt: Format) -> Result<Self> {
        let fmt = fmt.check_usable()?;
        let len = shape.iter().product();
        Self::from_wide_parts(shape, vec![BigInt::zero(); len], fmt)
    }
    /// the largest value of `fmt`, as a 0-dimensional array
    pub fn max_value(fmt: Format) -> Result<Self> {
        let fmt = fmt.check_usable()?;
        Self::from_wide_parts(Vec::new(), vec![fmt.max_int()], fmt)
    }
    /// the smallest value of `fmt`, as a 0-dimensional array
    pub fn min_value(fmt: Format) -> Result<Self> {
        let fmt = fmt.check_usable()?;
        Self::from_wide_parts(Vec::new(), vec![fmt.min_int()], fmt)
    }
    fn broadcast_shape(&self, rhs: &Self) -> Result<Vec<usize>> {
        if self.shape == rhs.shape || rhs.shape.is_empty() {
            Ok(self.shape.clone())
        } else if self.shape.is_empty() {
            Ok(rhs.shape.clone())
        } else {
            Err(Error::ShapeMismatch {
                lhs: self.shape.clone(),
                rhs: rhs.shape.clone(),
            })
        }
    }
    fn finish(
        shape: Vec<usize>,
        mid: &FixValue,
        r_fmt: Format,
        rounding_mode: RoundingMode,
        saturation_mode: SaturationMode,
        state: Option<&mut FixState>,
    ) -> Result<Self> {
        let (value, overflow) = mid.resize(r_fmt, rounding_mode, saturation_mode)?;
        report_overflow(r_fmt, saturation_mode, &overflow);
        let mut default_state = FixState::default();
        state
            .unwrap_or(&mut default_state)
            .record_overflow(&overflow);
        Ok(Self { shape, value })
    }
    pub fn round(&self, r_fmt: Format, rounding_mode: RoundingMode) -> Result<Self> {
        Ok(Self {
            shape: self.shape.clone(),
            value: self.value.round(r_fmt, rounding_mode)?,
        })
    }
    pub fn saturate(
        &self,
        r_fmt: Format,
        saturation_mode: SaturationMode,
        state: Option<&mut FixState>,
    ) -> Result<Self> {
        let (value, overflow) = self.value.saturate(r_fmt, saturation_mode)?;
        report_overflow(r_fmt, saturation_mode, &overflow);
        let mut default_state = FixState::default();
        state
            .unwrap_or(&mut default_state)
            .record_overflow(&overflow);
        Ok(Self {
            shape: self.shape.clone(),
            value,
        })
    }
    pub fn resize(
        &self,
        r_fmt: Format,
        rounding_mode: RoundingMode,
        saturation_mode: SaturationMode,
        state: Option<&mut FixState>,
    ) -> Result<Self> {
        Self::finish(
            self.shape.clone(),
            &self.value,
            r_fmt,
            rounding_mode,
            saturation_mode,
            state,
        )
    }
    /// whether each value fits `r_fmt` after rounding, without saturation
    pub fn in_range(&self, r_fmt: Format, rounding_mode: RoundingMode) -> Result<Vec<bool>> {
        let r_fmt = r_fmt.check_usable()?;
        let rounded_fmt = Format::for_round(self.fmt(), r_fmt.frac_bits(), rounding_mode)?;
        let rounded = self.value.round(rounded_fmt, rounding_mode)?.to_wide();
        let (min, max) = (r_fmt.min_int(), r_fmt.max_int());
        Ok(rounded
            .data()
            .iter()
            .map(|v| *v >= min && *v <= max)
            .collect())
    }
    fn binary_mid<N, W>(
        &self,
        rhs: &Self,
        mid_fmt: Format,
        narrow_op: N,
        wide_op: W,
    ) -> Result<(Vec<usize>, FixValue)>
    where
        N: FnOnce(&NarrowFix, &NarrowFix) -> NarrowFix,
        W: FnOnce(&WideFix, &WideFix) -> Result<WideFix>,
    {
        let shape = self.broadcast_shape(rhs)?;
        let mid = match (&self.value, &rhs.value) {
            (FixValue::Narrow(a), FixValue::Narrow(b)) if mid_fmt.is_narrow() => {
                FixValue::Narrow(narrow_op(a, b))
            }
            (a, b) => {
                trace!(%mid_fmt, "using wide representation");
                FixValue::Wide(wide_op(&a.to_wide(), &b.to_wide())?)
            }
        };
        Ok((shape, mid))
    }
    fn unary_mid<N, W>(&self, mid_fmt: Format, narrow_op: N, wide_op: W) -> Result<FixValue>
    where
        N: FnOnce(&NarrowFix) -> NarrowFix,
        W: FnOnce(&WideFix) -> Result<WideFix>,
    {
        Ok(match &self.value {
            FixValue::Narrow(a) if mid_fmt.is_narrow() => FixValue::Narrow(narrow_op(a)),
            a => {
                trace!(%mid_fmt, "using wide representation");
                FixValue::Wide(wide_op(&a.to_wide())?)
            }
        })
    }
    fn add_mid(&self, rhs: &Self) -> Result<(Vec<usize>, FixValue)> {
        let mid_fmt = Format::for_add(self.fmt(), rhs.fmt())?;
        self.binary_mid(
            rhs,
            mid_fmt,
            |a, b| a.add(b, mid_fmt),
            |a, b| a.add(b, mid_fmt),
        )
    }
    fn sub_mid(&self, rhs: &Self) -> Result<(Vec<usize>, FixValue)> {
        let mid_fmt = Format::for_sub(self.fmt(), rhs.fmt())?;
        self.binary_mid(
            rhs,
            mid_fmt,
            |a, b| a.sub(b, mid_fmt),
            |a, b| a.sub(b, mid_fmt),
        )
    }
    fn neg_mid(&self) -> Result<FixValue> {
        let mid_fmt = Format::for_neg(self.fmt())?;
        self.unary_mid(mid_fmt, |a| a.neg(mid_fmt), |a| Ok(a.neg(mid_fmt)))
    }
    pub fn add(
        &self,
        rhs: &Self,
        r_fmt: Option<Format>,
        rounding_mode: RoundingMode,
        saturation_mode: SaturationMode,
        state: Option<&mut FixState>,
    ) -> Result<Self> {
        let (shape, mid) = self.add_mid(rhs)?;
        let r_fmt = r_fmt.unwrap_or_else(|| mid.fmt());
        Self::finish(shape, &mid, r_fmt, rounding_mode, saturation_mode, state)
    }
    pub fn sub(
        &self,
        rhs: &Self,
        r_fmt: Option<Format>,
        rounding_mode: RoundingMode,
        saturation_mode: SaturationMode,
        state: Option<&mut FixState>,
    ) -> Result<Self> {
        let (shape, mid) = self.sub_mid(rhs)?;
        let r_fmt = r_fmt.unwrap_or_else(|| mid.fmt());
        Self::finish(shape, &mid, r_fmt, rounding_mode, saturation_mode, state)
    }
    /// `self + rhs` where `add` is true, else `self - rhs`; `add` holds one
    /// entry per result element, or a single entry for all of them.
    pub fn addsub(
        &self,
        rhs: &Self,
        add: &[bool],
        r_fmt: Option<Format>,
        rounding_mode: RoundingMode,
        saturation_mode: SaturationMode,
        state: Option<&mut FixState>,
    ) -> Result<Self> {
        let r_fmt = match r_fmt {
            Some(r_fmt) => r_fmt,
            None => Format::for_addsub(self.fmt(), rhs.fmt())?,
        };
        let (shape, sum) = self.add_mid(rhs)?;
        let (_, difference) = self.sub_mid(rhs)?;
        if add.len() != 1 && add.len() != sum.len() {
            return Err(Error::LengthMismatch {
                expected: sum.len(),
                actual: add.len(),
            });
        }
        let (sum, sum_overflow) = sum.resize(r_fmt, rounding_mode, saturation_mode)?;
        let (difference, difference_overflow) =
            difference.resize(r_fmt, rounding_mode, saturation_mode)?;
        let value = FixValue::select(add, &sum, &difference);
        let overflow: Vec<bool> = (0..value.len())
            .map(|i| {
                if add[if add.len() == 1 { 0 } else { i }] {
                    sum_overflow[i]
                } else {
                    difference_overflow[i]
                }
            })
            .collect();
        report_overflow(r_fmt, saturation_mode, &overflow);
        let mut default_state = FixState::default();
        state
            .unwrap_or(&mut default_state)
            .record_overflow(&overflow);
        Ok(Self { shape, value })
    }
    pub fn mult(
        &self,
        rhs: &Self,
        r_fmt: Option<Format>,
        rounding_mode: RoundingMode,
        saturation_mode: SaturationMode,
        state: Option<&mut FixState>,
    ) -> Result<Self> {
        let mid_fmt = Format::for_mult(self.fmt(), rhs.fmt())?;
        let (shape, mid) = self.binary_mid(
            rhs,
            mid_fmt,
            |a, b| a.mult(b, mid_fmt),
            |a, b| Ok(a.mult(b, mid_fmt)),
        )?;
        let r_fmt = r_fmt.unwrap_or(mid_fmt);
        Self::finish(shape, &mid, r_fmt, rounding_mode, saturation_mode, state)
    }
    pub fn neg(
        &self,
        r_fmt: Option<Format>,
        rounding_mode: RoundingMode,
        saturation_mode: SaturationMode,
        state: Option<&mut FixState>,
    ) -> Result<Self> {
        let mid = self.neg_mid()?;
        let r_fmt = r_fmt.unwrap_or_else(|| mid.fmt());
        let shape = self.shape.clone();
        Self::finish(shape, &mid, r_fmt, rounding_mode, saturation_mode, state)
    }
    pub fn abs(
        &self,
        r_fmt: Option<Format>,
        rounding_mode: RoundingMode,
        saturation_mode: SaturationMode,
        state: Option<&mut FixState>,
    ) -> Result<Self> {
        let mid_fmt = Format::for_abs(self.fmt())?;
        let (negated, _) =
            self.neg_mid()?
                .resize(mid_fmt, RoundingMode::Trunc, SaturationMode::Wrap)?;
        let (value, _) = self
            .value
            .resize(mid_fmt, RoundingMode::Trunc, SaturationMode::Wrap)?;
        let mid = FixValue::select(&self.is_negative(), &negated, &value);
        let r_fmt = r_fmt.unwrap_or(mid_fmt);
        let shape = self.shape.clone();
        Self::finish(shape, &mid, r_fmt, rounding_mode, saturation_mode, state)
    }
    /// multiplies by `2^shift` without losing bits, then resizes
    pub fn shift(
        &self,
        shift: i32,
        r_fmt: Option<Format>,
        rounding_mode: RoundingMode,
        saturation_mode: SaturationMode,
        state: Option<&mut FixState>,
    ) -> Result<Self> {
        let mid_fmt = Format::for_shift(self.fmt(), shift, shift)?;
        let mid = self.unary_mid(
            mid_fmt,
            |a| a.shift(&[shift], mid_fmt),
            |a| Ok(a.shift(mid_fmt)),
        )?;
        let r_fmt = r_fmt.unwrap_or(mid_fmt);
        let shape = self.shape.clone();
        Self::finish(shape, &mid, r_fmt, rounding_mode, saturation_mode, state)
    }
    /// like `shift`, with one shift amount per element
    pub fn shift_each(
        &self,
        shifts: &[i32],
        r_fmt: Option<Format>,
        rounding_mode: RoundingMode,
        saturation_mode: SaturationMode,
        state: Option<&mut FixState>,
    ) -> Result<Self> {
        let shape = if shifts.len() == self.len() || shifts.len() == 1 {
            self.shape.clone()
        } else if self.shape.is_empty() {
            vec![shifts.len()]
        } else {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                actual: shifts.len(),
            });
        };
        let min_shift = shifts.iter().copied().min().unwrap_or(0);
        let max_shift = shifts.iter().copied().max().unwrap_or(0);
        let mid_fmt = Format::for_shift(self.fmt(), min_shift, max_shift)?;
        let mid = self.unary_mid(
            mid_fmt,
            |a| a.shift(shifts, mid_fmt),
            |a| a.shift_each(shifts, mid_fmt),
        )?;
        let r_fmt = r_fmt.unwrap_or(mid_fmt);
        Self::finish(shape, &mid, r_fmt, rounding_mode, saturation_mode, state)
    }
    /// `(self + rhs) / 2`
    pub fn mean(
        &self,
        rhs: &Self,
        r_fmt: Option<Format>,
        rounding_mode: RoundingMode,
        saturation_mode: SaturationMode,
        state: Option<&mut FixState>,
    ) -> Result<Self> {
        let sum = self.add(
            rhs,
            None,
            RoundingMode::Trunc,
            SaturationMode::Wrap,
            None,
        )?;
        sum.shift(-1, r_fmt, rounding_mode, saturation_mode, state)
    }
    pub fn compare(&self, rhs: &Self, comparison: Comparison) -> Result<Vec<bool>> {
        self.broadcast_shape(rhs)?;
        let frac_bits = cmp::max(self.fmt().frac_bits(), rhs.fmt().frac_bits());
        let a = self.value.align(frac_bits)?;
        let b = rhs.value.align(frac_bits)?;
        Ok(match (&a, &b) {
            (FixValue::Narrow(a), FixValue::Narrow(b)) => zip_broadcast(a.data(), b.data())
                .map(|(a, b)| comparison.apply(a, b))
                .collect(),
            (a, b) => {
                let (a, b) = (a.to_wide(), b.to_wide());
                zip_broadcast(a.data(), b.data())
                    .map(|(a, b)| comparison.apply(a, b))
                    .collect()
            }
        })
    }
    pub fn cmp_eq(&self, rhs: &Self) -> Result<Vec<bool>> {
        self.compare(rhs, Comparison::Eq)
    }
    pub fn cmp_ne(&self, rhs: &Self) -> Result<Vec<bool>> {
        self.compare(rhs, Comparison::Ne)
    }
    pub fn cmp_lt(&self, rhs: &Self) -> Result<Vec<bool>> {
        self.compare(rhs, Comparison::Lt)
    }
    pub fn cmp_le(&self, rhs: &Self) -> Result<Vec<bool>> {
        self.compare(rhs, Comparison::Le)
    }
    pub fn cmp_gt(&self, rhs: &Self) -> Result<Vec<bool>> {
        self.compare(rhs, Comparison::Gt)
    }
    pub fn cmp_ge(&self, rhs: &Self) -> Result<Vec<bool>> {
        self.compare(rhs, Comparison::Ge)
    }
    /// resizes every array to the largest fraction bit count among them
    pub fn align_binary_points(values: &[FixArray]) -> Result<Vec<FixArray>> {
        let frac_bits = match values.iter().map(|v| v.fmt().frac_bits()).max() {
            Some(frac_bits) => frac_bits,
            None => return Ok(Vec::new()),
        };
        values
            .iter()
            .map(|v| {
                Ok(Self {
                    shape: v.shape.clone(),
                    value: v.value.align(frac_bits)?,
                })
            })
            .collect()
    }
    pub fn is_negative(&self) -> Vec<bool> {
        self.value.is_negative()
    }
    fn bit_position(&self, msb_index: usize) -> Result<usize> {
        let width = self.fmt().width() as usize;
        if msb_index >= width {
            return Err(Error::BitIndexOutOfRange {
                index: msb_index,
                fmt: self.fmt(),
            });
        }
        Ok(width - 1 - msb_index)
    }
    fn lsb_to_msb_index(&self, lsb_index: usize) -> Result<usize> {
        let width = self.fmt().width() as usize;
        if lsb_index >= width {
            return Err(Error::BitIndexOutOfRange {
                index: lsb_index,
                fmt: self.fmt(),
            });
        }
        Ok(width - 1 - lsb_index)
    }
    /// bit `index` of the two's complement pattern, counting from the most
    /// significant bit (the sign bit of signed formats)
    pub fn get_msb(&self, index: usize) -> Result<Vec<bool>> {
        let position = self.bit_position(index)?;
        let modulus = pow2(self.fmt().width());
        Ok(self
            .to_integer()
            .iter()
            .map(|v| (v.mod_floor(&modulus) >> position).is_odd())
            .collect())
    }
    pub fn get_lsb(&self, index: usize) -> Result<Vec<bool>> {
        self.get_msb(self.lsb_to_msb_index(index)?)
    }
    /// replaces bit `index`, counting from the most significant bit
    pub fn set_msb(&self, index: usize, bits: &[bool]) -> Result<Self> {
        let position = self.bit_position(index)?;
        if bits.len() != 1 && bits.len() != self.len() {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                actual: bits.len(),
            });
        }
        let fmt = self.fmt();
        let width = fmt.width();
        let modulus = pow2(width);
        let weight = pow2(position as i32);
        let sign_threshold = pow2(width - 1);
        let data = zip_broadcast(&self.to_integer(), bits)
            .map(|(v, &bit)| {
                let mut pattern = v.mod_floor(&modulus);
                if (&pattern >> position).is_odd() != bit {
                    if bit {
                        pattern += &weight;
                    } else {
                        pattern -= &weight;
                    }
                }
                if fmt.is_signed() && pattern >= sign_threshold {
                    pattern -= &modulus;
                }
                pattern
            })
            .collect();
        Self::from_wide_parts(self.shape.clone(), data, fmt)
    }
    pub fn set_lsb(&self, index: usize, bits: &[bool]) -> Result<Self> {
        self.set_msb(self.lsb_to_msb_index(index)?, bits)
    }
    /// rounds toward negative infinity to an integer
    pub fn int_part(&self) -> Result<Self> {
        let r_fmt = Format::for_round(self.fmt(), 0, RoundingMode::Trunc)?;
        self.round(r_fmt, RoundingMode::Trunc)
    }
    /// `self - floor(self)`, in the unsigned format `(0, min(I, 0), F)`
    pub fn frac_part(&self) -> Result<Self> {
        let fmt = self.fmt();
        let r_fmt = Format::new(0, cmp::min(fmt.int_bits(), 0), fmt.frac_bits())?.check_usable()?;
        let modulus = pow2(r_fmt.width());
        let data = self
            .to_integer()
            .iter()
            .map(|v| v.mod_floor(&modulus))
            .collect();
        Self::from_wide_parts(self.shape.clone(), data, r_fmt)
    }
}
