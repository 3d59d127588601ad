// SPDX-License-Identifier: LGPL-2.1-or-later
// See Notices.txt for copyright information

use bitflags::bitflags;
use thiserror::Error;

mod fix;
mod format;
mod narrow;
mod python;
mod wide;

#[cfg(test)]
mod test_cases;

pub use fix::Comparison;
pub use fix::FixArray;
pub use fix::FixValue;
pub use format::Format;
pub use narrow::NarrowFix;
pub use wide::WideFix;
pub use wide::WordOrder;

/// widest format that is stored in the `f64` representation.
///
/// an `f64` holds every integer in `[-2^53, 2^53]` exactly; one bit is kept in
/// reserve so signed and unsigned formats share one limit.
pub const NARROW_MAX_WIDTH: i32 = 53;

/// largest `|I|` or `|F|` that is stored in the `f64` representation.
///
/// keeps every value and every rounding/wrapping offset inside the normal
/// exponent range of `f64`.
pub const NARROW_MAX_EXPONENT: i32 = 1000;

/// largest `|I|` or `|F|` a [`Format`] accepts.
pub const MAX_FORMAT_BITS: i32 = 1 << 24;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u32)]
pub enum RoundingMode {
    /// round toward negative infinity
    Trunc = 0,
    /// round to nearest, ties toward positive infinity
    NonSymPos = 1,
    /// round to nearest, ties toward negative infinity
    NonSymNeg = 2,
    /// round to nearest, ties away from zero
    SymInf = 3,
    /// round to nearest, ties toward zero
    SymZero = 4,
    /// round to nearest, ties to even
    ConvEven = 5,
    /// round to nearest, ties to odd
    ConvOdd = 6,
}

impl Default for RoundingMode {
    fn default() -> Self {
        RoundingMode::Trunc
    }
}

impl RoundingMode {
    pub const VALUES: [RoundingMode; 7] = [
        RoundingMode::Trunc,
        RoundingMode::NonSymPos,
        RoundingMode::NonSymNeg,
        RoundingMode::SymInf,
        RoundingMode::SymZero,
        RoundingMode::ConvEven,
        RoundingMode::ConvOdd,
    ];
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u32)]
pub enum SaturationMode {
    /// two's complement wrap-around
    Wrap = 0,
    /// two's complement wrap-around, reporting `StatusFlags::OVERFLOW`
    WrapWarn = 1,
    /// clamp to the nearest representable value
    Sat = 2,
    /// clamp to the nearest representable value, reporting `StatusFlags::OVERFLOW`
    SatWarn = 3,
}

impl Default for SaturationMode {
    fn default() -> Self {
        SaturationMode::Wrap
    }
}

impl SaturationMode {
    pub const VALUES: [SaturationMode; 4] = [
        SaturationMode::Wrap,
        SaturationMode::WrapWarn,
        SaturationMode::Sat,
        SaturationMode::SatWarn,
    ];
    #[inline]
    pub const fn is_warn(self) -> bool {
        match self {
            SaturationMode::WrapWarn | SaturationMode::SatWarn => true,
            SaturationMode::Wrap | SaturationMode::Sat => false,
        }
    }
    #[inline]
    pub const fn is_clamp(self) -> bool {
        match self {
            SaturationMode::Sat | SaturationMode::SatWarn => true,
            SaturationMode::Wrap | SaturationMode::WrapWarn => false,
        }
    }
}

bitflags! {
    pub struct StatusFlags: u32 {
        const OVERFLOW = 0b01;
        const PRECISION_LOSS = 0b10;
    }
}

impl Default for StatusFlags {
    fn default() -> Self {
        StatusFlags::empty()
    }
}

/// side channel for the non-fatal signals raised by an operation.
///
/// `status_flags` is sticky across operations, `element_flags` holds one entry
/// per element of the most recent operation's result.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct FixState {
    pub status_flags: StatusFlags,
    pub element_flags: Vec<StatusFlags>,
}

impl FixState {
    pub fn new() -> Self {
        Self::default()
    }
    pub(crate) fn record(&mut self, element_flags: Vec<StatusFlags>) {
        for &flags in &element_flags {
            self.status_flags |= flags;
        }
        self.element_flags = element_flags;
    }
    pub(crate) fn record_overflow(&mut self, overflow: &[bool]) {
        self.record(
            overflow
                .iter()
                .map(|&overflow| {
                    if overflow {
                        StatusFlags::OVERFLOW
                    } else {
                        StatusFlags::empty()
                    }
                })
                .collect(),
        );
    }
    pub fn overflow_count(&self) -> usize {
        self.element_flags
            .iter()
            .filter(|flags| flags.contains(StatusFlags::OVERFLOW))
            .count()
    }
}

#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum Error {
    #[error("sign bit count must be 0 or 1, got {0}")]
    InvalidSignBits(i32),
    #[error("format ({sign_bits}, {int_bits}, {frac_bits}) exceeds the bit count limit")]
    FormatTooLarge {
        sign_bits: i32,
        int_bits: i32,
        frac_bits: i32,
    },
    #[error("format width cannot be negative: {0}")]
    NegativeWidth(Format),
    #[error("format {0} must be at least one bit wide")]
    NonPositiveWidth(Format),
    #[error("invalid rounding result format {actual}, expected {expected}")]
    InvalidRoundFormat { expected: Format, actual: Format },
    #[error("saturation cannot change the number of fraction bits: {from} -> {to}")]
    FracBitsMismatch { from: Format, to: Format },
    #[error("min shift ({min}) must be <= max shift ({max})")]
    InvalidShiftRange { min: i32, max: i32 },
    #[error("format {0} is too wide for the narrow representation")]
    NotNarrow(Format),
    #[error("operand shapes {lhs:?} and {rhs:?} cannot be combined")]
    ShapeMismatch { lhs: Vec<usize>, rhs: Vec<usize> },
    #[error("expected {expected} elements, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("element {index} is out of range for format {fmt}")]
    OutOfRange { index: usize, fmt: Format },
    #[error("element {index} is not a finite number")]
    NotFinite { index: usize },
    #[error("bit index {index} is out of range for format {fmt}")]
    BitIndexOutOfRange { index: usize, fmt: Format },
    #[error("word count {actual} is not a multiple of {per_element} words per element")]
    WordCountMismatch { per_element: usize, actual: usize },
    #[error("invalid format text {0:?}")]
    ParseFormat(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// pairs up elements, broadcasting a single-element side.
pub(crate) fn zip_broadcast<'a, A, B>(
    a: &'a [A],
    b: &'a [B],
) -> impl Iterator<Item = (&'a A, &'a B)> + 'a {
    let len = if a.len() == 1 { b.len() } else { a.len() };
    (0..len).map(move |i| {
        (
            &a[if a.len() == 1 { 0 } else { i }],
            &b[if b.len() == 1 { 0 } else { i }],
        )
    })
}


macro_rules! doctest {
    ($x:expr) => {
        #[doc = $x]
        extern "C" {}
    };
}

doctest!(include_str!("../README.md"));
