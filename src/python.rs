// SPDX-License-Identifier: LGPL-2.1-or-later
// See Notices.txt for copyright information
#![cfg(feature = "python")]

use crate::Error;
use crate::FixArray;
use crate::Format;
use crate::RoundingMode;
use crate::SaturationMode;
use crate::WordOrder;
use num_bigint::BigInt;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

impl From<Error> for PyErr {
    fn from(err: Error) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

macro_rules! py_enum {
    ($py_name:literal, $py_ty:ident => $ty:ident { $($variant:ident,)+ }) => {
        #[pyclass(name = $py_name, module = "simple_fixed_point", eq, eq_int)]
        #[derive(Copy, Clone, PartialEq, Debug)]
        enum $py_ty {
            $($variant,)+
        }

        impl From<$py_ty> for $ty {
            fn from(value: $py_ty) -> Self {
                match value {
                    $($py_ty::$variant => $ty::$variant,)+
                }
            }
        }

        impl From<$ty> for $py_ty {
            fn from(value: $ty) -> Self {
                match value {
                    $($ty::$variant => $py_ty::$variant,)+
                }
            }
        }
    };
}

py_enum!("RoundingMode", PyRoundingMode => RoundingMode {
    Trunc,
    NonSymPos,
    NonSymNeg,
    SymInf,
    SymZero,
    ConvEven,
    ConvOdd,
});

py_enum!("SaturationMode", PySaturationMode => SaturationMode {
    Wrap,
    WrapWarn,
    Sat,
    SatWarn,
});

#[pyclass(name = "Format", module = "simple_fixed_point", frozen, eq, hash)]
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
struct PyFormat {
    value: Format,
}

impl From<Format> for PyFormat {
    fn from(value: Format) -> Self {
        Self { value }
    }
}

#[pymethods]
impl PyFormat {
    #[new]
    fn __new__(sign_bits: i32, int_bits: i32, frac_bits: i32) -> PyResult<Self> {
        Ok(Format::new(sign_bits, int_bits, frac_bits)?.into())
    }
    #[getter(S)]
    fn sign_bits(&self) -> i32 {
        self.value.sign_bits()
    }
    #[getter(I)]
    fn int_bits(&self) -> i32 {
        self.value.int_bits()
    }
    #[getter(F)]
    fn frac_bits(&self) -> i32 {
        self.value.frac_bits()
    }
    #[getter]
    fn width(&self) -> i32 {
        self.value.width()
    }
    #[getter]
    fn is_wide(&self) -> bool {
        self.value.is_wide()
    }
    #[staticmethod]
    fn for_add(a: PyFormat, b: PyFormat) -> PyResult<PyFormat> {
        Ok(Format::for_add(a.value, b.value)?.into())
    }
    #[staticmethod]
    fn for_sub(a: PyFormat, b: PyFormat) -> PyResult<PyFormat> {
        Ok(Format::for_sub(a.value, b.value)?.into())
    }
    #[staticmethod]
    fn for_addsub(a: PyFormat, b: PyFormat) -> PyResult<PyFormat> {
        Ok(Format::for_addsub(a.value, b.value)?.into())
    }
    #[staticmethod]
    fn for_mult(a: PyFormat, b: PyFormat) -> PyResult<PyFormat> {
        Ok(Format::for_mult(a.value, b.value)?.into())
    }
    #[staticmethod]
    fn for_neg(a: PyFormat) -> PyResult<PyFormat> {
        Ok(Format::for_neg(a.value)?.into())
    }
    #[staticmethod]
    fn for_abs(a: PyFormat) -> PyResult<PyFormat> {
        Ok(Format::for_abs(a.value)?.into())
    }
    #[staticmethod]
    #[pyo3(signature = (a, min_shift, max_shift = None))]
    fn for_shift(a: PyFormat, min_shift: i32, max_shift: Option<i32>) -> PyResult<PyFormat> {
        let max_shift = max_shift.unwrap_or(min_shift);
        Ok(Format::for_shift(a.value, min_shift, max_shift)?.into())
    }
    #[staticmethod]
    #[pyo3(signature = (a, frac_bits, rounding_mode = PyRoundingMode::Trunc))]
    fn for_round(a: PyFormat, frac_bits: i32, rounding_mode: PyRoundingMode) -> PyResult<PyFormat> {
        Ok(Format::for_round(a.value, frac_bits, rounding_mode.into())?.into())
    }
    #[staticmethod]
    fn union(a: PyFormat, b: PyFormat) -> PyFormat {
        Format::union(a.value, b.value).into()
    }
    fn __str__(&self) -> String {
        self.value.to_string()
    }
    fn __repr__(&self) -> String {
        format!("{:?}", self.value)
    }
}

fn array(values: Vec<BigInt>, fmt: PyFormat) -> PyResult<FixArray> {
    Ok(FixArray::from_integer(&values, fmt.value)?)
}

fn word_order(msb_first: bool) -> WordOrder {
    if msb_first {
        WordOrder::MostSignificantFirst
    } else {
        WordOrder::LeastSignificantFirst
    }
}

#[pyfunction]
#[pyo3(signature = (values, fmt, saturation_mode = PySaturationMode::Sat))]
fn fix_from_real(
    values: Vec<f64>,
    fmt: PyFormat,
    saturation_mode: PySaturationMode,
) -> PyResult<Vec<BigInt>> {
    Ok(FixArray::from_real(&values, fmt.value, saturation_mode.into(), None)?.to_integer())
}

#[pyfunction]
fn fix_to_real(values: Vec<BigInt>, fmt: PyFormat) -> PyResult<Vec<f64>> {
    Ok(array(values, fmt)?.to_real(None))
}

#[pyfunction]
#[pyo3(signature = (values, fmt, r_fmt, rounding_mode = PyRoundingMode::Trunc, saturation_mode = PySaturationMode::Wrap))]
fn fix_resize(
    values: Vec<BigInt>,
    fmt: PyFormat,
    r_fmt: PyFormat,
    rounding_mode: PyRoundingMode,
    saturation_mode: PySaturationMode,
) -> PyResult<Vec<BigInt>> {
    Ok(array(values, fmt)?
        .resize(r_fmt.value, rounding_mode.into(), saturation_mode.into(), None)?
        .to_integer())
}

macro_rules! py_binary_op {
    ($name:ident, $op:ident) => {
        #[pyfunction]
        #[pyo3(signature = (a, a_fmt, b, b_fmt, r_fmt = None, rounding_mode = PyRoundingMode::Trunc, saturation_mode = PySaturationMode::Wrap))]
        fn $name(
            a: Vec<BigInt>,
            a_fmt: PyFormat,
            b: Vec<BigInt>,
            b_fmt: PyFormat,
            r_fmt: Option<PyFormat>,
            rounding_mode: PyRoundingMode,
            saturation_mode: PySaturationMode,
        ) -> PyResult<Vec<BigInt>> {
            let a = array(a, a_fmt)?;
            let b = array(b, b_fmt)?;
            Ok(a.$op(
                &b,
                r_fmt.map(|r_fmt| r_fmt.value),
                rounding_mode.into(),
                saturation_mode.into(),
                None,
            )?
            .to_integer())
        }
    };
}

py_binary_op!(fix_add, add);
py_binary_op!(fix_sub, sub);
py_binary_op!(fix_mult, mult);

macro_rules! py_unary_op {
    ($name:ident, $op:ident) => {
        #[pyfunction]
        #[pyo3(signature = (a, a_fmt, r_fmt = None, rounding_mode = PyRoundingMode::Trunc, saturation_mode = PySaturationMode::Wrap))]
        fn $name(
            a: Vec<BigInt>,
            a_fmt: PyFormat,
            r_fmt: Option<PyFormat>,
            rounding_mode: PyRoundingMode,
            saturation_mode: PySaturationMode,
        ) -> PyResult<Vec<BigInt>> {
            Ok(array(a, a_fmt)?
                .$op(
                    r_fmt.map(|r_fmt| r_fmt.value),
                    rounding_mode.into(),
                    saturation_mode.into(),
                    None,
                )?
                .to_integer())
        }
    };
}

py_unary_op!(fix_neg, neg);
py_unary_op!(fix_abs, abs);

#[pyfunction]
#[pyo3(signature = (a, a_fmt, shift, r_fmt = None, rounding_mode = PyRoundingMode::Trunc, saturation_mode = PySaturationMode::Wrap))]
fn fix_shift(
    a: Vec<BigInt>,
    a_fmt: PyFormat,
    shift: i32,
    r_fmt: Option<PyFormat>,
    rounding_mode: PyRoundingMode,
    saturation_mode: PySaturationMode,
) -> PyResult<Vec<BigInt>> {
    Ok(array(a, a_fmt)?
        .shift(
            shift,
            r_fmt.map(|r_fmt| r_fmt.value),
            rounding_mode.into(),
            saturation_mode.into(),
            None,
        )?
        .to_integer())
}

#[pyfunction]
#[pyo3(signature = (values, fmt, msb_first = false))]
fn fix_to_words(values: Vec<BigInt>, fmt: PyFormat, msb_first: bool) -> PyResult<Vec<u64>> {
    Ok(array(values, fmt)?.to_words(word_order(msb_first)))
}

#[pyfunction]
#[pyo3(signature = (words, fmt, msb_first = false))]
fn fix_from_words(words: Vec<u64>, fmt: PyFormat, msb_first: bool) -> PyResult<Vec<BigInt>> {
    Ok(FixArray::from_words(&words, fmt.value, word_order(msb_first))?.to_integer())
}

#[pymodule]
fn simple_fixed_point(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyFormat>()?;
    m.add_class::<PyRoundingMode>()?;
    m.add_class::<PySaturationMode>()?;
    m.add_function(wrap_pyfunction!(fix_from_real, m)?)?;
    m.add_function(wrap_pyfunction!(fix_to_real, m)?)?;
    m.add_function(wrap_pyfunction!(fix_resize, m)?)?;
    m.add_function(wrap_pyfunction!(fix_add, m)?)?;
    m.add_function(wrap_pyfunction!(fix_sub, m)?)?;
    m.add_function(wrap_pyfunction!(fix_mult, m)?)?;
    m.add_function(wrap_pyfunction!(fix_neg, m)?)?;
    m.add_function(wrap_pyfunction!(fix_abs, m)?)?;
    m.add_function(wrap_pyfunction!(fix_shift, m)?)?;
    m.add_function(wrap_pyfunction!(fix_to_words, m)?)?;
    m.add_function(wrap_pyfunction!(fix_from_words, m)?)?;
    Ok(())
}
