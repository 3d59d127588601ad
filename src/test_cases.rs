// SPDX-License-Identifier: LGPL-2.1-or-later
// See Notices.txt for copyright information
use super::*;
use num_bigint::BigInt;
use std::any::Any;
use std::fmt;

trait TestCaseArgument: Any {
    fn parse_into(&mut self, text: &str) -> Result<(), String>;
    fn same(&self, other: &dyn TestCaseArgument) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn debug(&self) -> String;
}

fn test_case_argument_same<T: TestCaseArgument + Sized, SameFn: FnOnce(&T, &T) -> bool>(
    self_: &T,
    other: &dyn TestCaseArgument,
    same_fn: SameFn,
) -> bool {
    if let Some(other) = other.as_any().downcast_ref::<T>() {
        same_fn(self_, other)
    } else {
        false
    }
}

macro_rules! impl_test_case_argument_for_from_str {
    ($t:ty) => {
        impl TestCaseArgument for $t {
            fn parse_into(&mut self, text: &str) -> Result<(), String> {
                *self = text.parse::<$t>().map_err(|err| err.to_string())?;
                Ok(())
            }
            fn same(&self, other: &dyn TestCaseArgument) -> bool {
                test_case_argument_same(self, other, PartialEq::eq)
            }
            fn debug(&self) -> String {
                format!("{}", self)
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

impl_test_case_argument_for_from_str!(i32);
impl_test_case_argument_for_from_str!(f64);
impl_test_case_argument_for_from_str!(BigInt);
impl_test_case_argument_for_from_str!(Format);

// overwritten by `parse_into` before use
impl Default for Format {
    fn default() -> Self {
        Format::new_unchecked(1, 0, 0)
    }
}

macro_rules! impl_test_case_argument_for_enum {
    (enum $type:ident { $($name:ident,)* }) => {
        impl TestCaseArgument for $type {
            fn parse_into(&mut self, text: &str) -> Result<(), String> {
                *self = match text {
                    $(stringify!($name) => $type::$name,)*
                    _ => return Err(concat!("invalid ", stringify!($type)).into()),
                };
                Ok(())
            }
            fn same(&self, other: &dyn TestCaseArgument) -> bool {
                test_case_argument_same(self, other, PartialEq::eq)
            }
            fn debug(&self) -> String {
                format!("{:?}", self)
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

impl_test_case_argument_for_enum! {
    enum RoundingMode {
        Trunc,
        NonSymPos,
        NonSymNeg,
        SymInf,
        SymZero,
        ConvEven,
        ConvOdd,
    }
}

impl_test_case_argument_for_enum! {
    enum SaturationMode {
        Wrap,
        WrapWarn,
        Sat,
        SatWarn,
    }
}

impl TestCaseArgument for StatusFlags {
    fn parse_into(&mut self, text: &str) -> Result<(), String> {
        if text == "(empty)" {
            *self = StatusFlags::empty();
            return Ok(());
        }
        let mut retval = StatusFlags::empty();
        for word in text.split('|') {
            retval |= match word {
                "OVERFLOW" => StatusFlags::OVERFLOW,
                "PRECISION_LOSS" => StatusFlags::PRECISION_LOSS,
                _ => return Err("invalid status flags".into()),
            };
        }
        *self = retval;
        Ok(())
    }
    fn same(&self, other: &dyn TestCaseArgument) -> bool {
        test_case_argument_same(self, other, PartialEq::eq)
    }
    fn debug(&self) -> String {
        format!("{:?}", self)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct TestCaseInput<'a> {
    name: &'static str,
    argument: &'a mut dyn TestCaseArgument,
}

struct TestCaseOutput<'a> {
    name: &'static str,
    expected_argument: &'a mut dyn TestCaseArgument,
    output_argument: &'a dyn TestCaseArgument,
}

struct TestCaseIO<'a> {
    inputs: Vec<TestCaseInput<'a>>,
    outputs: Vec<TestCaseOutput<'a>>,
}

#[derive(Copy, Clone)]
struct FileLocation<'a> {
    line: usize,
    file_name: &'a str,
}

impl fmt::Display for FileLocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.file_name, self.line)
    }
}

trait TestCase {
    fn io(&mut self) -> TestCaseIO<'_>;
    fn calculate(&mut self, location: FileLocation);
    fn parse_and_run(&mut self, test_case: &str, location: FileLocation) {
        let mut arguments_text = test_case.split(' ');
        let io = self.io();
        for argument in io.inputs {
            let argument_text = arguments_text
                .next()
                .unwrap_or_else(|| panic!("{}: missing argument: {}", location, argument.name));
            if let Err(err) = argument.argument.parse_into(argument_text) {
                panic!("{}: invalid value for {}: {}", location, argument.name, err);
            }
        }
        for argument in io.outputs {
            let argument_text = arguments_text
                .next()
                .unwrap_or_else(|| panic!("{}: missing argument: {}", location, argument.name));
            if let Err(err) = argument.expected_argument.parse_into(argument_text) {
                panic!("{}: invalid value for {}: {}", location, argument.name, err);
            }
        }
        if arguments_text.next().is_some() {
            panic!("{}: too many arguments", location);
        }
        println!("{}: {}", location, test_case);
        self.calculate(location);
        let mut failed = false;
        for argument in self.io().outputs {
            if !argument.expected_argument.same(argument.output_argument) {
                println!(
                    "{}: {}: expected {}, got {}",
                    location,
                    argument.name,
                    argument.expected_argument.debug(),
                    argument.output_argument.debug()
                );
                failed = true;
            }
        }
        if failed {
            panic!("{}: test case failed: {}", location, test_case);
        }
    }
}

fn execute_test_cases<T: TestCase + Default>(test_cases: &str, file_name: &str) {
    for (i, test_case) in test_cases.lines().enumerate() {
        if test_case.starts_with('#') || test_case.is_empty() {
            continue;
        }
        T::default().parse_and_run(
            test_case,
            FileLocation {
                file_name,
                line: i + 1,
            },
        );
    }
}

macro_rules! test_case {
    (
        #[test_case_file_name = $test_case_file_name:expr]
        $(#[$meta:meta])*
        fn $test_name:ident($($input:ident: $input_type:ty,)+ $(#[output] $output:ident: $output_type:ty,)+) {
            $($body:tt)*
        }
    ) => {
        test_case!{
            #[test_case_file_path = concat!(env!("CARGO_MANIFEST_DIR"), "/test_data/", $test_case_file_name)]
            $(#[$meta])*
            fn $test_name($($input: $input_type,)+ $(#[output] $output: $output_type,)+) {
                $($body)*
            }
        }
    };
    (
        #[test_case_file_path = $test_case_file_path:expr]
        $(#[$meta:meta])*
        fn $test_name:ident($($input:ident: $input_type:ty,)+ $(#[output] $output:ident: $output_type:ty,)+) {
            $($body:tt)*
        }
    ) => {
        #[test]
        fn $test_name() {
            #[derive(Default)]
            struct TestCaseImpl {
                $($input: $input_type,)+
                $($output: ($output_type, $output_type),)+
            }

            impl TestCase for TestCaseImpl {
                fn io(&mut self) -> TestCaseIO {
                    let inputs = vec![
                        $(TestCaseInput {
                            name: stringify!($input),
                            argument: &mut self.$input,
                        }),+
                    ];
                    let outputs = vec![
                        $(TestCaseOutput {
                            name: stringify!($output),
                            expected_argument: &mut self.$output.0,
                            output_argument: &mut self.$output.1,
                        }),+
                    ];
                    TestCaseIO {
                        inputs,
                        outputs,
                    }
                }
                fn calculate(&mut self, location: FileLocation) {
                    $(#[$meta])*
                    fn $test_name($($input: $input_type,)+ $($output: &mut $output_type,)+ location: FileLocation) {
                        let _ = &location;
                        $($body)*
                    }
                    $test_name($(self.$input.clone(),)+ $(&mut self.$output.1,)+ location);
                }
            }
            execute_test_cases::<TestCaseImpl>(include_str!($test_case_file_path), $test_case_file_path);
        }
    };
}

fn scalar(value: BigInt, fmt: Format) -> FixArray {
    FixArray::from_integer(&[value], fmt).unwrap()
}

fn first(value: Result<FixArray>) -> BigInt {
    value.unwrap().to_integer().swap_remove(0)
}

test_case! {
    #[test_case_file_name = "format.txt"]
    fn test_format_derivations(
        a: Format,
        b: Format,
        #[output] add: Format,
        #[output] sub: Format,
        #[output] addsub: Format,
        #[output] mult: Format,
        #[output] neg_a: Format,
        #[output] abs_a: Format,
    ) {
        *add = Format::for_add(a, b).unwrap();
        *sub = Format::for_sub(a, b).unwrap();
        *addsub = Format::for_addsub(a, b).unwrap();
        *mult = Format::for_mult(a, b).unwrap();
        *neg_a = Format::for_neg(a).unwrap();
        *abs_a = Format::for_abs(a).unwrap();
    }
}

test_case! {
    #[test_case_file_name = "resize.txt"]
    fn test_resize(
        value: BigInt,
        fmt: Format,
        r_fmt: Format,
        rounding_mode: RoundingMode,
        saturation_mode: SaturationMode,
        #[output] result: BigInt,
        #[output] status_flags: StatusFlags,
    ) {
        let mut state = FixState::new();
        let value = scalar(value, fmt);
        *result = first(
            value.resize(r_fmt, rounding_mode, saturation_mode, Some(&mut state)),
        );
        *status_flags = state.status_flags;
    }
}

test_case! {
    #[test_case_file_name = "from_real.txt"]
    fn test_from_real(
        value: f64,
        fmt: Format,
        saturation_mode: SaturationMode,
        #[output] result: BigInt,
        #[output] status_flags: StatusFlags,
    ) {
        let mut state = FixState::new();
        *result = first(
            FixArray::from_real(&[value], fmt, saturation_mode, Some(&mut state)),
        );
        *status_flags = state.status_flags;
    }
}

macro_rules! binary_test_case {
    ($test_name:ident, $file_name:literal, $op:ident) => {
        test_case! {
            #[test_case_file_name = $file_name]
            #[allow(clippy::too_many_arguments)]
            fn $test_name(
                lhs: BigInt,
                lhs_fmt: Format,
                rhs: BigInt,
                rhs_fmt: Format,
                r_fmt: Format,
                rounding_mode: RoundingMode,
                saturation_mode: SaturationMode,
                #[output] result: BigInt,
                #[output] status_flags: StatusFlags,
            ) {
                let mut state = FixState::new();
                let lhs = scalar(lhs, lhs_fmt);
                let rhs = scalar(rhs, rhs_fmt);
                *result = first(
                    lhs.$op(&rhs, Some(r_fmt), rounding_mode, saturation_mode, Some(&mut state)),
                );
                *status_flags = state.status_flags;
            }
        }
    };
}

binary_test_case!(test_add, "add.txt", add);
binary_test_case!(test_sub, "sub.txt", sub);
binary_test_case!(test_mult, "mult.txt", mult);

test_case! {
    #[test_case_file_name = "neg.txt"]
    fn test_neg(
        value: BigInt,
        fmt: Format,
        r_fmt: Format,
        rounding_mode: RoundingMode,
        saturation_mode: SaturationMode,
        #[output] result: BigInt,
        #[output] status_flags: StatusFlags,
    ) {
        let mut state = FixState::new();
        let value = scalar(value, fmt);
        *result = first(
            value.neg(Some(r_fmt), rounding_mode, saturation_mode, Some(&mut state)),
        );
        *status_flags = state.status_flags;
    }
}

test_case! {
    #[test_case_file_name = "shift.txt"]
    #[allow(clippy::too_many_arguments)]
    fn test_shift(
        value: BigInt,
        fmt: Format,
        shift: i32,
        r_fmt: Format,
        rounding_mode: RoundingMode,
        saturation_mode: SaturationMode,
        #[output] result: BigInt,
        #[output] status_flags: StatusFlags,
    ) {
        let mut state = FixState::new();
        let value = scalar(value, fmt);
        *result = first(
            value.shift(shift, Some(r_fmt), rounding_mode, saturation_mode, Some(&mut state)),
        );
        *status_flags = state.status_flags;
    }
}
