//! Integer arithmetic, bitwise operations and comparison.
//!
//! All arithmetic is checked; overflow is a reported error, never a wrap.
//! Mixed Integer/Double arithmetic promotes to Double, but comparison does
//! not: `1 == 1.0` is a type error while `1 + 1.0` is fine.

use std::cmp::Ordering;

use crate::runtime::capability::{Arithmetic, Bitwise, Comparable};
use crate::runtime::{Primitive, RuntimeError};

fn incompatible(operation: &'static str, other: &Primitive) -> RuntimeError {
    RuntimeError::IncompatibleOperands {
        operation,
        left: "integer",
        right: other.type_name(),
    }
}

fn checked(value: Option<i64>, operation: &'static str) -> Result<Primitive, RuntimeError> {
    value
        .map(Primitive::Integer)
        .ok_or(RuntimeError::IntegerOverflow { operation })
}

impl Arithmetic for i64 {
    fn add(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match other {
            Primitive::Integer(rhs) => checked(self.checked_add(*rhs), "add"),
            Primitive::Double(rhs) => Ok(Primitive::Double(*self as f64 + rhs)),
            Primitive::Str(rhs) => Ok(Primitive::string(format!("{self}{rhs}"))),
            _ => Err(incompatible("add", other)),
        }
    }

    fn sub(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match other {
            Primitive::Integer(rhs) => checked(self.checked_sub(*rhs), "sub"),
            Primitive::Double(rhs) => Ok(Primitive::Double(*self as f64 - rhs)),
            _ => Err(incompatible("sub", other)),
        }
    }

    fn mul(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match other {
            Primitive::Integer(rhs) => checked(self.checked_mul(*rhs), "mul"),
            Primitive::Double(rhs) => Ok(Primitive::Double(*self as f64 * rhs)),
            _ => Err(incompatible("mul", other)),
        }
    }

    fn div(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match other {
            Primitive::Integer(0) => Err(RuntimeError::DivisionByZero),
            Primitive::Integer(rhs) => checked(self.checked_div(*rhs), "div"),
            Primitive::Double(rhs) if *rhs == 0.0 => Err(RuntimeError::DivisionByZero),
            Primitive::Double(rhs) => Ok(Primitive::Double(*self as f64 / rhs)),
            _ => Err(incompatible("div", other)),
        }
    }

    fn rem(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match other {
            Primitive::Integer(0) => Err(RuntimeError::DivisionByZero),
            Primitive::Integer(rhs) => checked(self.checked_rem(*rhs), "mod"),
            Primitive::Double(rhs) if *rhs == 0.0 => Err(RuntimeError::DivisionByZero),
            Primitive::Double(rhs) => Ok(Primitive::Double(*self as f64 % rhs)),
            _ => Err(incompatible("mod", other)),
        }
    }

    fn pow(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match other {
            // Negative integer exponents would need a fractional result;
            // the doubles path is the supported spelling.
            Primitive::Integer(rhs) if *rhs < 0 => Err(RuntimeError::IncompatibleOperands {
                operation: "pow",
                left: "integer",
                right: "negative exponent",
            }),
            Primitive::Integer(rhs) => {
                let exponent = u32::try_from(*rhs)
                    .map_err(|_| RuntimeError::IntegerOverflow { operation: "pow" })?;
                checked(self.checked_pow(exponent), "pow")
            }
            Primitive::Double(rhs) => Ok(Primitive::Double((*self as f64).powf(*rhs))),
            _ => Err(incompatible("pow", other)),
        }
    }

    fn negate(&self) -> Result<Primitive, RuntimeError> {
        checked(self.checked_neg(), "negate")
    }
}

impl Bitwise for i64 {
    fn bitand(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match other {
            Primitive::Integer(rhs) => Ok(Primitive::Integer(self & rhs)),
            _ => Err(incompatible("bitwise and", other)),
        }
    }

    fn bitor(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match other {
            Primitive::Integer(rhs) => Ok(Primitive::Integer(self | rhs)),
            _ => Err(incompatible("bitwise or", other)),
        }
    }

    fn bitxor(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match other {
            Primitive::Integer(rhs) => Ok(Primitive::Integer(self ^ rhs)),
            _ => Err(incompatible("bitwise xor", other)),
        }
    }

    fn lshift(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        let amount = shift_amount("left shift", other)?;
        Ok(Primitive::Integer(self << amount))
    }

    fn rshift(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        let amount = shift_amount("right shift", other)?;
        Ok(Primitive::Integer(self >> amount))
    }

    fn bitnot(&self) -> Result<Primitive, RuntimeError> {
        Ok(Primitive::Integer(!self))
    }
}

fn shift_amount(operation: &'static str, other: &Primitive) -> Result<u32, RuntimeError> {
    let Primitive::Integer(amount) = other else {
        return Err(incompatible(operation, other));
    };
    if !(0..64).contains(amount) {
        return Err(RuntimeError::ShiftOutOfRange { amount: *amount });
    }
    Ok(*amount as u32)
}

impl Comparable for i64 {
    fn equals(&self, other: &Primitive) -> Result<bool, RuntimeError> {
        match other {
            Primitive::Integer(rhs) => Ok(self == rhs),
            _ => Err(incompatible("compare", other)),
        }
    }

    fn compare(&self, other: &Primitive) -> Result<Ordering, RuntimeError> {
        match other {
            Primitive::Integer(rhs) => Ok(self.cmp(rhs)),
            _ => Err(incompatible("compare", other)),
        }
    }
}
