//! Double arithmetic and comparison. Integer operands promote; comparison
//! stays variant-exact like everywhere else.

use std::cmp::Ordering;

use crate::runtime::capability::{Arithmetic, Comparable};
use crate::runtime::{Primitive, RuntimeError};

fn incompatible(operation: &'static str, other: &Primitive) -> RuntimeError {
    RuntimeError::IncompatibleOperands {
        operation,
        left: "double",
        right: other.type_name(),
    }
}

fn numeric(operation: &'static str, other: &Primitive) -> Result<f64, RuntimeError> {
    match other {
        Primitive::Integer(rhs) => Ok(*rhs as f64),
        Primitive::Double(rhs) => Ok(*rhs),
        _ => Err(incompatible(operation, other)),
    }
}

impl Arithmetic for f64 {
    fn add(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        if let Primitive::Str(rhs) = other {
            return Ok(Primitive::string(format!("{self}{rhs}")));
        }
        Ok(Primitive::Double(self + numeric("add", other)?))
    }

    fn sub(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        Ok(Primitive::Double(self - numeric("sub", other)?))
    }

    fn mul(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        Ok(Primitive::Double(self * numeric("mul", other)?))
    }

    fn div(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        let rhs = numeric("div", other)?;
        if rhs == 0.0 {
            return Err(RuntimeError::DivisionByZero);
        }
        Ok(Primitive::Double(self / rhs))
    }

    fn rem(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        let rhs = numeric("mod", other)?;
        if rhs == 0.0 {
            return Err(RuntimeError::DivisionByZero);
        }
        Ok(Primitive::Double(self % rhs))
    }

    fn pow(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        Ok(Primitive::Double(self.powf(numeric("pow", other)?)))
    }

    fn negate(&self) -> Result<Primitive, RuntimeError> {
        Ok(Primitive::Double(-self))
    }
}

impl Comparable for f64 {
    fn equals(&self, other: &Primitive) -> Result<bool, RuntimeError> {
        match other {
            Primitive::Double(rhs) => Ok(self == rhs),
            _ => Err(incompatible("compare", other)),
        }
    }

    fn compare(&self, other: &Primitive) -> Result<Ordering, RuntimeError> {
        let Primitive::Double(rhs) = other else {
            return Err(incompatible("compare", other));
        };
        self.partial_cmp(rhs).ok_or(RuntimeError::IncompatibleOperands {
            operation: "compare",
            left: "double",
            right: "nan",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_with_string_on_add() {
        let joined =
            Arithmetic::add(&1.5f64, &Primitive::string("s")).expect("double + string works");
        assert_eq!(joined, Primitive::string("1.5s"));
    }

    #[test]
    fn zero_divisor_is_division_by_zero() {
        let error = Arithmetic::div(&1.0f64, &Primitive::Integer(0)).expect_err("divide by zero");
        assert_eq!(error, RuntimeError::DivisionByZero);
    }

    #[test]
    fn comparison_rejects_integer_operand() {
        let error = Comparable::equals(&1.0f64, &Primitive::Integer(1))
            .expect_err("mixed comparison must fail");
        assert!(matches!(error, RuntimeError::IncompatibleOperands { .. }));
    }
}
