//! Booleans compare for equality only; ordering is not a boolean capability.

use std::cmp::Ordering;

use crate::runtime::capability::Comparable;
use crate::runtime::{Primitive, RuntimeError};

impl Comparable for bool {
    fn equals(&self, other: &Primitive) -> Result<bool, RuntimeError> {
        match other {
            Primitive::Boolean(rhs) => Ok(self == rhs),
            _ => Err(RuntimeError::IncompatibleOperands {
                operation: "compare",
                left: "boolean",
                right: other.type_name(),
            }),
        }
    }

    fn compare(&self, _other: &Primitive) -> Result<Ordering, RuntimeError> {
        Err(RuntimeError::UnsupportedOperation {
            type_name: "boolean",
            operation: "ordering",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_works_ordering_does_not() {
        assert_eq!(
            Comparable::equals(&true, &Primitive::Boolean(true)),
            Ok(true)
        );
        let error =
            Comparable::compare(&true, &Primitive::Boolean(false)).expect_err("no ordering");
        assert!(matches!(error, RuntimeError::UnsupportedOperation { .. }));
    }
}
