//! String capabilities. Strings are immutable; every operation builds a new
//! value. Character counts, not bytes, drive indexing and the arithmetic
//! coercions.

use std::cmp::Ordering;

use crate::runtime::array::{index_value, normalize_index};
use crate::runtime::capability::{Arithmetic, Comparable, Container, Size};
use crate::runtime::{Primitive, RuntimeError};

fn incompatible(operation: &'static str, other: &Primitive) -> RuntimeError {
    RuntimeError::IncompatibleOperands {
        operation,
        left: "string",
        right: other.type_name(),
    }
}

fn unsupported(operation: &'static str) -> RuntimeError {
    RuntimeError::UnsupportedOperation {
        type_name: "string",
        operation,
    }
}

impl Arithmetic for str {
    fn add(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        let joined = match other {
            Primitive::Str(rhs) => format!("{self}{rhs}"),
            Primitive::Integer(rhs) => format!("{self}{rhs}"),
            Primitive::Double(rhs) => format!("{self}{rhs}"),
            _ => return Err(incompatible("add", other)),
        };
        Ok(Primitive::string(joined))
    }

    /// Trims `n` characters from the end; a negative count keeps that many
    /// from the end instead.
    fn sub(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        let Primitive::Integer(count) = other else {
            return Err(incompatible("sub", other));
        };
        let chars: Vec<char> = self.chars().collect();
        let kept: String = if *count >= 0 {
            let keep = chars.len().saturating_sub(*count as usize);
            chars[..keep].iter().collect()
        } else {
            let keep = (chars.len()).min(count.unsigned_abs() as usize);
            chars[chars.len() - keep..].iter().collect()
        };
        Ok(Primitive::string(kept))
    }

    fn mul(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        let Primitive::Integer(count) = other else {
            return Err(incompatible("mul", other));
        };
        let count = (*count).max(0) as usize;
        Ok(Primitive::string(self.repeat(count)))
    }

    /// Keeps the first `len / divisor` characters.
    fn div(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        let Primitive::Integer(divisor) = other else {
            return Err(incompatible("div", other));
        };
        if *divisor == 0 {
            return Err(RuntimeError::DivisionByZero);
        }
        let chars: Vec<char> = self.chars().collect();
        let keep = ((chars.len() as i64) / divisor).max(0) as usize;
        Ok(Primitive::string(chars[..keep].iter().collect::<String>()))
    }

    fn rem(&self, _other: &Primitive) -> Result<Primitive, RuntimeError> {
        Err(unsupported("mod"))
    }

    fn pow(&self, _other: &Primitive) -> Result<Primitive, RuntimeError> {
        Err(unsupported("pow"))
    }

    fn negate(&self) -> Result<Primitive, RuntimeError> {
        Err(unsupported("negate"))
    }
}

impl Comparable for str {
    fn equals(&self, other: &Primitive) -> Result<bool, RuntimeError> {
        match other {
            Primitive::Str(rhs) => Ok(self == &**rhs),
            _ => Err(incompatible("compare", other)),
        }
    }

    fn compare(&self, other: &Primitive) -> Result<Ordering, RuntimeError> {
        match other {
            Primitive::Str(rhs) => Ok(self.cmp(rhs)),
            _ => Err(incompatible("compare", other)),
        }
    }
}

impl Container for str {
    fn get(&self, index: &Primitive) -> Result<Primitive, RuntimeError> {
        let chars: Vec<char> = self.chars().collect();
        let slot = normalize_index(index_value(index)?, chars.len())?;
        Ok(Primitive::string(chars[slot].to_string()))
    }

    fn set(&mut self, _index: &Primitive, _value: Primitive) -> Result<(), RuntimeError> {
        Err(unsupported("index assignment"))
    }
}

impl Size for str {
    fn len(&self) -> usize {
        self.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_trims_or_keeps_a_suffix() {
        let trimmed = Arithmetic::sub("budlang", &Primitive::Integer(4)).expect("trim works");
        assert_eq!(trimmed, Primitive::string("bud"));
        let suffix = Arithmetic::sub("budlang", &Primitive::Integer(-4)).expect("suffix works");
        assert_eq!(suffix, Primitive::string("lang"));
        let emptied = Arithmetic::sub("ab", &Primitive::Integer(10)).expect("over-trim works");
        assert_eq!(emptied, Primitive::string(""));
    }

    #[test]
    fn mul_repeats_and_clamps_negative_counts() {
        let repeated = Arithmetic::mul("ab", &Primitive::Integer(3)).expect("repeat works");
        assert_eq!(repeated, Primitive::string("ababab"));
        let empty = Arithmetic::mul("ab", &Primitive::Integer(-1)).expect("negative repeat");
        assert_eq!(empty, Primitive::string(""));
    }

    #[test]
    fn div_truncates_by_character_count() {
        let half = Arithmetic::div("abcdef", &Primitive::Integer(2)).expect("halving works");
        assert_eq!(half, Primitive::string("abc"));
        let error = Arithmetic::div("abc", &Primitive::Integer(0)).expect_err("divide by zero");
        assert_eq!(error, RuntimeError::DivisionByZero);
    }

    #[test]
    fn indexing_counts_characters_not_bytes() {
        let ch = Container::get("héllo", &Primitive::Integer(1)).expect("char index works");
        assert_eq!(ch, Primitive::string("é"));
        assert_eq!(Size::len("héllo"), 5);
    }

    #[test]
    fn ordering_is_lexicographic() {
        let order = Comparable::compare("apple", &Primitive::string("banana"))
            .expect("string ordering works");
        assert_eq!(order, Ordering::Less);
    }
}
