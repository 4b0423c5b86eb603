//! Runtime value model.
//!
//! `Primitive` is the closed set of value variants. Operator behavior lives
//! in per-type modules as capability trait impls on the payload types; the
//! dispatch methods here unwrap the payload, route to the right impl, and
//! report `UnsupportedOperation` when the variant lacks the capability.
//! Containers are `Rc<RefCell<..>>` so every binding of the same array or
//! dict observes mutation through any of them.

pub mod capability;
pub mod dict;
pub mod error;

mod array;
mod boolean;
mod double;
mod int;
mod string;

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

pub use array::{index_value, normalize_index, slice_positions};
pub use dict::DictValue;
pub use error::RuntimeError;

use capability::{Arithmetic, Bitwise, Comparable, Container, Iterable, Size};

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Integer(i64),
    Double(f64),
    Boolean(bool),
    Str(Rc<str>),
    Array(Rc<RefCell<Vec<Primitive>>>),
    Dict(Rc<RefCell<DictValue>>),
}

impl Primitive {
    pub fn string(value: impl Into<Rc<str>>) -> Self {
        Primitive::Str(value.into())
    }

    pub fn array(elements: Vec<Primitive>) -> Self {
        Primitive::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn dict(value: DictValue) -> Self {
        Primitive::Dict(Rc::new(RefCell::new(value)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Primitive::Integer(_) => "integer",
            Primitive::Double(_) => "double",
            Primitive::Boolean(_) => "boolean",
            Primitive::Str(_) => "string",
            Primitive::Array(_) => "array",
            Primitive::Dict(_) => "dict",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Primitive::Integer(value) => *value != 0,
            Primitive::Double(value) => *value != 0.0,
            Primitive::Boolean(value) => *value,
            Primitive::Str(value) => !value.is_empty(),
            Primitive::Array(elements) => !elements.borrow().is_empty(),
            Primitive::Dict(map) => !map.borrow().is_empty(),
        }
    }

    pub fn not(&self) -> Primitive {
        Primitive::Boolean(!self.is_truthy())
    }

    /// Display form, as `print` and string concatenation render it.
    pub fn to_output(&self) -> String {
        match self {
            Primitive::Integer(value) => value.to_string(),
            Primitive::Double(value) => value.to_string(),
            Primitive::Boolean(value) => value.to_string(),
            Primitive::Str(value) => value.to_string(),
            Primitive::Array(elements) => {
                let parts: Vec<String> =
                    elements.borrow().iter().map(Primitive::to_repr).collect();
                format!("[{}]", parts.join(", "))
            }
            Primitive::Dict(map) => {
                let parts: Vec<String> = map
                    .borrow()
                    .entries()
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key.to_repr(), value.to_repr()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }

    /// Like `to_output` but quotes strings, for nesting inside containers
    /// and error messages.
    pub fn to_repr(&self) -> String {
        match self {
            Primitive::Str(value) => format!("'{value}'"),
            _ => self.to_output(),
        }
    }

    // Raw-form accessors for builtin interop.

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Primitive::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Primitive::Double(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Primitive::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Primitive::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<Rc<RefCell<Vec<Primitive>>>> {
        match self {
            Primitive::Array(elements) => Some(Rc::clone(elements)),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<Rc<RefCell<DictValue>>> {
        match self {
            Primitive::Dict(map) => Some(Rc::clone(map)),
            _ => None,
        }
    }

    // Arithmetic dispatch.

    pub fn add(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match self {
            Primitive::Integer(value) => Arithmetic::add(value, other),
            Primitive::Double(value) => Arithmetic::add(value, other),
            Primitive::Str(value) => Arithmetic::add(&**value, other),
            _ => Err(self.unsupported("add")),
        }
    }

    pub fn sub(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match self {
            Primitive::Integer(value) => Arithmetic::sub(value, other),
            Primitive::Double(value) => Arithmetic::sub(value, other),
            Primitive::Str(value) => Arithmetic::sub(&**value, other),
            _ => Err(self.unsupported("sub")),
        }
    }

    pub fn mul(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match self {
            Primitive::Integer(value) => Arithmetic::mul(value, other),
            Primitive::Double(value) => Arithmetic::mul(value, other),
            Primitive::Str(value) => Arithmetic::mul(&**value, other),
            _ => Err(self.unsupported("mul")),
        }
    }

    pub fn div(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match self {
            Primitive::Integer(value) => Arithmetic::div(value, other),
            Primitive::Double(value) => Arithmetic::div(value, other),
            Primitive::Str(value) => Arithmetic::div(&**value, other),
            _ => Err(self.unsupported("div")),
        }
    }

    pub fn rem(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match self {
            Primitive::Integer(value) => Arithmetic::rem(value, other),
            Primitive::Double(value) => Arithmetic::rem(value, other),
            Primitive::Str(value) => Arithmetic::rem(&**value, other),
            _ => Err(self.unsupported("mod")),
        }
    }

    pub fn pow(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match self {
            Primitive::Integer(value) => Arithmetic::pow(value, other),
            Primitive::Double(value) => Arithmetic::pow(value, other),
            Primitive::Str(value) => Arithmetic::pow(&**value, other),
            _ => Err(self.unsupported("pow")),
        }
    }

    pub fn negate(&self) -> Result<Primitive, RuntimeError> {
        match self {
            Primitive::Integer(value) => Arithmetic::negate(value),
            Primitive::Double(value) => Arithmetic::negate(value),
            _ => Err(self.unsupported("negate")),
        }
    }

    // Bitwise dispatch; integers only, no promotion.

    pub fn bitand(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match self {
            Primitive::Integer(value) => Bitwise::bitand(value, other),
            _ => Err(self.unsupported("bitwise and")),
        }
    }

    pub fn bitor(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match self {
            Primitive::Integer(value) => Bitwise::bitor(value, other),
            _ => Err(self.unsupported("bitwise or")),
        }
    }

    pub fn bitxor(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match self {
            Primitive::Integer(value) => Bitwise::bitxor(value, other),
            _ => Err(self.unsupported("bitwise xor")),
        }
    }

    pub fn shl(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match self {
            Primitive::Integer(value) => Bitwise::lshift(value, other),
            _ => Err(self.unsupported("left shift")),
        }
    }

    pub fn shr(&self, other: &Primitive) -> Result<Primitive, RuntimeError> {
        match self {
            Primitive::Integer(value) => Bitwise::rshift(value, other),
            _ => Err(self.unsupported("right shift")),
        }
    }

    pub fn bitnot(&self) -> Result<Primitive, RuntimeError> {
        match self {
            Primitive::Integer(value) => Bitwise::bitnot(value),
            _ => Err(self.unsupported("bitwise not")),
        }
    }

    // Comparison dispatch.

    pub fn equals(&self, other: &Primitive) -> Result<bool, RuntimeError> {
        match self {
            Primitive::Integer(value) => Comparable::equals(value, other),
            Primitive::Double(value) => Comparable::equals(value, other),
            Primitive::Boolean(value) => Comparable::equals(value, other),
            Primitive::Str(value) => Comparable::equals(&**value, other),
            _ => Err(self.unsupported("compare")),
        }
    }

    pub fn compare(&self, other: &Primitive) -> Result<Ordering, RuntimeError> {
        match self {
            Primitive::Integer(value) => Comparable::compare(value, other),
            Primitive::Double(value) => Comparable::compare(value, other),
            Primitive::Boolean(value) => Comparable::compare(value, other),
            Primitive::Str(value) => Comparable::compare(&**value, other),
            _ => Err(self.unsupported("compare")),
        }
    }

    // Container dispatch.

    pub fn get_index(&self, index: &Primitive) -> Result<Primitive, RuntimeError> {
        match self {
            Primitive::Array(elements) => Container::get(&*elements.borrow(), index),
            Primitive::Dict(map) => Container::get(&*map.borrow(), index),
            Primitive::Str(value) => Container::get(&**value, index),
            _ => Err(self.unsupported("index")),
        }
    }

    pub fn set_index(&self, index: &Primitive, value: Primitive) -> Result<(), RuntimeError> {
        match self {
            Primitive::Array(elements) => Container::set(&mut *elements.borrow_mut(), index, value),
            Primitive::Dict(map) => Container::set(&mut *map.borrow_mut(), index, value),
            _ => Err(self.unsupported("index assignment")),
        }
    }

    pub fn slice(
        &self,
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    ) -> Result<Primitive, RuntimeError> {
        match self {
            Primitive::Array(elements) => {
                let elements = elements.borrow();
                let positions = slice_positions(elements.len(), start, end, step)?;
                Ok(Primitive::array(
                    positions.iter().map(|&slot| elements[slot].clone()).collect(),
                ))
            }
            Primitive::Str(value) => {
                let chars: Vec<char> = value.chars().collect();
                let positions = slice_positions(chars.len(), start, end, step)?;
                Ok(Primitive::string(
                    positions.iter().map(|&slot| chars[slot]).collect::<String>(),
                ))
            }
            _ => Err(self.unsupported("slice")),
        }
    }

    /// The values a for-each or comprehension walks: array elements, dict
    /// keys.
    pub fn elements(&self) -> Result<Vec<Primitive>, RuntimeError> {
        match self {
            Primitive::Array(elements) => Ok(Iterable::elements(&*elements.borrow())),
            Primitive::Dict(map) => Ok(Iterable::elements(&*map.borrow())),
            _ => Err(self.unsupported("iteration")),
        }
    }

    pub fn len(&self) -> Result<usize, RuntimeError> {
        match self {
            Primitive::Str(value) => Ok(Size::len(&**value)),
            Primitive::Array(elements) => Ok(Size::len(&*elements.borrow())),
            Primitive::Dict(map) => Ok(Size::len(&*map.borrow())),
            _ => Err(self.unsupported("len")),
        }
    }

    fn unsupported(&self, operation: &'static str) -> RuntimeError {
        RuntimeError::UnsupportedOperation {
            type_name: self.type_name(),
            operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_have_no_arithmetic_capability() {
        let error = Primitive::Boolean(true)
            .add(&Primitive::Integer(1))
            .expect_err("boolean add must fail");
        assert_eq!(
            error,
            RuntimeError::UnsupportedOperation {
                type_name: "boolean",
                operation: "add"
            }
        );
    }

    #[test]
    fn arrays_alias_through_every_binding() {
        let first = Primitive::array(vec![Primitive::Integer(1)]);
        let second = first.clone();
        second
            .set_index(&Primitive::Integer(0), Primitive::Integer(9))
            .expect("index assignment works");
        assert_eq!(
            first.get_index(&Primitive::Integer(0)).expect("index works"),
            Primitive::Integer(9)
        );
    }

    #[test]
    fn truthiness_follows_emptiness_for_containers() {
        assert!(!Primitive::Integer(0).is_truthy());
        assert!(Primitive::Double(0.5).is_truthy());
        assert!(!Primitive::string("").is_truthy());
        assert!(!Primitive::array(vec![]).is_truthy());
        assert!(Primitive::array(vec![Primitive::Boolean(false)]).is_truthy());
        assert!(!Primitive::dict(DictValue::new()).is_truthy());
    }

    #[test]
    fn output_nests_reprs_inside_containers() {
        let value = Primitive::array(vec![
            Primitive::Integer(1),
            Primitive::string("a"),
            Primitive::Boolean(true),
        ]);
        assert_eq!(value.to_output(), "[1, 'a', true]");
        let mut dict = DictValue::new();
        dict.insert(Primitive::string("k"), Primitive::Integer(2))
            .expect("insert works");
        assert_eq!(Primitive::dict(dict).to_output(), "{'k': 2}");
    }

    #[test]
    fn string_slice_walks_characters() {
        let sliced = Primitive::string("abcdef")
            .slice(Some(1), Some(5), Some(2))
            .expect("slice works");
        assert_eq!(sliced, Primitive::string("bd"));
    }
}
