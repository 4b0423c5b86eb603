//! Operator capabilities a value's payload type may implement.
//!
//! `Primitive` dispatch methods unwrap the payload and route here; a variant
//! that lacks an impl reports `UnsupportedOperation` before these traits are
//! ever consulted. The right-hand side stays a `Primitive` so each impl owns
//! its coercion rules.

use std::cmp::Ordering;

use crate::runtime::{Primitive, RuntimeError};

pub trait Arithmetic {
    fn add(&self, other: &Primitive) -> Result<Primitive, RuntimeError>;
    fn sub(&self, other: &Primitive) -> Result<Primitive, RuntimeError>;
    fn mul(&self, other: &Primitive) -> Result<Primitive, RuntimeError>;
    fn div(&self, other: &Primitive) -> Result<Primitive, RuntimeError>;
    fn rem(&self, other: &Primitive) -> Result<Primitive, RuntimeError>;
    fn pow(&self, other: &Primitive) -> Result<Primitive, RuntimeError>;
    fn negate(&self) -> Result<Primitive, RuntimeError>;
}

pub trait Bitwise {
    fn bitand(&self, other: &Primitive) -> Result<Primitive, RuntimeError>;
    fn bitor(&self, other: &Primitive) -> Result<Primitive, RuntimeError>;
    fn bitxor(&self, other: &Primitive) -> Result<Primitive, RuntimeError>;
    fn lshift(&self, other: &Primitive) -> Result<Primitive, RuntimeError>;
    fn rshift(&self, other: &Primitive) -> Result<Primitive, RuntimeError>;
    fn bitnot(&self) -> Result<Primitive, RuntimeError>;
}

/// Equality and ordering. Both reject operands whose concrete variant
/// differs from the receiver's, even where arithmetic would promote.
pub trait Comparable {
    fn equals(&self, other: &Primitive) -> Result<bool, RuntimeError>;
    fn compare(&self, other: &Primitive) -> Result<Ordering, RuntimeError>;
}

pub trait Container {
    fn get(&self, index: &Primitive) -> Result<Primitive, RuntimeError>;
    fn set(&mut self, index: &Primitive, value: Primitive) -> Result<(), RuntimeError>;
}

pub trait Iterable {
    fn elements(&self) -> Vec<Primitive>;
}

pub trait Size {
    fn len(&self) -> usize;
}
