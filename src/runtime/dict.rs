//! Insertion-ordered dictionary.
//!
//! Entries live in a vector in insertion order; a hash-bucket side table maps
//! key hashes to entry slots, with collisions resolved by structural key
//! equality. Only scalar variants hash; arrays and dicts are rejected as
//! keys.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};

use crate::runtime::capability::{Container, Iterable, Size};
use crate::runtime::{Primitive, RuntimeError};

#[derive(Debug, Clone, Default)]
pub struct DictValue {
    entries: Vec<(Primitive, Primitive)>,
    buckets: FxHashMap<u64, Vec<usize>>,
}

impl DictValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(Primitive, Primitive)] {
        &self.entries
    }

    pub fn keys(&self) -> Vec<Primitive> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn get(&self, key: &Primitive) -> Result<Option<&Primitive>, RuntimeError> {
        let slot = self.find(key)?;
        Ok(slot.map(|slot| &self.entries[slot].1))
    }

    /// Inserts or overwrites; insertion order is kept on overwrite.
    pub fn insert(&mut self, key: Primitive, value: Primitive) -> Result<(), RuntimeError> {
        if let Some(slot) = self.find(&key)? {
            self.entries[slot].1 = value;
            return Ok(());
        }
        let hash = hash_key(&key)?;
        self.buckets.entry(hash).or_default().push(self.entries.len());
        self.entries.push((key, value));
        Ok(())
    }

    pub fn contains(&self, key: &Primitive) -> Result<bool, RuntimeError> {
        Ok(self.find(key)?.is_some())
    }

    fn find(&self, key: &Primitive) -> Result<Option<usize>, RuntimeError> {
        let hash = hash_key(key)?;
        let Some(slots) = self.buckets.get(&hash) else {
            return Ok(None);
        };
        Ok(slots
            .iter()
            .copied()
            .find(|&slot| key_equals(&self.entries[slot].0, key)))
    }
}

/// Structural equality over dicts, independent of insertion order.
impl PartialEq for DictValue {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(key, value)| matches!(other.get(key), Ok(Some(found)) if found == value))
    }
}

fn hash_key(key: &Primitive) -> Result<u64, RuntimeError> {
    let mut hasher = FxHasher::default();
    match key {
        Primitive::Integer(value) => {
            hasher.write_u8(0);
            value.hash(&mut hasher);
        }
        Primitive::Double(value) => {
            hasher.write_u8(1);
            value.to_bits().hash(&mut hasher);
        }
        Primitive::Boolean(value) => {
            hasher.write_u8(2);
            value.hash(&mut hasher);
        }
        Primitive::Str(value) => {
            hasher.write_u8(3);
            value.hash(&mut hasher);
        }
        Primitive::Array(_) | Primitive::Dict(_) => {
            return Err(RuntimeError::UnhashableKey {
                type_name: key.type_name(),
            });
        }
    }
    Ok(hasher.finish())
}

fn key_equals(a: &Primitive, b: &Primitive) -> bool {
    match (a, b) {
        (Primitive::Integer(a), Primitive::Integer(b)) => a == b,
        (Primitive::Double(a), Primitive::Double(b)) => a.to_bits() == b.to_bits(),
        (Primitive::Boolean(a), Primitive::Boolean(b)) => a == b,
        (Primitive::Str(a), Primitive::Str(b)) => a == b,
        _ => false,
    }
}

impl Container for DictValue {
    fn get(&self, index: &Primitive) -> Result<Primitive, RuntimeError> {
        match DictValue::get(self, index)? {
            Some(value) => Ok(value.clone()),
            None => Err(RuntimeError::MissingKey {
                key: index.to_repr(),
            }),
        }
    }

    fn set(&mut self, index: &Primitive, value: Primitive) -> Result<(), RuntimeError> {
        self.insert(index.clone(), value)
    }
}

impl Iterable for DictValue {
    fn elements(&self) -> Vec<Primitive> {
        self.keys()
    }
}

impl Size for DictValue {
    fn len(&self) -> usize {
        DictValue::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let mut dict = DictValue::new();
        dict.insert(Primitive::string("b"), Primitive::Integer(1))
            .expect("insert works");
        dict.insert(Primitive::string("a"), Primitive::Integer(2))
            .expect("insert works");
        dict.insert(Primitive::string("b"), Primitive::Integer(3))
            .expect("overwrite works");
        assert_eq!(
            dict.keys(),
            vec![Primitive::string("b"), Primitive::string("a")]
        );
        assert_eq!(
            dict.get(&Primitive::string("b")).expect("lookup works"),
            Some(&Primitive::Integer(3))
        );
    }

    #[test]
    fn distinguishes_key_variants() {
        let mut dict = DictValue::new();
        dict.insert(Primitive::Integer(1), Primitive::string("int"))
            .expect("insert works");
        dict.insert(Primitive::Double(1.0), Primitive::string("double"))
            .expect("insert works");
        dict.insert(Primitive::Boolean(true), Primitive::string("bool"))
            .expect("insert works");
        assert_eq!(dict.len(), 3);
        assert_eq!(
            dict.get(&Primitive::Double(1.0)).expect("lookup works"),
            Some(&Primitive::string("double"))
        );
    }

    #[test]
    fn rejects_container_keys() {
        let mut dict = DictValue::new();
        let error = dict
            .insert(Primitive::array(vec![]), Primitive::Integer(1))
            .expect_err("array keys are unhashable");
        assert_eq!(error, RuntimeError::UnhashableKey { type_name: "array" });
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let mut left = DictValue::new();
        let mut right = DictValue::new();
        left.insert(Primitive::Integer(1), Primitive::string("a"))
            .expect("insert works");
        left.insert(Primitive::Integer(2), Primitive::string("b"))
            .expect("insert works");
        right
            .insert(Primitive::Integer(2), Primitive::string("b"))
            .expect("insert works");
        right
            .insert(Primitive::Integer(1), Primitive::string("a"))
            .expect("insert works");
        assert_eq!(left, right);
    }
}
