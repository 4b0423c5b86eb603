//! Array container behavior plus the shared index/slice arithmetic that the
//! string type reuses.

use crate::runtime::capability::{Container, Iterable, Size};
use crate::runtime::{Primitive, RuntimeError};

/// Extract a host index from an Integer or Double (truncated) value.
pub fn index_value(index: &Primitive) -> Result<i64, RuntimeError> {
    match index {
        Primitive::Integer(value) => Ok(*value),
        Primitive::Double(value) => Ok(*value as i64),
        _ => Err(RuntimeError::InvalidIndex {
            type_name: index.type_name(),
        }),
    }
}

/// Resolve a possibly negative index against `len`. Negative indices count
/// from the end; anything out of range after adjustment is an error.
pub fn normalize_index(index: i64, len: usize) -> Result<usize, RuntimeError> {
    let adjusted = if index < 0 { index + len as i64 } else { index };
    if adjusted < 0 || adjusted >= len as i64 {
        return Err(RuntimeError::IndexOutOfBounds { index, len });
    }
    Ok(adjusted as usize)
}

/// The element positions a `[start:end:step]` slice selects, clamped to
/// bounds. A negative step walks backward from the end.
pub fn slice_positions(
    len: usize,
    start: Option<i64>,
    end: Option<i64>,
    step: Option<i64>,
) -> Result<Vec<usize>, RuntimeError> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(RuntimeError::ZeroStep);
    }
    let len = len as i64;
    let adjust = |value: i64| if value < 0 { value + len } else { value };

    let mut positions = Vec::new();
    if step > 0 {
        let mut cursor = adjust(start.unwrap_or(0)).clamp(0, len);
        let stop = adjust(end.unwrap_or(len)).clamp(0, len);
        while cursor < stop {
            positions.push(cursor as usize);
            cursor += step;
        }
    } else {
        let mut cursor = adjust(start.unwrap_or(len - 1)).clamp(-1, len - 1);
        let stop = end.map(adjust).unwrap_or(-1).clamp(-1, len - 1);
        while cursor > stop {
            positions.push(cursor as usize);
            cursor += step;
        }
    }
    Ok(positions)
}

impl Container for Vec<Primitive> {
    fn get(&self, index: &Primitive) -> Result<Primitive, RuntimeError> {
        let slot = normalize_index(index_value(index)?, self.len())?;
        Ok(self[slot].clone())
    }

    fn set(&mut self, index: &Primitive, value: Primitive) -> Result<(), RuntimeError> {
        let slot = normalize_index(index_value(index)?, self.len())?;
        self[slot] = value;
        Ok(())
    }
}

impl Iterable for Vec<Primitive> {
    fn elements(&self) -> Vec<Primitive> {
        self.clone()
    }
}

impl Size for Vec<Primitive> {
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_index_counts_from_the_end() {
        assert_eq!(normalize_index(-1, 3), Ok(2));
        assert_eq!(
            normalize_index(-4, 3),
            Err(RuntimeError::IndexOutOfBounds { index: -4, len: 3 })
        );
    }

    #[test]
    fn double_index_truncates() {
        assert_eq!(index_value(&Primitive::Double(2.9)), Ok(2));
    }

    #[test]
    fn slices_clamp_to_bounds() {
        let positions =
            slice_positions(3, Some(1), Some(100), None).expect("clamped slice works");
        assert_eq!(positions, vec![1, 2]);
    }

    #[test]
    fn negative_step_walks_backward() {
        let positions = slice_positions(4, None, None, Some(-1)).expect("reverse slice works");
        assert_eq!(positions, vec![3, 2, 1, 0]);
        let positions = slice_positions(4, Some(-1), Some(0), Some(-2)).expect("stepped reverse");
        assert_eq!(positions, vec![3, 1]);
    }

    #[test]
    fn zero_step_is_rejected() {
        assert_eq!(
            slice_positions(3, None, None, Some(0)),
            Err(RuntimeError::ZeroStep)
        );
    }

    #[test]
    fn empty_sequences_slice_to_nothing() {
        assert_eq!(slice_positions(0, None, None, None), Ok(vec![]));
        assert_eq!(slice_positions(0, None, None, Some(-1)), Ok(vec![]));
    }
}
