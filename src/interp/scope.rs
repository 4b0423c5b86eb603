//! Scope frames held in two arenas.
//!
//! Frames form parent chains by id instead of ownership, so the evaluator
//! can hand out copies of a `ScopeId` freely. Construct-local frames live in
//! one arena and are reclaimed by truncating it back to a mark; module-global
//! frames live in a second arena that truncation never touches, so a module
//! loaded mid-run does not pin whatever construct frames happened to be live
//! at import time. The arena is encoded in the id's high bit.

use rustc_hash::FxHashMap;

use crate::runtime::Primitive;

const PERSISTENT_BIT: usize = 1 << (usize::BITS - 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug)]
pub struct Binding {
    pub value: Primitive,
    pub read_only: bool,
}

#[derive(Debug, Default)]
struct Frame {
    bindings: FxHashMap<String, Binding>,
    parent: Option<ScopeId>,
}

#[derive(Debug, Default)]
pub struct Scopes {
    frames: Vec<Frame>,
    persistent: Vec<Frame>,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.frames.push(Frame {
            bindings: FxHashMap::default(),
            parent,
        });
        ScopeId(self.frames.len() - 1)
    }

    /// A frame `truncate` will never reclaim. Module globals live here.
    pub fn push_persistent(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.persistent.push(Frame {
            bindings: FxHashMap::default(),
            parent,
        });
        ScopeId((self.persistent.len() - 1) | PERSISTENT_BIT)
    }

    pub fn mark(&self) -> usize {
        self.frames.len()
    }

    pub fn truncate(&mut self, mark: usize) {
        self.frames.truncate(mark);
    }

    fn frame(&self, ScopeId(id): ScopeId) -> &Frame {
        if id & PERSISTENT_BIT != 0 {
            &self.persistent[id & !PERSISTENT_BIT]
        } else {
            &self.frames[id]
        }
    }

    fn frame_mut(&mut self, ScopeId(id): ScopeId) -> &mut Frame {
        if id & PERSISTENT_BIT != 0 {
            &mut self.persistent[id & !PERSISTENT_BIT]
        } else {
            &mut self.frames[id]
        }
    }

    /// Lookup walks the parent chain, innermost frame first.
    pub fn get(&self, scope: ScopeId, name: &str) -> Option<&Primitive> {
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            let frame = self.frame(id);
            if let Some(binding) = frame.bindings.get(name) {
                return Some(&binding.value);
            }
            cursor = frame.parent;
        }
        None
    }

    /// Stores always target the given frame, creating or overwriting the
    /// binding there; enclosing frames are never written through. Returns
    /// `false` when the existing binding is read-only.
    pub fn set(&mut self, scope: ScopeId, name: &str, value: Primitive) -> bool {
        let bindings = &mut self.frame_mut(scope).bindings;
        if let Some(binding) = bindings.get_mut(name) {
            if binding.read_only {
                return false;
            }
            binding.value = value;
            return true;
        }
        bindings.insert(
            name.to_string(),
            Binding {
                value,
                read_only: false,
            },
        );
        true
    }

    /// Host seam: install a binding user code may read but not reassign.
    pub fn define_read_only(&mut self, scope: ScopeId, name: &str, value: Primitive) {
        self.frame_mut(scope).bindings.insert(
            name.to_string(),
            Binding {
                value,
                read_only: true,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_the_chain_stores_stay_local() {
        let mut scopes = Scopes::new();
        let outer = scopes.push(None);
        let inner = scopes.push(Some(outer));
        assert!(scopes.set(outer, "x", Primitive::Integer(1)));
        assert_eq!(scopes.get(inner, "x"), Some(&Primitive::Integer(1)));

        assert!(scopes.set(inner, "x", Primitive::Integer(2)));
        assert_eq!(scopes.get(inner, "x"), Some(&Primitive::Integer(2)));
        assert_eq!(scopes.get(outer, "x"), Some(&Primitive::Integer(1)));
    }

    #[test]
    fn truncate_never_reclaims_persistent_frames() {
        let mut scopes = Scopes::new();
        let globals = scopes.push_persistent(None);
        assert!(scopes.set(globals, "g", Primitive::Integer(1)));

        let mark = scopes.mark();
        let frame = scopes.push(Some(globals));
        assert!(scopes.set(frame, "local", Primitive::Integer(2)));
        scopes.truncate(mark);
        scopes.truncate(0);
        assert_eq!(scopes.get(globals, "g"), Some(&Primitive::Integer(1)));
    }

    #[test]
    fn frames_live_before_a_persistent_push_are_still_reclaimed() {
        let mut scopes = Scopes::new();
        let mark = scopes.mark();
        let caller = scopes.push(None);
        assert!(scopes.set(caller, "local", Primitive::Integer(1)));

        // A module loaded mid-call allocates its globals while construct
        // frames are live; those frames must not outlive their construct.
        let globals = scopes.push_persistent(None);
        assert!(scopes.set(globals, "g", Primitive::Integer(2)));

        scopes.truncate(mark);
        assert_eq!(scopes.mark(), mark);
        assert_eq!(scopes.get(globals, "g"), Some(&Primitive::Integer(2)));
    }

    #[test]
    fn read_only_bindings_refuse_reassignment() {
        let mut scopes = Scopes::new();
        let frame = scopes.push(None);
        scopes.define_read_only(frame, "version", Primitive::string("0.1"));
        assert!(!scopes.set(frame, "version", Primitive::string("0.2")));
        assert_eq!(
            scopes.get(frame, "version"),
            Some(&Primitive::string("0.1"))
        );
    }
}
