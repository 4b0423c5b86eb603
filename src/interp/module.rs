//! Module registry.
//!
//! Every running script is a module; imports add more. A module owns the
//! functions its source declared, the builtins it can reach unqualified, its
//! child modules by local name, and a persistent globals frame. File modules
//! are cached by dotted path so a diamond import evaluates once; the cache
//! entry is made before the module body runs, which also breaks import
//! cycles.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::Expression;
use crate::builtins::Builtin;
use crate::interp::scope::ScopeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleId(usize);

/// A function together with the module that defined it. Calls always run
/// against the defining module's globals, so `from`-imported functions keep
/// their home scope.
#[derive(Clone)]
pub struct Callable {
    pub def: Rc<Expression>,
    pub module: ModuleId,
}

pub struct Module {
    pub name: String,
    pub functions: FxHashMap<String, Callable>,
    pub builtins: FxHashMap<String, &'static Builtin>,
    pub children: FxHashMap<String, ModuleId>,
    pub globals: ScopeId,
}

#[derive(Default)]
pub struct ModuleTable {
    modules: Vec<Module>,
    loaded: FxHashMap<String, ModuleId>,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: Module) -> ModuleId {
        self.modules.push(module);
        ModuleId(self.modules.len() - 1)
    }

    pub fn get(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub fn get_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0]
    }

    pub fn cached(&self, dotted: &str) -> Option<ModuleId> {
        self.loaded.get(dotted).copied()
    }

    pub fn cache(&mut self, dotted: String, id: ModuleId) {
        self.loaded.insert(dotted, id);
    }
}

/// `a.b.c` resolves to `<root>/a/b/c.bud`.
pub fn module_path(root: &Path, segments: &[String]) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in segments {
        path.push(segment);
    }
    path.set_extension("bud");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_segments_under_the_root() {
        let path = module_path(
            Path::new("/lib"),
            &["a".to_string(), "b".to_string(), "c".to_string()],
        );
        assert_eq!(path, PathBuf::from("/lib/a/b/c.bud"));
    }
}
