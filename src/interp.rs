//! Tree-walking evaluator.
//!
//! `eval` returns `Result<Option<Primitive>, Flow>`: `None` for
//! statement-shaped nodes that produce no value, and `Flow` carrying either a
//! real error or a control signal (return/break/continue) that some enclosing
//! construct absorbs. Scope frames live in an arena and are reclaimed by
//! truncating back to a mark when a construct exits.

pub mod module;
pub mod scope;

use std::cmp::Ordering;
use std::path::PathBuf;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::ast::{BinaryOp, CompClause, Expression, UnaryOp};
use crate::builtins::{self, Builtin, CallContext};
use crate::parser;
use crate::runtime::{DictValue, Primitive, RuntimeError, index_value};
use crate::token::Token;
use module::{Callable, Module, ModuleId, ModuleTable, module_path};
use scope::{ScopeId, Scopes};

pub struct InterpConfig {
    /// Ceiling on nested `eval` entries. Every level, whether a call or a
    /// deeply nested expression, keeps a handful of host stack frames live,
    /// so the default must trip before a 2 MiB thread stack runs out in
    /// unoptimized builds. Raise it only with a bigger stack to match.
    pub max_depth: usize,
    pub module_root: PathBuf,
    pub source_name: String,
}

impl Default for InterpConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            module_root: PathBuf::from("."),
            source_name: "<script>".to_string(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalErrorKind {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String },
    #[error("Undefined function '{name}'")]
    UndefinedFunction { name: String },
    #[error("Undefined module '{name}'")]
    UndefinedModule { name: String },
    #[error("Module '{module}' has no member '{name}'")]
    UndefinedMember { module: String, name: String },
    #[error("{name}() takes at most {expected} positional arguments, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("{name}() received parameter '{param}' more than once")]
    DuplicateArgument { name: String, param: String },
    #[error("{name}() is missing required parameter '{param}'")]
    MissingArgument { name: String, param: String },
    #[error("{name}() has no parameter '{param}'")]
    UnknownParameter { name: String, param: String },
    #[error("Assertion failed")]
    AssertionFailed,
    #[error("Cannot import '{path}': {cause}")]
    ImportFailed { path: String, cause: String },
    #[error("Cannot assign to read-only binding '{name}'")]
    ReadOnlyBinding { name: String },
    #[error("'{keyword}' outside of its enclosing construct")]
    StrayControlFlow { keyword: &'static str },
    #[error("Maximum evaluation depth of {limit} exceeded")]
    DepthExceeded { limit: usize },
    #[error("'{name}' is not callable")]
    NotCallable { name: String },
    #[error("Expression produced no value")]
    NoValue,
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub token: Token,
}

/// The non-value outcomes of evaluating a node, propagated through the error
/// channel so `?` carries them upward until a construct absorbs them.
#[derive(Debug)]
pub enum Flow {
    Error(EvalError),
    Return(Option<Primitive>, Token),
    Break(Token),
    Continue(Token),
}

impl From<EvalError> for Flow {
    fn from(error: EvalError) -> Self {
        Flow::Error(error)
    }
}

fn fail(kind: EvalErrorKind, token: &Token) -> Flow {
    Flow::Error(EvalError {
        kind,
        token: token.clone(),
    })
}

fn fail_runtime(error: RuntimeError, token: &Token) -> Flow {
    fail(EvalErrorKind::Runtime(error), token)
}

fn stray(keyword: &'static str, token: &Token) -> EvalError {
    EvalError {
        kind: EvalErrorKind::StrayControlFlow { keyword },
        token: token.clone(),
    }
}

pub struct Interp {
    scopes: Scopes,
    modules: ModuleTable,
    module: ModuleId,
    depth: usize,
    config: InterpConfig,
    output: Vec<String>,
}

impl Interp {
    pub fn new(config: InterpConfig) -> Self {
        let mut scopes = Scopes::new();
        let globals = scopes.push_persistent(None);
        let mut modules = ModuleTable::new();
        let module = modules.insert(Module {
            name: config.source_name.clone(),
            functions: FxHashMap::default(),
            builtins: builtins::globals(),
            children: FxHashMap::default(),
            globals,
        });
        Self {
            scopes,
            modules,
            module,
            depth: 0,
            config,
            output: Vec::new(),
        }
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /// Host seam: expose a value to scripts as a non-reassignable global.
    pub fn define_read_only(&mut self, name: &str, value: Primitive) {
        let globals = self.modules.get(self.module).globals;
        self.scopes.define_read_only(globals, name, value);
    }

    /// Run a parsed script. A `return` at the script boundary yields its
    /// value; otherwise the result is the last statement's value, if any.
    pub fn run(&mut self, script: &Expression) -> Result<Option<Primitive>, EvalError> {
        let globals = self.modules.get(self.module).globals;
        let Expression::Script {
            statements,
            functions,
            ..
        } = script
        else {
            return match self.eval(script, globals) {
                Ok(value) => Ok(value),
                Err(Flow::Return(value, _)) => Ok(value),
                Err(Flow::Break(token)) => Err(stray("break", &token)),
                Err(Flow::Continue(token)) => Err(stray("continue", &token)),
                Err(Flow::Error(error)) => Err(error),
            };
        };
        self.register_functions(self.module, functions);
        let mut last = None;
        for statement in statements {
            match self.eval(statement, globals) {
                Ok(value) => last = value,
                Err(Flow::Return(value, _)) => return Ok(value),
                Err(Flow::Break(token)) => return Err(stray("break", &token)),
                Err(Flow::Continue(token)) => return Err(stray("continue", &token)),
                Err(Flow::Error(error)) => return Err(error),
            }
        }
        Ok(last)
    }

    fn register_functions(&mut self, module: ModuleId, functions: &FxHashMap<String, Expression>) {
        for (name, def) in functions {
            self.modules.get_mut(module).functions.insert(
                name.clone(),
                Callable {
                    def: Rc::new(def.clone()),
                    module,
                },
            );
        }
    }

    fn eval(&mut self, expr: &Expression, scope: ScopeId) -> Result<Option<Primitive>, Flow> {
        if self.depth >= self.config.max_depth {
            return Err(fail(
                EvalErrorKind::DepthExceeded {
                    limit: self.config.max_depth,
                },
                expr.token(),
            ));
        }
        self.depth += 1;
        let result = self.eval_inner(expr, scope);
        self.depth -= 1;
        result
    }

    /// Evaluate in a position that must produce a value.
    fn eval_value(&mut self, expr: &Expression, scope: ScopeId) -> Result<Primitive, Flow> {
        match self.eval(expr, scope)? {
            Some(value) => Ok(value),
            None => Err(fail(EvalErrorKind::NoValue, expr.token())),
        }
    }

    fn eval_inner(&mut self, expr: &Expression, scope: ScopeId) -> Result<Option<Primitive>, Flow> {
        match expr {
            Expression::IntegerLit { value, .. } => Ok(Some(Primitive::Integer(*value))),
            Expression::DoubleLit { value, .. } => Ok(Some(Primitive::Double(*value))),
            Expression::BooleanLit { value, .. } => Ok(Some(Primitive::Boolean(*value))),
            Expression::StringLit { value, .. } => Ok(Some(Primitive::string(value.as_str()))),
            Expression::Variable { name, token } => match self.scopes.get(scope, name) {
                Some(value) => Ok(Some(value.clone())),
                None => Err(fail(
                    EvalErrorKind::UndefinedVariable { name: name.clone() },
                    token,
                )),
            },
            Expression::Unary { op, operand, token } => {
                let value = self.eval_value(operand, scope)?;
                let result = match op {
                    UnaryOp::Negate => value.negate(),
                    UnaryOp::Not => Ok(value.not()),
                    UnaryOp::BitNot => value.bitnot(),
                };
                Ok(Some(result.map_err(|error| fail_runtime(error, token))?))
            }
            Expression::Binary {
                op,
                left,
                right,
                token,
            } => {
                let left = self.eval_value(left, scope)?;
                let right = self.eval_value(right, scope)?;
                let value = apply_binary(*op, &left, &right)
                    .map_err(|error| fail_runtime(error, token))?;
                Ok(Some(value))
            }
            Expression::Assign {
                target,
                op,
                value,
                token,
            } => {
                self.eval_assign(target, *op, value, scope, token)?;
                Ok(None)
            }
            Expression::ArrayLit { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_value(element, scope)?);
                }
                Ok(Some(Primitive::array(values)))
            }
            Expression::DictLit { entries, .. } => {
                let mut dict = DictValue::new();
                for (key_expr, value_expr) in entries {
                    let key = self.eval_value(key_expr, scope)?;
                    let value = self.eval_value(value_expr, scope)?;
                    dict.insert(key, value)
                        .map_err(|error| fail_runtime(error, key_expr.token()))?;
                }
                Ok(Some(Primitive::dict(dict)))
            }
            Expression::Index {
                object,
                index,
                token,
            } => {
                let container = self.eval_value(object, scope)?;
                let key = self.eval_value(index, scope)?;
                let value = container
                    .get_index(&key)
                    .map_err(|error| fail_runtime(error, token))?;
                Ok(Some(value))
            }
            Expression::Slice {
                object,
                start,
                end,
                step,
                token,
            } => {
                let container = self.eval_value(object, scope)?;
                let start = self.eval_slice_part(start, scope)?;
                let end = self.eval_slice_part(end, scope)?;
                let step = self.eval_slice_part(step, scope)?;
                let value = container
                    .slice(start, end, step)
                    .map_err(|error| fail_runtime(error, token))?;
                Ok(Some(value))
            }
            Expression::Path {
                object,
                member,
                token,
            } => {
                let module = self.resolve_module(object)?;
                let globals = self.modules.get(module).globals;
                match self.scopes.get(globals, member) {
                    Some(value) => Ok(Some(value.clone())),
                    None => Err(fail(
                        EvalErrorKind::UndefinedMember {
                            module: self.modules.get(module).name.clone(),
                            name: member.clone(),
                        },
                        token,
                    )),
                }
            }
            Expression::Call {
                callee,
                args,
                named,
                token,
            } => {
                let mut positional = Vec::with_capacity(args.len());
                for arg in args {
                    positional.push(self.eval_value(arg, scope)?);
                }
                let mut named_values = Vec::with_capacity(named.len());
                for (name, arg) in named {
                    named_values.push((name.clone(), self.eval_value(arg, scope)?));
                }
                match &**callee {
                    Expression::Variable { name, .. } => {
                        self.call(self.module, name, positional, named_values, token)
                    }
                    Expression::Path { object, member, .. } => {
                        let module = self.resolve_module(object)?;
                        self.call(module, member, positional, named_values, token)
                    }
                    other => Err(fail(
                        EvalErrorKind::NotCallable {
                            name: other.token().literal.clone(),
                        },
                        other.token(),
                    )),
                }
            }
            Expression::Return { value, token } => {
                let value = match value {
                    Some(value) => Some(self.eval_value(value, scope)?),
                    None => None,
                };
                Err(Flow::Return(value, token.clone()))
            }
            Expression::Break { token } => Err(Flow::Break(token.clone())),
            Expression::Continue { token } => Err(Flow::Continue(token.clone())),
            Expression::Assert { condition, token } => {
                if self.eval_value(condition, scope)?.is_truthy() {
                    Ok(None)
                } else {
                    Err(fail(EvalErrorKind::AssertionFailed, token))
                }
            }
            Expression::Let { name, value, token } => {
                let value = self.eval_value(value, scope)?;
                if !self.scopes.set(scope, name, value) {
                    return Err(fail(
                        EvalErrorKind::ReadOnlyBinding { name: name.clone() },
                        token,
                    ));
                }
                Ok(None)
            }
            Expression::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                if self.eval_value(condition, scope)?.is_truthy() {
                    self.eval_block(consequence, scope)
                } else if let Some(alternative) = alternative {
                    self.eval_block(alternative, scope)
                } else {
                    Ok(None)
                }
            }
            Expression::While {
                condition, body, ..
            } => {
                let mark = self.scopes.mark();
                let frame = self.scopes.push(Some(scope));
                let result = self.run_while(condition, body, frame);
                self.scopes.truncate(mark);
                result.map(|_| None)
            }
            Expression::For {
                init,
                condition,
                increment,
                body,
                ..
            } => {
                let mark = self.scopes.mark();
                let frame = self.scopes.push(Some(scope));
                let result = self.run_for(init, condition, increment, body, frame);
                self.scopes.truncate(mark);
                result.map(|_| None)
            }
            Expression::ForEach {
                binding,
                iterable,
                body,
                token,
            } => {
                let iterable = self.eval_value(iterable, scope)?;
                let elements = iterable
                    .elements()
                    .map_err(|error| fail_runtime(error, token))?;
                self.run_foreach(binding, elements, body, scope)?;
                Ok(None)
            }
            Expression::ListComp {
                element, clauses, ..
            } => {
                let mut items = Vec::new();
                self.run_comp(clauses, scope, &mut CompBody::List {
                    element,
                    items: &mut items,
                })?;
                Ok(Some(Primitive::array(items)))
            }
            Expression::DictComp {
                key,
                value,
                clauses,
                ..
            } => {
                let mut map = DictValue::new();
                self.run_comp(clauses, scope, &mut CompBody::Dict {
                    key,
                    value,
                    map: &mut map,
                })?;
                Ok(Some(Primitive::dict(map)))
            }
            Expression::Import {
                segments,
                alias,
                token,
            } => {
                let id = self.load_module(segments, token)?;
                let local = alias
                    .clone()
                    .unwrap_or_else(|| segments.last().expect("segments are non-empty").clone());
                self.modules
                    .get_mut(self.module)
                    .children
                    .insert(local, id);
                Ok(None)
            }
            Expression::FromImport {
                segments,
                symbols,
                token,
            } => {
                let id = self.load_module(segments, token)?;
                for (name, alias) in symbols {
                    let local = alias.clone().unwrap_or_else(|| name.clone());
                    self.copy_symbol(id, name, local, token)?;
                }
                Ok(None)
            }
            Expression::Script { .. } => self.eval_block(expr, scope),
            // Declarations are registered before evaluation and never appear
            // in statement position.
            Expression::FunctionDef { .. } | Expression::Parameter { .. } => Ok(None),
        }
    }

    fn eval_slice_part(
        &mut self,
        part: &Option<Box<Expression>>,
        scope: ScopeId,
    ) -> Result<Option<i64>, Flow> {
        let Some(part) = part else {
            return Ok(None);
        };
        let value = self.eval_value(part, scope)?;
        let index = index_value(&value).map_err(|error| fail_runtime(error, part.token()))?;
        Ok(Some(index))
    }

    fn eval_assign(
        &mut self,
        target: &Expression,
        op: Option<BinaryOp>,
        value: &Expression,
        scope: ScopeId,
        token: &Token,
    ) -> Result<(), Flow> {
        let mut new_value = self.eval_value(value, scope)?;
        match target {
            Expression::Variable { name, .. } => {
                if let Some(op) = op {
                    let current = match self.scopes.get(scope, name) {
                        Some(current) => current.clone(),
                        None => {
                            return Err(fail(
                                EvalErrorKind::UndefinedVariable { name: name.clone() },
                                target.token(),
                            ));
                        }
                    };
                    new_value = apply_binary(op, &current, &new_value)
                        .map_err(|error| fail_runtime(error, token))?;
                }
                if !self.scopes.set(scope, name, new_value) {
                    return Err(fail(
                        EvalErrorKind::ReadOnlyBinding { name: name.clone() },
                        token,
                    ));
                }
                Ok(())
            }
            Expression::Index { object, index, .. } => {
                let container = self.eval_value(object, scope)?;
                let key = self.eval_value(index, scope)?;
                if let Some(op) = op {
                    let current = container
                        .get_index(&key)
                        .map_err(|error| fail_runtime(error, token))?;
                    new_value = apply_binary(op, &current, &new_value)
                        .map_err(|error| fail_runtime(error, token))?;
                }
                container
                    .set_index(&key, new_value)
                    .map_err(|error| fail_runtime(error, token))?;
                Ok(())
            }
            // The parser rejects other targets already.
            other => Err(fail(EvalErrorKind::NoValue, other.token())),
        }
    }

    /// Evaluate a `{ ... }` block in a fresh child frame. Non-block nodes
    /// (ternary arms, else-if chains) evaluate in the current frame.
    fn eval_block(
        &mut self,
        block: &Expression,
        parent: ScopeId,
    ) -> Result<Option<Primitive>, Flow> {
        let Expression::Script { statements, .. } = block else {
            return self.eval(block, parent);
        };
        let mark = self.scopes.mark();
        let frame = self.scopes.push(Some(parent));
        let mut result = Ok(None);
        for statement in statements {
            match self.eval(statement, frame) {
                Ok(value) => result = Ok(value),
                Err(flow) => {
                    result = Err(flow);
                    break;
                }
            }
        }
        self.scopes.truncate(mark);
        result
    }

    fn run_while(
        &mut self,
        condition: &Expression,
        body: &Expression,
        frame: ScopeId,
    ) -> Result<(), Flow> {
        loop {
            if !self.eval_value(condition, frame)?.is_truthy() {
                return Ok(());
            }
            match self.eval_block(body, frame) {
                Ok(_) | Err(Flow::Continue(_)) => {}
                Err(Flow::Break(_)) => return Ok(()),
                Err(flow) => return Err(flow),
            }
        }
    }

    fn run_for(
        &mut self,
        init: &Expression,
        condition: &Expression,
        increment: &Expression,
        body: &Expression,
        frame: ScopeId,
    ) -> Result<(), Flow> {
        self.eval(init, frame)?;
        loop {
            if !self.eval_value(condition, frame)?.is_truthy() {
                return Ok(());
            }
            match self.eval_block(body, frame) {
                // The increment below still runs on `continue`.
                Ok(_) | Err(Flow::Continue(_)) => {}
                Err(Flow::Break(_)) => return Ok(()),
                Err(flow) => return Err(flow),
            }
            self.eval(increment, frame)?;
        }
    }

    fn run_foreach(
        &mut self,
        binding: &str,
        elements: Vec<Primitive>,
        body: &Expression,
        scope: ScopeId,
    ) -> Result<(), Flow> {
        for element in elements {
            let mark = self.scopes.mark();
            let frame = self.scopes.push(Some(scope));
            self.scopes.set(frame, binding, element);
            let outcome = self.eval_block(body, frame);
            self.scopes.truncate(mark);
            match outcome {
                Ok(_) | Err(Flow::Continue(_)) => {}
                Err(Flow::Break(_)) => return Ok(()),
                Err(flow) => return Err(flow),
            }
        }
        Ok(())
    }

    /// Recursive clause descent: the first clause drives the outermost loop,
    /// each nested clause re-runs for every outer binding. Filters skip only
    /// the current binding.
    fn run_comp(
        &mut self,
        clauses: &[CompClause],
        scope: ScopeId,
        body: &mut CompBody,
    ) -> Result<(), Flow> {
        let Some((clause, rest)) = clauses.split_first() else {
            return match body {
                CompBody::List { element, items } => {
                    let value = self.eval_value(element, scope)?;
                    items.push(value);
                    Ok(())
                }
                CompBody::Dict { key, value, map } => {
                    let key_value = self.eval_value(key, scope)?;
                    let value_value = self.eval_value(value, scope)?;
                    map.insert(key_value, value_value)
                        .map_err(|error| fail_runtime(error, key.token()))?;
                    Ok(())
                }
            };
        };
        let iterable = self.eval_value(&clause.iterable, scope)?;
        let elements = iterable
            .elements()
            .map_err(|error| fail_runtime(error, &clause.token))?;
        'bindings: for element in elements {
            let mark = self.scopes.mark();
            let frame = self.scopes.push(Some(scope));
            self.scopes.set(frame, &clause.binding, element);
            for filter in &clause.filters {
                match self.eval_value(filter, frame) {
                    Ok(keep) if keep.is_truthy() => {}
                    Ok(_) => {
                        self.scopes.truncate(mark);
                        continue 'bindings;
                    }
                    Err(flow) => {
                        self.scopes.truncate(mark);
                        return Err(flow);
                    }
                }
            }
            let outcome = self.run_comp(rest, frame, body);
            self.scopes.truncate(mark);
            outcome?;
        }
        Ok(())
    }

    fn resolve_module(&self, expr: &Expression) -> Result<ModuleId, Flow> {
        match expr {
            Expression::Variable { name, token } => self
                .modules
                .get(self.module)
                .children
                .get(name)
                .copied()
                .ok_or_else(|| {
                    fail(EvalErrorKind::UndefinedModule { name: name.clone() }, token)
                }),
            Expression::Path {
                object,
                member,
                token,
            } => {
                let parent = self.resolve_module(object)?;
                self.modules
                    .get(parent)
                    .children
                    .get(member)
                    .copied()
                    .ok_or_else(|| {
                        fail(
                            EvalErrorKind::UndefinedModule {
                                name: member.clone(),
                            },
                            token,
                        )
                    })
            }
            other => Err(fail(
                EvalErrorKind::UndefinedModule {
                    name: other.token().literal.clone(),
                },
                other.token(),
            )),
        }
    }

    fn call(
        &mut self,
        module: ModuleId,
        name: &str,
        positional: Vec<Primitive>,
        named: Vec<(String, Primitive)>,
        token: &Token,
    ) -> Result<Option<Primitive>, Flow> {
        if let Some(callable) = self.modules.get(module).functions.get(name).cloned() {
            return self.call_function(&callable, positional, named, token);
        }
        if let Some(builtin) = self.modules.get(module).builtins.get(name).copied() {
            return self.call_builtin(builtin, positional, named, token);
        }
        if self.modules.get(module).children.contains_key(name) {
            return Err(fail(
                EvalErrorKind::NotCallable {
                    name: name.to_string(),
                },
                token,
            ));
        }
        Err(fail(
            EvalErrorKind::UndefinedFunction {
                name: name.to_string(),
            },
            token,
        ))
    }

    fn call_function(
        &mut self,
        callable: &Callable,
        positional: Vec<Primitive>,
        named: Vec<(String, Primitive)>,
        token: &Token,
    ) -> Result<Option<Primitive>, Flow> {
        let Expression::FunctionDef {
            name, params, body, ..
        } = &*callable.def
        else {
            return Err(fail(
                EvalErrorKind::NotCallable {
                    name: token.literal.clone(),
                },
                token,
            ));
        };
        // Lexical module scoping: the frame hangs off the defining module's
        // globals, never the caller's frame.
        let globals = self.modules.get(callable.module).globals;
        let mark = self.scopes.mark();
        let frame = self.scopes.push(Some(globals));
        let caller = std::mem::replace(&mut self.module, callable.module);
        let outcome = self.bind_and_run(name, params, body, frame, positional, named, token);
        self.module = caller;
        self.scopes.truncate(mark);
        match outcome {
            Ok(_) => Ok(None),
            Err(Flow::Return(value, _)) => Ok(value),
            Err(Flow::Break(token)) => Err(Flow::Error(stray("break", &token))),
            Err(Flow::Continue(token)) => Err(Flow::Error(stray("continue", &token))),
            Err(flow) => Err(flow),
        }
    }

    fn bind_and_run(
        &mut self,
        name: &str,
        params: &[Expression],
        body: &Expression,
        frame: ScopeId,
        positional: Vec<Primitive>,
        named: Vec<(String, Primitive)>,
        token: &Token,
    ) -> Result<Option<Primitive>, Flow> {
        if positional.len() > params.len() {
            return Err(fail(
                EvalErrorKind::ArityMismatch {
                    name: name.to_string(),
                    expected: params.len(),
                    got: positional.len(),
                },
                token,
            ));
        }
        let mut bound = vec![false; params.len()];
        for (slot, value) in positional.into_iter().enumerate() {
            if let Expression::Parameter { name: param, .. } = &params[slot] {
                self.scopes.set(frame, param, value);
                bound[slot] = true;
            }
        }
        for (arg_name, value) in named {
            let found = params.iter().position(
                |param| matches!(param, Expression::Parameter { name, .. } if *name == arg_name),
            );
            let Some(slot) = found else {
                return Err(fail(
                    EvalErrorKind::UnknownParameter {
                        name: name.to_string(),
                        param: arg_name,
                    },
                    token,
                ));
            };
            if bound[slot] {
                return Err(fail(
                    EvalErrorKind::DuplicateArgument {
                        name: name.to_string(),
                        param: arg_name,
                    },
                    token,
                ));
            }
            if let Expression::Parameter { name: param, .. } = &params[slot] {
                self.scopes.set(frame, param, value);
                bound[slot] = true;
            }
        }
        for (slot, param) in params.iter().enumerate() {
            if bound[slot] {
                continue;
            }
            let Expression::Parameter {
                name: param_name,
                default,
                ..
            } = param
            else {
                continue;
            };
            let Some(default) = default else {
                return Err(fail(
                    EvalErrorKind::MissingArgument {
                        name: name.to_string(),
                        param: param_name.clone(),
                    },
                    token,
                ));
            };
            // Defaults evaluate in the callee's fresh frame, so earlier
            // parameters are already visible to them.
            let value = self.eval_value(default, frame)?;
            self.scopes.set(frame, param_name, value);
        }
        self.eval_block(body, frame)
    }

    fn call_builtin(
        &mut self,
        builtin: &'static Builtin,
        positional: Vec<Primitive>,
        named: Vec<(String, Primitive)>,
        token: &Token,
    ) -> Result<Option<Primitive>, Flow> {
        if let Some((param, _)) = named.first() {
            return Err(fail(
                EvalErrorKind::UnknownParameter {
                    name: builtin.name.to_string(),
                    param: param.clone(),
                },
                token,
            ));
        }
        let mut context = CallContext {
            output: &mut self.output,
        };
        (builtin.handler)(&mut context, &positional)
            .map_err(|error| fail_runtime(error, token))
    }

    fn load_module(&mut self, segments: &[String], token: &Token) -> Result<ModuleId, Flow> {
        let dotted = segments.join(".");
        if let Some(id) = self.modules.cached(&dotted) {
            return Ok(id);
        }
        if segments.len() == 1
            && let Some(table) = builtins::module(&segments[0])
        {
            let globals = self.scopes.push_persistent(None);
            let id = self.modules.insert(Module {
                name: dotted.clone(),
                functions: FxHashMap::default(),
                builtins: table,
                children: FxHashMap::default(),
                globals,
            });
            self.modules.cache(dotted, id);
            return Ok(id);
        }

        let path = module_path(&self.config.module_root, segments);
        let display = path.display().to_string();
        let source = std::fs::read_to_string(&path).map_err(|error| {
            fail(
                EvalErrorKind::ImportFailed {
                    path: display.clone(),
                    cause: error.to_string(),
                },
                token,
            )
        })?;
        let script = parser::parse(&source).map_err(|error| {
            fail(
                EvalErrorKind::ImportFailed {
                    path: display.clone(),
                    cause: error.to_string(),
                },
                token,
            )
        })?;
        let Expression::Script {
            statements,
            functions,
            ..
        } = &script
        else {
            unreachable!("parse always yields a script");
        };

        let globals = self.scopes.push_persistent(None);
        let id = self.modules.insert(Module {
            name: dotted.clone(),
            functions: FxHashMap::default(),
            builtins: builtins::globals(),
            children: FxHashMap::default(),
            globals,
        });
        // Cache before evaluating the body so import cycles terminate.
        self.modules.cache(dotted, id);
        self.register_functions(id, functions);

        let caller = std::mem::replace(&mut self.module, id);
        let mut outcome = Ok(());
        for statement in statements {
            match self.eval(statement, globals) {
                Ok(_) => {}
                Err(Flow::Return(..)) => break,
                Err(Flow::Break(token)) => {
                    outcome = Err(Flow::Error(stray("break", &token)));
                    break;
                }
                Err(Flow::Continue(token)) => {
                    outcome = Err(Flow::Error(stray("continue", &token)));
                    break;
                }
                Err(flow) => {
                    outcome = Err(flow);
                    break;
                }
            }
        }
        self.module = caller;
        outcome?;
        Ok(id)
    }

    fn copy_symbol(
        &mut self,
        from: ModuleId,
        name: &str,
        local: String,
        token: &Token,
    ) -> Result<(), Flow> {
        if let Some(callable) = self.modules.get(from).functions.get(name).cloned() {
            self.modules
                .get_mut(self.module)
                .functions
                .insert(local, callable);
            return Ok(());
        }
        if let Some(builtin) = self.modules.get(from).builtins.get(name).copied() {
            self.modules
                .get_mut(self.module)
                .builtins
                .insert(local, builtin);
            return Ok(());
        }
        if let Some(child) = self.modules.get(from).children.get(name).copied() {
            self.modules
                .get_mut(self.module)
                .children
                .insert(local, child);
            return Ok(());
        }
        Err(fail(
            EvalErrorKind::UndefinedMember {
                module: self.modules.get(from).name.clone(),
                name: name.to_string(),
            },
            token,
        ))
    }
}

enum CompBody<'a> {
    List {
        element: &'a Expression,
        items: &'a mut Vec<Primitive>,
    },
    Dict {
        key: &'a Expression,
        value: &'a Expression,
        map: &'a mut DictValue,
    },
}

fn apply_binary(
    op: BinaryOp,
    left: &Primitive,
    right: &Primitive,
) -> Result<Primitive, RuntimeError> {
    let value = match op {
        BinaryOp::Add => left.add(right)?,
        BinaryOp::Sub => left.sub(right)?,
        BinaryOp::Mul => left.mul(right)?,
        BinaryOp::Div => left.div(right)?,
        BinaryOp::Rem => left.rem(right)?,
        BinaryOp::Pow => left.pow(right)?,
        // Both sides are always evaluated; no short circuit.
        BinaryOp::And => Primitive::Boolean(left.is_truthy() && right.is_truthy()),
        BinaryOp::Or => Primitive::Boolean(left.is_truthy() || right.is_truthy()),
        BinaryOp::Eq => Primitive::Boolean(left.equals(right)?),
        BinaryOp::NotEq => Primitive::Boolean(!left.equals(right)?),
        BinaryOp::Lt => Primitive::Boolean(left.compare(right)? == Ordering::Less),
        BinaryOp::Le => Primitive::Boolean(left.compare(right)? != Ordering::Greater),
        BinaryOp::Gt => Primitive::Boolean(left.compare(right)? == Ordering::Greater),
        BinaryOp::Ge => Primitive::Boolean(left.compare(right)? != Ordering::Less),
        BinaryOp::BitAnd => left.bitand(right)?,
        BinaryOp::BitOr => left.bitor(right)?,
        BinaryOp::BitXor => left.bitxor(right)?,
        BinaryOp::Shl => left.shl(right)?,
        BinaryOp::Shr => left.shr(right)?,
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn run(source: &str) -> (Result<Option<Primitive>, EvalError>, Vec<String>) {
        let script = parser::parse(source).expect("parse should succeed");
        let mut interp = Interp::new(InterpConfig::default());
        let result = interp.run(&script);
        let output = interp.take_output();
        (result, output)
    }

    fn value_of(source: &str) -> Primitive {
        let (result, _) = run(source);
        result
            .expect("script should succeed")
            .expect("script should produce a value")
    }

    fn output_of(source: &str) -> Vec<String> {
        let (result, output) = run(source);
        result.expect("script should succeed");
        output
    }

    fn error_of(source: &str) -> EvalError {
        let (result, _) = run(source);
        result.expect_err("script should fail")
    }

    #[test]
    fn literals_round_trip() {
        assert_eq!(value_of("return 0x1A"), Primitive::Integer(26));
        assert_eq!(value_of("return 1_000"), Primitive::Integer(1000));
        assert_eq!(value_of("return 1.5"), Primitive::Double(1.5));
        assert_eq!(value_of("return \"s\""), Primitive::string("s"));
        assert_eq!(value_of("return true"), Primitive::Boolean(true));
    }

    #[test]
    fn precedence_drives_evaluation() {
        assert_eq!(value_of("return 1 + 2 * 3"), Primitive::Integer(7));
        assert_eq!(value_of("return (1 + 2) * 3"), Primitive::Integer(9));
        // `**` folds left-to-right, not mathematically right-associative.
        assert_eq!(value_of("return 2 ** 3 ** 2"), Primitive::Integer(64));
    }

    #[test]
    fn logical_operators_evaluate_both_sides() {
        assert_eq!(value_of("return 1 && 0"), Primitive::Boolean(false));
        assert_eq!(value_of("return 0 || 'x'"), Primitive::Boolean(true));
        let error = error_of("return true || missing()");
        assert!(matches!(
            error.kind,
            EvalErrorKind::UndefinedFunction { .. }
        ));
    }

    #[test]
    fn string_arithmetic_follows_the_coercion_table() {
        assert_eq!(value_of("return 1 + 'x'"), Primitive::string("1x"));
        assert_eq!(value_of("return 'ab' * 3"), Primitive::string("ababab"));
        assert_eq!(value_of("return 'budlang' - 4"), Primitive::string("bud"));
        assert_eq!(value_of("return 'abcdef' / 2"), Primitive::string("abc"));
    }

    #[test]
    fn capability_errors_are_typed() {
        let error = error_of("return true + 1");
        assert_eq!(
            error.kind,
            EvalErrorKind::Runtime(RuntimeError::UnsupportedOperation {
                type_name: "boolean",
                operation: "add"
            })
        );
        let error = error_of("return 1 < 'a'");
        assert!(matches!(
            error.kind,
            EvalErrorKind::Runtime(RuntimeError::IncompatibleOperands { .. })
        ));
        let error = error_of("return 1 == 1.0");
        assert!(matches!(
            error.kind,
            EvalErrorKind::Runtime(RuntimeError::IncompatibleOperands { .. })
        ));
    }

    #[test]
    fn branch_assignment_shadows_the_outer_binding() {
        let source = indoc! {"
            let x = 1
            if (true) {
                x = 2
            }
            return x
        "};
        assert_eq!(value_of(source), Primitive::Integer(1));
    }

    #[test]
    fn loop_body_bindings_do_not_escape() {
        let source = indoc! {"
            let hits = [0]
            while (hits[0] < 3) {
                hits[0] += 1
                let inside = 1
            }
            return inside
        "};
        let error = error_of(source);
        assert_eq!(
            error.kind,
            EvalErrorKind::UndefinedVariable {
                name: "inside".to_string()
            }
        );
    }

    #[test]
    fn c_for_continue_still_runs_the_increment() {
        let source = indoc! {"
            let hits = [0]
            for (i = 0; i < 3; i += 1) {
                if (i == 1) {
                    continue
                }
                hits[0] += 1
            }
            return hits[0]
        "};
        assert_eq!(value_of(source), Primitive::Integer(2));
    }

    #[test]
    fn break_terminates_only_the_nearest_loop() {
        let source = indoc! {"
            let state = [0, 0]
            for (i = 0; i < 3; i += 1) {
                for (j = 0; j < 10; j += 1) {
                    if (j == 1) {
                        break
                    }
                    state[0] += 1
                }
                state[1] += 1
            }
            return state
        "};
        assert_eq!(
            value_of(source),
            Primitive::array(vec![Primitive::Integer(3), Primitive::Integer(3)])
        );
    }

    #[test]
    fn stray_control_flow_is_reported_not_panicked() {
        let error = error_of("break");
        assert_eq!(
            error.kind,
            EvalErrorKind::StrayControlFlow { keyword: "break" }
        );
    }

    #[test]
    fn defaults_and_named_arguments_bind_in_order() {
        let prelude = indoc! {"
            def f(a, b = 2) {
                return a + b
            }
        "};
        assert_eq!(
            value_of(&format!("{prelude}return f(1)")),
            Primitive::Integer(3)
        );
        assert_eq!(
            value_of(&format!("{prelude}return f(1, b = 5)")),
            Primitive::Integer(6)
        );
        let error = error_of(&format!("{prelude}return f(b = 5)"));
        assert!(matches!(error.kind, EvalErrorKind::MissingArgument { .. }));
        let error = error_of(&format!("{prelude}return f(1, 2, 3)"));
        assert!(matches!(error.kind, EvalErrorKind::ArityMismatch { .. }));
        let error = error_of(&format!("{prelude}return f(1, a = 2)"));
        assert!(matches!(error.kind, EvalErrorKind::DuplicateArgument { .. }));
        let error = error_of(&format!("{prelude}return f(1, c = 2)"));
        assert!(matches!(error.kind, EvalErrorKind::UnknownParameter { .. }));
    }

    #[test]
    fn defaults_see_earlier_parameters() {
        let source = indoc! {"
            def pad(text, width = len(text) + 2) {
                return width
            }
            return pad('abc')
        "};
        assert_eq!(value_of(source), Primitive::Integer(5));
    }

    #[test]
    fn callees_do_not_see_caller_locals() {
        let source = indoc! {"
            def helper() {
                return secret
            }
            def caller() {
                let secret = 1
                return helper()
            }
            return caller()
        "};
        let error = error_of(source);
        assert_eq!(
            error.kind,
            EvalErrorKind::UndefinedVariable {
                name: "secret".to_string()
            }
        );
    }

    #[test]
    fn callees_see_their_module_globals() {
        let source = indoc! {"
            def double_it() {
                return base * 2
            }
            let base = 21
            return double_it()
        "};
        assert_eq!(value_of(source), Primitive::Integer(42));
    }

    #[test]
    fn recursion_works_until_the_depth_limit() {
        let source = indoc! {"
            def fact(n) {
                if (n <= 1) {
                    return 1
                }
                return n * fact(n - 1)
            }
            return fact(10)
        "};
        assert_eq!(value_of(source), Primitive::Integer(3628800));

        let source = indoc! {"
            def forever() {
                return forever()
            }
            return forever()
        "};
        let error = error_of(source);
        assert!(matches!(error.kind, EvalErrorKind::DepthExceeded { .. }));
    }

    #[test]
    fn depth_guard_fires_inside_a_small_thread_stack() {
        // Hosts routinely run scripts on 2 MiB worker threads; the default
        // limit must report the error instead of exhausting that stack.
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let source = indoc! {"
                    def forever() {
                        return forever()
                    }
                    return forever()
                "};
                let script = parser::parse(source).expect("parse should succeed");
                let mut interp = Interp::new(InterpConfig::default());
                interp
                    .run(&script)
                    .expect_err("runaway recursion should fail")
            })
            .expect("thread spawns");
        let error = handle.join().expect("the guard must fire before overflow");
        assert_eq!(
            error.kind,
            EvalErrorKind::DepthExceeded { limit: 256 }
        );
    }

    #[test]
    fn comprehensions_filter_and_nest() {
        assert_eq!(
            value_of("return [x * 2 for x in [1, 2, 3] if x > 1]"),
            Primitive::array(vec![Primitive::Integer(4), Primitive::Integer(6)])
        );
        assert_eq!(
            value_of("return [x + y for x in [0, 10] for y in [1, 2]]"),
            Primitive::array(vec![
                Primitive::Integer(1),
                Primitive::Integer(2),
                Primitive::Integer(11),
                Primitive::Integer(12),
            ])
        );
        let mut expected = DictValue::new();
        expected
            .insert(Primitive::Integer(1), Primitive::Integer(1))
            .expect("insert works");
        expected
            .insert(Primitive::Integer(2), Primitive::Integer(4))
            .expect("insert works");
        assert_eq!(
            value_of("return {k: k * k for k in [1, 2]}"),
            Primitive::dict(expected)
        );
    }

    #[test]
    fn foreach_walks_arrays_and_dict_keys() {
        let source = indoc! {"
            let count = [0]
            for (k in {'a': 1, 'b': 2}) {
                count[0] += 1
            }
            return count[0]
        "};
        assert_eq!(value_of(source), Primitive::Integer(2));

        let error = error_of("for (x in 5) {\nprint(x)\n}");
        assert!(matches!(
            error.kind,
            EvalErrorKind::Runtime(RuntimeError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn ternary_selects_an_arm() {
        assert_eq!(
            value_of("return 1 > 0 ? 'pos' : 'neg'"),
            Primitive::string("pos")
        );
    }

    #[test]
    fn assert_checks_truthiness() {
        let (result, _) = run("assert 1 == 1");
        result.expect("passing assert is silent");
        let error = error_of("assert 1 == 2");
        assert_eq!(error.kind, EvalErrorKind::AssertionFailed);
    }

    #[test]
    fn builtins_print_len_str_type() {
        let source = indoc! {"
            print('a', 1)
            print(len([1, 2, 3]))
            print(type(1.5))
            print(str(42) + '!')
        "};
        assert_eq!(output_of(source), vec!["a 1", "3", "double", "42!"]);
    }

    #[test]
    fn print_produces_no_value() {
        let error = error_of("let x = print(1)");
        assert_eq!(error.kind, EvalErrorKind::NoValue);
    }

    #[test]
    fn builtin_module_math_is_importable() {
        let source = indoc! {"
            import math
            return math.abs(-5)
        "};
        assert_eq!(value_of(source), Primitive::Integer(5));

        let source = indoc! {"
            from math import max as biggest
            return biggest(1, 7, 3)
        "};
        assert_eq!(value_of(source), Primitive::Integer(7));
    }

    #[test]
    fn named_arguments_are_rejected_for_builtins() {
        let error = error_of("return len(value = [1])");
        assert!(matches!(error.kind, EvalErrorKind::UnknownParameter { .. }));
    }

    #[test]
    fn imports_file_modules_with_their_own_globals() {
        let dir = tempfile::tempdir().expect("tempdir works");
        std::fs::write(
            dir.path().join("util.bud"),
            indoc! {"
                let factor = 3
                def scale(n) {
                    return n * factor
                }
            "},
        )
        .expect("module file is written");

        let source = indoc! {"
            import util
            let factor = 100
            print(util.scale(2))
            print(util.factor)
        "};
        let script = parser::parse(source).expect("parse should succeed");
        let mut interp = Interp::new(InterpConfig {
            module_root: dir.path().to_path_buf(),
            ..Default::default()
        });
        interp.run(&script).expect("script should succeed");
        assert_eq!(interp.output(), ["6", "3"]);
    }

    #[test]
    fn from_import_keeps_the_defining_module_scope() {
        let dir = tempfile::tempdir().expect("tempdir works");
        std::fs::write(
            dir.path().join("util.bud"),
            indoc! {"
                let factor = 3
                def scale(n) {
                    return n * factor
                }
            "},
        )
        .expect("module file is written");

        let source = indoc! {"
            from util import scale
            return scale(2)
        "};
        let script = parser::parse(source).expect("parse should succeed");
        let mut interp = Interp::new(InterpConfig {
            module_root: dir.path().to_path_buf(),
            ..Default::default()
        });
        let result = interp.run(&script).expect("script should succeed");
        assert_eq!(result, Some(Primitive::Integer(6)));
    }

    #[test]
    fn missing_module_reports_the_cause() {
        let error = error_of("import nowhere");
        assert!(matches!(error.kind, EvalErrorKind::ImportFailed { .. }));
    }

    #[test]
    fn slices_and_negative_indices() {
        assert_eq!(
            value_of("return [1, 2, 3, 4][1:3]"),
            Primitive::array(vec![Primitive::Integer(2), Primitive::Integer(3)])
        );
        assert_eq!(value_of("return 'abcdef'[::-1]"), Primitive::string("fedcba"));
        assert_eq!(value_of("return [1, 2, 3][-1]"), Primitive::Integer(3));
        let error = error_of("return [1, 2][5]");
        assert!(matches!(
            error.kind,
            EvalErrorKind::Runtime(RuntimeError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn dict_access_and_aliasing() {
        let source = indoc! {"
            let d = {'a': 1}
            let alias = d
            alias['b'] = 2
            return d['b']
        "};
        assert_eq!(value_of(source), Primitive::Integer(2));

        let error = error_of("return {'a': 1}['b']");
        assert!(matches!(
            error.kind,
            EvalErrorKind::Runtime(RuntimeError::MissingKey { .. })
        ));
        let error = error_of("return {[1]: 2}");
        assert!(matches!(
            error.kind,
            EvalErrorKind::Runtime(RuntimeError::UnhashableKey { .. })
        ));
    }

    #[test]
    fn compound_assignment_reads_then_writes() {
        let source = indoc! {"
            let xs = [1, 2]
            xs[1] <<= 3
            return xs[1]
        "};
        assert_eq!(value_of(source), Primitive::Integer(16));

        let error = error_of("missing += 1");
        assert!(matches!(
            error.kind,
            EvalErrorKind::UndefinedVariable { .. }
        ));
    }

    #[test]
    fn read_only_host_bindings_refuse_assignment() {
        let script = parser::parse("version = '2.0'").expect("parse should succeed");
        let mut interp = Interp::new(InterpConfig::default());
        interp.define_read_only("version", Primitive::string("1.0"));
        let error = interp.run(&script).expect_err("assignment should fail");
        assert_eq!(
            error.kind,
            EvalErrorKind::ReadOnlyBinding {
                name: "version".to_string()
            }
        );
    }
}
