//! Rewrite passes over the syntax tree.
//!
//! A pass sees every node exactly once in post-order: children are rebuilt
//! first, then the parent is handed to `Pass::rewrite`, which may return the
//! node unchanged or substitute a new one. Diagnostics accumulate inside the
//! pass and are drained once the walk finishes.

use crate::ast::{CompClause, Expression};
use crate::token::Token;

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub token: Token,
    pub message: String,
}

pub trait Pass {
    /// Rewrite one node. Children have already been rewritten.
    fn rewrite(&mut self, expr: Expression) -> Expression;

    /// Drain the diagnostics collected during the walk.
    fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        Vec::new()
    }
}

/// Apply `pass` to a parsed script, post-order over the whole tree.
pub fn run_pass<P: Pass>(script: Expression, pass: &mut P) -> (Expression, Vec<Diagnostic>) {
    let rewritten = walk(script, pass);
    let diagnostics = pass.take_diagnostics();
    (rewritten, diagnostics)
}

fn walk<P: Pass>(expr: Expression, pass: &mut P) -> Expression {
    let rebuilt = match expr {
        leaf @ (Expression::IntegerLit { .. }
        | Expression::DoubleLit { .. }
        | Expression::BooleanLit { .. }
        | Expression::StringLit { .. }
        | Expression::Variable { .. }
        | Expression::Break { .. }
        | Expression::Continue { .. }
        | Expression::Import { .. }
        | Expression::FromImport { .. }) => leaf,
        Expression::Unary { op, operand, token } => Expression::Unary {
            op,
            operand: walk_box(operand, pass),
            token,
        },
        Expression::Binary {
            op,
            left,
            right,
            token,
        } => Expression::Binary {
            op,
            left: walk_box(left, pass),
            right: walk_box(right, pass),
            token,
        },
        Expression::Assign {
            target,
            op,
            value,
            token,
        } => Expression::Assign {
            target: walk_box(target, pass),
            op,
            value: walk_box(value, pass),
            token,
        },
        Expression::ArrayLit { elements, token } => Expression::ArrayLit {
            elements: walk_vec(elements, pass),
            token,
        },
        Expression::DictLit { entries, token } => Expression::DictLit {
            entries: entries
                .into_iter()
                .map(|(key, value)| (walk(key, pass), walk(value, pass)))
                .collect(),
            token,
        },
        Expression::Index {
            object,
            index,
            token,
        } => Expression::Index {
            object: walk_box(object, pass),
            index: walk_box(index, pass),
            token,
        },
        Expression::Slice {
            object,
            start,
            end,
            step,
            token,
        } => Expression::Slice {
            object: walk_box(object, pass),
            start: walk_opt(start, pass),
            end: walk_opt(end, pass),
            step: walk_opt(step, pass),
            token,
        },
        Expression::Path {
            object,
            member,
            token,
        } => Expression::Path {
            object: walk_box(object, pass),
            member,
            token,
        },
        Expression::Call {
            callee,
            args,
            named,
            token,
        } => Expression::Call {
            callee: walk_box(callee, pass),
            args: walk_vec(args, pass),
            named: named
                .into_iter()
                .map(|(name, value)| (name, walk(value, pass)))
                .collect(),
            token,
        },
        Expression::FunctionDef {
            name,
            params,
            body,
            token,
        } => Expression::FunctionDef {
            name,
            params: walk_vec(params, pass),
            body: walk_box(body, pass),
            token,
        },
        Expression::Parameter {
            name,
            default,
            token,
        } => Expression::Parameter {
            name,
            default: walk_opt(default, pass),
            token,
        },
        Expression::Return { value, token } => Expression::Return {
            value: walk_opt(value, pass),
            token,
        },
        Expression::Assert { condition, token } => Expression::Assert {
            condition: walk_box(condition, pass),
            token,
        },
        Expression::Let { name, value, token } => Expression::Let {
            name,
            value: walk_box(value, pass),
            token,
        },
        Expression::If {
            condition,
            consequence,
            alternative,
            token,
        } => Expression::If {
            condition: walk_box(condition, pass),
            consequence: walk_box(consequence, pass),
            alternative: walk_opt(alternative, pass),
            token,
        },
        Expression::While {
            condition,
            body,
            token,
        } => Expression::While {
            condition: walk_box(condition, pass),
            body: walk_box(body, pass),
            token,
        },
        Expression::For {
            init,
            condition,
            increment,
            body,
            token,
        } => Expression::For {
            init: walk_box(init, pass),
            condition: walk_box(condition, pass),
            increment: walk_box(increment, pass),
            body: walk_box(body, pass),
            token,
        },
        Expression::ForEach {
            binding,
            iterable,
            body,
            token,
        } => Expression::ForEach {
            binding,
            iterable: walk_box(iterable, pass),
            body: walk_box(body, pass),
            token,
        },
        Expression::ListComp {
            element,
            clauses,
            token,
        } => Expression::ListComp {
            element: walk_box(element, pass),
            clauses: walk_clauses(clauses, pass),
            token,
        },
        Expression::DictComp {
            key,
            value,
            clauses,
            token,
        } => Expression::DictComp {
            key: walk_box(key, pass),
            value: walk_box(value, pass),
            clauses: walk_clauses(clauses, pass),
            token,
        },
        Expression::Script {
            statements,
            functions,
            token,
        } => Expression::Script {
            statements: walk_vec(statements, pass),
            functions: functions
                .into_iter()
                .map(|(name, def)| (name, walk(def, pass)))
                .collect(),
            token,
        },
    };
    pass.rewrite(rebuilt)
}

fn walk_box<P: Pass>(expr: Box<Expression>, pass: &mut P) -> Box<Expression> {
    Box::new(walk(*expr, pass))
}

fn walk_opt<P: Pass>(expr: Option<Box<Expression>>, pass: &mut P) -> Option<Box<Expression>> {
    expr.map(|expr| walk_box(expr, pass))
}

fn walk_vec<P: Pass>(exprs: Vec<Expression>, pass: &mut P) -> Vec<Expression> {
    exprs.into_iter().map(|expr| walk(expr, pass)).collect()
}

fn walk_clauses<P: Pass>(clauses: Vec<CompClause>, pass: &mut P) -> Vec<CompClause> {
    clauses
        .into_iter()
        .map(|clause| CompClause {
            binding: clause.binding,
            iterable: walk(clause.iterable, pass),
            filters: walk_vec(clause.filters, pass),
            token: clause.token,
        })
        .collect()
}
