//! Syntax tree for bud programs.
//!
//! One closed enum covers every syntactic form, statements included, so the
//! evaluator and analysis passes are forced to handle new variants at compile
//! time. Every variant keeps the token that introduced it for diagnostics.

use rustc_hash::FxHashMap;

use crate::token::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    IntegerLit {
        value: i64,
        token: Token,
    },
    DoubleLit {
        value: f64,
        token: Token,
    },
    BooleanLit {
        value: bool,
        token: Token,
    },
    StringLit {
        value: String,
        token: Token,
    },
    Variable {
        name: String,
        token: Token,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
        token: Token,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
        token: Token,
    },
    /// `op` is `None` for plain `=` and the folded operator for `+=` family.
    Assign {
        target: Box<Expression>,
        op: Option<BinaryOp>,
        value: Box<Expression>,
        token: Token,
    },
    ArrayLit {
        elements: Vec<Expression>,
        token: Token,
    },
    DictLit {
        entries: Vec<(Expression, Expression)>,
        token: Token,
    },
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
        token: Token,
    },
    Slice {
        object: Box<Expression>,
        start: Option<Box<Expression>>,
        end: Option<Box<Expression>>,
        step: Option<Box<Expression>>,
        token: Token,
    },
    /// Dotted member access, e.g. `module.symbol`.
    Path {
        object: Box<Expression>,
        member: String,
        token: Token,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
        named: Vec<(String, Expression)>,
        token: Token,
    },
    FunctionDef {
        name: String,
        params: Vec<Expression>,
        body: Box<Expression>,
        token: Token,
    },
    Parameter {
        name: String,
        default: Option<Box<Expression>>,
        token: Token,
    },
    Return {
        value: Option<Box<Expression>>,
        token: Token,
    },
    Break {
        token: Token,
    },
    Continue {
        token: Token,
    },
    Assert {
        condition: Box<Expression>,
        token: Token,
    },
    Let {
        name: String,
        value: Box<Expression>,
        token: Token,
    },
    /// Covers both `if` statements and `cond ? a : b` expressions.
    If {
        condition: Box<Expression>,
        consequence: Box<Expression>,
        alternative: Option<Box<Expression>>,
        token: Token,
    },
    While {
        condition: Box<Expression>,
        body: Box<Expression>,
        token: Token,
    },
    For {
        init: Box<Expression>,
        condition: Box<Expression>,
        increment: Box<Expression>,
        body: Box<Expression>,
        token: Token,
    },
    ForEach {
        binding: String,
        iterable: Box<Expression>,
        body: Box<Expression>,
        token: Token,
    },
    ListComp {
        element: Box<Expression>,
        clauses: Vec<CompClause>,
        token: Token,
    },
    DictComp {
        key: Box<Expression>,
        value: Box<Expression>,
        clauses: Vec<CompClause>,
        token: Token,
    },
    Import {
        segments: Vec<String>,
        alias: Option<String>,
        token: Token,
    },
    FromImport {
        segments: Vec<String>,
        symbols: Vec<(String, Option<String>)>,
        token: Token,
    },
    /// Top-level script or `{ ... }` block. Nested blocks carry an empty
    /// function table; only the top level may declare functions.
    Script {
        statements: Vec<Expression>,
        functions: FxHashMap<String, Expression>,
        token: Token,
    },
}

/// One `for ident in iterable [if cond]*` segment of a comprehension.
#[derive(Debug, Clone, PartialEq)]
pub struct CompClause {
    pub binding: String,
    pub iterable: Expression,
    pub filters: Vec<Expression>,
    pub token: Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl Expression {
    /// The token that introduced this node, for diagnostics.
    pub fn token(&self) -> &Token {
        match self {
            Expression::IntegerLit { token, .. }
            | Expression::DoubleLit { token, .. }
            | Expression::BooleanLit { token, .. }
            | Expression::StringLit { token, .. }
            | Expression::Variable { token, .. }
            | Expression::Unary { token, .. }
            | Expression::Binary { token, .. }
            | Expression::Assign { token, .. }
            | Expression::ArrayLit { token, .. }
            | Expression::DictLit { token, .. }
            | Expression::Index { token, .. }
            | Expression::Slice { token, .. }
            | Expression::Path { token, .. }
            | Expression::Call { token, .. }
            | Expression::FunctionDef { token, .. }
            | Expression::Parameter { token, .. }
            | Expression::Return { token, .. }
            | Expression::Break { token }
            | Expression::Continue { token }
            | Expression::Assert { token, .. }
            | Expression::Let { token, .. }
            | Expression::If { token, .. }
            | Expression::While { token, .. }
            | Expression::For { token, .. }
            | Expression::ForEach { token, .. }
            | Expression::ListComp { token, .. }
            | Expression::DictComp { token, .. }
            | Expression::Import { token, .. }
            | Expression::FromImport { token, .. }
            | Expression::Script { token, .. } => token,
        }
    }
}
