//! Recursive-descent, precedence-climbing parser.
//!
//! The parser holds the current token plus one of lookahead. Statement forms
//! are recognized by their leading keyword; everything else flows through the
//! Pratt expression core. The first error aborts the parse.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::ast::{BinaryOp, CompClause, Expression, UnaryOp};
use crate::scanner::Scanner;
use crate::token::{Precedence, Token, TokenKind, precedence};

/// Hard ceiling on the parameter count of a single function.
pub const MAX_PARAMS: usize = 16;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("Expected {expected}, got '{}'", token.literal)]
    UnexpectedToken {
        expected: String,
        token: Token,
        line: String,
    },
    #[error("Invalid {kind} literal '{}'", token.literal)]
    InvalidLiteral {
        kind: &'static str,
        token: Token,
        line: String,
    },
    #[error("Unrecognized character '{}'", token.literal)]
    UnrecognizedCharacter { token: Token, line: String },
    #[error("Unterminated string literal")]
    UnterminatedString { token: Token, line: String },
    #[error("Unterminated block comment")]
    UnterminatedComment { token: Token, line: String },
    #[error("Function definitions are only allowed at the top level")]
    NestedFunction { token: Token, line: String },
    #[error("Duplicate function definition '{name}'")]
    DuplicateFunction {
        name: String,
        token: Token,
        line: String,
    },
    #[error("Function takes at most {limit} parameters")]
    TooManyParameters {
        limit: usize,
        token: Token,
        line: String,
    },
    #[error("Positional argument is not allowed after a named argument")]
    PositionalAfterNamed { token: Token, line: String },
    #[error("Parameter without a default follows a defaulted parameter")]
    RequiredAfterDefaulted { token: Token, line: String },
    #[error("':=' is reserved for future use")]
    ReservedOperator { token: Token, line: String },
    #[error("Only a variable or an index expression can be assigned")]
    InvalidAssignTarget { token: Token, line: String },
}

impl ParseError {
    pub fn token(&self) -> &Token {
        match self {
            ParseError::UnexpectedToken { token, .. }
            | ParseError::InvalidLiteral { token, .. }
            | ParseError::UnrecognizedCharacter { token, .. }
            | ParseError::UnterminatedString { token, .. }
            | ParseError::UnterminatedComment { token, .. }
            | ParseError::NestedFunction { token, .. }
            | ParseError::DuplicateFunction { token, .. }
            | ParseError::TooManyParameters { token, .. }
            | ParseError::PositionalAfterNamed { token, .. }
            | ParseError::RequiredAfterDefaulted { token, .. }
            | ParseError::ReservedOperator { token, .. }
            | ParseError::InvalidAssignTarget { token, .. } => token,
        }
    }

    /// The source line the offending token sits on.
    pub fn line(&self) -> &str {
        match self {
            ParseError::UnexpectedToken { line, .. }
            | ParseError::InvalidLiteral { line, .. }
            | ParseError::UnrecognizedCharacter { line, .. }
            | ParseError::UnterminatedString { line, .. }
            | ParseError::UnterminatedComment { line, .. }
            | ParseError::NestedFunction { line, .. }
            | ParseError::DuplicateFunction { line, .. }
            | ParseError::TooManyParameters { line, .. }
            | ParseError::PositionalAfterNamed { line, .. }
            | ParseError::RequiredAfterDefaulted { line, .. }
            | ParseError::ReservedOperator { line, .. }
            | ParseError::InvalidAssignTarget { line, .. } => line,
        }
    }
}

pub struct Parser {
    scanner: Scanner,
    current: Token,
    peek: Token,
}

pub fn parse(source: &str) -> Result<Expression, ParseError> {
    Parser::new(source).parse_script()
}

impl Parser {
    pub fn new(source: &str) -> Self {
        let mut scanner = Scanner::new(source);
        let current = next_significant(&mut scanner);
        let peek = next_significant(&mut scanner);
        Self {
            scanner,
            current,
            peek,
        }
    }

    pub fn parse_script(mut self) -> Result<Expression, ParseError> {
        let token = self.current.clone();
        let mut statements = Vec::new();
        let mut functions: FxHashMap<String, Expression> = FxHashMap::default();

        loop {
            self.skip_eols();
            if self.current.kind == TokenKind::Eof {
                break;
            }
            if self.current.kind == TokenKind::Def {
                let def = self.parse_function_def()?;
                let Expression::FunctionDef {
                    name, token: def_token, ..
                } = &def
                else {
                    unreachable!("parse_function_def returns a FunctionDef");
                };
                if functions.contains_key(name) {
                    return Err(ParseError::DuplicateFunction {
                        name: name.clone(),
                        line: self.line_of(def_token),
                        token: def_token.clone(),
                    });
                }
                functions.insert(name.clone(), def);
            } else {
                statements.push(self.parse_statement()?);
            }
            self.expect_terminator()?;
        }

        Ok(Expression::Script {
            statements,
            functions,
            token,
        })
    }

    // --- statements ---------------------------------------------------

    fn parse_statement(&mut self) -> Result<Expression, ParseError> {
        match self.current.kind {
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Break => {
                let token = self.advance();
                Ok(Expression::Break { token })
            }
            TokenKind::Continue => {
                let token = self.advance();
                Ok(Expression::Continue { token })
            }
            TokenKind::Return => {
                let token = self.advance();
                let value = if matches!(
                    self.current.kind,
                    TokenKind::Eol | TokenKind::Eof | TokenKind::RBrace
                ) {
                    None
                } else {
                    Some(Box::new(self.parse_expression(Precedence::Lowest)?))
                };
                Ok(Expression::Return { value, token })
            }
            TokenKind::Assert => {
                let token = self.advance();
                let condition = Box::new(self.parse_expression(Precedence::Lowest)?);
                Ok(Expression::Assert { condition, token })
            }
            TokenKind::Let => {
                let token = self.advance();
                let name = self.expect_ident("a variable name")?;
                self.expect(TokenKind::Assign, "'='")?;
                let value = Box::new(self.parse_expression(Precedence::Lowest)?);
                Ok(Expression::Let { name, value, token })
            }
            TokenKind::Import => self.parse_import(),
            TokenKind::From => self.parse_from_import(),
            TokenKind::Def => Err(ParseError::NestedFunction {
                line: self.line_of(&self.current),
                token: self.current.clone(),
            }),
            _ => self.parse_expression(Precedence::Lowest),
        }
    }

    fn parse_if_statement(&mut self) -> Result<Expression, ParseError> {
        let token = self.advance();
        self.expect(TokenKind::LParen, "'('")?;
        let condition = Box::new(self.parse_expression(Precedence::Lowest)?);
        self.expect(TokenKind::RParen, "')'")?;
        let consequence = Box::new(self.parse_block()?);
        let alternative = if self.current.kind == TokenKind::Else {
            self.advance();
            if self.current.kind == TokenKind::LBrace {
                Some(Box::new(self.parse_block()?))
            } else {
                // `else if ...` and friends chain as a single statement.
                Some(Box::new(self.parse_statement()?))
            }
        } else {
            None
        };
        Ok(Expression::If {
            condition,
            consequence,
            alternative,
            token,
        })
    }

    fn parse_while(&mut self) -> Result<Expression, ParseError> {
        let token = self.advance();
        self.expect(TokenKind::LParen, "'('")?;
        let condition = Box::new(self.parse_expression(Precedence::Lowest)?);
        self.expect(TokenKind::RParen, "')'")?;
        let body = Box::new(self.parse_block()?);
        Ok(Expression::While {
            condition,
            body,
            token,
        })
    }

    fn parse_for(&mut self) -> Result<Expression, ParseError> {
        let token = self.advance();
        self.expect(TokenKind::LParen, "'('")?;

        // A bare variable followed by `in` turns the C-style header into the
        // for-each sugar.
        if self.current.kind == TokenKind::Ident && self.peek.kind == TokenKind::In {
            let binding = self.advance().literal;
            self.advance();
            let iterable = Box::new(self.parse_expression(Precedence::Lowest)?);
            self.expect(TokenKind::RParen, "')'")?;
            let body = Box::new(self.parse_block()?);
            return Ok(Expression::ForEach {
                binding,
                iterable,
                body,
                token,
            });
        }

        let init = Box::new(self.parse_expression(Precedence::Lowest)?);
        self.expect(TokenKind::Semicolon, "';'")?;
        let condition = Box::new(self.parse_expression(Precedence::Lowest)?);
        self.expect(TokenKind::Semicolon, "';'")?;
        let increment = Box::new(self.parse_expression(Precedence::Lowest)?);
        self.expect(TokenKind::RParen, "')'")?;
        let body = Box::new(self.parse_block()?);
        Ok(Expression::For {
            init,
            condition,
            increment,
            body,
            token,
        })
    }

    fn parse_import(&mut self) -> Result<Expression, ParseError> {
        let token = self.advance();
        let segments = self.parse_module_segments()?;
        let alias = if self.current.kind == TokenKind::As {
            self.advance();
            Some(self.expect_ident("an alias name")?)
        } else {
            None
        };
        Ok(Expression::Import {
            segments,
            alias,
            token,
        })
    }

    fn parse_from_import(&mut self) -> Result<Expression, ParseError> {
        let token = self.advance();
        let segments = self.parse_module_segments()?;
        self.expect(TokenKind::Import, "'import'")?;
        let mut symbols = Vec::new();
        loop {
            let name = self.expect_ident("a symbol name")?;
            let alias = if self.current.kind == TokenKind::As {
                self.advance();
                Some(self.expect_ident("an alias name")?)
            } else {
                None
            };
            symbols.push((name, alias));
            if self.current.kind == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        Ok(Expression::FromImport {
            segments,
            symbols,
            token,
        })
    }

    fn parse_module_segments(&mut self) -> Result<Vec<String>, ParseError> {
        let mut segments = vec![self.expect_ident("a module name")?];
        while self.current.kind == TokenKind::Dot {
            self.advance();
            segments.push(self.expect_ident("a module name")?);
        }
        Ok(segments)
    }

    fn parse_function_def(&mut self) -> Result<Expression, ParseError> {
        let token = self.advance();
        let name = self.expect_ident("a function name")?;
        self.expect(TokenKind::LParen, "'('")?;

        let mut params = Vec::new();
        let mut seen_default = false;
        self.skip_eols();
        while self.current.kind != TokenKind::RParen {
            let param_token = self.current.clone();
            let param_name = self.expect_ident("a parameter name")?;
            let default = if self.current.kind == TokenKind::Assign {
                self.advance();
                seen_default = true;
                Some(Box::new(self.parse_expression(Precedence::Lowest)?))
            } else {
                if seen_default {
                    return Err(ParseError::RequiredAfterDefaulted {
                        line: self.line_of(&param_token),
                        token: param_token,
                    });
                }
                None
            };
            params.push(Expression::Parameter {
                name: param_name,
                default,
                token: param_token,
            });
            if params.len() > MAX_PARAMS {
                return Err(ParseError::TooManyParameters {
                    limit: MAX_PARAMS,
                    line: self.line_of(&self.current),
                    token: self.current.clone(),
                });
            }
            self.skip_eols();
            if self.current.kind == TokenKind::Comma {
                self.advance();
                self.skip_eols();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        let body = Box::new(self.parse_block()?);

        Ok(Expression::FunctionDef {
            name,
            params,
            body,
            token,
        })
    }

    fn parse_block(&mut self) -> Result<Expression, ParseError> {
        let token = self.expect(TokenKind::LBrace, "'{'")?;
        let mut statements = Vec::new();
        loop {
            self.skip_eols();
            if self.current.kind == TokenKind::RBrace {
                break;
            }
            if self.current.kind == TokenKind::Eof {
                return Err(self.unexpected("'}'"));
            }
            statements.push(self.parse_statement()?);
            if !matches!(self.current.kind, TokenKind::Eol | TokenKind::RBrace) {
                return Err(self.unexpected("end of statement"));
            }
        }
        self.advance();
        Ok(Expression::Script {
            statements,
            functions: FxHashMap::default(),
            token,
        })
    }

    // --- expressions --------------------------------------------------

    fn parse_expression(&mut self, min: Precedence) -> Result<Expression, ParseError> {
        let mut left = self.parse_prefix()?;
        while precedence(self.current.kind) > min {
            left = self.parse_infix(left)?;
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expression, ParseError> {
        let token = self.current.clone();
        match token.kind {
            TokenKind::Int => {
                self.advance();
                let value = self.integer_value(&token)?;
                Ok(Expression::IntegerLit { value, token })
            }
            TokenKind::Float => {
                self.advance();
                let digits = token.literal.replace('_', "");
                let value = digits
                    .parse::<f64>()
                    .map_err(|_| ParseError::InvalidLiteral {
                        kind: "double",
                        line: self.line_of(&token),
                        token: token.clone(),
                    })?;
                Ok(Expression::DoubleLit { value, token })
            }
            TokenKind::Str => {
                self.advance();
                let value = token.literal[1..token.literal.len() - 1].to_string();
                Ok(Expression::StringLit { value, token })
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                Ok(Expression::BooleanLit {
                    value: token.kind == TokenKind::True,
                    token,
                })
            }
            TokenKind::Ident => {
                self.advance();
                Ok(Expression::Variable {
                    name: token.literal.clone(),
                    token,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression(Precedence::Lowest)?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::LBracket => self.parse_array_or_comp(token),
            TokenKind::LBrace => self.parse_dict_or_comp(token),
            TokenKind::Minus => self.parse_unary(UnaryOp::Negate, token),
            TokenKind::Bang => self.parse_unary(UnaryOp::Not, token),
            TokenKind::Tilde => self.parse_unary(UnaryOp::BitNot, token),
            TokenKind::Invalid => Err(self.lexical_error(token)),
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_unary(&mut self, op: UnaryOp, token: Token) -> Result<Expression, ParseError> {
        self.advance();
        let operand = Box::new(self.parse_expression(Precedence::Prefix)?);
        Ok(Expression::Unary { op, operand, token })
    }

    fn parse_infix(&mut self, left: Expression) -> Result<Expression, ParseError> {
        let token = self.current.clone();
        if let Some(op) = binary_op(token.kind) {
            self.advance();
            let right = Box::new(self.parse_expression(precedence(token.kind))?);
            return Ok(Expression::Binary {
                op,
                left: Box::new(left),
                right,
                token,
            });
        }
        match token.kind {
            TokenKind::Question => {
                self.advance();
                let consequence = Box::new(self.parse_expression(Precedence::Lowest)?);
                self.expect(TokenKind::Colon, "':'")?;
                let alternative = Box::new(self.parse_expression(Precedence::Lowest)?);
                Ok(Expression::If {
                    condition: Box::new(left),
                    consequence,
                    alternative: Some(alternative),
                    token,
                })
            }
            TokenKind::Declare => Err(ParseError::ReservedOperator {
                line: self.line_of(&token),
                token,
            }),
            TokenKind::Assign
            | TokenKind::PlusAssign
            | TokenKind::MinusAssign
            | TokenKind::StarAssign
            | TokenKind::SlashAssign
            | TokenKind::PercentAssign
            | TokenKind::AmpAssign
            | TokenKind::PipeAssign
            | TokenKind::CaretAssign
            | TokenKind::ShlAssign
            | TokenKind::ShrAssign => self.parse_assignment(left, token),
            TokenKind::LBracket => self.parse_index_or_slice(left, token),
            TokenKind::LParen => self.parse_call(left, token),
            TokenKind::Dot => {
                self.advance();
                let member = self.expect_ident("a member name")?;
                Ok(Expression::Path {
                    object: Box::new(left),
                    member,
                    token,
                })
            }
            _ => Err(self.unexpected("an operator")),
        }
    }

    fn parse_assignment(
        &mut self,
        target: Expression,
        token: Token,
    ) -> Result<Expression, ParseError> {
        if !matches!(
            target,
            Expression::Variable { .. } | Expression::Index { .. }
        ) {
            return Err(ParseError::InvalidAssignTarget {
                line: self.line_of(&token),
                token,
            });
        }
        let op = compound_op(token.kind);
        self.advance();
        let value = Box::new(self.parse_expression(Precedence::Lowest)?);
        Ok(Expression::Assign {
            target: Box::new(target),
            op,
            value,
            token,
        })
    }

    fn parse_index_or_slice(
        &mut self,
        object: Expression,
        token: Token,
    ) -> Result<Expression, ParseError> {
        self.advance();
        let start = if self.current.kind == TokenKind::Colon {
            None
        } else {
            Some(Box::new(self.parse_expression(Precedence::Lowest)?))
        };
        if self.current.kind == TokenKind::RBracket
            && let Some(index) = start
        {
            self.advance();
            return Ok(Expression::Index {
                object: Box::new(object),
                index,
                token,
            });
        }
        self.expect(TokenKind::Colon, "':'")?;
        let end = if matches!(self.current.kind, TokenKind::Colon | TokenKind::RBracket) {
            None
        } else {
            Some(Box::new(self.parse_expression(Precedence::Lowest)?))
        };
        let step = if self.current.kind == TokenKind::Colon {
            self.advance();
            if self.current.kind == TokenKind::RBracket {
                None
            } else {
                Some(Box::new(self.parse_expression(Precedence::Lowest)?))
            }
        } else {
            None
        };
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(Expression::Slice {
            object: Box::new(object),
            start,
            end,
            step,
            token,
        })
    }

    fn parse_call(&mut self, callee: Expression, token: Token) -> Result<Expression, ParseError> {
        self.advance();
        let mut args = Vec::new();
        let mut named = Vec::new();
        self.skip_eols();
        while self.current.kind != TokenKind::RParen {
            if self.current.kind == TokenKind::Ident && self.peek.kind == TokenKind::Assign {
                let name = self.advance().literal;
                self.advance();
                named.push((name, self.parse_expression(Precedence::Lowest)?));
            } else {
                if !named.is_empty() {
                    return Err(ParseError::PositionalAfterNamed {
                        line: self.line_of(&self.current),
                        token: self.current.clone(),
                    });
                }
                args.push(self.parse_expression(Precedence::Lowest)?);
            }
            self.skip_eols();
            if self.current.kind == TokenKind::Comma {
                self.advance();
                self.skip_eols();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Expression::Call {
            callee: Box::new(callee),
            args,
            named,
            token,
        })
    }

    fn parse_array_or_comp(&mut self, token: Token) -> Result<Expression, ParseError> {
        self.advance();
        self.skip_eols();
        if self.current.kind == TokenKind::RBracket {
            self.advance();
            return Ok(Expression::ArrayLit {
                elements: Vec::new(),
                token,
            });
        }
        let first = self.parse_expression(Precedence::Lowest)?;
        if self.current.kind == TokenKind::For {
            let clauses = self.parse_comp_clauses()?;
            self.expect(TokenKind::RBracket, "']'")?;
            return Ok(Expression::ListComp {
                element: Box::new(first),
                clauses,
                token,
            });
        }
        let mut elements = vec![first];
        while self.current.kind == TokenKind::Comma {
            self.advance();
            self.skip_eols();
            if self.current.kind == TokenKind::RBracket {
                break;
            }
            elements.push(self.parse_expression(Precedence::Lowest)?);
            self.skip_eols();
        }
        self.skip_eols();
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(Expression::ArrayLit { elements, token })
    }

    fn parse_dict_or_comp(&mut self, token: Token) -> Result<Expression, ParseError> {
        self.advance();
        self.skip_eols();
        if self.current.kind == TokenKind::RBrace {
            self.advance();
            return Ok(Expression::DictLit {
                entries: Vec::new(),
                token,
            });
        }
        let first_key = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::Colon, "':'")?;
        let first_value = self.parse_expression(Precedence::Lowest)?;
        if self.current.kind == TokenKind::For {
            let clauses = self.parse_comp_clauses()?;
            self.expect(TokenKind::RBrace, "'}'")?;
            return Ok(Expression::DictComp {
                key: Box::new(first_key),
                value: Box::new(first_value),
                clauses,
                token,
            });
        }
        let mut entries = vec![(first_key, first_value)];
        while self.current.kind == TokenKind::Comma {
            self.advance();
            self.skip_eols();
            if self.current.kind == TokenKind::RBrace {
                break;
            }
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect(TokenKind::Colon, "':'")?;
            let value = self.parse_expression(Precedence::Lowest)?;
            entries.push((key, value));
            self.skip_eols();
        }
        self.skip_eols();
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Expression::DictLit { entries, token })
    }

    fn parse_comp_clauses(&mut self) -> Result<Vec<CompClause>, ParseError> {
        let mut clauses = Vec::new();
        while self.current.kind == TokenKind::For {
            let token = self.advance();
            let binding = self.expect_ident("a binding name")?;
            self.expect(TokenKind::In, "'in'")?;
            let iterable = self.parse_expression(Precedence::Lowest)?;
            let mut filters = Vec::new();
            while self.current.kind == TokenKind::If {
                self.advance();
                filters.push(self.parse_expression(Precedence::Lowest)?);
            }
            clauses.push(CompClause {
                binding,
                iterable,
                filters,
                token,
            });
        }
        Ok(clauses)
    }

    // --- token plumbing -----------------------------------------------

    fn integer_value(&self, token: &Token) -> Result<i64, ParseError> {
        let digits = token.literal.replace('_', "");
        let parsed = if let Some(rest) = strip_radix_prefix(&digits, &["0x", "0X"]) {
            i64::from_str_radix(rest, 16)
        } else if let Some(rest) = strip_radix_prefix(&digits, &["0b", "0B"]) {
            i64::from_str_radix(rest, 2)
        } else if let Some(rest) = strip_radix_prefix(&digits, &["0o", "0O"]) {
            i64::from_str_radix(rest, 8)
        } else {
            digits.parse::<i64>()
        };
        parsed.map_err(|_| ParseError::InvalidLiteral {
            kind: "integer",
            line: self.line_of(token),
            token: token.clone(),
        })
    }

    fn advance(&mut self) -> Token {
        let next = std::mem::replace(&mut self.peek, next_significant(&mut self.scanner));
        std::mem::replace(&mut self.current, next)
    }

    fn skip_eols(&mut self) {
        while self.current.kind == TokenKind::Eol {
            self.advance();
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.current.kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        if self.current.kind == TokenKind::Ident {
            Ok(self.advance().literal)
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_terminator(&mut self) -> Result<(), ParseError> {
        match self.current.kind {
            TokenKind::Eol => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of statement")),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        if self.current.kind == TokenKind::Invalid {
            return self.lexical_error(self.current.clone());
        }
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            line: self.line_of(&self.current),
            token: self.current.clone(),
        }
    }

    fn lexical_error(&self, token: Token) -> ParseError {
        let line = self.line_of(&token);
        if token.literal.starts_with('\'') || token.literal.starts_with('"') {
            ParseError::UnterminatedString { token, line }
        } else if token.literal.starts_with("/*") {
            ParseError::UnterminatedComment { token, line }
        } else {
            ParseError::UnrecognizedCharacter { token, line }
        }
    }

    fn line_of(&self, token: &Token) -> String {
        self.scanner.line_text(token.line).to_string()
    }
}

/// The parser is blind to comments; they only exist for tooling.
fn next_significant(scanner: &mut Scanner) -> Token {
    loop {
        let token = scanner.scan();
        if token.kind != TokenKind::Comment {
            return token;
        }
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Rem,
        TokenKind::Power => BinaryOp::Pow,
        TokenKind::Eq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Le => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::Ge => BinaryOp::Ge,
        TokenKind::And => BinaryOp::And,
        TokenKind::Or => BinaryOp::Or,
        TokenKind::Amp => BinaryOp::BitAnd,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::Shl => BinaryOp::Shl,
        TokenKind::Shr => BinaryOp::Shr,
        _ => return None,
    };
    Some(op)
}

fn compound_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::PlusAssign => BinaryOp::Add,
        TokenKind::MinusAssign => BinaryOp::Sub,
        TokenKind::StarAssign => BinaryOp::Mul,
        TokenKind::SlashAssign => BinaryOp::Div,
        TokenKind::PercentAssign => BinaryOp::Rem,
        TokenKind::AmpAssign => BinaryOp::BitAnd,
        TokenKind::PipeAssign => BinaryOp::BitOr,
        TokenKind::CaretAssign => BinaryOp::BitXor,
        TokenKind::ShlAssign => BinaryOp::Shl,
        TokenKind::ShrAssign => BinaryOp::Shr,
        _ => return None,
    };
    Some(op)
}

fn strip_radix_prefix<'a>(digits: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes
        .iter()
        .find_map(|prefix| digits.strip_prefix(prefix))
}
