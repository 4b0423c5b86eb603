/// A single lexed token. `literal` holds the exact source lexeme so the
/// parser can do numeric conversion and diagnostics can underline spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind,
            literal: literal.into(),
            line,
            column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals and names
    Int,
    Float,
    Str,
    Ident,

    // Keywords
    Def,
    Let,
    If,
    Else,
    While,
    For,
    In,
    Break,
    Continue,
    Return,
    Assert,
    Import,
    From,
    As,
    True,
    False,

    // Assignment
    Assign,        // =
    PlusAssign,    // +=
    MinusAssign,   // -=
    StarAssign,    // *=
    SlashAssign,   // /=
    PercentAssign, // %=
    AmpAssign,     // &=
    PipeAssign,    // |=
    CaretAssign,   // ^=
    ShlAssign,     // <<=
    ShrAssign,     // >>=
    Declare,       // :=, reserved

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Power, // **

    // Comparison
    Eq,    // ==
    NotEq, // !=
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And, // &&
    Or,  // ||
    Bang,

    // Bitwise
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl, // <<
    Shr, // >>

    // Delimiters
    Question,
    Colon,
    Semicolon,
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // Structural
    Comment,
    Eol,
    Eof,
    Invalid,
}

pub fn keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "def" => TokenKind::Def,
        "let" => TokenKind::Let,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "in" => TokenKind::In,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "return" => TokenKind::Return,
        "assert" => TokenKind::Assert,
        "import" => TokenKind::Import,
        "from" => TokenKind::From,
        "as" => TokenKind::As,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        _ => return None,
    };
    Some(kind)
}

/// Infix binding strength, weakest first. `**` deliberately shares `PowMul`
/// with `*`, `/` and `%`, so chained `**` folds left-to-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Assign,
    Ternary,
    Bitwise,
    Logical,
    Shift,
    Equality,
    Relational,
    Additive,
    PowMul,
    Index,
    Prefix,
    Call,
    Dot,
}

pub fn precedence(kind: TokenKind) -> Precedence {
    match kind {
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
        | TokenKind::ShrAssign
        | TokenKind::Declare => Precedence::Assign,
        TokenKind::Question => Precedence::Ternary,
        TokenKind::Amp | TokenKind::Pipe | TokenKind::Caret => Precedence::Bitwise,
        TokenKind::And | TokenKind::Or => Precedence::Logical,
        TokenKind::Shl | TokenKind::Shr => Precedence::Shift,
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equality,
        TokenKind::Lt | TokenKind::Le | TokenKind::Gt | TokenKind::Ge => Precedence::Relational,
        TokenKind::Plus | TokenKind::Minus => Precedence::Additive,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent | TokenKind::Power => {
            Precedence::PowMul
        }
        TokenKind::LBracket => Precedence::Index,
        TokenKind::LParen => Precedence::Call,
        TokenKind::Dot => Precedence::Dot,
        _ => Precedence::Lowest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_keywords() {
        assert_eq!(keyword("def"), Some(TokenKind::Def));
        assert_eq!(keyword("import"), Some(TokenKind::Import));
        assert_eq!(keyword("definitely"), None);
    }

    #[test]
    fn dot_binds_tighter_than_call() {
        assert!(precedence(TokenKind::Dot) > precedence(TokenKind::LParen));
        assert!(precedence(TokenKind::LParen) > precedence(TokenKind::LBracket));
    }

    #[test]
    fn power_shares_multiplicative_precedence() {
        assert_eq!(precedence(TokenKind::Power), precedence(TokenKind::Star));
        assert!(precedence(TokenKind::Star) > precedence(TokenKind::Plus));
    }

    #[test]
    fn bitwise_sits_below_logical() {
        assert!(precedence(TokenKind::Amp) < precedence(TokenKind::And));
        assert!(precedence(TokenKind::And) < precedence(TokenKind::Shl));
    }
}
