//! On-demand tokenizer for bud source text.
//!
//! The scanner never fails: lexical problems surface as `Invalid` tokens so
//! the parser can attach a proper diagnostic instead of losing input.

use crate::token::{Token, TokenKind, keyword};

pub struct Scanner {
    source: String,
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    prev: Option<TokenKind>,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        let source = source.replace("\r\n", "\n");
        let chars = source.chars().collect();
        Self {
            source,
            chars,
            pos: 0,
            line: 1,
            column: 1,
            prev: None,
        }
    }

    /// Source text of a 1-based line, used only for diagnostic rendering.
    pub fn line_text(&self, line: u32) -> &str {
        self.source
            .split('\n')
            .nth(line.saturating_sub(1) as usize)
            .unwrap_or("")
    }

    pub fn scan(&mut self) -> Token {
        let token = self.scan_token();
        if token.kind != TokenKind::Comment {
            self.prev = Some(token.kind);
        }
        token
    }

    fn scan_token(&mut self) -> Token {
        loop {
            let Some(ch) = self.peek() else {
                return Token::new(TokenKind::Eof, "", self.line, self.column);
            };
            match ch {
                ' ' | '\t' => {
                    self.advance();
                }
                '\n' => {
                    let (line, column) = (self.line, self.column);
                    self.advance();
                    // A newline right after an opening bracket or brace is
                    // swallowed so multi-line literals need no continuation.
                    if matches!(self.prev, Some(TokenKind::LBracket | TokenKind::LBrace)) {
                        continue;
                    }
                    return Token::new(TokenKind::Eol, "\n", line, column);
                }
                _ => break,
            }
        }

        let (line, column) = (self.line, self.column);
        let start = self.pos;
        let ch = self.peek().expect("peeked before dispatch");

        if ch.is_ascii_digit() {
            return self.scan_number(start, line, column);
        }
        if ch.is_alphabetic() || ch == '_' {
            return self.scan_identifier(start, line, column);
        }
        if ch == '\'' || ch == '"' {
            return self.scan_string(ch, start, line, column);
        }
        if ch == '/' {
            match self.peek_at(1) {
                Some('/') => return self.scan_line_comment(start, line, column),
                Some('*') => return self.scan_block_comment(start, line, column),
                _ => {}
            }
        }

        self.scan_operator(start, line, column)
    }

    fn scan_number(&mut self, start: usize, line: u32, column: u32) -> Token {
        self.advance();
        let radix_prefix = self.chars[start] == '0'
            && matches!(self.peek(), Some('b' | 'o' | 'x' | 'B' | 'O' | 'X'));
        if radix_prefix {
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    self.advance();
                } else {
                    break;
                }
            }
            return self.token_from(TokenKind::Int, start, line, column);
        }

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        if self.peek() == Some('.')
            && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() || c == '_' {
                    self.advance();
                } else {
                    break;
                }
            }
            return self.token_from(TokenKind::Float, start, line, column);
        }
        self.token_from(TokenKind::Int, start, line, column)
    }

    fn scan_identifier(&mut self, start: usize, line: u32, column: u32) -> Token {
        self.advance();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        let kind = keyword(&literal).unwrap_or(TokenKind::Ident);
        Token::new(kind, literal, line, column)
    }

    fn scan_string(&mut self, quote: char, start: usize, line: u32, column: u32) -> Token {
        self.advance();
        while let Some(c) = self.peek() {
            if c == quote {
                self.advance();
                return self.token_from(TokenKind::Str, start, line, column);
            }
            if c == '\n' {
                break;
            }
            self.advance();
        }
        // Unterminated: leave the newline for the statement separator.
        self.token_from(TokenKind::Invalid, start, line, column)
    }

    fn scan_line_comment(&mut self, start: usize, line: u32, column: u32) -> Token {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        self.token_from(TokenKind::Comment, start, line, column)
    }

    fn scan_block_comment(&mut self, start: usize, line: u32, column: u32) -> Token {
        self.advance();
        self.advance();
        while let Some(c) = self.peek() {
            if c == '*' && self.peek_at(1) == Some('/') {
                self.advance();
                self.advance();
                return self.token_from(TokenKind::Comment, start, line, column);
            }
            self.advance();
        }
        self.token_from(TokenKind::Invalid, start, line, column)
    }

    fn scan_operator(&mut self, start: usize, line: u32, column: u32) -> Token {
        let ch = self.peek().expect("operator dispatch requires a char");
        self.advance();
        let kind = match ch {
            '+' => self.with_eq(TokenKind::PlusAssign, TokenKind::Plus),
            '-' => self.with_eq(TokenKind::MinusAssign, TokenKind::Minus),
            '*' => {
                if self.consume('*') {
                    TokenKind::Power
                } else {
                    self.with_eq(TokenKind::StarAssign, TokenKind::Star)
                }
            }
            '/' => self.with_eq(TokenKind::SlashAssign, TokenKind::Slash),
            '%' => self.with_eq(TokenKind::PercentAssign, TokenKind::Percent),
            '&' => {
                if self.consume('&') {
                    TokenKind::And
                } else {
                    self.with_eq(TokenKind::AmpAssign, TokenKind::Amp)
                }
            }
            '|' => {
                if self.consume('|') {
                    TokenKind::Or
                } else {
                    self.with_eq(TokenKind::PipeAssign, TokenKind::Pipe)
                }
            }
            '^' => self.with_eq(TokenKind::CaretAssign, TokenKind::Caret),
            '~' => TokenKind::Tilde,
            '<' => {
                if self.consume('<') {
                    self.with_eq(TokenKind::ShlAssign, TokenKind::Shl)
                } else {
                    self.with_eq(TokenKind::Le, TokenKind::Lt)
                }
            }
            '>' => {
                if self.consume('>') {
                    self.with_eq(TokenKind::ShrAssign, TokenKind::Shr)
                } else {
                    self.with_eq(TokenKind::Ge, TokenKind::Gt)
                }
            }
            '=' => self.with_eq(TokenKind::Eq, TokenKind::Assign),
            '!' => self.with_eq(TokenKind::NotEq, TokenKind::Bang),
            ':' => self.with_eq(TokenKind::Declare, TokenKind::Colon),
            ';' => TokenKind::Semicolon,
            '?' => TokenKind::Question,
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            _ => TokenKind::Invalid,
        };
        self.token_from(kind, start, line, column)
    }

    fn with_eq(&mut self, with: TokenKind, without: TokenKind) -> TokenKind {
        if self.consume('=') { with } else { without }
    }

    fn token_from(&self, kind: TokenKind, start: usize, line: u32, column: u32) -> Token {
        let literal: String = self.chars[start..self.pos].iter().collect();
        Token::new(kind, literal, line, column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn consume(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) -> Option<char> {
        let next = self.chars.get(self.pos).copied();
        if let Some(c) = next {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }
}

#[cfg(test)]
pub(crate) fn tokenize(input: &str) -> Vec<Token> {
    let mut scanner = Scanner::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.scan();
        let is_eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|token| token.kind).collect()
    }

    #[test]
    fn scans_simple_statement() {
        let input = indoc! {"
            let n = 4 + 4
            print(n)
        "};
        assert_eq!(
            kinds(input),
            vec![
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Int,
                TokenKind::Plus,
                TokenKind::Int,
                TokenKind::Eol,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::RParen,
                TokenKind::Eol,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_number_forms_with_exact_lexemes() {
        let tokens = tokenize("1_000 0x1A 0b1010 0o77 1.5");
        let literals: Vec<&str> = tokens
            .iter()
            .take(5)
            .map(|token| token.literal.as_str())
            .collect();
        assert_eq!(literals, vec!["1_000", "0x1A", "0b1010", "0o77", "1.5"]);
        assert_eq!(tokens[4].kind, TokenKind::Float);
        assert_eq!(tokens[0].kind, TokenKind::Int);
    }

    #[test]
    fn scans_compound_assignment_and_shift_operators() {
        assert_eq!(
            kinds("a <<= 1 >> 2 ** 3 != 4"),
            vec![
                TokenKind::Ident,
                TokenKind::ShlAssign,
                TokenKind::Int,
                TokenKind::Shr,
                TokenKind::Int,
                TokenKind::Power,
                TokenKind::Int,
                TokenKind::NotEq,
                TokenKind::Int,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn swallows_newline_after_open_bracket_and_brace() {
        let input = "[\n1,\n2]\n{\n}";
        let observed = kinds(input);
        assert_eq!(
            observed,
            vec![
                TokenKind::LBracket,
                TokenKind::Int,
                TokenKind::Comma,
                TokenKind::Eol,
                TokenKind::Int,
                TokenKind::RBracket,
                TokenKind::Eol,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn exposes_comments_as_tokens() {
        let observed = kinds("1 // trailing\n/* block */ 2");
        assert_eq!(
            observed,
            vec![
                TokenKind::Int,
                TokenKind::Comment,
                TokenKind::Eol,
                TokenKind::Comment,
                TokenKind::Int,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_line_and_column_positions() {
        let tokens = tokenize("a\n  b");
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!(tokens[1].kind, TokenKind::Eol);
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    }

    #[test]
    fn emits_invalid_for_unknown_character_and_unterminated_string() {
        let tokens = tokenize("@ 'open\n1");
        assert_eq!(tokens[0].kind, TokenKind::Invalid);
        assert_eq!(tokens[0].literal, "@");
        assert_eq!(tokens[1].kind, TokenKind::Invalid);
        assert_eq!(tokens[1].literal, "'open");
        assert_eq!(tokens[2].kind, TokenKind::Eol);
    }

    #[test]
    fn emits_invalid_for_unterminated_block_comment() {
        let tokens = tokenize("/* never closed");
        assert_eq!(tokens[0].kind, TokenKind::Invalid);
        assert!(tokens[0].literal.starts_with("/*"));
    }

    #[test]
    fn normalizes_crlf_and_exposes_line_text() {
        let scanner = Scanner::new("a = 1\r\nb = 2\r\n");
        assert_eq!(scanner.line_text(2), "b = 2");
    }

    #[test]
    fn quotes_match_their_own_delimiter() {
        let tokens = tokenize(r#"'it "works"' "and 'this'""#);
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].literal, r#"'it "works"'"#);
        assert_eq!(tokens[1].kind, TokenKind::Str);
    }
}
