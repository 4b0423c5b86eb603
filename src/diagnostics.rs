//! Human-readable error rendering.
//!
//! Produces the classic three-line shape: a `file:line:column` header, the
//! offending source line, and a caret underlining the token's lexeme.

use crate::token::{Token, TokenKind};

/// Render a message anchored at `token` against the line it came from.
/// Tabs in the source line are widened to four spaces so the caret stays
/// aligned no matter how the terminal renders them.
pub fn render(source_name: &str, line_text: &str, token: &Token, message: &str) -> String {
    let mut out = format!(
        "{source_name}:{}:{}: {message}\n",
        token.line, token.column
    );

    let mut rendered = String::new();
    let mut padding = String::new();
    for (index, ch) in line_text.chars().enumerate() {
        let is_before_token = (index as u32) < token.column.saturating_sub(1);
        if ch == '\t' {
            rendered.push_str("    ");
            if is_before_token {
                padding.push_str("    ");
            }
        } else {
            rendered.push(ch);
            if is_before_token {
                padding.push(' ');
            }
        }
    }

    out.push_str(&rendered);
    out.push('\n');
    out.push_str(&padding);
    out.push('^');
    for _ in 1..span_width(token) {
        out.push('~');
    }
    out
}

fn span_width(token: &Token) -> usize {
    match token.kind {
        // The end-of-input markers have no lexeme to underline.
        TokenKind::Eol | TokenKind::Eof => 1,
        _ => token.literal.chars().count().max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;
    use indoc::indoc;

    #[test]
    fn renders_header_line_and_caret() {
        let token = Token::new(TokenKind::Ident, "value", 3, 5);
        let rendered = render("demo.bud", "let value = 1", &token, "something is off");
        assert_eq!(
            rendered,
            indoc! {"
                demo.bud:3:5: something is off
                let value = 1
                    ^~~~~"}
        );
    }

    #[test]
    fn widens_tabs_consistently() {
        let token = Token::new(TokenKind::Int, "42", 1, 2);
        let rendered = render("demo.bud", "\t42", &token, "bad");
        assert_eq!(
            rendered,
            indoc! {"
                demo.bud:1:2: bad
                    42
                    ^~"}
        );
    }

    #[test]
    fn caret_never_collapses_to_zero_width() {
        let token = Token::new(TokenKind::Eof, "", 1, 4);
        let rendered = render("demo.bud", "1 +", &token, "expected an expression");
        assert!(rendered.ends_with("   ^"));
    }
}
