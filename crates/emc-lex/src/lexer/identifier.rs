//! Identifier and keyword lexing.

use crate::token::{classify_ident, Token};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes an identifier run `[A-Za-z_][A-Za-z0-9_]*` and classifies it
    /// against the keyword table. `true`/`false` become boolean literals and
    /// `null` becomes the null literal.
    pub(crate) fn lex_identifier(&mut self) -> Token {
        while {
            let c = self.cursor.current_char();
            c.is_ascii_alphanumeric() || c == '_'
        } {
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(self.token_start);
        self.make_token(classify_ident(text), text)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Lexer, TokenKind};
    use emc_util::Handler;

    fn lex_one(source: &str) -> (TokenKind, String) {
        let handler = Handler::new();
        let mut lexer = Lexer::new(source, &handler);
        let token = lexer.next_token();
        (token.kind, token.lexeme)
    }

    #[test]
    fn test_plain_identifier() {
        assert_eq!(
            lex_one("counter_2"),
            (TokenKind::Identifier, "counter_2".to_string())
        );
    }

    #[test]
    fn test_leading_underscore() {
        assert_eq!(lex_one("_tmp"), (TokenKind::Identifier, "_tmp".to_string()));
    }

    #[test]
    fn test_keyword() {
        assert_eq!(lex_one("while"), (TokenKind::While, "while".to_string()));
    }

    #[test]
    fn test_bool_literals() {
        assert_eq!(lex_one("true"), (TokenKind::Bool, "true".to_string()));
        assert_eq!(lex_one("false"), (TokenKind::Bool, "false".to_string()));
    }

    #[test]
    fn test_null_literal() {
        assert_eq!(lex_one("null"), (TokenKind::Null, "null".to_string()));
    }

    #[test]
    fn test_type_name() {
        assert_eq!(lex_one("uint16"), (TokenKind::TypeName, "uint16".to_string()));
    }
}
