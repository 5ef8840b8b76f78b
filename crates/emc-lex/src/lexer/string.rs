//! String and character literal lexing.
//!
//! Both literal forms share the escape set `\n \t \r \\ \" \' \0` plus
//! `\u{H...}` with one to eight hex digits and a codepoint bounded by
//! 0x10FFFF. Escapes are processed here: the token lexeme carries the
//! decoded content, not the source spelling.

use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a double-quoted string literal.
    ///
    /// Strings may span newlines. A string left open at EOF is a single
    /// reported error; the partial content is kept so the parser can keep
    /// going.
    pub(crate) fn lex_string(&mut self) -> Token {
        self.cursor.advance(); // opening quote

        let mut content = String::new();

        loop {
            if self.cursor.is_at_end() {
                self.report_error("unterminated string literal");
                break;
            }

            let c = self.cursor.current_char();

            if c == '"' {
                self.cursor.advance();
                break;
            }

            if c == '\\' {
                self.cursor.advance();
                if let Some(escaped) = self.parse_escape() {
                    content.push(escaped);
                }
            } else {
                content.push(c);
                self.cursor.advance();
            }
        }

        self.make_token(TokenKind::Str, content)
    }

    /// Lexes a single-quoted character literal.
    ///
    /// Exactly one logical character (possibly an escape sequence) must sit
    /// between the quotes; anything else is a reported error. The lexeme is
    /// the decoded character.
    pub(crate) fn lex_char(&mut self) -> Token {
        self.cursor.advance(); // opening quote

        if self.cursor.is_at_end() {
            self.report_error("unterminated character literal");
            return self.make_token(TokenKind::Char, "\0");
        }

        let c = if self.cursor.current_char() == '\\' {
            self.cursor.advance();
            self.parse_escape().unwrap_or('\0')
        } else {
            let c = self.cursor.current_char();
            if c == '\'' {
                self.report_error("empty character literal");
                self.cursor.advance();
                return self.make_token(TokenKind::Char, "\0");
            }
            if c == '\n' {
                self.report_error("unterminated character literal");
                return self.make_token(TokenKind::Char, "\0");
            }
            self.cursor.advance();
            c
        };

        if self.cursor.current_char() == '\'' {
            self.cursor.advance();
        } else {
            self.report_error("character literal must contain exactly one character");
            // Resume at the closing quote or a line boundary
            while !self.cursor.is_at_end()
                && self.cursor.current_char() != '\''
                && self.cursor.current_char() != '\n'
            {
                self.cursor.advance();
            }
            if self.cursor.current_char() == '\'' {
                self.cursor.advance();
            }
        }

        self.make_token(TokenKind::Char, c.to_string())
    }

    /// Parses one escape sequence after the backslash has been consumed.
    ///
    /// Returns the decoded character, or None when the sequence is invalid
    /// (an error is reported and the caller drops the character).
    fn parse_escape(&mut self) -> Option<char> {
        if self.cursor.is_at_end() {
            self.report_error("unterminated escape sequence");
            return None;
        }

        let c = self.cursor.current_char();
        self.cursor.advance();

        match c {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            '\\' => Some('\\'),
            '"' => Some('"'),
            '\'' => Some('\''),
            '0' => Some('\0'),
            'u' => {
                if !self.cursor.match_char('{') {
                    self.report_error("expected '{' after \\u in Unicode escape");
                    return None;
                }
                let mut hex = String::new();
                while self.cursor.current_char().is_ascii_hexdigit() && hex.len() < 8 {
                    hex.push(self.cursor.current_char());
                    self.cursor.advance();
                }
                if !self.cursor.match_char('}') {
                    self.report_error("malformed Unicode escape sequence");
                    return None;
                }
                if hex.is_empty() {
                    self.report_error("empty Unicode escape sequence");
                    return None;
                }
                match u32::from_str_radix(&hex, 16) {
                    Ok(cp) if cp <= 0x10FFFF => match char::from_u32(cp) {
                        Some(ch) => Some(ch),
                        None => {
                            self.report_error("invalid Unicode codepoint");
                            None
                        },
                    },
                    _ => {
                        self.report_error("Unicode codepoint out of range");
                        None
                    },
                }
            },
            _ => {
                self.report_error(format!("unknown escape sequence: \\{}", c));
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Lexer, Token, TokenKind};
    use emc_util::Handler;

    fn lex_first(source: &str) -> (Token, Handler) {
        let handler = Handler::new();
        let token = {
            let mut lexer = Lexer::new(source, &handler);
            lexer.next_token()
        };
        (token, handler)
    }

    #[test]
    fn test_simple_string() {
        let (tok, handler) = lex_first("\"hello\"");
        assert!(!handler.has_errors());
        assert_eq!(tok.kind, TokenKind::Str);
        assert_eq!(tok.lexeme, "hello");
    }

    #[test]
    fn test_string_escapes() {
        let (tok, handler) = lex_first("\"a\\tb\\nc\\\\d\\\"e\\0\"");
        assert!(!handler.has_errors());
        assert_eq!(tok.lexeme, "a\tb\nc\\d\"e\0");
    }

    #[test]
    fn test_string_unicode_escape() {
        let (tok, handler) = lex_first("\"\\u{48}\\u{69}\"");
        assert!(!handler.has_errors());
        assert_eq!(tok.lexeme, "Hi");
    }

    #[test]
    fn test_string_unicode_escape_wide() {
        let (tok, handler) = lex_first("\"\\u{1F600}\"");
        assert!(!handler.has_errors());
        assert_eq!(tok.lexeme, "\u{1F600}");
    }

    #[test]
    fn test_unicode_out_of_range() {
        let (_, handler) = lex_first("\"\\u{110000}\"");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_unterminated_string() {
        let (tok, handler) = lex_first("\"abc");
        assert_eq!(handler.error_count(), 1);
        assert_eq!(tok.kind, TokenKind::Str);
        assert_eq!(tok.lexeme, "abc");
    }

    #[test]
    fn test_unknown_escape_reported() {
        let (_, handler) = lex_first("\"\\q\"");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_char_literal() {
        let (tok, handler) = lex_first("'a'");
        assert!(!handler.has_errors());
        assert_eq!(tok.kind, TokenKind::Char);
        assert_eq!(tok.lexeme, "a");
    }

    #[test]
    fn test_char_escape() {
        let (tok, handler) = lex_first("'\\n'");
        assert!(!handler.has_errors());
        assert_eq!(tok.lexeme, "\n");
    }

    #[test]
    fn test_char_unicode_escape() {
        let (tok, handler) = lex_first("'\\u{41}'");
        assert!(!handler.has_errors());
        assert_eq!(tok.lexeme, "A");
    }

    #[test]
    fn test_empty_char_literal() {
        let (_, handler) = lex_first("''");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_multi_char_literal() {
        let (tok, handler) = lex_first("'ab'");
        assert!(handler.has_errors());
        // Recovery keeps the first character
        assert_eq!(tok.lexeme, "a");
    }
}
