//! Whitespace and comment skipping.
//!
//! Comments come in three forms, all fully discarded: `// line`,
//! `/* block */`, and `/** doc */` (treated as a block comment). Newlines are
//! never consumed here - they are significant to the token stream.

use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Skips horizontal whitespace and comments before the next token.
    ///
    /// A block comment left open at EOF is a reported error; scanning then
    /// resumes at EOF, which is a safe boundary.
    pub(crate) fn skip_whitespace_and_comments(&mut self) {
        loop {
            let c = self.cursor.current_char();

            if c != '\n' && c.is_whitespace() {
                self.cursor.advance();
                continue;
            }

            if c == '/' && self.cursor.peek_char(1) == '/' {
                self.skip_line_comment();
                continue;
            }

            if c == '/' && self.cursor.peek_char(1) == '*' {
                self.skip_block_comment();
                continue;
            }

            break;
        }
    }

    /// Skips a `//` comment up to (but not including) the newline.
    fn skip_line_comment(&mut self) {
        while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
            self.cursor.advance();
        }
    }

    /// Skips a `/* ... */` or `/** ... */` comment, including its newlines.
    fn skip_block_comment(&mut self) {
        self.token_start = self.cursor.position();
        self.cursor.advance(); // '/'
        self.cursor.advance(); // '*'

        loop {
            if self.cursor.is_at_end() {
                self.report_error("unterminated block comment");
                return;
            }
            if self.cursor.current_char() == '*' && self.cursor.peek_char(1) == '/' {
                self.cursor.advance();
                self.cursor.advance();
                return;
            }
            self.cursor.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Lexer, TokenKind};
    use emc_util::Handler;

    fn first_kind(source: &str) -> TokenKind {
        let handler = Handler::new();
        let mut lexer = Lexer::new(source, &handler);
        lexer.next_token().kind
    }

    #[test]
    fn test_skip_line_comment() {
        assert_eq!(first_kind("// comment\nlet"), TokenKind::Newline);
    }

    #[test]
    fn test_skip_block_comment() {
        assert_eq!(first_kind("/* a\nb */let"), TokenKind::Let);
    }

    #[test]
    fn test_skip_doc_comment() {
        assert_eq!(first_kind("/** docs */let"), TokenKind::Let);
    }

    #[test]
    fn test_slash_alone_is_operator() {
        assert_eq!(first_kind("/ 2"), TokenKind::Slash);
    }

    #[test]
    fn test_unterminated_block_comment_reports_once() {
        let handler = Handler::new();
        let mut lexer = Lexer::new("/* open", &handler);
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::Eof);
        assert_eq!(handler.error_count(), 1);
    }
}
