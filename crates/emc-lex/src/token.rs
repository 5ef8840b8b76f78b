//! Token model for the EMLang lexer.
//!
//! [`TokenKind`] is the closed set of lexical categories; [`Token`] pairs a
//! kind with its lexeme and source position. Every byte of input resolves to
//! some token - unknown characters become [`TokenKind::Invalid`] so the
//! stream is never silently truncated before EOF.

use emc_util::Span;

/// Lexical category of a token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Special
    /// End of file marker
    Eof,
    /// Explicit newline token (the parser treats these as insignificant)
    Newline,

    // Literals
    /// Integer literal, e.g. `42`
    Int,
    /// Floating point literal, e.g. `3.14`
    Float,
    /// Character literal; the lexeme holds the decoded character
    Char,
    /// String literal; the lexeme holds the escape-processed content
    Str,
    /// Boolean literal `true` or `false`
    Bool,
    /// The `null` literal
    Null,

    // Identifiers and keywords
    /// Identifier: `[A-Za-z_][A-Za-z0-9_]*`
    Identifier,
    /// Type-name keyword such as `int32`, `double`, `bool`, `str`, `void`
    TypeName,
    /// `let`
    Let,
    /// `const`
    Const,
    /// `function`
    Function,
    /// `extern`
    Extern,
    /// `if`
    If,
    /// `else`
    Else,
    /// `while`
    While,
    /// `for`
    For,
    /// `return`
    Return,
    /// `as` - cast operator keyword
    As,

    // Operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*` - multiplication or dereference
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `=` - assignment
    Eq,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Not,
    /// `&` - bitwise AND or address-of
    Amp,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,

    // Delimiters
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,

    /// Unrecognized input; carries the offending text for error recovery
    Invalid,
}

/// A single lexical unit
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// Lexical category
    pub kind: TokenKind,
    /// Text content. For string and character literals this is the
    /// escape-processed value; for everything else it mirrors the source.
    pub lexeme: String,
    /// Line number where the token starts (1-based)
    pub line: u32,
    /// Column number where the token starts (1-based)
    pub column: u32,
}

impl Token {
    /// Construct a token
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }

    /// Point span at the start of this token
    pub fn span(&self) -> Span {
        Span::point(self.line, self.column)
    }

    /// True for the EOF marker
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

/// Classify an identifier run as a keyword, a type-name keyword, a literal
/// keyword, or a plain identifier.
pub fn classify_ident(text: &str) -> TokenKind {
    match text {
        "let" => TokenKind::Let,
        "const" => TokenKind::Const,
        "function" => TokenKind::Function,
        "extern" => TokenKind::Extern,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "return" => TokenKind::Return,
        "as" => TokenKind::As,

        "true" | "false" => TokenKind::Bool,
        "null" => TokenKind::Null,

        "int" | "int8" | "int16" | "int32" | "int64" | "isize" | "uint8" | "uint16" | "uint32"
        | "uint64" | "usize" | "float" | "double" | "bool" | "boolean" | "char" | "str"
        | "string" | "void" | "unit" => TokenKind::TypeName,

        _ => TokenKind::Identifier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_keywords() {
        assert_eq!(classify_ident("let"), TokenKind::Let);
        assert_eq!(classify_ident("const"), TokenKind::Const);
        assert_eq!(classify_ident("function"), TokenKind::Function);
        assert_eq!(classify_ident("extern"), TokenKind::Extern);
        assert_eq!(classify_ident("return"), TokenKind::Return);
        assert_eq!(classify_ident("as"), TokenKind::As);
    }

    #[test]
    fn test_classify_literals() {
        assert_eq!(classify_ident("true"), TokenKind::Bool);
        assert_eq!(classify_ident("false"), TokenKind::Bool);
        assert_eq!(classify_ident("null"), TokenKind::Null);
    }

    #[test]
    fn test_classify_type_names() {
        assert_eq!(classify_ident("int32"), TokenKind::TypeName);
        assert_eq!(classify_ident("uint64"), TokenKind::TypeName);
        assert_eq!(classify_ident("double"), TokenKind::TypeName);
        assert_eq!(classify_ident("str"), TokenKind::TypeName);
        assert_eq!(classify_ident("void"), TokenKind::TypeName);
        assert_eq!(classify_ident("int"), TokenKind::TypeName);
    }

    #[test]
    fn test_classify_plain_identifier() {
        assert_eq!(classify_ident("foo"), TokenKind::Identifier);
        assert_eq!(classify_ident("int323"), TokenKind::Identifier);
        assert_eq!(classify_ident("_main"), TokenKind::Identifier);
    }

    #[test]
    fn test_token_span() {
        let tok = Token::new(TokenKind::Identifier, "x", 4, 9);
        assert_eq!(tok.span().line, 4);
        assert_eq!(tok.span().column, 9);
    }
}
