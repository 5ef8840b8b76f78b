//! Type annotation parsing.
//!
//! Type annotations appear after `:` in declarations and after `as` in cast
//! expressions. The base name is a type-name keyword or an identifier,
//! followed by zero or more `*` pointer suffixes. Legacy spellings
//! canonicalise here, so the rest of the compiler only ever sees the
//! canonical vocabulary (`int` becomes `int32`, `string` becomes `str`,
//! `boolean` becomes `bool`, `unit` becomes `void`).

use emc_lex::TokenKind;

use crate::{PResult, Parser};

/// Canonical spelling for a base type name.
pub fn canonical_type_name(name: &str) -> String {
    match name {
        "int" => "int32",
        "i8" => "int8",
        "i16" => "int16",
        "i32" => "int32",
        "i64" => "int64",
        "u8" => "uint8",
        "u16" => "uint16",
        "u32" => "uint32",
        "u64" => "uint64",
        "boolean" => "bool",
        "string" => "str",
        "unit" => "void",
        other => other,
    }
    .to_string()
}

impl<'a> Parser<'a> {
    /// Parses a type annotation into its canonical string form.
    ///
    /// Pointer suffixes are consumed greedily; this is the right behavior in
    /// declaration position, where no expression can follow.
    pub(crate) fn parse_type(&mut self) -> PResult<String> {
        let mut ty = self.parse_base_type()?;
        while self.match_kind(TokenKind::Star) {
            ty.push('*');
        }
        Ok(ty)
    }

    /// Parses a cast target inside an expression.
    ///
    /// Here `*` is ambiguous between a pointer suffix and multiplication:
    /// `x as int32* == null` suffixes, `a as int64 * b` multiplies. A star is
    /// taken as a suffix only when the token after it cannot start an
    /// expression.
    pub(crate) fn parse_type_in_expr(&mut self) -> PResult<String> {
        let mut ty = self.parse_base_type()?;
        while self.check(TokenKind::Star) && !starts_expression(self.peek(1).kind) {
            self.advance();
            ty.push('*');
        }
        Ok(ty)
    }

    fn parse_base_type(&mut self) -> PResult<String> {
        if self.check(TokenKind::TypeName) || self.check(TokenKind::Identifier) {
            Ok(canonical_type_name(&self.advance().lexeme))
        } else {
            Err(self.error_here("expected type name"))
        }
    }
}

/// Can a token begin an expression? Used to disambiguate the `*` after a
/// cast target. `Star` itself is excluded so `int32**` reads as a
/// double-pointer suffix.
fn starts_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Int
            | TokenKind::Float
            | TokenKind::Char
            | TokenKind::Str
            | TokenKind::Bool
            | TokenKind::Null
            | TokenKind::Identifier
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::LBrace
            | TokenKind::Not
            | TokenKind::Minus
            | TokenKind::Tilde
            | TokenKind::Amp
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_identity() {
        assert_eq!(canonical_type_name("int32"), "int32");
        assert_eq!(canonical_type_name("double"), "double");
        assert_eq!(canonical_type_name("str"), "str");
    }

    #[test]
    fn test_canonical_aliases() {
        assert_eq!(canonical_type_name("int"), "int32");
        assert_eq!(canonical_type_name("string"), "str");
        assert_eq!(canonical_type_name("boolean"), "bool");
        assert_eq!(canonical_type_name("unit"), "void");
        assert_eq!(canonical_type_name("i64"), "int64");
        assert_eq!(canonical_type_name("u8"), "uint8");
    }

    #[test]
    fn test_custom_name_passthrough() {
        assert_eq!(canonical_type_name("Point"), "Point");
    }
}
