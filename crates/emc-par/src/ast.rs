//! AST node definitions.
//!
//! Three disjoint hierarchies share a common prefix of node id and span:
//! expressions, statements, and declarations (declarations are statements at
//! the grammar level). Ownership is a strict tree - every parent uniquely
//! owns its children, and nodes are immutable once the parser has built
//! them. Semantic analysis records its results in a side table keyed by
//! [`NodeId`], never by mutating the tree.
//!
//! Type annotations are carried as canonical type strings (`int32`,
//! `int32*`, `str`, ...); the semantic crate parses them into its structured
//! type representation.

use emc_util::Span;

/// Identity of an expression node, assigned by the parser.
///
/// Keys the analyzer's type side table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// AST root - an ordered sequence of top-level statements
#[derive(Debug)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// Literal category, tagged on [`LiteralExpr`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Char,
    Str,
    Bool,
    Null,
}

/// Expression
#[derive(Debug)]
pub enum Expr {
    Literal(LiteralExpr),
    Identifier(IdentifierExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Assign(AssignExpr),
    Call(CallExpr),
    Member(MemberExpr),
    Index(IndexExpr),
    Array(ArrayExpr),
    Object(ObjectExpr),
    Cast(CastExpr),
    Deref(DerefExpr),
    AddrOf(AddrOfExpr),
}

impl Expr {
    /// Node identity, shared across all variants
    pub fn id(&self) -> NodeId {
        match self {
            Expr::Literal(e) => e.id,
            Expr::Identifier(e) => e.id,
            Expr::Binary(e) => e.id,
            Expr::Unary(e) => e.id,
            Expr::Assign(e) => e.id,
            Expr::Call(e) => e.id,
            Expr::Member(e) => e.id,
            Expr::Index(e) => e.id,
            Expr::Array(e) => e.id,
            Expr::Object(e) => e.id,
            Expr::Cast(e) => e.id,
            Expr::Deref(e) => e.id,
            Expr::AddrOf(e) => e.id,
        }
    }

    /// Source position, shared across all variants
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(e) => e.span,
            Expr::Identifier(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Assign(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Member(e) => e.span,
            Expr::Index(e) => e.span,
            Expr::Array(e) => e.span,
            Expr::Object(e) => e.span,
            Expr::Cast(e) => e.span,
            Expr::Deref(e) => e.span,
            Expr::AddrOf(e) => e.span,
        }
    }
}

/// Literal expression; `value` keeps the textual form from the token
#[derive(Debug)]
pub struct LiteralExpr {
    pub id: NodeId,
    pub span: Span,
    pub kind: LitKind,
    pub value: String,
}

/// Identifier reference
#[derive(Debug)]
pub struct IdentifierExpr {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
}

/// Binary operation
#[derive(Debug)]
pub struct BinaryExpr {
    pub id: NodeId,
    pub span: Span,
    pub op: BinOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

/// Binary operators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
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

impl BinOp {
    /// Operator spelling as written in source
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        }
    }
}

/// Unary operation (prefix)
#[derive(Debug)]
pub struct UnaryExpr {
    pub id: NodeId,
    pub span: Span,
    pub op: UnOp,
    pub operand: Box<Expr>,
}

/// Unary operators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    /// `-` arithmetic negation
    Neg,
    /// `!` logical not
    Not,
    /// `~` bitwise invert
    BitNot,
}

impl UnOp {
    /// Operator spelling as written in source
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
            UnOp::BitNot => "~",
        }
    }
}

/// Assignment; `target` must be an lvalue (identifier or dereference)
#[derive(Debug)]
pub struct AssignExpr {
    pub id: NodeId,
    pub span: Span,
    pub target: Box<Expr>,
    pub value: Box<Expr>,
}

/// Call of a named function
#[derive(Debug)]
pub struct CallExpr {
    pub id: NodeId,
    pub span: Span,
    pub callee: String,
    pub arguments: Vec<Expr>,
}

/// Member access `object.member`
#[derive(Debug)]
pub struct MemberExpr {
    pub id: NodeId,
    pub span: Span,
    pub object: Box<Expr>,
    pub member: String,
}

/// Index access `object[index]`
#[derive(Debug)]
pub struct IndexExpr {
    pub id: NodeId,
    pub span: Span,
    pub object: Box<Expr>,
    pub index: Box<Expr>,
}

/// Array literal `[a, b, c]`
#[derive(Debug)]
pub struct ArrayExpr {
    pub id: NodeId,
    pub span: Span,
    pub elements: Vec<Expr>,
}

/// Object literal `{ key: value, ... }`
#[derive(Debug)]
pub struct ObjectExpr {
    pub id: NodeId,
    pub span: Span,
    pub fields: Vec<(String, Expr)>,
}

/// Cast `operand as target_type`
#[derive(Debug)]
pub struct CastExpr {
    pub id: NodeId,
    pub span: Span,
    pub operand: Box<Expr>,
    pub target_type: String,
}

/// Pointer dereference `*operand`
#[derive(Debug)]
pub struct DerefExpr {
    pub id: NodeId,
    pub span: Span,
    pub operand: Box<Expr>,
}

/// Address-of `&operand`
#[derive(Debug)]
pub struct AddrOfExpr {
    pub id: NodeId,
    pub span: Span,
    pub operand: Box<Expr>,
}

/// Statement (declarations included)
#[derive(Debug)]
pub enum Stmt {
    Block(BlockStmt),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Return(ReturnStmt),
    Expr(ExprStmt),
    VarDecl(VarDecl),
    FnDecl(FnDecl),
    ExternFnDecl(ExternFnDecl),
}

impl Stmt {
    /// Source position of the statement's leading token
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Expr(s) => s.span,
            Stmt::VarDecl(s) => s.span,
            Stmt::FnDecl(s) => s.span,
            Stmt::ExternFnDecl(s) => s.span,
        }
    }
}

/// Braced statement sequence; lexical only, owns no control flow
#[derive(Debug)]
pub struct BlockStmt {
    pub span: Span,
    pub statements: Vec<Stmt>,
}

/// `if (cond) then else?`
#[derive(Debug)]
pub struct IfStmt {
    pub span: Span,
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
}

/// `while (cond) body`
#[derive(Debug)]
pub struct WhileStmt {
    pub span: Span,
    pub condition: Expr,
    pub body: Box<Stmt>,
}

/// `for (init?; cond?; incr?) body`
///
/// A missing condition means an always-true loop.
#[derive(Debug)]
pub struct ForStmt {
    pub span: Span,
    pub init: Option<Box<Stmt>>,
    pub condition: Option<Expr>,
    pub increment: Option<Expr>,
    pub body: Box<Stmt>,
}

/// `return expr?;`
#[derive(Debug)]
pub struct ReturnStmt {
    pub span: Span,
    pub value: Option<Expr>,
}

/// Expression in statement position
#[derive(Debug)]
pub struct ExprStmt {
    pub span: Span,
    pub expr: Expr,
}

/// `let`/`const` declaration
#[derive(Debug)]
pub struct VarDecl {
    pub span: Span,
    pub name: String,
    /// Declared type in canonical string form, if annotated
    pub ty: Option<String>,
    pub initializer: Option<Expr>,
    pub is_const: bool,
}

/// Function parameter
#[derive(Debug)]
pub struct Param {
    pub span: Span,
    pub name: String,
    /// Parameter type in canonical string form
    pub ty: String,
}

/// `function name(params): ret { body }`
#[derive(Debug)]
pub struct FnDecl {
    pub span: Span,
    pub name: String,
    pub params: Vec<Param>,
    /// Return type in canonical string form; None means `void`
    pub return_type: Option<String>,
    pub body: BlockStmt,
}

/// `extern function name(params): ret;`
#[derive(Debug)]
pub struct ExternFnDecl {
    pub span: Span,
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
}
