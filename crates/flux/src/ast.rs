//! The AST produced by the parser.
//!
//! Node families are arena-indexed sum types: each `Expr`/`Stmt`/`Decl`/
//! `TypeExpr` lives in its own `Arena` and refers to children by `Id`
//! rather than by owned sub-tree or borrowed reference, so the evaluator
//! never threads an `'arena` lifetime through `Value` (see `arena.rs`).
//! Source ranges live in a side table keyed by the same id, keeping each
//! node payload small regardless of how large its subtree grows.

use crate::arena::{Arena, Id};
use crate::source::SourceRange;

pub type ExprId = Id<Expr>;
pub type StmtId = Id<Stmt>;
pub type DeclId = Id<Decl>;
pub type TypeId = Id<TypeExpr>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    /// Logical `xor`, evaluated on truthiness like `and`/`or` rather than
    /// bitwise like `BitXor`.
    Xor,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

/// A literal parsed value, already converted from its token payload.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Null,
}

/// Design-level type tags.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    Void,
    Bool,
    Int { bits: u16, signed: bool },
    Float { bits: u16 },
    Char,
    String,
    Pointer(TypeId),
    Array { element: TypeId, len: Option<ExprId> },
    Function { params: Vec<TypeId>, ret: TypeId },
    /// A reference to a user-declared struct/class/object/union/typedef or
    /// template instantiation by (possibly qualified) name, resolved at
    /// evaluation time rather than as a direct pointer — sidesteps pointer
    /// cycles between mutually referencing classes.
    Named { path: Vec<String>, type_args: Vec<TypeId> },
    Null,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(LiteralValue),
    Variable(String),
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
    },
    Index {
        array: ExprId,
        index: ExprId,
    },
    Member {
        object: ExprId,
        name: String,
    },
    ArrowMember {
        pointer: ExprId,
        name: String,
    },
    ScopeResolve {
        path: Vec<String>,
    },
    ArrayLiteral(Vec<ExprId>),
    IString {
        format_parts: Vec<String>,
        args: Vec<ExprId>,
    },
    Cast {
        target: TypeId,
        operand: ExprId,
    },
    Sizeof(SizeofOperand),
    Typeof(ExprId),
    Assign {
        /// Compound-assignment operator, if any (`+=` etc); `None` for `=`.
        op: Option<BinaryOp>,
        target: ExprId,
        value: ExprId,
    },
    Ternary {
        cond: ExprId,
        then_branch: ExprId,
        else_branch: ExprId,
    },
    AddressOf(ExprId),
    Dereference(ExprId),
    /// `Class(args){}` object-construction expression.
    Instantiate {
        class: ExprId,
        args: Vec<ExprId>,
    },
}

#[derive(Debug, Clone)]
pub enum SizeofOperand {
    Expr(ExprId),
    Type(TypeId),
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub value: ExprId,
    pub body: Vec<StmtId>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression(ExprId),
    Block(Vec<StmtId>),
    VariableDecl {
        name: String,
        ty: Option<TypeId>,
        init: Option<ExprId>,
        is_global: bool,
    },
    If {
        cond: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
    While {
        cond: ExprId,
        body: StmtId,
    },
    DoWhile {
        body: StmtId,
        cond: ExprId,
    },
    For {
        init: Option<StmtId>,
        cond: Option<ExprId>,
        step: Option<ExprId>,
        body: StmtId,
    },
    ForEach {
        var: String,
        iter: ExprId,
        body: StmtId,
    },
    Return(Option<ExprId>),
    Break,
    Continue,
    Throw(ExprId),
    TryCatch {
        try_block: StmtId,
        catch_var: String,
        catch_type: Option<TypeId>,
        catch_body: StmtId,
    },
    Asm(String),
    Switch {
        scrutinee: ExprId,
        cases: Vec<SwitchCase>,
        default: Option<Vec<StmtId>>,
    },
    Assert(ExprId),
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeId>,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub params: Vec<Param>,
    pub return_ty: Option<TypeId>,
    pub body: StmtId,
    pub is_volatile: bool,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: Option<TypeId>,
    pub init: Option<ExprId>,
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone)]
pub struct ObjectDecl {
    /// The `:Parent.Peer` override target, if this nested object overrides
    /// a peer namespace on the parent class.
    pub overrides: Option<Vec<String>>,
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<DeclId>,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub parent: Option<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<DeclId>,
    pub nested_objects: Vec<ObjectDecl>,
}

#[derive(Debug, Clone)]
pub struct UnionDecl {
    pub name: String,
    pub variants: Vec<(String, TypeId)>,
}

#[derive(Debug, Clone)]
pub struct NamespaceDecl {
    pub name: String,
    pub declarations: Vec<DeclId>,
}

#[derive(Debug, Clone)]
pub enum Decl {
    Function(FunctionDecl),
    Struct(StructDecl),
    Class(ClassDecl),
    Object(ObjectDecl),
    Union(UnionDecl),
    Namespace(NamespaceDecl),
    Typedef { name: String, ty: TypeId },
    Import { path: String, alias: Option<String> },
    UsingDirective { qualified_name: Vec<String> },
}

/// A whole compilation unit: every arena plus the top-level declaration
/// list, ready for symbol resolution and evaluation.
#[derive(Default)]
pub struct Program {
    pub exprs: Arena<Expr>,
    pub stmts: Arena<Stmt>,
    pub decls: Arena<Decl>,
    pub types: Arena<TypeExpr>,
    /// Parallel to `exprs`/`stmts`: index `i` holds the range for the node
    /// allocated at `Id` index `i`. Kept as plain `Vec`s rather than another
    /// `Arena` since they are only ever indexed by a sibling id's raw index,
    /// never handed out as an `Id` of their own.
    expr_ranges: Vec<SourceRange>,
    stmt_ranges: Vec<SourceRange>,
    pub declarations: Vec<DeclId>,
}

impl Program {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, expr: Expr, range: SourceRange) -> ExprId {
        let id = self.exprs.alloc(expr);
        self.expr_ranges.push(range);
        id
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt, range: SourceRange) -> StmtId {
        let id = self.stmts.alloc(stmt);
        self.stmt_ranges.push(range);
        id
    }

    /// Declarations don't need a range side-table of their own: diagnostics
    /// about a whole declaration anchor on its name or a contained
    /// statement/expression range instead.
    pub fn alloc_decl(&mut self, decl: Decl, _range: SourceRange) -> DeclId {
        self.decls.alloc(decl)
    }

    #[must_use]
    pub fn expr_range(&self, id: ExprId) -> SourceRange {
        self.expr_ranges[id.index()]
    }

    #[must_use]
    pub fn stmt_range(&self, id: StmtId) -> SourceRange {
        self.stmt_ranges[id.index()]
    }

    /// The top-level declarations in source order, resolved from
    /// `declarations` through `decls` — used by embedding hosts (the `-ast`
    /// CLI flag) that want to walk the tree without reaching into `Arena`.
    pub fn top_level_declarations(&self) -> impl Iterator<Item = &Decl> {
        self.declarations.iter().map(|&id| self.decls.get(id))
    }
}
