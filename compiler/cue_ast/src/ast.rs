// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The abstract syntax tree (AST) for CUE. The core consumes trees built from these node
//! types; building them is the job of a lexer/parser that lives outside this crate (or, for
//! tests, the [`crate::builder`] module).
//!
//! Structural child fields are held behind [`Rc`] rather than [`Box`]. The resolver's frames
//! are shared, lazily-evaluated views over this tree (see `cue_resolve::frame`); a frame
//! needs to keep an independent, cheaply-cloned handle on the exact node it evaluates
//! without copying subtrees or fighting the borrow checker over a self-referential arena.
//! Any enum whose variants are themselves `Rc`-wrapped (`Expr`, `Decl`, `Clause`) is cheap to
//! clone by value and so is stored directly, without an extra layer of `Rc`.

#![warn(missing_docs)]

use cue_data_structures::span::Span;
use indenter::{indented, Format, Indented};
use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter, Write},
    hash::{Hash, Hasher},
    rc::Rc,
};

fn set_indentation<'a, 'b>(
    indent: Indented<'a, Formatter<'b>>,
    level: usize,
) -> Indented<'a, Formatter<'b>> {
    indent.with_format(Format::Custom {
        inserter: Box::new(move |_, f| {
            for _ in 0..level {
                write!(f, "    ")?;
            }
            Ok(())
        }),
    })
}

/// The unique identifier for an AST node.
#[derive(Clone, Copy, Debug)]
pub struct NodeId(u32);

impl NodeId {
    const DEFAULT_VALUE: u32 = u32::MAX;

    /// The ID of the first node.
    pub const FIRST: Self = Self(0);

    /// The successor of this ID.
    #[must_use]
    pub fn successor(self) -> Self {
        Self(self.0 + 1)
    }

    /// True if this is the default ID.
    #[must_use]
    pub fn is_default(self) -> bool {
        self.0 == Self::DEFAULT_VALUE
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self(Self::DEFAULT_VALUE)
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.is_default() {
            f.write_str("_id_")
        } else {
            self.0.fmt(f)
        }
    }
}

impl From<NodeId> for usize {
    fn from(value: NodeId) -> Self {
        assert!(!value.is_default(), "default node ID should be replaced");
        value.0 as usize
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        Self(u32::try_from(value).expect("node ID should fit into u32"))
    }
}

impl PartialEq for NodeId {
    fn eq(&self, other: &Self) -> bool {
        assert!(!self.is_default(), "default node ID should be replaced");
        self.0 == other.0
    }
}

impl Eq for NodeId {}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        assert!(!self.is_default(), "default node ID should be replaced");
        self.0.cmp(&other.0)
    }
}

impl Hash for NodeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// A node that carries a stable identity and a source range.
pub trait Node {
    /// The node's identifier.
    fn id(&self) -> NodeId;
    /// The byte offset of the node's first byte.
    fn pos(&self) -> usize;
    /// The byte offset one past the node's last byte.
    fn end(&self) -> usize;
    /// The node's span, equivalent to `pos()..end()`.
    fn span(&self) -> Span {
        Span::new(self.pos(), self.end())
    }
}

macro_rules! impl_node {
    ($ty:ty) => {
        impl Node for $ty {
            fn id(&self) -> NodeId {
                self.id
            }

            fn pos(&self) -> usize {
                self.span.lo
            }

            fn end(&self) -> usize {
                self.span.hi
            }
        }
    };
}

/// A group of consecutive line or block comments attached to a declaration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommentGroup {
    /// The node ID.
    pub id: NodeId,
    /// The span covering every comment in the group.
    pub span: Span,
    /// The comment text, one entry per physical comment line, markers stripped.
    pub lines: Box<[Rc<str>]>,
}
impl_node!(CommentGroup);

impl Display for CommentGroup {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "CommentGroup {} {}:", self.id, self.span)?;
        for line in &self.lines {
            write!(f, " //{line}")?;
        }
        Ok(())
    }
}

/// A parsed source file: the root a [`crate::builder`] or an external parser hands to the
/// core's `PackageEvaluator` for one input file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct File {
    /// The node ID.
    pub id: NodeId,
    /// The span, extended one byte past EOF so a cursor past the last character still lands
    /// inside the file's frame.
    pub span: Span,
    /// The file's name, as it will be looked up by `FileEvaluator`.
    pub name: Rc<str>,
    /// The `package` clause, if present.
    pub package: Option<Rc<Package>>,
    /// Top-level declarations, in source order (imports appear among these as
    /// [`Decl::Import`]).
    pub decls: Box<[Decl]>,
}
impl_node!(File);

impl File {
    /// The size in bytes of the file's source text (not counting the synthetic EOF byte).
    #[must_use]
    pub fn size(&self) -> usize {
        self.span.hi.saturating_sub(1)
    }
}

impl Display for File {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "File {} {} \"{}\":", self.id, self.span, self.name)?;
        indent = set_indentation(indent, 1);
        if let Some(package) = &self.package {
            write!(indent, "\n{package}")?;
        }
        for decl in &self.decls {
            write!(indent, "\n{decl}")?;
        }
        Ok(())
    }
}

/// A `package foo` clause.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Package {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The package name, absent for an anonymous `package _` (rare, but tolerated).
    pub name: Option<Rc<Ident>>,
}
impl_node!(Package);

impl Display for Package {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Package {} {}", self.id, self.span)?;
        if let Some(name) = &self.name {
            write!(f, " ({name})")?;
        }
        Ok(())
    }
}

/// A top-level `import ( ... )` clause, grouping one or more [`ImportSpec`]s.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportDecl {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The individual import specs.
    pub specs: Box<[Rc<ImportSpec>]>,
}
impl_node!(ImportDecl);

impl Display for ImportDecl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "ImportDecl {} {}:", self.id, self.span)?;
        indent = set_indentation(indent, 1);
        for spec in &self.specs {
            write!(indent, "\n{spec}")?;
        }
        Ok(())
    }
}

/// A single `alias "import/path"` entry within an [`ImportDecl`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportSpec {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// An explicit alias, when the import is written `alias "path"`.
    pub alias: Option<Rc<Ident>>,
    /// The quoted import path literal as written in source.
    pub path: Rc<BasicLit>,
}
impl_node!(ImportSpec);

impl Display for ImportSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ImportSpec {} {}", self.id, self.span)?;
        if let Some(alias) = &self.alias {
            write!(f, " ({alias})")?;
        }
        write!(f, " {}", self.path)
    }
}

/// A struct literal: `{ ... }`. Also the shape of a [`File`]'s top-level declaration list
/// once it is wrapped for uniform processing (a file and a struct literal enqueue their
/// elements identically).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructLit {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The struct's declarations, in source order.
    pub elements: Box<[Decl]>,
}
impl_node!(StructLit);

impl Display for StructLit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "StructLit {} {}:", self.id, self.span)?;
        indent = set_indentation(indent, 1);
        for elt in &self.elements {
            write!(indent, "\n{elt}")?;
        }
        Ok(())
    }
}

/// A list literal: `[ ... ]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListLit {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The list's elements, in source order. An [`Expr::Ellipsis`] may appear as the final
    /// element.
    pub elements: Box<[Expr]>,
}
impl_node!(ListLit);

impl Display for ListLit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "ListLit {} {}:", self.id, self.span)?;
        indent = set_indentation(indent, 1);
        for elt in &self.elements {
            write!(indent, "\n{elt}")?;
        }
        Ok(())
    }
}

/// Where an alias bound on a field's label is visible.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum AliasScope {
    /// The label carries no alias.
    #[default]
    None,
    /// `X=foo: bar` — `X` is visible to every declaration in the enclosing struct.
    Parent,
    /// `[X=pattern]: bar` — `X` is visible only inside this field's own value.
    Value,
}

/// The shape of a field's key.
#[derive(Clone, Debug, PartialEq)]
pub enum LabelKind {
    /// A plain identifier key: `foo: bar`.
    Ident(Rc<Ident>),
    /// A quoted string key: `"foo-bar": baz`.
    String(Rc<BasicLit>),
    /// A numeric key, as in a synthesized list-index field. Stored as the literal `N`; the
    /// core derives the `__N` navigable name from it.
    Numeric(Rc<BasicLit>),
    /// A bracketed, possibly dynamic key: `[string]: bar`, `[X=string]: bar`. Opaque to
    /// MAY-analysis beyond any alias it carries.
    Paren(Expr),
}

impl Default for LabelKind {
    fn default() -> Self {
        Self::Ident(Rc::default())
    }
}

/// The label half of a [`Field`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Label {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The label's shape.
    pub kind: LabelKind,
    /// An alias bound on this label, if any.
    pub alias: Option<Rc<Ident>>,
    /// Where `alias` is visible. `AliasScope::None` when `alias` is `None`.
    pub alias_scope: AliasScope,
}
impl_node!(Label);

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Label {} {}:", self.id, self.span)?;
        if let Some(alias) = &self.alias {
            write!(f, " alias={alias} ({:?})", self.alias_scope)?;
        }
        match &self.kind {
            LabelKind::Ident(ident) => write!(f, " {ident}"),
            LabelKind::String(lit) | LabelKind::Numeric(lit) => write!(f, " {lit}"),
            LabelKind::Paren(expr) => write!(f, " [{expr}]"),
        }
    }
}

/// A single field declaration: `label: value`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Field {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The field's key.
    pub label: Rc<Label>,
    /// Whether the field is marked optional (`label?: value`).
    pub optional: bool,
    /// The field's value expression.
    pub value: Expr,
    /// Attributes attached to this field, e.g. `@embed(...)`.
    pub attributes: Box<[Rc<Attribute>]>,
    /// Doc comments immediately preceding the field.
    pub docs: Option<Rc<CommentGroup>>,
}
impl_node!(Field);

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Field {} {}:", self.id, self.span)?;
        indent = set_indentation(indent, 1);
        write!(indent, "\n{}", self.label)?;
        write!(indent, "\n{}", self.value)?;
        for attr in &self.attributes {
            write!(indent, "\n{attr}")?;
        }
        Ok(())
    }
}

/// An embedded expression used as a struct element: its resolved fields merge into the
/// enclosing struct.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmbedDecl {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The embedded expression.
    pub expr: Expr,
}
impl_node!(EmbedDecl);

impl Display for EmbedDecl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "EmbedDecl {} {}: {}", self.id, self.span, self.expr)
    }
}

/// The deprecated standalone alias declaration: `X = expr`. Also used inline (e.g. as a list
/// element `X=foo`) and wrapped inside a [`Label`]'s alias, which stores the ident directly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Alias {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The bound name.
    pub ident: Rc<Ident>,
    /// The aliased expression.
    pub expr: Expr,
}
impl_node!(Alias);

impl Display for Alias {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Alias {} {}: {} = {}",
            self.id, self.span, self.ident, self.expr
        )
    }
}

/// An ellipsis: `...` or `...T`, terminating a list or struct.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ellipsis {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The optional type/value constraint following the ellipsis.
    pub ty: Option<Expr>,
}
impl_node!(Ellipsis);

impl Display for Ellipsis {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Ellipsis {} {}", self.id, self.span)?;
        if let Some(ty) = &self.ty {
            write!(f, " {ty}")?;
        }
        Ok(())
    }
}

/// One piece of an interpolated string: either literal text or an embedded expression.
#[derive(Clone, Debug, PartialEq)]
pub enum StringComponent {
    /// A literal run of text.
    Lit(Rc<str>),
    /// An embedded `\(expr)`.
    Expr(Expr),
}

/// An interpolated string: `"a \(b) c"`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Interpolation {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The interpolation's pieces, in source order.
    pub components: Box<[StringComponent]>,
}
impl_node!(Interpolation);

impl Display for Interpolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Interpolation {} {}:", self.id, self.span)?;
        indent = set_indentation(indent, 1);
        for component in &self.components {
            match component {
                StringComponent::Lit(s) => write!(indent, "\nLit: \"{s}\"")?,
                StringComponent::Expr(e) => write!(indent, "\n{e}")?,
            }
        }
        Ok(())
    }
}

/// A parenthesized expression: `(a)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParenExpr {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The inner expression.
    pub expr: Expr,
}
impl_node!(ParenExpr);

impl Display for ParenExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ParenExpr {} {}: {}", self.id, self.span, self.expr)
    }
}

/// A prefix unary operator.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UnOp {
    /// `+a`.
    Pos,
    /// `-a`.
    Neg,
    /// `!a`.
    Not,
    /// `*a`, a default marker inside a disjunction.
    Default,
    /// `=~a`.
    Match,
    /// `!~a`.
    NotMatch,
}

impl Default for UnOp {
    fn default() -> Self {
        Self::Pos
    }
}

impl Display for UnOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnOp::Pos => "+",
            UnOp::Neg => "-",
            UnOp::Not => "!",
            UnOp::Default => "*",
            UnOp::Match => "=~",
            UnOp::NotMatch => "!~",
        })
    }
}

/// A unary operator expression: `op expr`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnaryExpr {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The operator.
    pub op: UnOp,
    /// The operand.
    pub expr: Expr,
}
impl_node!(UnaryExpr);

impl Display for UnaryExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UnaryExpr {} {} ({}): {}",
            self.id, self.span, self.op, self.expr
        )
    }
}

/// A binary operator.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinOp {
    /// `&`, conjunction.
    And,
    /// `|`, disjunction.
    Or,
    /// Any other binary operator (`+ - * / == != < <= > >= =~ !~`), which the core resolves
    /// through but never merges or embeds.
    Other,
}

impl Default for BinOp {
    fn default() -> Self {
        Self::Other
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Other => "other",
        })
    }
}

/// A binary operator expression: `lhs op rhs`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BinaryExpr {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The operator.
    pub op: BinOp,
    /// The left operand.
    pub lhs: Expr,
    /// The right operand.
    pub rhs: Expr,
}
impl_node!(BinaryExpr);

impl Display for BinaryExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "BinaryExpr {} {} ({}):", self.id, self.span, self.op)?;
        indent = set_indentation(indent, 1);
        write!(indent, "\n{}", self.lhs)?;
        write!(indent, "\n{}", self.rhs)?;
        Ok(())
    }
}

/// A call: `callee(args...)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallExpr {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The callee.
    pub callee: Expr,
    /// The call arguments.
    pub args: Box<[Expr]>,
}
impl_node!(CallExpr);

impl Display for CallExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "CallExpr {} {}:", self.id, self.span)?;
        indent = set_indentation(indent, 1);
        write!(indent, "\n{}", self.callee)?;
        for arg in &self.args {
            write!(indent, "\n{arg}")?;
        }
        Ok(())
    }
}

/// The selector half of a [`SelectorExpr`].
#[derive(Clone, Debug, PartialEq)]
pub enum Selector {
    /// `a.b`.
    Ident(Rc<Ident>),
    /// `a."b-c"`.
    String(Rc<BasicLit>),
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Ident(ident) => ident.fmt(f),
            Selector::String(lit) => lit.fmt(f),
        }
    }
}

/// A selector expression: `expr.sel`.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectorExpr {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The expression being selected into.
    pub expr: Expr,
    /// The field being selected.
    pub sel: Selector,
}

impl Default for SelectorExpr {
    fn default() -> Self {
        Self {
            id: NodeId::default(),
            span: Span::default(),
            expr: Expr::default(),
            sel: Selector::Ident(Rc::default()),
        }
    }
}
impl_node!(SelectorExpr);

impl Display for SelectorExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SelectorExpr {} {}: {} . {}",
            self.id, self.span, self.expr, self.sel
        )
    }
}

/// An index expression: `expr[index]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexExpr {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The indexed expression.
    pub expr: Expr,
    /// The index expression. Only literal integer/string indices are ever resolved; any
    /// other shape defeats indexing.
    pub index: Expr,
}
impl_node!(IndexExpr);

impl Display for IndexExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IndexExpr {} {}: {} [ {} ]",
            self.id, self.span, self.expr, self.index
        )
    }
}

/// A postfix marker, e.g. the optional-field marker `?` when it trails an expression
/// position rather than a label (used in a handful of constraint positions).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PostfixOp {
    /// `expr?`.
    Optional,
    /// `expr!`, a required-field marker.
    Required,
}

impl Default for PostfixOp {
    fn default() -> Self {
        Self::Optional
    }
}

/// A postfix-operator expression: `expr op`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostfixExpr {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The operand.
    pub expr: Expr,
    /// The operator.
    pub op: PostfixOp,
}
impl_node!(PostfixExpr);

impl Display for PostfixExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PostfixExpr {} {}: {} {:?}",
            self.id, self.span, self.expr, self.op
        )
    }
}

/// An identifier.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Ident {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The identifier's text.
    pub name: Rc<str>,
}
impl_node!(Ident);

impl Display for Ident {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Ident {} {} \"{}\"", self.id, self.span, self.name)
    }
}

/// The shape of a [`BasicLit`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BasicLitKind {
    /// An integer literal.
    Int,
    /// A floating-point literal.
    Float,
    /// A string literal (already unquoted/unescaped by the parser).
    String,
    /// `true` or `false`.
    Bool,
    /// `null`.
    Null,
    /// `_|_`, the bottom value.
    Bottom,
}

impl Default for BasicLitKind {
    fn default() -> Self {
        Self::String
    }
}

/// A literal: numeric, string, boolean, null, or bottom.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BasicLit {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The literal's kind.
    pub kind: BasicLitKind,
    /// The literal's value, already decoded (e.g. a string literal's *contents*, not its
    /// quoted source text).
    pub value: Rc<str>,
}
impl_node!(BasicLit);

impl Display for BasicLit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BasicLit {} {} {:?}(\"{}\")",
            self.id, self.span, self.kind, self.value
        )
    }
}

/// A list/struct comprehension: `for k, v in src { ... }`, `if cond { ... }`, chained.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Comprehension {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The clause chain, in source order.
    pub clauses: Box<[Clause]>,
    /// The struct produced per iteration.
    pub value: Rc<StructLit>,
}
impl_node!(Comprehension);

impl Display for Comprehension {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Comprehension {} {}:", self.id, self.span)?;
        indent = set_indentation(indent, 1);
        for clause in &self.clauses {
            write!(indent, "\n{clause}")?;
        }
        write!(indent, "\n{}", self.value)?;
        Ok(())
    }
}

/// One clause in a comprehension's clause chain.
#[derive(Clone, Debug, PartialEq)]
pub enum Clause {
    /// A `for` clause.
    For(Rc<ForClause>),
    /// An `if` clause.
    If(Rc<IfClause>),
    /// A `let` clause.
    Let(Rc<LetClause>),
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Clause::For(c) => c.fmt(f),
            Clause::If(c) => c.fmt(f),
            Clause::Let(c) => c.fmt(f),
        }
    }
}

/// `for key, value in source` (the `key` binding is optional: `for value in source`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForClause {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The (optional) key binding.
    pub key: Option<Rc<Ident>>,
    /// The value binding.
    pub value: Rc<Ident>,
    /// The iterated expression.
    pub source: Expr,
}
impl_node!(ForClause);

impl Display for ForClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ForClause {} {}:", self.id, self.span)?;
        if let Some(key) = &self.key {
            write!(f, " key={key}")?;
        }
        write!(f, " value={} in {}", self.value, self.source)
    }
}

/// An `if cond` comprehension guard.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IfClause {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The guard condition.
    pub cond: Expr,
}
impl_node!(IfClause);

impl Display for IfClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "IfClause {} {}: {}", self.id, self.span, self.cond)
    }
}

/// A `let name = expr` comprehension binding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LetClause {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The bound name.
    pub ident: Rc<Ident>,
    /// The bound expression.
    pub expr: Expr,
}
impl_node!(LetClause);

impl Display for LetClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LetClause {} {}: {} = {}",
            self.id, self.span, self.ident, self.expr
        )
    }
}

/// An attribute attached to a field or declaration: `@name(body)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attribute {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The attribute name.
    pub name: Rc<Ident>,
    /// The raw, unparsed text inside the parens.
    pub text: Rc<str>,
}
impl_node!(Attribute);

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Attribute {} {} @{}({})",
            self.id, self.span, self.name, self.text
        )
    }
}

/// A top-level or struct-level declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum Decl {
    /// A field declaration.
    Field(Rc<Field>),
    /// An embedded expression.
    Embed(Rc<EmbedDecl>),
    /// A deprecated standalone alias.
    Alias(Rc<Alias>),
    /// An import block.
    Import(Rc<ImportDecl>),
    /// A standalone attribute.
    Attribute(Rc<Attribute>),
    /// A trailing ellipsis (open struct marker).
    Ellipsis(Rc<Ellipsis>),
    /// A struct comprehension.
    Comprehension(Rc<Comprehension>),
    /// A declaration with invalid syntax that can't be parsed.
    Err(NodeId, Span),
}

impl Decl {
    /// The node ID of the contained declaration.
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self {
            Decl::Field(d) => d.id,
            Decl::Embed(d) => d.id,
            Decl::Alias(d) => d.id,
            Decl::Import(d) => d.id,
            Decl::Attribute(d) => d.id,
            Decl::Ellipsis(d) => d.id,
            Decl::Comprehension(d) => d.id,
            Decl::Err(id, _) => *id,
        }
    }

    /// The span of the contained declaration.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Decl::Field(d) => d.span,
            Decl::Embed(d) => d.span,
            Decl::Alias(d) => d.span,
            Decl::Import(d) => d.span,
            Decl::Attribute(d) => d.span,
            Decl::Ellipsis(d) => d.span,
            Decl::Comprehension(d) => d.span,
            Decl::Err(_, span) => *span,
        }
    }
}

impl Display for Decl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Decl::Field(d) => d.fmt(f),
            Decl::Embed(d) => d.fmt(f),
            Decl::Alias(d) => d.fmt(f),
            Decl::Import(d) => d.fmt(f),
            Decl::Attribute(d) => d.fmt(f),
            Decl::Ellipsis(d) => d.fmt(f),
            Decl::Comprehension(d) => d.fmt(f),
            Decl::Err(id, span) => write!(f, "Err {id} {span}"),
        }
    }
}

/// An expression, in any of the shapes CUE allows in value position.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A struct literal.
    Struct(Rc<StructLit>),
    /// A list literal.
    List(Rc<ListLit>),
    /// An identifier reference.
    Ident(Rc<Ident>),
    /// A literal.
    Lit(Rc<BasicLit>),
    /// An interpolated string.
    Interpolation(Rc<Interpolation>),
    /// A parenthesized expression.
    Paren(Rc<ParenExpr>),
    /// A unary operator expression.
    Unary(Rc<UnaryExpr>),
    /// A binary operator expression.
    Binary(Rc<BinaryExpr>),
    /// A call expression.
    Call(Rc<CallExpr>),
    /// A selector expression.
    Selector(Rc<SelectorExpr>),
    /// An index expression.
    Index(Rc<IndexExpr>),
    /// A postfix operator expression.
    Postfix(Rc<PostfixExpr>),
    /// A bare ellipsis in expression position (e.g. a list element).
    Ellipsis(Rc<Ellipsis>),
    /// A comprehension.
    Comprehension(Rc<Comprehension>),
    /// An inline alias: `X=expr`.
    Alias(Rc<Alias>),
    /// An expression with invalid syntax that can't be parsed.
    Err(NodeId, Span),
}

impl Default for Expr {
    fn default() -> Self {
        Self::Err(NodeId::default(), Span::default())
    }
}

impl Expr {
    /// The node ID of the contained expression.
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self {
            Expr::Struct(e) => e.id,
            Expr::List(e) => e.id,
            Expr::Ident(e) => e.id,
            Expr::Lit(e) => e.id,
            Expr::Interpolation(e) => e.id,
            Expr::Paren(e) => e.id,
            Expr::Unary(e) => e.id,
            Expr::Binary(e) => e.id,
            Expr::Call(e) => e.id,
            Expr::Selector(e) => e.id,
            Expr::Index(e) => e.id,
            Expr::Postfix(e) => e.id,
            Expr::Ellipsis(e) => e.id,
            Expr::Comprehension(e) => e.id,
            Expr::Alias(e) => e.id,
            Expr::Err(id, _) => *id,
        }
    }

    /// The span of the contained expression.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Expr::Struct(e) => e.span,
            Expr::List(e) => e.span,
            Expr::Ident(e) => e.span,
            Expr::Lit(e) => e.span,
            Expr::Interpolation(e) => e.span,
            Expr::Paren(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Selector(e) => e.span,
            Expr::Index(e) => e.span,
            Expr::Postfix(e) => e.span,
            Expr::Ellipsis(e) => e.span,
            Expr::Comprehension(e) => e.span,
            Expr::Alias(e) => e.span,
            Expr::Err(_, span) => *span,
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Struct(e) => e.fmt(f),
            Expr::List(e) => e.fmt(f),
            Expr::Ident(e) => e.fmt(f),
            Expr::Lit(e) => e.fmt(f),
            Expr::Interpolation(e) => e.fmt(f),
            Expr::Paren(e) => e.fmt(f),
            Expr::Unary(e) => e.fmt(f),
            Expr::Binary(e) => e.fmt(f),
            Expr::Call(e) => e.fmt(f),
            Expr::Selector(e) => e.fmt(f),
            Expr::Index(e) => e.fmt(f),
            Expr::Postfix(e) => e.fmt(f),
            Expr::Ellipsis(e) => e.fmt(f),
            Expr::Comprehension(e) => e.fmt(f),
            Expr::Alias(e) => e.fmt(f),
            Expr::Err(id, span) => write!(f, "Err {id} {span}"),
        }
    }
}
