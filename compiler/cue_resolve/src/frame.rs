// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! [`Frame`]: a unit of lazy evaluation tied to one AST node (or, for the comprehension clause
//! chain and the package root, to no single node at all). Frames form a tree via `parent`;
//! lexical lookup walks that tree, while structural merging is the [`crate::navigable::Navigable`]
//! each frame points at. See `cue_resolve::package::PackageEvaluator::evaluate` for the case
//! analysis that actually populates a frame's bindings, children, and paths.

use cue_ast::ast::{
    Attribute, Comprehension, Expr, ImportSpec, Package, StructLit,
};
use cue_data_structures::{range_set::RangeSet, span::Span};
use rustc_hash::FxHashMap;
use std::rc::Rc;

use crate::{
    field_decl::FieldDeclExpr,
    id::{FrameId, NavigableId, PathId},
    node::AstNode,
};

/// The AST shape a frame was spawned to evaluate. `Root` and `ComprehensionClause` are the two
/// shapes with no single backing parser node — the package root frame is synthetic, and a
/// comprehension's clause chain shares one [`Comprehension`] across several frames.
#[derive(Clone)]
pub enum FrameNode {
    /// The package root. Every file frame is a child of this frame.
    Root,
    /// One input file.
    File(Rc<cue_ast::ast::File>),
    /// A struct literal (or a comprehension's per-iteration body struct).
    Struct(Rc<StructLit>),
    /// An expression evaluated in some position: a field's value, an embedding, a unary/binary
    /// operand, a call argument, an ellipsis's type constraint, a deprecated alias's right-hand
    /// side. `embeds` records whether *this* frame's own navigable is the receiver a resolved
    /// path should feed into (a field value, an embedded struct element, a conjunction or
    /// disjunction operand) as opposed to a position that resolves but never merges (a unary
    /// operand, a call argument, a non-`&`/`|` binary operand) — see
    /// `PackageEvaluator::evaluate_expr_frame`.
    Expr { expr: Expr, embeds: bool },
    /// The synthetic label-resolution node for a field (see [`crate::field_decl`]).
    FieldDecl(Rc<FieldDeclExpr>),
    /// An import spec, at file-frame level (phase one — see `package::evaluate_import_spec`).
    ImportSpec(Rc<ImportSpec>),
    /// The same import spec, re-encountered inside its own child frame (phase two).
    ImportSpecRemote(Rc<ImportSpec>),
    /// A `package foo` clause.
    PackageClause(Rc<Package>),
    /// One link in a comprehension's clause chain: `comp.clauses[index]`, or (once
    /// `index == comp.clauses.len()`) the comprehension's body struct. `body_nav` is
    /// pre-allocated when the chain is first spawned and threaded through every link, so the
    /// embedding path set up at the comprehension's use site can name the body's eventual
    /// navigable before the body frame itself exists (the "stashing table" of spec §4.2).
    ComprehensionClause {
        comp: Rc<Comprehension>,
        index: usize,
        body_nav: NavigableId,
    },
    /// An `@attr(...)` attribute, when attribute-embedding is configured.
    Attribute(Rc<Attribute>),
}

/// A unit of lazy evaluation.
pub struct Frame {
    /// The parent frame. `None` only for the package root.
    pub parent: Option<FrameId>,
    /// The AST shape this frame evaluates.
    pub node: FrameNode,
    /// Children spawned during evaluation, in the order they were created.
    pub children: Vec<FrameId>,
    /// Child paths created during evaluation, in the order they were created. Sorted by their
    /// first component's start position once evaluation completes, so
    /// `crate::definitions::binary_search_component` can binary-search them.
    pub paths: Vec<PathId>,
    /// Lexical bindings: name to the (ordered) list of child frames bound under it. A name can
    /// bind more than one frame (e.g. two `let x` bindings would be a parse error, but a
    /// comprehension chain's `for`/`let` bindings and an enclosing alias can coincide in
    /// practice during incremental construction).
    pub lexical: FxHashMap<Rc<str>, Vec<FrameId>>,
    /// Ellipsis navigables belonging to a struct/file frame's own elements (not those of a
    /// nested struct) — the fallback `navigate_by_name` consults when no direct binding exists.
    pub ellipses: Vec<NavigableId>,
    /// The navigable this frame contributes to.
    pub navigable: NavigableId,
    /// The inclusive byte range of this frame. May exceed the backing node's own span (a
    /// conjunction's operand frames are extended to cover the whole `&` expression).
    pub span: Span,
    /// The defining token returned by a definitions query that resolves to this frame's
    /// navigable (a field's label ident/literal, a package clause, an import spec, an ellipsis
    /// token standing in for the catch-all slot it widens indexing into).
    pub key: Option<AstNode>,
    /// Doc comments immediately preceding this frame's declaration, if any.
    pub docs: Option<Rc<cue_ast::ast::CommentGroup>>,
    /// Byte ranges inside this frame with no useful analysis (opaque AST node, string literal).
    pub unknown: RangeSet,
    /// Whether this frame has been forced to evaluate. Latches true; never reset except by a
    /// whole-evaluator `reset`.
    pub evaluated: bool,
}

impl Frame {
    pub fn new(parent: Option<FrameId>, node: FrameNode, navigable: NavigableId, span: Span) -> Self {
        Self {
            parent,
            node,
            children: Vec::new(),
            paths: Vec::new(),
            lexical: FxHashMap::default(),
            ellipses: Vec::new(),
            navigable,
            span,
            key: None,
            docs: None,
            unknown: RangeSet::new(),
            evaluated: false,
        }
    }

    /// Adds `child` under `name` in this frame's lexical bindings.
    pub fn bind_lexical(&mut self, name: Rc<str>, child: FrameId) {
        self.lexical.entry(name).or_default().push(child);
    }
}
