// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! [`AstNode`]: the small set of concrete node shapes that can come back out of a query
//! (`definitions_for_offset`, `usages_for_offset`). The AST itself has no single "any node"
//! type — [`cue_ast::ast::Expr`] and [`cue_ast::ast::Decl`] are the closest things, and neither
//! covers every shape a query can resolve to (a `package` clause, an import spec, a field's own
//! label). This enum is the query-surface's answer to "what is a result", and every variant
//! knows its own [`NodeId`]/[`Span`] via [`cue_ast::ast::Node`].

use cue_ast::ast::{
    Attribute, BasicLit, Ellipsis, Expr, Field, Ident, ImportSpec, Node, NodeId, Package,
};
use cue_data_structures::span::Span;
use std::rc::Rc;

/// A node returned from a query. Cheap to clone (every variant is an `Rc`, or — for `Expr` —
/// wraps one).
#[derive(Clone, Debug, PartialEq)]
pub enum AstNode {
    /// An identifier: a field's ident label, an alias name, a path component.
    Ident(Rc<Ident>),
    /// A literal key: a quoted string label, a numeric label.
    BasicLit(Rc<BasicLit>),
    /// A `package foo` clause, returned when jumping between peer declarations across files.
    Package(Rc<Package>),
    /// An import spec, when a use site is the spec itself rather than a name inside it.
    ImportSpec(Rc<ImportSpec>),
    /// An ellipsis token, `...` or `...T`.
    Ellipsis(Rc<Ellipsis>),
    /// A whole field, when a result names the field itself rather than one piece of its label.
    Field(Rc<Field>),
    /// An `@attr(...)` attribute, when a use site is the embed attribute itself.
    Attribute(Rc<Attribute>),
    /// A disjunction or comprehension expression, recorded as the use site of one of its
    /// branches/body's navigable (there is no more specific single node to point at).
    Expr(Expr),
}

impl AstNode {
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self {
            AstNode::Ident(n) => n.id(),
            AstNode::BasicLit(n) => n.id(),
            AstNode::Package(n) => n.id(),
            AstNode::ImportSpec(n) => n.id(),
            AstNode::Ellipsis(n) => n.id(),
            AstNode::Field(n) => n.id(),
            AstNode::Attribute(n) => n.id(),
            AstNode::Expr(e) => e.id(),
        }
    }

    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            AstNode::Ident(n) => n.span(),
            AstNode::BasicLit(n) => n.span(),
            AstNode::Package(n) => n.span(),
            AstNode::ImportSpec(n) => n.span(),
            AstNode::Ellipsis(n) => n.span(),
            AstNode::Field(n) => n.span(),
            AstNode::Attribute(n) => n.span(),
            AstNode::Expr(e) => e.span(),
        }
    }
}
