// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! [`FieldDeclExpr`]: the synthetic node a [`crate::frame::FrameNode::FieldDecl`] frame
//! evaluates. A field's label is not itself an expression — `foo`, `"foo"`, `[string]`, and
//! `x=foo` are all shapes a plain expression evaluator has no case for — so decomposing a
//! [`Field`] spawns one of these instead, carrying the label apart into the pieces the rest of
//! the evaluator already knows how to resolve: a main name to bind under, zero or more aliases to
//! bind lexically, and zero or more sub-expressions (an interpolated string label, a bracketed
//! pattern, a bracketed type constraint) to spawn ordinary expression frames for.

use cue_ast::ast::{Alias, Expr, Field, Ident, LabelKind};
use cue_data_structures::span::Span;
use rustc_hash::FxHashSet;
use std::{cell::Cell, rc::Rc};

use crate::{
    id::{FrameId, NavigableId},
    node::AstNode,
    package::PackageEvaluator,
};

/// The key half of a label: either a plain/quoted name or a bracketed pattern.
#[derive(Clone)]
pub enum KeyNode {
    Ident(Rc<Ident>),
    BasicLit(Rc<cue_ast::ast::BasicLit>),
    /// A bracketed pattern or interpolation: no single name, just a list of sub-expressions.
    Pattern,
}

pub struct FieldDeclExpr {
    pub field: Rc<Field>,
    pub key: KeyNode,
    /// The string this field binds under in its parent navigable. Empty for a bracketed pattern
    /// that is not a single string-literal key (those widen to an ellipsis instead).
    pub main_name: Rc<str>,
    /// Every alias this label carries — the label's own `alias`, plus any nested
    /// [`Expr::Alias`] found while walking a bracketed pattern (spec's open question on repeated
    /// aliases: we keep all of them rather than picking one).
    pub aliases: Vec<Rc<Alias>>,
    /// Additional sub-expressions needing their own frame: an interpolation's components, a
    /// pattern's constraint expression, a nested alias's value.
    pub sub_exprs: Vec<Expr>,
    pub span: Span,
    /// Set once the sibling value frame is spawned, so ancestral-path construction (which runs
    /// while evaluating this frame, before the value frame necessarily exists) can be pointed at
    /// it lazily.
    pub value_frame: Cell<Option<FrameId>>,
}

impl FieldDeclExpr {
    /// Decomposes a field's label into a [`FieldDeclExpr`]. `key.is_empty()` signals a pattern
    /// constraint that should widen the parent struct's ellipsis set instead of binding a name.
    #[must_use]
    pub fn new(field: Rc<Field>) -> Self {
        let label = &field.label;
        let mut aliases = Vec::new();
        let mut sub_exprs = Vec::new();

        // The label's own primary alias (`x=foo: ...`) is bound lexically by the caller, which
        // already has the `Ident` and the field's value frame at hand; only the aliases nested
        // inside a bracketed pattern are this type's concern.

        let (key, main_name) = match &label.kind {
            LabelKind::Ident(ident) => (KeyNode::Ident(ident.clone()), ident.name.clone()),
            LabelKind::String(lit) => (KeyNode::BasicLit(lit.clone()), lit.value.clone()),
            LabelKind::Numeric(lit) => {
                (KeyNode::BasicLit(lit.clone()), Rc::from(format!("__{}", lit.value).as_str()))
            }
            LabelKind::Paren(expr) => {
                collect_pattern(expr, &mut aliases, &mut sub_exprs);
                (KeyNode::Pattern, Rc::from(""))
            }
        };

        Self {
            field,
            key,
            main_name,
            aliases,
            sub_exprs,
            span: label.span(),
            value_frame: Cell::new(None),
        }
    }

    #[must_use]
    pub fn is_pattern(&self) -> bool {
        matches!(self.key, KeyNode::Pattern)
    }

    #[must_use]
    pub fn key_node(&self) -> Option<AstNode> {
        match &self.key {
            KeyNode::Ident(ident) => Some(AstNode::Ident(ident.clone())),
            KeyNode::BasicLit(lit) => Some(AstNode::BasicLit(lit.clone())),
            KeyNode::Pattern => None,
        }
    }
}

/// Walks a bracketed label pattern (`[string]`, `[x=string]`, `[=~"^[a-z]+$"]`) collecting every
/// nested alias and every sub-expression that needs its own frame.
fn collect_pattern(expr: &Expr, aliases: &mut Vec<Rc<Alias>>, sub_exprs: &mut Vec<Expr>) {
    match expr {
        Expr::Alias(alias) => {
            aliases.push(alias.clone());
            sub_exprs.push(alias.expr.clone());
        }
        Expr::Paren(paren) => collect_pattern(&paren.expr, aliases, sub_exprs),
        other => sub_exprs.push(other.clone()),
    }
}

impl PackageEvaluator {
    /// Builds the reverse chain of names from `start` up to (but not including) the nearest
    /// unnamed ancestor (the file-frames navigable, or a disjunction branch with no name of its
    /// own). Returns `None` if `start` itself is unnamed. On success, returns the oldest named
    /// ancestor together with the names to walk back down through it, in root-to-leaf order,
    /// *excluding* the oldest ancestor's own name (that one seeds the path instead of being
    /// looked up).
    pub(crate) fn named_ancestor_chain(&self, start: NavigableId) -> Option<(NavigableId, Vec<Rc<str>>)> {
        let mut chain: Vec<(NavigableId, Rc<str>)> = Vec::new();
        let mut cur = start;
        loop {
            let (name, parent) = {
                let navigables = self.navigables.borrow();
                let nav = navigables.get(cur).expect("navigable id valid");
                (nav.name.clone(), nav.parent)
            };
            if name.is_empty() || name.starts_with("__") {
                break;
            }
            chain.push((cur, name));
            match parent {
                Some(p) => cur = p,
                None => break,
            }
        }
        if chain.is_empty() {
            return None;
        }
        chain.reverse();
        let oldest = chain[0].0;
        let names = chain.into_iter().skip(1).map(|(_, name)| name).collect();
        Some((oldest, names))
    }

    /// Registers the ancestral path for `decl`, if one exists: the fake path that lets "go to
    /// definition" on a nested field's key jump straight to every peer declaration of that same
    /// field across every file and conjunct, the same way a real selector chain would.
    pub(crate) fn register_ancestral_path(&self, decl_frame: FrameId, decl: &FieldDeclExpr) {
        if decl.main_name.is_empty() || decl.main_name.starts_with("__") {
            // Synthetic list-index keys (`__0`, `__...`) never get an ancestral path: collapsing
            // every list position with the same index across unrelated lists is not useful.
            return;
        }
        let parent_frame = self
            .frames
            .borrow()
            .get(decl_frame)
            .expect("frame id valid")
            .parent;
        let Some(parent_frame) = parent_frame else {
            return;
        };
        let enclosing = self
            .frames
            .borrow()
            .get(parent_frame)
            .expect("frame id valid")
            .navigable;
        let Some((oldest, mut names)) = self.named_ancestor_chain(enclosing) else {
            return;
        };
        names.push(decl.main_name.clone());

        let seed: FxHashSet<NavigableId> = std::iter::once(oldest).collect();
        let names_with_spans = names
            .into_iter()
            .map(|name| (None, name, decl.span))
            .collect();
        let components = crate::path::build_components(seed, decl.span, names_with_spans, decl.span);
        self.create_path(decl_frame, None, components, false);
    }
}
