// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The completions-at-offset query.
//!
//! Reuses the same leaf-frame descent as [`crate::definitions`], then classifies each leaf by
//! what shape of AST it backs: a field's own key (renaming it draws from the enclosing struct's
//! binding closure), a child path's component (extending a selector chain draws from whatever
//! the previous component resolved to), or a struct/file frame that is itself a leaf because the
//! offset falls in a gap between declarations (offering both field names and in-scope variable
//! names). Opaque ranges and string literals contribute nothing, per spec.

use cue_ast::ast::{BasicLitKind, Expr, Node};
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;

use crate::{
    definitions::binary_search_component,
    field_decl::FieldDeclExpr,
    frame::FrameNode,
    id::{FrameId, NavigableId, PathId},
    node::AstNode,
    package::PackageEvaluator,
};

/// Whether a completion candidate names a struct field (drawn from a navigable's bindings) or a
/// lexically-bound variable (drawn from a frame's lexical scope).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CompletionKind {
    Field,
    Variable,
}

/// One span a completion response groups candidates under.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CompletionSpan {
    /// The byte range a client should replace (zero-width for a pure insertion point).
    pub start: usize,
    pub end: usize,
    /// Text to append after the inserted name, e.g. `": "` for a fresh field label.
    pub suffix: &'static str,
    pub kind: CompletionKind,
}

impl CompletionSpan {
    fn new(start: usize, end: usize, suffix: &'static str, kind: CompletionKind) -> Self {
        Self { start, end, suffix, kind }
    }
}

/// The result of a completions query: candidate names, grouped by the span/suffix/kind a client
/// would use to render and apply them.
pub type Completions = FxHashMap<CompletionSpan, FxHashSet<Rc<str>>>;

impl PackageEvaluator {
    /// Every completion candidate available at `offset` inside `file_name`.
    #[must_use]
    pub fn completions_for_offset(&self, file_name: &str, offset: usize) -> Completions {
        let Some(file_frame) = self.file_frame(file_name) else {
            return FxHashMap::default();
        };
        let leaves = self.leaf_frames_at(file_frame, offset);
        let mut out = FxHashMap::default();
        for leaf in leaves {
            self.completions_for_leaf(leaf, offset, &mut out);
        }
        out
    }

    fn completions_for_leaf(&self, leaf: FrameId, offset: usize, out: &mut Completions) {
        let (node, in_unknown) = {
            let frames = self.frames.borrow();
            let frame = frames.get(leaf).expect("frame id valid");
            (frame.node.clone(), frame.unknown.contains(offset))
        };
        if in_unknown {
            return;
        }
        if let FrameNode::Expr { expr: Expr::Lit(lit), .. } = &node {
            if lit.kind == BasicLitKind::String {
                return;
            }
        }

        if let FrameNode::FieldDecl(decl) = &node {
            self.field_decl_completions(leaf, &decl, offset, out);
            return;
        }

        let paths: Vec<PathId> = self.frames.borrow().get(leaf).expect("frame id valid").paths.clone();
        let mut matched_a_path = false;
        for path_id in paths {
            let hit = {
                let paths_arena = self.paths.borrow();
                let path = paths_arena.get(path_id).expect("path id valid");
                match binary_search_component(path, offset) {
                    Some(idx) if idx + 1 < path.components.len() => Some((idx, path.starts_inline)),
                    _ => None,
                }
            };
            let Some((idx, starts_inline)) = hit else { continue };
            matched_a_path = true;
            self.path_component_completions(path_id, idx, starts_inline, out);
        }
        if matched_a_path {
            return;
        }

        // Case 5: nothing finer-grained claimed this offset, which (since `leaf_frames_at`
        // only stops descending where no child's span reaches `offset`) means the leaf itself
        // is a frame whose children are declarations (a file, the package root, a
        // comprehension body struct, or an inline struct literal evaluated straight into its
        // own value frame by `evaluate_expr_frame`) and `offset` sits in a gap between them.
        let spawns_decls = matches!(
            node,
            FrameNode::Struct(_) | FrameNode::File(_) | FrameNode::Root | FrameNode::Expr { expr: Expr::Struct(_), .. }
        );
        if spawns_decls {
            self.between_fields_completions(leaf, offset, out);
        }
    }

    /// Case 1 of spec §4.7: a field's own key ident, being renamed. Candidates are every name
    /// bound (directly or via a merged conjunct/cross-file declaration) in the enclosing struct.
    /// Other label shapes (string/numeric/pattern keys) offer nothing here — spec's case 2
    /// ("no key ident yet") describes a parser-recovery shape this crate's AST has no node for,
    /// since the lexer/parser is an external collaborator; a cursor at an empty position inside
    /// a struct is handled by `between_fields_completions` instead, which already produces the
    /// same field-completions-with-`": "`-suffix spec's case 2 asks for.
    fn field_decl_completions(&self, decl_frame: FrameId, decl: &FieldDeclExpr, offset: usize, out: &mut Completions) {
        let Some(AstNode::Ident(ident)) = decl.key_node() else { return };
        if !ident.span().contains_inclusive(offset) {
            return;
        }
        let Some(parent_frame) = self.frames.borrow().get(decl_frame).expect("frame id valid").parent else {
            return;
        };
        let parent_nav = self.frame_navigable(parent_frame);
        let expanded = self.expand(&std::iter::once(parent_nav).collect());
        let names = self.binding_names(&expanded);
        insert_names(out, CompletionSpan::new(ident.pos(), ident.end(), "", CompletionKind::Field), names);
    }

    /// Case 3 of spec §4.7: the cursor sits inside one of a path's components. `idx` names the
    /// component whose own span contains `offset`; its `unexpanded` input is exactly the
    /// previous component's resolution, which is what spec asks the candidates be drawn from.
    /// `idx == 0` is the path's own root identifier — there is no "previous component" to read
    /// there, so the candidates come from lexical scope instead (spec's "variable kind" case).
    fn path_component_completions(&self, path_id: PathId, idx: usize, starts_inline: bool, out: &mut Completions) {
        if idx == 0 {
            let owner = self.paths.borrow().get(path_id).expect("path id valid").owner;
            let span = self.paths.borrow().get(path_id).expect("path id valid").components[0].span;
            let names = self.lexical_ancestor_names(owner);
            insert_names(out, CompletionSpan::new(span.lo, span.hi, "", CompletionKind::Variable), names);
            return;
        }

        let (span, input) = {
            let paths = self.paths.borrow();
            let component = &paths.get(path_id).expect("path id valid").components[idx];
            (component.span, component.unexpanded.clone())
        };
        let expanded = self.expand(&input);
        let names = self.binding_names(&expanded);
        let kind = if idx == 1 && !starts_inline {
            CompletionKind::Field
        } else {
            CompletionKind::Variable
        };
        insert_names(out, CompletionSpan::new(span.lo, span.hi, "", kind), names);
    }

    /// Case 5 of spec §4.7: between declarations in a struct/file. Offers both field names
    /// (from this frame's own navigable closure, to insert with a `": "` suffix) and variable
    /// names (the union of every ancestor frame's lexical bindings).
    fn between_fields_completions(&self, leaf: FrameId, offset: usize, out: &mut Completions) {
        let own_nav = self.frame_navigable(leaf);
        let expanded = self.expand(&std::iter::once(own_nav).collect());
        let field_names = self.binding_names(&expanded);
        if !field_names.is_empty() {
            insert_names(out, CompletionSpan::new(offset, offset, ": ", CompletionKind::Field), field_names);
        }

        let var_names = self.gap_variable_names(leaf);
        if !var_names.is_empty() {
            insert_names(out, CompletionSpan::new(offset, offset, "", CompletionKind::Variable), var_names);
        }
    }

    /// Variable-name candidates for a gap between declarations: `leaf`'s own struct contributes
    /// only its explicit lexical bindings here (a nested pattern alias bound directly on it) —
    /// its *structural* sibling field names are deliberately left out, since those are already
    /// offered as field completions by `between_fields_completions` and repeating them under
    /// "variable" would just be the same name twice with different suffixes. Every ancestor frame
    /// beyond `leaf` contributes both sources, via `lexical_ancestor_names`, matching what a bare
    /// identifier typed in a fresh declaration at this gap would actually resolve against.
    fn gap_variable_names(&self, leaf: FrameId) -> FxHashSet<Rc<str>> {
        let (own_lexical, parent) = {
            let frames = self.frames.borrow();
            let frame = frames.get(leaf).expect("frame id valid");
            (frame.lexical.keys().cloned().collect::<Vec<_>>(), frame.parent)
        };
        let mut names: FxHashSet<Rc<str>> = own_lexical.into_iter().filter(|name| !name.starts_with("__")).collect();
        if let Some(parent) = parent {
            names.extend(self.lexical_ancestor_names(parent));
        }
        names
    }

    /// Every navigable binding name reachable from `navs`, crossing remote proxy boundaries and
    /// excluding names beginning with `__` (synthetic list-index/ellipsis names, spec's
    /// "completions exclude synthetic names" property).
    fn binding_names(&self, navs: &FxHashSet<NavigableId>) -> FxHashSet<Rc<str>> {
        let mut names = FxHashSet::default();
        for &nav in navs {
            self.ensure_navigable_evaluated(nav);
            let remote = self.navigables.borrow().get(nav).expect("navigable id valid").remote.clone();
            if let Some((pkg, remote_nav)) = remote {
                names.extend(pkg.binding_names(&std::iter::once(remote_nav).collect()));
                continue;
            }
            let bound: Vec<Rc<str>> = self
                .navigables
                .borrow()
                .get(nav)
                .expect("navigable id valid")
                .bindings
                .keys()
                .cloned()
                .collect();
            names.extend(bound.into_iter().filter(|name| !name.starts_with("__")));
        }
        names
    }

    /// The union of every bare-identifier-reachable name visible from `start`'s frame up through
    /// its ancestors. Mirrors `PackageEvaluator::resolve_ident_seed`'s own two-source lookup at
    /// each level (a frame's explicit lexical bindings, then its own navigable's structural field
    /// bindings) rather than lexical bindings alone — a plain sibling field name is just as
    /// reachable as a bare identifier as an alias or let-bound name is, so both belong in "what
    /// could this identifier resolve to here". `visited` guards against a pathological cyclic
    /// `parent` chain (never expected, but frames are an arena, not a tree the compiler can
    /// statically prove acyclic).
    fn lexical_ancestor_names(&self, start: FrameId) -> FxHashSet<Rc<str>> {
        let mut names = FxHashSet::default();
        let mut visited = FxHashSet::default();
        let mut cur = Some(start);
        while let Some(frame_id) = cur {
            if !visited.insert(frame_id) {
                break;
            }
            let (lexical_names, own_nav, parent) = {
                let frames = self.frames.borrow();
                let frame = frames.get(frame_id).expect("frame id valid");
                (frame.lexical.keys().cloned().collect::<Vec<_>>(), frame.navigable, frame.parent)
            };
            names.extend(lexical_names.into_iter().filter(|name| !name.starts_with("__")));
            let own_bindings: Vec<Rc<str>> = self
                .navigables
                .borrow()
                .get(own_nav)
                .expect("navigable id valid")
                .bindings
                .keys()
                .cloned()
                .collect();
            names.extend(own_bindings.into_iter().filter(|name| !name.starts_with("__")));
            cur = parent;
        }
        names
    }
}

fn insert_names(out: &mut Completions, span: CompletionSpan, names: FxHashSet<Rc<str>>) {
    if names.is_empty() {
        return;
    }
    out.entry(span).or_default().extend(names);
}
