// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The definitions-at-offset query and its doc-comment companion.
//!
//! Resolving an offset to a definition has two parts: find the leaf frame(s) whose span covers
//! the offset (forcing evaluation on the way down, since a frame's children don't exist until
//! it runs), then — for each leaf — work out which path component, if any, the offset actually
//! falls inside, and read off that component's resolved navigables. The defining token for each
//! navigable is whatever `key` its contributing frames were tagged with while being built (a
//! field's label, a package clause, an import spec).

use cue_ast::ast::Node;
use rustc_hash::FxHashSet;
use std::rc::Rc;

use crate::{
    frame::FrameNode,
    id::{FrameId, NavigableId},
    node::AstNode,
    package::{default_import_qualifier, PackageEvaluator},
    path::Path,
};

impl PackageEvaluator {
    /// Every AST node returned by a "go to definition" query at `offset` inside `file_name`.
    #[must_use]
    pub fn definitions_for_offset(&self, file_name: &str, offset: usize) -> Vec<AstNode> {
        let Some(file_frame) = self.file_frame(file_name) else {
            return Vec::new();
        };
        let leaves = self.leaf_frames_at(file_frame, offset);

        for &leaf in &leaves {
            let node = self.frames.borrow().get(leaf).expect("frame id valid").node.clone();
            if let FrameNode::ImportSpec(spec) | FrameNode::ImportSpecRemote(spec) = node {
                return self.definitions_via_import_pivot(file_name, &spec);
            }
        }

        let navs = self.navigables_at_leaves(&leaves, offset);
        self.keys_for_navigables(&navs)
    }

    /// Doc comments attached to every frame that contributes to a definition found at `offset`.
    #[must_use]
    pub fn doc_comments_for_offset(
        &self,
        file_name: &str,
        offset: usize,
    ) -> Vec<(AstNode, Rc<cue_ast::ast::CommentGroup>)> {
        let Some(file_frame) = self.file_frame(file_name) else {
            return Vec::new();
        };
        let leaves = self.leaf_frames_at(file_frame, offset);
        let navs = self.navigables_at_leaves(&leaves, offset);

        let mut out = Vec::new();
        for &nav in &navs {
            self.ensure_navigable_evaluated(nav);
            let frame_ids: Vec<FrameId> = self
                .navigables
                .borrow()
                .get(nav)
                .expect("navigable id valid")
                .frames
                .clone();
            for frame_id in frame_ids {
                let frame = self.frames.borrow();
                let frame = frame.get(frame_id).expect("frame id valid");
                if let (Some(key), Some(docs)) = (&frame.key, &frame.docs) {
                    out.push((key.clone(), docs.clone()));
                }
            }
        }
        out
    }

    /// Descends from `root`, forcing evaluation on the way, collecting every frame that contains
    /// `offset` but whose children (once evaluated) do not — the finest-grained frame(s) a query
    /// at this offset can land in.
    pub(crate) fn leaf_frames_at(&self, root: FrameId, offset: usize) -> Vec<FrameId> {
        let mut leaves = Vec::new();
        self.collect_leaf_frames(root, offset, &mut leaves);
        leaves
    }

    fn collect_leaf_frames(&self, frame_id: FrameId, offset: usize, leaves: &mut Vec<FrameId>) {
        self.evaluate(frame_id);
        let children: Vec<FrameId> = self
            .frames
            .borrow()
            .get(frame_id)
            .expect("frame id valid")
            .children
            .clone();
        let mut descended = false;
        for child in children {
            let span = self.frames.borrow().get(child).expect("frame id valid").span;
            if span.contains_inclusive(offset) {
                descended = true;
                self.collect_leaf_frames(child, offset, leaves);
            }
        }
        if !descended {
            leaves.push(frame_id);
        }
    }

    /// Resolves `offset` against every path owned by the leaf frames in `leaves`, falling back
    /// to a leaf's full ancestral-path result when the leaf is a field's key (whose synthetic
    /// path components all share the key's own span, so there is nothing finer-grained to
    /// binary-search within).
    pub(crate) fn navigables_at_leaves(&self, leaves: &[FrameId], offset: usize) -> FxHashSet<NavigableId> {
        let mut result = FxHashSet::default();
        for &leaf in leaves {
            let node = self.frames.borrow().get(leaf).expect("frame id valid").node.clone();
            if matches!(node, FrameNode::FieldDecl(_)) {
                // This key's own navigable is always a correct answer on its own (spec's
                // self-resolution property) — `evaluate_field` already merges same-named
                // declarations under one navigable by reusing the existing binding, regardless of
                // whether an ancestral path exists for this depth. The ancestral path, when one
                // was registered, additionally reaches peer declarations under a differently
                // structured (but equivalent) ancestor chain, e.g. across conjuncts.
                result.insert(self.frames.borrow().get(leaf).expect("frame id valid").navigable);
                let paths = self.frames.borrow().get(leaf).expect("frame id valid").paths.clone();
                for path_id in paths {
                    result.extend(self.paths.borrow().get(path_id).expect("path id valid").result().iter().copied());
                }
                continue;
            }
            // A package clause never builds a path of its own (there is no selector chain to
            // walk); its frame's navigable already *is* the name every file declaring the same
            // package name shares, so a definitions query there resolves directly to it.
            if matches!(node, FrameNode::PackageClause(_)) {
                result.insert(self.frames.borrow().get(leaf).expect("frame id valid").navigable);
                continue;
            }

            let paths = self.frames.borrow().get(leaf).expect("frame id valid").paths.clone();
            for path_id in paths {
                let paths = self.paths.borrow();
                let path = paths.get(path_id).expect("path id valid");
                if !path_overall_span_contains(path, offset) {
                    continue;
                }
                if let Some(idx) = binary_search_component(path, offset) {
                    if let Some(next) = path.components.get(idx + 1) {
                        result.extend(next.unexpanded.iter().copied());
                    }
                }
            }
        }
        result
    }

    /// Follows every navigable's contributing frames to their `key`, crossing remote proxy
    /// boundaries to collect the defining node from whichever package actually owns the
    /// navigable.
    fn keys_for_navigables(&self, navs: &FxHashSet<NavigableId>) -> Vec<AstNode> {
        let mut seen_navs = FxHashSet::default();
        let mut seen_nodes = FxHashSet::default();
        let mut out = Vec::new();
        for &nav in navs {
            self.collect_keys(nav, &mut seen_navs, &mut seen_nodes, &mut out);
        }
        out
    }

    fn collect_keys(
        &self,
        nav: NavigableId,
        seen_navs: &mut FxHashSet<(usize, NavigableId)>,
        seen_nodes: &mut FxHashSet<(usize, cue_ast::ast::NodeId)>,
        out: &mut Vec<AstNode>,
    ) {
        let identity = (self as *const Self as usize, nav);
        if !seen_navs.insert(identity) {
            return;
        }
        self.ensure_navigable_evaluated(nav);

        let remote = self.navigables.borrow().get(nav).expect("navigable id valid").remote.clone();
        if let Some((remote_pkg, remote_nav)) = remote {
            remote_pkg.collect_keys(remote_nav, seen_navs, seen_nodes, out);
            return;
        }

        let frame_ids: Vec<FrameId> = self.navigables.borrow().get(nav).expect("navigable id valid").frames.clone();
        for frame_id in frame_ids {
            let key = self.frames.borrow().get(frame_id).expect("frame id valid").key.clone();
            if let Some(key) = key {
                if seen_nodes.insert((self as *const Self as usize, key.id())) {
                    out.push(key);
                }
            }
        }
    }

    /// Hovering an import spec pivots to "find every apparent reference to this import's
    /// qualifier in this file, and show where each one resolves" — the spec itself has no
    /// meaningful single "definition" (it names a remote package, not a value in this package),
    /// so a plain resolve would only ever answer with the remote package's own top-level
    /// declarations navigable, which is rarely what a reader wants from clicking the import line.
    fn definitions_via_import_pivot(&self, file_name: &str, spec: &Rc<cue_ast::ast::ImportSpec>) -> Vec<AstNode> {
        let qualifier: Rc<str> = spec
            .alias
            .as_ref()
            .map_or_else(|| default_import_qualifier(&spec.path.value), |a| a.name.clone());

        let spec_span = spec.span();
        let offsets = self.likely_refs_for(file_name, &qualifier);
        let mut seen_nodes = FxHashSet::default();
        let mut out = Vec::new();
        for offset in offsets {
            // Skip the import spec's own alias/path text: re-resolving those would just land
            // back on this same spec and recurse into this same pivot forever.
            if spec_span.contains_inclusive(offset) {
                continue;
            }
            for node in self.definitions_for_offset(file_name, offset) {
                if seen_nodes.insert(node.id()) {
                    out.push(node);
                }
            }
        }
        out
    }
}

fn path_overall_span_contains(path: &Path, offset: usize) -> bool {
    let Some(first) = path.components.first() else { return false };
    let Some(last) = path.components.last() else { return false };
    first.span.lo <= offset && offset <= last.span.hi
}

/// Binary-searches `path`'s components (monotonically non-decreasing `span.hi`, by
/// construction — each selector in a chain extends the previous one's span) for the
/// smallest-ranged component containing `offset`: the leftmost index whose span's upper bound
/// exceeds `offset`.
pub(crate) fn binary_search_component(path: &Path, offset: usize) -> Option<usize> {
    let idx = path.components.partition_point(|c| c.span.hi <= offset);
    let component = path.components.get(idx)?;
    component.span.contains_inclusive(offset).then_some(idx)
}
