// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! [`Navigable`]: the merge point shared between frames that structurally unify — the same
//! field declared twice across files, or brought together by a conjunction. Navigables form
//! a DAG rooted at the package navigable; `resolvesTo` edges (added for embeddings and
//! disjunctions) are the only thing that can make that DAG cyclic, which is why every
//! traversal over navigables uses an explicit visited set rather than trusting termination.

use cue_ast::ast::NodeId;
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;

use crate::{
    id::{FrameId, NavigableId, PathId},
    node::AstNode,
    package::PackageEvaluator,
};

/// A merge point shared between frames that are structurally unified.
pub struct Navigable {
    /// The parent navigable; `None` only for the package navigable.
    pub parent: Option<NavigableId>,
    /// This navigable's name as seen from its parent's bindings. Empty for navigables that
    /// are never reached by name (e.g. disjunction branches, ellipsis navigables use the
    /// sentinel name `__...`).
    pub name: Rc<str>,
    /// Every frame whose `navigable` field points back at this navigable.
    pub frames: Vec<FrameId>,
    /// Named children, one navigable per distinct field/import/package name.
    pub bindings: FxHashMap<Rc<str>, NavigableId>,
    /// Other navigables reachable by embedding or disjunction. Grows monotonically; never
    /// shrinks (invariant 2 of the data model).
    pub resolves_to: FxHashSet<NavigableId>,
    /// `(path, component index)` pairs to resume when `resolves_to` grows.
    pub resolves_to_observers: Vec<(PathId, usize)>,
    /// AST nodes that resolved a path component into this navigable, and the frame that
    /// contained the use. Keyed by `NodeId` for dedup; the value carries the node itself back
    /// (a query's result is the node, not just its identity) alongside the frame.
    pub used_by: FxHashMap<NodeId, (AstNode, FrameId)>,
    /// Whether every frame in `frames` has been forced to evaluate at least once.
    pub evaluated: bool,
    /// When this navigable is a local stand-in for a navigable owned by another
    /// `PackageEvaluator` (created the first time an imported package's navigable is reached),
    /// the remote evaluator and its own index for the same navigable. A proxy's own `frames`,
    /// `bindings`, and `resolves_to` stay empty; every lookup delegates across the boundary
    /// instead (see `PackageEvaluator::navigable_bindings_get` and friends). This is how
    /// cross-package resolution crosses an arena boundary that plain `NavigableId`s cannot.
    pub remote: Option<(Rc<PackageEvaluator>, NavigableId)>,
}

impl Navigable {
    #[must_use]
    pub fn new(parent: Option<NavigableId>, name: Rc<str>) -> Self {
        Self {
            parent,
            name,
            frames: Vec::new(),
            bindings: FxHashMap::default(),
            resolves_to: FxHashSet::default(),
            resolves_to_observers: Vec::new(),
            used_by: FxHashMap::default(),
            evaluated: false,
            remote: None,
        }
    }

    /// A local proxy for a navigable owned by another package's evaluator.
    #[must_use]
    pub fn new_remote(name: Rc<str>, remote_pkg: Rc<PackageEvaluator>, remote_nav: NavigableId) -> Self {
        Self {
            parent: None,
            name,
            frames: Vec::new(),
            bindings: FxHashMap::default(),
            resolves_to: FxHashSet::default(),
            resolves_to_observers: Vec::new(),
            used_by: FxHashMap::default(),
            evaluated: false,
            remote: Some((remote_pkg, remote_nav)),
        }
    }

    /// Adds `target` to `resolves_to`, returning whether it was newly added (invariant 2:
    /// the set only ever grows).
    pub fn add_resolves_to(&mut self, target: NavigableId) -> bool {
        self.resolves_to.insert(target)
    }

    /// Records `node` (inside `frame`) as having resolved to this navigable.
    pub fn record_use(&mut self, node: AstNode, frame: FrameId) {
        self.used_by.entry(node.id()).or_insert((node, frame));
    }

    /// Returns or creates the named child binding, recording `child` in `bindings` the first
    /// time a given name is bound (invariant 7: a navigable binding's name always matches
    /// the bound navigable's own `name`).
    pub fn bind(&mut self, name: Rc<str>, child: NavigableId) {
        self.bindings.entry(name).or_insert(child);
    }
}
