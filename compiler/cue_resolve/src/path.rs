// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! [`Path`]: a materialized resolution of a CUE path expression. A path owns an ordered list of
//! [`PathComponent`]s; component `0` is always a seed with no name of its own (already resolved
//! — by lexical lookup for an ident root, or trivially by the inline value's own navigable for
//! an inline root) and the last component is a terminal that holds the overall result. Every
//! component in between carries one selector name to look up.
//!
//! Resolution is driven by [`crate::package::PackageEvaluator::resolve_path_from`], which both
//! the initial `resolvesToChanged(0)` kick (spec §4.2) and every later observer wakeup
//! (spec §4.4) call into.

use cue_data_structures::span::Span;
use rustc_hash::FxHashSet;
use std::rc::Rc;

use crate::{
    id::{FrameId, NavigableId, PathId},
    node::AstNode,
    package::PackageEvaluator,
};

/// One element of a [`Path`]: an input set of navigables and, once resolved, an output set.
pub struct PathComponent {
    /// The concrete use site, when this component corresponds to a real selector/ident in
    /// source (as opposed to the synthetic seed/terminal slots, or an ancestral-path link that
    /// carries no source node of its own).
    pub node: Option<AstNode>,
    /// The name to look up. `None` for the seed (already resolved) and the terminal (holds the
    /// overall result, nothing left to look up).
    pub name: Option<Rc<str>>,
    /// The navigables carried in from the previous component's resolution (or, for the seed,
    /// from lexical lookup / the inline value itself).
    pub unexpanded: FxHashSet<NavigableId>,
    /// `expand(unexpanded)`'s length the last time this component was resolved, used to detect
    /// growth (spec §4.4 step 4) without recomputing the whole set from scratch.
    pub expanded_len: usize,
    /// This component's source byte range, used by `crate::definitions` to binary-search which
    /// component a cursor offset falls into.
    pub span: Span,
}

impl PathComponent {
    fn seed(unexpanded: FxHashSet<NavigableId>, span: Span) -> Self {
        Self {
            node: None,
            name: None,
            unexpanded,
            expanded_len: 0,
            span,
        }
    }

    fn named(node: Option<AstNode>, name: Rc<str>, span: Span) -> Self {
        Self {
            node,
            name: Some(name),
            unexpanded: FxHashSet::default(),
            expanded_len: 0,
            span,
        }
    }

    fn terminal(span: Span) -> Self {
        Self {
            node: None,
            name: None,
            unexpanded: FxHashSet::default(),
            expanded_len: 0,
            span,
        }
    }
}

/// A resolved path expression.
pub struct Path {
    /// The frame that created this path.
    pub owner: FrameId,
    /// `Some` when this is an embedding path: the navigable the final result is merged into via
    /// `resolvesTo`. `None` for a path that is resolved but does not embed (operands of `!`, a
    /// call's arguments, `(expr)`, non-`&`/`|` binary operands).
    pub receiver: Option<NavigableId>,
    /// `components[0]` is always the unnamed seed; `components[last]` is always the unnamed
    /// terminal holding the overall result.
    pub components: Vec<PathComponent>,
    /// Whether this path started from an inline struct/list rather than an identifier.
    pub starts_inline: bool,
}

impl Path {
    /// The terminal component's resolved set, or an empty set before any resolution has run.
    #[must_use]
    pub fn result(&self) -> &FxHashSet<NavigableId> {
        &self
            .components
            .last()
            .expect("path always has a terminal component")
            .unexpanded
    }
}

/// Builds the component list for a path with `names.len()` selectors after the seed: one seed,
/// one per name, one terminal. `seed` is already resolved (lexical lookup, or the inline value's
/// own navigable).
#[must_use]
pub fn build_components(
    seed: FxHashSet<NavigableId>,
    seed_span: Span,
    names: Vec<(Option<AstNode>, Rc<str>, Span)>,
    terminal_span: Span,
) -> Vec<PathComponent> {
    let mut components = Vec::with_capacity(names.len() + 2);
    components.push(PathComponent::seed(seed, seed_span));
    for (node, name, span) in names {
        components.push(PathComponent::named(node, name, span));
    }
    components.push(PathComponent::terminal(terminal_span));
    components
}

impl PackageEvaluator {
    /// `expand(unexpanded)`: the smallest set containing `unexpanded` and every navigable
    /// reachable from it by `resolvesTo`. Forces every visited navigable to evaluate first, so
    /// its bindings and `resolvesTo` edges are current before navigation proceeds.
    pub(crate) fn expand(&self, unexpanded: &FxHashSet<NavigableId>) -> FxHashSet<NavigableId> {
        let mut result = FxHashSet::default();
        let mut worklist: Vec<NavigableId> = unexpanded.iter().copied().collect();
        while let Some(nav) = worklist.pop() {
            if !result.insert(nav) {
                continue;
            }
            self.ensure_navigable_evaluated(nav);
            let resolves_to = self.navigable_resolves_to(nav);
            for target in resolves_to {
                if !result.contains(&target) {
                    worklist.push(target);
                }
            }
        }
        result
    }

    /// Searches every navigable in `expanded` for a binding named `name`, falling back to
    /// ellipsis navigables contributed by the frames behind each navigable when no direct
    /// binding exists anywhere in the set (spec §4.4 step 5).
    pub(crate) fn navigate_by_name(&self, expanded: &FxHashSet<NavigableId>, name: &str) -> FxHashSet<NavigableId> {
        let mut direct = FxHashSet::default();
        for &nav in expanded {
            if let Some(child) = self.navigable_binding(nav, name) {
                direct.insert(child);
            }
        }
        if !direct.is_empty() {
            return direct;
        }
        // Remote proxies contribute no local frames, so this fallback is local-only: ellipsis
        // widening does not cross a package boundary.
        let mut fallback = FxHashSet::default();
        for &nav in expanded {
            let frames: Vec<FrameId> = self
                .navigables
                .borrow()
                .get(nav)
                .expect("navigable id valid")
                .frames
                .clone();
            for frame_id in frames {
                let ellipses = self
                    .frames
                    .borrow()
                    .get(frame_id)
                    .expect("frame id valid")
                    .ellipses
                    .clone();
                fallback.extend(ellipses);
            }
        }
        fallback
    }

    /// Drives resolution of `path_id` starting at component `start`, per spec §4.4. Called once
    /// with `start = 0` right after a path is created, and again (with whatever index the
    /// observer was registered at) whenever a navigable's `resolvesTo` grows.
    pub(crate) fn resolve_path_from(&self, path_id: PathId, start: usize) {
        let len = self
            .paths
            .borrow()
            .get(path_id)
            .expect("path id valid")
            .components
            .len();

        for i in start..len.saturating_sub(1) {
            let (unexpanded, name) = {
                let paths = self.paths.borrow();
                let component = &paths.get(path_id).expect("path id valid").components[i];
                (component.unexpanded.clone(), component.name.clone())
            };

            let Some(name) = name else {
                // Seed component: pass through unchanged.
                if unexpanded.is_empty() {
                    self.clear_from(path_id, i + 1);
                    return;
                }
                self.set_unexpanded(path_id, i + 1, unexpanded);
                continue;
            };

            let expanded = self.expand(&unexpanded);
            let prev_len = self
                .paths
                .borrow()
                .get(path_id)
                .expect("path id valid")
                .components[i]
                .expanded_len;
            if expanded.len() == prev_len && prev_len != 0 {
                // No new information since the last time this component ran.
                return;
            }
            {
                let mut paths = self.paths.borrow_mut();
                paths.get_mut(path_id).expect("path id valid").components[i].expanded_len = expanded.len();
            }
            for &nav in &expanded {
                self.navigables
                    .borrow_mut()
                    .get_mut(nav)
                    .expect("navigable id valid")
                    .resolves_to_observers
                    .push((path_id, i));
            }

            let next = self.navigate_by_name(&expanded, &name);
            if next.is_empty() {
                self.clear_from(path_id, i + 1);
                return;
            }

            let (node, owner) = {
                let paths = self.paths.borrow();
                let path = paths.get(path_id).expect("path id valid");
                (path.components[i].node.clone(), path.owner)
            };
            if let Some(node) = &node {
                for &nav in &next {
                    self.record_use(nav, node.clone(), owner);
                    self.force_import_spec(nav);
                }
            }

            self.set_unexpanded(path_id, i + 1, next);
        }

        let receiver = self.paths.borrow().get(path_id).expect("path id valid").receiver;
        if let Some(receiver) = receiver {
            let result = self
                .paths
                .borrow()
                .get(path_id)
                .expect("path id valid")
                .result()
                .clone();
            self.ensure_resolves_to(receiver, result);
        }
    }

    fn set_unexpanded(&self, path_id: PathId, index: usize, value: FxHashSet<NavigableId>) {
        let mut paths = self.paths.borrow_mut();
        paths.get_mut(path_id).expect("path id valid").components[index].unexpanded = value;
    }

    /// Clears every component from `from` onward (inclusive), stopping a path's resolution
    /// early once some component's lookup comes up empty.
    fn clear_from(&self, path_id: PathId, from: usize) {
        let mut paths = self.paths.borrow_mut();
        let path = paths.get_mut(path_id).expect("path id valid");
        for component in &mut path.components[from..] {
            component.unexpanded.clear();
            component.expanded_len = 0;
        }
    }
}
