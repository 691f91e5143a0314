// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The usages-at-offset ("find references") query.
//!
//! Resolving an offset gives a target navigable (or several, for an ambiguous path). From there,
//! finding every use is a whole-program question: references can live anywhere in this package,
//! or — if the target is reachable from the package's own top level rather than being buried
//! behind an import — in any package that imports or embeds this one. So the query forces this
//! entire package to evaluate (laziness only pays off when *some* part of the program can be
//! left unexamined; "find every reference" can't make that assumption), walks the embedding
//! relation to a fixed point, and then fans out to importers/embedders for anything reachable
//! from outside.

use cue_ast::ast::{Decl, NodeId};
use rustc_hash::FxHashSet;
use std::rc::Rc;

use crate::{
    id::{FrameId, NavigableId},
    node::AstNode,
    package::{default_import_qualifier, PackageEvaluator},
};

impl PackageEvaluator {
    /// Every AST node that references whatever `offset` inside `file_name` resolves to.
    /// `include_definitions` additionally includes the defining node(s) themselves (the same
    /// nodes `definitions_for_offset` would return), so a caller can render "definitions and
    /// usages" as one unified result list.
    #[must_use]
    pub fn usages_for_offset(&self, file_name: &str, offset: usize, include_definitions: bool) -> Vec<AstNode> {
        let Some(file_frame) = self.file_frame(file_name) else {
            return Vec::new();
        };
        let leaves = self.leaf_frames_at(file_frame, offset);
        let navs = self.navigables_at_leaves(&leaves, offset);

        let mut seen_nodes = FxHashSet::default();
        let mut out = Vec::new();
        for nav in navs {
            self.usages_for_navigable(nav, include_definitions, &mut seen_nodes, &mut out);
        }
        out
    }

    fn usages_for_navigable(
        &self,
        nav: NavigableId,
        include_definitions: bool,
        seen_nodes: &mut FxHashSet<(usize, NodeId)>,
        out: &mut Vec<AstNode>,
    ) {
        let remote = self.navigables.borrow().get(nav).expect("navigable id valid").remote.clone();
        if let Some((remote_pkg, remote_nav)) = remote {
            remote_pkg.usages_for_navigable(remote_nav, include_definitions, seen_nodes, out);
            return;
        }

        self.force_entire_package();

        if include_definitions {
            let frame_ids: Vec<FrameId> = self.navigables.borrow().get(nav).expect("navigable id valid").frames.clone();
            for frame_id in frame_ids {
                let key = self.frames.borrow().get(frame_id).expect("frame id valid").key.clone();
                if let Some(key) = key {
                    self.push_unique(key, seen_nodes, out);
                }
            }
        }

        let (chain, exported) = self.ancestor_chain_and_exported(nav);

        let mut worklist = chain;
        let mut visited = FxHashSet::default();
        while let Some(cur) = worklist.pop() {
            if !visited.insert(cur) {
                continue;
            }
            let used_by: Vec<(AstNode, FrameId)> = self
                .navigables
                .borrow()
                .get(cur)
                .expect("navigable id valid")
                .used_by
                .values()
                .cloned()
                .collect();
            for (node, frame) in used_by {
                self.push_unique(node, seen_nodes, out);
                let frame_nav = self.frames.borrow().get(frame).expect("frame id valid").navigable;
                let embeds_cur = self
                    .navigables
                    .borrow()
                    .get(frame_nav)
                    .expect("navigable id valid")
                    .resolves_to
                    .contains(&cur);
                if embeds_cur && !visited.contains(&frame_nav) {
                    worklist.push(frame_nav);
                }
            }
        }

        if exported {
            self.fan_out_to_importers(nav, include_definitions, seen_nodes, out);
        }
        self.fan_out_to_embedders(nav, include_definitions, seen_nodes, out);
    }

    fn push_unique(&self, node: AstNode, seen_nodes: &mut FxHashSet<(usize, NodeId)>, out: &mut Vec<AstNode>) {
        if seen_nodes.insert((self as *const Self as usize, node.id())) {
            out.push(node);
        }
    }

    /// Forces every frame in this package to evaluate, walking the frame tree breadth-first
    /// (evaluating a frame is what spawns its children, so the tree can only be discovered one
    /// layer at a time).
    fn force_entire_package(&self) {
        let mut worklist = vec![self.root_frame()];
        let mut visited = FxHashSet::default();
        while let Some(frame_id) = worklist.pop() {
            if !visited.insert(frame_id) {
                continue;
            }
            self.evaluate(frame_id);
            let children: Vec<FrameId> = self.frames.borrow().get(frame_id).expect("frame id valid").children.clone();
            worklist.extend(children);
        }
    }

    /// Walks `nav`'s `parent` chain up to the package navigable, tracking whether the walk ever
    /// passes through the import- or package-clause bookkeeping navigables (metadata, not a
    /// field importers could actually reference) — if it never does, `nav` is part of this
    /// package's own field tree and other packages could plausibly reference it too.
    fn ancestor_chain_and_exported(&self, nav: NavigableId) -> (Vec<NavigableId>, bool) {
        let mut chain = vec![nav];
        let mut exported = true;
        let mut cur = nav;
        let package_nav = self.package_navigable();
        let decls_nav = self.package_decls_navigable();
        let import_nav = self.import_decls_navigable();
        loop {
            if cur == decls_nav || cur == import_nav {
                exported = false;
            }
            if cur == package_nav {
                break;
            }
            let parent = self.navigables.borrow().get(cur).expect("navigable id valid").parent;
            match parent {
                Some(p) => {
                    chain.push(p);
                    cur = p;
                }
                None => break,
            }
        }
        (chain, exported)
    }

    /// Scans every file of `importer` for likely references to whichever qualifier(s) it binds
    /// an import of this package's canonical path under, forcing `importer` to evaluate the leaf
    /// frame at each such offset — which is what actually builds a remote proxy, if the
    /// reference really does resolve across the import boundary (spec §4.6 step 5 /
    /// `initialNavsForImport`: a fresh analyzer has no proxies yet, so they must be built by this
    /// scan rather than assumed to already exist from some earlier query). Once scanned, whatever
    /// proxy now stands in for `nav` has its own usages folded in, recursively, so a re-exported
    /// value's uses inside the importer are found too.
    fn fan_out_to_importers(
        &self,
        nav: NavigableId,
        include_definitions: bool,
        seen_nodes: &mut FxHashSet<(usize, NodeId)>,
        out: &mut Vec<AstNode>,
    ) {
        for importer in (self.config.list_importers)() {
            self.force_import_qualifier_references(&importer);
            let proxy = importer.existing_proxy_for(&self.rc(), nav);
            let Some(proxy) = proxy else { continue };
            importer.usages_for_navigable(proxy, include_definitions, seen_nodes, out);
        }
    }

    /// Analogous to `fan_out_to_importers`, for packages that reach this one via an
    /// attribute-driven embed rather than an `import` declaration. An embed's qualifier is
    /// attribute-addressed rather than a lexical identifier, so there is no name to scan for;
    /// forcing the embedder's whole program to evaluate is what builds its proxies instead.
    fn fan_out_to_embedders(
        &self,
        nav: NavigableId,
        include_definitions: bool,
        seen_nodes: &mut FxHashSet<(usize, NodeId)>,
        out: &mut Vec<AstNode>,
    ) {
        let Some(list_embedders) = &self.config.list_embedders else { return };
        for embedder in list_embedders() {
            embedder.force_entire_package();
            let proxy = embedder.existing_proxy_for(&self.rc(), nav);
            let Some(proxy) = proxy else { continue };
            embedder.usages_for_navigable(proxy, include_definitions, seen_nodes, out);
        }
    }

    /// For every import in `importer` whose canonicalized path matches this package's own, finds
    /// every likely bare-identifier occurrence of the qualifier that import is bound under (an
    /// explicit alias, or `default_import_qualifier` of the written path) and forces `importer`
    /// to evaluate the leaf frame at each occurrence. The resolved navigables themselves are not
    /// read back here — only the forced evaluation's side effect of building a remote proxy for
    /// whatever the reference actually resolves to matters to the caller.
    fn force_import_qualifier_references(&self, importer: &Rc<PackageEvaluator>) {
        for file_name in importer.file_names() {
            for qualifier in self.import_qualifiers_in_file(importer, file_name.as_ref()) {
                let Some(file_frame) = importer.file_frame(file_name.as_ref()) else { continue };
                for offset in importer.likely_refs_for(file_name.as_ref(), &qualifier) {
                    importer.leaf_frames_at(file_frame, offset);
                }
            }
        }
    }

    /// Every qualifier `file_name` (inside `importer`) binds an import of this package's
    /// canonical path under.
    fn import_qualifiers_in_file(&self, importer: &Rc<PackageEvaluator>, file_name: &str) -> Vec<Rc<str>> {
        let Some(file) = importer.files.borrow().get(file_name).map(|fe| fe.file.clone()) else {
            return Vec::new();
        };
        let mut qualifiers = Vec::new();
        for decl in file.decls.iter() {
            let Decl::Import(import_decl) = decl else { continue };
            for spec in import_decl.specs.iter() {
                let canonical = importer.config.canonicalize(&spec.path.value);
                if canonical != self.config.canonical_import_path {
                    continue;
                }
                let qualifier = spec
                    .alias
                    .as_ref()
                    .map_or_else(|| default_import_qualifier(&spec.path.value), |a| a.name.clone());
                qualifiers.push(qualifier);
            }
        }
        qualifiers
    }
}
