// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! [`PackageEvaluator`]: the owner of one package's frame/navigable/path arenas, and the case
//! analysis (`evaluate`) that lazily populates them from the AST. Everything else in this
//! crate is a helper this type calls into; this module is where the pieces come together.

use cue_ast::ast::{
    Alias, Attribute, BasicLitKind, Clause, Decl, Ellipsis, Expr, Ident, ImportDecl, ImportSpec,
    Node, Package, Selector,
};
use cue_data_structures::{index_map::IndexMap, span::Span};
use rustc_hash::{FxHashMap, FxHashSet};
use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use crate::{
    config::Config,
    field_decl::FieldDeclExpr,
    frame::{Frame, FrameNode},
    id::{FrameId, NavigableId, PathId},
    navigable::Navigable,
    node::AstNode,
    path::build_components,
};

/// Per-file bookkeeping that does not belong on [`Frame`]/[`Navigable`]: the file's own root
/// frame, the canonical-import-path to navigable map scoped to this file's imports, and a
/// memoized, lazily-built index of every identifier name's occurrences (the "likely reference"
/// heuristic `crate::usages` scans instead of walking the whole AST per query).
pub struct FileEvaluator {
    pub(crate) file: Rc<cue_ast::ast::File>,
    pub(crate) frame: Cell<FrameId>,
    pub(crate) import_navigables: RefCell<FxHashMap<Rc<str>, NavigableId>>,
    pub(crate) likely_refs: RefCell<Option<Rc<FxHashMap<Rc<str>, Vec<usize>>>>>,
}

/// Owns one package's frame/navigable/path arenas and the evaluator that populates them.
pub struct PackageEvaluator {
    self_ref: Weak<PackageEvaluator>,
    pub(crate) config: Config,
    source_files: Vec<Rc<cue_ast::ast::File>>,
    pub(crate) files: RefCell<FxHashMap<Rc<str>, FileEvaluator>>,
    pub(crate) frames: RefCell<IndexMap<FrameId, Frame>>,
    pub(crate) navigables: RefCell<IndexMap<NavigableId, Navigable>>,
    pub(crate) paths: RefCell<IndexMap<PathId, crate::path::Path>>,
    remote_proxies: RefCell<FxHashMap<(usize, NavigableId), NavigableId>>,
    root_frame: Cell<FrameId>,
    package_navigable: Cell<NavigableId>,
    package_decls_navigable: Cell<NavigableId>,
    import_decls_navigable: Cell<NavigableId>,
    pub(crate) file_frames_navigable: Cell<NavigableId>,
}

impl PackageEvaluator {
    /// Builds a new evaluator over `files`, wired up via `self_ref` so methods reached through
    /// a navigable's `remote` field can hand back an `Rc<PackageEvaluator>` rather than a bare
    /// reference.
    #[must_use]
    pub fn new(config: Config, files: Vec<Rc<cue_ast::ast::File>>) -> Rc<Self> {
        Rc::new_cyclic(|weak| {
            let evaluator = Self {
                self_ref: weak.clone(),
                config,
                source_files: files,
                files: RefCell::new(FxHashMap::default()),
                frames: RefCell::new(IndexMap::new()),
                navigables: RefCell::new(IndexMap::new()),
                paths: RefCell::new(IndexMap::new()),
                remote_proxies: RefCell::new(FxHashMap::default()),
                root_frame: Cell::new(FrameId::from(0)),
                package_navigable: Cell::new(NavigableId::from(0)),
                package_decls_navigable: Cell::new(NavigableId::from(0)),
                import_decls_navigable: Cell::new(NavigableId::from(0)),
                file_frames_navigable: Cell::new(NavigableId::from(0)),
            };
            evaluator.build();
            evaluator
        })
    }

    /// A package with no files and every callback a no-op, substituted for an import that does
    /// not resolve (spec §7: a missing remote package is a soft failure, never a panic).
    #[must_use]
    pub fn empty_phantom() -> Rc<Self> {
        Self::new(
            Config {
                canonical_import_path: Rc::from(""),
                import_canonicalization: FxHashMap::default(),
                resolve_import: Rc::new(|_| None),
                list_importers: Rc::new(Vec::new),
                supports_references: false,
                resolve_embed: None,
                list_embedders: None,
            },
            Vec::new(),
        )
    }

    /// Discards every derived arena and re-installs the package root/file frames from scratch,
    /// keeping the same source files and config. `IndexMap` has no `clear`, so this swaps in
    /// fresh arenas rather than emptying the old ones in place.
    pub fn reset(&self) {
        log::debug!("resetting package evaluator for {}", self.config.canonical_import_path);
        *self.frames.borrow_mut() = IndexMap::new();
        *self.navigables.borrow_mut() = IndexMap::new();
        *self.paths.borrow_mut() = IndexMap::new();
        self.remote_proxies.borrow_mut().clear();
        self.files.borrow_mut().clear();
        self.build();
    }

    fn build(&self) {
        let package_nav = self.navigables.borrow_mut().push(Navigable::new(None, Rc::from("")));
        let decls_nav = self.navigables.borrow_mut().push(Navigable::new(Some(package_nav), Rc::from("")));
        let import_nav = self.navigables.borrow_mut().push(Navigable::new(Some(package_nav), Rc::from("")));
        let files_nav = self.navigables.borrow_mut().push(Navigable::new(Some(package_nav), Rc::from("")));
        self.package_navigable.set(package_nav);
        self.package_decls_navigable.set(decls_nav);
        self.import_decls_navigable.set(import_nav);
        self.file_frames_navigable.set(files_nav);

        let root = self.frames.borrow_mut().push(Frame::new(None, FrameNode::Root, package_nav, Span::new(0, 0)));
        self.navigables.borrow_mut().get_mut(package_nav).expect("just allocated").frames.push(root);
        self.root_frame.set(root);

        for file in &self.source_files {
            let frame = self.frames.borrow_mut().push(Frame::new(Some(root), FrameNode::File(file.clone()), files_nav, file.span));
            self.navigables.borrow_mut().get_mut(files_nav).expect("just allocated").frames.push(frame);
            self.frames.borrow_mut().get_mut(root).expect("just allocated").children.push(frame);
            self.files.borrow_mut().insert(
                file.name.clone(),
                FileEvaluator {
                    file: file.clone(),
                    frame: Cell::new(frame),
                    import_navigables: RefCell::new(FxHashMap::default()),
                    likely_refs: RefCell::new(None),
                },
            );
        }
    }

    /// Boots this package for use as an import/embed target: evaluates the root frame and every
    /// file frame once, just enough to populate package-clause and import-spec bindings. Does
    /// not force the value of any top-level field — those stay lazy.
    pub fn boot(&self) {
        self.evaluate(self.root_frame.get());
        let file_frames: Vec<FrameId> = self.files.borrow().values().map(|fe| fe.frame.get()).collect();
        for frame in file_frames {
            self.evaluate(frame);
        }
    }

    #[must_use]
    pub(crate) fn rc(&self) -> Rc<Self> {
        self.self_ref.upgrade().expect("evaluator always holds a strong reference to itself")
    }

    #[must_use]
    pub fn file_frame(&self, file_name: &str) -> Option<FrameId> {
        self.files.borrow().get(file_name).map(|fe| fe.frame.get())
    }

    #[must_use]
    pub fn file_names(&self) -> Vec<Rc<str>> {
        self.files.borrow().keys().cloned().collect()
    }

    #[must_use]
    pub(crate) fn package_navigable(&self) -> NavigableId {
        self.package_navigable.get()
    }

    #[must_use]
    pub(crate) fn root_frame(&self) -> FrameId {
        self.root_frame.get()
    }

    /// Looks up the local proxy standing in for `remote_nav` (owned by `remote`), without
    /// creating one if none exists yet — used by `crate::usages`'s importer fan-out to check
    /// whether a navigable was ever actually reached from this package.
    #[must_use]
    pub(crate) fn existing_proxy_for(&self, remote: &Rc<PackageEvaluator>, remote_nav: NavigableId) -> Option<NavigableId> {
        let key = (Rc::as_ptr(remote) as usize, remote_nav);
        self.remote_proxies.borrow().get(&key).copied()
    }

    #[must_use]
    pub(crate) fn package_decls_navigable(&self) -> NavigableId {
        self.package_decls_navigable.get()
    }

    #[must_use]
    pub(crate) fn import_decls_navigable(&self) -> NavigableId {
        self.import_decls_navigable.get()
    }

    /// Byte offsets where `name` is written as a bare identifier somewhere in `file_name` — the
    /// "likely reference" heuristic: a name-to-offsets index built once per file and memoized,
    /// rather than walking the whole file's AST on every query. Used to re-resolve an import's
    /// qualifier at every apparent use site, for `crate::definitions`'s import-spec pivot and
    /// `crate::usages`'s importer fan-out.
    #[must_use]
    pub(crate) fn likely_refs_for(&self, file_name: &str, name: &str) -> Vec<usize> {
        self.likely_refs_map(file_name)
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    fn likely_refs_map(&self, file_name: &str) -> Rc<FxHashMap<Rc<str>, Vec<usize>>> {
        if let Some(existing) = self
            .files
            .borrow()
            .get(file_name)
            .and_then(|fe| fe.likely_refs.borrow().clone())
        {
            return existing;
        }
        let Some(file) = self.files.borrow().get(file_name).map(|fe| fe.file.clone()) else {
            return Rc::new(FxHashMap::default());
        };
        let mut collector = LikelyRefCollector::default();
        cue_ast::visit::walk_file(&mut collector, &file);
        let map = Rc::new(collector.refs);
        if let Some(fe) = self.files.borrow().get(file_name) {
            *fe.likely_refs.borrow_mut() = Some(map.clone());
        }
        map
    }

    // --- arena helpers -----------------------------------------------------------------

    fn alloc_navigable(&self, parent: Option<NavigableId>, name: Rc<str>) -> NavigableId {
        self.navigables.borrow_mut().push(Navigable::new(parent, name))
    }

    fn alloc_frame(&self, parent: Option<FrameId>, node: FrameNode, navigable: NavigableId, span: Span) -> FrameId {
        let id = self.frames.borrow_mut().push(Frame::new(parent, node, navigable, span));
        self.navigables
            .borrow_mut()
            .get_mut(navigable)
            .expect("navigable id valid")
            .frames
            .push(id);
        id
    }

    fn push_child(&self, parent: FrameId, child: FrameId) {
        self.frames
            .borrow_mut()
            .get_mut(parent)
            .expect("frame id valid")
            .children
            .push(child);
    }

    fn bind_lexical(&self, frame_id: FrameId, name: Rc<str>, target: FrameId) {
        self.frames
            .borrow_mut()
            .get_mut(frame_id)
            .expect("frame id valid")
            .bind_lexical(name, target);
    }

    pub(crate) fn frame_navigable(&self, frame_id: FrameId) -> NavigableId {
        self.frames.borrow().get(frame_id).expect("frame id valid").navigable
    }

    fn mark_unknown(&self, frame_id: FrameId, span: Span) {
        self.frames
            .borrow_mut()
            .get_mut(frame_id)
            .expect("frame id valid")
            .unknown
            .add(span.lo, span.hi);
    }

    fn file_name_for_frame(&self, frame_id: FrameId) -> Option<Rc<str>> {
        match &self.frames.borrow().get(frame_id).expect("frame id valid").node {
            FrameNode::File(f) => Some(f.name.clone()),
            _ => None,
        }
    }

    // --- cross-package proxying --------------------------------------------------------

    /// Returns (creating if needed) the local stand-in navigable for `remote_nav`, owned by
    /// `remote`. Memoized by `Rc::as_ptr` identity so repeated traversal into the same package
    /// doesn't grow the proxy table unboundedly.
    pub(crate) fn proxy_for_remote(&self, remote: &Rc<PackageEvaluator>, remote_nav: NavigableId) -> NavigableId {
        let key = (Rc::as_ptr(remote) as usize, remote_nav);
        if let Some(&existing) = self.remote_proxies.borrow().get(&key) {
            return existing;
        }
        let name = remote
            .navigables
            .borrow()
            .get(remote_nav)
            .expect("navigable id valid")
            .name
            .clone();
        let proxy = self
            .navigables
            .borrow_mut()
            .push(Navigable::new_remote(name, remote.clone(), remote_nav));
        self.remote_proxies.borrow_mut().insert(key, proxy);
        proxy
    }

    /// Looks up `name` in `nav`'s bindings, delegating across a remote proxy boundary and
    /// re-wrapping the result in a local proxy if the binding is itself owned by the remote.
    pub(crate) fn navigable_binding(&self, nav: NavigableId, name: &str) -> Option<NavigableId> {
        let remote = self.navigables.borrow().get(nav).expect("navigable id valid").remote.clone();
        if let Some((pkg, remote_nav)) = remote {
            let child = pkg
                .navigables
                .borrow()
                .get(remote_nav)
                .expect("navigable id valid")
                .bindings
                .get(name)
                .copied()?;
            return Some(self.proxy_for_remote(&pkg, child));
        }
        self.navigables
            .borrow()
            .get(nav)
            .expect("navigable id valid")
            .bindings
            .get(name)
            .copied()
    }

    /// `nav`'s `resolvesTo` set, delegating across a remote proxy boundary the same way
    /// `navigable_binding` does.
    pub(crate) fn navigable_resolves_to(&self, nav: NavigableId) -> Vec<NavigableId> {
        let remote = self.navigables.borrow().get(nav).expect("navigable id valid").remote.clone();
        if let Some((pkg, remote_nav)) = remote {
            let targets: Vec<NavigableId> = pkg
                .navigables
                .borrow()
                .get(remote_nav)
                .expect("navigable id valid")
                .resolves_to
                .iter()
                .copied()
                .collect();
            return targets.into_iter().map(|t| self.proxy_for_remote(&pkg, t)).collect();
        }
        self.navigables
            .borrow()
            .get(nav)
            .expect("navigable id valid")
            .resolves_to
            .iter()
            .copied()
            .collect()
    }

    /// Forces every frame behind `nav` to evaluate, looping until a pass makes no further
    /// progress. A single pass is not always enough: evaluating an import-spec frame spawns its
    /// own phase-two child frame under the *same* navigable, which the first pass's snapshot of
    /// `nav.frames` would otherwise miss.
    pub(crate) fn ensure_navigable_evaluated(&self, nav: NavigableId) {
        let remote = self.navigables.borrow().get(nav).expect("navigable id valid").remote.clone();
        if let Some((pkg, remote_nav)) = remote {
            pkg.ensure_navigable_evaluated(remote_nav);
            return;
        }
        loop {
            let frame_ids: Vec<FrameId> = self
                .navigables
                .borrow()
                .get(nav)
                .expect("navigable id valid")
                .frames
                .clone();
            let mut made_progress = false;
            for frame_id in frame_ids {
                let already = self.frames.borrow().get(frame_id).expect("frame id valid").evaluated;
                if !already {
                    self.evaluate(frame_id);
                    made_progress = true;
                }
            }
            if !made_progress {
                break;
            }
        }
        self.navigables
            .borrow_mut()
            .get_mut(nav)
            .expect("navigable id valid")
            .evaluated = true;
    }

    /// Records `node` (inside `frame`) as having resolved to `nav`. A no-op for a remote proxy:
    /// cross-package uses are found by `crate::usages`'s importer fan-out, not by `used_by`,
    /// since `frame` is only meaningful within this evaluator's own arena.
    pub(crate) fn record_use(&self, nav: NavigableId, node: AstNode, frame: FrameId) {
        let is_remote = self.navigables.borrow().get(nav).expect("navigable id valid").remote.is_some();
        if is_remote {
            return;
        }
        self.navigables
            .borrow_mut()
            .get_mut(nav)
            .expect("navigable id valid")
            .record_use(node, frame);
    }

    /// Ensures every import-spec (and its phase-two boot) reachable from `nav` has run. Layered
    /// on top of `ensure_navigable_evaluated`, which already loops to a fixed point — imports
    /// are simply the case that needs more than one pass.
    pub(crate) fn force_import_spec(&self, nav: NavigableId) {
        self.ensure_navigable_evaluated(nav);
    }

    /// Adds every navigable in `result` to `receiver`'s `resolvesTo`, and — for whichever
    /// actually grew the set — wakes every path observer registered on `receiver` (spec §4.4).
    pub(crate) fn ensure_resolves_to(&self, receiver: NavigableId, result: FxHashSet<NavigableId>) {
        let mut grew = false;
        {
            let mut navigables = self.navigables.borrow_mut();
            let nav = navigables.get_mut(receiver).expect("navigable id valid");
            for target in result {
                if nav.add_resolves_to(target) {
                    grew = true;
                }
            }
        }
        if !grew {
            return;
        }
        let observers: Vec<(PathId, usize)> = self
            .navigables
            .borrow()
            .get(receiver)
            .expect("navigable id valid")
            .resolves_to_observers
            .clone();
        for (path_id, index) in observers {
            self.resolve_path_from(path_id, index);
        }
    }

    pub(crate) fn create_path(
        &self,
        owner: FrameId,
        receiver: Option<NavigableId>,
        components: Vec<crate::path::PathComponent>,
        starts_inline: bool,
    ) -> PathId {
        let path_id = self.paths.borrow_mut().push(crate::path::Path {
            owner,
            receiver,
            components,
            starts_inline,
        });
        self.frames
            .borrow_mut()
            .get_mut(owner)
            .expect("frame id valid")
            .paths
            .push(path_id);
        self.resolve_path_from(path_id, 0);
        path_id
    }

    // --- the case analysis ---------------------------------------------------------------

    /// Forces `frame_id` to evaluate, dispatching on its `FrameNode`. A no-op if already
    /// evaluated — `evaluated` latches true and is set before dispatch, so a frame that somehow
    /// re-enters its own evaluation (a cycle) sees itself as already done rather than recursing.
    pub(crate) fn evaluate(&self, frame_id: FrameId) {
        let (already, node) = {
            let frames = self.frames.borrow();
            let frame = frames.get(frame_id).expect("frame id valid");
            (frame.evaluated, frame.node.clone())
        };
        if already {
            return;
        }
        self.frames.borrow_mut().get_mut(frame_id).expect("frame id valid").evaluated = true;

        match node {
            FrameNode::Root => {}
            FrameNode::File(file) => self.evaluate_file(frame_id, &file),
            FrameNode::Struct(s) => self.evaluate_decls(frame_id, &s.elements),
            FrameNode::Expr { expr, embeds } => self.evaluate_expr_frame(frame_id, &expr, embeds),
            FrameNode::FieldDecl(decl) => self.register_ancestral_path(frame_id, &decl),
            FrameNode::ImportSpec(spec) => self.evaluate_import_spec_frame(frame_id, &spec),
            FrameNode::ImportSpecRemote(spec) => self.evaluate_import_spec_remote(frame_id, &spec),
            FrameNode::PackageClause(pkg) => self.evaluate_package_clause_frame(frame_id, &pkg),
            FrameNode::ComprehensionClause { comp, index, body_nav } => {
                self.evaluate_comprehension_clause(frame_id, &comp, index, body_nav);
            }
            FrameNode::Attribute(attr) => self.evaluate_attribute_frame(frame_id, &attr),
        }
    }

    fn evaluate_file(&self, frame_id: FrameId, file: &Rc<cue_ast::ast::File>) {
        if let Some(package) = &file.package {
            self.bind_package_clause(frame_id, package);
        }
        self.evaluate_decls(frame_id, &file.decls);
    }

    /// Binds (or reuses) the navigable for this package's declared name, shared by every file
    /// in the package that declares the same name. Resolves the navigable fully before
    /// allocating the frame, so the frame is never created pointing at the wrong navigable and
    /// then "re-homed" (invariant 1 requires `frame.navigable`/`navigable.frames` to agree from
    /// the moment a frame exists).
    fn bind_package_clause(&self, file_frame: FrameId, pkg: &Rc<Package>) {
        let Some(name) = &pkg.name else { return };
        let decls_nav = self.package_decls_navigable.get();
        let child_nav = self.navigable_binding(decls_nav, &name.name).unwrap_or_else(|| {
            let nav = self.alloc_navigable(Some(decls_nav), name.name.clone());
            self.navigables
                .borrow_mut()
                .get_mut(decls_nav)
                .expect("navigable id valid")
                .bind(name.name.clone(), nav);
            nav
        });
        let frame = self.alloc_frame(Some(file_frame), FrameNode::PackageClause(pkg.clone()), child_nav, pkg.span());
        self.push_child(file_frame, frame);
        self.frames.borrow_mut().get_mut(frame).expect("just allocated").key = Some(AstNode::Package(pkg.clone()));
    }

    fn evaluate_package_clause_frame(&self, _frame_id: FrameId, _pkg: &Rc<Package>) {}

    fn evaluate_decls(&self, frame_id: FrameId, decls: &[Decl]) {
        for decl in decls {
            match decl {
                Decl::Field(field) => self.evaluate_field(frame_id, field.clone()),
                Decl::Embed(embed) => self.evaluate_expr_frame(frame_id, &embed.expr, true),
                Decl::Alias(alias) => self.evaluate_alias_decl(frame_id, alias.clone()),
                Decl::Import(import_decl) => self.evaluate_import_decl(frame_id, import_decl),
                Decl::Attribute(attr) => self.attach_attribute(frame_id, attr.clone()),
                Decl::Ellipsis(ellipsis) => self.evaluate_ellipsis(frame_id, ellipsis.clone()),
                Decl::Comprehension(comp) => self.evaluate_comprehension(frame_id, comp.clone(), true),
                Decl::Err(_, span) => self.mark_unknown(frame_id, *span),
            }
        }
    }

    fn evaluate_alias_decl(&self, frame_id: FrameId, alias: Rc<Alias>) {
        let parent_nav = self.frame_navigable(frame_id);
        let fresh = self.alloc_navigable(Some(parent_nav), Rc::from(""));
        let child = self.alloc_frame(
            Some(frame_id),
            FrameNode::Expr { expr: alias.expr.clone(), embeds: false },
            fresh,
            alias.span(),
        );
        self.push_child(frame_id, child);
        self.bind_lexical(frame_id, alias.ident.name.clone(), child);
    }

    fn evaluate_import_decl(&self, frame_id: FrameId, decl: &Rc<ImportDecl>) {
        for spec in decl.specs.iter() {
            self.bind_import_spec(frame_id, spec.clone());
        }
    }

    /// Phase one: the lexical qualifier binding. Runs eagerly, synchronously, as part of the
    /// enclosing file frame's own evaluation — other identifiers in the same file may reference
    /// this import's qualifier before the spec's own (lazy) frame is ever separately forced.
    fn bind_import_spec(&self, file_frame: FrameId, spec: Rc<ImportSpec>) {
        let qualifier: Rc<str> = spec
            .alias
            .as_ref()
            .map_or_else(|| default_import_qualifier(&spec.path.value), |a| a.name.clone());
        let canonical = self.config.canonicalize(&spec.path.value);

        let imports_nav = self.import_decls_navigable.get();
        let import_nav = self.navigable_binding(imports_nav, &canonical).unwrap_or_else(|| {
            let nav = self.alloc_navigable(Some(imports_nav), canonical.clone());
            self.navigables
                .borrow_mut()
                .get_mut(imports_nav)
                .expect("navigable id valid")
                .bind(canonical.clone(), nav);
            nav
        });

        let spec_frame = self.alloc_frame(Some(file_frame), FrameNode::ImportSpec(spec.clone()), import_nav, spec.span());
        self.push_child(file_frame, spec_frame);
        self.frames.borrow_mut().get_mut(spec_frame).expect("just allocated").key =
            Some(AstNode::ImportSpec(spec.clone()));
        self.bind_lexical(file_frame, qualifier, spec_frame);

        if let Some(file_name) = self.file_name_for_frame(file_frame) {
            self.files
                .borrow()
                .get(&file_name)
                .expect("file registered in build()")
                .import_navigables
                .borrow_mut()
                .insert(canonical, import_nav);
        }
    }

    /// Phase one's lazy half: spawns the phase-two (remote boot) frame the first time this
    /// import spec's own frame is forced (by path resolution reaching it, or by a query
    /// descending into it directly).
    fn evaluate_import_spec_frame(&self, frame_id: FrameId, spec: &Rc<ImportSpec>) {
        let nav = self.frame_navigable(frame_id);
        let remote_frame = self.alloc_frame(Some(frame_id), FrameNode::ImportSpecRemote(spec.clone()), nav, spec.span());
        self.push_child(frame_id, remote_frame);
    }

    /// Phase two: boots the remote package (or substitutes an empty phantom) and links it in as
    /// a `resolvesTo` proxy, so navigating past the import's qualifier reaches the remote
    /// package's own top-level bindings.
    fn evaluate_import_spec_remote(&self, frame_id: FrameId, spec: &Rc<ImportSpec>) {
        let canonical = self.config.canonicalize(&spec.path.value);
        let remote = (self.config.resolve_import)(&canonical).unwrap_or_else(Self::empty_phantom);
        remote.boot();

        let remote_root = remote.package_navigable();
        let proxy = self.proxy_for_remote(&remote, remote_root);

        let nav = self.frame_navigable(frame_id);
        self.navigables
            .borrow_mut()
            .get_mut(nav)
            .expect("navigable id valid")
            .add_resolves_to(proxy);
        self.record_use(nav, AstNode::ImportSpec(spec.clone()), frame_id);
    }

    fn attach_attribute(&self, frame_id: FrameId, attr: Rc<Attribute>) {
        if self.config.resolve_embed.is_none() {
            self.mark_unknown(frame_id, attr.span());
            return;
        }
        let nav = self.frame_navigable(frame_id);
        let child = self.alloc_frame(Some(frame_id), FrameNode::Attribute(attr.clone()), nav, attr.span());
        self.push_child(frame_id, child);
    }

    /// Attribute-driven embedding, analogous to an import spec's phase two: boots the
    /// referenced package (if any) and links it in as a `resolvesTo` proxy of the attribute's
    /// own enclosing navigable.
    fn evaluate_attribute_frame(&self, frame_id: FrameId, attr: &Rc<Attribute>) {
        let Some(resolve_embed) = self.config.resolve_embed.clone() else { return };
        let Some(remote) = resolve_embed(&attr.text) else {
            log::debug!("embed attribute @{}({}) did not resolve to a package", attr.name.name, attr.text);
            return;
        };
        remote.boot();

        let remote_root = remote.package_navigable();
        let proxy = self.proxy_for_remote(&remote, remote_root);

        let nav = self.frame_navigable(frame_id);
        self.navigables
            .borrow_mut()
            .get_mut(nav)
            .expect("navigable id valid")
            .add_resolves_to(proxy);
        self.record_use(nav, AstNode::Attribute(attr.clone()), frame_id);
    }

    fn evaluate_ellipsis(&self, frame_id: FrameId, ellipsis: Rc<Ellipsis>) {
        let parent_nav = self.frame_navigable(frame_id);
        let nav = self.alloc_navigable(Some(parent_nav), Rc::from("__..."));
        let expr = ellipsis.ty.clone().unwrap_or(Expr::Ellipsis(ellipsis.clone()));
        let span = expr.span();
        let frame = self.alloc_frame(Some(frame_id), FrameNode::Expr { expr, embeds: false }, nav, span);
        self.push_child(frame_id, frame);
        self.frames.borrow_mut().get_mut(frame_id).expect("frame id valid").ellipses.push(nav);
        // The ellipsis's own navigable has no field label of its own; its "defining token" for a
        // definitions query is the `...` (or `...T`) token itself, since that is what reached for
        // this slot when an index falls through `navigate_by_name`'s direct-binding lookup.
        self.frames.borrow_mut().get_mut(frame).expect("just allocated").key = Some(AstNode::Ellipsis(ellipsis));
    }

    fn evaluate_list(&self, frame_id: FrameId, elements: &[Expr]) {
        let mut index = 0usize;
        for elem in elements {
            if let Expr::Ellipsis(ellipsis) = elem {
                self.evaluate_ellipsis(frame_id, ellipsis.clone());
                continue;
            }
            let key_name: Rc<str> = Rc::from(format!("__{index}").as_str());
            let parent_nav = self.frame_navigable(frame_id);
            let child_nav = self.alloc_navigable(Some(parent_nav), key_name.clone());
            self.navigables
                .borrow_mut()
                .get_mut(parent_nav)
                .expect("navigable id valid")
                .bind(key_name, child_nav);
            let value_frame = self.alloc_frame(
                Some(frame_id),
                FrameNode::Expr { expr: elem.clone(), embeds: true },
                child_nav,
                elem.span(),
            );
            self.push_child(frame_id, value_frame);
            index += 1;
        }
    }

    fn evaluate_field(&self, frame_id: FrameId, field: Rc<cue_ast::ast::Field>) {
        let decl = Rc::new(FieldDeclExpr::new(field.clone()));
        let parent_nav = self.frame_navigable(frame_id);

        let child_nav = if decl.is_pattern() {
            self.alloc_navigable(Some(parent_nav), Rc::from(""))
        } else {
            self.navigable_binding(parent_nav, &decl.main_name).unwrap_or_else(|| {
                let nav = self.alloc_navigable(Some(parent_nav), decl.main_name.clone());
                self.navigables
                    .borrow_mut()
                    .get_mut(parent_nav)
                    .expect("navigable id valid")
                    .bind(decl.main_name.clone(), nav);
                nav
            })
        };

        let value_frame = self.alloc_frame(
            Some(frame_id),
            FrameNode::Expr { expr: field.value.clone(), embeds: true },
            child_nav,
            field.span,
        );
        self.push_child(frame_id, value_frame);
        decl.value_frame.set(Some(value_frame));
        self.frames.borrow_mut().get_mut(value_frame).expect("just allocated").docs = field.docs.clone();

        if let Some(alias_ident) = &field.label.alias {
            match field.label.alias_scope {
                cue_ast::ast::AliasScope::Parent => self.bind_lexical(frame_id, alias_ident.name.clone(), value_frame),
                cue_ast::ast::AliasScope::Value => self.bind_lexical(value_frame, alias_ident.name.clone(), value_frame),
                cue_ast::ast::AliasScope::None => {}
            }
        }
        // Nested pattern aliases (`[X=string]: ...`) are, per the spec's open question on
        // repeated aliases, all kept and all treated as value-scoped.
        for alias in &decl.aliases {
            self.bind_lexical(value_frame, alias.ident.name.clone(), value_frame);
        }
        for sub in &decl.sub_exprs {
            let fresh = self.alloc_navigable(Some(parent_nav), Rc::from(""));
            let sub_frame = self.alloc_frame(
                Some(frame_id),
                FrameNode::Expr { expr: sub.clone(), embeds: false },
                fresh,
                sub.span(),
            );
            self.push_child(frame_id, sub_frame);
        }

        let decl_frame = self.alloc_frame(Some(frame_id), FrameNode::FieldDecl(decl.clone()), child_nav, decl.span);
        self.push_child(frame_id, decl_frame);
        self.frames.borrow_mut().get_mut(decl_frame).expect("just allocated").key = decl.key_node();
    }

    fn evaluate_comprehension(&self, frame_id: FrameId, comp: Rc<cue_ast::ast::Comprehension>, embeds: bool) {
        let parent_nav = self.frame_navigable(frame_id);
        let body_nav = self.alloc_navigable(Some(parent_nav), Rc::from(""));
        if embeds {
            self.navigables
                .borrow_mut()
                .get_mut(parent_nav)
                .expect("navigable id valid")
                .add_resolves_to(body_nav);
            self.record_use(body_nav, AstNode::Expr(Expr::Comprehension(comp.clone())), frame_id);
        }
        let chain_nav = self.alloc_navigable(Some(parent_nav), Rc::from(""));
        let first = self.alloc_frame(
            Some(frame_id),
            FrameNode::ComprehensionClause { comp: comp.clone(), index: 0, body_nav },
            chain_nav,
            comp.span(),
        );
        self.push_child(frame_id, first);
    }

    fn evaluate_comprehension_clause(
        &self,
        frame_id: FrameId,
        comp: &Rc<cue_ast::ast::Comprehension>,
        index: usize,
        body_nav: NavigableId,
    ) {
        let chain_nav = self.frame_navigable(frame_id);

        if index >= comp.clauses.len() {
            let body_frame = self.alloc_frame(Some(frame_id), FrameNode::Struct(comp.value.clone()), body_nav, comp.span());
            self.push_child(frame_id, body_frame);
            return;
        }

        let next = self.alloc_frame(
            Some(frame_id),
            FrameNode::ComprehensionClause { comp: comp.clone(), index: index + 1, body_nav },
            chain_nav,
            comp.span(),
        );
        self.push_child(frame_id, next);

        match &comp.clauses[index] {
            Clause::For(for_clause) => {
                let src_nav = self.alloc_navigable(Some(chain_nav), Rc::from(""));
                let src_frame = self.alloc_frame(
                    Some(frame_id),
                    FrameNode::Expr { expr: for_clause.source.clone(), embeds: false },
                    src_nav,
                    for_clause.source.span(),
                );
                self.push_child(frame_id, src_frame);

                // `key`/`value` are bound conservatively to an empty navigable (`next`'s own):
                // the per-iteration element shape is never concretely known under MAY-analysis.
                if let Some(key) = &for_clause.key {
                    self.bind_lexical(next, key.name.clone(), next);
                }
                self.bind_lexical(next, for_clause.value.name.clone(), next);
            }
            Clause::If(if_clause) => {
                let cond_nav = self.alloc_navigable(Some(chain_nav), Rc::from(""));
                let cond_frame = self.alloc_frame(
                    Some(frame_id),
                    FrameNode::Expr { expr: if_clause.cond.clone(), embeds: false },
                    cond_nav,
                    if_clause.cond.span(),
                );
                self.push_child(frame_id, cond_frame);
            }
            Clause::Let(let_clause) => {
                let val_nav = self.alloc_navigable(Some(chain_nav), Rc::from(""));
                let val_frame = self.alloc_frame(
                    Some(frame_id),
                    FrameNode::Expr { expr: let_clause.expr.clone(), embeds: false },
                    val_nav,
                    let_clause.expr.span(),
                );
                self.push_child(frame_id, val_frame);
                self.bind_lexical(next, let_clause.ident.name.clone(), val_frame);
            }
        }
    }

    /// The general expression dispatch, shared by field values, embeddings, conjunction and
    /// disjunction operands, and every other expression-valued position. `embeds` is only
    /// consulted by the shapes that can feed a `resolvesTo` edge (`Ident`/`Selector`/`Index`,
    /// and recursively through `Paren`/`Postfix`/`Alias`/`Comprehension`) — a struct or list
    /// literal always merges directly into its own frame regardless of `embeds`, and shapes with
    /// no structural content of their own (`Unary`, `Binary` outside `&`/`|`, `Call`) ignore it.
    fn evaluate_expr_frame(&self, frame_id: FrameId, expr: &Expr, embeds: bool) {
        match expr {
            Expr::Struct(s) => self.evaluate_decls(frame_id, &s.elements),
            Expr::List(l) => self.evaluate_list(frame_id, &l.elements),
            Expr::Ident(_) | Expr::Selector(_) | Expr::Index(_) => self.build_path_from_expr(frame_id, expr, embeds),
            Expr::Paren(p) => self.evaluate_expr_frame(frame_id, &p.expr, embeds),
            Expr::Postfix(p) => self.evaluate_expr_frame(frame_id, &p.expr, embeds),
            Expr::Unary(u) => self.evaluate_unary(frame_id, u),
            Expr::Binary(b) => self.evaluate_binary(frame_id, b),
            Expr::Call(c) => self.evaluate_call(frame_id, c),
            Expr::Interpolation(interp) => self.evaluate_interpolation(frame_id, interp),
            Expr::Comprehension(comp) => self.evaluate_comprehension(frame_id, comp.clone(), embeds),
            Expr::Alias(alias) => {
                self.bind_lexical(frame_id, alias.ident.name.clone(), frame_id);
                self.evaluate_expr_frame(frame_id, &alias.expr, embeds);
            }
            Expr::Ellipsis(ellipsis) => self.evaluate_ellipsis(frame_id, ellipsis.clone()),
            Expr::Lit(_) => {}
            Expr::Err(_, span) => self.mark_unknown(frame_id, *span),
        }
    }

    fn evaluate_unary(&self, frame_id: FrameId, u: &Rc<cue_ast::ast::UnaryExpr>) {
        let parent_nav = self.frame_navigable(frame_id);
        let fresh = self.alloc_navigable(Some(parent_nav), Rc::from(""));
        let child = self.alloc_frame(
            Some(frame_id),
            FrameNode::Expr { expr: u.expr.clone(), embeds: false },
            fresh,
            u.expr.span(),
        );
        self.push_child(frame_id, child);
    }

    fn evaluate_binary(&self, frame_id: FrameId, b: &Rc<cue_ast::ast::BinaryExpr>) {
        match b.op {
            cue_ast::ast::BinOp::And => {
                let nav = self.frame_navigable(frame_id);
                for operand in [&b.lhs, &b.rhs] {
                    let child = self.alloc_frame(
                        Some(frame_id),
                        FrameNode::Expr { expr: operand.clone(), embeds: true },
                        nav,
                        b.span,
                    );
                    self.push_child(frame_id, child);
                }
            }
            cue_ast::ast::BinOp::Or => {
                let parent_nav = self.frame_navigable(frame_id);
                let mut branches = Vec::with_capacity(2);
                for operand in [&b.lhs, &b.rhs] {
                    let fresh = self.alloc_navigable(Some(parent_nav), Rc::from(""));
                    let child = self.alloc_frame(
                        Some(frame_id),
                        FrameNode::Expr { expr: operand.clone(), embeds: true },
                        fresh,
                        operand.span(),
                    );
                    self.push_child(frame_id, child);
                    branches.push(fresh);
                }
                {
                    let mut navigables = self.navigables.borrow_mut();
                    let nav = navigables.get_mut(parent_nav).expect("navigable id valid");
                    for &branch in &branches {
                        nav.add_resolves_to(branch);
                    }
                }
                for &branch in &branches {
                    self.record_use(branch, AstNode::Expr(Expr::Binary(b.clone())), frame_id);
                }
            }
            cue_ast::ast::BinOp::Other => {
                for operand in [&b.lhs, &b.rhs] {
                    let parent_nav = self.frame_navigable(frame_id);
                    let fresh = self.alloc_navigable(Some(parent_nav), Rc::from(""));
                    let child = self.alloc_frame(
                        Some(frame_id),
                        FrameNode::Expr { expr: operand.clone(), embeds: false },
                        fresh,
                        operand.span(),
                    );
                    self.push_child(frame_id, child);
                }
            }
        }
    }

    fn evaluate_call(&self, frame_id: FrameId, c: &Rc<cue_ast::ast::CallExpr>) {
        for operand in std::iter::once(&c.callee).chain(c.args.iter()) {
            let parent_nav = self.frame_navigable(frame_id);
            let fresh = self.alloc_navigable(Some(parent_nav), Rc::from(""));
            let child = self.alloc_frame(
                Some(frame_id),
                FrameNode::Expr { expr: operand.clone(), embeds: false },
                fresh,
                operand.span(),
            );
            self.push_child(frame_id, child);
        }
    }

    /// An interpolation's embedded expressions each get their own opaque-by-default child frame;
    /// the whole span is marked unknown since the literal text portions carry no span of their
    /// own to exempt precisely (spec's opaque-range suppression, applied conservatively here).
    fn evaluate_interpolation(&self, frame_id: FrameId, interp: &Rc<cue_ast::ast::Interpolation>) {
        for component in interp.components.iter() {
            if let cue_ast::ast::StringComponent::Expr(e) = component {
                let parent_nav = self.frame_navigable(frame_id);
                let fresh = self.alloc_navigable(Some(parent_nav), Rc::from(""));
                let child = self.alloc_frame(
                    Some(frame_id),
                    FrameNode::Expr { expr: e.clone(), embeds: false },
                    fresh,
                    e.span(),
                );
                self.push_child(frame_id, child);
            }
        }
        self.mark_unknown(frame_id, interp.span());
    }

    // --- path construction ----------------------------------------------------------------

    /// The MAY-analysis seed for a bare identifier: every navigable that some enclosing frame's
    /// lexical or structural bindings could plausibly mean by this name. At each frame walked, a
    /// lexical binding (alias, comprehension variable, import qualifier) shadows that same
    /// frame's own structural field binding — but the walk does not stop at the first frame with
    /// *any* match. It keeps climbing the parent chain to the package navigable, unioning in
    /// whatever further-out frames also bind the name, because a same-named sibling introduced by
    /// a conjunction operand and a same-named declaration further out are both resolutions
    /// "simple structural analysis can justify" (spec's completeness requirement), not mutually
    /// exclusive alternatives.
    fn resolve_ident_seed(&self, frame_id: FrameId, ident: &Ident) -> FxHashSet<NavigableId> {
        let mut cur = Some(frame_id);
        let mut found = FxHashSet::default();
        while let Some(fid) = cur {
            let (lexical, own_nav, parent) = {
                let frames = self.frames.borrow();
                let frame = frames.get(fid).expect("frame id valid");
                (frame.lexical.get(&ident.name).cloned(), frame.navigable, frame.parent)
            };
            if let Some(bound) = lexical {
                found.extend(bound.iter().map(|f| self.frame_navigable(*f)));
            } else if let Some(child) = self.navigable_binding(own_nav, &ident.name) {
                found.insert(child);
            }
            cur = parent;
        }
        found
    }

    /// Decomposes a selector/index chain into its root and an ordered list of names, or `None`
    /// if `expr` is not path-shaped at all (an arbitrary expression in index position, or a
    /// non-literal index — spec's "defeats indexing" case).
    fn decompose(&self, expr: &Expr) -> Option<(PathRoot, Vec<(Option<AstNode>, Rc<str>, Span)>)> {
        match expr {
            Expr::Ident(ident) => Some((PathRoot::Ident(ident.clone()), Vec::new())),
            Expr::Paren(p) => self.decompose(&p.expr),
            Expr::Struct(_) | Expr::List(_) => Some((PathRoot::Inline(expr.clone()), Vec::new())),
            Expr::Selector(s) => {
                let (root, mut names) = self.decompose(&s.expr)?;
                let (node, name) = match &s.sel {
                    Selector::Ident(i) => (AstNode::Ident(i.clone()), i.name.clone()),
                    Selector::String(lit) => (AstNode::BasicLit(lit.clone()), lit.value.clone()),
                };
                names.push((Some(node), name, s.span));
                Some((root, names))
            }
            Expr::Index(ix) => {
                let (root, mut names) = self.decompose(&ix.expr)?;
                match &ix.index {
                    Expr::Lit(lit) if lit.kind == BasicLitKind::Int => {
                        let name: Rc<str> = Rc::from(format!("__{}", lit.value).as_str());
                        names.push((Some(AstNode::BasicLit(lit.clone())), name, ix.span));
                        Some((root, names))
                    }
                    Expr::Lit(lit) if lit.kind == BasicLitKind::String => {
                        names.push((Some(AstNode::BasicLit(lit.clone())), lit.value.clone(), ix.span));
                        Some((root, names))
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn build_path_from_expr(&self, frame_id: FrameId, expr: &Expr, embeds: bool) {
        let Some((root, names)) = self.decompose(expr) else {
            self.mark_unknown(frame_id, expr.span());
            return;
        };

        let (seed, seed_span) = match &root {
            PathRoot::Ident(ident) => {
                let seed = self.resolve_ident_seed(frame_id, ident);
                for &nav in &seed {
                    self.record_use(nav, AstNode::Ident(ident.clone()), frame_id);
                    self.force_import_spec(nav);
                }
                (seed, ident.span())
            }
            PathRoot::Inline(inline) => {
                let parent_nav = self.frame_navigable(frame_id);
                let fresh = self.alloc_navigable(Some(parent_nav), Rc::from(""));
                let child = self.alloc_frame(
                    Some(frame_id),
                    FrameNode::Expr { expr: inline.clone(), embeds: false },
                    fresh,
                    inline.span(),
                );
                self.push_child(frame_id, child);
                (std::iter::once(fresh).collect(), inline.span())
            }
        };

        let terminal_span = names.last().map_or(seed_span, |(_, _, s)| *s);
        let starts_inline = matches!(root, PathRoot::Inline(_));
        let receiver = if embeds { Some(self.frame_navigable(frame_id)) } else { None };
        let components = build_components(seed, seed_span, names, terminal_span);
        self.create_path(frame_id, receiver, components, starts_inline);
    }
}

/// The root of a decomposed path: a lexically-resolved identifier, or an inline struct/list
/// literal (which seeds the path with a fresh navigable of its own).
enum PathRoot {
    Ident(Rc<Ident>),
    Inline(Expr),
}

pub(crate) fn default_import_qualifier(path: &str) -> Rc<str> {
    Rc::from(path.rsplit('/').next().unwrap_or(path))
}

/// Builds the name-to-offsets index `PackageEvaluator::likely_refs_for` memoizes: every bare
/// identifier's name and byte position, wherever it occurs (a field label, an alias, an
/// expression-position reference). Over-inclusive by design — a field label `foo: 1` counts as
/// a "reference" to the name `foo` alongside any real use of it — since the only consumers
/// (the import-spec pivot, the importer fan-out) re-resolve each offset and discard whatever
/// does not actually implicate the import in question.
#[derive(Default)]
struct LikelyRefCollector {
    refs: FxHashMap<Rc<str>, Vec<usize>>,
}

impl<'a> cue_ast::visit::Visitor<'a> for LikelyRefCollector {
    fn visit_ident(&mut self, ident: &'a Ident) {
        self.refs.entry(ident.name.clone()).or_default().push(ident.span().lo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completions::CompletionKind;
    use cue_ast::builder::Builder;

    fn test_config() -> Config {
        Config {
            canonical_import_path: Rc::from("example.com/t"),
            import_canonicalization: FxHashMap::default(),
            resolve_import: Rc::new(|_| None),
            list_importers: Rc::new(Vec::new),
            supports_references: false,
            resolve_embed: None,
            list_embedders: None,
        }
    }

    fn single_file(file: cue_ast::ast::File) -> Rc<PackageEvaluator> {
        PackageEvaluator::new(test_config(), vec![Rc::new(file)])
    }

    // p: q: 1
    fn nested_field_fixture(b: &mut Builder) -> cue_ast::ast::File {
        let q = b.ident("q", Span::new(3, 4));
        let one = b.int("1", Span::new(6, 7));
        let field_q = b.field(b.label_ident(q), b.lit_expr(one), Span::new(3, 7));
        let p = b.ident("p", Span::new(0, 1));
        let inner = b.struct_expr(vec![field_q], Span::new(3, 7));
        let field_p = b.field(b.label_ident(p), inner, Span::new(0, 7));
        b.file("t.cue", None, vec![field_p], Span::new(0, 8))
    }

    #[test]
    fn self_resolution_and_idempotence_of_queries() {
        let mut b = Builder::new();
        let file = nested_field_fixture(&mut b);
        let evaluator = single_file(file);

        let first = evaluator.definitions_for_offset("t.cue", 0);
        let second = evaluator.definitions_for_offset("t.cue", 0);
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        let AstNode::Ident(ident) = &first[0] else { panic!("expected an ident key") };
        assert_eq!(ident.name.as_ref(), "p");
        assert_eq!(ident.span(), Span::new(0, 1));
    }

    #[test]
    fn idempotence_of_reset() {
        let mut b = Builder::new();
        let file = nested_field_fixture(&mut b);
        let evaluator = single_file(file);

        let before = evaluator.definitions_for_offset("t.cue", 4);
        evaluator.reset();
        let after = evaluator.definitions_for_offset("t.cue", 4);
        assert_eq!(before, after);
        assert_eq!(before.len(), 1);
    }

    #[test]
    fn opaque_range_suppression_for_string_literals() {
        // s: "hello"
        let mut b = Builder::new();
        let s = b.ident("s", Span::new(0, 1));
        let lit = b.string("hello", Span::new(3, 10));
        let field_s = b.field(b.label_ident(s), b.lit_expr(lit), Span::new(0, 10));
        let file = b.file("t.cue", None, vec![field_s], Span::new(0, 11));
        let evaluator = single_file(file);

        assert!(evaluator.definitions_for_offset("t.cue", 6).is_empty());
        assert!(evaluator.completions_for_offset("t.cue", 6).is_empty());
    }

    #[test]
    fn first_element_lexical_rule_prefers_nearest_lexical_binding_over_same_named_field() {
        // y=1
        // y: w: 9
        // foo: y
        let mut b = Builder::new();
        let y_alias_ident = b.ident("y", Span::new(0, 1));
        let one = b.int("1", Span::new(2, 3));
        let alias_decl = b.alias_decl(y_alias_ident, b.lit_expr(one), Span::new(0, 3));

        let y_field_ident = b.ident("y", Span::new(4, 5));
        let w_ident = b.ident("w", Span::new(7, 8));
        let nine = b.int("9", Span::new(10, 11));
        let field_w = b.field(b.label_ident(w_ident), b.lit_expr(nine), Span::new(7, 11));
        let struct_y = b.struct_expr(vec![field_w], Span::new(7, 11));
        let field_y = b.field(b.label_ident(y_field_ident), struct_y, Span::new(4, 11));

        let foo_ident = b.ident("foo", Span::new(12, 15));
        let y_ref = b.ident("y", Span::new(17, 18));
        let field_foo = b.field(b.label_ident(foo_ident), b.ident_expr(y_ref), Span::new(12, 18));

        let file = b.file("t.cue", None, vec![alias_decl, field_y, field_foo], Span::new(0, 19));
        let evaluator = single_file(file);

        let file_frame = evaluator.file_frame("t.cue").expect("file registered");
        let leaves = evaluator.leaf_frames_at(file_frame, 17);
        let lookup = b.ident("y", Span::new(17, 18));
        let seed = evaluator.resolve_ident_seed(leaves[0], &lookup);
        assert_eq!(seed.len(), 1);

        let resolved = *seed.iter().next().expect("non-empty seed");
        let files_nav = evaluator.file_frames_navigable.get();
        let y_field_nav = evaluator.navigable_binding(files_nav, "y").expect("y field bound");
        assert_ne!(resolved, y_field_nav, "a bare `y` must resolve to the nearest lexical alias, not the same-named field");
    }

    #[test]
    fn completions_exclude_synthetic_list_index_names() {
        // n: [1, 2]
        // out: n.x
        let mut b = Builder::new();
        let one = b.int("1", Span::new(4, 5));
        let two = b.int("2", Span::new(7, 8));
        let list = b.list_expr(vec![b.lit_expr(one), b.lit_expr(two)], Span::new(3, 9));
        let n_key = b.ident("n", Span::new(0, 1));
        let field_n = b.field(b.label_ident(n_key), list, Span::new(0, 9));

        let out_key = b.ident("out", Span::new(10, 13));
        let n_ref = b.ident("n", Span::new(15, 16));
        let x_sel = b.ident("x", Span::new(17, 18));
        let selector = b.selector(b.ident_expr(n_ref), x_sel, Span::new(15, 18));
        let field_out = b.field(b.label_ident(out_key), selector, Span::new(10, 18));

        let file = b.file("t.cue", None, vec![field_n, field_out], Span::new(0, 19));
        let evaluator = single_file(file);

        // `n`'s own bindings are only the synthetic `__0`/`__1` list-index names; completing
        // right after `n.` must never surface them.
        let completions = evaluator.completions_for_offset("t.cue", 17);
        for names in completions.values() {
            for name in names {
                assert!(!name.starts_with("__"), "synthetic list-index name leaked into completions: {name}");
            }
        }
    }

    #[test]
    fn ellipsis_is_a_definitions_target() {
        // n: [1, ...]
        let mut b = Builder::new();
        let one = b.int("1", Span::new(4, 5));
        let ellipsis = b.ellipsis(None, Span::new(7, 10));
        let list = b.list_expr(vec![b.lit_expr(one), Expr::Ellipsis(ellipsis)], Span::new(3, 11));
        let n = b.ident("n", Span::new(0, 1));
        let field_n = b.field(b.label_ident(n), list, Span::new(0, 11));
        let file = b.file("t.cue", None, vec![field_n], Span::new(0, 12));
        let evaluator = single_file(file);

        let defs = evaluator.definitions_for_offset("t.cue", 8);
        assert_eq!(defs.len(), 1);
        assert!(matches!(&defs[0], AstNode::Ellipsis(_)));
    }

    #[test]
    fn scenario_list_index_out_of_finite_range_falls_back_to_ellipsis_element() {
        // d: [{a: 5}, {b: 6}, ...{a: 4}][17].a
        let mut b = Builder::new();

        let a0_key = b.ident("a", Span::new(5, 6));
        let five = b.int("5", Span::new(8, 9));
        let field_a0 = b.field(b.label_ident(a0_key.clone()), b.lit_expr(five), Span::new(5, 9));
        let elem0 = b.struct_expr(vec![field_a0], Span::new(4, 10));

        let b1_key = b.ident("b", Span::new(13, 14));
        let six = b.int("6", Span::new(16, 17));
        let field_b1 = b.field(b.label_ident(b1_key), b.lit_expr(six), Span::new(13, 17));
        let elem1 = b.struct_expr(vec![field_b1], Span::new(12, 18));

        let a_ellipsis_key = b.ident("a", Span::new(24, 25));
        let four = b.int("4", Span::new(27, 28));
        let field_a_ellipsis = b.field(b.label_ident(a_ellipsis_key.clone()), b.lit_expr(four), Span::new(24, 28));
        let ellipsis_struct = b.struct_expr(vec![field_a_ellipsis], Span::new(23, 29));
        let ellipsis = b.ellipsis(Some(ellipsis_struct), Span::new(20, 29));

        let list = b.list_expr(vec![elem0, elem1, Expr::Ellipsis(ellipsis)], Span::new(3, 30));

        let seventeen = b.int("17", Span::new(31, 33));
        let indexed = b.index(list, b.lit_expr(seventeen), Span::new(3, 34));

        let a_sel = b.ident("a", Span::new(35, 36));
        let selector = b.selector(indexed, a_sel, Span::new(3, 36));

        let d_key = b.ident("d", Span::new(0, 1));
        let field_d = b.field(b.label_ident(d_key), selector, Span::new(0, 36));

        let file = b.file("t.cue", None, vec![field_d], Span::new(0, 37));
        let evaluator = single_file(file);

        // Index 17 is out of finite range (only elements 0 and 1 are direct), so only the
        // ellipsis branch can supply `.a` — element 0's own `a` must not leak in.
        let on_a = evaluator.definitions_for_offset("t.cue", 35);
        assert_eq!(on_a, vec![AstNode::Ident(a_ellipsis_key)]);
        assert!(!on_a.contains(&AstNode::Ident(a0_key)));

        // `[17]` itself has no direct `__17` binding, so it resolves to the ellipsis token.
        let on_index = evaluator.definitions_for_offset("t.cue", 32);
        assert_eq!(on_index.len(), 1);
        assert!(matches!(&on_index[0], AstNode::Ellipsis(_)));
    }

    #[test]
    fn usage_definition_symmetry() {
        // a: 5
        // b: a
        let mut b = Builder::new();
        let a_key = b.ident("a", Span::new(0, 1));
        let five = b.int("5", Span::new(3, 4));
        let field_a = b.field(b.label_ident(a_key.clone()), b.lit_expr(five), Span::new(0, 4));

        let b_key = b.ident("b", Span::new(5, 6));
        let a_ref = b.ident("a", Span::new(8, 9));
        let field_b = b.field(b.label_ident(b_key), b.ident_expr(a_ref.clone()), Span::new(5, 9));

        let file = b.file("t.cue", None, vec![field_a, field_b], Span::new(0, 10));
        let evaluator = single_file(file);

        let defs = evaluator.definitions_for_offset("t.cue", 0);
        assert_eq!(defs, vec![AstNode::Ident(a_key.clone())]);

        let usages = evaluator.usages_for_offset("t.cue", 0, true);
        assert_eq!(usages.len(), 2);
        assert!(usages.contains(&AstNode::Ident(a_key)));
        assert!(usages.contains(&AstNode::Ident(a_ref)));
    }

    #[test]
    fn scenario_repeated_top_level_field_merges_nested_keys_across_declarations() {
        // x: y: a.b
        // a: b: 5
        // a: b: 6
        let mut b = Builder::new();
        let a_ref = b.ident("a", Span::new(6, 7));
        let selector = b.selector(b.ident_expr(a_ref), b.ident("b", Span::new(8, 9)), Span::new(6, 9));
        let y_ident = b.ident("y", Span::new(3, 4));
        let field_y = b.field(b.label_ident(y_ident), selector, Span::new(3, 9));
        let x_ident = b.ident("x", Span::new(0, 1));
        let field_x = b.field(b.label_ident(x_ident), b.struct_expr(vec![field_y], Span::new(3, 9)), Span::new(0, 9));

        let a1_key = b.ident("a", Span::new(10, 11));
        let b1_key = b.ident("b", Span::new(13, 14));
        let five = b.int("5", Span::new(16, 17));
        let field_b1 = b.field(b.label_ident(b1_key.clone()), b.lit_expr(five), Span::new(13, 17));
        let field_a1 = b.field(b.label_ident(a1_key.clone()), b.struct_expr(vec![field_b1], Span::new(13, 17)), Span::new(10, 17));

        let a2_key = b.ident("a", Span::new(18, 19));
        let b2_key = b.ident("b", Span::new(21, 22));
        let six = b.int("6", Span::new(24, 25));
        let field_b2 = b.field(b.label_ident(b2_key.clone()), b.lit_expr(six), Span::new(21, 25));
        let field_a2 = b.field(b.label_ident(a2_key.clone()), b.struct_expr(vec![field_b2], Span::new(21, 25)), Span::new(18, 25));

        let file = b.file("t.cue", None, vec![field_x, field_a1, field_a2], Span::new(0, 26));
        let evaluator = single_file(file);

        let on_a = evaluator.definitions_for_offset("t.cue", 6);
        assert_eq!(on_a.len(), 2);
        assert!(on_a.contains(&AstNode::Ident(a1_key)));
        assert!(on_a.contains(&AstNode::Ident(a2_key)));

        let on_b = evaluator.definitions_for_offset("t.cue", 8);
        assert_eq!(on_b.len(), 2);
        assert!(on_b.contains(&AstNode::Ident(b1_key)));
        assert!(on_b.contains(&AstNode::Ident(b2_key)));
    }

    #[test]
    fn scenario_chained_aliases_and_completions_through_two_hops() {
        // x1: f: 3
        // x2: f: 4
        // y: x1
        // y: x2
        // z: y
        // out: z.f
        let mut b = Builder::new();
        let f1_key = b.ident("f", Span::new(4, 5));
        let three = b.int("3", Span::new(7, 8));
        let field_f1 = b.field(b.label_ident(f1_key.clone()), b.lit_expr(three), Span::new(4, 8));
        let x1_key = b.ident("x1", Span::new(0, 2));
        let field_x1 = b.field(b.label_ident(x1_key), b.struct_expr(vec![field_f1], Span::new(4, 8)), Span::new(0, 8));

        let f2_key = b.ident("f", Span::new(13, 14));
        let four = b.int("4", Span::new(16, 17));
        let field_f2 = b.field(b.label_ident(f2_key.clone()), b.lit_expr(four), Span::new(13, 17));
        let x2_key = b.ident("x2", Span::new(9, 11));
        let field_x2 = b.field(b.label_ident(x2_key), b.struct_expr(vec![field_f2], Span::new(13, 17)), Span::new(9, 17));

        let y1_key = b.ident("y", Span::new(18, 19));
        let x1_ref = b.ident("x1", Span::new(21, 23));
        let field_y1 = b.field(b.label_ident(y1_key), b.ident_expr(x1_ref), Span::new(18, 23));

        let y2_key = b.ident("y", Span::new(24, 25));
        let x2_ref = b.ident("x2", Span::new(27, 29));
        let field_y2 = b.field(b.label_ident(y2_key), b.ident_expr(x2_ref), Span::new(24, 29));

        let z_key = b.ident("z", Span::new(30, 31));
        let y_ref = b.ident("y", Span::new(33, 34));
        let field_z = b.field(b.label_ident(z_key), b.ident_expr(y_ref), Span::new(30, 34));

        let out_key = b.ident("out", Span::new(35, 38));
        let z_ref = b.ident("z", Span::new(40, 41));
        let f_sel = b.ident("f", Span::new(42, 43));
        let selector = b.selector(b.ident_expr(z_ref), f_sel, Span::new(40, 43));
        let field_out = b.field(b.label_ident(out_key), selector, Span::new(35, 43));

        let file = b.file(
            "t.cue",
            None,
            vec![field_x1, field_x2, field_y1, field_y2, field_z, field_out],
            Span::new(0, 44),
        );
        let evaluator = single_file(file);

        let on_f = evaluator.definitions_for_offset("t.cue", 42);
        assert_eq!(on_f.len(), 2);
        assert!(on_f.contains(&AstNode::Ident(f1_key)));
        assert!(on_f.contains(&AstNode::Ident(f2_key)));

        let completions = evaluator.completions_for_offset("t.cue", 42);
        let field_names: FxHashSet<Rc<str>> = completions
            .iter()
            .filter(|(span, _)| span.kind == CompletionKind::Field)
            .flat_map(|(_, names)| names.iter().cloned())
            .collect();
        assert_eq!(field_names, std::iter::once(Rc::from("f")).collect::<FxHashSet<_>>());

        // `y`'s resolvesTo grows monotonically as each of its two declarations is forced, and
        // never loses what an earlier force already contributed.
        let files_nav = evaluator.file_frames_navigable.get();
        let nav_y = evaluator.navigable_binding(files_nav, "y").expect("y bound");
        evaluator.definitions_for_offset("t.cue", 21);
        let after_first: FxHashSet<NavigableId> = evaluator.navigable_resolves_to(nav_y).into_iter().collect();
        evaluator.definitions_for_offset("t.cue", 27);
        let after_second: FxHashSet<NavigableId> = evaluator.navigable_resolves_to(nav_y).into_iter().collect();
        assert!(after_first.is_subset(&after_second));
        assert_eq!(after_second.len(), after_first.len() + 1);
    }

    #[test]
    fn scenario_label_alias_self_reference_and_gap_completions() {
        // l=a: { b: 3, c: l.b }
        let mut b = Builder::new();
        let b_key = b.ident("b", Span::new(7, 8));
        let three = b.int("3", Span::new(10, 11));
        let field_b = b.field(b.label_ident(b_key.clone()), b.lit_expr(three), Span::new(7, 11));

        let c_key = b.ident("c", Span::new(13, 14));
        let l_ref = b.ident("l", Span::new(16, 17));
        let b_sel = b.ident("b", Span::new(18, 19));
        let selector = b.selector(b.ident_expr(l_ref), b_sel, Span::new(16, 19));
        let field_c = b.field(b.label_ident(c_key), selector, Span::new(13, 19));

        let l_alias = b.ident("l", Span::new(0, 1));
        let a_key = b.ident("a", Span::new(2, 3));
        let label = b.label_aliased_ident(l_alias, a_key.clone(), Span::new(0, 3));
        let inner = b.struct_expr(vec![field_b, field_c], Span::new(5, 20));
        let field_a = b.field(label, inner, Span::new(0, 20));

        let file = b.file("t.cue", None, vec![field_a], Span::new(0, 21));
        let evaluator = single_file(file);

        let on_l = evaluator.definitions_for_offset("t.cue", 0);
        assert_eq!(on_l, vec![AstNode::Ident(a_key)]);

        let on_b = evaluator.definitions_for_offset("t.cue", 18);
        assert_eq!(on_b, vec![AstNode::Ident(b_key)]);

        let completions = evaluator.completions_for_offset("t.cue", 6);
        let mut field_names = FxHashSet::default();
        let mut var_names = FxHashSet::default();
        for (span, names) in &completions {
            match span.kind {
                CompletionKind::Field => field_names.extend(names.iter().cloned()),
                CompletionKind::Variable => var_names.extend(names.iter().cloned()),
            }
        }
        let expected_fields: FxHashSet<Rc<str>> = ["b", "c"].into_iter().map(Rc::from).collect();
        let expected_vars: FxHashSet<Rc<str>> = ["a", "l"].into_iter().map(Rc::from).collect();
        assert_eq!(field_names, expected_fields);
        assert_eq!(var_names, expected_vars);
    }

    #[test]
    fn scenario_cross_file_same_package_merges_fields_and_package_clauses() {
        // a.cue: package x \n foo: 1
        // b.cue: package x \n bar: foo
        let mut b = Builder::new();
        let pkg_x_a = b.ident("x", Span::new(8, 9));
        let package_a = b.package(Some(pkg_x_a), Span::new(0, 9));
        let foo_key = b.ident("foo", Span::new(10, 13));
        let one = b.int("1", Span::new(15, 16));
        let field_foo = b.field(b.label_ident(foo_key.clone()), b.lit_expr(one), Span::new(10, 16));
        let file_a = b.file("a.cue", Some(package_a.clone()), vec![field_foo], Span::new(0, 17));

        let pkg_x_b = b.ident("x", Span::new(8, 9));
        let package_b = b.package(Some(pkg_x_b), Span::new(0, 9));
        let bar_key = b.ident("bar", Span::new(10, 13));
        let foo_ref = b.ident("foo", Span::new(15, 18));
        let field_bar = b.field(b.label_ident(bar_key), b.ident_expr(foo_ref), Span::new(10, 18));
        let file_b = b.file("b.cue", Some(package_b.clone()), vec![field_bar], Span::new(0, 19));

        let evaluator = PackageEvaluator::new(test_config(), vec![Rc::new(file_a), Rc::new(file_b)]);

        let foo_defs = evaluator.definitions_for_offset("b.cue", 16);
        assert_eq!(foo_defs, vec![AstNode::Ident(foo_key)]);

        let package_defs_in_b = evaluator.definitions_for_offset("b.cue", 8);
        assert_eq!(package_defs_in_b.len(), 2);
        assert!(package_defs_in_b.contains(&AstNode::Package(package_a)));
        assert!(package_defs_in_b.contains(&AstNode::Package(package_b)));
    }

    #[test]
    fn scenario_conjunction_merges_sibling_fields_and_bare_value_ident_also_reaches_outer_sibling() {
        // c: {a: b, b: x: 3} & {b: x: 3, z: b.x}; b: 7; d: c.b.x
        let mut b = Builder::new();

        let b_ref_in_a = b.ident("b", Span::new(7, 8));
        let a_key = b.ident("a", Span::new(4, 5));
        let field_a = b.field(b.label_ident(a_key), b.ident_expr(b_ref_in_a), Span::new(4, 8));

        let b1_key = b.ident("b", Span::new(10, 11));
        let x1_key = b.ident("x", Span::new(13, 14));
        let three1 = b.int("3", Span::new(16, 17));
        let field_x1 = b.field(b.label_ident(x1_key.clone()), b.lit_expr(three1), Span::new(13, 17));
        let field_b1 =
            b.field(b.label_ident(b1_key.clone()), b.struct_expr(vec![field_x1], Span::new(13, 17)), Span::new(10, 17));

        let conjunct1 = b.struct_expr(vec![field_a, field_b1], Span::new(3, 18));

        let b2_key = b.ident("b", Span::new(22, 23));
        let x2_key = b.ident("x", Span::new(25, 26));
        let three2 = b.int("3", Span::new(28, 29));
        let field_x2 = b.field(b.label_ident(x2_key.clone()), b.lit_expr(three2), Span::new(25, 29));
        let field_b2 =
            b.field(b.label_ident(b2_key.clone()), b.struct_expr(vec![field_x2], Span::new(25, 29)), Span::new(22, 29));

        let z_key = b.ident("z", Span::new(31, 32));
        let b_ref_root = b.ident("b", Span::new(34, 35));
        let x_sel = b.ident("x", Span::new(36, 37));
        let b_dot_x = b.selector(b.ident_expr(b_ref_root), x_sel, Span::new(34, 37));
        let field_z = b.field(b.label_ident(z_key), b_dot_x, Span::new(31, 37));

        let conjunct2 = b.struct_expr(vec![field_b2, field_z], Span::new(21, 38));

        let conjunction = b.and(conjunct1, conjunct2, Span::new(3, 38));
        let c_key = b.ident("c", Span::new(0, 1));
        let field_c = b.field(b.label_ident(c_key), conjunction, Span::new(0, 38));

        let b_top_key = b.ident("b", Span::new(40, 41));
        let seven = b.int("7", Span::new(43, 44));
        let field_b_top = b.field(b.label_ident(b_top_key.clone()), b.lit_expr(seven), Span::new(40, 44));

        let d_key = b.ident("d", Span::new(46, 47));
        let c_ref = b.ident("c", Span::new(49, 50));
        let b_sel2 = b.ident("b", Span::new(51, 52));
        let c_dot_b = b.selector(b.ident_expr(c_ref), b_sel2, Span::new(49, 52));
        let x_sel2 = b.ident("x", Span::new(53, 54));
        let c_dot_b_dot_x = b.selector(c_dot_b, x_sel2, Span::new(49, 54));
        let field_d = b.field(b.label_ident(d_key), c_dot_b_dot_x, Span::new(46, 54));

        let file = b.file("t.cue", None, vec![field_c, field_b_top, field_d], Span::new(0, 54));
        let evaluator = single_file(file);

        // The bare `b` used as the entire value of `a: b` is a root identifier with no lexical
        // binding anywhere in its frame chain; the conjunction's own merged `b` field is a valid
        // structural resolution for it, but so is the outer top-level `b: 7` further up the same
        // chain — the MAY-analysis keeps both rather than stopping at the first match found.
        let on_outer_b = evaluator.definitions_for_offset("t.cue", 7);
        assert!(on_outer_b.contains(&AstNode::Ident(b_top_key.clone())));

        // The root `b` of `z: b.x`, and the `x` selected off it, both reach the
        // conjunction-merged struct fields from *both* conjuncts.
        let on_root_b = evaluator.definitions_for_offset("t.cue", 34);
        assert!(on_root_b.contains(&AstNode::Ident(b1_key.clone())));
        assert!(on_root_b.contains(&AstNode::Ident(b2_key.clone())));

        let on_x = evaluator.definitions_for_offset("t.cue", 36);
        assert_eq!(on_x.len(), 2);
        assert!(on_x.contains(&AstNode::Ident(x1_key.clone())));
        assert!(on_x.contains(&AstNode::Ident(x2_key.clone())));

        // `c.b.x` walks through `c`'s own merged `b`, down to both `x` keys, the same as `z.b.x`.
        let on_walked_x = evaluator.definitions_for_offset("t.cue", 53);
        assert_eq!(on_walked_x.len(), 2);
        assert!(on_walked_x.contains(&AstNode::Ident(x1_key)));
        assert!(on_walked_x.contains(&AstNode::Ident(x2_key)));
    }
}
