// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The construction-time configuration of a [`crate::package::PackageEvaluator`]: the
//! canonical identity of the package being analyzed, and the callbacks that let resolution
//! cross into other packages without the core knowing anything about a workspace or a
//! filesystem.

use rustc_hash::FxHashMap;
use std::rc::Rc;

use crate::package::PackageEvaluator;

/// Resolves a canonical import path to the `PackageEvaluator` that owns it, or `None` if the
/// package is unknown (not yet loaded, or genuinely missing). Per spec this is substituted
/// with a fresh empty `PackageEvaluator` by the core itself, not by the callback.
pub type ResolveImport = Rc<dyn Fn(&str) -> Option<Rc<PackageEvaluator>>>;

/// Lists the packages that directly import this one, for "find references" fan-out.
pub type ListImporters = Rc<dyn Fn() -> Vec<Rc<PackageEvaluator>>>;

/// Resolves the canonical import path embedded as a sub-package by an `@attr(...)` on a
/// field, analogous to [`ResolveImport`] but keyed by the attribute's own addressing scheme
/// rather than an import path.
pub type ResolveEmbed = Rc<dyn Fn(&str) -> Option<Rc<PackageEvaluator>>>;

/// Lists the packages that embed this one via an attribute, analogous to [`ListImporters`].
pub type ListEmbedders = Rc<dyn Fn() -> Vec<Rc<PackageEvaluator>>>;

/// Construction-time configuration for a [`PackageEvaluator`].
#[derive(Clone)]
pub struct Config {
    /// The canonical import path of the package being analyzed.
    pub canonical_import_path: Rc<str>,
    /// Maps textual import paths, as they appear in source, to canonical import paths.
    pub import_canonicalization: FxHashMap<Rc<str>, Rc<str>>,
    /// Resolves a canonical import path to its `PackageEvaluator`.
    pub resolve_import: ResolveImport,
    /// Lists packages that import this one.
    pub list_importers: ListImporters,
    /// Whether this package's files support identifier references at all (false for e.g.
    /// embedded JSON, where every scope is opaque).
    pub supports_references: bool,
    /// Resolves an embed-attribute target to its `PackageEvaluator`, if attribute-driven
    /// embedding is configured for this package.
    pub resolve_embed: Option<ResolveEmbed>,
    /// Lists packages that embed this one via an attribute.
    pub list_embedders: Option<ListEmbedders>,
}

impl Config {
    /// Canonicalizes a textual import path as written in source. Falls back to the path
    /// itself when no mapping is configured for it (a malformed or unrecognized path is not
    /// an error here; the caller decides whether an unmapped path still makes sense to use
    /// as a navigable key).
    #[must_use]
    pub fn canonicalize(&self, text: &str) -> Rc<str> {
        self.import_canonicalization
            .get(text)
            .cloned()
            .unwrap_or_else(|| Rc::from(text))
    }
}
