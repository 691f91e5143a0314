// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `cue_resolve`: a lazy, memoized, call-by-need, MAY-analysis name resolver for CUE, built to
//! answer an LSP's definitions/usages/completions queries against a package's parsed files.
//!
//! The owning type is [`package::PackageEvaluator`]; everything else in this crate is either a
//! piece of the arena it owns ([`frame::Frame`], [`navigable::Navigable`], [`path::Path`]) or a
//! query implemented as methods on it ([`definitions`], [`usages`], [`completions`]).

#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::unwrap_used)]
#![allow(clippy::module_name_repetitions)]

pub mod completions;
pub mod config;
pub mod definitions;
pub mod field_decl;
pub mod frame;
pub mod id;
pub mod navigable;
pub mod node;
pub mod package;
pub mod path;
pub mod usages;

pub use config::Config;
pub use node::AstNode;
pub use package::PackageEvaluator;
