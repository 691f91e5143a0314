// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Index types for the arenas owned by a `PackageEvaluator`. Frames, navigables, and paths
//! are never freed individually; they live in `IndexMap`-backed arenas and are addressed by
//! these small `Copy` keys instead of by pointer, which keeps the frame/navigable graph (it
//! is cyclic by design, see `PackageEvaluator::reset`) representable in safe Rust.

use std::fmt::{self, Display, Formatter};

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
        pub struct $name(usize);

        impl From<$name> for usize {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                Self(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

arena_id!(FrameId);
arena_id!(NavigableId);
arena_id!(PathId);
arena_id!(FileId);
