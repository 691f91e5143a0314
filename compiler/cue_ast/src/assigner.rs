// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::NodeId;

/// Hands out consecutive [`NodeId`]s.
///
/// Unlike a parser, which discovers nodes in a single pass and can assign IDs as it emits
/// them, [`crate::builder`] constructs a tree bottom-up; every builder function takes an
/// `&mut Assigner` and stamps its node with `next_id()` before returning.
#[derive(Debug)]
pub struct Assigner {
    next_id: NodeId,
}

impl Assigner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: NodeId::FIRST,
        }
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id = self.next_id.successor();
        id
    }
}

impl Default for Assigner {
    fn default() -> Self {
        Self::new()
    }
}
