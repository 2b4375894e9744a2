use std::fmt;

use crate::{EntityKind, EntityToken};

/// Path of tokens leading to a leaf through nested instances.
///
/// Holds the instance tokens outer-most first, followed by the final (leaf)
/// token. Lives entirely on the stack, so that queries never allocate.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenHierarchy {
    instances: [EntityToken; Self::MAX_DEPTH],
    depth: u8,
    leaf: EntityToken,
}

impl TokenHierarchy {
    /// Maximum number of nested instances a hierarchy can describe.
    pub const MAX_DEPTH: usize = 8;

    pub const EMPTY: Self = Self {
        instances: [EntityToken::EMPTY; Self::MAX_DEPTH],
        depth: 0,
        leaf: EntityToken::EMPTY,
    };

    /// Creates a hierarchy pointing at a leaf of the root pack.
    pub fn leaf(leaf: EntityToken) -> Self {
        Self {
            leaf,
            ..Self::EMPTY
        }
    }

    pub fn is_empty(&self) -> bool {
        self.leaf.is_empty()
    }

    /// Returns the leaf token.
    pub fn final_token(&self) -> EntityToken {
        self.leaf
    }

    /// Returns the instance tokens, outer-most first.
    pub fn instances(&self) -> &[EntityToken] {
        &self.instances[..self.depth as usize]
    }

    pub fn depth(&self) -> usize {
        self.depth as usize
    }

    pub fn push(&mut self, instance: EntityToken) {
        debug_assert!(
            !instance.is_empty() && instance.kind() == EntityKind::Instance,
            "not an instance: {instance:?}"
        );

        self.instances[self.depth as usize] = instance;
        self.depth += 1;
    }

    pub fn pop(&mut self) -> EntityToken {
        debug_assert!(self.depth > 0, "popping from an empty hierarchy");

        self.depth -= 1;

        std::mem::take(&mut self.instances[self.depth as usize])
    }

    /// Returns a copy of this path terminated with given leaf.
    pub fn with_final(mut self, leaf: EntityToken) -> Self {
        self.leaf = leaf;
        self
    }

    /// Checks whether this hierarchy addresses `leaf` reached through the
    /// instance path of `path`.
    pub fn matches(&self, path: &TokenHierarchy, leaf: EntityToken) -> bool {
        self.leaf == leaf && self.instances() == path.instances()
    }
}

impl Default for TokenHierarchy {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for TokenHierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.instances())
            .entry(&self.leaf)
            .finish()
    }
}
