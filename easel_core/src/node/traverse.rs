// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, NodeId};
use super::store::NodeStore;

/// An iterator over the strict ancestors of a node, nearest first.
///
/// Created by [`NodeStore::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a> {
    store: &'a NodeStore,
    current: u32,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.parent[idx as usize];
        Some(self.store.id_at(idx))
    }
}

/// One alternative of a [`NodeStore::find`] selector.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Selector<'s> {
    /// `#id`: the `id` attribute.
    Id(&'s str),
    /// `.name`: one of the space-separated words of the `name` attribute.
    Name(&'s str),
    /// `Type`: the class name or the kind's base class.
    Type(&'s str),
}

impl<'s> Selector<'s> {
    fn parse(selector: &'s str) -> Vec<Self> {
        selector
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                if let Some(id) = s.strip_prefix('#') {
                    Self::Id(id)
                } else if let Some(name) = s.strip_prefix('.') {
                    Self::Name(name)
                } else {
                    Self::Type(s)
                }
            })
            .collect()
    }
}

impl NodeStore {
    /// Returns an iterator over the ancestors of a node, nearest first.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        self.validate(id);
        Ancestors {
            store: self,
            current: self.parent[id.idx as usize],
        }
    }

    /// Slots of every descendant of `idx` in pre-order (excluding `idx`).
    pub(crate) fn descendants_at(&self, idx: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut stack: Vec<u32> = self.children[idx as usize].iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children[n as usize].iter().rev());
        }
        out
    }

    /// Whether `ancestor` lies on the parent chain of `idx`.
    pub(crate) fn is_ancestor_at(&self, ancestor: u32, idx: u32) -> bool {
        let mut cur = self.parent[idx as usize];
        while cur != INVALID {
            if cur == ancestor {
                return true;
            }
            cur = self.parent[cur as usize];
        }
        false
    }

    /// Number of ancestors of `idx`.
    pub(crate) fn depth_at(&self, idx: u32) -> usize {
        let mut depth = 0;
        let mut cur = self.parent[idx as usize];
        while cur != INVALID {
            depth += 1;
            cur = self.parent[cur as usize];
        }
        depth
    }

    /// Descendants of `id`, in pre-order, matching any alternative of a
    /// comma-separated selector such as `"#save, .button, Circle"`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn find(&self, id: NodeId, selector: &str) -> Vec<NodeId> {
        self.validate(id);
        let selectors = Selector::parse(selector);
        self.descendants_at(id.idx)
            .into_iter()
            .filter(|&n| selectors.iter().any(|s| self.matches(n, s)))
            .map(|n| self.id_at(n))
            .collect()
    }

    /// Whether a node matches a single-alternative or comma-separated selector.
    pub(crate) fn matches_selector(&self, idx: u32, selector: &str) -> bool {
        Selector::parse(selector)
            .iter()
            .any(|s| self.matches(idx, s))
    }

    fn matches(&self, idx: u32, selector: &Selector<'_>) -> bool {
        match *selector {
            Selector::Id(id) => self.text(idx, "id") == Some(id),
            Selector::Name(name) => self
                .text(idx, "name")
                .is_some_and(|names| names.split_whitespace().any(|n| n == name)),
            Selector::Type(ty) => {
                &*self.class[idx as usize] == ty || self.kind[idx as usize].base_class() == ty
            }
        }
    }
}
