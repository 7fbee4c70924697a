// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Semantic events, listener storage, and bubbling dispatch.
//!
//! Listeners are registered under names of the form `type.namespace`; several
//! names may be given at once separated by spaces (`"click.menu tap.menu"`).
//! Removal accepts `type`, `.namespace`, or `type.namespace`.
//!
//! Each node fires listeners from two tiers, in this order: class listeners
//! (shared by every node of a class, base class first), then the node's own
//! listeners, each tier in registration order.

mod dispatch;
mod pointer;

use core::fmt;
use std::rc::Rc;

use hashbrown::HashMap;
use serde_json::Value;

use crate::node::NodeId;
use crate::scene::Scene;

pub use pointer::{
    DEFAULT_POINTER_ID, EventNames, InputEvent, InputPhase, PointerFamily, Touch, is_down,
    is_enter_or_leave,
};

/// An event handler. Handlers receive the whole engine and may mutate or
/// destroy nodes.
pub type Handler = Rc<dyn Fn(&mut Scene, &mut Event)>;

/// The payload of a `<key>Change` event.
#[derive(Clone, Debug, PartialEq)]
pub struct AttrChange {
    /// The attribute that changed.
    pub key: String,
    /// Previous explicit value (`null` when it was unset).
    pub old: Value,
    /// New explicit value (`null` when it was reset).
    pub new: Value,
}

/// A semantic event travelling through the tree.
#[derive(Clone, Debug)]
pub struct Event {
    /// Event type, such as `"click"` or `"xChange"`.
    pub kind: String,
    /// The shape the event originated on (or the stage for stage events).
    pub target: Option<NodeId>,
    /// The node whose listeners are running.
    pub current_target: Option<NodeId>,
    /// The pointer that caused the event, for pointer events.
    pub pointer_id: Option<u32>,
    /// The host input that caused the event, if any.
    pub evt: Option<InputEvent>,
    /// Set by a handler to stop bubbling to ancestors.
    pub cancel_bubble: bool,
    /// Old and new values, for attribute change events.
    pub change: Option<AttrChange>,
}

impl Event {
    /// A bare event of type `kind`.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target: None,
            current_target: None,
            pointer_id: None,
            evt: None,
            cancel_bubble: false,
            change: None,
        }
    }

    /// An event caused by host input.
    #[must_use]
    pub fn from_input(kind: &str, evt: &InputEvent, pointer_id: Option<u32>) -> Self {
        Self {
            pointer_id,
            evt: Some(evt.clone()),
            ..Self::new(kind)
        }
    }

    /// Sets the target.
    #[must_use]
    pub fn with_target(mut self, target: NodeId) -> Self {
        self.target = Some(target);
        self
    }

    /// Stops the event from bubbling past the current node.
    pub fn stop_propagation(&mut self) {
        self.cancel_bubble = true;
    }
}

#[derive(Clone)]
struct Listener {
    namespace: String,
    handler: Handler,
}

/// Listener lists keyed by event type.
#[derive(Clone, Default)]
pub struct Listeners {
    by_type: HashMap<String, Vec<Listener>>,
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self
            .by_type
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        types.sort_unstable();
        f.debug_struct("Listeners")
            .field("types", &types)
            .finish()
    }
}

/// Splits `"type.namespace"` into its parts. A missing namespace is empty.
fn split_name(name: &str) -> (&str, &str) {
    name.split_once('.').unwrap_or((name, ""))
}

impl Listeners {
    /// Registers `handler` under every space-separated name in `names`.
    pub fn add(&mut self, names: &str, handler: &Handler) {
        for name in names.split_whitespace() {
            let (kind, namespace) = split_name(name);
            if kind.is_empty() {
                continue;
            }
            self.by_type
                .entry(kind.to_owned())
                .or_default()
                .push(Listener {
                    namespace: namespace.to_owned(),
                    handler: handler.clone(),
                });
        }
    }

    /// Removes listeners matching every space-separated name in `names`.
    /// Returns how many were removed.
    pub fn remove(&mut self, names: &str) -> usize {
        let mut removed = 0;
        for name in names.split_whitespace() {
            let (kind, namespace) = split_name(name);
            let matches = |l: &Listener| namespace.is_empty() || l.namespace == namespace;
            if kind.is_empty() {
                for list in self.by_type.values_mut() {
                    let before = list.len();
                    list.retain(|l| !matches(l));
                    removed += before - list.len();
                }
            } else if let Some(list) = self.by_type.get_mut(kind) {
                let before = list.len();
                list.retain(|l| !matches(l));
                removed += before - list.len();
            }
        }
        self.by_type.retain(|_, list| !list.is_empty());
        removed
    }

    /// Removes every listener.
    pub fn clear(&mut self) {
        self.by_type.clear();
    }

    /// Handlers for `kind`, in registration order.
    #[must_use]
    pub fn handlers(&self, kind: &str) -> Vec<Handler> {
        self.by_type
            .get(kind)
            .map(|list| list.iter().map(|l| l.handler.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of handlers registered for `kind`.
    #[must_use]
    pub fn count(&self, kind: &str) -> usize {
        self.by_type.get(kind).map_or(0, Vec::len)
    }

    /// Whether no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}
