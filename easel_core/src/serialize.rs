// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree serialization to and from plain data.

use serde::{Deserialize, Serialize};

use crate::attrs::{Attrs, same_value};
use crate::error::{Result, SceneError};
use crate::node::{NodeId, NodeKind};
use crate::scene::Scene;
use crate::shape::AttrView;
use crate::stage::HostContainer;

/// Serialized form of a node and its subtree.
///
/// Only attributes that differ from the class and kind defaults are kept.
/// Handles, hooks and listeners are not serializable and are dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Explicit attributes.
    #[serde(default)]
    pub attrs: Attrs,
    /// Name of the node's class in the factory table.
    #[serde(rename = "className")]
    pub class_name: String,
    /// Children, present on containers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeData>>,
}

impl Scene {
    /// Captures a node and its subtree as [`NodeData`].
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn to_object(&self, id: NodeId) -> NodeData {
        self.nodes.validate(id);
        self.object_at(id.idx)
    }

    fn object_at(&self, idx: u32) -> NodeData {
        let i = idx as usize;
        let kind = self.nodes.kind[i];
        let spec = self.classes.spec(&self.nodes.class[i]);
        let empty = Attrs::new();
        let defaults = AttrView::new(&empty, spec, kind);
        let attrs = self.nodes.attrs[i]
            .iter()
            .filter(|(key, value)| !defaults.get(key).is_some_and(|d| same_value(&d, value)))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let children = (kind != NodeKind::Shape).then(|| {
            self.nodes.children[i]
                .iter()
                .map(|&child| self.object_at(child))
                .collect()
        });
        NodeData {
            attrs,
            class_name: self.nodes.class[i].to_string(),
            children,
        }
    }

    /// Serializes a node and its subtree to a JSON string.
    ///
    /// # Errors
    ///
    /// [`SceneError::Json`] if encoding fails.
    pub fn to_json(&self, id: NodeId) -> Result<String> {
        Ok(serde_json::to_string(&self.to_object(id))?)
    }

    /// Rebuilds a detached subtree through the factory table.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownClass`] for a class missing from the table,
    /// [`SceneError::MissingContainer`] for stage data, and any structural
    /// error raised while attaching children.
    pub fn create_from(&mut self, data: &NodeData) -> Result<NodeId> {
        self.build(data, None)
    }

    /// Like [`create_from`](Self::create_from), but stage data is mounted in
    /// `container`.
    ///
    /// # Errors
    ///
    /// As [`create_from`](Self::create_from).
    pub fn create_from_in(&mut self, data: &NodeData, container: HostContainer) -> Result<NodeId> {
        self.build(data, Some(container))
    }

    /// Parses JSON produced by [`to_json`](Self::to_json) and rebuilds it.
    ///
    /// # Errors
    ///
    /// [`SceneError::Json`] for malformed input, otherwise as
    /// [`create_from`](Self::create_from).
    pub fn from_json(&mut self, json: &str) -> Result<NodeId> {
        let data: NodeData = serde_json::from_str(json)?;
        self.create_from(&data)
    }

    fn build(&mut self, data: &NodeData, container: Option<HostContainer>) -> Result<NodeId> {
        let spec = self
            .classes
            .get(&data.class_name)
            .ok_or_else(|| SceneError::UnknownClass(data.class_name.clone()))?;
        let attrs = serde_json::Value::Object(data.attrs.clone());
        let id = if spec.kind == NodeKind::Stage {
            self.create_stage(container, attrs)?
        } else {
            self.create(&data.class_name, attrs)?
        };
        for child in data.children.iter().flatten() {
            let child = self.build(child, None)?;
            self.add(id, child)?;
        }
        Ok(id)
    }
}
