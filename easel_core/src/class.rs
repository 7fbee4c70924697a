// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node classes: the factory table used to construct and deserialize nodes.

use core::fmt;
use std::rc::Rc;

use easel_render::DrawError;
use hashbrown::HashMap;
use serde_json::{Value, json};

use crate::attrs::Attrs;
use crate::node::NodeKind;
use crate::shape::{self, SceneFunc, ShapeContext};

/// Everything needed to construct a node of a class.
///
/// Built-in classes are `Stage`, `Layer`, `Group`, `Shape` (geometry supplied
/// per node with [`Scene::set_scene_func`](crate::Scene::set_scene_func)),
/// `Rect`, and `Circle`. Register more with
/// [`Scene::register_class`](crate::Scene::register_class).
#[derive(Clone)]
pub struct ClassSpec {
    /// Class name, as stored in `className` when serialized.
    pub name: String,
    /// Structural kind of nodes of this class.
    pub kind: NodeKind,
    /// Class-level attribute defaults, consulted before kind defaults.
    pub defaults: Attrs,
    /// Geometry for scene and hit drawing, unless a node overrides it.
    pub scene_func: Option<SceneFunc>,
    /// Geometry for hit drawing only, unless a node overrides it.
    pub hit_func: Option<SceneFunc>,
}

impl fmt::Debug for ClassSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("defaults", &self.defaults)
            .field("scene_func", &self.scene_func.is_some())
            .field("hit_func", &self.hit_func.is_some())
            .finish()
    }
}

impl ClassSpec {
    /// A class with no defaults and no geometry.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            defaults: Attrs::new(),
            scene_func: None,
            hit_func: None,
        }
    }

    /// A shape class drawn by `scene_func`.
    #[must_use]
    pub fn shape(
        name: impl Into<String>,
        scene_func: impl Fn(&mut ShapeContext<'_>) -> Result<(), DrawError> + 'static,
    ) -> Self {
        Self {
            scene_func: Some(Rc::new(scene_func)),
            ..Self::new(name, NodeKind::Shape)
        }
    }

    /// Adds a class-level default.
    #[must_use]
    pub fn with_default(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.to_owned(), value.into());
        self
    }

    /// Sets a hit-only geometry.
    #[must_use]
    pub fn with_hit_func(
        mut self,
        hit_func: impl Fn(&mut ShapeContext<'_>) -> Result<(), DrawError> + 'static,
    ) -> Self {
        self.hit_func = Some(Rc::new(hit_func));
        self
    }
}

/// Class name → spec.
#[derive(Debug)]
pub(crate) struct ClassRegistry {
    specs: HashMap<String, Rc<ClassSpec>>,
}

impl ClassRegistry {
    pub(crate) fn with_builtins() -> Self {
        let mut registry = Self {
            specs: HashMap::new(),
        };
        for kind in [
            NodeKind::Stage,
            NodeKind::Layer,
            NodeKind::Group,
            NodeKind::Shape,
        ] {
            let _ = registry.register(ClassSpec::new(kind.base_class(), kind));
        }
        let _ = registry.register(
            ClassSpec::shape("Rect", shape::rect_scene_func).with_default("cornerRadius", json!(0)),
        );
        let _ = registry
            .register(ClassSpec::shape("Circle", shape::circle_scene_func).with_default("radius", json!(0)));
        registry
    }

    /// Registers `spec`, returning the spec it replaced.
    pub(crate) fn register(&mut self, spec: ClassSpec) -> Option<Rc<ClassSpec>> {
        self.specs.insert(spec.name.clone(), Rc::new(spec))
    }

    pub(crate) fn get(&self, name: &str) -> Option<Rc<ClassSpec>> {
        self.specs.get(name).cloned()
    }

    pub(crate) fn spec(&self, name: &str) -> Option<&ClassSpec> {
        self.specs.get(name).map(|spec| &**spec)
    }
}
