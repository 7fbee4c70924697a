// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Color-key registry: the map from hit colors to live shapes.

use easel_render::rgb_to_hex;
use hashbrown::HashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::node::NodeId;

/// Assigns each shape a unique `#rrggbb` key and resolves keys read back
/// from hit surfaces.
#[derive(Debug)]
pub struct ColorKeyRegistry {
    shapes: HashMap<String, NodeId>,
    rng: StdRng,
}

impl ColorKeyRegistry {
    /// Creates an empty registry. A seed makes key generation reproducible.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            shapes: HashMap::new(),
            rng,
        }
    }

    /// Draws random keys until one is unused, binds it to `shape`, and
    /// returns it.
    pub fn allocate(&mut self, shape: NodeId) -> String {
        loop {
            let [_, r, g, b] = (self.rng.random::<u32>() & 0x00ff_ffff).to_be_bytes();
            let key = rgb_to_hex(r, g, b);
            if !self.shapes.contains_key(&key) {
                self.shapes.insert(key.clone(), shape);
                return key;
            }
        }
    }

    /// Unbinds `key`. Returns the shape it identified.
    pub fn release(&mut self, key: &str) -> Option<NodeId> {
        self.shapes.remove(key)
    }

    /// The shape bound to `key`.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<NodeId> {
        self.shapes.get(key).copied()
    }

    /// Number of bound keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether no key is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
