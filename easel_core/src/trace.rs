// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics hooks for drawing, picking, dispatch, and frames.
//!
//! A [`TraceSink`] installed with [`Scene::set_trace_sink`] receives one call
//! per engine step. All methods default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! The calls are compiled in only with the `trace` feature. Without it the
//! sink is stored but never called.

use kurbo::Point;
use serde::Serialize;

use crate::node::NodeId;
use crate::scene::Scene;
use crate::scheduler::TickSummary;

/// Which surface of a layer was drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DrawPass {
    /// The visible scene surface.
    Scene,
    /// The color-key hit surface.
    Hit,
}

/// Emitted after a layer surface was redrawn.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct DrawEvent {
    /// The drawn layer.
    pub layer: NodeId,
    /// Which surface.
    pub pass: DrawPass,
    /// Number of shapes painted.
    pub shapes: usize,
    /// Frame counter at the time of the draw.
    pub frame_index: u64,
}

/// Emitted after a layer hit test.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct PickEvent {
    /// The queried layer.
    pub layer: NodeId,
    /// Query point in stage coordinates.
    #[serde(serialize_with = "point_pair")]
    pub point: Point,
    /// Spiral distance reached when the search ended.
    pub distance: u32,
    /// The shape found, if any.
    pub result: Option<NodeId>,
}

/// Emitted each time listeners of one node are invoked for an event.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct DispatchEvent<'a> {
    /// Event type, such as `click`.
    pub kind: &'a str,
    /// The event target.
    pub target: Option<NodeId>,
    /// The node whose listeners are running.
    pub current_target: NodeId,
    /// Number of listeners invoked.
    pub listeners: usize,
}

fn point_pair<S: serde::Serializer>(p: &Point, s: S) -> Result<S::Ok, S::Error> {
    (p.x, p.y).serialize(s)
}

/// Receives trace events from a [`Scene`].
pub trait TraceSink {
    /// Called after a layer surface was redrawn.
    fn on_draw(&mut self, e: &DrawEvent) {
        _ = e;
    }

    /// Called after a layer hit test.
    fn on_pick(&mut self, e: &PickEvent) {
        _ = e;
    }

    /// Called when listeners of one node run for an event.
    fn on_dispatch(&mut self, e: &DispatchEvent<'_>) {
        _ = e;
    }

    /// Called at the end of every [`Scene::tick`].
    fn on_frame(&mut self, s: &TickSummary) {
        _ = s;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

impl Scene {
    /// Hands the installed sink to `f`. Compiles to nothing without the
    /// `trace` feature.
    #[inline]
    pub(crate) fn emit(&mut self, f: impl FnOnce(&mut dyn TraceSink)) {
        #[cfg(feature = "trace")]
        if let Some(sink) = self.tracer.as_deref_mut() {
            f(sink);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = f;
        }
    }
}

#[cfg(all(test, feature = "trace"))]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::event::Event;

    #[derive(Default)]
    struct Kinds(Rc<RefCell<Vec<String>>>);

    impl TraceSink for Kinds {
        fn on_dispatch(&mut self, e: &DispatchEvent<'_>) {
            self.0.borrow_mut().push(e.kind.to_owned());
        }
    }

    #[test]
    fn dispatch_reaches_the_sink() {
        let mut scene = Scene::new();
        let group = scene.create_group(json!({}));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _ = scene.set_trace_sink(Box::new(Kinds(seen.clone())));
        scene.fire(group, &mut Event::new("ping"));
        assert_eq!(*seen.borrow(), vec!["ping".to_owned()]);
        assert!(scene.take_trace_sink().is_some());
        scene.fire(group, &mut Event::new("pong"));
        assert_eq!(seen.borrow().len(), 1);
    }
}
