// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording with JSON export.
//!
//! [`RecorderSink`] implements [`TraceSink`] and keeps every event as a
//! [`TraceRecord`]. The sink is a cheap handle: install a clone in the scene
//! and keep one to read the recording back.

use std::cell::RefCell;
use std::rc::Rc;

use easel_core::NodeId;
use easel_core::scheduler::TickSummary;
use easel_core::trace::{DispatchEvent, DrawEvent, PickEvent, TraceSink};
use serde::Serialize;

/// One recorded trace event.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceRecord {
    /// A layer surface was drawn.
    Draw(DrawEvent),
    /// A layer was hit tested.
    Pick(PickEvent),
    /// Listeners of one node ran.
    Dispatch {
        /// Event type.
        kind: String,
        /// The event target.
        target: Option<NodeId>,
        /// The node whose listeners ran.
        current_target: NodeId,
        /// Number of listeners invoked.
        listeners: usize,
    },
    /// A frame finished.
    Frame(TickSummary),
}

/// A [`TraceSink`] that keeps events in memory.
#[derive(Clone, Debug, Default)]
pub struct RecorderSink {
    records: Rc<RefCell<Vec<TraceRecord>>>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    /// Whether nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// A copy of the recorded events.
    #[must_use]
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.borrow().clone()
    }

    /// Drops every recorded event.
    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }

    /// Exports the recording as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns the encoder error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&*self.records.borrow())
    }

    /// Exports the recording as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns the encoder error if serialization fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&*self.records.borrow())
    }

    fn push(&self, record: TraceRecord) {
        self.records.borrow_mut().push(record);
    }
}

impl TraceSink for RecorderSink {
    fn on_draw(&mut self, e: &DrawEvent) {
        self.push(TraceRecord::Draw(*e));
    }

    fn on_pick(&mut self, e: &PickEvent) {
        self.push(TraceRecord::Pick(*e));
    }

    fn on_dispatch(&mut self, e: &DispatchEvent<'_>) {
        self.push(TraceRecord::Dispatch {
            kind: e.kind.to_owned(),
            target: e.target,
            current_target: e.current_target,
            listeners: e.listeners,
        });
    }

    fn on_frame(&mut self, s: &TickSummary) {
        self.push(TraceRecord::Frame(s.clone()));
    }
}

#[cfg(test)]
mod tests {
    use easel_core::kurbo::Point;
    use easel_core::{HostContainer, HostTime, Scene, SceneConfig};
    use serde_json::{Value, json};

    use super::*;

    fn recorded_scene() -> (Scene, NodeId, RecorderSink) {
        let mut scene = Scene::with_config(SceneConfig::seeded(8));
        let recorder = RecorderSink::new();
        scene.set_trace_sink(Box::new(recorder.clone()));
        let stage = scene
            .create_stage(Some(HostContainer::sized(50.0, 50.0)), json!({}))
            .unwrap();
        let layer = scene.create_layer(json!({}));
        let rect = scene.create_rect(json!({ "width": 20, "height": 20, "fill": "red" }));
        scene.add(stage, layer).unwrap();
        scene.add(layer, rect).unwrap();
        recorder.clear();
        (scene, stage, recorder)
    }

    #[test]
    fn frames_record_their_draws() {
        let (mut scene, _, recorder) = recorded_scene();
        scene.tick(HostTime(1_000));
        let records = recorder.records();
        let draws = records
            .iter()
            .filter(|r| matches!(r, TraceRecord::Draw(_)))
            .count();
        assert_eq!(draws, 2, "one scene and one hit pass: {records:?}");
        assert!(matches!(
            records.last(),
            Some(TraceRecord::Frame(TickSummary { layers_drawn: 1, .. }))
        ));
    }

    #[test]
    fn picks_export_as_json() {
        let (mut scene, stage, recorder) = recorded_scene();
        scene.tick(HostTime(0));
        recorder.clear();
        let _ = scene.pick(stage, Point::new(5.0, 5.0));
        let json: Value = serde_json::from_str(&recorder.to_json().unwrap()).unwrap();
        let first = &json[0];
        assert_eq!(first["type"], "pick");
        assert_eq!(first["point"], json!([5.0, 5.0]));
        assert_eq!(first["distance"], 1);
        assert!(first["result"].is_object());
    }
}
