// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output and tree dumps.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::fmt::Write as _;
use std::io::Write;

use easel_core::scheduler::TickSummary;
use easel_core::trace::{DispatchEvent, DrawEvent, DrawPass, PickEvent, TraceSink};
use easel_core::{NodeId, Scene};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    dispatch: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            dispatch: true,
        }
    }

    /// Whether dispatch lines are written. They dominate the output during
    /// pointer moves.
    #[must_use]
    pub fn with_dispatch(mut self, enabled: bool) -> Self {
        self.dispatch = enabled;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn node(id: NodeId) -> String {
    format!("#{}", id.index())
}

fn pass_name(pass: DrawPass) -> &'static str {
    match pass {
        DrawPass::Scene => "scene",
        DrawPass::Hit => "hit",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_draw(&mut self, e: &DrawEvent) {
        let _ = writeln!(
            self.writer,
            "[draw] frame={} layer={} pass={} shapes={}",
            e.frame_index,
            node(e.layer),
            pass_name(e.pass),
            e.shapes,
        );
    }

    fn on_pick(&mut self, e: &PickEvent) {
        let result = e.result.map_or_else(|| "none".to_owned(), node);
        let _ = writeln!(
            self.writer,
            "[pick] layer={} at=({:.1}, {:.1}) distance={} result={result}",
            node(e.layer),
            e.point.x,
            e.point.y,
            e.distance,
        );
    }

    fn on_dispatch(&mut self, e: &DispatchEvent<'_>) {
        if !self.dispatch {
            return;
        }
        let target = e.target.map_or_else(|| "none".to_owned(), node);
        let _ = writeln!(
            self.writer,
            "[event] {} target={target} current={} listeners={}",
            e.kind,
            node(e.current_target),
            e.listeners,
        );
    }

    fn on_frame(&mut self, s: &TickSummary) {
        let _ = writeln!(
            self.writer,
            "[frame] frame={} now={}µs animations={} layers={}",
            s.frame_index, s.now.0, s.animations, s.layers_drawn,
        );
    }
}

/// Renders a subtree as indented lines: slot index, class, color key, and
/// the explicitly set attributes.
///
/// ```text
/// #0 Stage {"height":100,"width":100}
///   #1 Layer
///     #2 Rect key=#5a1f03 {"fill":"red","width":40}
/// ```
#[must_use]
pub fn format_tree(scene: &Scene, root: NodeId) -> String {
    let mut out = String::new();
    write_node(scene, root, 0, &mut out);
    out
}

fn write_node(scene: &Scene, id: NodeId, depth: usize, out: &mut String) {
    let _ = write!(out, "{:indent$}{} {}", "", node(id), scene.class_name(id), indent = depth * 2);
    if let Some(key) = scene.color_key(id) {
        let _ = write!(out, " key={key}");
    }
    let attrs = scene.attrs(id);
    if !attrs.is_empty() {
        let _ = write!(out, " {}", serde_json::Value::Object(attrs.clone()));
    }
    out.push('\n');
    for child in scene.children(id) {
        write_node(scene, child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use easel_core::{HostContainer, HostTime, SceneConfig};
    use serde_json::json;

    use super::*;

    #[test]
    fn pretty_print_draw() {
        let mut scene = Scene::new();
        let layer = scene.create_layer(json!({}));
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_draw(&DrawEvent {
            layer,
            pass: DrawPass::Hit,
            shapes: 3,
            frame_index: 7,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.starts_with("[draw] frame=7"), "got: {output}");
        assert!(output.contains("pass=hit shapes=3"), "got: {output}");
    }

    #[test]
    fn dispatch_lines_can_be_muted() {
        let mut scene = Scene::new();
        let rect = scene.create_rect(json!({}));
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new()).with_dispatch(false);
        sink.on_dispatch(&DispatchEvent {
            kind: "mousemove",
            target: Some(rect),
            current_target: rect,
            listeners: 0,
        });
        assert!(sink.into_inner().is_empty());
    }

    #[test]
    fn tree_dump_lists_explicit_attributes() {
        let mut scene = Scene::with_config(SceneConfig::seeded(4));
        let stage = scene
            .create_stage(Some(HostContainer::sized(100.0, 100.0)), json!({}))
            .unwrap();
        let layer = scene.create_layer(json!({}));
        let rect = scene.create_rect(json!({ "width": 40, "fill": "red" }));
        scene.add(stage, layer).unwrap();
        scene.add(layer, rect).unwrap();
        scene.tick(HostTime(0));

        let dump = format_tree(&scene, stage);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 3, "got: {dump}");
        assert!(lines[0].contains("Stage"), "got: {dump}");
        assert!(lines[1].starts_with("  #") && lines[1].ends_with("Layer"), "got: {dump}");
        let key = scene.color_key(rect).unwrap();
        assert!(lines[2].starts_with("    #"), "got: {dump}");
        assert!(lines[2].contains(&format!("Rect key={key}")), "got: {dump}");
        assert!(lines[2].contains(r#""fill":"red""#), "got: {dump}");
    }
}
