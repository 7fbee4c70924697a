// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless stage session that exercises drawing, picking, clicks and drags.
//!
//! Builds a small scene, replays a scripted sequence of mouse events against
//! it, prints every trace event through a
//! [`PrettyPrintSink`](easel_debug::pretty::PrettyPrintSink), and writes the
//! [`RecorderSink`](easel_debug::recorder::RecorderSink) capture as JSON to
//! the system temp directory.

use std::error::Error;
use std::fs;

use easel_core::kurbo::Point;
use easel_core::scheduler::TickSummary;
use easel_core::trace::{DispatchEvent, DrawEvent, PickEvent, TraceSink};
use easel_core::{HostContainer, HostTime, InputEvent, InputPhase, NodeId, Scene, SceneConfig};
use easel_debug::pretty::{PrettyPrintSink, format_tree};
use easel_debug::recorder::RecorderSink;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 60 Hz frame interval in microseconds.
const FRAME_US: u64 = 16_667;

/// Forwards every event to two sinks.
struct Tee<A, B>(A, B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_draw(&mut self, e: &DrawEvent) {
        self.0.on_draw(e);
        self.1.on_draw(e);
    }

    fn on_pick(&mut self, e: &PickEvent) {
        self.0.on_pick(e);
        self.1.on_pick(e);
    }

    fn on_dispatch(&mut self, e: &DispatchEvent<'_>) {
        self.0.on_dispatch(e);
        self.1.on_dispatch(e);
    }

    fn on_frame(&mut self, s: &TickSummary) {
        self.0.on_frame(s);
        self.1.on_frame(s);
    }
}

struct Session {
    scene: Scene,
    stage: NodeId,
    now: HostTime,
}

impl Session {
    fn mouse(&mut self, phase: InputPhase, x: f64, y: f64) -> Result<(), Box<dyn Error>> {
        self.scene
            .dispatch_input(self.stage, InputEvent::mouse(phase, x, y, self.now))?;
        Ok(())
    }

    fn frame(&mut self) {
        self.now = HostTime(self.now.0 + FRAME_US);
        self.scene.tick(self.now);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let recorder = RecorderSink::new();
    let pretty = PrettyPrintSink::new(Box::new(std::io::stdout())).with_dispatch(false);

    let mut scene = Scene::with_config(SceneConfig::seeded(2026));
    scene.set_trace_sink(Box::new(Tee(pretty, recorder.clone())));

    let stage = scene.create_stage(Some(HostContainer::sized(300.0, 200.0)), json!({}))?;
    let layer = scene.create_layer(json!({}));
    let circle = scene.create_circle(json!({
        "x": 80, "y": 100, "radius": 40, "fill": "tomato", "stroke": "black", "name": "target"
    }));
    let card = scene.create_rect(json!({
        "x": 180, "y": 60, "width": 80, "height": 80, "fill": "steelblue", "draggable": true
    }));
    scene.add(stage, layer)?;
    scene.add(layer, circle)?;
    scene.add(layer, card)?;

    scene.on(circle, "click", |scene, e| {
        let Some(id) = e.current_target else {
            return;
        };
        let fill = match scene.attr_str(id, "fill").as_deref() {
            Some("tomato") => "gold",
            _ => "tomato",
        };
        scene.set_attr(id, "fill", fill);
        info!(node = ?id, fill, "circle clicked");
    });
    scene.on(card, "dragend", |scene, e| {
        if let Some(id) = e.target {
            info!(position = ?scene.position(id), "card dropped");
        }
    });

    let mut session = Session {
        scene,
        stage,
        now: HostTime(0),
    };
    session.frame();

    for (label, p) in [
        ("circle", Point::new(80.0, 100.0)),
        ("card", Point::new(220.0, 100.0)),
        ("empty", Point::new(150.0, 20.0)),
    ] {
        let hit = session.scene.pick(stage, p);
        info!(label, ?hit, "pick");
    }

    session.mouse(InputPhase::Down, 80.0, 100.0)?;
    session.mouse(InputPhase::Up, 80.0, 100.0)?;
    session.frame();

    session.mouse(InputPhase::Down, 200.0, 80.0)?;
    for step in 1..=5 {
        let d = f64::from(step) * 8.0;
        session.mouse(InputPhase::Move, 200.0 - d, 80.0 + d)?;
        session.frame();
    }
    session.mouse(InputPhase::Up, 160.0, 120.0)?;
    session.frame();

    println!("{}", format_tree(&session.scene, stage));

    let path = std::env::temp_dir().join("easel_headless_pick.json");
    fs::write(&path, recorder.to_json_pretty()?)?;
    info!(events = recorder.len(), path = %path.display(), "trace written");
    Ok(())
}
