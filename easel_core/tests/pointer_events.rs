// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input dispatch scenarios: bubbling, hover synthesis, clicks and capture.

use std::cell::RefCell;
use std::rc::Rc;

use easel_core::{HostContainer, HostTime, InputEvent, InputPhase, NodeId, Scene, SceneConfig};
use serde_json::json;

type Log = Rc<RefCell<Vec<String>>>;

struct Fixture {
    scene: Scene,
    stage: NodeId,
    layer: NodeId,
    group: NodeId,
    left: NodeId,
    right: NodeId,
    log: Log,
}

/// Stage 100×100 → layer → group → two 40×40 rects at x=0 and x=60.
fn fixture() -> Fixture {
    let mut scene = Scene::with_config(SceneConfig::seeded(99));
    let stage = scene
        .create_stage(Some(HostContainer::sized(100.0, 100.0)), json!({}))
        .unwrap();
    let layer = scene.create_layer(json!({}));
    let group = scene.create_group(json!({}));
    let left = scene.create_rect(json!({ "width": 40, "height": 40, "fill": "red" }));
    let right = scene.create_rect(json!({ "x": 60, "width": 40, "height": 40, "fill": "blue" }));
    scene.add(stage, layer).unwrap();
    scene.add(layer, group).unwrap();
    scene.add(group, left).unwrap();
    scene.add(group, right).unwrap();
    scene.tick(HostTime(0));
    Fixture {
        scene,
        stage,
        layer,
        group,
        left,
        right,
        log: Log::default(),
    }
}

impl Fixture {
    fn record(&mut self, id: NodeId, names: &str, tag: &str) {
        let log = self.log.clone();
        let tag = tag.to_owned();
        self.scene.on(id, names, move |_, e| {
            log.borrow_mut().push(format!("{tag}:{}", e.kind));
        });
    }

    fn mouse(&mut self, phase: InputPhase, x: f64, y: f64, ms: u64) {
        self.scene
            .dispatch_input(self.stage, InputEvent::mouse(phase, x, y, HostTime::from_millis(ms)))
            .unwrap();
    }

    fn click(&mut self, x: f64, y: f64, ms: u64) {
        self.mouse(InputPhase::Down, x, y, ms);
        self.mouse(InputPhase::Up, x, y, ms);
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.borrow_mut())
    }
}

#[test]
fn click_bubbles_three_levels_then_to_the_stage() {
    let mut f = fixture();
    let (stage, layer, group, left) = (f.stage, f.layer, f.group, f.left);
    f.record(left, "click", "rect");
    f.record(group, "click", "group");
    f.record(layer, "click", "layer");
    f.record(stage, "click", "stage");
    f.click(10.0, 10.0, 0);
    assert_eq!(f.take(), ["rect:click", "group:click", "layer:click", "stage:click"]);

    f.scene.on(group, "click", |_, e| e.stop_propagation());
    f.click(10.0, 10.0, 1_000);
    assert_eq!(f.take(), ["rect:click", "group:click"]);
}

#[test]
fn handlers_see_the_shape_as_target() {
    let mut f = fixture();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    f.scene.on(f.layer, "mousedown", move |_, e| {
        s.borrow_mut().push((e.target, e.current_target, e.pointer_id));
    });
    f.mouse(InputPhase::Down, 70.0, 10.0, 0);
    assert_eq!(
        *seen.borrow(),
        [(Some(f.right), Some(f.layer), Some(easel_core::event::DEFAULT_POINTER_ID))]
    );
}

#[test]
fn enter_and_leave_follow_the_pointer() {
    let mut f = fixture();
    let (group, left, right) = (f.group, f.left, f.right);
    f.record(left, "mouseenter mouseleave", "left");
    f.record(right, "mouseenter mouseleave", "right");
    f.record(group, "mouseenter mouseleave", "group");

    f.mouse(InputPhase::Move, 10.0, 10.0, 0);
    assert_eq!(f.take(), ["left:mouseenter", "group:mouseenter"]);

    f.mouse(InputPhase::Move, 20.0, 20.0, 5);
    assert!(f.take().is_empty(), "moving within a shape is not an enter");

    f.mouse(InputPhase::Move, 70.0, 10.0, 10);
    assert_eq!(f.take(), ["left:mouseleave", "right:mouseenter"]);

    f.mouse(InputPhase::Move, 50.0, 80.0, 15);
    assert_eq!(f.take(), ["right:mouseleave", "group:mouseleave"]);
}

#[test]
fn over_and_out_fire_before_enter_and_leave() {
    let mut f = fixture();
    let left = f.left;
    f.record(left, "mouseover mouseout mouseenter mouseleave mousemove", "left");
    f.mouse(InputPhase::Move, 10.0, 10.0, 0);
    f.mouse(InputPhase::Leave, 10.0, 10.0, 5);
    assert_eq!(
        f.take(),
        [
            "left:mouseover",
            "left:mouseenter",
            "left:mousemove",
            "left:mouseout",
            "left:mouseleave",
        ]
    );
    assert_eq!(f.scene.pointer_position(f.stage), None);
}

#[test]
fn double_click_needs_the_window() {
    let mut f = fixture();
    let left = f.left;
    f.record(left, "click dblclick", "left");

    f.click(10.0, 10.0, 0);
    f.click(10.0, 10.0, 100);
    assert_eq!(f.take(), ["left:click", "left:click", "left:dblclick"]);

    f.click(10.0, 10.0, 1_000);
    f.click(10.0, 10.0, 1_500);
    assert_eq!(f.take(), ["left:click", "left:click"]);
}

#[test]
fn double_click_requires_the_same_shape() {
    let mut f = fixture();
    let (left, right) = (f.left, f.right);
    f.record(left, "dblclick", "left");
    f.record(right, "dblclick", "right");
    f.click(10.0, 10.0, 0);
    f.click(70.0, 10.0, 100);
    assert!(f.take().is_empty());
}

#[test]
fn captured_pointer_ignores_what_is_under_it() {
    let mut f = fixture();
    let (stage, left, right) = (f.stage, f.left, f.right);
    f.record(left, "pointermove pointerup lostpointercapture", "left");
    f.record(right, "pointermove pointerup pointerover", "right");

    let pointer = |phase, x, ms| InputEvent::pointer(phase, 4, x, 10.0, HostTime::from_millis(ms));
    f.scene.dispatch_input(stage, pointer(InputPhase::Down, 10.0, 0)).unwrap();
    f.scene.set_pointer_capture(4, left);
    assert!(f.scene.has_pointer_capture(4, left));

    f.scene.dispatch_input(stage, pointer(InputPhase::Move, 70.0, 10)).unwrap();
    f.scene.dispatch_input(stage, pointer(InputPhase::Up, 70.0, 20)).unwrap();
    assert_eq!(
        f.take(),
        ["left:pointermove", "left:lostpointercapture", "left:pointerup"]
    );
    assert_eq!(f.scene.captured_node(4), None);
}

#[test]
fn capture_on_down_when_enabled() {
    let mut f = fixture();
    let left = f.left;
    let mut config = f.scene.config().clone();
    config.capture_pointer_events_enabled = true;
    f.scene.set_config(config);
    f.scene
        .dispatch_input(f.stage, InputEvent::pointer(InputPhase::Down, 2, 10.0, 10.0, HostTime(0)))
        .unwrap();
    assert!(f.scene.has_pointer_capture(2, left));
}

#[test]
fn touches_report_their_own_ids() {
    let mut f = fixture();
    let ids = Rc::new(RefCell::new(Vec::new()));
    let sink = ids.clone();
    f.scene.on(f.group, "touchstart", move |_, e| sink.borrow_mut().push(e.pointer_id));
    let a = easel_core::Touch::new(1, 10.0, 10.0);
    let b = easel_core::Touch::new(2, 70.0, 10.0);
    f.scene
        .dispatch_input(
            f.stage,
            InputEvent::touch(InputPhase::Down, vec![a, b], vec![a, b], HostTime(0)),
        )
        .unwrap();
    assert_eq!(*ids.borrow(), [Some(1), Some(2)]);
}
