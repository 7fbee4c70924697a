// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag sessions driven by input, and the frame loop around them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use easel_core::{HostContainer, HostTime, InputEvent, InputPhase, NodeId, Scene, SceneConfig, Touch};
use kurbo::Point;
use serde_json::json;

fn scene() -> (Scene, NodeId, NodeId, NodeId, NodeId) {
    let mut scene = Scene::with_config(SceneConfig::seeded(7));
    let stage = scene
        .create_stage(Some(HostContainer::sized(200.0, 200.0)), json!({}))
        .unwrap();
    let layer = scene.create_layer(json!({}));
    let handle = scene.create_rect(json!({
        "x": 50, "y": 50, "width": 40, "height": 40, "fill": "red", "draggable": true
    }));
    let fixed = scene.create_rect(json!({ "x": 150, "y": 150, "width": 40, "height": 40, "fill": "blue" }));
    scene.add(stage, layer).unwrap();
    scene.add(layer, handle).unwrap();
    scene.add(layer, fixed).unwrap();
    scene.tick(HostTime(0));
    (scene, stage, layer, handle, fixed)
}

fn mouse(scene: &mut Scene, stage: NodeId, phase: InputPhase, x: f64, y: f64) {
    scene
        .dispatch_input(stage, InputEvent::mouse(phase, x, y, HostTime(0)))
        .unwrap();
}

#[test]
fn drag_starts_only_past_the_threshold() {
    let (mut scene, stage, _, handle, _) = scene();
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    scene.on(handle, "dragstart dragmove dragend click", move |_, e| {
        sink.borrow_mut().push(e.kind.clone());
    });

    mouse(&mut scene, stage, InputPhase::Down, 60.0, 60.0);
    mouse(&mut scene, stage, InputPhase::Move, 61.0, 62.0);
    assert!(log.borrow().is_empty());
    assert!(!scene.is_dragging(handle));

    mouse(&mut scene, stage, InputPhase::Move, 70.0, 70.0);
    mouse(&mut scene, stage, InputPhase::Move, 80.0, 75.0);
    assert!(scene.is_dragging(handle));
    assert_eq!(scene.position(handle), Point::new(70.0, 65.0));

    mouse(&mut scene, stage, InputPhase::Up, 80.0, 75.0);
    assert_eq!(
        *log.borrow(),
        ["dragstart", "dragmove", "dragmove", "dragend"],
        "no click after a drag"
    );
    assert!(!scene.is_dragging_any());
}

#[test]
fn short_press_is_still_a_click() {
    let (mut scene, stage, _, handle, _) = scene();
    let clicks = Rc::new(Cell::new(0));
    let c = clicks.clone();
    scene.on(handle, "click", move |_, _| c.set(c.get() + 1));
    mouse(&mut scene, stage, InputPhase::Down, 60.0, 60.0);
    mouse(&mut scene, stage, InputPhase::Move, 61.0, 61.0);
    mouse(&mut scene, stage, InputPhase::Up, 61.0, 61.0);
    assert_eq!(clicks.get(), 1);
    assert!(scene.drag_session(handle).is_none());
}

fn touch(scene: &mut Scene, stage: NodeId, phase: InputPhase, touches: &[Touch], changed: &[Touch]) {
    scene
        .dispatch_input(
            stage,
            InputEvent::touch(phase, touches.to_vec(), changed.to_vec(), HostTime(0)),
        )
        .unwrap();
}

#[test]
fn two_touches_drag_two_nodes_independently() {
    let (mut scene, stage, _, handle, fixed) = scene();
    scene.set_attr(fixed, "draggable", true);
    let log = Rc::new(RefCell::new(Vec::new()));
    for (label, node) in [("a", handle), ("b", fixed)] {
        let sink = log.clone();
        scene.on(node, "dragstart dragend", move |_, e| {
            sink.borrow_mut().push(format!("{label}:{}", e.kind));
        });
    }

    let a = Touch::new(1, 60.0, 60.0);
    let b = Touch::new(2, 160.0, 160.0);
    touch(&mut scene, stage, InputPhase::Down, &[a], &[a]);
    touch(&mut scene, stage, InputPhase::Down, &[a, b], &[b]);
    assert_eq!(scene.drag_session(handle).map(|s| s.pointer_id), Some(1));
    assert_eq!(scene.drag_session(fixed).map(|s| s.pointer_id), Some(2));

    let a = Touch::new(1, 80.0, 80.0);
    let b = Touch::new(2, 140.0, 140.0);
    touch(&mut scene, stage, InputPhase::Move, &[a, b], &[a, b]);
    assert!(scene.is_dragging(handle));
    assert!(scene.is_dragging(fixed));
    assert_eq!(scene.position(handle), Point::new(70.0, 70.0));
    assert_eq!(scene.position(fixed), Point::new(130.0, 130.0));

    touch(&mut scene, stage, InputPhase::Up, &[b], &[a]);
    assert!(!scene.is_dragging(handle));
    assert!(scene.drag_session(handle).is_none());
    assert!(scene.is_dragging(fixed), "the other touch keeps dragging");

    let b = Touch::new(2, 120.0, 130.0);
    touch(&mut scene, stage, InputPhase::Move, &[b], &[b]);
    assert_eq!(scene.position(fixed), Point::new(110.0, 120.0));
    assert_eq!(scene.position(handle), Point::new(70.0, 70.0));

    touch(&mut scene, stage, InputPhase::Up, &[], &[b]);
    assert!(!scene.is_dragging_any());
    assert_eq!(*log.borrow(), ["a:dragstart", "b:dragstart", "a:dragend", "b:dragend"]);
}

#[test]
fn hit_surface_is_not_redrawn_while_its_layer_drags() {
    let (mut scene, stage, layer, handle, fixed) = scene();
    mouse(&mut scene, stage, InputPhase::Down, 60.0, 60.0);
    mouse(&mut scene, stage, InputPhase::Move, 90.0, 90.0);
    assert!(scene.is_dragging(handle));
    assert!(scene.is_draw_scheduled(layer));
    scene.tick(HostTime(16_000));
    assert!(!scene.should_draw_hit(fixed, false));
    assert!(scene.should_draw_hit(fixed, true));
    assert_eq!(scene.pick(stage, Point::new(160.0, 160.0)), None);

    mouse(&mut scene, stage, InputPhase::Up, 90.0, 90.0);
    assert_eq!(scene.pick(stage, Point::new(160.0, 160.0)), Some(fixed));
    assert_eq!(scene.pick(stage, Point::new(85.0, 85.0)), Some(handle));
}

#[test]
fn destroying_the_dragged_node_ends_the_session() {
    let (mut scene, stage, _, handle, _) = scene();
    mouse(&mut scene, stage, InputPhase::Down, 60.0, 60.0);
    mouse(&mut scene, stage, InputPhase::Move, 90.0, 90.0);
    scene.destroy(handle).unwrap();
    assert!(!scene.is_dragging_any());
    mouse(&mut scene, stage, InputPhase::Move, 100.0, 100.0);
    mouse(&mut scene, stage, InputPhase::Up, 100.0, 100.0);
}

#[test]
fn animation_moves_a_shape_each_frame() {
    let (mut scene, stage, layer, handle, _) = scene();
    let anim = scene.start_animation(
        move |scene, frame| {
            scene.set_attr(handle, "x", 50.0 + frame.time / 10.0);
            true
        },
        &[layer],
        HostTime(0),
    );
    let drawn = scene.tick(HostTime::from_millis(100));
    assert_eq!(drawn.layers_drawn, 1);
    assert_eq!(scene.attr_f64(handle, "x"), 60.0);
    assert_eq!(scene.pick(stage, Point::new(95.0, 60.0)), Some(handle));
    scene.stop_animation(anim);
    assert!(!scene.needs_frame());
}
