// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host input events and the per-family event-name tables.

use kurbo::{Point, Vec2};

use crate::time::HostTime;

/// Pointer id assigned to mouse and pointer input that carries none.
pub const DEFAULT_POINTER_ID: u32 = 999;

/// A source of pointer input. Each family has its own event names and its
/// own enter/leave and click state on the stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerFamily {
    /// Mouse input (`mousedown`, `click`, …).
    Mouse,
    /// Touch input (`touchstart`, `tap`, …).
    Touch,
    /// Unified pointer input (`pointerdown`, `pointerclick`, …).
    Pointer,
}

impl PointerFamily {
    /// All families.
    pub const ALL: [Self; 3] = [Self::Mouse, Self::Touch, Self::Pointer];

    /// The event names this family produces.
    #[must_use]
    pub const fn names(self) -> &'static EventNames {
        match self {
            Self::Mouse => &MOUSE_EVENTS,
            Self::Touch => &TOUCH_EVENTS,
            Self::Pointer => &POINTER_EVENTS,
        }
    }

    /// Dense index, for per-family arrays.
    #[must_use]
    pub const fn slot(self) -> usize {
        match self {
            Self::Mouse => 0,
            Self::Touch => 1,
            Self::Pointer => 2,
        }
    }
}

/// Event names a pointer family fires for each semantic event.
#[derive(Debug)]
pub struct EventNames {
    /// Target changed away from a node (bubbles).
    pub out: &'static str,
    /// Target changed away from a node (does not bubble past shared ancestors).
    pub leave: &'static str,
    /// Target changed onto a node (bubbles).
    pub over: &'static str,
    /// Target changed onto a node (does not bubble past shared ancestors).
    pub enter: &'static str,
    /// Pointer moved.
    pub moved: &'static str,
    /// Button or contact pressed.
    pub down: &'static str,
    /// Button or contact released.
    pub up: &'static str,
    /// Host cancelled the interaction.
    pub cancel: &'static str,
    /// Down and up on the same node.
    pub click: &'static str,
    /// Second click within the double-click window.
    pub dblclick: &'static str,
}

static MOUSE_EVENTS: EventNames = EventNames {
    out: "mouseout",
    leave: "mouseleave",
    over: "mouseover",
    enter: "mouseenter",
    moved: "mousemove",
    down: "mousedown",
    up: "mouseup",
    cancel: "mousecancel",
    click: "click",
    dblclick: "dblclick",
};

static TOUCH_EVENTS: EventNames = EventNames {
    out: "touchout",
    leave: "touchleave",
    over: "touchover",
    enter: "touchenter",
    moved: "touchmove",
    down: "touchstart",
    up: "touchend",
    cancel: "touchcancel",
    click: "tap",
    dblclick: "dbltap",
};

static POINTER_EVENTS: EventNames = EventNames {
    out: "pointerout",
    leave: "pointerleave",
    over: "pointerover",
    enter: "pointerenter",
    moved: "pointermove",
    down: "pointerdown",
    up: "pointerup",
    cancel: "pointercancel",
    click: "pointerclick",
    dblclick: "pointerdblclick",
};

/// Whether `kind` is an enter or leave event of any family.
#[must_use]
pub fn is_enter_or_leave(kind: &str) -> bool {
    PointerFamily::ALL
        .iter()
        .any(|f| f.names().enter == kind || f.names().leave == kind)
}

/// Whether `kind` is the down event of any family.
#[must_use]
pub fn is_down(kind: &str) -> bool {
    PointerFamily::ALL.iter().any(|f| f.names().down == kind)
}

/// What happened on the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputPhase {
    /// Pointer entered the host element.
    Enter,
    /// Button or contact pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button or contact released.
    Up,
    /// Host cancelled the interaction.
    Cancel,
    /// Pointer left the host element.
    Leave,
    /// Wheel scrolled.
    Wheel,
    /// Context menu requested.
    ContextMenu,
    /// Host revoked a pointer capture.
    LostCapture,
}

/// One touch contact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Touch {
    /// Host-assigned touch identifier.
    pub id: u32,
    /// Position in host client coordinates.
    pub client: Point,
}

impl Touch {
    /// A contact at client position `(x, y)`.
    #[must_use]
    pub const fn new(id: u32, x: f64, y: f64) -> Self {
        Self {
            id,
            client: Point::new(x, y),
        }
    }
}

/// A raw pointer event from the host, in client coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct InputEvent {
    /// Which family the event belongs to.
    pub family: PointerFamily,
    /// What happened.
    pub phase: InputPhase,
    /// Position in host client coordinates (mouse and pointer input).
    pub client: Point,
    /// Button index, `0` for the primary button.
    pub button: Option<u8>,
    /// Pointer id (pointer input). Mouse input without one uses
    /// [`DEFAULT_POINTER_ID`].
    pub pointer_id: Option<u32>,
    /// Every active touch (touch input).
    pub touches: Vec<Touch>,
    /// Touches that changed in this event (touch input).
    pub changed_touches: Vec<Touch>,
    /// Scroll delta (wheel input).
    pub delta: Vec2,
    /// When the host observed the event.
    pub time: HostTime,
}

impl InputEvent {
    fn base(family: PointerFamily, phase: InputPhase, time: HostTime) -> Self {
        Self {
            family,
            phase,
            client: Point::ZERO,
            button: None,
            pointer_id: None,
            touches: Vec::new(),
            changed_touches: Vec::new(),
            delta: Vec2::ZERO,
            time,
        }
    }

    /// A mouse event with the primary button.
    #[must_use]
    pub fn mouse(phase: InputPhase, x: f64, y: f64, time: HostTime) -> Self {
        Self {
            client: Point::new(x, y),
            button: Some(0),
            ..Self::base(PointerFamily::Mouse, phase, time)
        }
    }

    /// A pointer event for pointer `id` with the primary button.
    #[must_use]
    pub fn pointer(phase: InputPhase, id: u32, x: f64, y: f64, time: HostTime) -> Self {
        Self {
            client: Point::new(x, y),
            button: Some(0),
            pointer_id: Some(id),
            ..Self::base(PointerFamily::Pointer, phase, time)
        }
    }

    /// A touch event. `changed` lists the contacts this event is about;
    /// `touches` lists every active contact.
    #[must_use]
    pub fn touch(phase: InputPhase, touches: Vec<Touch>, changed: Vec<Touch>, time: HostTime) -> Self {
        Self {
            client: changed.first().map_or(Point::ZERO, |t| t.client),
            touches,
            changed_touches: changed,
            ..Self::base(PointerFamily::Touch, phase, time)
        }
    }

    /// A wheel event at a mouse position.
    #[must_use]
    pub fn wheel(x: f64, y: f64, delta: Vec2, time: HostTime) -> Self {
        Self {
            delta,
            button: None,
            ..Self::mouse(InputPhase::Wheel, x, y, time)
        }
    }

    /// Replaces the button.
    #[must_use]
    pub fn with_button(mut self, button: u8) -> Self {
        self.button = Some(button);
        self
    }

    /// The pointer id of mouse/pointer input.
    #[must_use]
    pub fn primary_pointer_id(&self) -> u32 {
        self.pointer_id.unwrap_or(DEFAULT_POINTER_ID)
    }

    /// `(id, client position)` of every contact this event changed.
    #[must_use]
    pub fn changed_pointers(&self) -> Vec<(u32, Point)> {
        match self.family {
            PointerFamily::Touch => self.changed_touches.iter().map(|t| (t.id, t.client)).collect(),
            _ => vec![(self.primary_pointer_id(), self.client)],
        }
    }

    /// `(id, client position)` of every active contact.
    #[must_use]
    pub fn all_pointers(&self) -> Vec<(u32, Point)> {
        match self.family {
            PointerFamily::Touch => self.touches.iter().map(|t| (t.id, t.client)).collect(),
            _ => vec![(self.primary_pointer_id(), self.client)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_tables_line_up() {
        assert_eq!(PointerFamily::Mouse.names().down, "mousedown");
        assert_eq!(PointerFamily::Touch.names().click, "tap");
        assert_eq!(PointerFamily::Pointer.names().dblclick, "pointerdblclick");
        assert!(is_enter_or_leave("touchleave"));
        assert!(!is_enter_or_leave("mouseout"));
        assert!(is_down("touchstart"));
    }

    #[test]
    fn mouse_without_id_uses_default_pointer() {
        let e = InputEvent::mouse(InputPhase::Down, 3.0, 4.0, HostTime(0));
        assert_eq!(e.changed_pointers(), vec![(DEFAULT_POINTER_ID, Point::new(3.0, 4.0))]);
    }

    #[test]
    fn touch_pointers_follow_the_lists() {
        let a = Touch {
            id: 1,
            client: Point::new(1.0, 1.0),
        };
        let b = Touch {
            id: 2,
            client: Point::new(2.0, 2.0),
        };
        let e = InputEvent::touch(InputPhase::Move, vec![a, b], vec![b], HostTime(0));
        assert_eq!(e.changed_pointers(), vec![(2, b.client)]);
        assert_eq!(e.all_pointers().len(), 2);
        assert_eq!(e.client, b.client);
    }
}
