//! Input events consumed by the buster.

use serde::{Deserialize, Serialize};

/// A position in viewport (client) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X position in viewport coordinates.
    pub x: f32,
    /// Y position in viewport coordinates.
    pub y: f32,
}

impl Point {
    /// The viewport origin.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A single touch point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Touch identifier (for multi-touch).
    pub id: u32,
    /// X position in viewport coordinates.
    pub x: f32,
    /// Y position in viewport coordinates.
    pub y: f32,
}

impl TouchPoint {
    /// Create a new touch point.
    #[must_use]
    pub const fn new(id: u32, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }

    /// Position of this touch.
    #[must_use]
    pub const fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A pointer-down event exactly as the host delivered it.
///
/// Each input model exposes a different shape; [`PointerDown::normalize`]
/// turns any of them into the uniform touch-list form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum RawPointerDown {
    /// A multi-touch `touchstart` with its three touch lists.
    Touch {
        /// All touches currently on the surface.
        touches: Vec<TouchPoint>,
        /// Touches that started on the event target.
        target_touches: Vec<TouchPoint>,
        /// Touches that changed in this event.
        changed_touches: Vec<TouchPoint>,
    },
    /// A legacy prefixed pointer event (`MSPointerDown`).
    LegacyPointer {
        /// Pointer identifier.
        pointer_id: u32,
        /// X position in viewport coordinates.
        x: f32,
        /// Y position in viewport coordinates.
        y: f32,
    },
    /// A plain `mousedown`.
    Mouse {
        /// X position in viewport coordinates.
        x: f32,
        /// Y position in viewport coordinates.
        y: f32,
    },
}

/// A gesture-start event in the uniform touch-list shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerDown {
    /// All current touch points.
    pub touches: Vec<TouchPoint>,
    /// Touch points that started on the event target.
    pub target_touches: Vec<TouchPoint>,
    /// Touch points that changed in this event.
    pub changed_touches: Vec<TouchPoint>,
}

impl PointerDown {
    /// Create from the three touch lists of a touch event.
    #[must_use]
    pub fn from_touch_lists(
        touches: Vec<TouchPoint>,
        target_touches: Vec<TouchPoint>,
        changed_touches: Vec<TouchPoint>,
    ) -> Self {
        Self {
            touches,
            target_touches,
            changed_touches,
        }
    }

    /// Synthesize single-element touch lists from a mouse position.
    #[must_use]
    pub fn from_mouse(x: f32, y: f32) -> Self {
        Self::single(TouchPoint::new(0, x, y))
    }

    fn single(touch: TouchPoint) -> Self {
        Self {
            touches: vec![touch],
            target_touches: vec![touch],
            changed_touches: vec![touch],
        }
    }

    /// Normalize a raw host event.
    #[must_use]
    pub fn normalize(raw: RawPointerDown) -> Self {
        match raw {
            RawPointerDown::Touch {
                touches,
                target_touches,
                changed_touches,
            } => Self::from_touch_lists(touches, target_touches, changed_touches),
            RawPointerDown::LegacyPointer { pointer_id, x, y } => {
                Self::single(TouchPoint::new(pointer_id, x, y))
            }
            RawPointerDown::Mouse { x, y } => Self::from_mouse(x, y),
        }
    }

    /// Get the first active touch point.
    #[must_use]
    pub fn first_touch(&self) -> Option<&TouchPoint> {
        self.touches.first()
    }

    /// Check if this is a multi-touch event.
    #[must_use]
    pub fn is_multi_touch(&self) -> bool {
        self.touches.len() > 1
    }
}

impl From<RawPointerDown> for PointerDown {
    fn from(raw: RawPointerDown) -> Self {
        Self::normalize(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_synthesizes_single_element_lists() {
        let down = PointerDown::from_mouse(12.0, 34.0);
        assert_eq!(down.touches.len(), 1);
        assert_eq!(down.target_touches, down.touches);
        assert_eq!(down.changed_touches, down.touches);
        assert_eq!(down.first_touch().map(TouchPoint::point), Some(Point::new(12.0, 34.0)));
        assert!(!down.is_multi_touch());
    }

    #[test]
    fn touch_lists_are_kept_as_delivered() {
        let a = TouchPoint::new(1, 10.0, 10.0);
        let b = TouchPoint::new(2, 50.0, 60.0);
        let down = PointerDown::normalize(RawPointerDown::Touch {
            touches: vec![a, b],
            target_touches: vec![a],
            changed_touches: vec![b],
        });
        assert_eq!(down.first_touch(), Some(&a));
        assert_eq!(down.target_touches, vec![a]);
        assert_eq!(down.changed_touches, vec![b]);
        assert!(down.is_multi_touch());
    }

    #[test]
    fn legacy_pointer_keeps_pointer_id() {
        let down: PointerDown = RawPointerDown::LegacyPointer {
            pointer_id: 7,
            x: 3.0,
            y: 4.0,
        }
        .into();
        assert_eq!(down.first_touch(), Some(&TouchPoint::new(7, 3.0, 4.0)));
    }

    #[test]
    fn empty_touch_list_has_no_first_touch() {
        let down = PointerDown::default();
        assert!(down.first_touch().is_none());
    }

    #[test]
    fn raw_event_serializes_with_model_tag() {
        let json = serde_json::to_string(&RawPointerDown::Mouse { x: 1.0, y: 2.0 })
            .expect("serialize");
        assert!(json.contains("\"model\":\"mouse\""));
    }

    #[test]
    fn point_display_and_finiteness() {
        assert_eq!(Point::new(1.5, 2.0).to_string(), "(1.5, 2)");
        assert!(Point::ORIGIN.is_finite());
        assert!(!Point::new(f32::NAN, 0.0).is_finite());
    }
}
