//! Pan keyframes and offsets.
//!
//! Offsets are percentages of the frame size and may be negative
//! (negative pans left/up).

use serde::{Deserialize, Serialize};

/// A pan offset in percent of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PanOffset {
    pub x: f64,
    pub y: f64,
}

impl PanOffset {
    /// No pan.
    pub const ZERO: PanOffset = PanOffset { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation between two offsets. `t` is not clamped.
    pub fn lerp(a: &PanOffset, b: &PanOffset, t: f64) -> PanOffset {
        PanOffset {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        }
    }
}

/// A pan anchor point on the timeline.
///
/// Keyframes carry no identifier; they are located by value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionKeyframe {
    /// Time in seconds (`>= 0`).
    pub time: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl PositionKeyframe {
    /// Create a keyframe, clamping `time` to `>= 0`.
    ///
    /// Non-finite offsets (e.g. from a drag over a zero-width container)
    /// become `0`.
    pub fn new(time: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            time: sanitize_keyframe_time(time),
            offset_x: sanitize_offset(offset_x),
            offset_y: sanitize_offset(offset_y),
        }
    }

    pub fn offset(&self) -> PanOffset {
        PanOffset::new(self.offset_x, self.offset_y)
    }
}

/// Clamp a keyframe time to `>= 0`; non-finite input becomes zero.
pub(crate) fn sanitize_keyframe_time(time: f64) -> f64 {
    if time.is_finite() {
        time.max(0.0)
    } else {
        0.0
    }
}

/// Map a non-finite pan offset to zero.
pub fn sanitize_offset(offset: f64) -> f64 {
    if offset.is_finite() {
        offset
    } else {
        0.0
    }
}
