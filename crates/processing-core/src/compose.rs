//! Preview transform composition.
//!
//! The preview applies, in order: a pan translation, then a scale about the
//! transform origin. For a frame point `p` (percent coordinates) this maps to
//!
//! ```text
//! p' = origin + translate + scale * (p - origin)
//! ```
//!
//! Translation is expressed in percent of the frame, like keyframe offsets.

use serde::{Deserialize, Serialize};

use reframe_timeline::{sanitize_offset, PanOffset, TimelineModel};

use crate::interpolate::interpolate;
use crate::zoom::{ZoomState, BASE_SCALE, DEFAULT_ORIGIN};

/// Effective visual transform at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translate_x_percent: f64,
    pub translate_y_percent: f64,
    pub scale: f64,
    pub origin_x_percent: f64,
    pub origin_y_percent: f64,
}

/// The part of the source frame that ends up filling the output,
/// normalized so the full frame is `(0, 0, 1, 1)`.
///
/// `x`/`y` may fall outside `[0, 1]` when the pan pushes content off frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibleRegion {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translate_x_percent: 0.0,
        translate_y_percent: 0.0,
        scale: BASE_SCALE,
        origin_x_percent: DEFAULT_ORIGIN,
        origin_y_percent: DEFAULT_ORIGIN,
    };

    /// Build from a pan offset and a zoom state.
    pub fn from_parts(pan: PanOffset, zoom: ZoomState) -> Self {
        Self {
            translate_x_percent: pan.x,
            translate_y_percent: pan.y,
            scale: zoom.scale,
            origin_x_percent: zoom.origin_x,
            origin_y_percent: zoom.origin_y,
        }
    }

    /// Map a frame point (percent coordinates) through the transform.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.origin_x_percent
                + self.translate_x_percent
                + self.scale * (x - self.origin_x_percent),
            self.origin_y_percent
                + self.translate_y_percent
                + self.scale * (y - self.origin_y_percent),
        )
    }

    /// Affine matrix `[a, b, c, d, e, f]` in percent units, such that
    /// `x' = a*x + c*y + e` and `y' = b*x + d*y + f`.
    pub fn matrix(&self) -> [f64; 6] {
        let s = self.scale;
        [
            s,
            0.0,
            0.0,
            s,
            self.origin_x_percent * (1.0 - s) + self.translate_x_percent,
            self.origin_y_percent * (1.0 - s) + self.translate_y_percent,
        ]
    }

    /// Source window shown by the output under this transform.
    pub fn visible_region(&self) -> VisibleRegion {
        let origin_x = self.origin_x_percent / 100.0;
        let origin_y = self.origin_y_percent / 100.0;
        let pan_x = self.translate_x_percent / 100.0;
        let pan_y = self.translate_y_percent / 100.0;
        VisibleRegion {
            x: origin_x - (origin_x + pan_x) / self.scale,
            y: origin_y - (origin_y + pan_y) / self.scale,
            w: 1.0 / self.scale,
            h: 1.0 / self.scale,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Compose the preview transform for time `t`.
///
/// `drag_override` is the live offset of an in-progress pan drag; when
/// present it replaces the keyframe-driven translation. Non-finite drag
/// components are treated as zero.
pub fn compose(timeline: &TimelineModel, t: f64, drag_override: Option<PanOffset>) -> Transform {
    let pan = match drag_override {
        Some(drag) => PanOffset::new(sanitize_offset(drag.x), sanitize_offset(drag.y)),
        None => interpolate(timeline.keyframes(), t),
    };
    let zoom = ZoomState::at(timeline.effects(), t);
    Transform::from_parts(pan, zoom)
}
