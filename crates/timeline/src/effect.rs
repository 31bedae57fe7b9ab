//! Zoom effect types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Shortest duration an effect may be resized to (seconds).
pub const MIN_EFFECT_DURATION_SECS: f64 = 0.1;

/// Duration given to newly added effects (seconds).
pub const DEFAULT_EFFECT_DURATION_SECS: f64 = 2.0;

/// Horizontal origin given to newly added effects (percent).
pub const DEFAULT_CENTER_X: f64 = 50.0;

/// Opaque effect identifier, unique within the model that allocated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectId(pub u64);

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect-{}", self.0)
    }
}

/// Direction of a zoom effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomKind {
    /// Scale rises from 1.0 to 1.5 across the window.
    ZoomIn,
    /// Scale falls from 1.5 to 1.0 across the window.
    ZoomOut,
}

impl ZoomKind {
    /// Label shown on timeline markers.
    pub fn label(self) -> &'static str {
        match self {
            ZoomKind::ZoomIn => "Zoom in",
            ZoomKind::ZoomOut => "Zoom out",
        }
    }
}

impl fmt::Display for ZoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A zoom effect applied over `[start, start + duration)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomEffect {
    pub id: EffectId,
    pub kind: ZoomKind,

    /// Start time in seconds (`>= 0`).
    pub start: f64,

    /// Length in seconds (`>= MIN_EFFECT_DURATION_SECS`).
    pub duration: f64,

    /// Transform origin, percent of frame width.
    pub center_x: f64,

    /// Transform origin, percent of frame height.
    pub center_y: f64,
}

impl ZoomEffect {
    /// End of the effect window (exclusive).
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Whether `t` falls in `[start, start + duration)`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end()
    }

    /// Whether the windows of two effects intersect.
    pub fn overlaps(&self, other: &ZoomEffect) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// Clamp a start time to `>= 0`, mapping non-finite input to zero.
pub(crate) fn sanitize_start(start: f64) -> f64 {
    if start.is_finite() {
        start.max(0.0)
    } else {
        0.0
    }
}

/// Clamp a duration to the minimum; non-finite input becomes the minimum.
pub(crate) fn sanitize_effect_duration(duration: f64) -> f64 {
    if duration.is_finite() {
        duration.max(MIN_EFFECT_DURATION_SECS)
    } else {
        MIN_EFFECT_DURATION_SECS
    }
}

/// Clamp a percentage to `[0, 100]`; NaN becomes the frame center.
pub(crate) fn sanitize_percent(value: f64) -> f64 {
    if value.is_nan() {
        50.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
