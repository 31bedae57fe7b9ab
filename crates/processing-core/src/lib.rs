//! Reframe Processing Core
//!
//! Evaluates a timeline at a point in time for live preview:
//! - **Interpolation:** Piecewise-linear pan offset from keyframes
//! - **Zoom:** Active effect selection and eased scale
//! - **Composition:** The combined preview transform
//!
//! This crate is pure computation: no I/O, no shared state.
//! All inputs are data; all outputs are data.

pub mod compose;
pub mod interpolate;
pub mod zoom;

pub use compose::{compose, Transform, VisibleRegion};
pub use interpolate::interpolate;
pub use zoom::{active_effect, ease_in_out_quad, effect_progress, effect_scale, ZoomState};

/// Map a non-finite query time to zero.
pub fn sanitize_query_time(t: f64) -> f64 {
    if t.is_finite() {
        t
    } else {
        0.0
    }
}
