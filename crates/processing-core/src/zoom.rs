//! Zoom effect evaluation.
//!
//! # Selection
//!
//! An effect is active while `t` is in `[start, start + duration)`. When
//! several windows contain `t`, the effect with the largest `start` wins;
//! among equal starts the one added first wins.
//!
//! # Scale
//!
//! Progress through the window is eased with a quadratic ease-in-out and
//! mapped onto `1.0 ..= 1.5`: rising for zoom-in, falling for zoom-out.

use serde::{Deserialize, Serialize};

use reframe_timeline::{EffectId, ZoomEffect, ZoomKind};

use crate::sanitize_query_time;

/// Scale with no zoom applied.
pub const BASE_SCALE: f64 = 1.0;

/// Scale at the zoomed-in end of an effect.
pub const PEAK_SCALE: f64 = 1.5;

/// Transform origin used when no effect is active (percent).
pub const DEFAULT_ORIGIN: f64 = 50.0;

/// Quadratic ease-in-out over `[0, 1]`, symmetric about `0.5`.
pub fn ease_in_out_quad(p: f64) -> f64 {
    if p < 0.5 {
        2.0 * p * p
    } else {
        1.0 - (-2.0 * p + 2.0).powi(2) / 2.0
    }
}

/// The effect governing time `t`, if any.
pub fn active_effect(effects: &[ZoomEffect], t: f64) -> Option<&ZoomEffect> {
    let t = sanitize_query_time(t);
    let mut best: Option<&ZoomEffect> = None;
    for effect in effects.iter().filter(|e| e.contains(t)) {
        match best {
            Some(current) if effect.start <= current.start => {}
            _ => best = Some(effect),
        }
    }
    best
}

/// Normalized progress of `t` through the effect window, clamped to `[0, 1]`.
pub fn effect_progress(effect: &ZoomEffect, t: f64) -> f64 {
    if !(effect.duration > 0.0 && effect.duration.is_finite()) {
        return 1.0;
    }
    ((sanitize_query_time(t) - effect.start) / effect.duration).clamp(0.0, 1.0)
}

/// Eased scale of `effect` at time `t`.
pub fn effect_scale(effect: &ZoomEffect, t: f64) -> f64 {
    let eased = ease_in_out_quad(effect_progress(effect, t));
    let range = PEAK_SCALE - BASE_SCALE;
    match effect.kind {
        ZoomKind::ZoomIn => BASE_SCALE + range * eased,
        ZoomKind::ZoomOut => PEAK_SCALE - range * eased,
    }
}

/// Zoom contribution to the preview transform at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomState {
    pub scale: f64,
    /// Transform origin, percent of frame width.
    pub origin_x: f64,
    /// Transform origin, percent of frame height.
    pub origin_y: f64,
    /// The effect that produced this state.
    pub effect: Option<EffectId>,
}

impl ZoomState {
    /// No zoom, centered origin.
    pub const IDENTITY: ZoomState = ZoomState {
        scale: BASE_SCALE,
        origin_x: DEFAULT_ORIGIN,
        origin_y: DEFAULT_ORIGIN,
        effect: None,
    };

    /// Evaluate the zoom for time `t`.
    pub fn at(effects: &[ZoomEffect], t: f64) -> Self {
        match active_effect(effects, t) {
            Some(effect) => ZoomState {
                scale: effect_scale(effect, t),
                origin_x: effect.center_x,
                origin_y: effect.center_y,
                effect: Some(effect.id),
            },
            None => Self::IDENTITY,
        }
    }
}
