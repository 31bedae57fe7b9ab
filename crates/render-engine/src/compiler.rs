//! Filter-graph compiler: timeline -> render-time expressions.
//!
//! The compiled expressions reproduce the live preview as closed-form
//! functions of the renderer's frame time:
//!
//! - **Scale:** one term per effect, `inside * eased_scale + outside`, where
//!   `inside`/`outside` are complementary 0/1 gates over the effect window.
//!   Terms are multiplied together from latest start to earliest start.
//! - **Origin:** nested conditionals checking windows from latest start to
//!   earliest, so the effect the preview would pick supplies the origin.
//! - **Position:** per axis, nested conditionals over the sorted keyframes,
//!   linearly interpolating from the previous keyframe inside each segment.
//!
//! Windows are half-open `[start, start + duration)`, identical to the
//! preview, and clipped to `[0, duration]` of the timeline. Compilation is
//! deterministic: it depends only on the timeline's values and order.

use serde::Serialize;

use reframe_processing_core::zoom::{BASE_SCALE, DEFAULT_ORIGIN, PEAK_SCALE};
use reframe_processing_core::{sanitize_query_time, Transform};
use reframe_timeline::{PositionKeyframe, TimelineModel, ZoomEffect, ZoomKind};

use crate::expr::{Dialect, EvalEnv, Expr, Var};

/// Frame axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Compiled render description of a whole timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    /// Zoom factor; `None` means identity scale (no effects).
    pub scale: Option<Expr>,

    /// Transform origin in percent.
    pub origin_x: Expr,
    pub origin_y: Expr,

    /// Pan offset in percent.
    pub offset_x: Expr,
    pub offset_y: Expr,

    /// Sanitized timeline duration in seconds; bounds the render.
    pub duration: f64,
}

/// Serialized form of a [`FilterExpression`] for logging or hand-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedExpressions {
    pub scale: Option<String>,
    pub origin_x: String,
    pub origin_y: String,
    pub offset_x: String,
    pub offset_y: String,
    pub duration: String,
}

/// Compile the full timeline.
pub fn compile(timeline: &TimelineModel) -> FilterExpression {
    let duration = timeline.effective_duration();
    let effects = effects_latest_first(timeline.effects(), duration);

    let overlaps = timeline.overlapping_effects();
    if !overlaps.is_empty() {
        tracing::warn!(
            pairs = overlaps.len(),
            "Timeline has overlapping zoom effects; the exported scale multiplies them"
        );
    }

    let compiled = FilterExpression {
        scale: compile_scale(&effects, duration),
        origin_x: compile_origin(&effects, duration, Axis::X),
        origin_y: compile_origin(&effects, duration, Axis::Y),
        offset_x: compile_position(timeline.keyframes(), Axis::X),
        offset_y: compile_position(timeline.keyframes(), Axis::Y),
        duration,
    };

    tracing::debug!(
        effects = effects.len(),
        keyframes = timeline.keyframes().len(),
        scale_nodes = compiled.scale.as_ref().map_or(0, Expr::node_count),
        offset_x_nodes = compiled.offset_x.node_count(),
        offset_y_nodes = compiled.offset_y.node_count(),
        duration,
        "Compiled timeline"
    );

    compiled
}

/// Effects that start before the end of the timeline, latest start first.
/// Equal starts keep insertion order.
fn effects_latest_first(effects: &[ZoomEffect], duration: f64) -> Vec<ZoomEffect> {
    let mut sorted: Vec<ZoomEffect> = effects
        .iter()
        .filter(|e| e.start < duration)
        .copied()
        .collect();
    sorted.sort_by(|a, b| b.start.total_cmp(&a.start));
    sorted
}

/// Window end, clipped to the timeline.
fn window_end(effect: &ZoomEffect, duration: f64) -> f64 {
    effect.end().min(duration)
}

/// 1 while `t` is in `[start, end)`, else 0.
fn inside_window(effect: &ZoomEffect, duration: f64) -> Expr {
    Expr::gte(Expr::time(), Expr::num(effect.start))
        * Expr::lt(Expr::time(), Expr::num(window_end(effect, duration)))
}

/// Complement of [`inside_window`].
fn outside_window(effect: &ZoomEffect, duration: f64) -> Expr {
    Expr::lt(Expr::time(), Expr::num(effect.start))
        + Expr::gte(Expr::time(), Expr::num(window_end(effect, duration)))
}

/// Quadratic ease-in-out of `progress`, symbolically.
fn eased(progress: &Expr) -> Expr {
    let first_half = Expr::num(2.0) * progress.clone() * progress.clone();
    let tail = Expr::num(-2.0) * progress.clone() + Expr::num(2.0);
    let second_half = Expr::num(1.0) - Expr::pow(tail, Expr::num(2.0)) / Expr::num(2.0);
    Expr::if_else(
        Expr::lt(progress.clone(), Expr::num(0.5)),
        first_half,
        second_half,
    )
}

/// Eased scale of one effect as a function of render time.
fn effect_scale_expr(effect: &ZoomEffect) -> Expr {
    let progress = Expr::time_since(effect.start) / Expr::num(effect.duration);
    let range = Expr::num(PEAK_SCALE - BASE_SCALE);
    match effect.kind {
        ZoomKind::ZoomIn => Expr::num(BASE_SCALE) + range * eased(&progress),
        ZoomKind::ZoomOut => Expr::num(PEAK_SCALE) - range * eased(&progress),
    }
}

/// Multiplicative scale expression; `None` when there are no effects.
/// `effects` must already be ordered latest start first.
fn compile_scale(effects: &[ZoomEffect], duration: f64) -> Option<Expr> {
    effects
        .iter()
        .map(|effect| {
            inside_window(effect, duration) * effect_scale_expr(effect)
                + outside_window(effect, duration)
        })
        .reduce(|product, term| product * term)
}

/// Transform origin along one axis.
/// `effects` must already be ordered latest start first.
fn compile_origin(effects: &[ZoomEffect], duration: f64, axis: Axis) -> Expr {
    effects
        .iter()
        .rev()
        .fold(Expr::num(DEFAULT_ORIGIN), |fallback, effect| {
            let center = match axis {
                Axis::X => effect.center_x,
                Axis::Y => effect.center_y,
            };
            Expr::if_else(inside_window(effect, duration), Expr::num(center), fallback)
        })
}

/// Pan offset along one axis.
pub fn compile_position(keyframes: &[PositionKeyframe], axis: Axis) -> Expr {
    let mut sorted = keyframes.to_vec();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));

    let value = |kf: &PositionKeyframe| match axis {
        Axis::X => kf.offset_x,
        Axis::Y => kf.offset_y,
    };

    let (first, last) = match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Expr::num(0.0),
    };
    if sorted.len() == 1 {
        return Expr::num(value(first));
    }

    let mut expr = Expr::num(value(last));
    for pair in sorted.windows(2).rev() {
        let (a, b) = (&pair[0], &pair[1]);
        // Literals print exactly, so a kept segment never renders a zero divisor.
        let span = b.time - a.time;
        if span <= 0.0 {
            continue;
        }
        let fraction = Expr::time_since(a.time) / Expr::num(span);
        let interpolated = Expr::num(value(a)) + Expr::num(value(b) - value(a)) * fraction;
        expr = Expr::if_else(
            Expr::lt(Expr::time(), Expr::num(b.time)),
            interpolated,
            expr,
        );
    }

    // At exactly the first time the first keyframe holds, even when later
    // keyframes share that time.
    let before_first = if sorted[1].time == first.time {
        Expr::gte(Expr::num(first.time), Expr::time())
    } else {
        Expr::lt(Expr::time(), Expr::num(first.time))
    };
    Expr::if_else(before_first, Expr::num(value(first)), expr)
}

impl FilterExpression {
    /// Scale expression, or the literal identity scale.
    pub fn scale_or_identity(&self) -> Expr {
        self.scale.clone().unwrap_or(Expr::num(BASE_SCALE))
    }

    /// Left (or top) edge of the visible source window, as a fraction of the
    /// input size, for the given zoom value. Mirrors
    /// [`Transform::visible_region`].
    pub fn region_start(&self, axis: Axis, zoom: Expr) -> Expr {
        let (origin, offset) = match axis {
            Axis::X => (&self.origin_x, &self.offset_x),
            Axis::Y => (&self.origin_y, &self.offset_y),
        };
        origin.clone() / Expr::num(100.0)
            - (origin.clone() + offset.clone()) / Expr::num(100.0) / zoom
    }

    /// Evaluate the compiled expressions at render time `t`.
    /// Non-finite `t` is treated as zero, as in the preview.
    pub fn evaluate(&self, t: f64) -> Transform {
        let env = EvalEnv::at(sanitize_query_time(t));
        Transform {
            translate_x_percent: self.offset_x.eval(&env),
            translate_y_percent: self.offset_y.eval(&env),
            scale: self.scale.as_ref().map_or(BASE_SCALE, |s| s.eval(&env)),
            origin_x_percent: self.origin_x.eval(&env),
            origin_y_percent: self.origin_y.eval(&env),
        }
    }

    /// Serialize every expression in the given dialect.
    pub fn render(&self, dialect: &Dialect) -> RenderedExpressions {
        RenderedExpressions {
            scale: self.scale.as_ref().map(|s| s.render(dialect)),
            origin_x: self.origin_x.render(dialect),
            origin_y: self.origin_y.render(dialect),
            offset_x: self.offset_x.render(dialect),
            offset_y: self.offset_y.render(dialect),
            duration: crate::expr::format_number(self.duration),
        }
    }

    /// An ffmpeg `zoompan` filter producing one output frame per input
    /// frame at `width`x`height`.
    ///
    /// `x`/`y` select the top-left corner of the visible window in input
    /// pixels, using zoompan's own `zoom` value for the current frame.
    pub fn to_zoompan_filter(&self, width: u32, height: u32, fps: u32) -> String {
        let dialect = Dialect::ZOOMPAN;
        let zoom = self.scale_or_identity().render(&dialect);
        let x = (Expr::var(Var::InputWidth) * self.region_start(Axis::X, Expr::var(Var::Zoom)))
            .render(&dialect);
        let y = (Expr::var(Var::InputHeight) * self.region_start(Axis::Y, Expr::var(Var::Zoom)))
            .render(&dialect);
        format!(
            "zoompan=z='{zoom}':x='{x}':y='{y}':d=1:s={width}x{height}:fps={fps}",
            fps = fps.max(1),
        )
    }
}
