//! The timeline model: owner of all effects and keyframes.
//!
//! Every mutation replaces the affected entity as a whole rather than
//! assigning fields in place, so a reader holding a copy of an entity never
//! sees a half-applied edit.
//!
//! Mutations addressed to an effect id that no longer exists are silent
//! no-ops that return `false`. Interactive drags routinely race with
//! deletion, so a stale id is expected rather than exceptional.

use crate::effect::{
    sanitize_effect_duration, sanitize_percent, sanitize_start, EffectId, ZoomEffect, ZoomKind,
    DEFAULT_CENTER_X, DEFAULT_EFFECT_DURATION_SECS,
};
use crate::keyframe::{sanitize_keyframe_time, PositionKeyframe};

/// Duration substituted for ratio math when the nominal one is unusable.
pub const FALLBACK_DURATION_SECS: f64 = 1.0;

/// Return `duration` if it is finite and positive, otherwise the fallback.
pub fn sanitize_timeline_duration(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        FALLBACK_DURATION_SECS
    }
}

/// Zoom effects, pan keyframes and the duration of the underlying video.
#[derive(Debug, Clone)]
pub struct TimelineModel {
    effects: Vec<ZoomEffect>,
    keyframes: Vec<PositionKeyframe>,

    /// Nominal duration as reported by the host, possibly invalid.
    duration: f64,

    next_effect_id: u64,
}

impl TimelineModel {
    /// Create an empty timeline. `duration` is stored as given.
    pub fn new(duration: f64) -> Self {
        Self {
            effects: Vec::new(),
            keyframes: Vec::new(),
            duration,
            next_effect_id: 1,
        }
    }

    /// Nominal duration, exactly as supplied by the host.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Duration safe for ratio math: finite and positive.
    pub fn effective_duration(&self) -> f64 {
        sanitize_timeline_duration(self.duration)
    }

    /// Replace the nominal duration (e.g. once media metadata loads).
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }

    /// All effects in insertion order.
    pub fn effects(&self) -> &[ZoomEffect] {
        &self.effects
    }

    /// All keyframes in insertion order (not necessarily sorted).
    pub fn keyframes(&self) -> &[PositionKeyframe] {
        &self.keyframes
    }

    pub fn effect(&self, id: EffectId) -> Option<&ZoomEffect> {
        self.effects.iter().find(|e| e.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.keyframes.is_empty()
    }

    /// Add an effect with the default duration and horizontal origin.
    pub fn add_effect(&mut self, kind: ZoomKind, start: f64, center_y: f64) -> ZoomEffect {
        let effect = ZoomEffect {
            id: self.allocate_id(),
            kind,
            start: sanitize_start(start),
            duration: DEFAULT_EFFECT_DURATION_SECS,
            center_x: DEFAULT_CENTER_X,
            center_y: sanitize_percent(center_y),
        };
        tracing::debug!(id = %effect.id, kind = %kind, start = effect.start, "Added effect");
        self.effects.push(effect);
        effect
    }

    /// Move an effect in time and vertically. Returns `false` if `id` is unknown.
    pub fn move_effect(&mut self, id: EffectId, new_start: f64, new_center_y: f64) -> bool {
        self.replace_effect(id, |e| ZoomEffect {
            start: sanitize_start(new_start),
            center_y: sanitize_percent(new_center_y),
            ..*e
        })
    }

    /// Change an effect's duration, clamped to the minimum.
    /// Returns `false` if `id` is unknown.
    pub fn resize_effect(&mut self, id: EffectId, new_duration: f64) -> bool {
        self.replace_effect(id, |e| ZoomEffect {
            duration: sanitize_effect_duration(new_duration),
            ..*e
        })
    }

    pub fn remove_effect(&mut self, id: EffectId) -> Option<ZoomEffect> {
        let idx = self.effects.iter().position(|e| e.id == id)?;
        let removed = self.effects.remove(idx);
        tracing::debug!(id = %id, "Removed effect");
        Some(removed)
    }

    /// Append a keyframe, clamping `time` to `>= 0`.
    pub fn add_keyframe(&mut self, time: f64, offset_x: f64, offset_y: f64) -> PositionKeyframe {
        let keyframe = PositionKeyframe::new(time, offset_x, offset_y);
        tracing::debug!(
            time = keyframe.time,
            offset_x = keyframe.offset_x,
            offset_y = keyframe.offset_y,
            "Added position keyframe"
        );
        self.keyframes.push(keyframe);
        keyframe
    }

    /// Move the first keyframe equal to `target` to `new_time`.
    /// Returns `false` if no keyframe matches.
    pub fn move_keyframe(&mut self, target: &PositionKeyframe, new_time: f64) -> bool {
        match self.keyframes.iter().position(|kf| kf == target) {
            Some(idx) => self.move_keyframe_at(idx, new_time),
            None => {
                tracing::trace!(time = target.time, "move_keyframe: no matching keyframe");
                false
            }
        }
    }

    /// Move the keyframe at `index` (insertion order) to `new_time`.
    pub fn move_keyframe_at(&mut self, index: usize, new_time: f64) -> bool {
        let Some(slot) = self.keyframes.get_mut(index) else {
            return false;
        };
        *slot = PositionKeyframe {
            time: sanitize_keyframe_time(new_time),
            ..*slot
        };
        true
    }

    /// Remove the first keyframe equal to `target`.
    pub fn remove_keyframe(&mut self, target: &PositionKeyframe) -> bool {
        match self.keyframes.iter().position(|kf| kf == target) {
            Some(idx) => {
                self.keyframes.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Position of `time` along the timeline in `[0, 1]`-ish units
    /// (not clamped; times past the end give ratios above one).
    pub fn time_to_ratio(&self, time: f64) -> f64 {
        time / self.effective_duration()
    }

    /// Inverse of [`TimelineModel::time_to_ratio`].
    pub fn ratio_to_time(&self, ratio: f64) -> f64 {
        ratio * self.effective_duration()
    }

    /// Pairs of effects whose windows intersect, in insertion order.
    ///
    /// Overlaps are legal; at query time the later-starting effect wins.
    pub fn overlapping_effects(&self) -> Vec<(EffectId, EffectId)> {
        let mut pairs = Vec::new();
        for (i, a) in self.effects.iter().enumerate() {
            for b in &self.effects[i + 1..] {
                if a.overlaps(b) {
                    pairs.push((a.id, b.id));
                }
            }
        }
        pairs
    }

    fn allocate_id(&mut self) -> EffectId {
        let id = EffectId(self.next_effect_id);
        self.next_effect_id += 1;
        id
    }

    fn replace_effect(
        &mut self,
        id: EffectId,
        edit: impl FnOnce(&ZoomEffect) -> ZoomEffect,
    ) -> bool {
        match self.effects.iter_mut().find(|e| e.id == id) {
            Some(slot) => {
                *slot = edit(slot);
                true
            }
            None => {
                tracing::trace!(id = %id, "Ignoring edit for unknown effect");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::MIN_EFFECT_DURATION_SECS;

    #[test]
    fn test_add_effect_defaults() {
        let mut model = TimelineModel::new(10.0);
        let effect = model.add_effect(ZoomKind::ZoomIn, 3.0, 40.0);
        assert_eq!(effect.duration, DEFAULT_EFFECT_DURATION_SECS);
        assert_eq!(effect.center_x, 50.0);
        assert_eq!(effect.center_y, 40.0);
        assert_eq!(model.effects().len(), 1);
    }

    #[test]
    fn test_effect_ids_are_unique() {
        let mut model = TimelineModel::new(10.0);
        let a = model.add_effect(ZoomKind::ZoomIn, 0.0, 50.0);
        let b = model.add_effect(ZoomKind::ZoomOut, 0.0, 50.0);
        model.remove_effect(a.id);
        let c = model.add_effect(ZoomKind::ZoomIn, 0.0, 50.0);
        assert_ne!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_ne!(b.id, c.id);
    }

    #[test]
    fn test_move_effect_clamps() {
        let mut model = TimelineModel::new(10.0);
        let effect = model.add_effect(ZoomKind::ZoomIn, 1.0, 50.0);
        assert!(model.move_effect(effect.id, -4.0, 130.0));
        let moved = model.effect(effect.id).unwrap();
        assert_eq!(moved.start, 0.0);
        assert_eq!(moved.center_y, 100.0);
        assert_eq!(moved.duration, effect.duration);
    }

    #[test]
    fn test_resize_clamps_to_minimum() {
        let mut model = TimelineModel::new(10.0);
        let effect = model.add_effect(ZoomKind::ZoomIn, 1.0, 50.0);
        assert!(model.resize_effect(effect.id, -5.0));
        assert_eq!(
            model.effect(effect.id).unwrap().duration,
            MIN_EFFECT_DURATION_SECS
        );
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let mut model = TimelineModel::new(10.0);
        let effect = model.add_effect(ZoomKind::ZoomIn, 1.0, 50.0);
        let before = model.effects().to_vec();
        assert!(!model.move_effect(EffectId(999), 5.0, 10.0));
        assert!(!model.resize_effect(EffectId(999), 5.0));
        assert!(model.remove_effect(EffectId(999)).is_none());
        assert_eq!(model.effects(), before.as_slice());
        assert!(model.effect(effect.id).is_some());
    }

    #[test]
    fn test_move_keyframe_by_value() {
        let mut model = TimelineModel::new(10.0);
        let a = model.add_keyframe(2.0, 10.0, 0.0);
        let b = model.add_keyframe(2.0, 20.0, 0.0);
        assert!(model.move_keyframe(&b, -1.0));
        assert_eq!(model.keyframes()[0], a);
        assert_eq!(model.keyframes()[1].time, 0.0);
        assert_eq!(model.keyframes()[1].offset_x, 20.0);
    }

    #[test]
    fn test_move_keyframe_missing() {
        let mut model = TimelineModel::new(10.0);
        model.add_keyframe(1.0, 0.0, 0.0);
        let ghost = PositionKeyframe::new(3.0, 1.0, 1.0);
        assert!(!model.move_keyframe(&ghost, 4.0));
        assert!(!model.move_keyframe_at(5, 4.0));
    }

    #[test]
    fn test_remove_keyframe() {
        let mut model = TimelineModel::new(10.0);
        let kf = model.add_keyframe(1.0, 5.0, 5.0);
        assert!(model.remove_keyframe(&kf));
        assert!(model.keyframes().is_empty());
        assert!(!model.remove_keyframe(&kf));
    }

    #[test]
    fn test_duration_fallback() {
        for bad in [f64::NAN, f64::INFINITY, 0.0, -3.0] {
            let model = TimelineModel::new(bad);
            assert_eq!(model.effective_duration(), FALLBACK_DURATION_SECS);
            assert!(model.time_to_ratio(0.5).is_finite());
        }
        let model = TimelineModel::new(f64::NAN);
        assert!(model.duration().is_nan());
    }

    #[test]
    fn test_add_keyframe_with_non_finite_offsets() {
        let mut model = TimelineModel::new(10.0);
        let first = model.add_keyframe(0.0, f64::NAN, 0.0);
        let second = model.add_keyframe(5.0, f64::INFINITY, f64::NEG_INFINITY);
        assert_eq!((first.offset_x, first.offset_y), (0.0, 0.0));
        assert_eq!((second.offset_x, second.offset_y), (0.0, 0.0));
        assert!(model
            .keyframes()
            .iter()
            .all(|k| k.offset_x.is_finite() && k.offset_y.is_finite()));
    }

    #[test]
    fn test_ratio_conversion() {
        let model = TimelineModel::new(8.0);
        assert!((model.time_to_ratio(2.0) - 0.25).abs() < 1e-12);
        assert!((model.ratio_to_time(0.5) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_overlapping_effects() {
        let mut model = TimelineModel::new(20.0);
        let a = model.add_effect(ZoomKind::ZoomIn, 0.0, 50.0);
        let b = model.add_effect(ZoomKind::ZoomIn, 1.0, 50.0);
        let _c = model.add_effect(ZoomKind::ZoomOut, 10.0, 50.0);
        assert_eq!(model.overlapping_effects(), vec![(a.id, b.id)]);
    }

    proptest::proptest! {
        #[test]
        fn prop_edits_keep_stored_values_valid(
            start in proptest::num::f64::ANY,
            duration in proptest::num::f64::ANY,
            center_y in proptest::num::f64::ANY,
            time in proptest::num::f64::ANY,
        ) {
            let mut model = TimelineModel::new(10.0);
            let effect = model.add_effect(ZoomKind::ZoomIn, start, center_y);
            model.resize_effect(effect.id, duration);
            let kf = model.add_keyframe(time, 0.0, 0.0);

            let stored = model.effect(effect.id).unwrap();
            proptest::prop_assert!(stored.start.is_finite() && stored.start >= 0.0);
            proptest::prop_assert!(
                stored.duration.is_finite() && stored.duration >= MIN_EFFECT_DURATION_SECS
            );
            proptest::prop_assert!((0.0..=100.0).contains(&stored.center_y));
            proptest::prop_assert!(kf.time >= 0.0);
        }
    }
}
