//! Pan offset interpolation between position keyframes.
//!
//! Keyframes are evaluated in time order (stable: keyframes sharing a time
//! keep their insertion order). Before the first keyframe the first offset
//! holds, after the last keyframe the last offset holds, and in between the
//! offset is linearly interpolated across the segment containing `t`.
//!
//! Segments are half-open `[a.time, b.time)`. A zero-length segment never
//! contains `t`, so at a repeated time the later keyframe's offset is used.

use reframe_timeline::{PanOffset, PositionKeyframe};

use crate::sanitize_query_time;

/// Offset of the pan path at time `t`. Empty input yields no pan.
///
/// The input slice is not reordered; sorting happens on a copy.
pub fn interpolate(keyframes: &[PositionKeyframe], t: f64) -> PanOffset {
    let t = sanitize_query_time(t);

    let mut sorted = keyframes.to_vec();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));

    let (first, last) = match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return PanOffset::ZERO,
    };

    if t <= first.time {
        return first.offset();
    }
    if t >= last.time {
        return last.offset();
    }

    for pair in sorted.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if t >= a.time && t < b.time {
            let fraction = (t - a.time) / (b.time - a.time);
            return PanOffset::lerp(&a.offset(), &b.offset(), fraction);
        }
    }

    last.offset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kf(time: f64, x: f64, y: f64) -> PositionKeyframe {
        PositionKeyframe::new(time, x, y)
    }

    fn approx(a: PanOffset, x: f64, y: f64) -> bool {
        (a.x - x).abs() < 1e-9 && (a.y - y).abs() < 1e-9
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(interpolate(&[], 3.0), PanOffset::ZERO);
    }

    #[test]
    fn test_single_keyframe_holds_everywhere() {
        let k = kf(2.0, 12.5, -7.0);
        for t in [-1.0, 0.0, 2.0, 2.5, 100.0] {
            assert_eq!(interpolate(&[k], t), k.offset());
        }
    }

    #[test]
    fn test_two_keyframes() {
        let keyframes = [kf(0.0, 0.0, 0.0), kf(10.0, 100.0, 50.0)];
        assert!(approx(interpolate(&keyframes, 5.0), 50.0, 25.0));
        assert!(approx(interpolate(&keyframes, -1.0), 0.0, 0.0));
        assert!(approx(interpolate(&keyframes, 20.0), 100.0, 50.0));
    }

    #[test]
    fn test_unsorted_input_is_not_reordered() {
        let keyframes = vec![kf(10.0, 100.0, 0.0), kf(0.0, 0.0, 0.0), kf(5.0, 20.0, 0.0)];
        let before = keyframes.clone();
        let at = interpolate(&keyframes, 7.5);
        assert!(approx(at, 60.0, 0.0));
        assert_eq!(keyframes, before);
    }

    #[test]
    fn test_duplicate_times_use_later_keyframe() {
        let keyframes = [
            kf(0.0, 0.0, 0.0),
            kf(5.0, 10.0, 0.0),
            kf(5.0, 30.0, 0.0),
            kf(10.0, 40.0, 0.0),
        ];
        assert!(approx(interpolate(&keyframes, 5.0), 30.0, 0.0));
        assert!(approx(interpolate(&keyframes, 7.5), 35.0, 0.0));
        assert!(approx(interpolate(&keyframes, 2.5), 5.0, 0.0));
    }

    #[test]
    fn test_nan_time_treated_as_zero() {
        let keyframes = [kf(0.0, 4.0, 4.0), kf(10.0, 100.0, 50.0)];
        let at = interpolate(&keyframes, f64::NAN);
        assert!(at.x.is_finite() && at.y.is_finite());
        assert!(approx(at, 4.0, 4.0));
    }

    proptest! {
        #[test]
        fn prop_result_stays_within_keyframe_bounds(
            points in prop::collection::vec(
                (0.0f64..100.0, -200.0f64..200.0, -200.0f64..200.0),
                1..12,
            ),
            t in -10.0f64..120.0,
        ) {
            let keyframes: Vec<PositionKeyframe> =
                points.iter().map(|&(time, x, y)| kf(time, x, y)).collect();
            let at = interpolate(&keyframes, t);

            let min_x = keyframes.iter().map(|k| k.offset_x).fold(f64::INFINITY, f64::min);
            let max_x = keyframes.iter().map(|k| k.offset_x).fold(f64::NEG_INFINITY, f64::max);
            let min_y = keyframes.iter().map(|k| k.offset_y).fold(f64::INFINITY, f64::min);
            let max_y = keyframes.iter().map(|k| k.offset_y).fold(f64::NEG_INFINITY, f64::max);

            prop_assert!(at.x >= min_x - 1e-9 && at.x <= max_x + 1e-9);
            prop_assert!(at.y >= min_y - 1e-9 && at.y <= max_y + 1e-9);
        }

        #[test]
        fn prop_keyframe_times_hit_exactly_when_unique(
            times in prop::collection::btree_set(0u32..1000, 2..10),
        ) {
            let keyframes: Vec<PositionKeyframe> = times
                .iter()
                .map(|&ms| kf(ms as f64 / 10.0, ms as f64, -(ms as f64)))
                .collect();
            for k in &keyframes {
                let at = interpolate(&keyframes, k.time);
                prop_assert!((at.x - k.offset_x).abs() < 1e-6);
                prop_assert!((at.y - k.offset_y).abs() < 1e-6);
            }
        }
    }
}
