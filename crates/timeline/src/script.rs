//! Edit scripts: replayable sequences of editing gestures.
//!
//! A script starts from an empty timeline and applies each edit through the
//! same operations the interactive editor uses. Effects are referenced by
//! creation order (the first `add_effect` is effect `0`), keyframes by their
//! current index in the keyframe list.
//!
//! ```json
//! {
//!   "duration": 6.0,
//!   "edits": [
//!     { "op": "add_effect", "kind": "zoom_in", "start": 1.0, "center_y": 50.0 },
//!     { "op": "resize_effect", "effect": 0, "duration": 4.0 },
//!     { "op": "add_keyframe", "time": 0.0, "offset_x": 0.0, "offset_y": 0.0 }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::effect::{EffectId, ZoomKind};
use crate::model::TimelineModel;

/// A sequence of edits applied to a fresh timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditScript {
    /// Nominal video duration in seconds. Missing or `null` is treated as
    /// unknown and falls back to one second for ratio math.
    #[serde(default)]
    pub duration: Option<f64>,

    #[serde(default)]
    pub edits: Vec<Edit>,
}

/// One editing gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    AddEffect {
        kind: ZoomKind,
        start: f64,
        #[serde(default = "default_center_y")]
        center_y: f64,
    },
    MoveEffect {
        effect: usize,
        start: f64,
        center_y: f64,
    },
    ResizeEffect {
        effect: usize,
        duration: f64,
    },
    RemoveEffect {
        effect: usize,
    },
    AddKeyframe {
        time: f64,
        offset_x: f64,
        offset_y: f64,
    },
    MoveKeyframe {
        keyframe: usize,
        time: f64,
    },
}

fn default_center_y() -> f64 {
    50.0
}

fn lookup_effect(
    created: &[EffectId],
    edit: usize,
    effect: usize,
) -> Result<EffectId, ScriptError> {
    created
        .get(effect)
        .copied()
        .ok_or(ScriptError::UnknownEffect { edit, effect })
}

/// Errors raised while loading or replaying an edit script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Edit {edit}: no effect #{effect} was created")]
    UnknownEffect { edit: usize, effect: usize },

    #[error("Edit {edit}: no keyframe at index {keyframe}")]
    UnknownKeyframe { edit: usize, keyframe: usize },
}

impl EditScript {
    /// Load a script from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ScriptError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| ScriptError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Replay every edit against a new timeline.
    ///
    /// Moving or resizing an effect that an earlier edit removed is a no-op,
    /// exactly as it is in the interactive editor. Referencing an effect that
    /// was never created is an error.
    pub fn apply(&self) -> Result<TimelineModel, ScriptError> {
        let mut model = TimelineModel::new(self.duration.unwrap_or(f64::NAN));
        let mut created: Vec<EffectId> = Vec::new();

        for (edit_idx, edit) in self.edits.iter().enumerate() {
            match *edit {
                Edit::AddEffect {
                    kind,
                    start,
                    center_y,
                } => {
                    let effect = model.add_effect(kind, start, center_y);
                    created.push(effect.id);
                }
                Edit::MoveEffect {
                    effect,
                    start,
                    center_y,
                } => {
                    model.move_effect(lookup_effect(&created, edit_idx, effect)?, start, center_y);
                }
                Edit::ResizeEffect { effect, duration } => {
                    model.resize_effect(lookup_effect(&created, edit_idx, effect)?, duration);
                }
                Edit::RemoveEffect { effect } => {
                    model.remove_effect(lookup_effect(&created, edit_idx, effect)?);
                }
                Edit::AddKeyframe {
                    time,
                    offset_x,
                    offset_y,
                } => {
                    model.add_keyframe(time, offset_x, offset_y);
                }
                Edit::MoveKeyframe { keyframe, time } => {
                    if !model.move_keyframe_at(keyframe, time) {
                        return Err(ScriptError::UnknownKeyframe {
                            edit: edit_idx,
                            keyframe,
                        });
                    }
                }
            }
        }

        tracing::debug!(
            edits = self.edits.len(),
            effects = model.effects().len(),
            keyframes = model.keyframes().len(),
            "Edit script applied"
        );
        Ok(model)
    }
}
