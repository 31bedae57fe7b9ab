//! Reframe Timeline Model
//!
//! Defines the editing state for a recording:
//! - **Effects:** Time-windowed zoom in/out effects with a transform origin
//! - **Keyframes:** Pan offsets anchored in time
//! - **Model:** The owning collection plus the editing operations
//! - **Scripts:** Replayable sequences of editing gestures
//!
//! Times are in seconds. Origins and offsets are percentages of the frame.

pub mod effect;
pub mod keyframe;
pub mod model;
pub mod script;

pub use effect::*;
pub use keyframe::*;
pub use model::*;
pub use script::*;
