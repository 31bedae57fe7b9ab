//! Reframe Render Engine
//!
//! Turns a timeline into render-time expressions and hands them to an
//! encoder for export.
//!
//! # Pipeline Architecture
//!
//! ```text
//! TimelineModel ──► compile() ──► FilterExpression
//!                                  │  scale / origin / offset (Expr trees)
//!                                  ▼
//!                            to_zoompan_filter()
//!                                  │
//! source.mp4 ──────────────────────┤
//!                                  ▼
//!                          ffmpeg (RenderBackend)
//!                                  │
//!                                  ▼
//!                              output.mp4
//! ```
//!
//! The compiled expressions evaluate to the same transform the live preview
//! composes at every instant, so exports match what the editor showed.

pub mod compiler;
pub mod export;
pub mod expr;

pub use compiler::{compile, Axis, FilterExpression, RenderedExpressions};
pub use export::*;
pub use expr::{Dialect, EvalEnv, Expr};
