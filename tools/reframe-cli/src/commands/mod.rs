pub mod check;
pub mod compile;
pub mod export;
pub mod preview;
pub mod validate;

use std::path::Path;

use reframe_timeline::{EditScript, TimelineModel};

/// Load an edit script and replay it onto a fresh timeline.
pub fn load_timeline(path: &Path) -> anyhow::Result<TimelineModel> {
    let script = EditScript::load(path)?;
    let model = script.apply()?;
    tracing::debug!(
        script = %path.display(),
        effects = model.effects().len(),
        keyframes = model.keyframes().len(),
        "Loaded timeline"
    );
    Ok(model)
}
