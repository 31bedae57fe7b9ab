//! Print the render-time expressions for an edit script.

use std::path::PathBuf;

use reframe_common::config::AppConfig;
use reframe_render_engine::{compile, Dialect};

use super::load_timeline;

pub fn run(script: PathBuf, config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let model = load_timeline(&script)?;
    let compiled = compile(&model);
    let rendered = compiled.render(&Dialect::FILTER);
    let export = &config.export;
    let zoompan = compiled.to_zoompan_filter(export.width, export.height, export.fps);

    if json {
        let report = serde_json::json!({
            "expressions": rendered,
            "zoompan": zoompan,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Compiled: {}", script.display());
    println!("  Duration: {}s", rendered.duration);
    println!(
        "  Scale:    {}",
        rendered.scale.as_deref().unwrap_or("1 (no zoom effects)")
    );
    println!("  Origin X: {}", rendered.origin_x);
    println!("  Origin Y: {}", rendered.origin_y);
    println!("  Offset X: {}", rendered.offset_x);
    println!("  Offset Y: {}", rendered.offset_y);
    println!();
    println!("zoompan filter ({}x{} @ {}fps):", export.width, export.height, export.fps);
    println!("  {zoompan}");

    Ok(())
}
