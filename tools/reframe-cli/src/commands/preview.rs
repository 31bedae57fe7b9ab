//! Sample the composed preview transform.

use std::path::PathBuf;

use serde::Serialize;

use reframe_processing_core::{compose, ZoomState};
use reframe_timeline::TimelineModel;

use super::load_timeline;

#[derive(Debug, Serialize)]
struct Sample {
    time: f64,
    scale: f64,
    translate_x: f64,
    translate_y: f64,
    origin_x: f64,
    origin_y: f64,
    effect: Option<String>,
}

fn sample_times(model: &TimelineModel, rate_hz: u32) -> Vec<f64> {
    let duration = model.effective_duration();
    let rate = rate_hz.max(1) as f64;
    let count = (duration * rate).floor() as usize;
    (0..=count).map(|i| i as f64 / rate).collect()
}

pub fn run(script: PathBuf, rate_hz: u32, json: bool) -> anyhow::Result<()> {
    let model = load_timeline(&script)?;

    let samples: Vec<Sample> = sample_times(&model, rate_hz)
        .into_iter()
        .map(|t| {
            let transform = compose(&model, t, None);
            let zoom = ZoomState::at(model.effects(), t);
            Sample {
                time: t,
                scale: transform.scale,
                translate_x: transform.translate_x_percent,
                translate_y: transform.translate_y_percent,
                origin_x: transform.origin_x_percent,
                origin_y: transform.origin_y_percent,
                effect: zoom.effect.map(|id| id.to_string()),
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&samples)?);
        return Ok(());
    }

    println!("Preview of {} at {rate_hz} Hz", script.display());
    println!(
        "{:>8}  {:>8}  {:>9}  {:>9}  {:>8}  {:>8}  effect",
        "time", "scale", "pan x %", "pan y %", "orig x", "orig y"
    );
    for s in &samples {
        println!(
            "{:>8.3}  {:>8.4}  {:>9.3}  {:>9.3}  {:>8.2}  {:>8.2}  {}",
            s.time,
            s.scale,
            s.translate_x,
            s.translate_y,
            s.origin_x,
            s.origin_y,
            s.effect.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
