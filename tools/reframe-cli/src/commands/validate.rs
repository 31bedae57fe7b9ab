//! Validate an edit script.

use std::path::PathBuf;

use super::load_timeline;

pub fn run(script: PathBuf) -> anyhow::Result<()> {
    println!("Validating script at: {}", script.display());

    let model = load_timeline(&script)?;

    let duration = model.duration();
    if duration == model.effective_duration() {
        println!("  Duration: {duration}s");
    } else {
        println!(
            "  Duration: {duration} (invalid, using {}s)",
            model.effective_duration()
        );
    }
    println!("  Zoom effects: {}", model.effects().len());
    for effect in model.effects() {
        println!(
            "    {} {} [{:.3}s, {:.3}s) origin ({:.1}%, {:.1}%)",
            effect.id,
            effect.kind.label(),
            effect.start,
            effect.end(),
            effect.center_x,
            effect.center_y
        );
        if effect.start >= model.effective_duration() {
            println!("      starts after the end of the video and will not be rendered");
        }
    }
    println!("  Position keyframes: {}", model.keyframes().len());

    let overlaps = model.overlapping_effects();
    if overlaps.is_empty() {
        println!("\nScript is valid.");
    } else {
        println!("\nOverlapping zoom effects:");
        for (a, b) in &overlaps {
            println!("  - {a} overlaps {b}");
        }
        println!(
            "\n{} overlap(s) found. The preview shows the later effect; \
             the export multiplies them.",
            overlaps.len()
        );
    }

    Ok(())
}
