//! Check system capabilities.

use reframe_common::config::config_file_path;
use reframe_render_engine::export::ffmpeg_available;

pub fn run() -> anyhow::Result<()> {
    println!("Reframe System Check");
    println!("{}", "=".repeat(50));

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[OK] Config: defaults ({} not found)", config_path.display());
    }

    let ffmpeg = ffmpeg_available();
    if ffmpeg {
        println!("[OK] ffmpeg found in PATH");
    } else {
        println!("[MISSING] ffmpeg not found in PATH");
    }

    println!();
    if ffmpeg {
        println!("All required capabilities are available. Reframe is ready.");
    } else {
        println!("Install ffmpeg to enable `reframe export`. Compile and preview work without it.");
    }

    Ok(())
}
