//! Export an edit script onto a video.

use std::io::Write;
use std::path::PathBuf;

use reframe_common::config::AppConfig;
use reframe_render_engine::export::{export_timeline, ExportConfig, ExportJob, ExportProgress};

use super::load_timeline;

pub async fn run(
    script: PathBuf,
    input: PathBuf,
    output: Option<PathBuf>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    println!("Exporting {} onto {}", script.display(), input.display());

    let model = load_timeline(&script)?;
    let export_config = ExportConfig::from_defaults(&config.export)?;

    let output_path = output.unwrap_or_else(|| {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        input.with_file_name(format!(
            "{stem}.reframed.{}",
            export_config.format.extension()
        ))
    });

    println!("  Output: {}", output_path.display());
    println!("  Format: {}", export_config.format);
    println!(
        "  Resolution: {}x{} @ {}fps",
        export_config.width, export_config.height, export_config.fps
    );

    let job = ExportJob::new(input, output_path.clone(), export_config, &model);

    let progress_cb: Box<dyn Fn(ExportProgress) + Send> = Box::new(|p| {
        print!(
            "\r  Progress: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
            p.progress * 100.0,
            p.frames_rendered,
            p.total_frames,
            p.eta_secs,
        );
        let _ = std::io::stdout().flush();
    });

    match export_timeline(job, Some(progress_cb)).await {
        Ok(path) => {
            println!("\nExport complete: {}", path.display());
            Ok(())
        }
        Err(e) => {
            println!();
            Err(anyhow::anyhow!("Export failed: {e}"))
        }
    }
}
