use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use thermal_display_rs::image_pipeline::{
    frame_handoff, run_render_loop, spawn_acquisition, DisplayConfig, DisplayPipeline, FrameInfo,
    OutputFormat, RenderBudget, RenderLoopConfig, Rotation, SyntheticSource, TiffCompression,
    TiffFrameSink, TiffSinkConfig,
};
use thermal_display_rs::logger;

use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    logger::init();

    info!("Starting thermal_display...");

    let directory = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("frames"));
    std::fs::create_dir_all(&directory)
        .with_context(|| format!("creating output directory {}", directory.display()))?;

    let source = SyntheticSource::default()
        .with_frame_limit(200)
        .with_pacing(true);
    let image_info = FrameInfo::new(256, 192)
        .with_output(OutputFormat::Bgr888)
        .with_enhance(true)
        .with_rotation(Rotation::None);
    let (acquisition, render) = frame_handoff(source.frame_template(image_info)?);
    let producer = spawn_acquisition(source, acquisition)?;

    let mut pipeline = DisplayPipeline::new(DisplayConfig::builder().fps_smoothing(0.2).build());
    let mut sink = TiffFrameSink::new(
        TiffSinkConfig::builder()
            .directory(&directory)
            .compression(TiffCompression::DeflateBalanced)
            .predictor(Some(2))
            .every_nth(25)
            .compose_color_bar(true)
            .build(),
    );

    info!("Display pipeline initialized");
    info!("Output directory: {}", directory.display());
    info!("Segmentation band: {:?}", pipeline.config().segmentation_band);

    // Switch to segmentation halfway through, as a key press would.
    let switch = pipeline.mode_switch();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let mode = switch.toggle();
        info!(?mode, "Mode toggled");
    });

    let config = RenderLoopConfig {
        budget: RenderBudget::Time(Duration::from_secs(10)),
        wait_timeout: Some(Duration::from_secs(1)),
    };
    let report = run_render_loop(&mut pipeline, &mut sink, render, &config)?;

    match producer.join() {
        Ok(Ok(acquired)) => info!("Acquired {} frames", acquired.frames),
        Ok(Err(e)) => error!("Acquisition failed: {}", e),
        Err(_) => error!("Acquisition thread panicked"),
    }

    info!(
        "Presented {} frames ({} skipped), wrote {} TIFF files, exit: {:?}",
        report.frames_presented,
        report.frames_skipped,
        sink.written().len(),
        report.exit
    );
    if let Some(fps) = report.last_fps {
        info!("Last frame rate: {:.1} fps", fps);
    }
    println!("{}", report.timings);

    Ok(())
}
