//! demo - run the redaction pipeline over a synthetic or still source

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use streamsafe::{
    ChannelOrder, DetectionSettings, DetectorKind, FrameSource, Pipeline, PipelineConfig,
    SourceConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Frame source: stub://<name> or a local PNG.
    #[arg(long, default_value = "stub://street")]
    source: String,
    /// Number of frames to process.
    #[arg(long, default_value_t = 60)]
    frames: u64,
    /// Synthetic frame width.
    #[arg(long, default_value_t = 640)]
    width: u32,
    /// Synthetic frame height.
    #[arg(long, default_value_t = 480)]
    height: u32,
    /// Disable license plate redaction.
    #[arg(long)]
    no_plates: bool,
    /// Disable block number redaction.
    #[arg(long)]
    no_block_numbers: bool,
    /// Disable street sign redaction.
    #[arg(long)]
    no_signs: bool,
    /// Plate model (overrides STREAMSAFE_PLATE_MODEL).
    #[arg(long, env = "STREAMSAFE_PLATE_MODEL")]
    plate_model: Option<PathBuf>,
    /// Where to write the last redacted frame.
    #[arg(long, default_value = "demo_out/redacted.png")]
    out: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.frames == 0 {
        return Err(anyhow!("frames must be >= 1"));
    }

    stage("load config");
    let mut config = PipelineConfig::load()?;
    if args.plate_model.is_some() {
        config.plates.model_path = args.plate_model.clone();
    }

    stage("construct pipeline");
    let mut pipeline = Pipeline::construct(&config)?;

    let settings = DetectionSettings::all()
        .with(DetectorKind::LicensePlates, !args.no_plates)
        .with(DetectorKind::BlockNumbers, !args.no_block_numbers)
        .with(DetectorKind::StreetSigns, !args.no_signs);

    let mut source = FrameSource::new(SourceConfig {
        path: args.source.clone(),
        width: args.width,
        height: args.height,
        order: ChannelOrder::Bgr,
    })?;

    stage(&format!("process {} frames from {}", args.frames, source.describe()));
    let started = Instant::now();
    let mut redacted_total = 0usize;
    let mut refreshes = [0u64; 3];
    let mut failures = 0u64;
    let mut last = None;
    for _ in 0..args.frames {
        let mut frame = source.next_frame()?;
        let report = pipeline.process(&mut frame, &settings);
        redacted_total += report.redacted;
        for (slot, kind) in DetectorKind::ALL.iter().enumerate() {
            if report.was_refreshed(*kind) {
                refreshes[slot] += 1;
            }
        }
        failures += report.failed.len() as u64;
        last = Some(frame);
    }
    let elapsed = started.elapsed();

    let frame = last.ok_or_else(|| anyhow!("source produced no frames"))?;
    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    frame
        .to_rgb()
        .save(&args.out)
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    println!("demo summary:");
    println!("  frames processed: {}", args.frames);
    println!(
        "  avg per frame: {:.2} ms",
        elapsed.as_secs_f64() * 1000.0 / args.frames as f64
    );
    println!("  regions blurred: {}", redacted_total);
    for (slot, kind) in DetectorKind::ALL.iter().enumerate() {
        println!(
            "  {} refreshes: {} (period {})",
            kind,
            refreshes[slot],
            pipeline.cache(*kind).refresh_period()
        );
    }
    println!("  failed refreshes: {}", failures);
    println!(
        "  plate model: {}",
        if pipeline.plate_model_loaded() {
            "loaded"
        } else {
            "fallback regions"
        }
    );
    println!(
        "  ocr engine: {}",
        if pipeline.text_engine_loaded() {
            "loaded"
        } else {
            "unavailable"
        }
    );
    println!("  last frame: {}", args.out.display());
    Ok(())
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}
