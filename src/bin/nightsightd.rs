//! nightsightd - night-vision pipeline daemon
//!
//! This daemon:
//! 1. Runs a capture source at the configured frame rate
//! 2. Extracts luma planes and publishes them through the double-buffered
//!    exchange
//! 3. Polls the exchange and runs the frame pipeline (gate, resample,
//!    night boost, quantize)
//! 4. Persists normalized frames to the rotating PGM ring
//! 5. Hands quantized tensors to the classifier

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nightsight::{
    open_source, spawn_capture, ClassifierHandle, Pipeline, PipelineConfig, PlaneExchange,
    StubClassifier,
};

#[derive(Parser, Debug)]
#[command(name = "nightsightd", about = "Software night-vision frame pipeline daemon")]
struct Args {
    /// JSON config file.
    #[arg(long, env = "NIGHTSIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Write the hex-dump diagnostic to stdout (every 2nd processed
    /// frame unless the config sets another interval).
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = PipelineConfig::load_from(args.config.as_deref())?;
    if args.dump && cfg.dump_interval == 0 {
        cfg.dump_interval = 2;
    }

    log::info!(
        "nightsightd {}: capture {} {}x{}@{}fps, ring {} ({} slots)",
        env!("CARGO_PKG_VERSION"),
        cfg.capture.source,
        cfg.capture.width,
        cfg.capture.height,
        cfg.capture.target_fps,
        cfg.ring_dir.display(),
        cfg.ring_slots
    );
    log::info!(
        "gate floor {}, bright threshold {}, flat range {}",
        cfg.dark_floor,
        cfg.bright_mean,
        cfg.flat_range
    );

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            log::info!("shutdown requested");
            stop.store(true, Ordering::Relaxed);
        })?;
    }

    // Capture and buffer allocation failures are fatal: no pipeline can
    // exist without them.
    let exchange = Arc::new(PlaneExchange::new(cfg.capture.width, cfg.capture.height));
    let mut source = open_source(&cfg.capture)?;
    source.connect()?;
    let capture_handle = spawn_capture(
        Arc::clone(&exchange),
        source,
        &cfg.capture,
        Arc::clone(&stop),
    );

    let classifier = ClassifierHandle::setup(Box::new(StubClassifier::new()));
    let dump_sink: Option<Box<dyn std::io::Write + Send>> = if cfg.dump_interval > 0 {
        Some(Box::new(std::io::stdout()))
    } else {
        None
    };

    let mut pipeline = Pipeline::new(cfg, classifier, dump_sink)?;
    let run_result = pipeline.run(&exchange, &stop);

    // Stop the producer even if the driver errored out.
    stop.store(true, Ordering::Relaxed);
    match capture_handle.join() {
        Ok(capture_result) => capture_result?,
        Err(_) => log::error!("capture thread panicked"),
    }

    run_result
}
