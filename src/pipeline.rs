//! Pipeline driver.
//!
//! A polling consumer with two states: idle-wait and frame-ready. Each
//! poll asks the exchange for a frame newer than the last one processed;
//! on a hit it snapshots the plane, then runs
//! stats -> gate -> resample -> contrast -> (sampled dump / ring save)
//! -> classifier, and goes back to waiting.
//!
//! The snapshot copy keeps the exchange slot locked only for a memcpy,
//! so the capture side is never blocked behind resampling or disk I/O.
//!
//! Per-frame failures never abort the loop: gate rejections are expected
//! and sampled into the log, ring I/O errors are logged and the frame
//! continues to inference, and a missing classifier degrades to a no-op
//! result.

use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::PipelineConfig;
use crate::contrast::{ContrastOutcome, ContrastPolicy};
use crate::dump::hex_dump;
use crate::exchange::PlaneExchange;
use crate::infer::{Classification, ClassifierHandle};
use crate::plane::{LumaPlane, QuantTensor};
use crate::resample::resample_bilinear;
use crate::ring::FrameRing;
use crate::stats::{GatePolicy, PlaneStats};

/// What happened to one polled frame.
#[derive(Debug)]
pub enum FrameOutcome {
    /// Gate rejected the frame; nothing downstream ran.
    Rejected { seq: u64, mean: u8 },
    /// Frame went through the full pipeline.
    Classified {
        seq: u64,
        stats: PlaneStats,
        contrast: ContrastOutcome,
        classification: Classification,
        saved: Option<PathBuf>,
    },
}

/// Owns all per-process pipeline state: the snapshot plane, the ML plane,
/// the tensor, the ring, and the classifier. Constructed once at startup;
/// no per-frame allocation after that.
pub struct Pipeline {
    config: PipelineConfig,
    gate: GatePolicy,
    contrast: ContrastPolicy,
    full_plane: LumaPlane,
    ml_plane: LumaPlane,
    tensor: QuantTensor,
    ring: FrameRing,
    classifier: ClassifierHandle,
    dump_sink: Option<Box<dyn Write + Send>>,
    last_seq: u64,
    processed: u64,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        classifier: ClassifierHandle,
        dump_sink: Option<Box<dyn Write + Send>>,
    ) -> Result<Self> {
        let ring = FrameRing::open(&config.ring_dir, config.ring_slots)?;
        let full_plane = LumaPlane::new(config.capture.width, config.capture.height);
        Ok(Self {
            gate: GatePolicy::new(config.dark_floor),
            contrast: ContrastPolicy {
                bright_mean: config.bright_mean,
                flat_range: config.flat_range,
            },
            full_plane,
            ml_plane: LumaPlane::new_ml(),
            tensor: QuantTensor::new_ml(),
            ring,
            classifier,
            dump_sink,
            last_seq: 0,
            processed: 0,
            config,
        })
    }

    /// Frames that passed the gate so far.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Last sequence number consumed from the exchange.
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// One poll: snapshot the newest published frame, if any, and run it
    /// through the pipeline.
    pub fn poll_once(&mut self, exchange: &PlaneExchange) -> Result<Option<FrameOutcome>> {
        let Some(view) = exchange.latest_since(self.last_seq)? else {
            return Ok(None);
        };
        self.last_seq = view.seq;
        let seq = view.seq;
        self.full_plane.copy_from(&view);
        drop(view);
        self.process(seq).map(Some)
    }

    /// Poll until `stop` is raised, idling on the configured interval.
    pub fn run(&mut self, exchange: &PlaneExchange, stop: &AtomicBool) -> Result<()> {
        while !stop.load(Ordering::Relaxed) {
            if self.poll_once(exchange)?.is_none() {
                std::thread::sleep(self.config.poll);
            }
        }
        log::info!(
            "pipeline stopped: {} frames processed, {} saves",
            self.processed,
            self.ring.saves()
        );
        Ok(())
    }

    fn process(&mut self, seq: u64) -> Result<FrameOutcome> {
        let stats = PlaneStats::compute(&self.full_plane);

        if !self.gate.admit(&stats) {
            if self.sampled(seq) {
                log::info!("frame {} too dark (mean={}), skipped", seq, stats.mean);
            }
            return Ok(FrameOutcome::Rejected {
                seq,
                mean: stats.mean,
            });
        }

        resample_bilinear(&self.full_plane, &mut self.ml_plane);
        let contrast = self
            .contrast
            .normalize(&mut self.ml_plane, &mut self.tensor, stats.mean);
        self.processed += 1;

        if self.sampled(seq) {
            match contrast {
                ContrastOutcome::Bright => {
                    log::info!("frame {} bright (mean={}), boost skipped", seq, stats.mean);
                }
                ContrastOutcome::Stretched { min, max } => {
                    log::info!(
                        "frame {} | raw mean {} | boost range {}->{}",
                        seq,
                        stats.mean,
                        min,
                        max
                    );
                }
                ContrastOutcome::Flat { min, max } => {
                    log::info!(
                        "frame {} flat (range {}..{}), boost skipped",
                        seq,
                        min,
                        max
                    );
                }
            }
        }

        if self.due(self.config.dump_interval) {
            if let Some(sink) = self.dump_sink.as_mut() {
                hex_dump(&self.ml_plane, sink)?;
            }
        }

        // Ring I/O failure is recoverable: log and continue to inference.
        let saved = if self.due(self.config.save_interval) {
            match self.ring.save(&self.ml_plane) {
                Ok(path) => {
                    log::debug!("frame {} saved to {}", seq, path.display());
                    Some(path)
                }
                Err(e) => {
                    log::warn!("frame {} save failed: {}", seq, e);
                    None
                }
            }
        } else {
            None
        };

        let classification = self.classifier.classify(&self.tensor);

        Ok(FrameOutcome::Classified {
            seq,
            stats,
            contrast,
            classification,
            saved,
        })
    }

    fn sampled(&self, seq: u64) -> bool {
        seq % self.config.log_sample_interval == 0
    }

    fn due(&self, interval: u64) -> bool {
        interval > 0 && self.processed % interval == 0
    }
}
