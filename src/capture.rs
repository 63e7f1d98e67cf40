//! Capture sources.
//!
//! A capture source stands in for the camera controller: it fills a
//! packed 4:2:2 transfer buffer on request. The capture thread drives the
//! source at a target frame rate and hands each completed transfer to the
//! `PlaneExchange`, which is the Rust rendition of the DMA
//! completion callback — extraction happens synchronously before the
//! buffer is reused for the next transfer.
//!
//! Only the synthetic `stub://` source is built in; real sensor bring-up,
//! pin configuration and SCCB negotiation belong to the controller
//! collaborator, not this crate.

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::exchange::PlaneExchange;

/// Configuration for a capture source.
#[derive(Clone, Debug)]
pub struct CaptureConfig {
    /// Source URL. Only `stub://` scenes are supported in this build.
    pub source: String,
    /// Capture width in pixels.
    pub width: usize,
    /// Capture height in pixels.
    pub height: usize,
    /// Target frame rate; the capture thread paces transfers to this.
    pub target_fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: "stub://night_yard".to_string(),
            width: 320,
            height: 240,
            target_fps: 10,
        }
    }
}

/// Statistics for a capture source.
#[derive(Clone, Debug)]
pub struct CaptureStats {
    pub frames_captured: u64,
    pub source: String,
}

/// A camera-controller stand-in producing packed 4:2:2 transfers.
pub trait CaptureSource: Send {
    fn connect(&mut self) -> Result<()>;

    /// Fill `buf` with one completed transfer.
    ///
    /// `buf` is exactly `width * height * 2` bytes and is owned by the
    /// capture loop; implementations must not retain references to it.
    fn fill_capture(&mut self, buf: &mut [u8]) -> Result<()>;

    fn stats(&self) -> CaptureStats;
}

/// Open the source named by the config.
pub fn open_source(config: &CaptureConfig) -> Result<Box<dyn CaptureSource>> {
    if config.source.starts_with("stub://") {
        Ok(Box::new(SyntheticCapture::new(config.clone())))
    } else {
        Err(anyhow!(
            "unsupported capture source '{}'; this build only supports stub:// scenes",
            config.source
        ))
    }
}

/// Spawn the capture thread: fill, publish, pace, repeat until stopped.
pub fn spawn_capture(
    exchange: Arc<PlaneExchange>,
    mut source: Box<dyn CaptureSource>,
    config: &CaptureConfig,
    stop: Arc<AtomicBool>,
) -> JoinHandle<Result<()>> {
    let interval = frame_interval(config.target_fps);
    let buf_len = config.width * config.height * 2;

    std::thread::spawn(move || -> Result<()> {
        // One transfer buffer for the thread's lifetime, reused per cycle.
        let mut capture_buf = vec![0u8; buf_len];
        while !stop.load(Ordering::Relaxed) {
            source.fill_capture(&mut capture_buf)?;
            let seq = exchange.publish_capture(&capture_buf)?;
            log::trace!("capture published frame {}", seq);
            std::thread::sleep(interval);
        }
        let stats = source.stats();
        log::info!(
            "capture stopped after {} frames from {}",
            stats.frames_captured,
            stats.source
        );
        Ok(())
    })
}

fn frame_interval(target_fps: u32) -> Duration {
    if target_fps == 0 {
        Duration::from_millis(0)
    } else {
        Duration::from_millis((1000 / target_fps).max(1) as u64)
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for development and tests
// ----------------------------------------------------------------------------

/// Synthetic 4:2:2 source cycling between night and daylight scenes.
///
/// Night frames are a dim noise floor with a brighter drifting blob, so
/// the dark branch of the contrast normalizer has structure to stretch.
/// Daylight frames are a bright gradient that exercises the pass-through
/// branch.
pub struct SyntheticCapture {
    config: CaptureConfig,
    frame_count: u64,
    rng: StdRng,
}

/// Frames per synthetic scene before switching between night and day.
const FRAMES_PER_SCENE: u64 = 120;

impl SyntheticCapture {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            rng: StdRng::seed_from_u64(0x5eed),
        }
    }

    fn night_scene(&mut self, buf: &mut [u8]) {
        let (w, h) = (self.config.width, self.config.height);
        // Blob drifts one column per frame.
        let blob_x = (self.frame_count as usize + w / 4) % w;
        let blob_y = h / 2;

        for y in 0..h {
            for x in 0..w {
                let dx = x.abs_diff(blob_x);
                let dy = y.abs_diff(blob_y);
                let lift = if dx < w / 8 && dy < h / 8 { 24u8 } else { 0 };
                let noise: u8 = self.rng.gen_range(0..6);
                buf[(y * w + x) * 2] = 6 + lift + noise;
            }
        }
    }

    fn day_scene(&mut self, buf: &mut [u8]) {
        let (w, h) = (self.config.width, self.config.height);
        for y in 0..h {
            for x in 0..w {
                let base = 90 + (x * 120 / w) as u8;
                let noise: u8 = self.rng.gen_range(0..4);
                buf[(y * w + x) * 2] = base.saturating_add(noise);
            }
        }
    }
}

impl CaptureSource for SyntheticCapture {
    fn connect(&mut self) -> Result<()> {
        log::info!("capture connected to {} (synthetic)", self.config.source);
        Ok(())
    }

    fn fill_capture(&mut self, buf: &mut [u8]) -> Result<()> {
        let expected = self.config.width * self.config.height * 2;
        if buf.len() != expected {
            return Err(anyhow!(
                "capture buffer length mismatch: expected {}, got {}",
                expected,
                buf.len()
            ));
        }

        // Neutral chroma everywhere; the pipeline drops it anyway.
        for i in (1..buf.len()).step_by(2) {
            buf[i] = 0x80;
        }

        if (self.frame_count / FRAMES_PER_SCENE) % 2 == 0 {
            self.night_scene(buf);
        } else {
            self.day_scene(buf);
        }
        self.frame_count += 1;
        Ok(())
    }

    fn stats(&self) -> CaptureStats {
        CaptureStats {
            frames_captured: self.frame_count,
            source: self.config.source.clone(),
        }
    }
}
