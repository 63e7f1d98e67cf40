use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::CaptureConfig;
use crate::ring::DEFAULT_RING_SLOTS;

const DEFAULT_SOURCE: &str = "stub://night_yard";
const DEFAULT_CAM_WIDTH: usize = 320;
const DEFAULT_CAM_HEIGHT: usize = 240;
const DEFAULT_CAM_FPS: u32 = 10;
const DEFAULT_DARK_FLOOR: u8 = 2;
const DEFAULT_BRIGHT_MEAN: u8 = 60;
const DEFAULT_FLAT_RANGE: u8 = 10;
const DEFAULT_RING_DIR: &str = "frames";
const DEFAULT_SAVE_INTERVAL: u64 = 2;
const DEFAULT_DUMP_INTERVAL: u64 = 0; // disabled
const DEFAULT_LOG_SAMPLE_INTERVAL: u64 = 50;
const DEFAULT_POLL_MS: u64 = 100;

#[derive(Debug, Deserialize, Default)]
struct PipelineConfigFile {
    capture: Option<CaptureConfigFile>,
    thresholds: Option<ThresholdConfigFile>,
    ring: Option<RingConfigFile>,
    dump_interval: Option<u64>,
    log_sample_interval: Option<u64>,
    poll_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    source: Option<String>,
    width: Option<usize>,
    height: Option<usize>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ThresholdConfigFile {
    dark_floor: Option<u8>,
    bright_mean: Option<u8>,
    flat_range: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
struct RingConfigFile {
    dir: Option<PathBuf>,
    slots: Option<usize>,
    save_interval: Option<u64>,
}

/// Resolved pipeline configuration.
///
/// The brightness thresholds are policy constants tuned empirically for
/// one sensor and scene; they are configuration here, not fixed law.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub capture: CaptureConfig,
    /// Frames with mean strictly below this are rejected by the gate.
    pub dark_floor: u8,
    /// Pre-resize mean above which the contrast boost is skipped.
    pub bright_mean: u8,
    /// Minimum dynamic range worth stretching.
    pub flat_range: u8,
    pub ring_dir: PathBuf,
    pub ring_slots: usize,
    /// Save every Nth processed frame to the ring; 0 disables saves.
    pub save_interval: u64,
    /// Hex-dump every Nth processed frame; 0 disables the dump.
    pub dump_interval: u64,
    /// Sampling period for per-frame log lines.
    pub log_sample_interval: u64,
    /// Consumer idle wait between polls.
    pub poll: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig {
                source: DEFAULT_SOURCE.to_string(),
                width: DEFAULT_CAM_WIDTH,
                height: DEFAULT_CAM_HEIGHT,
                target_fps: DEFAULT_CAM_FPS,
            },
            dark_floor: DEFAULT_DARK_FLOOR,
            bright_mean: DEFAULT_BRIGHT_MEAN,
            flat_range: DEFAULT_FLAT_RANGE,
            ring_dir: PathBuf::from(DEFAULT_RING_DIR),
            ring_slots: DEFAULT_RING_SLOTS,
            save_interval: DEFAULT_SAVE_INTERVAL,
            dump_interval: DEFAULT_DUMP_INTERVAL,
            log_sample_interval: DEFAULT_LOG_SAMPLE_INTERVAL,
            poll: Duration::from_millis(DEFAULT_POLL_MS),
        }
    }
}

impl PipelineConfig {
    /// Load from the file named by `NIGHTSIGHT_CONFIG` (if set), then
    /// apply `NIGHTSIGHT_*` env overrides, then validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("NIGHTSIGHT_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Load from an explicit path (CLI override), falling back to
    /// defaults when `path` is `None`.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => PipelineConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: PipelineConfigFile) -> Self {
        let defaults = Self::default();
        let capture = file.capture.unwrap_or_default();
        let thresholds = file.thresholds.unwrap_or_default();
        let ring = file.ring.unwrap_or_default();

        Self {
            capture: CaptureConfig {
                source: capture.source.unwrap_or(defaults.capture.source),
                width: capture.width.unwrap_or(defaults.capture.width),
                height: capture.height.unwrap_or(defaults.capture.height),
                target_fps: capture.target_fps.unwrap_or(defaults.capture.target_fps),
            },
            dark_floor: thresholds.dark_floor.unwrap_or(defaults.dark_floor),
            bright_mean: thresholds.bright_mean.unwrap_or(defaults.bright_mean),
            flat_range: thresholds.flat_range.unwrap_or(defaults.flat_range),
            ring_dir: ring.dir.unwrap_or(defaults.ring_dir),
            ring_slots: ring.slots.unwrap_or(defaults.ring_slots),
            save_interval: ring.save_interval.unwrap_or(defaults.save_interval),
            dump_interval: file.dump_interval.unwrap_or(defaults.dump_interval),
            log_sample_interval: file
                .log_sample_interval
                .unwrap_or(defaults.log_sample_interval),
            poll: file
                .poll_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(source) = std::env::var("NIGHTSIGHT_SOURCE") {
            if !source.trim().is_empty() {
                self.capture.source = source;
            }
        }
        if let Ok(dir) = std::env::var("NIGHTSIGHT_RING_DIR") {
            if !dir.trim().is_empty() {
                self.ring_dir = PathBuf::from(dir);
            }
        }
        if let Ok(floor) = std::env::var("NIGHTSIGHT_DARK_FLOOR") {
            self.dark_floor = floor
                .parse()
                .map_err(|_| anyhow!("NIGHTSIGHT_DARK_FLOOR must be 0..=255"))?;
        }
        if let Ok(mean) = std::env::var("NIGHTSIGHT_BRIGHT_MEAN") {
            self.bright_mean = mean
                .parse()
                .map_err(|_| anyhow!("NIGHTSIGHT_BRIGHT_MEAN must be 0..=255"))?;
        }
        if let Ok(poll) = std::env::var("NIGHTSIGHT_POLL_MS") {
            let ms: u64 = poll
                .parse()
                .map_err(|_| anyhow!("NIGHTSIGHT_POLL_MS must be an integer of milliseconds"))?;
            self.poll = Duration::from_millis(ms);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.capture.width < 2 || self.capture.height < 2 {
            return Err(anyhow!(
                "capture geometry {}x{} too small",
                self.capture.width,
                self.capture.height
            ));
        }
        if self.capture.width % 2 != 0 {
            // 4:2:2 packs two pixels per chroma pair.
            return Err(anyhow!("capture width must be even for 4:2:2"));
        }
        if self.ring_slots == 0 {
            return Err(anyhow!("ring slots must be greater than zero"));
        }
        if self.log_sample_interval == 0 {
            return Err(anyhow!("log sample interval must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<PipelineConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
