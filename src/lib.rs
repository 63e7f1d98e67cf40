//! nightsight — software night-vision frame pipeline.
//!
//! Turns a raw 4:2:2 camera transfer into a gated, resized,
//! contrast-boosted, int8-quantized tensor ready for a classifier, and
//! persists normalized frames to a bounded ring of PGM files for field
//! verification.
//!
//! # Data flow
//!
//! Capture completion (producer) -> luma extraction -> double-buffered
//! `PlaneExchange` publish. The `Pipeline` driver (consumer) polls the
//! exchange; on a new frame it runs statistics -> gate -> bilinear
//! resample -> contrast normalize -> sampled dump/save -> classify.
//!
//! # Module structure
//!
//! - `plane`: fixed, startup-allocated frame storage
//! - `extract`: 4:2:2 -> grayscale plane
//! - `stats`: per-frame min/max/mean and the admission gate
//! - `resample`: bilinear downsample to the 96x96 ML plane
//! - `contrast`: adaptive "night boost" stretch and quantization
//! - `ring`: rotating on-disk PGM store
//! - `exchange`: producer/consumer double-buffer handoff
//! - `capture`: camera-controller stand-ins (`stub://` scenes)
//! - `infer`: classifier collaborator seam
//! - `pipeline`: the polling driver tying the stages together

pub mod capture;
pub mod config;
pub mod contrast;
pub mod dump;
pub mod exchange;
pub mod extract;
pub mod infer;
pub mod pipeline;
pub mod plane;
pub mod resample;
pub mod ring;
pub mod stats;

pub use capture::{open_source, spawn_capture, CaptureConfig, CaptureSource, SyntheticCapture};
pub use config::PipelineConfig;
pub use contrast::{ContrastOutcome, ContrastPolicy};
pub use exchange::{FrameView, PlaneExchange};
pub use extract::extract_luma;
pub use infer::{Classification, Classifier, ClassifierHandle, StubClassifier};
pub use pipeline::{FrameOutcome, Pipeline};
pub use plane::{LumaPlane, QuantTensor, ML_DIM};
pub use resample::resample_bilinear;
pub use ring::{read_pgm, FrameRing, DEFAULT_RING_SLOTS};
pub use stats::{GatePolicy, PlaneStats};
