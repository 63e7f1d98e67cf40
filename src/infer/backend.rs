use anyhow::Result;

use crate::plane::QuantTensor;

/// Result of classifying one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Classification {
    /// Dequantized confidence score for the positive class.
    pub score: f32,
}

/// Classifier backend trait.
///
/// Implementations must treat the tensor slice as read-only and
/// ephemeral; the pipeline overwrites it on the next accepted frame.
pub trait Classifier: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// One-time initialization (model load, arena allocation). Must be
    /// called before any `classify`; failure means the backend is unusable.
    fn setup(&mut self) -> Result<()>;

    /// Run inference on a quantized tensor.
    fn classify(&mut self, tensor: &QuantTensor) -> Result<Classification>;
}
