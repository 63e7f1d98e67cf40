use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::infer::backend::{Classification, Classifier};
use crate::plane::QuantTensor;

/// Stub backend for development and tests. Hashes the tensor and reports
/// a fixed confidence whenever the scene changed since the last frame.
pub struct StubClassifier {
    last_hash: Option<[u8; 32]>,
}

impl StubClassifier {
    pub fn new() -> Self {
        Self { last_hash: None }
    }
}

impl Default for StubClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for StubClassifier {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    fn classify(&mut self, tensor: &QuantTensor) -> Result<Classification> {
        let bytes: Vec<u8> = tensor.as_slice().iter().map(|&v| v as u8).collect();
        let current_hash: [u8; 32] = Sha256::digest(&bytes).into();

        let changed = self.last_hash.is_some_and(|prev| prev != current_hash);
        self.last_hash = Some(current_hash);

        Ok(Classification {
            score: if changed { 0.85 } else { 0.0 },
        })
    }
}
