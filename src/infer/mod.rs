//! Classifier collaborator.
//!
//! The pipeline consumes inference strictly through `setup()` /
//! `classify(tensor)`; model loading, tensor arenas and operator sets are
//! the backend's problem. A backend whose setup fails leaves the handle
//! inert: classification degrades to a no-op result instead of crashing
//! the frame loop.

mod backend;
mod stub;

pub use backend::{Classification, Classifier};
pub use stub::StubClassifier;

/// Owns a classifier backend and absorbs its failure modes.
pub struct ClassifierHandle {
    inner: Option<Box<dyn Classifier>>,
}

impl ClassifierHandle {
    /// Run the backend's one-time setup. On failure the handle stays
    /// usable but inert.
    pub fn setup(mut backend: Box<dyn Classifier>) -> Self {
        match backend.setup() {
            Ok(()) => {
                log::info!("classifier '{}' ready", backend.name());
                Self {
                    inner: Some(backend),
                }
            }
            Err(e) => {
                log::error!("classifier setup failed, inference disabled: {}", e);
                Self { inner: None }
            }
        }
    }

    /// Handle with no backend at all (inference disabled by config).
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_ready(&self) -> bool {
        self.inner.is_some()
    }

    /// Classify a tensor. Quietly returns the default result when the
    /// backend is missing; a per-frame backend error is logged and
    /// degraded the same way rather than aborting the loop.
    pub fn classify(&mut self, tensor: &crate::plane::QuantTensor) -> Classification {
        let Some(backend) = self.inner.as_mut() else {
            return Classification::default();
        };
        match backend.classify(tensor) {
            Ok(result) => result,
            Err(e) => {
                log::error!("classifier '{}' failed: {}", backend.name(), e);
                Classification::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::QuantTensor;
    use anyhow::anyhow;

    struct BrokenSetup;

    impl Classifier for BrokenSetup {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn setup(&mut self) -> anyhow::Result<()> {
            Err(anyhow!("arena allocation failed"))
        }

        fn classify(&mut self, _tensor: &QuantTensor) -> anyhow::Result<Classification> {
            panic!("classify must not be reached after failed setup");
        }
    }

    #[test]
    fn failed_setup_degrades_to_inert_handle() {
        let mut handle = ClassifierHandle::setup(Box::new(BrokenSetup));
        assert!(!handle.is_ready());

        let result = handle.classify(&QuantTensor::new_ml());
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn disabled_handle_is_inert() {
        let mut handle = ClassifierHandle::disabled();
        assert!(!handle.is_ready());
        assert_eq!(handle.classify(&QuantTensor::new_ml()).score, 0.0);
    }
}
