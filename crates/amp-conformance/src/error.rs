//! Error types for the conformance harness

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that stop a scenario before it can produce a pass/fail verdict
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// No accelerator can run kernels over the element type
    #[error("No compatible accelerator for element type {element}: {reason}")]
    NoCompatibleDevice { element: &'static str, reason: String },

    /// Harness configuration could not be parsed
    #[error("Invalid harness configuration: {0}")]
    InvalidConfig(String),

    /// Error from the runtime under test
    #[error(transparent)]
    Core(#[from] amp_core::Error),
}

impl From<amp_backends::BackendError> for HarnessError {
    fn from(e: amp_backends::BackendError) -> Self {
        Self::Core(e.into())
    }
}
