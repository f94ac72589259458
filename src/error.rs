use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    #[cfg(feature = "serde")]
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Emit a diagnostic for a rejected call and hand the error back.
    ///
    /// Public entry points use this so that every failure leaves a trace in the log
    /// in addition to the returned `Err`.
    #[inline]
    pub(crate) fn logged(self, op: &'static str) -> Self {
        tracing::warn!(op, error = %self, "rejected call");
        self
    }
}
