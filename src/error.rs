//! Custom error types for the analyzer session layer.
//!
//! This module provides a centralized error handling system using the `thiserror`
//! crate. Every error carries a stable machine-readable code alongside its
//! human-readable message; callers are expected to match on [`AnalyzerError::code`],
//! never on the message text.

use thiserror::Error;

/// Primary error type for the session layer, covering all possible error cases.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Sample rate outside the accepted [1, 10000] Hz range.
    #[error("Invalid sample rate: {0}. Must be 1-10000 Hz.")]
    RateOutOfRange(f64),

    /// Bandpass corner frequencies violate 0 <= low < high <= fs/2.
    #[error("Invalid bandpass ({low} Hz - {high} Hz): must satisfy 0 <= low < high <= fs/2")]
    BandpassInvalid { low: f64, high: f64 },

    /// FFT size outside the accepted [64, 16384] range.
    #[error("Invalid nfft: {0}. Must be 64-16384.")]
    FftSizeInvalid(usize),

    /// BPM bounds violate 30 <= min < max <= 240.
    #[error("Invalid BPM range ({min} - {max}): must satisfy 30 <= min < max <= 240")]
    BpmRangeInvalid { min: f64, max: f64 },

    /// Refractory period outside the accepted [50, 2000] ms range.
    #[error("Invalid refractory period: {0} ms. Must be 50-2000 ms.")]
    RefractoryInvalid(f64),

    /// The handle is zero, was never issued, or has been destroyed.
    #[error("Invalid or destroyed handle: {0}")]
    HandleInvalid(u64),

    /// Retained-history window must be strictly positive.
    #[error("Invalid windowSeconds: {0}. Must be > 0.")]
    WindowInvalid(f64),

    /// A push was submitted with an empty sample buffer.
    #[error("Invalid data buffer: empty buffer")]
    BufferEmpty,

    /// A push exceeded the per-call sample bound.
    #[error("Invalid data buffer: too large ({len} samples, max {max})")]
    BufferTooLarge { len: usize, max: usize },

    /// The engine failed to initialize a new session instance.
    #[error("Session creation failed: {0}")]
    CreateFailed(String),

    /// Engine/runtime failures surfaced during queued execution, and
    /// marshaling failures. The underlying message is attached.
    #[error("Internal analyzer error: {0}")]
    Internal(String),
}

impl AnalyzerError {
    /// Stable short identifier for this error.
    ///
    /// These strings form the wire-level error contract and never change
    /// between releases.
    pub fn code(&self) -> &'static str {
        match self {
            AnalyzerError::RateOutOfRange(_) => "rate-out-of-range",
            AnalyzerError::BandpassInvalid { .. } => "bandpass-invalid",
            AnalyzerError::FftSizeInvalid(_) => "fft-size-invalid",
            AnalyzerError::BpmRangeInvalid { .. } => "bpm-range-invalid",
            AnalyzerError::RefractoryInvalid(_) => "refractory-invalid",
            AnalyzerError::HandleInvalid(_) => "handle-invalid",
            AnalyzerError::WindowInvalid(_) => "window-invalid",
            AnalyzerError::BufferEmpty => "buffer-empty",
            AnalyzerError::BufferTooLarge { .. } => "buffer-too-large",
            AnalyzerError::CreateFailed(_) => "create-failed",
            AnalyzerError::Internal(_) => "internal-failure",
        }
    }

    /// Whether the error was detected synchronously, before any work was
    /// handed to a session's execution context. Bag parsing, validation, and
    /// engine allocation all run on the caller's task, so only [`Internal`]
    /// failures surface from queued execution.
    ///
    /// [`Internal`]: AnalyzerError::Internal
    pub fn is_pre_dispatch(&self) -> bool {
        !matches!(self, AnalyzerError::Internal(_))
    }
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(e: serde_json::Error) -> Self {
        AnalyzerError::Internal(format!("malformed result representation: {}", e))
    }
}

/// Convenience type alias for Results with AnalyzerError.
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Wrap the error as an internal failure with static context.
    fn with_static_context(self, context: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_static_context(self, context: &'static str) -> Result<T> {
        self.map_err(|e| AnalyzerError::Internal(format!("{}: {}", context, e)))
    }
}
