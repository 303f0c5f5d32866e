//! Analyzer Engine seam.
//!
//! The signal math lives behind these traits; this crate only manages session
//! concurrency, lifecycle, and marshaling around it. A [`AnalyzerBackend`] is
//! the process-wide entry point: it builds per-session engine instances and
//! answers stateless one-shot analyses. An [`AnalyzerEngine`] instance is
//! owned by exactly one session worker and is not safe for concurrent access,
//! which is why all calls to it are serialized through the session mailbox.

mod types;

pub use types::{BinarySegment, MetricsSnapshot, QualityBlock};

use crate::config::SessionConfig;
use crate::error::Result;

/// A stateful streaming analyzer instance bound to one session.
///
/// Implementations are driven from a single worker task; `&mut self` reflects
/// that no concurrent access ever happens.
pub trait AnalyzerEngine: Send {
    /// Append a chunk of samples, optionally anchored at start time `t0`
    /// (seconds; 0 means "no timestamp").
    fn push(&mut self, samples: &[f64], t0: f64) -> Result<()>;

    /// Append a chunk of samples with one timestamp per sample.
    ///
    /// Callers guarantee `samples.len() == timestamps.len()`.
    fn push_ts(&mut self, samples: &[f64], timestamps: &[f64]) -> Result<()>;

    /// Latest computed snapshot, or `None` while warm-up has not produced one.
    fn poll(&mut self) -> Result<Option<MetricsSnapshot>>;

    /// Change the retained-history horizon in seconds.
    fn set_window(&mut self, window_seconds: f64) -> Result<()>;
}

/// Factory and one-shot analysis surface for a concrete engine implementation.
pub trait AnalyzerBackend: Send + Sync + 'static {
    /// Allocate a fresh streaming engine instance for a validated config.
    fn create_session(&self, fs: f64, config: &SessionConfig)
        -> Result<Box<dyn AnalyzerEngine>>;

    /// Analyze a complete signal in one pass.
    fn analyze(&self, signal: &[f64], fs: f64, config: &SessionConfig) -> Result<MetricsSnapshot>;

    /// Analyze a pre-extracted RR interval list (milliseconds).
    fn analyze_rr(&self, rr_intervals: &[f64], config: &SessionConfig) -> Result<MetricsSnapshot>;

    /// Analyze a complete signal in overlapping segments.
    fn analyze_segmentwise(
        &self,
        signal: &[f64],
        fs: f64,
        config: &SessionConfig,
    ) -> Result<MetricsSnapshot>;
}
