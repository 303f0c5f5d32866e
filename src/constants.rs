//! Domain constants for the analyzer session layer.
//!
//! Compile-time constants, separated from anything runtime-configurable so the
//! fixed contract bounds are easy to audit in one place.

/// Per-call limits on the streaming push path.
pub mod push {
    /// Maximum number of samples accepted by a single push call.
    pub const MAX_SAMPLES_PER_PUSH: usize = 5000;
}

/// Configuration validation ranges.
pub mod validation {
    /// Minimum accepted sample rate in Hz.
    pub const MIN_SAMPLE_RATE_HZ: f64 = 1.0;

    /// Maximum accepted sample rate in Hz.
    pub const MAX_SAMPLE_RATE_HZ: f64 = 10000.0;

    /// Minimum accepted FFT size.
    pub const MIN_NFFT: usize = 64;

    /// Maximum accepted FFT size.
    pub const MAX_NFFT: usize = 16384;

    /// Lowest accepted BPM bound.
    pub const MIN_BPM: f64 = 30.0;

    /// Highest accepted BPM bound.
    pub const MAX_BPM: f64 = 240.0;

    /// Minimum accepted refractory period in milliseconds.
    pub const MIN_REFRACTORY_MS: f64 = 50.0;

    /// Maximum accepted refractory period in milliseconds.
    pub const MAX_REFRACTORY_MS: f64 = 2000.0;
}

/// Out-of-band sample relay bounds.
pub mod relay {
    /// Maximum number of samples retained in the relay ring.
    pub const CAPACITY: usize = 300;

    /// Maximum number of entries removed by a single drain call.
    pub const MAX_DRAIN: usize = 1000;
}

/// Polled-result constants.
pub mod snapshot {
    /// Placeholder window start for polled snapshots. The engine does not yet
    /// report the real window origin; callers must not interpret this value.
    pub const WINDOW_START_PLACEHOLDER: f64 = 0.0;
}
