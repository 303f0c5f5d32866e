//! Canonical analyzer output types.
//!
//! One [`MetricsSnapshot`] is the single source of truth for both external
//! result shapes produced by the marshaler. A snapshot is immutable once the
//! engine hands it over; polling either returns a complete snapshot or none.

use serde::{Deserialize, Serialize};

/// Quality block attached to every snapshot. Recomputed wholesale on each
/// poll, never partially updated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityBlock {
    pub total_beats: u32,
    pub rejected_beats: u32,
    pub rejection_rate: f64,
    pub good_quality: bool,
    /// Omitted from marshaled output when empty.
    pub quality_warning: Option<String>,

    /// Signal-to-noise ratio in dB.
    pub snr_db: f64,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Dominant frequency in Hz.
    pub f0_hz: f64,
    /// Fraction of time the motion-artifact guard was active.
    pub ma_perc_active: f64,

    // Diagnostic flags.
    pub doubling_flag: bool,
    pub soft_doubling_flag: bool,
    pub doubling_hint_flag: bool,
    pub hard_fallback_active: bool,
    pub rr_fallback_mode_active: bool,
    pub snr_warmup_active: bool,
    pub snr_sample_count: u32,

    // Bound values used by the refractory/outlier logic.
    pub refractory_ms_active: f64,
    pub min_rr_bound_ms: f64,
    pub pair_frac: f64,
    pub rr_short_frac: f64,
    pub rr_long_ms: f64,
    pub p_half_over_fund: f64,
}

/// One accepted or rejected analysis segment, addressed in beat indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinarySegment {
    pub start_beat: u32,
    pub end_beat: u32,
    pub total_beats: u32,
    pub rejected_beats: u32,
    pub accepted: bool,
}

/// The engine's most recent computed output for a session.
///
/// Binary array types (peak indices, masks) are carried as integer sequences
/// end to end, never as floating-point approximations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Heart rate in beats per minute.
    pub bpm: f64,

    // Time-domain HRV measures.
    pub sdnn: f64,
    pub rmssd: f64,
    pub sdsd: f64,
    pub pnn20: f64,
    pub pnn50: f64,
    pub nn20: f64,
    pub nn50: f64,
    pub mad: f64,

    // Poincaré analysis.
    pub sd1: f64,
    pub sd2: f64,
    #[serde(rename = "sd1sd2Ratio")]
    pub sd1_sd2_ratio: f64,
    pub ellipse_area: f64,

    // Frequency domain.
    pub vlf: f64,
    pub lf: f64,
    pub hf: f64,
    pub lfhf: f64,
    pub total_power: f64,
    pub lf_norm: f64,
    pub hf_norm: f64,

    /// Breathing rate, in Hz or breaths/min per configuration.
    pub breathing_rate: f64,

    // Per-beat arrays.
    pub ibi_ms: Vec<f64>,
    pub rr_list: Vec<f64>,
    pub peak_list: Vec<u32>,
    pub peak_list_raw: Vec<u32>,
    pub binary_peak_mask: Vec<u8>,
    pub peak_timestamps: Vec<f64>,

    // Waveform samples. External names keep their historical snake_case.
    #[serde(rename = "waveform_values")]
    pub waveform_values: Vec<f64>,
    #[serde(rename = "waveform_timestamps")]
    pub waveform_timestamps: Vec<f64>,

    /// Quality block, always present.
    pub quality: QualityBlock,

    /// Accepted/rejected analysis windows.
    pub binary_segments: Vec<BinarySegment>,

    /// Per-segment results from segmentwise analysis, empty otherwise.
    pub segments: Vec<MetricsSnapshot>,
}
