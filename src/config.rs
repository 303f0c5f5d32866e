//! Session configuration: the options bag, defaults, and validation.
//!
//! A session is configured from a loosely-typed JSON bag. Every field has a
//! documented default and only the keys actually supplied override it; a
//! partially-populated nested group merges key-by-key over the group defaults,
//! so omitting a sibling key never clears the rest of its group. Unknown keys
//! are ignored for forward compatibility.
//!
//! Validation runs before any engine resource is allocated. Each rule is
//! independent and yields its own error code.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::validation::*;
use crate::error::{AnalyzerError, Result};

/// Bandpass filter parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandpassConfig {
    /// Lower corner frequency in Hz.
    #[serde(default = "defaults::low_hz")]
    pub low_hz: f64,
    /// Upper corner frequency in Hz.
    #[serde(default = "defaults::high_hz")]
    pub high_hz: f64,
    /// Filter order.
    #[serde(default = "defaults::order")]
    pub order: u32,
}

impl Default for BandpassConfig {
    fn default() -> Self {
        Self {
            low_hz: defaults::low_hz(),
            high_hz: defaults::high_hz(),
            order: defaults::order(),
        }
    }
}

/// Welch PSD estimation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelchConfig {
    /// FFT size.
    #[serde(default = "defaults::nfft")]
    pub nfft: usize,
    /// Segment overlap fraction in [0, 1).
    #[serde(default = "defaults::overlap")]
    pub overlap: f64,
    /// Analysis window length in seconds.
    #[serde(default = "defaults::wsize_sec")]
    pub wsize_sec: f64,
}

impl Default for WelchConfig {
    fn default() -> Self {
        Self {
            nfft: defaults::nfft(),
            overlap: defaults::overlap(),
            wsize_sec: defaults::wsize_sec(),
        }
    }
}

/// Peak detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakConfig {
    /// Refractory period in milliseconds.
    #[serde(default = "defaults::refractory_ms")]
    pub refractory_ms: f64,
    /// Detection threshold scale factor.
    #[serde(default = "defaults::threshold_scale")]
    pub threshold_scale: f64,
    /// Lower plausible heart rate bound.
    #[serde(default = "defaults::bpm_min")]
    pub bpm_min: f64,
    /// Upper plausible heart rate bound.
    #[serde(default = "defaults::bpm_max")]
    pub bpm_max: f64,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            refractory_ms: defaults::refractory_ms(),
            threshold_scale: defaults::threshold_scale(),
            bpm_min: defaults::bpm_min(),
            bpm_max: defaults::bpm_max(),
        }
    }
}

/// Filter topology selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "rbj")]
    Rbj,
    #[serde(rename = "butter")]
    Butter,
    #[serde(rename = "butter-filtfilt")]
    ButterFiltfilt,
}

impl Default for FilterMode {
    fn default() -> Self {
        FilterMode::Auto
    }
}

/// Filter selection parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// Topology selector.
    #[serde(default)]
    pub mode: FilterMode,
    /// Optional order override; falls back to the bandpass order when absent.
    #[serde(default)]
    pub order: Option<u32>,
}

/// Signal preprocessing toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessingConfig {
    #[serde(default)]
    pub interp_clipping: bool,
    #[serde(default = "defaults::clipping_threshold")]
    pub clipping_threshold: f64,
    #[serde(default)]
    pub hampel_correct: bool,
    #[serde(default = "defaults::hampel_window")]
    pub hampel_window: u32,
    #[serde(default = "defaults::hampel_threshold")]
    pub hampel_threshold: f64,
    #[serde(default)]
    pub remove_baseline_wander: bool,
    #[serde(default)]
    pub enhance_peaks: bool,
    #[serde(default)]
    pub scale_data: bool,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            interp_clipping: false,
            clipping_threshold: defaults::clipping_threshold(),
            hampel_correct: false,
            hampel_window: defaults::hampel_window(),
            hampel_threshold: defaults::hampel_threshold(),
            remove_baseline_wander: false,
            enhance_peaks: false,
            scale_data: false,
        }
    }
}

/// RR interval cleaning method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CleanMethod {
    #[serde(rename = "quotient-filter")]
    QuotientFilter,
    #[serde(rename = "iqr")]
    Iqr,
    #[serde(rename = "z-score")]
    ZScore,
}

impl Default for CleanMethod {
    fn default() -> Self {
        CleanMethod::QuotientFilter
    }
}

/// Quality assessment and RR cleaning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityConfig {
    #[serde(default)]
    pub reject_segmentwise: bool,
    #[serde(default = "defaults::segment_reject_threshold")]
    pub segment_reject_threshold: f64,
    #[serde(default = "defaults::segment_reject_max_rejects")]
    pub segment_reject_max_rejects: u32,
    #[serde(default = "defaults::segment_reject_window_beats")]
    pub segment_reject_window_beats: u32,
    #[serde(default)]
    pub segment_reject_overlap: f64,
    #[serde(default)]
    pub clean_rr: bool,
    #[serde(default)]
    pub clean_method: CleanMethod,
    #[serde(default)]
    pub threshold_rr: bool,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            reject_segmentwise: false,
            segment_reject_threshold: defaults::segment_reject_threshold(),
            segment_reject_max_rejects: defaults::segment_reject_max_rejects(),
            segment_reject_window_beats: defaults::segment_reject_window_beats(),
            segment_reject_overlap: 0.0,
            clean_rr: false,
            clean_method: CleanMethod::default(),
            threshold_rr: false,
        }
    }
}

/// SDSD computation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdsdMode {
    Signed,
    Abs,
}

impl Default for SdsdMode {
    fn default() -> Self {
        SdsdMode::Abs
    }
}

/// Time-domain metric controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeDomainConfig {
    #[serde(default)]
    pub sdsd_mode: SdsdMode,
    /// true: pNN values reported in 0..100, false: 0..1.
    #[serde(default = "defaults::yes")]
    pub pnn_as_percent: bool,
}

impl Default for TimeDomainConfig {
    fn default() -> Self {
        Self {
            sdsd_mode: SdsdMode::default(),
            pnn_as_percent: true,
        }
    }
}

/// Poincaré computation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoincareMode {
    Formula,
    Masked,
}

impl Default for PoincareMode {
    fn default() -> Self {
        PoincareMode::Masked
    }
}

/// Poincaré analysis controls.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoincareConfig {
    #[serde(default)]
    pub mode: PoincareMode,
}

/// High-precision resampling controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighPrecisionConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "defaults::high_precision_fs")]
    pub target_fs: f64,
}

impl Default for HighPrecisionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target_fs: defaults::high_precision_fs(),
        }
    }
}

/// RR spline smoothing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RrSplineConfig {
    /// Smoothing factor (lambda).
    #[serde(default = "defaults::rr_spline_s")]
    pub s: f64,
    /// Reinsch target SSE.
    #[serde(default)]
    pub target_sse: f64,
    /// Pre-smooth blend in [0, 1].
    #[serde(default = "defaults::rr_spline_smooth")]
    pub smooth: f64,
}

impl Default for RrSplineConfig {
    fn default() -> Self {
        Self {
            s: defaults::rr_spline_s(),
            target_sse: 0.0,
            smooth: defaults::rr_spline_smooth(),
        }
    }
}

/// Segmentwise analysis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentwiseConfig {
    /// Segment width in seconds.
    #[serde(default = "defaults::segment_width")]
    pub width: f64,
    /// Segment overlap fraction in [0, 1).
    #[serde(default)]
    pub overlap: f64,
    /// Minimum usable segment length in seconds.
    #[serde(default = "defaults::segment_min_size")]
    pub min_size: f64,
    #[serde(default)]
    pub replace_outliers: bool,
}

impl Default for SegmentwiseConfig {
    fn default() -> Self {
        Self {
            width: defaults::segment_width(),
            overlap: 0.0,
            min_size: defaults::segment_min_size(),
            replace_outliers: false,
        }
    }
}

/// Immutable snapshot of analysis parameters, fixed at session creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default)]
    pub bandpass: BandpassConfig,
    #[serde(default)]
    pub welch: WelchConfig,
    #[serde(default)]
    pub peak: PeakConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub time_domain: TimeDomainConfig,
    #[serde(default)]
    pub poincare: PoincareConfig,
    #[serde(default)]
    pub high_precision: HighPrecisionConfig,
    #[serde(default)]
    pub rr_spline: RrSplineConfig,
    #[serde(default)]
    pub segmentwise: SegmentwiseConfig,

    /// Global frequency-domain toggle.
    #[serde(default = "defaults::yes")]
    pub calc_freq: bool,
    /// Report breathing rate in breaths/min instead of Hz.
    #[serde(default)]
    pub breathing_as_bpm: bool,
    /// Initial retained-history horizon in seconds, applied at creation.
    #[serde(default)]
    pub window_seconds: Option<f64>,
    /// SNR smoothing time constant in seconds.
    #[serde(default = "defaults::snr_tau_sec")]
    pub snr_tau_sec: f64,
    /// SNR smoothing time constant while actively tracking, in seconds.
    #[serde(default = "defaults::snr_active_tau_sec")]
    pub snr_active_tau_sec: f64,
    /// Adaptive PSD update flag.
    #[serde(default = "defaults::yes")]
    pub adaptive_psd: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bandpass: BandpassConfig::default(),
            welch: WelchConfig::default(),
            peak: PeakConfig::default(),
            filter: FilterConfig::default(),
            preprocessing: PreprocessingConfig::default(),
            quality: QualityConfig::default(),
            time_domain: TimeDomainConfig::default(),
            poincare: PoincareConfig::default(),
            high_precision: HighPrecisionConfig::default(),
            rr_spline: RrSplineConfig::default(),
            segmentwise: SegmentwiseConfig::default(),
            calc_freq: true,
            breathing_as_bpm: false,
            window_seconds: None,
            snr_tau_sec: defaults::snr_tau_sec(),
            snr_active_tau_sec: defaults::snr_active_tau_sec(),
            adaptive_psd: true,
        }
    }
}

impl SessionConfig {
    /// Build a config from a raw JSON bag, merging supplied keys over defaults.
    ///
    /// Unknown keys are ignored. Fails only when a supplied value has the
    /// wrong shape for its key.
    pub fn from_value(bag: Value) -> Result<Self> {
        serde_json::from_value(bag)
            .map_err(|e| AnalyzerError::CreateFailed(format!("malformed options bag: {}", e)))
    }

    /// Range-check the configuration against a sample rate.
    ///
    /// Each rule is independent and yields a distinct error kind. Runs before
    /// any engine resource is allocated; a failure never creates a session.
    pub fn validate(&self, fs: f64) -> Result<()> {
        if !(MIN_SAMPLE_RATE_HZ..=MAX_SAMPLE_RATE_HZ).contains(&fs) {
            return Err(AnalyzerError::RateOutOfRange(fs));
        }
        let bp = &self.bandpass;
        if !(bp.low_hz >= 0.0 && bp.low_hz < bp.high_hz && bp.high_hz <= fs / 2.0) {
            return Err(AnalyzerError::BandpassInvalid {
                low: bp.low_hz,
                high: bp.high_hz,
            });
        }
        if !(MIN_NFFT..=MAX_NFFT).contains(&self.welch.nfft) {
            return Err(AnalyzerError::FftSizeInvalid(self.welch.nfft));
        }
        let pk = &self.peak;
        if !(pk.bpm_min >= MIN_BPM && pk.bpm_min < pk.bpm_max && pk.bpm_max <= MAX_BPM) {
            return Err(AnalyzerError::BpmRangeInvalid {
                min: pk.bpm_min,
                max: pk.bpm_max,
            });
        }
        if !(MIN_REFRACTORY_MS..=MAX_REFRACTORY_MS).contains(&pk.refractory_ms) {
            return Err(AnalyzerError::RefractoryInvalid(pk.refractory_ms));
        }
        Ok(())
    }

    /// Convenience: merge a bag over defaults and validate against `fs`.
    pub fn from_value_validated(bag: Value, fs: f64) -> Result<Self> {
        let config = Self::from_value(bag)?;
        config.validate(fs)?;
        Ok(config)
    }
}

mod defaults {
    pub fn low_hz() -> f64 {
        0.5
    }
    pub fn high_hz() -> f64 {
        5.0
    }
    pub fn order() -> u32 {
        2
    }
    pub fn nfft() -> usize {
        256
    }
    pub fn overlap() -> f64 {
        0.5
    }
    pub fn wsize_sec() -> f64 {
        240.0
    }
    pub fn refractory_ms() -> f64 {
        250.0
    }
    pub fn threshold_scale() -> f64 {
        0.5
    }
    pub fn bpm_min() -> f64 {
        40.0
    }
    pub fn bpm_max() -> f64 {
        180.0
    }
    pub fn clipping_threshold() -> f64 {
        1020.0
    }
    pub fn hampel_window() -> u32 {
        6
    }
    pub fn hampel_threshold() -> f64 {
        3.0
    }
    pub fn segment_reject_threshold() -> f64 {
        0.3
    }
    pub fn segment_reject_max_rejects() -> u32 {
        3
    }
    pub fn segment_reject_window_beats() -> u32 {
        10
    }
    pub fn high_precision_fs() -> f64 {
        1000.0
    }
    pub fn rr_spline_s() -> f64 {
        10.0
    }
    pub fn rr_spline_smooth() -> f64 {
        0.1
    }
    pub fn segment_width() -> f64 {
        120.0
    }
    pub fn segment_min_size() -> f64 {
        20.0
    }
    pub fn snr_tau_sec() -> f64 {
        10.0
    }
    pub fn snr_active_tau_sec() -> f64 {
        7.0
    }
    pub fn yes() -> bool {
        true
    }
}
