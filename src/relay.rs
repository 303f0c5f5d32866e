//! Out-of-band sample relay.
//!
//! A bounded multi-producer/multi-consumer buffer holding the most recent raw
//! samples produced outside the session model (camera frame processors and
//! similar), for polling by unrelated consumers. Independent of any session's
//! lifecycle and locking.
//!
//! Overflow follows ring semantics: the oldest entries are dropped first and a
//! producer never blocks. Non-finite values are discarded at insertion time.

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::constants::relay::{CAPACITY, MAX_DRAIN};

#[derive(Debug, Default)]
struct RelayInner {
    samples: VecDeque<f64>,
    timestamps: VecDeque<f64>,
    last_confidence: f64,
}

/// Bounded relay for raw samples, optional parallel timestamps, and a single
/// most-recent confidence scalar.
#[derive(Debug, Default)]
pub struct SampleRelay {
    inner: Mutex<RelayInner>,
}

impl SampleRelay {
    /// Create an empty relay. Most callers want [`global_relay`] instead.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one sample. NaN and infinite values are silently discarded.
    pub fn push_sample(&self, value: f64) {
        if !value.is_finite() {
            return;
        }
        let mut inner = self.inner.lock();
        inner.samples.push_back(value);
        while inner.samples.len() > CAPACITY {
            inner.samples.pop_front();
        }
    }

    /// Insert one sample with its timestamp. Either value being non-finite
    /// discards the pair.
    pub fn push_sample_ts(&self, value: f64, timestamp: f64) {
        if !value.is_finite() || !timestamp.is_finite() {
            return;
        }
        let mut inner = self.inner.lock();
        inner.samples.push_back(value);
        inner.timestamps.push_back(timestamp);
        while inner.samples.len() > CAPACITY {
            inner.samples.pop_front();
        }
        while inner.timestamps.len() > CAPACITY {
            inner.timestamps.pop_front();
        }
    }

    /// Record the most recent confidence, clamped to [0, 1]. Non-finite
    /// values are ignored.
    pub fn set_confidence(&self, confidence: f64) {
        if !confidence.is_finite() {
            return;
        }
        self.inner.lock().last_confidence = confidence.clamp(0.0, 1.0);
    }

    /// Most recently recorded confidence value.
    pub fn last_confidence(&self) -> f64 {
        self.inner.lock().last_confidence
    }

    /// Retrieve and remove up to [`MAX_DRAIN`] samples in arrival order.
    pub fn drain(&self) -> Vec<f64> {
        let mut inner = self.inner.lock();
        let n = inner.samples.len().min(MAX_DRAIN);
        inner.samples.drain(..n).collect()
    }

    /// Retrieve and remove up to [`MAX_DRAIN`] sample/timestamp pairs in
    /// arrival order. Stops at the shorter of the two rings so the returned
    /// arrays always pair up.
    pub fn drain_ts(&self) -> (Vec<f64>, Vec<f64>) {
        let mut inner = self.inner.lock();
        let n = inner
            .samples
            .len()
            .min(inner.timestamps.len())
            .min(MAX_DRAIN);
        let samples = inner.samples.drain(..n).collect();
        let timestamps = inner.timestamps.drain(..n).collect();
        (samples, timestamps)
    }

    /// Current number of buffered samples.
    pub fn len(&self) -> usize {
        self.inner.lock().samples.len()
    }

    /// Whether the sample ring is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().samples.is_empty()
    }
}

static GLOBAL_RELAY: Lazy<SampleRelay> = Lazy::new(SampleRelay::new);

/// Process-wide relay instance shared by out-of-band producers and consumers.
pub fn global_relay() -> &'static SampleRelay {
    &GLOBAL_RELAY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_never_exceeds_capacity() {
        let relay = SampleRelay::new();
        for i in 0..1000 {
            relay.push_sample(i as f64);
        }
        assert_eq!(relay.len(), CAPACITY);
        let drained = relay.drain();
        assert_eq!(drained.len(), CAPACITY);
        // Exactly the last 300 values, in arrival order.
        let expected: Vec<f64> = (700..1000).map(|i| i as f64).collect();
        assert_eq!(drained, expected);
        assert!(relay.is_empty());
    }

    #[test]
    fn non_finite_values_never_stored() {
        let relay = SampleRelay::new();
        relay.push_sample(f64::NAN);
        relay.push_sample(f64::INFINITY);
        relay.push_sample(f64::NEG_INFINITY);
        relay.push_sample(1.5);
        relay.push_sample_ts(2.5, f64::NAN);
        assert_eq!(relay.drain(), vec![1.5]);
    }

    #[test]
    fn timestamped_pairs_stay_aligned() {
        let relay = SampleRelay::new();
        for i in 0..10 {
            relay.push_sample_ts(i as f64, 100.0 + i as f64);
        }
        let (samples, timestamps) = relay.drain_ts();
        assert_eq!(samples.len(), timestamps.len());
        for (s, t) in samples.iter().zip(&timestamps) {
            assert_eq!(t - s, 100.0);
        }
    }

    #[test]
    fn confidence_clamped_and_latest_wins() {
        let relay = SampleRelay::new();
        relay.set_confidence(0.4);
        relay.set_confidence(1.7);
        assert_eq!(relay.last_confidence(), 1.0);
        relay.set_confidence(-0.2);
        assert_eq!(relay.last_confidence(), 0.0);
        relay.set_confidence(f64::NAN);
        assert_eq!(relay.last_confidence(), 0.0);
        relay.set_confidence(0.55);
        assert_eq!(relay.last_confidence(), 0.55);
    }

    #[test]
    fn concurrent_producers_never_block_or_overflow() {
        use std::sync::Arc;
        let relay = Arc::new(SampleRelay::new());
        let mut handles = Vec::new();
        for t in 0..4 {
            let relay = relay.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..500 {
                    relay.push_sample((t * 1000 + i) as f64);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(relay.len(), CAPACITY);
    }
}
