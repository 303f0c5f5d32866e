//! Session Registry and async command dispatch.
//!
//! The registry owns the only cross-caller mutable state in the layer: the
//! handle → execution-context map. Handle-validity and size checks happen
//! synchronously on the caller's task; accepted operations are enqueued on the
//! session's mailbox and resolve later, so engine computation never blocks the
//! caller.
//!
//! Destroy is the sole cancellation mechanism. It removes the map entry first
//! (new submissions fail fast with `handle-invalid`), then cancels the worker;
//! queued operations are dropped and their pending results resolve as
//! `handle-invalid`. A destroy racing a push on the same handle therefore
//! yields either a clean rejection or a last executed command, never both and
//! never undefined behavior.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::constants::push::MAX_SAMPLES_PER_PUSH;
use crate::engine::{AnalyzerBackend, MetricsSnapshot};
use crate::error::{AnalyzerError, Result};
use crate::session::worker::{spawn_worker, SessionCommand};
use crate::types::SessionHandle;

struct SessionEntry {
    tx: mpsc::UnboundedSender<SessionCommand>,
    cancel: CancellationToken,
}

/// Owner of all live analyzer sessions.
pub struct SessionRegistry {
    backend: Arc<dyn AnalyzerBackend>,
    sessions: DashMap<u64, SessionEntry>,
    next_handle: AtomicU64,
}

impl SessionRegistry {
    /// Create a registry backed by the given engine implementation.
    pub fn new(backend: Arc<dyn AnalyzerBackend>) -> Self {
        Self {
            backend,
            sessions: DashMap::new(),
            // Zero is reserved for "no session"; handles start at 1 and are
            // never reused.
            next_handle: AtomicU64::new(1),
        }
    }

    /// Create a new session from a raw options bag.
    ///
    /// Validation runs before the engine allocates anything; a failure never
    /// issues a handle. If the bag carries `windowSeconds`, the horizon is
    /// applied to the fresh engine before the handle becomes visible.
    pub async fn create(&self, fs: f64, options: Value) -> Result<SessionHandle> {
        let config = SessionConfig::from_value(options)?;
        config.validate(fs)?;

        let mut engine = self.backend.create_session(fs, &config)?;
        if let Some(seconds) = config.window_seconds {
            if seconds <= 0.0 {
                return Err(AnalyzerError::WindowInvalid(seconds));
            }
            engine.set_window(seconds)?;
        }

        let handle = SessionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let cancel = CancellationToken::new();
        let tx = spawn_worker(handle, engine, cancel.clone());
        self.sessions.insert(handle.value(), SessionEntry { tx, cancel });

        info!(session = %handle, fs, "analyzer session created");
        Ok(handle)
    }

    /// Append a chunk of samples, optionally anchored at `t0` seconds.
    pub async fn push(
        &self,
        handle: SessionHandle,
        samples: &[f64],
        t0: Option<f64>,
    ) -> Result<()> {
        if samples.is_empty() {
            return Err(AnalyzerError::BufferEmpty);
        }
        if samples.len() > MAX_SAMPLES_PER_PUSH {
            warn!(session = %handle, len = samples.len(), "oversized push rejected");
            return Err(AnalyzerError::BufferTooLarge {
                len: samples.len(),
                max: MAX_SAMPLES_PER_PUSH,
            });
        }
        let (reply, rx) = oneshot::channel();
        self.submit(
            handle,
            SessionCommand::Push {
                samples: samples.to_vec(),
                t0: t0.unwrap_or(0.0),
                reply,
            },
        )?;
        Self::await_reply(handle, rx).await?
    }

    /// Append a chunk of samples with per-sample timestamps.
    ///
    /// Mismatched array lengths are truncated to their common prefix before
    /// the size bound is checked.
    pub async fn push_ts(
        &self,
        handle: SessionHandle,
        samples: &[f64],
        timestamps: &[f64],
    ) -> Result<()> {
        if samples.is_empty() || timestamps.is_empty() {
            return Err(AnalyzerError::BufferEmpty);
        }
        let common = samples.len().min(timestamps.len());
        if common > MAX_SAMPLES_PER_PUSH {
            warn!(session = %handle, len = common, "oversized timestamped push rejected");
            return Err(AnalyzerError::BufferTooLarge {
                len: common,
                max: MAX_SAMPLES_PER_PUSH,
            });
        }
        let (reply, rx) = oneshot::channel();
        self.submit(
            handle,
            SessionCommand::PushTs {
                samples: samples[..common].to_vec(),
                timestamps: timestamps[..common].to_vec(),
                reply,
            },
        )?;
        Self::await_reply(handle, rx).await?
    }

    /// Latest snapshot for the session, or `None` while no snapshot exists.
    pub async fn poll(&self, handle: SessionHandle) -> Result<Option<MetricsSnapshot>> {
        let (reply, rx) = oneshot::channel();
        self.submit(handle, SessionCommand::Poll { reply })?;
        Self::await_reply(handle, rx).await?
    }

    /// Change the session's retained-history horizon.
    pub async fn set_window(&self, handle: SessionHandle, seconds: f64) -> Result<()> {
        if seconds <= 0.0 {
            return Err(AnalyzerError::WindowInvalid(seconds));
        }
        let (reply, rx) = oneshot::channel();
        self.submit(handle, SessionCommand::SetWindow { seconds, reply })?;
        Self::await_reply(handle, rx).await?
    }

    /// Destroy a session. Idempotent: handle 0, unknown, and already-destroyed
    /// handles all succeed.
    pub async fn destroy(&self, handle: SessionHandle) -> Result<()> {
        if handle.is_none() {
            return Ok(());
        }
        if let Some((_, entry)) = self.sessions.remove(&handle.value()) {
            // Remove-then-cancel: new submissions already fail, queued ones
            // are dropped when the worker stops taking commands.
            entry.cancel.cancel();
            info!(session = %handle, "analyzer session destroyed");
        } else {
            debug!(session = %handle, "destroy on unknown handle ignored");
        }
        Ok(())
    }

    /// Number of currently live sessions.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Enqueue a command on the session's mailbox.
    ///
    /// Fails synchronously when the handle is zero, unknown, or its worker is
    /// already gone. The map reference is released before any await point.
    fn submit(&self, handle: SessionHandle, cmd: SessionCommand) -> Result<()> {
        if handle.is_none() {
            return Err(AnalyzerError::HandleInvalid(0));
        }
        let tx = match self.sessions.get(&handle.value()) {
            Some(entry) => entry.tx.clone(),
            None => return Err(AnalyzerError::HandleInvalid(handle.value())),
        };
        tx.send(cmd)
            .map_err(|_| AnalyzerError::HandleInvalid(handle.value()))
    }

    /// Resolve a pending result. A dropped reply channel means the session
    /// was destroyed while the command was queued.
    async fn await_reply<T>(handle: SessionHandle, rx: oneshot::Receiver<T>) -> Result<T> {
        rx.await
            .map_err(|_| AnalyzerError::HandleInvalid(handle.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AnalyzerEngine, QualityBlock};
    use serde_json::json;
    use std::time::Duration;

    /// Scripted engine: accumulates pushed samples and reports them back
    /// through the snapshot so ordering is observable.
    struct ScriptedEngine {
        pushed: Vec<f64>,
        push_delay: Duration,
        fail_pushes: bool,
    }

    impl ScriptedEngine {
        fn snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                bpm: 60.0,
                rr_list: self.pushed.clone(),
                quality: QualityBlock {
                    total_beats: self.pushed.len() as u32,
                    good_quality: true,
                    ..Default::default()
                },
                ..Default::default()
            }
        }
    }

    impl AnalyzerEngine for ScriptedEngine {
        fn push(&mut self, samples: &[f64], _t0: f64) -> Result<()> {
            if self.fail_pushes {
                return Err(AnalyzerError::Internal("scripted engine failure".into()));
            }
            if !self.push_delay.is_zero() {
                std::thread::sleep(self.push_delay);
            }
            self.pushed.extend_from_slice(samples);
            Ok(())
        }

        fn push_ts(&mut self, samples: &[f64], _timestamps: &[f64]) -> Result<()> {
            self.pushed.extend_from_slice(samples);
            Ok(())
        }

        fn poll(&mut self) -> Result<Option<MetricsSnapshot>> {
            if self.pushed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(self.snapshot()))
            }
        }

        fn set_window(&mut self, _window_seconds: f64) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct ScriptedBackend {
        push_delay: Duration,
        fail_create: bool,
        fail_pushes: bool,
    }

    impl AnalyzerBackend for ScriptedBackend {
        fn create_session(
            &self,
            _fs: f64,
            _config: &SessionConfig,
        ) -> Result<Box<dyn AnalyzerEngine>> {
            if self.fail_create {
                return Err(AnalyzerError::CreateFailed("scripted allocation failure".into()));
            }
            Ok(Box::new(ScriptedEngine {
                pushed: Vec::new(),
                push_delay: self.push_delay,
                fail_pushes: self.fail_pushes,
            }))
        }

        fn analyze(
            &self,
            signal: &[f64],
            _fs: f64,
            _config: &SessionConfig,
        ) -> Result<MetricsSnapshot> {
            Ok(MetricsSnapshot {
                bpm: signal.len() as f64,
                ..Default::default()
            })
        }

        fn analyze_rr(&self, rr: &[f64], _config: &SessionConfig) -> Result<MetricsSnapshot> {
            Ok(MetricsSnapshot {
                rr_list: rr.to_vec(),
                ..Default::default()
            })
        }

        fn analyze_segmentwise(
            &self,
            signal: &[f64],
            fs: f64,
            config: &SessionConfig,
        ) -> Result<MetricsSnapshot> {
            self.analyze(signal, fs, config)
        }
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Arc::new(ScriptedBackend::default()))
    }

    #[tokio::test]
    async fn create_then_destroy_then_use_fails() {
        let reg = registry();
        let h = reg.create(100.0, json!({})).await.unwrap();
        assert!(!h.is_none());
        reg.destroy(h).await.unwrap();

        let err = reg.push(h, &[1.0, 2.0], None).await.unwrap_err();
        assert_eq!(err.code(), "handle-invalid");
        let err = reg.poll(h).await.unwrap_err();
        assert_eq!(err.code(), "handle-invalid");
    }

    #[tokio::test]
    async fn destroy_is_idempotent() {
        let reg = registry();
        let h = reg.create(100.0, json!({})).await.unwrap();
        reg.destroy(h).await.unwrap();
        reg.destroy(h).await.unwrap();
        reg.destroy(SessionHandle::NONE).await.unwrap();
        reg.destroy(SessionHandle(9999)).await.unwrap();
    }

    #[tokio::test]
    async fn handles_are_never_reused() {
        let reg = registry();
        let h1 = reg.create(100.0, json!({})).await.unwrap();
        reg.destroy(h1).await.unwrap();
        let h2 = reg.create(100.0, json!({})).await.unwrap();
        assert_ne!(h1, h2);
        assert!(h2.value() > h1.value());
    }

    #[tokio::test]
    async fn pushes_are_visible_in_order() {
        let reg = registry();
        let h = reg.create(100.0, json!({})).await.unwrap();

        reg.push(h, &[1.0], None).await.unwrap();
        reg.push(h, &[2.0], None).await.unwrap();
        reg.push(h, &[3.0], None).await.unwrap();

        let snapshot = reg.poll(h).await.unwrap().unwrap();
        // A poll after p1..p3 complete sees all of them, in order.
        assert_eq!(snapshot.rr_list, vec![1.0, 2.0, 3.0]);
        reg.destroy(h).await.unwrap();
    }

    #[tokio::test]
    async fn poll_before_first_snapshot_is_none_not_error() {
        let reg = registry();
        let h = reg.create(100.0, json!({})).await.unwrap();
        assert!(reg.poll(h).await.unwrap().is_none());
        reg.destroy(h).await.unwrap();
    }

    #[tokio::test]
    async fn push_size_boundaries() {
        let reg = registry();
        let h = reg.create(100.0, json!({})).await.unwrap();

        let ok = vec![0.0; MAX_SAMPLES_PER_PUSH];
        reg.push(h, &ok, None).await.unwrap();

        let too_big = vec![0.0; MAX_SAMPLES_PER_PUSH + 1];
        let err = reg.push(h, &too_big, None).await.unwrap_err();
        assert_eq!(err.code(), "buffer-too-large");

        let err = reg.push(h, &[], None).await.unwrap_err();
        assert_eq!(err.code(), "buffer-empty");
        reg.destroy(h).await.unwrap();
    }

    #[tokio::test]
    async fn push_ts_truncates_to_common_prefix() {
        let reg = registry();
        let h = reg.create(100.0, json!({})).await.unwrap();

        reg.push_ts(h, &[1.0, 2.0, 3.0], &[0.0, 0.01]).await.unwrap();
        let snapshot = reg.poll(h).await.unwrap().unwrap();
        assert_eq!(snapshot.rr_list, vec![1.0, 2.0]);

        let err = reg.push_ts(h, &[], &[0.0]).await.unwrap_err();
        assert_eq!(err.code(), "buffer-empty");

        // An oversized pair truncated to a compliant prefix is accepted.
        let long = vec![0.0; MAX_SAMPLES_PER_PUSH + 100];
        let ts = vec![0.0; 10];
        reg.push_ts(h, &long, &ts).await.unwrap();
        reg.destroy(h).await.unwrap();
    }

    #[tokio::test]
    async fn invalid_config_never_creates_a_session() {
        let reg = registry();
        let err = reg.create(0.999, json!({})).await.unwrap_err();
        assert_eq!(err.code(), "rate-out-of-range");
        let err = reg.create(10001.0, json!({})).await.unwrap_err();
        assert_eq!(err.code(), "rate-out-of-range");
        let err = reg
            .create(100.0, json!({ "peak": { "bpmMin": 240.0, "bpmMax": 30.0 } }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "bpm-range-invalid");
        assert_eq!(reg.active_sessions(), 0);
    }

    #[tokio::test]
    async fn engine_create_failure_returns_error_not_handle() {
        let backend = ScriptedBackend {
            fail_create: true,
            ..Default::default()
        };
        let reg = SessionRegistry::new(Arc::new(backend));
        let err = reg.create(100.0, json!({})).await.unwrap_err();
        assert_eq!(err.code(), "create-failed");
        assert_eq!(reg.active_sessions(), 0);
    }

    #[tokio::test]
    async fn engine_failure_does_not_wedge_the_session() {
        let backend = ScriptedBackend {
            fail_pushes: true,
            ..Default::default()
        };
        let reg = SessionRegistry::new(Arc::new(backend));
        let h = reg.create(100.0, json!({})).await.unwrap();

        let err = reg.push(h, &[1.0], None).await.unwrap_err();
        assert_eq!(err.code(), "internal-failure");
        // The context keeps serving subsequent operations.
        assert!(reg.poll(h).await.unwrap().is_none());
        reg.destroy(h).await.unwrap();
    }

    #[tokio::test]
    async fn window_seconds_validated() {
        let reg = registry();
        let h = reg.create(100.0, json!({})).await.unwrap();
        let err = reg.set_window(h, 0.0).await.unwrap_err();
        assert_eq!(err.code(), "window-invalid");
        reg.set_window(h, 30.0).await.unwrap();

        let err = reg.create(100.0, json!({ "windowSeconds": -1.0 })).await.unwrap_err();
        assert_eq!(err.code(), "window-invalid");
        reg.destroy(h).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sessions_are_isolated() {
        let reg = Arc::new(registry());
        let h1 = reg.create(100.0, json!({})).await.unwrap();
        let h2 = reg.create(100.0, json!({})).await.unwrap();

        let r1 = reg.clone();
        let r2 = reg.clone();
        let t1 = tokio::spawn(async move {
            for i in 0..50 {
                r1.push(h1, &[i as f64], None).await.unwrap();
            }
        });
        let t2 = tokio::spawn(async move {
            for i in 0..50 {
                r2.push(h2, &[1000.0 + i as f64], None).await.unwrap();
            }
        });
        t1.await.unwrap();
        t2.await.unwrap();

        let s1 = reg.poll(h1).await.unwrap().unwrap();
        let s2 = reg.poll(h2).await.unwrap().unwrap();
        assert_eq!(s1.rr_list.len(), 50);
        assert_eq!(s2.rr_list.len(), 50);
        assert!(s1.rr_list.iter().all(|v| *v < 1000.0));
        assert!(s2.rr_list.iter().all(|v| *v >= 1000.0));

        reg.destroy(h1).await.unwrap();
        reg.destroy(h2).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn destroy_cancels_queued_operations() {
        let backend = ScriptedBackend {
            push_delay: Duration::from_millis(20),
            ..Default::default()
        };
        let reg = Arc::new(SessionRegistry::new(Arc::new(backend)));
        let h = reg.create(100.0, json!({})).await.unwrap();

        // Queue several slow pushes without awaiting them.
        let mut pending = Vec::new();
        for _ in 0..10 {
            let reg = reg.clone();
            pending.push(tokio::spawn(
                async move { reg.push(h, &[1.0], None).await },
            ));
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        reg.destroy(h).await.unwrap();

        let mut rejected = 0;
        for outcome in futures::future::join_all(pending).await {
            match outcome.unwrap() {
                Ok(()) => {}
                Err(e) => {
                    assert_eq!(e.code(), "handle-invalid");
                    rejected += 1;
                }
            }
        }
        // With ten 20 ms pushes queued and an early destroy, at least one
        // queued operation must have been discarded.
        assert!(rejected > 0);
    }
}
