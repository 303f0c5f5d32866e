//! The `ppg_rt_analyzer` core library.
//!
//! Session concurrency and lifecycle layer for a streaming PPG/HRV analyzer.
//! The signal math lives behind the [`engine::AnalyzerBackend`] seam; this
//! crate multiplexes independent streaming sessions over it, guarantees
//! per-session operation ordering under concurrent callers, bounds per-push
//! resource usage, validates configuration before any engine resource is
//! allocated, and marshals results into generic and typed shapes.

pub mod api;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod flags;
pub mod marshal;
pub mod observability;
pub mod relay;
pub mod session;
pub mod types;

pub use config::SessionConfig;
pub use engine::{AnalyzerBackend, AnalyzerEngine, MetricsSnapshot, QualityBlock};
pub use error::{AnalyzerError, Result};
pub use marshal::TypedMetrics;
pub use relay::{global_relay, SampleRelay};
pub use session::SessionRegistry;
pub use types::SessionHandle;
