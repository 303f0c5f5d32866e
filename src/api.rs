//! One-shot analysis entry points.
//!
//! Stateless pass-throughs over [`AnalyzerBackend`]: no session, no handle,
//! no execution context. Each operation has a sync and an async variant and
//! can deliver either the generic or the typed result shape. The async
//! variants run the engine call on the blocking pool so the caller's task is
//! never stalled by computation.

use std::sync::Arc;

use serde_json::Value;

use crate::config::SessionConfig;
use crate::engine::AnalyzerBackend;
use crate::error::{ErrorContext, Result};
use crate::marshal::{self, TypedMetrics};

/// Analyze a complete signal; generic result shape.
pub fn analyze(
    backend: &dyn AnalyzerBackend,
    signal: &[f64],
    fs: f64,
    options: Value,
) -> Result<Value> {
    let config = SessionConfig::from_value(options)?;
    let snapshot = backend.analyze(signal, fs, &config)?;
    Ok(marshal::to_generic(&snapshot))
}

/// Analyze a complete signal; typed result shape.
pub fn analyze_typed(
    backend: &dyn AnalyzerBackend,
    signal: &[f64],
    fs: f64,
    options: Value,
) -> Result<TypedMetrics> {
    let config = SessionConfig::from_value(options)?;
    let snapshot = backend.analyze(signal, fs, &config)?;
    Ok(marshal::to_typed(&snapshot))
}

/// Analyze a pre-extracted RR interval list (ms); generic result shape.
pub fn analyze_rr(
    backend: &dyn AnalyzerBackend,
    rr_intervals: &[f64],
    options: Value,
) -> Result<Value> {
    let config = SessionConfig::from_value(options)?;
    let snapshot = backend.analyze_rr(rr_intervals, &config)?;
    Ok(marshal::to_generic(&snapshot))
}

/// Analyze a pre-extracted RR interval list (ms); typed result shape.
pub fn analyze_rr_typed(
    backend: &dyn AnalyzerBackend,
    rr_intervals: &[f64],
    options: Value,
) -> Result<TypedMetrics> {
    let config = SessionConfig::from_value(options)?;
    let snapshot = backend.analyze_rr(rr_intervals, &config)?;
    Ok(marshal::to_typed(&snapshot))
}

/// Analyze a complete signal in overlapping segments; generic result shape.
pub fn analyze_segmentwise(
    backend: &dyn AnalyzerBackend,
    signal: &[f64],
    fs: f64,
    options: Value,
) -> Result<Value> {
    let config = SessionConfig::from_value(options)?;
    let snapshot = backend.analyze_segmentwise(signal, fs, &config)?;
    Ok(marshal::to_generic(&snapshot))
}

/// Analyze a complete signal in overlapping segments; typed result shape.
pub fn analyze_segmentwise_typed(
    backend: &dyn AnalyzerBackend,
    signal: &[f64],
    fs: f64,
    options: Value,
) -> Result<TypedMetrics> {
    let config = SessionConfig::from_value(options)?;
    let snapshot = backend.analyze_segmentwise(signal, fs, &config)?;
    Ok(marshal::to_typed(&snapshot))
}

async fn run_blocking<T, F>(op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .with_static_context("analysis task failed")?
}

/// Async variant of [`analyze`].
pub async fn analyze_async(
    backend: Arc<dyn AnalyzerBackend>,
    signal: Vec<f64>,
    fs: f64,
    options: Value,
) -> Result<Value> {
    run_blocking(move || analyze(backend.as_ref(), &signal, fs, options)).await
}

/// Async variant of [`analyze_typed`].
pub async fn analyze_typed_async(
    backend: Arc<dyn AnalyzerBackend>,
    signal: Vec<f64>,
    fs: f64,
    options: Value,
) -> Result<TypedMetrics> {
    run_blocking(move || analyze_typed(backend.as_ref(), &signal, fs, options)).await
}

/// Async variant of [`analyze_rr`].
pub async fn analyze_rr_async(
    backend: Arc<dyn AnalyzerBackend>,
    rr_intervals: Vec<f64>,
    options: Value,
) -> Result<Value> {
    run_blocking(move || analyze_rr(backend.as_ref(), &rr_intervals, options)).await
}

/// Async variant of [`analyze_rr_typed`].
pub async fn analyze_rr_typed_async(
    backend: Arc<dyn AnalyzerBackend>,
    rr_intervals: Vec<f64>,
    options: Value,
) -> Result<TypedMetrics> {
    run_blocking(move || analyze_rr_typed(backend.as_ref(), &rr_intervals, options)).await
}

/// Async variant of [`analyze_segmentwise`].
pub async fn analyze_segmentwise_async(
    backend: Arc<dyn AnalyzerBackend>,
    signal: Vec<f64>,
    fs: f64,
    options: Value,
) -> Result<Value> {
    run_blocking(move || analyze_segmentwise(backend.as_ref(), &signal, fs, options)).await
}

/// Async variant of [`analyze_segmentwise_typed`].
pub async fn analyze_segmentwise_typed_async(
    backend: Arc<dyn AnalyzerBackend>,
    signal: Vec<f64>,
    fs: f64,
    options: Value,
) -> Result<TypedMetrics> {
    run_blocking(move || analyze_segmentwise_typed(backend.as_ref(), &signal, fs, options)).await
}
