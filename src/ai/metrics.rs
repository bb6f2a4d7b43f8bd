//! Provider Call Metrics
//!
//! Counts provider calls, tokens and latency per `CallKind` for one CLI run.
//! `MeteredProvider` wraps any provider so pipeline code never records by hand.
//!
//! ## Usage
//!
//! ```ignore
//! let metrics = create_shared_metrics();
//! let provider: SharedProvider = Arc::new(MeteredProvider::new(inner, metrics.clone()));
//! // ... run the pipeline ...
//! println!("{}", metrics.summary().display());
//! ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::ai::provider::{CallKind, CompletionRequest, LlmProvider, LlmResponse, SharedProvider};
use crate::types::Result;

// =============================================================================
// Metrics Collector
// =============================================================================

/// Thread-safe metrics collector.
///
/// Totals are atomics; the per-kind breakdown sits behind an RwLock.
pub struct MetricsCollector {
    start_time: Instant,
    api_calls: AtomicU32,
    failed_calls: AtomicU32,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
    total_latency_ms: AtomicU64,
    by_kind: RwLock<BTreeMap<String, KindMetrics>>,
}

/// Metrics for one call kind
#[derive(Debug, Clone, Default)]
pub struct KindMetrics {
    pub api_calls: u32,
    pub failed_calls: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub latency_ms: u64,
}

#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub total_duration_ms: u64,
    pub api_calls: u32,
    pub failed_calls: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub avg_latency_ms: f64,
    pub by_kind: BTreeMap<String, KindMetrics>,
}

pub type SharedMetrics = Arc<MetricsCollector>;

pub fn create_shared_metrics() -> SharedMetrics {
    Arc::new(MetricsCollector::new())
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            api_calls: AtomicU32::new(0),
            failed_calls: AtomicU32::new(0),
            input_tokens: AtomicU64::new(0),
            output_tokens: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            by_kind: RwLock::new(BTreeMap::new()),
        }
    }

    /// Record a successful provider call
    pub fn record_response(&self, kind: CallKind, response: &LlmResponse) {
        let input = response.usage.input_tokens as u64;
        let output = response.usage.output_tokens as u64;

        self.api_calls.fetch_add(1, Ordering::Relaxed);
        self.input_tokens.fetch_add(input, Ordering::Relaxed);
        self.output_tokens.fetch_add(output, Ordering::Relaxed);
        self.total_latency_ms
            .fetch_add(response.timing.total_ms, Ordering::Relaxed);

        self.update_kind(kind, |m| {
            m.api_calls += 1;
            m.input_tokens += input;
            m.output_tokens += output;
            m.latency_ms += response.timing.total_ms;
        });
    }

    /// Record a provider call that returned an error
    pub fn record_failure(&self, kind: CallKind, latency_ms: u64) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
        self.failed_calls.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);

        self.update_kind(kind, |m| {
            m.api_calls += 1;
            m.failed_calls += 1;
            m.latency_ms += latency_ms;
        });
    }

    fn update_kind(&self, kind: CallKind, apply: impl FnOnce(&mut KindMetrics)) {
        let mut by_kind = self.by_kind.write().unwrap_or_else(|poisoned| {
            tracing::error!("Metrics by_kind RwLock poisoned, recovering");
            poisoned.into_inner()
        });
        apply(by_kind.entry(kind.as_str().to_string()).or_default());
    }

    pub fn summary(&self) -> MetricsSummary {
        let api_calls = self.api_calls.load(Ordering::Relaxed);
        let input_tokens = self.input_tokens.load(Ordering::Relaxed);
        let output_tokens = self.output_tokens.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);

        let avg_latency_ms = if api_calls > 0 {
            total_latency as f64 / api_calls as f64
        } else {
            0.0
        };

        let by_kind = self
            .by_kind
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        MetricsSummary {
            total_duration_ms: self.start_time.elapsed().as_millis() as u64,
            api_calls,
            failed_calls: self.failed_calls.load(Ordering::Relaxed),
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            avg_latency_ms,
            by_kind,
        }
    }
}

impl MetricsSummary {
    pub fn display(&self) -> String {
        let mut out = format!(
            "Duration: {:.1}s\n\
             API Calls: {} ({} failed)\n\
             Tokens: {} (input: {}, output: {})\n\
             Avg Latency: {:.0}ms",
            self.total_duration_ms as f64 / 1000.0,
            self.api_calls,
            self.failed_calls,
            self.total_tokens,
            self.input_tokens,
            self.output_tokens,
            self.avg_latency_ms,
        );
        for (kind, m) in &self.by_kind {
            out.push_str(&format!(
                "\n  {:<20} {:>3} calls  {:>7} tokens",
                kind,
                m.api_calls,
                m.input_tokens + m.output_tokens
            ));
        }
        out
    }
}

// =============================================================================
// Metered Provider
// =============================================================================

/// Provider wrapper that records every call into a collector
pub struct MeteredProvider {
    inner: SharedProvider,
    metrics: SharedMetrics,
}

impl MeteredProvider {
    pub fn new(inner: SharedProvider, metrics: SharedMetrics) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl LlmProvider for MeteredProvider {
    async fn generate(&self, request: &CompletionRequest) -> Result<LlmResponse> {
        let start = Instant::now();
        let result = self.inner.generate(request).await;
        match &result {
            Ok(response) => self.metrics.record_response(request.kind, response),
            Err(_) => self
                .metrics
                .record_failure(request.kind, start.elapsed().as_millis() as u64),
        }
        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn health_check(&self) -> Result<bool> {
        self.inner.health_check().await
    }
}
