//! AI Integration Layer
//!
//! Provider clients, prompt construction, model-output repair, call metrics
//! and the command-level timeout wrapper.

pub mod metrics;
pub mod prompt;
pub mod provider;
pub mod timeout;
pub mod validation;

pub use metrics::{
    KindMetrics, MeteredProvider, MetricsCollector, MetricsSummary, SharedMetrics,
    create_shared_metrics,
};
pub use prompt::PromptBuilder;
pub use provider::{
    CallKind, CompletionRequest, GeneratorVariant, LlmProvider, LlmResponse, ProviderKind,
    ResponseMetadata, ResponseTiming, SharedProvider, TokenUsage, create_provider, generate_json,
};
pub use timeout::{with_optional_timeout, with_timeout};
pub use validation::{JsonRepairer, extract_json_from_response};
