//! Fact Verification Gate
//!
//! The provider weighs core facts at 70% and supporting details at 30% and
//! decides `verified` itself; its boolean is trusted as-is. Failures count
//! as unverified.

use tracing::{debug, warn};

use crate::ai::provider::{SharedProvider, generate_json};
use crate::article::prompts;
use crate::types::{Source, VerificationResult, json_bool, json_percent, json_string_or};

pub struct FactVerifier {
    provider: SharedProvider,
}

impl FactVerifier {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    pub async fn verify(&self, content: &str, sources: &[Source]) -> VerificationResult {
        let request = prompts::fact_check(content, sources);
        match generate_json(self.provider.as_ref(), request).await {
            Ok((value, _)) => {
                let result = VerificationResult {
                    verified: json_bool(&value, "verified", false),
                    score: json_percent(&value, "score"),
                    analysis: json_string_or(&value, "analysis", ""),
                };
                debug!(
                    verified = result.verified,
                    score = result.score,
                    sources = sources.len(),
                    "Fact verification complete"
                );
                result
            }
            Err(e) => {
                warn!("Fact verification failed, treating as unverified: {}", e);
                VerificationResult::unverified(format!("verification unavailable: {}", e))
            }
        }
    }
}
