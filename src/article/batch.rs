//! Batch Pipeline
//!
//! Expands a broad topic into subtopics and runs the single-article pipeline
//! on weighted random draws until enough articles exist or the attempt
//! budget runs out. Subtopics are drawn at most once; a subtopic that failed
//! earlier in the batch keeps a reduced weight. Attempts run sequentially so
//! every attempt sees the articles already generated in this batch.

use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument, warn};

use crate::article::expander::TopicExpander;
use crate::article::pipeline::{ArticlePipeline, GenerationOutcome};
use crate::article::sampling::pick_weighted;
use crate::constants::batch;
use crate::types::{Article, ArticleRef, GenerationRequest, Result};

/// Result of one batch run. Fewer articles than requested is a normal outcome.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub articles: Vec<Article>,
    pub attempts: usize,
    /// Subtopic → why its attempt produced nothing
    pub failures: HashMap<String, String>,
}

impl BatchReport {
    pub fn summary(&self) -> String {
        format!(
            "{} article(s) from {} attempt(s), {} failed",
            self.articles.len(),
            self.attempts,
            self.failures.len()
        )
    }
}

pub struct BatchRunner<'a> {
    pipeline: &'a ArticlePipeline,
    expander: &'a TopicExpander,
}

impl<'a> BatchRunner<'a> {
    pub fn new(pipeline: &'a ArticlePipeline, expander: &'a TopicExpander) -> Self {
        Self { pipeline, expander }
    }

    /// Up to `count` articles about subtopics of `request.topic`. Only a
    /// missing author or an invalid request is an error.
    #[instrument(skip(self, request, rng), fields(topic = %request.topic))]
    pub async fn run<R: Rng + Send + ?Sized>(
        &self,
        request: &GenerationRequest,
        count: usize,
        rng: &mut R,
    ) -> Result<BatchReport> {
        self.pipeline.require_author()?;
        request.validate()?;

        let mut report = BatchReport::default();
        if count == 0 {
            return Ok(report);
        }

        let wanted = (count * batch::SUBTOPIC_MULTIPLIER).max(batch::MIN_SUBTOPICS);
        let subtopics = self.expander.expand(&request.topic, wanted).await;

        if subtopics.is_empty() {
            info!("No subtopics available, generating the topic itself");
            self.attempt(request, &request.topic, &mut report).await;
            return Ok(report);
        }

        let max_attempts = count * batch::ATTEMPT_MULTIPLIER;
        let mut used: HashSet<usize> = HashSet::new();
        let mut failed: HashSet<usize> = HashSet::new();

        while report.articles.len() < count && report.attempts < max_attempts {
            let available: Vec<usize> = (0..subtopics.len())
                .filter(|i| !used.contains(i))
                .collect();
            if available.is_empty() {
                info!("Subtopics exhausted");
                break;
            }

            let weights: Vec<f64> = available
                .iter()
                .map(|i| {
                    if failed.contains(i) {
                        batch::FAILED_WEIGHT
                    } else {
                        batch::FRESH_WEIGHT
                    }
                })
                .collect();
            let Some(pick) = pick_weighted(&weights, rng) else {
                break;
            };
            let index = available[pick];
            used.insert(index);

            if !self.attempt(request, &subtopics[index], &mut report).await {
                failed.insert(index);
            }
        }

        info!(
            requested = count,
            generated = report.articles.len(),
            attempts = report.attempts,
            "Batch complete"
        );
        Ok(report)
    }

    /// One pipeline run; failures are recorded, never propagated
    async fn attempt(
        &self,
        base: &GenerationRequest,
        subtopic: &str,
        report: &mut BatchReport,
    ) -> bool {
        report.attempts += 1;

        let mut existing = base.existing_articles.clone();
        existing.extend(report.articles.iter().map(ArticleRef::from));
        let request = GenerationRequest {
            topic: subtopic.to_string(),
            existing_articles: existing,
            min_word_count: base.min_word_count,
            max_word_count: base.max_word_count,
        };

        match self.pipeline.run(&request).await {
            Ok(GenerationOutcome::Generated(article)) => {
                report.articles.push(*article);
                true
            }
            Ok(GenerationOutcome::Aborted { stage, reason }) => {
                report
                    .failures
                    .insert(subtopic.to_string(), format!("{}: {}", stage, reason));
                false
            }
            Err(e) => {
                warn!(subtopic, "Attempt failed: {}", e);
                report.failures.insert(subtopic.to_string(), e.to_string());
                false
            }
        }
    }
}
