//! Generate Command
//!
//! Usage:
//!   weavepedia generate <TOPIC> [--count N] [--min-words N] [--max-words N]
//!                      [--existing FILE] [--output DIR]

use std::path::PathBuf;

use tracing::info;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, read_existing, write_article};
use crate::config::ConfigLoader;
use crate::types::{Article, GenerationRequest, Result};

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub topic: String,
    pub count: usize,
    pub min_words: Option<usize>,
    pub max_words: Option<usize>,
    pub existing: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

pub async fn run(ctx: &CommandContext, options: GenerateOptions) -> Result<()> {
    let output = Output::new();
    let generation = &ctx.config.generation;

    let request = GenerationRequest::new(
        options.topic.trim(),
        options.min_words.unwrap_or(generation.min_words),
        options.max_words.unwrap_or(generation.max_words),
    )
    .with_existing(read_existing(options.existing.as_deref())?);
    request.validate()?;

    let out_dir = options.output.unwrap_or_else(ConfigLoader::drafts_dir);
    output.header(&format!("Generating: {}", request.topic));
    info!(
        count = options.count,
        existing = request.existing_articles.len(),
        "Starting generation"
    );

    let articles: Vec<Article> = if options.count <= 1 {
        match ctx.generator.generate_article(&request).await? {
            Some(article) => vec![article],
            None => Vec::new(),
        }
    } else {
        let report = ctx.generator.generate_batch(&request, options.count).await?;
        output.batch(&report);
        report.articles
    };

    if articles.is_empty() {
        output.warning("No article passed every check; see the log for the stage that stopped it");
    }
    for article in &articles {
        output.article(article);
        let path = write_article(&out_dir, article)?;
        output.success(&format!("Saved {}", path.display()));
    }

    if options.count > 1 && articles.len() < options.count {
        output.info(&format!(
            "Generated {} of {} requested articles",
            articles.len(),
            options.count
        ));
    }

    output.section("Provider usage");
    println!("{}", ctx.metrics.summary().display());
    Ok(())
}
