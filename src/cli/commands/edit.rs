//! Edit Command
//!
//! Suggest a revision of a stored article. The article file is not modified;
//! `--output` saves the suggestion as JSON.

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, read_article};
use crate::types::{PediaError, Result};

pub async fn run(
    ctx: &CommandContext,
    file: &Path,
    instructions: &str,
    save_to: Option<&Path>,
) -> Result<()> {
    if instructions.trim().is_empty() {
        return Err(PediaError::Config("--instructions must not be empty".to_string()));
    }

    let output = Output::new();
    let article = read_article(file)?;
    output.header(&format!("Editing: {}", article.title));

    let suggestion = ctx
        .generator
        .suggest_edits(&article.title, &article.content, instructions)
        .await?;
    output.edit(&suggestion);

    if let Some(path) = save_to {
        std::fs::write(path, serde_json::to_string_pretty(&suggestion)?)?;
        output.success(&format!("Saved suggestion to {}", path.display()));
    }
    Ok(())
}
