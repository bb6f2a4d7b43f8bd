//! Categorize Command

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, read_article};
use crate::types::Result;

pub async fn run(ctx: &CommandContext, file: &Path, format: &str) -> Result<()> {
    let article = read_article(file)?;
    let result = ctx
        .generator
        .generate_categories(&article.title, &article.content)
        .await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let output = Output::new();
        output.header(&article.title);
        output.categorization(&result);
    }
    Ok(())
}
