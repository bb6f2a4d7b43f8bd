use console::style;

use crate::article::BatchReport;
use crate::types::{Article, Categorization, EditSuggestion};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    pub fn field(&self, label: &str, value: &str) {
        println!("  {:<12} {}", style(format!("{}:", label)).dim(), value);
    }

    pub fn article(&self, article: &Article) {
        self.section(&article.title);
        self.field("id", &article.id);
        self.field("author", &article.author.name);
        self.field("words", &crate::types::word_count(&article.content).to_string());
        if !article.categories.is_empty() {
            self.field("categories", &join(article.categories.iter().map(|c| c.name.as_str())));
        }
        if !article.tags.is_empty() {
            self.field("tags", &join(article.tags.iter().map(|t| t.name.as_str())));
        }
        if let Some(citations) = &article.citations {
            self.field("citations", &citations.len().to_string());
        }
        if !article.images.is_empty() {
            self.field("images", &article.images.len().to_string());
        }
    }

    pub fn batch(&self, report: &BatchReport) {
        self.section("Batch");
        self.field("generated", &report.articles.len().to_string());
        self.field("attempts", &report.attempts.to_string());
        for (subtopic, reason) in &report.failures {
            self.warning(&format!("{}: {}", subtopic, reason));
        }
    }

    pub fn categorization(&self, result: &Categorization) {
        self.section("Categories");
        if result.categories.is_empty() {
            println!("  (none)");
        }
        for category in &result.categories {
            match category.level {
                Some(level) => println!("  {} {}", category.name, style(format!("[{:?}]", level)).dim()),
                None => println!("  {}", category.name),
            }
        }
        self.section("Tags");
        if result.tags.is_empty() {
            println!("  (none)");
        } else {
            println!("  {}", result.tags.join(", "));
        }
    }

    pub fn edit(&self, suggestion: &EditSuggestion) {
        self.section("Summary");
        println!("  {}", suggestion.summary);
        self.section("Revised content");
        println!("{}", suggestion.content);
        if !suggestion.references.is_empty() {
            self.section("References");
            for reference in &suggestion.references {
                println!("  [{}] {}", reference.id, reference.url);
            }
        }
    }
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
