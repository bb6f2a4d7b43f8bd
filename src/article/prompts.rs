//! Prompt templates for every provider call the article pipeline makes.
//!
//! Each function returns a ready `CompletionRequest`; JSON calls carry the
//! exact schema in the system prompt and set `json_mode`.

use crate::ai::PromptBuilder;
use crate::ai::provider::{CallKind, CompletionRequest};
use crate::constants::gates;
use crate::types::{ArticleRef, Source, WordBand, truncate_chars};

const EDITOR: &str = "encyclopedia editor";

// =============================================================================
// Verification Gates
// =============================================================================

pub fn duplicate_check(title: &str, content: &str, existing: &[ArticleRef]) -> CompletionRequest {
    let system = PromptBuilder::new()
        .role(EDITOR, "who detects duplicate articles")
        .objectives(&[
            "Compare the candidate with every existing article".to_string(),
            format!(
                "Score similarity 0-100 as {}% title similarity plus {}% content similarity",
                gates::TITLE_SIMILARITY_WEIGHT,
                gates::CONTENT_SIMILARITY_WEIGHT
            ),
            "Mark the candidate a duplicate only if an existing article already covers the same subject".to_string(),
            format!(
                "List at most {} similar articles, most similar first",
                gates::MAX_SIMILAR_ARTICLES
            ),
        ])
        .rules(
            "When the candidate content is empty:",
            &["Judge on the title alone; a same-subject title is a duplicate"],
        )
        .json_schema(
            r#"{
  "isDuplicate": boolean,
  "similarArticles": [{"id": "string", "title": "string", "similarity": number}],
  "reason": "string"
}"#,
        )
        .build();

    let mut listing = String::new();
    for article in existing {
        listing.push_str(&format!("- id: {}\n  title: {}\n", article.id, article.title));
        let excerpt = truncate_chars(article.content.trim(), gates::DUPLICATE_EXCERPT_CHARS);
        if !excerpt.is_empty() {
            listing.push_str(&format!("  excerpt: {}\n", excerpt.replace('\n', " ")));
        }
    }

    let candidate_content = if content.trim().is_empty() {
        "(not written yet)"
    } else {
        content
    };

    let user = PromptBuilder::new()
        .section("Candidate Title", title)
        .section("Candidate Content", candidate_content)
        .section("Existing Articles", listing.trim_end())
        .build();

    CompletionRequest::new(CallKind::DuplicateCheck, system, user).json()
}

pub fn fact_check(content: &str, sources: &[Source]) -> CompletionRequest {
    let system = PromptBuilder::new()
        .role(EDITOR, "who verifies facts against cited sources")
        .objectives(&[
            format!(
                "Score core facts (dates, statistics, technical claims) 0-100; weight {}%",
                gates::CORE_FACT_WEIGHT
            ),
            format!(
                "Score supporting details 0-100; weight {}%",
                gates::SUPPORTING_DETAIL_WEIGHT
            ),
            "Combine them into one weighted score".to_string(),
            format!(
                "Set verified to true only when the weighted score exceeds {}",
                gates::VERIFICATION_THRESHOLD
            ),
        ])
        .rules(
            "Verification:",
            &[
                "Judge claims against the listed sources and well-established knowledge",
                "A claim contradicted by a source counts as unverified",
                "Explain the main problems in analysis",
            ],
        )
        .json_schema(
            r#"{
  "verified": boolean,
  "score": number,
  "coreFactScore": number,
  "supportingDetailScore": number,
  "analysis": "string"
}"#,
        )
        .build();

    let user = PromptBuilder::new()
        .section("Article", content)
        .section("Sources", &render_sources(sources))
        .build();

    CompletionRequest::new(CallKind::FactCheck, system, user).json()
}

/// Category names understood by the LLM-backed moderator
pub const MODERATION_CATEGORIES: [&str; 7] = [
    "harassment",
    "hate",
    "self-harm",
    "sexual",
    "sexual/minors",
    "violence",
    "illicit",
];

pub fn moderation(content: &str) -> CompletionRequest {
    let categories = MODERATION_CATEGORIES
        .iter()
        .map(|c| format!("    \"{}\": boolean", c))
        .collect::<Vec<_>>()
        .join(",\n");

    let system = PromptBuilder::new()
        .role("content moderator", "for a public encyclopedia")
        .objectives(&[
            "Flag each category the text promotes, depicts gratuitously, or instructs",
            "Neutral encyclopedic description of a sensitive subject is not a violation",
        ])
        .json_schema(&format!(
            "{{\n  \"flagged\": boolean,\n  \"categories\": {{\n{}\n  }}\n}}",
            categories
        ))
        .build();

    CompletionRequest::new(CallKind::Moderation, system, content).json()
}

// =============================================================================
// Research & Writing
// =============================================================================

pub fn source_discovery(topic: &str) -> CompletionRequest {
    let system = PromptBuilder::new()
        .role("research librarian", "who compiles reliable references")
        .objectives(&[
            "List 3 to 8 reliable, verifiable sources about the topic",
            "Prefer academic publications, reference works, and established news outlets",
        ])
        .rules(
            "Sources:",
            &[
                "Only list sources you are confident exist",
                "type is one of: book, journal, web, news, encyclopedia",
            ],
        )
        .json_schema(
            r#"{
  "sources": [
    {"url": "string", "title": "string", "publisher": "string", "type": "string", "year": number}
  ]
}"#,
        )
        .build();

    CompletionRequest::new(CallKind::SourceDiscovery, system, format!("Topic: {}", topic)).json()
}

fn writing_rules(band: WordBand) -> Vec<String> {
    vec![
        format!(
            "Length: between {} and {} words of body text",
            band.min, band.max
        ),
        "Neutral, encyclopedic tone; no first or second person".to_string(),
        "Organize the body into '## ' sections, with '### ' subsections where useful".to_string(),
        "Open with a summary paragraph before the first section".to_string(),
        "No promotional language, speculation, or instructions to the reader".to_string(),
    ]
}

/// Completion variant: one JSON object with title, content and optional infobox
pub fn article_json(topic: &str, sources: &[Source], band: WordBand) -> CompletionRequest {
    let system = PromptBuilder::new()
        .role(EDITOR, "who writes well-sourced encyclopedia articles")
        .objectives(&[
            "Write a complete encyclopedia article about the topic",
            "Ground every factual claim in the provided sources",
            "Add an infobox of key facts when the subject has them",
        ])
        .rules("Writing:", &writing_rules(band))
        .rules(
            "Format:",
            &["content is markdown without the title heading; infobox maps short labels to values"],
        )
        .json_schema(
            r#"{
  "title": "string",
  "content": "string",
  "infobox": {"label": "value"}
}"#,
        )
        .build();

    let user = PromptBuilder::new()
        .section("Topic", topic)
        .section("Sources", &render_sources(sources))
        .build();

    CompletionRequest::new(CallKind::ContentGeneration, system, user).json()
}

/// Retrieval variant: markdown with inline `[n]` citation markers
pub fn article_markdown(topic: &str, band: WordBand) -> CompletionRequest {
    let system = PromptBuilder::new()
        .role(EDITOR, "who writes well-sourced encyclopedia articles")
        .objectives(&[
            "Research the topic and write a complete encyclopedia article",
            "Cite sources inline with bracketed numbers like [1]",
        ])
        .rules("Writing:", &writing_rules(band))
        .rules(
            "Format:",
            &[
                "The first line is the title as '# Title'",
                "Do not add a references section; it is appended automatically",
            ],
        )
        .build();

    CompletionRequest::new(CallKind::ContentGeneration, system, format!("Topic: {}", topic))
}

pub fn topic_expansion(topic: &str, count: usize) -> CompletionRequest {
    let system = PromptBuilder::new()
        .role(EDITOR, "who plans article coverage")
        .objectives(&[
            format!("Propose {} distinct article subjects within the broad topic", count),
            "Each subject must be specific enough for one encyclopedia article".to_string(),
        ])
        .rules(
            "Naming:",
            &[
                "People: full personal name",
                "Events: canonical event name",
                "Concepts: bare noun phrase",
                "No possessives, questions, or instructional phrasing",
            ],
        )
        .anti_patterns(
            &["How to roast coffee at home", "Brazil's coffee", "Einstein"],
            &["Coffee roasting", "Coffee production in Brazil", "Albert Einstein"],
        )
        .json_schema(r#"{"subtopics": ["string"]}"#)
        .build();

    CompletionRequest::new(CallKind::TopicExpansion, system, format!("Topic: {}", topic)).json()
}

// =============================================================================
// Enrichment & Editing
// =============================================================================

pub fn categorize_hierarchical(title: &str, content: &str) -> CompletionRequest {
    let system = PromptBuilder::new()
        .role(EDITOR, "who maintains the category tree")
        .objectives(&[
            "main: one or two top-level fields",
            "intermediate: sub-fields between main and specific",
            "specific: narrow categories the article belongs to directly",
            "administrative: maintenance categories, usually empty",
            "tags: short keywords for search",
        ])
        .rules(
            "Names:",
            &["Title case, plural nouns for groups, no duplicates across buckets"],
        )
        .json_schema(
            r#"{
  "main": ["string"],
  "intermediate": ["string"],
  "specific": ["string"],
  "administrative": ["string"],
  "tags": ["string"]
}"#,
        )
        .build();

    CompletionRequest::new(CallKind::Categorization, system, article_body(title, content)).json()
}

pub fn categorize_flat(title: &str, content: &str) -> CompletionRequest {
    let system = PromptBuilder::new()
        .role(EDITOR, "who assigns categories and tags")
        .objectives(&[
            "categories: up to 10 encyclopedia categories for the article",
            "tags: up to 10 short search keywords",
        ])
        .json_schema(r#"{"categories": ["string"], "tags": ["string"]}"#)
        .build();

    CompletionRequest::new(CallKind::Categorization, system, article_body(title, content)).json()
}

pub fn edit_json(title: &str, content: &str, instructions: &str) -> CompletionRequest {
    let system = PromptBuilder::new()
        .role(EDITOR, "who revises articles on request")
        .objectives(&[
            "Apply the requested changes to the article",
            "Keep everything the instructions do not ask to change",
            "Summarize the edit in one sentence",
        ])
        .json_schema(r#"{"content": "string", "summary": "string"}"#)
        .build();

    let user = PromptBuilder::new()
        .section("Instructions", instructions)
        .text(&article_body(title, content))
        .build();

    CompletionRequest::new(CallKind::EditSuggestion, system, user).json()
}

/// Marker line a retrieval edit reply starts with
pub const EDIT_SUMMARY_PREFIX: &str = "SUMMARY:";

pub fn edit_markdown(title: &str, content: &str, instructions: &str) -> CompletionRequest {
    let system = PromptBuilder::new()
        .role(EDITOR, "who revises articles on request")
        .objectives(&[
            "Apply the requested changes, researching new claims and citing them inline like [1]",
            "Keep everything the instructions do not ask to change",
        ])
        .rules(
            "Format:",
            &[
                "First line: 'SUMMARY: ' followed by a one-sentence description of the edit",
                "Then the full revised article, starting with '# Title'",
            ],
        )
        .build();

    let user = PromptBuilder::new()
        .section("Instructions", instructions)
        .text(&article_body(title, content))
        .build();

    CompletionRequest::new(CallKind::EditSuggestion, system, user)
}

fn article_body(title: &str, content: &str) -> String {
    format!("# {}\n\n{}", title, content)
}

fn render_sources(sources: &[Source]) -> String {
    if sources.is_empty() {
        return "(none)".to_string();
    }
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let year = s.year.map(|y| format!(", {}", y)).unwrap_or_default();
            format!("[{}] {} ({}{}) {}", i + 1, s.title, s.publisher, year, s.url)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
