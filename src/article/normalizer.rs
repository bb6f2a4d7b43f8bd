//! Response Normalizer
//!
//! Turns free-form markdown from a provider into `{title, content, references}`:
//! the leading heading (or first line) becomes the title, `##`/`###` headings
//! get uniform spacing, split bullets are rejoined, and citations are
//! rendered as a trailing `## References` block.

use regex::Regex;
use std::sync::LazyLock;

use crate::constants::article::UNTITLED;
use crate::types::Citation;

static TITLE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,2}\s*(.*?)\s*$").expect("title pattern must compile"));

static EXCESS_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*){2,}").expect("blank-line pattern must compile"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedArticle {
    pub title: String,
    pub content: String,
    pub references: Vec<Citation>,
}

/// Normalize raw provider text. `None` only when the text is blank.
pub fn normalize(raw: &str, citations: &[Citation]) -> Option<NormalizedArticle> {
    let text = raw.replace("\r\n", "\n");
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let (first_line, body) = text.split_once('\n').unwrap_or((text, ""));
    let title = extract_title(first_line);

    let mut content = String::new();
    for section in split_sections(&repair_bullets(body)) {
        content.push_str(&section);
        content.push('\n');
    }

    if !citations.is_empty() {
        content.push_str("\n\n## References\n\n");
        for citation in citations {
            content.push_str(&format!("[{}] {}\n", citation.id, clean_url(&citation.url)));
        }
    }

    let content = EXCESS_BLANK_LINES
        .replace_all(&content, "\n\n")
        .trim()
        .to_string();

    Some(NormalizedArticle {
        title,
        content,
        references: citations.to_vec(),
    })
}

/// Number citation URLs from 1 in the order the provider returned them
pub fn citations_from_urls(urls: &[String]) -> Vec<Citation> {
    urls.iter()
        .filter(|u| !u.trim().is_empty())
        .enumerate()
        .map(|(i, url)| Citation {
            id: i as u32 + 1,
            url: url.trim().to_string(),
            title: clean_url(url),
        })
        .collect()
}

fn extract_title(line: &str) -> String {
    let line = line.trim();
    let title = match TITLE_HEADING.captures(line) {
        Some(caps) if !line.starts_with("###") => caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        _ => line.to_string(),
    };

    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}

fn starts_block(trimmed: &str) -> bool {
    trimmed.starts_with('#')
        || trimmed == "-"
        || trimmed == "*"
        || trimmed.starts_with("- ")
        || trimmed.starts_with("* ")
}

/// Join a bare `-`/`*` marker with the next non-empty line. A marker
/// followed by a heading or another bullet is dropped.
fn repair_bullets(body: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut pending_marker: Option<(String, char)> = None;

    for line in body.lines() {
        let trimmed = line.trim();

        if let Some((indent, marker)) = pending_marker.take() {
            if trimmed.is_empty() {
                pending_marker = Some((indent, marker));
                continue;
            }
            if !starts_block(trimmed) {
                out.push(format!("{}{} {}", indent, marker, trimmed));
                continue;
            }
        }

        if trimmed == "-" || trimmed == "*" {
            let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
            let marker = if trimmed == "-" { '-' } else { '*' };
            pending_marker = Some((indent, marker));
            continue;
        }

        out.push(line.trim_end().to_string());
    }

    // a dangling marker at the end carries no content
    out.join("\n")
}

/// Split at each `##` boundary with a blank line around every `##`/`###` heading
fn split_sections(body: &str) -> Vec<String> {
    let mut sections: Vec<(Option<String>, String)> = Vec::new();
    let mut current: (Option<String>, String) = (None, String::new());

    for line in body.lines() {
        let heading = line.trim();
        if heading.starts_with("## ") {
            if current.0.is_some() || !current.1.trim().is_empty() {
                sections.push(current);
            }
            current = (Some(heading.to_string()), String::new());
        } else if heading.starts_with("### ") {
            current.1.push_str(&format!("\n{}\n\n", heading));
        } else {
            current.1.push_str(line);
            current.1.push('\n');
        }
    }
    if current.0.is_some() || !current.1.trim().is_empty() {
        sections.push(current);
    }

    sections
        .into_iter()
        .map(|(heading, text)| match heading {
            Some(heading) => format!("\n{}\n\n{}", heading, text.trim_matches('\n')),
            None => text.trim_matches('\n').to_string(),
        })
        .collect()
}

/// Protocol stripped, host plus first path segment, no trailing slash
pub fn clean_url(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(url) = url::Url::parse(raw)
        && let Some(host) = url.host_str()
    {
        let first_segment = url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|s| !s.is_empty());
        return match first_segment {
            Some(segment) => format!("{}/{}", host, segment),
            None => host.to_string(),
        };
    }

    let without_scheme = raw.split_once("://").map(|(_, rest)| rest).unwrap_or(raw);
    let mut parts = without_scheme.trim_end_matches('/').splitn(3, '/');
    match (parts.next(), parts.next()) {
        (Some(host), Some(segment)) if !segment.is_empty() => format!("{}/{}", host, segment),
        (Some(host), _) => host.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn citation(id: u32, url: &str) -> Citation {
        Citation {
            id,
            url: url.to_string(),
            title: String::new(),
        }
    }

    #[test]
    fn test_coffee_round_trip() {
        let raw = "# Coffee\n\nCoffee is a brewed drink.\n## History\nFirst cultivated in Yemen.\n\n\n\nSpread widely.";
        let citations = vec![citation(1, "https://a.com/x"), citation(2, "https://b.com/y")];

        let article = normalize(raw, &citations).unwrap();
        assert_eq!(article.title, "Coffee");
        assert!(article.content.contains("## References"));
        assert!(article.content.contains("[1] a.com/x"));
        assert!(article.content.contains("[2] b.com/y"));
        assert!(!article.content.contains("\n\n\n"));
        assert!(article.content.contains("\n\n## History\n\nFirst cultivated"));
        assert_eq!(article.references.len(), 2);
    }

    #[test]
    fn test_first_line_is_title_without_heading() {
        let article = normalize("Coffee\nA brewed drink.", &[]).unwrap();
        assert_eq!(article.title, "Coffee");
        assert_eq!(article.content, "A brewed drink.");
        assert!(!article.content.contains("References"));
    }

    #[test]
    fn test_second_level_title() {
        let article = normalize("## Espresso\nBody", &[]).unwrap();
        assert_eq!(article.title, "Espresso");
    }

    #[test]
    fn test_empty_heading_defaults_title() {
        let article = normalize("#\nBody text", &[]).unwrap();
        assert_eq!(article.title, "Untitled Article");
    }

    #[test]
    fn test_blank_input_is_none() {
        assert!(normalize("  \n\n ", &[]).is_none());
    }

    #[test]
    fn test_split_bullets_are_joined() {
        let raw = "# Coffee\n## Varieties\n-\nArabica\n*\n\nRobusta\n- Liberica";
        let article = normalize(raw, &[]).unwrap();
        assert!(article.content.contains("- Arabica\n* Robusta\n- Liberica"));
    }

    #[test]
    fn test_dangling_marker_before_heading_is_dropped() {
        let article = normalize("# T\nIntro\n-\n## History\nBody", &[]).unwrap();
        assert!(article.content.contains("\n\n## History\n\nBody"));
        assert!(!article.content.contains("- ##"));

        let bullets = normalize("# T\n*\n- Beans\n-\nRoast", &[]).unwrap();
        assert!(bullets.content.contains("- Beans\n- Roast"));
        assert!(!bullets.content.contains("* - Beans"));
    }

    #[test]
    fn test_subheadings_get_spacing() {
        let raw = "# Coffee\n## Production\nIntro\n### Brazil\nLargest producer";
        let article = normalize(raw, &[]).unwrap();
        assert!(article.content.contains("Intro\n\n### Brazil\n\nLargest producer"));
    }

    #[test]
    fn test_clean_url() {
        assert_eq!(clean_url("https://a.com/x"), "a.com/x");
        assert_eq!(clean_url("https://www.example.org/wiki/Coffee/"), "www.example.org/wiki");
        assert_eq!(clean_url("http://b.com/"), "b.com");
        assert_eq!(clean_url("b.com/path/deeper"), "b.com/path");
    }

    #[test]
    fn test_citations_from_urls_numbered_from_one() {
        let citations =
            citations_from_urls(&["https://a.com/x".to_string(), " ".to_string(), "https://b.com".to_string()]);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].id, 1);
        assert_eq!(citations[1].id, 2);
        assert_eq!(citations[1].title, "b.com");
    }

    proptest! {
        #[test]
        fn prop_no_triple_blank_lines(body in "[a-z#\\-\\* \n]{0,200}") {
            let raw = format!("# Title\n{}", body);
            let citations = vec![citation(1, "https://a.com/x")];
            let article = normalize(&raw, &citations).unwrap();
            prop_assert!(!article.content.contains("\n\n\n"));
            prop_assert!(!article.title.is_empty());
        }

        #[test]
        fn prop_references_listed_for_every_citation(n in 1u32..8) {
            let citations: Vec<Citation> =
                (1..=n).map(|i| citation(i, &format!("https://site{}.com/p", i))).collect();
            let article = normalize("Title\nbody", &citations).unwrap();
            for i in 1..=n {
                let expected = format!("[{}] site{}.com/p", i, i);
                prop_assert!(article.content.contains(&expected));
            }
        }
    }
}
