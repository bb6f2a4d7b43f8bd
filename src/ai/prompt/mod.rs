//! Prompt Builder
//!
//! Every system prompt has the same shape: a role, numbered objectives,
//! hard rules, wrong/right examples, and (for JSON calls) the exact output
//! schema. Templates for each pipeline call live in `article::prompts`.

/// Prompt section types
#[derive(Debug, Clone)]
enum PromptSection {
    Role { expertise: String, task: String },
    Objectives(Vec<String>),
    Rules { heading: String, rules: Vec<String> },
    Examples { bad: Vec<String>, good: Vec<String> },
    Text { header: Option<String>, content: String },
    Schema(String),
}

/// Builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    pub fn objectives<S: AsRef<str>>(mut self, objectives: &[S]) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.iter().map(|o| o.as_ref().to_string()).collect(),
        ));
        self
    }

    /// Non-negotiable constraints, rendered under `<RULES>`
    pub fn rules<S: AsRef<str>>(mut self, heading: &str, rules: &[S]) -> Self {
        self.sections.push(PromptSection::Rules {
            heading: heading.to_string(),
            rules: rules.iter().map(|r| r.as_ref().to_string()).collect(),
        });
        self
    }

    pub fn anti_patterns(mut self, bad: &[&str], good: &[&str]) -> Self {
        self.sections.push(PromptSection::Examples {
            bad: bad.iter().map(|s| s.to_string()).collect(),
            good: good.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    /// Exact JSON shape the reply must have
    pub fn json_schema(mut self, schema: &str) -> Self {
        self.sections.push(PromptSection::Schema(schema.trim().to_string()));
        self
    }

    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!("You are an expert {} {}.\n", expertise, task));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Rules { heading, rules } => {
                    prompt.push_str("<RULES>\n");
                    prompt.push_str(&format!("{}\n", heading));
                    for rule in rules {
                        prompt.push_str(&format!("- {}\n", rule));
                    }
                    prompt.push_str("</RULES>\n\n");
                }
                PromptSection::Examples { bad, good } => {
                    prompt.push_str("## ANTI-PATTERNS\n\n");
                    for example in bad {
                        prompt.push_str(&format!("WRONG: {}\n", example));
                    }
                    for example in good {
                        prompt.push_str(&format!("CORRECT: {}\n", example));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Schema(schema) => {
                    prompt.push_str(
                        "Respond ONLY with a single JSON object matching this schema exactly:\n\n",
                    );
                    prompt.push_str("```json\n");
                    prompt.push_str(&schema);
                    prompt.push_str("\n```\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_prompt() {
        let prompt = PromptBuilder::new()
            .role("encyclopedia editor", "checking facts")
            .objectives(&["Check dates", "Check statistics"])
            .build();

        assert!(prompt.contains("<ROLE>"));
        assert!(prompt.contains("encyclopedia editor checking facts"));
        assert!(prompt.contains("1. Check dates"));
        assert!(prompt.contains("2. Check statistics"));
    }

    #[test]
    fn test_rules_and_anti_patterns() {
        let prompt = PromptBuilder::new()
            .rules("Naming:", &["Use full names for people"])
            .anti_patterns(&["How to brew coffee"], &["Coffee brewing"])
            .build();

        assert!(prompt.contains("<RULES>\nNaming:\n- Use full names for people"));
        assert!(prompt.contains("WRONG: How to brew coffee"));
        assert!(prompt.contains("CORRECT: Coffee brewing"));
    }

    #[test]
    fn test_schema_section_is_last_and_trimmed() {
        let prompt = PromptBuilder::new()
            .section("Article", "Coffee")
            .json_schema("\n{\"verified\": boolean}\n")
            .build();

        assert!(prompt.starts_with("# Article\n\nCoffee"));
        assert!(prompt.ends_with("{\"verified\": boolean}\n```"));
    }
}
