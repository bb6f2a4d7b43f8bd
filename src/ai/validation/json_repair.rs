//! JSON extraction and repair for model output
//!
//! Models asked for a single JSON object still wrap it in code fences,
//! surround it with commentary, leave trailing commas, or stop mid-string
//! when they hit the token limit. Each repair below addresses one of those
//! and they are tried cheapest first.

use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{ErrorCategory, LlmError, Result};

/// Parse model output as JSON, repairing common formatting slips
pub fn extract_json_from_response(content: &str) -> Result<Value> {
    JsonRepairer::new().parse_or_repair(content).map(|(value, _)| value)
}

/// Ordered repair steps; every step runs on the output of the previous one
#[derive(Debug, Clone, Copy)]
enum Repair {
    TrailingCommas,
    CloseOpenDelimiters,
    IsolateEmbedded,
}

const REPAIR_ORDER: [Repair; 3] = [
    Repair::TrailingCommas,
    Repair::CloseOpenDelimiters,
    Repair::IsolateEmbedded,
];

#[derive(Debug, Default)]
pub struct JsonRepairer;

impl JsonRepairer {
    pub fn new() -> Self {
        Self
    }

    /// Returns the value and whether any repair was needed
    pub fn parse_or_repair(&self, raw: &str) -> Result<(Value, bool)> {
        let mut candidate = strip_wrapping(raw);

        if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
            return Ok((value, false));
        }
        debug!("Model output is not valid JSON, attempting repair");

        for repair in REPAIR_ORDER {
            candidate = match repair {
                Repair::TrailingCommas => drop_trailing_commas(&candidate),
                Repair::CloseOpenDelimiters => close_open_delimiters(&candidate),
                Repair::IsolateEmbedded => match first_balanced_value(&candidate) {
                    Some(embedded) => embedded.to_string(),
                    None => continue,
                },
            };

            if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
                warn!(?repair, "Model JSON repaired");
                return Ok((value, true));
            }
        }

        // Commentary before a broken object: isolate first, then fix
        if let Some(start) = raw.find(['{', '[']) {
            let tail = close_open_delimiters(&drop_trailing_commas(&raw[start..]));
            if let Some(embedded) = first_balanced_value(&tail)
                && let Ok(value) = serde_json::from_str::<Value>(embedded)
            {
                warn!("Model JSON recovered from surrounding text");
                return Ok((value, true));
            }
        }

        let preview: String = raw.chars().take(200).collect();
        Err(LlmError::new(
            ErrorCategory::ParseError,
            format!("Model output is not repairable JSON: {}...", preview),
        )
        .into())
    }
}

/// Trim whitespace, BOM, and markdown code fences
fn strip_wrapping(raw: &str) -> String {
    let mut s = raw.trim().trim_start_matches('\u{feff}').trim();

    if s.starts_with("```") {
        s = match s.find('\n') {
            Some(newline) => &s[newline + 1..],
            None => s.trim_start_matches('`'),
        };
    }
    if let Some(stripped) = s.trim_end().strip_suffix("```") {
        s = stripped;
    }

    s.trim().to_string()
}

/// Remove commas that directly precede a closing bracket or brace
fn drop_trailing_commas(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        if ch == ',' {
            let rest: String = chars.clone().skip_while(|c| c.is_whitespace()).take(1).collect();
            if rest == "]" || rest == "}" {
                continue;
            }
        }
        if ch == '"' {
            in_string = true;
        }
        out.push(ch);
    }

    out
}

/// Close an unterminated string and every unclosed bracket, innermost first
fn close_open_delimiters(s: &str) -> String {
    let mut open: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in s.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => open.push('}'),
            '[' => open.push(']'),
            '}' | ']' => {
                open.pop();
            }
            _ => {}
        }
    }

    let mut out = s.trim_end().to_string();
    if in_string {
        if escaped {
            out.pop();
        }
        out.push('"');
    }
    // a dangling separator cannot be followed by a closer
    while out.ends_with(',') || out.ends_with(':') {
        out.pop();
    }
    while let Some(closer) = open.pop() {
        out.push(closer);
    }
    out
}

/// First complete `{...}` or `[...]` in `s`, ignoring brackets inside strings
fn first_balanced_value(s: &str) -> Option<&str> {
    let start = s.find(['{', '['])?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in s[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&s[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
