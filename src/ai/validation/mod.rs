//! Model Output Validation
//!
//! JSON extraction and repair for structured provider replies. Field-level
//! interpretation happens at each call site through `types::utils` helpers,
//! which tolerate missing or mistyped fields.

mod json_repair;

pub use json_repair::{JsonRepairer, extract_json_from_response};
