pub mod article;
pub mod error;
pub mod utils;

pub use article::*;
pub use error::{
    ErrorCategory, ErrorClassifier, LlmError, PediaError, Result, ValidationError,
};
pub use utils::{
    json_bool, json_percent, json_string, json_string_array, json_string_or, slugify,
    truncate_chars, word_count,
};
