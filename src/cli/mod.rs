pub mod commands;
pub mod ui;
pub mod util;

pub use util::{CommandContext, LlmOverrides, read_article, read_existing, write_article};
