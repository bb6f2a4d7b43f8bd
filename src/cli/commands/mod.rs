pub mod categorize;
pub mod check;
pub mod config;
pub mod edit;
pub mod generate;

pub use generate::GenerateOptions;
