//! Config Command
//!
//! Manage Weavepedia configuration.
//!
//! Usage:
//!   weavepedia config show [-f json]
//!   weavepedia config path
//!   weavepedia config init [-g] [--force]

use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the merged effective configuration
pub fn show(format: &str) -> Result<()> {
    ConfigLoader::show_config(format == "json")
}

pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

pub fn init(global: bool, force: bool) -> Result<()> {
    let output = Output::new();
    if global {
        let dir = ConfigLoader::init_global(force)?;
        output.success("Initialized global configuration");
        println!("  Directory: {}", dir.display());
        if let Some(config_path) = ConfigLoader::global_config_path() {
            println!("  Config:    {}", config_path.display());
        }
    } else {
        let dir = ConfigLoader::init_project(force)?;
        output.success("Initialized project configuration");
        println!("  Directory: {}", dir.display());
        println!(
            "  Config:    {}",
            ConfigLoader::project_config_path().display()
        );
        println!("  Drafts:    {}", ConfigLoader::drafts_dir().display());
    }
    Ok(())
}
