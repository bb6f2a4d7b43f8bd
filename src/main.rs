use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weavepedia::ai::with_optional_timeout;
use weavepedia::cli::commands::{self, GenerateOptions};
use weavepedia::cli::{CommandContext, LlmOverrides};

#[derive(Parser)]
#[command(name = "weavepedia")]
#[command(
    version,
    about = "AI-driven encyclopedia article generator with verification gates"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one article, or a batch about subtopics of a broad topic
    Generate {
        #[arg(help = "Article topic")]
        topic: String,
        #[arg(long, short = 'n', default_value = "1", help = "Number of articles")]
        count: usize,
        #[arg(long, help = "Minimum words (default from config)")]
        min_words: Option<usize>,
        #[arg(long, help = "Maximum words (default from config)")]
        max_words: Option<usize>,
        #[arg(long, help = "JSON array of existing articles to avoid duplicating")]
        existing: Option<PathBuf>,
        #[arg(long, short, help = "Output directory (default: .weavepedia/drafts)")]
        output: Option<PathBuf>,
        #[arg(long, help = "LLM provider (openai, ollama, perplexity)")]
        provider: Option<String>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
    },

    /// Suggest edits to a stored article
    Edit {
        #[arg(help = "Article JSON file")]
        file: PathBuf,
        #[arg(long, short, help = "What to change")]
        instructions: String,
        #[arg(long, short, help = "Save the suggestion as JSON")]
        output: Option<PathBuf>,
        #[arg(long, help = "LLM provider (openai, ollama, perplexity)")]
        provider: Option<String>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
    },

    /// Suggest categories and tags for a stored article
    Categorize {
        #[arg(help = "Article JSON file")]
        file: PathBuf,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
        #[arg(long, help = "LLM provider (openai, ollama, perplexity)")]
        provider: Option<String>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
    },

    /// Check provider health and author configuration
    Check {
        #[arg(long, help = "LLM provider (openai, ollama, perplexity)")]
        provider: Option<String>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mWeavepedia encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }

        eprintln!("\n\x1b[33mPlease report this issue at:\x1b[0m");
        eprintln!("  https://github.com/junyeong-ai/weavepedia/issues");
        eprintln!();

        // backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load context and run one provider-backed command under the configured bound
fn run_with_context<F, Fut>(overrides: LlmOverrides, name: &str, command: F) -> anyhow::Result<()>
where
    F: FnOnce(CommandContext) -> Fut,
    Fut: std::future::Future<Output = weavepedia::Result<()>>,
{
    let ctx = CommandContext::load(&overrides)?;
    let timeout_secs = ctx.config.generation.timeout_secs;
    let rt = Runtime::new()?;
    rt.block_on(with_optional_timeout(timeout_secs, command(ctx), name))?;
    Ok(())
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Generate {
            topic,
            count,
            min_words,
            max_words,
            existing,
            output,
            provider,
            model,
        } => {
            let options = GenerateOptions {
                topic,
                count,
                min_words,
                max_words,
                existing,
                output,
            };
            run_with_context(LlmOverrides { provider, model }, "generate", |ctx| async move {
                commands::generate::run(&ctx, options).await
            })?;
        }
        Commands::Edit {
            file,
            instructions,
            output,
            provider,
            model,
        } => {
            run_with_context(LlmOverrides { provider, model }, "edit", |ctx| async move {
                commands::edit::run(&ctx, &file, &instructions, output.as_deref()).await
            })?;
        }
        Commands::Categorize {
            file,
            format,
            provider,
            model,
        } => {
            run_with_context(LlmOverrides { provider, model }, "categorize", |ctx| async move {
                commands::categorize::run(&ctx, &file, &format).await
            })?;
        }
        Commands::Check { provider, model } => {
            run_with_context(LlmOverrides { provider, model }, "check", |ctx| async move {
                commands::check::run(&ctx).await
            })?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => commands::config::show(&format)?,
            ConfigAction::Path => commands::config::path()?,
            ConfigAction::Init { global, force } => commands::config::init(global, force)?,
        },
    }

    Ok(())
}
