mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "swatch")]
#[command(
    about = "Scrape a Storybook's components and design tokens, then explore alternative visual styles",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Css,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract components and the token palette from a live Storybook
    Scrape {
        url: String,

        /// Chrome/Chromium executable (defaults to auto-detection)
        #[arg(long, value_name = "PATH")]
        chrome: Option<PathBuf>,

        /// Write the extracted token set here
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Write the full scrape result (components, warnings, stats) here
        #[arg(long, value_name = "FILE")]
        result: Option<PathBuf>,

        #[arg(long, default_value_t = 50)]
        max_stories: usize,

        #[arg(long, default_value_t = 3)]
        concurrency: usize,
    },

    /// Restyle a token set from a natural-language direction (needs ANTHROPIC_API_KEY)
    Transform {
        #[arg(short, long)]
        tokens: PathBuf,

        #[arg(short, long)]
        direction: String,

        /// Free-text brand context passed to the model
        #[arg(long)]
        brand: Option<String>,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Apply lever adjustments and print the resulting CSS
    Levers {
        #[arg(short, long)]
        tokens: PathBuf,

        /// Pick levers the way a variation prompt would; all levers when absent
        #[arg(long)]
        prompt: Option<String>,

        /// Lever value, e.g. --set roundness=150
        #[arg(long = "set", value_name = "ID=VALUE")]
        values: Vec<String>,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show which tokens a candidate set changes relative to a base
    Diff { base: PathBuf, candidate: PathBuf },

    /// Apply a built-in CSS preset; lists presets when --name is omitted
    Preset {
        #[arg(short, long)]
        tokens: Option<PathBuf>,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Build a token set from a stylesheet's custom properties
    Import {
        css: PathBuf,

        #[arg(long, default_value = "imported")]
        id: String,

        #[arg(long)]
        label: Option<String>,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print a token set as a :root block or a JSON token array
    Export {
        #[arg(short, long)]
        tokens: PathBuf,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Css)]
        format: ExportFormat,
    },

    /// Assemble a variation category by category from several token sets
    Combine {
        #[arg(long)]
        base: PathBuf,

        /// Category source, e.g. --pick color=dark.json
        #[arg(long = "pick", value_name = "CATEGORY=FILE")]
        picks: Vec<String>,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Scrape {
            url,
            chrome,
            out,
            result,
            max_stories,
            concurrency,
        } => commands::scrape(&url, chrome, out, result, max_stories, concurrency).await,
        Commands::Transform {
            tokens,
            direction,
            brand,
            out,
        } => commands::transform(&tokens, &direction, brand.as_deref(), out).await,
        Commands::Levers {
            tokens,
            prompt,
            values,
            out,
        } => commands::levers(&tokens, prompt.as_deref(), &values, out),
        Commands::Diff { base, candidate } => commands::diff(&base, &candidate),
        Commands::Preset { tokens, name, out } => commands::preset(tokens, name.as_deref(), out),
        Commands::Import { css, id, label, out } => commands::import(&css, &id, label, out),
        Commands::Export { tokens, format } => commands::export(&tokens, format),
        Commands::Combine { base, picks, out } => commands::combine(&base, &picks, out),
    }
}
