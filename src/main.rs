use anyhow::{Context, Result};
use clap::Parser;
use quire::build::{build_site, Options};
use quire::config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Builds a static blog from a directory of markdown files.
#[derive(Parser)]
#[command(name = "quire", version, about)]
struct Cli {
    /// The directory holding the markdown sources.
    source: PathBuf,

    /// The directory the site is written to.
    output: PathBuf,

    /// The site configuration file (JSON or YAML).
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// A theme directory containing a `theme.yaml`. Defaults to the built-in
    /// theme.
    #[arg(short, long)]
    theme: Option<PathBuf>,

    /// The number of worker threads. Defaults to the number of CPUs.
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Log every document and artifact.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "quire=debug" } else { "quire=info" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_file(&cli.config)
        .with_context(|| format!("loading the configuration `{}`", cli.config.display()))?;
    let options = Options {
        source: cli.source,
        output: cli.output,
        theme: cli.theme,
        threads: cli.threads,
    };

    let report = build_site(&options, config).context("building the site")?;
    tracing::info!(output = %options.output.display(), "wrote {}", report);
    Ok(())
}
