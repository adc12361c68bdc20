//! 🧺 `sift`: the binary the streaming harness launches, once per partition.
//!
//! ```text
//!   sift map names < part-00000 > names.tsv
//!   sift --config sift.toml reduce counts < counts.tsv
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sift::app_config::{FileConfig, InputConfig, OutputConfig, load_config};
use sift::{MapRole, ReduceRole, Role};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Streaming mappers and reducers: read stdin, keep the good records, park them somewhere
#[derive(Parser, Debug)]
#[command(name = "sift", version, long_about = None)]
struct Cli {
    /// TOML config, layered over SIFT_* environment variables
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read from this file instead of stdin
    #[arg(short, long, value_name = "FILE")]
    input: Option<String>,

    /// Write mapper output to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Print a run report to stderr when done
    #[arg(long)]
    summary: bool,

    #[command(subcommand)]
    stage: Stage,
}

#[derive(Subcommand, Debug)]
enum Stage {
    /// Transform each record independently and write lines out
    Map { role: MapArg },
    /// Persist each record to the attribute store
    Reduce { role: ReduceArg },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MapArg {
    Names,
    Counts,
    Interactions,
    Guids,
    Words,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ReduceArg {
    Counts,
    Names,
}

impl Stage {
    fn role(&self) -> Role {
        match self {
            Stage::Map { role } => Role::Map(match role {
                MapArg::Names => MapRole::Names,
                MapArg::Counts => MapRole::Counts,
                MapArg::Interactions => MapRole::Interactions,
                MapArg::Guids => MapRole::Guids,
                MapArg::Words => MapRole::Words,
            }),
            Stage::Reduce { role } => Role::Reduce(match role {
                ReduceArg::Counts => ReduceRole::Counts,
                ReduceArg::Names => ReduceRole::Names,
            }),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // -- 📢 logs go to stderr. stdout belongs to the data, always.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = try_main().await {
        error!("💀 error: {}", err);
        for cause in err.chain().skip(1) {
            error!("⚠️  cause: {}", cause);
        }
        // -- the subscriber may be filtered to silence, the chain still gets out
        eprintln!("sift: {err:#}");
        std::process::exit(1);
    }
}

async fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let role = cli.stage.role();

    let mut app_config = load_config(cli.config.as_deref())
        .context("💀 Could not load the configuration. Check the file, then check the SIFT_* env vars.")?;
    if let Some(file_name) = cli.input {
        app_config.input = InputConfig::File(FileConfig { file_name });
    }
    if let Some(file_name) = cli.output {
        app_config.output = OutputConfig::File(FileConfig { file_name });
    }

    let report = sift::run(app_config, role).await?;
    if cli.summary {
        eprintln!("{}", report.render());
    }
    Ok(())
}
