//! Site routing compiler CLI.
//!
//! # Architecture Overview
//!
//! ```text
//!   edge.toml ─┐
//!              ├─▶ config (load + validate) ─▶ CompilerInputs
//!  sites.toml ─┘                                   │
//!                                                  ▼
//!                  ┌───────────────── per partition (parallel) ─────────────────┐
//!                  │  site ─▶ rules (fragments) ─▶ compiler (ordering/listeners) │
//!                  │  assembly (top-level document)                              │
//!                  │  emit (text) ─▶ output (stage, archive, rename)             │
//!                  └─────────────────────────────────────────────────────────────┘
//!                                                  │
//!                                                  ▼
//!                      <output>/<timestamp>/etc-nginx-<dnet>{/,.tar}
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use edge_compiler::config::loader::{load_config, load_inputs};
use edge_compiler::config::watcher::InputWatcher;
use edge_compiler::observability::logging;
use edge_compiler::pipeline::{self, RunReport};
use edge_compiler::CompilerInputs;

#[derive(Parser)]
#[command(name = "edge-compiler")]
#[command(about = "Compile site descriptors into reverse-proxy routing configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Compiler configuration (TOML)
    #[arg(short, long, default_value = "edge.toml")]
    config: PathBuf,

    /// Site catalog (TOML)
    #[arg(short, long, default_value = "sites.toml")]
    sites: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every partition once
    Compile {
        #[command(flatten)]
        inputs: InputArgs,

        /// Override the output root from the configuration
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pin the generation timestamp (reproducible output)
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// Validate inputs and compile in memory without writing
    Check {
        #[command(flatten)]
        inputs: InputArgs,
    },
    /// Compile, then recompile whenever an input file changes
    Watch {
        #[command(flatten)]
        inputs: InputArgs,

        /// Override the output root from the configuration
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load(inputs: &InputArgs) -> Result<CompilerInputs, Box<dyn std::error::Error>> {
    // The subscriber must exist before validation emits its warnings
    let config = load_config(&inputs.config)?;
    logging::init(&config.logging.level);

    let loaded = load_inputs(&inputs.config, &inputs.sites)?;
    tracing::info!(
        config = %inputs.config.display(),
        sites = %inputs.sites.display(),
        client_sites = loaded.sites.len(),
        system_sites = loaded.system_sites.len(),
        "Configuration loaded"
    );
    Ok(loaded)
}

fn output_root(inputs: &CompilerInputs, output: &Option<PathBuf>) -> PathBuf {
    output.clone().unwrap_or_else(|| inputs.config.output.root.clone())
}

async fn compile_once(inputs: CompilerInputs, root: &Path, timestamp: String) -> RunReport {
    pipeline::run(Arc::new(inputs), root.to_path_buf(), timestamp).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { inputs, output, timestamp } => {
            let loaded = load(&inputs)?;
            let root = output_root(&loaded, &output);
            let timestamp = timestamp.unwrap_or_else(pipeline::generation_timestamp);
            pipeline::check_timestamp(&timestamp)?;

            let report = compile_once(loaded, &root, timestamp).await;
            if !report.is_success() {
                return Err(format!("{} partition(s) failed", report.failed.len()).into());
            }
        }
        Commands::Check { inputs } => {
            let loaded = load(&inputs)?;
            let timestamp = pipeline::generation_timestamp();
            for dnet in &loaded.config.deployment.dnets {
                let bundle = pipeline::compile_partition(&loaded, dnet, &timestamp)?;
                println!("{dnet}: {} site document(s)", bundle.sites.len());
            }
        }
        Commands::Watch { inputs, output } => {
            let loaded = load(&inputs)?;
            let root = output_root(&loaded, &output);
            compile_once(loaded, &root, pipeline::generation_timestamp()).await;

            let (watcher, mut updates) = InputWatcher::new(&inputs.config, &inputs.sites);
            let _watcher = watcher.run()?;

            loop {
                tokio::select! {
                    Some(next) = updates.recv() => {
                        let root = output_root(&next, &output);
                        compile_once(next, &root, pipeline::generation_timestamp()).await;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Interrupted, stopping watch");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
