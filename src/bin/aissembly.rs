use std::path::PathBuf;
use std::time::Duration;

use aissembly::{AissemblyError, OracleRegistry, Pipeline, RunConfig};
use clap::{command, Parser};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Program source file
    program: PathBuf,

    /// Oracle definitions (JSON array)
    #[arg(long)]
    llm: Option<PathBuf>,

    /// Run configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of accuracy rewrite passes
    #[arg(long)]
    accuracy_opt_passes: Option<usize>,

    /// Number of decomposition rewrite passes
    #[arg(long)]
    decomposition_opt_passes: Option<usize>,

    /// Total parses, each checking the canonical text re-parses the same
    #[arg(long)]
    reparse_iterations: Option<usize>,

    /// Iteration bound for every loop
    #[arg(long)]
    max_iterations: Option<u64>,

    /// Wall-clock bound for every loop, in milliseconds
    #[arg(long)]
    loop_timeout_ms: Option<u64>,

    /// Print the rewritten source instead of running it
    #[arg(long)]
    emit_source: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn run_config(&self) -> Result<RunConfig, AissemblyError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        if let Some(n) = self.accuracy_opt_passes {
            config.passes.accuracy_passes = n;
        }
        if let Some(n) = self.decomposition_opt_passes {
            config.passes.decomposition_passes = n;
        }
        if let Some(n) = self.reparse_iterations {
            config.parser.reparse_iterations = n;
        }
        if let Some(n) = self.max_iterations {
            config.limits.max_iterations = Some(n);
        }
        if let Some(ms) = self.loop_timeout_ms {
            config.limits.timeout = Some(Duration::from_millis(ms));
        }
        Ok(config)
    }
}

fn run(cli: &Cli) -> Result<(), AissemblyError> {
    let config = cli.run_config()?;
    debug!("config: {:?}", config);

    let registry = match &cli.llm {
        Some(path) => OracleRegistry::load(path)?,
        None => OracleRegistry::new(),
    };

    let source = std::fs::read_to_string(&cli.program)
        .map_err(|e| AissemblyError::io(cli.program.display().to_string(), e))?;

    let pipeline = Pipeline::new(config, registry);
    if cli.emit_source {
        println!("{}", pipeline.rewrite(&source)?);
        return Ok(());
    }

    let env = pipeline.run(&source)?;
    let json = env
        .to_json_pretty()
        .map_err(|e| AissemblyError::Config(e.into()))?;
    println!("{}", json);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
