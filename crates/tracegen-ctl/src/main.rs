//! tracegen-ctl
//!
//! Command-line surface over the tracegen engine: run templates against input
//! models, evaluate expressions, list module elements and query traces.

mod cli_config;
mod commands;
mod loader;
mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracegen_engine::StrategyKind;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tracegen-ctl", version)]
#[command(about = "Model-to-text generation with traceability")]
#[command(styles = output::clap_styles())]
struct Cli {
    /// Engine config file (default: ./.tracegen.toml, then ~/.config/tracegen.toml)
    #[arg(long, global = true, env = "TRACEGEN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a template (or every main template) against input models
    Generate(GenerateArgs),

    /// Evaluate a compiled expression and print its value
    Eval(EvalArgs),

    /// List the elements of a compiled module
    Elements {
        /// Compiled module (.json, .yaml)
        #[arg(long)]
        module: PathBuf,
    },

    /// Query a saved traceability model
    #[command(subcommand)]
    Trace(TraceCommands),
}

/// Inputs shared by commands that evaluate something.
#[derive(Debug, Args)]
pub(crate) struct InputArgs {
    /// Compiled module (.json, .yaml)
    #[arg(long)]
    pub module: PathBuf,

    /// Input model documents (.json, .yaml)
    #[arg(long = "model", required = true)]
    pub models: Vec<PathBuf>,

    /// Target object keys, bound positionally
    #[arg(long = "target")]
    pub targets: Vec<String>,

    /// Named variables as NAME=VALUE (use @KEY to reference a model object)
    #[arg(long = "var")]
    pub variables: Vec<String>,
}

#[derive(Debug, Args)]
pub(crate) struct GenerateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Template to run; without it every main template runs on the targets
    #[arg(long)]
    pub element: Option<String>,

    /// Generation strategy: preview, overwrite or merge
    #[arg(long)]
    pub strategy: Option<StrategyKind>,

    /// Directory generated locations are resolved against
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the traceability model as JSON
    #[arg(long)]
    pub trace_out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub(crate) struct EvalArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Compiled expression tree (.json, .yaml)
    #[arg(long)]
    pub expression: PathBuf,
}

#[derive(Debug, Subcommand)]
pub(crate) enum TraceCommands {
    /// Show what produced a position in a generated file
    At {
        /// Traceability model JSON written by `generate --trace-out`
        #[arg(long)]
        trace: PathBuf,

        /// Generated file location, as recorded in the trace
        #[arg(long)]
        file: String,

        /// Character offset in the generated file
        #[arg(long)]
        offset: usize,
    },

    /// Show every span an input object contributed to
    Input {
        /// Traceability model JSON written by `generate --trace-out`
        #[arg(long)]
        trace: PathBuf,

        /// Object URI (`<model location>#<key>`)
        #[arg(long)]
        object: String,

        /// Restrict to one feature of the object
        #[arg(long)]
        feature: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("tracegen_ctl=info".parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cli_config = cli_config::load_cli_config(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Generate(args) => commands::handle_generate_command(args, &cli_config),
        Commands::Eval(args) => commands::handle_eval_command(args, &cli_config),
        Commands::Elements { module } => commands::handle_elements_command(&module),
        Commands::Trace(cmd) => commands::handle_trace_command(cmd),
    };

    if let Err(e) = result {
        output::error(format!("{e:#}"));
        std::process::exit(1);
    }
    Ok(())
}
