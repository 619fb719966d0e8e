use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod bake;
mod commands;
mod config;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Log more detail (-v for debug, -vv for trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// The command to execute
    #[command(subcommand)]
    command: NbbakeCommand,
}

#[derive(Parser)]
struct InitArgs {
    /// The directory to write nbbake.yaml into
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser)]
struct BakeArgs {
    /// Solved notebooks to bake (named `<name>_solutions.ipynb`)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// The path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip re-executing the notebooks
    #[arg(long, default_value = "false")]
    no_run: bool,

    /// Skip rendering the solved notebooks to HTML
    #[arg(long, default_value = "false")]
    no_render: bool,

    /// Stop at the first notebook that fails
    #[arg(long, default_value = "false")]
    fail_fast: bool,
}

#[derive(Parser)]
struct CheckArgs {
    /// Solved notebooks to check
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// The path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum NbbakeCommand {
    /// Write a default nbbake.yaml
    Init(InitArgs),

    /// Style, run, strip and render solved notebooks
    Bake(BakeArgs),

    /// Validate markdown cells without writing anything
    Check(CheckArgs),
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        NbbakeCommand::Init(args) => {
            commands::init::run(&args).await?;
        }
        NbbakeCommand::Bake(args) => {
            commands::bake::run(&args).await?;
        }
        NbbakeCommand::Check(args) => {
            commands::check::run(&args).await?;
        }
    }

    Ok(())
}
