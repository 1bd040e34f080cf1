use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "caseforge",
    version,
    about = "Generate and review decision-scenario benchmark cases"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open or create an evaluation session and show its statistics
    Session(SessionArgs),
    /// Generate one case from a seed and save its history
    Generate(GenerateArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SessionArgs {
    /// Reviewer email; prompted for interactively when absent
    pub email: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Seed file the draft is written from
    #[arg(long, default_value = "seed.txt")]
    pub seed: PathBuf,
    /// Generator config; defaults apply when the file is absent
    #[arg(long, default_value = "caseforge.yaml")]
    pub config: PathBuf,
    /// Override the config's data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}
