use crate::cli::args::{Cli, Command};

pub mod generate;
pub mod session;

/// Dispatch a parsed command to its handler and return the process exit code.
pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Session(args) => session::run(args),
        Command::Generate(args) => generate::run(args).await,
        Command::Version => {
            println!("caseforge {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}

/// Data directory: `CASEFORGE_DATA_DIR` or `data`.
pub(crate) fn data_dir() -> std::path::PathBuf {
    std::env::var("CASEFORGE_DATA_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("data"))
}
