use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "evalcmp", version, about = "Evaluation task orchestration and score comparison")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file to load instead of ~/.evalcmp/config.toml or ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP API, the live event stream and the static front end.
    Serve(ServeArgs),
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Overrides `server.host`.
    #[arg(long)]
    pub host: Option<String>,

    /// Overrides `server.port`.
    #[arg(long)]
    pub port: Option<u16>,

    /// Overrides `server.static_dir`.
    #[arg(long)]
    pub static_dir: Option<String>,
}
