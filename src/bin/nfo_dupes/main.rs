mod config;
mod finder;

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use nfo_dupes::nfo::CommandStyle;

use crate::finder::NfoDupes;

#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Find duplicate and badly named movies from NFO files"
)]
struct Args {
    /// Library root directories to scan
    #[arg(value_hint = clap::ValueHint::DirPath)]
    paths: Vec<PathBuf>,

    /// Use default paths from config file
    #[arg(short = 'd', long)]
    default: bool,

    /// Also list NFO files without a matching video file
    #[arg(short = 'm', long)]
    missing: bool,

    /// Shell syntax for suggested rename commands
    #[arg(short = 's', long, value_enum, name = "STYLE")]
    style: Option<CommandStyle>,

    /// Video file extensions for the missing video check
    #[arg(short = 'e', long, num_args = 1, action = clap::ArgAction::Append, name = "EXTENSION")]
    extension: Vec<String>,

    /// Print results as JSON
    #[arg(short = 'j', long)]
    json: bool,

    /// Generate shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(ref shell) = args.completion {
        nfo_dupes::generate_shell_completion(*shell, Args::command(), true, env!("CARGO_BIN_NAME"))
    } else {
        NfoDupes::new(args)?.run()
    }
}
