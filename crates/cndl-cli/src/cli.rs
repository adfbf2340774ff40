use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use cndl_sdk::DEFAULT_REPO_DIR;

#[derive(Parser, Debug)]
#[command(
    name = "cndl",
    about = "cndl: content-addressed storage and snapshots for time-series chunks",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Working tree that holds the repository
    #[arg(short = 'C', long = "dir", global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Name of the repository directory inside the working tree
    #[arg(long, global = true, default_value = DEFAULT_REPO_DIR)]
    pub repo_dir: String,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty repository
    Init,
    /// Generate, store and stage a demo series for each symbol
    Add(AddArgs),
    /// Decode and print a stored chunk
    Show(ShowArgs),
    /// Snapshot all staged symbols into a new commit
    Commit(CommitArgs),
    /// Show commit history
    Log(LogArgs),
    /// Show staged symbols that differ from the last commit
    Status,
    /// List every stored object
    Objects,
    /// Delete an object from the store
    Rm(RmArgs),
    /// Verify object hashes and look for dangling references
    Fsck,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(required = true)]
    pub symbols: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Object hash or unique prefix (at least 3 characters)
    pub object: String,
    /// Print every sample instead of a summary
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct CommitArgs {
    #[arg(short, long)]
    pub message: Option<String>,
}

#[derive(Args, Debug)]
pub struct LogArgs {
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Object hash or unique prefix (at least 3 characters)
    pub object: String,
}
