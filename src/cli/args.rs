use clap::{Parser, Subcommand};

/// Fetch packaged charts straight from git repositories.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub cmd: Command,
    /// Directory for temporary working copies.
    /// Defaults to $CHARTFETCH_SCRATCH_DIR, or the system temporary directory
    #[clap(long, global = true)]
    pub scratch_directory: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetches a chart from a git repository and writes the packaged archive
    Fetch {
        /// Repository, e.g. git+https://example.com/org/repo//charts/mychart
        repository: String,
        /// Branch or tag to check out
        #[clap(short, long)]
        version: String,
        /// Chart name, defaults to the last segment of the chart path
        #[clap(short, long)]
        name: Option<String>,
        /// Where to write <name>-<version>.tgz.
        /// Defaults to $CHARTFETCH_OUTPUT_DIR, or the current directory
        #[clap(short, long)]
        output_directory: Option<String>,
    },
    /// Checks whether a git repository has the given branch or tag
    HasRef {
        repository: String,
        reference: String,
    },
}
