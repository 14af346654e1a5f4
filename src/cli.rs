//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Download purchased tracks from Beatport and Beatsource.
///
/// Each input is a track, release, chart or playlist link, or a `.txt` file
/// listing one link per line.
#[derive(Parser, Debug)]
#[command(name = "beatportdl")]
#[command(author, version, about)]
pub struct Args {
    /// Links or `.txt` files containing links
    #[arg(value_name = "URL_OR_FILE")]
    pub inputs: Vec<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,

    /// Write downloads here instead of the configured directory
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

impl Args {
    /// Log level implied by `-v`/`-q`.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Whether `-v`/`-q` should override `RUST_LOG`.
    #[must_use]
    pub fn forces_log_level(&self) -> bool {
        self.quiet || self.verbose > 0
    }
}
