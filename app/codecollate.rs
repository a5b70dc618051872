//! Command-line interface for codecollate.
//!
//! Collates the matching files of a directory into one summary file.

use clap::{Parser, ValueEnum};
use codecollate::{
    CollateBuilder, CollateOptions, DEFAULT_EXTENSIONS, Event, FilterRule, OutputFormat,
    collate_with_reporter, normalize_extension,
};
use std::path::PathBuf;
use std::process::exit;

const MAX_SAMPLE_SIZE: u64 = 16 * 1024 * 1024;

/// codecollate: collate a source tree into one text file
#[derive(Parser)]
#[command(name = "codecollate", version, about, long_about = None)]
struct Cli {
    /// The directory to search in
    directory: PathBuf,

    /// Output summary file name
    #[arg(short, long, default_value = "summary.txt")]
    output: PathBuf,

    /// Extensions to collect (e.g. .txt .dart .json); defaults to common source files
    #[arg(short, long, num_args = 1.., value_parser = parse_extension)]
    extensions: Vec<String>,

    /// Extensions to skip even if collected (e.g. .ico .jpg)
    #[arg(short, long, num_args = 1.., value_parser = parse_extension)]
    skip: Vec<String>,

    /// Folder names never entered (e.g. node_modules target)
    #[arg(long, num_args = 1..)]
    skip_folders: Vec<String>,

    /// Show absolute paths instead of paths relative to DIRECTORY
    #[arg(long)]
    full_path: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Honor .gitignore files
    #[arg(long)]
    gitignore: bool,

    /// Glob patterns of paths to leave out (can be repeated)
    #[arg(short = 'I', long = "ignore")]
    ignore_patterns: Vec<String>,

    /// Bytes sampled for encoding detection (1 to 16 MiB)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_SAMPLE_SIZE))]
    sample_size: Option<u64>,

    /// Only print errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Jsonl,
}

/// Accepts `rs`, `.rs` or `.RS` alike.
fn parse_extension(s: &str) -> Result<String, String> {
    normalize_extension(s).ok_or_else(|| format!("invalid extension: '{}'", s))
}

impl Cli {
    fn into_options(self) -> (CollateOptions, bool) {
        let extensions = if self.extensions.is_empty() {
            DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
        } else {
            self.extensions
        };
        let format = match self.format {
            Format::Text => OutputFormat::Text,
            Format::Jsonl => OutputFormat::JsonLines,
        };

        let mut builder = CollateBuilder::new(self.directory)
            .output(self.output)
            .rule(FilterRule::new(extensions, self.skip, self.skip_folders))
            .full_path(self.full_path)
            .respect_gitignore(self.gitignore)
            .exclude_patterns(self.ignore_patterns)
            .format(format);
        if let Some(bytes) = self.sample_size {
            builder = builder.sample_size(bytes as usize);
        }

        (builder.build(), self.quiet)
    }
}

fn main() {
    let cli = Cli::parse();
    let (options, quiet) = cli.into_options();

    let reporter = |event: &Event<'_>| {
        let failure = matches!(event, Event::ReadFailed { .. });
        if failure || !quiet {
            eprintln!("{}", event);
        }
    };

    match collate_with_reporter(&options, &reporter) {
        Ok(report) => {
            if report.failures > 0 && !quiet {
                eprintln!(
                    "{} of {} files could not be read; see the error lines in the summary",
                    report.failures, report.files
                );
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(1);
        }
    }
}
