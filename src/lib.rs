//! # Codecollate
//!
//! `codecollate` turns a source tree into one flat text document: every file
//! that passes the extension and folder filters appears as a block with a
//! `Path:` header, an underline, its decoded content and a separator.
//!
//! The work is split into three steps that can be used on their own:
//!
//! - [`discover`] walks a directory and returns the matching files in a fixed
//!   order, pruning skipped folders instead of filtering them out afterwards.
//! - [`read`] turns one file into a [`FileRecord`], decompressing `.gz` files
//!   and guessing the encoding of everything else. A file that cannot be read
//!   yields a record carrying a [`ReadFailure`] rather than an error.
//! - [`assemble`] streams records into any [`std::io::Write`].
//!
//! [`Collator`] (or the [`collate`] shortcut) runs all three.
//!
//! # Features
//!
//! - `parallel` (default): reads files on the Rayon thread pool. Output order is
//!   unaffected.
//! - `logging`: emits debug events via the `tracing` crate and provides
//!   [`TracingReporter`].
//!
//! # Example
//!
//! ```no_run
//! use codecollate::{CollateBuilder, FilterRule, collate};
//!
//! let options = CollateBuilder::new("./my-project")
//!     .output("summary.txt")
//!     .rule(FilterRule::new([".rs", ".toml"], [".lock"], ["target", ".git"]))
//!     .build();
//!
//! let report = collate(&options).expect("Failed to collate directory");
//! println!("{} files, {} unreadable", report.files, report.failures);
//! ```

mod encoding;
mod engine;
mod error;
mod fs;
mod options;
pub mod output;
mod reader;
mod report;
mod types;
mod walker;

pub use encoding::{
    DEFAULT_SAMPLE_SIZE, EncodingGuess, EncodingResolver, FixedResolver, GuessSource,
    SniffingResolver,
};
pub use engine::{Collator, collate, collate_with_reporter};
pub use error::{CollateError, DiscoveryError, ReadFailure, ReadFailureReason, WriteError};
pub use fs::{EntryKind, FileSystem, FsEntry, MemoryFileSystem, OsFileSystem};
pub use options::{
    CollateBuilder, CollateOptions, DEFAULT_EXTENSIONS, DiscoveryOptions, FilterRule, PathStyle,
    normalize_extension,
};
pub use output::{OutputFormat, assemble, write_summary};
pub use reader::{ContentReader, read};
#[cfg(feature = "logging")]
pub use report::TracingReporter;
pub use report::{Event, Reporter, Silent};
pub use types::{CollateReport, DiscoveredPath, FileRecord};
pub use walker::{discover, discover_with};
