//! Progress and diagnostics for callers that want them.
//!
//! The library does not pick a logging facility for its caller. A
//! [`Collator`](crate::Collator) hands [`Event`]s to a [`Reporter`]; any
//! `Fn(&Event) + Sync` closure is one.

use crate::error::ReadFailure;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// Discovery finished with `count` matching files.
    Discovered { root: &'a Path, count: usize },
    /// Nothing matched, so no summary is written.
    NothingFound { root: &'a Path },
    /// A file will appear in the summary with an error line.
    ReadFailed {
        display_path: &'a str,
        failure: &'a ReadFailure,
    },
    /// The summary is complete.
    Written { output: &'a str, files: usize },
}

impl fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Discovered { root, count } => {
                write!(f, "Found {count} matching files under {}", root.display())
            }
            Event::NothingFound { root } => {
                write!(f, "No matching files found under {}", root.display())
            }
            Event::ReadFailed {
                display_path,
                failure,
            } => write!(f, "Could not read {display_path}: {failure}"),
            Event::Written { output, files } => {
                write!(f, "Summary created: {output} ({files} files)")
            }
        }
    }
}

pub trait Reporter: Sync {
    fn report(&self, event: &Event<'_>);
}

impl<F> Reporter for F
where
    F: Fn(&Event<'_>) + Sync,
{
    fn report(&self, event: &Event<'_>) {
        self(event)
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Reporter for Silent {
    fn report(&self, _event: &Event<'_>) {}
}

/// Forwards events to `tracing`: failures as warnings, the rest as info.
#[cfg(feature = "logging")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

#[cfg(feature = "logging")]
impl Reporter for TracingReporter {
    fn report(&self, event: &Event<'_>) {
        match event {
            Event::ReadFailed { .. } | Event::NothingFound { .. } => tracing::warn!("{}", event),
            _ => tracing::info!("{}", event),
        }
    }
}
