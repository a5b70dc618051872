//! Summary assembly.
//!
//! Records are written one at a time, in the order they arrive, so only the
//! record being written needs to be in memory. Nothing is buffered beyond what
//! the sink itself buffers.

use crate::error::{ReadFailure, WriteError};
use crate::types::FileRecord;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Closes every block, followed by a blank line.
pub const SEPARATOR: &str = "-------------------------------------------------";

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// `Path:` header, underline, content, separator.
    #[default]
    Text,
    /// One JSON object per record and line.
    JsonLines,
}

impl OutputFormat {
    /// Returns the conventional file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::JsonLines => "jsonl",
        }
    }
}

/// Writes the text summary of `records` to `sink` and returns how many blocks
/// were written.
///
/// Each record becomes:
///
/// ```text
/// Path: src/main.rs
/// ===========
/// <content>
/// -------------------------------------------------
///
/// ```
///
/// A record holding a [`ReadFailure`] gets an `Error processing file:` line in
/// place of its content. The first failed write ends the call; anything
/// already written stays in the sink.
pub fn assemble<I, W>(records: I, sink: &mut W) -> Result<usize, WriteError>
where
    I: IntoIterator<Item = FileRecord>,
    W: Write + ?Sized,
{
    write_summary(OutputFormat::Text, records, sink)
}

/// Like [`assemble`], in the given format.
pub fn write_summary<I, W>(
    format: OutputFormat,
    records: I,
    sink: &mut W,
) -> Result<usize, WriteError>
where
    I: IntoIterator<Item = FileRecord>,
    W: Write + ?Sized,
{
    let mut written = 0;
    for record in records {
        match format {
            OutputFormat::Text => write_block(sink, &record)?,
            OutputFormat::JsonLines => write_json_line(sink, &record)?,
        }
        written += 1;
    }
    sink.flush()?;
    Ok(written)
}

fn write_block<W: Write + ?Sized>(sink: &mut W, record: &FileRecord) -> io::Result<()> {
    let path = &record.display_path;
    writeln!(sink, "Path: {path}")?;
    writeln!(sink, "{}", "=".repeat(path.chars().count()))?;
    match &record.content {
        Ok(text) => writeln!(sink, "{text}")?,
        Err(failure) => writeln!(sink, "Error processing file: {failure}")?,
    }
    writeln!(sink, "{SEPARATOR}")?;
    writeln!(sink)
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    path: &'a str,
    content: Option<&'a str>,
    encoding: Option<&'a str>,
    lossy: bool,
    error: Option<&'a ReadFailure>,
}

fn write_json_line<W: Write + ?Sized>(sink: &mut W, record: &FileRecord) -> io::Result<()> {
    let line = JsonRecord {
        path: &record.display_path,
        content: record.content.as_deref().ok(),
        encoding: record.encoding,
        lossy: record.lossy,
        error: record.content.as_ref().err(),
    };
    serde_json::to_writer(&mut *sink, &line)?;
    sink.write_all(b"\n")
}
