use crate::encoding::{EncodingResolver, SniffingResolver};
use crate::error::{CollateError, DiscoveryError, WriteError};
use crate::fs::{FileSystem, OsFileSystem};
use crate::options::CollateOptions;
use crate::output::write_summary;
use crate::reader::ContentReader;
use crate::report::{Event, Reporter, Silent};
use crate::types::{CollateReport, DiscoveredPath, FileRecord};
use crate::walker::discover_with;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::io::Write;
use std::path::Path;

const STREAM_NAME: &str = "output stream";

/// Runs discovery, reading and assembly against one filesystem.
#[derive(Clone, Copy)]
pub struct Collator<'a> {
    fs: &'a dyn FileSystem,
    resolver: &'a dyn EncodingResolver,
    reporter: &'a dyn Reporter,
}

impl<'a> Collator<'a> {
    pub fn new(fs: &'a dyn FileSystem, resolver: &'a dyn EncodingResolver) -> Self {
        Self {
            fs,
            resolver,
            reporter: &Silent,
        }
    }

    pub fn reporter(mut self, reporter: &'a dyn Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn discover(
        &self,
        options: &CollateOptions,
    ) -> Result<Vec<DiscoveredPath>, DiscoveryError> {
        let paths = discover_with(self.fs, &options.root, &options.discovery)?;
        self.reporter.report(&Event::Discovered {
            root: &options.root,
            count: paths.len(),
        });
        Ok(paths)
    }

    /// Writes the summary to `options.output`.
    ///
    /// When nothing matches, the output is not created. A summary left over
    /// from an earlier run inside the scanned tree is not collated into itself.
    pub fn run(&self, options: &CollateOptions) -> Result<CollateReport, CollateError> {
        #[cfg(feature = "logging")]
        tracing::debug!("Starting collation of {}", options.root.display());
        let mut paths = self.discover(options)?;
        paths.retain(|p| !same_file(p.path(), &options.output));
        if paths.is_empty() {
            self.reporter
                .report(&Event::NothingFound { root: &options.root });
            return Ok(CollateReport {
                files: 0,
                failures: 0,
                output: None,
            });
        }

        let mut sink = self
            .fs
            .create(&options.output)
            .map_err(|source| CollateError::CreateOutput {
                path: options.output.clone(),
                source,
            })?;
        let (files, failures) = self
            .write_records(&paths, options, &mut sink)
            .map_err(|source| CollateError::Write {
                path: options.output.clone(),
                source,
            })?;
        drop(sink);
        self.reporter.report(&Event::Written {
            output: &options.output.display().to_string(),
            files,
        });
        Ok(CollateReport {
            files,
            failures,
            output: Some(options.output.clone()),
        })
    }

    /// Writes the summary into `sink` instead of `options.output`.
    ///
    /// Reports the same events as [`run`](Self::run), naming the sink
    /// "output stream". An empty match writes nothing.
    pub fn run_to<W>(
        &self,
        options: &CollateOptions,
        sink: &mut W,
    ) -> Result<CollateReport, CollateError>
    where
        W: Write + ?Sized,
    {
        let paths = self.discover(options)?;
        if paths.is_empty() {
            self.reporter
                .report(&Event::NothingFound { root: &options.root });
            return Ok(CollateReport {
                files: 0,
                failures: 0,
                output: None,
            });
        }

        let (files, failures) = self
            .write_records(&paths, options, sink)
            .map_err(CollateError::WriteStream)?;
        self.reporter.report(&Event::Written {
            output: STREAM_NAME,
            files,
        });
        Ok(CollateReport {
            files,
            failures,
            output: None,
        })
    }

    fn write_records<W>(
        &self,
        paths: &[DiscoveredPath],
        options: &CollateOptions,
        sink: &mut W,
    ) -> Result<(usize, usize), WriteError>
    where
        W: Write + ?Sized,
    {
        let reader = ContentReader::new(self.fs, self.resolver).sample_size(options.sample_size);
        let mut failures = 0;
        let records = read_all(&reader, paths).into_iter().inspect(|record| {
            if let Err(failure) = &record.content {
                failures += 1;
                self.reporter.report(&Event::ReadFailed {
                    display_path: &record.display_path,
                    failure,
                });
            }
        });
        let files = write_summary(options.format, records, sink)?;
        Ok((files, failures))
    }
}

/// Reads are independent, so they run on the rayon pool. `collect` keeps
/// discovery order.
#[cfg(feature = "parallel")]
fn read_all(reader: &ContentReader<'_>, paths: &[DiscoveredPath]) -> Vec<FileRecord> {
    paths.par_iter().map(|path| reader.read(path)).collect()
}

/// One file at a time, as the assembler pulls them.
#[cfg(not(feature = "parallel"))]
fn read_all<'r>(
    reader: &'r ContentReader<'_>,
    paths: &'r [DiscoveredPath],
) -> impl Iterator<Item = FileRecord> + 'r {
    paths.iter().map(move |path| reader.read(path))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::path::absolute(a), std::path::absolute(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Collates `options.root` into `options.output` on the real filesystem.
pub fn collate(options: &CollateOptions) -> Result<CollateReport, CollateError> {
    Collator::new(&OsFileSystem, &SniffingResolver).run(options)
}

/// Like [`collate`], reporting progress to `reporter`.
pub fn collate_with_reporter(
    options: &CollateOptions,
    reporter: &dyn Reporter,
) -> Result<CollateReport, CollateError> {
    Collator::new(&OsFileSystem, &SniffingResolver)
        .reporter(reporter)
        .run(options)
}
