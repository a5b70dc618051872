//! Turning discovered files into text.
//!
//! Reading never aborts a run. Whatever goes wrong with one file ends up in
//! that file's [`FileRecord`] and the caller moves on to the next one.

use crate::encoding::{DEFAULT_SAMPLE_SIZE, EncodingResolver, SniffingResolver};
use crate::error::ReadFailure;
use crate::fs::{FileSystem, OsFileSystem};
use crate::types::{DiscoveredPath, FileRecord};
use crate::walker::extension_of;
use flate2::read::MultiGzDecoder;
use std::io::{self, Read};
use std::path::Path;

const GZIP_EXTENSION: &str = ".gz";

struct Decoded {
    text: String,
    encoding: &'static str,
    lossy: bool,
}

/// Reads files through a [`FileSystem`], guessing encodings with an
/// [`EncodingResolver`].
#[derive(Clone, Copy)]
pub struct ContentReader<'a> {
    fs: &'a dyn FileSystem,
    resolver: &'a dyn EncodingResolver,
    sample_size: usize,
}

impl<'a> ContentReader<'a> {
    pub fn new(fs: &'a dyn FileSystem, resolver: &'a dyn EncodingResolver) -> Self {
        Self {
            fs,
            resolver,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    /// How many leading bytes the resolver sees. At least one.
    pub fn sample_size(mut self, bytes: usize) -> Self {
        self.sample_size = bytes.max(1);
        self
    }

    pub fn read(&self, path: &DiscoveredPath) -> FileRecord {
        let display = path.display_path().to_owned();
        let decoded = if is_gzip(path.path()) {
            self.read_gzip(path.path())
        } else {
            self.read_text(path.path())
        };
        match decoded {
            Ok(decoded) => {
                FileRecord::decoded(display, decoded.text, decoded.encoding, decoded.lossy)
            }
            Err(failure) => {
                #[cfg(feature = "logging")]
                tracing::debug!("Failed to read {}: {}", path.path().display(), failure);
                FileRecord::failed(display, failure)
            }
        }
    }

    /// Decompresses the whole stream, then decodes it as UTF-8.
    fn read_gzip(&self, path: &Path) -> Result<Decoded, ReadFailure> {
        let file = self.fs.open(path).map_err(|e| ReadFailure::io(&e))?;
        let mut bytes = Vec::new();
        MultiGzDecoder::new(file)
            .read_to_end(&mut bytes)
            .map_err(|e| match e.kind() {
                io::ErrorKind::InvalidData
                | io::ErrorKind::InvalidInput
                | io::ErrorKind::UnexpectedEof => {
                    ReadFailure::decode(format!("corrupt gzip stream: {e}"))
                }
                _ => ReadFailure::io(&e),
            })?;
        let (text, lossy) = match String::from_utf8(bytes) {
            Ok(text) => (text, false),
            Err(e) => (String::from_utf8_lossy(e.as_bytes()).into_owned(), true),
        };
        Ok(Decoded {
            text,
            encoding: encoding_rs::UTF_8.name(),
            lossy,
        })
    }

    fn read_text(&self, path: &Path) -> Result<Decoded, ReadFailure> {
        let mut reader = self.fs.open(path).map_err(|e| ReadFailure::io(&e))?;
        let mut bytes = Vec::new();
        reader
            .by_ref()
            .take(self.sample_size as u64)
            .read_to_end(&mut bytes)
            .map_err(|e| ReadFailure::io(&e))?;
        let guess = self.resolver.detect(&bytes);
        #[cfg(feature = "logging")]
        tracing::debug!(
            "Encoding of {}: {} ({:?})",
            path.display(),
            guess.name(),
            guess.source
        );
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| ReadFailure::io(&e))?;

        // a byte order mark overrides the guess and is stripped
        let (text, encoding, lossy) = guess.encoding.decode(&bytes);
        Ok(Decoded {
            text: text.into_owned(),
            encoding: encoding.name(),
            lossy,
        })
    }
}

fn is_gzip(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| ext == GZIP_EXTENSION)
}

/// Reads one file from disk with the default sniffing resolver.
pub fn read(path: &DiscoveredPath) -> FileRecord {
    ContentReader::new(&OsFileSystem, &SniffingResolver).read(path)
}
