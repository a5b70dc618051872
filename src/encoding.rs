//! Text encoding detection.
//!
//! Detection only ever looks at a bounded prefix of a file. It is a guess, so
//! it never fails: when nothing better is known the answer is UTF-8.

use chardetng::EncodingDetector;
use content_inspector::ContentType;
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};

/// Default number of leading bytes handed to a resolver.
pub const DEFAULT_SAMPLE_SIZE: usize = 8 * 1024;

/// Where an [`EncodingGuess`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessSource {
    /// A byte order mark at the start of the sample.
    Bom,
    /// The sample is well-formed UTF-8.
    Utf8,
    /// Byte frequency analysis.
    Statistical,
    /// Configured by the caller.
    Fixed,
    /// No usable signal, so UTF-8.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingGuess {
    pub encoding: &'static Encoding,
    pub source: GuessSource,
}

impl EncodingGuess {
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    fn utf8_default() -> Self {
        Self {
            encoding: UTF_8,
            source: GuessSource::Default,
        }
    }
}

/// Guesses the encoding of a file from a prefix of its bytes.
///
/// Implementations must be pure: the same sample always yields the same guess.
pub trait EncodingResolver: Send + Sync {
    fn detect(&self, sample: &[u8]) -> EncodingGuess;
}

/// BOM sniffing, then UTF-8 validation, then `chardetng` statistics.
///
/// Samples that look binary or carry a UTF-32 byte order mark resolve to
/// UTF-8; the reader's replacement policy takes care of the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct SniffingResolver;

impl EncodingResolver for SniffingResolver {
    fn detect(&self, sample: &[u8]) -> EncodingGuess {
        let bom = match content_inspector::inspect(sample) {
            ContentType::UTF_8_BOM => Some(UTF_8),
            ContentType::UTF_16LE => Some(UTF_16LE),
            ContentType::UTF_16BE => Some(UTF_16BE),
            ContentType::UTF_32LE | ContentType::UTF_32BE | ContentType::BINARY => {
                return EncodingGuess::utf8_default();
            }
            ContentType::UTF_8 => None,
        };
        if let Some(encoding) = bom {
            return EncodingGuess {
                encoding,
                source: GuessSource::Bom,
            };
        }
        if is_utf8_prefix(sample) {
            return EncodingGuess {
                encoding: UTF_8,
                source: GuessSource::Utf8,
            };
        }
        let mut detector = EncodingDetector::new();
        detector.feed(sample, false);
        EncodingGuess {
            encoding: detector.guess(None, true),
            source: GuessSource::Statistical,
        }
    }
}

/// Valid UTF-8, allowing a multi-byte sequence cut off by the end of the sample.
fn is_utf8_prefix(sample: &[u8]) -> bool {
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

/// Always answers with the same encoding.
#[derive(Debug, Clone, Copy)]
pub struct FixedResolver {
    encoding: &'static Encoding,
}

impl FixedResolver {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self { encoding }
    }

    /// Looks up an encoding by WHATWG label, e.g. `"latin1"` or `"shift_jis"`.
    pub fn for_label(label: &str) -> Option<Self> {
        Encoding::for_label(label.trim().as_bytes()).map(Self::new)
    }
}

impl Default for FixedResolver {
    fn default() -> Self {
        Self::new(UTF_8)
    }
}

impl EncodingResolver for FixedResolver {
    fn detect(&self, _sample: &[u8]) -> EncodingGuess {
        EncodingGuess {
            encoding: self.encoding,
            source: GuessSource::Fixed,
        }
    }
}
