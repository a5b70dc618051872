use crate::encoding::DEFAULT_SAMPLE_SIZE;
use crate::output::OutputFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Extensions collected when the caller does not name any.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".txt", ".py", ".c", ".cpp", ".h", ".cs", ".cake", ".cshtml", ".csx", ".ps1", ".vbs", ".js",
    ".mjs", ".ts", ".svelte", ".rb", ".rs", ".html", ".htm", ".xhtml", ".css", ".dart", ".jsx",
    ".bat", ".autoexe", ".sh", ".bash", ".php", ".phtml", ".pl", ".pm", ".sql", ".xml", ".csv",
];

/// Canonical form of an extension: trimmed, lower-case, with a leading dot.
/// Returns `None` for blank input.
pub fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_lowercase()))
}

/// Which files discovery keeps and which folders it never enters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    valid_extensions: BTreeSet<String>,
    skip_extensions: BTreeSet<String>,
    skip_folder_names: BTreeSet<String>,
}

impl FilterRule {
    pub fn new<V, S, F>(valid_extensions: V, skip_extensions: S, skip_folder_names: F) -> Self
    where
        V: IntoIterator,
        V::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            valid_extensions: normalize_all(valid_extensions),
            skip_extensions: normalize_all(skip_extensions),
            skip_folder_names: skip_folder_names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn valid_extensions(&self) -> &BTreeSet<String> {
        &self.valid_extensions
    }

    pub fn skip_extensions(&self) -> &BTreeSet<String> {
        &self.skip_extensions
    }

    pub fn skip_folder_names(&self) -> &BTreeSet<String> {
        &self.skip_folder_names
    }

    /// Whether a file with this (already normalized) extension is collected.
    /// The skip set wins over the valid set.
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.valid_extensions.contains(ext) && !self.skip_extensions.contains(ext)
    }

    pub fn skips_folder(&self, name: &str) -> bool {
        self.skip_folder_names.contains(name)
    }
}

impl Default for FilterRule {
    fn default() -> Self {
        Self::new(
            DEFAULT_EXTENSIONS.iter().copied(),
            std::iter::empty::<&str>(),
            std::iter::empty::<String>(),
        )
    }
}

fn normalize_all<I>(exts: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    exts.into_iter()
        .filter_map(|ext| normalize_extension(ext.as_ref()))
        .collect()
}

/// How discovered paths are shown in the summary. Fixed for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathStyle {
    /// Relative to the scan root.
    #[default]
    Relative,
    /// The root joined with the relative path, made absolute without
    /// consulting the filesystem.
    Absolute,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryOptions {
    pub rule: FilterRule,
    pub path_style: PathStyle,
    pub respect_gitignore: bool,
    /// Globs matched against root-relative paths. Matching folders are pruned.
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateOptions {
    pub root: PathBuf,
    pub output: PathBuf,
    pub discovery: DiscoveryOptions,
    pub format: OutputFormat,
    /// Bytes handed to the encoding resolver.
    pub sample_size: usize,
}

impl Default for CollateOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output: PathBuf::from("summary.txt"),
            discovery: DiscoveryOptions::default(),
            format: OutputFormat::Text,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

#[derive(Debug, Default)]
pub struct CollateBuilder {
    options: CollateOptions,
}

impl CollateBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            options: CollateOptions {
                root: root.into(),
                ..Default::default()
            },
        }
    }
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.output = path.into();
        self
    }
    pub fn rule(mut self, rule: FilterRule) -> Self {
        self.options.discovery.rule = rule;
        self
    }
    pub fn path_style(mut self, style: PathStyle) -> Self {
        self.options.discovery.path_style = style;
        self
    }
    pub fn full_path(self, yes: bool) -> Self {
        self.path_style(if yes {
            PathStyle::Absolute
        } else {
            PathStyle::Relative
        })
    }
    pub fn respect_gitignore(mut self, yes: bool) -> Self {
        self.options.discovery.respect_gitignore = yes;
        self
    }
    pub fn exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.options.discovery.exclude_patterns = patterns;
        self
    }
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.options.format = format;
        self
    }
    pub fn sample_size(mut self, bytes: usize) -> Self {
        self.options.sample_size = bytes.max(1);
        self
    }
    pub fn build(self) -> CollateOptions {
        self.options
    }
}
