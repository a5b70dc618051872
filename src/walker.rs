//! Tree walking and filtering.

use crate::error::DiscoveryError;
use crate::fs::{EntryKind, FileSystem, FsEntry, OsFileSystem};
use crate::options::{DiscoveryOptions, FilterRule, PathStyle};
use crate::types::DiscoveredPath;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::Match;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::io::Read;
use std::path::{Path, PathBuf};

const GITIGNORE: &str = ".gitignore";

struct Walker<'a> {
    fs: &'a dyn FileSystem,
    options: &'a DiscoveryOptions,
    excludes: Option<GlobSet>,
}

impl<'a> Walker<'a> {
    fn new(fs: &'a dyn FileSystem, options: &'a DiscoveryOptions) -> Result<Self, DiscoveryError> {
        let excludes = if !options.exclude_patterns.is_empty() {
            let mut builder = GlobSetBuilder::new();
            for pattern in &options.exclude_patterns {
                let glob = Glob::new(pattern).map_err(|e| DiscoveryError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
                builder.add(glob);
            }
            Some(builder.build().map_err(|e| DiscoveryError::InvalidPattern {
                pattern: options.exclude_patterns.join(" "),
                message: e.to_string(),
            })?)
        } else {
            None
        };
        Ok(Self {
            fs,
            options,
            excludes,
        })
    }

    fn rule(&self) -> &FilterRule {
        &self.options.rule
    }

    /// Depth-first, children in name order, so a fixed tree always yields the
    /// same list.
    fn walk(
        &self,
        dir: &Path,
        relative: &Path,
        gitignores: &mut Vec<Gitignore>,
        found: &mut Vec<DiscoveredPath>,
    ) -> Result<(), DiscoveryError> {
        let mut entries = self
            .fs
            .read_dir(dir)
            .map_err(|e| DiscoveryError::io(dir, e))?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let local_gitignore = if self.options.respect_gitignore {
            self.load_gitignore(dir, &entries)?
        } else {
            None
        };
        let pushed = local_gitignore.is_some();
        gitignores.extend(local_gitignore);

        for entry in &entries {
            let path = dir.join(&entry.name);
            let relative = relative.join(&entry.name);
            match entry.kind {
                EntryKind::Dir => {
                    if self.rule().skips_folder(&entry.name.to_string_lossy()) {
                        #[cfg(feature = "logging")]
                        tracing::debug!("Pruning skipped folder {}", path.display());
                        continue;
                    }
                    if self.is_excluded(&path, &relative, true, gitignores) {
                        continue;
                    }
                    self.walk(&path, &relative, gitignores, found)?;
                }
                EntryKind::File => {
                    if !self.accepts_file(&path)
                        || self.is_excluded(&path, &relative, false, gitignores)
                    {
                        continue;
                    }
                    let display = self.display(&path, &relative);
                    found.push(DiscoveredPath::new(path, display));
                }
                EntryKind::Other => {}
            }
        }

        if pushed {
            gitignores.pop();
        }
        Ok(())
    }

    fn accepts_file(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.rule().accepts_extension(&ext))
    }

    fn is_excluded(
        &self,
        path: &Path,
        relative: &Path,
        is_dir: bool,
        gitignores: &[Gitignore],
    ) -> bool {
        if self
            .excludes
            .as_ref()
            .is_some_and(|excludes| excludes.is_match(relative))
        {
            return true;
        }
        for gitignore in gitignores.iter().rev() {
            match gitignore.matched(path, is_dir) {
                Match::Ignore(_) => return true,
                Match::Whitelist(_) => return false,
                Match::None => {}
            }
        }
        false
    }

    fn load_gitignore(
        &self,
        dir: &Path,
        entries: &[FsEntry],
    ) -> Result<Option<Gitignore>, DiscoveryError> {
        let present = entries
            .iter()
            .any(|e| e.kind == EntryKind::File && e.name == GITIGNORE);
        if !present {
            return Ok(None);
        }
        let file = dir.join(GITIGNORE);
        let mut bytes = Vec::new();
        self.fs
            .open(&file)
            .and_then(|mut reader| reader.read_to_end(&mut bytes))
            .map_err(|e| DiscoveryError::io(&file, e))?;

        let mut builder = GitignoreBuilder::new(dir);
        for line in String::from_utf8_lossy(&bytes).lines() {
            // git itself skips lines it cannot parse
            if let Err(_e) = builder.add_line(Some(file.clone()), line) {
                #[cfg(feature = "logging")]
                tracing::debug!("Ignoring bad line in {}: {}", file.display(), _e);
            }
        }
        let gitignore = builder.build().map_err(|e| DiscoveryError::InvalidPattern {
            pattern: file.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(gitignore))
    }

    fn display(&self, path: &Path, relative: &Path) -> String {
        match self.options.path_style {
            PathStyle::Relative => relative.to_string_lossy().into_owned(),
            PathStyle::Absolute => std::path::absolute(path)
                .unwrap_or_else(|_| path.to_path_buf())
                .to_string_lossy()
                .into_owned(),
        }
    }
}

/// Lower-cased extension with its leading dot, if the file name has one.
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// Walks `root` on the real filesystem and returns the files `rule` accepts,
/// named relative to `root`.
pub fn discover(
    root: impl AsRef<Path>,
    rule: &FilterRule,
) -> Result<Vec<DiscoveredPath>, DiscoveryError> {
    let options = DiscoveryOptions {
        rule: rule.clone(),
        ..Default::default()
    };
    discover_with(&OsFileSystem, root.as_ref(), &options)
}

/// Walks `root` through `fs`.
///
/// Folders named in the rule's skip set, or matched by an exclude pattern or a
/// `.gitignore`, are never entered. Any error while walking fails the whole
/// call, since a partial list cannot be told apart from a complete one.
pub fn discover_with(
    fs: &dyn FileSystem,
    root: &Path,
    options: &DiscoveryOptions,
) -> Result<Vec<DiscoveredPath>, DiscoveryError> {
    if !fs.is_dir(root) {
        return Err(DiscoveryError::NotFound {
            root: root.to_path_buf(),
        });
    }
    #[cfg(feature = "logging")]
    tracing::debug!("Discovering files under {}", root.display());
    let walker = Walker::new(fs, options)?;
    let mut found = Vec::new();
    walker.walk(root, &PathBuf::new(), &mut Vec::new(), &mut found)?;
    Ok(found)
}
