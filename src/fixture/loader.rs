use super::parser::{DEFAULT_DELIMITER, FixtureParser, ParseError};
use crate::cache::ResponseCache;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Default location of the fixture directory
pub const DEFAULT_ROOT: &str = "/usr/local/nucklee";
/// Default fixture file extension
pub const DEFAULT_EXTENSION: &str = ".http";

/// What the loader does when a file or a block cannot be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Log and count the failure, keep loading everything else
    #[default]
    SkipAndContinue,
    /// Stop at the first failure and return it
    Abort,
}

/// Configuration for the fixture loader
///
/// # Examples
///
/// ```
/// use nucklee::fixture::{ErrorPolicy, LoaderConfig};
///
/// let config = LoaderConfig {
///     root: "/srv/fixtures".into(),
///     ..Default::default()
/// };
/// assert_eq!(config.extension, ".http");
/// assert_eq!(config.delimiter, "##");
/// assert_eq!(config.policy, ErrorPolicy::SkipAndContinue);
/// ```
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Directory scanned recursively for fixture files
    pub root: PathBuf,
    /// Suffix a file name must end with to be loaded
    pub extension: String,
    /// Token separating records within one file
    pub delimiter: String,
    /// Failure handling for unreadable files and malformed blocks
    pub policy: ErrorPolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            extension: DEFAULT_EXTENSION.to_string(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            policy: ErrorPolicy::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("fixture directory {} is unreadable: {source}", .path.display())]
    DirectoryUnreadable { path: PathBuf, source: io::Error },
    #[error("fixture file {} is unreadable: {source}", .path.display())]
    FileUnreadable { path: PathBuf, source: io::Error },
    #[error("fixture file {}, block {block}: {source}", .path.display())]
    Fixture {
        path: PathBuf,
        block: usize,
        source: ParseError,
    },
}

/// Counters describing one load run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Files read and parsed (possibly with skipped blocks)
    pub files_loaded: usize,
    /// Files that could not be read
    pub files_failed: usize,
    /// Records inserted into the cache, overrides included
    pub records_loaded: usize,
    /// Blocks rejected by the parser
    pub blocks_skipped: usize,
}

/// Walks a directory tree and fills a [`ResponseCache`] from fixture files
///
/// Entries are visited in lexical file-name order, so when two files define
/// the same request the one visited last wins.
#[derive(Debug, Clone)]
pub struct FixtureLoader {
    config: LoaderConfig,
    parser: FixtureParser,
}

impl FixtureLoader {
    pub fn new(config: LoaderConfig) -> Self {
        let parser = FixtureParser::new(config.delimiter.clone());
        Self { config, parser }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Loads every fixture into a fresh cache
    pub fn load(&self) -> Result<(ResponseCache, LoadReport), LoadError> {
        let mut cache = ResponseCache::new();
        let report = self.load_into(&mut cache)?;
        Ok((cache, report))
    }

    /// Loads every fixture under the configured root into `cache`
    pub fn load_into(&self, cache: &mut ResponseCache) -> Result<LoadReport, LoadError> {
        let root = &self.config.root;
        let metadata = fs::metadata(root).map_err(|source| LoadError::DirectoryUnreadable {
            path: root.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(LoadError::DirectoryUnreadable {
                path: root.clone(),
                source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
            });
        }

        let mut report = LoadReport::default();

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map_or_else(|| root.clone(), Path::to_path_buf);
                    // The root itself failing to list is fatal under any policy
                    let is_root = err.depth() == 0;
                    let source = io::Error::from(err);
                    if is_root || self.config.policy == ErrorPolicy::Abort {
                        return Err(LoadError::DirectoryUnreadable { path, source });
                    }
                    warn!(path = %path.display(), error = %source, "Skipping unreadable directory entry");
                    continue;
                }
            };

            if self.is_fixture(&entry) {
                self.load_file(entry.path(), cache, &mut report)?;
            }
        }

        info!(
            root = %root.display(),
            files = report.files_loaded,
            failed = report.files_failed,
            records = report.records_loaded,
            skipped = report.blocks_skipped,
            "Loaded fixtures"
        );
        Ok(report)
    }

    fn is_fixture(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_file()
            && entry
                .file_name()
                .to_string_lossy()
                .ends_with(&self.config.extension)
    }

    fn load_file(
        &self,
        path: &Path,
        cache: &mut ResponseCache,
        report: &mut LoadReport,
    ) -> Result<(), LoadError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(source) => {
                if self.config.policy == ErrorPolicy::Abort {
                    return Err(LoadError::FileUnreadable {
                        path: path.to_path_buf(),
                        source,
                    });
                }
                report.files_failed += 1;
                warn!(path = %path.display(), error = %source, "Skipping unreadable fixture file");
                return Ok(());
            }
        };

        for (block, result) in self.parser.parse(&contents).enumerate() {
            match result {
                Ok((key, record)) => {
                    if cache.lookup(&key).is_some() {
                        debug!(%key, path = %path.display(), "Fixture overrides an earlier definition");
                    }
                    cache.insert(key, record);
                    report.records_loaded += 1;
                }
                Err(source) => {
                    if self.config.policy == ErrorPolicy::Abort {
                        return Err(LoadError::Fixture {
                            path: path.to_path_buf(),
                            block,
                            source,
                        });
                    }
                    report.blocks_skipped += 1;
                    warn!(path = %path.display(), block, error = %source, "Skipping malformed fixture block");
                }
            }
        }

        report.files_loaded += 1;
        debug!(path = %path.display(), delimiter = self.parser.delimiter(), "Loaded fixture file");
        Ok(())
    }
}
