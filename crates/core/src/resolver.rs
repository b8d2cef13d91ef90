use crate::hash::sha256_file;
use crate::naming::CandidatePath;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Number of candidate names tried (the bare name plus `-001` ..= `-999`).
pub const DEFAULT_MAX_SUFFIX: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileIdentity {
    Inode { device: u64, inode: u64 },
    Canonical(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFacts {
    pub size: u64,
    pub identity: FileIdentity,
}

/// Filesystem questions asked while resolving a destination.
pub trait FileProbe {
    /// Facts about whatever occupies `path`, or `Ok(None)` when nothing does.
    fn probe(&self, path: &Path) -> io::Result<Option<FileFacts>>;

    fn content_hash(&self, path: &Path) -> io::Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileProbe for LocalFs {
    fn probe(&self, path: &Path) -> io::Result<Option<FileFacts>> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            // a dangling symlink still occupies the name
            Err(err) if err.kind() == io::ErrorKind::NotFound => match fs::symlink_metadata(path) {
                Ok(metadata) => metadata,
                Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(err) => return Err(err),
            },
            Err(err) => return Err(err),
        };
        Ok(Some(FileFacts {
            size: metadata.len(),
            identity: file_identity(path, &metadata)?,
        }))
    }

    fn content_hash(&self, path: &Path) -> io::Result<String> {
        sha256_file(path)
    }
}

#[cfg(unix)]
fn file_identity(_path: &Path, metadata: &fs::Metadata) -> io::Result<FileIdentity> {
    use std::os::unix::fs::MetadataExt;
    Ok(FileIdentity::Inode {
        device: metadata.dev(),
        inode: metadata.ino(),
    })
}

#[cfg(not(unix))]
fn file_identity(path: &Path, _metadata: &fs::Metadata) -> io::Result<FileIdentity> {
    fs::canonicalize(path).map(FileIdentity::Canonical)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Nothing occupies this path; the source can be placed here.
    Resolved(PathBuf),
    /// Identical content already sits at this path.
    Duplicate(PathBuf),
    /// The occupant is the source itself.
    SameFileAsSource(PathBuf),
    Exhausted { attempts: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolveError {
    #[error("no destination root was given")]
    MissingRoot,
    #[error("could not stat source file {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },
    #[error("couldn't checksum the source file {path}: {reason}")]
    SourceHash { path: PathBuf, reason: String },
    #[error("permission was denied while testing if {0} was available")]
    PermissionDenied(PathBuf),
    #[error("unexpected error while testing if {path} was available: {reason}")]
    Probe { path: PathBuf, reason: String },
}

/// Turns a [`CandidatePath`] into a free destination, probing `-NNN` suffixes on collision.
#[derive(Debug, Clone)]
pub struct DestinationResolver<P = LocalFs> {
    root: PathBuf,
    max_suffix: usize,
    probe: P,
}

impl DestinationResolver<LocalFs> {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ResolveError> {
        Self::with_probe(root, LocalFs)
    }
}

impl<P: FileProbe> DestinationResolver<P> {
    pub fn with_probe(root: impl Into<PathBuf>, probe: P) -> Result<Self, ResolveError> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(ResolveError::MissingRoot);
        }
        Ok(Self {
            root,
            max_suffix: DEFAULT_MAX_SUFFIX,
            probe,
        })
    }

    /// At least the unsuffixed candidate is always probed.
    pub fn with_max_suffix(mut self, max_suffix: usize) -> Self {
        self.max_suffix = max_suffix.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(
        &self,
        source: &Path,
        candidate: &CandidatePath,
    ) -> Result<Resolution, ResolveError> {
        let source_facts = match self.probe.probe(source) {
            Ok(Some(facts)) => facts,
            Ok(None) => {
                return Err(ResolveError::SourceUnavailable {
                    path: source.to_path_buf(),
                    reason: "file does not exist".to_string(),
                })
            }
            Err(err) => {
                return Err(ResolveError::SourceUnavailable {
                    path: source.to_path_buf(),
                    reason: err.to_string(),
                })
            }
        };

        // hashed lazily on the first collision, then reused
        let mut source_hash: Option<String> = None;

        for suffix_index in 0..self.max_suffix {
            let target = candidate.path(&self.root, suffix_index);
            debug!("probing {} (suffix {suffix_index})", target.display());

            let occupant = match self.probe.probe(&target) {
                Ok(None) => return Ok(Resolution::Resolved(target)),
                Ok(Some(facts)) => facts,
                Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                    return Err(ResolveError::PermissionDenied(target))
                }
                Err(err) => {
                    return Err(ResolveError::Probe {
                        path: target,
                        reason: err.to_string(),
                    })
                }
            };

            if occupant.identity == source_facts.identity {
                warn!(
                    "{} and {} are the same file",
                    source.display(),
                    target.display()
                );
                return Ok(Resolution::SameFileAsSource(target));
            }

            let source_sum = match &source_hash {
                Some(sum) => sum.clone(),
                None => {
                    let sum = self.probe.content_hash(source).map_err(|err| {
                        ResolveError::SourceHash {
                            path: source.to_path_buf(),
                            reason: err.to_string(),
                        }
                    })?;
                    source_hash = Some(sum.clone());
                    sum
                }
            };

            let occupant_sum = match self.probe.content_hash(&target) {
                Ok(sum) => sum,
                Err(err) => {
                    warn!(
                        "couldn't checksum {}, trying another name: {err}",
                        target.display()
                    );
                    continue;
                }
            };

            if source_facts.size == occupant.size && source_sum == occupant_sum {
                info!(
                    "{} has the same size and sha256 sum as {}",
                    target.display(),
                    source.display()
                );
                return Ok(Resolution::Duplicate(target));
            }

            debug!("{} holds different content, trying another name", target.display());
        }

        Ok(Resolution::Exhausted {
            attempts: self.max_suffix,
        })
    }
}
