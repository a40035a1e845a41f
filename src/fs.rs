//! Whole-file reads and writes behind a small trait.
//!
//! [`HostFs`] touches any path. [`SandboxFs`] resolves every path under a
//! workspace root and refuses anything that would land outside it.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Errors from the file-system abstraction
#[derive(Debug, Error)]
pub enum FsError {
    #[error("path {} is outside the workspace {}", .path.display(), .root.display())]
    OutsideWorkspace { path: PathBuf, root: PathBuf },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        FsError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Whole-file access used by the tools
#[async_trait]
pub trait FileSystem: Send + Sync + std::fmt::Debug {
    /// Read the entire file
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError>;

    /// Replace the file's contents, creating parent directories as needed
    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<(), FsError>;
}

/// Unrestricted access to the host file system
#[derive(Debug, Clone, Default)]
pub struct HostFs;

#[async_trait]
impl FileSystem for HostFs {
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        tokio::fs::read(path).await.map_err(|e| FsError::io(path, e))
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        write_creating_parents(path, data).await
    }
}

/// File access confined to one workspace directory
#[derive(Debug, Clone)]
pub struct SandboxFs {
    root: PathBuf,
}

impl SandboxFs {
    /// Relative roots are taken from the current directory
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, FsError> {
        let root = root.into();
        let absolute = if root.is_absolute() {
            root.clone()
        } else {
            std::env::current_dir()
                .map_err(|e| FsError::io(&root, e))?
                .join(&root)
        };
        let root = normalize_lexically(&absolute).ok_or_else(|| {
            FsError::io(
                &root,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "workspace root climbs above the file system root",
                ),
            )
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map `path` into the workspace.
    ///
    /// Relative paths are joined onto the root. The result is normalized
    /// without touching the disk and must still start with the root.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf, FsError> {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        match normalize_lexically(&joined) {
            Some(resolved) if resolved.starts_with(&self.root) => Ok(resolved),
            _ => Err(FsError::OutsideWorkspace {
                path: path.to_path_buf(),
                root: self.root.clone(),
            }),
        }
    }
}

#[async_trait]
impl FileSystem for SandboxFs {
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        let resolved = self.resolve(path)?;
        tokio::fs::read(&resolved)
            .await
            .map_err(|e| FsError::io(path, e))
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        let resolved = self.resolve(path)?;
        write_creating_parents(&resolved, data).await
    }
}

async fn write_creating_parents(path: &Path, data: &[u8]) -> Result<(), FsError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FsError::io(parent, e))?;
    }
    tokio::fs::write(path, data)
        .await
        .map_err(|e| FsError::io(path, e))
}

/// Drop `.` and fold `..` into its parent. `None` when a `..` has no
/// normal component left to cancel.
fn normalize_lexically(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                _ => return None,
            },
            other => out.push(other),
        }
    }
    Some(out)
}
