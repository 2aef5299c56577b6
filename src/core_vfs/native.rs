use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use async_trait::async_trait;
use filetime::FileTime;
use log::debug;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncRead, AsyncSeekExt, AsyncWrite};

use super::{DirEntryInfo, FileObject, FileSystemFactory, FileSystemView, FsError};
use crate::core_vfs::normalize_virtual_path;

/// Creates local-disk views rooted at the configured server root. Every
/// session gets its own view; the root itself is canonicalized once at
/// startup.
pub struct NativeFileSystemFactory {
    root: PathBuf,
}

impl NativeFileSystemFactory {
    pub fn new(root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to canonicalize root directory: {:?}", root))?;
        Ok(NativeFileSystemFactory { root })
    }
}

impl FileSystemFactory for NativeFileSystemFactory {
    fn create_view(&self, _user: &str) -> Result<Box<dyn FileSystemView>> {
        Ok(Box::new(NativeView {
            root: self.root.clone(),
            current_dir: String::from("/"),
        }))
    }
}

/// Chroot-style view of one directory tree. Client paths are normalized
/// lexically before they touch the disk, so a resolved path is inside the
/// root by construction.
pub struct NativeView {
    root: PathBuf,
    current_dir: String,
}

impl NativeView {
    fn real_path(&self, virtual_path: &str) -> PathBuf {
        self.root.join(virtual_path.trim_start_matches('/'))
    }
}

#[async_trait]
impl FileSystemView for NativeView {
    fn current_directory(&self) -> &str {
        &self.current_dir
    }

    async fn change_directory(&mut self, path: &str) -> bool {
        let target = normalize_virtual_path(&self.current_dir, path);
        match fs::metadata(self.real_path(&target)).await {
            Ok(metadata) if metadata.is_dir() => {
                self.current_dir = target;
                true
            }
            _ => false,
        }
    }

    async fn resolve(&self, path: &str) -> Result<Box<dyn FileObject>, FsError> {
        let virtual_path = normalize_virtual_path(&self.current_dir, path);
        let real_path = self.real_path(&virtual_path);
        let metadata = match fs::metadata(&real_path).await {
            Ok(metadata) => Some(metadata),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                debug!("metadata failed for {:?}: {}", real_path, err);
                return Err(FsError::Io(err));
            }
        };
        let parent_exists = match real_path.parent() {
            Some(parent) => fs::metadata(parent)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false),
            None => false,
        };
        Ok(Box::new(NativeFile {
            virtual_path,
            real_path,
            metadata,
            parent_exists,
        }))
    }

    async fn rename(&self, source: &dyn FileObject, target: &dyn FileObject) -> bool {
        let from = self.real_path(source.full_name());
        let to = self.real_path(target.full_name());
        fs::rename(&from, &to).await.is_ok()
    }
}

pub struct NativeFile {
    virtual_path: String,
    real_path: PathBuf,
    metadata: Option<std::fs::Metadata>,
    parent_exists: bool,
}

#[async_trait]
impl FileObject for NativeFile {
    fn full_name(&self) -> &str {
        &self.virtual_path
    }

    fn exists(&self) -> bool {
        self.metadata.is_some()
    }

    fn is_directory(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.is_dir())
    }

    fn is_file(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.is_file())
    }

    fn can_read(&self) -> bool {
        self.metadata.is_some()
    }

    fn can_write(&self) -> bool {
        match &self.metadata {
            Some(metadata) => !metadata.permissions().readonly(),
            // A missing file is writable when its parent directory exists.
            None => self.parent_exists,
        }
    }

    fn can_delete(&self) -> bool {
        self.metadata
            .as_ref()
            .is_some_and(|m| !m.permissions().readonly())
    }

    fn can_rename(&self) -> bool {
        self.can_delete()
    }

    fn can_mkdir(&self) -> bool {
        self.metadata.is_none() && self.parent_exists
    }

    fn size(&self) -> u64 {
        self.metadata.as_ref().map(|m| m.len()).unwrap_or(0)
    }

    fn modified(&self) -> Option<SystemTime> {
        self.metadata.as_ref().and_then(|m| m.modified().ok())
    }

    async fn delete(&self) -> bool {
        let result = if self.is_directory() {
            fs::remove_dir(&self.real_path).await
        } else {
            fs::remove_file(&self.real_path).await
        };
        if let Err(err) = &result {
            debug!("delete failed for {:?}: {}", self.real_path, err);
        }
        result.is_ok()
    }

    async fn mkdir(&self) -> bool {
        fs::create_dir(&self.real_path).await.is_ok()
    }

    async fn set_modified(&self, mtime: SystemTime) -> bool {
        filetime::set_file_mtime(&self.real_path, FileTime::from_system_time(mtime)).is_ok()
    }

    async fn open_read(&self, offset: u64) -> io::Result<Box<dyn AsyncRead + Send + Unpin>> {
        let mut file = fs::File::open(&self.real_path).await?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset)).await?;
        }
        Ok(Box::new(file))
    }

    async fn open_write(&self, offset: u64) -> io::Result<Box<dyn AsyncWrite + Send + Unpin>> {
        let file = if offset == 0 {
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.real_path)
                .await?
        } else {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .open(&self.real_path)
                .await?;
            file.seek(SeekFrom::Start(offset)).await?;
            file
        };
        Ok(Box::new(file))
    }

    async fn list(&self) -> io::Result<Vec<DirEntryInfo>> {
        if self.is_file() {
            return Ok(vec![DirEntryInfo {
                name: self
                    .virtual_path
                    .rsplit('/')
                    .next()
                    .unwrap_or(&self.virtual_path)
                    .to_string(),
                is_dir: false,
                size: self.size(),
                modified: self.modified(),
            }]);
        }
        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(&self.real_path).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(_) => continue,
            };
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: metadata.is_dir(),
                size: metadata.len(),
                modified: metadata.modified().ok(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
