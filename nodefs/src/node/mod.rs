//! File / directory / image nodes over a [`Filesystem`].
//!
//! Metadata on a node is fetched lazily: the first access asks the backend,
//! later accesses reuse the cached value until `refresh()` clears it. A failed
//! fetch caches nothing, so the next access tries again.

pub mod directory;
pub mod file;
pub mod image;
pub mod path;

use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;
use chrono::{DateTime, Utc};
use crate::common::checksum::Checksum;
use crate::error::{FsError, Result};
use crate::filesystem::Filesystem;
use crate::storage::{Entry, EntryKind, Visibility};

pub use directory::Directory;
pub use file::File;
pub use image::Image;
pub use path::NodePath;

/// 节点的形态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Directory,
    Image,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::File => "a file",
            NodeKind::Directory => "a directory",
            NodeKind::Image => "an image",
        })
    }
}

/// Metadata that is already resolved and can be handed to a new node instead
/// of being fetched again. `None` means "not fetched yet".
//
// // 已经解析过的元数据。在节点换形态 (例如 File -> Image) 时随之转移，避免重复访问后端。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnownMetadata {
    pub visibility: Option<Visibility>,
    pub last_modified: Option<DateTime<Utc>>,
    pub size: Option<u64>,
    pub mime_type: Option<String>,
    pub checksum: Option<Checksum>,
}

impl KnownMetadata {
    /// 从目录列表条目中提取后端已经给出的元数据。
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            visibility: entry.visibility,
            last_modified: entry.last_modified,
            size: entry.size,
            mime_type: entry.mime_type.clone(),
            checksum: None,
        }
    }
}

pub(crate) fn seeded<T>(value: Option<T>) -> OnceLock<T> {
    let cell = OnceLock::new();
    if let Some(value) = value {
        let _ = cell.set(value);
    }
    cell
}

/// 读取缓存；未缓存时调用 `fetch`，成功才写入缓存。
pub(crate) fn lazy<'a, T>(cell: &'a OnceLock<T>, fetch: impl FnOnce() -> Result<T>) -> Result<&'a T> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = fetch()?;
    Ok(cell.get_or_init(|| value))
}

/// 文件与目录共有的部分: 不可变的路径、后端句柄、可见性与修改时间缓存。
#[derive(Debug, Clone)]
pub(crate) struct NodeMeta<'fs> {
    pub(crate) path: NodePath,
    pub(crate) fs: &'fs Filesystem,
    visibility: OnceLock<Visibility>,
    last_modified: OnceLock<DateTime<Utc>>,
}

impl<'fs> NodeMeta<'fs> {
    pub(crate) fn new(
        fs: &'fs Filesystem,
        path: NodePath,
        visibility: Option<Visibility>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            path,
            fs,
            visibility: seeded(visibility),
            last_modified: seeded(last_modified),
        }
    }

    pub(crate) fn visibility(&self) -> Result<Visibility> {
        lazy(&self.visibility, || {
            tracing::trace!(path = %self.path, "fetching visibility");
            self.fs.storage().visibility(self.path.as_str())
        })
        .copied()
    }

    pub(crate) fn last_modified(&self) -> Result<DateTime<Utc>> {
        lazy(&self.last_modified, || {
            tracing::trace!(path = %self.path, "fetching last modified");
            self.fs.storage().last_modified(self.path.as_str())
        })
        .copied()
    }

    pub(crate) fn known_visibility(&self) -> Option<Visibility> {
        self.visibility.get().copied()
    }

    pub(crate) fn known_last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified.get().copied()
    }

    pub(crate) fn refresh(&mut self) {
        self.visibility.take();
        self.last_modified.take();
    }
}

/// 存储中的一个条目: 文件、图片或目录，三者互斥。
#[derive(Debug, Clone)]
pub enum Node<'fs> {
    File(File<'fs>),
    Image(Image<'fs>),
    Directory(Directory<'fs>),
}

impl<'fs> Node<'fs> {
    /// 根据列表条目构造节点，条目里已有的元数据直接填入缓存。
    pub fn from_entry(fs: &'fs Filesystem, entry: Entry) -> Self {
        let known = KnownMetadata::from_entry(&entry);
        match entry.kind {
            EntryKind::File => Node::File(File::with_metadata(fs, entry.path, known)),
            EntryKind::Directory => Node::Directory(Directory::with_metadata(
                fs,
                entry.path,
                known.visibility,
                known.last_modified,
            )),
        }
    }

    pub fn path(&self) -> &NodePath {
        match self {
            Node::File(file) => file.path(),
            Node::Image(image) => image.path(),
            Node::Directory(dir) => dir.path(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::File(_) => NodeKind::File,
            Node::Image(_) => NodeKind::Image,
            Node::Directory(_) => NodeKind::Directory,
        }
    }

    /// 图片也是文件。
    pub fn is_file(&self) -> bool {
        !self.is_directory()
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    pub fn visibility(&self) -> Result<Visibility> {
        match self {
            Node::File(file) => file.visibility(),
            Node::Image(image) => image.visibility(),
            Node::Directory(dir) => dir.visibility(),
        }
    }

    pub fn last_modified(&self) -> Result<DateTime<Utc>> {
        match self {
            Node::File(file) => file.last_modified(),
            Node::Image(image) => image.last_modified(),
            Node::Directory(dir) => dir.last_modified(),
        }
    }

    /// 清除所有已缓存的元数据。
    pub fn refresh(&mut self) -> &mut Self {
        match self {
            Node::File(file) => {
                file.refresh();
            }
            Node::Image(image) => {
                image.refresh();
            }
            Node::Directory(dir) => {
                dir.refresh();
            }
        }
        self
    }

    pub fn ensure_file(&self) -> Result<&File<'fs>> {
        match self {
            Node::File(file) => Ok(file),
            Node::Image(image) => Ok(image.as_file()),
            Node::Directory(dir) => Err(FsError::mismatch(dir.path().as_str(), NodeKind::File)),
        }
    }

    pub fn ensure_directory(&self) -> Result<&Directory<'fs>> {
        match self {
            Node::Directory(dir) => Ok(dir),
            other => Err(FsError::mismatch(other.path().as_str(), NodeKind::Directory)),
        }
    }

    /// An image node is returned as-is (borrowed, no new instance). A file that
    /// qualifies as an image becomes a new `Image` carrying every piece of
    /// metadata the file already resolved.
    pub fn ensure_image(&self) -> Result<Cow<'_, Image<'fs>>> {
        match self {
            Node::Image(image) => Ok(Cow::Borrowed(image)),
            Node::File(file) => file.ensure_image().map(Cow::Owned),
            Node::Directory(dir) => Err(FsError::mismatch(dir.path().as_str(), NodeKind::Image)),
        }
    }

    pub fn into_file(self) -> Result<File<'fs>> {
        match self {
            Node::File(file) => Ok(file),
            Node::Image(image) => Ok(image.into_file()),
            Node::Directory(dir) => Err(FsError::mismatch(dir.path().as_str(), NodeKind::File)),
        }
    }

    pub fn into_directory(self) -> Result<Directory<'fs>> {
        match self {
            Node::Directory(dir) => Ok(dir),
            other => Err(FsError::mismatch(other.path().as_str(), NodeKind::Directory)),
        }
    }

    pub fn into_image(self) -> Result<Image<'fs>> {
        match self {
            Node::Image(image) => Ok(image),
            Node::File(file) => file.ensure_image(),
            Node::Directory(dir) => Err(FsError::mismatch(dir.path().as_str(), NodeKind::Image)),
        }
    }
}
