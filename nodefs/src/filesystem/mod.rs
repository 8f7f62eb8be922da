//! The `Filesystem` façade: a named, feature-aware decorator chain plus the
//! options nodes consult (image detection, default checksum).

pub mod config;

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use url::Url;
use crate::error::{FsError, Result};
use crate::node::{Directory, File, Image, KnownMetadata, Node, NodeKind, NodePath};
use crate::storage::{Feature, Link, Operator, StorageAdapter, UrlPrefixAdapter, Visibility};

pub use config::{ChecksumConfig, ConfigError, FilesystemConfig, ImageConfig};

/// A named filesystem.
///
/// Every call goes through an [`Operator`] sitting on top of the adapter chain,
/// so optional features are checked before anything reaches the backend.
/// Nodes borrow the filesystem; replacing the backend with [`Filesystem::swap`]
/// therefore needs every node to be dropped first.
//
// // 命名文件系统。所有调用都经过位于链顶端的 Operator。
#[derive(Debug)]
pub struct Filesystem {
    name: String,
    operator: Operator,
    image: ImageConfig,
    checksum: ChecksumConfig,
}

impl Filesystem {
    pub fn new<A: StorageAdapter + 'static>(name: impl Into<String>, adapter: A) -> Self {
        Self::from_link(name, Box::new(adapter))
    }

    /// 用已经组装好的装饰器链创建文件系统。
    pub fn from_link(name: impl Into<String>, adapter: Link) -> Self {
        Self {
            name: name.into(),
            operator: Operator::new(adapter),
            image: ImageConfig::default(),
            checksum: ChecksumConfig::default(),
        }
    }

    /// Builds a filesystem from its configuration. When URL prefixes are
    /// configured the adapter is wrapped in a [`UrlPrefixAdapter`].
    pub fn from_config(config: &FilesystemConfig, adapter: Link) -> Result<Self> {
        let adapter: Link = if config.url_prefixes.is_empty() {
            adapter
        } else {
            Box::new(UrlPrefixAdapter::new(adapter, config.url_prefixes.iter())?)
        };
        tracing::debug!(name = %config.name, prefixes = config.url_prefixes.len(), "filesystem from config");
        Ok(Self::from_link(config.name.clone(), adapter)
            .with_image_config(config.image)
            .with_checksum_config(config.checksum))
    }

    pub fn with_image_config(mut self, image: ImageConfig) -> Self {
        self.image = image;
        self
    }

    pub fn with_checksum_config(mut self, checksum: ChecksumConfig) -> Self {
        self.checksum = checksum;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// 以 trait 对象形式访问整条链，用于原始存储操作。
    pub fn storage(&self) -> &dyn StorageAdapter {
        &self.operator
    }

    pub fn image_config(&self) -> ImageConfig {
        self.image
    }

    pub fn checksum_config(&self) -> ChecksumConfig {
        self.checksum
    }

    pub fn supports(&self, feature: Feature) -> bool {
        self.operator.supports(feature)
    }

    /// 替换链底部的具体后端，返回被替换的后端。
    pub fn swap(&mut self, adapter: Link) -> Result<Link> {
        self.operator.swap(adapter)
    }

    // --- 节点 ---

    pub fn has(&self, path: &str) -> Result<bool> {
        let path = NodePath::new(path);
        Ok(self.storage().file_exists(path.as_str())? || self.storage().directory_exists(path.as_str())?)
    }

    /// 返回路径上的节点；文件总是以 `Node::File` 返回，需要图片时调用 `ensure_image`。
    pub fn node(&self, path: &str) -> Result<Node<'_>> {
        let path = NodePath::new(path);
        if self.storage().file_exists(path.as_str())? {
            return Ok(Node::File(File::new(self, path)));
        }
        if self.storage().directory_exists(path.as_str())? {
            return Ok(Node::Directory(Directory::new(self, path)));
        }
        Err(FsError::NotFound(path.to_string()))
    }

    pub fn file(&self, path: &str) -> Result<File<'_>> {
        self.node(path)?.into_file()
    }

    pub fn directory(&self, path: &str) -> Result<Directory<'_>> {
        self.node(path)?.into_directory()
    }

    pub fn image(&self, path: &str) -> Result<Image<'_>> {
        self.file(path)?.ensure_image()
    }

    // --- 写操作 ---

    pub fn write(&self, path: &str, contents: &[u8]) -> Result<File<'_>> {
        let path = NodePath::new(path);
        if path.is_root() {
            return Err(FsError::mismatch(path.as_str(), NodeKind::File));
        }
        self.storage().write(path.as_str(), contents)?;
        let known = KnownMetadata {
            size: Some(contents.len() as u64),
            ..KnownMetadata::default()
        };
        Ok(File::with_metadata(self, path, known))
    }

    pub fn write_stream(&self, path: &str, contents: &mut dyn Read) -> Result<File<'_>> {
        let path = NodePath::new(path);
        if path.is_root() {
            return Err(FsError::mismatch(path.as_str(), NodeKind::File));
        }
        self.storage().write_stream(path.as_str(), contents)?;
        Ok(File::new(self, path))
    }

    pub fn copy(&self, source: &str, destination: &str) -> Result<File<'_>> {
        let source = NodePath::new(source);
        let destination = NodePath::new(destination);
        self.storage().copy(source.as_str(), destination.as_str())?;
        Ok(File::new(self, destination))
    }

    pub fn move_file(&self, source: &str, destination: &str) -> Result<File<'_>> {
        let source = NodePath::new(source);
        let destination = NodePath::new(destination);
        self.storage().move_file(source.as_str(), destination.as_str())?;
        Ok(File::new(self, destination))
    }

    /// 删除文件或 (递归) 删除目录。路径不存在时什么也不做。
    pub fn delete(&self, path: &str) -> Result<()> {
        let path = NodePath::new(path);
        if self.storage().directory_exists(path.as_str())? {
            self.storage().delete_directory(path.as_str())
        } else {
            self.storage().delete(path.as_str())
        }
    }

    pub fn mkdir(&self, path: &str) -> Result<Directory<'_>> {
        let path = NodePath::new(path);
        self.storage().create_directory(path.as_str())?;
        Ok(Directory::new(self, path))
    }

    pub fn chmod(&self, path: &str, visibility: Visibility) -> Result<Node<'_>> {
        let node = self.node(path)?;
        self.storage().set_visibility(node.path().as_str(), visibility)?;
        Ok(node)
    }

    // --- 可选特性 ---

    pub fn public_url(&self, path: &str) -> Result<Url> {
        self.operator.public_url(NodePath::new(path).as_str())
    }

    pub fn real_file(&self, path: &str) -> Result<PathBuf> {
        self.operator.real_file(NodePath::new(path).as_str())
    }

    pub fn modify_in_place<R, F>(&self, path: &str, callback: F) -> Result<R>
    where
        F: FnOnce(&Path) -> io::Result<R>,
    {
        self.operator.modify_in_place(NodePath::new(path).as_str(), callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryAdapter;

    fn memory_fs() -> Filesystem {
        Filesystem::new("test", MemoryAdapter::new())
    }

    #[test]
    fn test_node_classification() {
        let fs = memory_fs();
        fs.write("docs/readme.txt", b"hello").unwrap();

        assert!(fs.has("docs").unwrap());
        assert!(fs.has("/docs/readme.txt").unwrap());
        assert!(!fs.has("missing").unwrap());

        assert_eq!(fs.node("docs").unwrap().kind(), NodeKind::Directory);
        assert_eq!(fs.node("docs/readme.txt").unwrap().kind(), NodeKind::File);
        assert!(matches!(fs.node("missing"), Err(FsError::NotFound(p)) if p == "missing"));
    }

    #[test]
    fn test_write_returns_file_with_known_size() {
        let fs = memory_fs();
        let file = fs.write("a/b.txt", b"12345").unwrap();
        assert_eq!(file.path().as_str(), "a/b.txt");
        assert_eq!(file.known_metadata().size, Some(5));
        assert_eq!(file.contents().unwrap(), b"12345");
    }

    #[test]
    fn test_write_to_root_is_rejected() {
        let fs = memory_fs();
        assert!(matches!(fs.write("/", b"x"), Err(FsError::NodeTypeMismatch { .. })));
    }

    #[test]
    fn test_copy_move_delete() {
        let fs = memory_fs();
        fs.write("one.txt", b"1").unwrap();

        let copy = fs.copy("one.txt", "two.txt").unwrap();
        assert_eq!(copy.contents().unwrap(), b"1");

        let moved = fs.move_file("two.txt", "nested/three.txt").unwrap();
        assert!(moved.exists().unwrap());
        assert!(!fs.has("two.txt").unwrap());

        fs.delete("nested").unwrap();
        assert!(!fs.has("nested/three.txt").unwrap());
        fs.delete("one.txt").unwrap();
        fs.delete("one.txt").unwrap();
        assert!(!fs.has("one.txt").unwrap());
    }

    #[test]
    fn test_path_is_never_file_and_directory() {
        let fs = memory_fs();
        fs.write("a", b"file").unwrap();

        assert!(matches!(fs.write("a/b.txt", b"x"), Err(FsError::NodeTypeMismatch { .. })));
        assert!(matches!(fs.mkdir("a"), Err(FsError::NodeTypeMismatch { .. })));
        assert_eq!(fs.node("a").unwrap().kind(), NodeKind::File);

        fs.delete("a").unwrap();
        assert!(!fs.has("a").unwrap());
    }

    #[test]
    fn test_mkdir_and_chmod() {
        let fs = memory_fs();
        let dir = fs.mkdir("private").unwrap();
        assert!(dir.exists().unwrap());

        fs.write("private/key.pem", b"secret").unwrap();
        fs.chmod("private/key.pem", Visibility::Private).unwrap();
        assert_eq!(fs.file("private/key.pem").unwrap().visibility().unwrap(), Visibility::Private);
    }

    #[test]
    fn test_from_config_adds_url_feature() {
        let mut config = FilesystemConfig::new("cdn");
        assert!(!Filesystem::from_config(&config, Box::new(MemoryAdapter::new()))
            .unwrap()
            .supports(Feature::Url));

        config.url_prefixes.push("https://cdn.example.com".to_string());
        let fs = Filesystem::from_config(&config, Box::new(MemoryAdapter::new())).unwrap();
        assert_eq!(fs.name(), "cdn");
        assert!(fs.supports(Feature::Url));
        assert_eq!(
            fs.public_url("img/a.png").unwrap().as_str(),
            "https://cdn.example.com/img/a.png"
        );
    }
}
