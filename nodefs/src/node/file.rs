use std::io::Read;
use std::path::PathBuf;
use std::sync::OnceLock;
use chrono::{DateTime, Utc};
use url::Url;
use crate::common::checksum::{Checksum, ChecksumAlgorithm, ChecksumMode};
use crate::common::constants::IMAGE_EXTENSIONS;
use crate::common::mime;
use crate::error::{FsError, Result};
use crate::filesystem::Filesystem;
use crate::storage::{Feature, Visibility};
use super::{lazy, seeded, Image, KnownMetadata, NodeKind, NodeMeta, NodePath};

/// A file in a [`Filesystem`].
///
/// Size, mime type, visibility, modification time and the default checksum
/// are fetched on first access and cached on the instance.
//
// // 文件节点。元数据首次访问时从后端获取并缓存在实例上。
#[derive(Debug, Clone)]
pub struct File<'fs> {
    meta: NodeMeta<'fs>,
    size: OnceLock<u64>,
    mime_type: OnceLock<String>,
    checksum: OnceLock<Checksum>,
}

impl<'fs> File<'fs> {
    pub fn new(fs: &'fs Filesystem, path: impl Into<NodePath>) -> Self {
        Self::with_metadata(fs, path, KnownMetadata::default())
    }

    /// 使用已知的元数据构造文件节点，这些值不会再向后端查询。
    pub fn with_metadata(fs: &'fs Filesystem, path: impl Into<NodePath>, known: KnownMetadata) -> Self {
        Self {
            meta: NodeMeta::new(fs, path.into(), known.visibility, known.last_modified),
            size: seeded(known.size),
            mime_type: seeded(known.mime_type),
            checksum: seeded(known.checksum),
        }
    }

    pub fn path(&self) -> &NodePath {
        &self.meta.path
    }

    pub fn filesystem(&self) -> &'fs Filesystem {
        self.meta.fs
    }

    pub fn visibility(&self) -> Result<Visibility> {
        self.meta.visibility()
    }

    pub fn last_modified(&self) -> Result<DateTime<Utc>> {
        self.meta.last_modified()
    }

    pub fn size(&self) -> Result<u64> {
        lazy(&self.size, || {
            tracing::trace!(path = %self.path(), "fetching file size");
            self.meta.fs.storage().file_size(self.path().as_str())
        })
        .copied()
    }

    pub fn mime_type(&self) -> Result<&str> {
        lazy(&self.mime_type, || {
            tracing::trace!(path = %self.path(), "fetching mime type");
            self.meta.fs.storage().mime_type(self.path().as_str())
        })
        .map(String::as_str)
    }

    /// Checksum using the filesystem's configured algorithm and mode. Cached.
    pub fn checksum(&self) -> Result<&Checksum> {
        lazy(&self.checksum, || {
            let config = self.meta.fs.checksum_config();
            self.compute_checksum(config.algorithm, config.mode)
        })
    }

    /// Checksum with an explicit algorithm and mode.
    ///
    /// Reuses the cached default checksum when it already matches the
    /// request; otherwise computes a fresh one without touching the cache.
    pub fn checksum_with(&self, algorithm: ChecksumAlgorithm, mode: ChecksumMode) -> Result<Checksum> {
        if let Some(cached) = self.checksum.get()
            && cached.algorithm() == algorithm
            && cached.mode() == mode
        {
            return Ok(cached.clone());
        }
        self.compute_checksum(algorithm, mode)
    }

    fn compute_checksum(&self, algorithm: ChecksumAlgorithm, mode: ChecksumMode) -> Result<Checksum> {
        match mode {
            ChecksumMode::Metadata => {
                let size = self.size()?;
                let timestamp = self.last_modified()?.timestamp();
                Ok(Checksum::from_metadata(algorithm, size, timestamp))
            }
            ChecksumMode::Content => {
                let operator = self.meta.fs.operator();
                let value = if operator.supports(Feature::Checksum) {
                    operator.checksum_for(self.path().as_str(), algorithm)?
                } else {
                    // 后端没有原生校验和，流式读取内容自行计算
                    tracing::debug!(path = %self.path(), %algorithm, "hashing file contents");
                    let mut reader = self.read()?;
                    algorithm.hash_reader(reader.as_mut())?
                };
                Ok(Checksum::new(algorithm, mode, value))
            }
        }
    }

    /// 读取完整内容。内容不缓存。
    pub fn contents(&self) -> Result<Vec<u8>> {
        self.meta.fs.storage().read(self.path().as_str())
    }

    pub fn read(&self) -> Result<Box<dyn Read + Send>> {
        self.meta.fs.storage().read_stream(self.path().as_str())
    }

    /// 文件当前是否仍然存在。不缓存。
    pub fn exists(&self) -> Result<bool> {
        self.meta.fs.storage().file_exists(self.path().as_str())
    }

    pub fn public_url(&self) -> Result<Url> {
        self.meta.fs.operator().public_url(self.path().as_str())
    }

    pub fn real_file(&self) -> Result<PathBuf> {
        self.meta.fs.operator().real_file(self.path().as_str())
    }

    /// The extension that matches the file's mime type, falling back to the
    /// extension in the path.
    pub fn guess_extension(&self) -> Result<Option<String>> {
        let by_mime = mime::extension_for(self.mime_type()?);
        Ok(by_mime
            .map(str::to_string)
            .or_else(|| self.path().extension().map(str::to_string)))
    }

    /// Whether this file qualifies as an image.
    ///
    /// A known image extension decides immediately. An unknown extension is
    /// rejected without looking at the content unless mime checking is
    /// enabled; a missing extension always falls back to the mime type.
    pub fn is_image(&self) -> Result<bool> {
        if let Some(extension) = self.path().extension() {
            let extension = extension.to_ascii_lowercase();
            if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
                return Ok(true);
            }
            if !self.meta.fs.image_config().check_mime {
                return Ok(false);
            }
        }
        Ok(self.mime_type()?.starts_with("image/"))
    }

    /// Downcasts to an [`Image`] carrying every metadata value already
    /// resolved on this file.
    pub fn ensure_image(&self) -> Result<Image<'fs>> {
        if self.is_image()? {
            return Ok(Image::with_metadata(self.meta.fs, self.path().clone(), self.known_metadata()));
        }
        tracing::debug!(path = %self.path(), "file is not an image");
        Err(FsError::NodeTypeMismatch {
            path: self.path().to_string(),
            expected: NodeKind::Image,
            mime_type: self.mime_type().ok().map(str::to_string),
        })
    }

    /// 当前已缓存的元数据快照。
    pub fn known_metadata(&self) -> KnownMetadata {
        KnownMetadata {
            visibility: self.meta.known_visibility(),
            last_modified: self.meta.known_last_modified(),
            size: self.size.get().copied(),
            mime_type: self.mime_type.get().cloned(),
            checksum: self.checksum.get().cloned(),
        }
    }

    /// 清除缓存，下次访问时重新获取。
    pub fn refresh(&mut self) -> &mut Self {
        self.meta.refresh();
        self.size.take();
        self.mime_type.take();
        self.checksum.take();
        self
    }
}
