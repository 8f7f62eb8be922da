use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use crate::common::checksum::ChecksumAlgorithm;
use crate::common::constants::MIME_SNIFF_LEN;
use crate::common::mime;
use crate::error::{FsError, Result};
use crate::node::NodePath;
use super::{ChecksumFeature, Entry, Feature, FeatureSet, InPlaceModifyFeature, StorageAdapter, Visibility};

/// 基于本地文件系统的存储后端实现
///
/// 原生提供两个可选特性:
/// - `Checksum`: 直接对磁盘文件做流式哈希，内容无需经过装饰器链；
/// - `InPlaceModify`: 返回真实的磁盘路径，而不是临时副本。
#[derive(Debug)]
pub struct LocalAdapter {
    /// 存储根目录
    root_path: PathBuf,
}

impl LocalAdapter {
    const FEATURES: FeatureSet = FeatureSet::of(&[Feature::Checksum, Feature::InPlaceModify]);

    /// 创建后端，根目录不存在时自动创建。
    pub fn new(root_path: &Path) -> Result<Self> {
        fs::create_dir_all(root_path)?;
        Ok(Self {
            root_path: root_path.to_path_buf(),
        })
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// 获取相对路径对应的磁盘路径。路径先经 `NodePath` 规范化，".." 无法越出根目录。
    fn full_path(&self, path: &str) -> PathBuf {
        let path = NodePath::new(path);
        let mut full = self.root_path.clone();
        for segment in path.as_str().split('/').filter(|s| !s.is_empty()) {
            full.push(segment);
        }
        full
    }

    fn relative(&self, full: &Path) -> String {
        let relative = full.strip_prefix(&self.root_path).unwrap_or(full);
        NodePath::new(relative.to_string_lossy()).as_str().to_string()
    }

    fn metadata(&self, path: &str) -> Result<fs::Metadata> {
        fs::metadata(self.full_path(path)).map_err(|e| FsError::from_io(e, path))
    }

    fn ensure_parent(full: &Path) -> io::Result<()> {
        match full.parent() {
            Some(parent) => fs::create_dir_all(parent),
            None => Ok(()),
        }
    }

    /// 先写入同目录下的临时文件，再原子重命名为目标文件。
    fn persist(&self, path: &str, source: &mut dyn Read) -> Result<()> {
        let full = self.full_path(path);
        Self::ensure_parent(&full)?;
        let dir = full.parent().unwrap_or(self.root_path.as_path());
        // 关键点：必须在同一文件系统下创建临时文件，才能保证后续 rename 是原子操作
        let mut temp_file = NamedTempFile::new_in(dir)?;
        io::copy(source, &mut temp_file)?;
        temp_file.flush()?;

        // 临时文件默认是 0600；覆盖时沿用旧文件的权限，新文件则设为公开
        let previous = fs::metadata(&full).ok().map(|m| m.permissions());
        temp_file.persist(&full).map_err(|e| e.error)?;
        match previous {
            Some(permissions) => fs::set_permissions(&full, permissions)?,
            None => apply_visibility(&full, false, Visibility::Public)?,
        }
        tracing::debug!(path, "local file written");
        Ok(())
    }

    fn entry_for(&self, full: &Path, meta: &fs::Metadata) -> Entry {
        let path = self.relative(full);
        let base = if meta.is_dir() { Entry::directory(path) } else { Entry::file(path) };
        Entry {
            size: meta.is_file().then(|| meta.len()),
            last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
            visibility: Some(visibility_of(meta)),
            ..base
        }
    }
}

#[cfg(unix)]
fn visibility_of(meta: &fs::Metadata) -> Visibility {
    use std::os::unix::fs::PermissionsExt;
    // "其他用户" 可读即视为公开
    if meta.permissions().mode() & 0o004 != 0 {
        Visibility::Public
    } else {
        Visibility::Private
    }
}

#[cfg(not(unix))]
fn visibility_of(meta: &fs::Metadata) -> Visibility {
    if meta.permissions().readonly() {
        Visibility::Private
    } else {
        Visibility::Public
    }
}

#[cfg(unix)]
fn apply_visibility(full: &Path, is_dir: bool, visibility: Visibility) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mode = match (is_dir, visibility) {
        (false, Visibility::Public) => 0o644,
        (false, Visibility::Private) => 0o600,
        (true, Visibility::Public) => 0o755,
        (true, Visibility::Private) => 0o700,
    };
    fs::set_permissions(full, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn apply_visibility(full: &Path, _is_dir: bool, visibility: Visibility) -> io::Result<()> {
    let mut permissions = fs::metadata(full)?.permissions();
    permissions.set_readonly(visibility == Visibility::Private);
    fs::set_permissions(full, permissions)
}

impl StorageAdapter for LocalAdapter {
    fn file_exists(&self, path: &str) -> Result<bool> {
        Ok(self.full_path(path).is_file())
    }

    fn directory_exists(&self, path: &str) -> Result<bool> {
        Ok(self.full_path(path).is_dir())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        fs::read(self.full_path(path)).map_err(|e| FsError::from_io(e, path))
    }

    fn read_stream(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        let file = File::open(self.full_path(path)).map_err(|e| FsError::from_io(e, path))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn write(&self, path: &str, contents: &[u8]) -> Result<()> {
        self.persist(path, &mut io::Cursor::new(contents))
    }

    fn write_stream(&self, path: &str, contents: &mut dyn Read) -> Result<()> {
        self.persist(path, contents)
    }

    fn delete(&self, path: &str) -> Result<()> {
        let full = self.full_path(path);
        if full.is_file() {
            fs::remove_file(full)?;
        }
        // 如果文件不存在，视作删除成功（幂等性）
        Ok(())
    }

    fn delete_directory(&self, path: &str) -> Result<()> {
        let full = self.full_path(path);
        if full.is_dir() {
            fs::remove_dir_all(full)?;
        }
        Ok(())
    }

    fn create_directory(&self, path: &str) -> Result<()> {
        fs::create_dir_all(self.full_path(path))?;
        Ok(())
    }

    fn move_file(&self, source: &str, destination: &str) -> Result<()> {
        let (from, to) = (self.full_path(source), self.full_path(destination));
        if !from.is_file() {
            return Err(FsError::NotFound(source.to_string()));
        }
        Self::ensure_parent(&to)?;
        fs::rename(from, to)?;
        Ok(())
    }

    fn copy(&self, source: &str, destination: &str) -> Result<()> {
        let (from, to) = (self.full_path(source), self.full_path(destination));
        Self::ensure_parent(&to)?;
        fs::copy(from, to).map_err(|e| FsError::from_io(e, source))?;
        Ok(())
    }

    fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<()> {
        let meta = self.metadata(path)?;
        apply_visibility(&self.full_path(path), meta.is_dir(), visibility)?;
        Ok(())
    }

    fn visibility(&self, path: &str) -> Result<Visibility> {
        Ok(visibility_of(&self.metadata(path)?))
    }

    fn mime_type(&self, path: &str) -> Result<String> {
        let file = File::open(self.full_path(path)).map_err(|e| FsError::from_io(e, path))?;
        let mut head = Vec::with_capacity(MIME_SNIFF_LEN);
        file.take(MIME_SNIFF_LEN as u64).read_to_end(&mut head)?;
        Ok(mime::detect(&head, NodePath::new(path).extension()))
    }

    fn last_modified(&self, path: &str) -> Result<DateTime<Utc>> {
        let modified = self.metadata(path)?.modified()?;
        Ok(DateTime::<Utc>::from(modified))
    }

    fn file_size(&self, path: &str) -> Result<u64> {
        Ok(self.metadata(path)?.len())
    }

    fn list_contents(&self, path: &str, deep: bool) -> Result<Vec<Entry>> {
        let root = self.full_path(path);
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut pending = vec![root];
        while let Some(dir) = pending.pop() {
            for item in fs::read_dir(&dir)? {
                let item = item?;
                let meta = item.metadata()?;
                let full = item.path();
                if deep && meta.is_dir() {
                    pending.push(full.clone());
                }
                entries.push(self.entry_for(&full, &meta));
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn features(&self) -> FeatureSet {
        Self::FEATURES
    }

    fn checksum_feature(&self) -> Option<&dyn ChecksumFeature> {
        Some(self)
    }

    fn in_place_feature(&self) -> Option<&dyn InPlaceModifyFeature> {
        Some(self)
    }
}

impl ChecksumFeature for LocalAdapter {
    fn checksum(&self, path: &str, algorithm: ChecksumAlgorithm) -> Result<String> {
        let file = File::open(self.full_path(path)).map_err(|e| FsError::from_io(e, path))?;
        Ok(algorithm.hash_reader(&mut BufReader::new(file))?)
    }
}

impl InPlaceModifyFeature for LocalAdapter {
    fn real_file(&self, path: &str) -> Result<PathBuf> {
        let full = self.full_path(path);
        if !full.is_file() {
            return Err(FsError::NotFound(path.to_string()));
        }
        Ok(full)
    }
}
