use chrono::{DateTime, Utc};
use crate::error::Result;
use crate::filesystem::Filesystem;
use crate::storage::Visibility;
use super::{File, Image, Node, NodeMeta, NodePath};

/// A directory in a [`Filesystem`].
//
// // 目录节点。列出的子节点会带上后端在列表时给出的元数据。
#[derive(Debug, Clone)]
pub struct Directory<'fs> {
    meta: NodeMeta<'fs>,
}

impl<'fs> Directory<'fs> {
    pub fn new(fs: &'fs Filesystem, path: impl Into<NodePath>) -> Self {
        Self::with_metadata(fs, path, None, None)
    }

    pub fn with_metadata(
        fs: &'fs Filesystem,
        path: impl Into<NodePath>,
        visibility: Option<Visibility>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            meta: NodeMeta::new(fs, path.into(), visibility, last_modified),
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

    /// 目录当前是否仍然存在。不缓存。
    pub fn exists(&self) -> Result<bool> {
        self.meta.fs.storage().directory_exists(self.path().as_str())
    }

    /// Children of this directory, or every descendant when `deep` is set.
    pub fn entries(&self, deep: bool) -> Result<Vec<Node<'fs>>> {
        let fs = self.meta.fs;
        let entries = fs.storage().list_contents(self.path().as_str(), deep)?;
        tracing::trace!(path = %self.path(), deep, count = entries.len(), "listed directory");
        Ok(entries.into_iter().map(|entry| Node::from_entry(fs, entry)).collect())
    }

    pub fn files(&self, deep: bool) -> Result<Vec<File<'fs>>> {
        Ok(self
            .entries(deep)?
            .into_iter()
            .filter_map(|node| node.into_file().ok())
            .collect())
    }

    pub fn directories(&self, deep: bool) -> Result<Vec<Directory<'fs>>> {
        Ok(self
            .entries(deep)?
            .into_iter()
            .filter_map(|node| node.into_directory().ok())
            .collect())
    }

    /// 只保留图片文件。判定规则与 [`File::is_image`] 相同。
    pub fn images(&self, deep: bool) -> Result<Vec<Image<'fs>>> {
        let mut images = Vec::new();
        for file in self.files(deep)? {
            if file.is_image()? {
                images.push(file.ensure_image()?);
            }
        }
        Ok(images)
    }

    pub fn refresh(&mut self) -> &mut Self {
        self.meta.refresh();
        self
    }
}
