use std::ops::Deref;
use crate::error::Result;
use crate::filesystem::Filesystem;
use super::{File, KnownMetadata, NodePath};

/// An image file. Every file operation is available through `Deref`.
//
// // 图片节点，通过 Deref 复用文件节点的全部能力。
#[derive(Debug, Clone)]
pub struct Image<'fs> {
    file: File<'fs>,
}

impl<'fs> Image<'fs> {
    /// 不做任何类型检查；需要检查时请使用 [`File::ensure_image`]。
    pub(crate) fn with_metadata(fs: &'fs Filesystem, path: impl Into<NodePath>, known: KnownMetadata) -> Self {
        Self {
            file: File::with_metadata(fs, path, known),
        }
    }

    pub fn as_file(&self) -> &File<'fs> {
        &self.file
    }

    pub fn into_file(self) -> File<'fs> {
        self.file
    }

    /// SVG 等矢量图。
    pub fn is_vector(&self) -> Result<bool> {
        if let Some(extension) = self.path().extension() {
            return Ok(extension.eq_ignore_ascii_case("svg"));
        }
        Ok(self.mime_type()?.starts_with("image/svg"))
    }

    pub fn refresh(&mut self) -> &mut Self {
        self.file.refresh();
        self
    }
}

impl<'fs> Deref for Image<'fs> {
    type Target = File<'fs>;

    fn deref(&self) -> &Self::Target {
        &self.file
    }
}
