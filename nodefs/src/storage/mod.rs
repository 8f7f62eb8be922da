pub mod chain;
pub mod decorator;
pub mod feature;
pub mod local;
pub mod memory;
pub mod operator;
pub mod url_prefix;

use std::fmt::{self, Debug};
use std::io::Read;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::Result;

pub use decorator::Decorator;
pub use feature::{ChecksumFeature, Feature, FeatureSet, InPlaceModifyFeature, UrlFeature};
pub use local::LocalAdapter;
pub use memory::{MemoryAdapter, MemoryRegistry};
pub use operator::Operator;
pub use url_prefix::UrlPrefixAdapter;

/// 装饰器链中的一个链接: 每个装饰器独占它所包装的下一个链接。
pub type Link = Box<dyn StorageAdapter>;

/// 文件或目录的访问权限。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// 目录列表中的一个条目，附带后端在列出时顺便得到的元数据。
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub path: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
    pub visibility: Option<Visibility>,
    pub mime_type: Option<String>,
}

impl Entry {
    pub fn file(path: impl Into<String>) -> Self {
        Self::bare(path, EntryKind::File)
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self::bare(path, EntryKind::Directory)
    }

    fn bare(path: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            kind,
            size: None,
            last_modified: None,
            visibility: None,
            mime_type: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Storage adapter trait.
///
/// Defines the raw storage primitives every backend must provide, the
/// optional-feature accessors, and the decorator protocol used to walk a
/// chain of wrappers down to the concrete backend.
///
/// Paths are relative to the adapter root and already normalized
/// (see [`NodePath`](crate::node::NodePath)).
//
// // 存储适配器特征。
// // 定义了所有后端必须提供的原始存储操作、可选特性访问器，
// // 以及用于沿装饰器链找到具体后端的协议。
pub trait StorageAdapter: Send + Sync + Debug {
    // --- 读操作 ---

    fn file_exists(&self, path: &str) -> Result<bool>;

    fn directory_exists(&self, path: &str) -> Result<bool>;

    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// 获取一个读取器，用于流式读取文件内容
    fn read_stream(&self, path: &str) -> Result<Box<dyn Read + Send>>;

    // --- 写操作 ---

    /// 写入文件，按需创建父目录，已存在时覆盖。
    fn write(&self, path: &str, contents: &[u8]) -> Result<()>;

    fn write_stream(&self, path: &str, contents: &mut dyn Read) -> Result<()>;

    /// 删除文件。文件不存在视作删除成功（幂等性）。
    fn delete(&self, path: &str) -> Result<()>;

    /// 递归删除目录。
    fn delete_directory(&self, path: &str) -> Result<()>;

    fn create_directory(&self, path: &str) -> Result<()>;

    fn move_file(&self, source: &str, destination: &str) -> Result<()>;

    fn copy(&self, source: &str, destination: &str) -> Result<()>;

    // --- 元数据 ---

    fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<()>;

    fn visibility(&self, path: &str) -> Result<Visibility>;

    fn mime_type(&self, path: &str) -> Result<String>;

    fn last_modified(&self, path: &str) -> Result<DateTime<Utc>>;

    fn file_size(&self, path: &str) -> Result<u64>;

    /// 列出目录内容。`deep` 为 true 时递归列出所有后代。
    fn list_contents(&self, path: &str, deep: bool) -> Result<Vec<Entry>>;

    // --- 可选特性 ---

    /// Features this link itself provides (for a decorator: the features it adds).
    fn features(&self) -> FeatureSet {
        FeatureSet::empty()
    }

    fn checksum_feature(&self) -> Option<&dyn ChecksumFeature> {
        None
    }

    fn url_feature(&self) -> Option<&dyn UrlFeature> {
        None
    }

    fn in_place_feature(&self) -> Option<&dyn InPlaceModifyFeature> {
        None
    }

    // --- 装饰器协议 ---

    /// The next link if this adapter is a decorator, `None` for a concrete backend.
    fn next_link(&self) -> Option<&dyn StorageAdapter> {
        None
    }

    fn next_link_mut(&mut self) -> Option<&mut Link> {
        None
    }

    /// Type name used in error messages.
    fn adapter_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
