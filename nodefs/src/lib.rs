pub mod common;
pub mod error;
pub mod filesystem;
pub mod node;
pub mod storage;

pub use error::{FsError, Result};
pub use filesystem::{Filesystem, FilesystemConfig};
pub use node::{Directory, File, Image, KnownMetadata, Node, NodeKind, NodePath};
pub use storage::{Feature, FeatureSet, StorageAdapter, Visibility};
