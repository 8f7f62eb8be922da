//! Pass-through base for adapter decorators.
//!
//! A decorator only has to say where its wrapped link lives. Every storage
//! primitive forwards to that link unchanged, so an implementation overrides
//! just the calls it wants to alter. The blanket impl turns any `Decorator`
//! into a [`StorageAdapter`] that reports its wrapped link through the chain
//! protocol.
//!
//! ```rust,ignore
//! #[derive(Debug)]
//! struct ReadOnly { inner: Link }
//!
//! impl Decorator for ReadOnly {
//!     fn inner(&self) -> &dyn StorageAdapter { self.inner.as_ref() }
//!     fn inner_mut(&mut self) -> &mut Link { &mut self.inner }
//!
//!     fn write(&self, path: &str, _contents: &[u8]) -> Result<()> {
//!         Err(io::Error::from(io::ErrorKind::PermissionDenied).into())
//!     }
//! }
//! ```

use std::fmt::Debug;
use std::io::Read;
use chrono::{DateTime, Utc};
use crate::error::Result;
use super::{ChecksumFeature, Entry, FeatureSet, InPlaceModifyFeature, Link, StorageAdapter, UrlFeature, Visibility};

pub trait Decorator: Send + Sync + Debug {
    /// 被包装的下一个链接
    fn inner(&self) -> &dyn StorageAdapter;

    fn inner_mut(&mut self) -> &mut Link;

    /// 本装饰器额外提供的特性 (与后端是否支持无关)。
    fn added_features(&self) -> FeatureSet {
        FeatureSet::empty()
    }

    /// Returning an implementation from a feature accessor without listing the
    /// feature in `added_features` intercepts calls for a feature that a lower
    /// link provides. `supports()` is unaffected.
    //
    // // 只覆盖访问器而不声明特性: 拦截下层提供的特性调用，不改变 supports() 的结果。
    fn checksum_feature(&self) -> Option<&dyn ChecksumFeature> {
        None
    }

    fn url_feature(&self) -> Option<&dyn UrlFeature> {
        None
    }

    fn in_place_feature(&self) -> Option<&dyn InPlaceModifyFeature> {
        None
    }

    fn file_exists(&self, path: &str) -> Result<bool> {
        self.inner().file_exists(path)
    }

    fn directory_exists(&self, path: &str) -> Result<bool> {
        self.inner().directory_exists(path)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.inner().read(path)
    }

    fn read_stream(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        self.inner().read_stream(path)
    }

    fn write(&self, path: &str, contents: &[u8]) -> Result<()> {
        self.inner().write(path, contents)
    }

    fn write_stream(&self, path: &str, contents: &mut dyn Read) -> Result<()> {
        self.inner().write_stream(path, contents)
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.inner().delete(path)
    }

    fn delete_directory(&self, path: &str) -> Result<()> {
        self.inner().delete_directory(path)
    }

    fn create_directory(&self, path: &str) -> Result<()> {
        self.inner().create_directory(path)
    }

    fn move_file(&self, source: &str, destination: &str) -> Result<()> {
        self.inner().move_file(source, destination)
    }

    fn copy(&self, source: &str, destination: &str) -> Result<()> {
        self.inner().copy(source, destination)
    }

    fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<()> {
        self.inner().set_visibility(path, visibility)
    }

    fn visibility(&self, path: &str) -> Result<Visibility> {
        self.inner().visibility(path)
    }

    fn mime_type(&self, path: &str) -> Result<String> {
        self.inner().mime_type(path)
    }

    fn last_modified(&self, path: &str) -> Result<DateTime<Utc>> {
        self.inner().last_modified(path)
    }

    fn file_size(&self, path: &str) -> Result<u64> {
        self.inner().file_size(path)
    }

    fn list_contents(&self, path: &str, deep: bool) -> Result<Vec<Entry>> {
        self.inner().list_contents(path, deep)
    }
}

impl<D: Decorator> StorageAdapter for D {
    fn file_exists(&self, path: &str) -> Result<bool> {
        Decorator::file_exists(self, path)
    }

    fn directory_exists(&self, path: &str) -> Result<bool> {
        Decorator::directory_exists(self, path)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        Decorator::read(self, path)
    }

    fn read_stream(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        Decorator::read_stream(self, path)
    }

    fn write(&self, path: &str, contents: &[u8]) -> Result<()> {
        Decorator::write(self, path, contents)
    }

    fn write_stream(&self, path: &str, contents: &mut dyn Read) -> Result<()> {
        Decorator::write_stream(self, path, contents)
    }

    fn delete(&self, path: &str) -> Result<()> {
        Decorator::delete(self, path)
    }

    fn delete_directory(&self, path: &str) -> Result<()> {
        Decorator::delete_directory(self, path)
    }

    fn create_directory(&self, path: &str) -> Result<()> {
        Decorator::create_directory(self, path)
    }

    fn move_file(&self, source: &str, destination: &str) -> Result<()> {
        Decorator::move_file(self, source, destination)
    }

    fn copy(&self, source: &str, destination: &str) -> Result<()> {
        Decorator::copy(self, source, destination)
    }

    fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<()> {
        Decorator::set_visibility(self, path, visibility)
    }

    fn visibility(&self, path: &str) -> Result<Visibility> {
        Decorator::visibility(self, path)
    }

    fn mime_type(&self, path: &str) -> Result<String> {
        Decorator::mime_type(self, path)
    }

    fn last_modified(&self, path: &str) -> Result<DateTime<Utc>> {
        Decorator::last_modified(self, path)
    }

    fn file_size(&self, path: &str) -> Result<u64> {
        Decorator::file_size(self, path)
    }

    fn list_contents(&self, path: &str, deep: bool) -> Result<Vec<Entry>> {
        Decorator::list_contents(self, path, deep)
    }

    fn features(&self) -> FeatureSet {
        self.added_features()
    }

    fn checksum_feature(&self) -> Option<&dyn ChecksumFeature> {
        Decorator::checksum_feature(self)
    }

    fn url_feature(&self) -> Option<&dyn UrlFeature> {
        Decorator::url_feature(self)
    }

    fn in_place_feature(&self) -> Option<&dyn InPlaceModifyFeature> {
        Decorator::in_place_feature(self)
    }

    fn next_link(&self) -> Option<&dyn StorageAdapter> {
        Some(self.inner())
    }

    fn next_link_mut(&mut self) -> Option<&mut Link> {
        Some(self.inner_mut())
    }

    fn adapter_name(&self) -> &'static str {
        std::any::type_name::<D>()
    }
}
