use std::io;
use std::path::{Path, PathBuf};
use url::Url;
use crate::common::checksum::ChecksumAlgorithm;
use crate::error::{FsError, Result};
use super::{chain, Decorator, Feature, Link, StorageAdapter};

/// 带特性检测的装饰器，位于整条链的最外层。
///
/// 普通存储操作原样转发；可选特性方法先检查整条链是否支持该特性，
/// 不支持时在调用后端之前就返回 `UnsupportedFeature`。
/// 它还能在不重建链的情况下替换最内层的具体后端。
#[derive(Debug)]
pub struct Operator {
    inner: Link,
}

impl Operator {
    pub fn new(adapter: Link) -> Self {
        tracing::debug!(
            adapter = chain::terminal(adapter.as_ref()).adapter_name(),
            depth = chain::depth(adapter.as_ref()),
            "operator created"
        );
        Self { inner: adapter }
    }

    /// 链上是否有任何链接提供 `feature`。从不失败。
    pub fn supports(&self, feature: Feature) -> bool {
        chain::supports(self, feature)
    }

    pub fn ensure_supports(&self, feature: Feature) -> Result<()> {
        chain::provider(self, feature).map(|_| ())
    }

    /// 最内层的具体后端，仅用于错误信息与诊断。
    pub fn adapter(&self) -> &dyn StorageAdapter {
        chain::terminal(self.inner.as_ref())
    }

    /// 本操作器与具体后端之间的装饰器数量。
    pub fn depth(&self) -> usize {
        chain::depth(self.inner.as_ref())
    }

    /// Replaces the concrete backend at the bottom of the chain, keeping every
    /// decorator above it. Returns the backend that was replaced.
    ///
    /// The new backend is visible to every later call through the chain.
    pub fn swap(&mut self, adapter: Link) -> Result<Link> {
        let depth = self.depth();
        let mut link = &mut self.inner;
        for _ in 0..depth {
            link = link.next_link_mut().ok_or(FsError::BrokenChain)?;
        }
        tracing::debug!(
            from = link.adapter_name(),
            to = adapter.adapter_name(),
            depth,
            "swapping terminal adapter"
        );
        Ok(std::mem::replace(link, adapter))
    }

    pub fn checksum_for(&self, path: &str, algorithm: ChecksumAlgorithm) -> Result<String> {
        let (via, feature) = chain::dispatch(self, Feature::Checksum, |link| link.checksum_feature())?;
        tracing::debug!(path, %algorithm, via = via.adapter_name(), "native checksum");
        feature.checksum(path, algorithm)
    }

    pub fn public_url(&self, path: &str) -> Result<Url> {
        let (_, feature) = chain::dispatch(self, Feature::Url, |link| link.url_feature())?;
        feature.public_url(path)
    }

    pub fn real_file(&self, path: &str) -> Result<PathBuf> {
        let (_, feature) = chain::dispatch(self, Feature::InPlaceModify, |link| link.in_place_feature())?;
        feature.real_file(path)
    }

    /// 把真实的本地文件交给 `callback` 原地修改。
    pub fn modify_in_place<R, F>(&self, path: &str, callback: F) -> Result<R>
    where
        F: FnOnce(&Path) -> io::Result<R>,
    {
        let real = self.real_file(path)?;
        Ok(callback(&real)?)
    }
}

impl Decorator for Operator {
    fn inner(&self) -> &dyn StorageAdapter {
        self.inner.as_ref()
    }

    fn inner_mut(&mut self) -> &mut Link {
        &mut self.inner
    }
}
