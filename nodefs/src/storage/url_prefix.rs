use std::sync::OnceLock;
use sha2::{Digest, Sha256};
use url::Url;
use crate::common::constants::PREFIX_HASH_CHARS;
use crate::error::{FsError, Result};
use crate::node::NodePath;
use super::{Decorator, Feature, FeatureSet, Link, StorageAdapter, UrlFeature};

/// 为任何后端添加 URL 生成能力的装饰器。
///
/// 配置一个前缀时，URL = 前缀 + 路径。
/// 配置多个前缀时，按路径的 SHA-256 选出一个固定前缀 (CDN 分片)，
/// 同一路径在任何进程中都会落到同一个前缀上。
#[derive(Debug)]
pub struct UrlPrefixAdapter {
    inner: Link,
    prefixes: Vec<String>,
    /// 每个前缀在第一次使用时解析并缓存
    parsed: Vec<OnceLock<Url>>,
}

impl UrlPrefixAdapter {
    const FEATURES: FeatureSet = FeatureSet::of(&[Feature::Url]);

    /// An empty prefix list is rejected here, at construction time.
    pub fn new<I, S>(inner: Link, prefixes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes: Vec<String> = prefixes.into_iter().map(Into::into).collect();
        if prefixes.is_empty() {
            return Err(FsError::NoUrlPrefixes);
        }
        let parsed = prefixes.iter().map(|_| OnceLock::new()).collect();
        Ok(Self {
            inner,
            prefixes,
            parsed,
        })
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// 为 `path` 选出前缀下标: SHA-256 十六进制摘要的前 10 位按十六进制解析，再对前缀数量取模。
    pub fn prefix_index(&self, path: &str) -> usize {
        let count = self.prefixes.len();
        assert!(count > 0, "UrlPrefixAdapter has no prefixes");
        if count == 1 {
            return 0;
        }
        let digest = hex::encode(Sha256::digest(path.as_bytes()));
        // 10 个十六进制字符最多 40 位，u64 不会溢出
        let value = u64::from_str_radix(&digest[..PREFIX_HASH_CHARS], 16).unwrap_or_default();
        (value % count as u64) as usize
    }

    fn prefix(&self, index: usize) -> Result<&Url> {
        let raw = &self.prefixes[index];
        if let Some(url) = self.parsed[index].get() {
            return Ok(url);
        }
        // 统一以 "/" 结尾，追加路径段前会先去掉这个空段
        let normalized = format!("{}/", raw.trim_end_matches('/'));
        let url = Url::parse(&normalized).map_err(|source| FsError::InvalidUrlPrefix {
            prefix: raw.clone(),
            source,
        })?;
        if url.cannot_be_a_base() {
            return Err(FsError::UrlPrefixNotBase(raw.clone()));
        }
        Ok(self.parsed[index].get_or_init(|| url))
    }
}

impl UrlFeature for UrlPrefixAdapter {
    fn public_url(&self, path: &str) -> Result<Url> {
        let path = NodePath::new(path);
        let index = self.prefix_index(path.as_str());
        let mut url = self.prefix(index)?.clone();
        // 逐段追加并转义，路径中的 "#"、"?"、"%" 不会被当作 URL 语法
        url.path_segments_mut()
            .map_err(|_| FsError::UrlPrefixNotBase(self.prefixes[index].clone()))?
            .pop_if_empty()
            .extend(path.as_str().split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }
}

impl Decorator for UrlPrefixAdapter {
    fn inner(&self) -> &dyn StorageAdapter {
        self.inner.as_ref()
    }

    fn inner_mut(&mut self) -> &mut Link {
        &mut self.inner
    }

    fn added_features(&self) -> FeatureSet {
        Self::FEATURES
    }

    fn url_feature(&self) -> Option<&dyn UrlFeature> {
        Some(self)
    }
}
