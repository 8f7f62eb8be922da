//! Optional features a storage adapter may provide.
//!
//! An adapter declares its features as a [`FeatureSet`] and exposes the
//! matching implementation through the `*_feature()` accessors on
//! [`StorageAdapter`](super::StorageAdapter). Support is decided by the
//! declared set alone, never by configuration.

use std::fmt;
use std::path::PathBuf;
use url::Url;
use crate::common::checksum::ChecksumAlgorithm;
use crate::error::Result;

/// 可选特性标签。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// 后端可以高效地计算文件校验和 (无需经装饰器链读取全部内容)。
    Checksum,
    /// 后端可以为文件生成公开 URL。
    Url,
    /// 后端可以提供真实的本地文件，用于原地修改。
    InPlaceModify,
}

impl Feature {
    pub const ALL: [Feature; 3] = [Feature::Checksum, Feature::Url, Feature::InPlaceModify];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::Checksum => "checksum",
            Feature::Url => "url",
            Feature::InPlaceModify => "in-place-modify",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Feature::Checksum => 1,
            Feature::Url => 1 << 1,
            Feature::InPlaceModify => 1 << 2,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A compact set of [`Feature`] tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FeatureSet(u8);

impl FeatureSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn of(features: &[Feature]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < features.len() {
            bits |= features[i].bit();
            i += 1;
        }
        Self(bits)
    }

    pub const fn with(self, feature: Feature) -> Self {
        Self(self.0 | feature.bit())
    }

    pub const fn contains(&self, feature: Feature) -> bool {
        self.0 & feature.bit() != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL.into_iter().filter(|f| self.contains(*f))
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        iter.into_iter().fold(FeatureSet::empty(), FeatureSet::with)
    }
}

/// Native checksum computation, e.g. hashing a local file as a stream.
pub trait ChecksumFeature {
    /// 返回 `path` 内容的十六进制摘要。
    fn checksum(&self, path: &str, algorithm: ChecksumAlgorithm) -> Result<String>;
}

/// Public URL generation.
pub trait UrlFeature {
    fn public_url(&self, path: &str) -> Result<Url>;
}

/// Direct access to a real local file, so callers can edit it in place
/// instead of round-tripping a temporary copy.
pub trait InPlaceModifyFeature {
    /// 返回 `path` 对应的磁盘绝对路径。
    fn real_file(&self, path: &str) -> Result<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_set_membership() {
        let set = FeatureSet::of(&[Feature::Checksum, Feature::InPlaceModify]);
        assert!(set.contains(Feature::Checksum));
        assert!(set.contains(Feature::InPlaceModify));
        assert!(!set.contains(Feature::Url));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Feature::Checksum, Feature::InPlaceModify]);

        let empty = FeatureSet::empty();
        assert!(empty.is_empty());
        assert!(Feature::ALL.iter().all(|f| !empty.contains(*f)));

        let collected: FeatureSet = [Feature::Url].into_iter().collect();
        assert_eq!(collected, FeatureSet::empty().with(Feature::Url));
    }
}
