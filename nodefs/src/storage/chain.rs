//! Walking a decorator chain.
//!
//! Traversal is an explicit loop over `next_link()`, bounded by
//! [`MAX_CHAIN_DEPTH`]. Ownership already rules out cycles; the bound turns a
//! runaway chain into an immediate panic instead of a hang.

use crate::common::constants::MAX_CHAIN_DEPTH;
use crate::error::{FsError, Result};
use super::{Feature, StorageAdapter};

/// 从 `head` 开始依次产出链上的每个链接，最后一个是具体后端。
pub fn links(head: &dyn StorageAdapter) -> Links<'_> {
    Links {
        next: Some(head),
        visited: 0,
    }
}

pub struct Links<'a> {
    next: Option<&'a dyn StorageAdapter>,
    visited: usize,
}

impl<'a> Iterator for Links<'a> {
    type Item = &'a dyn StorageAdapter;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.visited += 1;
        assert!(
            self.visited <= MAX_CHAIN_DEPTH + 1,
            "decorator chain exceeds {} links",
            MAX_CHAIN_DEPTH
        );
        self.next = current.next_link();
        Some(current)
    }
}

/// 最内层的具体后端。
pub fn terminal(head: &dyn StorageAdapter) -> &dyn StorageAdapter {
    let mut last = head;
    for link in links(head) {
        last = link;
    }
    last
}

/// 链中装饰器的数量 (不含具体后端)。
pub fn depth(head: &dyn StorageAdapter) -> usize {
    links(head).count() - 1
}

/// Whether any link in the chain provides `feature`.
///
/// A decorator's own added features answer first; otherwise the question is
/// passed down until the concrete backend's declared set decides it.
pub fn supports(head: &dyn StorageAdapter, feature: Feature) -> bool {
    links(head).any(|link| link.features().contains(feature))
}

/// The outermost link declaring `feature`, or `UnsupportedFeature` naming the
/// concrete backend. Only declared features count; see [`dispatch`] for how
/// a call is routed.
pub fn provider(head: &dyn StorageAdapter, feature: Feature) -> Result<&dyn StorageAdapter> {
    links(head)
        .find(|link| link.features().contains(feature))
        .ok_or_else(|| {
            let adapter = terminal(head).adapter_name();
            tracing::warn!(adapter, %feature, "optional feature not supported");
            FsError::UnsupportedFeature { adapter, feature }
        })
}

/// Finds the implementation that serves `feature`.
///
/// The feature must be supported somewhere in the chain. The walk then goes
/// from the head down to the providing link and takes the first link whose
/// `accessor` returns an implementation, so a decorator above the provider can
/// intercept the call without declaring the feature itself.
pub fn dispatch<'a, T: ?Sized + 'a>(
    head: &'a dyn StorageAdapter,
    feature: Feature,
    accessor: impl Fn(&'a dyn StorageAdapter) -> Option<&'a T>,
) -> Result<(&'a dyn StorageAdapter, &'a T)> {
    let provider = provider(head, feature)?;
    for link in links(head) {
        if let Some(implementation) = accessor(link) {
            return Ok((link, implementation));
        }
        if std::ptr::addr_eq(link, provider) {
            break;
        }
    }
    Err(FsError::FeatureMisconfigured {
        adapter: provider.adapter_name(),
        feature,
    })
}
