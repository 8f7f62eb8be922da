use crate::node::NodeKind;
use crate::storage::Feature;

/// Errors produced by adapters, the decorator chain and nodes.
//
// // 适配器、装饰器链以及节点层产生的错误。
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// The path does not exist in the underlying storage.
    //
    // // 路径在底层存储中不存在。
    #[error("Path not found: {0}")]
    NotFound(String),

    /// An optional feature was requested but the innermost adapter does not provide it.
    /// Always recoverable: probe `supports()` first or fall back to a generic path.
    //
    // // 请求了可选特性，但最内层的适配器并未提供。
    // // 调用方可以先调用 `supports()` 探测，或回退到通用实现。
    #[error("Adapter \"{adapter}\" does not support \"{feature}\"")]
    UnsupportedFeature {
        adapter: &'static str,
        feature: Feature,
    },

    /// The caller asserted the wrong node shape for a path.
    //
    // // 调用方对某个路径断言了错误的节点类型。
    #[error("Expected node at \"{path}\" to be {expected}{}", mime_suffix(mime_type))]
    NodeTypeMismatch {
        path: String,
        expected: NodeKind,
        mime_type: Option<String>,
    },

    /// The URL prefix decorator was constructed without any prefix.
    //
    // // 构造 URL 前缀装饰器时未提供任何前缀。
    #[error("At least one URL prefix must be configured")]
    NoUrlPrefixes,

    /// A configured URL prefix could not be parsed as an absolute URL.
    //
    // // 配置的 URL 前缀无法解析为绝对 URL。
    #[error("Invalid URL prefix \"{prefix}\": {source}")]
    InvalidUrlPrefix {
        prefix: String,
        #[source]
        source: url::ParseError,
    },

    /// A configured URL prefix parses but cannot carry a path (e.g. `mailto:`).
    //
    // // 配置的 URL 前缀可以解析，但无法在其后追加路径。
    #[error("URL prefix \"{0}\" cannot be used as a base URL")]
    UrlPrefixNotBase(String),

    /// A link in the chain declares a feature tag without exposing its implementation.
    //
    // // 链中的某个节点声明了特性标签，却没有提供对应的实现。
    #[error("Adapter \"{adapter}\" declares \"{feature}\" but does not implement it")]
    FeatureMisconfigured {
        adapter: &'static str,
        feature: Feature,
    },

    /// A decorator stopped exposing its wrapped link while the chain was being walked.
    //
    // // 遍历装饰器链时，某个装饰器不再提供其下一个链接。
    #[error("Decorator chain is broken")]
    BrokenChain,

    /// An I/O error from the storage backend.
    //
    // // 存储后端返回的 I/O 错误。
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn mime_suffix(mime_type: &Option<String>) -> String {
    match mime_type {
        Some(mime) => format!(" (detected mime type \"{}\")", mime),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, FsError>;

impl FsError {
    /// Shortcut for building a `NodeTypeMismatch` without a mime type.
    pub(crate) fn mismatch(path: impl Into<String>, expected: NodeKind) -> Self {
        FsError::NodeTypeMismatch {
            path: path.into(),
            expected,
            mime_type: None,
        }
    }

    /// 将 `io::ErrorKind::NotFound` 转换为带路径的 `NotFound`，其余原样保留。
    pub(crate) fn from_io(err: std::io::Error, path: &str) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            FsError::NotFound(path.to_string())
        } else {
            FsError::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_message_includes_mime() {
        let err = FsError::NodeTypeMismatch {
            path: "docs/readme.txt".to_string(),
            expected: NodeKind::Image,
            mime_type: Some("text/plain".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("docs/readme.txt"));
        assert!(message.contains("an image"));
        assert!(message.contains("text/plain"));

        let plain = FsError::mismatch("a", NodeKind::Directory).to_string();
        assert!(!plain.contains("mime"));
    }

    #[test]
    fn test_io_not_found_is_mapped() {
        let err = FsError::from_io(std::io::Error::from(std::io::ErrorKind::NotFound), "x.txt");
        assert!(matches!(err, FsError::NotFound(p) if p == "x.txt"));

        let err = FsError::from_io(std::io::Error::from(std::io::ErrorKind::PermissionDenied), "x.txt");
        assert!(matches!(err, FsError::Io(_)));
    }
}
