use std::fmt::{Display, Formatter};
use std::sync::OnceLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use crate::common::constants::MULTI_PART_EXTENSIONS;

/// 代表存储内部的一个相对路径。
///
/// 规范化后的形式:
/// - 使用 "/" 作为分隔符，不以 "/" 开头或结尾 (e.g., "a/b/c.txt").
/// - 已解析 "." 与 "..", 因此永远不会越出根目录.
/// - 根目录是特殊情况, 路径为空字符串 "".
///
/// 派生视图 (扩展名、basename) 在第一次访问时计算并缓存。
#[derive(Debug, Clone)]
pub struct NodePath {
    inner: String,
    extension: OnceLock<Option<String>>,
}

impl NodePath {
    /// 从任何可以引用为 &str 的类型创建一个新的 NodePath。
    ///
    /// 路径将被规范化:
    /// - 转换 '\' 为 '/'.
    /// - 解析 ".." 和 ".".
    /// - 去掉开头与结尾的 "/".
    pub fn new<S: AsRef<str>>(raw_path: S) -> Self {
        Self {
            inner: Self::normalize(raw_path.as_ref()),
            extension: OnceLock::new(),
        }
    }

    fn normalize(raw_path: &str) -> String {
        let path_str = raw_path.replace('\\', "/");
        let mut components: Vec<&str> = Vec::new();
        for component in path_str.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    components.pop();
                }
                comp => components.push(comp),
            }
        }
        components.join("/")
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn is_root(&self) -> bool {
        self.inner.is_empty()
    }

    /// 最后一段，包含扩展名。
    ///
    /// - `foo/bar.tar.gz` -> `bar.tar.gz`
    /// - `` (root) -> ``
    pub fn name(&self) -> &str {
        match self.inner.rfind('/') {
            Some(idx) => &self.inner[idx + 1..],
            None => &self.inner,
        }
    }

    /// 扩展名，识别多段扩展名 (`tar.gz`, `tar.bz2`)。
    ///
    /// 以 "." 开头且没有其他 "." 的名字 (例如 `.env`) 没有扩展名。
    pub fn extension(&self) -> Option<&str> {
        self.extension
            .get_or_init(|| Self::parse_extension(self.name()))
            .as_deref()
    }

    fn parse_extension(name: &str) -> Option<String> {
        let dot = name.rfind('.')?;
        if dot == 0 || dot == name.len() - 1 {
            return None;
        }
        let last = &name[dot + 1..];
        let stem = &name[..dot];

        // 检查多段扩展名，例如 "bar.tar" + "gz"
        for (tail, full) in MULTI_PART_EXTENSIONS {
            let prefix = &full[..full.len() - tail.len() - 1];
            if last.eq_ignore_ascii_case(tail)
                && stem.len() > prefix.len() + 1
                && stem.as_bytes()[stem.len() - prefix.len() - 1] == b'.'
                && stem
                    .get(stem.len() - prefix.len()..)
                    .is_some_and(|s| s.eq_ignore_ascii_case(prefix))
            {
                return Some(name[name.len() - full.len()..].to_string());
            }
        }

        Some(last.to_string())
    }

    /// 去掉扩展名后的文件名: `foo/bar.tar.gz` -> `bar`。
    pub fn basename(&self) -> &str {
        let name = self.name();
        match self.extension() {
            Some(ext) => &name[..name.len() - ext.len() - 1],
            None => name,
        }
    }

    /// 父目录路径: `foo/bar.txt` -> `Some("foo")`。
    /// 顶层条目 (`bar.txt`) 与根目录返回 `None`。
    pub fn dirname(&self) -> Option<&str> {
        self.inner.rfind('/').map(|idx| &self.inner[..idx])
    }

    /// 父目录，顶层条目的父目录是根目录；根目录本身没有父目录。
    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        Some(NodePath::new(self.dirname().unwrap_or("")))
    }

    /// 追加一个子路径段。结果会被重新规范化。
    pub fn join<S: AsRef<str>>(&self, segment: S) -> NodePath {
        NodePath::new(format!("{}/{}", self.inner, segment.as_ref()))
    }
}

impl PartialEq for NodePath {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for NodePath {}

impl std::hash::Hash for NodePath {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

/// 允许 `NodePath::from("...")`
impl From<&str> for NodePath {
    fn from(s: &str) -> Self {
        NodePath::new(s)
    }
}

impl From<String> for NodePath {
    fn from(s: String) -> Self {
        NodePath::new(s)
    }
}

impl AsRef<str> for NodePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner)
    }
}

impl Serialize for NodePath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodePath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // `NodePath::new` 会处理规范化
        String::deserialize(deserializer).map(NodePath::new)
    }
}
