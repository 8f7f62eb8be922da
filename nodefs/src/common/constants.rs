/// Buffer size used when streaming file contents through a hasher.
pub const BUFFER_LEN: usize = 8192;

/// Upper bound on decorator links walked before the chain is considered broken.
pub const MAX_CHAIN_DEPTH: usize = 64;

// --- 节点分类常量 ---
/// 无需嗅探 MIME 即可判定为图片的扩展名 (小写)。
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "gif", "jpg", "jpeg", "png", "svg", "apng", "avif", "jfif", "pjpeg", "pjp", "webp",
];

/// 多段扩展名表: 末段 -> 完整扩展名 (例如 `foo.tar.gz` 的扩展名是 `tar.gz`)。
pub const MULTI_PART_EXTENSIONS: &[(&str, &str)] = &[("gz", "tar.gz"), ("bz2", "tar.bz2")];

// --- URL 前缀分片常量 ---
/// Number of leading SHA-256 hex characters used to pick a URL prefix.
pub const PREFIX_HASH_CHARS: usize = 10;

/// Mime type reported when neither the content nor the extension is recognised.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Number of leading bytes read from a file for mime sniffing.
pub const MIME_SNIFF_LEN: usize = 512;
