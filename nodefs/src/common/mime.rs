//! Mime type detection for storage adapters.
//!
//! Content sniffing runs first (magic bytes), the file extension is consulted
//! only when the content is not recognised.

use crate::common::constants::DEFAULT_MIME_TYPE;

/// Extension -> mime table, also used in reverse by [`extension_for`].
const EXTENSION_TABLE: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("apng", "image/apng"),
    ("gif", "image/gif"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("jfif", "image/jpeg"),
    ("pjpeg", "image/jpeg"),
    ("pjp", "image/jpeg"),
    ("webp", "image/webp"),
    ("avif", "image/avif"),
    ("svg", "image/svg+xml"),
    ("bmp", "image/bmp"),
    ("ico", "image/vnd.microsoft.icon"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tar.gz", "application/gzip"),
    ("bz2", "application/x-bzip2"),
    ("tar.bz2", "application/x-bzip2"),
    ("tar", "application/x-tar"),
];

/// 根据文件头的魔数判断 MIME 类型，无法识别时返回 `None`。
pub fn sniff(head: &[u8]) -> Option<&'static str> {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"\xFF\xD8\xFF", "image/jpeg"),
        (b"BM", "image/bmp"),
        (b"\x00\x00\x01\x00", "image/vnd.microsoft.icon"),
        (b"%PDF-", "application/pdf"),
        (b"PK\x03\x04", "application/zip"),
        (b"\x1f\x8b", "application/gzip"),
        (b"BZh", "application/x-bzip2"),
    ];

    if let Some((_, mime)) = SIGNATURES.iter().find(|(magic, _)| head.starts_with(magic)) {
        return Some(*mime);
    }

    // RIFF....WEBP
    if head.len() >= 12 && &head[..4] == b"RIFF" && &head[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    // ....ftypavif / ftypavis
    if head.len() >= 12 && &head[4..8] == b"ftyp" && (&head[8..12] == b"avif" || &head[8..12] == b"avis") {
        return Some("image/avif");
    }

    // SVG 是文本格式，只检查开头附近是否出现 <svg 标签
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with("<svg") || (trimmed.starts_with("<?xml") && trimmed.contains("<svg")) {
        return Some("image/svg+xml");
    }

    None
}

/// Looks up a mime type by (case-insensitive) extension.
pub fn from_extension(extension: &str) -> Option<&'static str> {
    let extension = extension.to_ascii_lowercase();
    EXTENSION_TABLE
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

/// Returns the first extension registered for `mime_type`.
pub fn extension_for(mime_type: &str) -> Option<&'static str> {
    let mime_type = mime_type.split(';').next().unwrap_or(mime_type).trim();
    EXTENSION_TABLE
        .iter()
        .find(|(_, mime)| mime.eq_ignore_ascii_case(mime_type))
        .map(|(ext, _)| *ext)
}

/// 综合判断: 先嗅探内容，再看扩展名，最后返回默认值。
pub fn detect(head: &[u8], extension: Option<&str>) -> String {
    sniff(head)
        .or_else(|| extension.and_then(from_extension))
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_images() {
        assert_eq!(sniff(b"\x89PNG\r\n\x1a\nrest"), Some("image/png"));
        assert_eq!(sniff(b"GIF89a...."), Some("image/gif"));
        assert_eq!(sniff(b"\xFF\xD8\xFF\xE0"), Some("image/jpeg"));
        assert_eq!(sniff(b"RIFF\x00\x00\x00\x00WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff(b"\x00\x00\x00\x1cftypavif"), Some("image/avif"));
        assert_eq!(sniff(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>"), Some("image/svg+xml"));
        assert_eq!(sniff(b"<?xml version=\"1.0\"?>\n<svg></svg>"), Some("image/svg+xml"));
    }

    #[test]
    fn test_sniff_unknown() {
        assert_eq!(sniff(b"hello world"), None);
        assert_eq!(sniff(b""), None);
        assert_eq!(sniff(b"<?xml version=\"1.0\"?><note/>"), None);
    }

    #[test]
    fn test_detect_prefers_content() {
        // 内容是 PNG，扩展名却是 txt
        assert_eq!(detect(b"\x89PNG\r\n\x1a\n", Some("txt")), "image/png");
        assert_eq!(detect(b"plain", Some("TXT")), "text/plain");
        assert_eq!(detect(b"plain", None), DEFAULT_MIME_TYPE);
        assert_eq!(detect(b"plain", Some("unknown")), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("text/plain; charset=utf-8"), Some("txt"));
        assert_eq!(extension_for("application/x-unknown"), None);
    }
}
