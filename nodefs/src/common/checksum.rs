use std::fmt;
use std::io::{self, Read};
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use crate::common::constants::BUFFER_LEN;

/// 支持的哈希算法。默认使用 MD5。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    #[default]
    Md5,
    Sha1,
    Sha256,
}

impl ChecksumAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Md5 => "md5",
            ChecksumAlgorithm::Sha1 => "sha1",
            ChecksumAlgorithm::Sha256 => "sha256",
        }
    }

    /// 流式读取 `reader` 并返回十六进制摘要，不会把整个内容读入内存。
    pub fn hash_reader(&self, reader: &mut dyn Read) -> io::Result<String> {
        match self {
            ChecksumAlgorithm::Md5 => digest_reader::<Md5>(reader),
            ChecksumAlgorithm::Sha1 => digest_reader::<Sha1>(reader),
            ChecksumAlgorithm::Sha256 => digest_reader::<Sha256>(reader),
        }
    }

    pub fn hash_bytes(&self, data: &[u8]) -> String {
        match self {
            ChecksumAlgorithm::Md5 => hex::encode(Md5::digest(data)),
            ChecksumAlgorithm::Sha1 => hex::encode(Sha1::digest(data)),
            ChecksumAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a checksum is computed over.
///
/// `Metadata` hashes size and modification time only. It is a cheap change
/// signal, not an integrity check: two different files with the same size and
/// timestamp produce the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumMode {
    #[default]
    Content,
    Metadata,
}

/// 一次已计算完成的校验和。值不可变；换算法或模式会得到新的 `Checksum`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    algorithm: ChecksumAlgorithm,
    mode: ChecksumMode,
    value: String,
}

impl Checksum {
    pub fn new(algorithm: ChecksumAlgorithm, mode: ChecksumMode, value: impl Into<String>) -> Self {
        Self {
            algorithm,
            mode,
            value: value.into(),
        }
    }

    /// 以 "metadata" 模式计算: 对 `"{size}{unix_timestamp}"` 取摘要。
    pub fn from_metadata(algorithm: ChecksumAlgorithm, size: u64, timestamp: i64) -> Self {
        let value = algorithm.hash_bytes(format!("{}{}", size, timestamp).as_bytes());
        Self::new(algorithm, ChecksumMode::Metadata, value)
    }

    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    pub fn mode(&self) -> ChecksumMode {
        self.mode
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Case-insensitive comparison against a hex digest.
    pub fn matches(&self, hex_digest: &str) -> bool {
        self.value.eq_ignore_ascii_case(hex_digest)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

fn digest_reader<D: Digest>(reader: &mut dyn Read) -> io::Result<String> {
    let mut hasher = D::new();
    let mut buffer = [0u8; BUFFER_LEN];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
