use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::common::checksum::{ChecksumAlgorithm, ChecksumMode};

/// Errors that can occur while loading a filesystem configuration.
//
// // 加载文件系统配置时可能发生的错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    //
    // // 配置文件不存在。
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while reading the configuration file.
    //
    // // 读取配置文件时发生 I/O 错误。
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The configuration is not valid JSON or has the wrong shape.
    //
    // // 配置不是合法的 JSON，或结构不正确。
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// 一个命名文件系统的配置 (camelCase JSON)。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesystemConfig {
    /// 文件系统名称
    pub name: String,
    /// 公开 URL 的前缀列表。非空时会在适配器外包一层 URL 前缀装饰器
    #[serde(default)]
    pub url_prefixes: Vec<String>,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub checksum: ChecksumConfig,
}

/// 图片识别选项。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    /// 扩展名不在图片列表中时，是否仍然检查 mime 类型
    #[serde(default)]
    pub check_mime: bool,
}

/// 默认校验和的算法与模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecksumConfig {
    #[serde(default)]
    pub algorithm: ChecksumAlgorithm,
    #[serde(default)]
    pub mode: ChecksumMode,
}

impl FilesystemConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_prefixes: Vec::new(),
            image: ImageConfig::default(),
            checksum: ChecksumConfig::default(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}
