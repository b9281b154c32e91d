//! 内核配置
//!
//! 历史深度、R-tree 扇出、批量重建阈值和捕捉设置。可以从 JSON 加载，缺省字段取默认值。

use crate::error::{KernelError, Result};
use crate::snap::SnapConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 历史记录最大深度
pub const DEFAULT_HISTORY_DEPTH: usize = 500;

/// 撤销/重做配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// 撤销栈容量，超出时丢弃最早的命令
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

/// 空间索引配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// 每个节点的最大条目数
    pub max_entries: usize,
    /// 非根节点的最小条目数
    pub min_entries: usize,
    /// 一次命令涉及的实体数达到该值时整体重建索引，而不是逐个更新
    pub rebuild_threshold: usize,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            max_entries: 9,
            min_entries: 4,
            rebuild_threshold: 64,
        }
    }
}

impl SpatialConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_entries < 2 {
            return Err(KernelError::InvalidConfig(format!(
                "spatial.max_entries must be at least 2, got {}",
                self.max_entries
            )));
        }
        if self.min_entries == 0 || self.min_entries > self.max_entries / 2 {
            return Err(KernelError::InvalidConfig(format!(
                "spatial.min_entries must be in 1..={}, got {}",
                self.max_entries / 2,
                self.min_entries
            )));
        }
        Ok(())
    }
}

/// 内核总配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub history: HistoryConfig,
    pub spatial: SpatialConfig,
    pub snap: SnapConfig,
}

impl KernelConfig {
    /// 从 JSON 字符串解析并校验
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: KernelConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件加载并校验
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        tracing::info!(
            path = %path.display(),
            history_depth = config.history.max_depth,
            max_entries = config.spatial.max_entries,
            "Loaded kernel config"
        );
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history.max_depth == 0 {
            return Err(KernelError::InvalidConfig(
                "history.max_depth must be at least 1".to_string(),
            ));
        }
        self.spatial.validate()?;
        if !(self.snap.grid_spacing > 0.0) {
            return Err(KernelError::InvalidConfig(format!(
                "snap.grid_spacing must be positive, got {}",
                self.snap.grid_spacing
            )));
        }
        if !(self.snap.tolerance >= 0.0) {
            return Err(KernelError::InvalidConfig(format!(
                "snap.tolerance must not be negative, got {}",
                self.snap.tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = KernelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history.max_depth, DEFAULT_HISTORY_DEPTH);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = KernelConfig::from_json_str(r#"{ "history": { "max_depth": 20 } }"#).unwrap();
        assert_eq!(config.history.max_depth, 20);
        assert_eq!(config.spatial, SpatialConfig::default());
    }

    #[test]
    fn test_rejects_bad_fanout() {
        let err = KernelConfig::from_json_str(r#"{ "spatial": { "max_entries": 4, "min_entries": 3 } }"#)
            .unwrap_err();
        assert!(matches!(err, KernelError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_zero_grid() {
        let err = KernelConfig::from_json_str(r#"{ "snap": { "grid_spacing": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, KernelError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = KernelConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, KernelError::Json(_)));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = KernelConfig::default();
        let json = config.to_json_string().unwrap();
        let parsed = KernelConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.spatial, config.spatial);
        assert_eq!(parsed.history, config.history);
    }

    #[test]
    fn test_load_from_temp_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"{{ "history": {{ "max_depth": 42 }}, "snap": {{ "grid_spacing": 5.0 }} }}"#
        )
        .expect("write config");

        let config = KernelConfig::load(file.path()).unwrap();
        assert_eq!(config.history.max_depth, 42);
        assert_eq!(config.snap.grid_spacing, 5.0);
        assert_eq!(config.spatial, SpatialConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = KernelConfig::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, KernelError::Io(_)));
    }

    #[test]
    fn test_load_invalid_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(file, r#"{{ "history": {{ "max_depth": 0 }} }}"#).expect("write config");
        let err = KernelConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, KernelError::InvalidConfig(_)));
    }
}
