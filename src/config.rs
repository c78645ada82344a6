//! 运行配置

use std::path::{Path, PathBuf};
use crate::io::DEFAULT_PAGE_SIZE;
use crate::utils::{Result, StagerError};

/// 默认区域文件目录
pub const DEFAULT_ZONE_DIR: &str = "zones";
/// 默认变更集目录
pub const DEFAULT_CHANGESET_DIR: &str = "changesets";
/// 默认日志文件
pub const DEFAULT_LOG_FILE: &str = "logs/r53_updates.log";

/// 编辑器配置
///
/// 唯一必填项是区域标识，缺失时启动失败。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    pub zone_id: String,
    pub zone_dir: PathBuf,
    pub changeset_dir: PathBuf,
    pub log_file: PathBuf,
    pub page_size: usize,
}

impl EditorConfig {
    /// 创建配置，区域标识为空或缺失时返回 `MissingZoneId`
    pub fn new(zone_id: Option<String>) -> Result<Self> {
        let zone_id = zone_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(StagerError::MissingZoneId)?;

        Ok(Self {
            zone_id,
            zone_dir: PathBuf::from(DEFAULT_ZONE_DIR),
            changeset_dir: PathBuf::from(DEFAULT_CHANGESET_DIR),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_zone_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.zone_dir = dir.into();
        self
    }

    pub fn with_changeset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.changeset_dir = dir.into();
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = path.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn zone_dir(&self) -> &Path {
        &self.zone_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_zone_id() {
        assert!(matches!(EditorConfig::new(None), Err(StagerError::MissingZoneId)));
        assert!(matches!(EditorConfig::new(Some("  ".into())), Err(StagerError::MissingZoneId)));
    }

    #[test]
    fn test_defaults_and_overrides() {
        let config = EditorConfig::new(Some(" Z123 ".into())).unwrap();
        assert_eq!(config.zone_id, "Z123");
        assert_eq!(config.changeset_dir, PathBuf::from("changesets"));
        assert_eq!(config.page_size, 300);

        let config = config.with_page_size(0).with_changeset_dir("/tmp/cs");
        assert_eq!(config.page_size, 1);
        assert_eq!(config.changeset_dir, PathBuf::from("/tmp/cs"));
    }
}
