use thiserror::Error;
use std::path::Path;

/// 自定义错误类型
#[derive(Error, Debug)]
pub enum StagerError {
    #[error("Missing hosted zone id (set AWS_HOSTED_ZONE_ID or pass --zone-id)")]
    MissingZoneId,

    #[error("Access denied by remote zone: {0}")]
    AccessDenied(String),

    #[error("Remote transport error: {0}")]
    Transport(String),

    #[error("Change batch rejected: {0}")]
    Rejected(String),

    #[error("Nothing staged")]
    NothingStaged,

    #[error("Invalid weight '{0}': expected an integer between 0 and 255")]
    InvalidWeight(String),

    #[error("Invalid index '{0}'")]
    InvalidIndex(String),

    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid changeset name '{0}'")]
    InvalidChangesetName(String),

    #[error("Changeset not found: {0}")]
    ChangesetNotFound(String),

    #[error("Corrupt changeset {name}: {reason}")]
    CorruptChangeset { name: String, reason: String },

    #[error("Nothing to {0}")]
    EmptyJournal(&'static str),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// 库内统一的结果类型
pub type Result<T> = std::result::Result<T, StagerError>;

/// 权重允许的最大值（闭区间 [0, 255]）
pub const MAX_WEIGHT: u8 = u8::MAX;

/// 解析用户输入的权重
///
/// 只接受 [0, 255] 闭区间内的整数，其余输入返回 `InvalidWeight`，
/// 由调用方重新提示输入，不会进入暂存区。
pub fn parse_weight(input: &str) -> Result<u8> {
    let trimmed = input.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| StagerError::InvalidWeight(trimmed.to_string()))?;

    u8::try_from(value).map_err(|_| StagerError::InvalidWeight(trimmed.to_string()))
}

/// 解析用户输入的列表索引（从 0 开始）
pub fn parse_index(input: &str, len: usize) -> Result<usize> {
    let trimmed = input.trim();
    let index: usize = trimmed
        .parse()
        .map_err(|_| StagerError::InvalidIndex(trimmed.to_string()))?;

    if index >= len {
        return Err(StagerError::IndexOutOfRange { index, len });
    }

    Ok(index)
}

/// 校验变更集名称
///
/// 名称会直接成为文件名的一部分，所以不允许为空、包含路径分隔符或以 `.` 开头；
/// 也不能以原始快照后缀结尾，否则会与另一个变更集的原始文件重名。
pub fn validate_changeset_name(name: &str) -> Result<&str> {
    let name = name.trim();
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.ends_with(crate::ORIGINAL_SUFFIX)
        || name.contains(['/', '\\'])
        || name.chars().any(|c| c.is_control());

    if invalid {
        return Err(StagerError::InvalidChangesetName(name.to_string()));
    }

    Ok(name)
}

/// 创建文件备份
pub fn create_backup(file_path: &Path) -> Result<std::path::PathBuf> {
    if !file_path.exists() {
        return Err(StagerError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "原文件不存在"
        )));
    }

    let timestamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
    let backup_path = file_path.with_extension(format!("{}.bak", timestamp));

    std::fs::copy(file_path, &backup_path)?;

    Ok(backup_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_weight_bounds() {
        assert_eq!(parse_weight("0").unwrap(), 0);
        assert_eq!(parse_weight("255").unwrap(), 255);
        assert_eq!(parse_weight(" 42 ").unwrap(), 42);

        assert!(matches!(parse_weight("256"), Err(StagerError::InvalidWeight(_))));
        assert!(matches!(parse_weight("300"), Err(StagerError::InvalidWeight(_))));
        assert!(matches!(parse_weight("-1"), Err(StagerError::InvalidWeight(_))));
        assert!(matches!(parse_weight("abc"), Err(StagerError::InvalidWeight(_))));
        assert!(matches!(parse_weight(""), Err(StagerError::InvalidWeight(_))));
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("1", 3).unwrap(), 1);
        assert!(matches!(
            parse_index("3", 3),
            Err(StagerError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(matches!(parse_index("x", 3), Err(StagerError::InvalidIndex(_))));
    }

    #[test]
    fn test_changeset_name_validation() {
        assert_eq!(validate_changeset_name(" mta-drain ").unwrap(), "mta-drain");

        assert!(validate_changeset_name("").is_err());
        assert!(validate_changeset_name("../escape").is_err());
        assert!(validate_changeset_name("a/b").is_err());
        assert!(validate_changeset_name(".hidden").is_err());
        assert!(validate_changeset_name("drain_orig").is_err());
    }

    #[test]
    fn test_create_backup() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("weights.json");
        std::fs::write(&file, "[]").unwrap();

        let backup = create_backup(&file).unwrap();
        assert!(backup.exists());
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "[]");

        assert!(create_backup(&dir.path().join("missing.json")).is_err());
    }
}
