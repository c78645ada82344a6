/// 变更集文件 IO 实现
///
/// 每个变更集对应目录中的两个文件：
/// - `<name>.json`: 更新后的快照列表
/// - `<name>_orig.json`: 原始快照列表
///
/// 两个文件按位置一一对应。
use std::path::{Path, PathBuf};
use super::traits::ChangesetStore;
use crate::changeset::Changeset;
use crate::record::ResourceRecordSet;
use crate::utils::{create_backup, validate_changeset_name, Result, StagerError};
use crate::ORIGINAL_SUFFIX;

/// 基于目录的变更集存储
#[derive(Debug, Clone)]
pub struct DirChangesetStore {
    dir: PathBuf,
}

impl DirChangesetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 更新后快照文件路径
    pub fn updated_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// 原始快照文件路径
    pub fn original_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}.json", name, ORIGINAL_SUFFIX))
    }

    /// 先写临时文件，全部成功后再备份并替换正式文件
    fn replace_files(files: &[(PathBuf, String)]) -> Result<()> {
        let mut staged: Vec<PathBuf> = Vec::with_capacity(files.len());
        for (path, json) in files {
            let tmp_path = path.with_extension("json.tmp");
            if let Err(e) = std::fs::write(&tmp_path, json) {
                for tmp in staged.iter().chain(std::iter::once(&tmp_path)) {
                    let _ = std::fs::remove_file(tmp);
                }
                return Err(e.into());
            }
            staged.push(tmp_path);
        }

        for (path, _) in files {
            if path.exists() {
                let backup = create_backup(path)?;
                tracing::info!(?backup, "backed up existing changeset file");
            }
        }

        for ((path, _), tmp_path) in files.iter().zip(&staged) {
            std::fs::rename(tmp_path, path)?;
        }
        Ok(())
    }

    fn read_snapshots(name: &str, path: &Path) -> Result<Vec<ResourceRecordSet>> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| StagerError::CorruptChangeset {
            name: name.to_string(),
            reason: format!("{:?}: {}", path, e),
        })
    }
}

impl ChangesetStore for DirChangesetStore {
    fn write(&self, name: &str, changeset: &Changeset) -> Result<()> {
        let name = validate_changeset_name(name)?;

        // 确保目录存在
        std::fs::create_dir_all(&self.dir)?;

        let files = [
            (
                self.updated_path(name),
                serde_json::to_string_pretty(&changeset.updated_snapshots())?,
            ),
            (
                self.original_path(name),
                serde_json::to_string_pretty(&changeset.original_snapshots())?,
            ),
        ];
        Self::replace_files(&files)
    }

    fn read(&self, name: &str) -> Result<Changeset> {
        let name = validate_changeset_name(name)?;

        let updated_path = self.updated_path(name);
        if !updated_path.exists() {
            return Err(StagerError::ChangesetNotFound(name.to_string()));
        }

        let original_path = self.original_path(name);
        if !original_path.exists() {
            return Err(StagerError::CorruptChangeset {
                name: name.to_string(),
                reason: format!("缺少原始快照文件 {:?}", original_path),
            });
        }

        let updated = Self::read_snapshots(name, &updated_path)?;
        let original = Self::read_snapshots(name, &original_path)?;
        Changeset::from_snapshots(name, updated, original)
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.ends_with(ORIGINAL_SUFFIX) || stem.starts_with('.') {
                continue;
            }
            names.push(stem.to_string());
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Field, FieldValue, Record};
    use tempfile::TempDir;

    fn staged_changeset() -> Changeset {
        let mut set = ResourceRecordSet::new("mx.example.com.", "A");
        set.set_identifier = Some("a".to_string());
        set.weight = Some(10);
        let mut record = Record::new(set);
        record.update(Field::Weight, FieldValue::Weight(50));
        Changeset::from_records([&record])
    }

    #[test]
    fn test_write_creates_file_pair() {
        let dir = TempDir::new().unwrap();
        let store = DirChangesetStore::new(dir.path().join("changesets"));

        store.write("drain", &staged_changeset()).unwrap();

        let updated: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.updated_path("drain")).unwrap()).unwrap();
        let original: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.original_path("drain")).unwrap()).unwrap();
        assert_eq!(updated[0]["Weight"], 50);
        assert_eq!(original[0]["Weight"], 10);
        assert!(store.original_path("drain").ends_with("drain_orig.json"));
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = DirChangesetStore::new(dir.path());
        let changeset = staged_changeset();

        store.write("drain", &changeset).unwrap();
        assert_eq!(store.read("drain").unwrap(), changeset);
    }

    #[test]
    fn test_overwrite_creates_backup() {
        let dir = TempDir::new().unwrap();
        let store = DirChangesetStore::new(dir.path());

        store.write("drain", &staged_changeset()).unwrap();
        store.write("drain", &staged_changeset()).unwrap();

        let backups = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("bak"))
            .count();
        assert!(backups >= 2);
        assert_eq!(store.list().unwrap(), vec!["drain".to_string()]);
    }

    #[test]
    fn test_failed_write_keeps_previous_pair() {
        let dir = TempDir::new().unwrap();
        let store = DirChangesetStore::new(dir.path());
        store.write("drain", &staged_changeset()).unwrap();
        let before = std::fs::read_to_string(store.updated_path("drain")).unwrap();

        // 原始快照的临时文件无法写入
        std::fs::create_dir(dir.path().join("drain_orig.json.tmp")).unwrap();

        let mut set = ResourceRecordSet::new("mx.example.com.", "A");
        set.set_identifier = Some("a".to_string());
        set.weight = Some(10);
        let mut record = Record::new(set);
        record.update(Field::Weight, FieldValue::Weight(99));
        assert!(store.write("drain", &Changeset::from_records([&record])).is_err());

        assert_eq!(std::fs::read_to_string(store.updated_path("drain")).unwrap(), before);
        assert!(!dir.path().join("drain.json.tmp").exists());
        assert_eq!(store.read("drain").unwrap(), staged_changeset());
    }

    #[test]
    fn test_list_excludes_original_files() {
        let dir = TempDir::new().unwrap();
        let store = DirChangesetStore::new(dir.path());

        store.write("b-second", &staged_changeset()).unwrap();
        store.write("a-first", &staged_changeset()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(
            store.list().unwrap(),
            vec!["a-first".to_string(), "b-second".to_string()]
        );
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = DirChangesetStore::new(dir.path().join("nope"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_read_errors() {
        let dir = TempDir::new().unwrap();
        let store = DirChangesetStore::new(dir.path());

        assert!(matches!(store.read("missing"), Err(StagerError::ChangesetNotFound(_))));
        assert!(matches!(store.read("../x"), Err(StagerError::InvalidChangesetName(_))));

        std::fs::write(store.updated_path("half"), "[]").unwrap();
        assert!(matches!(store.read("half"), Err(StagerError::CorruptChangeset { .. })));

        std::fs::write(store.updated_path("bad"), "not json").unwrap();
        std::fs::write(store.original_path("bad"), "[]").unwrap();
        assert!(matches!(store.read("bad"), Err(StagerError::CorruptChangeset { .. })));
    }
}
