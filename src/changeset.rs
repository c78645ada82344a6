/// 变更集模块
///
/// 变更集是暂存修改的不可变快照：每一项都是（原始，更新后）一对记录集。
/// 它可以保存到磁盘，在刷新之后重新挂回到实时记录上。
///
/// # 挂回规则
///
/// 一项变更只有在实时记录满足以下两点时才会被挂回：
/// - 标识（名称、类型、SetIdentifier）相同
/// - 实时记录的全部字段与保存时的原始快照**完全相等**
///
/// 任何一个字段发生了漂移（远端被修改或被其他变更集提交过），该项就会被跳过，
/// 并在 `AttachReport` 中报告。匹配成功的项总会回到暂存状态，
/// 即使暂存值与原始值相同。
use crate::record::{Field, Record, RecordIdentity, ResourceRecordSet, UpdateOutcome};
use crate::utils::{Result, StagerError};

/// 变更集中的一项
#[derive(Debug, Clone, PartialEq)]
pub struct ChangesetEntry {
    pub original: ResourceRecordSet,
    pub updated: ResourceRecordSet,
}

impl ChangesetEntry {
    pub fn identity(&self) -> RecordIdentity {
        self.original.identity()
    }

    /// 更新后与原始值不同的字段
    pub fn changed_fields(&self) -> Vec<Field> {
        let mut fields = self.original.present_fields();
        for field in self.updated.present_fields() {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        fields.retain(|field| self.original.get(field) != self.updated.get(field));
        fields
    }
}

/// 变更集
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Changeset {
    entries: Vec<ChangesetEntry>,
}

/// 挂回结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttachReport {
    /// 成功挂回的项数
    pub attached: usize,
    /// 未找到匹配记录（不存在或已漂移）的项
    pub skipped: Vec<RecordIdentity>,
}

impl Changeset {
    /// 由所有存在暂存修改的记录构造变更集（保持顺序）
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let entries = records
            .into_iter()
            .filter(|record| record.is_staged())
            .map(|record| ChangesetEntry {
                original: record.snapshot_original(),
                updated: record.snapshot_updated(),
            })
            .collect();
        Self { entries }
    }

    /// 由两份按位置对应的快照列表构造
    pub fn from_snapshots(
        name: &str,
        updated: Vec<ResourceRecordSet>,
        original: Vec<ResourceRecordSet>,
    ) -> Result<Self> {
        if updated.len() != original.len() {
            return Err(StagerError::CorruptChangeset {
                name: name.to_string(),
                reason: format!(
                    "更新快照 {} 项，原始快照 {} 项",
                    updated.len(),
                    original.len()
                ),
            });
        }

        let mut entries = Vec::with_capacity(updated.len());
        for (i, (updated, original)) in updated.into_iter().zip(original).enumerate() {
            if updated.identity() != original.identity() {
                return Err(StagerError::CorruptChangeset {
                    name: name.to_string(),
                    reason: format!(
                        "第 {} 项标识不一致: {} / {}",
                        i,
                        updated.identity(),
                        original.identity()
                    ),
                });
            }
            entries.push(ChangesetEntry { original, updated });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ChangesetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 更新后快照列表
    pub fn updated_snapshots(&self) -> Vec<&ResourceRecordSet> {
        self.entries.iter().map(|e| &e.updated).collect()
    }

    /// 原始快照列表
    pub fn original_snapshots(&self) -> Vec<&ResourceRecordSet> {
        self.entries.iter().map(|e| &e.original).collect()
    }

    /// 把变更集挂回到实时记录上
    ///
    /// 匹配成功的记录，其暂存层会被整体替换为变更集中的修改；
    /// 未匹配的项不会影响任何记录。
    pub fn attach(&self, records: &mut [Record]) -> AttachReport {
        let mut report = AttachReport::default();

        for entry in &self.entries {
            let identity = entry.identity();
            let live = records
                .iter_mut()
                .find(|record| record.identity() == identity && *record.fields() == entry.original);

            let Some(record) = live else {
                tracing::warn!(%identity, "changeset entry does not match live record, skipped");
                report.skipped.push(identity);
                continue;
            };

            let mut fields = entry.changed_fields();
            if fields.is_empty() {
                // 暂存值与原始值相同，按原样重新暂存
                fields = entry.updated.present_fields();
            }

            record.reset();
            for field in fields {
                let outcome = match entry.updated.get(&field) {
                    Some(value) => record.update(field.clone(), value),
                    None => UpdateOutcome::MissingField,
                };
                if outcome != UpdateOutcome::Staged {
                    tracing::warn!(%identity, %field, ?outcome, "changeset field not attachable");
                }
            }

            if record.is_staged() {
                report.attached += 1;
            } else {
                tracing::warn!(%identity, "changeset entry has no attachable field, skipped");
                report.skipped.push(identity);
            }
        }

        report
    }
}
