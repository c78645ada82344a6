/// 暂存与对比模块
///
/// 对一组记录批量暂存字段修改、生成（原始，更新后）对比视图、丢弃暂存。
/// 所有函数都以 `RecordStore` 中的下标指定记录。

use crate::record::{Field, FieldValue, Record, RecordIdentity, ResourceRecordSet, UpdateOutcome};
use crate::store::RecordStore;
use super::delta::StagedEdit;

/// 批量暂存结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageReport {
    /// 实际写入的修改（可用于撤销）
    pub edits: Vec<StagedEdit>,
    /// 因字段不存在被忽略的记录
    pub missing_field: Vec<RecordIdentity>,
    /// 因值类型不匹配被忽略的记录
    pub type_mismatch: Vec<RecordIdentity>,
}

impl StageReport {
    pub fn staged(&self) -> usize {
        self.edits.len()
    }

    pub fn skipped(&self) -> usize {
        self.missing_field.len() + self.type_mismatch.len()
    }
}

/// 对指定记录批量暂存一个字段修改
///
/// 对每条记录调用 `Record::update`，单条记录被忽略不影响其他记录。
pub fn stage_edit(store: &mut RecordStore, indices: &[usize], field: &Field, value: &FieldValue) -> StageReport {
    let mut report = StageReport::default();

    for &index in indices {
        let Some(record) = store.record_mut(index) else {
            continue;
        };
        let identity = record.identity();
        let previous = record.overlay().get(field).cloned();

        match record.update(field.clone(), value.clone()) {
            UpdateOutcome::Staged => report.edits.push(StagedEdit {
                identity,
                field: field.clone(),
                previous,
                value: value.clone(),
            }),
            UpdateOutcome::MissingField => report.missing_field.push(identity),
            UpdateOutcome::TypeMismatch => report.type_mismatch.push(identity),
        }
    }

    tracing::debug!(
        %field,
        staged = report.staged(),
        skipped = report.skipped(),
        "edit staged"
    );
    report
}

/// 丢弃指定记录的暂存修改，返回实际被清空的记录数
pub fn discard(store: &mut RecordStore, indices: &[usize]) -> usize {
    let mut cleared = 0;
    for &index in indices {
        if let Some(record) = store.record_mut(index) {
            if record.is_staged() {
                cleared += 1;
            }
            record.reset();
        }
    }
    cleared
}

/// （原始，更新后）对比视图
///
/// 两个列表按位置一一对应，是只读快照。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffView {
    pub original: Vec<ResourceRecordSet>,
    pub updated: Vec<ResourceRecordSet>,
}

impl DiffView {
    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    /// 成对迭代
    pub fn pairs(&self) -> impl Iterator<Item = (&ResourceRecordSet, &ResourceRecordSet)> {
        self.original.iter().zip(self.updated.iter())
    }

    /// 第 i 项中值发生变化的字段
    pub fn changed_fields(&self, index: usize) -> Vec<Field> {
        let (Some(original), Some(updated)) = (self.original.get(index), self.updated.get(index)) else {
            return Vec::new();
        };
        original
            .present_fields()
            .into_iter()
            .filter(|field| original.get(field) != updated.get(field))
            .collect()
    }
}

/// 生成对比视图，不修改任何记录
pub fn build_diff_view<'a>(records: impl IntoIterator<Item = &'a Record>) -> DiffView {
    let mut view = DiffView::default();
    for record in records {
        view.original.push(record.snapshot_original());
        view.updated.push(record.snapshot_updated());
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RecordStore {
        let mut weighted = ResourceRecordSet::new("a.example.com.", "A");
        weighted.weight = Some(10);
        weighted.ttl = Some(60);
        let mut plain = ResourceRecordSet::new("b.example.com.", "A");
        plain.ttl = Some(60);
        RecordStore::from_record_sets(vec![weighted, plain])
    }

    #[test]
    fn test_stage_edit_reports_skips() {
        let mut store = store();
        let report = stage_edit(&mut store, &[0, 1], &Field::Weight, &FieldValue::Weight(50));

        assert_eq!(report.staged(), 1);
        assert_eq!(report.missing_field.len(), 1);
        assert_eq!(report.edits[0].previous, None);
        assert_eq!(store.staged_indices(), vec![0]);
    }

    #[test]
    fn test_stage_edit_records_previous_overlay() {
        let mut store = store();
        stage_edit(&mut store, &[0], &Field::Weight, &FieldValue::Weight(50));
        let report = stage_edit(&mut store, &[0], &Field::Weight, &FieldValue::Weight(60));

        assert_eq!(report.edits[0].previous, Some(FieldValue::Weight(50)));
    }

    #[test]
    fn test_diff_view_is_read_only() {
        let mut store = store();
        stage_edit(&mut store, &[0, 1], &Field::Ttl, &FieldValue::Ttl(300));

        let diff = build_diff_view(store.staged_records());
        assert_eq!(diff.len(), 2);
        assert_eq!(diff.original[0].ttl, Some(60));
        assert_eq!(diff.updated[0].ttl, Some(300));
        assert_eq!(diff.changed_fields(1), vec![Field::Ttl]);
        assert!(diff.changed_fields(5).is_empty());
        assert_eq!(store.staged_indices(), vec![0, 1]);
    }

    #[test]
    fn test_discard() {
        let mut store = store();
        stage_edit(&mut store, &[0, 1], &Field::Ttl, &FieldValue::Ttl(300));

        assert_eq!(discard(&mut store, &[1, 7]), 1);
        assert_eq!(store.staged_indices(), vec![0]);
        assert_eq!(discard(&mut store, &[1]), 0);
    }
}
