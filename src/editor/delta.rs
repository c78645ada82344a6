/// 暂存修改追踪模块
///
/// 该模块实现修改日志，支持撤销/重做功能。
/// 每次批量暂存被记录为一个批次，撤销/重做以批次为单位。

use std::time::Instant;
use crate::record::{Field, FieldValue, RecordIdentity};

/// 暂存修改日志
///
/// # 功能
/// - 记录每一次批量暂存
/// - 支持撤销/重做
/// - 提供修改历史查询
///
/// # 实现细节
/// - 使用两个栈实现撤销/重做：undo_stack 和 redo_stack
/// - 所有批次按时间顺序存储在 batches 向量中
/// - 栈中存储的是索引而非实际数据，避免数据拷贝
#[derive(Debug, Clone, Default)]
pub struct EditJournal {
    /// 所有批次的完整记录
    batches: Vec<EditBatch>,
    /// 撤销栈（存储 batches 中的索引）
    undo_stack: Vec<usize>,
    /// 重做栈（存储 batches 中的索引）
    redo_stack: Vec<usize>,
}

/// 单条记录的单个字段修改
#[derive(Debug, Clone, PartialEq)]
pub struct StagedEdit {
    /// 记录标识
    pub identity: RecordIdentity,
    /// 被修改的字段
    pub field: Field,
    /// 修改前暂存层中的值（`None` 表示之前未暂存）
    pub previous: Option<FieldValue>,
    /// 新的暂存值
    pub value: FieldValue,
}

/// 一次批量暂存
#[derive(Debug, Clone, PartialEq)]
pub struct EditBatch {
    pub edits: Vec<StagedEdit>,
    /// 应用时间戳
    pub applied_at: Instant,
}

impl EditBatch {
    pub fn new(edits: Vec<StagedEdit>) -> Self {
        Self {
            edits,
            applied_at: Instant::now(),
        }
    }
}

impl EditJournal {
    /// 创建新的修改日志
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个批次
    ///
    /// # 行为
    /// - 将批次添加到 batches 列表
    /// - 将索引压入 undo_stack
    /// - 清空 redo_stack（因为新操作会使重做栈失效）
    pub fn add_batch(&mut self, batch: EditBatch) {
        let index = self.batches.len();
        self.batches.push(batch);
        self.undo_stack.push(index);
        self.redo_stack.clear();
    }

    /// 弹出最后一个可撤销的批次
    pub fn undo(&mut self) -> Option<&EditBatch> {
        let index = self.undo_stack.pop()?;
        self.redo_stack.push(index);
        Some(&self.batches[index])
    }

    /// 弹出最后一个被撤销的批次
    pub fn redo(&mut self) -> Option<&EditBatch> {
        let index = self.redo_stack.pop()?;
        self.undo_stack.push(index);
        Some(&self.batches[index])
    }

    /// 当前有效批次数（撤销栈大小）
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    /// 按应用顺序返回当前有效的批次
    pub fn iter(&self) -> impl Iterator<Item = &EditBatch> {
        self.undo_stack.iter().map(|&idx| &self.batches[idx])
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// 清空日志
    pub fn clear(&mut self) {
        self.batches.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// 获取特定记录的所有有效修改
    pub fn edits_for(&self, identity: &RecordIdentity) -> Vec<&StagedEdit> {
        self.iter()
            .flat_map(|batch| batch.edits.iter())
            .filter(|edit| &edit.identity == identity)
            .collect()
    }

    /// 生成日志摘要
    pub fn summary(&self) -> String {
        format!(
            "批次总数: {}, 有效批次: {}, 可撤销: {}, 可重做: {}",
            self.batches.len(),
            self.undo_stack.len(),
            self.can_undo(),
            self.can_redo()
        )
    }
}

impl std::fmt::Display for StagedEdit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let previous = self
            .previous
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        write!(f, "[{}] {}: {} -> {}", self.identity, self.field, previous, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(name: &str, weight: u8) -> EditBatch {
        EditBatch::new(vec![StagedEdit {
            identity: RecordIdentity {
                name: name.to_string(),
                record_type: "A".to_string(),
                set_identifier: None,
            },
            field: Field::Weight,
            previous: None,
            value: FieldValue::Weight(weight),
        }])
    }

    #[test]
    fn test_journal_basic() {
        let mut journal = EditJournal::new();
        assert!(journal.is_empty());

        journal.add_batch(batch("a", 1));
        assert_eq!(journal.len(), 1);
        assert!(journal.can_undo());
    }

    #[test]
    fn test_undo_redo() {
        let mut journal = EditJournal::new();
        journal.add_batch(batch("a", 1));
        journal.add_batch(batch("b", 2));
        journal.add_batch(batch("c", 3));

        let undone = journal.undo().unwrap();
        assert_eq!(undone.edits[0].identity.name, "c");
        assert_eq!(journal.len(), 2);

        journal.undo().unwrap();
        let redone = journal.redo().unwrap();
        assert_eq!(redone.edits[0].identity.name, "b");
        assert_eq!(journal.len(), 2);
    }

    #[test]
    fn test_new_batch_clears_redo() {
        let mut journal = EditJournal::new();
        journal.add_batch(batch("a", 1));
        journal.add_batch(batch("b", 2));

        journal.undo().unwrap();
        assert!(journal.can_redo());

        journal.add_batch(batch("c", 3));
        assert!(!journal.can_redo());
    }

    #[test]
    fn test_empty_stacks() {
        let mut journal = EditJournal::new();
        assert!(journal.undo().is_none());
        assert!(journal.redo().is_none());
    }

    #[test]
    fn test_edits_for_record() {
        let mut journal = EditJournal::new();
        journal.add_batch(batch("a", 1));
        journal.add_batch(batch("b", 2));
        journal.add_batch(batch("a", 3));

        let identity = journal.iter().next().unwrap().edits[0].identity.clone();
        assert_eq!(journal.edits_for(&identity).len(), 2);

        journal.undo();
        assert_eq!(journal.edits_for(&identity).len(), 1);
    }

    #[test]
    fn test_clear_and_summary() {
        let mut journal = EditJournal::new();
        journal.add_batch(batch("a", 1));
        journal.add_batch(batch("b", 2));
        assert!(journal.summary().contains("批次总数: 2"));

        journal.clear();
        assert!(journal.is_empty());
        assert!(!journal.can_redo());
    }

    #[test]
    fn test_display() {
        let edit = &batch("mx.example.com.", 7).edits[0];
        assert_eq!(edit.to_string(), "[mx.example.com. A] Weight: - -> 7");
    }
}
