/// 区域编辑器模块
///
/// 提供有状态的记录编辑接口，支持批量暂存和延迟提交。
/// 遵循"修改-提交分离"原则，所有修改操作仅在内存中进行。

use crate::changeset::{AttachReport, Changeset};
use crate::io::{ChangesetStore, RemoteZone};
use crate::record::{Field, FieldValue, Record, RecordIdentity};
use crate::selector::{Family, Refinement};
use crate::store::{RecordStore, RefineOutcome};
use crate::utils::{parse_weight, Result, StagerError};
use super::commit::{commit, CommitReport, DEFAULT_COMMENT};
use super::delta::{EditBatch, EditJournal};
use super::staging::{build_diff_view, discard, stage_edit, DiffView, StageReport};

/// 区域编辑器 - 管理记录的暂存状态
///
/// # 核心特性
/// - **Stateful**: 维护暂存状态，支持多次修改后统一提交
/// - **可追踪**: 记录每次批量暂存，支持撤销/重做
/// - **可恢复**: 暂存修改可保存为变更集，刷新后再加载
///
/// # 使用示例
///
/// ```rust,ignore
/// use recordset_editor::{Family, ZoneEditor};
/// use recordset_editor::io::{DirChangesetStore, ZoneFile};
///
/// let zone = ZoneFile::new(Path::new("zones"), "Z123");
/// let mut editor = ZoneEditor::open(zone, DirChangesetStore::new("changesets"))?;
///
/// editor.select_family(Family::weighted());
/// editor.refine("mx1")?;
/// editor.stage_weight("0")?;
///
/// editor.save_changeset("drain-mx1")?;
/// editor.commit()?;
/// ```
pub struct ZoneEditor<R: RemoteZone, C: ChangesetStore> {
    /// 远端区域
    remote: R,
    /// 变更集存储
    changesets: C,
    /// 本地记录仓库
    store: RecordStore,
    /// 暂存日志
    journal: EditJournal,
    /// 提交批次备注
    comment: String,
}

impl<R: RemoteZone, C: ChangesetStore> ZoneEditor<R, C> {
    /// 创建编辑器并从远端拉取全部记录
    pub fn open(remote: R, changesets: C) -> Result<Self> {
        let mut editor = Self::new(remote, changesets);
        editor.refresh()?;
        Ok(editor)
    }

    /// 创建空编辑器（不访问远端）
    pub fn new(remote: R, changesets: C) -> Self {
        Self {
            remote,
            changesets,
            store: RecordStore::new(),
            journal: EditJournal::new(),
            comment: DEFAULT_COMMENT.to_string(),
        }
    }

    /// 设置提交批次备注
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// 从远端刷新（会丢弃所有未保存的暂存修改）
    pub fn refresh(&mut self) -> Result<usize> {
        let count = self.store.refresh(&self.remote)?;
        self.journal.clear();
        Ok(count)
    }

    // --- 筛选 ---

    /// 记录族筛选
    pub fn select_family(&mut self, family: Family) -> usize {
        self.store.select_family(family)
    }

    /// 细化筛选
    pub fn refine(&mut self, input: &str) -> Result<RefineOutcome> {
        let refinement = Refinement::parse(input)?;
        Ok(self.store.refine(&refinement))
    }

    /// 当前视图
    pub fn view(&self) -> Vec<&Record> {
        self.store.view()
    }

    // --- 暂存 ---

    /// 对当前视图中的所有记录暂存一个字段修改
    pub fn stage(&mut self, field: Field, value: FieldValue) -> StageReport {
        let indices = self.store.view_indices().to_vec();
        let report = stage_edit(&mut self.store, &indices, &field, &value);
        if !report.edits.is_empty() {
            self.journal.add_batch(EditBatch::new(report.edits.clone()));
        }
        report
    }

    /// 校验权重输入后暂存到当前视图
    ///
    /// 非法输入返回 `InvalidWeight`，不会暂存任何内容。
    pub fn stage_weight(&mut self, input: &str) -> Result<StageReport> {
        let weight = parse_weight(input)?;
        Ok(self.stage(Field::Weight, FieldValue::Weight(weight)))
    }

    /// 当前视图的对比
    pub fn view_diff(&self) -> DiffView {
        build_diff_view(self.store.view())
    }

    /// 所有暂存记录的对比
    pub fn staged_diff(&self) -> DiffView {
        build_diff_view(self.store.staged_records())
    }

    /// 所有暂存记录
    pub fn staged(&self) -> Vec<&Record> {
        self.store.staged_records()
    }

    /// 丢弃当前视图的暂存修改（取消流程）
    pub fn discard_view(&mut self) -> usize {
        let indices = self.store.view_indices().to_vec();
        let cleared = discard(&mut self.store, &indices);
        self.journal.clear();
        cleared
    }

    /// 从暂存列表中删除第 `n` 项
    pub fn discard_staged(&mut self, n: usize) -> Result<RecordIdentity> {
        let staged = self.store.staged_indices();
        let Some(&index) = staged.get(n) else {
            return Err(StagerError::IndexOutOfRange {
                index: n,
                len: staged.len(),
            });
        };

        let identity = self.store.records()[index].identity();
        discard(&mut self.store, &[index]);
        self.journal.clear();
        Ok(identity)
    }

    /// 丢弃全部暂存修改
    pub fn discard_all(&mut self) -> usize {
        let staged = self.store.staged_indices();
        let cleared = discard(&mut self.store, &staged);
        self.journal.clear();
        cleared
    }

    /// 撤销最近一次批量暂存，返回恢复的修改数
    pub fn undo(&mut self) -> Result<usize> {
        let batch = self.journal.undo().ok_or(StagerError::EmptyJournal("undo"))?;

        let mut restored = 0;
        for edit in batch.edits.iter().rev() {
            if let Some(index) = self.store.position_of(&edit.identity) {
                if let Some(record) = self.store.record_mut(index) {
                    record.restore_field(&edit.field, edit.previous.clone());
                    restored += 1;
                }
            }
        }
        Ok(restored)
    }

    /// 重做最近一次撤销的批量暂存
    pub fn redo(&mut self) -> Result<usize> {
        let batch = self.journal.redo().ok_or(StagerError::EmptyJournal("redo"))?;

        let mut restored = 0;
        for edit in &batch.edits {
            if let Some(index) = self.store.position_of(&edit.identity) {
                if let Some(record) = self.store.record_mut(index) {
                    record.restore_field(&edit.field, Some(edit.value.clone()));
                    restored += 1;
                }
            }
        }
        Ok(restored)
    }

    // --- 变更集 ---

    /// 把当前暂存保存为变更集，返回保存的项数
    pub fn save_changeset(&self, name: &str) -> Result<usize> {
        let changeset = Changeset::from_records(self.store.records());
        if changeset.is_empty() {
            return Err(StagerError::NothingStaged);
        }

        self.changesets.write(name, &changeset)?;
        tracing::info!(name, count = changeset.len(), "changeset saved");
        Ok(changeset.len())
    }

    /// 列出已保存的变更集
    pub fn list_changesets(&self) -> Result<Vec<String>> {
        self.changesets.list()
    }

    /// 加载变更集并挂回到实时记录
    pub fn load_changeset(&mut self, name: &str) -> Result<AttachReport> {
        let changeset = self.changesets.read(name)?;
        let report = changeset.attach(self.store.records_mut());
        self.journal.clear();

        tracing::info!(
            name,
            attached = report.attached,
            skipped = report.skipped.len(),
            "changeset loaded"
        );
        Ok(report)
    }

    // --- 提交 ---

    /// 提交所有暂存修改
    pub fn commit(&mut self) -> Result<CommitReport> {
        let report = commit(&mut self.store, &self.remote, &self.comment)?;
        self.journal.clear();
        Ok(report)
    }

    // --- 访问器 ---

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn journal(&self) -> &EditJournal {
        &self.journal
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn changesets(&self) -> &C {
        &self.changesets
    }

    /// 是否存在暂存修改
    pub fn is_modified(&self) -> bool {
        !self.store.staged_indices().is_empty()
    }

    /// 生成编辑摘要
    pub fn summary(&self) -> String {
        format!(
            "区域: {}, 记录数: {}, 暂存记录: {}, {}",
            self.remote.zone_id(),
            self.store.len(),
            self.store.staged_indices().len(),
            self.journal.summary()
        )
    }
}
