/// 提交模块
///
/// 把所有暂存修改打包成一个 UPSERT 批次，一次性提交到远端。
/// 成功时清空这些记录的暂存层；失败时不触碰任何暂存层。

use crate::io::{BatchStatus, ChangeBatch, RemoteZone};
use crate::record::{RecordIdentity, ResourceRecordSet};
use crate::store::RecordStore;
use crate::utils::{Result, StagerError};

/// 默认的批次备注
pub const DEFAULT_COMMENT: &str = "MTA Update";

/// 提交结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    /// 本次提交的记录标识（按批次顺序）
    pub applied: Vec<RecordIdentity>,
}

impl CommitReport {
    pub fn len(&self) -> usize {
        self.applied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

/// 由暂存记录构造变更批次
pub fn build_batch(store: &RecordStore, comment: &str) -> ChangeBatch {
    ChangeBatch::upserts(
        comment,
        store.staged_records().into_iter().map(|r| r.snapshot_updated()),
    )
}

/// 提交所有暂存修改
///
/// # 行为
/// - 没有暂存修改时返回 `NothingStaged`，不调用远端
/// - 远端接受：清空参与提交的记录的暂存层，本地原始值保持不变直到下一次刷新
/// - 远端拒绝或传输失败：返回错误，所有暂存层保持原样
pub fn commit(store: &mut RecordStore, remote: &dyn RemoteZone, comment: &str) -> Result<CommitReport> {
    let staged = store.staged_indices();
    if staged.is_empty() {
        return Err(StagerError::NothingStaged);
    }

    let records = store.records();
    let updates: Vec<ResourceRecordSet> = staged.iter().map(|&i| records[i].snapshot_updated()).collect();
    let originals: Vec<ResourceRecordSet> = staged.iter().map(|&i| records[i].snapshot_original()).collect();
    let applied: Vec<RecordIdentity> = staged.iter().map(|&i| records[i].identity()).collect();

    // 日志内容在提交前生成，远端成功后不会再有失败路径
    let update_log = serde_json::to_string(&updates)?;
    let original_log = serde_json::to_string(&originals)?;

    let batch = ChangeBatch::upserts(comment, updates);
    match remote.apply_batch(&batch)? {
        BatchStatus::Accepted => {}
        BatchStatus::Rejected { reason } => {
            tracing::error!(zone = remote.zone_id(), %reason, "change batch rejected");
            return Err(StagerError::Rejected(reason));
        }
    }

    tracing::info!(
        zone = remote.zone_id(),
        count = applied.len(),
        update = %update_log,
        orig = %original_log,
        "change batch applied"
    );

    for &index in &staged {
        if let Some(record) = store.record_mut(index) {
            record.reset();
        }
    }

    Ok(CommitReport { applied })
}
