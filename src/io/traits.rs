/// IO 抽象层 - trait 定义
///
/// 该模块定义了远端记录区域和变更集存储的抽象接口，支持依赖注入和测试 mock。
/// 核心逻辑只依赖这里的 trait，不关心远端 SDK 或文件格式的细节。

use serde::{Deserialize, Serialize};
use crate::changeset::Changeset;
use crate::record::ResourceRecordSet;
use crate::utils::Result;

/// 分页游标（不透明）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageToken(pub String);

/// 一页记录
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 本页记录
    pub records: Vec<ResourceRecordSet>,
    /// 下一页游标，`None` 表示已经是最后一页
    pub next: Option<PageToken>,
}

/// 变更动作
///
/// 只使用 UPSERT：记录存在则整体替换，不存在则创建。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeAction {
    #[serde(rename = "UPSERT")]
    Upsert,
}

/// 批次中的单个变更
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Change {
    pub action: ChangeAction,
    pub resource_record_set: ResourceRecordSet,
}

/// 一次原子提交的变更批次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeBatch {
    pub comment: String,
    pub changes: Vec<Change>,
}

impl ChangeBatch {
    /// 由一组更新后的记录快照构造 UPSERT 批次（保持顺序）
    pub fn upserts(
        comment: impl Into<String>,
        records: impl IntoIterator<Item = ResourceRecordSet>,
    ) -> Self {
        Self {
            comment: comment.into(),
            changes: records
                .into_iter()
                .map(|resource_record_set| Change {
                    action: ChangeAction::Upsert,
                    resource_record_set,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// 远端对批次的处理结果
///
/// 远端保证整批要么全部生效要么全部不生效，没有部分成功。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    Accepted,
    Rejected { reason: String },
}

/// 远端记录区域 trait
///
/// # 职责
/// - 分页列出全部记录集
/// - 以单次调用原子地应用一个变更批次
///
/// 凭证、重试和具体 SDK 调用都由实现方负责。
pub trait RemoteZone {
    /// 区域标识
    fn zone_id(&self) -> &str;

    /// 读取一页记录
    ///
    /// # 参数
    /// * `start` - 上一页返回的游标，`None` 表示从头开始
    fn list_page(&self, start: Option<&PageToken>) -> Result<Page>;

    /// 原子地应用变更批次
    ///
    /// 传输失败返回 `Err`；远端明确拒绝返回 `Ok(BatchStatus::Rejected)`。
    fn apply_batch(&self, batch: &ChangeBatch) -> Result<BatchStatus>;
}

/// 变更集存储 trait
///
/// # 职责
/// - 按名称保存/读取成对的（更新后，原始）快照
/// - 列出已保存的变更集
pub trait ChangesetStore {
    /// 保存变更集
    fn write(&self, name: &str, changeset: &Changeset) -> Result<()>;

    /// 读取变更集
    fn read(&self, name: &str) -> Result<Changeset>;

    /// 列出已保存的变更集名称（排序后）
    fn list(&self) -> Result<Vec<String>>;
}
