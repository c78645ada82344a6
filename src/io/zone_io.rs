/// 远端区域的默认实现
///
/// - `MemoryZone`: 进程内实现，可配置分页大小并注入失败，主要用于测试
/// - `ZoneFile`: 以 JSON 区域文件充当远端，便于离线使用命令行工具
/// - `fetch_all`: 跟随分页游标拉取完整记录列表
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use super::traits::{BatchStatus, ChangeBatch, Page, PageToken, RemoteZone};
use crate::record::ResourceRecordSet;
use crate::utils::{Result, StagerError};

/// 默认分页大小
pub const DEFAULT_PAGE_SIZE: usize = 300;

/// 拉取全部记录
///
/// 反复调用 `list_page` 直到没有下一页，任何一页失败都会让整个拉取失败，
/// 调用方不会看到部分结果。
pub fn fetch_all(remote: &dyn RemoteZone) -> Result<Vec<ResourceRecordSet>> {
    let mut records = Vec::new();
    let mut token: Option<PageToken> = None;

    loop {
        let page = remote.list_page(token.as_ref())?;
        records.extend(page.records);

        match page.next {
            Some(next) if token.as_ref() == Some(&next) => {
                return Err(StagerError::Transport(format!(
                    "分页游标未推进: {}",
                    next.0
                )));
            }
            Some(next) => token = Some(next),
            None => break,
        }
    }

    tracing::debug!(zone = remote.zone_id(), count = records.len(), "fetched record sets");
    Ok(records)
}

/// 对记录列表应用 UPSERT 批次（按标识替换，不存在则追加）
fn upsert_all(records: &mut Vec<ResourceRecordSet>, batch: &ChangeBatch) {
    for change in &batch.changes {
        let set = &change.resource_record_set;
        let identity = set.identity();
        match records.iter_mut().find(|r| r.identity() == identity) {
            Some(existing) => *existing = set.clone(),
            None => records.push(set.clone()),
        }
    }
}

/// 按偏移量切出一页
fn slice_page(records: &[ResourceRecordSet], start: Option<&PageToken>, page_size: usize) -> Result<Page> {
    let offset = match start {
        Some(token) => token
            .0
            .parse::<usize>()
            .map_err(|_| StagerError::Transport(format!("无效的分页游标: {}", token.0)))?,
        None => 0,
    };

    let page_size = page_size.max(1);
    let end = offset.saturating_add(page_size).min(records.len());
    let page_records = records.get(offset..end).unwrap_or_default().to_vec();
    let next = (end < records.len()).then(|| PageToken(end.to_string()));

    Ok(Page {
        records: page_records,
        next,
    })
}

/// 注入到 `MemoryZone` 的失败类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedFailure {
    AccessDenied,
    Transport,
    Rejected,
}

impl InjectedFailure {
    fn into_error(self) -> StagerError {
        match self {
            InjectedFailure::AccessDenied => StagerError::AccessDenied("injected".to_string()),
            InjectedFailure::Transport | InjectedFailure::Rejected => {
                StagerError::Transport("injected".to_string())
            }
        }
    }
}

/// 进程内远端区域
///
/// 单线程使用，内部状态通过 `RefCell` 修改。
#[derive(Debug)]
pub struct MemoryZone {
    zone_id: String,
    page_size: usize,
    records: RefCell<Vec<ResourceRecordSet>>,
    applied: RefCell<Vec<ChangeBatch>>,
    fail_list_page: RefCell<Option<(usize, InjectedFailure)>>,
    fail_apply: RefCell<Option<InjectedFailure>>,
}

impl MemoryZone {
    pub fn new(zone_id: impl Into<String>, records: Vec<ResourceRecordSet>) -> Self {
        Self {
            zone_id: zone_id.into(),
            page_size: DEFAULT_PAGE_SIZE,
            records: RefCell::new(records),
            applied: RefCell::new(Vec::new()),
            fail_list_page: RefCell::new(None),
            fail_apply: RefCell::new(None),
        }
    }

    /// 设置分页大小
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// 当前远端记录的副本
    pub fn records(&self) -> Vec<ResourceRecordSet> {
        self.records.borrow().clone()
    }

    /// 直接替换远端记录（模拟远端被其他人修改）
    pub fn replace_records(&self, records: Vec<ResourceRecordSet>) {
        *self.records.borrow_mut() = records;
    }

    /// 已成功应用的批次
    pub fn applied_batches(&self) -> Vec<ChangeBatch> {
        self.applied.borrow().clone()
    }

    /// 让下一次列出操作在第 `page` 页（从 0 开始）失败
    pub fn fail_next_list(&self, page: usize, failure: InjectedFailure) {
        *self.fail_list_page.borrow_mut() = Some((page, failure));
    }

    /// 让下一次批次提交失败
    pub fn fail_next_apply(&self, failure: InjectedFailure) {
        *self.fail_apply.borrow_mut() = Some(failure);
    }
}

impl RemoteZone for MemoryZone {
    fn zone_id(&self) -> &str {
        &self.zone_id
    }

    fn list_page(&self, start: Option<&PageToken>) -> Result<Page> {
        let records = self.records.borrow();
        let page = slice_page(&records, start, self.page_size)?;

        let page_index = match start {
            Some(token) => token.0.parse::<usize>().unwrap_or(0) / self.page_size,
            None => 0,
        };
        let injected = self.fail_list_page.borrow().clone();
        if let Some((fail_at, failure)) = injected {
            if fail_at == page_index {
                self.fail_list_page.borrow_mut().take();
                return Err(failure.into_error());
            }
        }

        Ok(page)
    }

    fn apply_batch(&self, batch: &ChangeBatch) -> Result<BatchStatus> {
        if let Some(failure) = self.fail_apply.borrow_mut().take() {
            return match failure {
                InjectedFailure::Rejected => Ok(BatchStatus::Rejected {
                    reason: "injected rejection".to_string(),
                }),
                other => Err(other.into_error()),
            };
        }

        upsert_all(&mut self.records.borrow_mut(), batch);
        self.applied.borrow_mut().push(batch.clone());
        Ok(BatchStatus::Accepted)
    }
}

/// 区域文件内容
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ZoneDocument {
    resource_record_sets: Vec<ResourceRecordSet>,
}

/// 以 JSON 文件充当远端区域
///
/// 文件位于 `<dir>/<zone_id>.json`，格式为 `{"ResourceRecordSets": [...]}`。
/// 提交时先写临时文件再重命名，保证批次整体生效或整体不生效。
#[derive(Debug, Clone)]
pub struct ZoneFile {
    zone_id: String,
    path: PathBuf,
    page_size: usize,
}

impl ZoneFile {
    pub fn new(dir: &Path, zone_id: impl Into<String>) -> Self {
        let zone_id = zone_id.into();
        let path = dir.join(format!("{}.json", zone_id));
        Self {
            zone_id,
            path,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 用给定记录创建（或覆盖）区域文件
    pub fn initialize(&self, records: Vec<ResourceRecordSet>) -> Result<()> {
        self.store(&ZoneDocument {
            resource_record_sets: records,
        })
    }

    fn load(&self) -> Result<ZoneDocument> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| remote_io_error(&self.path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| StagerError::Transport(format!("区域文件解析失败 {:?}: {}", self.path, e)))
    }

    fn store(&self, document: &ZoneDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| remote_io_error(parent, e))?;
        }

        let json = serde_json::to_string_pretty(document)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(|e| remote_io_error(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| remote_io_error(&self.path, e))
    }
}

/// 把文件系统错误映射为远端错误
fn remote_io_error(path: &Path, error: std::io::Error) -> StagerError {
    match error.kind() {
        std::io::ErrorKind::PermissionDenied => {
            StagerError::AccessDenied(format!("{:?}: {}", path, error))
        }
        _ => StagerError::Transport(format!("{:?}: {}", path, error)),
    }
}

impl RemoteZone for ZoneFile {
    fn zone_id(&self) -> &str {
        &self.zone_id
    }

    fn list_page(&self, start: Option<&PageToken>) -> Result<Page> {
        let document = self.load()?;
        slice_page(&document.resource_record_sets, start, self.page_size)
    }

    fn apply_batch(&self, batch: &ChangeBatch) -> Result<BatchStatus> {
        let mut document = self.load()?;
        upsert_all(&mut document.resource_record_sets, batch);
        self.store(&document)?;
        Ok(BatchStatus::Accepted)
    }
}
