//! 记录仓库：持有从远端拉取的全部记录以及当前的筛选视图。

use std::collections::HashMap;
use crate::io::{fetch_all, RemoteZone};
use crate::record::{Record, RecordIdentity, ResourceRecordSet};
use crate::selector::{narrow_by_family, narrow_by_index, narrow_by_substring, Family, Narrowed, Refinement};
use crate::utils::Result;

/// 细化筛选的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefineOutcome {
    /// 视图被缩小为 n 条
    Narrowed(usize),
    /// 下标越界，视图不变
    IndexOutOfRange { index: usize, len: usize },
    /// 没有名称匹配，视图不变
    NoMatch,
    /// 确认当前视图
    Confirmed,
    /// 视图回到记录族筛选的结果（n 条）
    Reset(usize),
}

/// 记录仓库
///
/// - `all`: 全部记录，标识唯一，刷新时整体替换
/// - `baseline`: 最近一次记录族筛选的结果
/// - `view`: 当前视图，始终是 `all` 的保序子序列（以下标表示）
#[derive(Debug, Clone)]
pub struct RecordStore {
    all: Vec<Record>,
    family: Family,
    baseline: Vec<usize>,
    view: Vec<usize>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            all: Vec::new(),
            family: Family::All,
            baseline: Vec::new(),
            view: Vec::new(),
        }
    }

    /// 从记录集列表构造
    pub fn from_record_sets(sets: Vec<ResourceRecordSet>) -> Self {
        let mut store = Self::new();
        store.replace_all(sets);
        store
    }

    /// 从远端刷新
    ///
    /// 拉取必须完整成功才会替换本地记录；失败时本地状态保持不变。
    /// 成功时所有未提交的暂存修改都会丢失，需要保留的修改应先保存为变更集。
    pub fn refresh(&mut self, remote: &dyn RemoteZone) -> Result<usize> {
        let sets = fetch_all(remote)?;

        let lost = self.all.iter().filter(|r| r.is_staged()).count();
        if lost > 0 {
            tracing::warn!(lost, "refresh discarded staged records");
        }

        self.replace_all(sets);
        tracing::info!(zone = remote.zone_id(), count = self.all.len(), "records refreshed");
        Ok(self.all.len())
    }

    /// 整体替换全部记录并重置视图
    ///
    /// 同一标识出现多次时，后出现的记录替换先出现的记录（位置保持在第一次出现处）。
    pub fn replace_all(&mut self, sets: Vec<ResourceRecordSet>) {
        let mut positions: HashMap<RecordIdentity, usize> = HashMap::with_capacity(sets.len());
        let mut all: Vec<Record> = Vec::with_capacity(sets.len());

        for set in sets {
            let identity = set.identity();
            match positions.get(&identity) {
                Some(&i) => {
                    tracing::warn!(%identity, "duplicate record identity, keeping the later one");
                    all[i] = Record::new(set);
                }
                None => {
                    positions.insert(identity, all.len());
                    all.push(Record::new(set));
                }
            }
        }

        self.all = all;
        self.family = Family::All;
        self.baseline = (0..self.all.len()).collect();
        self.view = self.baseline.clone();
    }

    pub fn records(&self) -> &[Record] {
        &self.all
    }

    pub(crate) fn records_mut(&mut self) -> &mut [Record] {
        &mut self.all
    }

    pub(crate) fn record_mut(&mut self, index: usize) -> Option<&mut Record> {
        self.all.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// 按标识查找记录位置
    pub fn position_of(&self, identity: &RecordIdentity) -> Option<usize> {
        self.all.iter().position(|r| &r.identity() == identity)
    }

    pub fn get(&self, identity: &RecordIdentity) -> Option<&Record> {
        self.position_of(identity).map(|i| &self.all[i])
    }

    /// 当前记录族
    pub fn family(&self) -> &Family {
        &self.family
    }

    /// 记录族筛选（第一步），总是从全部记录出发
    pub fn select_family(&mut self, family: Family) -> usize {
        self.baseline = narrow_by_family(&self.all, &family);
        self.view = self.baseline.clone();
        tracing::debug!(family = family.label(), count = self.view.len(), "family selected");
        self.family = family;
        self.view.len()
    }

    /// 细化筛选（第二步），作用于当前视图
    pub fn refine(&mut self, refinement: &Refinement) -> RefineOutcome {
        let narrowed = match refinement {
            Refinement::Confirm => return RefineOutcome::Confirmed,
            Refinement::Reset => {
                self.view = self.baseline.clone();
                return RefineOutcome::Reset(self.view.len());
            }
            Refinement::Index(index) => narrow_by_index(&self.view, *index),
            Refinement::Substring(needle) => narrow_by_substring(&self.all, &self.view, needle),
        };

        let outcome = match &narrowed {
            Narrowed::View(view) => RefineOutcome::Narrowed(view.len()),
            Narrowed::OutOfRange { index, len } => RefineOutcome::IndexOutOfRange {
                index: *index,
                len: *len,
            },
            Narrowed::NoMatch => RefineOutcome::NoMatch,
        };

        let prior = std::mem::take(&mut self.view);
        self.view = narrowed.or_keep(prior);
        tracing::debug!(?refinement, ?outcome, "view refined");
        outcome
    }

    /// 组合筛选入口：可选的记录族筛选，再接可选的细化输入
    ///
    /// 细化输入按 `Refinement::parse` 解析，非法的下标输入返回错误且视图不变。
    pub fn apply_filter(&mut self, family: Option<Family>, text: Option<&str>) -> Result<Option<RefineOutcome>> {
        let refinement = text.map(Refinement::parse).transpose()?;

        if let Some(family) = family {
            self.select_family(family);
        }

        Ok(refinement.map(|refinement| self.refine(&refinement)))
    }

    /// 当前视图的下标
    pub fn view_indices(&self) -> &[usize] {
        &self.view
    }

    /// 当前视图中的记录
    pub fn view(&self) -> Vec<&Record> {
        self.view.iter().map(|&i| &self.all[i]).collect()
    }

    /// 所有存在暂存修改的记录下标（保持原始顺序）
    pub fn staged_indices(&self) -> Vec<usize> {
        self.all
            .iter()
            .enumerate()
            .filter(|(_, record)| record.is_staged())
            .map(|(i, _)| i)
            .collect()
    }

    /// 所有存在暂存修改的记录（保持原始顺序）
    pub fn staged_records(&self) -> Vec<&Record> {
        self.all.iter().filter(|record| record.is_staged()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{InjectedFailure, MemoryZone};
    use crate::record::{Field, FieldValue};

    fn set(name: &str, weight: Option<u8>) -> ResourceRecordSet {
        let mut set = ResourceRecordSet::new(name, "A");
        set.weight = weight;
        set.set_identifier = weight.map(|_| name.to_string());
        set
    }

    fn store() -> RecordStore {
        RecordStore::from_record_sets(vec![
            set("a.example.com.", Some(10)),
            set("b.example.com.", None),
            set("c.example.com.", Some(20)),
        ])
    }

    #[test]
    fn test_scenario_weight_then_index() {
        let mut store = store();
        assert_eq!(store.select_family(Family::weighted()), 2);
        let names: Vec<_> = store.view().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, vec!["a.example.com.", "c.example.com."]);

        assert_eq!(store.refine(&Refinement::Index(0)), RefineOutcome::Narrowed(1));
        assert_eq!(store.view()[0].name(), "a.example.com.");
    }

    #[test]
    fn test_index_out_of_range_keeps_view() {
        let mut store = store();
        store.select_family(Family::weighted());
        assert_eq!(
            store.refine(&Refinement::Index(2)),
            RefineOutcome::IndexOutOfRange { index: 2, len: 2 }
        );
        assert_eq!(store.view_indices(), &[0, 2]);
    }

    #[test]
    fn test_no_match_keeps_view() {
        let mut store = store();
        store.refine(&Refinement::Substring("c.".to_string()));
        assert_eq!(store.view_indices(), &[2]);

        assert_eq!(
            store.refine(&Refinement::Substring("zzz".to_string())),
            RefineOutcome::NoMatch
        );
        assert_eq!(store.view_indices(), &[2]);
    }

    #[test]
    fn test_reset_returns_to_family_baseline() {
        let mut store = store();
        store.select_family(Family::weighted());
        store.refine(&Refinement::Index(1));
        assert_eq!(store.view_indices(), &[2]);

        assert_eq!(store.refine(&Refinement::Reset), RefineOutcome::Reset(2));
        assert_eq!(store.view_indices(), &[0, 2]);
    }

    #[test]
    fn test_family_always_starts_from_all() {
        let mut store = store();
        store.refine(&Refinement::Substring("b.".to_string()));
        assert_eq!(store.select_family(Family::weighted()), 2);
        assert_eq!(store.select_family(Family::All), 3);
    }

    #[test]
    fn test_apply_filter() {
        let mut store = store();
        let outcome = store.apply_filter(Some(Family::weighted()), Some("c.")).unwrap();
        assert_eq!(outcome, Some(RefineOutcome::Narrowed(1)));

        assert!(store.apply_filter(None, Some(":x")).is_err());
        assert_eq!(store.view_indices(), &[2]);

        assert_eq!(store.apply_filter(Some(Family::All), None).unwrap(), None);
        assert_eq!(store.view_indices(), &[0, 1, 2]);
    }

    #[test]
    fn test_duplicate_identities_are_reconciled() {
        let mut later = set("a.example.com.", Some(10));
        later.ttl = Some(300);
        let store = RecordStore::from_record_sets(vec![
            set("a.example.com.", Some(10)),
            set("b.example.com.", None),
            later,
        ]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].fields().ttl, Some(300));
    }

    #[test]
    fn test_staged_records_in_order() {
        let mut store = store();
        store.record_mut(2).unwrap().update(Field::Weight, FieldValue::Weight(1));
        store.record_mut(0).unwrap().update(Field::Weight, FieldValue::Weight(2));

        let staged: Vec<_> = store.staged_records().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(staged, vec!["a.example.com.", "c.example.com."]);
        assert_eq!(store.staged_indices(), vec![0, 2]);
    }

    #[test]
    fn test_refresh_is_all_or_nothing() {
        let zone = MemoryZone::new("Z1", vec![set("x.example.com.", Some(1)), set("y.example.com.", None)])
            .with_page_size(1);
        let mut store = store();
        store.record_mut(0).unwrap().update(Field::Weight, FieldValue::Weight(2));

        zone.fail_next_list(1, InjectedFailure::Transport);
        assert!(store.refresh(&zone).is_err());
        assert_eq!(store.len(), 3);
        assert!(store.records()[0].is_staged());

        assert_eq!(store.refresh(&zone).unwrap(), 2);
        assert!(store.staged_records().is_empty());
        assert_eq!(store.view_indices(), &[0, 1]);
    }
}
