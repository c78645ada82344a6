/// 记录筛选模块
///
/// 筛选分两步，且从不在同一次调用里混合：
/// 1. **记录族筛选**（`Family`）：总是从全部记录出发，按字段是否存在粗筛
/// 2. **细化筛选**（`Refinement`）：总是作用于当前视图，可以反复叠加
///
/// 视图以 `all` 中的下标表示，筛选不会修改任何记录。
use crate::record::{Field, Record};
use crate::utils::{Result, StagerError};

/// 记录族（粗筛条件）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Family {
    /// 全部记录
    All,
    /// 指定字段存在且非空的记录
    ///
    /// 空字符串、空列表和 null 视为不存在；数值 0 视为存在，
    /// 因此权重为 0 的记录仍属于加权记录族。
    WithField(Field),
}

impl Family {
    /// 加权路由记录
    pub fn weighted() -> Self {
        Family::WithField(Field::Weight)
    }

    /// 延迟路由记录
    pub fn latency() -> Self {
        Family::WithField(Field::Region)
    }

    /// 从名称解析，`"All"` 为特殊值
    pub fn parse(name: &str) -> Self {
        match name {
            "All" => Family::All,
            key => Family::WithField(Field::from(key)),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Family::All => "all",
            Family::WithField(Field::Weight) => "weighted",
            Family::WithField(Field::Region) => "latency",
            Family::WithField(field) => field.key(),
        }
    }
}

/// 用户输入的细化指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refinement {
    /// 空输入：确认当前视图
    Confirm,
    /// `..`：回到记录族筛选的结果
    Reset,
    /// `:n`：选取当前视图中的第 n 条（从 0 开始）
    Index(usize),
    /// 其他输入：名称子串匹配（区分大小写）
    Substring(String),
}

impl Refinement {
    /// 解析细化输入
    ///
    /// `:` 后不是非负整数时返回 `InvalidIndex`，由调用方重新提示。
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Ok(Refinement::Confirm);
        }
        if input == ".." {
            return Ok(Refinement::Reset);
        }
        if let Some(rest) = input.strip_prefix(':') {
            return rest
                .trim()
                .parse()
                .map(Refinement::Index)
                .map_err(|_| StagerError::InvalidIndex(rest.to_string()));
        }
        Ok(Refinement::Substring(input.to_string()))
    }
}

/// 单次细化的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Narrowed {
    /// 得到新的非空视图
    View(Vec<usize>),
    /// 下标越界，视图保持不变
    OutOfRange { index: usize, len: usize },
    /// 没有匹配项，视图保持不变
    NoMatch,
}

impl Narrowed {
    /// 回退策略：只有得到非空的新视图时才替换，否则保留上一个视图
    pub fn or_keep(self, prior: Vec<usize>) -> Vec<usize> {
        match self {
            Narrowed::View(view) => view,
            Narrowed::OutOfRange { .. } | Narrowed::NoMatch => prior,
        }
    }

    pub fn is_narrowed(&self) -> bool {
        matches!(self, Narrowed::View(_))
    }
}

/// 记录族筛选，总是基于全部记录
pub fn narrow_by_family(records: &[Record], family: &Family) -> Vec<usize> {
    match family {
        Family::All => (0..records.len()).collect(),
        Family::WithField(field) => records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.fields().has_field(field))
            .map(|(i, _)| i)
            .collect(),
    }
}

/// 按位置选取当前视图中的单条记录
pub fn narrow_by_index(view: &[usize], index: usize) -> Narrowed {
    match view.get(index) {
        Some(&position) => Narrowed::View(vec![position]),
        None => Narrowed::OutOfRange {
            index,
            len: view.len(),
        },
    }
}

/// 按名称子串筛选当前视图
pub fn narrow_by_substring(records: &[Record], view: &[usize], needle: &str) -> Narrowed {
    let matched: Vec<usize> = view
        .iter()
        .copied()
        .filter(|&i| records[i].name().contains(needle))
        .collect();

    if matched.is_empty() {
        Narrowed::NoMatch
    } else {
        Narrowed::View(matched)
    }
}
