//! 纯文本表格渲染
//!
//! 只负责把记录快照格式化为字符串，不做任何终端 IO。

use crate::editor::DiffView;
use crate::record::{Field, ResourceRecordSet};
use crate::selector::Family;

/// 对齐方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// 表格列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Index,
    Name,
    ResourceRecords,
    AliasTarget,
    Type,
    SetIdentifier,
    Ttl,
    Weight,
    Region,
}

impl Column {
    pub fn header(self) -> &'static str {
        match self {
            Column::Index => "Index",
            Column::Name => "Name",
            Column::ResourceRecords => "ResourceRecords",
            Column::AliasTarget => "AliasTarget",
            Column::Type => "Type",
            Column::SetIdentifier => "SetIdentifier",
            Column::Ttl => "TTL",
            Column::Weight => "Weight",
            Column::Region => "Region",
        }
    }

    fn align(self) -> Align {
        match self {
            Column::Name => Align::Right,
            Column::ResourceRecords | Column::AliasTarget => Align::Left,
            _ => Align::Center,
        }
    }

    fn field(self) -> Option<Field> {
        match self {
            Column::ResourceRecords => Some(Field::ResourceRecords),
            Column::AliasTarget => Some(Field::AliasTarget),
            Column::Ttl => Some(Field::Ttl),
            Column::Weight => Some(Field::Weight),
            Column::Region => Some(Field::Region),
            _ => None,
        }
    }

    /// 单元格内容，字段缺失时为空
    fn cell(self, index: usize, set: &ResourceRecordSet) -> String {
        match self {
            Column::Index => index.to_string(),
            Column::Name => set.name.clone(),
            Column::Type => set.record_type.clone(),
            Column::SetIdentifier => set.set_identifier.clone().unwrap_or_default(),
            other => other
                .field()
                .and_then(|field| set.get(&field))
                .map(|value| value.to_string())
                .unwrap_or_default(),
        }
    }
}

/// 各记录族的列布局
pub fn columns_for(family: &Family) -> &'static [Column] {
    match family {
        Family::WithField(Field::Weight) => &[
            Column::Index,
            Column::Name,
            Column::ResourceRecords,
            Column::SetIdentifier,
            Column::Weight,
        ],
        Family::WithField(Field::Region) => &[
            Column::Index,
            Column::Name,
            Column::ResourceRecords,
            Column::AliasTarget,
            Column::Type,
            Column::Region,
            Column::Ttl,
        ],
        _ => &[
            Column::Index,
            Column::Name,
            Column::ResourceRecords,
            Column::AliasTarget,
            Column::Type,
            Column::Ttl,
            Column::Weight,
        ],
    }
}

fn pad(text: &str, width: usize, align: Align) -> String {
    match align {
        Align::Left => format!("{:<width$}", text, width = width),
        Align::Center => format!("{:^width$}", text, width = width),
        Align::Right => format!("{:>width$}", text, width = width),
    }
}

/// 渲染记录表格
///
/// `marked` 中的行号会以 `*` 标记（用于突出发生变化的行）。
pub fn render_table<'a>(
    title: &str,
    columns: &[Column],
    records: impl IntoIterator<Item = &'a ResourceRecordSet>,
    marked: &[usize],
) -> String {
    let rows: Vec<Vec<String>> = records
        .into_iter()
        .enumerate()
        .map(|(i, set)| columns.iter().map(|c| c.cell(i, set)).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(c, column)| {
            rows.iter()
                .map(|row| row[c].chars().count())
                .chain(std::iter::once(column.header().len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<String>, marker: &str| -> String {
        let body: Vec<String> = cells
            .iter()
            .zip(columns.iter().zip(&widths))
            .map(|(cell, (column, &width))| pad(cell, width, column.align()))
            .collect();
        format!("{} {}", marker, body.join(" | ")).trim_end().to_string()
    };

    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    out.push_str(&line(columns.iter().map(|c| c.header().to_string()).collect(), " "));
    out.push('\n');
    let rule_width = widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * 3 + 2;
    out.push_str(&"-".repeat(rule_width));
    out.push('\n');

    for (i, row) in rows.into_iter().enumerate() {
        let marker = if marked.contains(&i) { "*" } else { " " };
        out.push_str(&line(row, marker));
        out.push('\n');
    }

    out
}

/// 渲染对比视图：先原始，后更新后，变化的行以 `*` 标记
pub fn render_diff(diff: &DiffView, family: &Family) -> String {
    let columns = columns_for(family);
    let changed: Vec<usize> = (0..diff.len())
        .filter(|&i| !diff.changed_fields(i).is_empty())
        .collect();

    let mut out = render_table("Original", columns, &diff.original, &[]);
    out.push('\n');
    out.push_str(&render_table("Updated", columns, &diff.updated, &changed));
    out
}
