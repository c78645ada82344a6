use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// 单条资源记录值（如 A 记录的 IP）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRecord {
    #[serde(rename = "Value")]
    pub value: String,
}

impl ResourceRecord {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

/// 别名目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AliasTarget {
    pub hosted_zone_id: String,
    #[serde(rename = "DNSName")]
    pub dns_name: String,
    pub evaluate_target_health: bool,
}

/// 远端记录集的完整字段
///
/// 字段名与远端 JSON 保持一致（PascalCase）。
/// 可编辑字段单独声明，其余属性原样保存在 `extra` 中并在写回时透传。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecordSet {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    #[serde(rename = "SetIdentifier", default, skip_serializing_if = "Option::is_none")]
    pub set_identifier: Option<String>,
    #[serde(rename = "Weight", default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u8>,
    #[serde(rename = "Region", default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(rename = "TTL", default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(rename = "ResourceRecords", default, skip_serializing_if = "Option::is_none")]
    pub resource_records: Option<Vec<ResourceRecord>>,
    #[serde(rename = "AliasTarget", default, skip_serializing_if = "Option::is_none")]
    pub alias_target: Option<AliasTarget>,
    /// 其他未建模的属性（如 HealthCheckId、Failover 等）
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ResourceRecordSet {
    /// 创建只有名称和类型的记录集
    pub fn new(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            set_identifier: None,
            weight: None,
            region: None,
            ttl: None,
            resource_records: None,
            alias_target: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn identity(&self) -> RecordIdentity {
        RecordIdentity {
            name: self.name.clone(),
            record_type: self.record_type.clone(),
            set_identifier: self.set_identifier.clone(),
        }
    }

    /// 读取字段值，字段不存在时返回 `None`
    pub fn get(&self, field: &Field) -> Option<FieldValue> {
        match field {
            Field::ResourceRecords => self.resource_records.clone().map(FieldValue::ResourceRecords),
            Field::AliasTarget => self.alias_target.clone().map(FieldValue::AliasTarget),
            Field::Ttl => self.ttl.map(FieldValue::Ttl),
            Field::Weight => self.weight.map(FieldValue::Weight),
            Field::Region => self.region.clone().map(FieldValue::Region),
            Field::Other(key) => self.extra.get(key).cloned().map(FieldValue::Other),
        }
    }

    /// 字段存在且非空
    pub fn has_field(&self, field: &Field) -> bool {
        self.get(field).is_some_and(|value| !value.is_empty())
    }

    /// 覆盖一个已存在的字段
    ///
    /// 字段不存在或类型不匹配时不做任何修改，返回 `false`。
    pub(crate) fn set(&mut self, field: &Field, value: FieldValue) -> bool {
        match (field, value) {
            (Field::ResourceRecords, FieldValue::ResourceRecords(v)) if self.resource_records.is_some() => {
                self.resource_records = Some(v);
            }
            (Field::AliasTarget, FieldValue::AliasTarget(v)) if self.alias_target.is_some() => {
                self.alias_target = Some(v);
            }
            (Field::Ttl, FieldValue::Ttl(v)) if self.ttl.is_some() => self.ttl = Some(v),
            (Field::Weight, FieldValue::Weight(v)) if self.weight.is_some() => self.weight = Some(v),
            (Field::Region, FieldValue::Region(v)) if self.region.is_some() => self.region = Some(v),
            (Field::Other(key), FieldValue::Other(v)) => match self.extra.get_mut(key) {
                Some(slot) => *slot = v,
                None => return false,
            },
            _ => return false,
        }
        true
    }

    /// 所有存在的可编辑字段（按 `Field` 顺序）
    pub fn present_fields(&self) -> Vec<Field> {
        let mut fields: Vec<Field> = [
            Field::ResourceRecords,
            Field::AliasTarget,
            Field::Ttl,
            Field::Weight,
            Field::Region,
        ]
        .into_iter()
        .filter(|field| self.get(field).is_some())
        .collect();

        fields.extend(self.extra.keys().map(|key| Field::Other(key.clone())));
        fields
    }
}

/// 记录标识：(名称, 类型, 可选的 SetIdentifier)
///
/// 加权/延迟路由记录共享名称和类型，依靠 SetIdentifier 区分。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordIdentity {
    pub name: String,
    pub record_type: String,
    pub set_identifier: Option<String>,
}

impl fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.record_type)?;
        if let Some(set_id) = &self.set_identifier {
            write!(f, " [{}]", set_id)?;
        }
        Ok(())
    }
}

/// 可编辑字段
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    ResourceRecords,
    AliasTarget,
    Ttl,
    Weight,
    Region,
    /// 未建模的透传属性
    Other(String),
}

impl Field {
    /// 远端 JSON 中的键名
    pub fn key(&self) -> &str {
        match self {
            Field::ResourceRecords => "ResourceRecords",
            Field::AliasTarget => "AliasTarget",
            Field::Ttl => "TTL",
            Field::Weight => "Weight",
            Field::Region => "Region",
            Field::Other(key) => key,
        }
    }
}

impl From<&str> for Field {
    fn from(key: &str) -> Self {
        match key {
            "ResourceRecords" => Field::ResourceRecords,
            "AliasTarget" => Field::AliasTarget,
            "TTL" => Field::Ttl,
            "Weight" => Field::Weight,
            "Region" => Field::Region,
            other => Field::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// 字段值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    ResourceRecords(Vec<ResourceRecord>),
    AliasTarget(AliasTarget),
    Ttl(u64),
    Weight(u8),
    Region(String),
    Other(Value),
}

impl FieldValue {
    /// 值的类型是否与字段对应
    pub fn fits(&self, field: &Field) -> bool {
        matches!(
            (field, self),
            (Field::ResourceRecords, FieldValue::ResourceRecords(_))
                | (Field::AliasTarget, FieldValue::AliasTarget(_))
                | (Field::Ttl, FieldValue::Ttl(_))
                | (Field::Weight, FieldValue::Weight(_))
                | (Field::Region, FieldValue::Region(_))
                | (Field::Other(_), FieldValue::Other(_))
        )
    }

    /// 空字符串、空列表、null 以及空容器视为空值；数值 0 不算空
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::ResourceRecords(records) => records.is_empty(),
            FieldValue::AliasTarget(alias) => alias.dns_name.is_empty(),
            FieldValue::Ttl(_) | FieldValue::Weight(_) => false,
            FieldValue::Region(region) => region.is_empty(),
            FieldValue::Other(value) => match value {
                Value::Null => true,
                Value::String(s) => s.is_empty(),
                Value::Array(a) => a.is_empty(),
                Value::Object(o) => o.is_empty(),
                Value::Bool(_) | Value::Number(_) => false,
            },
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::ResourceRecords(records) => {
                let values: Vec<&str> = records.iter().map(|r| r.value.as_str()).collect();
                f.write_str(&values.join(","))
            }
            FieldValue::AliasTarget(alias) => f.write_str(&alias.dns_name),
            FieldValue::Ttl(ttl) => write!(f, "{}", ttl),
            FieldValue::Weight(weight) => write!(f, "{}", weight),
            FieldValue::Region(region) => f.write_str(region),
            FieldValue::Other(Value::String(s)) => f.write_str(s),
            FieldValue::Other(value) => write!(f, "{}", value),
        }
    }
}

/// `Record::update` 的结果
///
/// 对不存在字段的修改会被忽略（不改变状态），但结果对调用方可见。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// 已写入暂存层
    Staged,
    /// 原始记录没有该字段，忽略
    MissingField,
    /// 值类型与字段不符，忽略
    TypeMismatch,
}

/// 远端记录 + 待提交的修改层
///
/// - `fields`: 远端拉取的原始值，刷新前不会改变
/// - `overlay`: 暂存的修改，键永远是 `fields` 中已有字段的子集
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: ResourceRecordSet,
    overlay: BTreeMap<Field, FieldValue>,
}

impl Record {
    pub fn new(fields: ResourceRecordSet) -> Self {
        Self {
            fields,
            overlay: BTreeMap::new(),
        }
    }

    pub fn identity(&self) -> RecordIdentity {
        self.fields.identity()
    }

    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn fields(&self) -> &ResourceRecordSet {
        &self.fields
    }

    pub fn overlay(&self) -> &BTreeMap<Field, FieldValue> {
        &self.overlay
    }

    /// 是否存在暂存修改
    pub fn is_staged(&self) -> bool {
        !self.overlay.is_empty()
    }

    /// 暂存一个字段修改
    ///
    /// 只允许修改原始记录中已经存在的字段，不会引入新字段。
    pub fn update(&mut self, field: Field, value: FieldValue) -> UpdateOutcome {
        if !value.fits(&field) {
            return UpdateOutcome::TypeMismatch;
        }
        if self.fields.get(&field).is_none() {
            return UpdateOutcome::MissingField;
        }

        self.overlay.insert(field, value);
        UpdateOutcome::Staged
    }

    /// 撤销单个字段的暂存值，`previous` 为 `None` 时移除该字段
    pub(crate) fn restore_field(&mut self, field: &Field, previous: Option<FieldValue>) {
        match previous {
            Some(value) => {
                self.overlay.insert(field.clone(), value);
            }
            None => {
                self.overlay.remove(field);
            }
        }
    }

    /// 清空暂存层（幂等）
    pub fn reset(&mut self) {
        self.overlay.clear();
    }

    /// 原始字段的独立副本
    pub fn snapshot_original(&self) -> ResourceRecordSet {
        self.fields.clone()
    }

    /// 合并暂存层后的独立副本
    pub fn snapshot_updated(&self) -> ResourceRecordSet {
        let mut updated = self.fields.clone();
        for (field, value) in &self.overlay {
            updated.set(field, value.clone());
        }
        updated
    }

    /// 暂存层中与原始值不同的字段
    pub fn changed_fields(&self) -> Vec<Field> {
        self.overlay
            .iter()
            .filter(|(field, value)| self.fields.get(field).as_ref() != Some(*value))
            .map(|(field, _)| field.clone())
            .collect()
    }
}
