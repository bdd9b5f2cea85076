// ==========================================
// 工程 ERP 批量导入 - 导入数据结构
// ==========================================
// 职责: 字段定义 / 原始行 / 列映射 / 映射行
// 生命周期: 每选择一次文件重新生成,确认成功或关闭即丢弃
// ==========================================

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// 去除行号/错误信息后的记录（字段 key → 单元格文本）
pub type ImportRecord = BTreeMap<String, String>;

// ==========================================
// ImportFieldSpec - 导入字段定义
// ==========================================
// key 在同一 schema 内唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFieldSpec {
    pub key: String,
    pub label: String,
    pub required: bool,
}

impl ImportFieldSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>, required: bool) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            required,
        }
    }

    /// 必填字段
    pub fn required(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, true)
    }

    /// 选填字段
    pub fn optional(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, false)
    }
}

// ==========================================
// RawSheetRow - 原始表格行
// ==========================================
// 有序映射: 列表头 → 单元格文本（缺失单元格为空串）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSheetRow {
    cells: Vec<(String, String)>,
}

impl RawSheetRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入单元格；表头重复时后写覆盖先写，位置保持不变
    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) {
        let header = header.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(h, _)| *h == header) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((header, value)),
        }
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 所有单元格均为空
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_empty())
    }
}

impl<K, V> FromIterator<(K, V)> for RawSheetRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawSheetRow::new();
        for (header, value) in iter {
            row.insert(header, value);
        }
        row
    }
}

impl Serialize for RawSheetRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (header, value) in &self.cells {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

// ==========================================
// ColumnMapping - 列映射
// ==========================================
// 字段 key → 表头,每个字段至多一个表头
// 人工覆写（含显式取消映射）优先于自动映射
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    auto: BTreeMap<String, String>,
    overrides: BTreeMap<String, Option<String>>,
}

impl ColumnMapping {
    pub fn from_auto(auto: BTreeMap<String, String>) -> Self {
        Self {
            auto,
            overrides: BTreeMap::new(),
        }
    }

    /// 当前生效的表头
    pub fn get(&self, key: &str) -> Option<&str> {
        match self.overrides.get(key) {
            Some(header) => header.as_deref(),
            None => self.auto.get(key).map(String::as_str),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// 覆写映射；None 表示显式取消映射
    ///
    /// 不做合法性检查，由 `column_mapper::apply_override` 负责
    pub fn set_override(&mut self, key: impl Into<String>, header: Option<String>) {
        self.overrides.insert(key.into(), header);
    }

    /// 撤销覆写，恢复自动映射结果
    pub fn clear_override(&mut self, key: &str) -> bool {
        self.overrides.remove(key).is_some()
    }

    pub fn auto_entries(&self) -> &BTreeMap<String, String> {
        &self.auto
    }

    pub fn overrides(&self) -> &BTreeMap<String, Option<String>> {
        &self.overrides
    }

    /// 合并后的最终映射
    pub fn resolved(&self) -> BTreeMap<String, String> {
        let mut out = self.auto.clone();
        for (key, header) in &self.overrides {
            match header {
                Some(h) => {
                    out.insert(key.clone(), h.clone());
                }
                None => {
                    out.remove(key);
                }
            }
        }
        out
    }
}

// ==========================================
// MappedRow - 映射行
// ==========================================
// _row: 表格中的 1 基行号（表头占第 1 行）
// _err: 校验失败摘要,有效行不输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedRow {
    #[serde(rename = "_row")]
    pub row: usize,
    #[serde(rename = "_err", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub record: ImportRecord,
}

impl MappedRow {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// 剥离 _row/_err
    pub fn into_record(self) -> ImportRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_row_duplicate_header_last_wins() {
        let row: RawSheetRow = vec![("Amount", "1"), ("Date", "2024-01-01"), ("Amount", "2")]
            .into_iter()
            .collect();

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("Amount"), Some("2"));
        assert_eq!(row.iter().next(), Some(("Amount", "2")));
    }

    #[test]
    fn test_raw_row_blank() {
        let row: RawSheetRow = vec![("A", ""), ("B", "")].into_iter().collect();
        assert!(row.is_blank());
    }

    #[test]
    fn test_mapping_override_precedence() {
        let mut auto = BTreeMap::new();
        auto.insert("amount".to_string(), "Amount".to_string());
        auto.insert("category".to_string(), "Category".to_string());
        let mut mapping = ColumnMapping::from_auto(auto);

        mapping.set_override("amount", Some("Total".to_string()));
        mapping.set_override("category", None);

        assert_eq!(mapping.get("amount"), Some("Total"));
        assert_eq!(mapping.get("category"), None);
        assert_eq!(mapping.resolved().len(), 1);

        assert!(mapping.clear_override("category"));
        assert_eq!(mapping.get("category"), Some("Category"));
    }

    #[test]
    fn test_mapped_row_serializes_bookkeeping_names() {
        let mut record = ImportRecord::new();
        record.insert("amount".to_string(), "10".to_string());
        let row = MappedRow {
            row: 2,
            error: None,
            record,
        };

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["_row"], 2);
        assert_eq!(json["amount"], "10");
        assert!(json.get("_err").is_none());
    }
}
