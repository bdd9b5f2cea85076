// ==========================================
// 工程 ERP 批量导入 - 备注字段编解码
// ==========================================
// 用途: 费用/综合费用把结构化附加信息写进一个文本备注列
// 写入: 默认 JSON 对象；配置 note_encoding=legacy 时写 "key:value; key:value"
// 读取: 先按 JSON 解析,失败再按旧格式解析,无法识别的片段保留在 remainder
// 约束: 只处理各实体固定的 key 集合,固定 key 集合内往返无损
//       旧格式下值中的 ';' 无法表示,写入时替换为 ','
// ==========================================

use crate::importer::column_mapper::normalize_header;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

const LEGACY_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteEncoding {
    #[default]
    Json,
    Legacy,
}

impl NoteEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteEncoding::Json => "json",
            NoteEncoding::Legacy => "legacy",
        }
    }
}

impl fmt::Display for NoteEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(NoteEncoding::Json),
            "legacy" => Ok(NoteEncoding::Legacy),
            other => Err(format!("未知的备注编码: {}（可选: json/legacy）", other)),
        }
    }
}

// ==========================================
// NoteFields - 备注中的结构化字段
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NoteFields {
    entries: Vec<(String, String)>,
    /// 旧数据中无法识别的文本
    #[serde(skip_serializing_if = "Option::is_none")]
    remainder: Option<String>,
}

impl NoteFields {
    /// 从导入记录中提取固定 key（空值跳过）
    pub fn from_record(record: &crate::domain::ImportRecord, keys: &[&str]) -> Self {
        let entries = keys
            .iter()
            .filter_map(|key| {
                crate::importer::data_cleaner::normalize_null(record, key)
                    .map(|value| (key.to_string(), value))
            })
            .collect();
        Self {
            entries,
            remainder: None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn remainder(&self) -> Option<&str> {
        self.remainder.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.remainder.is_none()
    }

    /// 编码；无内容时返回 None（备注列留空）
    pub fn encode(&self, encoding: NoteEncoding) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        Some(match encoding {
            NoteEncoding::Json => self.to_json(),
            NoteEncoding::Legacy => self.to_legacy(),
        })
    }

    pub fn to_json(&self) -> String {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map).to_string()
    }

    pub fn to_legacy(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| {
                if v.contains(';') {
                    warn!(key = %k, "备注值包含 ';'，旧格式下替换为 ','");
                }
                format!("{}:{}", k, v.replace(';', ","))
            })
            .collect::<Vec<_>>()
            .join(LEGACY_SEPARATOR)
    }

    /// 解码（读取已有记录时使用）
    pub fn decode(note: &str, keys: &[&str]) -> Self {
        let trimmed = note.trim();
        if trimmed.is_empty() {
            return Self::default();
        }

        if trimmed.starts_with('{') {
            if let Ok(map) = serde_json::from_str::<Map<String, Value>>(trimmed) {
                return Self::from_json_map(&map, keys);
            }
        }

        Self::from_legacy(trimmed, keys)
    }

    fn from_json_map(map: &Map<String, Value>, keys: &[&str]) -> Self {
        let entries = keys
            .iter()
            .filter_map(|key| {
                let value = match map.get(*key)? {
                    Value::Null => return None,
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((key.to_string(), value))
            })
            .collect();
        Self {
            entries,
            remainder: None,
        }
    }

    fn from_legacy(note: &str, keys: &[&str]) -> Self {
        let mut fields = Self::default();
        let mut leftovers: Vec<&str> = Vec::new();

        for segment in note.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let known = segment.split_once(':').and_then(|(raw_key, value)| {
                let normalized = normalize_header(raw_key);
                keys.iter()
                    .find(|key| normalize_header(key) == normalized)
                    .map(|key| (key.to_string(), value.trim().to_string()))
            });

            match known {
                Some((key, value)) => {
                    if !value.is_empty() && fields.get(&key).is_none() {
                        fields.entries.push((key, value));
                    }
                }
                None => leftovers.push(segment),
            }
        }

        // 按固定 key 顺序输出
        fields
            .entries
            .sort_by_key(|(k, _)| keys.iter().position(|key| *key == k.as_str()));
        if !leftovers.is_empty() {
            fields.remainder = Some(leftovers.join(LEGACY_SEPARATOR));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ImportRecord;

    const KEYS: &[&str] = &["supplier", "invoiceNo", "paymentMethod", "description"];

    fn record(pairs: &[(&str, &str)]) -> ImportRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_json_round_trip_with_delimiters_in_values() {
        let fields = NoteFields::from_record(
            &record(&[
                ("supplier", "Acme Inc: Trading; Ltd"),
                ("invoiceNo", "INV-7"),
                ("description", "cement"),
            ]),
            KEYS,
        );

        let note = fields.encode(NoteEncoding::Json).unwrap();
        let decoded = NoteFields::decode(&note, KEYS);

        assert_eq!(decoded, fields);
        assert_eq!(decoded.get("supplier"), Some("Acme Inc: Trading; Ltd"));
    }

    #[test]
    fn test_legacy_round_trip() {
        let fields = NoteFields::from_record(
            &record(&[("supplier", "Acme"), ("paymentMethod", "cash")]),
            KEYS,
        );

        let note = fields.encode(NoteEncoding::Legacy).unwrap();
        assert_eq!(note, "supplier:Acme; paymentMethod:cash");
        assert_eq!(NoteFields::decode(&note, KEYS), fields);
    }

    #[test]
    fn test_legacy_value_may_contain_colon() {
        let decoded = NoteFields::decode("supplier:Acme Inc: Trading; invoiceNo:7", KEYS);
        assert_eq!(decoded.get("supplier"), Some("Acme Inc: Trading"));
        assert_eq!(decoded.get("invoiceNo"), Some("7"));
    }

    #[test]
    fn test_legacy_keys_case_insensitive_and_reordered() {
        let decoded = NoteFields::decode("Description: gravel; SUPPLIER : Acme", KEYS);
        let keys: Vec<&str> = decoded.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["supplier", "description"]);
    }

    #[test]
    fn test_free_text_kept_as_remainder() {
        let decoded = NoteFields::decode("paid at site office", KEYS);
        assert!(decoded.iter().next().is_none());
        assert_eq!(decoded.remainder(), Some("paid at site office"));
    }

    #[test]
    fn test_empty_fields_encode_to_none() {
        let fields = NoteFields::from_record(&record(&[("supplier", "  ")]), KEYS);
        assert!(fields.is_empty());
        assert_eq!(fields.encode(NoteEncoding::Json), None);
    }

    #[test]
    fn test_note_encoding_parse() {
        assert_eq!("JSON".parse::<NoteEncoding>(), Ok(NoteEncoding::Json));
        assert_eq!("legacy".parse::<NoteEncoding>(), Ok(NoteEncoding::Legacy));
        assert!("xml".parse::<NoteEncoding>().is_err());
    }
}
