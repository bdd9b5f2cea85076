// ==========================================
// 工程 ERP 批量导入 - 列自动映射
// ==========================================
// 阶段 1: 表头 → 字段 key
// 规则:
// - 归一化: 小写 + 去首尾空白 + 去内部空白（表头/key/label 同一规则）
// - 每个字段取表格顺序中第一个与 key 或 label 相等的表头
// - 无匹配则不映射；不做模糊匹配
// ==========================================

use crate::domain::{ColumnMapping, ImportFieldSpec};
use crate::importer::error::{ImportError, ImportResult};
use std::collections::BTreeMap;

/// 归一化表头/字段名
pub fn normalize_header(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// 自动映射（纯函数）
pub fn auto_map(headers: &[String], fields: &[ImportFieldSpec]) -> ColumnMapping {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

    let mut auto = BTreeMap::new();
    for field in fields {
        let key = normalize_header(&field.key);
        let label = normalize_header(&field.label);

        let matched = normalized
            .iter()
            .position(|h| *h == key || *h == label)
            .map(|idx| headers[idx].clone());

        if let Some(header) = matched {
            auto.insert(field.key.clone(), header);
        }
    }

    ColumnMapping::from_auto(auto)
}

/// 人工覆写映射
///
/// # 参数
/// - header: Some(表头) 指定列；None 取消映射
///
/// # 返回
/// - Err(UnknownField): key 不在 schema 中
/// - Err(UnknownColumn): 表头不在当前文件中
pub fn apply_override(
    mapping: &mut ColumnMapping,
    fields: &[ImportFieldSpec],
    headers: &[String],
    key: &str,
    header: Option<&str>,
) -> ImportResult<()> {
    if !fields.iter().any(|f| f.key == key) {
        return Err(ImportError::UnknownField(key.to_string()));
    }

    if let Some(h) = header {
        if !headers.iter().any(|existing| existing == h) {
            return Err(ImportError::UnknownColumn(h.to_string()));
        }
    }

    mapping.set_override(key, header.map(str::to_string));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Payment   Date "), "paymentdate");
        assert_eq!(normalize_header("projectId"), "projectid");
        assert_eq!(normalize_header("payment_date"), "payment_date");
    }

    #[test]
    fn test_auto_map_by_label() {
        let fields = vec![ImportFieldSpec::required("payment_date", "Payment Date")];
        let mapping = auto_map(&headers(&["Payment Date", "Amount", "Method"]), &fields);

        assert_eq!(mapping.get("payment_date"), Some("Payment Date"));
    }

    #[test]
    fn test_auto_map_by_key_case_insensitive() {
        let fields = vec![ImportFieldSpec::required("projectId", "Project")];
        let mapping = auto_map(&headers(&["PROJECTID"]), &fields);

        assert_eq!(mapping.get("projectId"), Some("PROJECTID"));
    }

    #[test]
    fn test_auto_map_first_header_wins() {
        let fields = vec![ImportFieldSpec::required("amount", "Amount")];
        let mapping = auto_map(&headers(&["Notes", "amount", "Amount "]), &fields);

        assert_eq!(mapping.get("amount"), Some("amount"));
    }

    #[test]
    fn test_auto_map_no_partial_match() {
        let fields = vec![ImportFieldSpec::required("amount", "Amount")];
        let mapping = auto_map(&headers(&["Amount (USD)"]), &fields);

        assert_eq!(mapping.get("amount"), None);
        assert!(mapping.resolved().is_empty());
    }

    #[test]
    fn test_apply_override_validates_inputs() {
        let fields = vec![ImportFieldSpec::required("amount", "Amount")];
        let cols = headers(&["Total", "Amount"]);
        let mut mapping = auto_map(&cols, &fields);

        let unknown_field = apply_override(&mut mapping, &fields, &cols, "spent", Some("Total"));
        assert!(matches!(unknown_field, Err(ImportError::UnknownField(_))));

        let unknown_column = apply_override(&mut mapping, &fields, &cols, "amount", Some("Sum"));
        assert!(matches!(unknown_column, Err(ImportError::UnknownColumn(_))));

        apply_override(&mut mapping, &fields, &cols, "amount", Some("Total")).unwrap();
        assert_eq!(mapping.get("amount"), Some("Total"));

        apply_override(&mut mapping, &fields, &cols, "amount", None).unwrap();
        assert_eq!(mapping.get("amount"), None);
    }
}
