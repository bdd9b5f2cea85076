// ==========================================
// 工程 ERP 批量导入 - 行映射与校验
// ==========================================
// 阶段 2: 原始行 → 映射行 + 校验结果
// 规则:
// - 只复制已映射字段；未映射字段不出现在记录中
// - 必填字段缺失 = 不存在或空串（"0"/"FALSE" 视为有值）
// - 必填缺失与业务校验失败合并成一条 _err
// - _row = 数据序号 + 1（表头占第 1 行）
// 说明: 纯函数,映射每次变化都整体重算,不做缓存
// ==========================================

use crate::domain::{ColumnMapping, ImportFieldSpec, ImportRecord, MappedRow, RawSheetRow};
use std::fmt;

pub const ROW_ERROR_PREFIX: &str = "Missing/invalid: ";

// ==========================================
// RowValidationError - 单行校验错误（非致命）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowValidationError {
    pub missing: Vec<String>,
    pub custom: Option<String>,
}

impl RowValidationError {
    /// 无任何问题时返回 None
    pub fn collect(missing: Vec<String>, custom: Option<String>) -> Option<Self> {
        if missing.is_empty() && custom.is_none() {
            None
        } else {
            Some(Self { missing, custom })
        }
    }
}

impl fmt::Display for RowValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reasons: Vec<&str> = self
            .missing
            .iter()
            .map(String::as_str)
            .chain(self.custom.as_deref())
            .collect();
        write!(f, "{}{}", ROW_ERROR_PREFIX, reasons.join(", "))
    }
}

impl std::error::Error for RowValidationError {}

fn is_missing(value: Option<&String>) -> bool {
    value.map_or(true, |v| v.is_empty())
}

/// 按映射取值
pub fn map_row(row: &RawSheetRow, mapping: &ColumnMapping, fields: &[ImportFieldSpec]) -> ImportRecord {
    fields
        .iter()
        .filter_map(|field| {
            mapping.get(&field.key).map(|header| {
                let value = row.get(header).unwrap_or_default().to_string();
                (field.key.clone(), value)
            })
        })
        .collect()
}

/// 校验单条记录
pub fn validate_record<F>(
    record: &ImportRecord,
    fields: &[ImportFieldSpec],
    validate: F,
) -> Option<RowValidationError>
where
    F: Fn(&ImportRecord) -> Option<String>,
{
    let missing: Vec<String> = fields
        .iter()
        .filter(|field| field.required && is_missing(record.get(&field.key)))
        .map(|field| field.key.clone())
        .collect();

    RowValidationError::collect(missing, validate(record))
}

/// 生成预览行
pub fn materialize<F>(
    rows: &[RawSheetRow],
    mapping: &ColumnMapping,
    fields: &[ImportFieldSpec],
    validate: F,
) -> Vec<MappedRow>
where
    F: Fn(&ImportRecord) -> Option<String>,
{
    rows.iter()
        .enumerate()
        .map(|(idx, raw)| {
            // idx 从 0 开始: 第 1 条数据行位于表格第 2 行
            let row = idx + 2;
            let record = map_row(raw, mapping, fields);
            let error = validate_record(&record, fields, &validate).map(|e| e.to_string());
            MappedRow { row, error, record }
        })
        .collect()
}
