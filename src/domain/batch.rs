// ==========================================
// 工程 ERP 批量导入 - 导入批次记录
// ==========================================
// 用途: 每次确认提交（成功/失败/无有效行）留一条历史
// 对齐: import_batch 表
// 说明: 只记录计数,不保存行数据
// ==========================================

use crate::domain::types::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportBatchStatus {
    Succeeded, // 批量创建成功
    Failed,    // 批量创建失败
    Empty,     // 无有效行,未提交
}

impl ImportBatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportBatchStatus::Succeeded => "SUCCEEDED",
            ImportBatchStatus::Failed => "FAILED",
            ImportBatchStatus::Empty => "EMPTY",
        }
    }
}

impl fmt::Display for ImportBatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportBatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "SUCCEEDED" => Ok(ImportBatchStatus::Succeeded),
            "FAILED" => Ok(ImportBatchStatus::Failed),
            "EMPTY" => Ok(ImportBatchStatus::Empty),
            other => Err(format!("未知的批次状态: {}", other)),
        }
    }
}

// ==========================================
// ImportBatch - 导入批次
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,              // 批次 ID（UUID）
    pub entity: EntityKind,            // 导入实体
    pub file_name: Option<String>,     // 源文件名
    pub total_rows: i64,               // 数据行数
    pub valid_rows: i64,               // 校验通过行数
    pub invalid_rows: i64,             // 校验失败行数
    pub imported_rows: i64,            // 实际提交行数
    pub status: ImportBatchStatus,     // 结果
    pub error_message: Option<String>, // 失败原因
    pub imported_at: DateTime<Utc>,    // 提交时间
    pub elapsed_ms: i64,               // 提交耗时（毫秒）
}
