// ==========================================
// 工程 ERP 批量导入 - 客户端错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    /// 令牌缺失/过期（401）
    #[error("未登录或登录已过期: {0}")]
    Unauthenticated(String),

    #[error("接口返回错误 (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("请求体序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),

    /// 校验通过后仍无法转换（校验规则与提交规则不一致）
    #[error("记录字段无效 (field {field}): {value}")]
    InvalidRecord { field: String, value: String },
}

impl ClientError {
    pub fn invalid_record(field: &str, value: Option<&str>) -> Self {
        ClientError::InvalidRecord {
            field: field.to_string(),
            value: value.unwrap_or_default().to_string(),
        }
    }
}
