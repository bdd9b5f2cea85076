// ==========================================
// 工程 ERP 批量导入 - API层错误类型
// ==========================================
// 职责: 把导入/客户端/仓储/配置各层错误转换为用户可读的错误消息
// ==========================================

use crate::client::ClientError;
use crate::config::ConfigError;
use crate::domain::ParseEntityKindError;
use crate::importer::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 导入错误
    // ==========================================
    /// 文件不存在/格式不支持/无法解析
    #[error("文件读取失败: {0}")]
    FileError(String),

    #[error("列映射无效: {0}")]
    MappingError(String),

    /// 没有有效行（警告级别,未提交）
    #[error("没有可导入的数据: {0}")]
    EmptyImport(String),

    /// 批量创建失败（可修正后重试）
    #[error("批量创建失败: {0}")]
    PersistFailed(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(_)
            | ImportError::UnsupportedFormat(_)
            | ImportError::FileReadError(_)
            | ImportError::ParseError(_)
            | ImportError::TooManyRows { .. } => ApiError::FileError(err.to_string()),
            ImportError::UnknownField(_) | ImportError::UnknownColumn(_) => {
                ApiError::MappingError(err.to_string())
            }
            ImportError::NoFileLoaded => ApiError::InvalidInput(err.to_string()),
            ImportError::EmptyImport { .. } => ApiError::EmptyImport(err.to_string()),
            ImportError::PersistError(inner) => ApiError::PersistFailed(inner.to_string()),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => {
                ApiError::DatabaseConnectionError(msg)
            }
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Database(e) => ApiError::DatabaseError(e.to_string()),
            other => ApiError::ConfigError(other.to_string()),
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        ApiError::PersistFailed(err.to_string())
    }
}

impl From<ParseEntityKindError> for ApiError {
    fn from(err: ParseEntityKindError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::DatabaseError(err.to_string())
    }
}

/// API层Result类型别名
pub type ApiResult<T> = Result<T, ApiError>;
