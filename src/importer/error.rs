// ==========================================
// 工程 ERP 批量导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 逐行校验错误不走这里（见 row_validator::RowValidationError）,
//       逐行错误只写入 MappedRow._err,不中断其他行
// ==========================================

use crate::client::ClientError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xlsm/.xls/.xlsb/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    /// 工作簿损坏/无法识别/无工作表
    #[error("工作簿解析失败: {0}")]
    ParseError(String),

    #[error("数据行过多: {count} 行（上限 {max} 行）")]
    TooManyRows { count: usize, max: usize },

    // ===== 映射错误 =====
    #[error("未知字段: {0}")]
    UnknownField(String),

    #[error("表头不存在: {0}")]
    UnknownColumn(String),

    // ===== 确认提交错误 =====
    #[error("尚未选择导入文件")]
    NoFileLoaded,

    /// 没有校验通过的行,不会调用批量创建
    #[error("没有可导入的有效行（{invalid} 行校验失败）")]
    EmptyImport { invalid: usize },

    /// 批量创建调用失败（整体视为失败,不做部分回滚）
    #[error("批量创建失败: {0}")]
    PersistError(#[source] ClientError),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::ParseError(format!("CSV: {}", err))
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ParseError(err.to_string())
    }
}

impl From<ClientError> for ImportError {
    fn from(err: ClientError) -> Self {
        ImportError::PersistError(err)
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
