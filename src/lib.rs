// ==========================================
// 工程 ERP 批量导入 - 核心库
// ==========================================
// 范围: 预算 / 费用 / 综合费用 / 发票 / 收款 的表格批量导入
// 流程: 文件解析 → 表头映射 → 逐行校验 → 确认 → 批量创建
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 导入数据结构
pub mod domain;

// 导入层 - 导入管道
pub mod importer;

// 客户端层 - 批量创建接口
pub mod client;

// 配置层 - 系统配置
pub mod config;

// 数据仓储层 - 导入历史
pub mod repository;

// 数据库基础设施（连接初始化/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 对外接口
pub mod api;

// 应用层 - 命令行运行环境
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    ColumnMapping, EntityKind, ImportBatch, ImportBatchStatus, ImportFieldSpec, ImportRecord,
    MappedRow, RawSheetRow,
};

pub use importer::{
    auto_map, materialize, ImportError, ImportOutcome, ImportSession, ImportStrategy,
    NoteEncoding, NoteFields, ParsedSheet, UniversalFileParser,
};

pub use client::{AuthSession, BulkCreateApi, ClientError, HttpBulkCreateClient};

pub use api::{ApiError, ImportApi, ImportApiResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "工程 ERP 批量导入";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
