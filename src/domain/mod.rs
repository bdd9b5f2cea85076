// ==========================================
// 工程 ERP 批量导入 - 领域模型层
// ==========================================
// 职责: 定义导入管道的数据结构与业务实体类型
// 红线: 不含文件解析逻辑,不含网络/数据库访问
// ==========================================

pub mod batch;
pub mod import;
pub mod types;

// 重导出核心类型
pub use batch::{ImportBatch, ImportBatchStatus};
pub use import::{ColumnMapping, ImportFieldSpec, ImportRecord, MappedRow, RawSheetRow};
pub use types::{EntityKind, ParseEntityKindError};
