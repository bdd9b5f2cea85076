// ==========================================
// 工程 ERP 批量导入 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 CLI（或界面外壳）调用
// ==========================================

pub mod config_api;
pub mod error;
pub mod import_api;

// 重导出核心类型
pub use config_api::{ConfigApi, ConfigItem};
pub use error::{ApiError, ApiResult};
pub use import_api::{
    DecodedNote, ImportApi, ImportApiResponse, MappingOverride, NoteEntry, ReferenceLists,
};
