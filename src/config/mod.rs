// ==========================================
// 工程 ERP 批量导入 - 配置层
// ==========================================
// 职责: 后端地址/超时/导入上限/备注格式/历史保留等配置
// 存储: config_kv 表,缺省时使用内置默认值
// ==========================================

pub mod config_manager;
pub mod error;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use error::{ConfigError, ConfigResult};
pub use import_config_trait::ImportConfigReader;
