// ==========================================
// 工程 ERP 批量导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigResult;
use crate::importer::NoteEncoding;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: API 层构造 HTTP 客户端与导入会话时读取
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 后端接口 =====

    /// 批量创建接口的基础地址
    ///
    /// # 默认值
    /// - http://localhost:3000/api
    async fn get_api_base_url(&self) -> ConfigResult<String>;

    /// HTTP 请求超时（秒）
    ///
    /// # 默认值
    /// - 30
    async fn get_request_timeout_secs(&self) -> ConfigResult<u64>;

    /// 租户标识（未配置时不发送租户头）
    async fn get_tenant_id(&self) -> ConfigResult<Option<String>>;

    // ===== 导入限制 =====

    /// 单次导入的最大数据行数
    ///
    /// # 默认值
    /// - 5000
    async fn get_max_import_rows(&self) -> ConfigResult<usize>;

    /// 备注字段写入格式
    ///
    /// # 默认值
    /// - json（legacy 为 "key:value; key:value"）
    async fn get_note_encoding(&self) -> ConfigResult<NoteEncoding>;

    // ===== 导入历史 =====

    /// 导入批次保留天数（超期批次可清理）
    ///
    /// # 默认值
    /// - 90
    async fn get_history_retention_days(&self) -> ConfigResult<i64>;
}
