// ==========================================
// 工程 ERP 批量导入 - 配置管理 API
// ==========================================
// 职责: 配置查询、更新、恢复默认
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, ConfigManager};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 配置项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigItem {
    pub key: String,
    pub value: String,
    /// true: 库中有覆写；false: 内置默认值
    pub overridden: bool,
}

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    fn item(&self, key: &str) -> ApiResult<ConfigItem> {
        let default = config_keys::default_for(key)
            .ok_or_else(|| ApiError::NotFound(format!("配置项 {}", key)))?;
        let stored = self.config_manager.get_config_value(key)?;
        Ok(ConfigItem {
            key: key.to_string(),
            overridden: stored.is_some(),
            value: stored.unwrap_or_else(|| default.to_string()),
        })
    }

    /// 查询所有配置（含默认值）
    pub fn list_configs(&self) -> ApiResult<Vec<ConfigItem>> {
        config_keys::ALL.iter().map(|key| self.item(key)).collect()
    }

    /// 查询单个配置
    pub fn get_config(&self, key: &str) -> ApiResult<ConfigItem> {
        self.item(key.trim())
    }

    /// 更新单个配置
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<ConfigItem> {
        let key = key.trim();
        self.config_manager.set_config_value(key, value)?;
        self.item(key)
    }

    /// 恢复默认值
    pub fn reset_config(&self, key: &str) -> ApiResult<ConfigItem> {
        let key = key.trim();
        self.config_manager.reset_config_value(key)?;
        self.item(key)
    }
}
