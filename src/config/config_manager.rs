// ==========================================
// 工程 ERP 批量导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 说明: 库中的值无法解析时回退默认值并记 warn,写入时做校验
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, init_schema, open_and_init};
use crate::importer::NoteEncoding;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时创建并建表）
    pub fn new<P: AsRef<Path>>(db_path: P) -> ConfigResult<Self> {
        let conn = open_and_init(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 会对传入连接再次应用统一 PRAGMA 并确保表结构存在（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ConfigError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取配置值,不存在时返回默认值
    fn get_config_or_default(&self, key: &str) -> ConfigResult<String> {
        let default = config_keys::default_for(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取并解析；解析失败回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr,
    {
        let value = self.get_config_or_default(key)?;
        match value.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(_) => {
                warn!(config_key = key, raw_value = %value, "配置值格式错误,使用默认值");
                Ok(default)
            }
        }
    }

    /// 写入配置（校验后 UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        config_keys::validate(key, value)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value.trim()],
        )?;
        info!(config_key = key, value = %value.trim(), "配置已更新");
        Ok(())
    }

    /// 删除覆写,恢复默认值
    ///
    /// # 返回
    /// - true: 删除了一条覆写
    pub fn reset_config_value(&self, key: &str) -> ConfigResult<bool> {
        if config_keys::default_for(key).is_none() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }
        let conn = self.lock()?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
        )?;
        Ok(affected > 0)
    }

    /// 所有已知配置项的生效值快照（覆写 + 默认值）
    pub fn get_config_snapshot(&self) -> ConfigResult<BTreeMap<String, String>> {
        config_keys::ALL
            .iter()
            .map(|key| Ok((key.to_string(), self.get_config_or_default(key)?)))
            .collect()
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_api_base_url(&self) -> ConfigResult<String> {
        let value = self.get_config_or_default(config_keys::API_BASE_URL)?;
        Ok(value.trim().trim_end_matches('/').to_string())
    }

    async fn get_request_timeout_secs(&self) -> ConfigResult<u64> {
        self.get_parsed_or_default(config_keys::REQUEST_TIMEOUT_SECS, 30)
    }

    async fn get_tenant_id(&self) -> ConfigResult<Option<String>> {
        let value = self.get_config_or_default(config_keys::TENANT_ID)?;
        let value = value.trim();
        Ok((!value.is_empty()).then(|| value.to_string()))
    }

    async fn get_max_import_rows(&self) -> ConfigResult<usize> {
        self.get_parsed_or_default(config_keys::MAX_IMPORT_ROWS, 5000)
    }

    async fn get_note_encoding(&self) -> ConfigResult<NoteEncoding> {
        self.get_parsed_or_default(config_keys::NOTE_ENCODING, NoteEncoding::Json)
    }

    async fn get_history_retention_days(&self) -> ConfigResult<i64> {
        self.get_parsed_or_default(config_keys::HISTORY_RETENTION_DAYS, 90)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    use crate::config::error::{ConfigError, ConfigResult};
    use crate::importer::NoteEncoding;

    // 后端接口
    pub const API_BASE_URL: &str = "api_base_url";
    pub const REQUEST_TIMEOUT_SECS: &str = "request_timeout_secs";
    pub const TENANT_ID: &str = "tenant_id";

    // 导入限制
    pub const MAX_IMPORT_ROWS: &str = "max_import_rows";
    pub const NOTE_ENCODING: &str = "note_encoding";

    // 导入历史
    pub const HISTORY_RETENTION_DAYS: &str = "history_retention_days";
    /// 保留天数上限（约 100 年）
    pub const MAX_HISTORY_RETENTION_DAYS: u64 = 36_500;

    pub const ALL: &[&str] = &[
        API_BASE_URL,
        REQUEST_TIMEOUT_SECS,
        TENANT_ID,
        MAX_IMPORT_ROWS,
        NOTE_ENCODING,
        HISTORY_RETENTION_DAYS,
    ];

    /// 默认值；未知 key 返回 None
    pub fn default_for(key: &str) -> Option<&'static str> {
        match key {
            API_BASE_URL => Some("http://localhost:3000/api"),
            REQUEST_TIMEOUT_SECS => Some("30"),
            TENANT_ID => Some(""),
            MAX_IMPORT_ROWS => Some("5000"),
            NOTE_ENCODING => Some("json"),
            HISTORY_RETENTION_DAYS => Some("90"),
            _ => None,
        }
    }

    /// 写入前校验
    pub fn validate(key: &str, value: &str) -> ConfigResult<()> {
        let value = value.trim();
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match key {
            API_BASE_URL => {
                if value.starts_with("http://") || value.starts_with("https://") {
                    Ok(())
                } else {
                    Err(invalid("必须以 http:// 或 https:// 开头"))
                }
            }
            REQUEST_TIMEOUT_SECS | MAX_IMPORT_ROWS => match value.parse::<u64>() {
                Ok(v) if v > 0 => Ok(()),
                _ => Err(invalid("必须为正整数")),
            },
            HISTORY_RETENTION_DAYS => match value.parse::<u64>() {
                Ok(v) if (1..=MAX_HISTORY_RETENTION_DAYS).contains(&v) => Ok(()),
                _ => Err(invalid(&format!(
                    "必须为 1 到 {} 之间的整数",
                    MAX_HISTORY_RETENTION_DAYS
                ))),
            },
            NOTE_ENCODING => value
                .parse::<NoteEncoding>()
                .map(|_| ())
                .map_err(|e| invalid(&e)),
            TENANT_ID => Ok(()),
            _ => Err(ConfigError::UnknownKey(key.to_string())),
        }
    }
}
