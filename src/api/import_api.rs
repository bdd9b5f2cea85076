// ==========================================
// 工程 ERP 批量导入 - 导入 API
// ==========================================
// 职责: 组装配置/HTTP 客户端/导入策略/导入历史,供 CLI 或界面外壳调用
// 流程: open_session → (set_mapping) → confirm → 写入导入历史
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::client::{AuthSession, BulkCreateApi, HttpBulkCreateClient};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::open_and_init;
use crate::domain::{EntityKind, ImportBatch, ImportBatchStatus};
use crate::importer::strategies::{
    InvoiceLineItem, ReferenceEntry, ReferenceSet, StrategyOptions, EXPENSE_NOTE_KEYS,
    GENERAL_EXPENSE_NOTE_KEYS,
};
use crate::importer::{strategy_for, ImportError, ImportSession, ImportStrategy, NoteFields};
use crate::repository::{ImportBatchRepository, ImportBatchRepositoryImpl};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 导入历史中的批次ID
    pub batch_id: String,
    pub entity: EntityKind,
    pub file_name: Option<String>,
    /// 数据行数
    pub total_rows: usize,
    /// 提交的行数
    pub imported: usize,
    /// 校验失败被跳过的行数
    pub skipped: usize,
    /// 耗时（毫秒）
    pub elapsed_ms: u64,
}

/// 可解析的关联对象列表（项目/客户）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceLists {
    #[serde(default)]
    pub projects: Vec<ReferenceEntry>,
    #[serde(default)]
    pub clients: Vec<ReferenceEntry>,
}

/// 备注字段解码结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodedNote {
    Fields {
        fields: Vec<NoteEntry>,
        #[serde(skip_serializing_if = "Option::is_none")]
        remainder: Option<String>,
    },
    LineItems {
        items: Vec<InvoiceLineItem>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteEntry {
    pub key: String,
    pub value: String,
}

impl From<NoteFields> for DecodedNote {
    fn from(fields: NoteFields) -> Self {
        DecodedNote::Fields {
            fields: fields
                .iter()
                .map(|(key, value)| NoteEntry {
                    key: key.to_string(),
                    value: value.to_string(),
                })
                .collect(),
            remainder: fields.remainder().map(str::to_string),
        }
    }
}

/// 映射覆写: (字段 key, Some(表头) | None 取消映射)
pub type MappingOverride = (String, Option<String>);

/// 导入API
pub struct ImportApi {
    config: Arc<ConfigManager>,
    history: Arc<dyn ImportBatchRepository>,
    session: AuthSession,
    references: ReferenceLists,
    bulk_api: Option<Arc<dyn BulkCreateApi>>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    ///
    /// # 参数
    /// - db_path: 本地数据库（配置 + 导入历史）
    /// - session: 登录会话,注入到 HTTP 客户端
    pub fn new<P: AsRef<Path>>(db_path: P, session: AuthSession) -> ApiResult<Self> {
        let conn = open_and_init(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        let conn = Arc::new(Mutex::new(conn));

        let config = Arc::new(ConfigManager::from_connection(conn.clone())?);
        let history = Arc::new(ImportBatchRepositoryImpl::from_connection(conn)?);

        Ok(Self {
            config,
            history,
            session,
            references: ReferenceLists::default(),
            bulk_api: None,
        })
    }

    /// 替换批量创建接口（不走 HTTP 时使用）
    pub fn with_bulk_api(mut self, api: Arc<dyn BulkCreateApi>) -> Self {
        self.bulk_api = Some(api);
        self
    }

    /// 设置项目/客户列表,用于按 id 或名称解析关联字段
    pub fn with_references(mut self, references: ReferenceLists) -> Self {
        self.references = references;
        self
    }

    pub fn config(&self) -> Arc<ConfigManager> {
        self.config.clone()
    }

    async fn bulk_api(&self) -> ApiResult<Arc<dyn BulkCreateApi>> {
        if let Some(api) = &self.bulk_api {
            return Ok(api.clone());
        }

        let base_url = self.config.get_api_base_url().await?;
        let timeout = Duration::from_secs(self.config.get_request_timeout_secs().await?);
        let mut session = self.session.clone();
        if session.tenant_id().is_none() {
            if let Some(tenant) = self.config.get_tenant_id().await? {
                session = session.with_tenant(tenant);
            }
        }
        if !session.is_authenticated() {
            debug!("未提供访问令牌,以匿名方式调用批量创建接口");
        }

        let client = HttpBulkCreateClient::new(base_url, timeout, session)?;
        Ok(Arc::new(client))
    }

    /// 构造实体的导入策略
    pub async fn strategy_for(&self, entity: EntityKind) -> ApiResult<Arc<dyn ImportStrategy>> {
        let options = StrategyOptions {
            note_encoding: self.config.get_note_encoding().await?,
            projects: ReferenceSet::new(self.references.projects.clone()),
            clients: ReferenceSet::new(self.references.clients.clone()),
        };
        Ok(strategy_for(entity, self.bulk_api().await?, &options))
    }

    async fn new_session(&self, entity: EntityKind) -> ApiResult<ImportSession> {
        let max_rows = self.config.get_max_import_rows().await?;
        Ok(ImportSession::new(self.strategy_for(entity).await?).with_max_rows(max_rows))
    }

    fn apply_overrides(
        session: &mut ImportSession,
        overrides: &[MappingOverride],
    ) -> ApiResult<()> {
        for (key, header) in overrides {
            session.set_mapping(key, header.as_deref())?;
        }
        Ok(())
    }

    /// 打开导入会话（磁盘文件）
    ///
    /// # 返回
    /// - Ok(ImportSession): 已完成自动映射、覆写与预览
    pub async fn open_session<P: AsRef<Path>>(
        &self,
        entity: EntityKind,
        file_path: P,
        overrides: &[MappingOverride],
    ) -> ApiResult<ImportSession> {
        let mut session = self.new_session(entity).await?;
        session.load_file(file_path)?;
        Self::apply_overrides(&mut session, overrides)?;
        Ok(session)
    }

    /// 打开导入会话（内存中的文件,如上传内容）
    pub async fn open_session_from_bytes(
        &self,
        entity: EntityKind,
        file_name: &str,
        bytes: &[u8],
        overrides: &[MappingOverride],
    ) -> ApiResult<ImportSession> {
        let mut session = self.new_session(entity).await?;
        session.load_bytes(file_name, bytes)?;
        Self::apply_overrides(&mut session, overrides)?;
        Ok(session)
    }

    /// 确认导入并写入导入历史
    ///
    /// # 说明
    /// - 无有效行/批量创建失败也会留下一条历史（EMPTY/FAILED）
    /// - 历史写入失败只记日志,不影响导入结果
    #[instrument(skip(self, session), fields(entity = %session.entity()))]
    pub async fn confirm(&self, session: &mut ImportSession) -> ApiResult<ImportApiResponse> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        let entity = session.entity();
        let file_name = session.file_name().map(str::to_string);
        let total_rows = session.total_rows();
        let valid_rows = session.valid_count();
        let invalid_rows = session.invalid_count();

        let result = session.confirm().await;

        let recorded = match &result {
            Ok(outcome) => Some((ImportBatchStatus::Succeeded, outcome.imported, None)),
            Err(ImportError::EmptyImport { .. }) => Some((ImportBatchStatus::Empty, 0, None)),
            Err(ImportError::PersistError(e)) => {
                Some((ImportBatchStatus::Failed, 0, Some(e.to_string())))
            }
            // 未载入文件等: 没有发生提交,不记历史
            Err(_) => None,
        };

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        if let Some((status, imported_rows, error_message)) = recorded {
            let batch = ImportBatch {
                batch_id: batch_id.clone(),
                entity,
                file_name: file_name.clone(),
                total_rows: total_rows as i64,
                valid_rows: valid_rows as i64,
                invalid_rows: invalid_rows as i64,
                imported_rows: imported_rows as i64,
                status,
                error_message,
                imported_at: Utc::now(),
                elapsed_ms: elapsed_ms as i64,
            };
            if let Err(e) = self.history.insert_batch(&batch).await {
                warn!(batch_id = %batch_id, error = %e, "导入历史写入失败");
            }
        }

        let outcome = result?;
        info!(batch_id = %batch_id, imported = outcome.imported, "导入批次完成");

        Ok(ImportApiResponse {
            batch_id,
            entity,
            file_name,
            total_rows: outcome.total_rows,
            imported: outcome.imported,
            skipped: outcome.skipped,
            elapsed_ms,
        })
    }

    /// 一步完成: 打开会话 + 确认
    pub async fn import_file<P: AsRef<Path>>(
        &self,
        entity: EntityKind,
        file_path: P,
        overrides: &[MappingOverride],
    ) -> ApiResult<ImportApiResponse> {
        let mut session = self.open_session(entity, file_path, overrides).await?;
        self.confirm(&mut session).await
    }

    /// 查询导入历史（按提交时间倒序）
    pub async fn list_history(
        &self,
        entity: Option<EntityKind>,
        limit: usize,
    ) -> ApiResult<Vec<ImportBatch>> {
        Ok(self.history.list_recent(entity, limit).await?)
    }

    /// 查询单个批次
    pub async fn get_batch(&self, batch_id: &str) -> ApiResult<ImportBatch> {
        self.history
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("导入批次 {}", batch_id)))
    }

    /// 按保留天数清理导入历史
    pub async fn purge_history(&self) -> ApiResult<usize> {
        let days = self.config.get_history_retention_days().await?;
        Ok(self.history.purge_older_than(days).await?)
    }

    /// 解码已有记录的备注/明细字段
    pub fn decode_note(&self, entity: EntityKind, note: &str) -> ApiResult<DecodedNote> {
        match entity {
            EntityKind::Expenses => Ok(NoteFields::decode(note, EXPENSE_NOTE_KEYS).into()),
            EntityKind::GeneralExpenses => {
                Ok(NoteFields::decode(note, GENERAL_EXPENSE_NOTE_KEYS).into())
            }
            EntityKind::Invoices => Ok(DecodedNote::LineItems {
                items: InvoiceLineItem::parse_items(note),
            }),
            EntityKind::Budgets | EntityKind::Payments => Err(ApiError::InvalidInput(format!(
                "{} 没有结构化备注字段",
                entity
            ))),
        }
    }
}
