// ==========================================
// 工程 ERP 批量导入 - 导入历史 Repository 实现
// ==========================================
// 职责: 实现导入批次历史的数据访问（使用 rusqlite）
// 说明: imported_at 统一写 RFC 3339（UTC,毫秒）,按字符串排序即按时间排序
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema, open_and_init};
use crate::domain::{EntityKind, ImportBatch, ImportBatchStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::import_batch_repo::ImportBatchRepository;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

const SELECT_COLUMNS: &str = r#"
    SELECT batch_id, entity, file_name,
           total_rows, valid_rows, invalid_rows, imported_rows,
           status, error_message, imported_at, elapsed_ms
    FROM import_batch
"#;

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn map_batch_row(row: &Row<'_>) -> rusqlite::Result<ImportBatch> {
    let entity: String = row.get(1)?;
    let status: String = row.get(7)?;
    let imported_at: String = row.get(9)?;

    Ok(ImportBatch {
        batch_id: row.get(0)?,
        entity: entity
            .parse::<EntityKind>()
            .map_err(|e| conversion_error(1, e))?,
        file_name: row.get(2)?,
        total_rows: row.get(3)?,
        valid_rows: row.get(4)?,
        invalid_rows: row.get(5)?,
        imported_rows: row.get(6)?,
        status: status
            .parse::<ImportBatchStatus>()
            .map_err(|e| conversion_error(7, e))?,
        error_message: row.get(8)?,
        imported_at: DateTime::parse_from_rfc3339(&imported_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(9, e))?,
        elapsed_ms: row.get(10)?,
    })
}

// ==========================================
// ImportBatchRepositoryImpl
// ==========================================
pub struct ImportBatchRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ImportBatchRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时创建并建表）
    pub fn new<P: AsRef<Path>>(db_path: P) -> RepositoryResult<Self> {
        let conn = open_and_init(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与 ConfigManager 共享连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl ImportBatchRepository for ImportBatchRepositoryImpl {
    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, entity, file_name,
                total_rows, valid_rows, invalid_rows, imported_rows,
                status, error_message, imported_at, elapsed_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                batch.batch_id,
                batch.entity.slug(),
                batch.file_name,
                batch.total_rows,
                batch.valid_rows,
                batch.invalid_rows,
                batch.imported_rows,
                batch.status.as_str(),
                batch.error_message,
                format_timestamp(&batch.imported_at),
                batch.elapsed_ms,
            ],
        )?;

        debug!(batch_id = %batch.batch_id, status = %batch.status, "导入批次已记录");
        Ok(())
    }

    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>> {
        let conn = self.lock()?;
        let sql = format!("{} WHERE batch_id = ?1", SELECT_COLUMNS);
        let batch = conn
            .query_row(&sql, params![batch_id], map_batch_row)
            .optional()?;
        Ok(batch)
    }

    async fn list_recent(
        &self,
        entity: Option<EntityKind>,
        limit: usize,
    ) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.lock()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let batches = match entity {
            Some(entity) => {
                let sql = format!(
                    "{} WHERE entity = ?1 ORDER BY imported_at DESC LIMIT ?2",
                    SELECT_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![entity.slug(), limit], map_batch_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let sql = format!("{} ORDER BY imported_at DESC LIMIT ?1", SELECT_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![limit], map_batch_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(batches)
    }

    async fn purge_older_than(&self, retention_days: i64) -> RepositoryResult<usize> {
        // 保留期超出可表示的时间范围时,没有任何批次早于截止时间
        let Some(cutoff) = TimeDelta::try_days(retention_days.max(0))
            .and_then(|keep| Utc::now().checked_sub_signed(keep))
        else {
            warn!(retention_days, "保留天数超出时间范围,跳过清理");
            return Ok(0);
        };
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM import_batch WHERE imported_at < ?1",
            params![format_timestamp(&cutoff)],
        )?;
        if deleted > 0 {
            info!(deleted, retention_days, "已清理过期导入批次");
        }
        Ok(deleted)
    }
}
