// ==========================================
// 工程 ERP 批量导入 - 导入历史 Repository Trait
// ==========================================
// 职责: 定义导入批次历史的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则,只做数据 CRUD
// ==========================================

use crate::domain::{EntityKind, ImportBatch};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ImportBatchRepository Trait
// ==========================================
// 实现者: ImportBatchRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait ImportBatchRepository: Send + Sync {
    /// 插入导入批次记录
    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;

    /// 按批次 ID 查询
    ///
    /// # 返回
    /// - Ok(None): 未找到
    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>>;

    /// 查询最近的导入批次（按提交时间倒序）
    ///
    /// # 参数
    /// - entity: Some 时只查该实体
    /// - limit: 返回记录数限制
    async fn list_recent(
        &self,
        entity: Option<EntityKind>,
        limit: usize,
    ) -> RepositoryResult<Vec<ImportBatch>>;

    /// 清理早于保留期的批次
    ///
    /// # 返回
    /// - Ok(usize): 删除的记录数
    async fn purge_older_than(&self, retention_days: i64) -> RepositoryResult<usize>;
}
