// ==========================================
// 工程 ERP 批量导入 - 导入 Trait
// ==========================================
// 职责: 定义导入管道的可替换接口（不包含实现）
// ==========================================

use crate::client::ClientError;
use crate::domain::{EntityKind, ImportFieldSpec, ImportRecord};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::ParsedSheet;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: ExcelParser, CsvParser
pub trait FileParser: Send + Sync {
    /// 解析内存中的文件内容
    ///
    /// # 返回
    /// - Ok(ParsedSheet): 表头 + 数据行
    /// - Err(ParseError): 文件损坏/无工作表
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<ParsedSheet>;

    /// 解析磁盘文件
    fn parse_file(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }
        let bytes = std::fs::read(file_path)?;
        self.parse_bytes(&bytes)
    }
}

// ==========================================
// ImportStrategy Trait
// ==========================================
// 用途: 每种业务实体一个实现,注入到通用导入管道
// 实现者: BudgetImportStrategy, ExpenseImportStrategy,
//         GeneralExpenseImportStrategy, InvoiceImportStrategy,
//         PaymentImportStrategy
#[async_trait]
pub trait ImportStrategy: Send + Sync {
    /// 实体类型
    fn entity(&self) -> EntityKind;

    /// 导入字段定义（顺序即预览表的列顺序）
    fn schema(&self) -> &[ImportFieldSpec];

    /// 业务规则校验（纯函数,同步）
    ///
    /// # 返回
    /// - None: 通过
    /// - Some(message): 失败原因,会拼入该行的 _err
    fn validate(&self, record: &ImportRecord) -> Option<String>;

    /// 批量创建（每次确认只调用一次,传入全部有效行）
    ///
    /// # 说明
    /// - 失败时整体视为失败,部分写入由服务端负责
    async fn persist(&self, records: Vec<ImportRecord>) -> Result<(), ClientError>;
}
