// ==========================================
// 工程 ERP 批量导入 - 各业务实体导入策略
// ==========================================
// 每个实体提供: 字段 schema / 业务校验 / 记录 → 创建请求体 / 批量创建
// ==========================================

pub mod budget;
pub mod expense;
pub mod general_expense;
pub mod invoice;
pub mod payment;

pub use budget::{BudgetCreateBody, BudgetImportStrategy};
pub use expense::{ExpenseCreateBody, ExpenseImportStrategy, EXPENSE_NOTE_KEYS};
pub use general_expense::{
    GeneralExpenseCreateBody, GeneralExpenseImportStrategy, GENERAL_EXPENSE_NOTE_KEYS,
};
pub use invoice::{InvoiceCreateBody, InvoiceImportStrategy, InvoiceLineItem};
pub use payment::{PaymentCreateBody, PaymentImportStrategy};

use crate::client::{BulkCreateApi, ClientError};
use crate::domain::{EntityKind, ImportRecord};
use crate::importer::data_cleaner::{field, parse_amount, parse_date};
use crate::importer::importer_trait::ImportStrategy;
use crate::importer::note_codec::NoteEncoding;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ==========================================
// ReferenceSet - 可解析的关联对象（项目/客户）
// ==========================================
// 为空时不校验,原值直接作为 id 提交
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    entries: Vec<ReferenceEntry>,
}

impl ReferenceSet {
    pub fn new(entries: Vec<ReferenceEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按 id 精确匹配,或按名称忽略大小写匹配
    pub fn resolve<'a>(&'a self, value: &'a str) -> Option<&'a str> {
        if self.entries.is_empty() {
            return Some(value);
        }
        let value = value.trim();
        self.entries
            .iter()
            .find(|e| e.id == value)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.name.trim().eq_ignore_ascii_case(value))
            })
            .map(|e| e.id.as_str())
    }

    /// 校验可解析（值为空时跳过）
    pub fn check(&self, record: &ImportRecord, key: &str) -> Option<String> {
        let value = field(record, key)?;
        match self.resolve(value) {
            Some(_) => None,
            None => Some(format!("{} '{}' not found", key, value)),
        }
    }
}

// ==========================================
// StrategyOptions - 构造策略所需的外部输入
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct StrategyOptions {
    pub note_encoding: NoteEncoding,
    pub projects: ReferenceSet,
    pub clients: ReferenceSet,
}

/// 按实体构造导入策略
pub fn strategy_for(
    entity: EntityKind,
    api: Arc<dyn BulkCreateApi>,
    options: &StrategyOptions,
) -> Arc<dyn ImportStrategy> {
    match entity {
        EntityKind::Budgets => {
            Arc::new(BudgetImportStrategy::new(api).with_projects(options.projects.clone()))
        }
        EntityKind::Expenses => Arc::new(
            ExpenseImportStrategy::new(api, options.note_encoding)
                .with_projects(options.projects.clone()),
        ),
        EntityKind::GeneralExpenses => Arc::new(GeneralExpenseImportStrategy::new(
            api,
            options.note_encoding,
        )),
        EntityKind::Invoices => Arc::new(
            InvoiceImportStrategy::new(api)
                .with_projects(options.projects.clone())
                .with_clients(options.clients.clone()),
        ),
        EntityKind::Payments => Arc::new(PaymentImportStrategy::new(api)),
    }
}

// ==========================================
// 请求体构造辅助
// ==========================================
// 校验已保证这些字段合法；这里仍返回错误而不 panic

pub(crate) fn require_text(record: &ImportRecord, key: &str) -> Result<String, ClientError> {
    field(record, key)
        .map(str::to_string)
        .ok_or_else(|| ClientError::invalid_record(key, None))
}

pub(crate) fn require_amount(record: &ImportRecord, key: &str) -> Result<f64, ClientError> {
    let value = field(record, key);
    value
        .and_then(parse_amount)
        .ok_or_else(|| ClientError::invalid_record(key, value))
}

pub(crate) fn optional_amount(record: &ImportRecord, key: &str) -> Result<Option<f64>, ClientError> {
    match field(record, key) {
        None => Ok(None),
        Some(value) => parse_amount(value)
            .map(Some)
            .ok_or_else(|| ClientError::invalid_record(key, Some(value))),
    }
}

pub(crate) fn require_date(record: &ImportRecord, key: &str) -> Result<NaiveDate, ClientError> {
    let value = field(record, key);
    value
        .and_then(parse_date)
        .ok_or_else(|| ClientError::invalid_record(key, value))
}

pub(crate) fn optional_date(
    record: &ImportRecord,
    key: &str,
) -> Result<Option<NaiveDate>, ClientError> {
    match field(record, key) {
        None => Ok(None),
        Some(value) => parse_date(value)
            .map(Some)
            .ok_or_else(|| ClientError::invalid_record(key, Some(value))),
    }
}

pub(crate) fn resolve_reference(
    references: &ReferenceSet,
    record: &ImportRecord,
    key: &str,
) -> Result<String, ClientError> {
    let value = require_text(record, key)?;
    references
        .resolve(&value)
        .map(str::to_string)
        .ok_or_else(|| ClientError::invalid_record(key, Some(&value)))
}

/// 记录转请求体并一次性提交
pub(crate) async fn submit<T, F>(
    api: &dyn BulkCreateApi,
    entity: EntityKind,
    records: Vec<ImportRecord>,
    to_body: F,
) -> Result<(), ClientError>
where
    T: Serialize,
    F: Fn(&ImportRecord) -> Result<T, ClientError>,
{
    let payload = {
        let bodies = records
            .iter()
            .map(to_body)
            .collect::<Result<Vec<T>, ClientError>>()?;
        serde_json::to_value(&bodies)?
    };
    api.bulk_create(&entity.bulk_endpoint(), payload).await
}
