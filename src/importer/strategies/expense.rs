// ==========================================
// 工程 ERP 批量导入 - 项目费用导入策略
// ==========================================
// 规则: date 可解析；amount > 0；projectId 可解析（提供项目列表时）
// 附加信息: supplier / invoiceNo / paymentMethod / description 写入 note
// ==========================================

use crate::client::{BulkCreateApi, ClientError};
use crate::domain::{EntityKind, ImportFieldSpec, ImportRecord};
use crate::importer::data_cleaner::{
    check_date, check_not_blank, check_positive_amount, join_errors,
};
use crate::importer::importer_trait::ImportStrategy;
use crate::importer::note_codec::{NoteEncoding, NoteFields};
use crate::importer::strategies::{
    require_amount, require_date, require_text, resolve_reference, submit, ReferenceSet,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

/// 写入 note 的固定 key（顺序即编码顺序）
pub const EXPENSE_NOTE_KEYS: &[&str] = &["supplier", "invoiceNo", "paymentMethod", "description"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCreateBody {
    pub project_id: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub struct ExpenseImportStrategy {
    api: Arc<dyn BulkCreateApi>,
    schema: Vec<ImportFieldSpec>,
    note_encoding: NoteEncoding,
    projects: ReferenceSet,
}

impl ExpenseImportStrategy {
    pub fn new(api: Arc<dyn BulkCreateApi>, note_encoding: NoteEncoding) -> Self {
        Self {
            api,
            schema: vec![
                ImportFieldSpec::required("projectId", "Project"),
                ImportFieldSpec::required("date", "Date"),
                ImportFieldSpec::required("amount", "Amount"),
                ImportFieldSpec::required("category", "Category"),
                ImportFieldSpec::optional("supplier", "Supplier"),
                ImportFieldSpec::optional("invoiceNo", "Invoice No"),
                ImportFieldSpec::optional("paymentMethod", "Payment Method"),
                ImportFieldSpec::optional("description", "Description"),
            ],
            note_encoding,
            projects: ReferenceSet::default(),
        }
    }

    pub fn with_projects(mut self, projects: ReferenceSet) -> Self {
        self.projects = projects;
        self
    }

    pub fn to_body(&self, record: &ImportRecord) -> Result<ExpenseCreateBody, ClientError> {
        Ok(ExpenseCreateBody {
            project_id: resolve_reference(&self.projects, record, "projectId")?,
            date: require_date(record, "date")?,
            amount: require_amount(record, "amount")?,
            category: require_text(record, "category")?,
            note: NoteFields::from_record(record, EXPENSE_NOTE_KEYS).encode(self.note_encoding),
        })
    }
}

#[async_trait]
impl ImportStrategy for ExpenseImportStrategy {
    fn entity(&self) -> EntityKind {
        EntityKind::Expenses
    }

    fn schema(&self) -> &[ImportFieldSpec] {
        &self.schema
    }

    fn validate(&self, record: &ImportRecord) -> Option<String> {
        join_errors([
            check_not_blank(record, &self.schema),
            self.projects.check(record, "projectId"),
            check_date(record, "date"),
            check_positive_amount(record, "amount"),
        ])
    }

    async fn persist(&self, records: Vec<ImportRecord>) -> Result<(), ClientError> {
        submit(self.api.as_ref(), self.entity(), records, |r| self.to_body(r)).await
    }
}
