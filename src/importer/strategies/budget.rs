// ==========================================
// 工程 ERP 批量导入 - 预算导入策略
// ==========================================
// 规则:
// - 期间开始/结束为合法日期,结束不早于开始
// - amount > 0；spent（选填）>= 0
// - projectId 可解析（提供项目列表时）
// ==========================================

use crate::client::{BulkCreateApi, ClientError};
use crate::domain::{EntityKind, ImportFieldSpec, ImportRecord};
use crate::importer::data_cleaner::{
    check_date, check_date_order, check_non_negative_amount, check_not_blank,
    check_positive_amount, join_errors, normalize_null,
};
use crate::importer::importer_trait::ImportStrategy;
use crate::importer::strategies::{
    optional_amount, require_amount, require_date, resolve_reference, submit, ReferenceSet,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCreateBody {
    pub project_id: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

pub struct BudgetImportStrategy {
    api: Arc<dyn BulkCreateApi>,
    schema: Vec<ImportFieldSpec>,
    projects: ReferenceSet,
}

impl BudgetImportStrategy {
    pub fn new(api: Arc<dyn BulkCreateApi>) -> Self {
        Self {
            api,
            schema: vec![
                ImportFieldSpec::required("projectId", "Project"),
                ImportFieldSpec::required("periodStart", "Period Start"),
                ImportFieldSpec::required("periodEnd", "Period End"),
                ImportFieldSpec::required("amount", "Amount"),
                ImportFieldSpec::optional("spent", "Spent"),
                ImportFieldSpec::optional("category", "Category"),
            ],
            projects: ReferenceSet::default(),
        }
    }

    pub fn with_projects(mut self, projects: ReferenceSet) -> Self {
        self.projects = projects;
        self
    }

    pub fn to_body(&self, record: &ImportRecord) -> Result<BudgetCreateBody, ClientError> {
        Ok(BudgetCreateBody {
            project_id: resolve_reference(&self.projects, record, "projectId")?,
            period_start: require_date(record, "periodStart")?,
            period_end: require_date(record, "periodEnd")?,
            amount: require_amount(record, "amount")?,
            spent: optional_amount(record, "spent")?,
            category: normalize_null(record, "category"),
        })
    }
}

#[async_trait]
impl ImportStrategy for BudgetImportStrategy {
    fn entity(&self) -> EntityKind {
        EntityKind::Budgets
    }

    fn schema(&self) -> &[ImportFieldSpec] {
        &self.schema
    }

    fn validate(&self, record: &ImportRecord) -> Option<String> {
        join_errors([
            check_not_blank(record, &self.schema),
            self.projects.check(record, "projectId"),
            check_date(record, "periodStart"),
            check_date(record, "periodEnd"),
            check_date_order(record, "periodStart", "periodEnd"),
            check_positive_amount(record, "amount"),
            check_non_negative_amount(record, "spent"),
        ])
    }

    async fn persist(&self, records: Vec<ImportRecord>) -> Result<(), ClientError> {
        submit(self.api.as_ref(), self.entity(), records, |r| self.to_body(r)).await
    }
}
