// ==========================================
// 工程 ERP 批量导入 - 综合费用导入策略
// ==========================================
// 与项目无关的费用（办公、差旅等）
// 附加信息: payee / reference / description 写入 note
// ==========================================

use crate::client::{BulkCreateApi, ClientError};
use crate::domain::{EntityKind, ImportFieldSpec, ImportRecord};
use crate::importer::data_cleaner::{
    check_date, check_not_blank, check_positive_amount, join_errors,
};
use crate::importer::importer_trait::ImportStrategy;
use crate::importer::note_codec::{NoteEncoding, NoteFields};
use crate::importer::strategies::{require_amount, require_date, require_text, submit};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

pub const GENERAL_EXPENSE_NOTE_KEYS: &[&str] = &["payee", "reference", "description"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralExpenseCreateBody {
    pub date: NaiveDate,
    pub amount: f64,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub struct GeneralExpenseImportStrategy {
    api: Arc<dyn BulkCreateApi>,
    schema: Vec<ImportFieldSpec>,
    note_encoding: NoteEncoding,
}

impl GeneralExpenseImportStrategy {
    pub fn new(api: Arc<dyn BulkCreateApi>, note_encoding: NoteEncoding) -> Self {
        Self {
            api,
            schema: vec![
                ImportFieldSpec::required("date", "Date"),
                ImportFieldSpec::required("amount", "Amount"),
                ImportFieldSpec::required("category", "Category"),
                ImportFieldSpec::optional("payee", "Payee"),
                ImportFieldSpec::optional("reference", "Reference"),
                ImportFieldSpec::optional("description", "Description"),
            ],
            note_encoding,
        }
    }

    pub fn to_body(&self, record: &ImportRecord) -> Result<GeneralExpenseCreateBody, ClientError> {
        Ok(GeneralExpenseCreateBody {
            date: require_date(record, "date")?,
            amount: require_amount(record, "amount")?,
            category: require_text(record, "category")?,
            note: NoteFields::from_record(record, GENERAL_EXPENSE_NOTE_KEYS)
                .encode(self.note_encoding),
        })
    }
}

#[async_trait]
impl ImportStrategy for GeneralExpenseImportStrategy {
    fn entity(&self) -> EntityKind {
        EntityKind::GeneralExpenses
    }

    fn schema(&self) -> &[ImportFieldSpec] {
        &self.schema
    }

    fn validate(&self, record: &ImportRecord) -> Option<String> {
        join_errors([
            check_not_blank(record, &self.schema),
            check_date(record, "date"),
            check_positive_amount(record, "amount"),
        ])
    }

    async fn persist(&self, records: Vec<ImportRecord>) -> Result<(), ClientError> {
        submit(self.api.as_ref(), self.entity(), records, |r| self.to_body(r)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::strategies::test_support::{record, RecordingApi};
    use serde_json::json;

    #[tokio::test]
    async fn test_persist_body_shape() {
        let api = Arc::new(RecordingApi::default());
        let s = GeneralExpenseImportStrategy::new(api.clone(), NoteEncoding::Legacy);
        let r = record(&[
            ("date", "2024-05-01"),
            ("amount", "$1,200"),
            ("category", "Office"),
            ("payee", "City Power"),
            ("reference", "Bill; May"),
        ]);

        assert_eq!(s.validate(&r), None);
        s.persist(vec![r]).await.unwrap();

        let calls = api.calls();
        assert_eq!(calls[0].0, "general-expenses/bulk");
        assert_eq!(
            calls[0].1,
            json!([{
                "date": "2024-05-01",
                "amount": 1200.0,
                "category": "Office",
                "note": "payee:City Power; reference:Bill, May"
            }])
        );
    }

    #[test]
    fn test_note_omitted_without_side_data() {
        let s = GeneralExpenseImportStrategy::new(
            Arc::new(RecordingApi::default()),
            NoteEncoding::Json,
        );
        let r = record(&[("date", "2024-05-01"), ("amount", "5"), ("category", "Misc")]);
        assert_eq!(s.to_body(&r).unwrap().note, None);
    }

    #[test]
    fn test_negative_amount_rejected() {
        let s = GeneralExpenseImportStrategy::new(
            Arc::new(RecordingApi::default()),
            NoteEncoding::Json,
        );
        let r = record(&[("date", "2024-05-01"), ("amount", "(20)"), ("category", "Misc")]);
        assert_eq!(
            s.validate(&r).as_deref(),
            Some("amount must be a positive number")
        );
    }
}
