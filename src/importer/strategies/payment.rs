// ==========================================
// 工程 ERP 批量导入 - 收款导入策略
// ==========================================
// 规则: amount > 0；payment_date 可解析；method 填写时取值受限
// 说明: 收款接口沿用 snake_case 字段名
// ==========================================

use crate::client::{BulkCreateApi, ClientError};
use crate::domain::{EntityKind, ImportFieldSpec, ImportRecord};
use crate::importer::data_cleaner::{
    check_choice, check_date, check_not_blank, check_positive_amount, join_errors,
    normalize_choice, normalize_null,
};
use crate::importer::importer_trait::ImportStrategy;
use crate::importer::strategies::{require_amount, require_date, require_text, submit};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

pub const PAYMENT_METHODS: &[&str] = &["cash", "bank_transfer", "cheque", "card", "other"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentCreateBody {
    pub invoice_id: String,
    pub amount: f64,
    pub payment_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

pub struct PaymentImportStrategy {
    api: Arc<dyn BulkCreateApi>,
    schema: Vec<ImportFieldSpec>,
}

impl PaymentImportStrategy {
    pub fn new(api: Arc<dyn BulkCreateApi>) -> Self {
        Self {
            api,
            schema: vec![
                ImportFieldSpec::required("invoice_id", "Invoice"),
                ImportFieldSpec::required("amount", "Amount"),
                ImportFieldSpec::required("payment_date", "Payment Date"),
                ImportFieldSpec::optional("method", "Method"),
                ImportFieldSpec::optional("reference", "Reference"),
            ],
        }
    }

    pub fn to_body(&self, record: &ImportRecord) -> Result<PaymentCreateBody, ClientError> {
        Ok(PaymentCreateBody {
            invoice_id: require_text(record, "invoice_id")?,
            amount: require_amount(record, "amount")?,
            payment_date: require_date(record, "payment_date")?,
            method: normalize_null(record, "method").map(|m| normalize_choice(&m)),
            reference: normalize_null(record, "reference"),
        })
    }
}

#[async_trait]
impl ImportStrategy for PaymentImportStrategy {
    fn entity(&self) -> EntityKind {
        EntityKind::Payments
    }

    fn schema(&self) -> &[ImportFieldSpec] {
        &self.schema
    }

    fn validate(&self, record: &ImportRecord) -> Option<String> {
        join_errors([
            check_not_blank(record, &self.schema),
            check_positive_amount(record, "amount"),
            check_date(record, "payment_date"),
            check_choice(record, "method", PAYMENT_METHODS),
        ])
    }

    async fn persist(&self, records: Vec<ImportRecord>) -> Result<(), ClientError> {
        submit(self.api.as_ref(), self.entity(), records, |r| self.to_body(r)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::column_mapper::auto_map;
    use crate::importer::strategies::test_support::{record, RecordingApi};
    use serde_json::json;

    #[test]
    fn test_label_auto_map() {
        let s = PaymentImportStrategy::new(Arc::new(RecordingApi::default()));
        let headers: Vec<String> = ["Payment Date", "Amount", "Method"]
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mapping = auto_map(&headers, s.schema());
        assert_eq!(mapping.get("payment_date"), Some("Payment Date"));
        assert_eq!(mapping.get("amount"), Some("Amount"));
        assert_eq!(mapping.get("invoice_id"), None);
    }

    #[test]
    fn test_validate_rules() {
        let s = PaymentImportStrategy::new(Arc::new(RecordingApi::default()));
        let r = record(&[
            ("invoice_id", "inv-1"),
            ("amount", "-10"),
            ("payment_date", "not a date"),
            ("method", "crypto"),
        ]);
        assert_eq!(
            s.validate(&r).as_deref(),
            Some(
                "amount must be a positive number, \
                 payment_date must be a valid date (YYYY-MM-DD), \
                 method must be one of cash/bank_transfer/cheque/card/other"
            )
        );
    }

    #[tokio::test]
    async fn test_persist_snake_case_body() {
        let api = Arc::new(RecordingApi::default());
        let s = PaymentImportStrategy::new(api.clone());
        let r = record(&[
            ("invoice_id", "inv-1"),
            ("amount", "300"),
            ("payment_date", "2024-06-15"),
            ("method", "Bank Transfer"),
        ]);

        s.persist(vec![r]).await.unwrap();

        assert_eq!(
            api.calls()[0],
            (
                "payments/bulk".to_string(),
                json!([{
                    "invoice_id": "inv-1",
                    "amount": 300.0,
                    "payment_date": "2024-06-15",
                    "method": "bank_transfer"
                }])
            )
        );
    }
}
