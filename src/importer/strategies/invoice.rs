// ==========================================
// 工程 ERP 批量导入 - 发票导入策略
// ==========================================
// 规则:
// - projectId / clientId 可解析（提供项目/客户列表时）
// - total > 0；issueDate/dueDate 可解析,dueDate 不早于 issueDate
// - quantity / unitPrice 填写时须为正数
// - status 取值 draft/sent/paid/overdue/cancelled,缺省 draft
// 明细: description / quantity / unitPrice 合成一条明细写入 itemsJson
// ==========================================

use crate::client::{BulkCreateApi, ClientError};
use crate::domain::{EntityKind, ImportFieldSpec, ImportRecord};
use crate::importer::data_cleaner::{
    check_choice, check_date, check_date_order, check_not_blank, check_positive_amount,
    join_errors, normalize_choice, normalize_null, parse_amount,
};
use crate::importer::importer_trait::ImportStrategy;
use crate::importer::note_codec::NoteFields;
use crate::importer::strategies::{
    optional_amount, optional_date, require_amount, require_date, require_text,
    resolve_reference, submit, ReferenceSet,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const INVOICE_STATUSES: &[&str] = &["draft", "sent", "paid", "overdue", "cancelled"];
pub const DEFAULT_INVOICE_STATUS: &str = "draft";

/// 明细在旧格式文本中的 key
pub const INVOICE_ITEM_KEYS: &[&str] = &["description", "quantity", "unitPrice"];

// ==========================================
// InvoiceLineItem - 发票明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
}

impl InvoiceLineItem {
    pub fn amount(&self) -> f64 {
        self.quantity * self.unit_price
    }

    /// 解析已有发票的 itemsJson
    ///
    /// 支持: JSON 数组 / 单个 JSON 对象 / 旧格式 "description:..; quantity:..; unitPrice:.."
    pub fn parse_items(text: &str) -> Vec<InvoiceLineItem> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        if let Ok(items) = serde_json::from_str::<Vec<InvoiceLineItem>>(trimmed) {
            return items;
        }
        if let Ok(item) = serde_json::from_str::<InvoiceLineItem>(trimmed) {
            return vec![item];
        }

        let fields = NoteFields::decode(trimmed, INVOICE_ITEM_KEYS);
        if fields.iter().next().is_none() {
            return Vec::new();
        }
        vec![InvoiceLineItem {
            description: fields.get("description").map(str::to_string),
            quantity: fields.get("quantity").and_then(parse_amount).unwrap_or(1.0),
            unit_price: fields.get("unitPrice").and_then(parse_amount).unwrap_or(0.0),
        }]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceCreateBody {
    pub project_id: String,
    pub client_id: String,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub total: f64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_json: Option<String>,
}

pub struct InvoiceImportStrategy {
    api: Arc<dyn BulkCreateApi>,
    schema: Vec<ImportFieldSpec>,
    projects: ReferenceSet,
    clients: ReferenceSet,
}

impl InvoiceImportStrategy {
    pub fn new(api: Arc<dyn BulkCreateApi>) -> Self {
        Self {
            api,
            schema: vec![
                ImportFieldSpec::required("projectId", "Project"),
                ImportFieldSpec::required("clientId", "Client"),
                ImportFieldSpec::required("invoiceNumber", "Invoice Number"),
                ImportFieldSpec::required("issueDate", "Issue Date"),
                ImportFieldSpec::optional("dueDate", "Due Date"),
                ImportFieldSpec::required("total", "Total"),
                ImportFieldSpec::optional("status", "Status"),
                ImportFieldSpec::optional("description", "Description"),
                ImportFieldSpec::optional("quantity", "Quantity"),
                ImportFieldSpec::optional("unitPrice", "Unit Price"),
            ],
            projects: ReferenceSet::default(),
            clients: ReferenceSet::default(),
        }
    }

    pub fn with_projects(mut self, projects: ReferenceSet) -> Self {
        self.projects = projects;
        self
    }

    pub fn with_clients(mut self, clients: ReferenceSet) -> Self {
        self.clients = clients;
        self
    }

    /// 由 description/quantity/unitPrice 合成明细；三者都为空时无明细
    fn line_item(record: &ImportRecord, total: f64) -> Result<Option<InvoiceLineItem>, ClientError> {
        let description = normalize_null(record, "description");
        let quantity = optional_amount(record, "quantity")?;
        let unit_price = optional_amount(record, "unitPrice")?;

        if description.is_none() && quantity.is_none() && unit_price.is_none() {
            return Ok(None);
        }

        let quantity = quantity.unwrap_or(1.0);
        Ok(Some(InvoiceLineItem {
            description,
            quantity,
            unit_price: unit_price.unwrap_or(total / quantity),
        }))
    }

    pub fn to_body(&self, record: &ImportRecord) -> Result<InvoiceCreateBody, ClientError> {
        let total = require_amount(record, "total")?;
        let items_json = match Self::line_item(record, total)? {
            Some(item) => Some(serde_json::to_string(&[item])?),
            None => None,
        };

        Ok(InvoiceCreateBody {
            project_id: resolve_reference(&self.projects, record, "projectId")?,
            client_id: resolve_reference(&self.clients, record, "clientId")?,
            invoice_number: require_text(record, "invoiceNumber")?,
            issue_date: require_date(record, "issueDate")?,
            due_date: optional_date(record, "dueDate")?,
            total,
            status: normalize_null(record, "status")
                .map(|s| normalize_choice(&s))
                .unwrap_or_else(|| DEFAULT_INVOICE_STATUS.to_string()),
            items_json,
        })
    }
}

#[async_trait]
impl ImportStrategy for InvoiceImportStrategy {
    fn entity(&self) -> EntityKind {
        EntityKind::Invoices
    }

    fn schema(&self) -> &[ImportFieldSpec] {
        &self.schema
    }

    fn validate(&self, record: &ImportRecord) -> Option<String> {
        join_errors([
            check_not_blank(record, &self.schema),
            self.projects.check(record, "projectId"),
            self.clients.check(record, "clientId"),
            check_date(record, "issueDate"),
            check_date(record, "dueDate"),
            check_date_order(record, "issueDate", "dueDate"),
            check_positive_amount(record, "total"),
            check_positive_amount(record, "quantity"),
            check_positive_amount(record, "unitPrice"),
            check_choice(record, "status", INVOICE_STATUSES),
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
    use crate::importer::strategies::ReferenceEntry;

    fn strategy() -> InvoiceImportStrategy {
        InvoiceImportStrategy::new(Arc::new(RecordingApi::default()))
            .with_projects(ReferenceSet::new(vec![ReferenceEntry {
                id: "p1".to_string(),
                name: "Harbor Tower".to_string(),
            }]))
            .with_clients(ReferenceSet::new(vec![ReferenceEntry {
                id: "c7".to_string(),
                name: "Northwind".to_string(),
            }]))
    }

    fn sample() -> ImportRecord {
        record(&[
            ("projectId", "Harbor Tower"),
            ("clientId", "northwind"),
            ("invoiceNumber", "INV-001"),
            ("issueDate", "2024-04-01"),
            ("dueDate", "2024-04-30"),
            ("total", "1500"),
            ("description", "Concrete pour"),
            ("quantity", "3"),
        ])
    }

    #[test]
    fn test_valid_invoice_resolves_names() {
        let s = strategy();
        assert_eq!(s.validate(&sample()), None);

        let body = s.to_body(&sample()).unwrap();
        assert_eq!(body.project_id, "p1");
        assert_eq!(body.client_id, "c7");
        assert_eq!(body.status, "draft");
    }

    #[test]
    fn test_unresolvable_references_and_total() {
        let s = strategy();
        let r = record(&[
            ("projectId", "p9"),
            ("clientId", "Contoso"),
            ("invoiceNumber", "INV-2"),
            ("issueDate", "2024-04-01"),
            ("total", "0"),
        ]);
        assert_eq!(
            s.validate(&r).as_deref(),
            Some(
                "projectId 'p9' not found, clientId 'Contoso' not found, \
                 total must be a positive number"
            )
        );
    }

    #[test]
    fn test_due_date_and_status_rules() {
        let s = strategy();
        let mut r = sample();
        r.insert("dueDate".to_string(), "2024-03-01".to_string());
        r.insert("status".to_string(), "void".to_string());
        assert_eq!(
            s.validate(&r).as_deref(),
            Some(
                "dueDate must not precede issueDate, \
                 status must be one of draft/sent/paid/overdue/cancelled"
            )
        );
    }

    #[test]
    fn test_items_json_round_trip() {
        let body = strategy().to_body(&sample()).unwrap();
        let items = InvoiceLineItem::parse_items(body.items_json.as_deref().unwrap());

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description.as_deref(), Some("Concrete pour"));
        assert_eq!(items[0].quantity, 3.0);
        assert_eq!(items[0].unit_price, 500.0);
        assert_eq!(items[0].amount(), 1500.0);
    }

    #[test]
    fn test_parse_legacy_items() {
        let items = InvoiceLineItem::parse_items("description:Rebar; quantity:2; unitPrice:40");
        assert_eq!(
            items,
            vec![InvoiceLineItem {
                description: Some("Rebar".to_string()),
                quantity: 2.0,
                unit_price: 40.0,
            }]
        );
        assert!(InvoiceLineItem::parse_items("").is_empty());
    }

    #[tokio::test]
    async fn test_persist_status_normalized() {
        let api = Arc::new(RecordingApi::default());
        let s = InvoiceImportStrategy::new(api.clone());
        let mut r = sample();
        r.insert("status".to_string(), " Sent ".to_string());
        r.remove("description");
        r.remove("quantity");

        s.persist(vec![r]).await.unwrap();

        let calls = api.calls();
        assert_eq!(calls[0].0, "invoices/bulk");
        let body = &calls[0].1[0];
        assert_eq!(body["status"], "sent");
        assert_eq!(body["projectId"], "Harbor Tower");
        assert!(body.get("itemsJson").is_none());
    }
}
