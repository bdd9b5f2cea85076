// ==========================================
// 导入会话集成测试
// ==========================================
// 测试目标: 文件 → 自动映射 → 覆写 → 预览 → 确认提交
// ==========================================


use erp_bulk_import::domain::EntityKind;
use erp_bulk_import::importer::{
    strategy_for, ImportError, ImportSession, NoteEncoding, ReferenceEntry, ReferenceSet,
    StrategyOptions,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;
use test_helpers::{write_csv, write_xlsx, Cell, MockBulkApi};

fn session_with(entity: EntityKind, api: Arc<MockBulkApi>, options: StrategyOptions) -> ImportSession {
    ImportSession::new(strategy_for(entity, api, &options))
}

fn session(entity: EntityKind, api: Arc<MockBulkApi>) -> ImportSession {
    session_with(entity, api, StrategyOptions::default())
}

#[tokio::test]
async fn test_budget_workbook_import_submits_valid_rows_once() {
    erp_bulk_import::logging::init_test();
    let dir = tempdir().unwrap();
    let path = write_xlsx(
        dir.path(),
        "budgets.xlsx",
        &["Project", "Period Start", "Period End", "Amount", "Category"],
        &[
            vec![
                Cell::Text("p1"),
                Cell::Date(2024, 1, 1),
                Cell::Date(2024, 1, 31),
                Cell::Number(1500.0),
                Cell::Text("Labour"),
            ],
            vec![
                Cell::Empty,
                Cell::Date(2024, 2, 1),
                Cell::Date(2024, 2, 29),
                Cell::Number(800.0),
                Cell::Empty,
            ],
            vec![
                Cell::Text("p2"),
                Cell::Date(2024, 3, 1),
                Cell::Date(2024, 3, 31),
                Cell::Number(2000.0),
                Cell::Empty,
            ],
        ],
    )
    .unwrap();

    let api = Arc::new(MockBulkApi::new());
    let mut session = session(EntityKind::Budgets, api.clone());
    session.load_file(&path).unwrap();

    assert_eq!(session.file_name(), Some("budgets.xlsx"));
    assert_eq!(session.total_rows(), 3);
    assert_eq!(session.valid_count(), 2);
    let invalid = &session.preview()[1];
    assert_eq!(invalid.row, 3);
    assert_eq!(invalid.error.as_deref(), Some("Missing/invalid: projectId"));

    let outcome = session.confirm().await.unwrap();
    assert_eq!(outcome.imported, 2);
    assert_eq!(outcome.skipped, 1);
    assert!(!session.is_open());

    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "budgets/bulk");
    assert_eq!(
        calls[0].1[0],
        json!({
            "projectId": "p1",
            "periodStart": "2024-01-01",
            "periodEnd": "2024-01-31",
            "amount": 1500.0,
            "category": "Labour"
        })
    );
    assert_eq!(calls[0].1[1]["projectId"], "p2");
}

#[tokio::test]
async fn test_payment_override_and_unmap() {
    let dir = tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "payments.csv",
        "Invoice,Amount,Paid On,Method\nINV-1,100,2024-02-01,Bank Transfer\n",
    )
    .unwrap();

    let api = Arc::new(MockBulkApi::new());
    let mut session = session(EntityKind::Payments, api.clone());
    session.load_file(&path).unwrap();

    // "Paid On" 不会被自动映射
    assert_eq!(session.mapping().get("payment_date"), None);
    assert_eq!(
        session.preview()[0].error.as_deref(),
        Some("Missing/invalid: payment_date")
    );

    session.set_mapping("payment_date", Some("Paid On")).unwrap();
    assert!(session.preview()[0].is_valid());

    session.set_mapping("method", None).unwrap();
    assert!(!session.preview()[0].record.contains_key("method"));

    assert!(matches!(
        session.set_mapping("payment_date", Some("Nope")),
        Err(ImportError::UnknownColumn(_))
    ));
    assert!(matches!(
        session.set_mapping("discount", Some("Amount")),
        Err(ImportError::UnknownField(_))
    ));

    session.confirm().await.unwrap();
    let payload = &api.calls()[0].1;
    assert_eq!(
        payload[0],
        json!({
            "invoice_id": "INV-1",
            "amount": 100.0,
            "payment_date": "2024-02-01"
        })
    );
}

#[tokio::test]
async fn test_persist_failure_keeps_preview_for_retry() {
    let dir = tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "general.csv",
        "Date,Amount,Category\n2024-05-01,120,Utilities\n",
    )
    .unwrap();

    let failing = Arc::new(MockBulkApi::failing(503));
    let mut session = session(EntityKind::GeneralExpenses, failing.clone());
    session.load_file(&path).unwrap();

    let err = session.confirm().await.unwrap_err();
    assert!(matches!(err, ImportError::PersistError(_)));
    assert!(session.is_open());
    assert_eq!(session.valid_count(), 1);
    assert_eq!(failing.call_count(), 1);

    // 再次确认会再次提交
    let _ = session.confirm().await;
    assert_eq!(failing.call_count(), 2);
}

#[tokio::test]
async fn test_all_invalid_rows_never_call_api() {
    let dir = tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "expenses.csv",
        "Project,Date,Amount,Category\np1,not-a-date,10,Fuel\np1,2024-01-02,-5,Fuel\n",
    )
    .unwrap();

    let api = Arc::new(MockBulkApi::new());
    let mut session = session(EntityKind::Expenses, api.clone());
    session.load_file(&path).unwrap();

    assert_eq!(session.invalid_count(), 2);
    assert!(matches!(
        session.confirm().await,
        Err(ImportError::EmptyImport { invalid: 2 })
    ));
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn test_expense_notes_follow_encoding() {
    let dir = tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "expenses.csv",
        "Project,Date,Amount,Category,Supplier,Invoice No\n\
         Harbor Tower,2024-03-05,250.75,Materials,Acme; Ltd,INV-42\n",
    )
    .unwrap();
    let projects = ReferenceSet::new(vec![ReferenceEntry {
        id: "p1".to_string(),
        name: "Harbor Tower".to_string(),
    }]);

    let api = Arc::new(MockBulkApi::new());
    let options = StrategyOptions {
        note_encoding: NoteEncoding::Legacy,
        projects,
        ..StrategyOptions::default()
    };
    let mut session = session_with(EntityKind::Expenses, api.clone(), options);
    session.load_file(&path).unwrap();
    session.confirm().await.unwrap();

    let body = &api.calls()[0].1[0];
    assert_eq!(body["projectId"], "p1");
    assert_eq!(body["note"], "supplier:Acme, Ltd; invoiceNo:INV-42");
}

#[tokio::test]
async fn test_invoice_line_item_and_default_status() {
    let dir = tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "invoices.csv",
        "Project,Client,Invoice Number,Issue Date,Due Date,Total,Description,Quantity\n\
         p1,c1,INV-100,2024-04-01,2024-04-30,900,Steel beams,3\n\
         p1,c1,INV-101,2024-04-01,2024-03-01,100,,\n",
    )
    .unwrap();

    let api = Arc::new(MockBulkApi::new());
    let mut session = session(EntityKind::Invoices, api.clone());
    session.load_file(&path).unwrap();

    assert_eq!(
        session.preview()[1].error.as_deref(),
        Some("Missing/invalid: dueDate must not precede issueDate")
    );

    session.confirm().await.unwrap();
    let body = &api.calls()[0].1[0];
    assert_eq!(body["status"], "draft");
    let items: serde_json::Value =
        serde_json::from_str(body["itemsJson"].as_str().unwrap()).unwrap();
    assert_eq!(
        items,
        json!([{ "description": "Steel beams", "quantity": 3.0, "unitPrice": 300.0 }])
    );
}

#[test]
fn test_row_limit_rejects_file() {
    let mut csv = String::from("Date,Amount,Category\n");
    for day in 1..=6 {
        csv.push_str(&format!("2024-01-0{},10,Fuel\n", day));
    }

    let mut session =
        session(EntityKind::GeneralExpenses, Arc::new(MockBulkApi::new())).with_max_rows(5);
    assert!(matches!(
        session.load_bytes("rows.csv", csv.as_bytes()),
        Err(ImportError::TooManyRows { count: 6, max: 5 })
    ));
    assert!(!session.is_open());
}

#[tokio::test]
async fn test_whitespace_only_required_cell_is_flagged_before_confirm() {
    let dir = tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "budgets.csv",
        "Project,Period Start,Period End,Amount\n\
         p1,2024-01-01,2024-01-31,100\n\
         \"   \",2024-02-01,2024-02-29,200\n",
    )
    .unwrap();

    let api = Arc::new(MockBulkApi::new());
    let mut session = session(EntityKind::Budgets, api.clone());
    session.load_file(&path).unwrap();

    assert_eq!(session.valid_count(), 1);
    assert_eq!(
        session.preview()[1].error.as_deref(),
        Some("Missing/invalid: projectId must not be blank")
    );

    let outcome = session.confirm().await.unwrap();
    assert_eq!(outcome.imported, 1);
    assert_eq!(outcome.skipped, 1);

    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1.as_array().unwrap().len(), 1);
    assert_eq!(calls[0].1[0]["projectId"], "p1");
}
