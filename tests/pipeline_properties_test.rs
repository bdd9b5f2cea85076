// ==========================================
// 映射/校验管道性质测试
// ==========================================
// 工具: proptest
// 测试目标: auto_map / materialize 对任意表头与行数据的不变量
// ==========================================

use erp_bulk_import::domain::{ImportFieldSpec, RawSheetRow};
use erp_bulk_import::importer::{auto_map, materialize, normalize_header, ROW_ERROR_PREFIX};
use proptest::prelude::*;

fn payment_fields() -> Vec<ImportFieldSpec> {
    vec![
        ImportFieldSpec::required("invoice_id", "Invoice"),
        ImportFieldSpec::required("amount", "Amount"),
        ImportFieldSpec::required("payment_date", "Payment Date"),
        ImportFieldSpec::optional("method", "Method"),
        ImportFieldSpec::optional("reference", "Reference"),
    ]
}

fn header_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Invoice".to_string()),
        Just(" amount ".to_string()),
        Just("PAYMENT DATE".to_string()),
        Just("payment_date".to_string()),
        Just("Method".to_string()),
        Just("Notes".to_string()),
        "[A-Za-z ]{1,12}",
    ]
}

fn value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("0".to_string()),
        Just("FALSE".to_string()),
        "[a-z0-9]{1,8}",
    ]
}

proptest! {
    #[test]
    fn normalize_header_is_idempotent(text in "\\PC{0,20}") {
        let once = normalize_header(&text);
        prop_assert_eq!(normalize_header(&once), once.clone());
        prop_assert!(!once.chars().any(char::is_whitespace));
    }

    #[test]
    fn auto_map_picks_first_matching_header(
        headers in prop::collection::vec(header_strategy(), 0..8)
    ) {
        let fields = payment_fields();
        let mapping = auto_map(&headers, &fields);

        // 确定性
        prop_assert_eq!(&auto_map(&headers, &fields), &mapping);

        for field in &fields {
            let key = normalize_header(&field.key);
            let label = normalize_header(&field.label);
            let first = headers.iter().find(|h| {
                let n = normalize_header(h);
                n == key || n == label
            });
            prop_assert_eq!(mapping.get(&field.key), first.map(String::as_str));
        }
    }

    #[test]
    fn materialize_flags_exactly_rows_missing_required_values(
        values in prop::collection::vec(prop::collection::vec(value_strategy(), 5), 0..20)
    ) {
        let headers: Vec<String> = ["Invoice", "Amount", "Payment Date", "Method", "Reference"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let rows: Vec<RawSheetRow> = values
            .iter()
            .map(|cells| headers.iter().cloned().zip(cells.iter().cloned()).collect())
            .collect();
        let fields = payment_fields();
        let mapping = auto_map(&headers, &fields);

        let preview = materialize(&rows, &mapping, &fields, |_| None);
        prop_assert_eq!(preview.len(), rows.len());

        for (idx, (row, cells)) in preview.iter().zip(&values).enumerate() {
            prop_assert_eq!(row.row, idx + 2);
            let any_required_empty = cells[..3].iter().any(String::is_empty);
            prop_assert_eq!(row.is_valid(), !any_required_empty);
            if let Some(err) = &row.error {
                prop_assert!(err.starts_with(ROW_ERROR_PREFIX));
            }
        }

        // 纯函数: 相同输入得到相同预览
        prop_assert_eq!(materialize(&rows, &mapping, &fields, |_| None), preview);
    }
}
