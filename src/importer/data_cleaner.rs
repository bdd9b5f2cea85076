// ==========================================
// 工程 ERP 批量导入 - 数据清洗工具
// ==========================================
// 职责: TRIM / NULL 标准化 / 金额解析 / 日期解析 / 枚举标准化
// 说明: 管道本身不做类型转换,这些工具供各实体的校验与提交使用
// ==========================================

use crate::domain::{ImportFieldSpec, ImportRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₱', '₹'];

/// 取字段并标准化 NULL（不存在/空白 → None）
pub fn field<'a>(record: &'a ImportRecord, key: &str) -> Option<&'a str> {
    record
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// 取字段文本（去首尾空白），空值返回 None
pub fn normalize_null(record: &ImportRecord, key: &str) -> Option<String> {
    field(record, key).map(str::to_string)
}

/// 解析金额
///
/// 支持: 千分位逗号、货币符号、会计负数 "(100)"
pub fn parse_amount(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .trim_start_matches(CURRENCY_SYMBOLS)
        .chars()
        .filter(|c| *c != ',' && *c != '_' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let amount = cleaned.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(if negative { -amount } else { amount })
}

/// 解析日期
///
/// 支持: YYYY-MM-DD / YYYY/MM/DD / YYYYMMDD / 带时间的 ISO 8601 / RFC 3339
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%Y.%m.%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

/// 枚举值标准化: 小写,空格/连字符 → 下划线
pub fn normalize_choice(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

// ==========================================
// 字段级校验（供各实体 validate 组合）
// ==========================================
// 返回 None 表示通过（或字段为空,必填检查由管道负责）

/// 必填字段不能只含空白（缺失/空串由管道的必填检查负责）
pub fn check_not_blank(record: &ImportRecord, fields: &[ImportFieldSpec]) -> Option<String> {
    join_errors(fields.iter().filter(|f| f.required).map(|f| {
        match record.get(&f.key) {
            Some(v) if !v.is_empty() && v.trim().is_empty() => {
                Some(format!("{} must not be blank", f.key))
            }
            _ => None,
        }
    }))
}

/// 正数金额
pub fn check_positive_amount(record: &ImportRecord, key: &str) -> Option<String> {
    let value = field(record, key)?;
    match parse_amount(value) {
        Some(v) if v > 0.0 => None,
        _ => Some(format!("{} must be a positive number", key)),
    }
}

/// 非负金额
pub fn check_non_negative_amount(record: &ImportRecord, key: &str) -> Option<String> {
    let value = field(record, key)?;
    match parse_amount(value) {
        Some(v) if v >= 0.0 => None,
        _ => Some(format!("{} must be a non-negative number", key)),
    }
}

/// 日期可解析
pub fn check_date(record: &ImportRecord, key: &str) -> Option<String> {
    let value = field(record, key)?;
    match parse_date(value) {
        Some(_) => None,
        None => Some(format!("{} must be a valid date (YYYY-MM-DD)", key)),
    }
}

/// 结束日期不早于开始日期（两者均可解析时才比较）
pub fn check_date_order(record: &ImportRecord, start_key: &str, end_key: &str) -> Option<String> {
    let start = field(record, start_key).and_then(parse_date)?;
    let end = field(record, end_key).and_then(parse_date)?;
    if end < start {
        Some(format!("{} must not precede {}", end_key, start_key))
    } else {
        None
    }
}

/// 枚举取值
pub fn check_choice(record: &ImportRecord, key: &str, allowed: &[&str]) -> Option<String> {
    let value = field(record, key)?;
    if allowed.contains(&normalize_choice(value).as_str()) {
        None
    } else {
        Some(format!("{} must be one of {}", key, allowed.join("/")))
    }
}

/// 合并多条校验结果
pub fn join_errors<I>(errors: I) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    let messages: Vec<String> = errors.into_iter().flatten().collect();
    if messages.is_empty() {
        None
    } else {
        Some(messages.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> ImportRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1000"), Some(1000.0));
        assert_eq!(parse_amount(" 1,250.50 "), Some(1250.5));
        assert_eq!(parse_amount("$2,000"), Some(2000.0));
        assert_eq!(parse_amount("(150)"), Some(-150.0));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_parse_date() {
        let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31);
        assert_eq!(parse_date("2024-01-31"), jan31);
        assert_eq!(parse_date("2024/01/31"), jan31);
        assert_eq!(parse_date("20240131"), jan31);
        assert_eq!(parse_date("2024-01-31 08:30:00"), jan31);
        assert_eq!(parse_date("2024-01-31T08:30:00Z"), jan31);
        assert_eq!(parse_date("31st January"), None);
    }

    #[test]
    fn test_normalize_choice() {
        assert_eq!(normalize_choice(" Bank Transfer "), "bank_transfer");
        assert_eq!(normalize_choice("bank-transfer"), "bank_transfer");
    }

    #[test]
    fn test_field_treats_blank_as_none() {
        let r = record(&[("a", "  "), ("b", " x ")]);
        assert_eq!(field(&r, "a"), None);
        assert_eq!(field(&r, "b"), Some("x"));
        assert_eq!(field(&r, "c"), None);
    }

    #[test]
    fn test_checks_skip_empty_values() {
        let r = record(&[("amount", "")]);
        assert_eq!(check_positive_amount(&r, "amount"), None);
        assert_eq!(check_date(&r, "date"), None);
    }

    #[test]
    fn test_check_not_blank_flags_whitespace_required_fields() {
        let fields = vec![
            ImportFieldSpec::required("projectId", "Project"),
            ImportFieldSpec::required("amount", "Amount"),
            ImportFieldSpec::required("date", "Date"),
            ImportFieldSpec::optional("category", "Category"),
        ];
        let r = record(&[
            ("projectId", "   "),
            ("amount", "\t"),
            ("date", ""),
            ("category", "  "),
        ]);
        assert_eq!(
            check_not_blank(&r, &fields).as_deref(),
            Some("projectId must not be blank, amount must not be blank")
        );

        let ok = record(&[("projectId", " p1 "), ("amount", "10")]);
        assert_eq!(check_not_blank(&ok, &fields), None);
    }

    #[test]
    fn test_check_date_order() {
        let r = record(&[("start", "2024-02-01"), ("end", "2024-01-31")]);
        assert_eq!(
            check_date_order(&r, "start", "end").as_deref(),
            Some("end must not precede start")
        );
    }

    #[test]
    fn test_join_errors() {
        assert_eq!(join_errors(vec![None, None]), None);
        assert_eq!(
            join_errors(vec![Some("a".to_string()), None, Some("b".to_string())]).as_deref(),
            Some("a, b")
        );
    }
}
