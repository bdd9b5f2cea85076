// ==========================================
// 工程 ERP 批量导入 - 应用层
// ==========================================
// 职责: 命令行外壳的运行环境（数据库位置等）
// ==========================================

use std::path::PathBuf;

/// 显式指定数据库路径的环境变量
pub const DB_PATH_ENV: &str = "ERP_BULK_IMPORT_DB_PATH";

const APP_DIR_NAME: &str = "erp-bulk-import";
const DB_FILE_NAME: &str = "import.db";

/// 获取默认数据库路径
///
/// # 返回
/// - 设置了 ERP_BULK_IMPORT_DB_PATH 时使用该路径
/// - 否则: 用户数据目录/erp-bulk-import/import.db
/// - 拿不到用户数据目录时: ./import.db
pub fn get_default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    match dirs::data_dir() {
        Some(data_dir) => data_dir.join(APP_DIR_NAME).join(DB_FILE_NAME),
        None => PathBuf::from(".").join(DB_FILE_NAME),
    }
}

/// 确保数据库所在目录存在
pub fn ensure_parent_dir(db_path: &std::path::Path) -> std::io::Result<()> {
    match db_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(path.to_string_lossy().ends_with(".db"));
    }

    #[test]
    fn test_ensure_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("import.db");
        ensure_parent_dir(&db_path).unwrap();
        assert!(db_path.parent().unwrap().is_dir());
    }
}
