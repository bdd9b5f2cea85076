// ==========================================
// 工程 ERP 批量导入 - 导入层
// ==========================================
// 职责: 表格文件 → 预览行 → 确认后一次性批量创建
// 流程: 解析 → 自动映射 → (人工覆写) → 逐行校验 → 确认提交
// 支持: Excel (xlsx/xlsm/xls/xlsb/ods), CSV
// ==========================================

// 模块声明
pub mod column_mapper;
pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod import_session;
pub mod importer_trait;
pub mod note_codec;
pub mod row_validator;
pub mod strategies;

// 重导出核心类型
pub use column_mapper::{apply_override, auto_map, normalize_header};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, ParsedSheet, UniversalFileParser};
pub use import_session::{ImportOutcome, ImportSession};
pub use note_codec::{NoteEncoding, NoteFields};
pub use row_validator::{materialize, RowValidationError, ROW_ERROR_PREFIX};
pub use strategies::{strategy_for, ReferenceEntry, ReferenceSet, StrategyOptions};

// 重导出 Trait 接口
pub use importer_trait::{FileParser, ImportStrategy};
