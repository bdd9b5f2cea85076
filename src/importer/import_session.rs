// ==========================================
// 工程 ERP 批量导入 - 导入会话
// ==========================================
// 职责: 持有一次导入的内存状态（表头/映射/预览行）并负责确认提交
// 生命周期: 选择文件时新建 → 覆写映射时重算预览 → 确认成功或关闭时丢弃
// 约束:
// - 只提交校验通过的行,且每次确认只调用一次批量创建
// - 没有有效行时不调用批量创建
// - 批量创建失败时保留全部状态,可修正后再次确认（不自动重试）
// ==========================================

use crate::domain::{ColumnMapping, EntityKind, ImportRecord, MappedRow};
use crate::importer::column_mapper::{apply_override, auto_map};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{ParsedSheet, UniversalFileParser};
use crate::importer::importer_trait::ImportStrategy;
use crate::importer::row_validator::materialize;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

// ==========================================
// ImportOutcome - 确认提交结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub entity: EntityKind,
    pub file_name: Option<String>,
    pub total_rows: usize,
    pub imported: usize,
    pub skipped: usize,
    pub elapsed_ms: u64,
}

// ==========================================
// ImportSession - 导入会话
// ==========================================
pub struct ImportSession {
    strategy: Arc<dyn ImportStrategy>,
    parser: UniversalFileParser,
    max_rows: Option<usize>,

    // 当前文件状态
    file_name: Option<String>,
    sheet: Option<ParsedSheet>,
    mapping: ColumnMapping,
    preview: Vec<MappedRow>,
}

impl ImportSession {
    pub fn new(strategy: Arc<dyn ImportStrategy>) -> Self {
        Self {
            strategy,
            parser: UniversalFileParser,
            max_rows: None,
            file_name: None,
            sheet: None,
            mapping: ColumnMapping::default(),
            preview: Vec::new(),
        }
    }

    /// 单次导入的最大数据行数
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn entity(&self) -> EntityKind {
        self.strategy.entity()
    }

    pub fn strategy(&self) -> &Arc<dyn ImportStrategy> {
        &self.strategy
    }

    // ===== 阶段 0-2: 载入文件 =====

    /// 载入内存中的文件
    ///
    /// 解析失败时丢弃此前的全部状态
    pub fn load_bytes(&mut self, file_name: &str, bytes: &[u8]) -> ImportResult<()> {
        self.close();
        let sheet = self.parser.parse_bytes(file_name, bytes)?;
        self.open(file_name, sheet)
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, file_path: P) -> ImportResult<()> {
        self.close();
        let path = file_path.as_ref();
        let sheet = self.parser.parse(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        self.open(&file_name, sheet)
    }

    fn open(&mut self, file_name: &str, sheet: ParsedSheet) -> ImportResult<()> {
        if let Some(max) = self.max_rows {
            if sheet.rows.len() > max {
                warn!(file_name = %file_name, rows = sheet.rows.len(), max, "数据行超过上限");
                return Err(ImportError::TooManyRows {
                    count: sheet.rows.len(),
                    max,
                });
            }
        }

        self.mapping = auto_map(&sheet.headers, self.strategy.schema());
        info!(
            entity = %self.entity(),
            file_name = %file_name,
            headers = sheet.headers.len(),
            rows = sheet.rows.len(),
            mapped_fields = self.mapping.resolved().len(),
            "文件载入完成"
        );

        self.file_name = Some(file_name.to_string());
        self.sheet = Some(sheet);
        self.rematerialize();
        Ok(())
    }

    fn rematerialize(&mut self) {
        let strategy = &self.strategy;
        self.preview = match &self.sheet {
            Some(sheet) => materialize(&sheet.rows, &self.mapping, strategy.schema(), |record| {
                strategy.validate(record)
            }),
            None => Vec::new(),
        };
        debug!(
            valid = self.valid_count(),
            invalid = self.invalid_count(),
            "预览行已重算"
        );
    }

    // ===== 映射 =====

    /// 覆写单个字段的映射并重算预览
    ///
    /// # 参数
    /// - header: Some(表头) 指定列；None 取消映射
    pub fn set_mapping(&mut self, key: &str, header: Option<&str>) -> ImportResult<()> {
        let sheet = self.sheet.as_ref().ok_or(ImportError::NoFileLoaded)?;
        apply_override(
            &mut self.mapping,
            self.strategy.schema(),
            &sheet.headers,
            key,
            header,
        )?;
        debug!(key = %key, header = ?header, "映射已覆写");
        self.rematerialize();
        Ok(())
    }

    /// 撤销覆写,恢复自动映射
    pub fn reset_mapping(&mut self, key: &str) -> ImportResult<()> {
        if self.sheet.is_none() {
            return Err(ImportError::NoFileLoaded);
        }
        if self.mapping.clear_override(key) {
            self.rematerialize();
        }
        Ok(())
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    // ===== 预览 =====

    pub fn is_open(&self) -> bool {
        self.sheet.is_some()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn headers(&self) -> &[String] {
        self.sheet
            .as_ref()
            .map(|s| s.headers.as_slice())
            .unwrap_or(&[])
    }

    pub fn preview(&self) -> &[MappedRow] {
        &self.preview
    }

    pub fn total_rows(&self) -> usize {
        self.preview.len()
    }

    pub fn valid_count(&self) -> usize {
        self.preview.iter().filter(|r| r.is_valid()).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.total_rows() - self.valid_count()
    }

    /// 丢弃当前文件的全部状态
    pub fn close(&mut self) {
        self.file_name = None;
        self.sheet = None;
        self.mapping = ColumnMapping::default();
        self.preview.clear();
    }

    // ===== 阶段 3: 确认提交 =====

    /// 确认导入
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 成功,会话已关闭
    /// - Err(NoFileLoaded): 尚未载入文件
    /// - Err(EmptyImport): 没有有效行,未调用批量创建
    /// - Err(PersistError): 批量创建失败,会话保持打开
    #[instrument(skip(self), fields(entity = %self.strategy.entity()))]
    pub async fn confirm(&mut self) -> ImportResult<ImportOutcome> {
        let start_time = Instant::now();

        if self.sheet.is_none() {
            return Err(ImportError::NoFileLoaded);
        }

        let records: Vec<ImportRecord> = self
            .preview
            .iter()
            .filter(|row| row.is_valid())
            .map(|row| row.clone().into_record())
            .collect();
        let total_rows = self.preview.len();
        let skipped = total_rows - records.len();

        if records.is_empty() {
            warn!(invalid = skipped, "没有有效行,取消提交");
            return Err(ImportError::EmptyImport { invalid: skipped });
        }

        let imported = records.len();
        info!(imported, skipped, "提交批量创建");

        if let Err(e) = self.strategy.persist(records).await {
            error!(error = %e, "批量创建失败,保留预览以便重试");
            return Err(ImportError::PersistError(e));
        }

        let outcome = ImportOutcome {
            entity: self.entity(),
            file_name: self.file_name.clone(),
            total_rows,
            imported,
            skipped,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        };
        info!(
            imported = outcome.imported,
            skipped = outcome.skipped,
            elapsed_ms = outcome.elapsed_ms,
            "导入完成"
        );

        self.close();
        Ok(outcome)
    }
}
