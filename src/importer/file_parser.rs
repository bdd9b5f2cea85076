// ==========================================
// 工程 ERP 批量导入 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: Excel (.xlsx/.xlsm/.xls/.xlsb/.ods) / CSV (.csv)
// 规则:
// - 只读第一个工作表
// - 第一行为表头,空表头记为 COL<列号>（0 基）
// - 单元格一律按文本读取,缺失单元格为空串
// - 整行为空的数据行跳过
// ==========================================

use crate::domain::RawSheetRow;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto_from_rs, Data, DataType, Range, Reader};
use chrono::Timelike;
use csv::ReaderBuilder;
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 解析结果: 表头 + 数据行
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawSheetRow>,
}

impl ParsedSheet {
    /// 由表头单元格与数据单元格构造（两种格式共用）
    fn from_cells<I, R>(header_cells: Vec<String>, start_col: usize, data_rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = String>,
    {
        let headers: Vec<String> = header_cells
            .into_iter()
            .enumerate()
            .map(|(idx, text)| {
                if text.trim().is_empty() {
                    format!("COL{}", start_col + idx)
                } else {
                    text
                }
            })
            .collect();

        let rows = data_rows
            .into_iter()
            .map(|cells| {
                let mut cells = cells.into_iter();
                headers
                    .iter()
                    .map(|header| (header.clone(), cells.next().unwrap_or_default()))
                    .collect::<RawSheetRow>()
            })
            .filter(|row| !row.is_blank())
            .collect();

        Self { headers, rows }
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<ParsedSheet> {
        // 格式由内容自动识别（xls/xlsx/xlsb/ods）
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ParseError("工作簿中没有工作表".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ParseError(format!("无法读取工作表 {}: {}", sheet_name, e)))?;

        let sheet = sheet_from_range(&range);
        debug!(
            sheet = %sheet_name,
            columns = sheet.headers.len(),
            rows = sheet.rows.len(),
            "Excel 解析完成"
        );
        Ok(sheet)
    }
}

fn sheet_from_range(range: &Range<Data>) -> ParsedSheet {
    let start_col = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    let mut rows = range.rows();
    let header_cells: Vec<String> = match rows.next() {
        Some(cells) => cells.iter().map(cell_to_text).collect(),
        None => return ParsedSheet::default(),
    };

    ParsedSheet::from_cells(
        header_cells,
        start_col,
        rows.map(|cells| cells.iter().map(cell_to_text).collect::<Vec<_>>()),
    )
}

/// 单元格转文本；数值/日期的具体解释交给各实体的校验器
fn cell_to_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::DateTime(_) => match cell.as_datetime() {
            Some(dt) if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 => {
                dt.format("%Y-%m-%d").to_string()
            }
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => cell.to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<ParsedSheet> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        // 表头自行处理，以便统一空表头规则
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        let mut records: Vec<Vec<String>> = Vec::new();
        for result in reader.records() {
            let record = result?;
            records.push(record.iter().map(str::to_string).collect());
        }

        // 列宽取所有行的最大值，与工作表的已用区域一致
        let width = records.iter().map(Vec::len).max().unwrap_or(0);
        let mut records = records.into_iter();
        let mut header_cells = match records.next() {
            Some(cells) => cells,
            None => return Ok(ParsedSheet::default()),
        };
        header_cells.resize(width, String::new());

        let sheet = ParsedSheet::from_cells(header_cells, 0, records);
        debug!(
            columns = sheet.headers.len(),
            rows = sheet.rows.len(),
            "CSV 解析完成"
        );
        Ok(sheet)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parser_for(file_name: &str) -> ImportResult<Box<dyn FileParser>> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(Box::new(CsvParser)),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Box::new(ExcelParser)),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }

    /// 解析内存中的文件（上传场景）
    pub fn parse_bytes(&self, file_name: &str, bytes: &[u8]) -> ImportResult<ParsedSheet> {
        Self::parser_for(file_name)?.parse_bytes(bytes)
    }

    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ParsedSheet> {
        let path = file_path.as_ref();
        let name = path.to_string_lossy();
        Self::parser_for(&name)?.parse_file(path)
    }
}
