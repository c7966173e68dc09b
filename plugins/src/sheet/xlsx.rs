//! xlsx 读写：calamine 负责读取，rust_xlsxwriter 负责生成报告

use std::path::Path;

use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use evalcmp_core::error::SheetError;
use evalcmp_core::sheet::{
    Cell, CellStyle, ScoredRow, Sheet, SheetCodec, Workbook, SCORED_SHEET_NAME,
};
use rust_xlsxwriter::{Format, FormatAlign, Workbook as XlsxWorkbook, Worksheet, XlsxError};
use serde_json::{Number, Value};

pub struct XlsxSheetCodec {}

impl XlsxSheetCodec {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for XlsxSheetCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SheetCodec for XlsxSheetCodec {
    fn name(&self) -> &str {
        "xlsx"
    }

    async fn read_rows(&self, path: &Path) -> Result<Vec<ScoredRow>, SheetError> {
        let path = path.to_path_buf();
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(SheetError::FileMissing(path));
        }
        let worker_path = path.clone();
        tokio::task::spawn_blocking(move || read_rows_blocking(&worker_path))
            .await
            .map_err(|e| SheetError::Decode {
                path,
                reason: e.to_string(),
            })?
    }

    async fn encode(&self, workbook: &Workbook) -> Result<Vec<u8>, SheetError> {
        let workbook = workbook.clone();
        tokio::task::spawn_blocking(move || encode_blocking(&workbook))
            .await
            .map_err(|e| SheetError::Encode(e.to_string()))?
    }
}

/// Rows of the scored sheet if present, otherwise of the first sheet. The
/// header row supplies the keys; empty cells leave the key out.
fn read_rows_blocking(path: &Path) -> Result<Vec<ScoredRow>, SheetError> {
    let decode = |reason: String| SheetError::Decode {
        path: path.to_path_buf(),
        reason,
    };

    let mut book = open_workbook_auto(path).map_err(|e| decode(e.to_string()))?;
    let names = book.sheet_names();
    let name = names
        .iter()
        .find(|n| n.as_str() == SCORED_SHEET_NAME)
        .or_else(|| names.first())
        .cloned()
        .ok_or_else(|| SheetError::NoSheet(path.to_path_buf()))?;
    let range = book
        .worksheet_range(&name)
        .map_err(|e| decode(e.to_string()))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let keys: Vec<Option<String>> = header
        .iter()
        .map(|c| match c {
            Data::Empty => None,
            other => Some(other.to_string().trim().to_string()).filter(|k| !k.is_empty()),
        })
        .collect();

    let mut out = Vec::new();
    for cells in rows {
        let mut row = ScoredRow::new();
        for (key, cell) in keys.iter().zip(cells.iter()) {
            let Some(key) = key else { continue };
            if let Some(value) = cell_value(cell) {
                row.insert(key.clone(), value);
            }
        }
        if !row.is_empty() {
            out.push(row);
        }
    }
    tracing::debug!(target: "evalcmp.sheet", path = %path.display(), sheet = %name, rows = out.len(), "sheet read");
    Ok(out)
}

fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) => Some(float_value(*f)),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::String(s) => Some(Value::String(s.clone())),
        other => Some(Value::String(other.to_string())),
    }
}

/// xlsx 只存 f64，整数值还原为整数，避免 "1.0" 这种显示
fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        return Value::from(f as i64);
    }
    Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(f.to_string()))
}

fn encode_blocking(workbook: &Workbook) -> Result<Vec<u8>, SheetError> {
    let mut book = XlsxWorkbook::new();
    for sheet in &workbook.sheets {
        let ws = book.add_worksheet();
        write_sheet(ws, sheet).map_err(|e| SheetError::Encode(e.to_string()))?;
    }
    book.save_to_buffer()
        .map_err(|e| SheetError::Encode(e.to_string()))
}

fn write_sheet(ws: &mut Worksheet, sheet: &Sheet) -> Result<(), XlsxError> {
    ws.set_name(&sheet.name)?;

    for (r, row) in sheet.rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let Some(cell) = cell else { continue };
            let (r, c) = (r as u32, c as u16);
            let fmt = format_for(cell.style);
            match &cell.value {
                Cell::Text(s) => ws.write_string_with_format(r, c, s, &fmt)?,
                Cell::Number(n) => ws.write_number_with_format(r, c, *n, &fmt)?,
                Cell::Empty => ws.write_blank(r, c, &fmt)?,
            };
        }
    }

    // merge_range rewrites the anchor cell, so carry its text and style over
    for m in &sheet.merges {
        let anchor = sheet.cell(m.first_row, m.first_col);
        let text = sheet.text_at(m.first_row, m.first_col).unwrap_or_default();
        let fmt = format_for(anchor.map(|c| c.style).unwrap_or(CellStyle::PLAIN));
        ws.merge_range(m.first_row, m.first_col, m.last_row, m.last_col, &text, &fmt)?;
    }

    for (c, width) in sheet.column_widths.iter().enumerate() {
        ws.set_column_width(c as u16, *width)?;
    }
    Ok(())
}

fn format_for(style: CellStyle) -> Format {
    let mut fmt = Format::new();
    if style.bold {
        fmt = fmt.set_bold();
    }
    if let Some(size) = style.font_size {
        fmt = fmt.set_font_size(size);
    }
    if style.centered {
        fmt = fmt.set_align(FormatAlign::Center);
    }
    fmt
}
