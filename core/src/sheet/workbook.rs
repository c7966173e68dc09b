//! 与具体文件格式无关的工作簿模型，由 `SheetCodec::encode` 负责序列化

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellStyle {
    pub bold: bool,
    pub font_size: Option<u8>,
    pub centered: bool,
}

impl CellStyle {
    pub const PLAIN: CellStyle = CellStyle {
        bold: false,
        font_size: None,
        centered: false,
    };

    pub const BOLD: CellStyle = CellStyle {
        bold: true,
        font_size: None,
        centered: false,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledCell {
    pub value: Cell,
    pub style: CellStyle,
}

/// Merged rectangle, zero-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeRange {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    /// Sparse grid; `rows[r][c]`. Rows grow on demand.
    pub rows: Vec<Vec<Option<StyledCell>>>,
    pub merges: Vec<MergeRange>,
    pub column_widths: Vec<f64>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            merges: Vec::new(),
            column_widths: Vec::new(),
        }
    }

    pub fn set(&mut self, row: u32, col: u16, value: impl Into<Cell>, style: CellStyle) {
        let (r, c) = (row as usize, col as usize);
        if self.rows.len() <= r {
            self.rows.resize_with(r + 1, Vec::new);
        }
        let line = &mut self.rows[r];
        if line.len() <= c {
            line.resize_with(c + 1, || None);
        }
        line[c] = Some(StyledCell {
            value: value.into(),
            style,
        });
    }

    /// Write `values` into the first empty row and return its index.
    pub fn append_row<I, C>(&mut self, values: I, style: CellStyle) -> u32
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        let row = self.rows.len() as u32;
        for (col, v) in values.into_iter().enumerate() {
            self.set(row, col as u16, v, style);
        }
        if self.rows.len() as u32 == row {
            self.rows.push(Vec::new());
        }
        row
    }

    pub fn merge(&mut self, range: MergeRange) {
        self.merges.push(range);
    }

    pub fn set_column_widths(&mut self, widths: &[f64]) {
        self.column_widths = widths.to_vec();
    }

    /// Number of rows in use, including empty padding rows.
    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&StyledCell> {
        self.rows
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .and_then(Option::as_ref)
    }

    /// Text of a cell for assertions and logging; numbers use their display form.
    pub fn text_at(&self, row: u32, col: u16) -> Option<String> {
        self.cell(row, col).map(|c| match &c.value {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Empty => String::new(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}
