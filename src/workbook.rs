use std::collections::HashMap;
use std::path::Path;

use anyhow::{Result, anyhow};
use tracing::debug;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::models::CellValue;

static EMPTY_CELL: CellValue = CellValue::Empty;

/// One data row of a sheet, keyed by header name
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// 1-based row number in the worksheet
    pub sheet_row: u32,
    values: HashMap<String, CellValue>,
}

impl Row {
    pub fn new(sheet_row: u32) -> Self {
        Self { sheet_row, values: HashMap::new() }
    }

    /// Value of a column; missing columns read as `Empty`
    pub fn get(&self, column: &str) -> &CellValue {
        self.values.get(column).unwrap_or(&EMPTY_CELL)
    }

    pub fn set(&mut self, column: &str, value: CellValue) {
        self.values.insert(column.to_string(), value);
    }
}

/// Header row plus data rows of a worksheet
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl SheetTable {
    /// Read a worksheet treating the first row as column names
    pub fn from_worksheet(sheet: &Worksheet) -> Self {
        let (max_col, max_row) = sheet.get_highest_column_and_row();

        let headers: Vec<String> = (1..=max_col)
            .map(|col| read_cell(sheet, col, 1).to_string())
            .collect();

        let mut rows = Vec::new();
        for row_num in 2..=max_row {
            let mut row = Row::new(row_num);
            for (idx, header) in headers.iter().enumerate() {
                // First occurrence wins for duplicated headers
                if !row.values.contains_key(header) {
                    row.set(header, read_cell(sheet, idx as u32 + 1, row_num));
                }
            }
            rows.push(row);
        }

        debug!("Materialized {} columns and {} rows", headers.len(), rows.len());
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// 0-based position of the first column with this header
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Append a column defaulted to `Empty` unless it already exists.
    /// Returns true when the column was added.
    pub fn ensure_column(&mut self, name: &str) -> bool {
        if self.has_column(name) {
            return false;
        }

        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.set(name, CellValue::Empty);
        }
        true
    }

    /// Write the header and every data cell of the given columns into the sheet
    pub fn write_columns(&self, sheet: &mut Worksheet, columns: &[&str]) -> Result<()> {
        for name in columns {
            let col = self
                .column_index(name)
                .ok_or_else(|| anyhow!("Column {} is not part of the table", name))? as u32
                + 1;

            sheet.get_cell_mut((col, 1)).set_value_string(name.to_string());
            for row in &self.rows {
                write_cell(sheet, col, row.sheet_row, row.get(name));
            }
        }
        Ok(())
    }
}

/// Open an xlsx workbook
pub fn load_workbook(path: impl AsRef<Path>) -> Result<Spreadsheet> {
    umya_spreadsheet::reader::xlsx::read(path.as_ref())
        .map_err(|e| anyhow!("{:?}", e))
}

/// Save an xlsx workbook, replacing the file
pub fn save_workbook(book: &Spreadsheet, path: impl AsRef<Path>) -> Result<()> {
    umya_spreadsheet::writer::xlsx::write(book, path.as_ref())
        .map_err(|e| anyhow!("{:?}", e))
}

fn read_cell(sheet: &Worksheet, col: u32, row: u32) -> CellValue {
    let Some(cell) = sheet.get_cell((col, row)) else {
        return CellValue::Empty;
    };

    if let Some(number) = cell.get_value_number() {
        return CellValue::Number(number);
    }

    let text = cell.get_value();
    if text.is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(text.to_string())
    }
}

fn write_cell(sheet: &mut Worksheet, col: u32, row: u32, value: &CellValue) {
    match value {
        CellValue::Empty => {}
        CellValue::Text(text) => {
            sheet.get_cell_mut((col, row)).set_value_string(text.clone());
        }
        CellValue::Number(number) => {
            sheet.get_cell_mut((col, row)).set_value_number(*number);
        }
        CellValue::Bool(b) => {
            sheet.get_cell_mut((col, row)).set_value_bool(*b);
        }
    }
}
