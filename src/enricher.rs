use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn, debug};

use crate::api::FinancialDataProvider;
use crate::models::{CellValue, EIN_COLUMN, OUTPUT_COLUMNS};
use crate::workbook::{self, SheetTable};

/// Fatal conditions that abort an enrichment run
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("failed to load workbook {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },

    #[error("sheet {0} not found in the Excel file")]
    SheetNotFound(String),

    #[error("the sheet must contain a column named '{0}'")]
    MissingColumn(String),

    #[error("failed to save workbook {}: {message}", .path.display())]
    Save { path: PathBuf, message: String },
}

/// Outcome of a completed run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentSummary {
    pub total_rows: usize,
    pub enriched_rows: usize,
    pub skipped_rows: usize,
    pub missing_data_rows: usize,
    pub added_columns: Vec<String>,
}

/// Fill the financial columns of `sheet_name` in the workbook at `file_path`
/// and save it in place.
///
/// The file is only written once every row has been processed; fatal errors
/// before that point leave it untouched.
pub async fn enrich<P>(
    file_path: impl AsRef<Path>,
    sheet_name: &str,
    provider: &P,
) -> Result<EnrichmentSummary, EnrichError>
where
    P: FinancialDataProvider + Sync + ?Sized,
{
    let file_path = file_path.as_ref();
    info!("📊 Loading workbook {}", file_path.display());

    let mut book = workbook::load_workbook(file_path).map_err(|e| EnrichError::Load {
        path: file_path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sheet = book
        .get_sheet_by_name(sheet_name)
        .ok_or_else(|| EnrichError::SheetNotFound(sheet_name.to_string()))?;

    let mut table = SheetTable::from_worksheet(sheet);
    if !table.has_column(EIN_COLUMN) {
        return Err(EnrichError::MissingColumn(EIN_COLUMN.to_string()));
    }

    let mut summary = EnrichmentSummary {
        total_rows: table.rows().len(),
        ..Default::default()
    };

    for column in OUTPUT_COLUMNS {
        if table.ensure_column(column) {
            debug!("Added column {}", column);
            summary.added_columns.push(column.to_string());
        }
    }

    info!("🔄 Processing {} rows from sheet {}", summary.total_rows, sheet_name);

    for row in table.rows_mut() {
        let Some(ein) = row.get(EIN_COLUMN).as_identifier() else {
            warn!("Skipping row {} due to missing EIN.", row.sheet_row);
            set_outputs(row, [CellValue::not_available(), CellValue::not_available(), CellValue::not_available()]);
            summary.skipped_rows += 1;
            continue;
        };

        match provider.fetch_financials(&ein).await {
            Some(record) => {
                debug!("Row {} (EIN {}): {:?}", row.sheet_row, ein, record);
                set_outputs(row, record.output_values());
                summary.enriched_rows += 1;
            }
            None => {
                warn!("No data found for EIN {}. Writing N/A.", ein);
                set_outputs(row, [CellValue::not_available(), CellValue::not_available(), CellValue::not_available()]);
                summary.missing_data_rows += 1;
            }
        }
    }

    let sheet = book
        .get_sheet_by_name_mut(sheet_name)
        .ok_or_else(|| EnrichError::SheetNotFound(sheet_name.to_string()))?;
    table
        .write_columns(sheet, &OUTPUT_COLUMNS)
        .map_err(|e| EnrichError::Save {
            path: file_path.to_path_buf(),
            message: e.to_string(),
        })?;

    workbook::save_workbook(&book, file_path).map_err(|e| EnrichError::Save {
        path: file_path.to_path_buf(),
        message: e.to_string(),
    })?;

    info!("✅ Data successfully updated in {}.", file_path.display());
    Ok(summary)
}

fn set_outputs(row: &mut workbook::Row, values: [CellValue; 3]) {
    for (column, value) in OUTPUT_COLUMNS.iter().zip(values) {
        row.set(column, value);
    }
}
