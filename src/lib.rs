pub mod api;
pub mod enricher;
pub mod models;
pub mod workbook;

pub use enricher::{enrich, EnrichError, EnrichmentSummary};
