use crate::models::FinancialRecord;

pub mod candid_client;
pub use candid_client::CandidClient;

/// Source of per-organization financial figures
///
/// Lookups never fail loudly: any transport, status or payload problem is
/// logged by the implementation and reported as `None`.
#[async_trait::async_trait]
pub trait FinancialDataProvider {
    async fn fetch_financials(&self, ein: &str) -> Option<FinancialRecord>;
}
