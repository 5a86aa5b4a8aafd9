use anyhow::{Result, anyhow};
use reqwest::{Client, header::{HeaderMap, HeaderValue, ACCEPT}};
use tracing::{info, warn, debug};

use crate::models::{CandidResponse, Config, FinancialRecord};
use super::FinancialDataProvider;

const SUBSCRIPTION_KEY_HEADER: &str = "Subscription-Key";

/// Candid Premier API client
pub struct CandidClient {
    client: Client,
    base_url: String,
    headers: HeaderMap,
}

impl CandidClient {
    /// Create a new Candid client
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            SUBSCRIPTION_KEY_HEADER,
            HeaderValue::from_str(&config.candid_api_key)
                .map_err(|e| anyhow!("CANDID_API_KEY is not a valid header value: {}", e))?,
        );

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent("grantee-enrich/1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: config.candid_api_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    /// Lookup URL for an identifier; the identifier is used verbatim
    pub fn lookup_url(&self, ein: &str) -> String {
        format!("{}/{}", self.base_url, ein)
    }

    /// Make authenticated request to the Candid API
    async fn make_request(&self, ein: &str) -> Result<CandidResponse> {
        let url = self.lookup_url(ein);
        debug!("Making request to: {}", url);

        let response = self.client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("API request failed with status {}: {}", status, error_text));
        }

        let body = response.text().await?;
        debug!("API response received: {} bytes", body.len());

        let parsed = serde_json::from_str::<CandidResponse>(&body)
            .map_err(|e| anyhow!("Invalid JSON in response: {}", e))?;
        Ok(parsed)
    }
}

#[async_trait::async_trait]
impl FinancialDataProvider for CandidClient {

    /// Get most recent year financials for an EIN
    async fn fetch_financials(&self, ein: &str) -> Option<FinancialRecord> {
        let response = match self.make_request(ein).await {
            Ok(response) => response,
            Err(e) => {
                warn!("❌ Error fetching data for EIN {}: {}", ein, e);
                return None;
            }
        };

        match response.most_recent_year_financials() {
            Some(financials) => Some(FinancialRecord::from_financials(financials)),
            None => {
                info!("No financial data available for EIN {}.", ein);
                None
            }
        }
    }
}
