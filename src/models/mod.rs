use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Header of the column holding the lookup identifier
pub const EIN_COLUMN: &str = "Organization: EIN";

/// Output column for contributions revenue
pub const CONTRIBUTIONS_COLUMN: &str = "revenue_contributions";
/// Output column for government grants revenue
pub const GOVT_GRANTS_COLUMN: &str = "revenue_govt_grants";
/// Output column for total revenue
pub const TOTAL_COLUMN: &str = "revenue_total";

/// Output columns in the order they are appended when missing
pub const OUTPUT_COLUMNS: [&str; 3] = [CONTRIBUTIONS_COLUMN, GOVT_GRANTS_COLUMN, TOTAL_COLUMN];

/// Placeholder written when no real value is available
pub const NOT_AVAILABLE: &str = "N/A";

pub const DEFAULT_API_URL: &str = "https://api.candid.org/premier/v3";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_FILE_PATH: &str = "grantee_data.xlsx";
pub const DEFAULT_SHEET_NAME: &str = "candid_data";

/// A single spreadsheet cell value
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn not_available() -> Self {
        CellValue::Text(NOT_AVAILABLE.to_string())
    }

    /// True for cells that carry no usable identifier: empty cells,
    /// whitespace-only text, NaN and numeric zero.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            CellValue::Number(n) => n.is_nan() || *n == 0.0,
            CellValue::Bool(_) => false,
        }
    }

    /// Render the value as an identifier for use in a request path
    pub fn as_identifier(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        Some(self.to_string())
    }

    /// Convert a JSON field into a cell value; `null` maps to `None`
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(CellValue::Bool(*b)),
            Value::Number(n) => n.as_f64().map(CellValue::Number),
            Value::String(s) => Some(CellValue::Text(s.clone())),
            other => Some(CellValue::Text(other.to_string())),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => write!(f, "{}", text),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

/// Most recent fiscal year figures for one organization
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FinancialRecord {
    pub revenue_contributions: Option<CellValue>,
    pub revenue_govt_grants: Option<CellValue>,
    pub revenue_total: Option<CellValue>,
}

impl FinancialRecord {
    /// Extract the three figures from a `most_recent_year_financials` object
    pub fn from_financials(financials: &Map<String, Value>) -> Self {
        let field = |name: &str| financials.get(name).and_then(CellValue::from_json);

        Self {
            revenue_contributions: field("revenue_contributions"),
            revenue_govt_grants: field("revenue_govt_grants"),
            revenue_total: field("total_revenue"),
        }
    }

    /// Output cells in `OUTPUT_COLUMNS` order, with "N/A" for missing fields
    pub fn output_values(&self) -> [CellValue; 3] {
        let or_na = |value: &Option<CellValue>| value.clone().unwrap_or_else(CellValue::not_available);

        [
            or_na(&self.revenue_contributions),
            or_na(&self.revenue_govt_grants),
            or_na(&self.revenue_total),
        ]
    }
}

/// Candid Premier API response envelope
#[derive(Debug, Default, Deserialize)]
pub struct CandidResponse {
    #[serde(default)]
    pub data: Option<CandidData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidData {
    #[serde(default)]
    pub financials: Option<CandidFinancials>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidFinancials {
    #[serde(default)]
    pub most_recent_year_financials: Option<Map<String, Value>>,
}

impl CandidResponse {
    /// The `data.financials.most_recent_year_financials` object, if non-empty
    pub fn most_recent_year_financials(&self) -> Option<&Map<String, Value>> {
        self.data
            .as_ref()?
            .financials
            .as_ref()?
            .most_recent_year_financials
            .as_ref()
            .filter(|financials| !financials.is_empty())
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub candid_api_key: String,
    pub candid_api_url: String,
    pub request_timeout: Duration,
    pub file_path: String,
    pub sheet_name: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let config = Config {
            candid_api_key: std::env::var("CANDID_API_KEY")
                .map_err(|_| anyhow::anyhow!("CANDID_API_KEY environment variable required"))?,
            candid_api_url: std::env::var("CANDID_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            request_timeout: Duration::from_secs(
                std::env::var("CANDID_TIMEOUT_SECS")
                    .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
                    .parse()
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            file_path: std::env::var("GRANTEE_FILE")
                .unwrap_or_else(|_| DEFAULT_FILE_PATH.to_string()),
            sheet_name: std::env::var("GRANTEE_SHEET")
                .unwrap_or_else(|_| DEFAULT_SHEET_NAME.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Configuration with defaults for everything but the credential
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Config {
            candid_api_key: api_key.into(),
            candid_api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            file_path: DEFAULT_FILE_PATH.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.candid_api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("CANDID_API_KEY must not be empty"));
        }

        let url = url::Url::parse(&self.candid_api_url)
            .map_err(|e| anyhow::anyhow!("Invalid API URL {}: {}", self.candid_api_url, e))?;
        if url.cannot_be_a_base() {
            return Err(anyhow::anyhow!("API URL {} cannot be used as a base", self.candid_api_url));
        }

        Ok(())
    }
}
