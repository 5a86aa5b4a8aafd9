use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, error};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use grantee_enrich::api::CandidClient;
use grantee_enrich::{enrich, EnrichmentSummary};
use grantee_enrich::models::Config;

/// Grantee spreadsheet enrichment with Candid financial data
#[derive(Parser)]
#[command(name = "grantee-enrich")]
#[command(version = "0.1.0")]
#[command(about = "Fill contributions, government grants and total revenue columns of a grantee spreadsheet from the Candid API")]
#[command(long_about = "
Reads every row of the sheet, looks up the 'Organization: EIN' value against the
Candid Premier API and writes the most recent year's revenue figures back into
the same workbook. Rows without an EIN or without API data receive N/A.

The API key is read from CANDID_API_KEY (a .env file is honored). Other settings
default from CANDID_API_URL, CANDID_TIMEOUT_SECS, GRANTEE_FILE and GRANTEE_SHEET
and can be overridden with the flags below.

Examples:
  grantee-enrich                                  # use environment defaults
  grantee-enrich -f grantees.xlsx -s candid_data  # explicit file and sheet
  grantee-enrich -t 10                            # 10 second request timeout
")]
struct Args {
    /// Workbook to enrich in place
    #[arg(long, short = 'f', help = "Path of the xlsx workbook to update")]
    file: Option<String>,

    /// Sheet holding the grantee rows
    #[arg(long, short = 's', help = "Name of the sheet containing the 'Organization: EIN' column")]
    sheet: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, short = 't', help = "HTTP request timeout in seconds")]
    timeout_secs: Option<u64>,

    /// Base URL of the lookup API
    #[arg(long, help = "Override the Candid API base URL")]
    base_url: Option<String>,
}

impl Args {
    fn apply(self, mut config: Config) -> Result<Config> {
        if let Some(file) = self.file {
            config.file_path = file;
        }
        if let Some(sheet) = self.sheet {
            config.sheet_name = sheet;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(base_url) = self.base_url {
            config.candid_api_url = base_url;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("grantee_enrich=info")),
        )
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Failed to install logging subscriber");
    }

    let args = Args::parse();

    let config = match Config::from_env().and_then(|config| args.apply(config)) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("❌ Configuration Error: {}", e);
            eprintln!("Make sure CANDID_API_KEY is set in the environment or a .env file.");
            return ExitCode::FAILURE;
        }
    };

    match run(&config).await {
        Ok(summary) => {
            info!(
                "🎉 Processed {} rows: {} enriched, {} skipped, {} without data",
                summary.total_rows, summary.enriched_rows, summary.skipped_rows, summary.missing_data_rows
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("An error occurred: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Build the client and enrich the configured sheet; any error is fatal
async fn run(config: &Config) -> Result<EnrichmentSummary> {
    let client = CandidClient::new(config)?;
    let summary = enrich(&config.file_path, &config.sheet_name, &client).await?;
    Ok(summary)
}
