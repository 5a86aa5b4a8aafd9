//! Integration tests for the Candid API client against a mock server

use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::api_mock::{self, client_for, financials_body};
use crate::common::logging::{init_test_logging, log_test_step, log_test_data};
use grantee_enrich::api::{CandidClient, FinancialDataProvider};
use grantee_enrich::models::{CellValue, Config, FinancialRecord};

#[tokio::test]
async fn test_fetch_extracts_most_recent_year_financials() {
    init_test_logging();
    log_test_step("Testing extraction of the three revenue figures");

    let server = MockServer::start().await;
    api_mock::mock_financials(&server, "123456789", financials_body(json!(1000), json!(500), json!(1600))).await;

    let record = client_for(&server).fetch_financials("123456789").await;
    log_test_data("Fetched record", &record);

    assert_eq!(record, Some(FinancialRecord {
        revenue_contributions: Some(CellValue::Number(1000.0)),
        revenue_govt_grants: Some(CellValue::Number(500.0)),
        revenue_total: Some(CellValue::Number(1600.0)),
    }));
}

#[tokio::test]
async fn test_fetch_passes_null_fields_through() {
    init_test_logging();

    let server = MockServer::start().await;
    api_mock::mock_financials(&server, "111111111", json!({
        "data": { "financials": { "most_recent_year_financials": {
            "revenue_contributions": null,
            "total_revenue": "2500"
        } } }
    })).await;

    let record = client_for(&server).fetch_financials("111111111").await.unwrap();

    assert_eq!(record.revenue_contributions, None);
    assert_eq!(record.revenue_govt_grants, None);
    assert_eq!(record.revenue_total, Some(CellValue::Text("2500".to_string())));
}

#[tokio::test]
async fn test_fetch_returns_none_on_not_found() {
    init_test_logging();

    let server = MockServer::start().await;
    api_mock::mock_status(&server, "000000000", 404).await;

    assert_eq!(client_for(&server).fetch_financials("000000000").await, None);
}

#[tokio::test]
async fn test_fetch_returns_none_on_server_error() {
    init_test_logging();

    let server = MockServer::start().await;
    api_mock::mock_status(&server, "222222222", 500).await;

    assert_eq!(client_for(&server).fetch_financials("222222222").await, None);
}

#[tokio::test]
async fn test_fetch_returns_none_on_malformed_body() {
    init_test_logging();

    let server = MockServer::start().await;
    api_mock::mock_raw(&server, "333333333", "<html>not json</html>").await;

    assert_eq!(client_for(&server).fetch_financials("333333333").await, None);
}

#[tokio::test]
async fn test_fetch_returns_none_when_financials_missing_or_empty() {
    init_test_logging();

    let server = MockServer::start().await;
    api_mock::mock_financials(&server, "444444444", json!({ "data": { "financials": {} } })).await;
    api_mock::mock_financials(&server, "555555555", json!({
        "data": { "financials": { "most_recent_year_financials": {} } }
    })).await;

    let client = client_for(&server);
    assert_eq!(client.fetch_financials("444444444").await, None);
    assert_eq!(client.fetch_financials("555555555").await, None);
}

#[tokio::test]
async fn test_fetch_sends_credential_headers() {
    init_test_logging();

    // The header matchers live in mock_financials; a request without them
    // falls through to wiremock's default 404.
    let server = MockServer::start().await;
    api_mock::mock_financials(&server, "666666666", financials_body(json!(1), json!(2), json!(3))).await;

    let mut config = Config::with_api_key("wrong-key");
    config.candid_api_url = server.uri();
    let wrong_client = CandidClient::new(&config).unwrap();

    assert_eq!(wrong_client.fetch_financials("666666666").await, None);
    assert!(client_for(&server).fetch_financials("666666666").await.is_some());
}

#[tokio::test]
async fn test_fetch_returns_none_on_timeout() {
    init_test_logging();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(financials_body(json!(1), json!(2), json!(3)))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let mut config = Config::with_api_key(api_mock::TEST_API_KEY);
    config.candid_api_url = server.uri();
    config.request_timeout = Duration::from_millis(200);
    let client = CandidClient::new(&config).unwrap();

    assert_eq!(client.fetch_financials("777777777").await, None);
}

#[tokio::test]
async fn test_fetch_returns_none_when_server_unreachable() {
    init_test_logging();

    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let mut config = Config::with_api_key(api_mock::TEST_API_KEY);
    config.candid_api_url = uri;
    let client = CandidClient::new(&config).unwrap();

    assert_eq!(client.fetch_financials("888888888").await, None);
}
