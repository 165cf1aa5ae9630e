// Tests for HttpDatasetSource
// Uses mockito for HTTP mocking

mod common;

use air_quality_dashboard::application::dataset_source::{DatasetError, DatasetSource};
use air_quality_dashboard::infrastructure::sources::HttpDatasetSource;
use common::daily_csv;
use mockito::Server;
use std::time::Duration;

fn create_test_source(url: String) -> HttpDatasetSource {
    HttpDatasetSource::new(url, Duration::from_secs(5)).expect("client should build")
}

#[tokio::test]
async fn test_fetch_csv_success() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/cleaned_data.csv")
        .with_status(200)
        .with_header("content-type", "text/csv")
        .with_body(daily_csv("Wanliu", &[Some(12.0), None, Some(30.0)]))
        .create_async()
        .await;

    let source = create_test_source(format!("{}/cleaned_data.csv", server.url()));
    let dataset = source.fetch().await.expect("fetch should succeed");

    assert_eq!(dataset.rows.len(), 3);
    assert!(dataset.unreadable.is_empty());
    assert_eq!(dataset.rows[0].station.as_deref(), Some("Wanliu"));
    assert_eq!(dataset.rows[2].row, 3);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_404_is_unavailable() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/gone.csv")
        .with_status(404)
        .create_async()
        .await;

    let url = format!("{}/gone.csv", server.url());
    let source = create_test_source(url.clone());

    match source.fetch().await {
        Err(DatasetError::Unavailable { location, reason }) => {
            assert_eq!(location, url);
            assert!(reason.contains("404"));
        }
        other => panic!("Expected Unavailable error, got {other:?}"),
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_without_station_column() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/bad.csv")
        .with_status(200)
        .with_body("year,month,day,hour,PM2.5\n2013,3,1,0,9\n")
        .create_async()
        .await;

    let source = create_test_source(format!("{}/bad.csv", server.url()));
    assert!(matches!(
        source.fetch().await,
        Err(DatasetError::MissingColumn("station"))
    ));
}

#[tokio::test]
async fn test_fetch_empty_body() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/empty.csv")
        .with_status(200)
        .with_body("")
        .create_async()
        .await;

    let source = create_test_source(format!("{}/empty.csv", server.url()));
    assert!(matches!(source.fetch().await, Err(DatasetError::Empty)));
    assert_eq!(source.location(), format!("{}/empty.csv", server.url()));
}
