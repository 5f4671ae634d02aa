use std::time::Duration;

use mailscout_core::config::PipelineConfig;
use mailscout_core::error::AppError;
use mailscout_core::models::{LocationQuery, PlaceCandidate};
use mailscout_core::pipeline::EmailPipeline;
use mailscout_core::testutil::{MockPageFetcher, MockPlaceSearch, MockReporter};
use mailscout_core::traits::AddressBookFactory;
use mailscout_db::Database;
use tokio_util::sync::CancellationToken;

use crate::integration::common::setup_test_db;

fn austin_search() -> MockPlaceSearch {
    MockPlaceSearch::new().with_results(
        "bakery in Austin, TX",
        vec![
            PlaceCandidate::new("bakery1", "1 Congress Ave, Austin, TX", "bakery1.com"),
            PlaceCandidate::new("bakery2", "2 Lamar Blvd, Austin, TX", ""),
        ],
    )
}

fn bakery_pages() -> MockPageFetcher {
    MockPageFetcher::new().with_page(
        "bakery1.com",
        r#"<footer>hello@bakery1.com <img src="logo@2x.png"></footer>"#,
    )
}

async fn run_once(
    search: MockPlaceSearch,
    fetcher: MockPageFetcher,
    db: &Database,
) -> mailscout_core::models::RunSummary {
    EmailPipeline::new(
        search,
        fetcher,
        db.clone(),
        PipelineConfig::new("test-key", "bakery"),
    )
    .run(
        &[LocationQuery::new("Austin", "TX")],
        &MockReporter::new(),
        &CancellationToken::new(),
    )
    .await
}

#[tokio::test]
async fn bakery_scenario_persists_one_row() {
    let (db, _dir) = setup_test_db();

    let summary = run_once(austin_search(), bakery_pages(), &db).await;

    let book = db.open().await.unwrap();
    let rows = book.list(10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].business_name, "bakery1");
    assert_eq!(rows[0].business_address, "1 Congress Ave, Austin, TX");
    assert_eq!(rows[0].business_website, "bakery1.com");
    assert_eq!(rows[0].email_address, "hello@bakery1.com");
    assert!(!rows[0].email_sent);
    assert_eq!(summary.emails_stored, 1);
}

#[tokio::test]
async fn rerun_leaves_row_count_unchanged() {
    let (db, _dir) = setup_test_db();

    let first = run_once(austin_search(), bakery_pages(), &db).await;
    let second = run_once(austin_search(), bakery_pages(), &db).await;

    let book = db.open().await.unwrap();
    assert_eq!(book.count().await.unwrap(), 1);
    assert_eq!(first.emails_stored, 1);
    assert_eq!(second.emails_stored, 0);
    assert_eq!(second.emails_ignored, 1);
}

#[tokio::test]
async fn fetch_timeout_stores_nothing_for_that_candidate() {
    let (db, _dir) = setup_test_db();
    let search = MockPlaceSearch::new().with_results(
        "bakery in Austin, TX",
        vec![
            PlaceCandidate::new("slow", "", "slow.example"),
            PlaceCandidate::new("fast", "", "fast.example"),
        ],
    );
    let fetcher = MockPageFetcher::new()
        .with_error("slow.example", AppError::Timeout(Duration::from_secs(10)))
        .with_page("fast.example", "contact: team@fast.example");

    let summary = run_once(search, fetcher, &db).await;

    let book = db.open().await.unwrap();
    let rows = book.list(10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].business_name, "fast");
    assert_eq!(summary.fetch_failures, 1);
    assert_eq!(summary.pages_fetched, 1);
}

#[tokio::test]
async fn mixed_case_addresses_are_stored_lowercase_once() {
    let (db, _dir) = setup_test_db();
    let search = MockPlaceSearch::new().with_results(
        "bakery in Austin, TX",
        vec![PlaceCandidate::new("bakery1", "", "bakery1.com")],
    );
    let fetcher = MockPageFetcher::new()
        .with_page("bakery1.com", "Hello@Bakery1.com or hello@bakery1.com");

    run_once(search, fetcher, &db).await;

    let book = db.open().await.unwrap();
    let rows = book.list(10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].email_address, "hello@bakery1.com");
}
