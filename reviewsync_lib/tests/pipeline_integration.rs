use std::time::Duration;

use chrono::NaiveDate;
use reviewsync_lib::{
    aggregate_source, run_ingest, Db, Source, StopReason, WriteMode,
};
use reviewsync_scrape::{RetryPolicy, ScrapeClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 28).unwrap()
}

fn listing_html(reviews: &[(&str, u8, &str, &str)]) -> String {
    let mut out = String::from("<html><body>");
    for (author, rating, date, body) in reviews {
        out.push_str(&format!(
            r#"<div data-review-id="x">
                 <h3>{author}</h3>
                 <span aria-label="{rating} out of 5 stars"></span>
                 <time datetime="{date}">{date}</time>
                 <p class="review-content">{body}</p>
               </div>"#
        ));
    }
    out.push_str("</body></html>");
    out
}

const EMPTY_PAGE: &str = "<html><body><p>No more reviews.</p></body></html>";

fn test_source(base: &str) -> Source {
    let raw = format!(
        r#"
        [[sources]]
        id = "acme"
        base_url = "{base}/apps/acme/reviews"
        summary_url = "{base}/apps/acme"
        retention_days = 27
        max_pages = 10
        page_delay_ms = 0
        mode = "merge"
        "#
    );
    reviewsync_lib::SourcesFile::parse(&raw)
        .unwrap()
        .sources
        .remove(0)
}

fn fast_client() -> ScrapeClient {
    ScrapeClient::with_retry(RetryPolicy {
        max_attempts: 2,
        base_delay: Duration::from_millis(5),
        rate_limit_factor: 2,
    })
    .unwrap()
}

async fn mount_page(server: &MockServer, page: &str, body: &str, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/apps/acme/reviews"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn first_old_record_stops_the_run_before_page_two() {
    let server = MockServer::start().await;
    // Cutoff is 2025-07-01: the third record is older and must terminate
    // the run mid-page.
    let page1 = listing_html(&[
        ("Maple Goods", 5, "2025-07-28", "Setup took five minutes and worked."),
        ("Harbor Trading", 4, "2025-07-20", "Solid feature set for the price."),
        ("Old World Curios", 2, "2025-06-25", "Stopped syncing after the update."),
    ]);
    mount_page(&server, "1", &page1, 1).await;
    mount_page(&server, "2", EMPTY_PAGE, 0).await;

    let source = test_source(&server.uri());
    let outcome = run_ingest(&fast_client(), &source, today()).await.unwrap();

    assert_eq!(outcome.stop, StopReason::CutoffReached);
    assert_eq!(outcome.pages_fetched, 1);
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.records[1].author, "Harbor Trading");
}

#[tokio::test]
async fn empty_page_ends_pagination() {
    let server = MockServer::start().await;
    let page1 = listing_html(&[
        ("Maple Goods", 5, "2025-07-28", "Setup took five minutes and worked."),
    ]);
    mount_page(&server, "1", &page1, 1).await;
    mount_page(&server, "2", EMPTY_PAGE, 1).await;

    let source = test_source(&server.uri());
    let outcome = run_ingest(&fast_client(), &source, today()).await.unwrap();

    assert_eq!(outcome.stop, StopReason::EndOfListing);
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test]
async fn page_ceiling_bounds_the_run() {
    let server = MockServer::start().await;
    let page = listing_html(&[
        ("Maple Goods", 5, "2025-07-28", "Setup took five minutes and worked."),
    ]);
    mount_page(&server, "1", &page, 1).await;
    mount_page(&server, "2", &page, 0).await;

    let mut source = test_source(&server.uri());
    source.max_pages = 1;
    let outcome = run_ingest(&fast_client(), &source, today()).await.unwrap();

    assert_eq!(outcome.stop, StopReason::PageLimit);
    assert_eq!(outcome.pages_fetched, 1);
}

#[tokio::test]
async fn fetch_failure_keeps_earlier_pages() {
    let server = MockServer::start().await;
    let page1 = listing_html(&[
        ("Maple Goods", 5, "2025-07-28", "Setup took five minutes and worked."),
    ]);
    mount_page(&server, "1", &page1, 1).await;
    Mock::given(method("GET"))
        .and(path("/apps/acme/reviews"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = test_source(&server.uri());
    let outcome = run_ingest(&fast_client(), &source, today()).await.unwrap();

    assert_eq!(outcome.stop, StopReason::FetchFailed);
    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test]
async fn merge_twice_against_unchanged_source_is_idempotent() {
    let server = MockServer::start().await;
    let page1 = listing_html(&[
        ("Maple Goods", 5, "2025-07-28", "Setup took five minutes and worked."),
        ("Harbor Trading", 4, "2025-07-20", "Solid feature set for the price."),
    ]);
    mount_page(&server, "1", &page1, 2).await;
    mount_page(&server, "2", EMPTY_PAGE, 2).await;

    let source = test_source(&server.uri());
    assert_eq!(source.mode, WriteMode::Merge);
    let client = fast_client();
    let db = Db::open_in_memory().unwrap();
    db.init().unwrap();

    let first = run_ingest(&client, &source, today()).await.unwrap();
    let w1 = db.merge_reviews(&first.records).unwrap();
    assert_eq!(w1.inserted, 2);

    let second = run_ingest(&client, &source, today()).await.unwrap();
    let w2 = db.merge_reviews(&second.records).unwrap();
    assert_eq!(w2.inserted, 0);
    assert_eq!(w2.duplicates, 2);
    assert_eq!(db.review_count("acme").unwrap(), 2);
}

#[tokio::test]
async fn replace_run_mirrors_current_listing() {
    let server = MockServer::start().await;
    let page1 = listing_html(&[
        ("Maple Goods", 5, "2025-07-28", "Setup took five minutes and worked."),
    ]);
    mount_page(&server, "1", &page1, 1).await;
    mount_page(&server, "2", EMPTY_PAGE, 1).await;

    let source = test_source(&server.uri());
    let mut db = Db::open_in_memory().unwrap();
    db.init().unwrap();
    // A record from an earlier run that has since aged off the listing.
    db.merge_reviews(&[reviewsync_lib::ReviewRecord {
        source_id: "acme".to_string(),
        author: "Gone Store".to_string(),
        country: "US".to_string(),
        rating: 3,
        body: "no longer visible on the source".to_string(),
        posted: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
    }])
    .unwrap();

    let outcome = run_ingest(&fast_client(), &source, today()).await.unwrap();
    db.replace_reviews(&source.id, &outcome.records).unwrap();

    assert_eq!(db.review_count("acme").unwrap(), 1);
    assert_eq!(db.rating_histogram("acme").unwrap(), [0, 0, 0, 0, 1]);
}

#[tokio::test]
async fn aggregate_prefers_summary_signals_with_stored_histogram() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apps/acme"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><h2>Reviews (1,284)</h2><span>4.6 out of 5</span></body></html>",
        ))
        .mount(&server)
        .await;

    let source = test_source(&server.uri());
    let db = Db::open_in_memory().unwrap();
    db.init().unwrap();
    db.merge_reviews(&[reviewsync_lib::ReviewRecord {
        source_id: "acme".to_string(),
        author: "Maple Goods".to_string(),
        country: "CA".to_string(),
        rating: 5,
        body: "Setup took five minutes and worked.".to_string(),
        posted: today(),
    }])
    .unwrap();

    let meta = aggregate_source(&fast_client(), &source, &db).await.unwrap();
    assert_eq!(meta.total_reviews, 1284);
    assert_eq!(meta.average_rating, 4.6);
    assert_eq!(meta.histogram, [0, 0, 0, 0, 1]);

    let stored = db.get_metadata("acme").unwrap().unwrap();
    assert_eq!(stored.total_reviews, 1284);
}

#[tokio::test]
async fn aggregate_falls_back_to_stored_rows_without_summary() {
    let server = MockServer::start().await;
    let mut source = test_source(&server.uri());
    source.summary_url = None;

    let db = Db::open_in_memory().unwrap();
    db.init().unwrap();
    for (i, rating) in [5u8, 4].iter().enumerate() {
        db.merge_reviews(&[reviewsync_lib::ReviewRecord {
            source_id: "acme".to_string(),
            author: format!("Store {}", i),
            country: "US".to_string(),
            rating: *rating,
            body: "a perfectly serviceable review".to_string(),
            posted: today(),
        }])
        .unwrap();
    }

    let meta = aggregate_source(&fast_client(), &source, &db).await.unwrap();
    assert_eq!(meta.total_reviews, 2);
    assert_eq!(meta.average_rating, 4.5);
}
