use std::pin::pin;

use futures::StreamExt;
use futures::stream;
use tokio_util::sync::CancellationToken;

use crate::config::PipelineConfig;
use crate::emails::extract_emails;
use crate::models::{EmailRecord, LocationQuery, PlaceCandidate, RunSummary, UpsertOutcome};
use crate::report::{PipelineEvent, PipelineReporter};
use crate::traits::{AddressBook, AddressBookFactory, PageFetcher, PlaceSearch};
use crate::util::normalize_url;

/// Orchestrates the extraction pipeline: search → fetch → extract → store.
///
/// Generic over all external dependencies via traits, enabling dependency
/// injection and testing without real HTTP, browsers or databases.
///
/// Failures are contained at the narrowest scope: a failed search yields no
/// candidates, a failed fetch yields no emails, a failed insert loses that
/// one email. None of them abort the run.
pub struct EmailPipeline<S, F, B>
where
    S: PlaceSearch,
    F: PageFetcher,
    B: AddressBookFactory,
{
    search: S,
    fetcher: F,
    books: B,
    config: PipelineConfig,
}

impl<S, F, B> EmailPipeline<S, F, B>
where
    S: PlaceSearch,
    F: PageFetcher,
    B: AddressBookFactory,
{
    pub fn new(search: S, fetcher: F, books: B, config: PipelineConfig) -> Self {
        Self {
            search,
            fetcher,
            books,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the base query, once per location row when rows are given.
    ///
    /// Rows are processed strictly one after another; incomplete rows are
    /// skipped without a search. An empty row list runs the base query alone.
    pub async fn run<R: PipelineReporter>(
        &self,
        locations: &[LocationQuery],
        reporter: &R,
        cancel: &CancellationToken,
    ) -> RunSummary {
        if locations.is_empty() {
            return self.run_query(&self.config.query, reporter, cancel).await;
        }

        let mut summary = RunSummary::default();
        for location in locations {
            if cancel.is_cancelled() {
                reporter.report(PipelineEvent::Cancelled);
                summary.cancelled = true;
                break;
            }
            if !location.is_complete() {
                reporter.report(PipelineEvent::LocationSkipped { location });
                continue;
            }

            let query = location.scope(&self.config.query);
            summary.merge(&self.run_query(&query, reporter, cancel).await);
            if summary.cancelled {
                break;
            }
        }
        summary
    }

    /// Run one sub-pipeline for a fully composed query.
    ///
    /// The address book is opened first and closed last, whatever happened to
    /// the candidates in between.
    pub async fn run_query<R: PipelineReporter>(
        &self,
        query: &str,
        reporter: &R,
        cancel: &CancellationToken,
    ) -> RunSummary {
        let mut summary = RunSummary::default();
        reporter.report(PipelineEvent::QueryStarted { query });

        let book = match self.books.open().await {
            Ok(book) => book,
            Err(error) => {
                reporter.report(PipelineEvent::StoreUnavailable {
                    query,
                    error: &error,
                });
                summary.queries_skipped = 1;
                return summary;
            }
        };
        summary.queries_run = 1;

        if let Err(error) = book.ensure_schema().await {
            reporter.report(PipelineEvent::SchemaFailed { error: &error });
        }

        self.process_query(query, &book, reporter, cancel, &mut summary)
            .await;

        if let Err(error) = book.close().await {
            reporter.report(PipelineEvent::CloseFailed { error: &error });
        }

        reporter.report(PipelineEvent::QueryFinished {
            query,
            summary: &summary,
        });
        summary
    }

    async fn process_query<R: PipelineReporter>(
        &self,
        query: &str,
        book: &B::Book,
        reporter: &R,
        cancel: &CancellationToken,
        summary: &mut RunSummary,
    ) {
        if cancel.is_cancelled() {
            reporter.report(PipelineEvent::Cancelled);
            summary.cancelled = true;
            return;
        }

        let candidates = match self.search.search(query).await {
            Ok(candidates) => candidates,
            Err(error) => {
                reporter.report(PipelineEvent::SearchFailed {
                    query,
                    error: &error,
                });
                summary.search_failures += 1;
                return;
            }
        };

        let (reachable, unreachable): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(PlaceCandidate::has_website);
        summary.candidates_found = reachable.len();
        summary.candidates_without_website = unreachable.len();
        reporter.report(PipelineEvent::CandidatesFound {
            query,
            with_website: reachable.len(),
            without_website: unreachable.len(),
        });

        // At most `fetch_concurrency` fetches in flight; results come back in
        // candidate order and are written by this loop alone.
        let budget = self.config.fetch_budget;
        let mut pages = pin!(
            stream::iter(reachable)
                .map(|candidate| async move {
                    let url = normalize_url(&candidate.website_url);
                    reporter.report(PipelineEvent::Fetching {
                        business: &candidate.name,
                        url: &url,
                    });
                    let content = self.fetcher.fetch(&url, budget).await;
                    (candidate, url, content)
                })
                .buffered(self.config.fetch_concurrency.max(1))
        );

        while let Some((candidate, url, content)) = pages.next().await {
            if cancel.is_cancelled() {
                reporter.report(PipelineEvent::Cancelled);
                summary.cancelled = true;
                break;
            }

            let content = match content {
                Ok(content) => {
                    summary.pages_fetched += 1;
                    content
                }
                Err(error) => {
                    reporter.report(PipelineEvent::FetchFailed {
                        business: &candidate.name,
                        url: &url,
                        error: &error,
                    });
                    summary.fetch_failures += 1;
                    continue;
                }
            };

            let emails = extract_emails(&content);
            summary.emails_extracted += emails.len();
            reporter.report(PipelineEvent::EmailsExtracted {
                business: &candidate.name,
                url: &url,
                count: emails.len(),
            });

            for email in &emails {
                let record = EmailRecord::for_candidate(&candidate, email);
                match book.upsert(&record).await {
                    Ok(UpsertOutcome::Inserted) => {
                        summary.emails_stored += 1;
                        reporter.report(PipelineEvent::EmailStored {
                            business: &record.business_name,
                            email: &record.email_address,
                        });
                    }
                    Ok(UpsertOutcome::Ignored) => {
                        summary.emails_ignored += 1;
                        reporter.report(PipelineEvent::EmailIgnored {
                            business: &record.business_name,
                            email: &record.email_address,
                        });
                    }
                    Err(error) => {
                        summary.store_failures += 1;
                        reporter.report(PipelineEvent::StoreFailed {
                            business: &record.business_name,
                            email: &record.email_address,
                            error: &error,
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::AppError;
    use crate::testutil::*;

    fn bakery_candidates() -> Vec<PlaceCandidate> {
        vec![
            PlaceCandidate::new("bakery1", "1 Congress Ave, Austin, TX", "bakery1.com"),
            PlaceCandidate::new("bakery2", "2 Lamar Blvd, Austin, TX", ""),
        ]
    }

    fn pipeline(
        search: MockPlaceSearch,
        fetcher: MockPageFetcher,
        books: MockAddressBookFactory,
    ) -> EmailPipeline<MockPlaceSearch, MockPageFetcher, MockAddressBookFactory> {
        EmailPipeline::new(search, fetcher, books, PipelineConfig::new("test-key", "bakery"))
    }

    #[tokio::test]
    async fn bakery_scenario_stores_one_row() {
        let search = MockPlaceSearch::new().with_results("bakery in Austin, TX", bakery_candidates());
        let fetcher = MockPageFetcher::new().with_page(
            "bakery1.com",
            r#"<p>Write to hello@bakery1.com</p><img src="/static/logo@2x.png">"#,
        );
        let books = MockAddressBookFactory::new();

        let summary = pipeline(search.clone(), fetcher.clone(), books.clone())
            .run(
                &[LocationQuery::new("Austin", "TX")],
                &MockReporter::new(),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(
            books.rows(),
            vec![EmailRecord {
                business_name: "bakery1".into(),
                business_address: "1 Congress Ave, Austin, TX".into(),
                business_website: "bakery1.com".into(),
                email_address: "hello@bakery1.com".into(),
                email_sent: false,
            }]
        );
        assert_eq!(search.queries(), vec!["bakery in Austin, TX".to_string()]);
        assert_eq!(summary.candidates_found, 1);
        assert_eq!(summary.candidates_without_website, 1);
        assert_eq!(summary.emails_stored, 1);
    }

    #[tokio::test]
    async fn candidates_without_website_are_never_fetched() {
        let search = MockPlaceSearch::new().with_results(
            "bakery",
            vec![
                PlaceCandidate::new("no site", "", ""),
                PlaceCandidate::new("blank site", "", "   "),
                PlaceCandidate::new("has site", "", "https://hassite.com"),
            ],
        );
        let fetcher = MockPageFetcher::new().with_page("https://hassite.com", "nothing here");

        pipeline(search, fetcher.clone(), MockAddressBookFactory::new())
            .run(&[], &MockReporter::new(), &CancellationToken::new())
            .await;

        assert_eq!(fetcher.fetched(), vec!["https://hassite.com".to_string()]);
    }

    #[tokio::test]
    async fn fetch_timeout_does_not_stop_the_run() {
        let search = MockPlaceSearch::new().with_results(
            "bakery",
            vec![
                PlaceCandidate::new("slow", "", "slow.com"),
                PlaceCandidate::new("fast", "", "fast.com"),
            ],
        );
        let fetcher = MockPageFetcher::new()
            .with_error("slow.com", AppError::Timeout(Duration::from_secs(10)))
            .with_page("fast.com", "orders@fast.com");
        let books = MockAddressBookFactory::new();
        let reporter = MockReporter::new();

        let summary = pipeline(search, fetcher.clone(), books.clone())
            .run(&[], &reporter, &CancellationToken::new())
            .await;

        assert_eq!(fetcher.fetched().len(), 2);
        assert_eq!(summary.fetch_failures, 1);
        assert_eq!(summary.pages_fetched, 1);
        let rows = books.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].business_name, "fast");
        assert!(reporter.labels().contains(&"FetchFailed".to_string()));
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let search = MockPlaceSearch::new().with_results("bakery", bakery_candidates());
        let fetcher = MockPageFetcher::new().with_page("bakery1.com", "hello@bakery1.com sales@bakery1.com");
        let books = MockAddressBookFactory::new();
        let pipeline = pipeline(search, fetcher, books.clone());

        let first = pipeline
            .run(&[], &MockReporter::new(), &CancellationToken::new())
            .await;
        let rows_after_first = books.rows().len();
        let second = pipeline
            .run(&[], &MockReporter::new(), &CancellationToken::new())
            .await;

        assert_eq!(rows_after_first, 2);
        assert_eq!(books.rows().len(), rows_after_first);
        assert_eq!(first.emails_stored, 2);
        assert_eq!(second.emails_stored, 0);
        assert_eq!(second.emails_ignored, 2);
    }

    #[tokio::test]
    async fn mixed_case_duplicates_collapse_at_the_store() {
        let search = MockPlaceSearch::new().with_results("bakery", bakery_candidates());
        let fetcher = MockPageFetcher::new().with_page("bakery1.com", "Hello@Bakery1.com hello@bakery1.com");
        let books = MockAddressBookFactory::new();

        let summary = pipeline(search, fetcher, books.clone())
            .run(&[], &MockReporter::new(), &CancellationToken::new())
            .await;

        assert_eq!(summary.emails_extracted, 2);
        assert_eq!(summary.emails_stored, 1);
        assert_eq!(summary.emails_ignored, 1);
        assert_eq!(books.rows()[0].email_address, "hello@bakery1.com");
    }

    #[tokio::test]
    async fn incomplete_locations_issue_no_search() {
        let search = MockPlaceSearch::new();
        let locations = vec![
            LocationQuery::new("Austin", "TX"),
            LocationQuery::new("", "CA"),
            LocationQuery::new("Denver", " "),
            LocationQuery::new("Portland", "OR"),
        ];

        let summary = pipeline(search.clone(), MockPageFetcher::new(), MockAddressBookFactory::new())
            .run(&locations, &MockReporter::new(), &CancellationToken::new())
            .await;

        assert_eq!(
            search.queries(),
            vec![
                "bakery in Austin, TX".to_string(),
                "bakery in Portland, OR".to_string(),
            ]
        );
        assert_eq!(summary.queries_run, 2);
    }

    #[tokio::test]
    async fn no_locations_runs_base_query_once() {
        let search = MockPlaceSearch::new();
        let books = MockAddressBookFactory::new();

        let summary = pipeline(search.clone(), MockPageFetcher::new(), books.clone())
            .run(&[], &MockReporter::new(), &CancellationToken::new())
            .await;

        assert_eq!(search.queries(), vec!["bakery".to_string()]);
        assert_eq!(summary.queries_run, 1);
        assert_eq!(books.opened(), 1);
        assert_eq!(books.closed(), 1);
    }

    #[tokio::test]
    async fn search_failure_moves_to_next_location() {
        let search = MockPlaceSearch::new()
            .with_error(
                "bakery in Austin, TX",
                AppError::PlacesApi {
                    status_code: 500,
                    message: "backend error".into(),
                },
            )
            .with_results(
                "bakery in Portland, OR",
                vec![PlaceCandidate::new("Portland Bakery", "", "pdxbakery.com")],
            );
        let fetcher = MockPageFetcher::new().with_page("pdxbakery.com", "hi@pdxbakery.com");
        let books = MockAddressBookFactory::new();
        let locations = vec![
            LocationQuery::new("Austin", "TX"),
            LocationQuery::new("Portland", "OR"),
        ];

        let summary = pipeline(search, fetcher, books.clone())
            .run(&locations, &MockReporter::new(), &CancellationToken::new())
            .await;

        assert_eq!(summary.search_failures, 1);
        assert_eq!(summary.emails_stored, 1);
        assert_eq!(books.opened(), 2);
        assert_eq!(books.closed(), 2);
    }

    #[tokio::test]
    async fn unavailable_store_skips_the_query() {
        let search = MockPlaceSearch::new();
        let books =
            MockAddressBookFactory::new().with_open_error(AppError::DatabaseError("locked".into()));
        let reporter = MockReporter::new();
        let locations = vec![
            LocationQuery::new("Austin", "TX"),
            LocationQuery::new("Portland", "OR"),
        ];

        let summary = pipeline(search.clone(), MockPageFetcher::new(), books)
            .run(&locations, &reporter, &CancellationToken::new())
            .await;

        assert_eq!(search.queries(), vec!["bakery in Portland, OR".to_string()]);
        assert_eq!(summary.queries_skipped, 1);
        assert_eq!(summary.queries_run, 1);
        assert!(reporter.labels().contains(&"StoreUnavailable".to_string()));
    }

    #[tokio::test]
    async fn failed_insert_keeps_remaining_emails() {
        let search = MockPlaceSearch::new().with_results("bakery", bakery_candidates());
        let fetcher = MockPageFetcher::new().with_page("bakery1.com", "a@bakery1.com b@bakery1.com c@bakery1.com");
        let books = MockAddressBookFactory::new().with_failing_email("b@bakery1.com");

        let summary = pipeline(search, fetcher, books.clone())
            .run(&[], &MockReporter::new(), &CancellationToken::new())
            .await;

        assert_eq!(summary.store_failures, 1);
        assert_eq!(summary.emails_stored, 2);
        let stored: Vec<_> = books.rows().into_iter().map(|r| r.email_address).collect();
        assert_eq!(stored, vec!["a@bakery1.com", "c@bakery1.com"]);
    }

    #[tokio::test]
    async fn schema_failure_is_reported_and_run_continues() {
        let search = MockPlaceSearch::new().with_results("bakery", bakery_candidates());
        let fetcher = MockPageFetcher::new().with_page("bakery1.com", "hello@bakery1.com");
        let books = MockAddressBookFactory::new()
            .with_schema_error(AppError::DatabaseError("table emails has no column x".into()));
        let reporter = MockReporter::new();

        let summary = pipeline(search, fetcher, books.clone())
            .run(&[], &reporter, &CancellationToken::new())
            .await;

        assert!(reporter.labels().contains(&"SchemaFailed".to_string()));
        assert_eq!(summary.emails_stored, 1);
        assert_eq!(books.closed(), 1);
    }

    #[tokio::test]
    async fn cancelled_run_searches_nothing() {
        let search = MockPlaceSearch::new();
        let books = MockAddressBookFactory::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = pipeline(search.clone(), MockPageFetcher::new(), books.clone())
            .run(
                &[LocationQuery::new("Austin", "TX"), LocationQuery::new("Portland", "OR")],
                &MockReporter::new(),
                &cancel,
            )
            .await;

        assert!(summary.cancelled);
        assert!(search.queries().is_empty());
        assert_eq!(books.opened(), 0);
    }

    #[tokio::test]
    async fn cancelled_base_query_still_closes_the_store() {
        let books = MockAddressBookFactory::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = pipeline(MockPlaceSearch::new(), MockPageFetcher::new(), books.clone())
            .run(&[], &MockReporter::new(), &cancel)
            .await;

        assert!(summary.cancelled);
        assert_eq!(books.opened(), 1);
        assert_eq!(books.closed(), 1);
    }

    #[tokio::test]
    async fn bounded_concurrency_keeps_candidate_order() {
        let candidates: Vec<_> = (1..=5)
            .map(|i| PlaceCandidate::new(format!("shop{i}"), "", format!("shop{i}.com")))
            .collect();
        let mut fetcher = MockPageFetcher::new();
        for i in 1..=5 {
            fetcher = fetcher.with_page(&format!("shop{i}.com"), &format!("owner@shop{i}.com"));
        }
        let search = MockPlaceSearch::new().with_results("bakery", candidates);
        let books = MockAddressBookFactory::new();
        let config = PipelineConfig::new("test-key", "bakery").with_fetch_concurrency(3);

        let summary = EmailPipeline::new(search, fetcher, books.clone(), config)
            .run(&[], &MockReporter::new(), &CancellationToken::new())
            .await;

        assert_eq!(summary.emails_stored, 5);
        let names: Vec<_> = books.rows().into_iter().map(|r| r.business_name).collect();
        assert_eq!(names, vec!["shop1", "shop2", "shop3", "shop4", "shop5"]);
    }

    #[tokio::test]
    async fn fetch_uses_configured_budget() {
        let search = MockPlaceSearch::new().with_results("bakery", bakery_candidates());
        let fetcher = MockPageFetcher::new().with_page("bakery1.com", "");
        let config = PipelineConfig::new("test-key", "bakery").with_fetch_budget(Duration::from_millis(750));

        EmailPipeline::new(search, fetcher.clone(), MockAddressBookFactory::new(), config)
            .run(&[], &MockReporter::new(), &CancellationToken::new())
            .await;

        assert_eq!(fetcher.budgets(), vec![Duration::from_millis(750)]);
    }
}
