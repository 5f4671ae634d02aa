/// Smoke-test for `BrowserFetcher`.
///
/// Renders <https://example.com> in a throwaway headless Chromium and runs the
/// rendered HTML through the email extractor.
///
/// Run with:
///   cargo run -p mailscout-client --example browser_smoke --features browser
use std::time::Duration;

use mailscout_client::BrowserFetcher;
use mailscout_core::extract_emails;
use mailscout_core::traits::PageFetcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com".to_string());
    let fetcher = match std::env::var("CHROME_BIN") {
        Ok(bin) => BrowserFetcher::with_executable(bin),
        Err(_) => BrowserFetcher::new(),
    };

    println!("Rendering {url}");
    let html = fetcher.fetch(&url, Duration::from_secs(15)).await?;

    assert!(
        html.len() > 200,
        "HTML suspiciously short ({} bytes)",
        html.len()
    );

    let emails = extract_emails(&html);
    println!("Got {} bytes of rendered HTML", html.len());
    println!("Emails found: {emails:?}");
    Ok(())
}
