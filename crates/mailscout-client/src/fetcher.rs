use std::time::Duration;

use mailscout_core::error::AppError;
use mailscout_core::traits::PageFetcher;
use mailscout_core::util::normalize_url;
use reqwest::Client;

/// Desktop Chrome identification; some small-business hosts refuse
/// obvious bots.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36";

/// Lightweight HTTP fetcher using reqwest.
///
/// One GET per page. The budget is applied per request and covers the whole
/// exchange, body included; when it expires the request future is dropped
/// and its connection released.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_user_agent(BROWSER_USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self { client })
    }
}

impl PageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, budget: Duration) -> Result<String, AppError> {
        let url = normalize_url(url);

        let response = self
            .client
            .get(&url)
            .timeout(budget)
            .send()
            .await
            .map_err(|e| classify(e, budget))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(budget)
            } else {
                AppError::HttpError(format!("Failed to read response body: {e}"))
            }
        })
    }
}

fn classify(e: reqwest::Error, budget: Duration) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(budget)
    } else if e.is_connect() {
        AppError::NetworkError(format!("Connection failed: {e}"))
    } else {
        AppError::HttpError(e.to_string())
    }
}
