use std::time::Duration;

use mailscout_core::config::FetchStrategy;
use mailscout_core::error::AppError;
use mailscout_core::traits::PageFetcher;

#[cfg(feature = "browser")]
use crate::browser_fetcher::BrowserFetcher;
use crate::fetcher::ReqwestFetcher;

/// The page fetcher chosen by [`FetchStrategy`] at startup.
///
/// Lets the pipeline stay generic over one concrete `PageFetcher` type while
/// the strategy is a runtime setting.
#[derive(Clone)]
pub enum StrategyFetcher {
    Http(ReqwestFetcher),
    #[cfg(feature = "browser")]
    Browser(BrowserFetcher),
}

impl StrategyFetcher {
    pub fn from_strategy(strategy: FetchStrategy) -> Result<Self, AppError> {
        match strategy {
            FetchStrategy::Http => Ok(Self::Http(ReqwestFetcher::new()?)),
            #[cfg(feature = "browser")]
            FetchStrategy::Browser => Ok(Self::Browser(BrowserFetcher::new())),
            #[cfg(not(feature = "browser"))]
            FetchStrategy::Browser => Err(AppError::ConfigError(
                "Browser fetch strategy requires building with the `browser` feature".into(),
            )),
        }
    }

    /// Browser strategy with an explicit Chrome/Chromium binary.
    #[cfg(feature = "browser")]
    pub fn browser_with_executable(path: impl Into<std::path::PathBuf>) -> Self {
        Self::Browser(BrowserFetcher::with_executable(path))
    }

    pub fn strategy(&self) -> FetchStrategy {
        match self {
            Self::Http(_) => FetchStrategy::Http,
            #[cfg(feature = "browser")]
            Self::Browser(_) => FetchStrategy::Browser,
        }
    }
}

impl PageFetcher for StrategyFetcher {
    async fn fetch(&self, url: &str, budget: Duration) -> Result<String, AppError> {
        match self {
            Self::Http(f) => f.fetch(url, budget).await,
            #[cfg(feature = "browser")]
            Self::Browser(f) => f.fetch(url, budget).await,
        }
    }
}
