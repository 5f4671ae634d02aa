#[cfg(feature = "browser")]
pub mod browser_fetcher;
pub mod fetcher;
pub mod places;
pub mod strategy;

#[cfg(feature = "browser")]
pub use browser_fetcher::BrowserFetcher;
pub use fetcher::ReqwestFetcher;
pub use places::GooglePlacesClient;
pub use strategy::StrategyFetcher;
