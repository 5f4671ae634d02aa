use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How page content is retrieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    /// A single HTTP GET; fast, sees only server-rendered markup.
    #[default]
    Http,
    /// A headless browser page load; sees the rendered DOM.
    Browser,
}

impl FetchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStrategy::Http => "http",
            FetchStrategy::Browser => "browser",
        }
    }

    /// Per-page budget used when none is configured explicitly.
    pub fn default_budget(&self) -> Duration {
        match self {
            FetchStrategy::Http => Duration::from_secs(10),
            FetchStrategy::Browser => Duration::from_secs(5),
        }
    }
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FetchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(FetchStrategy::Http),
            "browser" => Ok(FetchStrategy::Browser),
            _ => Err(format!(
                "Unknown fetch strategy: {s} (expected 'http' or 'browser')"
            )),
        }
    }
}

/// Everything a run needs, resolved once at startup and handed to the
/// components that use it.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Places API key.
    pub api_key: String,
    /// Base business query, e.g. `"bakery"`.
    pub query: String,
    pub fetch_strategy: FetchStrategy,
    /// Time budget for one page fetch.
    pub fetch_budget: Duration,
    /// Maximum fetches in flight. `1` processes candidates strictly in turn.
    pub fetch_concurrency: usize,
}

impl PipelineConfig {
    pub fn new(api_key: impl Into<String>, query: impl Into<String>) -> Self {
        let fetch_strategy = FetchStrategy::default();
        Self {
            api_key: api_key.into(),
            query: query.into(),
            fetch_strategy,
            fetch_budget: fetch_strategy.default_budget(),
            fetch_concurrency: 1,
        }
    }

    /// Switches strategy and resets the budget to that strategy's default.
    pub fn with_fetch_strategy(mut self, strategy: FetchStrategy) -> Self {
        self.fetch_strategy = strategy;
        self.fetch_budget = strategy.default_budget();
        self
    }

    pub fn with_fetch_budget(mut self, budget: Duration) -> Self {
        self.fetch_budget = budget;
        self
    }

    /// Values below 1 are raised to 1.
    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = concurrency.max(1);
        self
    }
}
