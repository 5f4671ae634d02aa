use std::path::{Path, PathBuf};
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use mailscout_core::error::AppError;
use mailscout_core::traits::PageFetcher;
use mailscout_core::util::normalize_url;
use tempfile::TempDir;
use tokio::task::JoinHandle;

const LAUNCH_TIMEOUT: Duration = Duration::from_secs(20);
const EXIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Headless-browser fetcher using Chromium via the Chrome DevTools Protocol.
///
/// Unlike [`super::ReqwestFetcher`], this renders JavaScript before returning
/// the HTML. Every [`PageFetcher::fetch`] call launches its own Chromium with
/// a throwaway profile directory, so concurrent fetches share nothing, and
/// shuts it down again before returning, whether navigation succeeded,
/// failed or ran out of budget.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use mailscout_client::BrowserFetcher;
/// use mailscout_core::traits::PageFetcher;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = BrowserFetcher::new();
/// let html = fetcher.fetch("example.com", Duration::from_secs(5)).await?;
/// println!("{}", &html[..200]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct BrowserFetcher {
    executable: Option<PathBuf>,
}

impl BrowserFetcher {
    /// Uses the first Chrome/Chromium found in well-known install locations,
    /// falling back to `chromiumoxide`'s own lookup.
    pub fn new() -> Self {
        Self {
            executable: Self::find_chrome_binary(),
        }
    }

    /// Uses an explicit Chrome/Chromium binary.
    pub fn with_executable(path: impl Into<PathBuf>) -> Self {
        Self {
            executable: Some(path.into()),
        }
    }

    /// Tries to locate the real Chrome/Chromium binary.
    ///
    /// The snap wrapper at `/snap/bin/chromium` strips unknown CLI flags and
    /// breaks headless mode, so the binary inside the snap is checked first.
    fn find_chrome_binary() -> Option<PathBuf> {
        const CANDIDATES: &[&str] = &[
            "/snap/chromium/current/usr/lib/chromium-browser/chrome",
            "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ];

        CANDIDATES.iter().map(PathBuf::from).find(|p| p.exists())
    }
}

impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str, budget: Duration) -> Result<String, AppError> {
        let url = normalize_url(url);
        let session = BrowserSession::launch(self.executable.as_deref()).await?;

        let result = tokio::time::timeout(budget, session.render(&url)).await;

        // Runs on every outcome below, timeout included.
        session.shutdown().await;

        match result {
            Ok(inner) => inner,
            Err(_) => Err(AppError::Timeout(budget)),
        }
    }
}

/// One launched Chromium process plus the task driving its CDP connection.
///
/// If a session is dropped without [`BrowserSession::shutdown`] (the fetch
/// future was cancelled), `chromiumoxide` kills the child process on drop and
/// the profile directory is removed with the `TempDir`.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    _profile: TempDir,
}

impl BrowserSession {
    async fn launch(executable: Option<&Path>) -> Result<Self, AppError> {
        let profile = tempfile::Builder::new()
            .prefix("mailscout-chrome-")
            .tempdir()
            .map_err(|e| AppError::BrowserError(format!("Cannot create profile dir: {e}")))?;

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .disable_default_args()
            .user_data_dir(profile.path())
            .launch_timeout(LAUNCH_TIMEOUT);
        if let Some(bin) = executable {
            builder = builder.chrome_executable(bin);
        }

        let config = builder
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--disable-translate")
            .arg("--no-first-run")
            .arg("--incognito")
            .build()
            .map_err(|e| AppError::BrowserError(format!("Browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "Browser CDP handler stopped");
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            _profile: profile,
        })
    }

    async fn render(&self, url: &str) -> Result<String, AppError> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| AppError::NavigationError(format!("Failed to navigate to {url}: {e}")))?;

        page.find_element("body").await.map_err(|e| {
            AppError::NavigationError(format!("Page did not render body: {e}"))
        })?;

        let html = page.content().await.map_err(|e| {
            AppError::NavigationError(format!("Failed to read page content: {e}"))
        })?;

        if let Err(e) = page.close().await {
            tracing::debug!(%url, error = %e, "Failed to close tab");
        }

        Ok(html)
    }

    async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::debug!(error = %e, "Graceful browser close failed, killing");
            if let Some(Err(e)) = self.browser.kill().await {
                tracing::warn!(error = %e, "Failed to kill browser process");
            }
        }

        match tokio::time::timeout(EXIT_TIMEOUT, self.browser.wait()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Failed to reap browser process"),
            Err(_) => {
                tracing::warn!("Browser did not exit in time, killing");
                let _ = self.browser.kill().await;
            }
        }

        self.handler.abort();
    }
}
