use std::time::Duration;

use mailscout_core::error::AppError;
use mailscout_core::models::PlaceCandidate;
use mailscout_core::traits::PlaceSearch;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_ENDPOINT: &str = "https://places.googleapis.com/v1/places:searchText";
const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
const FIELD_MASK: &str = "places.displayName,places.formattedAddress,places.websiteUri";

/// Google Places API (New) text-search client.
///
/// Sends one `places:searchText` request per query and maps each returned
/// place to a [`PlaceCandidate`]. Only the three fields the pipeline needs are
/// requested through the field mask.
#[derive(Clone)]
pub struct GooglePlacesClient {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl GooglePlacesClient {
    pub fn new(api_key: &str) -> Result<Self, AppError> {
        Self::build(api_key, DEFAULT_ENDPOINT, DEFAULT_SEARCH_TIMEOUT)
    }

    pub fn with_endpoint(self, endpoint: &str) -> Result<Self, AppError> {
        Self::build(&self.api_key, endpoint, self.timeout)
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, AppError> {
        Self::build(&self.api_key, &self.endpoint, timeout)
    }

    fn build(api_key: &str, endpoint: &str, timeout: Duration) -> Result<Self, AppError> {
        if api_key.trim().is_empty() {
            return Err(AppError::ConfigError("Places API key is empty".into()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            timeout,
        })
    }
}

// ---- Places API types ----

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchTextRequest<'a> {
    text_query: &'a str,
}

#[derive(Deserialize)]
struct SearchTextResponse {
    // Omitted entirely when nothing matched.
    #[serde(default)]
    places: Vec<Place>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Place {
    display_name: Option<LocalizedText>,
    formatted_address: Option<String>,
    website_uri: Option<String>,
}

#[derive(Deserialize)]
struct LocalizedText {
    text: String,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl Place {
    fn into_candidate(self) -> Option<PlaceCandidate> {
        let name = self.display_name.map(|n| n.text)?;
        if name.trim().is_empty() {
            return None;
        }
        Some(PlaceCandidate::new(
            name,
            self.formatted_address.unwrap_or_default(),
            self.website_uri.unwrap_or_default(),
        ))
    }
}

impl PlaceSearch for GooglePlacesClient {
    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, AppError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&SearchTextRequest { text_query: query })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(self.timeout)
                } else if e.is_connect() {
                    AppError::NetworkError(format!("Connection failed: {e}"))
                } else {
                    AppError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();

            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {status_code}: {body}"));

            return Err(AppError::PlacesApi {
                status_code,
                message,
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout)
            } else {
                AppError::HttpError(format!("Failed to read search response: {e}"))
            }
        })?;

        let parsed: SearchTextResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::ApiShape(format!("Unexpected search response: {e}")))?;

        let total = parsed.places.len();
        let candidates: Vec<PlaceCandidate> = parsed
            .places
            .into_iter()
            .filter_map(Place::into_candidate)
            .collect();

        if candidates.len() < total {
            tracing::debug!(
                query,
                dropped = total - candidates.len(),
                "Dropped places without a display name"
            );
        }

        Ok(candidates)
    }
}
