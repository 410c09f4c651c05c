//! Client for the upstream property-listing API.
//!
//! One instance is built at startup and shared through `AppState`. Every call
//! is bounded by the configured timeout; only the idempotent listings read is
//! retried, and only for transient failures.

use crate::config::UpstreamSettings;
use crate::error::{FrontendError, UpstreamError};
use crate::models::auth::{
    AccessToken, AuthResult, AuthenticationRequest, AuthenticationResponse, Credentials,
};
use crate::models::listing::{Listing, NewListing, PropertiesResponse};
use backoff::ExponentialBackoff;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use service_core::observability::TracedClientExt;
use std::time::Duration;

const AUTHENTICATION_PATH: &str = "/authentication";
const PROPERTIES_PATH: &str = "/properties";

pub struct UpstreamClient {
    client: Client,
    base_url: String,
    read_retries: u32,
    retry_backoff: Duration,
}

impl UpstreamClient {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, FrontendError> {
        let parsed = Url::parse(&settings.url).map_err(|e| {
            FrontendError::Config(format!("invalid upstream url '{}': {}", settings.url, e))
        })?;
        if parsed.host_str().is_none() {
            return Err(FrontendError::Config(format!(
                "upstream url '{}' has no host",
                settings.url
            )));
        }

        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| FrontendError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            read_retries: settings.read_retries,
            retry_backoff: settings.retry_backoff(),
        })
    }

    /// Fail if the upstream host name does not resolve at all.
    pub async fn ensure_resolvable(&self) -> Result<(), FrontendError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| FrontendError::Config(format!("invalid upstream url: {}", e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| FrontendError::Config("upstream url has no host".to_string()))?;
        let port = url.port_or_known_default().unwrap_or(80);

        let mut addresses = tokio::net::lookup_host((host, port)).await.map_err(|e| {
            FrontendError::Config(format!("cannot resolve upstream host '{}': {}", host, e))
        })?;

        match addresses.next() {
            Some(address) => {
                tracing::info!(upstream = %self.base_url, %address, "Upstream address resolved");
                Ok(())
            }
            None => Err(FrontendError::Config(format!(
                "upstream host '{}' resolved to no addresses",
                host
            ))),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange email/password for an access token and the user id it carries.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<AuthResult, UpstreamError> {
        let result: Result<AuthResult, UpstreamError> = async {
            let response = self
                .client
                .traced_post(&self.url(AUTHENTICATION_PATH))
                .json(&AuthenticationRequest::from(credentials))
                .send()
                .await?;

            let body: AuthenticationResponse = read_json(response).await?;
            AuthResult::try_from(body)
        }
        .await;

        record("authenticate", &result);
        result
    }

    /// Fetch every listing visible to the bearer of `token`.
    pub async fn list_properties(&self, token: &AccessToken) -> Result<Vec<Listing>, UpstreamError> {
        let mut attempts = 0u32;
        let max_attempts = self.read_retries + 1;

        let policy = ExponentialBackoff {
            current_interval: self.retry_backoff,
            initial_interval: self.retry_backoff,
            max_interval: self.retry_backoff * 4,
            randomization_factor: 0.1,
            max_elapsed_time: None,
            ..Default::default()
        };

        let result = backoff::future::retry(policy, || {
            attempts += 1;
            let attempt = attempts;
            async move {
                self.fetch_properties(token).await.map_err(|e| {
                    if e.is_transient() && attempt < max_attempts {
                        tracing::warn!(error = %e, attempt, "Listings fetch failed, retrying");
                        backoff::Error::transient(e)
                    } else {
                        backoff::Error::permanent(e)
                    }
                })
            }
        })
        .await;

        record("list_properties", &result);
        result
    }

    async fn fetch_properties(&self, token: &AccessToken) -> Result<Vec<Listing>, UpstreamError> {
        let response = self
            .client
            .traced_get(&self.url(PROPERTIES_PATH))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        let page: PropertiesResponse = read_json(response).await?;
        Ok(page.into_listings())
    }

    /// Create a listing on behalf of the bearer of `token`.
    pub async fn create_property(
        &self,
        token: &AccessToken,
        listing: &NewListing,
    ) -> Result<Listing, UpstreamError> {
        let result: Result<Listing, UpstreamError> = async {
            let response = self
                .client
                .traced_post(&self.url(PROPERTIES_PATH))
                .bearer_auth(token.as_str())
                .json(listing)
                .send()
                .await?;

            read_json(response).await
        }
        .await;

        record("create_property", &result);
        result
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, UpstreamError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(%status, body = %body, "Upstream error body");
        return Err(UpstreamError::Status { status, body });
    }

    Ok(response.json::<T>().await?)
}

fn record<T>(operation: &'static str, result: &Result<T, UpstreamError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(UpstreamError::Timeout) => "timeout",
        Err(_) => "failure",
    };
    metrics::counter!("upstream_requests_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}
