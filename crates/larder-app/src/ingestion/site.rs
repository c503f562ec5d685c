//! HTTP access to a recipe site: one client, rate limited, with bounded
//! exponential retry on throttle responses and transport errors.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use backon::{ExponentialBuilder, Retryable};
use bytes::Bytes;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::Client;
use tokio::time::sleep;
use tracing::warn;
use url::Url;

use crate::config::HttpConfig;
use crate::ingestion::types::FetchError;

type GenericRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Browser User-Agent rotation; recipe portals tend to reject obvious bots.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
];

#[derive(Debug, Clone)]
pub struct SiteFetcher {
    http: Client,
    rate_limiter: Arc<GenericRateLimiter>,
    backoff: ExponentialBuilder,
}

impl SiteFetcher {
    pub fn new(cfg: &HttpConfig) -> Result<Self, FetchError> {
        let user_agent = cfg
            .user_agent
            .clone()
            .unwrap_or_else(|| pick_user_agent().to_string());

        let http = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|err| FetchError::BuildClient(Arc::new(err)))?;

        let per_second =
            NonZeroU32::new(cfg.requests_per_second.max(1)).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(cfg.retry_min_delay_ms))
            .with_max_delay(Duration::from_millis(cfg.retry_max_delay_ms))
            .with_max_times(cfg.retry_max_attempts)
            .with_jitter();

        Ok(Self {
            http,
            rate_limiter,
            backoff,
        })
    }

    /// Fetch a recipe page body.
    pub async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        let stage = "recipe_page";

        let attempt = {
            let limiter = self.rate_limiter.clone();
            let client = self.http.clone();
            let url = url.clone();
            move || {
                let limiter = limiter.clone();
                let client = client.clone();
                let url = url.clone();
                async move {
                    let response = checked_get(&client, &limiter, url, stage).await?;
                    response
                        .text()
                        .await
                        .map_err(|err| FetchError::body(stage, err))
                }
            }
        };

        attempt
            .retry(self.backoff.clone())
            .sleep(sleep)
            .when(FetchError::is_retryable)
            .notify(|err: &FetchError, delay: Duration| {
                warn!(
                    stage,
                    url = %url,
                    delay_ms = delay.as_millis(),
                    error = %err,
                    "retrying recipe page request"
                );
            })
            .await
    }

    /// Fetch an image body, for embedding into the record.
    pub async fn fetch_image(&self, url: &Url) -> Result<Bytes, FetchError> {
        let stage = "photo";

        let attempt = {
            let limiter = self.rate_limiter.clone();
            let client = self.http.clone();
            let url = url.clone();
            move || {
                let limiter = limiter.clone();
                let client = client.clone();
                let url = url.clone();
                async move {
                    let response = checked_get(&client, &limiter, url, stage).await?;
                    response
                        .bytes()
                        .await
                        .map_err(|err| FetchError::body(stage, err))
                }
            }
        };

        attempt
            .retry(self.backoff.clone())
            .sleep(sleep)
            .when(FetchError::is_retryable)
            .notify(|err: &FetchError, delay: Duration| {
                warn!(
                    stage,
                    url = %url,
                    delay_ms = delay.as_millis(),
                    error = %err,
                    "retrying photo download"
                );
            })
            .await
    }
}

async fn checked_get(
    client: &Client,
    limiter: &GenericRateLimiter,
    url: Url,
    stage: &'static str,
) -> Result<reqwest::Response, FetchError> {
    limiter.until_ready().await;
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| FetchError::request(stage, err))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            stage,
            status: status.as_u16(),
        });
    }
    Ok(response)
}

fn pick_user_agent() -> &'static str {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as usize;
    USER_AGENTS[nanos % USER_AGENTS.len()]
}
