use crate::config::Config;
use crate::sources::SourceError;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde_json::Value;
use std::num::NonZeroU32;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// An outbound JSON request to one provider.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    /// Provider name used in errors and logs. Never the URL, which may carry a key.
    pub provider: &'static str,
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl UpstreamRequest {
    pub fn get(provider: &'static str, url: impl Into<String>) -> Self {
        Self {
            provider,
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(provider: &'static str, url: impl Into<String>, body: Value) -> Self {
        Self {
            provider,
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

/// Sends a request and decodes a JSON body.
///
/// Non-2xx statuses, timeouts and undecodable bodies all map to
/// [`SourceError::Upstream`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send_json(&self, request: UpstreamRequest) -> Result<Value, SourceError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl ReqwestTransport {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .user_agent(concat!("mining-stats-service/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let limiter = config
            .upstream_rate_limit
            .and_then(NonZeroU32::new)
            .map(|per_sec| RateLimiter::direct(Quota::per_second(per_sec)));

        info!(
            "Initializing upstream HTTP client, timeout: {:?}, rate limit: {:?}/s",
            config.upstream_timeout, config.upstream_rate_limit
        );

        Ok(Self { client, limiter })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send_json(&self, request: UpstreamRequest) -> Result<Value, SourceError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let provider = request.provider;
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!("Sending {:?} request to {}", request.method, provider);
        let response = builder.send().await.map_err(|e| {
            let e = e.without_url();
            if e.is_timeout() {
                warn!("{} request timed out", provider);
                SourceError::upstream(provider, "request timed out")
            } else {
                SourceError::upstream(provider, format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::upstream(
                provider,
                format!("returned HTTP {}", status.as_u16()),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SourceError::upstream(provider, format!("malformed JSON: {}", e.without_url())))
    }
}
