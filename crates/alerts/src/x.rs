//! X (Twitter) v2 posting client.
//!
//! Tweets are created with `POST /2/tweets` using OAuth 1.0a user-context
//! authentication (HMAC-SHA1 signed `Authorization` header). The JSON body is
//! not part of the signature base string.

use crate::error::{PostError, PostResult};
use crate::notifier::Poster;
use async_trait::async_trait;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use sha1::Sha1;
use std::time::Duration;
use tracing::{debug, warn};

type HmacSha1 = Hmac<Sha1>;

/// Tweet creation endpoint.
pub const TWEETS_URL: &str = "https://api.twitter.com/2/tweets";

/// Longest wait honored for an `x-rate-limit-reset` hint.
pub const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(15 * 60);

/// Wait used when a 429 response carries no usable reset time.
const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(5);

/// RFC 3986 unreserved characters stay as-is; everything else is encoded.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// User-context credentials for the X API.
#[derive(Clone)]
pub struct XCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl std::fmt::Debug for XCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XCredentials")
            .field("api_key", &mask(&self.api_key))
            .field("access_token", &mask(&self.access_token))
            .finish_non_exhaustive()
    }
}

fn mask(s: &str) -> String {
    format!("{}***", s.chars().take(4).collect::<String>())
}

impl XCredentials {
    /// Returns None unless all four values are non-empty.
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Option<Self> {
        let creds = Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
        };
        let complete = [
            &creds.api_key,
            &creds.api_secret,
            &creds.access_token,
            &creds.access_token_secret,
        ]
        .iter()
        .all(|v| !v.trim().is_empty());
        complete.then_some(creds)
    }

    /// Read `X_API_KEY`, `X_API_SECRET`, `X_ACCESS_TOKEN` and
    /// `X_ACCESS_TOKEN_SECRET`.
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        Self::new(
            var("X_API_KEY"),
            var("X_API_SECRET"),
            var("X_ACCESS_TOKEN"),
            var("X_ACCESS_TOKEN_SECRET"),
        )
    }
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// OAuth 1.0a HMAC-SHA1 signature.
///
/// `params` holds both the `oauth_*` protocol parameters and any query or
/// form parameters of the request.
pub fn sign(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    consumer_secret: &str,
    token_secret: &str,
) -> PostResult<String> {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let base = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&param_string)
    );
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));

    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| PostError::Signing(e.to_string()))?;
    mac.update(base.as_bytes());
    Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}

/// Build the `Authorization` header value for a request with no extra
/// signed parameters.
pub fn authorization_header(
    method: &str,
    url: &str,
    creds: &XCredentials,
    nonce: &str,
    timestamp: i64,
) -> PostResult<String> {
    let timestamp = timestamp.to_string();
    let mut oauth: Vec<(&str, &str)> = vec![
        ("oauth_consumer_key", creds.api_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", creds.access_token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let signature = sign(
        method,
        url,
        &oauth,
        &creds.api_secret,
        &creds.access_token_secret,
    )?;
    oauth.push(("oauth_signature", signature.as_str()));
    oauth.sort();

    let fields = oauth
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {}", fields))
}

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: Option<TweetData>,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

/// Time until a rate-limit window given as a Unix `reset` time, capped.
fn rate_limit_wait(reset: Option<i64>, now: i64, cap: Duration) -> Duration {
    let wait = match reset {
        Some(reset) => Duration::from_secs(reset.saturating_sub(now).max(0) as u64),
        None => DEFAULT_RATE_LIMIT_WAIT,
    };
    wait.min(cap)
}

/// Posts plain-text updates to X.
pub struct XClient {
    creds: XCredentials,
    endpoint: String,
    http: reqwest::Client,
    max_rate_limit_wait: Duration,
}

impl XClient {
    pub fn new(creds: XCredentials, timeout: Duration) -> PostResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            creds,
            endpoint: TWEETS_URL.to_string(),
            http,
            max_rate_limit_wait: MAX_RATE_LIMIT_WAIT,
        })
    }

    /// Override the tweet endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Cap the wait before retrying a rate-limited post.
    pub fn with_max_rate_limit_wait(mut self, wait: Duration) -> Self {
        self.max_rate_limit_wait = wait;
        self
    }

    /// Signed `POST` of one tweet. A fresh nonce and timestamp every call.
    async fn send(&self, text: &str) -> PostResult<reqwest::Response> {
        let auth = authorization_header(
            "POST",
            &self.endpoint,
            &self.creds,
            &nonce(),
            chrono::Utc::now().timestamp(),
        )?;

        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;
        Ok(response)
    }

    /// Create a tweet, returning its id when the API reports one.
    ///
    /// A 429 response is retried once, after waiting for the window named
    /// by `x-rate-limit-reset`.
    pub async fn create_tweet(&self, text: &str) -> PostResult<Option<String>> {
        let mut response = self.send(text).await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let reset = response
                .headers()
                .get("x-rate-limit-reset")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<i64>().ok());
            let wait = rate_limit_wait(reset, chrono::Utc::now().timestamp(), self.max_rate_limit_wait);
            warn!("X rate limit reached, retrying in {}s", wait.as_secs());
            tokio::time::sleep(wait).await;
            response = self.send(text).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PostError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: CreateTweetResponse = response.json().await?;
        let id = body.data.map(|d| d.id);
        debug!(tweet_id = ?id, "Tweet created");
        Ok(id)
    }
}

#[async_trait]
impl Poster for XClient {
    fn name(&self) -> &str {
        "X"
    }

    async fn post(&self, text: &str) -> PostResult<Option<String>> {
        self.create_tweet(text).await
    }
}
