//! HTTP transport for the Bitbucket Cloud API.
//!
//! One `execute` is exactly one round trip: no retries, no caching.

use std::fmt;
use std::time::Duration;

use bkt_core::config::DEFAULT_BITBUCKET_URL;
use bkt_core::{Context, Error, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::types::ApiErrorResponse;

/// Pass as the body of a request that carries none.
pub const NO_BODY: Option<&()> = None;

const TOKEN_VAR: &str = "BITBUCKET_TOKEN";
const USERNAME_VAR: &str = "BITBUCKET_USERNAME";
const APP_PASSWORD_VAR: &str = "BITBUCKET_APP_PASSWORD";

// =============================================================================
// Credentials and options
// =============================================================================

/// Authentication material attached to every request.
#[derive(Clone, Default, PartialEq)]
pub enum Credentials {
    #[default]
    None,
    /// Access token sent as `Authorization: Bearer`.
    Bearer(String),
    /// Username and app password sent as HTTP basic auth.
    Basic { username: String, password: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::Bearer(_) => f.write_str("Bearer(***)"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

impl Credentials {
    /// Resolve credentials from the process environment.
    ///
    /// `BITBUCKET_TOKEN` wins; otherwise `BITBUCKET_APP_PASSWORD` is paired
    /// with `BITBUCKET_USERNAME` or the configured username.
    pub fn from_env(configured_username: Option<&str>) -> Self {
        Self::resolve(|key| std::env::var(key).ok(), configured_username)
    }

    fn resolve(lookup: impl Fn(&str) -> Option<String>, configured_username: Option<&str>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(TOKEN_VAR) {
            return Credentials::Bearer(token);
        }

        let username = non_empty(USERNAME_VAR)
            .or_else(|| configured_username.filter(|u| !u.is_empty()).map(str::to_string));

        match (username, non_empty(APP_PASSWORD_VAR)) {
            (Some(username), Some(password)) => Credentials::Basic { username, password },
            _ => Credentials::None,
        }
    }

    fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Credentials::None => builder,
            Credentials::Bearer(token) => builder.bearer_auth(token),
            Credentials::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
        }
    }
}

/// Transport configuration, read-only once the client is built.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub credentials: Credentials,
    pub user_agent: String,
    /// Whole-request timeout; `None` leaves reqwest's default.
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BITBUCKET_URL.to_string(),
            credentials: Credentials::None,
            user_agent: concat!("bkt/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: None,
        }
    }
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            ..Default::default()
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// A fully resolved request, ready for [`HttpTransport::execute`].
#[derive(Debug)]
pub struct ApiRequest {
    method: Method,
    url: Url,
    body: Option<Vec<u8>>,
    ctx: Context,
}

impl ApiRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Serialized JSON body, if any.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

// =============================================================================
// Transport
// =============================================================================

/// JSON-over-HTTPS transport bound to one base endpoint.
#[derive(Debug)]
pub struct HttpTransport {
    base_url: Url,
    credentials: Credentials,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let trimmed = options.base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(trimmed)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", options.base_url, e)))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "{}: base endpoint must be an http(s) URL",
                options.base_url
            )));
        }

        let mut builder = reqwest::Client::builder().user_agent(options.user_agent);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            base_url,
            credentials: options.credentials,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a request for `path`, relative to the base endpoint.
    ///
    /// `body`, if present, is serialized to JSON here.
    pub fn new_request<B: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiRequest> {
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let url = self.resolve(path)?;
        let body = body.map(serde_json::to_vec).transpose()?;

        Ok(ApiRequest {
            method,
            url,
            body,
            ctx: ctx.clone(),
        })
    }

    /// Send the request and decode a 2xx body into `T`.
    ///
    /// An empty body decodes as JSON `null`, so `()` and `Option<_>` work for
    /// endpoints that return nothing.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let ApiRequest {
            method,
            url,
            body,
            ctx,
        } = request;

        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }

        debug!(method = %method, url = %url, "Bitbucket request");

        tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                debug!("Bitbucket request cancelled");
                Err(Error::Cancelled)
            }
            result = self.round_trip(method, url, body) => result,
        }
    }

    /// Turn a `next` link into a path usable with [`Self::new_request`].
    ///
    /// The link may be absolute or relative, but must stay under the base
    /// endpoint.
    pub fn relative_path(&self, link: &str) -> Result<String> {
        let url = self
            .join_base()?
            .join(link.trim())
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", link, e)))?;

        let rest = self
            .strip_base(&url)
            .ok_or_else(|| Error::InvalidUrl(format!("{} is outside {}", link, self.base_url)))?;

        let path = if rest.is_empty() { "/" } else { rest };
        Ok(match url.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_string(),
        })
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        if let Ok(absolute) = Url::parse(path) {
            return match self.strip_base(&absolute) {
                Some(_) => Ok(absolute),
                None => Err(Error::InvalidUrl(format!(
                    "{} is outside {}",
                    path, self.base_url
                ))),
            };
        }

        let joined = format!("{}/{}", self.base_prefix(), path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| Error::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Path of `url` below the base path, if `url` lies under the base.
    fn strip_base<'u>(&self, url: &'u Url) -> Option<&'u str> {
        if url.origin() != self.base_url.origin() {
            return None;
        }

        let base_path = self.base_url.path().trim_end_matches('/');
        let rest = url.path().strip_prefix(base_path)?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    fn base_prefix(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn join_base(&self) -> Result<Url> {
        Url::parse(&format!("{}/", self.base_prefix()))
            .map_err(|e| Error::InvalidUrl(e.to_string()))
    }

    async fn round_trip<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<T> {
        let mut builder = self
            .credentials
            .apply(self.client.request(method, url))
            .header(ACCEPT, "application/json");

        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send().await.map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Handle response and map errors.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body, status.canonical_reason());
            warn!(
                status = status_code,
                message = message,
                "Bitbucket API error response"
            );
            return Err(Error::from_status(status_code, message));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        decode_body(&bytes)
    }
}

fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        bytes
    };

    serde_json::from_slice(bytes)
        .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))
}

/// Server-provided error detail, falling back to the raw body.
fn error_message(body: &str, reason: Option<&str>) -> String {
    let described = serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .map(|e| e.describe())
        .filter(|m| !m.is_empty());

    if let Some(message) = described {
        return message;
    }

    let body = body.trim();
    if body.is_empty() {
        reason.unwrap_or("unknown error").to_string()
    } else {
        body.to_string()
    }
}
