//! Client for the RenderForm render endpoint.

use std::{fmt, sync::Arc};

use reqwest::{
    Client, StatusCode,
    header::{CONTENT_TYPE, HeaderValue},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;
use url::Url;

use crate::{config::RenderSettings, domain::RenderData};

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("render request rejected with status {status}")]
    Rejected { status: StatusCode, payload: String },
    #[error("render response was malformed: {reason}")]
    Malformed { reason: String, payload: String },
    #[error("API key cannot be sent as a header value")]
    InvalidCredential,
}

impl RenderError {
    /// Body returned by the service alongside the failure, if any.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Rejected { payload, .. } | Self::Malformed { payload, .. } => {
                (!payload.is_empty()).then_some(payload.as_str())
            }
            Self::Transport(_) | Self::InvalidCredential => None,
        }
    }
}

/// Source of the cache-busting `version` token.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        i64::try_from(millis).unwrap_or(i64::MAX)
    }
}

/// Body of a single render call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderRequest {
    pub template: String,
    pub data: RenderData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

impl RenderRequest {
    pub fn new(template: impl Into<String>, data: RenderData) -> Self {
        Self {
            template: template.into(),
            data,
            version: None,
        }
    }

    pub fn with_version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }
}

#[derive(Debug, Deserialize)]
struct RenderResult {
    href: Option<String>,
}

#[derive(Clone)]
pub struct RenderClient {
    http: Client,
    endpoint: Url,
    api_key: String,
    use_cache: bool,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for RenderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("use_cache", &self.use_cache)
            .finish_non_exhaustive()
    }
}

impl RenderClient {
    pub fn new(http: Client, settings: &RenderSettings) -> Self {
        Self {
            http,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            use_cache: settings.use_cache,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the request body, stamping a fresh `version` unless cached renders are allowed.
    pub fn build_request(
        &self,
        template: impl Into<String>,
        data: RenderData,
    ) -> RenderRequest {
        let request = RenderRequest::new(template, data);
        if self.use_cache {
            request
        } else {
            request.with_version(self.clock.now_millis())
        }
    }

    /// Submit one render and return the URL of the finished asset.
    pub async fn render(&self, request: &RenderRequest) -> Result<Url, RenderError> {
        let api_key =
            HeaderValue::from_str(&self.api_key).map_err(|_| RenderError::InvalidCredential)?;

        debug!(
            endpoint = %self.endpoint,
            content_type = "application/json",
            api_key = "<redacted>",
            "render request headers"
        );
        debug!(
            body = %serde_json::to_string(request).unwrap_or_default(),
            "render request body"
        );

        let resp = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        let payload = String::from_utf8_lossy(&bytes).into_owned();
        debug!(%status, body = %payload, "render response");

        if !status.is_success() {
            return Err(RenderError::Rejected { status, payload });
        }

        let result: RenderResult =
            serde_json::from_slice(&bytes).map_err(|err| RenderError::Malformed {
                reason: format!("failed to parse body: {err}"),
                payload: payload.clone(),
            })?;
        let href = result.href.ok_or_else(|| RenderError::Malformed {
            reason: "missing `href`".to_string(),
            payload: payload.clone(),
        })?;

        Url::parse(&href).map_err(|err| RenderError::Malformed {
            reason: format!("invalid `href` {href:?}: {err}"),
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};

    use httpmock::MockServer;

    use super::*;

    struct SteppingClock(AtomicI64);

    impl Clock for SteppingClock {
        fn now_millis(&self) -> i64 {
            self.0.fetch_add(1, Ordering::SeqCst)
        }
    }

    fn settings(endpoint: &str, use_cache: bool) -> RenderSettings {
        RenderSettings {
            api_key: "secret-key".to_string(),
            template: None,
            endpoint: Url::parse(endpoint).expect("endpoint"),
            use_cache,
        }
    }

    fn data() -> RenderData {
        let mut data = RenderData::new();
        data.insert("title".to_string(), "Hello".into());
        data
    }

    #[test]
    fn cache_busting_stamps_distinct_versions() {
        let client = RenderClient::new(Client::new(), &settings("https://render.test/", false))
            .with_clock(Arc::new(SteppingClock(AtomicI64::new(1_700_000_000_000))));

        let first = client.build_request("tpl", data());
        let second = client.build_request("tpl", data());

        assert_eq!(first.version, Some(1_700_000_000_000));
        assert_eq!(second.version, Some(1_700_000_000_001));
        assert_ne!(first.version, second.version);
    }

    #[test]
    fn cached_requests_carry_no_version() {
        let client = RenderClient::new(Client::new(), &settings("https://render.test/", true))
            .with_clock(Arc::new(SteppingClock(AtomicI64::new(5))));

        let first = client.build_request("tpl", data());
        let second = client.build_request("tpl", data());

        assert!(first.version.is_none());
        assert!(second.version.is_none());
        let body = serde_json::to_value(&first).expect("serialize");
        assert!(body.get("version").is_none());
    }

    #[tokio::test]
    async fn render_posts_template_data_and_credentials() -> Result<(), RenderError> {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("POST")
                .path("/api/v2/render")
                .header("x-api-key", "secret-key")
                .header("content-type", "application/json")
                .json_body_includes(r#"{"template":"tpl","data":{"title":"Hello"},"version":42}"#);
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"requestId":"r1","href":"https://cdn.test/r1.png"}"#);
        });

        let client = RenderClient::new(
            Client::new(),
            &settings(&server.url("/api/v2/render"), false),
        )
        .with_clock(Arc::new(SteppingClock(AtomicI64::new(42))));
        let request = client.build_request("tpl", data());
        let href = client.render(&request).await?;

        assert_eq!(href.as_str(), "https://cdn.test/r1.png");
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn rejected_render_keeps_remote_payload() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/render");
            then.status(401)
                .header("content-type", "application/json")
                .body(r#"{"msg":"invalid api key"}"#);
        });

        let client = RenderClient::new(Client::new(), &settings(&server.url("/render"), true));
        let err = client
            .render(&RenderRequest::new("tpl", data()))
            .await
            .expect_err("401 must fail");

        assert!(matches!(
            err,
            RenderError::Rejected {
                status: StatusCode::UNAUTHORIZED,
                ..
            }
        ));
        assert_eq!(err.payload(), Some(r#"{"msg":"invalid api key"}"#));
    }

    #[tokio::test]
    async fn response_without_href_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/render");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"requestId":"r1"}"#);
        });

        let client = RenderClient::new(Client::new(), &settings(&server.url("/render"), true));
        let err = client
            .render(&RenderRequest::new("tpl", data()))
            .await
            .expect_err("missing href");

        assert!(matches!(err, RenderError::Malformed { .. }));
    }
}
