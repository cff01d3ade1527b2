//! `reqwest`-backed session with a cookie jar.

use async_trait::async_trait;
use log::{debug, trace};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};
use std::time::Duration;

use super::{FetchRequest, Method, Page, RawResponse, Response, Session};
use crate::config::SessionConfig;
use crate::error::{BoardError, Result};
use crate::metrics;

/// HTTP session used by the CLI and by applications talking to a real board.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: reqwest::Client,
    anonymous: bool,
}

impl HttpSession {
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = config.cookie.as_deref().filter(|c| !c.trim().is_empty()) {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| BoardError::authentication(format!("invalid cookie header: {e}")))?;
            headers.insert(COOKIE, value);
        }
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .map_err(|e| BoardError::transport("", None, e))?;
        Ok(HttpSession { client, anonymous: config.anonymous })
    }
}

#[async_trait]
impl Session for HttpSession {
    fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    async fn fetch(&self, url: &str, request: FetchRequest) -> Result<Response> {
        debug!("{:?} {}", request.method, url);
        metrics::inc_page_fetch();

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| BoardError::transport(url, None, format!("bad header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| BoardError::transport(url, None, format!("bad header value: {e}")))?;
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            let encoded = body.encode();
            trace!("POST body for {}: {}", url, encoded);
            builder = builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encoded);
        }

        let resp = builder.send().await
            .map_err(|e| BoardError::transport(url, e.status().map(|s| s.as_u16()), e))?;
        let status = resp.status();
        let final_url = resp.url().to_string();
        if !status.is_success() {
            return Err(BoardError::transport(url, Some(status.as_u16()), format!("HTTP {status}")));
        }
        let body = resp.text().await
            .map_err(|e| BoardError::transport(url, Some(status.as_u16()), e))?;
        trace!("{} -> {} ({} bytes)", url, final_url, body.len());

        if request.parse {
            Ok(Response::Page(Page { url: final_url, html: body }))
        } else {
            Ok(Response::Raw(RawResponse { url: final_url, status: status.as_u16(), body }))
        }
    }
}
