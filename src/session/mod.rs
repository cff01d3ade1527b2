//! Session abstraction used for every network operation.
//!
//! A [`Session`] fetches a URL and hands back either a [`Page`] (when the
//! caller wants to query the HTML) or a [`RawResponse`] (when only the final
//! URL and status matter, e.g. after a form POST redirects). Sessions are
//! shared between boards and are only read from this crate.

use async_trait::async_trait;

use crate::document::HtmlDocument;
use crate::error::Result;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

/// Ordered `application/x-www-form-urlencoded` body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormBody {
    fields: Vec<(String, String)>,
}

impl FormBody {
    pub fn new() -> Self { Self::default() }

    pub fn append(&mut self, name: &str, value: &str) -> &mut Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    pub fn fields(&self) -> &[(String, String)] { &self.fields }

    /// Value of the first field called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields.iter())
            .finish()
    }
}

/// Options for a single fetch.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<FormBody>,
    /// `true` returns a [`Response::Page`], `false` a [`Response::Raw`].
    pub parse: bool,
}

impl Default for FetchRequest {
    fn default() -> Self {
        FetchRequest { method: Method::Get, headers: Vec::new(), body: None, parse: true }
    }
}

impl FetchRequest {
    /// Plain GET returning a parsed page.
    pub fn page() -> Self { Self::default() }

    /// Form POST returning the raw response, sent with a referer.
    pub fn form_post(body: FormBody, referer: &str) -> Self {
        FetchRequest {
            method: Method::Post,
            headers: vec![("referer".to_string(), referer.to_string())],
            body: Some(body),
            parse: false,
        }
    }
}

/// A fetched HTML page. Parse it with [`Page::document`] once the fetch is done.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects.
    pub url: String,
    pub html: String,
}

impl Page {
    pub fn document(&self) -> HtmlDocument {
        HtmlDocument::parse(&self.html)
    }
}

/// An unparsed response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone)]
pub enum Response {
    Page(Page),
    Raw(RawResponse),
}

impl Response {
    pub fn url(&self) -> &str {
        match self {
            Response::Page(p) => &p.url,
            Response::Raw(r) => &r.url,
        }
    }

    pub fn into_page(self) -> Page {
        match self {
            Response::Page(p) => p,
            Response::Raw(r) => Page { url: r.url, html: r.body },
        }
    }

    pub fn into_raw(self) -> RawResponse {
        match self {
            Response::Raw(r) => r,
            Response::Page(p) => RawResponse { url: p.url, status: 200, body: p.html },
        }
    }
}

/// Authenticated (or anonymous) transport shared by boards.
#[async_trait]
pub trait Session: Send + Sync {
    /// Anonymous sessions can read but cannot write.
    fn is_anonymous(&self) -> bool;

    async fn fetch(&self, url: &str, request: FetchRequest) -> Result<Response>;

    /// GET `url` and return the parsed page.
    async fn fetch_page(&self, url: &str) -> Result<Page> {
        Ok(self.fetch(url, FetchRequest::page()).await?.into_page())
    }
}
