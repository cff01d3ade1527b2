#![allow(dead_code)]
use arcabbs::error::{BoardError, Result};
use arcabbs::session::{FetchRequest, Method, Page, RawResponse, Response, Session};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const BOARD: &str = "https://board.example/b/test";

#[derive(Debug, Clone)]
pub enum Reply {
    Html(String),
    /// Serve an empty body from a different final URL.
    Redirect(String),
    Status(u16),
}

/// Session serving canned replies by URL and recording every request.
#[derive(Default)]
pub struct MockSession {
    anonymous: bool,
    replies: Mutex<HashMap<(Method, String), Reply>>,
    requests: Mutex<Vec<(String, FetchRequest)>>,
}

impl MockSession {
    pub fn authenticated() -> Arc<Self> {
        Arc::new(MockSession::default())
    }

    pub fn anonymous() -> Arc<Self> {
        Arc::new(MockSession { anonymous: true, ..Default::default() })
    }

    pub fn reply(&self, url: &str, reply: Reply) {
        self.replies.lock().unwrap().insert((Method::Get, url.to_string()), reply);
    }

    pub fn reply_post(&self, url: &str, reply: Reply) {
        self.replies.lock().unwrap().insert((Method::Post, url.to_string()), reply);
    }

    pub fn html(&self, url: &str, html: &str) {
        self.reply(url, Reply::Html(html.to_string()));
    }

    pub fn requests(&self) -> Vec<(String, FetchRequest)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|(url, _)| url).collect()
    }
}

#[async_trait]
impl Session for MockSession {
    fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    async fn fetch(&self, url: &str, request: FetchRequest) -> Result<Response> {
        self.requests.lock().unwrap().push((url.to_string(), request.clone()));
        let reply = self.replies.lock().unwrap().get(&(request.method, url.to_string())).cloned();
        let (final_url, body) = match reply {
            Some(Reply::Html(html)) => (url.to_string(), html),
            Some(Reply::Redirect(to)) => (to, String::new()),
            Some(Reply::Status(code)) => return Err(BoardError::transport(url, Some(code), format!("HTTP {code}"))),
            None => return Err(BoardError::transport(url, Some(404), "HTTP 404")),
        };
        if request.parse {
            Ok(Response::Page(Page { url: final_url, html: body }))
        } else {
            Ok(Response::Raw(RawResponse { url: final_url, status: 200, body }))
        }
    }
}

/// One listing row.
pub struct Row {
    pub id: u64,
    pub classes: &'static str,
    pub title: String,
    pub comments: Option<&'static str>,
    pub rate: &'static str,
}

impl Row {
    pub fn new(id: u64) -> Self {
        Row { id, classes: "", title: format!("Title {id}"), comments: Some("[3]"), rate: "5" }
    }

    pub fn html(&self) -> String {
        let comments = self.comments
            .map(|c| format!(r#"<span class="comment-count">{c}</span>"#))
            .unwrap_or_default();
        format!(
            r#"<a class="vrow {classes}" href="/b/test/{id}?p=1">
  <span class="vrow-top">
    <span class="vcol col-title"><span class="badge">free</span><span class="title">{title}</span>{comments}</span>
    <span class="vcol col-author"><span class="user-info">
      <span data-filter="user{id}">user{id}</span>
    </span></span>
  </span>
  <span class="vrow-bottom">
    <span class="vcol col-time"><time datetime="2024-01-02T03:04:05.000Z">2024-01-02</time></span>
    <span class="vcol col-view"> 1,042 </span>
    <span class="vcol col-rate">{rate}</span>
  </span>
</a>"#,
            classes = self.classes,
            id = self.id,
            title = self.title,
            comments = comments,
            rate = self.rate,
        )
    }
}

pub fn listing_page(rows: &[Row]) -> String {
    let body: String = rows.iter().map(Row::html).collect::<Vec<_>>().join("\n");
    format!(r#"<html><body><div class="article-list">{body}</div></body></html>"#)
}

pub fn write_page(csrf: &str, token: &str) -> String {
    format!(
        r#"<html><body><form id="article_write_form" method="post">
  <input type="hidden" name="_csrf" value="{csrf}">
  <input type="hidden" name="token" value="{token}">
  <select name="category"><option value="free">free</option></select>
  <input type="text" name="title" value="old title">
</form></body></html>"#
    )
}

pub fn article_page(id: u64, title: &str, content: &str) -> String {
    format!(
        r#"<html><body>
<div class="article-wrapper">
  <div class="article-head">
    <div class="title-row"><span class="badge">free</span><span class="title">
{title}
</span></div>
    <div class="info-row">
      <span class="user-info"><a href="/u/@writer" data-filter="writer">writer</a></span>
      <span class="article-info">
        <span class="article-rate">7</span>
        <span class="article-comments">2</span>
        <span class="article-views">1,234</span>
        <time datetime="2024-03-04T05:06:07.000Z">2024-03-04</time>
      </span>
    </div>
  </div>
  <div class="article-body"><div class="article-content">
<p>{content}</p>
</div></div>
  <form class="article-delete-form"><input type="hidden" name="_csrf" value="del-{id}"></form>
  <div class="article-comment">
    <div class="comment-item"><span class="user-info"><span data-filter="c1">c1</span></span><div class="message"> first! </div><time datetime="2024-03-04T06:00:00.000Z"></time></div>
    <div class="comment-item"><span class="user-info"><span data-filter="c2">c2</span></span><div class="message">second</div><time datetime="2024-03-04T07:00:00.000Z"></time></div>
  </div>
</div></body></html>"#
    )
}
