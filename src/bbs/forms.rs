//! Hidden-token extraction and form bodies for authenticated writes.

use crate::document::Document;
use crate::error::{BoardError, Result};
use crate::session::FormBody;

/// Inputs of the write form; the edit page reuses the same form.
pub const WRITE_FORM_INPUTS: &str = "#article_write_form input";

/// Any CSRF input on an article page (used by delete).
pub const CSRF_INPUT: &str = r#"input[name="_csrf"]"#;

/// Anti-forgery values scraped from a form page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormTokens {
    pub csrf: String,
    pub token: String,
}

/// Scan the inputs matched by `inputs` for the `_csrf` and `token` fields.
/// When a name repeats, the last occurrence wins.
pub fn extract_tokens(doc: &dyn Document, inputs: &str) -> Result<FormTokens> {
    let mut csrf = None;
    let mut token = None;
    for input in doc.select(inputs)? {
        match input.attr("name").as_deref() {
            Some("_csrf") => csrf = input.attr("value"),
            Some("token") => token = input.attr("value"),
            _ => {}
        }
    }
    match (csrf, token) {
        (Some(csrf), Some(token)) => Ok(FormTokens { csrf, token }),
        (None, _) => Err(BoardError::malformed(format!("no _csrf input in `{inputs}`"))),
        (_, None) => Err(BoardError::malformed(format!("no token input in `{inputs}`"))),
    }
}

/// First `_csrf` value anywhere on the page.
pub fn extract_csrf(doc: &dyn Document) -> Result<String> {
    doc.select_required(CSRF_INPUT)?.attr_required("value")
}

/// Body for the write and edit endpoints.
pub fn article_form(tokens: &FormTokens, category: &str, title: &str, content: &str) -> FormBody {
    let mut body = FormBody::new();
    body.append("_csrf", &tokens.csrf)
        .append("token", &tokens.token)
        .append("contentType", "html")
        .append("category", category)
        .append("agreePreventDelete", "on")
        .append("title", title)
        .append("content", content);
    body
}
