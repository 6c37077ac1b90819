use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::{HeaderMap, Method, header},
};
use std::{collections::HashMap, sync::Arc};

use crate::{
    cipher::Cipher,
    cookies::{CookieStore, is_loopback_host},
    error::AppError,
};

/// Largest request body read into the form map.
pub const MAX_FORM_BYTES: usize = 64 * 1024;

/// AdminRequest
///
/// The request context that flows through the dispatcher, guards and handlers.
/// Guards may mutate it: the auth gate records `admin_id`, and any of them may set or
/// clear cookies through `cookies`.
#[derive(Debug)]
pub struct AdminRequest {
    pub method: Method,
    // Raw request path, without the query string.
    pub path: String,
    pub host: String,
    pub query: HashMap<String, String>,
    pub form: HashMap<String, String>,
    // Named route parameters, filled in by the dispatcher after matching.
    pub params: HashMap<String, String>,
    pub cookies: CookieStore,
    // Set once the admin auth gate has accepted the request.
    pub admin_id: Option<i64>,
}

impl AdminRequest {
    /// new
    ///
    /// Builds a context from a method and a path with optional query string.
    /// Used by the HTTP adapter below and directly by tests.
    pub fn new(method: Method, uri: &str, cookies: CookieStore) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, parse_urlencoded(query.as_bytes())),
            None => (uri, HashMap::new()),
        };

        Self {
            method,
            path: path.to_string(),
            host: String::new(),
            query,
            form: HashMap::new(),
            params: HashMap::new(),
            cookies,
            admin_id: None,
        }
    }

    /// from_http
    ///
    /// Adapts an axum request: cookies come from the `Cookie` header, the `Secure` flag
    /// from the host (off for loopback), and urlencoded bodies are parsed into `form`.
    pub async fn from_http(request: Request, cipher: Arc<Cipher>) -> Result<Self, AppError> {
        let (parts, body) = request.into_parts();

        let host = request_host(&parts.headers, parts.uri.host());
        let secure = !is_loopback_host(&host);
        let cookies = CookieStore::from_headers(&parts.headers, cipher, secure);

        let uri = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let mut request = Self::new(parts.method, &uri, cookies);
        request.host = host;

        if is_form(&parts.headers) {
            request.form = read_form(body).await?;
        }

        Ok(request)
    }

    /// Replaces the form fields; convenient for building POST contexts in tests.
    pub fn with_form(mut self, fields: &[(&str, &str)]) -> Self {
        self.form = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form.get(name).map(String::as_str)
    }
}

fn request_host(headers: &HeaderMap, uri_host: Option<&str>) -> String {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or(uri_host)
        .unwrap_or_default()
        .to_string()
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

async fn read_form(body: Body) -> Result<HashMap<String, String>, AppError> {
    let bytes = to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(format!("unreadable form body: {e}")))?;
    Ok(parse_urlencoded(&bytes))
}

// Later duplicates of a key win.
fn parse_urlencoded(input: &[u8]) -> HashMap<String, String> {
    url::form_urlencoded::parse(input).into_owned().collect()
}
