/// Request/response descriptors and the HTTP transport.
///
/// The API layer describes each call as an [`ApiRequest`] (method, URL
/// template, path variables, query, JSON body) and receives an
/// [`ApiResponse`] (status, decoded body, headers). The [`Transport`] trait is
/// the only seam between the two, so tests can swap in a recording mock.
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use log::debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::errors::InvoiceXpressError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Outbound request descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path template with `{name}` placeholders, e.g. `/clients/{client_id}.json`.
    pub url_template: String,
    pub path_variables: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub json_body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url_template: impl Into<String>) -> Self {
        Self {
            method,
            url_template: url_template.into(),
            path_variables: BTreeMap::new(),
            query: BTreeMap::new(),
            json_body: None,
        }
    }

    pub fn get(url_template: impl Into<String>) -> Self {
        Self::new(Method::Get, url_template)
    }

    pub fn post(url_template: impl Into<String>) -> Self {
        Self::new(Method::Post, url_template)
    }

    pub fn put(url_template: impl Into<String>) -> Self {
        Self::new(Method::Put, url_template)
    }

    pub fn delete(url_template: impl Into<String>) -> Self {
        Self::new(Method::Delete, url_template)
    }

    pub fn var(mut self, name: &str, value: impl ToString) -> Self {
        self.path_variables.insert(name.to_string(), value.to_string());
        self
    }

    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.insert(name.to_string(), value.to_string());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json_body = Some(body);
        self
    }

    /// The path with every placeholder substituted.
    pub fn render_path(&self) -> Result<String, InvoiceXpressError> {
        render_template(&self.url_template, &self.path_variables)
    }

    /// Full URL against `host`, which may itself carry placeholders.
    pub fn render_url(&self, host: &str) -> Result<String, InvoiceXpressError> {
        let template = format!(
            "{}/{}",
            host.trim_end_matches('/'),
            self.url_template.trim_start_matches('/')
        );
        render_template(&template, &self.path_variables)
    }
}

/// Substitute `{name}` placeholders. Missing or empty variables fail with
/// `MissingUrlVariable`, listing every offending name.
pub fn render_template(
    template: &str,
    variables: &BTreeMap<String, String>,
) -> Result<String, InvoiceXpressError> {
    let mut out = String::with_capacity(template.len());
    let mut missing = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let name = &after[..close];
        match variables.get(name).filter(|v| !v.is_empty()) {
            Some(value) => out.push_str(value),
            None => missing.push(name.to_string()),
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);

    if missing.is_empty() {
        Ok(out)
    } else {
        Err(InvoiceXpressError::MissingUrlVariable {
            missing,
            template: template.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Inbound response descriptor. `body` is `None` when empty or not JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
}

impl ApiResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self {
            status,
            body,
            headers: BTreeMap::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Dotted-path lookup into the body, e.g. `output.pdfUrl`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = self.body.as_ref()?;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn body_or_null(&self) -> &Value {
        self.body.as_ref().unwrap_or(&Value::Null)
    }

    /// Convert into `InvalidResponse`, keeping status, body and headers.
    pub fn into_error(self) -> InvoiceXpressError {
        let message = StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unexpected response")
            .to_string();
        InvoiceXpressError::InvalidResponse {
            status: self.status,
            message,
            body: self.body,
            headers: self.headers,
        }
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Sends a request descriptor and returns the decoded response. Non-2xx
/// statuses are returned as responses, not errors.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, InvoiceXpressError>> + Send;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, InvoiceXpressError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, InvoiceXpressError>> + Send {
        async move {
            let rendered = request.render_url(&self.config.host)?;
            let mut url = Url::parse(&rendered)?;
            if !request.query.is_empty() {
                url.query_pairs_mut().extend_pairs(request.query.iter());
            }
            debug!(
                "transport.send method={} path={}",
                request.method, request.url_template
            );

            let mut builder = self
                .client
                .request(request.method.into(), url)
                .header(ACCEPT, "application/json")
                .header(CONTENT_TYPE, "application/json; charset=utf-8");
            if let Some(body) = &request.json_body {
                builder = builder.body(serde_json::to_vec(body)?);
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
                .collect();
            let text = response.text().await?;
            let body = if text.trim().is_empty() {
                None
            } else {
                match serde_json::from_str(&text) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        debug!(
                            "transport.send non_json_body status={} error={}",
                            status, e
                        );
                        None
                    }
                }
            };
            debug!("transport.send status={} body_len={}", status, text.len());

            Ok(ApiResponse {
                status,
                body,
                headers,
            })
        }
    }
}
