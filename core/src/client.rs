//! Stateless request builder and response parser for the volumes API.
//!
//! # Design
//! `BooksClient` holds only configuration (base endpoint, result cap,
//! placeholder cover) and carries no mutable state between calls. Every
//! search produces a fresh `HttpRequest` value; the caller executes it and
//! hands the `HttpResponse` back to `parse_search`.
//!
//! Parsing is deliberately asymmetric. Structural problems (body is not JSON,
//! top level is not an object, `items` is not an array) fail the whole
//! response. A malformed entry inside `items` stops the loop and the books
//! decoded before it are returned.

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::{normalize_max_results, ClientConfig, DEFAULT_MAX_RESULTS};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{Book, VolumeItem, PLACEHOLDER_COVER_URL};

/// Synchronous, stateless client for the volumes search endpoint.
#[derive(Debug, Clone)]
pub struct BooksClient {
    base_url: String,
    max_results: u32,
    placeholder_cover_url: String,
}

impl BooksClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            placeholder_cover_url: PLACEHOLDER_COVER_URL.to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url)
            .with_max_results(config.max_results)
            .with_placeholder_cover_url(&config.placeholder_cover_url)
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = normalize_max_results(max_results);
        self
    }

    pub fn with_placeholder_cover_url(mut self, url: &str) -> Self {
        self.placeholder_cover_url = url.to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_results(&self) -> u32 {
        self.max_results
    }

    pub fn placeholder_cover_url(&self) -> &str {
        &self.placeholder_cover_url
    }

    /// Build the search request for `query`.
    ///
    /// Whitespace runs collapse to a single `+`; other reserved characters
    /// are form-urlencoded.
    pub fn build_search(&self, query: &str) -> Result<HttpRequest, ApiError> {
        let terms = query.split_whitespace().collect::<Vec<_>>().join(" ");
        if terms.is_empty() {
            return Err(ApiError::EmptyQuery);
        }
        let encoded: String = url::form_urlencoded::byte_serialize(terms.as_bytes()).collect();
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        let raw = format!(
            "{}{separator}q={encoded}&maxResults={}",
            self.base_url, self.max_results
        );
        let url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))?;
        debug!(url = %url, "built search request");
        Ok(HttpRequest {
            url: url.to_string(),
            headers: vec![("accept".to_string(), "application/json".to_string())],
        })
    }

    /// Build the request that downloads a cover thumbnail.
    pub fn build_cover_request(&self, thumbnail_url: &str) -> HttpRequest {
        HttpRequest {
            url: thumbnail_url.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn parse_search(&self, response: HttpResponse) -> Result<Vec<Book>, ApiError> {
        check_status(&response, 200)?;
        self.parse_volumes(&response.text())
    }

    /// Decode a volumes response body into books, in response order.
    ///
    /// An empty or blank body, or a body without `items`, yields no books.
    pub fn parse_volumes(&self, body: &str) -> Result<Vec<Book>, ApiError> {
        if body.trim().is_empty() {
            debug!("empty response body");
            return Ok(Vec::new());
        }
        let root: Value = serde_json::from_str(body)
            .map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        let Value::Object(mut root) = root else {
            return Err(ApiError::DeserializationError(format!(
                "expected a JSON object, got {}",
                json_kind(&root)
            )));
        };
        let items = match root.remove("items") {
            None | Some(Value::Null) => {
                debug!("response carries no items");
                return Ok(Vec::new());
            }
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(ApiError::DeserializationError(format!(
                    "`items` must be an array, got {}",
                    json_kind(&other)
                )))
            }
        };

        let mut books = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<VolumeItem>(item) {
                Ok(item) => books.push(Book::from_volume(
                    item.volume_info,
                    &self.placeholder_cover_url,
                )),
                Err(e) => {
                    warn!(index, error = %e, kept = books.len(), "malformed volume, stopping");
                    break;
                }
            }
        }
        Ok(books)
    }
}

/// Map anything but `expected` to `ApiError::HttpError`.
pub(crate) fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.text().into_owned(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
