//! The metadata stage of a search: build, fetch, parse.
//!
//! Runs synchronously on whatever thread calls it. Covers are not fetched
//! here; see `covers::attach_covers`.

use tracing::{error, info};

use crate::client::{check_status, BooksClient};
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport};
use crate::types::Book;

/// Execute `request` and return the body of a 200 response as text.
pub fn fetch_json(transport: &dyn Transport, request: &HttpRequest) -> Result<String, ApiError> {
    let response = transport.execute(request).inspect_err(|e| {
        error!(url = %request.url, error = %e, "problem receiving search results");
    })?;
    check_status(&response, 200).inspect_err(|_| {
        error!(url = %request.url, status = response.status, "unexpected response status");
    })?;
    Ok(response.text().into_owned())
}

/// Search for `query` and decode the matching books, without covers.
pub fn fetch_books(
    client: &BooksClient,
    transport: &dyn Transport,
    query: &str,
) -> Result<Vec<Book>, ApiError> {
    let request = client.build_search(query)?;
    let body = fetch_json(transport, &request)?;
    let books = client.parse_volumes(&body).inspect_err(|e| {
        error!(error = %e, "problem parsing search results");
    })?;
    info!(query, count = books.len(), "search parsed");
    Ok(books)
}
