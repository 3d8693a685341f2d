//! Book search client core.
//!
//! # Overview
//! Turns a user query into a list of `Book` records from the Google Books
//! `volumes` endpoint: build the request URL, GET it, decode the JSON with
//! defaults for optional fields, then download and decode each cover.
//!
//! # Design
//! - `BooksClient` is stateless: it builds `HttpRequest` values and parses
//!   `HttpResponse` values without touching the network, so hosts that do
//!   their own I/O (the C ABI) can use it directly.
//! - `Transport` is the only I/O seam; `UreqTransport` is the bundled
//!   blocking implementation with connect/read timeouts.
//! - Covers are a separate stage after parsing (`covers::attach_covers`),
//!   fetched concurrently with a bounded number of workers.
//! - `BookLoader` runs the whole pipeline as a cancellable tokio task and
//!   delivers one `LoadOutcome` per load.

pub mod client;
pub mod config;
pub mod connectivity;
pub mod covers;
pub mod error;
pub mod http;
pub mod loader;
pub mod pipeline;
pub mod transport;
pub mod types;

pub use client::BooksClient;
pub use config::ClientConfig;
pub use connectivity::{AssumeOnline, Connectivity, HostProbe};
pub use covers::{attach_covers, decode_cover, fetch_cover};
pub use error::ApiError;
pub use http::{HttpRequest, HttpResponse, Transport};
pub use loader::{BookLoader, LoadOutcome, LoadState, LoadTicket, NO_BOOKS_MESSAGE, NO_INTERNET_MESSAGE};
pub use pipeline::{fetch_books, fetch_json};
pub use transport::UreqTransport;
pub use types::{Book, CoverImage, NO_AUTHORS, NO_DESCRIPTION, PLACEHOLDER_COVER_URL};
