//! Background loading of search results.
//!
//! # Design
//! Each `load` runs as one tokio task: connectivity probe and the metadata
//! stage on the blocking pool, then the concurrent cover stage. Starting a
//! new load aborts the previous task, and every load carries a generation
//! number. Publication is a compare on the watch channel: a task may only
//! move the state from `Loading { generation }` to `Delivered` for its own
//! generation, so a superseded load can never deliver, and each load
//! delivers at most once.
//!
//! Aborting cannot interrupt a request already running on the blocking
//! pool; it finishes in the background and its result is dropped.

use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::client::BooksClient;
use crate::config::ClientConfig;
use crate::connectivity::{Connectivity, HostProbe};
use crate::covers::attach_covers;
use crate::error::ApiError;
use crate::http::Transport;
use crate::pipeline::fetch_books;
use crate::transport::UreqTransport;
use crate::types::Book;

pub const NO_BOOKS_MESSAGE: &str = "No books found.";
pub const NO_INTERNET_MESSAGE: &str = "No internet connection.";

/// What a finished load hands to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// At least one book, in response order. May be a partial list.
    Books(Vec<Book>),
    /// Nothing to show. `cause` is `None` for a legitimate zero-hit search.
    Empty { cause: Option<ApiError> },
    /// The network was unavailable when the load started.
    Offline,
}

impl LoadOutcome {
    pub fn books(&self) -> &[Book] {
        match self {
            LoadOutcome::Books(books) => books,
            _ => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.books().is_empty()
    }

    /// Text for the empty-state view, or `None` when there are books to show.
    pub fn empty_state_message(&self) -> Option<&'static str> {
        match self {
            LoadOutcome::Books(books) if !books.is_empty() => None,
            LoadOutcome::Offline => Some(NO_INTERNET_MESSAGE),
            _ => Some(NO_BOOKS_MESSAGE),
        }
    }
}

#[derive(Debug, Clone)]
pub enum LoadState {
    Idle,
    Loading {
        generation: u64,
    },
    Delivered {
        generation: u64,
        outcome: Arc<LoadOutcome>,
    },
}

/// Handle to one load started by `BookLoader::load`.
#[derive(Debug)]
pub struct LoadTicket {
    generation: u64,
    receiver: oneshot::Receiver<Arc<LoadOutcome>>,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for this load's outcome.
    ///
    /// Returns `ApiError::Cancelled` if a newer load or a reset superseded it.
    pub async fn wait(self) -> Result<Arc<LoadOutcome>, ApiError> {
        self.receiver.await.map_err(|_| ApiError::Cancelled)
    }
}

pub struct BookLoader {
    client: BooksClient,
    transport: Arc<dyn Transport>,
    connectivity: Arc<dyn Connectivity>,
    cover_workers: usize,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    state: Arc<watch::Sender<LoadState>>,
}

impl BookLoader {
    pub fn new(
        client: BooksClient,
        transport: Arc<dyn Transport>,
        connectivity: Arc<dyn Connectivity>,
        cover_workers: usize,
    ) -> Self {
        let (state, _) = watch::channel(LoadState::Idle);
        Self {
            client,
            transport,
            connectivity,
            cover_workers: cover_workers.max(1),
            generation: 0,
            in_flight: None,
            state: Arc::new(state),
        }
    }

    /// Loader using the real network, probing the API host for
    /// connectivity.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let probe = HostProbe::for_url(&config.base_url, config.connect_timeout)?;
        Ok(Self::new(
            BooksClient::from_config(config),
            Arc::new(UreqTransport::from_config(config)),
            Arc::new(probe),
            config.cover_workers,
        ))
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    /// Start loading results for `query`, cancelling any load in flight.
    ///
    /// Must be called from within a tokio runtime.
    pub fn load(&mut self, query: &str) -> LoadTicket {
        self.cancel_in_flight();
        self.generation += 1;
        let generation = self.generation;
        let (sender, receiver) = oneshot::channel();
        self.state.send_replace(LoadState::Loading { generation });
        info!(generation, query, "load started");

        let job = LoadJob {
            client: self.client.clone(),
            transport: Arc::clone(&self.transport),
            connectivity: Arc::clone(&self.connectivity),
            cover_workers: self.cover_workers,
            query: query.to_string(),
        };
        let state = Arc::clone(&self.state);
        self.in_flight = Some(tokio::spawn(async move {
            let outcome = job.run().await;
            deliver(&state, generation, outcome, sender);
        }));

        LoadTicket {
            generation,
            receiver,
        }
    }

    /// Cancel any load in flight and return to `Idle`.
    pub fn reset(&mut self) {
        self.cancel_in_flight();
        self.state.send_replace(LoadState::Idle);
        debug!(generation = self.generation, "loader reset");
    }

    fn cancel_in_flight(&mut self) {
        if let Some(task) = self.in_flight.take() {
            if !task.is_finished() {
                debug!(generation = self.generation, "cancelling load in flight");
            }
            task.abort();
        }
    }
}

impl Drop for BookLoader {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}

struct LoadJob {
    client: BooksClient,
    transport: Arc<dyn Transport>,
    connectivity: Arc<dyn Connectivity>,
    cover_workers: usize,
    query: String,
}

impl LoadJob {
    async fn run(self) -> LoadOutcome {
        let LoadJob {
            client,
            transport,
            connectivity,
            cover_workers,
            query,
        } = self;

        match tokio::task::spawn_blocking(move || connectivity.is_connected()).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("no network connection");
                return LoadOutcome::Offline;
            }
            Err(e) => return worker_failed(e),
        }

        let fetch_client = client.clone();
        let fetch_transport = Arc::clone(&transport);
        let fetched = tokio::task::spawn_blocking(move || {
            fetch_books(&fetch_client, fetch_transport.as_ref(), &query)
        })
        .await;
        let books = match fetched {
            Ok(Ok(books)) => books,
            Ok(Err(e)) => {
                warn!(error = %e, "search produced no results");
                return LoadOutcome::Empty { cause: Some(e) };
            }
            Err(e) => return worker_failed(e),
        };
        if books.is_empty() {
            return LoadOutcome::Empty { cause: None };
        }

        LoadOutcome::Books(attach_covers(&client, transport, books, cover_workers).await)
    }
}

fn worker_failed(e: tokio::task::JoinError) -> LoadOutcome {
    error!(error = %e, "load worker failed");
    LoadOutcome::Empty {
        cause: Some(ApiError::Worker(e.to_string())),
    }
}

fn deliver(
    state: &watch::Sender<LoadState>,
    generation: u64,
    outcome: LoadOutcome,
    sender: oneshot::Sender<Arc<LoadOutcome>>,
) {
    let outcome = Arc::new(outcome);
    let published = state.send_if_modified(|current| {
        if matches!(current, LoadState::Loading { generation: g } if *g == generation) {
            *current = LoadState::Delivered {
                generation,
                outcome: Arc::clone(&outcome),
            };
            true
        } else {
            false
        }
    });
    if published {
        info!(generation, books = outcome.books().len(), "load delivered");
        let _ = sender.send(outcome);
    } else {
        debug!(generation, "stale load discarded");
    }
}
