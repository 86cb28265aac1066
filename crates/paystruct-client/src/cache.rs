//! [`QueryCache`]: the last fetched array of one resource.
//!
//! Readers take synchronous snapshots. Writers go through [`QueryCache::refresh`],
//! which is serialised by an async gate: a caller that had to wait for an
//! in-flight fetch adopts that fetch's outcome instead of issuing a second
//! request. A failed fetch records its error and keeps the previous data. A
//! cancelled fetch leaves the state exactly as it found it.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{ApiClient, ClientError, Result, resource::Fetchable};

/// Point-in-time view of a cache.
#[derive(Debug)]
pub struct Snapshot<T> {
  /// `None` until the first successful fetch.
  pub data:        Option<Arc<Vec<T>>>,
  /// A fetch is running and there is nothing to show yet.
  pub is_loading:  bool,
  pub is_fetching: bool,
  /// Error of the most recent completed fetch, cleared by the next success.
  pub error:       Option<ClientError>,
  /// Invalidated since the data was fetched.
  pub stale:       bool,
  /// Number of successful fetches so far.
  pub version:     u64,
}

#[derive(Debug)]
struct State<T> {
  data:               Option<Arc<Vec<T>>>,
  fetching:           bool,
  stale:              bool,
  error:              Option<ClientError>,
  version:            u64,
  /// Bumped by every invalidation.
  generation:         u64,
  /// Number of fetches that ran to completion, successful or not.
  settled:            u64,
  /// `generation` at the start of the last settled fetch.
  settled_generation: u64,
}

struct Inner<T> {
  client: ApiClient,
  state:  RwLock<State<T>>,
  gate:   Mutex<()>,
}

/// Per-resource client cache. Cheap to clone; clones share state.
pub struct QueryCache<T> {
  inner: Arc<Inner<T>>,
}

impl<T> Clone for QueryCache<T> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<T: Fetchable> QueryCache<T> {
  pub fn new(client: ApiClient) -> Self {
    Self {
      inner: Arc::new(Inner {
        client,
        state: RwLock::new(State {
          data:               None,
          fetching:           false,
          stale:              false,
          error:              None,
          version:            0,
          generation:         0,
          settled:            0,
          settled_generation: 0,
        }),
        gate: Mutex::new(()),
      }),
    }
  }

  pub fn client(&self) -> &ApiClient { &self.inner.client }

  fn read(&self) -> RwLockReadGuard<'_, State<T>> {
    self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write(&self) -> RwLockWriteGuard<'_, State<T>> {
    self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn snapshot(&self) -> Snapshot<T> {
    let state = self.read();
    Snapshot {
      data:        state.data.clone(),
      is_loading:  state.fetching && state.data.is_none(),
      is_fetching: state.fetching,
      error:       state.error.clone(),
      stale:       state.stale,
      version:     state.version,
    }
  }

  pub fn data(&self) -> Option<Arc<Vec<T>>> { self.read().data.clone() }

  pub fn version(&self) -> u64 { self.read().version }

  /// Mark the data stale. Readers keep seeing it until the next fetch lands.
  pub fn invalidate(&self) {
    let mut state = self.write();
    state.stale = true;
    state.generation += 1;
    debug!(resource = %T::RESOURCE, generation = state.generation, "cache invalidated");
  }

  /// Fetch the collection, or share the outcome of a fetch this call queued
  /// behind. Cancellation at any point returns [`ClientError::Cancelled`]
  /// without touching the cache.
  pub async fn refresh(&self, cancel: &CancellationToken) -> Result<Arc<Vec<T>>> {
    let (ticket, generation) = {
      let state = self.read();
      (state.settled, state.generation)
    };

    let _gate = tokio::select! {
      gate = self.inner.gate.lock() => gate,
      () = cancel.cancelled() => return Err(ClientError::Cancelled),
    };

    if let Some(shared) = self.shared_outcome(ticket, generation) {
      debug!(resource = %T::RESOURCE, "sharing in-flight fetch");
      return shared;
    }

    let started = {
      let mut state = self.write();
      state.fetching = true;
      state.generation
    };
    debug!(resource = %T::RESOURCE, "fetch started");

    let outcome = tokio::select! {
      outcome = self.inner.client.fetch_all::<T>() => outcome,
      () = cancel.cancelled() => {
        self.write().fetching = false;
        debug!(resource = %T::RESOURCE, "fetch cancelled");
        return Err(ClientError::Cancelled);
      }
    };

    let mut state = self.write();
    state.fetching = false;
    state.settled += 1;
    state.settled_generation = started;
    match outcome {
      Ok(items) => {
        let data = Arc::new(items);
        state.data = Some(Arc::clone(&data));
        state.error = None;
        state.stale = state.generation != started;
        state.version += 1;
        debug!(resource = %T::RESOURCE, rows = data.len(), version = state.version, "fetch settled");
        Ok(data)
      }
      Err(err) => {
        debug!(resource = %T::RESOURCE, error = %err, "fetch failed, keeping previous data");
        state.error = Some(err.clone());
        Err(err)
      }
    }
  }

  /// The outcome of a fetch that settled while this caller waited, provided
  /// it started no earlier than the caller's view of the cache.
  fn shared_outcome(&self, ticket: u64, generation: u64) -> Option<Result<Arc<Vec<T>>>> {
    let state = self.read();
    if state.settled == ticket || state.settled_generation < generation {
      return None;
    }
    match (&state.error, &state.data) {
      (Some(err), _) => Some(Err(err.clone())),
      (None, Some(data)) => Some(Ok(Arc::clone(data))),
      (None, None) => None,
    }
  }

  /// Invalidate, then fetch. A fetch already in flight from before the
  /// invalidation is not shared.
  pub async fn invalidate_and_refetch(&self, cancel: &CancellationToken) -> Result<Arc<Vec<T>>> {
    self.invalidate();
    self.refresh(cancel).await
  }
}
