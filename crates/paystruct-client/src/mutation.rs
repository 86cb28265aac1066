//! Create and delete operations.
//!
//! Forms are validated before any request is built. A successful write
//! invalidates the owning cache and refetches; a failed one returns the error
//! and leaves the cache exactly as it was.

use std::future::Future;

use paystruct_core::form::{NewContract, NewContractor, NewStatusStatement, NewWbs};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{ApiClient, QueryCache, Result, resource::Fetchable, resource::Resource};

pub async fn create_contractor(client: &ApiClient, form: &NewContractor) -> Result<()> {
  form.validate()?;
  client.create_json(Resource::Contractors, form).await
}

/// Multipart upload. A form without a scanned file never reaches the network.
pub async fn create_contract(client: &ApiClient, form: NewContract) -> Result<()> {
  let submission = form.validate()?;
  client.create_contract(submission).await
}

pub async fn create_status_statement(client: &ApiClient, form: &NewStatusStatement) -> Result<()> {
  let payload = form.validate()?;
  client.create_json(Resource::StatusStatements, &payload).await
}

pub async fn create_wbs(client: &ApiClient, form: &NewWbs) -> Result<()> {
  form.validate()?;
  client.create_json(Resource::Wbs, form).await
}

/// Await `write`; on success invalidate `cache` and refetch it.
///
/// Only the write's own error is returned. A refetch failure is logged and
/// ends up in the cache's error state, where the list view shows it.
pub async fn commit<T, F>(cache: &QueryCache<T>, cancel: &CancellationToken, write: F) -> Result<()>
where
  T: Fetchable,
  F: Future<Output = Result<()>>,
{
  write.await?;
  info!(resource = %T::RESOURCE, "write accepted, refetching");
  if let Err(err) = cache.invalidate_and_refetch(cancel).await {
    warn!(resource = %T::RESOURCE, error = %err, "refetch after write failed");
  }
  Ok(())
}

/// `DELETE {endpoint}{id}` followed by invalidation of the owning cache.
pub async fn delete_and_invalidate<T: Fetchable>(
  cache: &QueryCache<T>,
  id: &str,
  cancel: &CancellationToken,
) -> Result<()> {
  commit(cache, cancel, cache.client().delete(T::RESOURCE, id)).await
}
