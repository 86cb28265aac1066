//! Management API collections and the records they hold.

use std::fmt;

use paystruct_core::entity::{Contract, Contractor, Entity, Project, StatusStatement};
use serde::de::DeserializeOwned;

/// A collection endpoint under `{base}/management/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
  Contractors,
  Projects,
  Contracts,
  StatusStatements,
  Wbs,
}

impl Resource {
  /// Collection path, with the trailing slash the backend routes on.
  pub fn path(self) -> &'static str {
    match self {
      Resource::Contractors => "/management/contractors/",
      Resource::Projects => "/management/projects/",
      Resource::Contracts => "/management/contracts/",
      Resource::StatusStatements => "/management/contracts/status-statement/",
      Resource::Wbs => "/management/contracts/wbs/",
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Resource::Contractors => "contractors",
      Resource::Projects => "projects",
      Resource::Contracts => "contracts",
      Resource::StatusStatements => "status statements",
      Resource::Wbs => "wbs",
    }
  }

  /// Message used when a failed response carries no `message` of its own.
  pub fn fallback_message(self) -> String { format!("failure in getting {}", self.name()) }
}

impl fmt::Display for Resource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// A record type served by one [`Resource`] collection.
pub trait Fetchable: DeserializeOwned + Entity + Send + Sync + 'static {
  const RESOURCE: Resource;
}

impl Fetchable for Contractor {
  const RESOURCE: Resource = Resource::Contractors;
}

impl Fetchable for Project {
  const RESOURCE: Resource = Resource::Projects;
}

impl Fetchable for Contract {
  const RESOURCE: Resource = Resource::Contracts;
}

impl Fetchable for StatusStatement {
  const RESOURCE: Resource = Resource::StatusStatements;
}
