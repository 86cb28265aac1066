//! Cross-reference join between sibling collections.
//!
//! Contracts and statements carry foreign identifiers only. Before rendering
//! they are enriched with the referenced contractor and project, looked up in
//! an [`EntityIndex`] built once per source update. A reference that cannot
//! be resolved (sibling not loaded yet, deleted, mismatched id) stays `None`.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::{
  entity::{Contract, Contractor, Entity, Project, StatusStatement},
  expiry::ContractStatus,
};

// ─── Index ───────────────────────────────────────────────────────────────────

/// Borrowing hash index over a slice of entities, keyed by identifier.
#[derive(Debug)]
pub struct EntityIndex<'a, T> {
  by_id: HashMap<&'a str, &'a T>,
}

impl<'a, T: Entity> EntityIndex<'a, T> {
  /// Index `items`. With duplicate identifiers the first occurrence wins, as
  /// a linear `find` would.
  pub fn build(items: &'a [T]) -> Self {
    let mut by_id = HashMap::with_capacity(items.len());
    for item in items {
      by_id.entry(item.id()).or_insert(item);
    }
    Self { by_id }
  }

  /// An index over nothing, for a sibling cache that has not loaded.
  pub fn empty() -> Self {
    Self {
      by_id: HashMap::new(),
    }
  }

  /// Index `items` if present, otherwise an empty index.
  pub fn from_loaded(items: Option<&'a [T]>) -> Self { items.map_or_else(Self::empty, Self::build) }

  pub fn get(&self, id: &str) -> Option<&'a T> { self.by_id.get(id).copied() }

  pub fn len(&self) -> usize { self.by_id.len() }

  pub fn is_empty(&self) -> bool { self.by_id.is_empty() }
}

// ─── Enhanced records ────────────────────────────────────────────────────────

/// A contract with its joined contractor and project and its derived status.
/// Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedContract {
  pub contract:   Contract,
  pub contractor: Option<Contractor>,
  pub project:    Option<Project>,
  /// `None` when the end date is missing or unparseable.
  pub status:     Option<ContractStatus>,
}

impl EnhancedContract {
  /// Contractor name, or `None` when the reference did not resolve.
  pub fn contractor_name(&self) -> Option<String> {
    self.contractor.as_ref().map(Contractor::display_name)
  }

  pub fn project_name(&self) -> Option<&str> { self.project.as_ref().map(|p| p.name.as_str()) }
}

/// A status statement with its joined contractor.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedStatement {
  pub statement:  StatusStatement,
  pub contractor: Option<Contractor>,
}

impl EnhancedStatement {
  pub fn contractor_name(&self) -> Option<String> {
    self.contractor.as_ref().map(Contractor::display_name)
  }
}

// ─── Join ────────────────────────────────────────────────────────────────────

/// Enrich every contract. `today` fixes the status classification so a whole
/// render sees one consistent date.
pub fn join_contracts(
  contracts: &[Contract],
  contractors: &EntityIndex<'_, Contractor>,
  projects: &EntityIndex<'_, Project>,
  today: NaiveDate,
) -> Vec<EnhancedContract> {
  contracts
    .iter()
    .map(|contract| EnhancedContract {
      contractor: contractors.get(&contract.contractor_id).cloned(),
      project:    projects.get(&contract.project_id).cloned(),
      status:     contract.end().map(|end| ContractStatus::classify(end, today)),
      contract:   contract.clone(),
    })
    .collect()
}

pub fn join_statements(
  statements: &[StatusStatement],
  contractors: &EntityIndex<'_, Contractor>,
) -> Vec<EnhancedStatement> {
  statements
    .iter()
    .map(|statement| EnhancedStatement {
      contractor: contractors.get(&statement.contractor_id).cloned(),
      statement:  statement.clone(),
    })
    .collect()
}
