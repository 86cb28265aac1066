//! Summary statistics for the header cards and footer totals.
//!
//! Header cards are computed over the whole loaded collection; footers over
//! the currently filtered view. Both are plain folds, recomputed on render.

use crate::{
  entity::{Contractor, ContractorKind, StatementStatus},
  expiry::ContractStatus,
  join::{EnhancedContract, EnhancedStatement},
};

/// Mean of `sum` over `count` items, zero for an empty collection.
fn average(sum: f64, count: usize) -> f64 { if count == 0 { 0.0 } else { sum / count as f64 } }

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContractStats {
  pub total:          usize,
  /// Not yet expired, near-expiry included.
  pub active:         usize,
  pub near_expiry:    usize,
  pub expired:        usize,
  pub total_budget:   f64,
  pub average_budget: f64,
}

impl ContractStats {
  /// Contracts with a missing or unparseable end date count toward `total`
  /// and the budget only.
  pub fn compute<'a, I>(contracts: I) -> Self
  where
    I: IntoIterator<Item = &'a EnhancedContract>,
  {
    let mut stats = Self::default();
    for c in contracts {
      stats.total += 1;
      stats.total_budget += c.contract.gross_budget;
      match c.status {
        Some(status) if status.is_live() => {
          stats.active += 1;
          if status == ContractStatus::NearExpiry {
            stats.near_expiry += 1;
          }
        }
        Some(ContractStatus::Expired) => stats.expired += 1,
        _ => {}
      }
    }
    stats.average_budget = average(stats.total_budget, stats.total);
    stats
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractorStats {
  pub total:   usize,
  pub legal:   usize,
  pub natural: usize,
}

impl ContractorStats {
  pub fn compute<'a, I>(contractors: I) -> Self
  where
    I: IntoIterator<Item = &'a Contractor>,
  {
    contractors.into_iter().fold(Self::default(), |mut acc, c| {
      acc.total += 1;
      match c.kind() {
        ContractorKind::Legal => acc.legal += 1,
        ContractorKind::Natural => acc.natural += 1,
      }
      acc
    })
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatementStats {
  pub total:            usize,
  pub pending:          usize,
  pub approved:         usize,
  pub rejected:         usize,
  pub paid:             usize,
  pub total_amount:     f64,
  pub average_progress: f64,
}

impl StatementStats {
  pub fn compute<'a, I>(statements: I) -> Self
  where
    I: IntoIterator<Item = &'a EnhancedStatement>,
  {
    let mut stats = Self::default();
    let mut progress = 0.0;
    for s in statements {
      let s = &s.statement;
      stats.total += 1;
      stats.total_amount += s.total_amount;
      progress += s.progress_percent;
      match s.status {
        StatementStatus::Pending => stats.pending += 1,
        StatementStatus::Approved => stats.approved += 1,
        StatementStatus::Rejected => stats.rejected += 1,
        StatementStatus::Paid => stats.paid += 1,
      }
    }
    stats.average_progress = average(progress, stats.total);
    stats
  }

  pub fn count(&self, status: StatementStatus) -> usize {
    match status {
      StatementStatus::Pending => self.pending,
      StatementStatus::Approved => self.approved,
      StatementStatus::Rejected => self.rejected,
      StatementStatus::Paid => self.paid,
    }
  }
}

/// Footer totals for a filtered view: row count and summed amount.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Footer {
  pub rows:   usize,
  pub amount: f64,
}

impl Footer {
  pub fn sum<T>(rows: &[&T], amount: impl Fn(&T) -> f64) -> Self {
    Self {
      rows:   rows.len(),
      amount: rows.iter().map(|r| amount(*r)).sum(),
    }
  }

  pub fn contracts(rows: &[&EnhancedContract]) -> Self { Self::sum(rows, |c| c.contract.gross_budget) }

  pub fn statements(rows: &[&EnhancedStatement]) -> Self {
    Self::sum(rows, |s| s.statement.total_amount)
  }
}
