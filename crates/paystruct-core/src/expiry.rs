//! Contract status, derived from the end date on every access.
//!
//! There is no stored status field and no alerting on transitions.

use chrono::NaiveDate;
use strum::EnumIter;

/// Contracts ending within this many days (inclusive) are near expiry.
pub const NEAR_EXPIRY_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum ContractStatus {
  Active,
  NearExpiry,
  Expired,
}

impl ContractStatus {
  /// Classify a contract ending on `end` as seen on `today`.
  pub fn classify(end: NaiveDate, today: NaiveDate) -> Self {
    let days = (end - today).num_days();
    if days < 0 {
      ContractStatus::Expired
    } else if days <= NEAR_EXPIRY_DAYS {
      ContractStatus::NearExpiry
    } else {
      ContractStatus::Active
    }
  }

  /// `true` for anything not yet expired; near-expiry contracts still count
  /// as active in the header statistics.
  pub fn is_live(self) -> bool { !matches!(self, ContractStatus::Expired) }

  pub fn label(self) -> &'static str {
    match self {
      ContractStatus::Active => "فعال",
      ContractStatus::NearExpiry => "نزدیک به انقضا",
      ContractStatus::Expired => "منقضی",
    }
  }
}
