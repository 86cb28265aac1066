//! Per-entity instances of the queryable collection.
//!
//! Each list screen is described here once: which fields the search box
//! looks at, what the category filter compares, how every column sorts and
//! which direction a freshly chosen column starts in.

use std::borrow::Cow;

use strum::IntoEnumIterator;

use crate::{
  collection::{ListQuery, Queryable, SortDirection, SortState, SortValue},
  entity::{Contractor, ContractorKind, StatementStatus},
  expiry::ContractStatus,
  join::{EnhancedContract, EnhancedStatement},
};

/// A table column: its header and, when sortable, the key it sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column<K> {
  pub title: &'static str,
  pub key:   Option<K>,
}

const fn col<K>(title: &'static str, key: K) -> Column<K> { Column { title, key: Some(key) } }

// ─── Contractors ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractorKey {
  Name,
  Kind,
  NationalId,
  PreferentialId,
}

pub type ContractorQuery = ListQuery<ContractorKey, ContractorKind>;

pub const CONTRACTOR_COLUMNS: [Column<ContractorKey>; 4] = [
  col("نام", ContractorKey::Name),
  col("نوع", ContractorKey::Kind),
  col("شناسه ملی", ContractorKey::NationalId),
  col("کد اقتصادی", ContractorKey::PreferentialId),
];

pub fn contractor_query() -> ContractorQuery { ListQuery::new(SortState::new(SortDirection::Ascending)) }

pub fn contractor_categories() -> Vec<ContractorKind> { ContractorKind::iter().collect() }

impl Queryable for Contractor {
  type Category = ContractorKind;
  type Key = ContractorKey;

  fn search_fields(&self) -> Vec<Cow<'_, str>> {
    let mut fields = vec![
      Cow::Borrowed(self.first_name.as_str()),
      Cow::Borrowed(self.last_name.as_str()),
      Cow::Borrowed(self.national_id.as_str()),
    ];
    if let Some(preferential) = &self.preferential_id {
      fields.push(Cow::Borrowed(preferential.as_str()));
    }
    fields
  }

  fn category(&self) -> Option<ContractorKind> { Some(self.kind()) }

  fn sort_value(&self, key: ContractorKey) -> SortValue<'_> {
    match key {
      ContractorKey::Name => self.display_name().into(),
      ContractorKey::Kind => self.kind().label().into(),
      ContractorKey::NationalId => self.national_id.as_str().into(),
      ContractorKey::PreferentialId => self.preferential_id.as_deref().unwrap_or_default().into(),
    }
  }
}

// ─── Contracts ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKey {
  Number,
  Contractor,
  Project,
  Budget,
  InsuranceRate,
  PerformanceBond,
  AddedValueTax,
  StartDate,
  EndDate,
}

pub type ContractQuery = ListQuery<ContractKey, ContractStatus>;

pub const CONTRACT_COLUMNS: [Column<ContractKey>; 10] = [
  col("شماره قرارداد", ContractKey::Number),
  col("نام پیمانکار", ContractKey::Contractor),
  col("پروژه", ContractKey::Project),
  col("مبلغ قرارداد (ریال)", ContractKey::Budget),
  col("بیمه (%)", ContractKey::InsuranceRate),
  col("حسن انجام کار (%)", ContractKey::PerformanceBond),
  col("مالیات (%)", ContractKey::AddedValueTax),
  col("تاریخ شروع", ContractKey::StartDate),
  col("تاریخ پایان", ContractKey::EndDate),
  Column { title: "وضعیت", key: None },
];

pub fn contract_query() -> ContractQuery { ListQuery::new(SortState::new(SortDirection::Ascending)) }

pub fn contract_categories() -> Vec<ContractStatus> { ContractStatus::iter().collect() }

impl Queryable for EnhancedContract {
  type Category = ContractStatus;
  type Key = ContractKey;

  fn search_fields(&self) -> Vec<Cow<'_, str>> {
    let mut fields = vec![Cow::Borrowed(self.contract.contract_number.as_str())];
    if let Some(contractor) = &self.contractor {
      fields.push(Cow::Borrowed(contractor.first_name.as_str()));
      fields.push(Cow::Borrowed(contractor.last_name.as_str()));
    }
    if let Some(project) = &self.project {
      fields.push(Cow::Borrowed(project.name.as_str()));
    }
    fields
  }

  fn category(&self) -> Option<ContractStatus> { self.status }

  fn sort_value(&self, key: ContractKey) -> SortValue<'_> {
    let c = &self.contract;
    match key {
      ContractKey::Number => c.contract_number.as_str().into(),
      ContractKey::Contractor => self.contractor_name().unwrap_or_default().into(),
      ContractKey::Project => self.project_name().unwrap_or_default().into(),
      ContractKey::Budget => c.gross_budget.into(),
      ContractKey::InsuranceRate => c.insurance_rate.into(),
      ContractKey::PerformanceBond => c.performance_bond.into(),
      ContractKey::AddedValueTax => c.added_value_tax.into(),
      ContractKey::StartDate => c.start().into(),
      ContractKey::EndDate => c.end().into(),
    }
  }
}

// ─── Status statements ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKey {
  Number,
  ContractNumber,
  Contractor,
  Project,
  Progress,
  PeriodStart,
  PeriodEnd,
  Amount,
}

pub type StatementQuery = ListQuery<StatementKey, StatementStatus>;

pub const STATEMENT_COLUMNS: [Column<StatementKey>; 9] = [
  col("شماره", StatementKey::Number),
  col("شماره قرارداد", StatementKey::ContractNumber),
  col("پیمانکار", StatementKey::Contractor),
  col("پروژه", StatementKey::Project),
  col("پیشرفت (%)", StatementKey::Progress),
  col("از تاریخ", StatementKey::PeriodStart),
  col("تا تاریخ", StatementKey::PeriodEnd),
  col("مبلغ کل (ریال)", StatementKey::Amount),
  Column { title: "وضعیت", key: None },
];

/// Statements open newest first, and new columns start descending.
pub fn statement_query() -> StatementQuery {
  ListQuery::new(SortState::by(StatementKey::Number, SortDirection::Descending))
}

pub fn statement_categories() -> Vec<StatementStatus> { StatementStatus::iter().collect() }

impl Queryable for EnhancedStatement {
  type Category = StatementStatus;
  type Key = StatementKey;

  fn search_fields(&self) -> Vec<Cow<'_, str>> {
    let s = &self.statement;
    let mut fields = vec![
      Cow::Borrowed(s.contract_number.as_str()),
      Cow::Borrowed(s.project_name.as_str()),
    ];
    if let Some(name) = self.contractor_name() {
      fields.push(Cow::Owned(name));
    }
    fields
  }

  fn category(&self) -> Option<StatementStatus> { Some(self.statement.status) }

  fn sort_value(&self, key: StatementKey) -> SortValue<'_> {
    let s = &self.statement;
    match key {
      StatementKey::Number => s.number.into(),
      StatementKey::ContractNumber => s.contract_number.as_str().into(),
      StatementKey::Contractor => self.contractor_name().unwrap_or_default().into(),
      StatementKey::Project => s.project_name.as_str().into(),
      StatementKey::Progress => s.progress_percent.into(),
      StatementKey::PeriodStart => s.period_start().into(),
      StatementKey::PeriodEnd => s.period_end().into(),
      StatementKey::Amount => s.total_amount.into(),
    }
  }
}
