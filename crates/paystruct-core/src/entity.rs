//! Entity records returned by the management API.
//!
//! These are plain records. Nothing here enforces uniqueness or referential
//! integrity; the backend owns those guarantees. Deserialisation is lenient
//! where the backend is known to vary (decimals serialised as strings, phases
//! as numbers or labels, dates with or without a time component).

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

// ─── Entity trait ────────────────────────────────────────────────────────────

/// Anything with a server-assigned identifier and a human-readable label.
pub trait Entity {
  fn id(&self) -> &str;

  /// Label used in confirmation prompts and detail titles.
  fn label(&self) -> String;
}

// ─── Contractor ──────────────────────────────────────────────────────────────

/// Whether a contractor is a company or a natural person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum ContractorKind {
  Legal,
  Natural,
}

impl ContractorKind {
  pub fn label(self) -> &'static str {
    match self {
      ContractorKind::Legal => "حقوقی",
      ContractorKind::Natural => "حقیقی",
    }
  }
}

/// A legal or natural person who performs contracted work.
///
/// For legal entities the company name is carried in `first_name` /
/// `last_name` (the form pre-fills `first_name` with "شرکت").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contractor {
  #[serde(rename = "ID", deserialize_with = "de::id")]
  pub id:              String,
  #[serde(default)]
  pub legal_entity:    bool,
  #[serde(default)]
  pub first_name:      String,
  #[serde(default)]
  pub last_name:       String,
  #[serde(default)]
  pub national_id:     String,
  #[serde(default, deserialize_with = "de::optional_string")]
  pub preferential_id: Option<String>,
}

impl Contractor {
  pub fn kind(&self) -> ContractorKind {
    if self.legal_entity {
      ContractorKind::Legal
    } else {
      ContractorKind::Natural
    }
  }

  /// `first_name last_name`, trimmed. Either half may be blank.
  pub fn display_name(&self) -> String {
    format!("{} {}", self.first_name.trim(), self.last_name.trim())
      .trim()
      .to_string()
  }
}

impl Entity for Contractor {
  fn id(&self) -> &str { &self.id }

  fn label(&self) -> String { self.display_name() }
}

// ─── Project ─────────────────────────────────────────────────────────────────

/// A construction project. Read-only from the client's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
  #[serde(rename = "ID", deserialize_with = "de::id")]
  pub id:    String,
  #[serde(default)]
  pub name:  String,
  /// Either a numeric phase code or a free-form label.
  #[serde(default, deserialize_with = "de::phase")]
  pub phase: Option<String>,
}

/// Labels for the backend's numeric project phases.
const PHASE_LABELS: [&str; 5] = [
  "برنامه‌ریزی",
  "طراحی مفهومی",
  "طراحی تفصیلی",
  "اجرا",
  "راه‌اندازی",
];

impl Project {
  /// Human label for `phase`: known numeric codes map to names, anything else
  /// is shown verbatim.
  pub fn phase_label(&self) -> Option<String> {
    let raw = self.phase.as_deref()?;
    match raw.parse::<usize>() {
      Ok(code) if code < PHASE_LABELS.len() => Some(PHASE_LABELS[code].to_string()),
      _ => Some(raw.to_string()),
    }
  }
}

impl Entity for Project {
  fn id(&self) -> &str { &self.id }

  fn label(&self) -> String { self.name.clone() }
}

// ─── Contract ────────────────────────────────────────────────────────────────

/// An agreement between the firm and a contractor, scoped to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
  #[serde(rename = "ID", deserialize_with = "de::id")]
  pub id:               String,
  #[serde(default)]
  pub contractor_id:    String,
  #[serde(default)]
  pub project_id:       String,
  #[serde(default)]
  pub contract_number:  String,
  #[serde(default, deserialize_with = "de::number")]
  pub gross_budget:     f64,
  #[serde(default, deserialize_with = "de::optional_string")]
  pub start_date:       Option<String>,
  #[serde(default, deserialize_with = "de::optional_string")]
  pub end_date:         Option<String>,
  #[serde(default, deserialize_with = "de::number")]
  pub insurance_rate:   f64,
  #[serde(default, deserialize_with = "de::number")]
  pub performance_bond: f64,
  #[serde(default, deserialize_with = "de::number")]
  pub added_value_tax:  f64,
  #[serde(default, alias = "scanned_file_url", deserialize_with = "de::optional_string")]
  pub scanned_file:     Option<String>,
}

impl Contract {
  pub fn start(&self) -> Option<NaiveDate> { self.start_date.as_deref().and_then(parse_date) }

  pub fn end(&self) -> Option<NaiveDate> { self.end_date.as_deref().and_then(parse_date) }
}

impl Entity for Contract {
  fn id(&self) -> &str { &self.id }

  fn label(&self) -> String { format!("قرارداد {}", self.contract_number) }
}

// ─── Status statement ────────────────────────────────────────────────────────

/// Approval state of a status statement. No transition rules are enforced
/// client-side.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StatementStatus {
  Pending,
  Approved,
  Rejected,
  Paid,
}

impl StatementStatus {
  pub fn label(self) -> &'static str {
    match self {
      StatementStatus::Pending => "در انتظار",
      StatementStatus::Approved => "تایید شده",
      StatementStatus::Rejected => "رد شده",
      StatementStatus::Paid => "پرداخت شده",
    }
  }
}

/// A periodic progress/billing report against a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusStatement {
  #[serde(rename = "ID", deserialize_with = "de::id")]
  pub id:                   String,
  #[serde(default)]
  pub contractor_id:        String,
  #[serde(default)]
  pub project_id:           String,
  #[serde(default, deserialize_with = "de::number")]
  pub progress_percent:     f64,
  #[serde(default, deserialize_with = "de::optional_string")]
  pub statement_date_start: Option<String>,
  #[serde(default, deserialize_with = "de::optional_string")]
  pub statement_date_end:   Option<String>,
  pub status:               StatementStatus,
  #[serde(default, deserialize_with = "de::number")]
  pub number:               f64,
  #[serde(default)]
  pub contract_number:      String,
  #[serde(default, deserialize_with = "de::number")]
  pub total_amount:         f64,
  #[serde(default)]
  pub project_name:         String,
}

impl StatusStatement {
  pub fn period_start(&self) -> Option<NaiveDate> {
    self.statement_date_start.as_deref().and_then(parse_date)
  }

  pub fn period_end(&self) -> Option<NaiveDate> {
    self.statement_date_end.as_deref().and_then(parse_date)
  }
}

impl Entity for StatusStatement {
  fn id(&self) -> &str { &self.id }

  fn label(&self) -> String {
    format!("صورت وضعیت {} قرارداد {}", self.number, self.contract_number)
  }
}

// ─── Dates ───────────────────────────────────────────────────────────────────

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date. Anything else is
/// `None`; callers treat that as "unknown", never as an error.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.date_naive());
  }
  raw
    .get(..10)
    .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

// ─── Lenient deserialisers ───────────────────────────────────────────────────

pub(crate) mod de {
  use serde::{Deserialize, Deserializer, de::Error as _};

  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Scalar {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
  }

  /// Identifiers arrive as strings (UUIDs) or, from older endpoints, numbers.
  pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Scalar::deserialize(d)? {
      Scalar::Int(n) => Ok(n.to_string()),
      Scalar::Float(f) => Ok(f.to_string()),
      Scalar::Str(s) => Ok(s),
      Scalar::Bool(_) => Err(D::Error::custom("identifier cannot be a boolean")),
    }
  }

  /// A JSON number or a numeric string; `null` reads as zero.
  pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    match Option::<Scalar>::deserialize(d)? {
      None => Ok(0.0),
      Some(Scalar::Int(n)) => Ok(n as f64),
      Some(Scalar::Float(f)) => Ok(f),
      Some(Scalar::Str(s)) if s.trim().is_empty() => Ok(0.0),
      Some(Scalar::Str(s)) => s
        .trim()
        .parse()
        .map_err(|_| D::Error::custom(format!("expected a number, got {s:?}"))),
      Some(Scalar::Bool(_)) => Err(D::Error::custom("expected a number, got a boolean")),
    }
  }

  /// `null` and the empty string both read as `None`.
  pub fn optional_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(d)?.filter(|s| !s.trim().is_empty()))
  }

  pub fn phase<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Scalar>::deserialize(d)? {
      None => None,
      Some(Scalar::Int(n)) => Some(n.to_string()),
      Some(Scalar::Float(f)) => Some(f.to_string()),
      Some(Scalar::Str(s)) if s.trim().is_empty() => None,
      Some(Scalar::Str(s)) => Some(s),
      Some(Scalar::Bool(b)) => Some(b.to_string()),
    })
  }
}
