//! Create-form input and local validation.
//!
//! Every form is validated in full before anything touches the network; a
//! failed check names the offending field and nothing is sent.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  Error, Result,
  calendar::PersianDate,
  digits::{is_digits_only, parse_number, to_english},
  wbs::WbsItem,
};

/// `first_name` of every legal-entity contractor.
pub const LEGAL_ENTITY_FIRST_NAME: &str = "شرکت";

fn required(value: &str, field: &'static str, label: &'static str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::MissingField { field, label });
  }
  Ok(())
}

fn number(value: &str, field: &'static str, label: &'static str) -> Result<f64> {
  required(value, field, label)?;
  parse_number(value).ok_or_else(|| Error::InvalidNumber {
    field,
    label,
    value: value.to_string(),
  })
}

// ─── Contractor ──────────────────────────────────────────────────────────────

/// JSON body of `POST /management/contractors/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewContractor {
  pub legal_entity:    bool,
  pub first_name:      String,
  pub last_name:       String,
  pub national_id:     String,
  pub preferential_id: String,
}

impl NewContractor {
  pub fn natural(first_name: &str, last_name: &str, national_id: &str) -> Self {
    Self {
      legal_entity:    false,
      first_name:      first_name.trim().to_string(),
      last_name:       last_name.trim().to_string(),
      national_id:     to_english(national_id.trim()),
      preferential_id: String::new(),
    }
  }

  /// A company. The name goes in `last_name`; `first_name` is fixed.
  pub fn legal(name: &str, national_id: &str) -> Self {
    Self {
      legal_entity: true,
      first_name: LEGAL_ENTITY_FIRST_NAME.to_string(),
      ..Self::natural("", name, national_id)
    }
  }

  pub fn with_preferential_id(mut self, preferential_id: &str) -> Self {
    self.preferential_id = to_english(preferential_id.trim());
    self
  }

  pub fn validate(&self) -> Result<()> {
    if !self.legal_entity {
      required(&self.first_name, "first_name", "نام")?;
    }
    required(&self.last_name, "last_name", "نام خانوادگی")?;
    required(&self.national_id, "national_id", "شناسه ملی")?;
    if !is_digits_only(&self.national_id) {
      return Err(Error::InvalidNumber {
        field: "national_id",
        label: "شناسه ملی",
        value: self.national_id.clone(),
      });
    }
    Ok(())
  }
}

// ─── Contract ────────────────────────────────────────────────────────────────

/// The scanned agreement uploaded with a new contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
  pub file_name: String,
  pub content:   Vec<u8>,
}

/// Raw input of the new-contract form. Amounts are kept as typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewContract {
  pub contractor_id:    String,
  pub project_id:       String,
  pub contract_number:  String,
  pub gross_budget:     String,
  pub insurance_rate:   String,
  pub performance_bond: String,
  pub added_value_tax:  String,
  pub start_date:       Option<NaiveDate>,
  pub end_date:         Option<NaiveDate>,
  pub scanned_file:     Option<ScannedFile>,
}

/// A validated contract, ready to become multipart form data.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractSubmission {
  /// Text parts, in submission order.
  pub fields: Vec<(&'static str, String)>,
  pub file:   ScannedFile,
}

fn midnight_utc(date: NaiveDate) -> String { format!("{}T00:00:00Z", date.format("%Y-%m-%d")) }

impl NewContract {
  /// Check the form and produce its parts. The scanned file is checked
  /// first, matching the order the form reports problems in.
  pub fn validate(self) -> Result<ContractSubmission> {
    let file = self.scanned_file.ok_or(Error::MissingField {
      field: "scanned_file",
      label: "فایل قرارداد",
    })?;

    required(&self.contractor_id, "contractor_id", "پیمانکار")?;
    required(&self.project_id, "project_id", "پروژه")?;
    required(&self.contract_number, "contract_number", "شماره قرارداد")?;
    let gross_budget = number(&self.gross_budget, "gross_budget", "مبلغ قرارداد")?;
    let insurance_rate = number(&self.insurance_rate, "insurance_rate", "نرخ بیمه")?;
    let performance_bond = number(&self.performance_bond, "performance_bond", "حسن انجام کار")?;
    let added_value_tax = number(&self.added_value_tax, "added_value_tax", "مالیات بر ارزش افزوده")?;
    let start = self.start_date.ok_or(Error::MissingField {
      field: "start_date",
      label: "تاریخ شروع",
    })?;
    let end = self.end_date.ok_or(Error::MissingField {
      field: "end_date",
      label: "تاریخ پایان",
    })?;

    Ok(ContractSubmission {
      fields: vec![
        ("contractor_id", self.contractor_id.trim().to_string()),
        ("project_id", self.project_id.trim().to_string()),
        ("contract_number", self.contract_number.trim().to_string()),
        ("gross_budget", gross_budget.to_string()),
        ("insurance_rate", insurance_rate.to_string()),
        ("performance_bond", performance_bond.to_string()),
        ("added_value_tax", added_value_tax.to_string()),
        ("start_date", midnight_utc(start)),
        ("end_date", midnight_utc(end)),
      ],
      file,
    })
  }
}

// ─── Status statement ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewStatusStatement {
  pub contract_id: String,
  pub from:        Option<PersianDate>,
  pub to:          Option<PersianDate>,
}

/// JSON body of `POST /management/contracts/status-statement/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusStatementPayload {
  pub contract_id:         String,
  pub statement_date_from: String,
  pub statement_date_to:   String,
}

impl NewStatusStatement {
  pub fn validate(&self) -> Result<StatusStatementPayload> {
    required(&self.contract_id, "contract_id", "قرارداد")?;
    let (Some(from), Some(to)) = (self.from, self.to) else {
      return Err(Error::MissingPeriod);
    };
    Ok(StatusStatementPayload {
      contract_id:         self.contract_id.trim().to_string(),
      statement_date_from: from.to_rfc3339(),
      statement_date_to:   to.to_rfc3339(),
    })
  }
}

// ─── WBS ─────────────────────────────────────────────────────────────────────

/// JSON body of `POST /management/contracts/wbs/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewWbs {
  pub contract_number: String,
  pub items:           Vec<WbsItem>,
}

impl NewWbs {
  pub fn validate(&self) -> Result<()> {
    required(&self.contract_number, "contract_number", "شماره قرارداد")?;
    if self.items.is_empty() {
      return Err(Error::NoWbsItems);
    }
    if !self.items.iter().all(WbsItem::is_complete) {
      return Err(Error::InvalidWbsItems);
    }
    Ok(())
  }
}

// ─── Credentials ─────────────────────────────────────────────────────────────

/// JSON body of the sign-in and sign-up endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}

impl Credentials {
  pub fn sign_in(email: &str, password: &str) -> Result<Self> {
    required(email, "email", "ایمیل")?;
    required(password, "password", "رمز عبور")?;
    Ok(Self {
      email:    email.trim().to_string(),
      password: password.to_string(),
    })
  }

  pub fn sign_up(email: &str, password: &str, confirm: &str) -> Result<Self> {
    let credentials = Self::sign_in(email, password)?;
    if password != confirm {
      return Err(Error::PasswordMismatch);
    }
    Ok(credentials)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn complete_contract() -> NewContract {
    NewContract {
      contractor_id:    "c1".into(),
      project_id:       "p1".into(),
      contract_number:  "۱۴۰۳-۱۲".into(),
      gross_budget:     "۱,۵۰۰,۰۰۰".into(),
      insurance_rate:   "5".into(),
      performance_bond: "10".into(),
      added_value_tax:  "9.5".into(),
      start_date:       NaiveDate::from_ymd_opt(2024, 3, 20),
      end_date:         NaiveDate::from_ymd_opt(2025, 3, 20),
      scanned_file:     Some(ScannedFile {
        file_name: "contract.pdf".into(),
        content:   b"%PDF-1.4".to_vec(),
      }),
    }
  }

  #[test]
  fn legal_contractor_gets_fixed_first_name() {
    let contractor = NewContractor::legal("سازه پایدار", "۱۰۱۰۱۰");
    assert_eq!(contractor.first_name, LEGAL_ENTITY_FIRST_NAME);
    assert_eq!(contractor.national_id, "101010");
    assert!(contractor.validate().is_ok());
  }

  #[test]
  fn natural_contractor_needs_first_name() {
    let err = NewContractor::natural(" ", "Rezaei", "123").validate().unwrap_err();
    assert_eq!(err.field(), Some("first_name"));
    assert_eq!(err.to_string(), "نام الزامی است");

    let err = NewContractor::natural("Ali", "Rezaei", "12a").validate().unwrap_err();
    assert_eq!(err.field(), Some("national_id"));
  }

  #[test]
  fn contract_without_file_is_rejected_first() {
    let form = NewContract {
      scanned_file: None,
      contract_number: String::new(),
      ..complete_contract()
    };
    let err = form.validate().unwrap_err();
    assert_eq!(err.to_string(), "فایل قرارداد الزامی است");
  }

  #[test]
  fn contract_fields_are_normalised() {
    let submission = complete_contract().validate().unwrap();
    let field = |name: &str| {
      submission
        .fields
        .iter()
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.as_str())
    };
    assert_eq!(field("gross_budget"), Some("1500000"));
    assert_eq!(field("added_value_tax"), Some("9.5"));
    assert_eq!(field("start_date"), Some("2024-03-20T00:00:00Z"));
    assert_eq!(field("contract_number"), Some("۱۴۰۳-۱۲"));
    assert_eq!(submission.file.file_name, "contract.pdf");
  }

  #[test]
  fn contract_rejects_bad_amounts() {
    let form = NewContract {
      insurance_rate: "درصد".into(),
      ..complete_contract()
    };
    assert!(matches!(
      form.validate(),
      Err(Error::InvalidNumber { field: "insurance_rate", .. })
    ));
  }

  #[test]
  fn statement_needs_both_dates() {
    let mut form = NewStatusStatement {
      contract_id: "c1".into(),
      from: Some(PersianDate { year: 1403, month: 1, day: 1 }),
      to: None,
    };
    assert_eq!(form.validate(), Err(Error::MissingPeriod));

    form.to = Some(PersianDate { year: 1403, month: 1, day: 31 });
    let payload = form.validate().unwrap();
    assert_eq!(payload.statement_date_from, "1403-01-01T00:00:00Z");
    assert_eq!(payload.statement_date_to, "1403-01-31T00:00:00Z");
  }

  #[test]
  fn wbs_validation() {
    let item = |quantity| WbsItem {
      description: "بتن".into(),
      quantity,
      unit: "m3".into(),
      unit_price: 100.0,
    };
    let mut form = NewWbs {
      contract_number: "C-1".into(),
      items: vec![],
    };
    assert_eq!(form.validate(), Err(Error::NoWbsItems));

    form.items = vec![item(1.0), item(0.0)];
    assert_eq!(form.validate(), Err(Error::InvalidWbsItems));

    form.items.pop();
    assert_eq!(form.validate(), Ok(()));

    form.contract_number = " ".into();
    assert_eq!(form.validate().unwrap_err().field(), Some("contract_number"));
  }

  #[test]
  fn sign_up_checks_confirmation() {
    assert_eq!(
      Credentials::sign_up("a@b.c", "secret", "secrets"),
      Err(Error::PasswordMismatch)
    );
    let ok = Credentials::sign_up(" a@b.c ", "secret", "secret").unwrap();
    assert_eq!(ok.email, "a@b.c");
    assert!(Credentials::sign_in("", "x").is_err());
  }
}
