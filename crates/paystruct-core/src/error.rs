//! Error types for `paystruct-core`.
//!
//! Every variant's message is user-facing: it ends up verbatim in a toast.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// A required form field was left blank.
  #[error("{label} الزامی است")]
  MissingField {
    field: &'static str,
    label: &'static str,
  },

  #[error("مقدار نامعتبر برای {label}: {value:?}")]
  InvalidNumber {
    field: &'static str,
    label: &'static str,
    value: String,
  },

  #[error("حداقل یک آیتم باید وجود داشته باشد")]
  NoWbsItems,

  #[error("لطفا تمامی فیلدهای همه آیتم‌ها را پر کنید")]
  InvalidWbsItems,

  #[error("قالب آیتم نامعتبر است: {0:?}")]
  MalformedWbsItem(String),

  #[error("لطفا تاریخ شروع و پایان را وارد کنید")]
  MissingPeriod,

  #[error("تاریخ نامعتبر: {0:?}")]
  InvalidDate(String),

  #[error("سال {year} خارج از بازه {min} تا {max} است")]
  YearOutOfRange { year: i32, min: i32, max: i32 },

  #[error("رمز عبور و تکرار آن یکسان نیستند")]
  PasswordMismatch,
}

impl Error {
  /// The machine name of the offending field, when there is one.
  pub fn field(&self) -> Option<&'static str> {
    match self {
      Error::MissingField { field, .. } | Error::InvalidNumber { field, .. } => Some(field),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
