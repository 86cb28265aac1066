//! Persian (Jalali) dates and the date-picker selection state.
//!
//! The picker deliberately offers a fixed 31-day grid for every month and
//! does not check the chosen day against the month length or leap years.
//! Contract date semantics depend on that behaviour, so it stays until a real
//! calendar library is adopted.

use std::{fmt, ops::RangeInclusive, str::FromStr};

use chrono::{Datelike, NaiveDate};

use crate::{
  Error, Result,
  digits::{to_english, to_persian},
};

/// Month names, Farvardin first.
pub const MONTH_NAMES: [&str; 12] = [
  "فروردین",
  "اردیبهشت",
  "خرداد",
  "تیر",
  "مرداد",
  "شهریور",
  "مهر",
  "آبان",
  "آذر",
  "دی",
  "بهمن",
  "اسفند",
];

pub fn month_name(month: u8) -> Option<&'static str> {
  MONTH_NAMES.get(usize::from(month).checked_sub(1)?).copied()
}

// ─── PersianDate ─────────────────────────────────────────────────────────────

/// A `{year, month, day}` value as emitted by the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PersianDate {
  pub year:  i32,
  pub month: u8,
  pub day:   u8,
}

impl PersianDate {
  /// Render the fields verbatim as an RFC 3339 midnight-UTC timestamp, which
  /// is what the status-statement endpoint expects.
  pub fn to_rfc3339(&self) -> String {
    format!("{:04}-{:02}-{:02}T00:00:00Z", self.year, self.month, self.day)
  }
}

impl fmt::Display for PersianDate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let ascii = format!("{}/{:02}/{:02}", self.year, self.month, self.day);
    f.write_str(&to_persian(&ascii))
  }
}

impl FromStr for PersianDate {
  type Err = Error;

  /// Accepts `YYYY/MM/DD` or `YYYY-MM-DD` in any digit script.
  fn from_str(s: &str) -> Result<Self> {
    let invalid = || Error::InvalidDate(s.to_string());
    let english = to_english(s.trim());
    let mut parts = english.split(['/', '-']);

    let year: i32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let month: u8 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let day: u8 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    if parts.next().is_some() {
      return Err(invalid());
    }

    if !(1..=12).contains(&month) || !DatePicker::days().contains(&day) {
      return Err(invalid());
    }
    Ok(PersianDate { year, month, day })
  }
}

// ─── Approximate conversion ──────────────────────────────────────────────────

/// Day counts used only by [`approximate_from_gregorian`].
const APPROX_MONTH_DAYS: [i64; 12] = [31, 31, 31, 31, 31, 31, 30, 30, 30, 30, 30, 29];

/// Rough Gregorian → Persian conversion, anchored on 21 March. Good enough to
/// seed the picker and label "today"; not a calendar implementation.
pub fn approximate_from_gregorian(date: NaiveDate) -> PersianDate {
  let year = persian_year_of(date);
  let Some(new_year) = NaiveDate::from_ymd_opt(year + 621, 3, 21) else {
    return PersianDate { year, month: 1, day: 1 };
  };
  let since = (date - new_year).num_days().max(0);

  let mut counted = 0;
  for (index, len) in APPROX_MONTH_DAYS.iter().enumerate() {
    if since < counted + len {
      return PersianDate {
        year,
        month: index as u8 + 1,
        day: (since - counted + 1) as u8,
      };
    }
    counted += len;
  }

  // Day 366: the year ends on a leap Esfand.
  PersianDate { year, month: 12, day: 30 }
}

/// The Persian year `date` falls in: Gregorian year − 621, one less before
/// 21 March.
pub fn persian_year_of(date: NaiveDate) -> i32 {
  let year = date.year() - 621;
  if (date.month(), date.day()) < (3, 21) { year - 1 } else { year }
}

// ─── Picker state ────────────────────────────────────────────────────────────

/// Tri-field selection state behind the date input.
///
/// `year`/`month` are the grid currently on display; `selected` is the last
/// value emitted by [`DatePicker::select_day`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePicker {
  current_year: i32,
  year:         i32,
  month:        u8,
  open:         bool,
  selected:     Option<PersianDate>,
}

impl DatePicker {
  /// Days offered for every month.
  pub const GRID_DAYS: u8 = 31;
  /// Years offered on either side of the current year.
  pub const YEAR_SPAN: i32 = 50;

  /// A closed picker showing the month containing `today`.
  pub fn new(today: NaiveDate) -> Self {
    let now = approximate_from_gregorian(today);
    Self {
      current_year: now.year,
      year:         now.year,
      month:        now.month,
      open:         false,
      selected:     None,
    }
  }

  /// A picker pre-set to `value`, as when editing an existing date.
  pub fn with_value(today: NaiveDate, value: PersianDate) -> Self {
    Self {
      year: value.year,
      month: value.month,
      selected: Some(value),
      ..Self::new(today)
    }
  }

  pub fn is_open(&self) -> bool { self.open }

  pub fn toggle(&mut self) { self.open = !self.open; }

  pub fn year(&self) -> i32 { self.year }

  pub fn month(&self) -> u8 { self.month }

  pub fn selected(&self) -> Option<PersianDate> { self.selected }

  /// Selectable years.
  pub fn years(&self) -> RangeInclusive<i32> {
    (self.current_year - Self::YEAR_SPAN)..=(self.current_year + Self::YEAR_SPAN)
  }

  /// The day grid, identical for every month.
  pub fn days() -> RangeInclusive<u8> { 1..=Self::GRID_DAYS }

  pub fn set_year(&mut self, year: i32) -> Result<()> {
    let years = self.years();
    if !years.contains(&year) {
      return Err(Error::YearOutOfRange {
        year,
        min: *years.start(),
        max: *years.end(),
      });
    }
    self.year = year;
    Ok(())
  }

  pub fn set_month(&mut self, month: u8) -> Result<()> {
    if month_name(month).is_none() {
      return Err(Error::InvalidDate(format!("month {month}")));
    }
    self.month = month;
    Ok(())
  }

  /// Pick `day` on the displayed grid, emit the resulting date and close.
  pub fn select_day(&mut self, day: u8) -> Result<PersianDate> {
    if !Self::days().contains(&day) {
      return Err(Error::InvalidDate(format!("day {day}")));
    }
    let date = PersianDate {
      year: self.year,
      month: self.month,
      day,
    };
    self.selected = Some(date);
    self.open = false;
    Ok(date)
  }

  /// Drive the picker to `date` field by field, as a user would.
  pub fn pick(&mut self, date: PersianDate) -> Result<PersianDate> {
    self.set_year(date.year)?;
    self.set_month(date.month)?;
    self.select_day(date.day)
  }

  pub fn clear(&mut self) { self.selected = None; }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 8, 1).unwrap() }

  #[test]
  fn parses_any_digit_script() {
    let expected = PersianDate { year: 1403, month: 5, day: 12 };
    assert_eq!("1403/05/12".parse::<PersianDate>().unwrap(), expected);
    assert_eq!("۱۴۰۳/۰۵/۱۲".parse::<PersianDate>().unwrap(), expected);
    assert_eq!("1403-5-12".parse::<PersianDate>().unwrap(), expected);
    assert!("1403/13/01".parse::<PersianDate>().is_err());
    assert!("1403/01".parse::<PersianDate>().is_err());
  }

  #[test]
  fn display_and_rfc3339() {
    let date = PersianDate { year: 1403, month: 1, day: 9 };
    assert_eq!(date.to_string(), "۱۴۰۳/۰۱/۰۹");
    assert_eq!(date.to_rfc3339(), "1403-01-09T00:00:00Z");
  }

  #[test]
  fn every_month_offers_31_days() {
    let mut picker = DatePicker::new(today());
    picker.set_month(12).unwrap();
    let date = picker.select_day(31).unwrap();
    assert_eq!(date.month, 12);
    assert_eq!(date.day, 31);
    assert_eq!(DatePicker::days().count(), 31);
  }

  #[test]
  fn year_range_is_bounded() {
    let mut picker = DatePicker::new(today());
    let current = persian_year_of(today());
    assert_eq!(current, 1403);
    assert!(picker.set_year(current + 50).is_ok());
    assert!(matches!(
      picker.set_year(current + 51),
      Err(Error::YearOutOfRange { .. })
    ));
  }

  #[test]
  fn select_emits_and_closes() {
    let mut picker = DatePicker::new(today());
    picker.toggle();
    assert!(picker.is_open());
    let date = picker
      .pick(PersianDate { year: 1402, month: 7, day: 3 })
      .unwrap();
    assert_eq!(picker.selected(), Some(date));
    assert!(!picker.is_open());
  }

  #[test]
  fn approximate_conversion() {
    let nowruz = NaiveDate::from_ymd_opt(2024, 3, 21).unwrap();
    assert_eq!(
      approximate_from_gregorian(nowruz),
      PersianDate { year: 1403, month: 1, day: 1 }
    );
    let before = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    assert_eq!(persian_year_of(before), 1402);
    assert_eq!(approximate_from_gregorian(today()).month, 5);
  }

  #[test]
  fn last_day_before_a_leap_nowruz_stays_in_esfand() {
    let eve = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
    assert_eq!(
      approximate_from_gregorian(eve),
      PersianDate { year: 1402, month: 12, day: 30 }
    );
    let common = NaiveDate::from_ymd_opt(2023, 3, 20).unwrap();
    assert_eq!(
      approximate_from_gregorian(common),
      PersianDate { year: 1401, month: 12, day: 29 }
    );
  }

  #[test]
  fn month_names() {
    assert_eq!(month_name(1), Some("فروردین"));
    assert_eq!(month_name(0), None);
    assert_eq!(month_name(13), None);
  }
}
