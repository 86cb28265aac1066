//! Digit transliteration between Persian, Arabic-Indic and ASCII glyphs, and
//! the number/currency formatters built on top of it.
//!
//! Everything here is a pure lookup-table transform. Formatting always goes
//! through ASCII first (grouping, decimals) and transliterates last.

use std::fmt::Display;

const PERSIAN_DIGITS: [char; 10] = ['۰', '۱', '۲', '۳', '۴', '۵', '۶', '۷', '۸', '۹'];
const ARABIC_DIGITS: [char; 10] = ['٠', '١', '٢', '٣', '٤', '٥', '٦', '٧', '٨', '٩'];

/// Suffix appended by [`format_currency`].
pub const CURRENCY_UNIT: &str = "ریال";

// ─── Transliteration ─────────────────────────────────────────────────────────

/// Replace every ASCII digit in `input` with its Persian glyph.
pub fn to_persian(input: &str) -> String {
  input
    .chars()
    .map(|c| match c.to_digit(10) {
      Some(d) if c.is_ascii_digit() => PERSIAN_DIGITS[d as usize],
      _ => c,
    })
    .collect()
}

/// [`to_persian`] over anything with a `Display` impl (numbers, mostly).
pub fn persian<T: Display>(value: T) -> String { to_persian(&value.to_string()) }

/// Replace Persian and Arabic-Indic digits with ASCII digits. Everything else,
/// ASCII digits included, passes through untouched.
pub fn to_english(input: &str) -> String {
  input.chars().map(ascii_digit).collect()
}

/// Map a single Persian or Arabic-Indic digit to ASCII.
pub fn ascii_digit(c: char) -> char {
  let index = PERSIAN_DIGITS
    .iter()
    .position(|&p| p == c)
    .or_else(|| ARABIC_DIGITS.iter().position(|&a| a == c));
  match index {
    Some(i) => char::from(b'0' + i as u8),
    None => c,
  }
}

/// `true` when `input` is non-empty and made only of digits, in any script.
pub fn is_digits_only(input: &str) -> bool {
  let english = to_english(input);
  !english.is_empty() && english.chars().all(|c| c.is_ascii_digit())
}

// ─── Formatting ──────────────────────────────────────────────────────────────

/// Format `value` with `,` thousands separators and exactly `decimals`
/// fractional digits, then transliterate to Persian glyphs.
pub fn format_number(value: f64, decimals: usize) -> String {
  to_persian(&group_ascii(value, decimals))
}

/// [`format_number`] followed by the currency unit.
pub fn format_currency(amount: f64, decimals: usize) -> String {
  format!("{} {CURRENCY_UNIT}", format_number(amount, decimals))
}

/// ASCII rendering used by [`format_number`]; `1234567.891, 2` → `1,234,567.89`.
pub fn group_ascii(value: f64, decimals: usize) -> String {
  if !value.is_finite() {
    return value.to_string();
  }
  let formatted = format!("{:.*}", decimals, value.abs());
  let (integer, fraction) = match formatted.split_once('.') {
    Some((i, f)) => (i, Some(f)),
    None => (formatted.as_str(), None),
  };

  let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
  for (i, c) in integer.chars().enumerate() {
    if i > 0 && (integer.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(c);
  }

  // A negative value that rounds to zero renders without a sign.
  let is_zero = formatted.chars().all(|c| c == '0' || c == '.');
  let sign = if value.is_sign_negative() && !is_zero { "-" } else { "" };

  match fraction {
    Some(f) => format!("{sign}{grouped}.{f}"),
    None => format!("{sign}{grouped}"),
  }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Parse a number typed in any digit script.
///
/// Digits are transliterated, every character other than ASCII digits, `.`
/// and `-` is dropped, and the longest numeric prefix of what remains is
/// parsed. Returns `None` when no digits survive.
pub fn parse_number(input: &str) -> Option<f64> {
  let cleaned: String = to_english(input)
    .chars()
    .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
    .collect();

  let mut end = 0;
  let mut seen_digit = false;
  let mut seen_dot = false;
  for (i, c) in cleaned.char_indices() {
    match c {
      '-' if i == 0 => {}
      '.' if !seen_dot => seen_dot = true,
      d if d.is_ascii_digit() => seen_digit = true,
      _ => break,
    }
    end = i + 1;
  }

  if !seen_digit {
    return None;
  }
  cleaned[..end].trim_end_matches('.').parse().ok()
}
