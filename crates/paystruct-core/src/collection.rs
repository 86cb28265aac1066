//! Generic queryable collection: free-text search, category filter and a
//! single-key sort with a direction toggle.
//!
//! Every list screen is an instance of [`ListQuery`] over a type implementing
//! [`Queryable`]. Results are fresh vectors of references; the source slice is
//! never reordered.

use std::{borrow::Cow, cmp::Ordering};

use chrono::NaiveDate;

use crate::digits::ascii_digit;

// ─── Queryable ───────────────────────────────────────────────────────────────

/// A record that can be searched, categorised and sorted.
pub trait Queryable {
  /// Sortable columns.
  type Key: Copy + Eq;
  /// Values the category filter compares against.
  type Category: Copy + Eq;

  /// Fields searched by the free-text query.
  fn search_fields(&self) -> Vec<Cow<'_, str>>;

  /// `None` when the category cannot be derived (e.g. an unparseable date).
  fn category(&self) -> Option<Self::Category>;

  fn sort_value(&self, key: Self::Key) -> SortValue<'_>;
}

// ─── Sort values ─────────────────────────────────────────────────────────────

/// A typed sort key with an explicit total order.
///
/// Values of the same variant compare naturally. Different present variants
/// order `Number < Date < Text`. `Missing` is handled by the sorter and always
/// lands at the end.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue<'a> {
  Text(Cow<'a, str>),
  Number(f64),
  Date(NaiveDate),
  Missing,
}

impl SortValue<'_> {
  fn rank(&self) -> u8 {
    match self {
      SortValue::Number(_) => 0,
      SortValue::Date(_) => 1,
      SortValue::Text(_) => 2,
      SortValue::Missing => 3,
    }
  }

  /// Total order over present values.
  pub fn compare(&self, other: &Self) -> Ordering {
    match (self, other) {
      (SortValue::Text(a), SortValue::Text(b)) => compare_text(a, b),
      (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
      (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
      _ => self.rank().cmp(&other.rank()),
    }
  }
}

impl<'a> From<&'a str> for SortValue<'a> {
  fn from(value: &'a str) -> Self {
    if value.trim().is_empty() {
      SortValue::Missing
    } else {
      SortValue::Text(Cow::Borrowed(value))
    }
  }
}

impl From<String> for SortValue<'_> {
  fn from(value: String) -> Self {
    if value.trim().is_empty() {
      SortValue::Missing
    } else {
      SortValue::Text(Cow::Owned(value))
    }
  }
}

impl From<f64> for SortValue<'_> {
  fn from(value: f64) -> Self { SortValue::Number(value) }
}

impl From<Option<NaiveDate>> for SortValue<'_> {
  fn from(value: Option<NaiveDate>) -> Self { value.map_or(SortValue::Missing, SortValue::Date) }
}

/// Normalise text for matching and ordering: digits to ASCII, Arabic yeh/kaf
/// to their Persian forms, lowercase.
pub fn normalize(input: &str) -> String {
  input
    .chars()
    .map(|c| match c {
      'ي' | 'ى' => 'ی',
      'ك' => 'ک',
      other => ascii_digit(other),
    })
    .flat_map(char::to_lowercase)
    .collect()
}

/// Collation used for text columns: normalised first, raw text as tie-break
/// so the order is total.
pub fn compare_text(a: &str, b: &str) -> Ordering {
  normalize(a).cmp(&normalize(b)).then_with(|| a.cmp(b))
}

// ─── Sort state ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
  Ascending,
  Descending,
}

impl SortDirection {
  pub fn flipped(self) -> Self {
    match self {
      SortDirection::Ascending => SortDirection::Descending,
      SortDirection::Descending => SortDirection::Ascending,
    }
  }

  pub fn apply(self, ordering: Ordering) -> Ordering {
    match self {
      SortDirection::Ascending => ordering,
      SortDirection::Descending => ordering.reverse(),
    }
  }
}

/// The active sort column and direction of one screen.
///
/// Activating the current column flips the direction; activating another
/// column switches to it with the screen's default direction. The direction
/// only means something once a column has been chosen: before that the
/// collection keeps its fetched order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<K> {
  pub key:           Option<K>,
  pub direction:     SortDirection,
  default_direction: SortDirection,
}

impl<K: Copy + Eq> SortState<K> {
  pub fn new(default_direction: SortDirection) -> Self {
    Self {
      key: None,
      direction: default_direction,
      default_direction,
    }
  }

  pub fn by(key: K, default_direction: SortDirection) -> Self {
    Self {
      key: Some(key),
      ..Self::new(default_direction)
    }
  }

  pub fn default_direction(&self) -> SortDirection { self.default_direction }

  pub fn toggle(&mut self, key: K) {
    if self.key == Some(key) {
      self.direction = self.direction.flipped();
    } else {
      self.key = Some(key);
      self.direction = self.default_direction;
    }
  }

  /// Header marker for `key`.
  pub fn indicator(&self, key: K) -> &'static str {
    match (self.key == Some(key), self.direction) {
      (true, SortDirection::Ascending) => " ▲",
      (true, SortDirection::Descending) => " ▼",
      (false, _) => " ⇅",
    }
  }
}

// ─── Category filter ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter<C> {
  /// The "all" sentinel; disables filtering.
  #[default]
  All,
  Only(C),
}

impl<C: Copy + Eq> CategoryFilter<C> {
  pub fn matches(&self, category: Option<C>) -> bool {
    match self {
      CategoryFilter::All => true,
      CategoryFilter::Only(wanted) => category == Some(*wanted),
    }
  }

  /// Step through `All` followed by each of `choices`, wrapping around.
  pub fn cycle(self, choices: &[C]) -> Self {
    match self {
      CategoryFilter::All => choices.first().map_or(CategoryFilter::All, |c| CategoryFilter::Only(*c)),
      CategoryFilter::Only(current) => {
        let next = choices
          .iter()
          .position(|c| *c == current)
          .and_then(|i| choices.get(i + 1));
        next.map_or(CategoryFilter::All, |c| CategoryFilter::Only(*c))
      }
    }
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Case-insensitive substring match of `query` against any of `fields`.
/// A blank query matches everything.
pub fn matches_text(fields: &[Cow<'_, str>], query: &str) -> bool {
  let needle = normalize(query.trim());
  if needle.is_empty() {
    return true;
  }
  fields.iter().any(|f| normalize(f).contains(&needle))
}

/// Keep the items matching both predicates, in their original order.
pub fn filter<'a, T, I>(items: I, text: &str, category: &CategoryFilter<T::Category>) -> Vec<&'a T>
where
  T: Queryable + 'a,
  I: IntoIterator<Item = &'a T>,
{
  items
    .into_iter()
    .filter(|item| category.matches(item.category()))
    .filter(|item| matches_text(&item.search_fields(), text))
    .collect()
}

/// Stable sort by `key`. Missing values go last in either direction.
pub fn sort<T: Queryable>(items: &mut [&T], key: T::Key, direction: SortDirection) {
  items.sort_by(|a, b| {
    let (a, b) = (a.sort_value(key), b.sort_value(key));
    match (&a, &b) {
      (SortValue::Missing, SortValue::Missing) => Ordering::Equal,
      (SortValue::Missing, _) => Ordering::Greater,
      (_, SortValue::Missing) => Ordering::Less,
      _ => direction.apply(a.compare(&b)),
    }
  });
}

/// Complete query state of one list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery<K, C> {
  pub text:     String,
  pub category: CategoryFilter<C>,
  pub sort:     SortState<K>,
}

impl<K: Copy + Eq, C: Copy + Eq> ListQuery<K, C> {
  pub fn new(sort: SortState<K>) -> Self {
    Self {
      text: String::new(),
      category: CategoryFilter::All,
      sort,
    }
  }

  /// `true` when the text or category narrows the view.
  pub fn is_narrowed(&self) -> bool {
    !self.text.trim().is_empty() || self.category != CategoryFilter::All
  }

  /// Filter then sort `items`.
  pub fn apply<'a, T>(&self, items: &'a [T]) -> Vec<&'a T>
  where
    T: Queryable<Key = K, Category = C>,
  {
    let mut view = filter(items, &self.text, &self.category);
    if let Some(key) = self.sort.key {
      sort(&mut view, key, self.sort.direction);
    }
    view
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Clone, PartialEq)]
  struct Row {
    name:  &'static str,
    group: u8,
    value: Option<f64>,
  }

  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  enum Key {
    Name,
    Value,
  }

  impl Queryable for Row {
    type Category = u8;
    type Key = Key;

    fn search_fields(&self) -> Vec<Cow<'_, str>> { vec![Cow::Borrowed(self.name)] }

    fn category(&self) -> Option<u8> { Some(self.group) }

    fn sort_value(&self, key: Key) -> SortValue<'_> {
      match key {
        Key::Name => self.name.into(),
        Key::Value => self.value.map_or(SortValue::Missing, SortValue::Number),
      }
    }
  }

  fn rows() -> Vec<Row> {
    vec![
      Row { name: "Beta", group: 1, value: Some(3.0) },
      Row { name: "alpha", group: 2, value: None },
      Row { name: "Gamma", group: 1, value: Some(1.0) },
      Row { name: "alphabet", group: 1, value: Some(3.0) },
      Row { name: "delta", group: 2, value: Some(-2.0) },
    ]
  }

  fn names(view: &[&Row]) -> Vec<&'static str> { view.iter().map(|r| r.name).collect() }

  #[test]
  fn filter_is_an_ordered_subset() {
    let all = rows();
    let view = filter(&all, "ALP", &CategoryFilter::All);
    assert_eq!(names(&view), ["alpha", "alphabet"]);

    // Every result is present in the source, in source order.
    let mut cursor = all.iter();
    for item in &view {
      assert!(cursor.any(|r| std::ptr::eq(r, *item)));
    }
  }

  #[test]
  fn filter_is_idempotent() {
    let all = rows();
    let category = CategoryFilter::Only(1);
    let once = filter(&all, "a", &category);
    let twice = filter(once.iter().copied(), "a", &category);
    assert_eq!(once, twice);
  }

  #[test]
  fn blank_query_matches_everything() {
    let all = rows();
    assert_eq!(filter(&all, "   ", &CategoryFilter::All).len(), all.len());
  }

  #[test]
  fn category_filter_uses_equality() {
    let all = rows();
    let view = filter(&all, "", &CategoryFilter::Only(2));
    assert_eq!(names(&view), ["alpha", "delta"]);
  }

  #[test]
  fn sort_is_stable_and_idempotent() {
    let all = rows();
    let mut view: Vec<&Row> = all.iter().collect();
    sort(&mut view, Key::Value, SortDirection::Ascending);
    // Equal values (Beta, alphabet) keep their source order; missing is last.
    assert_eq!(names(&view), ["delta", "Gamma", "Beta", "alphabet", "alpha"]);

    let mut again = view.clone();
    sort(&mut again, Key::Value, SortDirection::Ascending);
    assert_eq!(view, again);
  }

  #[test]
  fn descending_keeps_missing_last_and_ties_stable() {
    let all = rows();
    let mut view: Vec<&Row> = all.iter().collect();
    sort(&mut view, Key::Value, SortDirection::Descending);
    assert_eq!(names(&view), ["Beta", "alphabet", "Gamma", "delta", "alpha"]);
  }

  #[test]
  fn text_sort_is_case_insensitive() {
    let all = rows();
    let mut view: Vec<&Row> = all.iter().collect();
    sort(&mut view, Key::Name, SortDirection::Ascending);
    assert_eq!(names(&view), ["alpha", "alphabet", "Beta", "delta", "Gamma"]);
  }

  #[test]
  fn toggle_flips_same_key_and_resets_on_new_key() {
    let mut state = SortState::new(SortDirection::Descending);
    state.toggle(Key::Name);
    assert_eq!(state.key, Some(Key::Name));
    assert_eq!(state.direction, SortDirection::Descending);

    state.toggle(Key::Name);
    assert_eq!(state.direction, SortDirection::Ascending);

    state.toggle(Key::Value);
    assert_eq!(state.key, Some(Key::Value));
    assert_eq!(state.direction, SortDirection::Descending);
    assert_eq!(state.indicator(Key::Value), " ▼");
    assert_eq!(state.indicator(Key::Name), " ⇅");
  }

  #[test]
  fn list_query_applies_filter_then_sort() {
    let all = rows();
    let mut query = ListQuery::new(SortState::new(SortDirection::Ascending));
    query.text = "a".into();
    query.category = CategoryFilter::Only(1);
    query.sort.toggle(Key::Name);
    assert_eq!(names(&query.apply(&all)), ["alphabet", "Beta", "Gamma"]);
    assert!(query.is_narrowed());
  }

  #[test]
  fn unsorted_query_keeps_fetch_order() {
    let all = rows();
    let query: ListQuery<Key, u8> = ListQuery::new(SortState::new(SortDirection::Ascending));
    assert_eq!(names(&query.apply(&all)), names(&all.iter().collect::<Vec<_>>()));
  }

  #[test]
  fn category_cycle_wraps_through_all() {
    let choices = [1_u8, 2];
    let mut filter = CategoryFilter::All;
    filter = filter.cycle(&choices);
    assert_eq!(filter, CategoryFilter::Only(1));
    filter = filter.cycle(&choices);
    assert_eq!(filter, CategoryFilter::Only(2));
    filter = filter.cycle(&choices);
    assert_eq!(filter, CategoryFilter::All);
  }

  #[test]
  fn normalize_unifies_scripts() {
    assert_eq!(normalize("علي ۱۲"), "علی 12");
    assert!(matches_text(&[Cow::Borrowed("C-۱۰۰")], "c-100"));
  }

  #[test]
  fn mixed_variants_have_a_defined_order() {
    let n = SortValue::Number(1.0);
    let t = SortValue::Text(Cow::Borrowed("x"));
    assert_eq!(n.compare(&t), Ordering::Less);
    assert_eq!(t.compare(&n), Ordering::Greater);
  }
}
