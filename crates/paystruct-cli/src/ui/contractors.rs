//! Contractor list.

use paystruct_core::{
  digits::{persian, to_persian},
  entity::ContractorKind,
  stats::ContractorStats,
};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Style},
  widgets::{Cell, Row},
};

use super::{
  Card,
  table::{self, ListTable, LoadState},
};
use crate::app::App;

pub fn cards(app: &App) -> Vec<Card> {
  let stats = ContractorStats::compute(app.rows.contractors.iter());
  vec![
    Card::new("کل پیمانکاران", persian(stats.total)),
    Card::new("حقوقی", persian(stats.legal)),
    Card::new("حقیقی", persian(stats.natural)),
  ]
}

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let screen = &app.contractors;
  let view = app.contractor_view();

  let rows = view
    .iter()
    .map(|c| {
      let kind_color = match c.kind() {
        ContractorKind::Legal => Color::Blue,
        ContractorKind::Natural => Color::Magenta,
      };
      Row::new(vec![
        Cell::from(c.display_name()),
        Cell::from(c.kind().label()).style(Style::default().fg(kind_color)),
        Cell::from(to_persian(&c.national_id)),
        Cell::from(c.preferential_id.as_deref().map_or_else(|| "-".to_string(), to_persian)),
      ])
    })
    .collect();

  table::draw(f, area, ListTable {
    title: format!("پیمانکاران ({})", persian(view.len())),
    columns: screen.columns,
    sort: &screen.query.sort,
    column: screen.column,
    cursor: screen.cursor,
    rows,
    footer: None,
    narrowed: screen.query.is_narrowed(),
    state: LoadState::of(&app.caches.contractors.snapshot()),
  });
}
