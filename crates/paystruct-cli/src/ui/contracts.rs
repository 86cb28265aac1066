//! Contract list: joined contractor and project, derived status, budget
//! footer over the visible rows.

use paystruct_core::{
  digits::{format_currency, format_number, persian},
  stats::{ContractStats, Footer},
};
use ratatui::{
  Frame,
  layout::Rect,
  widgets::{Cell, Row},
};

use super::{
  Card, MISSING, date_cell, status_cell,
  table::{self, ListTable, LoadState},
};
use crate::app::App;

/// Index of the budget column, where the footer total goes.
const BUDGET_COLUMN: usize = 3;

pub fn cards(app: &App) -> Vec<Card> {
  let stats = ContractStats::compute(&app.rows.contracts);
  vec![
    Card::new("کل قراردادها", persian(stats.total)),
    Card::new("فعال", persian(stats.active)),
    Card::new("نزدیک به انقضا", persian(stats.near_expiry)),
    Card::new("منقضی", persian(stats.expired)),
    Card::new("مجموع مبالغ", format_currency(stats.total_budget, 0)),
    Card::new("میانگین مبلغ", format_currency(stats.average_budget, 0)),
  ]
}

fn percent(value: f64) -> String { format!("{}%", format_number(value, 1)) }

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let screen = &app.contracts;
  let view = app.contract_view();

  let rows = view
    .iter()
    .map(|row| {
      let c = &row.contract;
      Row::new(vec![
        Cell::from(persian(&c.contract_number)),
        Cell::from(row.contractor_name().unwrap_or_else(|| MISSING.to_string())),
        Cell::from(row.project_name().unwrap_or(MISSING).to_string()),
        Cell::from(format_number(c.gross_budget, 0)),
        Cell::from(percent(c.insurance_rate)),
        Cell::from(percent(c.performance_bond)),
        Cell::from(percent(c.added_value_tax)),
        date_cell(c.start()),
        date_cell(c.end()),
        status_cell(row.status),
      ])
    })
    .collect();

  let totals = Footer::contracts(&view);
  let footer = table::footer(
    screen.columns.len(),
    format!("جمع ({} ردیف)", persian(totals.rows)),
    BUDGET_COLUMN,
    format_currency(totals.amount, 0),
  );

  table::draw(f, area, ListTable {
    title: format!("قراردادها ({})", persian(view.len())),
    columns: screen.columns,
    sort: &screen.query.sort,
    column: screen.column,
    cursor: screen.cursor,
    rows,
    footer: Some(footer),
    narrowed: screen.query.is_narrowed(),
    state: LoadState::of(&app.caches.contracts.snapshot()),
  });
}
