//! Status statement list.

use paystruct_core::{
  digits::{format_currency, format_number, persian},
  entity::StatementStatus,
  stats::{Footer, StatementStats},
};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Style},
  widgets::{Cell, Row},
};

use super::{
  Card, MISSING, date_cell,
  table::{self, ListTable, LoadState},
};
use crate::app::App;

const AMOUNT_COLUMN: usize = 7;

pub fn cards(app: &App) -> Vec<Card> {
  let stats = StatementStats::compute(&app.rows.statements);
  vec![
    Card::new("کل صورت وضعیت‌ها", persian(stats.total)),
    Card::new("در انتظار", persian(stats.pending)),
    Card::new("تایید شده", persian(stats.approved)),
    Card::new("پرداخت شده", persian(stats.paid)),
    Card::new("مجموع مبالغ", format_currency(stats.total_amount, 0)),
    Card::new("میانگین پیشرفت", format!("{}%", format_number(stats.average_progress, 1))),
  ]
}

fn status_color(status: StatementStatus) -> Color {
  match status {
    StatementStatus::Pending => Color::Yellow,
    StatementStatus::Approved => Color::Blue,
    StatementStatus::Rejected => Color::Red,
    StatementStatus::Paid => Color::Green,
  }
}

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let screen = &app.statements;
  let view = app.statement_view();

  let rows = view
    .iter()
    .map(|row| {
      let s = &row.statement;
      Row::new(vec![
        Cell::from(persian(s.number)),
        Cell::from(persian(&s.contract_number)),
        Cell::from(row.contractor_name().unwrap_or_else(|| MISSING.to_string())),
        Cell::from(s.project_name.clone()),
        Cell::from(format!("{}%", format_number(s.progress_percent, 1))),
        date_cell(s.period_start()),
        date_cell(s.period_end()),
        Cell::from(format_number(s.total_amount, 0)),
        Cell::from(s.status.label()).style(Style::default().fg(status_color(s.status))),
      ])
    })
    .collect();

  let totals = Footer::statements(&view);
  let footer = table::footer(
    screen.columns.len(),
    format!("جمع ({} ردیف)", persian(totals.rows)),
    AMOUNT_COLUMN,
    format_currency(totals.amount, 0),
  );

  table::draw(f, area, ListTable {
    title: format!("صورت وضعیت‌ها ({})", persian(view.len())),
    columns: screen.columns,
    sort: &screen.query.sort,
    column: screen.column,
    cursor: screen.cursor,
    rows,
    footer: Some(footer),
    narrowed: screen.query.is_narrowed(),
    state: LoadState::of(&app.caches.statements.snapshot()),
  });
}
