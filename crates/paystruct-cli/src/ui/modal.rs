//! Overlays: row detail, delete confirmation and the new-contractor form.

use paystruct_core::{
  calendar::approximate_from_gregorian,
  digits::{format_currency, format_number, persian, to_persian},
};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Flex, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::MISSING;
use crate::app::{App, ContractorForm, PendingDelete, Tab};

/// A `width`×`height` rect centered in `area`, clamped to it.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
    .flex(Flex::Center)
    .areas(area);
  let [rect] = Layout::horizontal([Constraint::Length(width.min(area.width))])
    .flex(Flex::Center)
    .areas(row);
  rect
}

fn frame(f: &mut Frame, area: Rect, title: &str, border: Color) -> Rect {
  f.render_widget(Clear, area);
  let block = Block::default()
    .title(format!(" {title} "))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));
  let inner = block.inner(area);
  f.render_widget(block, area);
  inner
}

fn field(label: &str, value: String) -> Line<'static> {
  Line::from(vec![
    Span::styled(
      format!("{label:<22}"),
      Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ),
    Span::raw(value),
  ])
}

fn date(value: Option<chrono::NaiveDate>) -> String {
  value.map_or_else(|| "-".to_string(), |d| approximate_from_gregorian(d).to_string())
}

// ─── Detail ──────────────────────────────────────────────────────────────────

fn detail_lines(app: &App) -> Option<(String, Vec<Line<'static>>)> {
  match app.tab {
    Tab::Contractors => {
      let c = *app.contractor_view().get(app.contractors.cursor)?;
      Some((c.display_name(), vec![
        field("نوع", c.kind().label().to_string()),
        field("نام", c.first_name.clone()),
        field("نام خانوادگی", c.last_name.clone()),
        field("شناسه ملی", to_persian(&c.national_id)),
        field(
          "کد اقتصادی",
          c.preferential_id.as_deref().map_or_else(|| "-".to_string(), to_persian),
        ),
      ]))
    }
    Tab::Contracts => {
      let row = *app.contract_view().get(app.contracts.cursor)?;
      let c = &row.contract;
      Some((format!("قرارداد {}", persian(&c.contract_number)), vec![
        field("پیمانکار", row.contractor_name().unwrap_or_else(|| MISSING.to_string())),
        field("پروژه", row.project_name().unwrap_or(MISSING).to_string()),
        field(
          "فاز پروژه",
          row.project.as_ref().and_then(|p| p.phase_label()).unwrap_or_else(|| "-".into()),
        ),
        field("مبلغ قرارداد", format_currency(c.gross_budget, 0)),
        field("بیمه", format!("{}%", format_number(c.insurance_rate, 1))),
        field("حسن انجام کار", format!("{}%", format_number(c.performance_bond, 1))),
        field("مالیات بر ارزش افزوده", format!("{}%", format_number(c.added_value_tax, 1))),
        field("تاریخ شروع", date(c.start())),
        field("تاریخ پایان", date(c.end())),
        field("وضعیت", row.status.map_or("-", |s| s.label()).to_string()),
        field("فایل قرارداد", c.scanned_file.clone().unwrap_or_else(|| "-".into())),
      ]))
    }
    Tab::Statements => {
      let row = *app.statement_view().get(app.statements.cursor)?;
      let s = &row.statement;
      Some((format!("صورت وضعیت {}", persian(s.number)), vec![
        field("شماره قرارداد", persian(&s.contract_number)),
        field("پیمانکار", row.contractor_name().unwrap_or_else(|| MISSING.to_string())),
        field("پروژه", s.project_name.clone()),
        field("پیشرفت", format!("{}%", format_number(s.progress_percent, 1))),
        field("از تاریخ", date(s.period_start())),
        field("تا تاریخ", date(s.period_end())),
        field("مبلغ کل", format_currency(s.total_amount, 0)),
        field("وضعیت", s.status.label().to_string()),
      ]))
    }
  }
}

pub fn draw_detail(f: &mut Frame, app: &App) {
  let Some((title, mut lines)) = detail_lines(app) else {
    return;
  };
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    "[Esc] بازگشت  [e] ویرایش  [d] حذف",
    Style::default().fg(Color::DarkGray),
  )));

  let area = centered(f.area(), 70, lines.len() as u16 + 2);
  let inner = frame(f, area, &title, Color::Cyan);
  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

// ─── Delete confirmation ─────────────────────────────────────────────────────

pub fn draw_confirm(f: &mut Frame, pending: &PendingDelete) {
  let area = centered(f.area(), 60, 6);
  let inner = frame(f, area, "حذف", Color::Red);
  let lines = vec![
    Line::from(format!("آیا از حذف «{}» اطمینان دارید؟", pending.label)),
    Line::from(""),
    Line::from(vec![
      Span::styled("[y] ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
      Span::raw("حذف   "),
      Span::styled("[n] ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
      Span::raw("انصراف"),
    ]),
  ];
  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

// ─── New contractor ──────────────────────────────────────────────────────────

pub fn draw_contractor_form(f: &mut Frame, form: &ContractorForm) {
  let area = centered(f.area(), 64, ContractorForm::FIELDS as u16 + 4);
  let inner = frame(f, area, "پیمانکار جدید", Color::Cyan);

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints(vec![Constraint::Length(1); ContractorForm::FIELDS + 2])
    .split(inner);

  for (index, label) in form.labels().iter().enumerate() {
    let focused = index == form.focus;
    let label_style = if focused {
      Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::Cyan)
    };
    let mut value = form.value(index).to_string();
    if index == 0 {
      value = format!("< {value} >");
    } else if focused {
      value.push('▏');
    }
    let line = Line::from(vec![
      Span::styled(format!(" {label:<14}"), label_style),
      Span::raw(" "),
      Span::raw(value),
    ]);
    f.render_widget(Paragraph::new(line), rows[index]);
  }

  f.render_widget(
    Paragraph::new(Span::styled(
      " [Enter] ثبت  [Esc] انصراف",
      Style::default().fg(Color::DarkGray),
    )),
    rows[ContractorForm::FIELDS + 1],
  );
}
