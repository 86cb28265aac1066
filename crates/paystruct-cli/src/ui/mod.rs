//! TUI rendering: tab header, stat cards, the active list and overlays.

pub mod contractors;
pub mod contracts;
pub mod modal;
pub mod statements;
pub mod table;

use chrono::NaiveDate;
use paystruct_core::{calendar::approximate_from_gregorian, expiry::ContractStatus};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Cell, Paragraph},
};

use crate::app::{App, Mode, Tab, ToastKind};

/// Shown wherever a foreign key did not resolve.
pub const MISSING: &str = "یافت نشد";

/// One summary box above a list.
pub struct Card {
  pub label: &'static str,
  pub value: String,
}

impl Card {
  pub fn new(label: &'static str, value: String) -> Self { Self { label, value } }
}

/// A date column, rendered in the Persian calendar.
pub fn date_cell(date: Option<NaiveDate>) -> Cell<'static> {
  match date {
    Some(date) => Cell::from(approximate_from_gregorian(date).to_string()),
    None => Cell::from("-"),
  }
}

pub fn status_cell(status: Option<ContractStatus>) -> Cell<'static> {
  let Some(status) = status else {
    return Cell::from("-");
  };
  let color = match status {
    ContractStatus::Active => Color::Green,
    ContractStatus::NearExpiry => Color::Yellow,
    ContractStatus::Expired => Color::Red,
  };
  Cell::from(status.label()).style(Style::default().fg(color))
}

// ─── Root draw ───────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Length(3), // stat cards
      Constraint::Min(0),    // list
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);

  let cards = match app.tab {
    Tab::Contractors => contractors::cards(app),
    Tab::Contracts => contracts::cards(app),
    Tab::Statements => statements::cards(app),
  };
  draw_cards(f, rows[1], &cards);

  match app.tab {
    Tab::Contractors => contractors::draw(f, rows[2], app),
    Tab::Contracts => contracts::draw(f, rows[2], app),
    Tab::Statements => statements::draw(f, rows[2], app),
  }

  draw_status(f, rows[3], app);

  match &app.mode {
    Mode::Detail => modal::draw_detail(f, app),
    Mode::ConfirmDelete(pending) => modal::draw_confirm(f, pending),
    Mode::NewContractor(form) => modal::draw_contractor_form(f, form),
    Mode::Normal | Mode::Search => {}
  }
}

// ─── Header ──────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let mut spans = vec![Span::styled(
    " PayStruct ",
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
  )];
  for tab in Tab::ALL {
    let style = if tab == app.tab {
      Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::Gray)
    };
    spans.push(Span::raw(" "));
    spans.push(Span::styled(format!(" {} ", tab.title()), style));
  }

  let date = format!("امروز {} ", approximate_from_gregorian(app.today));
  let used: usize = spans.iter().map(|s| s.width()).sum();
  let pad = usize::from(area.width).saturating_sub(used + Span::raw(date.as_str()).width());
  spans.push(Span::raw(" ".repeat(pad)));
  spans.push(Span::styled(date, Style::default().fg(Color::Gray)));

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(Line::from(spans)), inner);
}

// ─── Stat cards ──────────────────────────────────────────────────────────────

fn draw_cards(f: &mut Frame, area: Rect, cards: &[Card]) {
  let slots = Layout::default()
    .direction(Direction::Horizontal)
    .constraints(vec![Constraint::Fill(1); cards.len()])
    .split(area);

  for (card, slot) in cards.iter().zip(slots.iter()) {
    let block = Block::default()
      .title(format!(" {} ", card.label))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray));
    let value = Paragraph::new(Span::styled(
      card.value.clone(),
      Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ))
    .block(block);
    f.render_widget(value, *slot);
  }
}

// ─── Status bar ──────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match &app.mode {
    Mode::Search => ("SEARCH", "Type to filter  Enter keep  Esc clear"),
    Mode::Detail => ("DETAIL", "Esc back"),
    Mode::ConfirmDelete(_) => ("DELETE", "y confirm  n cancel"),
    Mode::NewContractor(_) => ("NEW", "Tab next field  Space toggle kind  Enter save  Esc cancel"),
    Mode::Normal => (
      "NORMAL",
      "Tab screen  ←→ column  s sort  / search  f filter  Enter detail  d delete  r refresh  q quit",
    ),
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
  );

  let mut spans = vec![mode_span];
  if matches!(app.mode, Mode::Search) || !app.search_text().is_empty() {
    spans.push(Span::styled(
      format!(" /{} ", app.search_text()),
      Style::default().fg(Color::Yellow),
    ));
  }

  let message = match &app.toast {
    Some((toast, _)) => {
      let color = match toast.kind {
        ToastKind::Info => Color::Cyan,
        ToastKind::Success => Color::Green,
        ToastKind::Error => Color::Red,
      };
      Span::styled(format!("  {}", toast.text), Style::default().fg(color))
    }
    None => Span::styled(format!("  {hints}"), Style::default().fg(Color::DarkGray)),
  };
  spans.push(message);

  f.render_widget(
    Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black)),
    area,
  );
}
