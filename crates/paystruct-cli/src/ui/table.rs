//! Sortable table shared by the three list screens.

use paystruct_client::{ClientError, Snapshot};
use paystruct_core::{collection::SortState, listing::Column};
use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
};

/// What the table area shows instead of rows, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
  /// First fetch still in flight.
  Loading,
  /// Fetch failed and there is nothing cached to fall back on.
  Failed(ClientError),
  Ready,
}

impl LoadState {
  pub fn of<T>(snapshot: &Snapshot<T>) -> Self {
    if snapshot.is_loading {
      return LoadState::Loading;
    }
    match (&snapshot.data, &snapshot.error) {
      (None, Some(err)) => LoadState::Failed(err.clone()),
      _ => LoadState::Ready,
    }
  }
}

/// Everything one frame of a list table needs.
pub struct ListTable<'a, K: 'static> {
  pub title:    String,
  pub columns:  &'static [Column<K>],
  pub sort:     &'a SortState<K>,
  /// Column cursor, the target of `s`.
  pub column:   usize,
  pub cursor:   usize,
  pub rows:     Vec<Row<'a>>,
  pub footer:   Option<Vec<String>>,
  /// Search text or category is active.
  pub narrowed: bool,
  pub state:    LoadState,
}

pub fn draw<K: Copy + Eq + 'static>(f: &mut Frame, area: Rect, table: ListTable<'_, K>) {
  let block = Block::default()
    .title(format!(" {} ", table.title))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  match &table.state {
    LoadState::Loading => {
      return placeholder(f, area, block, "در حال بارگذاری...", Color::DarkGray);
    }
    LoadState::Failed(err) => {
      let text = format!("خطا در دریافت اطلاعات: {}  [r] تلاش مجدد", err.toast());
      return placeholder(f, area, block, &text, Color::Red);
    }
    LoadState::Ready => {}
  }

  if table.rows.is_empty() {
    let text = if table.narrowed {
      "نتیجه‌ای برای این جستجو یافت نشد"
    } else {
      "هنوز موردی ثبت نشده است"
    };
    return placeholder(f, area, block, text, Color::DarkGray);
  }

  let header = Row::new(table.columns.iter().enumerate().map(|(i, column)| {
    let indicator = column.key.map(|k| table.sort.indicator(k)).unwrap_or("");
    let mut style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    if i == table.column {
      style = style.add_modifier(Modifier::REVERSED);
    }
    Cell::from(format!("{}{indicator}", column.title)).style(style)
  }));

  let widths = vec![Constraint::Fill(1); table.columns.len()];
  let mut widget = Table::new(table.rows, widths)
    .header(header)
    .block(block)
    .column_spacing(1)
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

  if let Some(footer) = table.footer {
    widget = widget.footer(
      Row::new(footer.into_iter().map(Cell::from))
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
    );
  }

  let mut state = TableState::default().with_selected(Some(table.cursor));
  f.render_stateful_widget(widget, area, &mut state);
}

fn placeholder(f: &mut Frame, area: Rect, block: Block<'_>, text: &str, color: Color) {
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(
    Paragraph::new(Line::from(Span::styled(text.to_string(), Style::default().fg(color))))
      .wrap(Wrap { trim: true }),
    inner,
  );
}

/// A footer row with `label` in the first column and `amount` under
/// `amount_column`.
pub fn footer(columns: usize, label: String, amount_column: usize, amount: String) -> Vec<String> {
  let mut cells = vec![String::new(); columns];
  if let Some(first) = cells.first_mut() {
    *first = label;
  }
  if let Some(cell) = cells.get_mut(amount_column) {
    *cell = amount;
  }
  cells
}
