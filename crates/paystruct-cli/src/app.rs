//! Application state machine and event dispatcher.

use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use chrono::{Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use paystruct_client::{
  ApiClient, ClientError, Fetchable, QueryCache,
  mutation::{commit, create_contractor, delete_and_invalidate},
};
use paystruct_core::{
  collection::ListQuery,
  entity::{Contract, Contractor, ContractorKind, Entity, Project, StatementStatus, StatusStatement},
  expiry::ContractStatus,
  form::{LEGAL_ENTITY_FIRST_NAME, NewContractor},
  join::{EnhancedContract, EnhancedStatement, EntityIndex, join_contracts, join_statements},
  listing::{
    CONTRACT_COLUMNS, CONTRACTOR_COLUMNS, Column, ContractKey, ContractorKey, STATEMENT_COLUMNS,
    StatementKey, contract_categories, contract_query, contractor_categories, contractor_query,
    statement_categories, statement_query,
  },
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How long a toast stays in the status bar.
const TOAST_TTL: Duration = Duration::from_secs(4);

// ─── Tabs ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
  Contractors,
  Contracts,
  Statements,
}

impl Tab {
  pub const ALL: [Tab; 3] = [Tab::Contractors, Tab::Contracts, Tab::Statements];

  pub fn title(self) -> &'static str {
    match self {
      Tab::Contractors => "پیمانکاران",
      Tab::Contracts => "قراردادها",
      Tab::Statements => "صورت وضعیت‌ها",
    }
  }

  fn index(self) -> usize { Tab::ALL.iter().position(|t| *t == self).unwrap_or_default() }

  fn next(self) -> Self { Tab::ALL[(self.index() + 1) % Tab::ALL.len()] }

  fn prev(self) -> Self { Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()] }
}

// ─── Toasts ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
  Info,
  Success,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
  pub kind: ToastKind,
  pub text: String,
}

impl Toast {
  pub fn info(text: impl Into<String>) -> Self {
    Self {
      kind: ToastKind::Info,
      text: text.into(),
    }
  }

  pub fn success(text: impl Into<String>) -> Self {
    Self {
      kind: ToastKind::Success,
      text: text.into(),
    }
  }

  pub fn error(text: impl Into<String>) -> Self {
    Self {
      kind: ToastKind::Error,
      text: text.into(),
    }
  }
}

/// Messages from background tasks to the event loop.
#[derive(Debug)]
pub enum AppEvent {
  Toast(Toast),
}

// ─── Modes ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
  pub tab:   Tab,
  pub id:    String,
  pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  /// Keystrokes go into the current screen's search text.
  Search,
  /// Read-only modal for the row under the cursor.
  Detail,
  ConfirmDelete(PendingDelete),
  NewContractor(ContractorForm),
}

// ─── New-contractor form ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormAction {
  Continue,
  Submit,
  Cancel,
}

/// Input state of the new-contractor modal. Field 0 is the legal/natural
/// toggle; the rest are text inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractorForm {
  pub legal:           bool,
  pub first_name:      String,
  pub last_name:       String,
  pub national_id:     String,
  pub preferential_id: String,
  pub focus:           usize,
}

impl ContractorForm {
  pub const FIELDS: usize = 5;

  pub fn labels(&self) -> [&'static str; Self::FIELDS] {
    let last = if self.legal { "نام شرکت" } else { "نام خانوادگی" };
    ["نوع", "نام", last, "شناسه ملی", "کد اقتصادی"]
  }

  /// Display value of field `index`.
  pub fn value(&self, index: usize) -> &str {
    match index {
      0 => {
        if self.legal {
          ContractorKind::Legal.label()
        } else {
          ContractorKind::Natural.label()
        }
      }
      1 if self.legal => LEGAL_ENTITY_FIRST_NAME,
      1 => &self.first_name,
      2 => &self.last_name,
      3 => &self.national_id,
      _ => &self.preferential_id,
    }
  }

  /// The focused text input, `None` on the toggle and on the fixed first
  /// name of a legal entity.
  fn field_mut(&mut self) -> Option<&mut String> {
    match self.focus {
      1 if !self.legal => Some(&mut self.first_name),
      2 => Some(&mut self.last_name),
      3 => Some(&mut self.national_id),
      4 => Some(&mut self.preferential_id),
      _ => None,
    }
  }

  pub fn to_new(&self) -> NewContractor {
    let base = if self.legal {
      NewContractor::legal(&self.last_name, &self.national_id)
    } else {
      NewContractor::natural(&self.first_name, &self.last_name, &self.national_id)
    };
    base.with_preferential_id(&self.preferential_id)
  }

  fn handle_key(&mut self, key: KeyEvent) -> FormAction {
    match key.code {
      KeyCode::Esc => return FormAction::Cancel,
      KeyCode::Enter => return FormAction::Submit,
      KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % Self::FIELDS,
      KeyCode::BackTab | KeyCode::Up => self.focus = (self.focus + Self::FIELDS - 1) % Self::FIELDS,
      KeyCode::Char(' ') if self.focus == 0 => self.legal = !self.legal,
      KeyCode::Backspace => {
        if let Some(field) = self.field_mut() {
          field.pop();
        }
      }
      KeyCode::Char(c) => {
        if let Some(field) = self.field_mut() {
          field.push(c);
        }
      }
      _ => {}
    }
    FormAction::Continue
  }
}

// ─── Per-screen list state ───────────────────────────────────────────────────

/// Query, row cursor and column cursor of one list screen.
#[derive(Debug, Clone)]
pub struct ScreenState<K: 'static, C> {
  pub query:      ListQuery<K, C>,
  pub cursor:     usize,
  pub column:     usize,
  pub columns:    &'static [Column<K>],
  pub categories: Vec<C>,
}

impl<K: Copy + Eq + 'static, C: Copy + Eq> ScreenState<K, C> {
  fn new(query: ListQuery<K, C>, columns: &'static [Column<K>], categories: Vec<C>) -> Self {
    Self {
      query,
      cursor: 0,
      column: 0,
      columns,
      categories,
    }
  }
}

/// The screen-independent controls the key handler drives.
trait ListControls {
  fn text_mut(&mut self) -> &mut String;
  fn cursor_mut(&mut self) -> &mut usize;
  fn move_column(&mut self, forward: bool);
  /// Sort by the column under the cursor; `false` if it is not sortable.
  fn toggle_sort(&mut self) -> bool;
  fn cycle_category(&mut self);
  fn clear_filters(&mut self);
}

impl<K: Copy + Eq + 'static, C: Copy + Eq> ListControls for ScreenState<K, C> {
  fn text_mut(&mut self) -> &mut String {
    self.cursor = 0;
    &mut self.query.text
  }

  fn cursor_mut(&mut self) -> &mut usize { &mut self.cursor }

  fn move_column(&mut self, forward: bool) {
    let last = self.columns.len().saturating_sub(1);
    self.column = if forward {
      (self.column + 1).min(last)
    } else {
      self.column.saturating_sub(1)
    };
  }

  fn toggle_sort(&mut self) -> bool {
    let Some(key) = self.columns.get(self.column).and_then(|c| c.key) else {
      return false;
    };
    self.query.sort.toggle(key);
    self.cursor = 0;
    true
  }

  fn cycle_category(&mut self) {
    self.query.category = self.query.category.cycle(&self.categories);
    self.cursor = 0;
  }

  fn clear_filters(&mut self) {
    self.query.text.clear();
    self.query.category = Default::default();
    self.cursor = 0;
  }
}

// ─── Caches and joined rows ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct Caches {
  pub contractors: QueryCache<Contractor>,
  pub projects:    QueryCache<Project>,
  pub contracts:   QueryCache<Contract>,
  pub statements:  QueryCache<StatusStatement>,
}

impl Caches {
  pub fn new(client: ApiClient) -> Self {
    Self {
      contractors: QueryCache::new(client.clone()),
      projects:    QueryCache::new(client.clone()),
      contracts:   QueryCache::new(client.clone()),
      statements:  QueryCache::new(client),
    }
  }
}

/// Rows as rendered, rebuilt only when a source cache version changes.
#[derive(Debug, Default)]
pub struct Rows {
  pub contractors: Arc<Vec<Contractor>>,
  pub contracts:   Vec<EnhancedContract>,
  pub statements:  Vec<EnhancedStatement>,
  contractors_key: Option<u64>,
  contracts_key:   Option<(u64, u64, u64)>,
  statements_key:  Option<(u64, u64)>,
}

// ─── App ─────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub tab:         Tab,
  pub mode:        Mode,
  pub contractors: ScreenState<ContractorKey, ContractorKind>,
  pub contracts:   ScreenState<ContractKey, ContractStatus>,
  pub statements:  ScreenState<StatementKey, StatementStatus>,
  pub caches:      Caches,
  pub rows:        Rows,
  /// Fixed per day so one frame classifies every contract the same way.
  pub today:       NaiveDate,
  pub toast:       Option<(Toast, Instant)>,
  cancel:          CancellationToken,
  events:          mpsc::UnboundedSender<AppEvent>,
  inbox:           mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
  pub fn new(client: ApiClient, today: NaiveDate) -> Self {
    let (events, inbox) = mpsc::unbounded_channel();
    Self {
      tab: Tab::Contractors,
      mode: Mode::Normal,
      contractors: ScreenState::new(contractor_query(), &CONTRACTOR_COLUMNS, contractor_categories()),
      contracts: ScreenState::new(contract_query(), &CONTRACT_COLUMNS, contract_categories()),
      statements: ScreenState::new(statement_query(), &STATEMENT_COLUMNS, statement_categories()),
      caches: Caches::new(client),
      rows: Rows::default(),
      today,
      toast: None,
      cancel: CancellationToken::new(),
      events,
      inbox,
    }
  }

  // ── Background work ───────────────────────────────────────────────────────

  /// Kick off the initial fetch of every collection. They complete
  /// independently, in any order.
  pub fn start(&self) {
    self.spawn_fetch(&self.caches.contractors, false);
    self.spawn_fetch(&self.caches.projects, false);
    self.spawn_fetch(&self.caches.contracts, false);
    self.spawn_fetch(&self.caches.statements, false);
  }

  fn spawn_fetch<T: Fetchable>(&self, cache: &QueryCache<T>, invalidate: bool) {
    let cache = cache.clone();
    let cancel = self.cancel.child_token();
    tokio::spawn(async move {
      let result = if invalidate {
        cache.invalidate_and_refetch(&cancel).await
      } else {
        cache.refresh(&cancel).await
      };
      match result {
        Ok(rows) => debug!(resource = %T::RESOURCE, rows = rows.len(), "loaded"),
        Err(ClientError::Cancelled) => {}
        Err(err) => warn!(resource = %T::RESOURCE, error = %err, "fetch failed"),
      }
    });
  }

  /// Refetch everything the screen for `tab` is built from.
  fn refresh(&self, tab: Tab) {
    match tab {
      Tab::Contractors => self.spawn_fetch(&self.caches.contractors, true),
      Tab::Contracts => {
        self.spawn_fetch(&self.caches.contracts, true);
        self.spawn_fetch(&self.caches.contractors, true);
        self.spawn_fetch(&self.caches.projects, true);
      }
      Tab::Statements => {
        self.spawn_fetch(&self.caches.statements, true);
        self.spawn_fetch(&self.caches.contractors, true);
      }
    }
  }

  fn spawn_delete(&self, pending: PendingDelete) {
    match pending.tab {
      Tab::Contractors => self.spawn_delete_in(&self.caches.contractors, pending),
      Tab::Contracts => self.spawn_delete_in(&self.caches.contracts, pending),
      Tab::Statements => self.spawn_delete_in(&self.caches.statements, pending),
    }
  }

  fn spawn_delete_in<T: Fetchable>(&self, cache: &QueryCache<T>, pending: PendingDelete) {
    let cache = cache.clone();
    let cancel = self.cancel.child_token();
    let events = self.events.clone();
    tokio::spawn(async move {
      let toast = match delete_and_invalidate(&cache, &pending.id, &cancel).await {
        Ok(()) => Toast::success(format!("{} حذف شد", pending.label)),
        Err(err) => Toast::error(err.toast()),
      };
      events.send(AppEvent::Toast(toast)).ok();
    });
  }

  fn spawn_create_contractor(&self, form: NewContractor) {
    let cache = self.caches.contractors.clone();
    let cancel = self.cancel.child_token();
    let events = self.events.clone();
    tokio::spawn(async move {
      let client = cache.client().clone();
      let toast = match commit(&cache, &cancel, create_contractor(&client, &form)).await {
        Ok(()) => Toast::success("پیمانکار با موفقیت ثبت شد"),
        Err(err) => Toast::error(err.toast()),
      };
      events.send(AppEvent::Toast(toast)).ok();
    });
  }

  // ── Per-frame upkeep ──────────────────────────────────────────────────────

  /// Drain task messages, expire the toast and refresh joined rows.
  pub fn tick(&mut self) {
    while let Ok(event) = self.inbox.try_recv() {
      match event {
        AppEvent::Toast(toast) => self.notify(toast),
      }
    }
    if self.toast.as_ref().is_some_and(|(_, at)| at.elapsed() > TOAST_TTL) {
      self.toast = None;
    }
    let today = Local::now().date_naive();
    if today != self.today {
      self.today = today;
      self.rows.contracts_key = None;
    }
    self.sync();
  }

  /// Rebuild the joined rows whose sources changed since the last call.
  pub fn sync(&mut self) {
    let caches = &self.caches;
    let mut changed = false;
    let contractor_version = caches.contractors.version();
    let contractors = caches.contractors.data();
    let index = || EntityIndex::from_loaded(contractors.as_deref().map(Vec::as_slice));

    let contracts_key = (
      contractor_version,
      caches.projects.version(),
      caches.contracts.version(),
    );
    if self.rows.contracts_key != Some(contracts_key) {
      let projects = caches.projects.data();
      let contracts = caches.contracts.data().unwrap_or_default();
      self.rows.contracts = join_contracts(
        &contracts,
        &index(),
        &EntityIndex::from_loaded(projects.as_deref().map(Vec::as_slice)),
        self.today,
      );
      self.rows.contracts_key = Some(contracts_key);
      changed = true;
      debug!(rows = self.rows.contracts.len(), "contracts joined");
    }

    let statements_key = (contractor_version, caches.statements.version());
    if self.rows.statements_key != Some(statements_key) {
      let statements = caches.statements.data().unwrap_or_default();
      self.rows.statements = join_statements(&statements, &index());
      self.rows.statements_key = Some(statements_key);
      changed = true;
    }

    if self.rows.contractors_key != Some(contractor_version) {
      self.rows.contractors = contractors.unwrap_or_default();
      self.rows.contractors_key = Some(contractor_version);
      changed = true;
    }

    if changed {
      self.clamp_cursors();
    }
  }

  /// Pull every row cursor back onto its view after the rows shrink.
  fn clamp_cursors(&mut self) {
    let contractors = self.contractor_view().len();
    let contracts = self.contract_view().len();
    let statements = self.statement_view().len();
    self.contractors.cursor = self.contractors.cursor.min(contractors.saturating_sub(1));
    self.contracts.cursor = self.contracts.cursor.min(contracts.saturating_sub(1));
    self.statements.cursor = self.statements.cursor.min(statements.saturating_sub(1));
  }

  pub fn notify(&mut self, toast: Toast) { self.toast = Some((toast, Instant::now())); }

  // ── Views ─────────────────────────────────────────────────────────────────

  pub fn contractor_view(&self) -> Vec<&Contractor> {
    self.contractors.query.apply(&self.rows.contractors)
  }

  pub fn contract_view(&self) -> Vec<&EnhancedContract> { self.contracts.query.apply(&self.rows.contracts) }

  pub fn statement_view(&self) -> Vec<&EnhancedStatement> {
    self.statements.query.apply(&self.rows.statements)
  }

  fn view_len(&self) -> usize {
    match self.tab {
      Tab::Contractors => self.contractor_view().len(),
      Tab::Contracts => self.contract_view().len(),
      Tab::Statements => self.statement_view().len(),
    }
  }

  /// Identifier and label of the row under the cursor.
  pub fn selected(&self) -> Option<(String, String)> {
    match self.tab {
      Tab::Contractors => self
        .contractor_view()
        .get(self.contractors.cursor)
        .map(|c| (c.id.clone(), c.label())),
      Tab::Contracts => self
        .contract_view()
        .get(self.contracts.cursor)
        .map(|c| (c.contract.id.clone(), c.contract.label())),
      Tab::Statements => self
        .statement_view()
        .get(self.statements.cursor)
        .map(|s| (s.statement.id.clone(), s.statement.label())),
    }
  }

  fn screen_mut(&mut self) -> &mut dyn ListControls {
    match self.tab {
      Tab::Contractors => &mut self.contractors,
      Tab::Contracts => &mut self.contracts,
      Tab::Statements => &mut self.statements,
    }
  }

  /// Search text of the current screen.
  pub fn search_text(&self) -> &str {
    match self.tab {
      Tab::Contractors => &self.contractors.query.text,
      Tab::Contracts => &self.contracts.query.text,
      Tab::Statements => &self.statements.query.text,
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  fn quit(&self) -> bool {
    self.cancel.cancel();
    false
  }

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return self.quit();
    }

    match self.mode {
      Mode::Normal => return self.handle_normal_key(key),
      Mode::Search => self.handle_search_key(key),
      Mode::Detail => {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
          self.mode = Mode::Normal;
        }
      }
      Mode::ConfirmDelete(_) => self.handle_confirm_key(key),
      Mode::NewContractor(_) => self.handle_form_key(key),
    }
    true
  }

  fn handle_search_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.screen_mut().text_mut().clear();
        self.mode = Mode::Normal;
      }
      KeyCode::Enter => self.mode = Mode::Normal,
      KeyCode::Backspace => {
        self.screen_mut().text_mut().pop();
      }
      KeyCode::Char(c) => self.screen_mut().text_mut().push(c),
      _ => {}
    }
  }

  fn handle_confirm_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('y' | 'Y') | KeyCode::Enter => {
        if let Mode::ConfirmDelete(pending) = std::mem::replace(&mut self.mode, Mode::Normal) {
          self.spawn_delete(pending);
        }
      }
      KeyCode::Char('n' | 'N') | KeyCode::Esc => self.mode = Mode::Normal,
      _ => {}
    }
  }

  fn handle_form_key(&mut self, key: KeyEvent) {
    let Mode::NewContractor(form) = &mut self.mode else {
      return;
    };
    match form.handle_key(key) {
      FormAction::Continue => {}
      FormAction::Cancel => self.mode = Mode::Normal,
      FormAction::Submit => {
        let contractor = form.to_new();
        match contractor.validate() {
          Ok(()) => {
            self.mode = Mode::Normal;
            self.spawn_create_contractor(contractor);
          }
          Err(err) => self.notify(Toast::error(err.to_string())),
        }
      }
    }
  }

  fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return self.quit(),

      KeyCode::Tab => self.tab = self.tab.next(),
      KeyCode::BackTab => self.tab = self.tab.prev(),

      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.view_len();
        let cursor = self.screen_mut().cursor_mut();
        if *cursor + 1 < len {
          *cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        let cursor = self.screen_mut().cursor_mut();
        *cursor = cursor.saturating_sub(1);
      }
      KeyCode::Left | KeyCode::Char('h') => self.screen_mut().move_column(false),
      KeyCode::Right | KeyCode::Char('l') => self.screen_mut().move_column(true),

      KeyCode::Char('s') => {
        if !self.screen_mut().toggle_sort() {
          self.notify(Toast::info("این ستون قابل مرتب‌سازی نیست"));
        }
      }
      KeyCode::Char('/') => self.mode = Mode::Search,
      KeyCode::Char('f') => self.screen_mut().cycle_category(),
      KeyCode::Esc => self.screen_mut().clear_filters(),

      KeyCode::Enter => {
        if self.selected().is_some() {
          self.mode = Mode::Detail;
        }
      }
      KeyCode::Char('e') => {
        if self.selected().is_some() {
          self.notify(Toast::info("ویرایش هنوز در دسترس نیست"));
        }
      }
      KeyCode::Char('d') => {
        if let Some((id, label)) = self.selected() {
          self.mode = Mode::ConfirmDelete(PendingDelete {
            tab: self.tab,
            id,
            label,
          });
        }
      }
      KeyCode::Char('r') => self.refresh(self.tab),
      KeyCode::Char('n') if self.tab == Tab::Contractors => {
        self.mode = Mode::NewContractor(ContractorForm::default());
      }

      _ => {}
    }
    true
  }

  /// Replace the joined rows with fixed data, bypassing the caches.
  #[cfg(test)]
  pub fn load_rows(
    &mut self,
    contractors: Vec<Contractor>,
    projects: &[Project],
    contracts: &[Contract],
    statements: &[StatusStatement],
  ) {
    let index = EntityIndex::build(&contractors);
    self.rows.contracts = join_contracts(contracts, &index, &EntityIndex::build(projects), self.today);
    self.rows.statements = join_statements(statements, &index);
    self.rows.contractors = Arc::new(contractors);
    self.rows.contractors_key = Some(0);
    self.rows.contracts_key = Some((0, 0, 0));
    self.rows.statements_key = Some((0, 0));
    self.clamp_cursors();
  }
}
