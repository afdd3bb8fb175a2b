//! Application state machine and event dispatcher.
//!
//! The event loop owns [`App`] and is the only writer to its [`Store`].
//! Background tasks (change feed, pollers) report through [`AppMessage`].

use std::{
  collections::HashMap,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use rescue_core::{
  Fields, Table,
  change::{ChangeEvent, ChangeFilter},
  entity::{
    Activity, ActivityType, ChildEntity, ChronicCondition, Dog, EmergencyAlert,
    Entity, HealthStatusUpdate, Medication, VeterinaryAppointment,
  },
  profile::{CareDay, DogProfile, WalkCount, care_calendar, last_activity},
  table::SortOrder,
};
use rescue_sync::{Scope, Store, Stored, SubscriptionId, reconcile};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
  client::{self, ApiClient, GatewayError},
  feed,
  form::Form,
  poll::{self, PageTasks},
};

// ─── Messages ────────────────────────────────────────────────────────────────

/// A fresh dog list plus walk totals.
#[derive(Debug, Clone)]
pub struct DogListSnapshot {
  pub dogs:  Vec<Dog>,
  pub walks: Vec<WalkCount>,
}

/// Everything background tasks hand to the event loop.
#[derive(Debug)]
pub enum AppMessage {
  /// A push-feed event.
  Change(ChangeEvent),
  /// The change feed connected (`true`) or dropped (`false`).
  FeedLive(bool),
  DogList(client::Result<DogListSnapshot>),
  Profile(Uuid, client::Result<DogProfile>),
  Calendar(client::Result<Vec<Activity>>),
}

// ─── Screen ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  DogList,
  DogDetail(Uuid),
  /// Every dog's recent activities, by day.
  Calendar,
}

/// Days of history the care calendar shows.
pub const CALENDAR_DAYS: u32 = 14;

/// Record tabs on the detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
  Activities,
  Medications,
  HealthUpdates,
  VetAppointments,
  ChronicConditions,
  EmergencyAlerts,
}

impl Tab {
  pub const ALL: [Tab; 6] = [
    Tab::Activities,
    Tab::Medications,
    Tab::HealthUpdates,
    Tab::VetAppointments,
    Tab::ChronicConditions,
    Tab::EmergencyAlerts,
  ];

  pub fn title(self) -> &'static str {
    match self {
      Tab::Activities => "Activities",
      Tab::Medications => "Medications",
      Tab::HealthUpdates => "Health",
      Tab::VetAppointments => "Vet",
      Tab::ChronicConditions => "Conditions",
      Tab::EmergencyAlerts => "Alerts",
    }
  }

  pub fn table(self) -> Table {
    match self {
      Tab::Activities => Table::Activities,
      Tab::Medications => Table::Medications,
      Tab::HealthUpdates => Table::HealthUpdates,
      Tab::VetAppointments => Table::VeterinaryAppointments,
      Tab::ChronicConditions => Table::ChronicConditions,
      Tab::EmergencyAlerts => Table::EmergencyAlerts,
    }
  }

  fn index(self) -> usize { Tab::ALL.iter().position(|t| *t == self).unwrap_or(0) }

  pub fn next(self) -> Tab { Tab::ALL[(self.index() + 1) % Tab::ALL.len()] }

  pub fn prev(self) -> Tab {
    Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
  }
}

// ─── Display rows ────────────────────────────────────────────────────────────

/// One record as the detail page shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
  pub id:       Uuid,
  pub when:     DateTime<Utc>,
  pub headline: String,
  pub detail:   String,
  /// Only alerts carry a resolved flag.
  pub resolved: Option<bool>,
}

/// Feeding and walking recency plus open alerts, for the detail header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
  pub last_fed:    Option<DateTime<Utc>>,
  pub last_walked: Option<DateTime<Utc>>,
  pub open_alerts: usize,
}

pub fn local_time(at: DateTime<Utc>) -> String {
  at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn join(parts: &[Option<&str>]) -> String {
  parts
    .iter()
    .flatten()
    .filter(|s| !s.trim().is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(" · ")
}

trait Row: ChildEntity + Stored {
  fn headline(&self) -> String;
  fn detail(&self) -> String;
  fn resolved(&self) -> Option<bool> { None }

  fn entry(&self) -> Entry {
    Entry {
      id:       self.id(),
      when:     self.sort_at(),
      headline: self.headline(),
      detail:   self.detail(),
      resolved: self.resolved(),
    }
  }
}

impl Row for Activity {
  fn headline(&self) -> String { format!("{} by {}", self.activity_type, self.walker_id) }

  fn detail(&self) -> String {
    join(&[self.notes.as_deref(), self.temperament_notes.as_deref()])
  }
}

impl Row for Medication {
  fn headline(&self) -> String { format!("{} {}, {}", self.kind, self.dose, self.frequency) }

  fn detail(&self) -> String {
    self
      .last_administered_at
      .map(|t| format!("last given {}", local_time(t)))
      .unwrap_or_default()
  }
}

impl Row for HealthStatusUpdate {
  fn headline(&self) -> String {
    self
      .symptoms
      .clone()
      .filter(|s| !s.trim().is_empty())
      .unwrap_or_else(|| "(no symptoms)".to_owned())
  }

  fn detail(&self) -> String {
    join(&[self.behavior_changes.as_deref(), self.concerns.as_deref()])
  }
}

impl Row for VeterinaryAppointment {
  fn headline(&self) -> String {
    self
      .reason
      .clone()
      .filter(|s| !s.trim().is_empty())
      .unwrap_or_else(|| "Appointment".to_owned())
  }

  fn detail(&self) -> String {
    join(&[
      self.vet_name.as_deref(),
      self.vet_recommendations.as_deref(),
      self.follow_up_instructions.as_deref(),
    ])
  }
}

impl Row for ChronicCondition {
  fn headline(&self) -> String { self.condition_name.clone() }

  fn detail(&self) -> String {
    let diagnosed = self
      .diagnosis_date
      .map(|d| format!("diagnosed {}", d.format("%Y-%m-%d")));
    join(&[
      diagnosed.as_deref(),
      self.management_plan.as_deref(),
      self.description.as_deref(),
    ])
  }
}

impl Row for EmergencyAlert {
  fn headline(&self) -> String { self.alert_message.clone() }

  fn detail(&self) -> String { String::new() }

  fn resolved(&self) -> Option<bool> { Some(self.resolved) }
}

fn rows<T: Row>(store: &Store, dog_id: Uuid) -> Vec<Entry> {
  let mut entries: Vec<Entry> = store
    .of::<T>()
    .iter()
    .filter(|r| r.dog_id() == Some(dog_id))
    .map(T::entry)
    .collect();
  match T::TABLE.list_order() {
    SortOrder::Ascending => entries.sort_by_key(|e| e.when),
    SortOrder::Descending => entries.sort_by_key(|e| std::cmp::Reverse(e.when)),
  }
  entries
}

// ─── App ─────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub screen: Screen,

  /// Local mirror of the backend, kept in step by snapshots and the feed.
  pub store: Store,

  /// Walk totals per dog, from the analytics endpoint.
  pub walks: HashMap<Uuid, u64>,

  /// Activities across all dogs for the care calendar. Not part of the
  /// store: the store's activity collection is scoped to one dog.
  pub calendar: Vec<Activity>,

  /// First calendar line shown.
  pub calendar_scroll: u16,

  /// Current fuzzy-filter string.
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor within the *filtered* dog list.
  pub list_cursor: usize,

  pub tab: Tab,

  /// Cursor within the current tab's entries.
  pub entry_cursor: usize,

  /// Open entry form, drawn as a popup.
  pub form: Option<Form>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Whether the change feed is connected.
  pub feed_live: bool,

  /// Record awaiting a second `d` to confirm deletion.
  pending_delete: Option<Uuid>,

  client:        ApiClient,
  poll_every:    Duration,
  tx:            mpsc::UnboundedSender<AppMessage>,
  tasks:         PageTasks,
  dirty:         Arc<AtomicBool>,
  subscriptions: Vec<SubscriptionId>,
}

impl App {
  pub fn new(
    client: ApiClient,
    poll_every: Duration,
    tx: mpsc::UnboundedSender<AppMessage>,
  ) -> Self {
    let mut store = Store::new();
    let dirty = Arc::new(AtomicBool::new(true));
    let flag = dirty.clone();
    let subscriptions =
      store.subscribe_all(Arc::new(move |_| flag.store(true, Ordering::Relaxed)));
    Self {
      screen: Screen::DogList,
      store,
      walks: HashMap::new(),
      calendar: Vec::new(),
      calendar_scroll: 0,
      filter: String::new(),
      filter_active: false,
      list_cursor: 0,
      tab: Tab::Activities,
      entry_cursor: 0,
      form: None,
      status_msg: String::new(),
      feed_live: false,
      pending_delete: None,
      client,
      poll_every,
      tx,
      tasks: PageTasks::default(),
      dirty,
      subscriptions,
    }
  }

  /// Whether anything changed since the last call; clears the flag.
  pub fn take_dirty(&self) -> bool { self.dirty.swap(false, Ordering::Relaxed) }

  pub fn mark_dirty(&self) { self.dirty.store(true, Ordering::Relaxed); }

  fn scope(&self) -> Scope {
    match self.screen {
      Screen::DogList | Screen::Calendar => Scope::All,
      Screen::DogDetail(id) => Scope::Dog(id),
    }
  }

  // ── Page lifecycle ────────────────────────────────────────────────────────

  /// Show the dog list: subscribe to dog changes, load a snapshot, poll.
  pub async fn mount_list(&mut self) {
    let mut tasks = PageTasks::default();
    tasks.push(feed::spawn(
      self.client.clone(),
      ChangeFilter::table(Table::Dogs),
      self.tx.clone(),
    ));
    // Replacing the set aborts the previous page's tasks.
    self.tasks = tasks;
    self.screen = Screen::DogList;
    self.feed_live = false;
    self.form = None;
    self.pending_delete = None;

    match poll::dog_list(&self.client).await {
      Ok(snapshot) => self.apply_dog_list(snapshot),
      Err(e) => self.status_msg = e.user_message(),
    }
    self.tasks.push(poll::spawn_dog_list(
      self.client.clone(),
      self.poll_every,
      self.tx.clone(),
    ));
    self.mark_dirty();
  }

  /// Open one dog. On failure the list page stays mounted.
  pub async fn mount_detail(&mut self, dog_id: Uuid) {
    let mut tasks = PageTasks::default();
    tasks.push(feed::spawn(
      self.client.clone(),
      ChangeFilter::default(),
      self.tx.clone(),
    ));

    self.status_msg = "Loading…".into();
    match self.client.dog_profile(dog_id).await {
      Ok(profile) => {
        self.store.load_profile(profile);
        self.status_msg.clear();
      }
      Err(e) => {
        self.status_msg = e.user_message();
        self.mark_dirty();
        return;
      }
    }

    tasks.push(poll::spawn_profile(
      self.client.clone(),
      dog_id,
      self.poll_every,
      self.tx.clone(),
    ));
    self.tasks = tasks;
    self.screen = Screen::DogDetail(dog_id);
    self.feed_live = false;
    self.tab = Tab::Activities;
    self.entry_cursor = 0;
    self.form = None;
    self.pending_delete = None;
    self.mark_dirty();
  }

  /// Show the care calendar: load the window, then poll it.
  pub async fn mount_calendar(&mut self) {
    let mut tasks = PageTasks::default();
    tasks.push(poll::spawn_calendar(
      self.client.clone(),
      CALENDAR_DAYS,
      self.poll_every,
      self.tx.clone(),
    ));
    self.tasks = tasks;
    self.screen = Screen::Calendar;
    self.feed_live = false;
    self.form = None;
    self.pending_delete = None;
    self.calendar_scroll = 0;

    match self.client.recent_activities(CALENDAR_DAYS).await {
      Ok(activities) => self.calendar = activities,
      Err(e) => self.status_msg = e.user_message(),
    }
    self.mark_dirty();
  }

  /// Stop background work and detach from the store.
  pub fn shutdown(&mut self) {
    self.tasks = PageTasks::default();
    let ids = std::mem::take(&mut self.subscriptions);
    self.store.unsubscribe_all(&ids);
  }

  fn apply_dog_list(&mut self, snapshot: DogListSnapshot) {
    self.store.load_dogs(snapshot.dogs);
    self.walks = snapshot
      .walks
      .into_iter()
      .map(|w| (w.dog_id, w.walks))
      .collect();
    self.clamp_cursors();
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  pub async fn handle_message(&mut self, msg: AppMessage) {
    match msg {
      AppMessage::Change(change) => {
        let scope = self.scope();
        reconcile::apply_scoped(&mut self.store, scope, &change);
        if let Screen::DogDetail(id) = self.screen
          && !self.store.dogs.contains(id)
        {
          self.mount_list().await;
          self.status_msg = "That dog was removed".into();
        }
        self.clamp_cursors();
      }
      AppMessage::FeedLive(live) => self.feed_live = live,
      AppMessage::DogList(result) => {
        if self.screen != Screen::DogList {
          return;
        }
        match result {
          Ok(snapshot) => self.apply_dog_list(snapshot),
          Err(e) => self.status_msg = e.user_message(),
        }
      }
      AppMessage::Profile(dog_id, result) => {
        if self.screen != Screen::DogDetail(dog_id) {
          return;
        }
        match result {
          Ok(profile) => {
            self.store.load_profile(profile);
            self.clamp_cursors();
          }
          Err(GatewayError::NotFound(_)) => {
            self.mount_list().await;
            self.status_msg = "That dog was removed".into();
          }
          Err(e) => self.status_msg = e.user_message(),
        }
      }
      AppMessage::Calendar(result) => {
        if self.screen != Screen::Calendar {
          return;
        }
        match result {
          Ok(activities) => self.calendar = activities,
          Err(e) => self.status_msg = e.user_message(),
        }
      }
    }
    self.mark_dirty();
  }

  // ── Views ─────────────────────────────────────────────────────────────────

  /// Dogs matching the current filter, in list order.
  pub fn filtered_dogs(&self) -> Vec<&Dog> {
    if self.filter.is_empty() {
      return self.store.dogs.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .store
      .dogs
      .iter()
      .filter(|d| {
        [&d.name, &d.breed, &d.temperament]
          .iter()
          .any(|field| matcher.fuzzy_match(field, &self.filter).is_some())
      })
      .collect()
  }

  pub fn cursor_dog(&self) -> Option<&Dog> {
    self.filtered_dogs().get(self.list_cursor).copied()
  }

  /// The dog the detail page shows.
  pub fn current_dog(&self) -> Option<&Dog> {
    match self.screen {
      Screen::DogDetail(id) => self.store.dogs.get(id),
      Screen::DogList | Screen::Calendar => None,
    }
  }

  /// The care calendar in local days, newest first.
  pub fn calendar_days(&self) -> Vec<CareDay> {
    care_calendar(self.calendar.iter().cloned(), &Local)
  }

  /// Display name of a dog, for rows that only carry its id.
  pub fn dog_name(&self, id: Uuid) -> &str {
    self.store.dogs.get(id).map_or("(unknown dog)", |d| d.name.as_str())
  }

  pub fn summary(&self, dog_id: Uuid) -> Summary {
    let activities = || {
      self
        .store
        .activities
        .iter()
        .filter(move |a| a.dog_id == dog_id)
    };
    Summary {
      last_fed:    last_activity(activities(), ActivityType::Feeding),
      last_walked: last_activity(activities(), ActivityType::Walk),
      open_alerts: self
        .store
        .emergency_alerts
        .iter()
        .filter(|a| a.dog_id == dog_id && !a.resolved)
        .count(),
    }
  }

  /// Rows of `tab` for the mounted dog, in the backend's list order.
  pub fn entries(&self, tab: Tab) -> Vec<Entry> {
    let Screen::DogDetail(dog_id) = self.screen else {
      return Vec::new();
    };
    match tab {
      Tab::Activities => rows::<Activity>(&self.store, dog_id),
      Tab::Medications => rows::<Medication>(&self.store, dog_id),
      Tab::HealthUpdates => rows::<HealthStatusUpdate>(&self.store, dog_id),
      Tab::VetAppointments => rows::<VeterinaryAppointment>(&self.store, dog_id),
      Tab::ChronicConditions => rows::<ChronicCondition>(&self.store, dog_id),
      Tab::EmergencyAlerts => rows::<EmergencyAlert>(&self.store, dog_id),
    }
  }

  fn selected_entry(&self) -> Option<Entry> {
    self.entries(self.tab).into_iter().nth(self.entry_cursor)
  }

  fn clamp_cursors(&mut self) {
    let dogs = self.filtered_dogs().len();
    self.list_cursor = self.list_cursor.min(dogs.saturating_sub(1));
    let entries = self.entries(self.tab).len();
    self.entry_cursor = self.entry_cursor.min(entries.saturating_sub(1));
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }
    self.mark_dirty();

    if self.form.is_some() {
      self.handle_form_key(key).await;
      return Ok(true);
    }
    if self.filter_active {
      self.handle_filter_key(key).await;
      return Ok(true);
    }
    let confirming = self.pending_delete.take();

    match self.screen {
      Screen::DogList => self.handle_list_key(key, confirming).await,
      Screen::DogDetail(dog_id) => {
        self.handle_detail_key(key, dog_id, confirming).await;
        Ok(true)
      }
      Screen::Calendar => {
        self.handle_calendar_key(key).await;
        Ok(true)
      }
    }
  }

  async fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
        let only = match self.filtered_dogs().as_slice() {
          [dog] => Some(dog.id),
          _ => None,
        };
        if let Some(id) = only {
          self.mount_detail(id).await;
        }
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
  }

  async fn handle_list_key(
    &mut self,
    key: KeyEvent,
    confirming: Option<Uuid>,
  ) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Char('q') => return Ok(false),

      KeyCode::Down | KeyCode::Char('j') => {
        if self.list_cursor + 1 < self.filtered_dogs().len() {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }

      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.cursor_dog().map(|d| d.id) {
          self.mount_detail(id).await;
        }
      }

      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }

      KeyCode::Char('c') => self.mount_calendar().await,

      KeyCode::Char('n') => self.form = Some(Form::new(Table::Dogs)),
      KeyCode::Char('e') => self.form = self.cursor_dog().map(Form::edit_dog),

      KeyCode::Char('r') => match poll::dog_list(&self.client).await {
        Ok(snapshot) => {
          self.apply_dog_list(snapshot);
          self.status_msg = "Refreshed".into();
        }
        Err(e) => self.status_msg = e.user_message(),
      },

      KeyCode::Char('d') => {
        let Some((id, name)) = self.cursor_dog().map(|d| (d.id, d.name.clone())) else {
          return Ok(true);
        };
        if confirming == Some(id) {
          let result = self.delete_dog(id).await;
          self.report(result, format!("Deleted {name}"));
        } else {
          self.pending_delete = Some(id);
          self.status_msg = format!("Press d again to delete {name}");
        }
      }

      _ => {}
    }
    Ok(true)
  }

  async fn handle_detail_key(
    &mut self,
    key: KeyEvent,
    dog_id: Uuid,
    confirming: Option<Uuid>,
  ) {
    match key.code {
      KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') => self.mount_list().await,

      KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
        self.tab = self.tab.next();
        self.entry_cursor = 0;
      }
      KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
        self.tab = self.tab.prev();
        self.entry_cursor = 0;
      }

      KeyCode::Down | KeyCode::Char('j') => {
        if self.entry_cursor + 1 < self.entries(self.tab).len() {
          self.entry_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.entry_cursor = self.entry_cursor.saturating_sub(1);
      }

      KeyCode::Char('a') => {
        let form = Form::new(self.tab.table());
        let form = match self.tab {
          Tab::Activities => form.with_value("walker_id", self.client.username()),
          _ => form,
        };
        self.form = Some(form);
      }

      KeyCode::Char('e') => self.form = self.current_dog().map(Form::edit_dog),

      KeyCode::Char('r') => {
        let result = self.refresh_tab(dog_id).await;
        self.report(result, format!("Refreshed {}", self.tab.title().to_lowercase()));
      }

      KeyCode::Char('w') => self.quick_log(dog_id, ActivityType::Walk).await,
      KeyCode::Char('f') => self.quick_log(dog_id, ActivityType::Feeding).await,

      KeyCode::Char(' ') => {
        if let Some(Entry {
          id,
          resolved: Some(resolved),
          ..
        }) = self.selected_entry()
        {
          let result = self.set_resolved(id, !resolved).await;
          let done = if resolved { "Alert reopened" } else { "Alert resolved" };
          self.report(result, done.to_owned());
        }
      }

      KeyCode::Char('d') => {
        let Some(entry) = self.selected_entry() else {
          return;
        };
        if confirming == Some(entry.id) {
          let result = self.delete_entry(entry.id).await;
          self.report(result, "Deleted".to_owned());
        } else {
          self.pending_delete = Some(entry.id);
          self.status_msg = format!("Press d again to delete \"{}\"", entry.headline);
        }
      }

      _ => {}
    }
  }

  async fn handle_calendar_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') | KeyCode::Char('c') => {
        self.mount_list().await
      }
      KeyCode::Down | KeyCode::Char('j') => {
        self.calendar_scroll = self.calendar_scroll.saturating_add(1);
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.calendar_scroll = self.calendar_scroll.saturating_sub(1);
      }
      KeyCode::Char('r') => match self.client.recent_activities(CALENDAR_DAYS).await {
        Ok(activities) => {
          self.calendar = activities;
          self.status_msg = "Refreshed".into();
        }
        Err(e) => self.status_msg = e.user_message(),
      },
      _ => {}
    }
  }

  async fn handle_form_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.form = None;
        return;
      }
      KeyCode::Enter => {
        self.submit_form().await;
        return;
      }
      _ => {}
    }
    let Some(form) = self.form.as_mut() else {
      return;
    };
    match key.code {
      KeyCode::Tab | KeyCode::Down => form.next_field(),
      KeyCode::BackTab | KeyCode::Up => form.prev_field(),
      KeyCode::Left => form.cycle(-1),
      KeyCode::Right => form.cycle(1),
      KeyCode::Backspace => form.backspace(),
      KeyCode::Char(c) => form.type_char(c),
      _ => {}
    }
  }

  fn report(&mut self, result: client::Result<()>, done: String) {
    self.status_msg = match result {
      Ok(()) => done,
      Err(e) => e.user_message(),
    };
    self.clamp_cursors();
  }

  // ── Writes ────────────────────────────────────────────────────────────────
  //
  // Each write goes to the backend first; the store is only touched once the
  // call succeeds. The feed echo of the same change is then a no-op upsert.

  async fn submit_form(&mut self) {
    let Some(form) = self.form.as_ref() else {
      return;
    };
    let dog_id = match self.screen {
      Screen::DogDetail(id) => Some(id),
      Screen::DogList | Screen::Calendar => None,
    };
    let table = form.table;
    let editing = form.editing;
    let fields = match form.to_fields(dog_id) {
      Ok(fields) => fields,
      Err(message) => {
        if let Some(form) = self.form.as_mut() {
          form.error = Some(message);
        }
        return;
      }
    };

    let result = match (table, editing) {
      (Table::Dogs, Some(id)) => self.update_dog(id, fields).await,
      (table, _) => self.create(table, fields).await,
    };
    match result {
      Ok(()) => {
        self.form = None;
        self.status_msg = "Saved".into();
      }
      Err(e) => {
        if let Some(form) = self.form.as_mut() {
          form.error = Some(e.user_message());
        }
      }
    }
  }

  async fn create(&mut self, table: Table, fields: Fields) -> client::Result<()> {
    match table {
      Table::Dogs => self.create_dog(fields).await,
      Table::Activities => self.create_in::<Activity>(fields).await,
      Table::Medications => self.create_in::<Medication>(fields).await,
      Table::HealthUpdates => self.create_in::<HealthStatusUpdate>(fields).await,
      Table::VeterinaryAppointments => {
        self.create_in::<VeterinaryAppointment>(fields).await
      }
      Table::ChronicConditions => self.create_in::<ChronicCondition>(fields).await,
      Table::EmergencyAlerts => self.create_in::<EmergencyAlert>(fields).await,
    }
  }

  async fn create_dog(&mut self, fields: Fields) -> client::Result<()> {
    let dog = self.client.create_dog(fields).await?;
    self.store.dogs.add(dog);
    Ok(())
  }

  async fn update_dog(&mut self, id: Uuid, patch: Fields) -> client::Result<()> {
    let dog = self.client.update_dog(id, patch).await?;
    self.store.dogs.update(dog);
    Ok(())
  }

  async fn delete_dog(&mut self, id: Uuid) -> client::Result<()> {
    self.client.delete_dog(id).await?;
    self.store.dogs.remove(id);
    self.walks.remove(&id);
    Ok(())
  }

  async fn create_in<T: ChildEntity + Stored>(&mut self, fields: Fields) -> client::Result<()> {
    let record = self.client.create::<T>(fields).await?;
    self.store.of_mut::<T>().add(record);
    Ok(())
  }

  async fn delete_in<T: ChildEntity + Stored>(&mut self, id: Uuid) -> client::Result<()> {
    self.client.delete::<T>(id).await?;
    self.store.of_mut::<T>().remove(id);
    Ok(())
  }

  /// Re-list one record kind for `dog_id` and swap it in wholesale.
  async fn refresh_in<T: ChildEntity + Stored>(&mut self, dog_id: Uuid) -> client::Result<()> {
    let records = self.client.list::<T>(dog_id).await?;
    self.store.of_mut::<T>().replace_all(records);
    Ok(())
  }

  async fn refresh_tab(&mut self, dog_id: Uuid) -> client::Result<()> {
    match self.tab {
      Tab::Activities => self.refresh_in::<Activity>(dog_id).await,
      Tab::Medications => self.refresh_in::<Medication>(dog_id).await,
      Tab::HealthUpdates => self.refresh_in::<HealthStatusUpdate>(dog_id).await,
      Tab::VetAppointments => self.refresh_in::<VeterinaryAppointment>(dog_id).await,
      Tab::ChronicConditions => self.refresh_in::<ChronicCondition>(dog_id).await,
      Tab::EmergencyAlerts => self.refresh_in::<EmergencyAlert>(dog_id).await,
    }
  }

  async fn delete_entry(&mut self, id: Uuid) -> client::Result<()> {
    match self.tab {
      Tab::Activities => self.delete_in::<Activity>(id).await,
      Tab::Medications => self.delete_in::<Medication>(id).await,
      Tab::HealthUpdates => self.delete_in::<HealthStatusUpdate>(id).await,
      Tab::VetAppointments => self.delete_in::<VeterinaryAppointment>(id).await,
      Tab::ChronicConditions => self.delete_in::<ChronicCondition>(id).await,
      Tab::EmergencyAlerts => self.delete_in::<EmergencyAlert>(id).await,
    }
  }

  async fn set_resolved(&mut self, id: Uuid, resolved: bool) -> client::Result<()> {
    let mut patch = Fields::new();
    patch.insert("resolved".into(), Value::Bool(resolved));
    let alert = self.client.update::<EmergencyAlert>(id, patch).await?;
    self.store.emergency_alerts.update(alert);
    Ok(())
  }

  /// Log a walk or feeding by the signed-in user, no form.
  async fn quick_log(&mut self, dog_id: Uuid, kind: ActivityType) {
    let fields = match json!({
      "dog_id": dog_id,
      "walker_id": self.client.username(),
      "activity_type": kind,
    }) {
      Value::Object(fields) => fields,
      _ => Fields::new(),
    };
    let result = self.create_in::<Activity>(fields).await;
    self.report(result, format!("Logged {}", kind.label().to_lowercase()));
  }
}
