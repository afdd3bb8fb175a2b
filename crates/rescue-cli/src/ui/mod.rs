//! TUI rendering: header, two-pane body, status bar, and the form popup.

pub mod calendar;
pub mod dog_detail;
pub mod dog_list;
pub mod form;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::{App, Screen};

// ─── Root draw ───────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);

  if let Some(form) = &app.form {
    form::draw(f, rows[1], form);
  }
}

// ─── Header ──────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    " rescue",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let live = if app.feed_live {
    Span::styled("  ● live", Style::default().fg(Color::Green))
  } else {
    Span::styled("  ○ offline", Style::default().fg(Color::Yellow))
  };
  let right = Span::styled(format!("{date} "), Style::default().fg(Color::Gray));

  let used = (left.width() + live.width() + right.width()) as u16;
  let pad = area.width.saturating_sub(used);

  let line = Line::from(vec![left, live, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
    .split(area);

  dog_list::draw(f, cols[0], app);
  match app.screen {
    Screen::DogList => dog_list::draw_preview(f, cols[1], app),
    Screen::DogDetail(_) => dog_detail::draw(f, cols[1], app),
    Screen::Calendar => calendar::draw(f, cols[1], app),
  }
}

// ─── Status bar ──────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match app.screen {
    _ if app.form.is_some() => (
      "FORM",
      "Tab/↑↓ field  ←→ choose  Enter save  Esc cancel",
    ),
    Screen::DogList if app.filter_active => (
      "SEARCH",
      "Type to filter  Esc cancel  Enter select",
    ),
    Screen::DogList => (
      "DOGS",
      "↑↓/jk move  Enter open  / search  n new  e edit  d delete  c calendar  r refresh  q quit",
    ),
    Screen::DogDetail(_) => (
      "DOG",
      "←→ tab  ↑↓ move  a add  w walk  f fed  space resolve  d delete  e edit  r refresh  Esc back",
    ),
    Screen::Calendar => ("CALENDAR", "↑↓/jk scroll  r refresh  Esc back"),
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), Style::default().fg(Color::Gray));

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, hint_span]))
      .style(Style::default().bg(Color::Black)),
    area,
  );
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use chrono::Utc;
  use ratatui::{Terminal, backend::TestBackend};
  use rescue_core::entity::{Activity, ActivityType, Dog};
  use tokio::sync::mpsc;
  use uuid::Uuid;

  use super::*;
  use crate::client::{ApiClient, ApiConfig};

  fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    buffer
      .content()
      .chunks(buffer.area.width as usize)
      .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
      .collect::<Vec<_>>()
      .join("\n")
  }

  #[tokio::test]
  async fn list_page_renders_dogs_and_feed_state() {
    let client = ApiClient::new(ApiConfig {
      base_url: "http://127.0.0.1:9".into(),
      username: "v".into(),
      password: "p".into(),
    })
    .unwrap();
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut app = App::new(client, Duration::from_secs(30), tx);
    let biscuit = Dog {
      id:            Uuid::new_v4(),
      name:          "Biscuit".into(),
      age:           Some(4),
      breed:         "Beagle".into(),
      health_status: "good".into(),
      status:        "available".into(),
      temperament:   "friendly".into(),
      notes:         String::new(),
      created_at:    Utc::now(),
    };
    app.walks.insert(biscuit.id, 12);
    app.store.load_dogs(vec![biscuit]);

    let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
    terminal.draw(|f| draw(f, &app)).unwrap();
    let text = buffer_text(&terminal);
    assert!(text.contains("Biscuit"));
    assert!(text.contains("offline"));
    assert!(text.contains("12 walks"));

    app.feed_live = true;
    app.form = Some(crate::form::Form::new(rescue_core::Table::Dogs));
    terminal.draw(|f| draw(f, &app)).unwrap();
    let text = buffer_text(&terminal);
    assert!(text.contains("live"));
    assert!(text.contains("New dog"));
  }

  #[tokio::test]
  async fn calendar_renders_days_and_dog_names() {
    let client = ApiClient::new(ApiConfig {
      base_url: "http://127.0.0.1:9".into(),
      username: "v".into(),
      password: "p".into(),
    })
    .unwrap();
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut app = App::new(client, Duration::from_secs(30), tx);
    let biscuit = Dog {
      id:            Uuid::new_v4(),
      name:          "Biscuit".into(),
      age:           None,
      breed:         String::new(),
      health_status: String::new(),
      status:        String::new(),
      temperament:   String::new(),
      notes:         String::new(),
      created_at:    Utc::now(),
    };
    app.calendar = vec![Activity {
      id:                Uuid::new_v4(),
      dog_id:            biscuit.id,
      walker_id:         "sam".into(),
      activity_type:     ActivityType::Feeding,
      notes:             None,
      temperament_notes: None,
      created_at:        Utc::now(),
    }];
    app.store.load_dogs(vec![biscuit]);
    app.screen = Screen::Calendar;

    let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
    terminal.draw(|f| draw(f, &app)).unwrap();
    let text = buffer_text(&terminal);
    assert!(text.contains("Care calendar"));
    assert!(text.contains(&Local::now().format("%a %Y-%m-%d").to_string()));
    assert!(text.contains("Feeding"));
    assert!(text.contains("by sam"));
    assert!(text.contains("CALENDAR"));
  }
}
