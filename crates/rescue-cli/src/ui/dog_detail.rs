//! Dog detail pane: profile summary, record tabs, and the selected tab's rows.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs},
};

use super::dog_list::{label_style, profile_lines};
use crate::app::{App, Tab, local_time};

// ─── Public entry ────────────────────────────────────────────────────────────

/// Render the detail pane into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let Some(dog) = app.current_dog() else {
    return;
  };

  let block = Block::default()
    .title(format!(" {} ", dog.name))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let mut header = profile_lines(dog);
  let summary = app.summary(dog.id);
  let ago = |at: Option<chrono::DateTime<chrono::Utc>>| {
    at.map(local_time).unwrap_or_else(|| "never".to_owned())
  };
  header.push(Line::from(vec![
    Span::styled(format!("{:<14}", "last fed"), label_style()),
    Span::raw(ago(summary.last_fed)),
  ]));
  header.push(Line::from(vec![
    Span::styled(format!("{:<14}", "last walked"), label_style()),
    Span::raw(ago(summary.last_walked)),
  ]));
  if summary.open_alerts > 0 {
    header.push(Line::from(Span::styled(
      format!("⚠ {} open alert(s)", summary.open_alerts),
      Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )));
  }

  let sections = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(header.len() as u16 + 1),
      Constraint::Length(1),
      Constraint::Min(0),
    ])
    .split(inner);

  f.render_widget(Paragraph::new(header), sections[0]);
  draw_tabs(f, sections[1], app);
  draw_entries(f, sections[2], app);
}

// ─── Tabs ────────────────────────────────────────────────────────────────────

fn draw_tabs(f: &mut Frame, area: Rect, app: &App) {
  let titles: Vec<String> = Tab::ALL
    .iter()
    .map(|tab| format!("{} ({})", tab.title(), app.entries(*tab).len()))
    .collect();
  let selected = Tab::ALL.iter().position(|t| *t == app.tab).unwrap_or(0);
  f.render_widget(
    Tabs::new(titles)
      .select(selected)
      .style(Style::default().fg(Color::DarkGray))
      .highlight_style(
        Style::default()
          .fg(Color::White)
          .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
      ),
    area,
  );
}

fn draw_entries(f: &mut Frame, area: Rect, app: &App) {
  let entries = app.entries(app.tab);
  if entries.is_empty() {
    f.render_widget(
      Paragraph::new("Nothing recorded. Press a to add.")
        .style(Style::default().fg(Color::DarkGray)),
      area,
    );
    return;
  }

  let items: Vec<ListItem> = entries
    .iter()
    .map(|entry| {
      let mut spans = vec![
        Span::styled(
          format!("{}  ", local_time(entry.when)),
          Style::default().fg(Color::DarkGray),
        ),
        Span::raw(entry.headline.clone()),
      ];
      match entry.resolved {
        Some(true) => spans.push(Span::styled("  ✓ resolved", Style::default().fg(Color::Green))),
        Some(false) => spans.push(Span::styled("  open", Style::default().fg(Color::Red))),
        None => {}
      }
      let mut lines = vec![Line::from(spans)];
      if !entry.detail.is_empty() {
        lines.push(Line::from(Span::styled(
          format!("                  {}", entry.detail),
          Style::default().fg(Color::Gray),
        )));
      }
      ListItem::new(lines)
    })
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.entry_cursor));
  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    area,
    &mut state,
  );
}
