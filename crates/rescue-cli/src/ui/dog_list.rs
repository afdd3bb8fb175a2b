//! Dog list pane (left) and the preview card shown beside it.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use rescue_core::entity::Dog;

use crate::app::{App, Screen};

/// Render the dog list into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let filtered = app.filtered_dogs();
  let total = app.store.dogs.len();

  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Dogs ({}/{}) ", filtered.len(), total)
  } else {
    format!(" Dogs ({total}) ")
  };

  let border = if matches!(app.screen, Screen::DogDetail(_)) {
    Color::Black
  } else {
    Color::DarkGray
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let viewing = match app.screen {
    Screen::DogDetail(id) => Some(id),
    Screen::DogList | Screen::Calendar => None,
  };
  let items: Vec<ListItem> = filtered
    .iter()
    .map(|dog| {
      let marker = if viewing == Some(dog.id) { "▸ " } else { "  " };
      ListItem::new(Line::from(vec![
        Span::raw(marker),
        Span::raw(dog.name.clone()),
        Span::styled(format!("  {}", dog.status), Style::default().fg(Color::DarkGray)),
      ]))
    })
    .collect();

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  if (app.filter_active || !app.filter.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let filter_text = if app.filter_active {
      format!("/{}_", app.filter)
    } else {
      format!("/{}", app.filter)
    };
    f.render_widget(
      Paragraph::new(filter_text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  if filtered.is_empty() {
    let hint = if total == 0 { "No dogs yet. Press n to add one." } else { "No matches." };
    f.render_widget(
      Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
      inner_area,
    );
    return;
  }

  let mut state = ListState::default();
  if app.screen == Screen::DogList {
    state.select(Some(app.list_cursor));
  }

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner_area,
    &mut state,
  );
}

/// Right pane on the list page: the dog under the cursor.
pub fn draw_preview(f: &mut Frame, area: Rect, app: &App) {
  let dog = app.cursor_dog();
  let block = Block::default()
    .title(dog.map_or(" Dog ".to_owned(), |d| format!(" {} ", d.name)))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let Some(dog) = dog else {
    f.render_widget(
      Paragraph::new("Select a dog and press Enter.")
        .style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  };

  let walks = app.walks.get(&dog.id).copied().unwrap_or(0);
  let mut lines = profile_lines(dog);
  lines.push(Line::from(""));
  lines.push(Line::from(vec![
    Span::styled(format!("{:<14}", "walks"), label_style()),
    Span::raw(format!("{walks} walks")),
  ]));

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

pub(super) fn label_style() -> Style {
  Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

/// One line per non-empty dog attribute.
pub(super) fn profile_lines(dog: &Dog) -> Vec<Line<'static>> {
  let age = dog.age.map(|a| a.to_string()).unwrap_or_default();
  [
    ("breed", dog.breed.as_str()),
    ("age", age.as_str()),
    ("status", dog.status.as_str()),
    ("health", dog.health_status.as_str()),
    ("temperament", dog.temperament.as_str()),
    ("notes", dog.notes.as_str()),
  ]
  .into_iter()
  .filter(|(_, value)| !value.trim().is_empty())
  .map(|(label, value)| {
    Line::from(vec![
      Span::styled(format!("{label:<14}"), label_style()),
      Span::raw(value.to_owned()),
    ])
  })
  .collect()
}
