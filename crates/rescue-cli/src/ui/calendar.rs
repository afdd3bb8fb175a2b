//! Care calendar pane: every dog's recent activities, grouped by local day.

use chrono::Local;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, CALENDAR_DAYS};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(format!(" Care calendar (last {CALENDAR_DAYS} days) "))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let days = app.calendar_days();
  if days.is_empty() {
    f.render_widget(
      Paragraph::new("No activities logged.").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let mut lines = Vec::new();
  for day in &days {
    lines.push(Line::from(Span::styled(
      format!("{}  ({})", day.day.format("%a %Y-%m-%d"), day.activities.len()),
      Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )));
    for activity in &day.activities {
      let time = activity.created_at.with_timezone(&Local).format("%H:%M");
      lines.push(Line::from(vec![
        Span::styled(format!("  {time}  "), Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{:<18}", activity.activity_type.label())),
        Span::styled(
          app.dog_name(activity.dog_id).to_owned(),
          Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
          format!("  by {}", activity.walker_id),
          Style::default().fg(Color::Gray),
        ),
      ]));
    }
    lines.push(Line::from(""));
  }

  f.render_widget(Paragraph::new(lines).scroll((app.calendar_scroll, 0)), inner);
}
