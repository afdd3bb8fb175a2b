//! Entry form popup.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph},
};

use crate::form::{Form, Input};

/// Draw `form` centred over `area`.
pub fn draw(f: &mut Frame, area: Rect, form: &Form) {
  let height = (form.fields.len() as u16 + 4).min(area.height);
  let width = 64.min(area.width);
  let popup = Rect {
    x: area.x + (area.width - width) / 2,
    y: area.y + (area.height - height) / 2,
    width,
    height,
  };

  let block = Block::default()
    .title(form.title())
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(popup);
  f.render_widget(Clear, popup);
  f.render_widget(block, popup);

  let mut lines: Vec<Line> = form
    .fields
    .iter()
    .enumerate()
    .map(|(i, field)| {
      let focused = i == form.focus;
      let label_style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
      } else {
        Style::default().fg(Color::Gray)
      };
      let value = match field.input {
        Input::Choice(_) => Span::raw(format!("‹ {} ›", field.value)),
        _ if field.value.is_empty() && !focused => {
          Span::styled(field.hint(), Style::default().fg(Color::DarkGray))
        }
        _ if focused => Span::raw(format!("{}_", field.value)),
        _ => Span::raw(field.value.clone()),
      };
      Line::from(vec![Span::styled(format!("{:<20}", field.label), label_style), value])
    })
    .collect();

  lines.push(Line::from(""));
  if let Some(error) = &form.error {
    lines.push(Line::from(Span::styled(
      error.clone(),
      Style::default().fg(Color::Red),
    )));
  }

  f.render_widget(Paragraph::new(lines), inner);
}
