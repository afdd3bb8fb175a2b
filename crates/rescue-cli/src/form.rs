//! Entry forms: which fields each record kind asks for, and how typed text
//! becomes a JSON payload.

use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone as _, Utc};
use rescue_core::{Fields, Table, entity::Dog};
use serde_json::Value;
use uuid::Uuid;

/// Format accepted by date-and-time fields.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";
/// Format accepted by date fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Wire labels of [`ActivityType`](rescue_core::entity::ActivityType), in menu order.
const ACTIVITY_TYPES: [&str; 3] = ["Walk", "Feeding", "Temperament Notes"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
  Text,
  /// Local time, `YYYY-MM-DD HH:MM`; sent as RFC 3339 UTC.
  DateTime,
  /// `YYYY-MM-DD`.
  Date,
  /// Non-negative whole number.
  Number,
  /// One of a fixed set; cycled with ←/→.
  Choice(&'static [&'static str]),
}

#[derive(Debug, Clone)]
pub struct Field {
  pub key:   &'static str,
  pub label: &'static str,
  pub input: Input,
  pub value: String,
}

impl Field {
  fn new(key: &'static str, label: &'static str, input: Input) -> Self {
    let value = match input {
      Input::Choice(options) => options.first().copied().unwrap_or_default().to_owned(),
      _ => String::new(),
    };
    Self {
      key,
      label,
      input,
      value,
    }
  }

  fn text(key: &'static str, label: &'static str) -> Self {
    Self::new(key, label, Input::Text)
  }

  /// Placeholder shown while the field is empty.
  pub fn hint(&self) -> &'static str {
    match self.input {
      Input::DateTime => "YYYY-MM-DD HH:MM",
      Input::Date => "YYYY-MM-DD",
      Input::Number => "number",
      Input::Text | Input::Choice(_) => "",
    }
  }

  fn to_value(&self) -> Result<Option<Value>, String> {
    let raw = self.value.trim();
    if raw.is_empty() {
      return Ok(None);
    }
    self.parse(raw).map(Some)
  }

  fn parse(&self, raw: &str) -> Result<Value, String> {
    let value = match self.input {
      Input::Text | Input::Choice(_) => Value::String(raw.to_owned()),
      Input::DateTime => {
        let naive = NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
          .map_err(|_| format!("{}: expected YYYY-MM-DD HH:MM", self.label))?;
        let local = Local
          .from_local_datetime(&naive)
          .earliest()
          .ok_or_else(|| format!("{}: no such local time", self.label))?;
        Value::String(local.with_timezone(&Utc).to_rfc3339())
      }
      Input::Date => {
        let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)
          .map_err(|_| format!("{}: expected YYYY-MM-DD", self.label))?;
        Value::String(date.format(DATE_FORMAT).to_string())
      }
      Input::Number => {
        let n: u32 = raw
          .parse()
          .map_err(|_| format!("{}: expected a whole number", self.label))?;
        Value::from(n)
      }
    };
    Ok(value)
  }
}

// ─── Form ────────────────────────────────────────────────────────────────────

/// An open entry form for `table`.
#[derive(Debug, Clone)]
pub struct Form {
  pub table:   Table,
  pub fields:  Vec<Field>,
  pub focus:   usize,
  /// Record being edited; `None` for a new one.
  pub editing: Option<Uuid>,
  /// Inline failure from the last submit attempt.
  pub error:   Option<String>,
}

impl Form {
  pub fn new(table: Table) -> Self {
    let fields = match table {
      Table::Dogs => vec![
        Field::text("name", "Name"),
        Field::new("age", "Age", Input::Number),
        Field::text("breed", "Breed"),
        Field::text("health_status", "Health status"),
        Field::text("status", "Status"),
        Field::text("temperament", "Temperament"),
        Field::text("notes", "Notes"),
      ],
      Table::Activities => vec![
        Field::new("activity_type", "Type", Input::Choice(&ACTIVITY_TYPES)),
        Field::text("walker_id", "Walker"),
        Field::text("notes", "Notes"),
        Field::text("temperament_notes", "Temperament notes"),
      ],
      Table::Medications => vec![
        Field::text("type", "Medication"),
        Field::text("dose", "Dose"),
        Field::text("frequency", "Frequency"),
        Field::new("last_administered_at", "Last given", Input::DateTime),
      ],
      Table::HealthUpdates => vec![
        Field::text("symptoms", "Symptoms"),
        Field::text("behavior_changes", "Behavior changes"),
        Field::text("concerns", "Concerns"),
      ],
      Table::VeterinaryAppointments => vec![
        Field::new("appointment_date", "Date", Input::DateTime),
        Field::text("reason", "Reason"),
        Field::text("vet_name", "Vet"),
        Field::text("vet_recommendations", "Recommendations"),
        Field::text("follow_up_instructions", "Follow-up"),
      ],
      Table::ChronicConditions => vec![
        Field::text("condition_name", "Condition"),
        Field::new("diagnosis_date", "Diagnosed", Input::Date),
        Field::text("management_plan", "Management plan"),
        Field::text("description", "Description"),
      ],
      Table::EmergencyAlerts => vec![
        Field::text("alert_message", "Message"),
        Field::new("alert_date", "When (blank = now)", Input::DateTime),
      ],
    };
    Self {
      table,
      fields,
      focus: 0,
      editing: None,
      error: None,
    }
  }

  /// A dog form pre-filled from `dog`, submitted as a partial update.
  pub fn edit_dog(dog: &Dog) -> Self {
    let age = dog.age.map(|a| a.to_string()).unwrap_or_default();
    let mut form = Self::new(Table::Dogs)
      .with_value("name", &dog.name)
      .with_value("age", &age)
      .with_value("breed", &dog.breed)
      .with_value("health_status", &dog.health_status)
      .with_value("status", &dog.status)
      .with_value("temperament", &dog.temperament)
      .with_value("notes", &dog.notes);
    form.editing = Some(dog.id);
    form
  }

  /// Pre-fill a field, e.g. the walker with the signed-in user.
  pub fn with_value(mut self, key: &str, value: &str) -> Self {
    if let Some(field) = self.fields.iter_mut().find(|f| f.key == key) {
      field.value = value.to_owned();
    }
    self
  }

  pub fn title(&self) -> String {
    match self.table {
      Table::Dogs if self.editing.is_some() => " Edit dog ".to_owned(),
      Table::Dogs => " New dog ".to_owned(),
      table => format!(" New {} entry ", table.name().replace('_', " ")),
    }
  }

  // ── Editing ───────────────────────────────────────────────────────────────

  pub fn next_field(&mut self) { self.focus = (self.focus + 1) % self.fields.len(); }

  pub fn prev_field(&mut self) {
    self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
  }

  pub fn type_char(&mut self, c: char) {
    if let Some(field) = self.fields.get_mut(self.focus)
      && !matches!(field.input, Input::Choice(_))
    {
      field.value.push(c);
    }
  }

  pub fn backspace(&mut self) {
    if let Some(field) = self.fields.get_mut(self.focus)
      && !matches!(field.input, Input::Choice(_))
    {
      field.value.pop();
    }
  }

  /// Step a choice field by `step` options, wrapping around.
  pub fn cycle(&mut self, step: isize) {
    let Some(field) = self.fields.get_mut(self.focus) else {
      return;
    };
    let Input::Choice(options) = field.input else {
      return;
    };
    let len = options.len() as isize;
    let current = options.iter().position(|o| *o == field.value).unwrap_or(0) as isize;
    let next = (current + step).rem_euclid(len) as usize;
    field.value = options[next].to_owned();
  }

  // ── Submission ────────────────────────────────────────────────────────────

  /// Build the create payload. Blank fields are left out so required-field
  /// validation can name them.
  pub fn to_fields(&self, dog_id: Option<Uuid>) -> Result<Fields, String> {
    if self.editing.is_some() {
      return self.to_patch();
    }
    let mut fields = Fields::new();
    if let Some(dog_id) = dog_id {
      fields.insert("dog_id".into(), Value::String(dog_id.to_string()));
    }
    for field in &self.fields {
      if let Some(value) = field.to_value()? {
        fields.insert(field.key.into(), value);
      }
    }
    Ok(fields)
  }

  /// Build an update patch. Blank optional fields are cleared; blank
  /// required fields keep their stored value.
  fn to_patch(&self) -> Result<Fields, String> {
    let required = self.table.required_fields();
    let mut patch = Fields::new();
    for field in &self.fields {
      let value = match field.to_value()? {
        Some(value) => value,
        None if required.contains(&field.key) => continue,
        None if field.input == Input::Text => Value::String(String::new()),
        None => Value::Null,
      };
      patch.insert(field.key.into(), value);
    }
    Ok(patch)
  }
}

#[cfg(test)]
mod tests {
  use rescue_core::{entity::ActivityType, validate};
  use serde_json::json;

  use super::*;

  fn fill(form: &mut Form, key: &str, text: &str) {
    form.focus = form.fields.iter().position(|f| f.key == key).unwrap();
    for c in text.chars() {
      form.type_char(c);
    }
  }

  #[test]
  fn every_required_field_has_an_input() {
    for table in std::iter::once(Table::Dogs).chain(Table::CHILDREN) {
      let form = Form::new(table);
      for key in table.required_fields() {
        if *key == "dog_id" {
          continue;
        }
        assert!(
          form.fields.iter().any(|f| f.key == *key),
          "{table} form lacks {key}"
        );
      }
    }
  }

  #[test]
  fn choices_match_activity_labels() {
    let labels: Vec<&str> = ActivityType::ALL.iter().map(|t| t.label()).collect();
    assert_eq!(labels, ACTIVITY_TYPES);
  }

  #[test]
  fn blank_fields_are_omitted_and_reported_missing() {
    let dog_id = Uuid::new_v4();
    let mut form = Form::new(Table::Medications);
    fill(&mut form, "type", "Carprofen");
    fill(&mut form, "frequency", "daily");

    let fields = form.to_fields(Some(dog_id)).unwrap();
    assert_eq!(fields.get("dog_id"), Some(&json!(dog_id.to_string())));
    assert!(!fields.contains_key("dose"));

    let err = validate::require(Table::Medications, &fields).unwrap_err();
    assert_eq!(err.to_string(), "dose is required for medications");
  }

  #[test]
  fn activity_type_cycles_through_choices() {
    let mut form = Form::new(Table::Activities);
    assert_eq!(form.fields[0].value, "Walk");
    form.cycle(1);
    assert_eq!(form.fields[0].value, "Feeding");
    form.cycle(-2);
    assert_eq!(form.fields[0].value, "Temperament Notes");
    form.type_char('x');
    assert_eq!(form.fields[0].value, "Temperament Notes");
  }

  #[test]
  fn datetime_is_sent_as_utc() {
    let mut form = Form::new(Table::VeterinaryAppointments);
    fill(&mut form, "appointment_date", "2024-06-01 09:30");
    let fields = form.to_fields(Some(Uuid::new_v4())).unwrap();

    let expected = Local
      .from_local_datetime(
        &NaiveDateTime::parse_from_str("2024-06-01 09:30", DATETIME_FORMAT).unwrap(),
      )
      .earliest()
      .unwrap()
      .with_timezone(&Utc)
      .to_rfc3339();
    assert_eq!(fields["appointment_date"], json!(expected));
  }

  #[test]
  fn malformed_inputs_name_the_field() {
    let mut form = Form::new(Table::VeterinaryAppointments);
    fill(&mut form, "appointment_date", "next tuesday");
    assert_eq!(
      form.to_fields(None).unwrap_err(),
      "Date: expected YYYY-MM-DD HH:MM"
    );

    let mut form = Form::new(Table::Dogs);
    fill(&mut form, "age", "three");
    assert_eq!(form.to_fields(None).unwrap_err(), "Age: expected a whole number");
  }

  #[test]
  fn dog_form_sends_numbers_and_dates_typed() {
    let mut form = Form::new(Table::Dogs);
    fill(&mut form, "name", "Biscuit");
    fill(&mut form, "age", "4");
    let fields = form.to_fields(None).unwrap();
    assert_eq!(fields["age"], json!(4));
    assert!(!fields.contains_key("dog_id"));

    let mut form = Form::new(Table::ChronicConditions);
    fill(&mut form, "diagnosis_date", "2023-02-14");
    let fields = form.to_fields(None).unwrap();
    assert_eq!(fields["diagnosis_date"], json!("2023-02-14"));
  }

  #[test]
  fn editing_a_dog_sends_a_patch() {
    let dog = Dog {
      id:            Uuid::new_v4(),
      name:          "Biscuit".into(),
      age:           Some(4),
      breed:         "Beagle".into(),
      health_status: String::new(),
      status:        "available".into(),
      temperament:   String::new(),
      notes:         "shy".into(),
      created_at:    chrono::Utc::now(),
    };
    let mut form = Form::edit_dog(&dog);
    assert_eq!(form.title(), " Edit dog ");

    form.focus = form.fields.iter().position(|f| f.key == "name").unwrap();
    for _ in 0..dog.name.len() {
      form.backspace();
    }
    form.focus = form.fields.iter().position(|f| f.key == "notes").unwrap();
    for _ in 0..3 {
      form.backspace();
    }
    fill(&mut form, "status", "-adopted");

    let patch = form.to_fields(None).unwrap();
    assert!(!patch.contains_key("name"), "blank required field is kept");
    assert!(!patch.contains_key("dog_id"));
    assert_eq!(patch["notes"], json!(""));
    assert_eq!(patch["age"], json!(4));
    assert_eq!(patch["status"], json!("available-adopted"));
  }

  #[test]
  fn focus_wraps_both_ways() {
    let mut form = Form::new(Table::EmergencyAlerts).with_value("alert_message", "Loose");
    assert_eq!(form.fields[0].value, "Loose");
    form.prev_field();
    assert_eq!(form.focus, 1);
    form.next_field();
    assert_eq!(form.focus, 0);
  }
}
