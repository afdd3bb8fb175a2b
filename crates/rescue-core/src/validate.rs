//! Required-field checks shared by the client gateway and the API.

use serde_json::Value;

use crate::{Error, Fields, Result, Table};

/// `true` when `value` counts as "not provided": absent, `null`, or a string
/// that is empty after trimming.
pub fn is_blank(value: Option<&Value>) -> bool {
  match value {
    None | Some(Value::Null) => true,
    Some(Value::String(s)) => s.trim().is_empty(),
    Some(_) => false,
  }
}

/// Fail with [`Error::MissingFields`] naming every required field of `table`
/// that `fields` leaves blank.
pub fn require(table: Table, fields: &Fields) -> Result<()> {
  let missing: Vec<&'static str> = table
    .required_fields()
    .iter()
    .copied()
    .filter(|key| is_blank(fields.get(*key)))
    .collect();

  if missing.is_empty() {
    Ok(())
  } else {
    Err(Error::MissingFields { table, fields: missing })
  }
}
