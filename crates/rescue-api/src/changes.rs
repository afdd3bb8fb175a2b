//! `GET /changes` — the push feed as Server-Sent Events.
//!
//! Optional `?table=<table>` and `?event=INSERT|UPDATE|DELETE` narrow the
//! stream. Each matching [`ChangeEvent`] is sent as an SSE event named
//! `change` with the event as JSON data.

use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
  extract::State,
  response::sse::{Event, KeepAlive, Sse},
};
use futures_util::{Stream, StreamExt as _};
use rescue_core::{
  change::{ChangeEvent, ChangeFilter},
  store::RecordStore,
};
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::{debug, warn};

use crate::extract::ApiQuery;

/// Name of the SSE event carrying a [`ChangeEvent`].
pub const EVENT_NAME: &str = "change";

const KEEP_ALIVE: Duration = Duration::from_secs(15);

fn to_event(change: &ChangeEvent) -> Option<Event> {
  match Event::default().event(EVENT_NAME).json_data(change) {
    Ok(event) => Some(event),
    Err(e) => {
      warn!(error = %e, table = %change.table, "dropping unencodable change");
      None
    }
  }
}

/// `GET /changes[?table=<table>][&event=<kind>]`
pub async fn stream<S>(
  State(store): State<Arc<S>>,
  ApiQuery(filter): ApiQuery<ChangeFilter>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
  S: RecordStore,
{
  debug!(?filter, "change stream opened");
  let rx = store.changes();
  let events = BroadcastStream::new(rx).filter_map(move |item| async move {
    match item {
      Ok(change) if filter.matches(&change) => to_event(&change).map(Ok::<_, Infallible>),
      Ok(_) => None,
      Err(BroadcastStreamRecvError::Lagged(skipped)) => {
        warn!(skipped, "change stream lagged; client will resync on poll");
        None
      }
    }
  });

  Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE))
}
