//! Push-feed listener: reads the server's `/changes` event stream and forwards
//! each [`ChangeEvent`] to the event loop.
//!
//! The task never touches the store. It reconnects with capped exponential
//! backoff until it is aborted or the event loop goes away.

use std::time::Duration;

use futures_util::StreamExt as _;
use rescue_core::change::{ChangeEvent, ChangeFilter};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

use crate::{app::AppMessage, client::ApiClient};

const MIN_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

// ─── SSE decoding ────────────────────────────────────────────────────────────

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseMessage {
  pub event: String,
  pub data:  String,
}

/// Incremental `text/event-stream` parser. Feed it raw chunks in arrival
/// order; it returns every event completed by each chunk.
#[derive(Debug, Default)]
pub struct SseDecoder {
  pending: Vec<u8>,
  event:   Option<String>,
  data:    Vec<String>,
}

impl SseDecoder {
  pub fn push(&mut self, chunk: &[u8]) -> Vec<SseMessage> {
    self.pending.extend_from_slice(chunk);
    let mut out = Vec::new();
    while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
      let raw: Vec<u8> = self.pending.drain(..=pos).collect();
      let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
      let line = line.strip_suffix('\r').unwrap_or(&line);
      if let Some(message) = self.line(line) {
        out.push(message);
      }
    }
    out
  }

  fn line(&mut self, line: &str) -> Option<SseMessage> {
    if line.is_empty() {
      return self.dispatch();
    }
    if line.starts_with(':') {
      return None;
    }
    let (field, value) = match line.split_once(':') {
      Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
      None => (line, ""),
    };
    match field {
      "event" => self.event = Some(value.to_owned()),
      "data" => self.data.push(value.to_owned()),
      _ => {}
    }
    None
  }

  fn dispatch(&mut self) -> Option<SseMessage> {
    let event = self.event.take();
    if self.data.is_empty() {
      return None;
    }
    let data = std::mem::take(&mut self.data).join("\n");
    Some(SseMessage {
      event: event.unwrap_or_else(|| "message".to_owned()),
      data,
    })
  }
}

// ─── Listener task ───────────────────────────────────────────────────────────

/// Why a connection ended.
enum Ended {
  /// The event loop dropped its receiver; stop for good.
  Closed,
  /// Stream error or server hang-up; reconnect.
  Disconnected,
}

/// Spawn a listener for `filter`. Abort the handle to stop it.
pub fn spawn(
  client: ApiClient,
  filter: ChangeFilter,
  tx: mpsc::UnboundedSender<AppMessage>,
) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut backoff = MIN_BACKOFF;
    loop {
      match listen(&client, filter, &tx, &mut backoff).await {
        Ended::Closed => return,
        Ended::Disconnected => {
          if tx.send(AppMessage::FeedLive(false)).is_err() {
            return;
          }
          tokio::time::sleep(backoff).await;
          backoff = (backoff * 2).min(MAX_BACKOFF);
        }
      }
    }
  })
}

async fn listen(
  client: &ApiClient,
  filter: ChangeFilter,
  tx: &mpsc::UnboundedSender<AppMessage>,
  backoff: &mut Duration,
) -> Ended {
  let resp = match client.open_changes(filter).await {
    Ok(resp) => resp,
    Err(e) => {
      warn!(error = %e, "change feed connection failed");
      return Ended::Disconnected;
    }
  };
  debug!(?filter, "change feed connected");
  *backoff = MIN_BACKOFF;
  if tx.send(AppMessage::FeedLive(true)).is_err() {
    return Ended::Closed;
  }

  let mut decoder = SseDecoder::default();
  let mut body = resp.bytes_stream();
  while let Some(chunk) = body.next().await {
    let chunk = match chunk {
      Ok(chunk) => chunk,
      Err(e) => {
        warn!(error = %e, "change feed interrupted");
        return Ended::Disconnected;
      }
    };
    for message in decoder.push(&chunk) {
      let Some(change) = decode_change(&message) else {
        continue;
      };
      if tx.send(AppMessage::Change(change)).is_err() {
        return Ended::Closed;
      }
    }
  }
  debug!("change feed closed by server");
  Ended::Disconnected
}

fn decode_change(message: &SseMessage) -> Option<ChangeEvent> {
  if message.event != "change" {
    return None;
  }
  match serde_json::from_str(&message.data) {
    Ok(change) => Some(change),
    Err(e) => {
      warn!(error = %e, "dropping undecodable change event");
      None
    }
  }
}
