//! Periodic re-snapshot tasks and the per-page task set.
//!
//! Pollers only fetch and send; the event loop applies the snapshot.

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle, time::MissedTickBehavior};
use tracing::trace;
use uuid::Uuid;

use crate::{
  app::{AppMessage, DogListSnapshot},
  client::ApiClient,
};

/// Background tasks owned by the mounted page. Dropping the set aborts them;
/// requests already handed to the server still complete.
#[derive(Debug, Default)]
pub struct PageTasks {
  handles: Vec<JoinHandle<()>>,
}

impl PageTasks {
  pub fn push(&mut self, handle: JoinHandle<()>) { self.handles.push(handle); }
}

impl Drop for PageTasks {
  fn drop(&mut self) {
    for handle in &self.handles {
      handle.abort();
    }
  }
}

/// Fetch the dog list and walk totals together.
pub async fn dog_list(client: &ApiClient) -> crate::client::Result<DogListSnapshot> {
  let (dogs, walks) = tokio::try_join!(client.list_dogs(), client.walk_counts())?;
  Ok(DogListSnapshot { dogs, walks })
}

/// Re-fetch the dog list every `every`, skipping the immediate first tick
/// (the page loaded a snapshot when it mounted).
pub fn spawn_dog_list(
  client: ApiClient,
  every: Duration,
  tx: mpsc::UnboundedSender<AppMessage>,
) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    loop {
      ticker.tick().await;
      trace!("polling dog list");
      let result = dog_list(&client).await;
      if tx.send(AppMessage::DogList(result)).is_err() {
        return;
      }
    }
  })
}

/// Re-fetch the care calendar's window every `every`.
pub fn spawn_calendar(
  client: ApiClient,
  days: u32,
  every: Duration,
  tx: mpsc::UnboundedSender<AppMessage>,
) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    loop {
      ticker.tick().await;
      trace!(days, "polling care calendar");
      let result = client.recent_activities(days).await;
      if tx.send(AppMessage::Calendar(result)).is_err() {
        return;
      }
    }
  })
}

/// Re-fetch one dog's profile every `every`.
pub fn spawn_profile(
  client: ApiClient,
  dog_id: Uuid,
  every: Duration,
  tx: mpsc::UnboundedSender<AppMessage>,
) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    loop {
      ticker.tick().await;
      trace!(%dog_id, "polling profile");
      let result = client.dog_profile(dog_id).await;
      if tx.send(AppMessage::Profile(dog_id, result)).is_err() {
        return;
      }
    }
  })
}
