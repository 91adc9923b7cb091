//! [`DedupEngine`] — the dedup/aggregation consumer over `raw-events`.
//!
//! Per message: compute the fingerprint, perform the atomic
//! find-or-create-and-increment against the issue store, publish exactly one
//! `IssueUpdate` with the authoritative post-write state, then commit the
//! offset. A crash between the store write and the commit causes
//! reprocessing and therefore a real double count — the accepted
//! at-least-once tradeoff.

use std::{sync::Arc, time::Duration};

use beacon_core::{
  bus::{Consumer, Delivery, ISSUE_UPDATES, Publisher},
  event::{IssueUpdate, RawEvent},
  fingerprint,
  issue::Issue,
  store::IssueStore,
};
use chrono::Utc;
use tokio::{sync::watch, time::timeout};

use crate::{Error, Result};

/// Tuning knobs for the dedup consumer loop.
#[derive(Debug, Clone)]
pub struct DedupConfig {
  /// Consumer-group name on `raw-events`.
  pub group:         String,
  /// Bound on each store and publish call, so a stalled dependency surfaces
  /// as a retryable failure instead of hanging the consumer.
  pub op_timeout:    Duration,
  /// Pause before reattempting a redelivered message after a transient
  /// failure.
  pub retry_backoff: Duration,
}

impl Default for DedupConfig {
  fn default() -> Self {
    Self {
      group:         "dedup-engine".to_owned(),
      op_timeout:    Duration::from_secs(5),
      retry_backoff: Duration::from_secs(1),
    }
  }
}

/// The dedup/aggregation engine. Owns its consumer; store and publisher are
/// shared, explicitly injected collaborators.
pub struct DedupEngine<S, P, C> {
  store:     Arc<S>,
  publisher: Arc<P>,
  consumer:  C,
  config:    DedupConfig,
}

impl<S, P, C> DedupEngine<S, P, C>
where
  S: IssueStore,
  P: Publisher,
  C: Consumer,
{
  pub fn new(store: Arc<S>, publisher: Arc<P>, consumer: C, config: DedupConfig) -> Self {
    Self { store, publisher, consumer, config }
  }

  /// Consume until `shutdown` fires. The in-flight message finishes and
  /// commits before the loop exits; only a crash interrupts mid-message.
  pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    tracing::info!(group = %self.config.group, "dedup engine started");
    loop {
      let delivery = tokio::select! {
        _ = shutdown.changed() => break,
        fetched = self.consumer.fetch() => {
          fetched.map_err(|e| Error::Bus(Box::new(e)))?
        }
      };

      match self.process(&delivery).await {
        Ok(update) => {
          tracing::debug!(
            issue_id = %update.issue_id,
            project_id = %update.project_id,
            count = update.count,
            "event aggregated"
          );
          self
            .consumer
            .commit(&delivery)
            .await
            .map_err(|e| Error::Bus(Box::new(e)))?;
        }
        // Poison message: drop it and move on so it cannot stall the
        // partition.
        Err(error) if !error.is_retryable() => {
          tracing::warn!(%error, topic = %delivery.topic, "dropping malformed message");
          self
            .consumer
            .commit(&delivery)
            .await
            .map_err(|e| Error::Bus(Box::new(e)))?;
        }
        // Transient store/publish failure: no commit, back off, rewind to
        // the committed offset so the message is redelivered.
        Err(error) => {
          tracing::error!(%error, topic = %delivery.topic, "processing failed; will retry");
          tokio::time::sleep(self.config.retry_backoff).await;
          self
            .consumer
            .rewind()
            .await
            .map_err(|e| Error::Bus(Box::new(e)))?;
        }
      }
    }
    tracing::info!(group = %self.config.group, "dedup engine stopped");
    Ok(())
  }

  async fn process(&self, delivery: &Delivery) -> Result<IssueUpdate> {
    let event: RawEvent =
      serde_json::from_slice(&delivery.payload).map_err(|source| Error::Malformed {
        topic: delivery.topic.clone(),
        source,
      })?;

    let key = fingerprint(&event.message, event.stack_trace.as_deref());
    let candidate = Issue::new(
      event.project_id,
      key,
      event.message,
      event.level,
      Utc::now(),
    );

    let issue = timeout(
      self.config.op_timeout,
      self.store.upsert_occurrence(candidate),
    )
    .await
    .map_err(|_| Error::Timeout {
      op:    "issue upsert",
      after: self.config.op_timeout,
    })?
    .map_err(|e| Error::Store(Box::new(e)))?;

    let update = IssueUpdate {
      issue_id:   issue.id,
      project_id: issue.project_id.clone(),
      count:      issue.count,
      level:      issue.level,
      status:     issue.status,
      updated_at: issue.last_seen,
    };
    let payload = serde_json::to_vec(&update)?;

    timeout(
      self.config.op_timeout,
      self
        .publisher
        .publish(ISSUE_UPDATES, &update.project_id, payload),
    )
    .await
    .map_err(|_| Error::Timeout {
      op:    "issue-update publish",
      after: self.config.op_timeout,
    })?
    .map_err(|e| Error::Bus(Box::new(e)))?;

    Ok(update)
  }
}
