//! [`AlertEvaluator`] — the threshold-rule consumer over `issue-updates`.
//!
//! Evaluation is level-triggered: every update satisfying
//! `count >= threshold` for a matching active rule fires, not only the
//! update that first crosses the threshold. Repeated alerts for one incident
//! are the documented consequence; an edge-triggered variant would live
//! behind the same [`Notifier`] seam.

use std::{sync::Arc, time::Duration};

use beacon_core::{
  bus::{Consumer, Delivery},
  event::IssueUpdate,
  store::IssueStore,
};
use tokio::{sync::watch, time::timeout};

use crate::{Error, Notifier, Result};

/// Tuning knobs for the alert consumer loop.
#[derive(Debug, Clone)]
pub struct AlertConfig {
  /// Consumer-group name on `issue-updates`.
  pub group:         String,
  pub op_timeout:    Duration,
  pub retry_backoff: Duration,
}

impl Default for AlertConfig {
  fn default() -> Self {
    Self {
      group:         "alert-evaluator".to_owned(),
      op_timeout:    Duration::from_secs(5),
      retry_backoff: Duration::from_secs(1),
    }
  }
}

/// The alert rule evaluator. Rules are read-only to this component.
pub struct AlertEvaluator<S, C, N> {
  store:    Arc<S>,
  consumer: C,
  notifier: Arc<N>,
  config:   AlertConfig,
}

impl<S, C, N> AlertEvaluator<S, C, N>
where
  S: IssueStore,
  C: Consumer,
  N: Notifier,
{
  pub fn new(store: Arc<S>, consumer: C, notifier: Arc<N>, config: AlertConfig) -> Self {
    Self { store, consumer, notifier, config }
  }

  /// Consume until `shutdown` fires, same commit/backoff discipline as the
  /// dedup engine.
  pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    tracing::info!(group = %self.config.group, "alert evaluator started");
    loop {
      let delivery = tokio::select! {
        _ = shutdown.changed() => break,
        fetched = self.consumer.fetch() => {
          fetched.map_err(|e| Error::Bus(Box::new(e)))?
        }
      };

      match self.evaluate(&delivery).await {
        Ok(fired) => {
          if fired > 0 {
            tracing::debug!(fired, "alert evaluation complete");
          }
          self
            .consumer
            .commit(&delivery)
            .await
            .map_err(|e| Error::Bus(Box::new(e)))?;
        }
        Err(error) if !error.is_retryable() => {
          tracing::warn!(%error, topic = %delivery.topic, "dropping malformed message");
          self
            .consumer
            .commit(&delivery)
            .await
            .map_err(|e| Error::Bus(Box::new(e)))?;
        }
        Err(error) => {
          tracing::error!(%error, topic = %delivery.topic, "evaluation failed; will retry");
          tokio::time::sleep(self.config.retry_backoff).await;
          self
            .consumer
            .rewind()
            .await
            .map_err(|e| Error::Bus(Box::new(e)))?;
        }
      }
    }
    tracing::info!(group = %self.config.group, "alert evaluator stopped");
    Ok(())
  }

  /// Returns how many rules fired for this update.
  async fn evaluate(&self, delivery: &Delivery) -> Result<usize> {
    let update: IssueUpdate =
      serde_json::from_slice(&delivery.payload).map_err(|source| Error::Malformed {
        topic: delivery.topic.clone(),
        source,
      })?;

    let rules = timeout(
      self.config.op_timeout,
      self.store.active_rules(&update.project_id, update.level),
    )
    .await
    .map_err(|_| Error::Timeout {
      op:    "alert-rule load",
      after: self.config.op_timeout,
    })?
    .map_err(|e| Error::Store(Box::new(e)))?;

    let mut fired = 0;
    for rule in &rules {
      if update.count >= rule.threshold {
        self.notifier.fire(rule, &update).await;
        fired += 1;
      }
    }
    Ok(fired)
  }
}
