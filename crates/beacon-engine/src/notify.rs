//! The alert side-effect seam.
//!
//! The evaluator's responsibility ends at "decide whether to fire, for which
//! rule, on which issue" — delivery (log, page, webhook) is behind this
//! trait.

use std::future::Future;

use beacon_core::{event::IssueUpdate, rule::AlertRule};

/// Receives fired alerts.
pub trait Notifier: Send + Sync {
  fn fire<'a>(
    &'a self,
    rule: &'a AlertRule,
    update: &'a IssueUpdate,
  ) -> impl Future<Output = ()> + Send + 'a;
}

/// Default notifier: a structured warn-level log line per fired alert.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
  async fn fire(&self, rule: &AlertRule, update: &IssueUpdate) {
    tracing::warn!(
      rule_id = %rule.id,
      issue_id = %update.issue_id,
      project_id = %update.project_id,
      level = %update.level,
      count = update.count,
      threshold = rule.threshold,
      "alert triggered"
    );
  }
}
