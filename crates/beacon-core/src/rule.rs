//! Operator-defined alert threshold rules.
//!
//! Rules are created and updated by an administrative surface outside this
//! core; the pipeline only ever reads them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::Level;

/// Fires when an issue update for the matching project and level reaches
/// `count >= threshold`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
  pub id:         Uuid,
  pub project_id: String,
  pub level:      Level,
  /// Always `>= 1`.
  pub threshold:  i64,
  pub is_active:  bool,
}

impl AlertRule {
  pub fn new(project_id: String, level: Level, threshold: i64) -> Self {
    Self {
      id: Uuid::new_v4(),
      project_id,
      level,
      threshold,
      is_active: true,
    }
  }
}
