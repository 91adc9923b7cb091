//! [`MemoryBus`] — partitioned in-memory topics with consumer-group offsets.

use std::{
  collections::HashMap,
  hash::{DefaultHasher, Hash, Hasher},
  sync::Arc,
};

use beacon_core::bus::{Consumer, Delivery, Publisher, Subscriber};
use tokio::sync::{Mutex, Notify};

use crate::{Error, Result};

// ─── Shared state ────────────────────────────────────────────────────────────

struct Message {
  key:     String,
  payload: Vec<u8>,
}

/// Append-only partition logs for one topic.
struct TopicLog {
  partitions: Vec<Vec<Message>>,
}

impl TopicLog {
  fn new(partitions: usize) -> Self {
    Self {
      partitions: (0..partitions).map(|_| Vec::new()).collect(),
    }
  }
}

#[derive(Default)]
struct State {
  topics:    HashMap<String, TopicLog>,
  /// Committed offsets per `(group, topic)`, one entry per partition.
  committed: HashMap<(String, String), Vec<u64>>,
}

struct Shared {
  state:      Mutex<State>,
  notify:     Notify,
  partitions: usize,
}

fn partition_for(key: &str, partitions: usize) -> usize {
  let mut hasher = DefaultHasher::new();
  key.hash(&mut hasher);
  (hasher.finish() as usize) % partitions
}

// ─── Bus ─────────────────────────────────────────────────────────────────────

/// An in-memory, partitioned, key-ordered, at-least-once backbone.
///
/// Cloning is cheap — all clones share the same topic logs and group
/// offsets. Topics are created on first use.
#[derive(Clone)]
pub struct MemoryBus {
  shared: Arc<Shared>,
}

impl MemoryBus {
  /// Create a bus whose topics each have `partitions` ordered sub-streams.
  /// A partition count of zero is rounded up to one.
  pub fn new(partitions: usize) -> Self {
    Self {
      shared: Arc::new(Shared {
        state:      Mutex::new(State::default()),
        notify:     Notify::new(),
        partitions: partitions.max(1),
      }),
    }
  }
}

impl Default for MemoryBus {
  fn default() -> Self { Self::new(4) }
}

impl Publisher for MemoryBus {
  type Error = Error;

  async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<()> {
    {
      let mut state = self.shared.state.lock().await;
      let log = state
        .topics
        .entry(topic.to_owned())
        .or_insert_with(|| TopicLog::new(self.shared.partitions));
      let partition = partition_for(key, self.shared.partitions);
      let offset = log.partitions[partition].len() as u64;
      tracing::trace!(topic, key, partition, offset, "publish");
      log.partitions[partition].push(Message {
        key:     key.to_owned(),
        payload,
      });
    }
    self.shared.notify.notify_waiters();
    Ok(())
  }
}

impl Subscriber for MemoryBus {
  type Error = Error;
  type Consumer = MemoryConsumer;

  async fn subscribe(&self, topic: &str, group: &str) -> Result<MemoryConsumer> {
    let mut state = self.shared.state.lock().await;
    state
      .topics
      .entry(topic.to_owned())
      .or_insert_with(|| TopicLog::new(self.shared.partitions));

    let positions = state
      .committed
      .get(&(group.to_owned(), topic.to_owned()))
      .cloned()
      .unwrap_or_else(|| vec![0; self.shared.partitions]);

    Ok(MemoryConsumer {
      shared: Arc::clone(&self.shared),
      topic: topic.to_owned(),
      group: group.to_owned(),
      positions,
      cursor: 0,
    })
  }
}

// ─── Consumer ────────────────────────────────────────────────────────────────

/// A consumer-group member holding all partitions of one topic.
///
/// This in-memory backbone runs one member per group; partition assignment
/// across multiple members is a broker concern outside this crate.
pub struct MemoryConsumer {
  shared:    Arc<Shared>,
  topic:     String,
  group:     String,
  /// In-memory read positions, one per partition. Ahead of (or equal to)
  /// the group's committed offsets.
  positions: Vec<u64>,
  /// Round-robin scan start, so one busy partition cannot starve others.
  cursor:    usize,
}

impl MemoryConsumer {
  async fn try_fetch(&mut self) -> Option<Delivery> {
    let state = self.shared.state.lock().await;
    let log = state.topics.get(&self.topic)?;
    let n = log.partitions.len();
    for i in 0..n {
      let p = (self.cursor + i) % n;
      let pos = self.positions[p] as usize;
      if let Some(message) = log.partitions[p].get(pos) {
        let delivery = Delivery {
          topic:     self.topic.clone(),
          partition: p,
          offset:    self.positions[p],
          key:       message.key.clone(),
          payload:   message.payload.clone(),
        };
        self.positions[p] += 1;
        self.cursor = (p + 1) % n;
        return Some(delivery);
      }
    }
    None
  }
}

impl Consumer for MemoryConsumer {
  type Error = Error;

  async fn fetch(&mut self) -> Result<Delivery> {
    loop {
      // Register for wakeups before the scan so a publish racing with an
      // empty scan is not missed. The `Notified` borrows a local handle so
      // the scan below can still take `&mut self`.
      let shared = Arc::clone(&self.shared);
      let notified = shared.notify.notified();
      tokio::pin!(notified);
      notified.as_mut().enable();

      if let Some(delivery) = self.try_fetch().await {
        return Ok(delivery);
      }
      notified.await;
    }
  }

  async fn commit(&mut self, delivery: &Delivery) -> Result<()> {
    let mut state = self.shared.state.lock().await;
    if !state.topics.contains_key(&delivery.topic) {
      return Err(Error::UnknownTopic(delivery.topic.clone()));
    }
    if delivery.partition >= self.shared.partitions {
      return Err(Error::UnknownPartition {
        topic:     delivery.topic.clone(),
        partition: delivery.partition,
      });
    }

    let partitions = self.shared.partitions;
    let offsets = state
      .committed
      .entry((self.group.clone(), delivery.topic.clone()))
      .or_insert_with(|| vec![0; partitions]);
    offsets[delivery.partition] = offsets[delivery.partition].max(delivery.offset + 1);
    Ok(())
  }

  async fn rewind(&mut self) -> Result<()> {
    let state = self.shared.state.lock().await;
    self.positions = state
      .committed
      .get(&(self.group.clone(), self.topic.clone()))
      .cloned()
      .unwrap_or_else(|| vec![0; self.shared.partitions]);
    self.cursor = 0;
    Ok(())
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
