//! Event fingerprinting — the grouping identity function.
//!
//! SHA-256 over the UTF-8 bytes of the message, with the stack trace
//! appended behind a `|` separator when present. An absent stack trace
//! changes the input and therefore the fingerprint.
//!
//! No normalization of dynamic substrings (addresses, line numbers,
//! timestamps embedded in messages) is performed; near-duplicate events with
//! volatile substrings fragment into separate issues. Known limitation.

use sha2::{Digest, Sha256};

/// Compute the stable identity key for an event.
///
/// Pure: same input always yields the same key, independent of wall-clock
/// time or call site.
pub fn fingerprint(message: &str, stack_trace: Option<&str>) -> String {
  let mut hasher = Sha256::new();
  hasher.update(message.as_bytes());
  if let Some(stack) = stack_trace {
    hasher.update(b"|");
    hasher.update(stack.as_bytes());
  }
  hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn deterministic() {
    assert_eq!(
      fingerprint("boom", Some("at main.rs:10")),
      fingerprint("boom", Some("at main.rs:10")),
    );
    assert_eq!(fingerprint("boom", None), fingerprint("boom", None));
  }

  #[test]
  fn message_changes_key() {
    assert_ne!(
      fingerprint("boom", Some("trace")),
      fingerprint("bang", Some("trace")),
    );
  }

  #[test]
  fn stack_trace_presence_changes_key() {
    assert_ne!(fingerprint("boom", None), fingerprint("boom", Some("trace")));
  }

  #[test]
  fn separator_prevents_boundary_collisions() {
    // "ab" + "c" must not collide with "a" + "bc".
    assert_ne!(fingerprint("ab", Some("c")), fingerprint("a", Some("bc")));
  }

  #[test]
  fn key_is_hex_sha256() {
    let key = fingerprint("boom", None);
    assert_eq!(key.len(), 64);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
  }
}
