//! [`UserCache`] — resolved users keyed by raw identity.

use std::{
  num::NonZeroUsize,
  time::{Duration, Instant},
};

use lru::LruCache;
use parking_lot::Mutex;
use roster_core::user::User;

struct Entry {
  user:      User,
  stored_at: Instant,
}

/// A bounded, least-recently-used cache from identity string to [`User`].
///
/// Keys are raw identities, not user ids: two identities that resolve to the
/// same user occupy two entries.
///
/// The lock is held only for the map operation itself. Two requests that
/// miss on the same identity at the same time will both resolve it and both
/// `put`; the lookups are side-effect free, so the second write is harmless.
pub struct UserCache {
  entries: Mutex<LruCache<String, Entry>>,
  ttl:     Option<Duration>,
}

impl UserCache {
  pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(n) => n,
    None => unreachable!(),
  };

  pub fn new(capacity: NonZeroUsize) -> Self {
    Self {
      entries: Mutex::new(LruCache::new(capacity)),
      ttl:     None,
    }
  }

  /// Treat entries older than `ttl` as absent.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = Some(ttl);
    self
  }

  pub fn get(&self, identity: &str) -> Option<User> {
    let mut entries = self.entries.lock();
    match entries.get(identity) {
      None => {
        tracing::debug!(identity, "user cache miss");
        return None;
      }
      Some(entry) if self.is_fresh(entry) => {
        tracing::debug!(identity, "user cache hit");
        return Some(entry.user.clone());
      }
      Some(_) => {}
    }
    tracing::debug!(identity, "user cache entry expired");
    entries.pop(identity);
    None
  }

  pub fn put(&self, identity: impl Into<String>, user: User) {
    let entry = Entry {
      user,
      stored_at: Instant::now(),
    };
    self.entries.lock().put(identity.into(), entry);
  }

  pub fn len(&self) -> usize { self.entries.lock().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  pub fn capacity(&self) -> NonZeroUsize { self.entries.lock().cap() }

  fn is_fresh(&self, entry: &Entry) -> bool {
    self.ttl.is_none_or(|ttl| entry.stored_at.elapsed() < ttl)
  }
}

impl Default for UserCache {
  fn default() -> Self { Self::new(Self::DEFAULT_CAPACITY) }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn user(id: &str) -> User {
    User {
      id:      id.into(),
      name:    format!("user {id}"),
      email:   format!("{id}@example.com"),
      picture: String::new(),
    }
  }

  fn cap(n: usize) -> NonZeroUsize { NonZeroUsize::new(n).unwrap() }

  #[test]
  fn put_then_get() {
    let cache = UserCache::default();
    assert!(cache.get("auth0|a").is_none());
    cache.put("auth0|a", user("u1"));
    assert_eq!(cache.get("auth0|a"), Some(user("u1")));
  }

  #[test]
  fn keyed_by_identity_not_user_id() {
    let cache = UserCache::default();
    cache.put("auth0|a", user("u1"));
    cache.put("google|a", user("u1"));
    assert_eq!(cache.len(), 2);
  }

  #[test]
  fn put_overwrites_same_identity() {
    let cache = UserCache::default();
    cache.put("auth0|a", user("u1"));
    cache.put("auth0|a", user("u2"));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("auth0|a").unwrap().id, "u2");
  }

  // An unbounded identity map grows with every distinct caller; the
  // capacity bound replaces that behaviour.
  #[test]
  fn capacity_bounds_growth_from_distinct_identities() {
    let cache = UserCache::new(cap(3));
    for i in 0..100 {
      cache.put(format!("identity-{i}"), user(&format!("u{i}")));
    }
    assert_eq!(cache.len(), 3);
    assert!(cache.get("identity-0").is_none());
    assert!(cache.get("identity-99").is_some());
  }

  #[test]
  fn evicts_least_recently_used() {
    let cache = UserCache::new(cap(2));
    cache.put("a", user("u1"));
    cache.put("b", user("u2"));
    // Touch `a` so `b` becomes the eviction candidate.
    assert!(cache.get("a").is_some());
    cache.put("c", user("u3"));

    assert!(cache.get("a").is_some());
    assert!(cache.get("b").is_none());
    assert!(cache.get("c").is_some());
  }

  #[test]
  fn expired_entries_are_misses_and_dropped() {
    let cache = UserCache::default().with_ttl(Duration::ZERO);
    cache.put("auth0|a", user("u1"));
    assert!(cache.get("auth0|a").is_none());
    assert!(cache.is_empty());
  }

  #[test]
  fn entries_within_ttl_are_served() {
    let cache = UserCache::default().with_ttl(Duration::from_secs(3600));
    cache.put("auth0|a", user("u1"));
    assert!(cache.get("auth0|a").is_some());
  }

  #[test]
  fn default_capacity() {
    assert_eq!(UserCache::default().capacity().get(), 1024);
  }
}
