//! The relationship-graph directory contract.
//!
//! The directory stores typed objects and typed, directed relations between
//! them. Roster only consumes it: implementations live in
//! `roster-directory` (an in-memory graph and an HTTP gateway client).

use std::{collections::HashMap, fmt, future::Future};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Well-known names ────────────────────────────────────────────────────────

pub const USER_TYPE: &str = "user";
pub const IDENTITY_TYPE: &str = "identity";
pub const RESOURCE_TYPE: &str = "resource";

/// Links a `user` and an `identity`. Orientation depends on the
/// [`SchemaGeneration`](crate::schema::SchemaGeneration).
pub const IDENTIFIER_RELATION: &str = "identifier";
/// Links a `user` (subject) to a `resource` (object) they own.
pub const OWNER_RELATION: &str = "owner";

// ─── Objects ─────────────────────────────────────────────────────────────────

/// A typed object reference, rendered as `type:id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
  pub object_type: String,
  pub object_id:   String,
}

impl ObjectKey {
  pub fn new(object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
    Self {
      object_type: object_type.into(),
      object_id:   object_id.into(),
    }
  }
}

impl fmt::Display for ObjectKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.object_type, self.object_id)
  }
}

/// An object stored in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryObject {
  #[serde(rename = "type")]
  pub object_type:  String,
  pub id:           String,
  #[serde(default)]
  pub display_name: String,
  /// Free-form property document. Encoding varies by directory.
  #[serde(default)]
  pub properties:   serde_json::Map<String, serde_json::Value>,
}

impl DirectoryObject {
  pub fn new(object_type: impl Into<String>, id: impl Into<String>) -> Self {
    Self {
      object_type:  object_type.into(),
      id:           id.into(),
      display_name: String::new(),
      properties:   serde_json::Map::new(),
    }
  }

  pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
    self.display_name = name.into();
    self
  }

  pub fn with_property(
    mut self,
    key: impl Into<String>,
    value: impl Into<serde_json::Value>,
  ) -> Self {
    self.properties.insert(key.into(), value.into());
    self
  }

  pub fn key(&self) -> ObjectKey { ObjectKey::new(&self.object_type, &self.id) }
}

// ─── Relations ───────────────────────────────────────────────────────────────

/// A directed edge `(subject_type:subject_id) --relation--> (object_type:object_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationTuple {
  pub object_type:  String,
  pub object_id:    String,
  pub relation:     String,
  pub subject_type: String,
  pub subject_id:   String,
}

impl RelationTuple {
  pub fn new(
    subject: ObjectKey,
    relation: impl Into<String>,
    object: ObjectKey,
  ) -> Self {
    Self {
      object_type:  object.object_type,
      object_id:    object.object_id,
      relation:     relation.into(),
      subject_type: subject.object_type,
      subject_id:   subject.object_id,
    }
  }

  pub fn subject(&self) -> ObjectKey {
    ObjectKey::new(&self.subject_type, &self.subject_id)
  }

  pub fn object(&self) -> ObjectKey {
    ObjectKey::new(&self.object_type, &self.object_id)
  }
}

/// Parameters for [`Directory::relation`]. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationQuery {
  pub object_type:  Option<String>,
  pub object_id:    Option<String>,
  pub relation:     String,
  pub subject_type: Option<String>,
  pub subject_id:   Option<String>,
  /// Ask the directory to return the tuple's endpoint objects inline.
  pub with_objects: bool,
}

impl RelationQuery {
  pub fn new(relation: impl Into<String>) -> Self {
    Self {
      relation: relation.into(),
      ..Self::default()
    }
  }

  pub fn subject_type(mut self, t: impl Into<String>) -> Self {
    self.subject_type = Some(t.into());
    self
  }

  pub fn subject(mut self, key: ObjectKey) -> Self {
    self.subject_type = Some(key.object_type);
    self.subject_id = Some(key.object_id);
    self
  }

  pub fn object_type(mut self, t: impl Into<String>) -> Self {
    self.object_type = Some(t.into());
    self
  }

  pub fn object(mut self, key: ObjectKey) -> Self {
    self.object_type = Some(key.object_type);
    self.object_id = Some(key.object_id);
    self
  }

  pub fn with_objects(mut self) -> Self {
    self.with_objects = true;
    self
  }

  /// Whether `tuple` satisfies every field this query sets.
  pub fn matches(&self, tuple: &RelationTuple) -> bool {
    fn eq(want: &Option<String>, have: &str) -> bool {
      want.as_deref().is_none_or(|w| w == have)
    }
    self.relation == tuple.relation
      && eq(&self.object_type, &tuple.object_type)
      && eq(&self.object_id, &tuple.object_id)
      && eq(&self.subject_type, &tuple.subject_type)
      && eq(&self.subject_id, &tuple.subject_id)
  }
}

/// The answer to a relation query.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationResponse {
  pub result:  RelationTuple,
  /// Endpoint objects keyed by `type:id`; empty unless requested.
  pub objects: HashMap<String, DirectoryObject>,
}

impl RelationResponse {
  /// Look up an inline endpoint object.
  pub fn object(&self, key: &ObjectKey) -> Option<&DirectoryObject> {
    self.objects.get(&key.to_string())
  }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Typed failure of a directory call. Callers branch on the variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
  /// The object or tuple does not exist.
  #[error("not found: {0}")]
  NotFound(String),

  /// The request is not valid under the directory's model, e.g. a relation
  /// that is not defined between the given types.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// Transport, authentication, or service failure.
  #[error("directory unavailable: {0}")]
  Unavailable(String),
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a relationship-graph directory service.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait Directory: Send + Sync {
  /// Fetch a single object. Fails with [`DirectoryError::NotFound`] if absent.
  fn object<'a>(
    &'a self,
    key: &'a ObjectKey,
  ) -> impl Future<Output = Result<DirectoryObject, DirectoryError>> + Send + 'a;

  /// Create or replace an object.
  fn set_object(
    &self,
    object: DirectoryObject,
  ) -> impl Future<Output = Result<(), DirectoryError>> + Send + '_;

  /// Delete an object. With `with_relations`, every incident relation is
  /// removed as part of the same operation.
  fn delete_object<'a>(
    &'a self,
    key: &'a ObjectKey,
    with_relations: bool,
  ) -> impl Future<Output = Result<(), DirectoryError>> + Send + 'a;

  /// Find one tuple matching `query`.
  ///
  /// Fails with [`DirectoryError::NotFound`] if no tuple matches, and with
  /// [`DirectoryError::InvalidArgument`] if the type/relation combination is
  /// not defined in the directory's model.
  fn relation<'a>(
    &'a self,
    query: &'a RelationQuery,
  ) -> impl Future<Output = Result<RelationResponse, DirectoryError>> + Send + 'a;

  /// Create a tuple. Idempotent.
  fn set_relation(
    &self,
    tuple: RelationTuple,
  ) -> impl Future<Output = Result<(), DirectoryError>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn object_key_renders_type_and_id() {
    let key = ObjectKey::new(IDENTITY_TYPE, "auth0|abc:1");
    assert_eq!(key.to_string(), "identity:auth0|abc:1");
  }

  #[test]
  fn query_matches_only_set_fields() {
    let tuple = RelationTuple::new(
      ObjectKey::new(USER_TYPE, "u1"),
      OWNER_RELATION,
      ObjectKey::new(RESOURCE_TYPE, "t1"),
    );

    let by_object = RelationQuery::new(OWNER_RELATION)
      .object(ObjectKey::new(RESOURCE_TYPE, "t1"));
    assert!(by_object.matches(&tuple));

    let other_subject = RelationQuery::new(OWNER_RELATION)
      .subject(ObjectKey::new(USER_TYPE, "u2"));
    assert!(!other_subject.matches(&tuple));

    let other_relation = RelationQuery::new("viewer");
    assert!(!other_relation.matches(&tuple));
  }
}
