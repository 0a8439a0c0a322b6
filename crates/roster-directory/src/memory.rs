//! [`InMemoryDirectory`] — a process-local relationship graph.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use roster_core::{
  directory::{
    Directory, DirectoryError, DirectoryObject, IDENTIFIER_RELATION,
    IDENTITY_TYPE, OWNER_RELATION, ObjectKey, RESOURCE_TYPE, RelationQuery,
    RelationResponse, RelationTuple, USER_TYPE,
  },
  schema::SchemaGeneration,
};

// ─── Model ───────────────────────────────────────────────────────────────────

/// The set of `(subject_type, relation, object_type)` edges the directory
/// accepts. Anything else is rejected as `InvalidArgument`.
#[derive(Debug, Clone, Default)]
pub struct RelationModel {
  edges: HashSet<(String, String, String)>,
}

impl RelationModel {
  /// Model for the given identity generation, plus resource ownership.
  ///
  /// `Unknown` yields a model with ownership only, in which every identity
  /// lookup is invalid.
  pub fn for_generation(generation: SchemaGeneration) -> Self {
    let model = Self::default().allow(USER_TYPE, OWNER_RELATION, RESOURCE_TYPE);
    match generation {
      SchemaGeneration::Legacy => {
        model.allow(USER_TYPE, IDENTIFIER_RELATION, IDENTITY_TYPE)
      }
      SchemaGeneration::Current => {
        model.allow(IDENTITY_TYPE, IDENTIFIER_RELATION, USER_TYPE)
      }
      SchemaGeneration::Unknown => model,
    }
  }

  pub fn allow(
    mut self,
    subject_type: &str,
    relation: &str,
    object_type: &str,
  ) -> Self {
    self.edges.insert((
      subject_type.to_owned(),
      relation.to_owned(),
      object_type.to_owned(),
    ));
    self
  }

  fn permits_tuple(&self, tuple: &RelationTuple) -> bool {
    self.edges.iter().any(|(s, r, o)| {
      *s == tuple.subject_type && *r == tuple.relation && *o == tuple.object_type
    })
  }

  /// A query is valid if at least one defined edge could satisfy it.
  fn permits_query(&self, query: &RelationQuery) -> bool {
    self.edges.iter().any(|(s, r, o)| {
      *r == query.relation
        && query.subject_type.as_deref().is_none_or(|t| t == s)
        && query.object_type.as_deref().is_none_or(|t| t == o)
    })
  }
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct Graph {
  objects:   HashMap<ObjectKey, DirectoryObject>,
  /// Insertion-ordered; queries return the first match.
  relations: Vec<RelationTuple>,
}

/// A directory that lives entirely in memory.
///
/// Used as the development backend when no directory URL is configured, and
/// as the fixture for tests.
pub struct InMemoryDirectory {
  model: RelationModel,
  graph: RwLock<Graph>,
}

impl InMemoryDirectory {
  pub fn new(model: RelationModel) -> Self {
    Self {
      model,
      graph: RwLock::new(Graph::default()),
    }
  }

  /// A directory whose identities are modelled as `user --identifier--> identity`.
  pub fn legacy() -> Self {
    Self::new(RelationModel::for_generation(SchemaGeneration::Legacy))
  }

  /// A directory whose identities are modelled as `identity --identifier--> user`.
  pub fn current() -> Self {
    Self::new(RelationModel::for_generation(SchemaGeneration::Current))
  }

  /// Number of stored tuples.
  pub fn relation_count(&self) -> usize { self.graph.read().relations.len() }

  /// Whether an object exists.
  pub fn contains_object(&self, key: &ObjectKey) -> bool {
    self.graph.read().objects.contains_key(key)
  }
}

impl Directory for InMemoryDirectory {
  async fn object(&self, key: &ObjectKey) -> Result<DirectoryObject, DirectoryError> {
    self
      .graph
      .read()
      .objects
      .get(key)
      .cloned()
      .ok_or_else(|| DirectoryError::NotFound(format!("object {key}")))
  }

  async fn set_object(&self, object: DirectoryObject) -> Result<(), DirectoryError> {
    if object.object_type.is_empty() || object.id.is_empty() {
      return Err(DirectoryError::InvalidArgument(
        "object type and id are required".to_owned(),
      ));
    }
    self.graph.write().objects.insert(object.key(), object);
    Ok(())
  }

  async fn delete_object(
    &self,
    key: &ObjectKey,
    with_relations: bool,
  ) -> Result<(), DirectoryError> {
    let mut graph = self.graph.write();
    if graph.objects.remove(key).is_none() {
      return Err(DirectoryError::NotFound(format!("object {key}")));
    }
    if with_relations {
      graph
        .relations
        .retain(|t| t.subject() != *key && t.object() != *key);
    }
    Ok(())
  }

  async fn relation(
    &self,
    query: &RelationQuery,
  ) -> Result<RelationResponse, DirectoryError> {
    if !self.model.permits_query(query) {
      return Err(DirectoryError::InvalidArgument(format!(
        "relation {:?} is not defined from {:?} to {:?}",
        query.relation, query.subject_type, query.object_type,
      )));
    }

    let graph = self.graph.read();
    let tuple = graph
      .relations
      .iter()
      .find(|t| query.matches(t))
      .cloned()
      .ok_or_else(|| DirectoryError::NotFound(format!("relation {query:?}")))?;

    let mut objects = HashMap::new();
    if query.with_objects {
      for key in [tuple.subject(), tuple.object()] {
        if let Some(obj) = graph.objects.get(&key) {
          objects.insert(key.to_string(), obj.clone());
        }
      }
    }

    Ok(RelationResponse {
      result: tuple,
      objects,
    })
  }

  async fn set_relation(&self, tuple: RelationTuple) -> Result<(), DirectoryError> {
    if !self.model.permits_tuple(&tuple) {
      return Err(DirectoryError::InvalidArgument(format!(
        "relation {:?} is not defined from {:?} to {:?}",
        tuple.relation, tuple.subject_type, tuple.object_type,
      )));
    }
    let mut graph = self.graph.write();
    if !graph.relations.contains(&tuple) {
      graph.relations.push(tuple);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn owner(user: &str, resource: &str) -> RelationTuple {
    RelationTuple::new(
      ObjectKey::new(USER_TYPE, user),
      OWNER_RELATION,
      ObjectKey::new(RESOURCE_TYPE, resource),
    )
  }

  #[tokio::test]
  async fn object_missing_is_not_found() {
    let dir = InMemoryDirectory::current();
    let err = dir.object(&ObjectKey::new(USER_TYPE, "u1")).await.unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound(_)));
  }

  #[tokio::test]
  async fn set_object_replaces_existing() {
    let dir = InMemoryDirectory::current();
    let key = ObjectKey::new(RESOURCE_TYPE, "t1");
    dir
      .set_object(DirectoryObject::new(RESOURCE_TYPE, "t1").with_display_name("old"))
      .await
      .unwrap();
    dir
      .set_object(DirectoryObject::new(RESOURCE_TYPE, "t1").with_display_name("new"))
      .await
      .unwrap();
    assert_eq!(dir.object(&key).await.unwrap().display_name, "new");
  }

  #[tokio::test]
  async fn undefined_orientation_is_invalid_argument() {
    let legacy = InMemoryDirectory::legacy();
    let current_shape = RelationQuery::new(IDENTIFIER_RELATION)
      .subject(ObjectKey::new(IDENTITY_TYPE, "auth0|x"))
      .object_type(USER_TYPE);
    assert!(matches!(
      legacy.relation(&current_shape).await,
      Err(DirectoryError::InvalidArgument(_))
    ));

    let current = InMemoryDirectory::current();
    let legacy_shape = RelationQuery::new(IDENTIFIER_RELATION)
      .subject_type(USER_TYPE)
      .object(ObjectKey::new(IDENTITY_TYPE, "auth0|x"));
    assert!(matches!(
      current.relation(&legacy_shape).await,
      Err(DirectoryError::InvalidArgument(_))
    ));
  }

  #[tokio::test]
  async fn defined_but_absent_is_not_found() {
    let dir = InMemoryDirectory::legacy();
    let query = RelationQuery::new(IDENTIFIER_RELATION)
      .subject_type(USER_TYPE)
      .object(ObjectKey::new(IDENTITY_TYPE, "auth0|x"));
    assert!(matches!(
      dir.relation(&query).await,
      Err(DirectoryError::NotFound(_))
    ));
  }

  #[tokio::test]
  async fn relation_with_objects_includes_endpoints() {
    let dir = InMemoryDirectory::current();
    dir
      .set_object(DirectoryObject::new(USER_TYPE, "u1").with_display_name("Alice"))
      .await
      .unwrap();
    dir.set_relation(owner("u1", "t1")).await.unwrap();

    let query = RelationQuery::new(OWNER_RELATION)
      .object(ObjectKey::new(RESOURCE_TYPE, "t1"))
      .with_objects();
    let resp = dir.relation(&query).await.unwrap();
    assert_eq!(resp.result, owner("u1", "t1"));
    // The resource object was never written, so only the user comes back.
    assert_eq!(resp.objects.len(), 1);
    assert_eq!(
      resp.object(&ObjectKey::new(USER_TYPE, "u1")).unwrap().display_name,
      "Alice"
    );
  }

  #[tokio::test]
  async fn set_relation_is_idempotent() {
    let dir = InMemoryDirectory::current();
    dir.set_relation(owner("u1", "t1")).await.unwrap();
    dir.set_relation(owner("u1", "t1")).await.unwrap();
    assert_eq!(dir.relation_count(), 1);
  }

  #[tokio::test]
  async fn set_relation_outside_model_is_rejected() {
    let dir = InMemoryDirectory::current();
    let tuple = RelationTuple::new(
      ObjectKey::new(USER_TYPE, "u1"),
      IDENTIFIER_RELATION,
      ObjectKey::new(IDENTITY_TYPE, "auth0|x"),
    );
    assert!(matches!(
      dir.set_relation(tuple).await,
      Err(DirectoryError::InvalidArgument(_))
    ));
  }

  #[tokio::test]
  async fn delete_with_relations_cascades() {
    let dir = InMemoryDirectory::current();
    dir
      .set_object(DirectoryObject::new(RESOURCE_TYPE, "t1"))
      .await
      .unwrap();
    dir.set_relation(owner("u1", "t1")).await.unwrap();
    dir.set_relation(owner("u1", "t2")).await.unwrap();

    dir
      .delete_object(&ObjectKey::new(RESOURCE_TYPE, "t1"), true)
      .await
      .unwrap();

    assert!(!dir.contains_object(&ObjectKey::new(RESOURCE_TYPE, "t1")));
    assert_eq!(dir.relation_count(), 1);
  }

  #[tokio::test]
  async fn delete_without_relations_leaves_tuples() {
    let dir = InMemoryDirectory::current();
    dir
      .set_object(DirectoryObject::new(RESOURCE_TYPE, "t1"))
      .await
      .unwrap();
    dir.set_relation(owner("u1", "t1")).await.unwrap();

    dir
      .delete_object(&ObjectKey::new(RESOURCE_TYPE, "t1"), false)
      .await
      .unwrap();
    assert_eq!(dir.relation_count(), 1);
  }

  #[tokio::test]
  async fn delete_missing_object_is_not_found() {
    let dir = InMemoryDirectory::current();
    let err = dir
      .delete_object(&ObjectKey::new(RESOURCE_TYPE, "nope"), true)
      .await
      .unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound(_)));
  }
}
