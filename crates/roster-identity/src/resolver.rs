//! [`IdentityResolver`] — external identity to canonical [`User`].

use std::sync::Arc;

use roster_core::{
  directory::{
    Directory, DirectoryError, IDENTIFIER_RELATION, IDENTITY_TYPE, ObjectKey,
    RelationQuery, USER_TYPE,
  },
  schema::SchemaGeneration,
  user::User,
};

use crate::{Error, Result, normalize::user_from_object, probe::SchemaProbe};

/// Resolves identities and user ids against the directory.
///
/// Reads only; caching is the caller's policy (see
/// [`UserCache`](crate::UserCache)).
pub struct IdentityResolver<D> {
  directory: Arc<D>,
  probe:     SchemaProbe<D>,
}

impl<D: Directory + 'static> IdentityResolver<D> {
  pub fn new(directory: Arc<D>) -> Self {
    Self {
      probe: SchemaProbe::new(directory.clone()),
      directory,
    }
  }

  pub fn probe(&self) -> &SchemaProbe<D> { &self.probe }

  /// Find the user linked to `identity` through the `identifier` relation.
  pub async fn resolve_by_identity(&self, identity: &str) -> Result<User> {
    let generation = self.probe.detect().await?;
    let query = identity_query(generation, identity);

    let resp = match self.directory.relation(&query).await {
      Ok(resp) => resp,
      // The directory may also reject the identity string itself.
      Err(DirectoryError::NotFound(_) | DirectoryError::InvalidArgument(_)) => {
        tracing::debug!(identity, %generation, "identity has no linked user");
        return Err(Error::IdentityNotFound(identity.to_owned()));
      }
      Err(e) => return Err(e.into()),
    };

    let user_key = match generation {
      SchemaGeneration::Legacy => resp.result.subject(),
      SchemaGeneration::Current | SchemaGeneration::Unknown => resp.result.object(),
    };

    match resp.object(&user_key) {
      Some(object) => Ok(user_from_object(object)),
      None => {
        tracing::debug!(user = %user_key, "user object not returned inline");
        self.resolve_by_id(&user_key.object_id).await
      }
    }
  }

  /// Look up a user object directly. Independent of the schema generation.
  pub async fn resolve_by_id(&self, user_id: &str) -> Result<User> {
    let key = ObjectKey::new(USER_TYPE, user_id);
    match self.directory.object(&key).await {
      Ok(object) => Ok(user_from_object(&object)),
      Err(DirectoryError::NotFound(_)) => Err(Error::UserNotFound(user_id.to_owned())),
      Err(e) => Err(e.into()),
    }
  }
}

/// The identifier query for `identity` in the given generation's orientation.
fn identity_query(generation: SchemaGeneration, identity: &str) -> RelationQuery {
  let identity = ObjectKey::new(IDENTITY_TYPE, identity);
  let query = match generation {
    SchemaGeneration::Legacy => RelationQuery::new(IDENTIFIER_RELATION)
      .subject_type(USER_TYPE)
      .object(identity),
    // `detect` never yields `Unknown`.
    SchemaGeneration::Current | SchemaGeneration::Unknown => {
      RelationQuery::new(IDENTIFIER_RELATION)
        .subject(identity)
        .object_type(USER_TYPE)
    }
  };
  query.with_objects()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn legacy_query_puts_identity_on_object_side() {
    let q = identity_query(SchemaGeneration::Legacy, "auth0|abc123");
    assert_eq!(q.subject_type.as_deref(), Some(USER_TYPE));
    assert_eq!(q.subject_id, None);
    assert_eq!(q.object_type.as_deref(), Some(IDENTITY_TYPE));
    assert_eq!(q.object_id.as_deref(), Some("auth0|abc123"));
    assert!(q.with_objects);
  }

  #[test]
  fn current_query_puts_identity_on_subject_side() {
    let q = identity_query(SchemaGeneration::Current, "auth0|abc123");
    assert_eq!(q.subject_type.as_deref(), Some(IDENTITY_TYPE));
    assert_eq!(q.subject_id.as_deref(), Some("auth0|abc123"));
    assert_eq!(q.object_type.as_deref(), Some(USER_TYPE));
    assert_eq!(q.object_id, None);
    assert!(q.with_objects);
  }
}
