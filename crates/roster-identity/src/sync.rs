//! [`ResourceRelationSynchronizer`] — mirrors todo ownership into the
//! directory.
//!
//! The primary store is the system of record. These writes happen only
//! after it has committed and are not transactional with it: a failure
//! between the object write and the relation write leaves an object with no
//! owner. Failures are returned as [`SyncError`] for the caller to log.

use std::sync::Arc;

use roster_core::{
  directory::{
    Directory, DirectoryError, DirectoryObject, OWNER_RELATION, ObjectKey,
    RESOURCE_TYPE, RelationTuple, USER_TYPE,
  },
  todo::Todo,
};

use crate::SyncError;

pub struct ResourceRelationSynchronizer<D> {
  directory: Arc<D>,
}

impl<D: Directory> ResourceRelationSynchronizer<D> {
  pub fn new(directory: Arc<D>) -> Self { Self { directory } }

  /// Write the resource object, then the owner relation.
  pub async fn on_create(&self, todo: &Todo) -> Result<(), SyncError> {
    self
      .directory
      .set_object(resource_object(todo))
      .await
      .map_err(|source| SyncError::WriteObject {
        todo_id: todo.id.clone(),
        source,
      })?;

    let owner = RelationTuple::new(
      ObjectKey::new(USER_TYPE, &todo.owner_id),
      OWNER_RELATION,
      resource_key(&todo.id),
    );
    self
      .directory
      .set_relation(owner)
      .await
      .map_err(|source| SyncError::WriteRelation {
        todo_id: todo.id.clone(),
        source,
      })?;

    tracing::debug!(todo_id = %todo.id, owner = %todo.owner_id, "mirrored todo into directory");
    Ok(())
  }

  /// Refresh the resource object's display name. Ownership is unchanged.
  pub async fn on_update(&self, todo: &Todo) -> Result<(), SyncError> {
    self
      .directory
      .set_object(resource_object(todo))
      .await
      .map_err(|source| SyncError::WriteObject {
        todo_id: todo.id.clone(),
        source,
      })
  }

  /// Delete the resource object together with every incident relation.
  ///
  /// An object that is already gone counts as deleted.
  pub async fn on_delete(&self, todo_id: &str) -> Result<(), SyncError> {
    match self.directory.delete_object(&resource_key(todo_id), true).await {
      Ok(()) => Ok(()),
      Err(DirectoryError::NotFound(_)) => {
        tracing::debug!(todo_id, "resource object already absent");
        Ok(())
      }
      Err(source) => Err(SyncError::DeleteObject {
        todo_id: todo_id.to_owned(),
        source,
      }),
    }
  }
}

fn resource_key(todo_id: &str) -> ObjectKey { ObjectKey::new(RESOURCE_TYPE, todo_id) }

fn resource_object(todo: &Todo) -> DirectoryObject {
  DirectoryObject::new(RESOURCE_TYPE, &todo.id).with_display_name(&todo.title)
}
