//! [`SchemaProbe`] — one-time detection of the directory's identity model.
//!
//! Older directory models orient the identifier relation as
//! `user --identifier--> identity`; newer ones as
//! `identity --identifier--> user`. The probe asks for the older orientation
//! between two ids that never exist and reads the answer from the error:
//! an undefined relation means the newer model, an absent tuple the older.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt as _, Shared};
use parking_lot::Mutex;
use roster_core::{
  directory::{
    Directory, DirectoryError, IDENTIFIER_RELATION, IDENTITY_TYPE, ObjectKey,
    RelationQuery, USER_TYPE,
  },
  schema::SchemaGeneration,
};

use crate::{Error, Result};

/// Object id used on both ends of the probe query.
pub const PROBE_SENTINEL: &str = "__roster_schema_probe__";

type Flight = Shared<BoxFuture<'static, Result<SchemaGeneration, DirectoryError>>>;

enum State {
  Idle,
  Probing(Flight),
  Resolved(SchemaGeneration),
}

/// Memoized schema-generation detector.
///
/// The first [`detect`](Self::detect) call starts the probe query; calls that
/// arrive while it is in flight await the same query and receive its
/// outcome, success or failure. A success is stored for the life of the
/// probe. A failure resets the probe so the next call starts a new query.
pub struct SchemaProbe<D> {
  directory: Arc<D>,
  state:     Mutex<State>,
}

impl<D: Directory + 'static> SchemaProbe<D> {
  pub fn new(directory: Arc<D>) -> Self {
    Self {
      directory,
      state: Mutex::new(State::Idle),
    }
  }

  /// The memoized generation, or [`SchemaGeneration::Unknown`] if no probe
  /// has completed yet. Never suspends.
  pub fn current(&self) -> SchemaGeneration {
    match &*self.state.lock() {
      State::Resolved(generation) => *generation,
      State::Idle | State::Probing(_) => SchemaGeneration::Unknown,
    }
  }

  /// Classify the directory, probing at most once per successful outcome.
  pub async fn detect(&self) -> Result<SchemaGeneration> {
    let flight = {
      let mut state = self.state.lock();
      match &*state {
        State::Resolved(generation) => return Ok(*generation),
        State::Probing(flight) => flight.clone(),
        State::Idle => {
          let flight = classify(self.directory.clone()).boxed().shared();
          *state = State::Probing(flight.clone());
          flight
        }
      }
    };

    let outcome = flight.clone().await;

    // Every waiter of the flight settles the cell the same way; a newer
    // flight started after a failure is left alone.
    {
      let mut state = self.state.lock();
      if let State::Probing(current) = &*state
        && current.ptr_eq(&flight)
      {
        *state = match &outcome {
          Ok(generation) => State::Resolved(*generation),
          Err(_) => State::Idle,
        };
      }
    }

    outcome.map_err(Error::ProbeFailure)
  }
}

async fn classify<D: Directory>(directory: Arc<D>) -> Result<SchemaGeneration, DirectoryError> {
  let query = RelationQuery::new(IDENTIFIER_RELATION)
    .subject(ObjectKey::new(USER_TYPE, PROBE_SENTINEL))
    .object(ObjectKey::new(IDENTITY_TYPE, PROBE_SENTINEL));

  let generation = match directory.relation(&query).await {
    Err(DirectoryError::InvalidArgument(_)) => SchemaGeneration::Current,
    Err(DirectoryError::NotFound(_)) => SchemaGeneration::Legacy,
    // Someone created the sentinel tuple; the orientation is still valid.
    Ok(_) => SchemaGeneration::Legacy,
    Err(e) => {
      tracing::warn!(error = %e, "directory schema probe failed");
      return Err(e);
    }
  };

  tracing::info!(%generation, "detected directory schema generation");
  Ok(generation)
}
