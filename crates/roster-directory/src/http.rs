//! [`HttpDirectory`] — client for a directory service's JSON gateway.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `object` | `GET {url}/api/v3/directory/object/{type}/{id}` |
//! | `set_object` | `POST {url}/api/v3/directory/object` |
//! | `delete_object` | `DELETE {url}/api/v3/directory/object/{type}/{id}?with_relations=..` |
//! | `relation` | `GET {url}/api/v3/directory/relation?...` |
//! | `set_relation` | `POST {url}/api/v3/directory/relation` |

use std::{collections::HashMap, time::Duration};

use reqwest::{Client, RequestBuilder, StatusCode, Url};
use roster_core::directory::{
  Directory, DirectoryError, DirectoryObject, ObjectKey, RelationQuery,
  RelationResponse, RelationTuple,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Connection settings for the directory gateway.
#[derive(Debug, Clone)]
pub struct HttpDirectoryConfig {
  pub url:       String,
  pub api_key:   Option<String>,
  pub tenant_id: Option<String>,
  pub timeout:   Duration,
}

/// Directory client over HTTP.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpDirectory {
  client: Client,
  base:   Url,
  config: HttpDirectoryConfig,
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ObjectEnvelope {
  result: DirectoryObject,
}

#[derive(Serialize)]
struct SetObjectBody<'a> {
  object: &'a DirectoryObject,
}

#[derive(Deserialize)]
struct RelationEnvelope {
  result:  RelationTuple,
  #[serde(default)]
  objects: HashMap<String, DirectoryObject>,
}

#[derive(Serialize)]
struct SetRelationBody<'a> {
  relation: &'a RelationTuple,
}

/// gRPC-gateway error body.
#[derive(Deserialize)]
struct Status {
  #[serde(default)]
  code:    i32,
  #[serde(default)]
  message: String,
}

const GRPC_INVALID_ARGUMENT: i32 = 3;
const GRPC_NOT_FOUND: i32 = 5;

/// Map a non-success response onto the typed error.
fn classify(status: StatusCode, body: &str) -> DirectoryError {
  let parsed = serde_json::from_str::<Status>(body).ok();
  let message = parsed
    .as_ref()
    .map(|s| s.message.clone())
    .filter(|m| !m.is_empty())
    .unwrap_or_else(|| format!("{status}"));

  let code = parsed.map(|s| s.code);
  if status == StatusCode::NOT_FOUND || code == Some(GRPC_NOT_FOUND) {
    DirectoryError::NotFound(message)
  } else if status == StatusCode::BAD_REQUEST || code == Some(GRPC_INVALID_ARGUMENT) {
    DirectoryError::InvalidArgument(message)
  } else {
    DirectoryError::Unavailable(message)
  }
}

fn transport(e: reqwest::Error) -> DirectoryError {
  DirectoryError::Unavailable(e.to_string())
}

// ─── Client ──────────────────────────────────────────────────────────────────

impl HttpDirectory {
  pub fn new(config: HttpDirectoryConfig) -> Result<Self, DirectoryError> {
    let base = Url::parse(&config.url).map_err(|e| {
      DirectoryError::InvalidArgument(format!("directory url {:?}: {e}", config.url))
    })?;
    if base.cannot_be_a_base() {
      return Err(DirectoryError::InvalidArgument(format!(
        "directory url {:?} cannot be a base",
        config.url
      )));
    }
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(transport)?;
    Ok(Self {
      client,
      base,
      config,
    })
  }

  /// `{url}/api/v3/directory/<segments…>`, each segment percent-encoded.
  fn url(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    // `cannot_be_a_base` was rejected in `new`, so this always succeeds.
    if let Ok(mut path) = url.path_segments_mut() {
      path
        .pop_if_empty()
        .extend(["api", "v3", "directory"])
        .extend(segments);
    }
    url
  }

  fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
    let req = match &self.config.api_key {
      Some(key) => req.header("authorization", format!("basic {key}")),
      None => req,
    };
    match &self.config.tenant_id {
      Some(tenant) => req.header("aserto-tenant-id", tenant),
      None => req,
    }
  }

  async fn execute(&self, req: RequestBuilder) -> Result<reqwest::Response, DirectoryError> {
    let resp = self.authorize(req).send().await.map_err(transport)?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let err = classify(status, &body);
    tracing::debug!(%status, error = %err, "directory request rejected");
    Err(err)
  }

  async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, DirectoryError> {
    self
      .execute(req)
      .await?
      .json()
      .await
      .map_err(|e| DirectoryError::Unavailable(format!("decoding directory response: {e}")))
  }
}

impl Directory for HttpDirectory {
  async fn object(&self, key: &ObjectKey) -> Result<DirectoryObject, DirectoryError> {
    let url = self.url(&["object", &key.object_type, &key.object_id]);
    let envelope: ObjectEnvelope = self.fetch(self.client.get(url)).await?;
    Ok(envelope.result)
  }

  async fn set_object(&self, object: DirectoryObject) -> Result<(), DirectoryError> {
    let req = self
      .client
      .post(self.url(&["object"]))
      .json(&SetObjectBody { object: &object });
    self.execute(req).await?;
    Ok(())
  }

  async fn delete_object(
    &self,
    key: &ObjectKey,
    with_relations: bool,
  ) -> Result<(), DirectoryError> {
    let req = self
      .client
      .delete(self.url(&["object", &key.object_type, &key.object_id]))
      .query(&[("with_relations", with_relations)]);
    self.execute(req).await?;
    Ok(())
  }

  async fn relation(
    &self,
    query: &RelationQuery,
  ) -> Result<RelationResponse, DirectoryError> {
    let mut params: Vec<(&str, &str)> = vec![("relation", query.relation.as_str())];
    let optional = [
      ("object_type", &query.object_type),
      ("object_id", &query.object_id),
      ("subject_type", &query.subject_type),
      ("subject_id", &query.subject_id),
    ];
    for (name, value) in optional {
      if let Some(v) = value {
        params.push((name, v.as_str()));
      }
    }
    if query.with_objects {
      params.push(("with_objects", "true"));
    }

    let req = self.client.get(self.url(&["relation"])).query(&params);
    let envelope: RelationEnvelope = self.fetch(req).await?;
    Ok(RelationResponse {
      result:  envelope.result,
      objects: envelope.objects,
    })
  }

  async fn set_relation(&self, tuple: RelationTuple) -> Result<(), DirectoryError> {
    let req = self
      .client
      .post(self.url(&["relation"]))
      .json(&SetRelationBody { relation: &tuple });
    self.execute(req).await?;
    Ok(())
  }
}
