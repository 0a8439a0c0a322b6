//! Authorizer clients.
//!
//! [`HttpAuthorizer`] asks a policy decision point's JSON gateway:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `is_allowed` | `POST {url}/api/v2/authz/is` |
//!
//! [`PermitAll`] allows everything and is only meant for local development.

use std::time::Duration;

use reqwest::{Certificate, Client, Url};
use roster_core::authz::{AuthzError, AuthzRequest, Authorizer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The decision every request asks for.
const ALLOWED: &str = "allowed";

/// Connection and policy settings for the authorizer.
#[derive(Debug, Clone)]
pub struct HttpAuthorizerConfig {
  pub url:            String,
  /// Prefix of every policy path, e.g. `todoApp`.
  pub policy_root:    String,
  pub api_key:        Option<String>,
  pub tenant_id:      Option<String>,
  pub instance_name:  Option<String>,
  pub instance_label: Option<String>,
  /// Extra PEM-encoded CA certificate to trust.
  pub ca_cert_pem:    Option<Vec<u8>>,
  pub timeout:        Duration,
}

#[derive(Clone)]
pub struct HttpAuthorizer {
  client:   Client,
  endpoint: Url,
  config:   HttpAuthorizerConfig,
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct IsRequest<'a> {
  identity_context: IdentityContext<'a>,
  policy_context:   PolicyContext,
  resource_context: &'a Map<String, Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  policy_instance:  Option<PolicyInstance<'a>>,
}

#[derive(Serialize)]
struct IdentityContext<'a> {
  identity: &'a str,
  #[serde(rename = "type")]
  kind:     &'static str,
}

#[derive(Serialize)]
struct PolicyContext {
  path:      String,
  decisions: [&'static str; 1],
}

#[derive(Serialize)]
struct PolicyInstance<'a> {
  #[serde(skip_serializing_if = "Option::is_none")]
  name:           Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  instance_label: Option<&'a str>,
}

#[derive(Deserialize)]
struct IsResponse {
  #[serde(default)]
  decisions: Vec<Decision>,
}

#[derive(Deserialize)]
struct Decision {
  decision: String,
  #[serde(default)]
  is:       bool,
}

fn unavailable(e: impl std::fmt::Display) -> AuthzError {
  AuthzError::Unavailable(e.to_string())
}

// ─── Client ──────────────────────────────────────────────────────────────────

impl HttpAuthorizer {
  pub fn new(config: HttpAuthorizerConfig) -> Result<Self, AuthzError> {
    let mut endpoint = Url::parse(&config.url).map_err(|e| {
      AuthzError::Rejected(format!("authorizer url {:?}: {e}", config.url))
    })?;
    match endpoint.path_segments_mut() {
      Ok(mut path) => {
        path.pop_if_empty().extend(["api", "v2", "authz", "is"]);
      }
      Err(()) => {
        return Err(AuthzError::Rejected(format!(
          "authorizer url {:?} cannot be a base",
          config.url
        )));
      }
    }

    let mut builder = Client::builder().timeout(config.timeout);
    if let Some(pem) = &config.ca_cert_pem {
      let cert = Certificate::from_pem(pem)
        .map_err(|e| AuthzError::Rejected(format!("authorizer CA certificate: {e}")))?;
      builder = builder.add_root_certificate(cert);
    }
    let client = builder.build().map_err(unavailable)?;

    Ok(Self {
      client,
      endpoint,
      config,
    })
  }

  fn body<'a>(&'a self, request: &'a AuthzRequest) -> IsRequest<'a> {
    let instance = match (&self.config.instance_name, &self.config.instance_label) {
      (None, None) => None,
      (name, label) => Some(PolicyInstance {
        name:           name.as_deref(),
        instance_label: label.as_deref(),
      }),
    };
    IsRequest {
      identity_context: IdentityContext {
        identity: &request.token,
        kind:     "IDENTITY_TYPE_JWT",
      },
      policy_context:   PolicyContext {
        path:      format!("{}.{}", self.config.policy_root, request.policy),
        decisions: [ALLOWED],
      },
      resource_context: &request.resource,
      policy_instance:  instance,
    }
  }
}

impl Authorizer for HttpAuthorizer {
  async fn is_allowed(&self, request: &AuthzRequest) -> Result<bool, AuthzError> {
    let mut req = self.client.post(self.endpoint.clone()).json(&self.body(request));
    if let Some(key) = &self.config.api_key {
      req = req.header("authorization", format!("basic {key}"));
    }
    if let Some(tenant) = &self.config.tenant_id {
      req = req.header("aserto-tenant-id", tenant);
    }

    let resp = req.send().await.map_err(unavailable)?;
    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      tracing::debug!(%status, %body, "authorizer request failed");
      return Err(if status.is_client_error() {
        AuthzError::Rejected(format!("{status}: {body}"))
      } else {
        AuthzError::Unavailable(format!("{status}"))
      });
    }

    let answer: IsResponse = resp
      .json()
      .await
      .map_err(|e| unavailable(format!("decoding authorizer response: {e}")))?;
    answer
      .decisions
      .into_iter()
      .find(|d| d.decision == ALLOWED)
      .map(|d| d.is)
      .ok_or_else(|| AuthzError::Rejected("response has no `allowed` decision".into()))
  }
}

// ─── Development ─────────────────────────────────────────────────────────────

/// Allows every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermitAll;

impl Authorizer for PermitAll {
  async fn is_allowed(&self, _request: &AuthzRequest) -> Result<bool, AuthzError> { Ok(true) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
  };

  fn config(url: String) -> HttpAuthorizerConfig {
    HttpAuthorizerConfig {
      url,
      policy_root: "todoApp".into(),
      api_key: Some("secret".into()),
      tenant_id: Some("tenant-1".into()),
      instance_name: Some("todo".into()),
      instance_label: Some("todo".into()),
      ca_cert_pem: None,
      timeout: Duration::from_secs(5),
    }
  }

  fn request() -> AuthzRequest {
    let mut resource = Map::new();
    resource.insert("ownerID".into(), json!("u1"));
    AuthzRequest {
      token: "header.payload.sig".into(),
      policy: "PUT.todos.__id".into(),
      resource,
    }
  }

  fn decision(is: bool) -> ResponseTemplate {
    ResponseTemplate::new(200)
      .set_body_json(json!({ "decisions": [{ "decision": "allowed", "is": is }] }))
  }

  #[tokio::test]
  async fn sends_full_policy_path_and_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/v2/authz/is"))
      .and(header("authorization", "basic secret"))
      .and(header("aserto-tenant-id", "tenant-1"))
      .and(body_json(json!({
        "identity_context": { "identity": "header.payload.sig", "type": "IDENTITY_TYPE_JWT" },
        "policy_context": { "path": "todoApp.PUT.todos.__id", "decisions": ["allowed"] },
        "resource_context": { "ownerID": "u1" },
        "policy_instance": { "name": "todo", "instance_label": "todo" }
      })))
      .respond_with(decision(true))
      .expect(1)
      .mount(&server)
      .await;

    let authz = HttpAuthorizer::new(config(server.uri())).unwrap();
    assert!(authz.is_allowed(&request()).await.unwrap());
  }

  #[tokio::test]
  async fn denied_decision_is_false() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/v2/authz/is"))
      .respond_with(decision(false))
      .mount(&server)
      .await;

    let authz = HttpAuthorizer::new(config(server.uri())).unwrap();
    assert!(!authz.is_allowed(&request()).await.unwrap());
  }

  #[tokio::test]
  async fn missing_decision_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "decisions": [] })))
      .mount(&server)
      .await;

    let authz = HttpAuthorizer::new(config(server.uri())).unwrap();
    assert!(matches!(
      authz.is_allowed(&request()).await,
      Err(AuthzError::Rejected(_))
    ));
  }

  #[tokio::test]
  async fn status_classes_map_to_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(503))
      .mount(&server)
      .await;
    let authz = HttpAuthorizer::new(config(server.uri())).unwrap();
    assert!(matches!(
      authz.is_allowed(&request()).await,
      Err(AuthzError::Unavailable(_))
    ));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(400).set_body_string("unknown policy"))
      .mount(&server)
      .await;
    let authz = HttpAuthorizer::new(config(server.uri())).unwrap();
    assert!(matches!(
      authz.is_allowed(&request()).await,
      Err(AuthzError::Rejected(_))
    ));
  }

  #[tokio::test]
  async fn unreachable_authorizer_is_unavailable() {
    let authz = HttpAuthorizer::new(config("http://127.0.0.1:1".into())).unwrap();
    assert!(matches!(
      authz.is_allowed(&request()).await,
      Err(AuthzError::Unavailable(_))
    ));
  }

  #[test]
  fn instance_is_omitted_when_unset() {
    let mut cfg = config("http://localhost:8383".into());
    cfg.instance_name = None;
    cfg.instance_label = None;
    let authz = HttpAuthorizer::new(cfg).unwrap();
    let req = request();
    let body = serde_json::to_value(authz.body(&req)).unwrap();
    assert!(body.get("policy_instance").is_none());
  }

  #[test]
  fn rejects_non_base_url() {
    assert!(matches!(
      HttpAuthorizer::new(config("mailto:authz@example.com".into())),
      Err(AuthzError::Rejected(_))
    ));
  }

  #[tokio::test]
  async fn permit_all_allows() {
    assert!(PermitAll.is_allowed(&request()).await.unwrap());
  }
}
