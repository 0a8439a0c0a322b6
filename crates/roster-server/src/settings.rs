//! Server configuration, deserialised from `config.toml` layered under
//! `ROSTER_*` environment variables.

use std::{
  num::NonZeroUsize,
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context as _, bail};
use roster_api::AuthConfig;
use roster_directory::{HttpAuthorizerConfig, HttpDirectoryConfig};
use roster_identity::UserCache;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  #[serde(default = "default_cache_capacity")]
  pub user_cache_capacity: usize,
  #[serde(default)]
  pub user_cache_ttl_secs: Option<u64>,
  pub jwt:                 JwtConfig,
  #[serde(default)]
  pub directory:           DirectoryConfig,
  #[serde(default)]
  pub authorizer:          AuthorizerConfig,
}

/// Bearer-token verification. Exactly one of `secret` and
/// `public_key_pem` must be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwtConfig {
  pub secret:         Option<String>,
  pub public_key_pem: Option<String>,
  pub audience:       Option<String>,
  pub issuer:         Option<String>,
}

/// Directory gateway connection. Without a `url` the server runs against an
/// in-process directory.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
  pub url:          Option<String>,
  pub api_key:      Option<String>,
  pub tenant_id:    Option<String>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for DirectoryConfig {
  fn default() -> Self {
    Self {
      url:          None,
      api_key:      None,
      tenant_id:    None,
      timeout_secs: default_timeout_secs(),
    }
  }
}

/// Policy decision point. Without a `url` every request is allowed.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizerConfig {
  pub url:            Option<String>,
  pub policy_root:    Option<String>,
  pub api_key:        Option<String>,
  pub tenant_id:      Option<String>,
  pub instance_name:  Option<String>,
  pub instance_label: Option<String>,
  /// PEM file with an extra CA certificate for the authorizer's TLS.
  pub ca_cert_path:   Option<PathBuf>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:   u64,
}

impl Default for AuthorizerConfig {
  fn default() -> Self {
    Self {
      url:            None,
      policy_root:    None,
      api_key:        None,
      tenant_id:      None,
      instance_name:  None,
      instance_label: None,
      ca_cert_path:   None,
      timeout_secs:   default_timeout_secs(),
    }
  }
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 3001 }
fn default_store_path() -> PathBuf { PathBuf::from("database.db") }
fn default_cache_capacity() -> usize { 1024 }
fn default_timeout_secs() -> u64 { 10 }

impl ServerConfig {
  /// Read `path` (if it exists) and overlay `ROSTER_*` variables, e.g.
  /// `ROSTER_PORT=8080` or `ROSTER_JWT__SECRET=...`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("ROSTER")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn user_cache(&self) -> anyhow::Result<UserCache> {
    let capacity = NonZeroUsize::new(self.user_cache_capacity)
      .context("user_cache_capacity must be at least 1")?;
    let cache = UserCache::new(capacity);
    Ok(match self.user_cache_ttl_secs {
      Some(secs) => cache.with_ttl(Duration::from_secs(secs)),
      None => cache,
    })
  }
}

impl JwtConfig {
  pub fn auth_config(&self) -> anyhow::Result<AuthConfig> {
    let mut auth = match (&self.secret, &self.public_key_pem) {
      (Some(secret), None) => AuthConfig::hs256(secret.as_bytes()),
      (None, Some(pem)) => AuthConfig::rs256_pem(pem.as_bytes())
        .context("jwt.public_key_pem is not a valid RSA public key")?,
      (Some(_), Some(_)) => bail!("set only one of jwt.secret and jwt.public_key_pem"),
      (None, None) => bail!("one of jwt.secret or jwt.public_key_pem is required"),
    };
    if let Some(audience) = &self.audience {
      auth = auth.audience(audience);
    }
    if let Some(issuer) = &self.issuer {
      auth = auth.issuer(issuer);
    }
    Ok(auth)
  }
}

impl DirectoryConfig {
  /// `None` when no gateway url is configured.
  pub fn http(&self) -> Option<HttpDirectoryConfig> {
    let url = self.url.clone()?;
    Some(HttpDirectoryConfig {
      url,
      api_key: self.api_key.clone(),
      tenant_id: self.tenant_id.clone(),
      timeout: Duration::from_secs(self.timeout_secs),
    })
  }
}

impl AuthorizerConfig {
  /// `None` when no authorizer url is configured. A configured url needs a
  /// `policy_root`.
  pub fn http(&self) -> anyhow::Result<Option<HttpAuthorizerConfig>> {
    let Some(url) = self.url.clone() else {
      return Ok(None);
    };
    let policy_root = self
      .policy_root
      .clone()
      .context("authorizer.policy_root is required when authorizer.url is set")?;
    let ca_cert_pem = match &self.ca_cert_path {
      Some(path) => {
        let path = expand_tilde(path);
        Some(
          std::fs::read(&path)
            .with_context(|| format!("failed to read authorizer CA certificate {path:?}"))?,
        )
      }
      None => None,
    };
    Ok(Some(HttpAuthorizerConfig {
      url,
      policy_root,
      api_key: self.api_key.clone(),
      tenant_id: self.tenant_id.clone(),
      instance_name: self.instance_name.clone(),
      instance_label: self.instance_label.clone(),
      ca_cert_pem,
      timeout: Duration::from_secs(self.timeout_secs),
    }))
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
