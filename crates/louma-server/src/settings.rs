//! Runtime configuration, deserialised from `config.toml` and `LOUMA_*`
//! environment variables.

use std::path::PathBuf;

use chrono::Duration;
use louma_api::TokenConfig;
use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                   String,
  #[serde(default = "default_port")]
  pub port:                   u16,
  #[serde(default = "default_store_path")]
  pub store_path:             PathBuf,
  /// Signs access tokens.
  pub jwt_secret:             String,
  /// Signs refresh tokens. Must differ from `jwt_secret`.
  pub jwt_refresh_secret:     String,
  #[serde(default = "default_access_ttl")]
  pub access_token_ttl_hours: i64,
  #[serde(default = "default_refresh_ttl")]
  pub refresh_token_ttl_days: i64,
  #[serde(default = "default_max_page_size")]
  pub max_page_size:          usize,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 5000 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/louma/louma.db") }
fn default_access_ttl() -> i64 { 168 }
fn default_refresh_ttl() -> i64 { 30 }
fn default_max_page_size() -> usize { 100 }

impl ServerConfig {
  pub fn token_config(&self) -> anyhow::Result<TokenConfig> {
    if self.jwt_secret.is_empty() || self.jwt_refresh_secret.is_empty() {
      anyhow::bail!("jwt_secret and jwt_refresh_secret must be set");
    }
    if self.jwt_secret == self.jwt_refresh_secret {
      anyhow::bail!("jwt_secret and jwt_refresh_secret must differ");
    }
    Ok(TokenConfig {
      access_secret:  self.jwt_secret.clone(),
      refresh_secret: self.jwt_refresh_secret.clone(),
      access_ttl:     Duration::hours(self.access_token_ttl_hours),
      refresh_ttl:    Duration::days(self.refresh_token_ttl_days),
    })
  }
}
