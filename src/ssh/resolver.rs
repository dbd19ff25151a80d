// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Turning a host alias into connection parameters.
//!
//! Resolution runs fresh for every host task. Nothing is cached between
//! hosts or between runs, so edits to the SSH config or key files take
//! effect on the next lookup.

use async_trait::async_trait;
use russh::keys::PrivateKey;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use super::ssh_config::SshConfig;
use crate::utils::fs::expand_tilde;

/// Port used when neither the host list nor the SSH config names one.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Keys tried, in order, when the SSH config has no `IdentityFile`.
const DEFAULT_IDENTITY_FILES: &[&str] = &["~/.ssh/id_ed25519", "~/.ssh/id_ecdsa", "~/.ssh/id_rsa"];

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("host {0} not found in ssh config")]
    HostNotFound(String),
    #[error("{0}")]
    Config(String),
    #[error("no IdentityFile configured for {0} and no default key found")]
    NoIdentity(String),
    #[error("failed to read private key {}: {source}", .path.display())]
    KeyUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse private key {}: {source}", .path.display())]
    KeyInvalid {
        path: PathBuf,
        #[source]
        source: russh::keys::Error,
    },
}

/// A decoded private key. `Debug` never shows key material.
#[derive(Clone)]
pub struct Credential(Arc<PrivateKey>);

impl Credential {
    pub fn new(key: PrivateKey) -> Self {
        Self(Arc::new(key))
    }

    pub fn key(&self) -> Arc<PrivateKey> {
        Arc::clone(&self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("algorithm", &self.0.algorithm().as_str())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Where and how to connect for one host task.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub user: String,
    pub address: String,
    pub port: u16,
    pub credential: Credential,
}

impl ConnectionParams {
    pub fn target(&self) -> String {
        format!("{}@{}:{}", self.user, self.address, self.port)
    }
}

/// Alias lookup before the key file is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub user: String,
    pub address: String,
    pub port: u16,
    pub identity_file: PathBuf,
}

#[async_trait]
pub trait TargetResolver: Send + Sync {
    async fn resolve(
        &self,
        alias: &str,
        port_override: Option<u16>,
    ) -> Result<ConnectionParams, ResolveError>;
}

/// Resolves aliases through an OpenSSH client config file.
#[derive(Debug, Clone, Default)]
pub struct SshConfigResolver {
    /// `None` means `~/.ssh/config`.
    config_path: Option<PathBuf>,
}

impl SshConfigResolver {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }
}

#[async_trait]
impl TargetResolver for SshConfigResolver {
    async fn resolve(
        &self,
        alias: &str,
        port_override: Option<u16>,
    ) -> Result<ConnectionParams, ResolveError> {
        let config = SshConfig::load(self.config_path.as_deref())
            .await
            .map_err(|e| ResolveError::Config(format!("{e:#}")))?;

        let target = resolve_alias(&config, alias, port_override)?;
        tracing::debug!(
            "Resolved {} to {}@{}:{} using key {:?}",
            alias,
            target.user,
            target.address,
            target.port,
            target.identity_file
        );

        let credential = load_credential(&target.identity_file).await?;

        Ok(ConnectionParams {
            user: target.user,
            address: target.address,
            port: target.port,
            credential,
        })
    }
}

/// Look `alias` up in `config`. A port override of `Some` wins over the config.
pub fn resolve_alias(
    config: &SshConfig,
    alias: &str,
    port_override: Option<u16>,
) -> Result<ResolvedTarget, ResolveError> {
    let host = config.find_host_config(alias);

    let address = host
        .hostname
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ResolveError::HostNotFound(alias.to_string()))?;

    let port = port_override.or(host.port).unwrap_or(DEFAULT_SSH_PORT);

    let user = host.user.unwrap_or_else(current_username);

    let identity_file = match host.identity_files.first() {
        Some(path) => expand_tilde(Path::new(path)),
        None => default_identity_file().ok_or_else(|| ResolveError::NoIdentity(alias.to_string()))?,
    };

    Ok(ResolvedTarget {
        user,
        address,
        port,
        identity_file,
    })
}

/// Read and decode an unencrypted private key.
pub async fn load_credential(path: &Path) -> Result<Credential, ResolveError> {
    let content =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ResolveError::KeyUnreadable {
                path: path.to_path_buf(),
                source,
            })?;

    let key = russh::keys::decode_secret_key(&content, None).map_err(|source| {
        ResolveError::KeyInvalid {
            path: path.to_path_buf(),
            source,
        }
    })?;

    Ok(Credential::new(key))
}

fn default_identity_file() -> Option<PathBuf> {
    DEFAULT_IDENTITY_FILES
        .iter()
        .map(|p| expand_tilde(Path::new(p)))
        .find(|p| p.exists())
}

fn current_username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "root".to_string())
}
