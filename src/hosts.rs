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

//! Host list loading.
//!
//! ```yaml
//! hosts:
//!   - host: web1
//!     port: 2222
//!     password: s3cret
//!   - host: web2
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::security::SudoPassword;

/// One host to run the batch on.
#[derive(Debug, Clone)]
pub struct HostTarget {
    /// Alias looked up in the SSH config.
    pub alias: String,
    /// Wins over the SSH config's `Port` when set.
    pub port_override: Option<u16>,
    pub password: SudoPassword,
}

impl HostTarget {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            port_override: None,
            password: SudoPassword::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port_override = Some(port);
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = SudoPassword::new(password.into());
        self
    }
}

impl fmt::Display for HostTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port_override {
            Some(port) => write!(f, "{}:{}", self.alias, port),
            None => write!(f, "{}", self.alias),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HostListFile {
    #[serde(default)]
    hosts: Vec<HostEntry>,
}

#[derive(Deserialize)]
struct HostEntry {
    host: String,
    #[serde(default)]
    port: u16,
    #[serde(default)]
    password: Option<String>,
}

impl fmt::Debug for HostEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostEntry")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl From<HostEntry> for HostTarget {
    fn from(entry: HostEntry) -> Self {
        Self {
            alias: entry.host,
            // 0 means "not set"
            port_override: (entry.port != 0).then_some(entry.port),
            password: SudoPassword::new(entry.password.unwrap_or_default()),
        }
    }
}

/// Parse a host list document.
pub fn parse_host_list(content: &str) -> Result<Vec<HostTarget>> {
    let file: HostListFile =
        serde_yaml::from_str(content).context("Failed to parse host list YAML")?;

    let hosts: Vec<HostTarget> = file.hosts.into_iter().map(HostTarget::from).collect();
    if let Some(blank) = hosts.iter().position(|h| h.alias.trim().is_empty()) {
        anyhow::bail!("Host entry #{} has an empty host alias", blank + 1);
    }
    Ok(hosts)
}

/// Load the host list from `path`.
pub async fn load_host_list(path: &Path) -> Result<Vec<HostTarget>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read host list file: {}", path.display()))?;

    let hosts = parse_host_list(&content)
        .with_context(|| format!("Invalid host list file: {}", path.display()))?;

    tracing::debug!("Loaded {} hosts from {:?}", hosts.len(), path);
    Ok(hosts)
}
