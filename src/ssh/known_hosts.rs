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

//! Server host key verification against `~/.ssh/known_hosts`.

use russh::keys::PublicKey;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::utils::fs::home_dir;

/// Get the default known_hosts file path
pub fn get_default_known_hosts_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".ssh").join("known_hosts"))
}

/// Mode for host key checking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrictHostKeyChecking {
    /// Unknown and changed keys are both rejected.
    Yes,
    /// No verification at all.
    No,
    /// Changed keys are rejected, unknown hosts are accepted.
    #[default]
    AcceptNew,
}

impl FromStr for StrictHostKeyChecking {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yes" | "true" => Ok(Self::Yes),
            "no" | "false" => Ok(Self::No),
            "accept-new" | "tofu" => Ok(Self::AcceptNew),
            other => Err(format!(
                "invalid host key checking mode '{other}' (expected yes, no or accept-new)"
            )),
        }
    }
}

/// What the known_hosts file says about a presented key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnownHostStatus {
    Matched,
    Unknown,
    /// The file lists a different key for this host.
    Changed { line: usize },
    /// The file could not be read or parsed.
    Unreadable(String),
}

/// Look `key` up for `host:port` in the known_hosts file at `path`.
pub fn lookup(path: &Path, host: &str, port: u16, key: &PublicKey) -> KnownHostStatus {
    if !path.exists() {
        return KnownHostStatus::Unknown;
    }
    match russh::keys::check_known_hosts_path(host, port, key, path) {
        Ok(true) => KnownHostStatus::Matched,
        Ok(false) => KnownHostStatus::Unknown,
        Err(russh::keys::Error::KeyChanged { line }) => KnownHostStatus::Changed { line },
        Err(e) => KnownHostStatus::Unreadable(e.to_string()),
    }
}

/// Checks server keys according to a [`StrictHostKeyChecking`] mode.
#[derive(Debug, Clone)]
pub struct HostKeyVerifier {
    mode: StrictHostKeyChecking,
    known_hosts_path: Option<PathBuf>,
}

impl HostKeyVerifier {
    pub fn new(mode: StrictHostKeyChecking) -> Self {
        Self {
            mode,
            known_hosts_path: get_default_known_hosts_path(),
        }
    }

    pub fn with_known_hosts_file(mode: StrictHostKeyChecking, path: PathBuf) -> Self {
        Self {
            mode,
            known_hosts_path: Some(path),
        }
    }

    /// Returns whether the key presented by `host:port` is acceptable.
    pub fn verify(&self, host: &str, port: u16, key: &PublicKey) -> bool {
        if self.mode == StrictHostKeyChecking::No {
            tracing::debug!("Host key checking disabled, accepting key for {}", host);
            return true;
        }

        let status = match &self.known_hosts_path {
            Some(path) => lookup(path, host, port, key),
            None => {
                tracing::warn!("Could not determine known_hosts path");
                KnownHostStatus::Unknown
            }
        };

        match (status, self.mode) {
            (KnownHostStatus::Matched, _) => true,
            (KnownHostStatus::Changed { line }, _) => {
                tracing::error!(
                    "Host key for {}:{} does not match known_hosts entry at line {}",
                    host,
                    port,
                    line
                );
                false
            }
            (KnownHostStatus::Unreadable(e), _) => {
                tracing::error!("Failed to check known_hosts for {}: {}", host, e);
                false
            }
            (KnownHostStatus::Unknown, StrictHostKeyChecking::AcceptNew) => {
                tracing::warn!(
                    "Accepting unknown host key for {}:{} ({})",
                    host,
                    port,
                    key.algorithm().as_str()
                );
                true
            }
            (KnownHostStatus::Unknown, _) => {
                tracing::error!("No known_hosts entry for {}:{}", host, port);
                false
            }
        }
    }
}
