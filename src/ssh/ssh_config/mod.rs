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

//! OpenSSH client configuration, used as the host alias source.
//!
//! Resolution follows OpenSSH: sections are scanned top to bottom and for each
//! option the first value obtained wins.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

mod parser;
mod pattern;
mod types;

pub use types::{HostBlock, SshHostConfig};

use crate::utils::fs::home_dir;

#[derive(Debug, Clone, Default)]
pub struct SshConfig {
    pub blocks: Vec<HostBlock>,
}

impl SshConfig {
    /// Create a new empty SSH configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the per-user configuration file (`~/.ssh/config`).
    pub fn default_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".ssh").join("config"))
    }

    /// Load SSH configuration from a file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read SSH config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse SSH config file: {}", path.display()))
    }

    /// Load `path`, or the per-user file when `path` is `None`.
    ///
    /// A missing file is an empty configuration, so every alias is unknown.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::new()),
            },
        };

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!("SSH config not found at {:?}, using empty config", path);
            return Ok(Self::new());
        }

        Self::load_from_file(&path).await
    }

    /// Parse SSH configuration from a string
    pub fn parse(content: &str) -> Result<Self> {
        let blocks = parser::parse(content)?;
        Ok(Self { blocks })
    }

    /// Collect the options that apply to `alias`.
    pub fn find_host_config(&self, alias: &str) -> SshHostConfig {
        let mut resolved = SshHostConfig::default();
        for block in &self.blocks {
            if pattern::matches_host_patterns(alias, &block.patterns) {
                resolved.fill_from(&block.config);
            }
        }

        // %h in HostName stands for the alias itself.
        if let Some(hostname) = resolved.hostname.as_mut() {
            if hostname.contains("%h") {
                *hostname = hostname.replace("%h", alias);
            }
        }

        resolved
    }
}
