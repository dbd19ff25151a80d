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

/// Options collected for one host alias.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SshHostConfig {
    pub hostname: Option<String>,
    pub user: Option<String>,
    pub port: Option<u16>,
    /// Unexpanded paths, in the order they were obtained.
    pub identity_files: Vec<String>,
}

impl SshHostConfig {
    /// Fill unset options from `other`; values already obtained are kept.
    pub(super) fn fill_from(&mut self, other: &SshHostConfig) {
        if self.hostname.is_none() {
            self.hostname = other.hostname.clone();
        }
        if self.user.is_none() {
            self.user = other.user.clone();
        }
        if self.port.is_none() {
            self.port = other.port;
        }
        self.identity_files
            .extend(other.identity_files.iter().cloned());
    }
}

/// A `Host` section and the options declared under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBlock {
    pub patterns: Vec<String>,
    pub config: SshHostConfig,
}
