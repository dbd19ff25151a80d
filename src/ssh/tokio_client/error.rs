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

use std::io;
use thiserror::Error;

/// An error returned by the russh-backed client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Key authentication failed for {user}@{address}")]
    KeyAuthFailed { user: String, address: String },
    #[error("Host key verification failed for {0}")]
    ServerCheckFailed(String),
    #[error("Unable to resolve address: {0}")]
    AddressInvalid(#[source] io::Error),
    #[error("SSH error: {0}")]
    SshError(#[from] russh::Error),
}
