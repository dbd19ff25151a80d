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

//! Transport seams used by the session runner.
//!
//! A [`Connector`] turns resolved [`ConnectionParams`] into an authenticated
//! [`RemoteSession`]. Each command in a batch gets its own [`ExecChannel`]
//! opened from that session, so every invocation starts from a fresh remote
//! shell context.

use async_trait::async_trait;
use thiserror::Error;

use super::resolver::ConnectionParams;

/// Errors raised by the transport layer.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Connect(String),
    #[error("authentication failed for {user}@{address}")]
    Authentication { user: String, address: String },
    #[error("host key verification failed for {0}")]
    HostKeyRejected(String),
    #[error("channel error: {0}")]
    Channel(String),
    #[error("command did not report an exit status")]
    NoExitStatus,
}

impl From<super::tokio_client::Error> for SessionError {
    fn from(err: super::tokio_client::Error) -> Self {
        use super::tokio_client::Error;
        match err {
            Error::ServerCheckFailed(host) => SessionError::HostKeyRejected(host),
            Error::KeyAuthFailed { user, address } => {
                SessionError::Authentication { user, address }
            }
            e @ (Error::AddressInvalid(_) | Error::SshError(_)) => {
                SessionError::Connect(e.to_string())
            }
        }
    }
}

/// Everything a remote process produced before it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// `None` when the channel closed without an exit-status message.
    pub exit_status: Option<u32>,
}

impl ChannelOutput {
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// One remote execution channel. Used for exactly one command.
#[async_trait]
pub trait ExecChannel: Send {
    /// Start `command` on the remote side.
    async fn start(&mut self, command: &str) -> Result<(), SessionError>;

    /// Write raw bytes to the remote process's standard input.
    async fn write_stdin(&mut self, data: &[u8]) -> Result<(), SessionError>;

    /// Signal end of input.
    async fn close_stdin(&mut self) -> Result<(), SessionError>;

    /// Wait for the remote process to finish, collecting stdout and stderr
    /// into separate buffers.
    async fn wait(&mut self) -> Result<ChannelOutput, SessionError>;
}

/// An authenticated connection to one host.
#[async_trait]
pub trait RemoteSession: Send {
    async fn open_channel(&mut self) -> Result<Box<dyn ExecChannel>, SessionError>;

    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Opens authenticated sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        params: &ConnectionParams,
    ) -> Result<Box<dyn RemoteSession>, SessionError>;
}
