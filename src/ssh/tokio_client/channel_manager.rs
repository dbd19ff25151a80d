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

//! Session channels for remote command execution.

use async_trait::async_trait;
use russh::client::Msg;
use russh::Channel;

use super::connection::Client;
use super::Error;
use crate::ssh::session::{ChannelOutput, ExecChannel, SessionError};

/// Initial stdout capacity; matches typical SSH channel window chunks.
const SSH_CMD_BUFFER_SIZE: usize = 8192;

/// Initial stderr capacity; stderr is usually short diagnostics.
const SSH_RESPONSE_BUFFER_SIZE: usize = 1024;

impl Client {
    /// Open a new session channel.
    pub async fn get_channel(&self) -> Result<Channel<Msg>, Error> {
        self.connection_handle
            .channel_open_session()
            .await
            .map_err(Error::SshError)
    }
}

/// A single `exec` request on a russh session channel.
pub struct RusshExecChannel {
    channel: Channel<Msg>,
}

impl RusshExecChannel {
    pub fn new(channel: Channel<Msg>) -> Self {
        Self { channel }
    }
}

fn channel_error(err: russh::Error) -> SessionError {
    SessionError::Channel(err.to_string())
}

#[async_trait]
impl ExecChannel for RusshExecChannel {
    async fn start(&mut self, command: &str) -> Result<(), SessionError> {
        self.channel
            .exec(true, command)
            .await
            .map_err(channel_error)
    }

    async fn write_stdin(&mut self, data: &[u8]) -> Result<(), SessionError> {
        self.channel.data(data).await.map_err(channel_error)
    }

    async fn close_stdin(&mut self) -> Result<(), SessionError> {
        self.channel.eof().await.map_err(channel_error)
    }

    async fn wait(&mut self) -> Result<ChannelOutput, SessionError> {
        let mut output = ChannelOutput {
            stdout: Vec::with_capacity(SSH_CMD_BUFFER_SIZE),
            stderr: Vec::with_capacity(SSH_RESPONSE_BUFFER_SIZE),
            exit_status: None,
        };

        while let Some(msg) = self.channel.wait().await {
            match msg {
                russh::ChannelMsg::Data { ref data } => output.stdout.extend_from_slice(data),
                russh::ChannelMsg::ExtendedData { ref data, ext } => {
                    if ext == 1 {
                        output.stderr.extend_from_slice(data);
                    }
                }
                // Data may still follow the exit status, keep reading until close.
                russh::ChannelMsg::ExitStatus { exit_status } => {
                    output.exit_status = Some(exit_status)
                }
                russh::ChannelMsg::ExitSignal { signal_name, .. } => {
                    tracing::debug!("Remote process terminated by signal {:?}", signal_name);
                }
                _ => {}
            }
        }

        Ok(output)
    }
}
