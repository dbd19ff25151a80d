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

//! The russh-backed transport.
//!
//! [`RusshConnector`] is the production [`Connector`]: it opens a TCP
//! connection, verifies the server key and authenticates with the resolved
//! private key.

use async_trait::async_trait;

pub mod channel_manager;
pub mod connection;
pub mod error;

pub use channel_manager::RusshExecChannel;
pub use connection::{Client, ClientHandler};
pub use error::Error;

use super::known_hosts::{HostKeyVerifier, StrictHostKeyChecking};
use super::resolver::ConnectionParams;
use super::session::{Connector, ExecChannel, RemoteSession, SessionError};

/// Connects over real SSH using russh.
#[derive(Debug, Clone)]
pub struct RusshConnector {
    verifier: HostKeyVerifier,
}

impl RusshConnector {
    pub fn new(strict_mode: StrictHostKeyChecking) -> Self {
        Self {
            verifier: HostKeyVerifier::new(strict_mode),
        }
    }
}

#[async_trait]
impl Connector for RusshConnector {
    async fn connect(
        &self,
        params: &ConnectionParams,
    ) -> Result<Box<dyn RemoteSession>, SessionError> {
        tracing::debug!("Connecting to {}", params.target());
        let client = Client::connect(
            &params.address,
            params.port,
            &params.user,
            params.credential.key(),
            self.verifier.clone(),
        )
        .await?;
        tracing::debug!(
            "Authenticated as {} on {}",
            client.get_connection_username(),
            client.get_connection_address()
        );
        Ok(Box::new(RusshSession { client }))
    }
}

/// A connected russh client.
#[derive(Debug)]
pub struct RusshSession {
    client: Client,
}

#[async_trait]
impl RemoteSession for RusshSession {
    async fn open_channel(&mut self) -> Result<Box<dyn ExecChannel>, SessionError> {
        let channel = self
            .client
            .get_channel()
            .await
            .map_err(|e| SessionError::Channel(e.to_string()))?;
        Ok(Box::new(RusshExecChannel::new(channel)))
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.client.is_closed() {
            return Ok(());
        }
        self.client.disconnect().await.map_err(SessionError::from)
    }
}
