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

//! SSH connection establishment: address resolution, handshake, host key
//! verification and public key authentication.

use russh::client::{Config, Handle, Handler};
use russh::keys::{PrivateKey, PrivateKeyWithHashAlg};
use std::net::SocketAddr;
use std::sync::Arc;
use std::{fmt::Debug, io};

use super::Error;
use crate::ssh::known_hosts::HostKeyVerifier;

/// An authenticated SSH connection to a remote server.
#[derive(Clone)]
pub struct Client {
    pub(super) connection_handle: Arc<Handle<ClientHandler>>,
    pub(super) username: String,
    pub(super) address: SocketAddr,
}

impl Client {
    /// Open an SSH connection to `host:port` and authenticate with `key`.
    ///
    /// If `host` resolves to multiple addresses, each is tried in turn until
    /// a handshake succeeds. Authentication is attempted only on the first
    /// successful connection.
    pub async fn connect(
        host: &str,
        port: u16,
        username: &str,
        key: Arc<PrivateKey>,
        verifier: HostKeyVerifier,
    ) -> Result<Self, Error> {
        Self::connect_with_config(host, port, username, key, verifier, Config::default()).await
    }

    /// Same as `connect`, but with a non default [`russh::client::Config`].
    pub async fn connect_with_config(
        host: &str,
        port: u16,
        username: &str,
        key: Arc<PrivateKey>,
        verifier: HostKeyVerifier,
        config: Config,
    ) -> Result<Self, Error> {
        let config = Arc::new(config);

        let socket_addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
            .await
            .map_err(Error::AddressInvalid)?
            .collect();

        let mut connect_res = Err(Error::AddressInvalid(io::Error::new(
            io::ErrorKind::InvalidInput,
            "could not resolve to any addresses",
        )));
        for socket_addr in socket_addrs {
            let handler = ClientHandler::new(host.to_string(), socket_addr, verifier.clone());
            match russh::client::connect(config.clone(), socket_addr, handler).await {
                Ok(h) => {
                    connect_res = Ok((socket_addr, h));
                    break;
                }
                Err(e) => {
                    tracing::debug!("Connection to {} failed: {}", socket_addr, e);
                    connect_res = Err(e);
                }
            }
        }
        let (address, mut handle) = connect_res?;
        let username = username.to_string();

        authenticate(&mut handle, &username, host, key).await?;

        Ok(Self {
            connection_handle: Arc::new(handle),
            username,
            address,
        })
    }

    pub fn get_connection_username(&self) -> &String {
        &self.username
    }

    pub fn get_connection_address(&self) -> &SocketAddr {
        &self.address
    }

    /// Disconnect from the remote host.
    pub async fn disconnect(&self) -> Result<(), Error> {
        self.connection_handle
            .disconnect(russh::Disconnect::ByApplication, "", "")
            .await
            .map_err(Error::SshError)
    }

    /// Check if the connection is closed.
    pub fn is_closed(&self) -> bool {
        self.connection_handle.is_closed()
    }
}

impl Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("username", &self.username)
            .field("address", &self.address)
            .field("connection_handle", &"Handle<ClientHandler>")
            .finish()
    }
}

async fn authenticate(
    handle: &mut Handle<ClientHandler>,
    username: &str,
    host: &str,
    key: Arc<PrivateKey>,
) -> Result<(), Error> {
    let hash_alg = handle.best_supported_rsa_hash().await?.flatten();
    let result = handle
        .authenticate_publickey(username, PrivateKeyWithHashAlg::new(key, hash_alg))
        .await?;
    if !result.success() {
        return Err(Error::KeyAuthFailed {
            user: username.to_string(),
            address: host.to_string(),
        });
    }
    Ok(())
}

/// SSH client handler for managing server key verification.
#[derive(Debug, Clone)]
pub struct ClientHandler {
    hostname: String,
    host: SocketAddr,
    verifier: HostKeyVerifier,
}

impl ClientHandler {
    pub fn new(hostname: String, host: SocketAddr, verifier: HostKeyVerifier) -> Self {
        Self {
            hostname,
            host,
            verifier,
        }
    }
}

impl Handler for ClientHandler {
    type Error = Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        if self
            .verifier
            .verify(&self.hostname, self.host.port(), server_public_key)
        {
            Ok(true)
        } else {
            Err(Error::ServerCheckFailed(self.hostname.clone()))
        }
    }
}
