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

//! Sudo password handling and the privilege-elevation protocol.
//!
//! Every command is wrapped as `sudo -S bash -c '<command>'` so sudo reads the
//! password from standard input instead of a terminal. The password line is
//! written unconditionally: the protocol does not know whether sudo asked for
//! it or whether the host has a cached credential / NOPASSWD rule.
//!
//! # Security Considerations
//! - Passwords are cleared from memory when dropped
//! - Never log or print sudo passwords
//! - The password travels in plaintext inside the SSH session

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::ssh::session::{ExecChannel, SessionError};

/// Patterns indicating sudo authentication failure
pub const SUDO_FAILURE_PATTERNS: &[&str] = &[
    "sorry, try again",
    "incorrect password",
    "authentication failure",
    "sudo: 3 incorrect password attempts",
    "sudo: no password was provided",
    "a password is required",
];

/// A sudo password that is cleared from memory on drop.
///
/// An empty password is allowed; hosts with NOPASSWD rules simply receive a
/// bare newline.
#[derive(Clone)]
pub struct SudoPassword {
    inner: SecretString,
}

impl SudoPassword {
    pub fn new(password: String) -> Self {
        Self {
            inner: SecretString::new(password.into_boxed_str()),
        }
    }

    /// Get the password as bytes for sending over SSH.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.expose_secret().as_bytes()
    }

    /// Get the password with a newline appended for sudo input.
    ///
    /// Returns a `Zeroizing<Vec<u8>>` so the copy is also cleared.
    pub fn with_newline(&self) -> Zeroizing<Vec<u8>> {
        let mut bytes = self.inner.expose_secret().as_bytes().to_vec();
        bytes.push(b'\n');
        Zeroizing::new(bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }
}

impl Default for SudoPassword {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl fmt::Debug for SudoPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SudoPassword")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Check if the given output contains a sudo authentication failure message.
pub fn contains_sudo_failure(output: &str) -> bool {
    let lower = output.to_lowercase();
    SUDO_FAILURE_PATTERNS
        .iter()
        .any(|pattern| lower.contains(*pattern))
}

/// Build the remote command line for `command`.
///
/// The whole user command becomes one single-quoted argument to `bash -c`,
/// so embedded whitespace and metacharacters reach bash intact.
pub fn wrap_command(command: &str) -> String {
    format!("sudo -S bash -c {}", shell_words::quote(command))
}

/// Why an elevated command did not succeed.
#[derive(Debug, Error)]
pub enum ElevationError {
    /// The channel could not run the command at all.
    #[error("{0}")]
    Channel(#[from] SessionError),
    /// sudo refused the password. Carries the captured standard error.
    #[error("{stderr}")]
    Rejected { stderr: String },
    /// The command exited non-zero, or ended without an exit status (e.g.
    /// killed by a signal). Carries the captured standard error.
    #[error("{stderr}")]
    Failed {
        exit_status: Option<u32>,
        stderr: String,
    },
}

impl ElevationError {
    /// Text placed after `ERROR: ` in a transcript.
    pub fn diagnostic(&self) -> String {
        self.to_string().trim_end().to_string()
    }
}

/// Run `command` with elevated privileges on `channel`.
///
/// Returns the trimmed standard output on a zero exit status. On a non-zero
/// exit only the error is returned; partial stdout is discarded.
pub async fn elevate(
    channel: &mut dyn ExecChannel,
    password: &SudoPassword,
    command: &str,
) -> Result<String, ElevationError> {
    channel.start(&wrap_command(command)).await?;

    let line = password.with_newline();
    channel.write_stdin(&line).await?;
    channel.close_stdin().await?;

    let output = channel.wait().await?;
    if output.exit_status == Some(0) {
        return Ok(output.stdout_string().trim().to_string());
    }

    let stderr = output.stderr_string();
    if output.exit_status.is_none() && stderr.trim().is_empty() {
        return Err(SessionError::NoExitStatus.into());
    }
    if contains_sudo_failure(&stderr) {
        return Err(ElevationError::Rejected { stderr });
    }
    Err(ElevationError::Failed {
        exit_status: output.exit_status,
        stderr,
    })
}
