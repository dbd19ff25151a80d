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

//! The ordered list of commands run on every host.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Batch name used for a command given on the command line.
pub const SINGLE_COMMAND_BATCH_NAME: &str = "cmd";

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("no command specified")]
    NoCommand,
    #[error("failed to read command file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("command file {} contains no commands", .0.display())]
    Empty(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBatch {
    commands: Vec<String>,
    /// Used in archive file names.
    name: String,
}

impl CommandBatch {
    /// A batch holding a single command.
    pub fn from_command(command: &str) -> Result<Self, BatchError> {
        if command.trim().is_empty() {
            return Err(BatchError::NoCommand);
        }
        Ok(Self {
            commands: vec![command.to_string()],
            name: SINGLE_COMMAND_BATCH_NAME.to_string(),
        })
    }

    /// Read a newline separated command file. The batch is named after the
    /// file's base name.
    pub async fn from_file(path: &Path) -> Result<Self, BatchError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| BatchError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                })?;

        let commands = parse_commands(&content);
        if commands.is_empty() {
            return Err(BatchError::Empty(path.to_path_buf()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| SINGLE_COMMAND_BATCH_NAME.to_string());

        Ok(Self { commands, name })
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Trimmed commands in order, without blank lines and `#` comments.
pub fn parse_commands(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
