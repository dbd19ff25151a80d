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

//! Serialized transcript output for concurrently finishing hosts.
//!
//! One lock covers the whole emission: the console write and the archive
//! file write for a host complete before any other host's emission starts.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::utils::fs::sanitize_file_component;

/// Timestamp format used in archive file names (second resolution).
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Where archived transcripts go.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub dir: PathBuf,
    pub batch_name: String,
}

impl ArchiveConfig {
    pub fn new(dir: impl Into<PathBuf>, batch_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            batch_name: batch_name.into(),
        }
    }

    /// Full path of the archive file for `alias` written at `timestamp`.
    pub fn file_path(&self, alias: &str, timestamp: &DateTime<Local>) -> PathBuf {
        self.dir
            .join(archive_file_name(alias, &self.batch_name, timestamp))
    }
}

/// `{alias}-{batchName}-{YYYYmmdd-HHMMSS}.log`
pub fn archive_file_name(alias: &str, batch_name: &str, timestamp: &DateTime<Local>) -> String {
    format!(
        "{}-{}-{}.log",
        sanitize_file_component(alias),
        sanitize_file_component(batch_name),
        timestamp.format(ARCHIVE_TIMESTAMP_FORMAT)
    )
}

/// Prints transcripts and optionally archives them, one host at a time.
pub struct ResultSink<W: Write + Send> {
    console: Mutex<W>,
    archive: Option<ArchiveConfig>,
}

impl ResultSink<io::Stdout> {
    /// A sink printing to the process's standard output.
    pub fn stdout(archive: Option<ArchiveConfig>) -> Self {
        Self::new(io::stdout(), archive)
    }
}

impl<W: Write + Send> ResultSink<W> {
    pub fn new(console: W, archive: Option<ArchiveConfig>) -> Self {
        Self {
            console: Mutex::new(console),
            archive,
        }
    }

    /// Print `transcript` followed by a blank line, then archive it if enabled.
    ///
    /// Archive failures are logged and otherwise ignored.
    pub async fn emit(&self, alias: &str, transcript: &str) {
        let mut console = self.console.lock().await;

        if let Err(e) = write_block(&mut *console, transcript) {
            tracing::error!("[{}] Failed to write transcript to console: {}", alias, e);
        }

        if let Some(archive) = &self.archive {
            match write_archive(archive, alias, transcript).await {
                Ok(path) => tracing::debug!("[{}] Transcript archived to {:?}", alias, path),
                Err(e) => tracing::warn!("[{}] Failed to archive transcript: {:#}", alias, e),
            }
        }
    }

    /// Take the console writer back, e.g. to inspect captured output.
    pub fn into_inner(self) -> W {
        self.console.into_inner()
    }
}

fn write_block<W: Write>(out: &mut W, transcript: &str) -> io::Result<()> {
    out.write_all(transcript.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()
}

async fn write_archive(archive: &ArchiveConfig, alias: &str, transcript: &str) -> Result<PathBuf> {
    ensure_dir(&archive.dir).await?;

    let path = archive.file_path(alias, &Local::now());
    tokio::fs::write(&path, transcript)
        .await
        .with_context(|| format!("Failed to write archive file: {}", path.display()))?;
    Ok(path)
}

async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create archive directory: {}", dir.display()))
}
