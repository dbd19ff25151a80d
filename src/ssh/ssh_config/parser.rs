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

//! Line parser for OpenSSH client configuration files.
//!
//! Only the directives needed to reach a host are kept: `HostName`, `User`,
//! `Port` and `IdentityFile`. Everything else is skipped. `Match` blocks are
//! not evaluated and never apply.

use anyhow::{bail, Context, Result};

use super::types::{HostBlock, SshHostConfig};

pub(super) fn parse(content: &str) -> Result<Vec<HostBlock>> {
    // Directives before the first Host line apply to every host.
    let mut blocks = vec![HostBlock {
        patterns: vec!["*".to_string()],
        config: SshHostConfig::default(),
    }];
    let mut in_match_block = false;

    for (index, raw_line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (keyword, args) = split_keyword(line);
        let keyword = keyword.to_lowercase();
        let args = split_args(args);

        match keyword.as_str() {
            "host" => {
                if args.is_empty() {
                    bail!("Host directive requires at least one pattern at line {line_number}");
                }
                in_match_block = false;
                blocks.push(HostBlock {
                    patterns: args,
                    config: SshHostConfig::default(),
                });
                continue;
            }
            "match" => {
                tracing::debug!("Skipping unsupported Match block at line {}", line_number);
                in_match_block = true;
                continue;
            }
            _ => {}
        }

        if in_match_block {
            continue;
        }

        // The global block is always present, so last_mut never fails.
        let Some(block) = blocks.last_mut() else {
            continue;
        };
        let config = &mut block.config;
        let first = args.first().cloned();

        match keyword.as_str() {
            "hostname" => {
                if config.hostname.is_none() {
                    config.hostname = Some(required(first, "HostName", line_number)?);
                }
            }
            "user" => {
                if config.user.is_none() {
                    config.user = Some(required(first, "User", line_number)?);
                }
            }
            "port" => {
                let value = required(first, "Port", line_number)?;
                let port: u16 = value
                    .parse()
                    .with_context(|| format!("Invalid port '{value}' at line {line_number}"))?;
                if config.port.is_none() {
                    config.port = Some(port);
                }
            }
            "identityfile" => {
                config
                    .identity_files
                    .push(required(first, "IdentityFile", line_number)?);
            }
            "include" => {
                tracing::warn!(
                    "Include directive at line {} is not supported and was ignored",
                    line_number
                );
            }
            other => {
                tracing::trace!("Ignoring SSH config option '{}' at line {}", other, line_number);
            }
        }
    }

    Ok(blocks)
}

fn required(value: Option<String>, directive: &str, line_number: usize) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => bail!("{directive} directive requires a value at line {line_number}"),
    }
}

/// Split `Keyword value`, `Keyword=value` and `Keyword = value`.
fn split_keyword(line: &str) -> (&str, &str) {
    let end = line
        .find(|c: char| c.is_whitespace() || c == '=')
        .unwrap_or(line.len());
    let (keyword, rest) = line.split_at(end);
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('=').unwrap_or(rest).trim_start();
    (keyword, rest)
}

/// Split arguments on whitespace, honoring double quotes.
fn split_args(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in args.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}
