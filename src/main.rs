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

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Instant;

use psudo::{
    cli::Cli,
    executor::{ParallelExecutor, ResultSink, RunSummary, SessionRunner},
    hosts::load_host_list,
    ssh::{RusshConnector, SshConfigResolver},
    utils::init_logging,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Load-time failures abort before any host task starts.
    let hosts = load_host_list(&cli.hosts).await?;
    let batch = cli.load_batch().await.context("Failed to load commands")?;

    if hosts.is_empty() {
        tracing::warn!("Host list {:?} contains no hosts", cli.hosts);
    }

    tracing::info!(
        "Running {} command(s) from '{}' on {} host(s), {} at a time",
        batch.len(),
        batch.name(),
        hosts.len(),
        cli.parallel
    );
    if cli.strict_host_key_checking == psudo::ssh::StrictHostKeyChecking::No {
        tracing::warn!("Host key verification is disabled");
    }

    let runner = SessionRunner::new(
        Arc::new(SshConfigResolver::new(cli.ssh_config.clone())),
        Arc::new(RusshConnector::new(cli.strict_host_key_checking)),
    );
    let sink = Arc::new(ResultSink::stdout(cli.archive_config(&batch)));

    let started = Instant::now();
    let executor = ParallelExecutor::new(hosts, batch, cli.parallel as usize, runner, sink);
    let results = executor.execute().await;

    // Per-host failures are reported in transcripts and never change the exit status.
    let summary = RunSummary::from_results(&results);
    eprintln!("{} in {:.2} s", summary.colored(), started.elapsed().as_secs_f64());

    Ok(())
}
