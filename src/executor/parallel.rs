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

//! Core parallel executor implementation.

use futures::future::join_all;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::{AcquireError, Semaphore};
use tokio::task::JoinError;

use crate::batch::CommandBatch;
use crate::hosts::HostTarget;

use super::output_sync::ResultSink;
use super::result_types::{ExecutionResult, HostOutcome};
use super::session_runner::SessionRunner;

/// Runs a batch on every host, at most `max_parallel` at a time.
pub struct ParallelExecutor<W: Write + Send + 'static> {
    pub(crate) hosts: Vec<HostTarget>,
    pub(crate) batch: Arc<CommandBatch>,
    pub(crate) max_parallel: usize,
    pub(crate) runner: SessionRunner,
    pub(crate) sink: Arc<ResultSink<W>>,
}

impl<W: Write + Send + 'static> ParallelExecutor<W> {
    /// `max_parallel` of 0 is treated as 1.
    pub fn new(
        hosts: Vec<HostTarget>,
        batch: CommandBatch,
        max_parallel: usize,
        runner: SessionRunner,
        sink: Arc<ResultSink<W>>,
    ) -> Self {
        Self {
            hosts,
            batch: Arc::new(batch),
            max_parallel: max_parallel.max(1),
            runner,
            sink,
        }
    }

    /// Spawn one task per host and wait for all of them.
    ///
    /// Each host's transcript is emitted through the sink as soon as that host
    /// finishes, while its slot is still held. Results come back in host list
    /// order.
    pub async fn execute(&self) -> Vec<ExecutionResult> {
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));

        let tasks: Vec<_> = self
            .hosts
            .iter()
            .map(|host| {
                let host = host.clone();
                let batch = Arc::clone(&self.batch);
                let runner = self.runner.clone();
                let sink = Arc::clone(&self.sink);
                let semaphore = Arc::clone(&semaphore);

                tokio::spawn(async move { run_host_task(host, batch, runner, sink, semaphore).await })
            })
            .collect();

        let results = join_all(tasks).await;
        self.collect_results(results).await
    }

    /// Map task results back onto the host list. A task that panicked or never
    /// got a slot still yields one result, and its transcript is emitted here.
    async fn collect_results(
        &self,
        results: Vec<Result<Result<ExecutionResult, AcquireError>, JoinError>>,
    ) -> Vec<ExecutionResult> {
        let mut collected = Vec::with_capacity(results.len());

        for (result, host) in results.into_iter().zip(&self.hosts) {
            let reason = match result {
                Ok(Ok(result)) => {
                    collected.push(result);
                    continue;
                }
                Ok(Err(e)) => format!("slot acquisition failed: {e}"),
                Err(e) => format!("task failed: {e}"),
            };

            tracing::error!("[{}] {}", host.alias, reason);
            let result = ExecutionResult::new(&host.alias, HostOutcome::Aborted(reason));
            self.sink.emit(&result.alias, &result.transcript()).await;
            collected.push(result);
        }

        collected
    }
}

async fn run_host_task<W: Write + Send>(
    host: HostTarget,
    batch: Arc<CommandBatch>,
    runner: SessionRunner,
    sink: Arc<ResultSink<W>>,
    semaphore: Arc<Semaphore>,
) -> Result<ExecutionResult, AcquireError> {
    let _permit = semaphore.acquire().await?;

    tracing::debug!("[{}] Slot acquired", host);
    let result = runner.run(&host, &batch).await;
    sink.emit(&result.alias, &result.transcript()).await;
    Ok(result)
}
