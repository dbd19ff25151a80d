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

//! Runs a command batch on one host over one session.

use std::sync::Arc;

use crate::batch::CommandBatch;
use crate::hosts::HostTarget;
use crate::security::{elevate, ElevationError};
use crate::ssh::{Connector, RemoteSession, TargetResolver};

use super::result_types::{CommandStep, ExecutionResult, HostOutcome, StepOutcome};

/// Resolves, connects and runs the batch for a single host.
#[derive(Clone)]
pub struct SessionRunner {
    resolver: Arc<dyn TargetResolver>,
    connector: Arc<dyn Connector>,
}

impl SessionRunner {
    pub fn new(resolver: Arc<dyn TargetResolver>, connector: Arc<dyn Connector>) -> Self {
        Self {
            resolver,
            connector,
        }
    }

    pub async fn run(&self, host: &HostTarget, batch: &CommandBatch) -> ExecutionResult {
        let params = match self.resolver.resolve(&host.alias, host.port_override).await {
            Ok(params) => params,
            Err(e) => {
                tracing::warn!("[{}] Resolution failed: {}", host.alias, e);
                return ExecutionResult::new(&host.alias, HostOutcome::ResolutionFailed(e));
            }
        };

        let mut session = match self.connector.connect(&params).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("[{}] Connection to {} failed: {}", host.alias, params.target(), e);
                return ExecutionResult::new(&host.alias, HostOutcome::ConnectionFailed(e));
            }
        };
        tracing::info!("[{}] Connected to {}", host.alias, params.target());

        let steps = run_batch(session.as_mut(), host, batch).await;

        if let Err(e) = session.close().await {
            tracing::debug!("[{}] Error while closing session: {}", host.alias, e);
        }

        ExecutionResult::new(&host.alias, HostOutcome::Completed { steps })
    }
}

/// Run each command on a fresh channel, stopping at the first failure.
async fn run_batch(
    session: &mut dyn RemoteSession,
    host: &HostTarget,
    batch: &CommandBatch,
) -> Vec<CommandStep> {
    let mut steps = Vec::with_capacity(batch.len());

    for command in batch.commands() {
        tracing::debug!("[{}] Running: {}", host.alias, command);

        let outcome = match session.open_channel().await {
            Ok(mut channel) => elevate(channel.as_mut(), &host.password, command).await,
            Err(e) => Err(ElevationError::Channel(e)),
        };

        let failed = outcome.is_err();
        let outcome = match outcome {
            Ok(stdout) => StepOutcome::Succeeded(stdout),
            Err(e) => {
                tracing::warn!("[{}] Command failed: {}: {}", host.alias, command, e.diagnostic());
                StepOutcome::Failed(e)
            }
        };
        steps.push(CommandStep {
            command: command.clone(),
            outcome,
        });

        if failed {
            break;
        }
    }

    steps
}
