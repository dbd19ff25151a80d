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

//! Result types for one host's run and their text rendering.

use std::fmt::Write as _;

use crate::security::ElevationError;
use crate::ssh::{ResolveError, SessionError};

/// How one command in the batch ended.
#[derive(Debug)]
pub enum StepOutcome {
    /// Zero exit status. Holds trimmed standard output.
    Succeeded(String),
    Failed(ElevationError),
}

#[derive(Debug)]
pub struct CommandStep {
    pub command: String,
    pub outcome: StepOutcome,
}

impl CommandStep {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, StepOutcome::Succeeded(_))
    }
}

/// What happened on one host.
#[derive(Debug)]
pub enum HostOutcome {
    /// The alias could not be turned into connection parameters.
    ResolutionFailed(ResolveError),
    /// Connecting or authenticating failed; no command ran.
    ConnectionFailed(SessionError),
    /// The batch ran. Only the last step can be a failure.
    Completed { steps: Vec<CommandStep> },
    /// The host task never ran to completion.
    Aborted(String),
}

/// Result of running the batch on a single host.
#[derive(Debug)]
pub struct ExecutionResult {
    pub alias: String,
    pub outcome: HostOutcome,
}

impl ExecutionResult {
    pub fn new(alias: impl Into<String>, outcome: HostOutcome) -> Self {
        Self {
            alias: alias.into(),
            outcome,
        }
    }

    /// True when every command in the batch exited zero.
    pub fn is_success(&self) -> bool {
        match &self.outcome {
            HostOutcome::Completed { steps } => steps.iter().all(CommandStep::is_success),
            _ => false,
        }
    }

    pub fn steps(&self) -> &[CommandStep] {
        match &self.outcome {
            HostOutcome::Completed { steps } => steps,
            _ => &[],
        }
    }

    /// The banner line heading every transcript.
    pub fn banner(alias: &str) -> String {
        format!("===== [{alias}] =====")
    }

    /// Render the human-readable transcript. Every line ends with `\n`.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", Self::banner(&self.alias));

        match &self.outcome {
            HostOutcome::ResolutionFailed(e) => {
                let _ = writeln!(out, "ssh config error: {e}");
            }
            HostOutcome::ConnectionFailed(e) => {
                let _ = writeln!(out, "ssh connect error: {e}");
            }
            HostOutcome::Aborted(reason) => {
                let _ = writeln!(out, "ERROR: {reason}");
            }
            HostOutcome::Completed { steps } => {
                for step in steps {
                    let _ = writeln!(out, "$ {}", step.command);
                    match &step.outcome {
                        StepOutcome::Succeeded(stdout) => {
                            if !stdout.is_empty() {
                                let _ = writeln!(out, "{stdout}");
                            }
                        }
                        StepOutcome::Failed(e) => {
                            let _ = writeln!(out, "ERROR: {}", e.diagnostic());
                        }
                    }
                }
            }
        }

        out
    }
}
