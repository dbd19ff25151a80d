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

use owo_colors::OwoColorize;
use std::fmt;

use super::result_types::ExecutionResult;

/// Host counts for the end-of-run summary line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_results(results: &[ExecutionResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        }
    }

    /// Summary line with ANSI colors, for a terminal.
    pub fn colored(&self) -> String {
        let failed = if self.failed > 0 {
            format!("{} failed", self.failed).red().to_string()
        } else {
            format!("{} failed", self.failed).dimmed().to_string()
        };
        format!(
            "{} {} hosts: {}, {}",
            "●".bold(),
            self.total,
            format!("{} succeeded", self.succeeded).green(),
            failed
        )
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hosts: {} succeeded, {} failed",
            self.total, self.succeeded, self.failed
        )
    }
}
