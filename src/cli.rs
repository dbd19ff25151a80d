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

use clap::Parser;
use std::path::PathBuf;

use crate::batch::{BatchError, CommandBatch};
use crate::executor::ArchiveConfig;
use crate::ssh::known_hosts::StrictHostKeyChecking;

#[derive(Parser, Debug)]
#[command(
    name = "psudo",
    version,
    about = "Parallel sudo - run commands with sudo on many SSH hosts at once",
    long_about = "psudo runs a command, or a file of commands, as root on every host in a host list.\nHost aliases are resolved through your SSH client config (HostName, User, Port, IdentityFile).\nEach command is run through `sudo -S` with the host's password from the host list.\nOne block of output is printed per host; a host stops at its first failing command.",
    after_help = "EXAMPLES:\n  Single command:          psudo -f hosts.yaml 'systemctl restart nginx'\n  Command file, 10 wide:   psudo -f hosts.yaml -c deploy.txt -p 10\n  Archive transcripts:     psudo --log 'uptime'"
)]
pub struct Cli {
    #[arg(
        short = 'f',
        long,
        default_value = "hosts.yaml",
        help = "Host list file (YAML)"
    )]
    pub hosts: PathBuf,

    #[arg(
        short = 'c',
        long,
        help = "Command file, one command per line\nBlank lines and lines starting with '#' are ignored"
    )]
    pub commands: Option<PathBuf>,

    #[arg(
        short = 'p',
        long,
        default_value = "5",
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Maximum number of hosts worked on at once"
    )]
    pub parallel: u32,

    #[arg(long, help = "Also write each host's output to a file under --log-dir")]
    pub log: bool,

    #[arg(
        long,
        default_value = "./logs",
        help = "Directory for --log output"
    )]
    pub log_dir: PathBuf,

    #[arg(
        short = 'F',
        long = "ssh-config",
        help = "Use alternative SSH configuration file [default: ~/.ssh/config]"
    )]
    pub ssh_config: Option<PathBuf>,

    #[arg(
        long = "strict-host-key-checking",
        default_value = "accept-new",
        help = "Host key checking mode (yes/no/accept-new)"
    )]
    pub strict_host_key_checking: StrictHostKeyChecking,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    #[arg(
        trailing_var_arg = true,
        help = "Command to run when --commands is not given (the last argument is used)"
    )]
    pub command_args: Vec<String>,
}

impl Cli {
    /// The single command from the command line, if any.
    pub fn single_command(&self) -> Option<&str> {
        self.command_args.last().map(String::as_str)
    }

    /// Load the command batch: `--commands` wins over a positional command.
    pub async fn load_batch(&self) -> Result<CommandBatch, BatchError> {
        match &self.commands {
            Some(path) => CommandBatch::from_file(path).await,
            None => match self.single_command() {
                Some(command) => CommandBatch::from_command(command),
                None => Err(BatchError::NoCommand),
            },
        }
    }

    pub fn archive_config(&self, batch: &CommandBatch) -> Option<ArchiveConfig> {
        self.log
            .then(|| ArchiveConfig::new(&self.log_dir, batch.name()))
    }
}
