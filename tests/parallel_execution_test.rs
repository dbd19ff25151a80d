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

//! End-to-end runs of the parallel executor against fake hosts.

mod common;

use common::{FakeConnector, FakeResolver, SharedBuffer};
use psudo::executor::{
    ArchiveConfig, ExecutionResult, HostOutcome, ParallelExecutor, ResultSink, SessionRunner,
    StepOutcome,
};
use psudo::{CommandBatch, HostTarget};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::TempDir;

fn batch(command: &str) -> CommandBatch {
    CommandBatch::from_command(command).unwrap()
}

async fn write_batch_file(dir: &TempDir, name: &str, content: &str) -> CommandBatch {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    CommandBatch::from_file(&path).await.unwrap()
}

async fn run(
    hosts: Vec<HostTarget>,
    batch: CommandBatch,
    parallel: usize,
    resolver: Arc<FakeResolver>,
    connector: Arc<FakeConnector>,
    archive: Option<ArchiveConfig>,
) -> (Vec<ExecutionResult>, String) {
    let console = SharedBuffer::default();
    let sink = Arc::new(ResultSink::new(console.clone(), archive));
    let runner = SessionRunner::new(resolver, connector);
    let results = ParallelExecutor::new(hosts, batch, parallel, runner, sink)
        .execute()
        .await;
    (results, console.contents())
}

#[tokio::test]
async fn test_unknown_alias_never_connects() {
    let resolver = Arc::new(FakeResolver::with_unknown(&["ghost"]));
    let connector = Arc::new(FakeConnector::new());

    let (results, console) = run(
        vec![HostTarget::new("ghost")],
        batch("uptime"),
        5,
        resolver,
        Arc::clone(&connector),
        None,
    )
    .await;

    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].transcript(),
        "===== [ghost] =====\nssh config error: host ghost not found in ssh config\n"
    );
    assert!(matches!(results[0].outcome, HostOutcome::ResolutionFailed(_)));
    assert!(connector.recorder.connects.lock().unwrap().is_empty());
    assert_eq!(
        console,
        "===== [ghost] =====\nssh config error: host ghost not found in ssh config\n\n"
    );
}

#[tokio::test]
async fn test_connection_failure_runs_no_commands() {
    let resolver = Arc::new(FakeResolver::default());
    let connector = Arc::new(FakeConnector::refusing(&["web1"]));

    let (results, _) = run(
        vec![HostTarget::new("web1")],
        batch("uptime"),
        5,
        resolver,
        Arc::clone(&connector),
        None,
    )
    .await;

    assert_eq!(
        results[0].transcript(),
        "===== [web1] =====\nssh connect error: connection refused\n"
    );
    assert!(connector.recorder.started.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_stops_at_first_failure() {
    let dir = TempDir::new().unwrap();
    let batch = write_batch_file(&dir, "steps.txt", "echo hi\nfalse\necho unreachable\n").await;
    let resolver = Arc::new(FakeResolver::default());
    let connector = Arc::new(FakeConnector::new());

    let (results, _) = run(
        vec![HostTarget::new("web1")],
        batch,
        5,
        resolver,
        Arc::clone(&connector),
        None,
    )
    .await;

    assert_eq!(
        results[0].transcript(),
        "===== [web1] =====\n$ echo hi\nhi\n$ false\nERROR: command failed\n"
    );
    assert!(!results[0].transcript().contains("unreachable"));
    assert!(!results[0].transcript().contains("partial"));

    let steps = results[0].steps();
    assert_eq!(steps.len(), 2);
    assert!(matches!(steps[1].outcome, StepOutcome::Failed(_)));

    let started = connector.recorder.started.lock().unwrap();
    assert_eq!(started.len(), 2);
    // Session is still closed after the abort.
    assert_eq!(connector.recorder.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_each_command_wrapped_and_fed_password() {
    let dir = TempDir::new().unwrap();
    let batch = write_batch_file(&dir, "two.txt", "echo a b\nsilent\n").await;
    let resolver = Arc::new(FakeResolver::default());
    let connector = Arc::new(FakeConnector::new());

    let (results, _) = run(
        vec![HostTarget::new("web1").with_password("s3cret")],
        batch,
        5,
        resolver,
        Arc::clone(&connector),
        None,
    )
    .await;

    assert_eq!(
        results[0].transcript(),
        "===== [web1] =====\n$ echo a b\na b\n$ silent\n"
    );
    assert!(results[0].is_success());

    let started = connector.recorder.started.lock().unwrap();
    assert_eq!(started[0].1, "sudo -S bash -c 'echo a b'");
    assert_eq!(started[1].1, "sudo -S bash -c silent");

    let stdin = connector.recorder.stdin.lock().unwrap();
    assert_eq!(stdin.as_slice(), [b"s3cret\n".to_vec(), b"s3cret\n".to_vec()]);
    assert_eq!(connector.recorder.eof_count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_port_override_reaches_resolver() {
    let resolver = Arc::new(FakeResolver::default());
    let connector = Arc::new(FakeConnector::new());

    run(
        vec![HostTarget::new("web1").with_port(2222), HostTarget::new("web2")],
        batch("uptime"),
        1,
        Arc::clone(&resolver),
        connector,
        None,
    )
    .await;

    let mut calls = resolver.calls.lock().unwrap().clone();
    calls.sort();
    assert_eq!(
        calls,
        vec![
            ("web1".to_string(), Some(2222)),
            ("web2".to_string(), None)
        ]
    );
}

#[tokio::test]
async fn test_parallelism_is_bounded() {
    let hosts: Vec<_> = (0..12).map(|i| HostTarget::new(format!("node{i}"))).collect();
    let resolver = Arc::new(FakeResolver::default());
    let connector = Arc::new(FakeConnector::new());

    let (results, _) = run(hosts, batch("sleep"), 3, resolver, Arc::clone(&connector), None).await;

    assert_eq!(results.len(), 12);
    let max_active = connector.recorder.max_active.load(Ordering::SeqCst);
    assert!(max_active <= 3, "max_active = {max_active}");
    assert!(max_active > 1, "hosts never overlapped");
    assert_eq!(connector.recorder.closed.load(Ordering::SeqCst), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_transcripts_never_interleave() {
    let dir = TempDir::new().unwrap();
    let batch = write_batch_file(
        &dir,
        "noisy.txt",
        "echo line one\necho line two\necho line three\n",
    )
    .await;
    let hosts: Vec<_> = (0..16).map(|i| HostTarget::new(format!("h{i}"))).collect();
    let resolver = Arc::new(FakeResolver::default());
    let connector = Arc::new(FakeConnector::new());

    let (results, console) = run(hosts, batch, 8, resolver, connector, None).await;

    let blocks: Vec<&str> = console
        .split("\n\n")
        .filter(|b| !b.is_empty())
        .collect();
    assert_eq!(blocks.len(), 16);
    for block in blocks {
        let expected = results
            .iter()
            .map(|r| r.transcript())
            .find(|t| t.trim_end() == block)
            .unwrap_or_else(|| panic!("block is not a whole transcript: {block:?}"));
        assert!(expected.starts_with("===== [h"));
    }
}

#[tokio::test]
async fn test_results_follow_host_list_order() {
    let hosts: Vec<_> = ["c", "a", "b"].iter().map(|h| HostTarget::new(*h)).collect();
    let resolver = Arc::new(FakeResolver::with_unknown(&["a"]));
    let connector = Arc::new(FakeConnector::new());

    let (results, _) = run(hosts, batch("uptime"), 2, resolver, connector, None).await;

    let aliases: Vec<_> = results.iter().map(|r| r.alias.as_str()).collect();
    assert_eq!(aliases, ["c", "a", "b"]);
}

#[tokio::test]
async fn test_archive_files_per_host() {
    let dir = TempDir::new().unwrap();
    let batch = write_batch_file(&dir, "deploy.txt", "echo deployed\n").await;
    let log_dir = dir.path().join("logs");
    let archive = ArchiveConfig::new(&log_dir, batch.name());
    let resolver = Arc::new(FakeResolver::default());
    let connector = Arc::new(FakeConnector::new());

    let (results, _) = run(
        vec![HostTarget::new("web1"), HostTarget::new("web2")],
        batch,
        2,
        resolver,
        connector,
        Some(archive),
    )
    .await;

    let mut names: Vec<String> = std::fs::read_dir(&log_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 2);

    for (name, alias) in names.iter().zip(["web1", "web2"]) {
        let prefix = format!("{alias}-deploy.txt-");
        let stamp = name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(".log"))
            .unwrap_or_else(|| panic!("unexpected archive name {name}"));
        // YYYYmmdd-HHMMSS
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.as_bytes()[8], b'-');
        assert!(stamp
            .chars()
            .enumerate()
            .all(|(i, c)| i == 8 || c.is_ascii_digit()));

        let content = std::fs::read_to_string(log_dir.join(name)).unwrap();
        let result = results.iter().find(|r| r.alias == alias).unwrap();
        assert_eq!(content, result.transcript());
    }
}

#[tokio::test]
async fn test_rerun_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let batch = write_batch_file(&dir, "b.txt", "echo one\nuptime\nfalse\n").await;
    let hosts = || vec![HostTarget::new("web1"), HostTarget::new("ghost"), HostTarget::new("web2")];

    let (first, _) = run(
        hosts(),
        batch.clone(),
        2,
        Arc::new(FakeResolver::with_unknown(&["ghost"])),
        Arc::new(FakeConnector::new()),
        None,
    )
    .await;
    let (second, _) = run(
        hosts(),
        batch,
        2,
        Arc::new(FakeResolver::with_unknown(&["ghost"])),
        Arc::new(FakeConnector::new()),
        None,
    )
    .await;

    let first: Vec<String> = first.iter().map(ExecutionResult::transcript).collect();
    let second: Vec<String> = second.iter().map(ExecutionResult::transcript).collect();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_crashed_host_task_still_emits_block() {
    let dir = TempDir::new().unwrap();
    let log_dir = dir.path().join("logs");
    let resolver = Arc::new(FakeResolver::crashing_on(&["boom"]));
    let connector = Arc::new(FakeConnector::new());

    let (results, console) = run(
        vec![HostTarget::new("web1"), HostTarget::new("boom")],
        batch("uptime"),
        2,
        resolver,
        connector,
        Some(ArchiveConfig::new(&log_dir, "cmd")),
    )
    .await;

    assert_eq!(results.len(), 2);
    assert!(results[0].is_success());
    assert_eq!(results[1].alias, "boom");
    assert!(matches!(results[1].outcome, HostOutcome::Aborted(_)));

    let transcript = results[1].transcript();
    assert!(transcript.starts_with("===== [boom] =====\nERROR: task failed"));
    assert!(console.contains(&format!("{transcript}\n")));
    assert!(console.contains("===== [web1] =====\n$ uptime\nran uptime\n"));

    let archived = std::fs::read_dir(&log_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("boom-cmd-"))
        .count();
    assert_eq!(archived, 1);
}

#[tokio::test]
async fn test_empty_host_list_completes() {
    let (results, console) = run(
        Vec::new(),
        batch("uptime"),
        5,
        Arc::new(FakeResolver::default()),
        Arc::new(FakeConnector::new()),
        None,
    )
    .await;
    assert!(results.is_empty());
    assert!(console.is_empty());
}
