// tests/end_to_end.rs

#![cfg(unix)]

mod common;
use crate::common::{init_tracing, pattern_in, touch, wait_until, with_timeout};

use std::time::Duration;

use tempfile::tempdir;
use tokio::sync::oneshot;

use gazer::config::Config;
use gazer::engine::Gazer;
use gazer_test_utils::builders::{CommandEntryBuilder, ConfigBuilder};

#[tokio::test]
async fn a_burst_of_writes_runs_the_command_once() {
    init_tracing();
    let tmp = tempdir().unwrap();
    let dir = tmp.path().canonicalize().unwrap();
    let gazer = Gazer::new(&[pattern_in(&dir, "*.txt")], 1000).unwrap();

    let (tx, rx) = oneshot::channel::<()>();
    let loop_gazer = gazer.clone();
    let task = tokio::spawn(async move {
        loop_gazer
            .run_until(Config::fixed_command("true"), 10_000, false, async {
                let _ = rx.await;
            })
            .await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let file = dir.join("a.txt");
    for _ in 0..3 {
        touch(&file);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert!(wait_until(|| gazer.invoke_count() >= 1, Duration::from_secs(3)).await);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(gazer.invoke_count(), 1);

    let _ = tx.send(());
    with_timeout(task).await.unwrap().unwrap();
    gazer.close();
}

#[tokio::test]
async fn configured_command_runs_with_file_parameters() {
    init_tracing();
    let tmp = tempdir().unwrap();
    let dir = tmp.path().canonicalize().unwrap();
    let gazer = Gazer::new(&[pattern_in(&dir, "*.txt")], 1000).unwrap();
    let config = ConfigBuilder::new()
        .with_command(
            CommandEntryBuilder::new(r#"sh -c "echo {{base0}} > {{dir}}/marker.out""#)
                .ext(".txt")
                .build(),
        )
        .build();

    let (tx, rx) = oneshot::channel::<()>();
    let loop_gazer = gazer.clone();
    let task = tokio::spawn(async move {
        loop_gazer
            .run_until(config, 10_000, false, async {
                let _ = rx.await;
            })
            .await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    touch(dir.join("note.txt"));
    touch(dir.join("ignored.md"));

    let marker = dir.join("marker.out");
    let written = || {
        std::fs::read_to_string(&marker)
            .map(|contents| contents.trim() == "note")
            .unwrap_or(false)
    };
    assert!(wait_until(written, Duration::from_secs(3)).await);

    let _ = tx.send(());
    with_timeout(task).await.unwrap().unwrap();
    gazer.close();
}

#[tokio::test]
async fn restart_replaces_a_long_running_command() {
    init_tracing();
    let tmp = tempdir().unwrap();
    let dir = tmp.path().canonicalize().unwrap();
    let gazer = Gazer::new(&[pattern_in(&dir, "*.txt")], 1000).unwrap();
    let config = ConfigBuilder::new()
        .quiet()
        .with_command(
            CommandEntryBuilder::new(r#"sh -c "echo started >> {{dir}}/runs.log; exec sleep 5""#)
                .ext(".txt")
                .build(),
        )
        .build();

    let (tx, rx) = oneshot::channel::<()>();
    let loop_gazer = gazer.clone();
    let task = tokio::spawn(async move {
        loop_gazer
            .run_until(config, 10_000, true, async {
                let _ = rx.await;
            })
            .await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let runs = dir.join("runs.log");
    let started = |n: usize| {
        std::fs::read_to_string(&runs)
            .map(|contents| contents.lines().count() >= n)
            .unwrap_or(false)
    };

    let file = dir.join("a.txt");
    touch(&file);
    assert!(wait_until(|| started(1), Duration::from_secs(3)).await);

    tokio::time::sleep(Duration::from_millis(300)).await;
    touch(&file);
    assert!(wait_until(|| started(2), Duration::from_secs(3)).await);
    assert_eq!(gazer.invoke_count(), 2);

    let _ = tx.send(());
    with_timeout(task).await.unwrap().unwrap();
    gazer.close();
}
