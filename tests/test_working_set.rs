//! Locking, async execution and event monitoring of the working set.
#![cfg(feature = "srcml")]

mod common;

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use srcdata::hir::ScopeKind;
use srcdata::ide::{FindScopesByName, QueryContext, query_fn};
use srcdata::project::{FileEvent, MemoryProvider, UnitProvider};
use srcdata::{Error, LockAccess, WorkingSet, WorkingSetConfig};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use common::*;

fn method_names(ws: &WorkingSet, file: &str) -> Vec<String> {
    ws.read(None, |tree| {
        tree.iter()
            .filter(|(_, s)| s.kind == ScopeKind::Method && s.is_in_file(file))
            .map(|(_, s)| s.name.to_string())
            .collect()
    })
    .expect("readable")
}

#[test]
fn test_readers_never_see_partial_merge() {
    let first: Vec<String> = (0..20).map(|i| format!("a{i}")).collect();
    let second: Vec<String> = (0..20).map(|i| format!("b{i}")).collect();
    let first = functions("big.c", &first.iter().map(String::as_str).collect::<Vec<_>>());
    let second = functions("big.c", &second.iter().map(String::as_str).collect::<Vec<_>>());

    let ws = WorkingSet::default();
    ws.add_or_update_file(&first).expect("adds");

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..50 {
                let unit = if i % 2 == 0 { &second } else { &first };
                ws.add_or_update_file(unit).expect("updates");
            }
        });
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..200 {
                    let names = method_names(&ws, "big.c");
                    assert_eq!(names.len(), 20, "partial merge observed: {names:?}");
                    let prefix = &names[0][..1];
                    assert!(names.iter().all(|n| n.starts_with(prefix)), "mixed: {names:?}");
                }
            });
        }
    });
}

#[test]
fn test_write_times_out_while_reader_holds_lock() {
    let config = WorkingSetConfig::default().with_write_lock_timeout(Duration::from_millis(30));
    let ws = WorkingSet::new(config);
    let barrier = Barrier::new(2);

    thread::scope(|s| {
        s.spawn(|| {
            ws.read(None, |_| {
                barrier.wait();
                thread::sleep(Duration::from_millis(300));
            })
            .expect("reads");
        });

        barrier.wait();
        let err = ws
            .add_or_update_file(&functions("late.c", &["late"]))
            .expect_err("writer must time out");
        assert!(err.is_transient());
        assert!(matches!(
            err,
            Error::LockTimeout {
                access: LockAccess::Write,
                ..
            }
        ));
    });

    // Timing out is not the same as the data being absent.
    assert!(!ws.contains_file("late.c"));
    ws.add_or_update_file(&functions("late.c", &["late"]))
        .expect("succeeds once the reader is gone");
    assert_eq!(method_names(&ws, "late.c"), vec!["late"]);
}

#[tokio::test]
async fn test_execute_async_returns_owned_results() {
    let ws = Arc::new(WorkingSet::default());
    ws.add_or_update_file(&functions("lib.c", &["alpha", "beta"]))
        .expect("adds");

    let found = ws
        .execute_async(FindScopesByName::new("beta"), None, CancellationToken::new())
        .await
        .expect("query runs");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].qualified_name, "beta");
}

#[tokio::test]
async fn test_execute_async_precancelled() {
    let ws = Arc::new(WorkingSet::default());
    let token = CancellationToken::new();
    token.cancel();
    let result = ws
        .execute_async(FindScopesByName::new("x"), None, token)
        .await;
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_query_releases_read_lock() {
    let config = WorkingSetConfig::default().with_write_lock_timeout(Duration::from_secs(5));
    let ws = Arc::new(WorkingSet::new(config));
    let token = CancellationToken::new();

    let spinning = query_fn(|ctx: &QueryContext<'_>| -> srcdata::Result<()> {
        loop {
            ctx.checkpoint()?;
            thread::sleep(Duration::from_millis(1));
        }
    });
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let result = ws.execute_async(spinning, None, token).await;
    assert!(matches!(result, Err(Error::Cancelled)));

    let writer = Arc::clone(&ws);
    tokio::task::spawn_blocking(move || writer.add_or_update_file(&functions("after.c", &["after"])))
        .await
        .expect("join")
        .expect("write lock is free again");
}

#[tokio::test]
async fn test_monitor_applies_events_in_order() {
    let ws = Arc::new(WorkingSet::default());
    let provider = MemoryProvider::new();
    provider.insert(functions("a.c", &["alpha"]));
    provider.insert(functions("b.c", &["beta"]));
    provider.insert(functions("c.c", &["beta"]));
    let provider: Arc<dyn UnitProvider> = Arc::new(provider);

    let mut versions = ws.subscribe();
    let (tx, rx) = mpsc::channel(8);
    let handle = ws
        .monitor(rx, provider, CancellationToken::new())
        .expect("monitor starts");

    for event in [
        FileEvent::added("a.c"),
        FileEvent::added("b.c"),
        FileEvent::deleted("a.c"),
        FileEvent::renamed("b.c", "c.c"),
        FileEvent::modified("missing.c"),
    ] {
        tx.send(event).await.expect("monitor is listening");
    }
    drop(tx);
    handle.await.expect("monitor finishes");

    assert_eq!(ws.files().iter().map(|f| f.to_string()).collect::<Vec<_>>(), vec!["c.c"]);
    assert!(versions.has_changed().expect("sender alive"));
    assert_eq!(*versions.borrow_and_update(), ws.version());

    let stats = ws.statistics().expect("stats");
    assert_eq!(stats.file_events.added, 2);
    assert_eq!(stats.file_events.deleted, 1);
    assert_eq!(stats.file_events.renamed, 1);
    assert_eq!(stats.file_events.modified, 1);
    assert_eq!(stats.methods, 1);
}

#[tokio::test]
async fn test_stop_monitoring_ends_task() {
    let ws = Arc::new(WorkingSet::default());
    let (_tx, rx) = mpsc::channel::<FileEvent>(1);
    let provider: Arc<dyn UnitProvider> = Arc::new(MemoryProvider::new());
    let handle = ws
        .monitor(rx, provider, CancellationToken::new())
        .expect("monitor starts");

    assert!(ws.stop_monitoring());
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("monitor stops promptly")
        .expect("monitor finishes");
    assert!(!ws.stop_monitoring());

    ws.dispose();
    let (_tx, rx) = mpsc::channel::<FileEvent>(1);
    let provider: Arc<dyn UnitProvider> = Arc::new(MemoryProvider::new());
    assert!(matches!(
        ws.monitor(rx, provider, CancellationToken::new()),
        Err(Error::Disposed)
    ));
}
