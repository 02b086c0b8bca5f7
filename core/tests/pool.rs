//! Worker pool behaviour under load and shutdown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use rideem::{Error, HttpRequest, HttpResponse, Result, Rideem, Task, Transport, WorkerPool};

/// A task that reports when it starts and then waits to be released.
fn gated(started: Sender<()>, release: Receiver<()>) -> Task<&'static str> {
    Task::new("gated", move || {
        let _ = started.send(());
        let _ = release.recv();
        Ok("released")
    })
}

fn counting(runs: &Arc<AtomicUsize>) -> Task<usize> {
    let runs = Arc::clone(runs);
    Task::new("counting", move || Ok(runs.fetch_add(1, Ordering::SeqCst)))
}

#[test]
fn submissions_beyond_capacity_queue_and_complete() {
    let pool = WorkerPool::new(3).unwrap();
    let runs = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..40).map(|_| pool.submit(counting(&runs))).collect();
    let mut seen: Vec<usize> = handles.into_iter().map(|h| h.wait().unwrap()).collect();

    seen.sort();
    assert_eq!(seen, (0..40).collect::<Vec<_>>());
    assert_eq!(pool.queued(), 0);
}

#[test]
fn shutdown_cancels_work_that_has_not_started() {
    let pool = WorkerPool::new(2).unwrap();
    let (started_tx, started_rx) = bounded(2);
    let (release_tx, release_rx) = bounded(2);
    let runs = Arc::new(AtomicUsize::new(0));

    let running: Vec<_> = (0..2)
        .map(|_| pool.submit(gated(started_tx.clone(), release_rx.clone())))
        .collect();
    for _ in 0..2 {
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }

    let queued: Vec<_> = (0..5).map(|_| pool.submit(counting(&runs))).collect();
    assert_eq!(pool.queued(), 5);

    pool.shutdown();
    assert_eq!(pool.queued(), 0);
    for handle in &queued {
        assert!(handle.is_finished());
    }

    for _ in 0..2 {
        release_tx.send(()).unwrap();
    }
    for handle in running {
        assert_eq!(handle.wait().unwrap(), "released");
    }
    for handle in queued {
        assert!(matches!(handle.wait(), Err(Error::Cancelled)));
    }
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn dropping_the_pool_finishes_queued_work() {
    let pool = WorkerPool::new(1).unwrap();
    let runs = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..5).map(|_| pool.submit(counting(&runs))).collect();
    drop(pool);

    for handle in handles {
        assert!(handle.wait().is_ok());
    }
    assert_eq!(runs.load(Ordering::SeqCst), 5);
}

/// Transport that blocks every call until released, then replies `{"count":1}`.
struct GatedTransport {
    started: Sender<()>,
    release: Receiver<()>,
}

impl Transport for GatedTransport {
    fn send(&self, _request: &HttpRequest) -> Result<HttpResponse> {
        let _ = self.started.send(());
        let _ = self.release.recv();
        Ok(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: Some(r#"{"count":1}"#.to_string()),
        })
    }
}

#[test]
fn client_shutdown_cancels_pending_requests() {
    let (started_tx, started_rx) = bounded(8);
    let (release_tx, release_rx) = bounded(8);
    let transport = Arc::new(GatedTransport {
        started: started_tx,
        release: release_rx,
    });
    let rideem = Rideem::new()
        .with_host("http://test")
        .with_transport(transport)
        .with_pool(Arc::new(WorkerPool::new(1).unwrap()));

    let first = rideem.spawn(rideem.request("demo"));
    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let second = rideem.spawn(rideem.request("demo"));

    rideem.shutdown();
    release_tx.send(()).unwrap();

    assert_eq!(first.wait().unwrap(), 1);
    assert!(matches!(second.wait(), Err(Error::Cancelled)));
    assert!(started_rx.try_recv().is_err(), "cancelled request never reached the transport");
}
