use plexus::{
    DispatchError, DispatchExecutor, Dispatcher, ExecutorKind, PooledExecutor, listener_fn,
    testing::CountingListener,
};
use std::{
    sync::{
        Arc, Barrier, Mutex, OnceLock, Weak,
        atomic::{AtomicUsize, Ordering},
        mpsc,
    },
    thread,
    time::Duration,
};

mod common;
use common::{Numbered, SequenceRecorder, numbered};

const THREADS: usize = 10;
const EVENTS_PER_THREAD: usize = 10;
const LISTENERS: usize = 5;

fn publish_from_threads(dispatcher: &Arc<Dispatcher>) {
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let dispatcher = dispatcher.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for i in 0..EVENTS_PER_THREAD {
                    dispatcher.publish(numbered(t * EVENTS_PER_THREAD + i)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

fn assert_every_event_saw_every_listener_in_order(recorder: &SequenceRecorder) {
    let total = THREADS * EVENTS_PER_THREAD;
    let per_listener = recorder.per_listener();
    assert_eq!(per_listener.len(), LISTENERS);
    for count in per_listener.values() {
        assert_eq!(*count, total);
    }

    let per_event = recorder.per_event();
    assert_eq!(per_event.len(), total);
    let expected: Vec<usize> = (0..LISTENERS).collect();
    for order in per_event.values() {
        assert_eq!(order, &expected);
    }
}

#[test]
fn test_concurrent_publish_direct() {
    let recorder = SequenceRecorder::default();
    let dispatcher = Arc::new(Dispatcher::direct());
    // Register out of priority order.
    for index in [3, 0, 4, 1, 2] {
        dispatcher
            .add_listener(recorder.listener(index, index as i32))
            .unwrap();
    }

    publish_from_threads(&dispatcher);
    assert_every_event_saw_every_listener_in_order(&recorder);
}

#[test]
fn test_concurrent_publish_pooled_drains_on_shutdown() {
    let recorder = SequenceRecorder::default();
    let dispatcher = Arc::new(Dispatcher::pooled(4).unwrap());
    assert_eq!(dispatcher.executor().kind, ExecutorKind::Pooled);
    for index in 0..LISTENERS {
        dispatcher
            .add_listener(recorder.listener(index, index as i32))
            .unwrap();
    }

    publish_from_threads(&dispatcher);
    dispatcher.shutdown();
    assert_every_event_saw_every_listener_in_order(&recorder);
}

#[test]
fn test_pooled_publish_returns_before_listeners_run() {
    let dispatcher = Dispatcher::pooled(2).unwrap();
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    let finished = Arc::new(AtomicUsize::new(0));

    let done = finished.clone();
    let started_tx = Mutex::new(started_tx);
    dispatcher
        .add_listener(listener_fn(move |_: &Numbered| {
            started_tx.lock().unwrap().send(()).ok();
            // Bounded so a regression fails the assertions instead of hanging.
            release_rx
                .lock()
                .unwrap()
                .recv_timeout(Duration::from_secs(10))
                .ok();
            done.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .unwrap();

    dispatcher.publish(numbered(0)).unwrap();
    started_rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert_eq!(finished.load(Ordering::SeqCst), 0);

    release_tx.send(()).unwrap();
    dispatcher.shutdown();
    assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shutdown_from_own_pool_worker_returns() {
    let dispatcher = Arc::new(Dispatcher::pooled(2).unwrap());
    let handle: Arc<OnceLock<Weak<Dispatcher>>> = Arc::new(OnceLock::new());
    handle.set(Arc::downgrade(&dispatcher)).unwrap();
    let (done_tx, done_rx) = mpsc::channel();
    let done_tx = Mutex::new(done_tx);

    let slot = handle.clone();
    dispatcher
        .add_listener(listener_fn(move |_: &Numbered| {
            if let Some(dispatcher) = slot.get().and_then(Weak::upgrade) {
                dispatcher.shutdown();
                done_tx.lock().unwrap().send(dispatcher.is_shutdown()).ok();
            }
            Ok(())
        }))
        .unwrap();

    dispatcher.publish(numbered(0)).unwrap();
    assert!(done_rx.recv_timeout(Duration::from_secs(10)).unwrap());
    assert!(dispatcher.is_shutdown());
    assert!(matches!(dispatcher.publish(numbered(1)), Err(DispatchError::Closed)));
}

#[test]
fn test_registration_races_with_publish() {
    let counter = CountingListener::new();
    let dispatcher = Arc::new(Dispatcher::direct());
    dispatcher.add_listener(counter.subscribe::<Numbered>(0)).unwrap();

    let churn = {
        let dispatcher = dispatcher.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                let transient = listener_fn(|_: &Numbered| Ok(()));
                dispatcher.add_listener(transient.clone()).unwrap();
                dispatcher.remove_listener(&transient).unwrap();
            }
        })
    };
    for id in 0..200 {
        dispatcher.publish(numbered(id)).unwrap();
    }
    churn.join().unwrap();

    assert_eq!(counter.count(), 200);
    assert_eq!(dispatcher.all_event_listeners().listener_count(), 1);
}

#[test]
fn test_owned_pool_is_shut_down_with_dispatcher() {
    let dispatcher = Dispatcher::builder().pooled(2).build().unwrap();
    let counter = CountingListener::new();
    dispatcher.add_listener(counter.subscribe::<Numbered>(0)).unwrap();
    for id in 0..20 {
        dispatcher.publish(numbered(id)).unwrap();
    }

    dispatcher.shutdown();
    assert_eq!(counter.count(), 20);
}

#[test]
fn test_external_pool_outlives_dispatcher() {
    let pool = Arc::new(PooledExecutor::new(2).unwrap());
    let dispatcher = Dispatcher::builder().executor(pool.clone()).build().unwrap();
    let counter = CountingListener::new();
    dispatcher.add_listener(counter.subscribe::<Numbered>(0)).unwrap();
    for id in 0..20 {
        dispatcher.publish(numbered(id)).unwrap();
    }

    dispatcher.shutdown();
    assert!(!pool.is_shutdown());

    pool.wait_idle();
    assert_eq!(counter.count(), 20);

    let second = Dispatcher::builder().executor(pool.clone()).build().unwrap();
    second.add_listener(counter.subscribe::<Numbered>(0)).unwrap();
    second.publish(numbered(99)).unwrap();
    pool.shutdown();
    assert_eq!(counter.count(), 21);
}
