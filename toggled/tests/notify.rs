use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};
use toggled::{
    Event, EventKind, NO_FALLBACK, Toggles, listeners::LoggingListener,
    testing::RecordingListener,
};

#[test]
fn test_every_listener_receives_each_event_once() {
    let toggles = Toggles::new();
    let recorders: Vec<_> = (0..5).map(|_| RecordingListener::new()).collect();
    for recorder in &recorders {
        toggles.add_listener(recorder.clone());
    }

    toggles.notify_all(Event::new(EventKind::OperationFaulted, "test1event"));
    toggles.notify_all(Event::new(EventKind::OperationNotFound, "test2event"));
    toggles.wait();

    for recorder in &recorders {
        let mut payloads: Vec<_> = recorder
            .events()
            .iter()
            .map(|event| event.payload().to_string())
            .collect();
        payloads.sort();
        assert_eq!(payloads, ["test1event", "test2event"]);
    }
}

#[test]
fn test_wait_is_a_barrier_for_all_notifiers() {
    let toggles = Toggles::new();
    let slow = RecordingListener::with_delay(Duration::from_millis(30));
    toggles.add_listener(slow.clone());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let toggles = toggles.clone();
            thread::spawn(move || {
                toggles.notify_all(Event::new(
                    EventKind::FeatureNotRegistered,
                    format!("event {i}"),
                ));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    toggles.wait();

    assert_eq!(slow.count(), 4);
    assert_eq!(toggles.notifier().in_flight(), 0);
}

#[test]
fn test_listeners_run_concurrently() {
    let toggles = Toggles::new();
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let running = Arc::clone(&running);
        let peak = Arc::clone(&peak);
        toggles.add_listener(move |_: &Event| {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            running.fetch_sub(1, Ordering::SeqCst);
        });
    }

    toggles.notify_all(Event::new(EventKind::OperationFaulted, "x"));
    toggles.wait();

    assert!(peak.load(Ordering::SeqCst) > 1);
    assert_eq!(running.load(Ordering::SeqCst), 0);
}

#[test]
fn test_listener_may_notify_from_delivery() {
    let toggles = Toggles::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let inner = toggles.clone();
    let sink = Arc::clone(&seen);
    toggles.add_listener(move |event: &Event| {
        sink.lock().unwrap().push(event.kind());
        if event.kind() == EventKind::OperationFaulted {
            inner.notify_all(Event::new(EventKind::OperationNotFound, "follow-up"));
        }
    });

    toggles.notify_all(Event::new(EventKind::OperationFaulted, "first"));
    // The follow-up is counted in flight before the first delivery
    // finishes, so one wait covers both.
    toggles.wait();

    let mut seen = seen.lock().unwrap().clone();
    seen.sort_by_key(|kind| kind.as_str());
    assert_eq!(seen, [EventKind::OperationFaulted, EventKind::OperationNotFound]);
}

#[test]
fn test_logging_listener_alongside_recorder() {
    let recorder = RecordingListener::new();
    let toggles = Toggles::builder()
        .listener(LoggingListener::named("test"))
        .listener(recorder.clone())
        .build();

    toggles.invoke(toggled::Context::none(), "missing", "op", NO_FALLBACK, &[]);
    toggles.wait();

    assert_eq!(toggles.notifier().listener_count(), 2);
    assert_eq!(recorder.kinds(), [EventKind::FeatureNotRegistered]);
}
