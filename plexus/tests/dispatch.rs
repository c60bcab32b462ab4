use plexus::{
    DispatchError, Dispatcher, DispatcherState, EventListener, EventType, ExecutorKind,
    HIGHEST_PRECEDENCE, listener_fn,
    testing::{CountingListener, FailingListener, OrderProbe, PanickingListener, RecordingListener},
};
use std::sync::Arc;

mod common;
use common::{Numbered, TestEvent, Unrelated, numbered, test_event, type_of};

#[test]
fn test_priority_order_then_registration_order() {
    let probe = OrderProbe::new();
    let dispatcher = Dispatcher::direct();
    dispatcher.add_listener(probe.listener::<TestEvent>("p10-a", 10)).unwrap();
    dispatcher.add_listener(probe.listener::<TestEvent>("p1", 1)).unwrap();
    dispatcher.add_listener(probe.listener::<TestEvent>("p10-b", 10)).unwrap();
    dispatcher.add_listener(probe.listener::<TestEvent>("first", HIGHEST_PRECEDENCE)).unwrap();

    for _ in 0..3 {
        probe.clear();
        dispatcher.publish(test_event("x")).unwrap();
        assert_eq!(probe.order(), vec!["first", "p1", "p10-a", "p10-b"]);
    }
}

#[test]
fn test_explicit_priority_overrides_declared() {
    let probe = OrderProbe::new();
    let dispatcher = Dispatcher::direct();
    dispatcher.add_listener(probe.listener::<TestEvent>("declared-0", 0)).unwrap();
    dispatcher
        .add_listener_with_priority(probe.listener::<TestEvent>("declared-5", 5), -5)
        .unwrap();

    dispatcher.publish(test_event("x")).unwrap();
    assert_eq!(probe.order(), vec!["declared-5", "declared-0"]);
}

#[test]
fn test_supertype_listener_receives_subtype_events() {
    let base = RecordingListener::<TestEvent>::new();
    let child = RecordingListener::<Numbered>::new();
    let dispatcher = Dispatcher::direct();
    dispatcher.add_listener(base.clone().into_arc()).unwrap();
    dispatcher.add_listener(child.clone().into_arc()).unwrap();

    dispatcher.publish(numbered(7)).unwrap();
    dispatcher.publish(test_event("plain")).unwrap();

    assert_eq!(child.count(), 1);
    assert_eq!(child.events()[0].id, 7);

    let contents: Vec<_> = base.events().into_iter().map(|e| e.content).collect();
    assert_eq!(contents, vec!["numbered".to_string(), "plain".to_string()]);
}

#[test]
fn test_root_listener_receives_everything() {
    let counter = CountingListener::new();
    let dispatcher = Dispatcher::direct();
    dispatcher.add_listener(counter.subscribe::<TestEvent>(0)).unwrap();

    let everything = Arc::new(plexus::listeners::EventStatistics::new());
    dispatcher.add_listener(everything.clone()).unwrap();

    dispatcher.publish(test_event("a")).unwrap();
    dispatcher.publish(numbered(1)).unwrap();
    dispatcher.publish(Unrelated).unwrap();

    assert_eq!(counter.count(), 2);
    assert_eq!(everything.total(), 3);
    assert_eq!(everything.count(type_of::<Unrelated>()), 1);
}

#[test]
fn test_publish_without_listeners_is_a_noop() {
    let dispatcher = Dispatcher::direct();
    dispatcher.publish(Unrelated).unwrap();

    let counter = CountingListener::new();
    dispatcher.add_listener(counter.subscribe::<Numbered>(0)).unwrap();
    dispatcher.publish(test_event("supertype only")).unwrap();
    assert_eq!(counter.count(), 0);
}

#[test]
fn test_faulting_listeners_are_isolated() {
    let probe = OrderProbe::new();
    let dispatcher = Dispatcher::direct();
    dispatcher.add_listener(probe.listener::<TestEvent>("before", 0)).unwrap();
    dispatcher
        .add_listener_with_priority(FailingListener::<TestEvent>::new("fails").into_arc(), 1)
        .unwrap();
    dispatcher
        .add_listener_with_priority(PanickingListener::<TestEvent>::new("panics").into_arc(), 2)
        .unwrap();
    dispatcher.add_listener(probe.listener::<TestEvent>("after", 3)).unwrap();

    assert!(dispatcher.publish(test_event("x")).is_ok());
    assert!(dispatcher.publish(test_event("y")).is_ok());
    assert_eq!(probe.order(), vec!["before", "after", "before", "after"]);
}

#[test]
fn test_register_then_remove_restores_snapshot() {
    let dispatcher = Dispatcher::builder().with_builtins().build().unwrap();
    let before = dispatcher.all_event_listeners();

    let listener = listener_fn(|_: &Numbered| Ok(()));
    assert!(dispatcher.add_listener(listener.clone()).unwrap());
    assert!(!dispatcher.add_listener(listener.clone()).unwrap());

    let during = dispatcher.all_event_listeners();
    assert_eq!(during.listener_count(), before.listener_count() + 1);
    assert_eq!(during.get(&type_of::<Numbered>()).map(<[_]>::len), Some(1));

    assert!(dispatcher.remove_listener(&listener).unwrap());
    assert_eq!(dispatcher.all_event_listeners(), before);
    assert!(!dispatcher.remove_listener(&listener).unwrap());
}

#[test]
fn test_listeners_for_reports_invocation_order() {
    let dispatcher = Dispatcher::direct();
    let late = listener_fn(|_: &TestEvent| Ok(()));
    let early: Arc<dyn EventListener> = listener_fn(|_: &Numbered| Ok(()));
    dispatcher.add_listener_with_priority(late.clone(), 5).unwrap();
    dispatcher.add_listener_with_priority(early.clone(), 1).unwrap();

    let resolved = dispatcher.listeners_for(type_of::<Numbered>());
    assert_eq!(resolved.len(), 2);
    assert!(Arc::ptr_eq(&resolved[0], &early));
    assert!(Arc::ptr_eq(&resolved[1], &late));
    assert_eq!(dispatcher.listeners_for(type_of::<TestEvent>()).len(), 1);
}

#[test]
fn test_default_instance() {
    let dispatcher = Dispatcher::default_instance();
    assert_eq!(dispatcher.executor().kind, ExecutorKind::Direct);

    let snapshot = dispatcher.all_event_listeners();
    assert_eq!(snapshot.listener_count(), 2);
    assert_eq!(snapshot.event_types().collect::<Vec<_>>(), vec![&EventType::any()]);
    assert!(std::ptr::eq(dispatcher, Dispatcher::default_instance()));
}

#[test]
fn test_shutdown_rejects_further_use() {
    let dispatcher = Dispatcher::direct();
    let listener = listener_fn(|_: &TestEvent| Ok(()));
    dispatcher.add_listener(listener.clone()).unwrap();
    assert_eq!(dispatcher.state(), DispatcherState::Active);

    dispatcher.shutdown();
    assert!(dispatcher.is_shutdown());
    assert!(matches!(dispatcher.publish(test_event("late")), Err(DispatchError::Closed)));
    assert!(matches!(dispatcher.add_listener(listener.clone()), Err(DispatchError::Closed)));
    assert!(matches!(dispatcher.remove_listener(&listener), Err(DispatchError::Closed)));
    assert!(dispatcher.all_event_listeners().is_empty());
}

#[test]
fn test_listener_may_publish_reentrantly() {
    let dispatcher = Arc::new(Dispatcher::direct());
    let counter = CountingListener::new();
    dispatcher.add_listener(counter.subscribe::<Unrelated>(0)).unwrap();

    let inner = Arc::downgrade(&dispatcher);
    dispatcher
        .add_listener(listener_fn(move |_: &TestEvent| {
            if let Some(dispatcher) = inner.upgrade() {
                dispatcher.publish(Unrelated)?;
            }
            Ok(())
        }))
        .unwrap();

    dispatcher.publish(test_event("outer")).unwrap();
    assert_eq!(counter.count(), 1);
}
