use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use parking_lot::Mutex;

use crate::{Container, Dispose, LocateError, ScopeHandle};

pub struct Session {
    log: Arc<Mutex<Vec<&'static str>>>,
    name: &'static str,
}

impl Dispose for Session {
    fn dispose(&self) -> anyhow::Result<()> {
        self.log.lock().push(self.name);
        Ok(())
    }
}

pub struct Request;

#[test]
fn per_scope_identity() {
    let container = Container::new();

    container
        .configure(|block| {
            block.export(|| Request).per_scope();
        })
        .unwrap();

    let first_scope = container.begin_lifetime_scope(None).unwrap();
    let second_scope = container.begin_lifetime_scope(None).unwrap();

    let first = first_scope.locate::<Arc<Request>>().unwrap();
    let again = first_scope.locate::<Arc<Request>>().unwrap();
    let second = second_scope.locate::<Arc<Request>>().unwrap();

    assert!(Arc::ptr_eq(&first, &again));
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn per_named_scope_uses_nearest_named_ancestor() {
    let container = Container::new();

    container
        .configure(|block| {
            block.export(|| Request).per_named_scope("request");
        })
        .unwrap();

    let request_scope = container.begin_lifetime_scope(Some("request")).unwrap();
    let nested = request_scope.begin_lifetime_scope(Some("unit")).unwrap();

    let outer = request_scope.locate::<Arc<Request>>().unwrap();
    let inner = nested.locate::<Arc<Request>>().unwrap();

    assert!(Arc::ptr_eq(&outer, &inner));

    let err = container.locate::<Arc<Request>>().err().unwrap();
    assert!(err.is_locate_failure());
}

#[test]
fn scope_releases_disposables_in_reverse_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let container = Container::new();

    {
        let first_log = log.clone();
        let second_log = log.clone();

        container
            .configure(move |block| {
                block
                    .export(move || Session {
                        log: first_log.clone(),
                        name: "first",
                    })
                    .per_scope()
                    .disposable();

                block
                    .export(move |_first: Arc<Session>| Request)
                    .per_scope()
                    .on_dispose(move |_| second_log.lock().push("request"));
            })
            .unwrap();
    }

    {
        let scope = container.begin_lifetime_scope(None).unwrap();
        scope.locate::<Arc<Request>>().unwrap();
    }

    assert_eq!(*log.lock(), vec!["request", "first"]);
}

#[test]
fn child_scope_disposable_fires_once() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let container = Container::new();

    let scope = {
        let disposed = disposed.clone();

        container
            .create_child_scope(move |block| {
                block
                    .export(|| Request)
                    .on_dispose(move |_| {
                        disposed.fetch_add(1, Ordering::SeqCst);
                    });
            })
            .unwrap()
    };

    scope.locate::<Arc<Request>>().unwrap();

    scope.dispose().unwrap();
    scope.dispose().unwrap();
    drop(scope);

    assert_eq!(disposed.load(Ordering::SeqCst), 1);
    assert!(!container.can_locate::<Arc<Request>>());

    container.dispose().unwrap();

    assert_eq!(disposed.load(Ordering::SeqCst), 1);
}

#[test]
fn disposed_scope_refuses_locates() {
    let container = Container::new();

    container
        .configure(|block| {
            block.export(|| Request);
        })
        .unwrap();

    let scope = container.begin_lifetime_scope(None).unwrap();
    let handle: ScopeHandle = scope.handle().clone();

    drop(scope);

    let err = handle.locate::<Arc<Request>>().err().unwrap();
    assert!(matches!(err, LocateError::ScopeDisposed { .. }));

    let err = handle.begin_lifetime_scope(None).unwrap_err();
    assert!(err.is_scope_disposed());
}

pub trait Greeter: Send + Sync {
    fn greet(&self) -> &'static str;
}

pub struct English;

impl Greeter for English {
    fn greet(&self) -> &'static str {
        "hello"
    }
}

pub struct French;

impl Greeter for French {
    fn greet(&self) -> &'static str {
        "bonjour"
    }
}

#[test]
fn child_scope_registrations_take_precedence() {
    let container = Container::new();

    container
        .configure(|block| {
            block.export(|| English).as_trait::<dyn Greeter>(|x| x);
        })
        .unwrap();

    let child = container
        .create_child_scope(|block| {
            block.export(|| French).as_trait::<dyn Greeter>(|x| x);
        })
        .unwrap();

    assert_eq!(child.locate::<Arc<dyn Greeter>>().unwrap().greet(), "bonjour");
    assert_eq!(container.locate::<Arc<dyn Greeter>>().unwrap().greet(), "hello");

    let all = child
        .locate_all::<dyn Greeter>()
        .unwrap()
        .iter()
        .map(|x| x.greet())
        .collect::<Vec<_>>();

    assert_eq!(all, vec!["bonjour", "hello"]);
}

#[test]
fn scope_handle_is_injected() {
    pub struct Worker {
        scope: ScopeHandle,
    }

    let container = Container::new();

    container
        .configure(|block| {
            block.export(|scope: ScopeHandle| Worker { scope });
        })
        .unwrap();

    let scope = container.begin_lifetime_scope(Some("jobs")).unwrap();
    let worker = scope.locate::<Arc<Worker>>().unwrap();

    assert_eq!(worker.scope.id(), scope.id());
    assert_eq!(worker.scope.name(), Some("jobs"));
}

#[test]
fn named_scope_owner_disposed_before_child() {
    let released = Arc::new(AtomicUsize::new(0));
    let container = Container::new();

    {
        let released = released.clone();

        container
            .configure(move |block| {
                block
                    .export(|| Request)
                    .per_named_scope("request")
                    .on_dispose(move |_| {
                        released.fetch_add(1, Ordering::SeqCst);
                    });
            })
            .unwrap();
    }

    let outer = container.begin_lifetime_scope(Some("request")).unwrap();
    let inner = outer.begin_lifetime_scope(None).unwrap();

    drop(outer);

    let err = inner.locate::<Arc<Request>>().err().unwrap();
    assert!(err.is_scope_disposed());

    let err = inner.locate::<Arc<Request>>().err().unwrap();
    assert!(err.is_scope_disposed());

    assert_eq!(released.load(Ordering::SeqCst), 0);
}

#[test]
fn per_scope_owner_disposed_through_handle() {
    let container = Container::new();

    container
        .configure(|block| {
            block.export(|| Request).per_scope();
        })
        .unwrap();

    let scope = container.begin_lifetime_scope(None).unwrap();
    let handle = scope.handle().clone();

    scope.dispose().unwrap();

    assert!(handle.locate::<Arc<Request>>().err().unwrap().is_scope_disposed());
}

#[test]
fn transients_tracked_from_many_threads() {
    const THREADS: usize = 16;
    const LOCATES: usize = 100;

    let released = Arc::new(AtomicUsize::new(0));
    let container = Container::new();

    {
        let released = released.clone();

        container
            .configure(move |block| {
                block.export(|| Request).on_dispose(move |_| {
                    released.fetch_add(1, Ordering::SeqCst);
                });
            })
            .unwrap();
    }

    let scope = container.begin_lifetime_scope(None).unwrap();

    thread::scope(|threads| {
        for _ in 0..THREADS {
            threads.spawn(|| {
                for _ in 0..LOCATES {
                    scope.locate::<Arc<Request>>().unwrap();
                }
            });
        }
    });

    scope.dispose().unwrap();

    assert_eq!(released.load(Ordering::SeqCst), THREADS * LOCATES);
}
