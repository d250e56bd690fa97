use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use rstest::rstest;

use crate::{Container, Dispose, Lifestyle};

pub struct Counter {
    pub id: usize,
}

fn counter() -> impl Fn() -> Counter + Send + Sync + 'static {
    let created = Arc::new(AtomicUsize::new(0));
    move || Counter {
        id: created.fetch_add(1, Ordering::SeqCst),
    }
}

#[test]
fn locate_singleton_ok() {
    let container = Container::new();

    container
        .configure(|block| {
            block.singleton(counter());
        })
        .unwrap();

    let first = container.locate::<Arc<Counter>>().unwrap();
    let scope = container.begin_lifetime_scope(None).unwrap();
    let second = scope.locate::<Arc<Counter>>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.id, 0);
}

#[rstest]
#[case(Lifestyle::Transient, false, false)]
#[case(Lifestyle::Singleton, true, true)]
#[case(Lifestyle::SingletonPerScope, true, false)]
#[case(Lifestyle::ThreadStatic, true, true)]
fn lifestyle_sharing(
    #[case] lifestyle: Lifestyle,
    #[case] same_in_scope: bool,
    #[case] same_across_scopes: bool,
) {
    let container = Container::new();

    container
        .configure(|block| {
            block.export(counter()).lifestyle(lifestyle);
        })
        .unwrap();

    let scope = container.begin_lifetime_scope(None).unwrap();

    let first = scope.locate::<Arc<Counter>>().unwrap();
    let second = scope.locate::<Arc<Counter>>().unwrap();

    let nested = scope.begin_lifetime_scope(None).unwrap();
    let third = nested.locate::<Arc<Counter>>().unwrap();

    assert_eq!(Arc::ptr_eq(&first, &second), same_in_scope);
    assert_eq!(Arc::ptr_eq(&first, &third), same_across_scopes);
}

pub struct Connection {
    closed: Arc<AtomicUsize>,
}

impl Dispose for Connection {
    fn dispose(&self) -> anyhow::Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn singleton_outlives_scopes_and_is_disposed_with_container() {
    let closed = Arc::new(AtomicUsize::new(0));

    let container = Container::new();

    {
        let closed = closed.clone();

        container
            .configure(move |block| {
                block
                    .singleton(move || Connection {
                        closed: closed.clone(),
                    })
                    .disposable();
            })
            .unwrap();
    }

    {
        let scope = container.begin_lifetime_scope(None).unwrap();
        scope.locate::<Arc<Connection>>().unwrap();
    }

    assert_eq!(closed.load(Ordering::SeqCst), 0);

    container.dispose().unwrap();

    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

pub struct Session;

pub struct Cache {
    pub session: Arc<Session>,
}

#[test]
fn singleton_dependencies_resolve_against_root() {
    let container = Container::new();

    container
        .configure(|block| {
            block.export(|| Session).per_scope();
            block.singleton(|session: Arc<Session>| Cache { session });
        })
        .unwrap();

    let scope = container.begin_lifetime_scope(None).unwrap();

    let cache = scope.locate::<Arc<Cache>>().unwrap();
    let scope_session = scope.locate::<Arc<Session>>().unwrap();
    let root_session = container.locate::<Arc<Session>>().unwrap();

    assert!(Arc::ptr_eq(&cache.session, &root_session));
    assert!(!Arc::ptr_eq(&cache.session, &scope_session));
}

#[test]
fn exported_instance_is_never_disposed() {
    let closed = Arc::new(AtomicUsize::new(0));
    let connection = Arc::new(Connection {
        closed: closed.clone(),
    });

    let container = Container::new();

    container
        .configure(|block| {
            block.export_instance(connection.clone());
        })
        .unwrap();

    let located = container.locate::<Arc<Connection>>().unwrap();
    assert!(Arc::ptr_eq(&located, &connection));

    container.dispose().unwrap();

    assert_eq!(closed.load(Ordering::SeqCst), 0);
}

#[test]
fn weak_singleton_is_recreated_after_release() {
    let container = Container::new();

    container
        .configure(|block| {
            block.export(counter()).weak_singleton();
        })
        .unwrap();

    let first = container.locate::<Arc<Counter>>().unwrap();
    let second = container.locate::<Arc<Counter>>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));

    drop(first);
    drop(second);

    let third = container.locate::<Arc<Counter>>().unwrap();

    assert_eq!(third.id, 1);
}

#[test]
fn singleton_created_once_under_contention() {
    const THREADS: usize = 16;

    let created = Arc::new(AtomicUsize::new(0));
    let container = Container::new();

    {
        let created = created.clone();

        container
            .configure(move |block| {
                block.singleton(move || Counter {
                    id: created.fetch_add(1, Ordering::SeqCst),
                });
            })
            .unwrap();
    }

    let located = thread::scope(|threads| {
        let handles = (0..THREADS)
            .map(|_| threads.spawn(|| container.locate::<Arc<Counter>>().unwrap()))
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .map(|x| x.join().unwrap())
            .collect::<Vec<_>>()
    });

    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert!(located.iter().all(|x| Arc::ptr_eq(x, &located[0])));
}
