use std::sync::Arc;

use crate::{Condition, Container};

pub trait Storage: Send + Sync {
    fn kind(&self) -> &'static str;
}

pub struct Disk;

impl Storage for Disk {
    fn kind(&self) -> &'static str {
        "disk"
    }
}

pub struct Memory;

impl Storage for Memory {
    fn kind(&self) -> &'static str {
        "memory"
    }
}

pub struct Importer {
    storage: Arc<dyn Storage>,
}

pub struct Exporter {
    storage: Arc<dyn Storage>,
}

pub struct Audited;

#[test]
fn when_injected_into_picks_target() {
    let container = Container::new();

    container
        .configure(|block| {
            block.export(|| Disk).as_trait::<dyn Storage>(|x| x);
            block
                .export(|| Memory)
                .as_trait::<dyn Storage>(|x| x)
                .when_injected_into::<Exporter>();

            block.export(|storage: Arc<dyn Storage>| Importer { storage });
            block.export(|storage: Arc<dyn Storage>| Exporter { storage });
        })
        .unwrap();

    assert_eq!(container.locate::<Arc<Importer>>().unwrap().storage.kind(), "disk");
    assert_eq!(container.locate::<Arc<Exporter>>().unwrap().storage.kind(), "memory");

    // top level requests have no target
    assert_eq!(container.locate::<Arc<dyn Storage>>().unwrap().kind(), "disk");
}

#[test]
fn member_conditions() {
    let container = Container::new();

    container
        .configure(|block| {
            block.export(|| Disk).as_trait::<dyn Storage>(|x| x);
            block
                .export(|| Memory)
                .as_trait::<dyn Storage>(|x| x)
                .when(Condition::member_named("cache"));

            block
                .export(|storage: Arc<dyn Storage>| Importer { storage })
                .with_param(0, |param| {
                    param.named("cache");
                });

            block
                .export(|storage: Arc<dyn Storage>| Exporter { storage })
                .with_param(0, |param| {
                    param.named("archive");
                });
        })
        .unwrap();

    assert_eq!(container.locate::<Arc<Importer>>().unwrap().storage.kind(), "memory");
    assert_eq!(container.locate::<Arc<Exporter>>().unwrap().storage.kind(), "disk");
}

#[test]
fn class_marker_condition() {
    let container = Container::new();

    container
        .configure(|block| {
            block.export(|| Disk).as_trait::<dyn Storage>(|x| x);
            block
                .export(|| Memory)
                .as_trait::<dyn Storage>(|x| x)
                .when(Condition::class_has::<Audited>());

            block
                .export(|storage: Arc<dyn Storage>| Importer { storage })
                .with_marker::<Audited>();
            block.export(|storage: Arc<dyn Storage>| Exporter { storage });
        })
        .unwrap();

    assert_eq!(container.locate::<Arc<Importer>>().unwrap().storage.kind(), "memory");
    assert_eq!(container.locate::<Arc<Exporter>>().unwrap().storage.kind(), "disk");
}

#[test]
fn priority_beats_registration_order() {
    let container = Container::new();

    container
        .configure(|block| {
            block
                .export(|| Disk)
                .as_trait::<dyn Storage>(|x| x)
                .with_priority(10);
            block.export(|| Memory).as_trait::<dyn Storage>(|x| x);
        })
        .unwrap();

    assert_eq!(container.locate::<Arc<dyn Storage>>().unwrap().kind(), "disk");

    let kinds = container
        .locate_all::<dyn Storage>()
        .unwrap()
        .iter()
        .map(|x| x.kind())
        .collect::<Vec<_>>();

    assert_eq!(kinds, vec!["disk", "memory"]);
}

#[test]
fn ineligible_strategy_falls_back() {
    let container = Container::new();

    container
        .configure(|block| {
            block.export(|| Disk).as_trait::<dyn Storage>(|x| x);
            block
                .export(|| Memory)
                .as_trait::<dyn Storage>(|x| x)
                .with_priority(10)
                .when(Condition::predicate(|_, ctx| ctx.depth() > 0));
        })
        .unwrap();

    assert_eq!(container.locate::<Arc<dyn Storage>>().unwrap().kind(), "disk");
}
