use std::sync::Arc;

use crate::{Container, Fallible, LocateError, Nullable};

pub struct Service1 {
    pub payload: String,
}

pub trait IPayloadSrc: Send + Sync {
    fn get(&self) -> String;
}

impl IPayloadSrc for Service1 {
    fn get(&self) -> String {
        self.payload.clone()
    }
}

#[test]
fn locate_transient_ok() {
    let container = Container::new();

    container
        .configure(|block| {
            block.transient(|| Service1 {
                payload: "1".to_string(),
            });
        })
        .unwrap();

    let first = container.locate::<Arc<Service1>>().unwrap();
    let second = container.locate::<Arc<Service1>>().unwrap();

    assert_eq!(first.payload, "1");
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn locate_transient_trait_object_ok() {
    let container = Container::new();

    container
        .configure(|block| {
            block
                .transient(|| Service1 {
                    payload: "1".to_string(),
                })
                .as_trait::<dyn IPayloadSrc>(|x| x);
        })
        .unwrap();

    let service = container.locate::<Arc<dyn IPayloadSrc>>().unwrap();

    assert_eq!(service.get(), "1");
    assert!(!container.can_locate::<Arc<Service1>>());
}

#[test]
fn fallible_constructor_error_is_returned() {
    let container = Container::new();

    container
        .configure(|block| {
            block.export(Fallible(|| -> anyhow::Result<Service1> {
                Err(anyhow::anyhow!("storage offline"))
            }));
        })
        .unwrap();

    let err = container.locate::<Arc<Service1>>().err().unwrap();

    assert!(matches!(err, LocateError::Custom(_)));
    assert_eq!(err.to_string(), "storage offline");
}

#[test]
fn nullable_constructor_yields_null_result() {
    let container = Container::new();

    container
        .configure(|block| {
            block.export(Nullable(|| -> Option<Service1> { None }));
        })
        .unwrap();

    let err = container.locate::<Arc<Service1>>().err().unwrap();
    assert!(matches!(err, LocateError::NullActivationResult { .. }));

    let optional = container.locate::<Option<Arc<Service1>>>().unwrap();
    assert!(optional.is_none());
}

#[test]
fn missing_service_is_locate_failure() {
    let container = Container::new();

    let err = container.locate::<Arc<Service1>>().err().unwrap();

    assert!(err.is_locate_failure());
    assert!(container.try_locate::<Arc<Service1>>().unwrap().is_none());
}
