use std::sync::{Arc, Mutex};

use tokio::runtime::Builder;

use crate::{Container, IAsyncTaskScope, LocateError};

pub struct Service1 {
    pub payload: Mutex<String>,
}

pub trait IPayloadSrc: Send + Sync {
    fn get(&self) -> String;
    fn set(&self, val: String);
}

impl IPayloadSrc for Service1 {
    fn get(&self) -> String {
        self.payload.lock().unwrap().clone()
    }

    fn set(&self, val: String) {
        *self.payload.lock().unwrap() = val;
    }
}

fn container() -> Arc<Container> {
    let container = Container::new();

    container
        .configure(|block| {
            block
                .export(|| Service1 {
                    payload: Mutex::new("1".to_string()),
                })
                .task_local()
                .as_self()
                .as_trait::<dyn IPayloadSrc>(|x| x);
        })
        .unwrap();

    Arc::new(container)
}

#[test]
fn locate_task_local_ok() {
    let runtime = Builder::new_multi_thread()
        .worker_threads(4)
        .build()
        .unwrap();

    let container = container();

    {
        let container = container.clone();

        let task = async move {
            let service = container.locate::<Arc<Service1>>().unwrap();

            assert_eq!(*service.payload.lock().unwrap(), "1");

            *service.payload.lock().unwrap() = "2".to_string();

            let service = container.locate::<Arc<Service1>>().unwrap();

            assert_eq!(*service.payload.lock().unwrap(), "2");
        }
        .task_local_span();

        runtime.block_on(task);
    }

    let task = runtime.spawn(
        async move {
            let service = container.locate::<Arc<Service1>>().unwrap();

            assert_eq!(*service.payload.lock().unwrap(), "1");
        }
        .task_local_span(),
    );

    runtime.block_on(task).unwrap();
}

#[test]
fn locate_task_local_trait_object_ok() {
    let runtime = Builder::new_multi_thread()
        .worker_threads(4)
        .build()
        .unwrap();

    let container = container();

    let task = async move {
        let service = container.locate::<Arc<dyn IPayloadSrc>>().unwrap();
        service.set("2".to_string());

        let service = container.locate::<Arc<dyn IPayloadSrc>>().unwrap();
        assert_eq!(service.get(), "2");
    }
    .task_local_span();

    runtime.block_on(task);
}

#[test]
fn locate_task_local_outside_span_fails() {
    let container = container();

    let err = container.locate::<Arc<Service1>>().err().unwrap();

    assert!(matches!(err, LocateError::TaskLocalContextNotInitialized { .. }));
}
