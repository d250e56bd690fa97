use std::{any::Any, sync::Arc};

use super::{
    error::{LocateError, LocateResult},
    type_info::{TypeInfo, TypeInfoSource},
};

/// Type erased activation result.
///
/// A service export `T` is held as `Arc<T>`, wrapper shapes are held by value.
/// Cloning an instance only bumps a reference count.
#[derive(Clone)]
pub struct Instance {
    ty: TypeInfo,
    value: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    pub fn new<TValue: 'static + Send + Sync>(value: TValue) -> Self {
        Self {
            value: Arc::new(value),
            ty: TValue::type_info(),
        }
    }

    /// Wrap a shared service, the held value is the `Arc` itself
    pub fn from_arc<TService: ?Sized + 'static + Send + Sync>(service: Arc<TService>) -> Self {
        Self::new(service)
    }

    pub fn unbox_ref<TValue: 'static>(&self) -> Option<&TValue> {
        self.value.downcast_ref()
    }

    /// Clone the held `Arc<TService>` out of the instance
    pub fn to_arc<TService: ?Sized + 'static + Send + Sync>(&self) -> LocateResult<Arc<TService>> {
        self.value
            .downcast_ref::<Arc<TService>>()
            .cloned()
            .ok_or(LocateError::TypeMismatch {
                expected: Arc::<TService>::type_info(),
                found: self.ty,
            })
    }

    /// Move the held value out. Fails when the instance is shared or of another type.
    pub fn take<TValue: 'static + Send + Sync>(self) -> LocateResult<TValue> {
        let found = self.ty;

        let value = self.value.downcast::<TValue>().map_err(|_| LocateError::TypeMismatch {
            expected: TValue::type_info(),
            found,
        })?;

        Arc::try_unwrap(value).map_err(|_| LocateError::SharedInstance { ty: found })
    }

    pub fn ty(&self) -> TypeInfo {
        self.ty
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance").field("ty", &self.ty.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Instance;
    use crate::types::error::LocateError;

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    struct Plain;

    impl Named for Plain {
        fn name(&self) -> &str {
            "plain"
        }
    }

    #[test]
    fn to_arc_keeps_identity() {
        let service: Arc<dyn Named> = Arc::new(Plain);
        let instance = Instance::from_arc(service.clone());

        let resolved = instance.to_arc::<dyn Named>().unwrap();

        assert!(Arc::ptr_eq(&service, &resolved));
        assert_eq!(resolved.name(), "plain");
    }

    #[test]
    fn to_arc_wrong_type_is_mismatch() {
        let instance = Instance::from_arc(Arc::new(5u32));

        let err = instance.to_arc::<String>().unwrap_err();

        assert!(matches!(err, LocateError::TypeMismatch { .. }));
    }

    #[test]
    fn take_shared_instance_fails() {
        let instance = Instance::new(vec![1, 2, 3]);
        let _copy = instance.clone();

        let err = instance.take::<Vec<i32>>().unwrap_err();

        assert!(matches!(err, LocateError::SharedInstance { .. }));
    }
}
