//! Constructor functions turned into strategy activation metadata.

use std::marker::PhantomData;

use crate::{
    activation::request::{Locatable, Request},
    types::{
        error::{LocateError, LocateResult},
        instance::Instance,
        type_info::TypeInfoSource,
    },
};

/// Describes how to build a value from located dependencies.
///
/// Implemented for functions taking [`Locatable`] parameters:
///
/// - `Fn(T1, ..) -> O`
/// - [`Fallible`] around `Fn(T1, ..) -> Result<O, E>`
/// - [`Nullable`] around `Fn(T1, ..) -> Option<O>`
pub trait Constructor<TArgs>: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    /// Requests for every parameter, in declaration order
    fn dependencies() -> Vec<Request>;

    /// Call the constructor, `args` are the activated parameters in declaration order
    fn construct(&self, args: Vec<Instance>) -> LocateResult<Self::Output>;
}

/// Constructor returning `Result`, errors abort the activation
pub struct Fallible<F>(pub F);

/// Constructor that may produce nothing, reported as a null activation result
pub struct Nullable<F>(pub F);

/// Argument marker keeping the fallible impls apart from plain functions
pub struct FallibleArgs<T>(PhantomData<fn() -> T>);

/// Argument marker keeping the nullable impls apart from plain functions
pub struct NullableArgs<T>(PhantomData<fn() -> T>);

#[rustfmt::skip]
macro_rules! apply_tuples {
    ($name:ident) => {
        $name!();
        $name!(T1);
        $name!(T1, T2);
        $name!(T1, T2, T3);
        $name!(T1, T2, T3, T4);
        $name!(T1, T2, T3, T4, T5);
        $name!(T1, T2, T3, T4, T5, T6);
        $name!(T1, T2, T3, T4, T5, T6, T7);
        $name!(T1, T2, T3, T4, T5, T6, T7, T8);
        $name!(T1, T2, T3, T4, T5, T6, T7, T8, T9);
        $name!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
    };
}

fn next_arg<TArg: Locatable>(args: &mut impl Iterator<Item = Instance>) -> LocateResult<TArg> {
    let instance = args.next().ok_or(LocateError::NullActivationResult {
        ty: TArg::type_info(),
    })?;

    TArg::from_instance(instance)
}

macro_rules! impl_constructor_fn {
    ($($ty:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, O, $($ty,)*> Constructor<($($ty,)*)> for F
        where
            F: Fn($($ty,)*) -> O + Send + Sync + 'static,
            O: Send + Sync + 'static,
            $( $ty: Locatable, )*
        {
            type Output = O;

            fn dependencies() -> Vec<Request> {
                vec![$( $ty::request(), )*]
            }

            fn construct(&self, args: Vec<Instance>) -> LocateResult<O> {
                let mut args = args.into_iter();
                $( let $ty = next_arg::<$ty>(&mut args)?; )*
                Ok(self($($ty,)*))
            }
        }
    };
}

apply_tuples!(impl_constructor_fn);

macro_rules! impl_constructor_fallible {
    ($($ty:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, O, E, $($ty,)*> Constructor<FallibleArgs<(O, $($ty,)*)>> for Fallible<F>
        where
            F: Fn($($ty,)*) -> Result<O, E> + Send + Sync + 'static,
            O: Send + Sync + 'static,
            E: Into<LocateError> + 'static,
            $( $ty: Locatable, )*
        {
            type Output = O;

            fn dependencies() -> Vec<Request> {
                vec![$( $ty::request(), )*]
            }

            fn construct(&self, args: Vec<Instance>) -> LocateResult<O> {
                let mut args = args.into_iter();
                $( let $ty = next_arg::<$ty>(&mut args)?; )*
                (self.0)($($ty,)*).map_err(Into::into)
            }
        }
    };
}

apply_tuples!(impl_constructor_fallible);

macro_rules! impl_constructor_nullable {
    ($($ty:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, O, $($ty,)*> Constructor<NullableArgs<(O, $($ty,)*)>> for Nullable<F>
        where
            F: Fn($($ty,)*) -> Option<O> + Send + Sync + 'static,
            O: Send + Sync + 'static,
            $( $ty: Locatable, )*
        {
            type Output = O;

            fn dependencies() -> Vec<Request> {
                vec![$( $ty::request(), )*]
            }

            fn construct(&self, args: Vec<Instance>) -> LocateResult<O> {
                let mut args = args.into_iter();
                $( let $ty = next_arg::<$ty>(&mut args)?; )*
                (self.0)($($ty,)*).ok_or(LocateError::NullActivationResult {
                    ty: O::type_info(),
                })
            }
        }
    };
}

apply_tuples!(impl_constructor_nullable);

#[allow(dead_code)]
#[cfg(test)]
mod tests {
    //! Checks at compile time that common function shapes are constructors.

    use std::sync::Arc;

    use super::*;
    use crate::types::error::LocateResult;

    struct Foo;

    struct Bar {
        foo: Arc<Foo>,
    }

    fn is_constructor<C, TArgs>(_: C)
    where
        C: Constructor<TArgs>,
    {
    }

    fn dependencies_of<C, TArgs>(_: &C) -> Vec<Request>
    where
        C: Constructor<TArgs>,
    {
        C::dependencies()
    }

    fn test_is_constructor() {
        is_constructor(|| Foo);
        is_constructor(|foo: Arc<Foo>| Bar { foo });
        is_constructor(|_: Option<Arc<Foo>>, _: Vec<Arc<Foo>>| Foo);
        is_constructor(Fallible(|foo: Arc<Foo>| -> anyhow::Result<Bar> {
            Ok(Bar { foo })
        }));
        is_constructor(Fallible(|| -> LocateResult<Foo> { Ok(Foo) }));
        is_constructor(Nullable(|_: Arc<Foo>| -> Option<Foo> { None }));
    }

    #[test]
    fn plain_constructor_reads_args_in_order() {
        let ctor = |a: Arc<u8>, b: Arc<u16>| (*a as u32) * 1000 + *b as u32;

        let value = Constructor::construct(
            &ctor,
            vec![
                Instance::from_arc(Arc::new(1u8)),
                Instance::from_arc(Arc::new(2u16)),
            ],
        )
        .unwrap();

        assert_eq!(value, 1002);
        assert_eq!(dependencies_of(&ctor).len(), 2);
    }

    #[test]
    fn nullable_constructor_reports_null() {
        let ctor = Nullable(|| -> Option<Foo> { None });

        let err = ctor.construct(Vec::new()).err().unwrap();

        assert!(matches!(err, LocateError::NullActivationResult { .. }));
    }
}
