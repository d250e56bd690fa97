use std::{
    mem,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use ahash::AHashSet;
use parking_lot::Mutex;

use crate::types::{
    error::{DisposalFailure, LocateError, LocateResult},
    type_info::{TypeInfo, TypeInfoSource},
};

/// Resource released when the owning scope ends
pub trait Dispose: Send + Sync {
    fn dispose(&self) -> anyhow::Result<()>;
}

type Release = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

/// One pending release, identified by the address of the tracked value
pub struct Disposable {
    ty: TypeInfo,
    address: Option<usize>,
    release: Release,
}

impl Disposable {
    pub(crate) fn new<TService: ?Sized + 'static>(
        address: usize,
        release: impl FnOnce() -> anyhow::Result<()> + Send + 'static,
    ) -> Self {
        Self {
            ty: TService::type_info(),
            address: Some(address),
            release: Box::new(release),
        }
    }

    /// Callback without identity, never deduplicated
    pub(crate) fn callback<TOwner: ?Sized + 'static>(
        release: impl FnOnce() -> anyhow::Result<()> + Send + 'static,
    ) -> Self {
        Self {
            ty: TOwner::type_info(),
            address: None,
            release: Box::new(release),
        }
    }

    pub fn ty(&self) -> TypeInfo {
        self.ty
    }

    fn release(self) -> Result<(), DisposalFailure> {
        let ty = self.ty;

        (self.release)().map_err(|error| DisposalFailure { ty, error })
    }
}

impl std::fmt::Debug for Disposable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposable")
            .field("ty", &self.ty.name)
            .field("address", &self.address)
            .finish()
    }
}

#[derive(Debug, Default)]
struct DisposalState {
    items: Vec<Disposable>,
    seen: AHashSet<usize>,
}

/// Ordered bag of disposables released exactly once, newest first
#[derive(Debug, Default)]
pub struct DisposalScope {
    state: Mutex<DisposalState>,
    disposed: AtomicBool,
}

impl DisposalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a disposable. After disposal it is released right away.
    pub fn track(&self, disposable: Disposable) -> LocateResult<()> {
        let mut state = self.state.lock();

        if self.disposed.load(Ordering::Acquire) {
            drop(state);

            tracing::trace!(target: "xioc", ty = disposable.ty.name, "late disposable released immediately");

            return disposable
                .release()
                .map_err(|failure| LocateError::AggregateDisposalFailure(vec![failure]));
        }

        if let Some(address) = disposable.address
            && !state.seen.insert(address)
        {
            return Ok(());
        }

        state.items.push(disposable);

        Ok(())
    }

    /// Track a shared value implementing [`Dispose`]
    pub fn track_instance<TService: Dispose + 'static>(
        &self,
        service: Arc<TService>,
    ) -> LocateResult<()> {
        let address = Arc::as_ptr(&service) as *const () as usize;

        self.track(Disposable::new::<TService>(address, move || {
            service.dispose()
        }))
    }

    /// Run a callback when the scope is disposed
    pub fn on_dispose(
        &self,
        callback: impl FnOnce() -> anyhow::Result<()> + Send + 'static,
    ) -> LocateResult<()> {
        self.track(Disposable::callback::<Self>(callback))
    }

    /// Release every tracked disposable in reverse order.
    ///
    /// Only the first call does any work. Every entry is released even when some fail,
    /// failures are reported together.
    pub fn dispose(&self) -> LocateResult<()> {
        let items = {
            let mut state = self.state.lock();

            if self.disposed.swap(true, Ordering::AcqRel) {
                return Ok(());
            }

            state.seen.clear();
            mem::take(&mut state.items)
        };

        let count = items.len();

        let failures = items
            .into_iter()
            .rev()
            .filter_map(|x| x.release().err())
            .collect::<Vec<_>>();

        tracing::debug!(target: "xioc", count, failed = failures.len(), "disposal scope released");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LocateError::AggregateDisposalFailure(failures))
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
