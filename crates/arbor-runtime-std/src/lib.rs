//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides the concrete scheduler behind `arbor-core`'s
//! [`RuntimeScheduler`] trait. Hosts construct a [`StdRuntime`], hand its
//! [`Runtime`] to a `Tree`, and pump the tree whenever
//! [`StdRuntime::take_pump_request`] reports pending work.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use arbor_core::{Runtime, RuntimeHandle, RuntimeScheduler};

type PumpWaker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Scheduler that records pump requests in an atomic flag.
///
/// Wakers may fire on any thread; the flag and the optional waker callback
/// are the only state they touch.
pub struct StdScheduler {
    pump_requested: AtomicBool,
    pump_waker: RwLock<Option<PumpWaker>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            pump_requested: AtomicBool::new(false),
            pump_waker: RwLock::new(None),
        }
    }

    /// Returns whether a pump has been requested since the last call.
    pub fn take_pump_request(&self) -> bool {
        self.pump_requested.swap(false, Ordering::SeqCst)
    }

    /// Returns whether a pump is requested, without clearing the flag.
    pub fn pump_requested(&self) -> bool {
        self.pump_requested.load(Ordering::SeqCst)
    }

    /// Registers a waker that will be invoked whenever a pump is requested.
    pub fn set_pump_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self.write_waker() = Some(Arc::new(waker));
    }

    /// Clears any registered pump waker.
    pub fn clear_pump_waker(&self) {
        *self.write_waker() = None;
    }

    fn read_waker(&self) -> RwLockReadGuard<'_, Option<PumpWaker>> {
        self.pump_waker
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_waker(&self) -> RwLockWriteGuard<'_, Option<PumpWaker>> {
        self.pump_waker
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn wake(&self) {
        let waker = self.read_waker().clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field("pump_requested", &self.pump_requested())
            .field("has_waker", &self.read_waker().is_some())
            .finish()
    }
}

impl RuntimeScheduler for StdScheduler {
    fn request_pump(&self) {
        if !self.pump_requested.swap(true, Ordering::SeqCst) {
            log::trace!("pump requested");
        }
        self.wake();
    }
}

/// Convenience container bundling the standard scheduler with a runtime.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    runtime: Runtime,
}

impl StdRuntime {
    /// Creates a new standard runtime instance.
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self { scheduler, runtime }
    }

    /// Returns a [`Runtime`] driven by the standard scheduler.
    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Returns whether a pump was requested since the last poll.
    pub fn take_pump_request(&self) -> bool {
        self.scheduler.take_pump_request()
    }

    /// Registers a waker to be called when the runtime asks for a pump.
    pub fn set_pump_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_pump_waker(waker);
    }

    pub fn clear_pump_waker(&self) {
        self.scheduler.clear_pump_waker();
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("live_tasks", &self.runtime.live_tasks())
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}
