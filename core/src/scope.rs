//! Ambient timeout override, scoped per concurrency unit.
//!
//! Blocking callers get a thread-local slot managed by [`TimeoutScope`];
//! async callers get a task-local slot entered through [`task_scope`].
//! Both restore the previous value on exit, including on panic.

use std::cell::RefCell;
use std::future::Future;
use std::marker::PhantomData;

use crate::timeout::Timeout;

thread_local! {
    static THREAD_TIMEOUT: RefCell<Option<Timeout>> = const { RefCell::new(None) };
}

tokio::task_local! {
    static TASK_TIMEOUT: Option<Timeout>;
}

/// Timeout set by the innermost live [`TimeoutScope`] on this thread.
pub fn thread_timeout() -> Option<Timeout> {
    THREAD_TIMEOUT.with(|slot| *slot.borrow())
}

/// Timeout set by the innermost [`task_scope`] around the current task.
pub fn task_timeout() -> Option<Timeout> {
    TASK_TIMEOUT.try_with(|timeout| *timeout).ok().flatten()
}

/// Guard holding a thread-local timeout override. Dropping it restores the
/// value that was active when it was created.
///
/// The guard is `!Send`: it must be dropped on the thread that created it.
#[must_use = "the timeout is only active while the guard is alive"]
#[derive(Debug)]
pub struct TimeoutScope {
    previous: Option<Timeout>,
    _thread_bound: PhantomData<*const ()>,
}

impl TimeoutScope {
    pub fn enter(timeout: Timeout) -> Self {
        let previous = THREAD_TIMEOUT.with(|slot| slot.replace(Some(timeout)));
        Self {
            previous,
            _thread_bound: PhantomData,
        }
    }
}

impl Drop for TimeoutScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        THREAD_TIMEOUT.with(|slot| *slot.borrow_mut() = previous);
    }
}

/// Run `future` with `timeout` as the task-local override.
pub async fn task_scope<F: Future>(timeout: Timeout, future: F) -> F::Output {
    TASK_TIMEOUT.scope(Some(timeout), future).await
}
