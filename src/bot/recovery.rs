//! Panic capture for handlers and per-event tasks.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use serde::Serialize;

use crate::transport::InboundEvent;

static INSTALL_HOOK: Once = Once::new();

thread_local! {
    static LAST_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// A panic caught while processing an event
#[derive(Clone, Debug, Serialize)]
pub struct PanicReport {
    pub event: InboundEvent,
    pub message: String,
    pub backtrace: String,
}

/// Panic caught by [`catch`], not yet tied to its event
#[derive(Debug)]
pub(crate) struct CaughtPanic {
    pub message: String,
    pub backtrace: String,
}

impl CaughtPanic {
    pub fn into_report(self, event: InboundEvent) -> PanicReport {
        PanicReport {
            event,
            message: self.message,
            backtrace: self.backtrace,
        }
    }
}

/// Record a backtrace for every panic, then defer to the previous hook
///
/// Installed once per process; later calls are no-ops.
pub fn install_panic_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let backtrace = Backtrace::force_capture().to_string();
            LAST_BACKTRACE.with(|slot| *slot.borrow_mut() = Some(backtrace));
            previous(info);
        }));
    });
}

/// Run `f`, turning a panic into a [`CaughtPanic`] with the panicking thread's backtrace
pub(crate) fn catch<R>(f: impl FnOnce() -> R) -> Result<R, CaughtPanic> {
    install_panic_hook();

    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| CaughtPanic {
        message: panic_message(payload.as_ref()),
        backtrace: take_backtrace(),
    })
}

/// Panic that escaped [`catch`] and unwound a whole task
pub(crate) fn from_task_panic(payload: Box<dyn Any + Send>) -> CaughtPanic {
    CaughtPanic {
        message: panic_message(payload.as_ref()),
        // The hook ran on the worker thread that panicked
        backtrace: "backtrace unavailable for task panics".to_string(),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

fn take_backtrace() -> String {
    LAST_BACKTRACE
        .with(|slot| slot.borrow_mut().take())
        .unwrap_or_else(|| "backtrace unavailable".to_string())
}
