//! Interrupt forwarding
//!
//! While a command runs, `SIGINT`, `SIGTERM` and `SIGHUP` delivered to rjust
//! are passed on to the child. A received signal is remembered so that the
//! invocation stops after the child exits instead of running further lines.

use crate::error::ExecutionResult;

#[cfg(unix)]
mod imp {
    use crate::error::{ExecutionError, ExecutionResult};
    use nix::libc::c_int;
    use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
    use nix::unistd::Pid;
    use std::sync::atomic::{AtomicI32, Ordering};

    const FORWARDED: &[Signal] = &[Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP];

    static RECEIVED: AtomicI32 = AtomicI32::new(0);
    static CHILD: AtomicI32 = AtomicI32::new(0);

    extern "C" fn handle(raw: c_int) {
        RECEIVED.store(raw, Ordering::SeqCst);
        forward(raw);
    }

    fn forward(raw: c_int) {
        let child = CHILD.load(Ordering::SeqCst);
        if child <= 0 {
            return;
        }
        if let Ok(signal) = Signal::try_from(raw) {
            let _ = signal::kill(Pid::from_raw(child), signal);
        }
    }

    pub fn install() -> ExecutionResult<()> {
        let action = SigAction::new(
            SigHandler::Handler(handle),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        for signal in FORWARDED {
            // SAFETY: the handler only touches atomics and calls kill(2),
            // both async-signal-safe.
            unsafe { signal::sigaction(*signal, &action) }.map_err(|errno| {
                ExecutionError::SignalHandler {
                    signal: signal.as_str().to_string(),
                    error: errno.to_string(),
                }
            })?;
        }
        Ok(())
    }

    pub fn received() -> Option<i32> {
        match RECEIVED.load(Ordering::SeqCst) {
            0 => None,
            raw => Some(raw),
        }
    }

    pub fn watch(pid: u32) {
        let pid = i32::try_from(pid).unwrap_or(0);
        CHILD.store(pid, Ordering::SeqCst);
        // A signal that arrived between spawn and now was not forwarded yet
        if let Some(raw) = received() {
            forward(raw);
        }
    }

    pub fn unwatch() {
        CHILD.store(0, Ordering::SeqCst);
    }
}

#[cfg(not(unix))]
mod imp {
    use crate::error::ExecutionResult;

    pub fn install() -> ExecutionResult<()> {
        Ok(())
    }

    pub fn received() -> Option<i32> {
        None
    }

    pub fn watch(_pid: u32) {}

    pub fn unwatch() {}
}

/// Install the forwarding handlers for this process
pub fn install() -> ExecutionResult<()> {
    imp::install()
}

/// The signal received so far, if any
pub fn received() -> Option<i32> {
    imp::received()
}

/// Forwards signals to a child process until dropped
pub struct ChildGuard(());

impl ChildGuard {
    pub fn new(pid: u32) -> Self {
        imp::watch(pid);
        ChildGuard(())
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        imp::unwatch();
    }
}
