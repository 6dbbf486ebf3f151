// src/system/signals.rs

use crate::CancellationToken;
use std::io;
use std::sync::atomic::Ordering;
use std::thread;

/// Starts a background listener that flips `cancellation_token` on Ctrl+C or
/// SIGTERM (the signal `scancel` sends). The executor notices the flag, kills
/// the running child and reports an interruption.
///
/// The handlers are registered before this returns, so a signal that arrives
/// while the job is starting is not lost.
pub fn install_interrupt_handler(cancellation_token: CancellationToken) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let listener = {
        let _guard = runtime.enter();
        ShutdownListener::register()?
    };

    thread::Builder::new()
        .name("signal-listener".to_string())
        .spawn(move || {
            if runtime.block_on(listener.recv()) {
                log::debug!("Shutdown signal received; requesting cancellation.");
                cancellation_token.store(true, Ordering::SeqCst);
            }
        })?;
    Ok(())
}

#[cfg(unix)]
struct ShutdownListener {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownListener {
    fn register() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Resolves to `true` once SIGINT or SIGTERM arrives, or `false` if both
    /// streams close first.
    async fn recv(mut self) -> bool {
        tokio::select! {
            Some(()) = self.interrupt.recv() => true,
            Some(()) = self.terminate.recv() => true,
            else => false,
        }
    }
}

#[cfg(windows)]
struct ShutdownListener {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(windows)]
impl ShutdownListener {
    fn register() -> io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    async fn recv(mut self) -> bool {
        self.ctrl_c.recv().await.is_some()
    }
}
