use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Process-wide stop request, raised by the signal handler.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Pause between passes of a wait and the optional deadline for the whole wait.
/// `timeout: None` waits forever.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub timeout: Option<Duration>,
}

impl WaitPolicy {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }

    pub fn start<'a>(&self, what: &str, shutdown: &'a Shutdown) -> Waiter<'a> {
        Waiter {
            what: what.to_owned(),
            interval: self.interval,
            deadline: self.timeout.map(|timeout| Instant::now() + timeout),
            shutdown,
            passes: 0,
        }
    }
}

pub struct Waiter<'a> {
    what: String,
    interval: Duration,
    deadline: Option<Instant>,
    shutdown: &'a Shutdown,
    passes: usize,
}

impl<'a> Waiter<'a> {
    /// Called at the top of every pass; fails once the wait has been cancelled or
    /// has run past its deadline.
    pub fn check(&mut self) -> Result<()> {
        if self.shutdown.is_triggered() {
            return Err(Error::Cancelled(self.what.clone()));
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::DeadlineExceeded(format!(
                    "{} ({} passes)",
                    self.what, self.passes
                )));
            }
        }
        self.passes += 1;
        Ok(())
    }

    pub async fn pause(&self) {
        if self.interval > Duration::from_secs(0) {
            tokio::time::delay_for(self.interval).await;
        } else {
            tokio::task::yield_now().await;
        }
    }

    pub fn passes(&self) -> usize {
        self.passes
    }
}
