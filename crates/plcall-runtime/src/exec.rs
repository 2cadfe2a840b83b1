use std::time::{Duration, Instant};

use plcall_core::CancelToken;

use crate::bind::Bind;
use crate::error::{Result, RuntimeError};

/// Database driver seam.
///
/// Implementations bind `binds[i]` to placeholder `:i+1` of `block`, run it,
/// and write every `Bind::Out` back: plain values into `OutBox::value`,
/// REF CURSORs and LOB locators into `OutBox::stream`. Array binds must
/// respect `OutBox::capacity`.
pub trait Executor {
    fn execute(&mut self, block: &str, binds: &mut [Bind], deadline: Option<Instant>)
    -> Result<()>;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn execute(
        &mut self,
        block: &str,
        binds: &mut [Bind],
        deadline: Option<Instant>,
    ) -> Result<()> {
        (**self).execute(block, binds, deadline)
    }
}

/// Per-call limits.
#[derive(Clone, Debug, Default)]
pub struct CallOptions {
    pub deadline: Option<Instant>,
    pub cancel: CancelToken,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        self.deadline(Instant::now() + timeout)
    }

    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Fail fast when the call was cancelled or ran out of time.
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(RuntimeError::DeadlineExceeded);
        }
        Ok(())
    }
}
