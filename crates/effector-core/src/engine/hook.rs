//! Callables handed to the primitives by effect handlers.

use std::fmt;

/// Read-only check of external state. May be evaluated many times.
pub type Precondition = Box<dyn Fn() -> bool + Send>;

/// Writes against external state; `true` only when fully applied.
/// Retries replay it, so it must be safe to run again.
pub type Action = Box<dyn FnMut() -> bool + Send>;

/// Called once when a one-shot action succeeds.
pub type OnSuccess = Box<dyn FnOnce() + Send>;

/// Per-tick action of a periodic effect. Receives the state left by the
/// previous tick and returns the state for the next one.
pub type TickAction<S> = Box<dyn FnMut(S) -> TickResult<S> + Send>;

/// Output of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickResult<S> {
    pub state: S,
    pub ok: bool,
}

impl<S> TickResult<S> {
    pub fn new(state: S, ok: bool) -> Self {
        Self { state, ok }
    }
}

/// Cleanup run exactly once when an engaged effect ends.
///
/// `run` consumes the hook, so a second invocation cannot be expressed.
pub struct CompletionHook(Option<Box<dyn FnOnce() + Send>>);

impl CompletionHook {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    pub fn noop() -> Self {
        Self(None)
    }

    pub fn is_noop(&self) -> bool {
        self.0.is_none()
    }

    pub(crate) fn run(self) {
        if let Some(f) = self.0 {
            f();
        }
    }
}

impl Default for CompletionHook {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for CompletionHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_noop() {
            "CompletionHook(noop)"
        } else {
            "CompletionHook(..)"
        })
    }
}
