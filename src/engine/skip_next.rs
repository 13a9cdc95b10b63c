//! The per-class skip-next latch.

/// One bit of cross-invocation state.
///
/// At the start of every invocation the latch is consumed: if it was armed, setup is skipped. A method carrying the
/// skip-next marker arms it again once its own invocation has been handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipLatch {
    armed: bool,
}

impl SkipLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Consume the latch. Returns whether this invocation should dispatch.
    pub fn begin_invocation(&mut self) -> bool {
        !std::mem::take(&mut self.armed)
    }

    pub fn arm(&mut self) {
        self.armed = true;
    }
}
