//! Frame loop lifecycle state
//!
//! One-way: Idle → Running → Disposed. Idle may also go straight to Disposed.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed, not yet ticking
    #[default]
    Idle,
    Running,
    /// Resources released; every further call is a no-op
    Disposed,
}

impl LoopState {
    pub fn is_running(&self) -> bool {
        matches!(self, LoopState::Running)
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self, LoopState::Disposed)
    }
}
