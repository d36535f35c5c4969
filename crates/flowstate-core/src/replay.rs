//! Capabilities a collaborator implements to take part in time travel
//!
//! A time traveler resolves implementations of these traits from the
//! [`Registry`](crate::Registry) every time it replays.

/// Can return to its initial state before a replay starts
pub trait ResetState {
    fn reset_state(&self);
}

/// Notified around every replay pass
pub trait ReplayListener {
    /// Called before any event is re-applied
    fn before_replay(&self);

    /// Called once every event of the pass has been re-applied
    fn after_replay(&self);
}

/// Notified when the replay position changes.
///
/// `Some(n)` means the application shows the state after event `n` and is
/// "in the past"; `None` means it is live again.
pub trait ReplayPositionListener {
    fn set_replay_position(&self, position: Option<usize>);
}
