#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecoveryState {
    /// Initial and steady state; nothing to recover.
    #[default]
    Idle,
    /// An unexpected disconnect interrupted a session and the controller is
    /// driving the bounded rejoin loop.
    Recovering,
}

impl RecoveryState {
    pub fn is_recovering(&self) -> bool {
        matches!(self, RecoveryState::Recovering)
    }
}

/// Point-in-time view of the controller, for UIs and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoverySnapshot {
    pub state: RecoveryState,
    pub in_session: bool,
    pub attempts: u32,
    pub manual_disconnect: bool,
}
