#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Idle,
    Negotiating,
    InCall,
}

/// Lifecycle of one room session as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotJoined,
    Joined(CallPhase),
    Left,
}

impl SessionState {
    pub fn is_in_call(&self) -> bool {
        matches!(self, SessionState::Joined(CallPhase::InCall))
    }
}
