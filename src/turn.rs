pub type TurnId = u64;

/// Status indicator observed by the front-end.
///
/// Walks `Idle -> Thinking -> Building -> Idle` for a successful turn and
/// `Idle -> Thinking -> Idle` for a failed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnStatus {
    #[default]
    Idle,
    Thinking,
    Building,
}

impl TurnStatus {
    #[must_use]
    pub fn is_busy(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Thinking => "thinking",
            Self::Building => "building",
        }
    }
}

/// Outcome of a turn worker or its settle timer, applied to `App` in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    Replied { turn_id: TurnId, text: String },
    Failed { turn_id: TurnId, error: String },
    Settled { turn_id: TurnId },
}

impl TurnEvent {
    #[must_use]
    pub fn turn_id(&self) -> TurnId {
        match self {
            Self::Replied { turn_id, .. }
            | Self::Failed { turn_id, .. }
            | Self::Settled { turn_id } => *turn_id,
        }
    }

    /// Returns true when the provider call behind this event has returned.
    #[must_use]
    pub fn ends_provider_call(&self) -> bool {
        matches!(self, Self::Replied { .. } | Self::Failed { .. })
    }
}
