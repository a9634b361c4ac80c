use std::fmt;

/// Position of a trainable model within its forward/backward/update cycle.
///
/// ```text
/// Constructed -> Forwarded -> BackwardComputed -> Updated -> Forwarded -> ...
/// ```
///
/// `forward` is accepted from any state and starts a new cycle. `backward`
/// requires `Forwarded`; `update` requires `BackwardComputed`. Anything else
/// is reported as [`MlError::InvalidState`](crate::MlError::InvalidState).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrainingState {
    #[default]
    Constructed,
    Forwarded,
    BackwardComputed,
    Updated,
}

impl fmt::Display for TrainingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrainingState::Constructed => "constructed",
            TrainingState::Forwarded => "forwarded",
            TrainingState::BackwardComputed => "backward computed",
            TrainingState::Updated => "updated",
        };
        f.write_str(s)
    }
}
