use crate::session::action::TimeoutKind;

/// Failure taxonomy for session lifecycle observability.
///
/// None of these propagate as errors: every one degrades to a phase value,
/// and the worst outcome is a return to `LoggedOut`. The controller records
/// them so collaborator misbehavior stays diagnosable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionFault {
    /// No authenticated session. The normal `LoggedOut` cause, not an error.
    #[error("no authenticated session")]
    NoSession,

    /// Profile fetch returned nothing: not-found, fetch error, and deleted
    /// account collapsed, since the controller cannot act differently on them.
    #[error("profile unavailable")]
    ProfileUnavailable,

    /// A resolution timer expired while still waiting on the profile source.
    #[error("profile resolution timed out ({kind:?})")]
    FetchTimeout { kind: TimeoutKind },

    /// A fetch resolved after its session epoch was invalidated.
    #[error("stale profile result for epoch {issued_epoch} (current {current_epoch})")]
    StaleResult {
        issued_epoch: u64,
        current_epoch: u64,
    },
}
