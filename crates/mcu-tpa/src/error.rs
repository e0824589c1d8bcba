use thiserror::Error;

/// Expected, recoverable outcomes of TPA operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TpaError {
    #[error("players cannot send a teleport request to themselves")]
    SelfTarget,

    #[error("teleport requests are on cooldown for {remaining_secs} more seconds")]
    RateLimited { remaining_secs: u64 },

    #[error("no pending teleport request")]
    NoPendingRequest,

    #[error("the player who sent the request is no longer online")]
    SenderGone,
}
