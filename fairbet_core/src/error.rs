use crate::{autobet::RoundId, game::GameKind};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("no outcome reconstructor for game `{0}`")]
    UnsupportedGame(GameKind),
    #[error("malformed seed: {0}")]
    MalformedSeed(&'static str),
    #[error("invalid game parameters: {0}")]
    InvalidGame(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AutoBetError {
    #[error("game service is not connected")]
    NotConnected,
    #[error("an auto-bet run is already active")]
    AlreadyRunning,
    #[error("invalid auto-bet configuration: {0}")]
    InvalidConfig(&'static str),
}

/// A bet resolution that does not belong to the in-flight bet of an active run.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("stale resolution for round {round} (expected {expected:?})")]
pub struct StaleResolution {
    pub round: RoundId,
    pub expected: Option<RoundId>,
}
