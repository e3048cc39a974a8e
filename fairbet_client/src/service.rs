use fairbet_shared::PlaceBet;
use std::sync::Arc;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("game service is not connected")]
    NotConnected,
    #[error("bet rejected: {0}")]
    Rejected(String),
}

/// Outbound side of the game service. Emitting a bet never waits for its result;
/// resolutions come back on the channel handed to [`crate::spawn`].
pub trait GameService: Send + Sync + 'static {
    fn is_connected(&self) -> bool;

    fn place_bet(&self, bet: PlaceBet) -> Result<(), ServiceError>;
}

impl<T: GameService + ?Sized> GameService for Arc<T> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn place_bet(&self, bet: PlaceBet) -> Result<(), ServiceError> {
        (**self).place_bet(bet)
    }
}
