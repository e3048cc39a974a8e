use chrono::{DateTime, Utc};
use fairbet_core::{BetResult, GameDescriptor, GameKind, Outcome, RoundId, SeedBundle, VerifyError};
use serde::{Deserialize, Serialize};

/// Outbound `placeBet` message to the game service.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBet {
    pub round: RoundId,
    pub game_type: GameKind,
    pub bet_amount: f64,
    #[serde(default)]
    pub game_params: serde_json::Value,
}

/// Inbound `betResolved` message. `fair` carries the revealed seeds of the round.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BetResolved {
    pub round: RoundId,
    pub won: bool,
    pub bet_amount: f64,
    pub winnings: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fair: Option<SeedBundle>,
}

impl BetResolved {
    pub fn result(&self) -> BetResult {
        BetResult {
            won: self.won,
            bet_amount: self.bet_amount,
            winnings: self.winnings,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerifyRequest {
    pub seed: SeedBundle,
    pub game: GameDescriptor,
    /// Outcome the server reported for the round, if the caller wants a comparison.
    #[serde(default)]
    pub reported: Option<Outcome>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub server_seed_hash: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorBody {
    pub error: String,
}

/// One resolved bet of an auto-bet run, as exported by the CLI.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BetLogEntry {
    pub ts: DateTime<Utc>,
    pub round: RoundId,
    pub bet_amount: f64,
    pub won: bool,
    pub winnings: f64,
    pub server_seed: Option<String>,
    pub client_seed: Option<String>,
    pub nonce: Option<u64>,
    pub verified: Option<bool>,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Invalid(String),
}

impl From<VerifyError> for ApiError {
    fn from(err: VerifyError) -> Self {
        ApiError::Invalid(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
