pub mod autobet;
pub mod board;
pub mod error;
pub mod game;
pub mod rng;
pub mod seed;
pub mod strategy;
pub mod verify;

pub use crate::autobet::{
    clamp_stake, AutoBet, AutoBetConfig, BetOrder, BetResult, BetStats, Phase, RoundId, Step,
    StopReason,
};
pub use crate::board::{BoardError, CellState, MinesBoard, MinesParams};
pub use crate::error::{AutoBetError, StaleResolution, VerifyError};
pub use crate::game::{CoinSide, GameDescriptor, GameKind, Outcome};
pub use crate::rng::{derive_hash_hex, draw, server_seed_hash, DrawStream};
pub use crate::seed::SeedBundle;
pub use crate::strategy::{Adjust, Progression, Strategy};
pub use crate::verify::{reconstruct_coin_flip, reconstruct_mines, verify, verify_against};
