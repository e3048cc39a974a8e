use fairbet_core::{derive_hash_hex, reconstruct_coin_flip, CoinSide, GameKind, SeedBundle};
use fairbet_shared::{BetResolved, PlaceBet};
use rand::RngCore;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};
use tokio::sync::mpsc;
use tracing::debug;

use crate::service::{GameService, ServiceError};

/// Gross return of a winning coin flip per unit staked.
pub const COIN_FLIP_PAYOUT: f64 = 1.98;

struct Seeds {
    server_seed: String,
    client_seed: String,
    nonce: u64,
}

/// In-process coin flip table. Every bet reveals its seeds with the result, then the
/// server seed moves to the SHA-256 of the previous one and the nonce increments.
pub struct LocalTable {
    seeds: Mutex<Seeds>,
    connected: AtomicBool,
    resolutions: mpsc::UnboundedSender<BetResolved>,
}

fn random_server_seed() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl LocalTable {
    pub fn new(client_seed: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<BetResolved>) {
        Self::with_server_seed(random_server_seed(), client_seed)
    }

    pub fn with_server_seed(
        server_seed: impl Into<String>,
        client_seed: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<BetResolved>) {
        let (resolutions, rx) = mpsc::unbounded_channel();
        let table = Self {
            seeds: Mutex::new(Seeds {
                server_seed: server_seed.into(),
                client_seed: client_seed.into(),
                nonce: 0,
            }),
            connected: AtomicBool::new(true),
            resolutions,
        };
        (table, rx)
    }

    /// Hash of the server seed the next bet will use.
    pub fn commitment(&self) -> Option<String> {
        let seeds = self.seeds.lock().ok()?;
        Some(derive_hash_hex(seeds.server_seed.as_bytes()))
    }

    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl GameService for LocalTable {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.resolutions.is_closed()
    }

    fn place_bet(&self, bet: PlaceBet) -> Result<(), ServiceError> {
        if !self.is_connected() {
            return Err(ServiceError::NotConnected);
        }
        if bet.game_type != GameKind::CoinFlip {
            return Err(ServiceError::Rejected(format!(
                "{} is not played at this table",
                bet.game_type
            )));
        }
        if !(bet.bet_amount.is_finite() && bet.bet_amount > 0.0) {
            return Err(ServiceError::Rejected(format!(
                "invalid stake {}",
                bet.bet_amount
            )));
        }
        let side = bet
            .game_params
            .get("side")
            .and_then(|v| serde_json::from_value::<CoinSide>(v.clone()).ok())
            .unwrap_or(CoinSide::Heads);

        let fair = {
            let mut seeds = self
                .seeds
                .lock()
                .map_err(|_| ServiceError::Rejected("table state poisoned".into()))?;
            let fair = SeedBundle::new(
                seeds.server_seed.clone(),
                seeds.client_seed.clone(),
                seeds.nonce,
            );
            seeds.server_seed = derive_hash_hex(seeds.server_seed.as_bytes());
            seeds.nonce += 1;
            fair
        };

        let landed = reconstruct_coin_flip(&fair);
        let won = landed == side;
        let winnings = if won {
            bet.bet_amount * COIN_FLIP_PAYOUT
        } else {
            0.0
        };
        debug!(round = bet.round, %side, %landed, won, "coin flip resolved");
        self.resolutions
            .send(BetResolved {
                round: bet.round,
                won,
                bet_amount: bet.bet_amount,
                winnings,
                fair: Some(fair),
            })
            .map_err(|_| ServiceError::NotConnected)
    }
}
