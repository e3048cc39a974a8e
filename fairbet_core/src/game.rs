use serde::{Deserialize, Serialize};
use std::fmt;

/// Every game offered by the platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    CoinFlip,
    Mines,
    Dice,
    Crash,
    Plinko,
    Towers,
    Limbo,
    Upgrader,
    MurderMystery,
}

impl GameKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GameKind::CoinFlip => "coinflip",
            GameKind::Mines => "mines",
            GameKind::Dice => "dice",
            GameKind::Crash => "crash",
            GameKind::Plinko => "plinko",
            GameKind::Towers => "towers",
            GameKind::Limbo => "limbo",
            GameKind::Upgrader => "upgrader",
            GameKind::MurderMystery => "murdermystery",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the verifier needs to know about a round besides its seeds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GameDescriptor {
    CoinFlip,
    Mines {
        #[serde(rename = "mineCount")]
        mine_count: u32,
        #[serde(rename = "gridSize")]
        grid_size: u32,
    },
    Dice,
    Crash,
    Plinko,
    Towers,
    Limbo,
    Upgrader,
    MurderMystery,
}

impl GameDescriptor {
    pub fn kind(&self) -> GameKind {
        match self {
            GameDescriptor::CoinFlip => GameKind::CoinFlip,
            GameDescriptor::Mines { .. } => GameKind::Mines,
            GameDescriptor::Dice => GameKind::Dice,
            GameDescriptor::Crash => GameKind::Crash,
            GameDescriptor::Plinko => GameKind::Plinko,
            GameDescriptor::Towers => GameKind::Towers,
            GameDescriptor::Limbo => GameKind::Limbo,
            GameDescriptor::Upgrader => GameKind::Upgrader,
            GameDescriptor::MurderMystery => GameKind::MurderMystery,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinSide::Heads => f.write_str("heads"),
            CoinSide::Tails => f.write_str("tails"),
        }
    }
}

/// Reconstructed result of a round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Outcome {
    CoinFlip(CoinSide),
    /// Mine cells in order of discovery.
    Mines(Vec<u32>),
}

impl Outcome {
    /// Compares against what the server reported. Mine placements compare as sets.
    pub fn agrees_with(&self, reported: &Outcome) -> bool {
        match (self, reported) {
            (Outcome::CoinFlip(a), Outcome::CoinFlip(b)) => a == b,
            (Outcome::Mines(a), Outcome::Mines(b)) => {
                let mut a = a.clone();
                let mut b = b.clone();
                a.sort_unstable();
                b.sort_unstable();
                a == b
            }
            _ => false,
        }
    }
}
