use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use tracing::{debug, info};

use crate::{
    error::{AutoBetError, StaleResolution},
    strategy::{Adjust, Progression, Strategy},
};

/// Identifies one issued bet. Ids keep increasing across runs of the same controller.
pub type RoundId = u64;

pub const DEFAULT_BET_DELAY_MS: u64 = 1000;

/// Delay before the first bet of a run.
pub const START_DELAY: Duration = Duration::ZERO;

fn default_multiplier() -> f64 {
    2.0
}

fn default_bet_delay_ms() -> u64 {
    DEFAULT_BET_DELAY_MS
}

/// Fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoBetConfig {
    pub base_bet: f64,
    pub max_bet: f64,
    pub number_of_bets: u32,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub on_win: Adjust,
    #[serde(default)]
    pub on_loss: Adjust,
    #[serde(default = "default_multiplier")]
    pub win_multiplier: f64,
    #[serde(default = "default_multiplier")]
    pub loss_multiplier: f64,
    #[serde(default)]
    pub stop_on_win: bool,
    #[serde(default)]
    pub win_target: f64,
    #[serde(default)]
    pub stop_on_loss: bool,
    #[serde(default)]
    pub loss_limit: f64,
    #[serde(default = "default_bet_delay_ms")]
    pub bet_delay_ms: u64,
    /// Passed through untouched to the game service.
    #[serde(default)]
    pub game_params: serde_json::Value,
}

impl Default for AutoBetConfig {
    fn default() -> Self {
        Self {
            base_bet: 1.0,
            max_bet: 100.0,
            number_of_bets: 10,
            strategy: Strategy::default(),
            on_win: Adjust::default(),
            on_loss: Adjust::default(),
            win_multiplier: default_multiplier(),
            loss_multiplier: default_multiplier(),
            stop_on_win: false,
            win_target: 0.0,
            stop_on_loss: false,
            loss_limit: 0.0,
            bet_delay_ms: DEFAULT_BET_DELAY_MS,
            game_params: serde_json::Value::Null,
        }
    }
}

impl AutoBetConfig {
    pub fn validate(&self) -> Result<(), AutoBetError> {
        if !(self.base_bet.is_finite() && self.base_bet > 0.0) {
            return Err(AutoBetError::InvalidConfig("base bet must be positive"));
        }
        if !(self.max_bet.is_finite() && self.max_bet >= self.base_bet) {
            return Err(AutoBetError::InvalidConfig("max bet must be at least the base bet"));
        }
        if self.number_of_bets == 0 {
            return Err(AutoBetError::InvalidConfig("number of bets must be at least 1"));
        }
        for m in [self.win_multiplier, self.loss_multiplier] {
            if !(m.is_finite() && m > 0.0) {
                return Err(AutoBetError::InvalidConfig("multipliers must be positive"));
            }
        }
        if self.win_target < 0.0 || self.loss_limit < 0.0 {
            return Err(AutoBetError::InvalidConfig("targets cannot be negative"));
        }
        Ok(())
    }

    pub fn bet_delay(&self) -> Duration {
        Duration::from_millis(self.bet_delay_ms)
    }

    pub fn clamp_stake(&self, proposed: f64) -> f64 {
        clamp_stake(proposed, self.base_bet, self.max_bet)
    }
}

/// The only place stakes get bounded. NaN falls back to the base bet.
pub fn clamp_stake(proposed: f64, base_bet: f64, max_bet: f64) -> f64 {
    if proposed.is_nan() {
        return base_bet;
    }
    proposed.max(base_bet).min(max_bet)
}

/// Result of one bet as reported by the game service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetResult {
    pub won: bool,
    pub bet_amount: f64,
    pub winnings: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetStats {
    pub total_bets: u32,
    pub wins: u32,
    pub losses: u32,
    pub profit: f64,
    /// Positive for a winning streak, negative for a losing one.
    pub current_streak: i32,
    pub wagered: f64,
}

impl BetStats {
    pub fn record(&mut self, result: &BetResult) {
        self.total_bets += 1;
        self.wagered += result.bet_amount;
        if result.won {
            self.wins += 1;
            self.profit += result.winnings - result.bet_amount;
            self.current_streak = if self.current_streak > 0 {
                self.current_streak.saturating_add(1)
            } else {
                1
            };
        } else {
            self.losses += 1;
            self.profit -= result.bet_amount;
            self.current_streak = if self.current_streak < 0 {
                self.current_streak.saturating_sub(1)
            } else {
                -1
            };
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    WinTarget,
    LossLimit,
    BetLimit,
    /// Cancelled from outside, with an optional message.
    Cancelled(Option<String>),
    Timeout,
    Service(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::WinTarget => f.write_str("Win target reached"),
            StopReason::LossLimit => f.write_str("Loss limit reached"),
            StopReason::BetLimit => f.write_str("Bet limit reached"),
            StopReason::Cancelled(Some(reason)) => f.write_str(reason),
            StopReason::Cancelled(None) => f.write_str("Stopped by user"),
            StopReason::Timeout => f.write_str("Bet timed out"),
            StopReason::Service(err) => write!(f, "Game service error: {err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Stopped(StopReason),
}

/// A bet to send to the game service once `delay` has elapsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetOrder {
    pub round: RoundId,
    pub amount: f64,
    pub delay: Duration,
}

/// What the run does after a resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Next(BetOrder),
    Stopped(StopReason),
}

/// Auto-bet state machine. Holds no clock and does no I/O; the driver issues the
/// orders it returns and feeds resolutions back.
#[derive(Debug, Default)]
pub struct AutoBet {
    phase: Phase,
    config: Option<AutoBetConfig>,
    current_stake: f64,
    stats: BetStats,
    progression: Progression,
    next_round: RoundId,
    in_flight: Option<RoundId>,
}

impl AutoBet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn current_stake(&self) -> f64 {
        self.current_stake
    }

    pub fn stats(&self) -> &BetStats {
        &self.stats
    }

    pub fn config(&self) -> Option<&AutoBetConfig> {
        self.config.as_ref()
    }

    pub fn in_flight(&self) -> Option<RoundId> {
        self.in_flight
    }

    pub fn stop_reason(&self) -> Option<&StopReason> {
        match &self.phase {
            Phase::Stopped(reason) => Some(reason),
            _ => None,
        }
    }

    /// Begins a run and returns the first bet.
    pub fn start(&mut self, config: AutoBetConfig) -> Result<BetOrder, AutoBetError> {
        if self.is_running() {
            return Err(AutoBetError::AlreadyRunning);
        }
        config.validate()?;
        info!(
            base_bet = config.base_bet,
            max_bet = config.max_bet,
            bets = config.number_of_bets,
            strategy = ?config.strategy,
            "auto-bet started"
        );
        self.current_stake = config.base_bet;
        self.stats = BetStats::default();
        self.progression = Progression::default();
        self.config = Some(config);
        self.phase = Phase::Running;
        Ok(self.issue(START_DELAY))
    }

    fn issue(&mut self, delay: Duration) -> BetOrder {
        let round = self.next_round;
        self.next_round += 1;
        self.in_flight = Some(round);
        BetOrder {
            round,
            amount: self.current_stake,
            delay,
        }
    }

    /// Applies the resolution of the in-flight bet. Anything else is stale.
    pub fn resolve(&mut self, round: RoundId, result: &BetResult) -> Result<Step, StaleResolution> {
        let stale = StaleResolution {
            round,
            expected: self.in_flight,
        };
        if !self.is_running() || self.in_flight != Some(round) {
            return Err(stale);
        }
        let Some(config) = self.config.as_ref() else {
            return Err(stale);
        };
        self.in_flight = None;
        self.stats.record(result);
        debug!(
            round,
            won = result.won,
            amount = result.bet_amount,
            profit = self.stats.profit,
            "bet resolved"
        );

        let reason = if config.stop_on_win && result.won && result.winnings >= config.win_target {
            Some(StopReason::WinTarget)
        } else if config.stop_on_loss && self.stats.profit <= -config.loss_limit {
            Some(StopReason::LossLimit)
        } else if self.stats.total_bets >= config.number_of_bets {
            Some(StopReason::BetLimit)
        } else {
            None
        };
        if let Some(reason) = reason {
            self.stop(reason.clone());
            return Ok(Step::Stopped(reason));
        }

        let proposed = config
            .strategy
            .next(result.bet_amount, result.won, config, &mut self.progression);
        self.current_stake = config.clamp_stake(proposed);
        let delay = config.bet_delay();
        Ok(Step::Next(self.issue(delay)))
    }

    /// Ends the run. Returns false when no run was active.
    pub fn stop(&mut self, reason: StopReason) -> bool {
        if !self.is_running() {
            return false;
        }
        info!(
            %reason,
            bets = self.stats.total_bets,
            profit = self.stats.profit,
            "auto-bet stopped"
        );
        self.in_flight = None;
        self.phase = Phase::Stopped(reason);
        true
    }
}
