use serde::{Deserialize, Serialize};

use crate::autobet::AutoBetConfig;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Martingale,
    Fibonacci,
    #[serde(alias = "d'alembert")]
    Dalembert,
    Custom,
}

/// Stake adjustment of the custom strategy after a win or a loss.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Adjust {
    Increase,
    Decrease,
    #[default]
    Reset,
}

/// Mutable progression state owned by the run, passed into [`Strategy::next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progression {
    fib: Vec<u64>,
    fib_index: usize,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            fib: vec![1, 1],
            fib_index: 0,
        }
    }
}

impl Progression {
    pub fn fib_index(&self) -> usize {
        self.fib_index
    }

    /// Fibonacci term at `index`, growing the sequence as needed.
    ///
    /// Growth stops at the first term that saturates; every later index reads it.
    fn fib_at(&mut self, index: usize) -> u64 {
        while self.fib.len() <= index {
            let n = self.fib.len();
            if self.fib[n - 1] == u64::MAX {
                return u64::MAX;
            }
            let next = self.fib[n - 1].saturating_add(self.fib[n - 2]);
            self.fib.push(next);
        }
        self.fib[index]
    }
}

impl Strategy {
    /// Proposed stake for the next bet. Clamping into `[base_bet, max_bet]` is the caller's job.
    pub fn next(
        self,
        current_stake: f64,
        won: bool,
        config: &AutoBetConfig,
        progression: &mut Progression,
    ) -> f64 {
        let base = config.base_bet;
        match self {
            Strategy::Martingale => {
                if won {
                    base
                } else {
                    current_stake * 2.0
                }
            }
            Strategy::Fibonacci => {
                progression.fib_index = if won {
                    progression.fib_index.saturating_sub(2)
                } else {
                    progression.fib_index + 1
                };
                let index = progression.fib_index;
                base * progression.fib_at(index) as f64
            }
            Strategy::Dalembert => {
                if won {
                    (current_stake - base).max(base)
                } else {
                    current_stake + base
                }
            }
            Strategy::Custom => {
                let (adjust, multiplier) = if won {
                    (config.on_win, config.win_multiplier)
                } else {
                    (config.on_loss, config.loss_multiplier)
                };
                match adjust {
                    Adjust::Increase => current_stake * multiplier,
                    Adjust::Decrease => current_stake / multiplier,
                    Adjust::Reset => base,
                }
            }
        }
    }
}
