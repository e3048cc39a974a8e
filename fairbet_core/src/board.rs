use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    #[default]
    Hidden,
    /// Reveal requested, server answer outstanding.
    Pending,
    Safe,
    Mine,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    #[error("cell {0} is outside the board")]
    OutOfRange(u32),
    #[error("cell {0} is not hidden")]
    NotHidden(u32),
    #[error("cell {0} has no pending reveal")]
    NotPending(u32),
}

/// Mines layout and the cells picked for a bet, read from the bet's game params.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MinesParams {
    pub mine_count: u32,
    pub grid_size: u32,
    #[serde(default)]
    pub picks: Vec<u32>,
}

impl MinesParams {
    pub fn from_game_params(params: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(params.clone()).ok()
    }
}

/// Client view of a mines grid, reconciled against server answers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MinesBoard {
    grid_size: u32,
    cells: Vec<CellState>,
}

impl MinesBoard {
    pub fn new(grid_size: u32) -> Self {
        let len = (grid_size as usize) * (grid_size as usize);
        Self {
            grid_size,
            cells: vec![CellState::Hidden; len],
        }
    }

    /// Board with every cell settled, built from a reconstructed placement.
    pub fn from_mines(grid_size: u32, mines: &[u32]) -> Self {
        let mut board = Self::new(grid_size);
        for cell in board.cells.iter_mut() {
            *cell = CellState::Safe;
        }
        board.reveal_mines(mines);
        board
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn cell(&self, index: u32) -> Option<CellState> {
        self.cells.get(index as usize).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellState]> {
        self.cells.chunks(self.grid_size.max(1) as usize)
    }

    /// Marks a hidden cell as pending until the server answers.
    pub fn begin_reveal(&mut self, index: u32) -> Result<(), BoardError> {
        let cell = self
            .cells
            .get_mut(index as usize)
            .ok_or(BoardError::OutOfRange(index))?;
        if *cell != CellState::Hidden {
            return Err(BoardError::NotHidden(index));
        }
        *cell = CellState::Pending;
        Ok(())
    }

    /// Reconciles a pending cell with the server's answer.
    pub fn settle(&mut self, index: u32, is_mine: bool) -> Result<(), BoardError> {
        let cell = self
            .cells
            .get_mut(index as usize)
            .ok_or(BoardError::OutOfRange(index))?;
        if *cell != CellState::Pending {
            return Err(BoardError::NotPending(index));
        }
        *cell = if is_mine {
            CellState::Mine
        } else {
            CellState::Safe
        };
        Ok(())
    }

    /// Round over: shows every mine and drops any reveal still pending.
    pub fn reveal_mines(&mut self, mines: &[u32]) {
        for cell in self.cells.iter_mut() {
            if *cell == CellState::Pending {
                *cell = CellState::Hidden;
            }
        }
        for &mine in mines {
            if let Some(cell) = self.cells.get_mut(mine as usize) {
                *cell = CellState::Mine;
            }
        }
    }

    /// Settles every pending cell once a bet resolves.
    ///
    /// With the revealed placement each pick is settled exactly and all mines are shown.
    /// Without it a win proves the picks safe; a loss leaves them hidden.
    pub fn reconcile(&mut self, won: bool, mines: Option<&[u32]>) {
        let pending: Vec<u32> = self.pending().collect();
        for index in pending {
            let is_mine = match mines {
                Some(mines) => mines.contains(&index),
                None if won => false,
                None => continue,
            };
            let _ = self.settle(index, is_mine);
        }
        self.reveal_mines(mines.unwrap_or(&[]));
    }

    pub fn pending(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == CellState::Pending)
            .map(|(i, _)| i as u32)
    }
}
