use crate::{
    error::VerifyError,
    game::{CoinSide, GameDescriptor, Outcome},
    rng::{draw, DrawStream},
    seed::SeedBundle,
};

pub fn reconstruct_coin_flip(seeds: &SeedBundle) -> CoinSide {
    let value = draw(&seeds.server_seed, &seeds.client_seed, seeds.nonce, 0);
    if value > 0.5 {
        CoinSide::Heads
    } else {
        CoinSide::Tails
    }
}

/// Mine cells in `[0, grid_size²)`, without replacement, in order of discovery.
///
/// Each draw consumes one stream position. A cell that is already mined is skipped
/// and the next position is drawn, so with no collisions the index of every accepted
/// mine equals the number of mines accepted before it.
pub fn reconstruct_mines(
    seeds: &SeedBundle,
    mine_count: u32,
    grid_size: u32,
) -> Result<Vec<u32>, VerifyError> {
    let grid_length = grid_size
        .checked_mul(grid_size)
        .filter(|len| *len > 0)
        .ok_or_else(|| VerifyError::InvalidGame(format!("grid size {grid_size}")))?;
    if mine_count > grid_length {
        return Err(VerifyError::InvalidGame(format!(
            "{mine_count} mines do not fit in {grid_length} cells"
        )));
    }

    let mut stream = DrawStream::new(&seeds.server_seed, &seeds.client_seed, seeds.nonce);
    let mut taken = vec![false; grid_length as usize];
    let mut mines = Vec::with_capacity(mine_count as usize);
    while mines.len() < mine_count as usize {
        // a draw of exactly 1.0 lands on the last cell
        let cell = ((stream.next_draw() * grid_length as f64).floor() as u32).min(grid_length - 1);
        if !taken[cell as usize] {
            taken[cell as usize] = true;
            mines.push(cell);
        }
    }
    Ok(mines)
}

/// Recomputes the outcome of a round from scratch. Nothing is cached between calls.
pub fn verify(seeds: &SeedBundle, game: &GameDescriptor) -> Result<Outcome, VerifyError> {
    seeds.validate()?;
    match *game {
        GameDescriptor::CoinFlip => Ok(Outcome::CoinFlip(reconstruct_coin_flip(seeds))),
        GameDescriptor::Mines {
            mine_count,
            grid_size,
        } => reconstruct_mines(seeds, mine_count, grid_size).map(Outcome::Mines),
        other => Err(VerifyError::UnsupportedGame(other.kind())),
    }
}

/// Verify that the outcome the server reported matches what the seeds produce.
pub fn verify_against(
    seeds: &SeedBundle,
    game: &GameDescriptor,
    reported: &Outcome,
) -> Result<bool, VerifyError> {
    Ok(verify(seeds, game)?.agrees_with(reported))
}
