use fairbet_core::{verify, GameDescriptor, MinesBoard, Outcome, SeedBundle};

fn main() {
    // Example round check from revealed seeds
    let seeds = SeedBundle::new("example-server-seed", "example-client-seed", 1);
    let coin = verify(&seeds, &GameDescriptor::CoinFlip).expect("coin flip");
    let mines = verify(
        &seeds,
        &GameDescriptor::Mines {
            mine_count: 3,
            grid_size: 5,
        },
    )
    .expect("mines");
    println!("server_seed_hash={} coin={:?}", seeds.server_seed_hash(), coin);
    if let Outcome::Mines(cells) = &mines {
        let board = MinesBoard::from_mines(5, cells);
        println!("mines={:?} rows={}", cells, board.rows().count());
    }
}
