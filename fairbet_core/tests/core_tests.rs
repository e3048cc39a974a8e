use std::collections::BTreeSet;

use fairbet_core::{
    clamp_stake, draw, reconstruct_mines, verify, AutoBetConfig, BetStats, CoinSide,
    GameDescriptor, Outcome, Progression, SeedBundle, Strategy,
};

#[test]
fn draw_fixture() {
    let expected = 0xba0f794b1dbffu64 as f64 / ((1u64 << 52) - 1) as f64;
    assert_eq!(draw("s1", "c1", 0, 0), expected);
}

#[test]
fn coin_flip_repeatable() {
    let seeds = SeedBundle::new("abc", "xyz", 5);
    let first = verify(&seeds, &GameDescriptor::CoinFlip).unwrap();
    assert!(matches!(first, Outcome::CoinFlip(CoinSide::Heads | CoinSide::Tails)));
    for _ in 0..1000 {
        assert_eq!(verify(&seeds, &GameDescriptor::CoinFlip).unwrap(), first);
    }
}

#[test]
fn mines_distinct_and_stable() {
    let seeds = SeedBundle::new("abc", "xyz", 5);
    let game = GameDescriptor::Mines {
        mine_count: 3,
        grid_size: 5,
    };
    let Outcome::Mines(first) = verify(&seeds, &game).unwrap() else {
        panic!("expected mines outcome");
    };
    let set: BTreeSet<u32> = first.iter().copied().collect();
    assert_eq!(set.len(), 3);
    assert!(set.iter().all(|c| *c < 25));

    // unrelated verifications in between must not leak into the next one
    verify(&SeedBundle::new("other", "seed", 9), &game).unwrap();
    verify(&SeedBundle::new("other", "seed", 10), &GameDescriptor::CoinFlip).unwrap();
    let again: BTreeSet<u32> = reconstruct_mines(&seeds, 3, 5).unwrap().into_iter().collect();
    assert_eq!(set, again);
}

#[test]
fn mines_many_nonces() {
    for nonce in 0..200u64 {
        let seeds = SeedBundle::new("server", "client", nonce);
        let mines = reconstruct_mines(&seeds, 10, 5).unwrap();
        let set: BTreeSet<u32> = mines.iter().copied().collect();
        assert_eq!(set.len(), 10);
        assert!(set.iter().all(|c| *c < 25));
    }
}

#[test]
fn clamp_invariant_all_strategies() {
    let strategies = [
        Strategy::Martingale,
        Strategy::Fibonacci,
        Strategy::Dalembert,
        Strategy::Custom,
    ];
    let config = AutoBetConfig {
        base_bet: 2.0,
        max_bet: 50.0,
        win_multiplier: 3.0,
        loss_multiplier: 7.0,
        on_win: fairbet_core::Adjust::Decrease,
        on_loss: fairbet_core::Adjust::Increase,
        ..AutoBetConfig::default()
    };
    for strategy in strategies {
        let mut progression = Progression::default();
        let mut stake = config.base_bet;
        for i in 0..64u32 {
            let won = (i * 7 + 3) % 5 == 0;
            let proposed = strategy.next(stake, won, &config, &mut progression);
            stake = clamp_stake(proposed, config.base_bet, config.max_bet);
            assert!(
                (config.base_bet..=config.max_bet).contains(&stake),
                "{strategy:?} produced {stake}"
            );
        }
    }
}

#[test]
fn stats_stay_consistent() {
    let mut stats = BetStats::default();
    for i in 0..50u32 {
        stats.record(&fairbet_core::BetResult {
            won: i % 3 == 0,
            bet_amount: 1.0,
            winnings: 2.0,
        });
        assert_eq!(stats.total_bets, stats.wins + stats.losses);
        assert_ne!(stats.current_streak, 0);
    }
}
