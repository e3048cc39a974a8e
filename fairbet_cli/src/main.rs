use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fairbet_client::{spawn, ControllerSettings, LocalTable};
use fairbet_core::{
    server_seed_hash, verify, AutoBetConfig, CellState, CoinSide, GameDescriptor, GameKind,
    MinesBoard, Outcome, SeedBundle,
};
use fairbet_shared::BetLogEntry;

#[derive(Parser)]
#[command(name = "fairbet-cli", about = "Provably-fair verification and auto-bet runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute the outcome of a finished round from its revealed seeds
    Verify {
        #[command(subcommand)]
        game: VerifyGame,
    },
    /// Print the SHA-256 commitment of a server seed
    HashSeed { seed: String },
    /// Run an auto-bet session against an in-process coin flip table
    AutoBet {
        /// JSON auto-bet configuration
        #[arg(long)]
        config: PathBuf,
        #[arg(long, env = "FAIRBET_CLIENT_SEED", default_value = "fairbet-client")]
        client_seed: String,
        /// Write every resolved bet to this CSV file
        #[arg(long)]
        export_csv: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SeedArgs {
    #[arg(long)]
    server_seed: String,
    #[arg(long)]
    client_seed: String,
    #[arg(long)]
    nonce: u64,
    /// Expected SHA-256 of the server seed, published before the round
    #[arg(long)]
    commitment: Option<String>,
}

impl SeedArgs {
    fn bundle(&self) -> SeedBundle {
        SeedBundle::new(&self.server_seed, &self.client_seed, self.nonce)
    }
}

#[derive(Subcommand)]
enum VerifyGame {
    Coinflip {
        #[command(flatten)]
        seeds: SeedArgs,
        /// Side the server reported
        #[arg(long)]
        reported: Option<SideArg>,
    },
    Mines {
        #[command(flatten)]
        seeds: SeedArgs,
        #[arg(long, default_value_t = 3)]
        mines: u32,
        #[arg(long, default_value_t = 5)]
        grid: u32,
        /// Comma-separated mine cells the server reported
        #[arg(long, value_delimiter = ',')]
        reported: Vec<u32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Heads,
    Tails,
}

impl From<SideArg> for CoinSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Heads => CoinSide::Heads,
            SideArg::Tails => CoinSide::Tails,
        }
    }
}

fn check_commitment(seeds: &SeedArgs) -> anyhow::Result<()> {
    if let Some(commitment) = &seeds.commitment {
        if !seeds.bundle().matches_commitment(commitment) {
            anyhow::bail!(
                "server seed does not match commitment {} (hash is {})",
                commitment,
                server_seed_hash(&seeds.server_seed)
            );
        }
        println!("commitment ok");
    }
    Ok(())
}

fn print_board(board: &MinesBoard) {
    for row in board.rows() {
        let line: String = row
            .iter()
            .map(|c| match c {
                CellState::Mine => '*',
                CellState::Safe => '.',
                CellState::Pending => '?',
                CellState::Hidden => '#',
            })
            .collect();
        println!("{line}");
    }
}

fn run_verify(game: VerifyGame) -> anyhow::Result<()> {
    let (seeds, descriptor, reported) = match game {
        VerifyGame::Coinflip { seeds, reported } => {
            (
                seeds,
                GameDescriptor::CoinFlip,
                reported.map(|side| Outcome::CoinFlip(side.into())),
            )
        }
        VerifyGame::Mines {
            seeds,
            mines,
            grid,
            reported,
        } => {
            let reported = (!reported.is_empty()).then_some(Outcome::Mines(reported));
            (
                seeds,
                GameDescriptor::Mines {
                    mine_count: mines,
                    grid_size: grid,
                },
                reported,
            )
        }
    };
    check_commitment(&seeds)?;
    let outcome = verify(&seeds.bundle(), &descriptor)?;
    match (&outcome, descriptor) {
        (Outcome::CoinFlip(side), _) => println!("outcome: {side}"),
        (Outcome::Mines(cells), GameDescriptor::Mines { grid_size, .. }) => {
            println!("mines: {cells:?}");
            print_board(&MinesBoard::from_mines(grid_size, cells));
        }
        (Outcome::Mines(cells), _) => println!("mines: {cells:?}"),
    }
    if let Some(reported) = reported {
        if outcome.agrees_with(&reported) {
            println!("reported outcome verified");
        } else {
            anyhow::bail!("reported outcome does not match the seeds");
        }
    }
    Ok(())
}

async fn run_auto_bet(
    config_path: PathBuf,
    client_seed: String,
    export_csv: Option<PathBuf>,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    let config: AutoBetConfig = serde_json::from_str(&raw).context("parsing auto-bet config")?;

    let side = config
        .game_params
        .get("side")
        .and_then(|v| serde_json::from_value::<CoinSide>(v.clone()).ok())
        .unwrap_or(CoinSide::Heads);

    let (table, table_rx) = LocalTable::new(client_seed);
    let table = Arc::new(table);
    if let Some(commitment) = table.commitment() {
        info!(%commitment, "table server seed committed");
    }

    // tap resolutions on their way to the controller to keep a log
    let (tx, rx) = mpsc::unbounded_channel();
    let tap = tokio::spawn(async move {
        let mut table_rx = table_rx;
        let mut log = Vec::new();
        while let Some(resolved) = table_rx.recv().await {
            let verified = resolved
                .fair
                .as_ref()
                .and_then(|fair| verify(fair, &GameDescriptor::CoinFlip).ok())
                .map(|outcome| (outcome == Outcome::CoinFlip(side)) == resolved.won);
            log.push(BetLogEntry {
                ts: Utc::now(),
                round: resolved.round,
                bet_amount: resolved.bet_amount,
                won: resolved.won,
                winnings: resolved.winnings,
                server_seed: resolved.fair.as_ref().map(|f| f.server_seed.clone()),
                client_seed: resolved.fair.as_ref().map(|f| f.client_seed.clone()),
                nonce: resolved.fair.as_ref().map(|f| f.nonce),
                verified,
            });
            if tx.send(resolved).is_err() {
                break;
            }
        }
        log
    });

    let (mailbox, handle) = spawn(
        GameKind::CoinFlip,
        table.clone(),
        rx,
        ControllerSettings::default(),
    );
    mailbox.start(config).await?;
    let snapshot = mailbox.wait_stopped().await;
    drop(mailbox);
    handle.await?;

    let stats = snapshot.stats;
    println!(
        "stopped: {}",
        snapshot
            .stop_reason
            .map(|r| r.to_string())
            .unwrap_or_else(|| "idle".into())
    );
    println!(
        "bets={} wins={} losses={} profit={:.4} wagered={:.4} streak={}",
        stats.total_bets, stats.wins, stats.losses, stats.profit, stats.wagered, stats.current_streak
    );

    // last sender of the table channel goes away here, which ends the tap
    drop(table);
    let log = tap.await?;
    if let Some(path) = export_csv {
        let mut wtr = csv::Writer::from_path(&path)?;
        for entry in &log {
            wtr.serialize(entry)?;
        }
        wtr.flush()?;
        println!("Exported {} rows to {}", log.len(), path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Verify { game } => run_verify(game)?,
        Commands::HashSeed { seed } => println!("{}", server_seed_hash(&seed)),
        Commands::AutoBet {
            config,
            client_seed,
            export_csv,
        } => {
            if let Err(err) = run_auto_bet(config, client_seed, export_csv).await {
                warn!(error = %err, "auto-bet failed");
                return Err(err);
            }
        }
    }

    Ok(())
}
