use fairbet_core::{
    reconstruct_mines, AutoBet, AutoBetConfig, AutoBetError, BetOrder, BetStats, GameKind,
    MinesBoard, MinesParams, RoundId, SeedBundle, Step, StopReason,
};
use fairbet_shared::{BetResolved, PlaceBet};
use std::time::Duration;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::{debug, info, warn};

use crate::service::GameService;

#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    /// How long an issued bet may stay unanswered before the run is stopped.
    pub bet_timeout: Duration,
    pub mailbox_size: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            bet_timeout: Duration::from_secs(10),
            mailbox_size: 64,
        }
    }
}

/// Read-only view of the run for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSnapshot {
    pub is_running: bool,
    pub current_stake: f64,
    pub stats: BetStats,
    pub stop_reason: Option<StopReason>,
    /// Seeds revealed with the most recent resolution, ready for verification.
    pub last_fair: Option<SeedBundle>,
    /// Mines runs only: picks of the latest bet, pending until it resolves.
    pub board: Option<MinesBoard>,
}

enum Message {
    Start {
        config: AutoBetConfig,
        response: oneshot::Sender<Result<(), AutoBetError>>,
    },
    Stop {
        reason: Option<String>,
        response: oneshot::Sender<()>,
    },
}

/// Handle to a running controller.
#[derive(Clone)]
pub struct Mailbox {
    sender: mpsc::Sender<Message>,
    state: watch::Receiver<RunSnapshot>,
}

impl Mailbox {
    pub async fn start(&self, config: AutoBetConfig) -> Result<(), AutoBetError> {
        let (response, receiver) = oneshot::channel();
        if self
            .sender
            .send(Message::Start { config, response })
            .await
            .is_err()
        {
            warn!("auto-bet mailbox closed; start dropped");
            return Err(AutoBetError::NotConnected);
        }
        receiver.await.unwrap_or(Err(AutoBetError::NotConnected))
    }

    pub async fn stop(&self, reason: Option<String>) {
        let (response, receiver) = oneshot::channel();
        if self
            .sender
            .send(Message::Stop { reason, response })
            .await
            .is_err()
        {
            warn!("auto-bet mailbox closed; stop dropped");
            return;
        }
        let _ = receiver.await;
    }

    pub fn snapshot(&self) -> RunSnapshot {
        self.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().is_running
    }

    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.state.clone()
    }

    /// Waits until no run is active and returns the final snapshot.
    pub async fn wait_stopped(&self) -> RunSnapshot {
        let mut state = self.state.clone();
        let result = state.wait_for(|s| !s.is_running).await.map(|s| (*s).clone());
        result.unwrap_or_else(|_| self.snapshot())
    }
}

/// Starts a controller for one game type.
///
/// `resolutions` is the inbound half of the game service; the controller is its only reader.
pub fn spawn<S: GameService>(
    game: GameKind,
    service: S,
    resolutions: mpsc::UnboundedReceiver<BetResolved>,
    settings: ControllerSettings,
) -> (Mailbox, JoinHandle<()>) {
    let (sender, mailbox) = mpsc::channel(settings.mailbox_size.max(1));
    let (state, state_rx) = watch::channel(RunSnapshot::default());
    let actor = Actor {
        game,
        service,
        settings,
        mailbox,
        resolutions,
        resolutions_open: true,
        machine: AutoBet::new(),
        pending: None,
        deadline: None,
        last_fair: None,
        board: None,
        state,
    };
    let handle = tokio::spawn(actor.run());
    (
        Mailbox {
            sender,
            state: state_rx,
        },
        handle,
    )
}

struct Actor<S: GameService> {
    game: GameKind,
    service: S,
    settings: ControllerSettings,
    mailbox: mpsc::Receiver<Message>,
    resolutions: mpsc::UnboundedReceiver<BetResolved>,
    resolutions_open: bool,
    machine: AutoBet,
    /// Next bet and the instant it is due.
    pending: Option<(BetOrder, Instant)>,
    /// Timeout of the in-flight bet.
    deadline: Option<Instant>,
    last_fair: Option<SeedBundle>,
    board: Option<MinesBoard>,
    state: watch::Sender<RunSnapshot>,
}

async fn sleep_until_some(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

impl<S: GameService> Actor<S> {
    async fn run(mut self) {
        loop {
            let due = self.pending.map(|(_, at)| at);
            let deadline = self.deadline;
            tokio::select! {
                msg = self.mailbox.recv() => {
                    let Some(msg) = msg else {
                        debug!(game = %self.game, "auto-bet mailbox closed");
                        break;
                    };
                    self.handle(msg);
                }
                resolved = self.resolutions.recv(), if self.resolutions_open => {
                    match resolved {
                        Some(resolved) => self.on_resolved(resolved),
                        None => {
                            self.resolutions_open = false;
                            warn!(game = %self.game, "game service closed the result channel");
                            self.halt(StopReason::Service("connection closed".into()));
                        }
                    }
                }
                _ = sleep_until_some(due) => {
                    if let Some((order, _)) = self.pending.take() {
                        self.issue(order);
                    }
                }
                _ = sleep_until_some(deadline) => {
                    self.deadline = None;
                    warn!(
                        game = %self.game,
                        round = ?self.machine.in_flight(),
                        "no bet resolution before timeout"
                    );
                    self.halt(StopReason::Timeout);
                }
            }
            self.publish();
        }
    }

    fn handle(&mut self, msg: Message) {
        match msg {
            Message::Start { config, response } => {
                let result = self.start(config);
                self.publish();
                let _ = response.send(result);
            }
            Message::Stop { reason, response } => {
                self.halt(StopReason::Cancelled(reason));
                self.publish();
                let _ = response.send(());
            }
        }
    }

    fn start(&mut self, config: AutoBetConfig) -> Result<(), AutoBetError> {
        if self.machine.is_running() {
            return Err(AutoBetError::AlreadyRunning);
        }
        if !self.resolutions_open || !self.service.is_connected() {
            return Err(AutoBetError::NotConnected);
        }
        let order = self.machine.start(config)?;
        info!(game = %self.game, "auto-bet run accepted");
        self.last_fair = None;
        self.board = None;
        self.schedule(order);
        Ok(())
    }

    fn schedule(&mut self, order: BetOrder) {
        self.deadline = None;
        if order.delay.is_zero() {
            self.issue(order);
        } else {
            self.pending = Some((order, Instant::now() + order.delay));
        }
    }

    fn issue(&mut self, order: BetOrder) {
        let Some(config) = self.machine.config() else {
            return;
        };
        if !self.machine.is_running() || self.machine.in_flight() != Some(order.round) {
            return;
        }
        let bet = PlaceBet {
            round: order.round,
            game_type: self.game,
            bet_amount: order.amount,
            game_params: config.game_params.clone(),
        };
        if self.game == GameKind::Mines {
            self.board = MinesParams::from_game_params(&bet.game_params).map(|params| {
                let mut board = MinesBoard::new(params.grid_size);
                for &pick in &params.picks {
                    if let Err(err) = board.begin_reveal(pick) {
                        debug!(game = %self.game, round = order.round, error = %err, "pick skipped");
                    }
                }
                board
            });
        }
        debug!(game = %self.game, round = order.round, amount = order.amount, "placing bet");
        match self.service.place_bet(bet) {
            Ok(()) => self.deadline = Some(Instant::now() + self.settings.bet_timeout),
            Err(err) => {
                warn!(game = %self.game, round = order.round, error = %err, "failed to place bet");
                self.halt(StopReason::Service(err.to_string()));
            }
        }
    }

    fn on_resolved(&mut self, resolved: BetResolved) {
        let round: RoundId = resolved.round;
        match self.machine.resolve(round, &resolved.result()) {
            Err(stale) => {
                warn!(game = %self.game, %stale, "dropping bet resolution");
            }
            Ok(step) => {
                self.deadline = None;
                self.settle_board(resolved.won, resolved.fair.as_ref());
                if let Some(fair) = resolved.fair {
                    self.last_fair = Some(fair);
                }
                match step {
                    Step::Next(order) => self.schedule(order),
                    Step::Stopped(_) => self.pending = None,
                }
            }
        }
    }

    /// Settles the pending picks, using the revealed seeds when they rebuild the layout.
    fn settle_board(&mut self, won: bool, fair: Option<&SeedBundle>) {
        let Some(board) = self.board.as_mut() else {
            return;
        };
        let params = self
            .machine
            .config()
            .and_then(|config| MinesParams::from_game_params(&config.game_params));
        let mines = match (fair, params) {
            (Some(fair), Some(params)) => {
                match reconstruct_mines(fair, params.mine_count, params.grid_size) {
                    Ok(mines) => Some(mines),
                    Err(err) => {
                        warn!(game = %self.game, error = %err, "revealed seeds do not rebuild the board");
                        None
                    }
                }
            }
            _ => None,
        };
        board.reconcile(won, mines.as_deref());
    }

    /// Stops the run and cancels anything scheduled. No-op when idle.
    fn halt(&mut self, reason: StopReason) {
        self.pending = None;
        self.deadline = None;
        if self.machine.is_running() {
            if let Some(board) = self.board.as_mut() {
                board.reveal_mines(&[]);
            }
        }
        self.machine.stop(reason);
    }

    fn publish(&self) {
        self.state.send_replace(RunSnapshot {
            is_running: self.machine.is_running(),
            current_stake: self.machine.current_stake(),
            stats: *self.machine.stats(),
            stop_reason: self.machine.stop_reason().cloned(),
            last_fair: self.last_fair.clone(),
            board: self.board.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceError;
    use fairbet_core::CellState;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct Recorder {
        connected: AtomicBool,
        /// Bets accepted before the service starts rejecting.
        accept: usize,
        accepted: AtomicUsize,
        placed: mpsc::UnboundedSender<PlaceBet>,
    }

    impl GameService for Recorder {
        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        fn place_bet(&self, bet: PlaceBet) -> Result<(), ServiceError> {
            if self.accepted.fetch_add(1, Ordering::SeqCst) >= self.accept {
                return Err(ServiceError::Rejected("insufficient balance".into()));
            }
            self.placed.send(bet).map_err(|_| ServiceError::NotConnected)
        }
    }

    struct Harness {
        mailbox: Mailbox,
        placed: mpsc::UnboundedReceiver<PlaceBet>,
        results: mpsc::UnboundedSender<BetResolved>,
    }

    fn harness(connected: bool, settings: ControllerSettings) -> Harness {
        harness_for(GameKind::CoinFlip, connected, usize::MAX, settings)
    }

    fn harness_for(
        game: GameKind,
        connected: bool,
        accept: usize,
        settings: ControllerSettings,
    ) -> Harness {
        let (placed_tx, placed) = mpsc::unbounded_channel();
        let (results, results_rx) = mpsc::unbounded_channel();
        let service = Recorder {
            connected: AtomicBool::new(connected),
            accept,
            accepted: AtomicUsize::new(0),
            placed: placed_tx,
        };
        let (mailbox, _handle) = spawn(game, service, results_rx, settings);
        Harness {
            mailbox,
            placed,
            results,
        }
    }

    fn lost(bet: &PlaceBet) -> BetResolved {
        BetResolved {
            round: bet.round,
            won: false,
            bet_amount: bet.bet_amount,
            winnings: 0.0,
            fair: None,
        }
    }

    fn config(number_of_bets: u32) -> AutoBetConfig {
        AutoBetConfig {
            base_bet: 1.0,
            max_bet: 100.0,
            number_of_bets,
            ..AutoBetConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_bet_limit_stops_run() {
        let mut h = harness(true, ControllerSettings::default());
        h.mailbox.start(config(5)).await.unwrap();
        let mut amounts = Vec::new();
        for _ in 0..5 {
            let bet = h.placed.recv().await.unwrap();
            amounts.push(bet.bet_amount);
            h.results.send(lost(&bet)).unwrap();
        }
        let snapshot = h.mailbox.wait_stopped().await;
        assert_eq!(snapshot.stop_reason, Some(StopReason::BetLimit));
        assert_eq!(snapshot.stats.total_bets, 5);
        assert_eq!(amounts, vec![1.0, 2.0, 4.0, 8.0, 16.0]);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(h.placed.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_bet_delay_between_bets() {
        let mut h = harness(true, ControllerSettings::default());
        let started = Instant::now();
        h.mailbox.start(config(3)).await.unwrap();
        let bet = h.placed.recv().await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
        h.results.send(lost(&bet)).unwrap();
        let _second = h.placed.recv().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_rejections() {
        let h = harness(false, ControllerSettings::default());
        assert_eq!(
            h.mailbox.start(config(3)).await,
            Err(AutoBetError::NotConnected)
        );
        assert!(!h.mailbox.is_running());

        let h = harness(true, ControllerSettings::default());
        h.mailbox.start(config(3)).await.unwrap();
        assert_eq!(
            h.mailbox.start(config(3)).await,
            Err(AutoBetError::AlreadyRunning)
        );
        assert!(h.mailbox.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_scheduled_bet_and_drops_late_result() {
        let mut h = harness(true, ControllerSettings::default());
        h.mailbox.start(config(10)).await.unwrap();
        let first = h.placed.recv().await.unwrap();
        h.results.send(lost(&first)).unwrap();
        let mut state = h.mailbox.subscribe();
        state.wait_for(|s| s.stats.total_bets == 1).await.unwrap();

        h.mailbox.stop(None).await;
        let snapshot = h.mailbox.snapshot();
        assert!(!snapshot.is_running);
        assert_eq!(
            snapshot.stop_reason.map(|r| r.to_string()).as_deref(),
            Some("Stopped by user")
        );

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(h.placed.try_recv().is_err());

        // a late answer for the cancelled round changes nothing
        h.results.send(lost(&first)).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(h.mailbox.snapshot().stats.total_bets, 1);

        // stopping again is a no-op
        h.mailbox.stop(Some("again".into())).await;
        assert_eq!(
            h.mailbox.snapshot().stop_reason,
            Some(StopReason::Cancelled(None))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_mismatched_round_is_ignored() {
        let mut h = harness(true, ControllerSettings::default());
        h.mailbox.start(config(2)).await.unwrap();
        let bet = h.placed.recv().await.unwrap();
        let mut wrong = lost(&bet);
        wrong.round += 100;
        h.results.send(wrong).unwrap();
        h.results.send(lost(&bet)).unwrap();
        let mut state = h.mailbox.subscribe();
        state.wait_for(|s| s.stats.total_bets == 1).await.unwrap();
        let second = h.placed.recv().await.unwrap();
        assert_eq!(second.round, bet.round + 1);
        assert_eq!(h.mailbox.snapshot().stats.total_bets, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_stops_run() {
        let settings = ControllerSettings {
            bet_timeout: Duration::from_secs(3),
            ..ControllerSettings::default()
        };
        let mut h = harness(true, settings);
        h.mailbox.start(config(10)).await.unwrap();
        let _bet = h.placed.recv().await.unwrap();
        let snapshot = h.mailbox.wait_stopped().await;
        assert_eq!(snapshot.stop_reason, Some(StopReason::Timeout));
        assert_eq!(snapshot.stats.total_bets, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_result_channel_stops_run() {
        let mut h = harness(true, ControllerSettings::default());
        h.mailbox.start(config(10)).await.unwrap();
        let _bet = h.placed.recv().await.unwrap();
        drop(h.results);
        let snapshot = h.mailbox.wait_stopped().await;
        assert!(matches!(snapshot.stop_reason, Some(StopReason::Service(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_after_result_channel_closed() {
        let mut h = harness(true, ControllerSettings::default());
        drop(h.results);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(
            h.mailbox.start(config(3)).await,
            Err(AutoBetError::NotConnected)
        );
        assert!(!h.mailbox.is_running());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(h.placed.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_first_bet_stops_run() {
        let mut h = harness_for(GameKind::CoinFlip, true, 0, ControllerSettings::default());
        h.mailbox.start(config(5)).await.unwrap();
        let snapshot = h.mailbox.wait_stopped().await;
        assert!(!snapshot.is_running);
        assert!(matches!(snapshot.stop_reason, Some(StopReason::Service(_))));
        assert_eq!(
            snapshot.stop_reason.map(|r| r.to_string()).as_deref(),
            Some("Game service error: bet rejected: insufficient balance")
        );
        assert_eq!(snapshot.stats.total_bets, 0);
        assert!(h.placed.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_delayed_bet_stops_run() {
        let mut h = harness_for(GameKind::CoinFlip, true, 1, ControllerSettings::default());
        h.mailbox.start(config(5)).await.unwrap();
        let first = h.placed.recv().await.unwrap();
        h.results.send(lost(&first)).unwrap();
        let mut state = h.mailbox.subscribe();
        state.wait_for(|s| s.stats.total_bets == 1).await.unwrap();
        assert!(h.mailbox.is_running());

        // the second bet is due after the bet delay and is refused
        let snapshot = h.mailbox.wait_stopped().await;
        assert!(!snapshot.is_running);
        assert!(matches!(snapshot.stop_reason, Some(StopReason::Service(_))));
        assert_eq!(snapshot.stats.total_bets, 1);
        assert!(h.placed.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mines_picks_reconciled_from_revealed_seeds() {
        let mut h = harness_for(GameKind::Mines, true, usize::MAX, ControllerSettings::default());
        let config = AutoBetConfig {
            game_params: serde_json::json!({"mineCount": 3, "gridSize": 5, "picks": [6, 0]}),
            ..config(1)
        };
        h.mailbox.start(config).await.unwrap();
        let bet = h.placed.recv().await.unwrap();
        let board = h.mailbox.snapshot().board.unwrap();
        assert_eq!(board.cell(6), Some(CellState::Pending));
        assert_eq!(board.cell(0), Some(CellState::Pending));

        // mines for abc/xyz/5 sit at 6, 13 and 18
        h.results
            .send(BetResolved {
                fair: Some(SeedBundle::new("abc", "xyz", 5)),
                ..lost(&bet)
            })
            .unwrap();
        let board = h.mailbox.wait_stopped().await.board.unwrap();
        assert_eq!(board.cell(6), Some(CellState::Mine));
        assert_eq!(board.cell(0), Some(CellState::Safe));
        assert_eq!(board.cell(13), Some(CellState::Mine));
        assert_eq!(board.cell(18), Some(CellState::Mine));
        assert_eq!(board.pending().count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_drops_pending_picks() {
        let mut h = harness_for(GameKind::Mines, true, usize::MAX, ControllerSettings::default());
        let config = AutoBetConfig {
            game_params: serde_json::json!({"mineCount": 3, "gridSize": 5, "picks": [2]}),
            ..config(3)
        };
        h.mailbox.start(config).await.unwrap();
        let _bet = h.placed.recv().await.unwrap();
        h.mailbox.stop(None).await;
        let board = h.mailbox.snapshot().board.unwrap();
        assert_eq!(board.cell(2), Some(CellState::Hidden));
        assert_eq!(board.pending().count(), 0);
    }
}
