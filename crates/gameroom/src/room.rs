use crate::command::Command;
use crate::command::GameInfo;
use crate::command::Outbound;
use crate::command::Subscriber;
use crate::command::SubscriberId;
use crate::registry::Registry;
use crate::registry::RoomHandle;
use crate::timer::TurnTimer;
use crate::timer::schedule;
use felt_core::Chips;
use felt_core::Millis;
use felt_core::now_millis;
use felt_gameplay::Action;
use felt_gameplay::ActionOption;
use felt_gameplay::Audience;
use felt_gameplay::Engine;
use felt_gameplay::EngineError;
use felt_gameplay::EventKind;
use felt_gameplay::GameConfig;
use felt_gameplay::GameEvent;
use felt_gameplay::GameId;
use felt_gameplay::PlayerId;
use felt_gameplay::Rules;
use felt_gameplay::StartSettings;
use felt_gameplay::TableView;
use felt_records::DecisionContext;
use felt_records::RecorderHandle;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;

/// Captured when a turn begins; becomes the decision context recorded
/// alongside the seat's eventual action.
struct PendingDecision {
    seat: PlayerId,
    options: Vec<ActionOption>,
    since: Millis,
    pot_odds: f64,
    effective_stack: Chips,
}

/// Per-table actor: the imperative shell around one [`Engine`].
///
/// All mutation arrives through the command queue, which serializes the
/// table. Events fan out to subscribers projected per audience and feed
/// the replay recorder; no I/O happens between dequeue and reply.
pub struct Room {
    engine: Engine,
    rx: UnboundedReceiver<Command>,
    tx: UnboundedSender<Command>,
    registry: Arc<Mutex<Registry>>,
    recorder: RecorderHandle,
    subscribers: HashMap<SubscriberId, Subscriber>,
    next_subscriber: SubscriberId,
    pending_unseats: Vec<PlayerId>,
    pending_decision: Option<PendingDecision>,
    turn: TurnTimer,
    start_generation: u64,
    cleanup_generation: u64,
    frozen: bool,
    finalized: bool,
}

impl Room {
    /// Builds the room, starts its replay, spawns its task, and returns
    /// the routing handle.
    pub fn spawn(
        id: GameId,
        config: GameConfig,
        registry: Arc<Mutex<Registry>>,
        recorder: RecorderHandle,
    ) -> RoomHandle {
        let (tx, rx) = unbounded_channel();
        let engine = Engine::new(id, config.clone());
        recorder.start(
            id,
            config.clone(),
            TableView::full(engine.state()),
            HashMap::new(),
        );
        let room = Self {
            turn: TurnTimer::new(config.turn_time()),
            engine,
            rx,
            tx: tx.clone(),
            registry,
            recorder,
            subscribers: HashMap::new(),
            next_subscriber: 0,
            pending_unseats: Vec::new(),
            pending_decision: None,
            start_generation: 0,
            cleanup_generation: 0,
            frozen: false,
            finalized: false,
        };
        tokio::spawn(room.run());
        RoomHandle { id, tx, config }
    }

    async fn run(mut self) {
        log::info!("[room {}] open", self.engine.id());
        self.arm_cleanup();
        while let Some(command) = self.rx.recv().await {
            if !self.handle(command) {
                break;
            }
        }
        self.finalize();
        self.turn.cancel();
        self.subscribers.clear();
        let id = self.engine.id();
        {
            // a room that closes itself must also drop out of the maps
            let mut registry = self.registry.lock().expect("registry lock");
            registry.games.remove(&id);
            registry.seats.retain(|_, game| *game != id);
        }
        log::info!("[room {}] closed", id);
    }

    /// Applies one command; returns false when the room should close.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Join {
                player,
                name,
                chips,
                reply,
            } => {
                let result = self.join(player, name, chips);
                let _ = reply.send(result);
            }
            Command::Leave { player, reply } => {
                let _ = reply.send(self.leave(player));
            }
            Command::Start { requester, reply } => {
                let _ = reply.send(self.start(requester));
            }
            Command::Act {
                player,
                action,
                reply,
            } => {
                let _ = reply.send(self.act(player, action));
            }
            Command::Snapshot { player, reply } => {
                let mut view = self.engine.snapshot_for(player);
                if self.engine.state().to_act_id() == Some(player) {
                    view.time_remaining_ms =
                        self.turn.remaining().map(|d| d.as_millis() as Millis);
                }
                let _ = reply.send(Box::new(view));
            }
            Command::Info { reply } => {
                let _ = reply.send(self.info());
            }
            Command::Subscribe {
                audience,
                sender,
                reply,
            } => {
                let id = self.next_subscriber;
                self.next_subscriber += 1;
                self.subscribers.insert(id, Subscriber { audience, sender });
                let _ = reply.send(id);
            }
            Command::Unsubscribe { id } => {
                self.subscribers.remove(&id);
            }
            Command::TurnWarning { epoch } => self.turn_warning(epoch),
            Command::TurnTimeout { epoch } => self.turn_timeout(epoch),
            Command::StartTimer { generation } => self.start_timer_fired(generation),
            Command::CleanupTimer { generation } => {
                if generation == self.cleanup_generation && self.engine.state().n() == 0 {
                    log::info!("[room {}] empty, closing", self.engine.id());
                    return false;
                }
            }
            Command::Shutdown => return false,
        }
        true
    }
}

/// Command handlers.
impl Room {
    fn join(&mut self, player: PlayerId, name: String, chips: Chips) -> Result<(), EngineError> {
        let events = self.engine.add_seat(player, name, chips)?;
        // a joiner cancels any pending empty-table teardown
        self.cleanup_generation += 1;
        self.integrate(events);
        if let StartSettings::MinPlayers { min } = self.engine.config().start_settings {
            if !self.engine.is_hand_live() && self.engine.state().n() >= min {
                self.arm_start();
            }
        }
        Ok(())
    }

    /// Between hands the seat goes immediately; mid-hand the request is
    /// queued and applied after `hand_complete`. The seat keeps playing
    /// (and gets force-acted on timeout) until then.
    fn leave(&mut self, player: PlayerId) -> Result<(), EngineError> {
        if self.engine.state().seat(player).is_none() {
            return Err(EngineError::UnknownSeat);
        }
        if self.engine.is_hand_live() {
            if !self.pending_unseats.contains(&player) {
                self.pending_unseats.push(player);
                log::debug!("[room {}] unseat of {} queued", self.engine.id(), player);
            }
            return Ok(());
        }
        let events = self.engine.remove_seat(player)?;
        self.integrate(events);
        if self.engine.state().n() == 0 {
            self.arm_cleanup();
        }
        Ok(())
    }

    fn start(&mut self, requester: Option<PlayerId>) -> Result<(), EngineError> {
        if let StartSettings::Manual {
            creator: Some(creator),
        } = self.engine.config().start_settings
        {
            if requester != Some(creator) {
                return Err(EngineError::PreconditionFailed(
                    "only the creator may start this game",
                ));
            }
        }
        let events = self.engine.start_hand()?;
        self.integrate(events);
        Ok(())
    }

    fn act(&mut self, player: PlayerId, action: Action) -> Result<(), EngineError> {
        match self.engine.process_action(player, action) {
            Ok(events) => {
                self.integrate(events);
                Ok(())
            }
            Err(e) => {
                if matches!(e, EngineError::Corrupt(_)) {
                    self.freeze(e.to_string());
                }
                Err(e)
            }
        }
    }

    fn turn_warning(&mut self, epoch: u64) {
        if self.frozen || !self.turn.is_current(epoch) {
            return;
        }
        if let Some(seat) = self.engine.state().to_act_id() {
            let remaining = self
                .turn
                .remaining()
                .map(|d| d.as_millis() as Millis)
                .unwrap_or(0);
            self.unicast(
                seat,
                Outbound::TurnWarning {
                    seat,
                    time_remaining_ms: remaining,
                },
            );
        }
    }

    fn turn_timeout(&mut self, epoch: u64) {
        if self.frozen || !self.turn.is_current(epoch) {
            return;
        }
        // the engine re-checks that the seat is still to act, so a firing
        // that raced a voluntary action through the queue is harmless
        let Some(seat) = self.engine.state().to_act_id() else {
            return;
        };
        match self.engine.force_timeout(seat) {
            Ok(events) => self.integrate(events),
            Err(e) => {
                log::error!("[room {}] timeout failed: {}", self.engine.id(), e);
                if matches!(e, EngineError::Corrupt(_)) {
                    self.freeze(e.to_string());
                }
            }
        }
    }

    fn start_timer_fired(&mut self, generation: u64) {
        if self.frozen || generation != self.start_generation || self.engine.is_hand_live() {
            return;
        }
        if self.engine.state().n() < felt_core::MIN_SEATS {
            return;
        }
        match self.engine.start_hand() {
            Ok(events) => self.integrate(events),
            Err(e) => log::debug!("[room {}] scheduled start skipped: {}", self.engine.id(), e),
        }
    }
}

/// Event plumbing.
impl Room {
    /// Records and fans out a batch of engine events, then reconciles
    /// derived state: queued unseats, the next turn timer, and the
    /// between-hands schedule.
    fn integrate(&mut self, events: Vec<GameEvent>) {
        let completed = events.iter().any(|e| e.kind == EventKind::HandComplete);
        self.publish(events);
        if completed {
            self.between_hands();
        }
        self.refresh_turn();
    }

    fn publish(&mut self, events: Vec<GameEvent>) {
        let game = self.engine.id();
        for event in events {
            let context = self.decision_context(&event);
            self.recorder.record(game, event.clone(), context);
            for subscriber in self.subscribers.values() {
                let projected = event.project(subscriber.audience);
                let _ = subscriber.sender.send(Outbound::Event(Box::new(projected)));
            }
            if event.kind == EventKind::PlayerLeft {
                if let Some(seat) = event.seat {
                    self.registry
                        .lock()
                        .expect("registry lock")
                        .release_seat(seat, game);
                }
            }
        }
    }

    /// Applies queued unseats, then schedules the next hand or, for an
    /// emptied table, its teardown.
    fn between_hands(&mut self) {
        for player in std::mem::take(&mut self.pending_unseats) {
            match self.engine.remove_seat(player) {
                Ok(events) => self.publish(events),
                Err(e) => {
                    // busted seats are already gone; nothing to apply
                    log::debug!("[room {}] queued unseat of {}: {}", self.engine.id(), player, e);
                }
            }
        }
        if self.engine.state().n() == 0 {
            self.arm_cleanup();
        } else if self.engine.state().n() >= felt_core::MIN_SEATS {
            self.arm_start();
        }
    }

    /// Arms the turn clock whenever the seat on the clock changes, and
    /// tells that seat its turn began.
    fn refresh_turn(&mut self) {
        if self.frozen {
            return;
        }
        match self.engine.state().to_act_id() {
            Some(seat) => {
                if self.pending_decision.as_ref().map(|p| p.seat) == Some(seat) {
                    return; // same turn, clock keeps running
                }
                self.turn.arm(self.tx.clone());
                self.pending_decision = Some(self.capture_decision(seat));
                let limit = self.turn.limit().as_millis() as Millis;
                self.unicast(
                    seat,
                    Outbound::TurnStart {
                        seat,
                        time_limit_ms: limit,
                    },
                );
            }
            None => {
                self.turn.cancel();
                self.pending_decision = None;
            }
        }
    }

    fn capture_decision(&self, seat: PlayerId) -> PendingDecision {
        let state = self.engine.state();
        let options = Rules::options(state, seat);
        let committed: Chips = state.seats().iter().map(|s| s.spent()).sum();
        let (stake, stack) = state
            .seat(seat)
            .map(|s| (s.stake(), s.stack()))
            .unwrap_or((0, 0));
        let to_call = state.high_bet().saturating_sub(stake).min(stack);
        let pot_odds = match to_call {
            0 => 0.0,
            c => c as f64 / (committed + c) as f64,
        };
        let effective_stack = state
            .seats()
            .iter()
            .filter(|s| !s.is_folded() && s.id() != seat)
            .map(|s| s.stack())
            .max()
            .unwrap_or(0)
            .min(stack);
        PendingDecision {
            seat,
            options,
            since: now_millis(),
            pot_odds,
            effective_stack,
        }
    }

    /// The context recorded with a seat's action: what it could do, how
    /// long it took, and the price it was facing.
    fn decision_context(&mut self, event: &GameEvent) -> Option<DecisionContext> {
        if event.kind != EventKind::ActionTaken {
            return None;
        }
        let pending = self.pending_decision.as_ref()?;
        if event.seat != Some(pending.seat) {
            return None;
        }
        let pending = self.pending_decision.take()?;
        Some(DecisionContext {
            possible_actions: pending.options,
            time_to_decide_ms: event.timestamp.saturating_sub(pending.since),
            pot_odds: pending.pot_odds,
            effective_stack: pending.effective_stack,
        })
    }

    fn unicast(&self, seat: PlayerId, message: Outbound) {
        for subscriber in self.subscribers.values() {
            if subscriber.audience == Audience::Seat(seat) {
                let _ = subscriber.sender.send(message.clone());
            }
        }
    }

    fn info(&self) -> GameInfo {
        let state = self.engine.state();
        let config = self.engine.config();
        GameInfo {
            game_id: state.id(),
            phase: state.phase(),
            hand_number: state.hand_number(),
            seats: state.n(),
            max_players: config.max_players,
            small_blind: config.small_blind_amount,
            big_blind: config.big_blind_amount,
            joinable: !self.frozen
                && !self.engine.is_hand_live()
                && state.n() < config.max_players,
        }
    }
}

/// Scheduling.
impl Room {
    fn arm_start(&mut self) {
        self.start_generation += 1;
        schedule(
            self.tx.clone(),
            self.engine.config().start_delay(),
            Command::StartTimer {
                generation: self.start_generation,
            },
        );
    }
    fn arm_cleanup(&mut self) {
        self.cleanup_generation += 1;
        schedule(
            self.tx.clone(),
            Duration::from_millis(felt_core::EMPTY_TABLE_CLEANUP_MS),
            Command::CleanupTimer {
                generation: self.cleanup_generation,
            },
        );
    }
}

/// Quarantine and teardown.
impl Room {
    /// An engine invariant broke: stop the clocks, tell every subscriber,
    /// and finalize the replay. The room stays up to answer with typed
    /// errors until the controller removes it.
    fn freeze(&mut self, message: String) {
        if self.frozen {
            return;
        }
        log::error!("[room {}] frozen: {}", self.engine.id(), message);
        self.frozen = true;
        self.turn.cancel();
        self.pending_decision = None;
        for subscriber in self.subscribers.values() {
            let _ = subscriber.sender.send(Outbound::Terminal {
                code: "ENGINE_CORRUPT",
                message: message.clone(),
            });
        }
        self.finalize();
    }
    fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;
        self.recorder
            .end(self.engine.id(), TableView::full(self.engine.state()));
    }
}
