use crate::action::Action;
use crate::config::GameConfig;
use crate::event::EventKind;
use crate::event::GameEvent;
use crate::event::Reveal;
use crate::event::Winner;
use crate::phase::Phase;
use crate::pot::Pot;
use crate::rules::RejectReason;
use crate::rules::Rules;
use crate::seat::PlayerId;
use crate::seat::Seat;
use crate::table::GameId;
use crate::table::TableState;
use crate::view::Audience;
use crate::view::BotView;
use crate::view::TableView;
use felt_cards::Card;
use felt_cards::Deck;
use felt_cards::Evaluator;
use felt_core::Chips;

/// Failure modes of engine operations.
///
/// `Rejected` and the precondition variants are recoverable and cause no
/// state change. `Corrupt` is fatal per table: the engine refuses all
/// further work and the table must be quarantined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Rejected(RejectReason),
    GameRunning,
    TableFull,
    AlreadySeated,
    UnknownSeat,
    NotEnoughPlayers,
    PreconditionFailed(&'static str),
    Corrupt(String),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "ACTION_REJECTED",
            Self::GameRunning => "GAME_RUNNING",
            Self::TableFull => "TABLE_FULL",
            Self::AlreadySeated => "ALREADY_SEATED",
            Self::UnknownSeat => "UNKNOWN_SEAT",
            Self::NotEnoughPlayers => "NOT_ENOUGH_PLAYERS",
            Self::PreconditionFailed(_) => "PRECONDITION_FAILED",
            Self::Corrupt(_) => "ENGINE_CORRUPT",
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(reason) => write!(f, "action rejected: {}", reason),
            Self::GameRunning => write!(f, "a hand is in progress"),
            Self::TableFull => write!(f, "the table is full"),
            Self::AlreadySeated => write!(f, "the seat is already at this table"),
            Self::UnknownSeat => write!(f, "no such seat at this table"),
            Self::NotEnoughPlayers => write!(f, "at least two funded seats are required"),
            Self::PreconditionFailed(msg) => write!(f, "precondition failed: {}", msg),
            Self::Corrupt(msg) => write!(f, "engine corrupt: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<RejectReason> for EngineError {
    fn from(reason: RejectReason) -> Self {
        Self::Rejected(reason)
    }
}

/// Orchestrates one table's hand lifecycle and emits events.
///
/// The engine is the functional core: every operation either mutates state
/// and returns the events describing what happened, or returns a typed
/// error and changes nothing. It is driven by the gameroom's per-table
/// command loop and never blocks or performs I/O.
///
/// After every mutation the engine audits chip conservation; a mismatch
/// marks it corrupt and every subsequent call fails fast.
#[derive(Debug)]
pub struct Engine {
    state: TableState,
    deck: Deck,
    config: GameConfig,
    baseline: Chips,
    departing: Vec<PlayerId>,
    corrupt: Option<String>,
}

impl Engine {
    pub fn new(id: GameId, config: GameConfig) -> Self {
        let deck = match config.rng_seed {
            Some(seed) => Deck::seeded(seed),
            None => Deck::new(),
        };
        Self {
            state: TableState::new(id, config.small_blind_amount, config.big_blind_amount),
            deck,
            config,
            baseline: 0,
            departing: Vec::new(),
            corrupt: None,
        }
    }
    pub fn id(&self) -> GameId {
        self.state.id()
    }
    pub fn state(&self) -> &TableState {
        &self.state
    }
    pub fn config(&self) -> &GameConfig {
        &self.config
    }
    pub fn deck(&self) -> &Deck {
        &self.deck
    }
    pub fn is_hand_live(&self) -> bool {
        self.state.phase().is_live()
    }
    pub fn is_corrupt(&self) -> bool {
        self.corrupt.is_some()
    }
    fn guard(&self) -> Result<(), EngineError> {
        match &self.corrupt {
            Some(msg) => Err(EngineError::Corrupt(msg.clone())),
            None => Ok(()),
        }
    }
    fn quarantine(&mut self, msg: String) -> EngineError {
        log::error!("[engine {}] quarantined: {}", self.state.id(), msg);
        self.corrupt = Some(msg.clone());
        EngineError::Corrupt(msg)
    }
    fn emit(&self, kind: EventKind) -> GameEvent {
        GameEvent::of(kind, &self.state)
    }
}

/// Seating.
impl Engine {
    /// Seats a player. Fails while a hand is live.
    pub fn add_seat(
        &mut self,
        id: PlayerId,
        name: impl Into<String>,
        chips: Chips,
    ) -> Result<Vec<GameEvent>, EngineError> {
        self.guard()?;
        if self.is_hand_live() {
            return Err(EngineError::GameRunning);
        }
        if self.state.n() >= self.config.max_players {
            return Err(EngineError::TableFull);
        }
        if self.state.seat(id).is_some() {
            return Err(EngineError::AlreadySeated);
        }
        if chips == 0 {
            return Err(EngineError::PreconditionFailed("buy-in must be positive"));
        }
        self.state.seats.push(Seat::new(id, name, chips));
        log::info!("[engine {}] seat {} joined", self.state.id(), id);
        Ok(vec![self.emit(EventKind::PlayerJoined).with_seat(id)])
    }

    /// Unseats a player. Always allowed: mid-hand the seat folds and is
    /// purged at hand end, between hands it is removed immediately.
    pub fn remove_seat(&mut self, id: PlayerId) -> Result<Vec<GameEvent>, EngineError> {
        self.guard()?;
        let pos = self.state.position_of(id).ok_or(EngineError::UnknownSeat)?;
        let mut events = Vec::new();
        if self.is_hand_live() {
            let was_to_act = self.state.to_act() == Some(pos);
            let was_in_hand = !self.state.seats[pos].is_folded();
            self.state.seats[pos].fold();
            self.departing.push(id);
            events.push(self.emit(EventKind::PlayerLeft).with_seat(id));
            if was_in_hand {
                if self.state.in_hand() == 1 {
                    self.settle_uncontested(&mut events)?;
                } else if was_to_act {
                    self.advance(pos, &mut events)?;
                }
            }
            self.audit()?;
        } else {
            self.state.remove(id);
            self.departing.retain(|&d| d != id);
            events.push(self.emit(EventKind::PlayerLeft).with_seat(id));
        }
        log::info!("[engine {}] seat {} left", self.state.id(), id);
        Ok(events)
    }
}

/// Hand lifecycle.
impl Engine {
    /// Deals the next hand: advances the button, shuffles, deals hole
    /// cards around the table, posts blinds, and opens the first round.
    pub fn start_hand(&mut self) -> Result<Vec<GameEvent>, EngineError> {
        self.guard()?;
        if self.is_hand_live() {
            return Err(EngineError::GameRunning);
        }
        if self.state.with_chips() < felt_core::MIN_SEATS {
            return Err(EngineError::NotEnoughPlayers);
        }
        self.state.reset_for_new_hand();
        self.baseline = self.state.seats.iter().map(Seat::stack).sum();
        self.deck.reset();
        self.deck.shuffle();
        let mut events = vec![self.emit(EventKind::HandStarted)];
        let n = self.state.n();
        let sb = self.state.sb_position();
        let holes = self
            .deck
            .deal_hole_cards(n)
            .map_err(|e| self.quarantine(e.to_string()))?;
        for (i, hole) in holes.into_iter().enumerate() {
            self.state.seats[(sb + i) % n].deal(hole);
        }
        events.push(self.emit(EventKind::HoleCardsDealt));
        let blinds = (self.state.small_blind, self.state.big_blind);
        let (sbp, bbp) = (self.state.sb_position(), self.state.bb_position());
        self.state.seats[sbp].bet(blinds.0);
        self.state.seats[bbp].bet(blinds.1);
        self.state.min_raise = self.state.big_blind;
        self.state.to_act = self.state.first_to_act_preflop();
        events.push(self.emit(EventKind::BlindsPosted));
        log::info!(
            "[engine {}] hand #{} started, button at {}",
            self.state.id(),
            self.state.hand_number(),
            self.state.dealer()
        );
        // blinds alone can put every seat all-in; run the board out
        if self.state.round_complete() {
            self.advance_phase(&mut events)?;
        }
        self.audit()?;
        Ok(events)
    }

    /// Validates and applies one action, then moves the hand forward:
    /// next seat, next street, or settlement.
    pub fn process_action(
        &mut self,
        player: PlayerId,
        action: Action,
    ) -> Result<Vec<GameEvent>, EngineError> {
        self.guard()?;
        Rules::validate(&self.state, player, action)?;
        let pos = self.state.position_of(player).ok_or(EngineError::UnknownSeat)?;
        self.apply(pos, action);
        log::debug!("[engine {}] seat {} {}", self.state.id(), player, action);
        let mut events = vec![
            self.emit(EventKind::ActionTaken)
                .with_seat(player)
                .with_action(action),
        ];
        self.advance(pos, &mut events)?;
        self.audit()?;
        Ok(events)
    }

    /// Times a seat out: emits `player_timeout`, then applies check when
    /// free, fold otherwise. A timeout that raced a voluntary action and
    /// lost is a no-op.
    pub fn force_timeout(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, EngineError> {
        self.guard()?;
        if self.state.to_act_id() != Some(player) {
            return Ok(Vec::new());
        }
        let forced = Rules::forced(&self.state, player);
        log::info!(
            "[engine {}] seat {} timed out, forcing {}",
            self.state.id(),
            player,
            forced
        );
        let mut events = vec![self.emit(EventKind::PlayerTimeout).with_seat(player)];
        events.extend(self.process_action(player, forced)?);
        Ok(events)
    }

    /// The per-seat projection: public state, own hole cards, and legal
    /// moves (empty when not to act). The room adds the turn budget.
    pub fn snapshot_for(&self, player: PlayerId) -> BotView {
        BotView {
            view: TableView::full(&self.state).project(Audience::Seat(player)),
            possible_actions: Rules::options(&self.state, player),
            time_remaining_ms: None,
        }
    }
}

/// Action application.
impl Engine {
    fn apply(&mut self, pos: usize, action: Action) {
        let high = self.state.high_bet();
        let (stake, stack) = {
            let seat = &self.state.seats[pos];
            (seat.stake(), seat.stack())
        };
        match action {
            Action::Fold => self.state.seats[pos].fold(),
            Action::Check => {}
            Action::Call => {
                self.state.seats[pos].bet(high - stake);
            }
            Action::Bet { amount } => {
                self.state.seats[pos].bet(amount);
                self.state.min_raise = amount;
                self.state.aggressor = Some(pos);
                self.reopen(pos);
            }
            Action::Raise { amount } => {
                self.state.seats[pos].bet(amount - stake);
                self.raise_to(pos, amount, high);
            }
            Action::AllIn => {
                let total = stake + stack;
                self.state.seats[pos].bet(stack);
                if total > high {
                    self.raise_to(pos, total, high);
                }
            }
        }
        self.state.seats[pos].mark_acted();
    }
    /// A full raise resets everyone else's right to act; a short all-in
    /// raise stands but reopens nothing.
    fn raise_to(&mut self, pos: usize, total: Chips, high: Chips) {
        let increment = total - high;
        if increment >= self.state.min_raise {
            self.state.min_raise = increment;
            self.state.aggressor = Some(pos);
            self.reopen(pos);
        }
    }
    fn reopen(&mut self, pos: usize) {
        for (i, seat) in self.state.seats.iter_mut().enumerate() {
            if i != pos && seat.status() == crate::Status::Betting {
                seat.reset_acted();
            }
        }
    }
    fn advance(&mut self, from: usize, events: &mut Vec<GameEvent>) -> Result<(), EngineError> {
        if self.state.in_hand() == 1 {
            return self.settle_uncontested(events);
        }
        if self.state.round_complete() {
            return self.advance_phase(events);
        }
        self.state.to_act = self.state.next_betting_after(from);
        Ok(())
    }
}

/// Phase machine.
impl Engine {
    /// Closes the current round (pots derive from the ledger), deals the
    /// next street, and keeps going through streets nobody can bet on.
    fn advance_phase(&mut self, events: &mut Vec<GameEvent>) -> Result<(), EngineError> {
        loop {
            self.state.pots = Pot::form(&self.state.seats);
            self.state.reset_for_round();
            self.state.to_act = None;
            match self.state.phase {
                Phase::PreFlop => {
                    let flop = self
                        .deck
                        .deal_flop()
                        .map_err(|e| self.quarantine(e.to_string()))?;
                    self.state.board.extend(flop);
                    self.state.phase = Phase::Flop;
                    events.push(self.emit(EventKind::FlopDealt));
                }
                Phase::Flop => {
                    let turn = self
                        .deck
                        .deal_turn()
                        .map_err(|e| self.quarantine(e.to_string()))?;
                    self.state.board.push(turn);
                    self.state.phase = Phase::Turn;
                    events.push(self.emit(EventKind::TurnDealt));
                }
                Phase::Turn => {
                    let river = self
                        .deck
                        .deal_river()
                        .map_err(|e| self.quarantine(e.to_string()))?;
                    self.state.board.push(river);
                    self.state.phase = Phase::River;
                    events.push(self.emit(EventKind::RiverDealt));
                }
                Phase::River => {
                    return self.settle_showdown(events);
                }
                Phase::Showdown | Phase::HandComplete => {
                    return Err(self.quarantine("phase advance from terminal phase".to_string()));
                }
            }
            if self.state.still_betting() >= 2 {
                self.state.to_act = self.state.first_to_act_postflop();
                return Ok(());
            }
        }
    }

    /// Evaluates the survivors, distributes every pot layer, and closes
    /// the hand with `showdown_complete` then `hand_complete`.
    fn settle_showdown(&mut self, events: &mut Vec<GameEvent>) -> Result<(), EngineError> {
        self.state.phase = Phase::Showdown;
        let board = self.state.board.clone();
        let contenders: Vec<(PlayerId, Option<felt_cards::Hole>)> = self
            .state
            .seats
            .iter()
            .filter(|s| !s.is_folded())
            .map(|s| (s.id(), s.hole()))
            .collect();
        let mut reveals = Vec::new();
        let mut strengths = Vec::new();
        for (id, hole) in contenders {
            let hole = match hole {
                Some(hole) => hole,
                None => {
                    return Err(self.quarantine(format!("seat {} has no cards at showdown", id)));
                }
            };
            let mut cards: Vec<Card> = hole.into_iter().collect();
            cards.extend(board.iter().copied());
            let strength = Evaluator::strength(&cards);
            reveals.push(Reveal {
                seat: id,
                hole_cards: hole,
                strength: strength.clone(),
            });
            strengths.push((id, strength));
        }
        let order = self.state.post_button_order();
        let rewards = match Pot::distribute(&self.state.pots, &strengths, &order) {
            Ok(rewards) => rewards,
            Err(e) => return Err(self.quarantine(e.to_string())),
        };
        for (id, amount) in rewards.iter() {
            if let Some(seat) = self.state.seat_mut(*id) {
                seat.win(*amount);
            }
        }
        events.push(self.emit(EventKind::ShowdownComplete).with_reveals(reveals));
        let winners = rewards
            .into_iter()
            .map(|(seat, amount)| Winner { seat, amount })
            .collect();
        self.complete_hand(winners, events)
    }

    /// Everyone else folded: the last seat takes every layer without a
    /// showdown. A single terminal `hand_complete` carries the winner.
    fn settle_uncontested(&mut self, events: &mut Vec<GameEvent>) -> Result<(), EngineError> {
        self.state.pots = Pot::form(&self.state.seats);
        let total: Chips = self.state.pots.iter().map(Pot::amount).sum();
        let winner = match self.state.seats.iter().find(|s| !s.is_folded()) {
            Some(seat) => seat.id(),
            None => return Err(self.quarantine("no seat left in the hand".to_string())),
        };
        if let Some(seat) = self.state.seat_mut(winner) {
            seat.win(total);
        }
        self.complete_hand(
            vec![Winner {
                seat: winner,
                amount: total,
            }],
            events,
        )
    }

    fn complete_hand(
        &mut self,
        winners: Vec<Winner>,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), EngineError> {
        self.state.phase = Phase::HandComplete;
        self.state.to_act = None;
        events.push(self.emit(EventKind::HandComplete).with_winners(winners));
        let settled: Chips = self.state.seats.iter().map(Seat::stack).sum();
        if settled != self.baseline {
            return Err(self.quarantine(format!(
                "pot arithmetic mismatch: {} settled, {} at hand start",
                settled, self.baseline
            )));
        }
        self.purge(events);
        log::info!(
            "[engine {}] hand #{} complete",
            self.state.id(),
            self.state.hand_number()
        );
        Ok(())
    }

    /// Drops busted seats (with a `player_left` each) and seats that left
    /// mid-hand (already announced).
    fn purge(&mut self, events: &mut Vec<GameEvent>) {
        let busted: Vec<PlayerId> = self
            .state
            .seats
            .iter()
            .filter(|s| s.stack() == 0)
            .map(Seat::id)
            .collect();
        for id in busted {
            self.state.remove(id);
            self.departing.retain(|&d| d != id);
            events.push(self.emit(EventKind::PlayerLeft).with_seat(id));
        }
        for id in std::mem::take(&mut self.departing) {
            self.state.remove(id);
        }
    }

    /// Chip conservation: stacks plus the hand's ledger always equal the
    /// chips that started the hand.
    fn audit(&mut self) -> Result<(), EngineError> {
        if self.state.phase == Phase::HandComplete {
            return Ok(()); // settled totals were checked before the purge
        }
        let total: Chips = self
            .state
            .seats
            .iter()
            .map(|s| s.stack() + s.spent())
            .sum();
        match total == self.baseline {
            true => Ok(()),
            false => Err(self.quarantine(format!(
                "chip conservation violated: {} in play, {} at hand start",
                total, self.baseline
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ActionKind;
    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn engine(stacks: &[Chips], seed: u64) -> (Engine, Vec<PlayerId>) {
        let config = GameConfig {
            small_blind_amount: 10,
            big_blind_amount: 20,
            rng_seed: Some(seed),
            ..GameConfig::default()
        };
        let mut engine = Engine::new(GameId::default(), config);
        let ids: Vec<PlayerId> = stacks
            .iter()
            .enumerate()
            .map(|(i, &stack)| {
                let id = PlayerId::default();
                engine.add_seat(id, format!("bot{}", i), stack).unwrap();
                id
            })
            .collect();
        (engine, ids)
    }

    fn kinds(events: &[GameEvent]) -> Vec<EventKind> {
        events.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn seating_rules() {
        let (mut engine, ids) = engine(&[1_000, 1_000], 1);
        assert_eq!(
            engine.add_seat(ids[0], "again", 500),
            Err(EngineError::AlreadySeated)
        );
        assert_eq!(
            engine.add_seat(PlayerId::default(), "broke", 0),
            Err(EngineError::PreconditionFailed("buy-in must be positive"))
        );
        engine.start_hand().unwrap();
        assert_eq!(
            engine.add_seat(PlayerId::default(), "late", 500),
            Err(EngineError::GameRunning)
        );
    }

    #[test]
    fn start_requires_two_funded_seats() {
        let config = GameConfig::default();
        let mut engine = Engine::new(GameId::default(), config);
        engine.add_seat(PlayerId::default(), "solo", 500).unwrap();
        assert_eq!(engine.start_hand(), Err(EngineError::NotEnoughPlayers));
    }

    /// Heads-up fold preflop: the small blind folds, the big blind takes
    /// the blinds uncontested, one terminal hand_complete.
    #[test]
    fn heads_up_fold_preflop() {
        let (mut engine, ids) = engine(&[1_000, 1_000], 42);
        let events = engine.start_hand().unwrap();
        assert_eq!(
            kinds(&events),
            vec![
                EventKind::HandStarted,
                EventKind::HoleCardsDealt,
                EventKind::BlindsPosted
            ]
        );
        let state = engine.state();
        // heads-up: the button posts the small blind and acts first
        assert_eq!(state.sb_position(), state.dealer());
        let sb = state.to_act_id().unwrap();
        let bb = ids.iter().copied().find(|&id| id != sb).unwrap();
        let events = engine.process_action(sb, Action::Fold).unwrap();
        assert_eq!(
            kinds(&events),
            vec![EventKind::ActionTaken, EventKind::HandComplete]
        );
        let winners = events.last().unwrap().winners.clone().unwrap();
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].seat, bb);
        assert_eq!(winners[0].amount, 30);
        // the folder surrenders its small blind; the winner nets it
        assert_eq!(engine.state().seat(sb).unwrap().stack(), 990);
        assert_eq!(engine.state().seat(bb).unwrap().stack(), 1_010);
        assert!(!engine.is_hand_live());
    }

    /// Three-way all-in forms a single main pot; the winners at showdown
    /// take all of it and busted seats are purged.
    #[test]
    fn three_way_all_in_single_pot() {
        let (mut engine, ids) = engine(&[100, 300, 300], 7);
        let short = ids[0];
        engine.start_hand().unwrap();
        // the short stack shoves; everyone else calls 100, then checks the
        // board down
        let mut terminal = Vec::new();
        let mut guard = 0;
        while engine.is_hand_live() {
            let actor = match engine.state().to_act_id() {
                Some(actor) => actor,
                None => break,
            };
            let action = if actor == short {
                Action::AllIn
            } else if engine.state().high_bet() > engine.state().seat(actor).unwrap().stake() {
                Action::Call
            } else {
                Action::Check
            };
            terminal = engine.process_action(actor, action).unwrap();
            guard += 1;
            assert!(guard < 64, "hand failed to terminate");
        }
        assert!(!engine.is_hand_live());
        let pots = engine.state().pots();
        assert_eq!(pots.len(), 1, "equal contributions form no side pot");
        assert_eq!(pots[0].amount(), 300);
        assert_eq!(pots[0].eligible().len(), 3);
        // the terminal events are showdown_complete then hand_complete,
        // and the payouts cover exactly the main pot
        let showdown = terminal
            .iter()
            .find(|e| e.kind == EventKind::ShowdownComplete)
            .unwrap();
        assert_eq!(showdown.reveals.as_ref().unwrap().len(), 3);
        let complete = terminal
            .iter()
            .find(|e| e.kind == EventKind::HandComplete)
            .unwrap();
        let paid: Chips = complete
            .winners
            .as_ref()
            .unwrap()
            .iter()
            .map(|w| w.amount)
            .sum();
        assert_eq!(paid, 300);
        // chips conserve and whoever hit zero is gone before the next hand
        let total: Chips = engine.state().seats().iter().map(Seat::stack).sum();
        assert_eq!(total, 700);
        assert!(engine.state().seats().iter().all(|s| s.stack() > 0));
    }

    /// A short all-in over a raise stands but does not reopen the action:
    /// seats that already acted may call but not re-raise.
    #[test]
    fn short_all_in_does_not_reopen() {
        // first hand: button at seat 1, blinds at 2 and 0, seat 1 opens
        let (mut engine, ids) = engine(&[1_000, 1_000, 55], 11);
        engine.start_hand().unwrap();
        let opener = engine.state().to_act_id().unwrap();
        assert_eq!(opener, ids[1]);
        engine
            .process_action(opener, Action::Raise { amount: 40 })
            .unwrap();
        // the small blind's whole stack is 55: over 40 but under the
        // minimum raise to 60
        let jammer = engine.state().to_act_id().unwrap();
        assert_eq!(jammer, ids[2]);
        engine.process_action(jammer, Action::AllIn).unwrap();
        assert_eq!(engine.state().high_bet(), 55);
        assert_eq!(engine.state().min_raise(), 20);
        let caller = engine.state().to_act_id().unwrap();
        engine.process_action(caller, Action::Call).unwrap();
        // action returns to the opener, who already acted: raising is off
        assert_eq!(engine.state().to_act_id(), Some(opener));
        assert_eq!(
            engine.process_action(opener, Action::Raise { amount: 200 }),
            Err(EngineError::Rejected(RejectReason::CannotReraise))
        );
        engine.process_action(opener, Action::Call).unwrap();
        // the round closed at 55 and the flop is out
        assert_eq!(engine.state().phase(), Phase::Flop);
        assert!(engine.state().seat(jammer).unwrap().is_all_in());
    }

    #[test]
    fn timeout_checks_when_free_and_races_are_noops() {
        let (mut engine, ids) = engine(&[500, 500], 3);
        engine.start_hand().unwrap();
        let actor = engine.state().to_act_id().unwrap();
        let waiter = ids.iter().copied().find(|&id| id != actor).unwrap();
        // a stale timeout for the seat not to act does nothing
        assert!(engine.force_timeout(waiter).unwrap().is_empty());
        // the seat to act is facing the big blind: forced action folds
        let events = engine.force_timeout(actor).unwrap();
        assert_eq!(events[0].kind, EventKind::PlayerTimeout);
        assert_eq!(events[1].kind, EventKind::ActionTaken);
        assert_eq!(events[1].action, Some(Action::Fold));
        // late voluntary action from the timed-out seat is rejected
        assert_eq!(
            engine.process_action(actor, Action::Call),
            Err(EngineError::Rejected(RejectReason::NotToAct))
        );
    }

    #[test]
    fn mid_hand_leave_folds_and_purges_at_hand_end() {
        let (mut engine, ids) = engine(&[500, 500, 500], 5);
        engine.start_hand().unwrap();
        let leaver = ids
            .iter()
            .copied()
            .find(|&id| engine.state().to_act_id() != Some(id))
            .unwrap();
        let events = engine.remove_seat(leaver).unwrap();
        assert_eq!(events[0].kind, EventKind::PlayerLeft);
        // the seat still occupies its position until the hand ends
        assert_eq!(engine.state().n(), 3);
        assert!(engine.state().seat(leaver).unwrap().is_folded());
        // fold the hand out
        while let Some(actor) = engine.state().to_act_id() {
            let action = Rules::forced(engine.state(), actor);
            engine.process_action(actor, action).unwrap();
        }
        assert!(!engine.is_hand_live());
        assert!(engine.state().seat(leaver).is_none());
    }

    #[test]
    fn corrupt_engine_refuses_everything() {
        let (mut engine, ids) = engine(&[500, 500], 9);
        engine.start_hand().unwrap();
        engine.corrupt = Some("induced for test".to_string());
        assert!(matches!(
            engine.process_action(ids[0], Action::Fold),
            Err(EngineError::Corrupt(_))
        ));
        assert!(matches!(engine.start_hand(), Err(EngineError::Corrupt(_))));
    }

    /// Random walk over many hands: every transition preserves chip
    /// conservation, deck validity, pot eligibility monotonicity, and
    /// betting-round closure.
    #[test]
    fn random_walk_preserves_invariants() {
        let (mut engine, _) = engine(&[300, 500, 800, 200], 1738);
        let mut rng = SmallRng::seed_from_u64(99);
        let mut hands = 0;
        while hands < 40 && engine.state().n() >= 2 {
            engine.start_hand().unwrap();
            while let Some(actor) = engine.state().to_act_id() {
                let options = Rules::options(engine.state(), actor);
                assert!(!options.is_empty());
                let pick = &options[rng.random_range(0..options.len())];
                let action = match pick.action {
                    ActionKind::Fold => Action::Fold,
                    ActionKind::Check => Action::Check,
                    ActionKind::Call => Action::Call,
                    ActionKind::AllIn => Action::AllIn,
                    ActionKind::Bet => Action::Bet {
                        amount: rng.random_range(pick.min.unwrap()..=pick.max.unwrap()),
                    },
                    ActionKind::Raise => Action::Raise {
                        amount: rng.random_range(pick.min.unwrap()..=pick.max.unwrap()),
                    },
                };
                engine.process_action(actor, action).unwrap();
                // deck stays a permutation of 52 unique cards
                engine.deck().validate().unwrap();
                // side-pot eligibility shrinks monotonically
                let mut last = usize::MAX;
                for pot in engine.state().pots() {
                    assert!(pot.eligible().len() <= last);
                    last = pot.eligible().len();
                }
                // a seat on the clock can always still act
                if let Some(pos) = engine.state().to_act() {
                    assert_eq!(engine.state().seats()[pos].status(), crate::Status::Betting);
                    assert!(!engine.state().round_complete());
                }
            }
            assert!(!engine.is_hand_live());
            hands += 1;
        }
        assert!(hands > 0);
    }
}
