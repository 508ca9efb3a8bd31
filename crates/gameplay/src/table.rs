use crate::phase::Phase;
use crate::pot::Pot;
use crate::seat::PlayerId;
use crate::seat::Seat;
use crate::seat::Status;
use felt_cards::Card;
use felt_core::Chips;
use felt_core::ID;
use felt_core::Position;

/// Stable identity of a table for its whole life.
pub type GameId = ID<TableState>;

/// The authoritative state of one table.
///
/// Constructed once per table and mutated in place hand by hand. Blind
/// positions are derived from the dealer button and seat count rather than
/// stored: heads-up the button posts the small blind, otherwise the blinds
/// sit directly after the button.
#[derive(Debug, Clone)]
pub struct TableState {
    pub(crate) id: GameId,
    pub(crate) phase: Phase,
    pub(crate) hand_number: u64,
    pub(crate) dealer: Position,
    pub(crate) small_blind: Chips,
    pub(crate) big_blind: Chips,
    pub(crate) min_raise: Chips,
    pub(crate) board: Vec<Card>,
    pub(crate) seats: Vec<Seat>,
    pub(crate) pots: Vec<Pot>,
    pub(crate) to_act: Option<Position>,
    pub(crate) aggressor: Option<Position>,
}

impl TableState {
    pub fn new(id: GameId, small_blind: Chips, big_blind: Chips) -> Self {
        Self {
            id,
            phase: Phase::HandComplete,
            hand_number: 0,
            dealer: 0,
            small_blind,
            big_blind,
            min_raise: big_blind,
            board: Vec::new(),
            seats: Vec::new(),
            pots: Vec::new(),
            to_act: None,
            aggressor: None,
        }
    }
}

/// Public state accessors.
impl TableState {
    pub fn id(&self) -> GameId {
        self.id
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn hand_number(&self) -> u64 {
        self.hand_number
    }
    pub fn dealer(&self) -> Position {
        self.dealer
    }
    pub fn small_blind(&self) -> Chips {
        self.small_blind
    }
    pub fn big_blind(&self) -> Chips {
        self.big_blind
    }
    /// Current minimum raise increment.
    pub fn min_raise(&self) -> Chips {
        self.min_raise
    }
    pub fn board(&self) -> &[Card] {
        &self.board
    }
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }
    pub fn pots(&self) -> &[Pot] {
        &self.pots
    }
    /// Position of the seat whose turn it is, if any.
    pub fn to_act(&self) -> Option<Position> {
        self.to_act
    }
    /// Identity of the seat whose turn it is, if any.
    pub fn to_act_id(&self) -> Option<PlayerId> {
        self.to_act.map(|pos| self.seats[pos].id())
    }
    /// The last seat to bet or fully raise this round.
    pub fn aggressor(&self) -> Option<Position> {
        self.aggressor
    }
    pub fn n(&self) -> usize {
        self.seats.len()
    }
    pub fn is_heads_up(&self) -> bool {
        self.n() == 2
    }
}

/// Seat lookups.
impl TableState {
    pub fn seat(&self, id: PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id() == id)
    }
    pub(crate) fn seat_mut(&mut self, id: PlayerId) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| s.id() == id)
    }
    pub fn position_of(&self, id: PlayerId) -> Option<Position> {
        self.seats.iter().position(|s| s.id() == id)
    }
    /// Seats still contesting the hand (not folded).
    pub fn in_hand(&self) -> usize {
        self.seats.iter().filter(|s| !s.is_folded()).count()
    }
    /// Seats that can still make decisions (not folded, not all-in).
    pub fn still_betting(&self) -> usize {
        self.seats
            .iter()
            .filter(|s| s.status() == Status::Betting)
            .count()
    }
    /// Seats able to buy into the next hand.
    pub fn with_chips(&self) -> usize {
        self.seats.iter().filter(|s| s.stack() > 0).count()
    }
}

/// Position arithmetic.
impl TableState {
    /// Small blind position: the button heads-up, otherwise next after it.
    pub fn sb_position(&self) -> Position {
        if self.is_heads_up() {
            self.dealer
        } else {
            (self.dealer + 1) % self.n()
        }
    }
    /// Big blind position: one past the small blind.
    pub fn bb_position(&self) -> Position {
        (self.sb_position() + 1) % self.n()
    }
    /// Highest per-round commitment among all seats.
    pub fn high_bet(&self) -> Chips {
        self.seats.iter().map(Seat::stake).max().unwrap_or(0)
    }
    /// First decision of the hand: the small blind heads-up, otherwise the
    /// seat after the big blind.
    pub fn first_to_act_preflop(&self) -> Option<Position> {
        if self.is_heads_up() {
            Some(self.sb_position()).filter(|&p| self.seats[p].status() == Status::Betting)
                .or_else(|| self.next_betting_after(self.sb_position()))
        } else {
            self.next_betting_after(self.bb_position())
        }
    }
    /// First decision on later streets: first live seat after the button.
    pub fn first_to_act_postflop(&self) -> Option<Position> {
        self.next_betting_after(self.dealer)
    }
    /// Next seat after `pos` (cyclically) that can still act.
    pub fn next_betting_after(&self, pos: Position) -> Option<Position> {
        (1..=self.n())
            .map(|i| (pos + i) % self.n())
            .find(|&i| self.seats[i].status() == Status::Betting)
    }
    /// In-hand seats in post-button rotation, for showdown order, odd
    /// chips, and orphaned-pot fallback.
    pub fn post_button_order(&self) -> Vec<PlayerId> {
        (1..=self.n())
            .map(|i| (self.dealer + i) % self.n())
            .filter(|&i| !self.seats[i].is_folded())
            .map(|i| self.seats[i].id())
            .collect()
    }
}

/// Betting round closure.
impl TableState {
    /// A round is complete when one seat remains, or when every seat that
    /// can still act has acted and matched the round's high bet.
    pub fn round_complete(&self) -> bool {
        if self.in_hand() <= 1 {
            return true;
        }
        let high = self.high_bet();
        self.seats
            .iter()
            .filter(|s| s.status() == Status::Betting)
            .all(|s| s.acted() && s.stake() == high)
    }
}

/// Per-hand lifecycle mutations.
impl TableState {
    /// Zeroes per-hand fields, advances the button to the next funded
    /// seat, and bumps the hand counter. Stacks carry over.
    pub(crate) fn reset_for_new_hand(&mut self) {
        debug_assert!(self.with_chips() >= felt_core::MIN_SEATS);
        self.board.clear();
        self.pots.clear();
        self.phase = Phase::PreFlop;
        self.hand_number += 1;
        self.min_raise = self.big_blind;
        self.to_act = None;
        self.aggressor = None;
        for seat in self.seats.iter_mut() {
            seat.reset_for_hand();
        }
        self.dealer %= self.n();
        self.dealer = (1..=self.n())
            .map(|i| (self.dealer + i) % self.n())
            .find(|&i| self.seats[i].stack() > 0)
            .unwrap_or(self.dealer);
    }
    /// Zeroes per-round counters on entry to a new street.
    pub(crate) fn reset_for_round(&mut self) {
        self.min_raise = self.big_blind;
        self.aggressor = None;
        for seat in self.seats.iter_mut() {
            seat.reset_for_round();
        }
    }
    /// Removes a seat between hands, keeping the button in range.
    pub(crate) fn remove(&mut self, id: PlayerId) -> Option<Seat> {
        let pos = self.position_of(id)?;
        let seat = self.seats.remove(pos);
        if pos < self.dealer {
            self.dealer -= 1;
        }
        if !self.seats.is_empty() {
            self.dealer %= self.seats.len();
        } else {
            self.dealer = 0;
        }
        Some(seat)
    }
}
