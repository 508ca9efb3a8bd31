use felt_cards::Hole;
use felt_core::Chips;
use felt_core::ID;

/// Stable identity of a seated player across hands and tables.
pub type PlayerId = ID<Seat>;

/// Player betting status within a hand.
///
/// - `Betting` — Active and can still make decisions
/// - `Shoving` — All-in, no more decisions but still in the pot
/// - `Folding` — Out of the hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Betting,
    Shoving,
    Folding,
}

impl Status {
    /// True if the player is still competing for the pot.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Betting | Self::Shoving)
    }
}

/// A player's state at the table.
///
/// `stake` is the amount committed this betting round and `spent` the
/// amount committed this hand; `spent` doubles as the per-seat contribution
/// ledger from which side pots are derived. `stack + spent` is conserved
/// from hand start until pot distribution.
#[derive(Debug, Clone)]
pub struct Seat {
    id: PlayerId,
    name: String,
    stack: Chips,
    stake: Chips,
    spent: Chips,
    status: Status,
    acted: bool,
    hole: Option<Hole>,
}

impl Seat {
    pub fn new(id: PlayerId, name: impl Into<String>, stack: Chips) -> Self {
        Self {
            id,
            name: name.into(),
            stack,
            stake: 0,
            spent: 0,
            status: Status::Betting,
            acted: false,
            hole: None,
        }
    }
    pub fn id(&self) -> PlayerId {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Chips behind (not committed to the pot).
    pub fn stack(&self) -> Chips {
        self.stack
    }
    /// Chips committed this betting round.
    pub fn stake(&self) -> Chips {
        self.stake
    }
    /// Chips committed this hand; the contribution ledger for side pots.
    pub fn spent(&self) -> Chips {
        self.spent
    }
    pub fn status(&self) -> Status {
        self.status
    }
    /// Whether the seat has acted this betting round.
    pub fn acted(&self) -> bool {
        self.acted
    }
    pub fn hole(&self) -> Option<Hole> {
        self.hole
    }
    pub fn is_folded(&self) -> bool {
        self.status == Status::Folding
    }
    pub fn is_all_in(&self) -> bool {
        self.status == Status::Shoving
    }
}

impl Seat {
    /// Commits chips from stack to the pot, clamped to the stack.
    /// A seat that commits its last chip is all-in.
    pub fn bet(&mut self, amount: Chips) -> Chips {
        let paid = amount.min(self.stack);
        self.stack -= paid;
        self.stake += paid;
        self.spent += paid;
        if self.stack == 0 {
            self.status = Status::Shoving;
        }
        paid
    }
    /// Adds winnings to the stack.
    pub fn win(&mut self, amount: Chips) {
        self.stack += amount;
    }
    pub fn fold(&mut self) {
        self.status = Status::Folding;
    }
    pub fn mark_acted(&mut self) {
        self.acted = true;
    }
    /// Restores the right to act after a full raise reopens the round.
    pub fn reset_acted(&mut self) {
        self.acted = false;
    }
    pub fn deal(&mut self, hole: Hole) {
        self.hole = Some(hole);
    }
    /// Zeroes per-round counters on entry to a new street.
    pub fn reset_for_round(&mut self) {
        self.stake = 0;
        self.acted = false;
    }
    /// Zeroes per-hand fields, preserving the stack.
    pub fn reset_for_hand(&mut self) {
        self.stake = 0;
        self.spent = 0;
        self.acted = false;
        self.status = Status::Betting;
        self.hole = None;
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} ({} behind)", self.name, self.stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bet_moves_chips_to_ledger() {
        let mut seat = Seat::new(PlayerId::default(), "alice", 100);
        assert_eq!(seat.bet(40), 40);
        assert_eq!(seat.stack(), 60);
        assert_eq!(seat.stake(), 40);
        assert_eq!(seat.spent(), 40);
        assert_eq!(seat.status(), Status::Betting);
    }

    #[test]
    fn short_bet_is_all_in() {
        let mut seat = Seat::new(PlayerId::default(), "bob", 25);
        assert_eq!(seat.bet(40), 25);
        assert_eq!(seat.stack(), 0);
        assert!(seat.is_all_in());
    }

    #[test]
    fn round_reset_preserves_hand_ledger() {
        let mut seat = Seat::new(PlayerId::default(), "carol", 100);
        seat.bet(30);
        seat.mark_acted();
        seat.reset_for_round();
        assert_eq!(seat.stake(), 0);
        assert_eq!(seat.spent(), 30);
        assert!(!seat.acted());
    }

    #[test]
    fn hand_reset_preserves_stack() {
        let mut seat = Seat::new(PlayerId::default(), "dave", 100);
        seat.bet(30);
        seat.fold();
        seat.reset_for_hand();
        assert_eq!(seat.stack(), 70);
        assert_eq!(seat.spent(), 0);
        assert_eq!(seat.status(), Status::Betting);
        assert!(seat.hole().is_none());
    }
}
