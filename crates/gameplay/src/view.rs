use crate::phase::Phase;
use crate::pot::Pot;
use crate::rules::ActionOption;
use crate::seat::PlayerId;
use crate::seat::Seat;
use crate::table::GameId;
use crate::table::TableState;
use felt_cards::Card;
use felt_cards::Hole;
use felt_core::Chips;
use felt_core::Millis;
use felt_core::Position;

/// Who a projected snapshot is for.
///
/// Visibility is a projection, not a privilege: the authoritative
/// [`TableState`] is complete, and every outbound delivery passes through
/// [`TableView::project`], which is the single place the hole-card secrecy
/// rule lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// The named seat: sees its own hole cards always.
    Seat(PlayerId),
    /// A watcher with no seat: sees no hole cards outside showdown.
    Spectator,
    /// The replay log: sees showdown reveals like everyone else.
    Replay,
}

/// One seat as the outside world sees it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub chip_stack: Chips,
    pub current_bet: Chips,
    pub total_bet_this_hand: Chips,
    pub is_folded: bool,
    pub is_all_in: bool,
    pub has_acted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole_cards: Option<Hole>,
}

impl SeatView {
    fn of(seat: &Seat, position: Position) -> Self {
        Self {
            id: seat.id(),
            name: seat.name().to_string(),
            position,
            chip_stack: seat.stack(),
            current_bet: seat.stake(),
            total_bet_this_hand: seat.spent(),
            is_folded: seat.is_folded(),
            is_all_in: seat.is_all_in(),
            has_acted: seat.acted(),
            hole_cards: seat.hole(),
        }
    }
}

/// A complete snapshot of public table state plus per-seat hole cards.
///
/// Built unfiltered from the authoritative state; call
/// [`project`](Self::project) before letting it leave the engine.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub game_id: GameId,
    pub phase: Phase,
    pub hand_number: u64,
    pub dealer_position: Position,
    pub small_blind_position: Position,
    pub big_blind_position: Position,
    pub small_blind_amount: Chips,
    pub big_blind_amount: Chips,
    pub minimum_raise: Chips,
    pub community_cards: Vec<Card>,
    pub pots: Vec<Pot>,
    pub seats: Vec<SeatView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_player_to_act: Option<PlayerId>,
}

impl TableView {
    /// Unfiltered snapshot with every seat's hole cards present.
    pub fn full(state: &TableState) -> Self {
        Self {
            game_id: state.id(),
            phase: state.phase(),
            hand_number: state.hand_number(),
            dealer_position: state.dealer(),
            small_blind_position: if state.n() > 0 { state.sb_position() } else { 0 },
            big_blind_position: if state.n() > 0 { state.bb_position() } else { 0 },
            small_blind_amount: state.small_blind(),
            big_blind_amount: state.big_blind(),
            minimum_raise: state.min_raise(),
            community_cards: state.board().to_vec(),
            pots: state.pots().to_vec(),
            seats: state
                .seats()
                .iter()
                .enumerate()
                .map(|(i, s)| SeatView::of(s, i))
                .collect(),
            current_player_to_act: state.to_act_id(),
        }
    }

    /// Applies the hole-card secrecy rule for the given audience.
    ///
    /// A seat's hole cards survive projection only for their owner, or for
    /// any audience once the hand is at showdown and the seat has not
    /// folded.
    pub fn project(mut self, audience: Audience) -> Self {
        let showdown = self.phase.is_showdown();
        for seat in self.seats.iter_mut() {
            let owner = matches!(audience, Audience::Seat(id) if id == seat.id);
            let revealed = showdown && !seat.is_folded;
            if !owner && !revealed {
                seat.hole_cards = None;
            }
        }
        self
    }
}

/// Everything a bot needs to decide: its projected view, the legal moves
/// with bounds (empty unless it is to act), and the remaining turn budget.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotView {
    #[serde(flatten)]
    pub view: TableView,
    pub possible_actions: Vec<ActionOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining_ms: Option<Millis>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use felt_cards::Deck;

    fn dealt_table() -> TableState {
        let mut state = TableState::new(GameId::default(), 10, 20);
        let mut deck = Deck::seeded(7);
        deck.shuffle();
        for (i, hole) in deck.deal_hole_cards(3).unwrap().into_iter().enumerate() {
            let mut seat = Seat::new(PlayerId::default(), format!("p{}", i), 1_000);
            seat.deal(hole);
            state.seats.push(seat);
        }
        state.phase = Phase::Flop;
        state
    }

    #[test]
    fn owner_sees_only_their_own_cards() {
        let state = dealt_table();
        let me = state.seats()[0].id();
        let view = TableView::full(&state).project(Audience::Seat(me));
        assert!(view.seats[0].hole_cards.is_some());
        assert!(view.seats[1].hole_cards.is_none());
        assert!(view.seats[2].hole_cards.is_none());
    }

    #[test]
    fn spectators_see_nothing_before_showdown() {
        let state = dealt_table();
        let view = TableView::full(&state).project(Audience::Spectator);
        assert!(view.seats.iter().all(|s| s.hole_cards.is_none()));
    }

    #[test]
    fn showdown_reveals_unfolded_seats_to_everyone() {
        let mut state = dealt_table();
        state.seats[2].fold();
        state.phase = Phase::Showdown;
        let view = TableView::full(&state).project(Audience::Replay);
        assert!(view.seats[0].hole_cards.is_some());
        assert!(view.seats[1].hole_cards.is_some());
        assert!(view.seats[2].hole_cards.is_none()); // folded seats never show
    }

    #[test]
    fn wire_form_omits_hidden_cards_entirely() {
        let state = dealt_table();
        let view = TableView::full(&state).project(Audience::Spectator);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("holeCards"));
    }
}
