use crate::action::Action;
use crate::phase::Phase;
use crate::seat::PlayerId;
use crate::table::TableState;
use crate::view::Audience;
use crate::view::TableView;
use felt_cards::Hole;
use felt_cards::Strength;
use felt_core::Chips;
use felt_core::Millis;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PlayerJoined,
    PlayerLeft,
    HandStarted,
    HoleCardsDealt,
    BlindsPosted,
    ActionTaken,
    FlopDealt,
    TurnDealt,
    RiverDealt,
    ShowdownComplete,
    HandComplete,
    PlayerTimeout,
    /// Recorder pseudo-event opening a replay; never emitted by the engine.
    GameStarted,
    /// Recorder pseudo-event closing a replay; never emitted by the engine.
    GameEnded,
}

/// A seat's cards turned face-up at showdown.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reveal {
    pub seat: PlayerId,
    pub hole_cards: Hole,
    pub strength: Strength,
}

/// A payout at hand end.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Winner {
    pub seat: PlayerId,
    pub amount: Chips,
}

/// One entry in a table's event stream.
///
/// Events carry the complete post-event snapshot; hole cards inside it are
/// filtered per audience by [`project`](Self::project) before any event
/// leaves the engine's owner. Events are cloned on emission so subscribers
/// never hold references into live state.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub timestamp: Millis,
    pub hand_number: u64,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<TableView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reveals: Option<Vec<Reveal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winners: Option<Vec<Winner>>,
}

impl GameEvent {
    /// An event stamped from the current table state, carrying its full
    /// unprojected snapshot.
    pub fn of(kind: EventKind, state: &TableState) -> Self {
        Self {
            kind,
            timestamp: felt_core::now_millis(),
            hand_number: state.hand_number(),
            phase: state.phase(),
            seat: None,
            action: None,
            snapshot: Some(TableView::full(state)),
            reveals: None,
            winners: None,
        }
    }
    pub fn with_seat(mut self, seat: PlayerId) -> Self {
        self.seat = Some(seat);
        self
    }
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }
    pub fn with_reveals(mut self, reveals: Vec<Reveal>) -> Self {
        self.reveals = Some(reveals);
        self
    }
    pub fn with_winners(mut self, winners: Vec<Winner>) -> Self {
        self.winners = Some(winners);
        self
    }
    /// Rewrites the event for one audience, filtering the snapshot's hole
    /// cards. Reveals are showdown-public by construction and pass through.
    pub fn project(&self, audience: Audience) -> Self {
        let mut event = self.clone();
        event.snapshot = event.snapshot.map(|view| view.project(audience));
        event
    }
}

impl std::fmt::Display for GameEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "hand #{} {:?}", self.hand_number, self.kind)?;
        if let Some(seat) = self.seat {
            write!(f, " seat {}", seat)?;
        }
        if let Some(action) = self.action {
            write!(f, " {}", action)?;
        }
        Ok(())
    }
}
