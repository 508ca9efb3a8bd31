use felt_core::Chips;
use felt_core::Millis;
use felt_gameplay::Action;
use felt_gameplay::Audience;
use felt_gameplay::BotView;
use felt_gameplay::EngineError;
use felt_gameplay::GameEvent;
use felt_gameplay::PlayerId;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

/// Opaque handle identifying one subscription to a room's event stream.
/// Removal is by handle, never by callback identity.
pub type SubscriberId = u64;

/// What a room pushes to its subscribers.
#[derive(Debug, Clone)]
pub enum Outbound {
    /// A game event, already projected for this subscriber's audience.
    Event(Box<GameEvent>),
    /// Sent to the seat whose turn just began.
    TurnStart { seat: PlayerId, time_limit_ms: Millis },
    /// Sent to the acting seat at 80% of its budget.
    TurnWarning {
        seat: PlayerId,
        time_remaining_ms: Millis,
    },
    /// The table froze; no further game traffic will follow.
    Terminal {
        code: &'static str,
        message: String,
    },
}

pub(crate) struct Subscriber {
    pub audience: Audience,
    pub sender: UnboundedSender<Outbound>,
}

/// Everything a room can be asked to do. All engine mutation flows through
/// this queue, which is what serializes the table.
pub enum Command {
    Join {
        player: PlayerId,
        name: String,
        chips: Chips,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    /// Queued while a hand is live; applied between hands.
    Leave {
        player: PlayerId,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Start {
        requester: Option<PlayerId>,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Act {
        player: PlayerId,
        action: Action,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Snapshot {
        player: PlayerId,
        reply: oneshot::Sender<Box<BotView>>,
    },
    Info {
        reply: oneshot::Sender<GameInfo>,
    },
    Subscribe {
        audience: Audience,
        sender: UnboundedSender<Outbound>,
        reply: oneshot::Sender<SubscriberId>,
    },
    Unsubscribe {
        id: SubscriberId,
    },
    /// Timer firings carry the epoch or generation they were armed with;
    /// stale ones are discarded at dequeue time.
    TurnWarning {
        epoch: u64,
    },
    TurnTimeout {
        epoch: u64,
    },
    StartTimer {
        generation: u64,
    },
    CleanupTimer {
        generation: u64,
    },
    Shutdown,
}

/// Listing entry for one table.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub game_id: felt_gameplay::GameId,
    pub phase: felt_gameplay::Phase,
    pub hand_number: u64,
    pub seats: usize,
    pub max_players: usize,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub joinable: bool,
}
