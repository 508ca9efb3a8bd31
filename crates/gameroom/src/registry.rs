use crate::command::Command;
use felt_gameplay::EngineError;
use felt_gameplay::GameConfig;
use felt_gameplay::GameId;
use felt_gameplay::PlayerId;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

/// Typed failures surfaced by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    Duplicate,
    GameNotFound,
    AlreadyInGame,
    UnknownSeat,
    Engine(EngineError),
}

impl ControllerError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Duplicate => "DUPLICATE_GAME",
            Self::GameNotFound => "GAME_NOT_FOUND",
            Self::AlreadyInGame => "ALREADY_IN_GAME",
            Self::UnknownSeat => "UNKNOWN_SEAT",
            Self::Engine(e) => e.code(),
        }
    }
}

impl std::fmt::Display for ControllerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duplicate => write!(f, "a game with this id already exists"),
            Self::GameNotFound => write!(f, "no such game"),
            Self::AlreadyInGame => write!(f, "seat is already in a game"),
            Self::UnknownSeat => write!(f, "seat is not in a game"),
            Self::Engine(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<EngineError> for ControllerError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

/// Routing handle to a live room task.
#[derive(Clone)]
pub struct RoomHandle {
    pub id: GameId,
    pub tx: UnboundedSender<Command>,
    pub config: GameConfig,
}

/// The controller's shared maps: gameId → room and seat → gameId, guarded
/// by one coarse lock. Consulted only on session boundary transitions; a
/// seat lives in at most one table.
#[derive(Default)]
pub struct Registry {
    pub(crate) games: HashMap<GameId, RoomHandle>,
    pub(crate) seats: HashMap<PlayerId, GameId>,
}

impl Registry {
    /// Drops a seat's table membership, if it points at this game.
    pub(crate) fn release_seat(&mut self, player: PlayerId, game: GameId) {
        if self.seats.get(&player) == Some(&game) {
            self.seats.remove(&player);
        }
    }
}
