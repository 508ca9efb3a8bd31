use crate::seat::PlayerId;
use felt_core::Chips;
use felt_core::DEFAULT_HAND_START_DELAY_MS;
use felt_core::DEFAULT_MAX_SEATS;
use felt_core::DEFAULT_TURN_TIME_SECS;
use felt_core::Millis;

/// When a table deals its next hand without being told to.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum StartSettings {
    /// Deal as soon as this many seats are filled.
    MinPlayers { min: usize },
    /// Deal only on an explicit start request; if a creator is set, only
    /// the creator may issue it.
    Manual {
        #[serde(skip_serializing_if = "Option::is_none")]
        creator: Option<PlayerId>,
    },
    /// Deal only when an external scheduler says so.
    Scheduled,
}

impl Default for StartSettings {
    fn default() -> Self {
        Self::MinPlayers {
            min: felt_core::MIN_SEATS,
        }
    }
}

/// Tournament parameters carried for record-keeping.
/// Blind escalation is not scheduled here; levels are data only.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentSettings {
    pub starting_stack: Chips,
    pub level_minutes: u64,
}

/// Everything a table needs to run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub max_players: usize,
    pub small_blind_amount: Chips,
    pub big_blind_amount: Chips,
    /// Per-decision budget in seconds.
    pub turn_time_limit: u64,
    /// Pause between hand end and next hand start, in milliseconds.
    pub hand_start_delay: Millis,
    pub is_tournament: bool,
    pub start_settings: StartSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tournament_settings: Option<TournamentSettings>,
    /// Pins every shuffle for byte-identical replays when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_SEATS,
            small_blind_amount: 10,
            big_blind_amount: 20,
            turn_time_limit: DEFAULT_TURN_TIME_SECS,
            hand_start_delay: DEFAULT_HAND_START_DELAY_MS,
            is_tournament: false,
            start_settings: StartSettings::default(),
            tournament_settings: None,
            rng_seed: None,
        }
    }
}

impl GameConfig {
    pub fn turn_time(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.turn_time_limit)
    }
    pub fn start_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.hand_start_delay)
    }
}
