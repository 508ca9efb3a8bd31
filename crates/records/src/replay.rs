use felt_core::Chips;
use felt_core::Millis;
use felt_core::Sequence;
use felt_gameplay::ActionOption;
use felt_gameplay::GameConfig;
use felt_gameplay::GameEvent;
use felt_gameplay::GameId;
use felt_gameplay::PlayerId;
use felt_gameplay::TableView;
use std::collections::HashMap;

/// What the acting bot was looking at when it decided.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionContext {
    pub possible_actions: Vec<ActionOption>,
    pub time_to_decide_ms: Millis,
    pub pot_odds: f64,
    pub effective_stack: Chips,
}

/// One event in a replay, annotated for reconstruction.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedEvent {
    #[serde(rename = "sequenceId")]
    pub sequence: Sequence,
    pub event: GameEvent,
    /// Time since the previous recorded event.
    pub duration_ms: Millis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<TableView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<DecisionContext>,
}

/// A full snapshot taken every `checkpoint_interval` events so seeking
/// does not require replaying from the start.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    #[serde(rename = "sequenceId")]
    pub sequence: Sequence,
    pub state: TableView,
}

/// Aggregate counters computed while recording.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayMetadata {
    pub config: GameConfig,
    pub player_names: HashMap<PlayerId, String>,
    pub hand_count: u64,
    pub total_actions: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_hand_duration_ms: Option<Millis>,
    pub final_chip_counts: HashMap<PlayerId, Chips>,
    /// Every seat that won at least one pot, in first-win order.
    pub winners: Vec<PlayerId>,
}

/// One game's complete replay envelope.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayData {
    pub game_id: GameId,
    pub started_at: Millis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<Millis>,
    pub initial_state: TableView,
    pub events: Vec<RecordedEvent>,
    pub checkpoints: Vec<Checkpoint>,
    pub metadata: ReplayMetadata,
}

impl ReplayData {
    pub fn is_complete(&self) -> bool {
        self.ended_at.is_some()
    }
    pub fn last_sequence(&self) -> Option<Sequence> {
        self.events.last().map(|e| e.sequence)
    }
}
