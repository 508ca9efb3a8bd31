use crate::replay::Checkpoint;
use crate::replay::DecisionContext;
use crate::replay::RecordedEvent;
use crate::replay::ReplayData;
use crate::replay::ReplayMetadata;
use felt_core::Millis;
use felt_core::Sequence;
use felt_core::now_millis;
use felt_gameplay::Audience;
use felt_gameplay::EventKind;
use felt_gameplay::GameConfig;
use felt_gameplay::GameEvent;
use felt_gameplay::GameId;
use felt_gameplay::PlayerId;
use felt_gameplay::TableView;
use std::collections::HashMap;
use std::collections::VecDeque;

/// Write failures surfaced to the recorder service, which retries them
/// with backoff before dropping the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderError {
    AlreadyRecording(GameId),
    UnknownGame(GameId),
}

impl std::fmt::Display for RecorderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRecording(game) => write!(f, "already recording {}", game),
            Self::UnknownGame(game) => write!(f, "no recording open for {}", game),
        }
    }
}

impl std::error::Error for RecorderError {}

/// In-flight bookkeeping for one game being recorded.
#[derive(Debug)]
struct Recording {
    data: ReplayData,
    next_sequence: Sequence,
    last_at: Millis,
    prev_snapshot: Option<TableView>,
    hand_started_at: HashMap<u64, Millis>,
    hand_durations: Vec<Millis>,
}

/// Ordered event log per table with checkpoints and bounded retention.
///
/// Every stored event passes through the replay projection, so the log
/// only ever contains hole cards that were legitimately shown. Sequence
/// ids are strictly monotonic per game. Completed replays are retained up
/// to `max_in_memory`, oldest evicted first.
#[derive(Debug)]
pub struct ReplayRecorder {
    checkpoint_interval: usize,
    max_in_memory: usize,
    active: HashMap<GameId, Recording>,
    finished: VecDeque<ReplayData>,
}

impl Default for ReplayRecorder {
    fn default() -> Self {
        Self::new(
            felt_core::DEFAULT_CHECKPOINT_INTERVAL,
            felt_core::DEFAULT_MAX_REPLAYS_IN_MEMORY,
        )
    }
}

impl ReplayRecorder {
    pub fn new(checkpoint_interval: usize, max_in_memory: usize) -> Self {
        Self {
            checkpoint_interval: checkpoint_interval.max(1),
            max_in_memory: max_in_memory.max(1),
            active: HashMap::new(),
            finished: VecDeque::new(),
        }
    }

    /// Opens a replay buffer and writes the `game_started` pseudo-event.
    pub fn start_recording(
        &mut self,
        game_id: GameId,
        config: GameConfig,
        initial: &TableView,
        player_names: HashMap<PlayerId, String>,
    ) -> Result<(), RecorderError> {
        if self.active.contains_key(&game_id) {
            return Err(RecorderError::AlreadyRecording(game_id));
        }
        let initial = initial.clone().project(Audience::Replay);
        let started_at = now_millis();
        let mut recording = Recording {
            data: ReplayData {
                game_id,
                started_at,
                ended_at: None,
                initial_state: initial.clone(),
                events: Vec::new(),
                checkpoints: Vec::new(),
                metadata: ReplayMetadata {
                    config,
                    player_names,
                    hand_count: 0,
                    total_actions: 0,
                    duration_ms: None,
                    avg_hand_duration_ms: None,
                    final_chip_counts: HashMap::new(),
                    winners: Vec::new(),
                },
            },
            next_sequence: 0,
            last_at: started_at,
            prev_snapshot: Some(initial.clone()),
            hand_started_at: HashMap::new(),
            hand_durations: Vec::new(),
        };
        recording.push(
            Self::pseudo(EventKind::GameStarted, &initial),
            None,
            self.checkpoint_interval,
        );
        log::info!("[recorder] recording {}", game_id);
        self.active.insert(game_id, recording);
        Ok(())
    }

    /// Appends one event: assigns the next sequence id, clones and filters
    /// the event for the replay audience, links the prior snapshot, and
    /// checkpoints on the configured interval.
    pub fn record_event(
        &mut self,
        game_id: GameId,
        event: &GameEvent,
        context: Option<DecisionContext>,
    ) -> Result<(), RecorderError> {
        let interval = self.checkpoint_interval;
        let Some(recording) = self.active.get_mut(&game_id) else {
            return Err(RecorderError::UnknownGame(game_id));
        };
        let projected = event.project(Audience::Replay);
        match projected.kind {
            EventKind::ActionTaken => recording.data.metadata.total_actions += 1,
            EventKind::HandStarted => {
                recording
                    .hand_started_at
                    .insert(projected.hand_number, projected.timestamp);
            }
            EventKind::HandComplete => {
                recording.data.metadata.hand_count += 1;
                if let Some(start) = recording.hand_started_at.remove(&projected.hand_number) {
                    recording
                        .hand_durations
                        .push(projected.timestamp.saturating_sub(start));
                }
                for winner in projected.winners.iter().flatten() {
                    if !recording.data.metadata.winners.contains(&winner.seat) {
                        recording.data.metadata.winners.push(winner.seat);
                    }
                }
            }
            _ => {}
        }
        recording.push(projected, context, interval);
        Ok(())
    }

    /// Closes a replay: writes `game_ended`, computes aggregates, and
    /// moves the log to the completed ring.
    pub fn end_recording(
        &mut self,
        game_id: GameId,
        final_state: &TableView,
    ) -> Result<(), RecorderError> {
        let Some(mut recording) = self.active.remove(&game_id) else {
            return Err(RecorderError::UnknownGame(game_id));
        };
        let final_state = final_state.clone().project(Audience::Replay);
        let interval = self.checkpoint_interval;
        recording.push(Self::pseudo(EventKind::GameEnded, &final_state), None, interval);
        let ended_at = now_millis();
        let meta = &mut recording.data.metadata;
        meta.duration_ms = Some(ended_at.saturating_sub(recording.data.started_at));
        meta.avg_hand_duration_ms = match recording.hand_durations.is_empty() {
            true => None,
            false => Some(
                recording.hand_durations.iter().sum::<Millis>()
                    / recording.hand_durations.len() as Millis,
            ),
        };
        meta.final_chip_counts = final_state
            .seats
            .iter()
            .map(|s| (s.id, s.chip_stack))
            .collect();
        recording.data.ended_at = Some(ended_at);
        log::info!(
            "[recorder] finished {}: {} events over {} hands",
            game_id,
            recording.data.events.len(),
            recording.data.metadata.hand_count
        );
        self.finished.push_back(recording.data);
        while self.finished.len() > self.max_in_memory {
            self.finished.pop_front();
        }
        Ok(())
    }

    /// Looks up a replay, active or completed.
    pub fn fetch(&self, game_id: GameId) -> Option<&ReplayData> {
        self.active
            .get(&game_id)
            .map(|r| &r.data)
            .or_else(|| self.finished.iter().find(|r| r.game_id == game_id))
    }
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
    pub fn finished_count(&self) -> usize {
        self.finished.len()
    }

    fn pseudo(kind: EventKind, snapshot: &TableView) -> GameEvent {
        GameEvent {
            kind,
            timestamp: now_millis(),
            hand_number: snapshot.hand_number,
            phase: snapshot.phase,
            seat: None,
            action: None,
            snapshot: Some(snapshot.clone()),
            reveals: None,
            winners: None,
        }
    }
}

impl Recording {
    fn push(&mut self, event: GameEvent, context: Option<DecisionContext>, interval: usize) {
        // names accumulate from whatever seats the snapshots show, so a
        // replay knows every player that ever sat down
        for seat in event.snapshot.iter().flat_map(|s| s.seats.iter()) {
            self.data
                .metadata
                .player_names
                .entry(seat.id)
                .or_insert_with(|| seat.name.clone());
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let duration_ms = event.timestamp.saturating_sub(self.last_at);
        self.last_at = event.timestamp;
        let before = self.prev_snapshot.take();
        self.prev_snapshot = event.snapshot.clone();
        self.data.events.push(RecordedEvent {
            sequence,
            event,
            duration_ms,
            before,
            context,
        });
        if self.data.events.len() % interval == 0 {
            if let Some(state) = self.prev_snapshot.clone() {
                self.data.checkpoints.push(Checkpoint { sequence, state });
            }
        }
    }
}
