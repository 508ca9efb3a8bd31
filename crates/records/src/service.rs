use crate::export::ExportFormat;
use crate::export::export;
use crate::recorder::ReplayRecorder;
use crate::replay::DecisionContext;
use crate::replay::ReplayData;
use felt_gameplay::GameConfig;
use felt_gameplay::GameEvent;
use felt_gameplay::GameId;
use felt_gameplay::PlayerId;
use felt_gameplay::TableView;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::oneshot;

/// How many times a failed write is attempted before it is dropped.
const PERSIST_ATTEMPTS: u32 = 3;
/// First retry delay; doubles per attempt.
const PERSIST_BACKOFF_MS: u64 = 50;

/// Work items for the recorder task.
enum RecorderCommand {
    Start {
        game: GameId,
        config: Box<GameConfig>,
        initial: Box<TableView>,
        names: HashMap<PlayerId, String>,
    },
    Record {
        game: GameId,
        event: Box<GameEvent>,
        context: Option<DecisionContext>,
    },
    End {
        game: GameId,
        final_state: Box<TableView>,
    },
    Fetch {
        game: GameId,
        reply: oneshot::Sender<Option<Box<ReplayData>>>,
    },
    Export {
        game: GameId,
        format: ExportFormat,
        reply: oneshot::Sender<Option<Vec<u8>>>,
    },
}

/// Clonable handle feeding the recorder task.
///
/// Rooms call this after releasing their engine state for the tick, so
/// recording happens off the hot path; every send is fire-and-forget and
/// failures never propagate back to gameplay.
#[derive(Clone)]
pub struct RecorderHandle {
    tx: UnboundedSender<RecorderCommand>,
}

impl RecorderHandle {
    pub fn start(
        &self,
        game: GameId,
        config: GameConfig,
        initial: TableView,
        names: HashMap<PlayerId, String>,
    ) {
        let _ = self.tx.send(RecorderCommand::Start {
            game,
            config: Box::new(config),
            initial: Box::new(initial),
            names,
        });
    }
    pub fn record(&self, game: GameId, event: GameEvent, context: Option<DecisionContext>) {
        let _ = self.tx.send(RecorderCommand::Record {
            game,
            event: Box::new(event),
            context,
        });
    }
    pub fn end(&self, game: GameId, final_state: TableView) {
        let _ = self.tx.send(RecorderCommand::End {
            game,
            final_state: Box::new(final_state),
        });
    }
    pub async fn fetch(&self, game: GameId) -> Option<Box<ReplayData>> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RecorderCommand::Fetch { game, reply }).ok()?;
        rx.await.ok().flatten()
    }
    pub async fn export(&self, game: GameId, format: ExportFormat) -> Option<Vec<u8>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RecorderCommand::Export {
                game,
                format,
                reply,
            })
            .ok()?;
        rx.await.ok().flatten()
    }
}

/// Owns a [`ReplayRecorder`] on its own task, serializing all writes so
/// per-game ordering needs no locks. Writes are retried with backoff and,
/// once the attempts are spent, dropped with a log line — storage is
/// best-effort and never stalls or fails a table.
pub struct RecorderService;

impl RecorderService {
    pub fn spawn(recorder: ReplayRecorder) -> RecorderHandle {
        let (tx, rx) = unbounded_channel();
        tokio::spawn(Self::run(recorder, rx));
        RecorderHandle { tx }
    }
    async fn run(mut recorder: ReplayRecorder, mut rx: UnboundedReceiver<RecorderCommand>) {
        while let Some(command) = rx.recv().await {
            match command {
                RecorderCommand::Start {
                    game,
                    config,
                    initial,
                    names,
                } => {
                    with_backoff("open", game, || {
                        recorder.start_recording(game, (*config).clone(), &initial, names.clone())
                    })
                    .await;
                }
                RecorderCommand::Record {
                    game,
                    event,
                    context,
                } => {
                    with_backoff("append", game, || {
                        recorder.record_event(game, &event, context.clone())
                    })
                    .await;
                }
                RecorderCommand::End { game, final_state } => {
                    with_backoff("finalize", game, || {
                        recorder.end_recording(game, &final_state)
                    })
                    .await;
                }
                RecorderCommand::Fetch { game, reply } => {
                    let _ = reply.send(recorder.fetch(game).cloned().map(Box::new));
                }
                RecorderCommand::Export {
                    game,
                    format,
                    reply,
                } => {
                    let exported = match recorder.fetch(game) {
                        None => None,
                        Some(replay) => with_backoff("export", game, || export(replay, format)).await,
                    };
                    let _ = reply.send(exported);
                }
            }
        }
        log::debug!("[recorder] service stopped");
    }
}

/// Runs a write with bounded doubling backoff. After the last attempt the
/// failure is logged and the write dropped; nothing propagates.
async fn with_backoff<T, E>(
    what: &str,
    game: GameId,
    mut op: impl FnMut() -> Result<T, E>,
) -> Option<T>
where
    E: std::fmt::Display,
{
    let mut delay = Duration::from_millis(PERSIST_BACKOFF_MS);
    for attempt in 1..=PERSIST_ATTEMPTS {
        match op() {
            Ok(value) => return Some(value),
            Err(e) if attempt == PERSIST_ATTEMPTS => {
                log::error!(
                    "[recorder] {} for {} dropped after {} attempts: {}",
                    what,
                    game,
                    attempt,
                    e
                );
            }
            Err(e) => {
                log::warn!("[recorder] {} for {} failed, retrying: {}", what, game, e);
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use felt_gameplay::Engine;
    use felt_gameplay::Rules;

    fn scripted_game(seed: u64) -> (Engine, Vec<GameEvent>) {
        let config = GameConfig {
            rng_seed: Some(seed),
            ..GameConfig::default()
        };
        let mut engine = Engine::new(GameId::default(), config);
        engine.add_seat(PlayerId::default(), "a", 500).unwrap();
        engine.add_seat(PlayerId::default(), "b", 500).unwrap();
        let mut events = engine.start_hand().unwrap();
        while let Some(actor) = engine.state().to_act_id() {
            let action = Rules::forced(engine.state(), actor);
            events.extend(engine.process_action(actor, action).unwrap());
        }
        (engine, events)
    }

    #[tokio::test]
    async fn records_through_the_task() {
        let handle = RecorderService::spawn(ReplayRecorder::default());
        let config = GameConfig {
            rng_seed: Some(5),
            ..GameConfig::default()
        };
        let mut engine = Engine::new(GameId::default(), config);
        engine.add_seat(PlayerId::default(), "a", 500).unwrap();
        engine.add_seat(PlayerId::default(), "b", 500).unwrap();
        handle.start(
            engine.id(),
            engine.config().clone(),
            TableView::full(engine.state()),
            Default::default(),
        );
        let mut events = engine.start_hand().unwrap();
        while let Some(actor) = engine.state().to_act_id() {
            let action = Rules::forced(engine.state(), actor);
            events.extend(engine.process_action(actor, action).unwrap());
        }
        for event in events {
            handle.record(engine.id(), event, None);
        }
        handle.end(engine.id(), TableView::full(engine.state()));
        let replay = handle.fetch(engine.id()).await.expect("replay retained");
        assert!(replay.is_complete());
        let bytes = handle
            .export(engine.id(), ExportFormat::Json)
            .await
            .expect("exportable");
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn failed_writes_retry_then_drop_without_killing_the_service() {
        let handle = RecorderService::spawn(ReplayRecorder::default());
        let (engine, events) = scripted_game(6);
        // no recording is open for this game: every append fails, retries,
        // and is dropped
        handle.record(engine.id(), events[0].clone(), None);
        // the service is still alive and serves a real game afterwards
        let (other, other_events) = scripted_game(7);
        handle.start(
            other.id(),
            other.config().clone(),
            TableView::full(other.state()),
            Default::default(),
        );
        for event in other_events {
            handle.record(other.id(), event, None);
        }
        handle.end(other.id(), TableView::full(other.state()));
        let replay = handle.fetch(other.id()).await.expect("service alive");
        assert!(replay.is_complete());
        assert!(handle.fetch(engine.id()).await.is_none());
    }
}
